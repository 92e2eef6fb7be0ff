//! Run driver for the fixed decide/retrieve/rewrite/answer topology.
//!
//! ```text
//! decide ──tool call──▶ retrieve ──relevant──▶ answer ──▶ done
//!   │  ▲                   │
//!   │  └──── rewrite ◀─────┘ not relevant (ceiling checked here;
//!   │                         human mode suspends before rewrite)
//!   └──direct reply──▶ done
//! ```
//!
//! The orchestrator holds only read-only collaborators. Every run owns its
//! own [`Conversation`], so one orchestrator can drive many runs at once.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use super::checkpoint::Checkpoint;
use super::node::{Node, Route, next_node, route_decision, route_grade};
use super::outcome::{RunError, RunEvent, RunOutcome, RunReport, StepEvent};
use super::state::Conversation;
use crate::agent::config::{AgentConfig, RewriteLimitPolicy, RewriteMode};
use crate::agent::generator::AnswerAgent;
use crate::agent::grader::{Grade, RelevanceGrader, create_grader};
use crate::agent::message::{Role, assistant_message, tool_message, user_message};
use crate::agent::prompt::PromptSet;
use crate::agent::provider::LlmProvider;
use crate::agent::rewriter::{RewriteAgent, apply_human_rewrite};
use crate::agent::router::RouterAgent;
use crate::error::AgentError;
use crate::retrieval::{RetrievalTool, Retriever};

/// Callback receiving each finished node.
type StepSink<'a> = &'a mut (dyn FnMut(StepEvent) + Send);

/// Mutable state of a single run.
struct RunState {
    conversation: Conversation,
    rewrites: usize,
    trace: Vec<Node>,
}

impl RunState {
    fn fail(self, node: Node, source: AgentError) -> RunError {
        RunError {
            node,
            conversation: self.conversation,
            rewrites: self.rewrites,
            trace: self.trace,
            source,
        }
    }
}

fn step_sink(tx: mpsc::UnboundedSender<RunEvent>) -> impl FnMut(StepEvent) + Send {
    move |event| {
        // A closed receiver means the caller stopped listening.
        let _ = tx.send(RunEvent::Step(event));
    }
}

fn terminal_event(result: Result<RunOutcome, RunError>) -> RunEvent {
    match result {
        Ok(RunOutcome::Completed(report)) => RunEvent::Completed(report),
        Ok(RunOutcome::Suspended(checkpoint)) => RunEvent::Suspended(checkpoint),
        Err(err) => RunEvent::Failed(err),
    }
}

/// Drives conversation runs through the graph.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    tool: RetrievalTool,
    grader: Arc<dyn RelevanceGrader>,
    router: RouterAgent,
    rewriter: RewriteAgent,
    generator: AnswerAgent,
    rewrite_mode: RewriteMode,
    max_rewrites: usize,
    limit_policy: RewriteLimitPolicy,
}

impl Orchestrator {
    /// Creates an orchestrator with the given provider, retriever, and configuration.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        retriever: Arc<dyn Retriever>,
        config: &AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, retriever, config, prompts)
    }

    /// Creates an orchestrator with explicit prompt templates.
    #[must_use]
    pub fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        retriever: Arc<dyn Retriever>,
        config: &AgentConfig,
        prompts: PromptSet,
    ) -> Self {
        let tool = RetrievalTool::from_config(retriever, config);
        let grader = create_grader(config, Arc::clone(&provider), &prompts.grade);
        Self {
            router: RouterAgent::new(config, prompts.decide, tool.definition().clone()),
            rewriter: RewriteAgent::new(config, prompts.rewrite),
            generator: AnswerAgent::new(config, prompts.answer),
            provider,
            tool,
            grader,
            rewrite_mode: config.rewrite_mode,
            max_rewrites: config.max_rewrites,
            limit_policy: config.rewrite_limit_policy,
        }
    }

    /// Replaces the relevance grader.
    #[must_use]
    pub fn with_grader(mut self, grader: Arc<dyn RelevanceGrader>) -> Self {
        self.grader = grader;
        self
    }

    /// Runs a new conversation for `question`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] carrying the state reached when a collaborator
    /// fails, a tool call is malformed, or the rewrite ceiling is hit.
    pub async fn run(&self, question: &str) -> Result<RunOutcome, RunError> {
        self.run_conversation(Conversation::new(question)).await
    }

    /// Runs a conversation that holds exactly the user's first message.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] with [`AgentError::Orchestration`] if the
    /// conversation holds more than the question, otherwise as for
    /// [`Self::run`].
    pub async fn run_conversation(&self, conversation: Conversation) -> Result<RunOutcome, RunError> {
        self.start(conversation, &mut |_| {}).await
    }

    /// Runs a new conversation, yielding one [`RunEvent::Step`] per node
    /// followed by exactly one terminal event.
    ///
    /// The run is spawned onto the current Tokio runtime; dropping the
    /// stream does not cancel it.
    pub fn stream(self: Arc<Self>, question: &str) -> UnboundedReceiverStream<RunEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conversation = Conversation::new(question);

        tokio::spawn(async move {
            let mut sink = step_sink(tx.clone());
            let result = self.start(conversation, &mut sink).await;
            let _ = tx.send(terminal_event(result));
        });

        UnboundedReceiverStream::new(rx)
    }

    /// Streaming counterpart of [`Self::resume`].
    pub fn resume_stream(
        self: Arc<Self>,
        checkpoint: Checkpoint,
        replacement: String,
    ) -> UnboundedReceiverStream<RunEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut sink = step_sink(tx.clone());
            let result = self.resume_with(checkpoint, &replacement, &mut sink).await;
            let _ = tx.send(terminal_event(result));
        });

        UnboundedReceiverStream::new(rx)
    }

    /// Continues a suspended run with a human-supplied question.
    ///
    /// A leading `Human rewrite:` marker is stripped. The replacement is
    /// appended as a new `user` message and the run re-enters `decide`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] with [`AgentError::Checkpoint`] if the checkpoint
    /// is not pending a rewrite or the replacement is blank, otherwise as
    /// for [`Self::run`].
    pub async fn resume(&self, checkpoint: Checkpoint, replacement: &str) -> Result<RunOutcome, RunError> {
        self.resume_with(checkpoint, replacement, &mut |_| {}).await
    }

    async fn resume_with(
        &self,
        checkpoint: Checkpoint,
        replacement: &str,
        sink: StepSink<'_>,
    ) -> Result<RunOutcome, RunError> {
        let Checkpoint {
            id,
            conversation,
            pending,
            rewrites,
            trace,
        } = checkpoint;
        let mut state = RunState {
            conversation,
            rewrites,
            trace,
        };

        if pending != Node::Rewrite {
            return Err(state.fail(
                pending,
                AgentError::Checkpoint {
                    message: format!("checkpoint {id} is pending `{pending}`, not `rewrite`"),
                },
            ));
        }
        let question = apply_human_rewrite(replacement);
        if question.is_empty() {
            return Err(state.fail(
                Node::Rewrite,
                AgentError::Checkpoint {
                    message: "replacement question is empty".to_string(),
                },
            ));
        }

        info!(checkpoint = %id, rewrites = state.rewrites, "resuming run");
        state.trace.push(Node::Rewrite);
        state.conversation.push(user_message(&question));
        state.rewrites += 1;
        sink(StepEvent {
            node: Node::Rewrite,
            appended: vec![user_message(&question)],
        });

        self.drive(state, Node::Decide, sink).await
    }

    async fn start(&self, conversation: Conversation, sink: StepSink<'_>) -> Result<RunOutcome, RunError> {
        let state = RunState {
            conversation,
            rewrites: 0,
            trace: Vec::new(),
        };
        if state.conversation.len() != 1 {
            let len = state.conversation.len();
            return Err(state.fail(
                Node::Decide,
                AgentError::Orchestration {
                    message: format!("a new run must start from one user message, got {len}"),
                },
            ));
        }
        info!(question = %state.conversation.question(), "run started");
        self.drive(state, Node::Decide, sink).await
    }

    /// Executes nodes from `node` until `done`, suspension, or failure.
    async fn drive(
        &self,
        mut state: RunState,
        mut node: Node,
        sink: StepSink<'_>,
    ) -> Result<RunOutcome, RunError> {
        loop {
            state.trace.push(node);

            if node == Node::Done {
                sink(StepEvent {
                    node,
                    appended: Vec::new(),
                });
                info!(
                    messages = state.conversation.len(),
                    rewrites = state.rewrites,
                    "run completed"
                );
                return Ok(RunOutcome::Completed(RunReport {
                    conversation: state.conversation,
                    trace: state.trace,
                    rewrites: state.rewrites,
                }));
            }

            let before = state.conversation.len();
            let next = match self.step(&mut state, node).await {
                Ok(next) => next,
                Err(source) => {
                    warn!(%node, error = %source, "run failed");
                    return Err(state.fail(node, source));
                }
            };
            sink(StepEvent {
                node,
                appended: state.conversation.messages()[before..].to_vec(),
            });
            debug!(from = %node, to = %next, messages = state.conversation.len(), "transition");

            if next == Node::Rewrite && self.rewrite_mode == RewriteMode::Human {
                let checkpoint =
                    Checkpoint::new(state.conversation, Node::Rewrite, state.rewrites, state.trace);
                info!(checkpoint = %checkpoint.id, rewrites = checkpoint.rewrites, "run suspended for human rewrite");
                return Ok(RunOutcome::Suspended(checkpoint));
            }
            node = next;
        }
    }

    async fn step(&self, state: &mut RunState, node: Node) -> Result<Node, AgentError> {
        match node {
            Node::Decide => self.decide(state).await,
            Node::Retrieve => self.retrieve(state).await,
            Node::Rewrite => self.rewrite(state).await,
            Node::Answer => self.answer(state).await,
            Node::Done => Ok(Node::Done),
        }
    }

    async fn decide(&self, state: &mut RunState) -> Result<Node, AgentError> {
        let response = self
            .router
            .decide(self.provider.as_ref(), state.conversation.messages())
            .await?;
        let route = route_decision(&response);
        debug!(?route, tool_calls = response.tool_calls.len(), "decision");
        state.conversation.push(response.into_message());
        Ok(next_node(route))
    }

    async fn retrieve(&self, state: &mut RunState) -> Result<Node, AgentError> {
        let calls = match state.conversation.last() {
            Some(message) if message.role == Role::Assistant && message.has_tool_calls() => {
                message.tool_calls.clone()
            }
            _ => {
                return Err(AgentError::Orchestration {
                    message: "retrieve entered without a pending tool call".to_string(),
                });
            }
        };

        // Validate every call before any is executed.
        for call in &calls {
            self.tool.parse_query(call)?;
        }
        let mut latest_failed = false;
        for call in &calls {
            let result = self.tool.invoke(call).await?;
            latest_failed = result.is_error;
            state
                .conversation
                .push(tool_message(&result.tool_call_id, &result.content));
        }

        let grade = if latest_failed {
            info!("retriever unavailable, routing to rewrite");
            Grade::Rewrite
        } else {
            let content = state.conversation.latest_context().unwrap_or_default();
            let grade = self
                .grader
                .grade(state.conversation.question(), content)
                .await?;
            debug!(grader = self.grader.name(), %grade, "graded retrieval");
            grade
        };

        match route_grade(grade) {
            Route::NeedRewrite if state.rewrites >= self.max_rewrites => match self.limit_policy {
                RewriteLimitPolicy::Fail => Err(AgentError::UnboundedRewriteLoop {
                    max_rewrites: self.max_rewrites,
                }),
                RewriteLimitPolicy::AnswerAnyway => {
                    warn!(max_rewrites = self.max_rewrites, "rewrite ceiling reached, answering anyway");
                    Ok(next_node(Route::AnswerFromContext))
                }
            },
            route => Ok(next_node(route)),
        }
    }

    async fn rewrite(&self, state: &mut RunState) -> Result<Node, AgentError> {
        let question = self
            .rewriter
            .rewrite(self.provider.as_ref(), state.conversation.question())
            .await?;
        state.conversation.push(user_message(&question));
        state.rewrites += 1;
        debug!(rewrites = state.rewrites, "question rewritten");
        Ok(Node::Decide)
    }

    async fn answer(&self, state: &mut RunState) -> Result<Node, AgentError> {
        let context = state.conversation.latest_context().unwrap_or_default();
        let response = self
            .generator
            .answer(self.provider.as_ref(), state.conversation.question(), context)
            .await?;
        state.conversation.push(assistant_message(&response.content));
        Ok(Node::Done)
    }
}
