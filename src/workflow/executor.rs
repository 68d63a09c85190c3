// Executor - Runs the workflow graph in supersteps with checkpointing
use super::checkpoint::{CheckpointError, CheckpointStore};
use super::graph::{GraphError, Node, StateGraph};
use super::state::{Interrupt, Reducers, StateUpdate, WorkflowError, WorkflowState, WorkflowStatus};
use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("No checkpointer configured")]
    NoCheckpointer,

    #[error("No checkpoint found for thread '{0}'")]
    ThreadNotFound(String),

    #[error("Thread '{0}' is not awaiting input")]
    NotSuspended(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Workflow executor config
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_iterations: usize,
    pub checkpoint_every_n_steps: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            checkpoint_every_n_steps: 5,
        }
    }
}

enum StepOutcome {
    Done(StateUpdate),
    Interrupted(StateUpdate, Value),
    Failed(String),
}

/// Workflow executor
pub struct WorkflowExecutor {
    graph: StateGraph,
    checkpointer: Option<Arc<dyn CheckpointStore>>,
    reducers: Reducers,
    config: ExecutorConfig,
}

impl WorkflowExecutor {
    pub fn new(
        graph: StateGraph,
        checkpointer: Option<Arc<dyn CheckpointStore>>,
        reducers: Reducers,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            graph,
            checkpointer,
            reducers,
            config,
        }
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn CheckpointStore>> {
        self.checkpointer.as_ref()
    }

    /// Run until END, a failure, or an interrupt.
    ///
    /// Starts at the entry point, or at `state.pending_nodes` when resuming.
    /// Node failures are reported through the returned state (`Failed` plus a
    /// `WorkflowError`), not as `Err`.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState, ExecutorError> {
        info!(
            workflow_id = %state.workflow_id,
            thread_id = %state.thread_id,
            "🚀 Starting workflow execution"
        );
        state.status = WorkflowStatus::Running;
        state.interrupt = None;

        let mut frontier = if state.pending_nodes.is_empty() {
            vec![self.graph.get_entry_point().to_string()]
        } else {
            std::mem::take(&mut state.pending_nodes)
        };

        let mut step = 0;

        while !frontier.is_empty() {
            step += 1;

            if step > self.config.max_iterations {
                warn!("⚠️ Workflow hit iteration limit: {}", self.config.max_iterations);
                self.fail(
                    &mut state,
                    &frontier[0],
                    "IterationLimitExceeded",
                    format!("Exceeded max iterations: {}", self.config.max_iterations),
                );
                break;
            }

            let (ready, waiting): (Vec<String>, Vec<String>) = frontier
                .into_iter()
                .partition(|id| self.graph.is_ready(id, &state.completed_nodes));

            if ready.is_empty() {
                self.fail(
                    &mut state,
                    &waiting[0],
                    "JoinDeadlock",
                    format!("Nodes {:?} wait on predecessors that will never complete", waiting),
                );
                break;
            }

            info!("📍 Step {}: executing {:?}", step, ready);

            // Every ready node sees the same snapshot
            let outcomes = join_all(ready.iter().map(|id| self.execute_node(id, &state))).await;

            let mut completed = Vec::new();
            let mut interrupted: Vec<(String, Value)> = Vec::new();
            let mut failure: Option<(String, String)> = None;

            // Merge in declaration order
            for (id, outcome) in ready.iter().zip(outcomes) {
                match outcome {
                    StepOutcome::Done(update) => {
                        state.apply_update(update, &self.reducers);
                        completed.push(id.clone());
                    }
                    StepOutcome::Interrupted(update, value) => {
                        state.apply_update(update, &self.reducers);
                        interrupted.push((id.clone(), value));
                    }
                    StepOutcome::Failed(message) => {
                        error!("❌ Node '{}' failed: {}", id, message);
                        failure.get_or_insert((id.clone(), message));
                    }
                }
            }

            // The resume value is only for the step that re-ran the pending nodes
            state.resume = None;

            if let Some((node, message)) = failure {
                self.fail(&mut state, &node, "NodeExecutionError", message);
                break;
            }

            for id in &completed {
                if let Some(preds) = self.graph.join_predecessors(id) {
                    state.completed_nodes.retain(|c| !preds.contains(c));
                }
                if !state.completed_nodes.contains(id) {
                    state.completed_nodes.push(id.clone());
                }
            }

            let mut next: Vec<String> = Vec::new();
            let mut misrouted: Option<(String, String)> = None;
            for id in &completed {
                for target in self.graph.get_next_nodes(id, &state) {
                    if self.graph.get_node(&target).is_none() {
                        misrouted.get_or_insert((
                            id.clone(),
                            format!("Router selected unknown node '{}'", target),
                        ));
                    } else if !next.contains(&target) {
                        next.push(target);
                    }
                }
            }
            for id in waiting {
                if !next.contains(&id) {
                    next.push(id);
                }
            }

            if let Some((node, message)) = misrouted {
                self.fail(&mut state, &node, "UnknownNode", message);
                break;
            }

            if let Some((node, value)) = interrupted.first().cloned() {
                info!(node = %node, "⏸️ Workflow paused for human input");
                let mut pending: Vec<String> = interrupted.into_iter().map(|(id, _)| id).collect();
                for id in next {
                    if !pending.contains(&id) {
                        pending.push(id);
                    }
                }

                state.pending_nodes = pending;
                state.interrupt = Some(Interrupt { node, value });
                state.status = WorkflowStatus::AwaitingInput;
                self.checkpoint(&state, step).await;
                return Ok(state);
            }

            frontier = next;

            if step % self.config.checkpoint_every_n_steps.max(1) == 0 {
                self.checkpoint(&state, step).await;
            }
        }

        if state.status != WorkflowStatus::Failed {
            info!("🏁 Reached end node");
            state.status = WorkflowStatus::Completed;
        }

        self.checkpoint(&state, step).await;

        info!(
            workflow_id = %state.workflow_id,
            status = ?state.status,
            "🎬 Workflow execution finished (steps: {})",
            step
        );

        Ok(state)
    }

    /// Continue a suspended thread, handing `value` to the interrupted node
    pub async fn resume(&self, thread_id: &str, value: Value) -> Result<WorkflowState, ExecutorError> {
        let checkpointer = self.checkpointer.as_ref().ok_or(ExecutorError::NoCheckpointer)?;

        let checkpoint = checkpointer
            .latest(thread_id)
            .await?
            .ok_or_else(|| ExecutorError::ThreadNotFound(thread_id.to_string()))?;

        let mut state = checkpoint.state;
        if state.status != WorkflowStatus::AwaitingInput {
            return Err(ExecutorError::NotSuspended(thread_id.to_string()));
        }

        info!(thread_id, "🔄 Resuming workflow from checkpoint: {}", checkpoint.checkpoint_id);
        state.resume = Some(value);
        self.run(state).await
    }

    /// Latest saved state of a thread
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<WorkflowState>, ExecutorError> {
        let checkpointer = self.checkpointer.as_ref().ok_or(ExecutorError::NoCheckpointer)?;
        Ok(checkpointer.latest(thread_id).await?.map(|c| c.state))
    }

    async fn execute_node(&self, node_id: &str, state: &WorkflowState) -> StepOutcome {
        let Some(node) = self.graph.get_node(node_id) else {
            return StepOutcome::Failed(format!("Node '{}' not found", node_id));
        };

        match self.execute_with_timeout(node, state).await {
            Ok(mut update) => match update.interrupt.take() {
                Some(value) => StepOutcome::Interrupted(update, value),
                None => StepOutcome::Done(update),
            },
            Err(e) => StepOutcome::Failed(e),
        }
    }

    async fn execute_with_timeout(&self, node: &Node, state: &WorkflowState) -> Result<StateUpdate, String> {
        let node_timeout = Duration::from_secs(node.timeout_seconds);
        debug!(node = %node.id, node_type = ?node.node_type, "{}", node.description);

        match timeout(node_timeout, node.function.execute(state)).await {
            Ok(result) => result,
            Err(_) => Err(format!(
                "Node '{}' timed out after {}s",
                node.id, node.timeout_seconds
            )),
        }
    }

    fn fail(&self, state: &mut WorkflowState, node: &str, error_type: &str, message: String) {
        state.errors.push(WorkflowError {
            node: node.to_string(),
            error_type: error_type.to_string(),
            message,
            timestamp: Utc::now(),
        });
        state.pending_nodes.clear();
        state.status = WorkflowStatus::Failed;
    }

    async fn checkpoint(&self, state: &WorkflowState, step: usize) {
        if let Some(ref checkpointer) = self.checkpointer {
            match checkpointer.save(state).await {
                Ok(checkpoint_id) => {
                    info!("💾 Checkpoint saved at step {}: {}", step, checkpoint_id);
                }
                Err(e) => {
                    warn!("⚠️ Failed to save checkpoint: {}", e);
                }
            }
        }
    }
}

/// Builder for workflow executor
#[derive(Default)]
pub struct ExecutorBuilder {
    graph: Option<StateGraph>,
    checkpointer: Option<Arc<dyn CheckpointStore>>,
    reducers: Reducers,
    config: ExecutorConfig,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(mut self, graph: StateGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn CheckpointStore>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_reducers(mut self, reducers: Reducers) -> Self {
        self.reducers = reducers;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn checkpoint_every(mut self, n: usize) -> Self {
        self.config.checkpoint_every_n_steps = n;
        self
    }

    pub fn build(self) -> Result<WorkflowExecutor, GraphError> {
        let graph = self.graph.ok_or(GraphError::MissingGraph)?;
        Ok(WorkflowExecutor::new(
            graph,
            self.checkpointer,
            self.reducers,
            self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ChatMessage;
    use crate::workflow::checkpoint::MemoryCheckpointer;
    use crate::workflow::graph::{NodeFunction, NodeType, StateGraphBuilder, END};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Appends its name to `quotes` and records the quotes it saw
    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    #[async_trait]
    impl NodeFunction for Recorder {
        async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String> {
            self.seen
                .lock()
                .unwrap()
                .push((self.name.to_string(), state.quotes.clone()));
            Ok(StateUpdate {
                quotes: Some(vec![self.name.to_string()]),
                ..Default::default()
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl NodeFunction for Failing {
        async fn execute(&self, _state: &WorkflowState) -> Result<StateUpdate, String> {
            Err("boom".to_string())
        }
    }

    struct Slow;

    #[async_trait]
    impl NodeFunction for Slow {
        async fn execute(&self, _state: &WorkflowState) -> Result<StateUpdate, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(StateUpdate::new())
        }
    }

    /// Interrupts until a resume value is present, then echoes it
    struct AskHuman;

    #[async_trait]
    impl NodeFunction for AskHuman {
        async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String> {
            match &state.resume {
                Some(value) => Ok(StateUpdate::new()
                    .with_message(ChatMessage::user(value["data"].as_str().unwrap_or_default()))),
                None => Ok(StateUpdate::new().with_interrupt(json!({ "query": "which topic?" }))),
            }
        }
    }

    fn recorder(name: &'static str, seen: &Arc<Mutex<Vec<(String, Vec<String>)>>>) -> Arc<dyn NodeFunction> {
        Arc::new(Recorder {
            name,
            seen: seen.clone(),
        })
    }

    fn diamond(seen: &Arc<Mutex<Vec<(String, Vec<String>)>>>) -> StateGraph {
        StateGraphBuilder::new()
            .add_node("start", NodeType::Agent, recorder("start", seen), "")
            .add_node("a", NodeType::Agent, recorder("a", seen), "")
            .add_node("b", NodeType::Agent, recorder("b", seen), "")
            .add_node("c", NodeType::Agent, recorder("c", seen), "")
            .add_node("merge", NodeType::Action, recorder("merge", seen), "")
            .add_parallel_edges("start", &["a", "b", "c"])
            .add_join(&["a", "b", "c"], "merge")
            .add_edge("merge", END)
            .set_entry_point("start")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fan_out_sees_snapshot_and_merges_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::new(MemoryCheckpointer::new());
        let executor = ExecutorBuilder::new()
            .with_graph(diamond(&seen))
            .with_checkpointer(store.clone())
            .build()
            .unwrap();

        let state = executor
            .run(WorkflowState::new("wf".into(), "t1".into()))
            .await
            .unwrap();

        assert_eq!(state.status, WorkflowStatus::Completed);
        // Replace strategy: last branch in declaration order wins, then merge
        assert_eq!(state.quotes, vec!["merge".to_string()]);

        let seen = seen.lock().unwrap();
        let branch_views: Vec<_> = seen.iter().filter(|(n, _)| ["a", "b", "c"].contains(&n.as_str())).collect();
        assert_eq!(branch_views.len(), 3);
        for (_, quotes) in branch_views {
            assert_eq!(quotes, &vec!["start".to_string()]);
        }
        let merge_view = seen.iter().find(|(n, _)| n == "merge").unwrap();
        assert_eq!(merge_view.1, vec!["c".to_string()]);

        let saved = store.latest("t1").await.unwrap().unwrap();
        assert_eq!(saved.state.status, WorkflowStatus::Completed);
    }

    #[tokio::test]
    async fn test_append_reducer_collects_every_branch() {
        use crate::workflow::state::{ReducerStrategy, StateKey};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = ExecutorBuilder::new()
            .with_graph(diamond(&seen))
            .with_reducers(Reducers::default().with(StateKey::Quotes, ReducerStrategy::Append))
            .build()
            .unwrap();

        let state = executor
            .run(WorkflowState::new("wf".into(), "t".into()))
            .await
            .unwrap();
        assert_eq!(state.quotes, vec!["start", "a", "b", "c", "merge"]);
    }

    #[tokio::test]
    async fn test_failing_node_marks_run_failed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let graph = StateGraphBuilder::new()
            .add_node("start", NodeType::Agent, recorder("start", &seen), "")
            .add_node("bad", NodeType::Action, Arc::new(Failing), "")
            .add_node("after", NodeType::Agent, recorder("after", &seen), "")
            .add_edge("start", "bad")
            .add_edge("bad", "after")
            .set_entry_point("start")
            .build()
            .unwrap();
        let executor = ExecutorBuilder::new().with_graph(graph).build().unwrap();

        let state = executor
            .run(WorkflowState::new("wf".into(), "t".into()))
            .await
            .unwrap();

        assert_eq!(state.status, WorkflowStatus::Failed);
        let err = state.last_error().unwrap();
        assert_eq!(err.node, "bad");
        assert_eq!(err.message, "boom");
        assert!(seen.lock().unwrap().iter().all(|(n, _)| n != "after"));
    }

    #[tokio::test]
    async fn test_node_timeout() {
        let graph = StateGraphBuilder::new()
            .add_node("slow", NodeType::Action, Arc::new(Slow), "")
            .with_timeout("slow", 0)
            .set_entry_point("slow")
            .build()
            .unwrap();
        let executor = ExecutorBuilder::new().with_graph(graph).build().unwrap();

        let state = executor
            .run(WorkflowState::new("wf".into(), "t".into()))
            .await
            .unwrap();
        assert_eq!(state.status, WorkflowStatus::Failed);
        assert!(state.last_error().unwrap().message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let graph = StateGraphBuilder::new()
            .add_node("loop", NodeType::Agent, recorder("loop", &seen), "")
            .add_edge("loop", "loop")
            .set_entry_point("loop")
            .build()
            .unwrap();
        let executor = ExecutorBuilder::new()
            .with_graph(graph)
            .max_iterations(3)
            .build()
            .unwrap();

        let state = executor
            .run(WorkflowState::new("wf".into(), "t".into()))
            .await
            .unwrap();
        assert_eq!(state.status, WorkflowStatus::Failed);
        assert_eq!(state.last_error().unwrap().error_type, "IterationLimitExceeded");
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_interrupt_then_resume() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let graph = StateGraphBuilder::new()
            .add_node("ask", NodeType::Tool, Arc::new(AskHuman), "")
            .add_node("after", NodeType::Agent, recorder("after", &seen), "")
            .add_edge("ask", "after")
            .set_entry_point("ask")
            .build()
            .unwrap();
        let executor = ExecutorBuilder::new()
            .with_graph(graph)
            .with_checkpointer(Arc::new(MemoryCheckpointer::new()))
            .build()
            .unwrap();

        let paused = executor
            .run(WorkflowState::new("wf".into(), "thread-9".into()))
            .await
            .unwrap();
        assert_eq!(paused.status, WorkflowStatus::AwaitingInput);
        assert_eq!(paused.pending_nodes, vec!["ask".to_string()]);
        let interrupt = paused.interrupt.unwrap();
        assert_eq!(interrupt.node, "ask");
        assert_eq!(interrupt.value["query"], "which topic?");
        assert!(seen.lock().unwrap().is_empty());

        let done = executor
            .resume("thread-9", json!({ "data": "Hope Quotes" }))
            .await
            .unwrap();
        assert_eq!(done.status, WorkflowStatus::Completed);
        assert_eq!(done.messages.last().unwrap().content, "Hope Quotes");
        assert!(done.resume.is_none());
        assert!(done.interrupt.is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_errors() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = ExecutorBuilder::new()
            .with_graph(diamond(&seen))
            .with_checkpointer(Arc::new(MemoryCheckpointer::new()))
            .build()
            .unwrap();

        let err = executor.resume("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ThreadNotFound(_)));

        executor
            .run(WorkflowState::new("wf".into(), "finished".into()))
            .await
            .unwrap();
        let err = executor.resume("finished", json!({})).await.unwrap_err();
        assert!(matches!(err, ExecutorError::NotSuspended(_)));
    }

    #[tokio::test]
    async fn test_resume_without_checkpointer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = ExecutorBuilder::new().with_graph(diamond(&seen)).build().unwrap();
        let err = executor.resume("t", json!({})).await.unwrap_err();
        assert!(matches!(err, ExecutorError::NoCheckpointer));
    }
}
