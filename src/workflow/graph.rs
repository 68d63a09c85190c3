// StateGraph - Node, edge and join management
use super::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Terminal pseudo-node; routing here ends the run
pub const END: &str = "__end__";

/// Default per-node timeout
pub const DEFAULT_NODE_TIMEOUT_SECS: u64 = 600;

/// Node function type - async function that processes state
#[async_trait]
pub trait NodeFunction: Send + Sync {
    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, String>;
}

/// Conditional routing function - decides next node (None or END stops)
pub type RouterFunction = Arc<dyn Fn(&WorkflowState) -> Option<String> + Send + Sync>;

#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("No entry point set")]
    NoEntryPoint,

    #[error("Graph not set")]
    MissingGraph,

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("{context} references non-existent node '{node}'")]
    UnknownNode { context: String, node: String },

    #[error("Join into '{target}' lists '{predecessor}', which never reaches it")]
    UnreachableJoin { target: String, predecessor: String },
}

/// Node types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeType {
    /// LLM reasoning (structured output or tool calling)
    Agent,
    /// Executes tools requested by an agent
    Tool,
    /// Calls an external service
    Action,
}

/// Edge types
#[derive(Clone)]
pub enum EdgeType {
    /// Fixed edge (always follows this path)
    Fixed(String),
    /// Conditional edge (router function decides)
    Conditional(RouterFunction),
    /// Parallel edges (fork to multiple nodes)
    Parallel(Vec<String>),
}

impl std::fmt::Debug for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Fixed(target) => write!(f, "Fixed({})", target),
            EdgeType::Conditional(_) => write!(f, "Conditional(<router>)"),
            EdgeType::Parallel(targets) => write!(f, "Parallel({:?})", targets),
        }
    }
}

/// Graph node
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub function: Arc<dyn NodeFunction>,
    pub description: String,
    pub timeout_seconds: u64,
}

/// StateGraph - The compiled workflow graph
pub struct StateGraph {
    nodes: HashMap<String, Node>,

    /// Edges: node_id -> EdgeType
    edges: HashMap<String, EdgeType>,

    /// Fan-in targets: node_id -> predecessors that must all finish first
    joins: HashMap<String, Vec<String>>,

    entry_point: String,
}

impl StateGraph {
    /// Next node(s) after `current_node`, given the merged state
    pub fn get_next_nodes(&self, current_node: &str, state: &WorkflowState) -> Vec<String> {
        let next = match self.edges.get(current_node) {
            Some(EdgeType::Fixed(target)) => vec![target.clone()],
            Some(EdgeType::Conditional(router)) => router(state).into_iter().collect(),
            Some(EdgeType::Parallel(targets)) => targets.clone(),
            None => vec![], // End node
        };

        next.into_iter().filter(|n| n != END).collect()
    }

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Predecessors a fan-in node waits for, if it is one
    pub fn join_predecessors(&self, node_id: &str) -> Option<&[String]> {
        self.joins.get(node_id).map(Vec::as_slice)
    }

    /// A node may run once every declared predecessor has completed
    pub fn is_ready(&self, node_id: &str, completed: &[String]) -> bool {
        match self.joins.get(node_id) {
            Some(preds) => preds.iter().all(|p| completed.contains(p)),
            None => true,
        }
    }

    pub fn get_node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    fn static_targets(edge: &EdgeType) -> Vec<String> {
        match edge {
            EdgeType::Fixed(target) => vec![target.clone()],
            EdgeType::Parallel(targets) => targets.clone(),
            EdgeType::Conditional(_) => vec![],
        }
    }

    /// Validate node references and joins
    fn compile(&self) -> Result<(), GraphError> {
        let known = |node: &str| node == END || self.nodes.contains_key(node);

        if !self.nodes.contains_key(&self.entry_point) {
            return Err(GraphError::UnknownNode {
                context: "Entry point".to_string(),
                node: self.entry_point.clone(),
            });
        }

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::UnknownNode {
                    context: "Edge source".to_string(),
                    node: from.clone(),
                });
            }
            // Conditional targets are validated at runtime
            for target in Self::static_targets(edge) {
                if !known(&target) {
                    return Err(GraphError::UnknownNode {
                        context: format!("Edge from '{}'", from),
                        node: target,
                    });
                }
            }
        }

        for (target, preds) in &self.joins {
            if !self.nodes.contains_key(target) {
                return Err(GraphError::UnknownNode {
                    context: "Join".to_string(),
                    node: target.clone(),
                });
            }
            for pred in preds {
                let reaches = self
                    .edges
                    .get(pred)
                    .map(|e| Self::static_targets(e).contains(target))
                    .unwrap_or(false);
                if !reaches {
                    return Err(GraphError::UnreachableJoin {
                        target: target.clone(),
                        predecessor: pred.clone(),
                    });
                }
            }
        }

        if self.has_cycles() {
            tracing::warn!("Graph contains cycles - this is allowed but may loop until the iteration limit");
        }

        tracing::info!(
            "✅ StateGraph compiled successfully: {} nodes, {} edges, {} joins",
            self.nodes.len(),
            self.edges.len(),
            self.joins.len()
        );

        Ok(())
    }

    /// Check for cycles using DFS (conditional edges are skipped)
    fn has_cycles(&self) -> bool {
        let mut visited = HashMap::new();
        let mut rec_stack = HashMap::new();

        self.nodes
            .keys()
            .any(|node_id| self.dfs_cycle_check(node_id, &mut visited, &mut rec_stack))
    }

    fn dfs_cycle_check(
        &self,
        node: &str,
        visited: &mut HashMap<String, bool>,
        rec_stack: &mut HashMap<String, bool>,
    ) -> bool {
        visited.insert(node.to_string(), true);
        rec_stack.insert(node.to_string(), true);

        if let Some(edge) = self.edges.get(node) {
            for target in Self::static_targets(edge) {
                if !visited.get(&target).unwrap_or(&false) {
                    if self.dfs_cycle_check(&target, visited, rec_stack) {
                        return true;
                    }
                } else if *rec_stack.get(&target).unwrap_or(&false) {
                    return true;
                }
            }
        }

        rec_stack.insert(node.to_string(), false);
        false
    }
}

/// Builder pattern for StateGraph
#[derive(Default)]
pub struct StateGraphBuilder {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, EdgeType>,
    joins: HashMap<String, Vec<String>>,
    entry_point: Option<String>,
    duplicate: Option<String>,
}

impl StateGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        mut self,
        id: &str,
        node_type: NodeType,
        function: Arc<dyn NodeFunction>,
        description: &str,
    ) -> Self {
        let node = Node {
            id: id.to_string(),
            node_type,
            function,
            description: description.to_string(),
            timeout_seconds: DEFAULT_NODE_TIMEOUT_SECS,
        };
        if self.nodes.insert(id.to_string(), node).is_some() {
            self.duplicate.get_or_insert_with(|| id.to_string());
        }
        self
    }

    pub fn with_timeout(mut self, id: &str, timeout_seconds: u64) -> Self {
        if let Some(node) = self.nodes.get_mut(id) {
            node.timeout_seconds = timeout_seconds;
        }
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges.insert(from.to_string(), EdgeType::Fixed(to.to_string()));
        self
    }

    pub fn add_conditional_edge(mut self, from: &str, router: RouterFunction) -> Self {
        self.edges.insert(from.to_string(), EdgeType::Conditional(router));
        self
    }

    /// Fork: all targets run concurrently in the next step
    pub fn add_parallel_edges(mut self, from: &str, targets: &[&str]) -> Self {
        self.edges.insert(
            from.to_string(),
            EdgeType::Parallel(targets.iter().map(|t| t.to_string()).collect()),
        );
        self
    }

    /// Fan-in: each predecessor gets a fixed edge to `target`, which runs
    /// only after all of them have completed
    pub fn add_join(mut self, predecessors: &[&str], target: &str) -> Self {
        for pred in predecessors {
            self.edges
                .insert(pred.to_string(), EdgeType::Fixed(target.to_string()));
        }
        self.joins.insert(
            target.to_string(),
            predecessors.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn set_entry_point(mut self, node_id: &str) -> Self {
        self.entry_point = Some(node_id.to_string());
        self
    }

    pub fn build(self) -> Result<StateGraph, GraphError> {
        if let Some(id) = self.duplicate {
            return Err(GraphError::DuplicateNode(id));
        }

        let graph = StateGraph {
            nodes: self.nodes,
            edges: self.edges,
            joins: self.joins,
            entry_point: self.entry_point.ok_or(GraphError::NoEntryPoint)?,
        };
        graph.compile()?;
        Ok(graph)
    }
}
