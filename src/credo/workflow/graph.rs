//! Graph workflow executor
//!
//! Runs nodes whose dependencies have completed and whose route condition
//! holds, until a terminal stage is reached or nothing is ready. A node error
//! ends the run in [`Stage::Failed`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::condition::{self, Expression};
use super::nodes::Node;
use super::state::{Decision, Stage, WorkflowState};
use crate::adk::error::{CredoError, Result, WorkflowError};

const MAX_ITERATIONS: u32 = 32;

/// Pseudo node id used when the run fails between nodes
const ROUTER: &str = "router";

/// Node plus its position in the graph
pub struct CompiledNode {
    pub node: Arc<dyn Node>,
    pub depends_on: Vec<String>,
    /// Route condition; `None` means always taken
    pub when: Option<Expression>,
}

impl CompiledNode {
    pub fn entry(node: Arc<dyn Node>) -> Self {
        Self {
            node,
            depends_on: vec![],
            when: None,
        }
    }

    pub fn after(node: Arc<dyn Node>, dependency: &str) -> Self {
        Self {
            node,
            depends_on: vec![dependency.to_string()],
            when: None,
        }
    }

    pub fn when(mut self, condition: Expression) -> Self {
        self.when = Some(condition);
        self
    }
}

/// Progress notifications emitted while a run executes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    NodeStarted {
        node: String,
    },
    NodeCompleted {
        node: String,
        stage: Stage,
        message: Option<String>,
    },
    Routed {
        node: String,
        condition: String,
    },
    Finished {
        stage: Stage,
        decision: Decision,
        confidence_score: Option<u8>,
    },
    Failed {
        node: String,
        error: String,
    },
}

/// Compiled verification workflow
pub struct VerificationGraph {
    name: String,
    nodes: HashMap<String, CompiledNode>,
    node_order: Vec<String>, // Topological order for deterministic execution
}

impl VerificationGraph {
    /// Build a graph, rejecting duplicate ids, unknown dependencies and cycles
    pub fn new(name: impl Into<String>, nodes: Vec<CompiledNode>) -> Result<Self> {
        let mut declared: Vec<String> = Vec::with_capacity(nodes.len());
        let mut nodes_map = HashMap::new();

        for compiled in nodes {
            let id = compiled.node.id().to_string();
            if nodes_map.contains_key(&id) {
                return Err(WorkflowError::DuplicateNode(id).into());
            }
            declared.push(id.clone());
            nodes_map.insert(id, compiled);
        }

        for id in &declared {
            for dep in &nodes_map[id].depends_on {
                if !nodes_map.contains_key(dep) {
                    return Err(WorkflowError::UnknownDependency {
                        node: id.clone(),
                        dependency: dep.clone(),
                    }
                    .into());
                }
            }
        }

        let node_order = topological_order(&declared, &nodes_map)?;

        Ok(Self {
            name: name.into(),
            nodes: nodes_map,
            node_order,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node ids in execution order
    pub fn node_ids(&self) -> &[String] {
        &self.node_order
    }

    fn dependencies_satisfied(&self, node: &CompiledNode, completed: &HashSet<String>) -> bool {
        node.depends_on.iter().all(|d| completed.contains(d))
    }

    fn condition_met(&self, node: &CompiledNode, view: &Value) -> bool {
        node.when
            .as_ref()
            .map_or(true, |expr| condition::evaluate(expr, view))
    }

    fn ready_nodes(&self, completed: &HashSet<String>, state: &WorkflowState) -> Vec<String> {
        let view = state.to_json();
        self.node_order
            .iter()
            .filter(|id| !completed.contains(*id))
            .filter(|id| {
                let node = &self.nodes[*id];
                self.dependencies_satisfied(node, completed) && self.condition_met(node, &view)
            })
            .cloned()
            .collect()
    }

    /// Run the workflow for one provider and return its terminal state
    pub async fn run(&self, provider_id: &str) -> WorkflowState {
        self.execute(provider_id, None).await
    }

    /// Like [`run`](Self::run), emitting a [`WorkflowEvent`] per step
    pub async fn run_stream(
        &self,
        provider_id: &str,
        tx: mpsc::Sender<WorkflowEvent>,
    ) -> WorkflowState {
        self.execute(provider_id, Some(&tx)).await
    }

    async fn execute(
        &self,
        provider_id: &str,
        tx: Option<&mpsc::Sender<WorkflowEvent>>,
    ) -> WorkflowState {
        let emit = |event: WorkflowEvent| async move {
            if let Some(tx) = tx {
                // A closed receiver only means nobody is listening anymore
                let _ = tx.send(event).await;
            }
        };

        log::info!("Starting {} for provider {}", self.name, provider_id);

        let mut state = WorkflowState::new(provider_id);
        let mut completed: HashSet<String> = HashSet::new();
        let mut iteration = 0;

        while !state.is_terminal() {
            iteration += 1;
            if iteration > MAX_ITERATIONS {
                let err: CredoError = WorkflowError::MaxIterations(MAX_ITERATIONS).into();
                return self.abort(state, ROUTER, err, &emit).await;
            }

            let ready = self.ready_nodes(&completed, &state);
            if ready.is_empty() {
                let err: CredoError = WorkflowError::NoRoute(state.stage.as_str().into()).into();
                return self.abort(state, ROUTER, err, &emit).await;
            }

            for node_id in ready {
                let compiled = &self.nodes[&node_id];

                if let Some(when) = &compiled.when {
                    log::info!("Routing provider {} to {} ({})", provider_id, node_id, when);
                    emit(WorkflowEvent::Routed {
                        node: node_id.clone(),
                        condition: when.to_string(),
                    })
                    .await;
                }

                log::info!("Executing node: {}", node_id);
                emit(WorkflowEvent::NodeStarted {
                    node: node_id.clone(),
                })
                .await;

                let mut input = state.clone();
                input.steps.push(node_id.clone());

                match compiled.node.run(input).await {
                    Ok(next) => {
                        state = next;
                        completed.insert(node_id.clone());
                        log::info!("Node {} completed at stage {}", node_id, state.stage.as_str());
                        emit(WorkflowEvent::NodeCompleted {
                            node: node_id.clone(),
                            stage: state.stage,
                            message: state.status_log.last().cloned(),
                        })
                        .await;
                    }
                    Err(e) => {
                        state.steps.push(node_id.clone());
                        return self.abort(state, &node_id, e, &emit).await;
                    }
                }

                if state.is_terminal() {
                    break;
                }
            }
        }

        log::info!(
            "Provider {} finished: {:?} (confidence {:?})",
            provider_id,
            state.decision,
            state.confidence_score
        );
        emit(WorkflowEvent::Finished {
            stage: state.stage,
            decision: state.decision,
            confidence_score: state.confidence_score,
        })
        .await;

        state
    }

    async fn abort<F, Fut>(
        &self,
        state: WorkflowState,
        node: &str,
        error: CredoError,
        emit: &F,
    ) -> WorkflowState
    where
        F: Fn(WorkflowEvent) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        log::warn!("Node {} failed: {}", node, error);
        emit(WorkflowEvent::Failed {
            node: node.to_string(),
            error: error.to_string(),
        })
        .await;
        state.fail(node, &error)
    }
}

/// Kahn's algorithm, keeping declaration order among independent nodes
fn topological_order(
    declared: &[String],
    nodes: &HashMap<String, CompiledNode>,
) -> Result<Vec<String>> {
    let mut indegree: HashMap<&str, usize> = declared
        .iter()
        .map(|id| (id.as_str(), nodes[id].depends_on.len()))
        .collect();

    let mut queue: VecDeque<&str> = declared
        .iter()
        .map(String::as_str)
        .filter(|id| indegree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(declared.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for other in declared {
            if nodes[other].depends_on.iter().any(|d| d == id) {
                let remaining = indegree.entry(other.as_str()).or_default();
                *remaining -= 1;
                if *remaining == 0 {
                    queue.push_back(other.as_str());
                }
            }
        }
    }

    if order.len() < declared.len() {
        let stuck = declared
            .iter()
            .filter(|id| !order.contains(*id))
            .cloned()
            .collect();
        return Err(WorkflowError::CircularDependency(stuck).into());
    }

    Ok(order)
}
