// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info};

use crate::engine::TaskName;
use crate::errors::{Result, SeqdagError};
use crate::pipeline::task::PlannedTask;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Tasks producing one of this task's inputs.
    deps: Vec<TaskName>,
    /// Tasks reading one of this task's outputs.
    dependents: Vec<TaskName>,
}

/// Task graph derived from file paths: a task depends on whichever task
/// produces one of its inputs. Inputs nobody produces are expected to
/// exist already (aligned BAMs, the genome, the report template).
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
    /// Topological order, dependencies first.
    order: Vec<TaskName>,
    producers: HashMap<PathBuf, TaskName>,
}

impl DagGraph {
    /// Build the graph for a list of planned tasks.
    ///
    /// Fails if two tasks share a name or an output, or if the
    /// dependencies form a cycle.
    pub fn from_tasks(tasks: &[PlannedTask]) -> Result<Self> {
        let mut nodes: HashMap<TaskName, DagNode> = HashMap::new();
        for task in tasks {
            if nodes.insert(task.name.clone(), DagNode::default()).is_some() {
                return Err(SeqdagError::ConfigError(format!(
                    "task '{}' is defined twice",
                    task.name
                )));
            }
        }

        let mut producers: HashMap<PathBuf, TaskName> = HashMap::new();
        for task in tasks {
            for output in &task.outputs {
                if let Some(other) = producers.insert(output.clone(), task.name.clone()) {
                    return Err(SeqdagError::ConfigError(format!(
                        "'{}' is produced by both '{}' and '{}'",
                        output.display(),
                        other,
                        task.name
                    )));
                }
            }
        }

        // First pass: dependencies from inputs.
        for task in tasks {
            let mut deps: Vec<TaskName> = Vec::new();
            for input in &task.inputs {
                if let Some(producer) = producers.get(input) {
                    if producer != &task.name && !deps.contains(producer) {
                        deps.push(producer.clone());
                    }
                }
            }
            if let Some(node) = nodes.get_mut(&task.name) {
                node.deps = deps;
            }
        }

        // Second pass: dependents, in task order.
        for task in tasks {
            let deps = nodes
                .get(&task.name)
                .map(|n| n.deps.clone())
                .unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(task.name.clone());
                }
            }
        }

        // Edge direction: producer -> consumer.
        let order = {
            let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
            for task in tasks {
                graph.add_node(task.name.as_str());
            }
            for task in tasks {
                if let Some(node) = nodes.get(&task.name) {
                    for dep in &node.deps {
                        graph.add_edge(dep.as_str(), task.name.as_str(), ());
                    }
                }
            }

            match toposort(&graph, None) {
                Ok(order) => order.into_iter().map(str::to_string).collect::<Vec<_>>(),
                Err(cycle) => {
                    return Err(SeqdagError::DagCycle(format!(
                        "cycle detected in task DAG involving task '{}'",
                        cycle.node_id()
                    )));
                }
            }
        };

        debug!(tasks = order.len(), "task graph built");

        Ok(Self {
            nodes,
            order,
            producers,
        })
    }

    /// Task names in topological order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Task that writes `path`, if any.
    pub fn producer_of(&self, path: &Path) -> Option<&str> {
        self.producers.get(path).map(|s| s.as_str())
    }

    /// Resolve targets (task names or output paths) to the set of tasks that
    /// must run, upstream dependencies included. No targets selects every
    /// task.
    pub fn select(&self, targets: &[String]) -> Result<HashSet<TaskName>> {
        if targets.is_empty() {
            return Ok(self.order.iter().cloned().collect());
        }

        let mut stack: Vec<TaskName> = Vec::new();
        for target in targets {
            let name = if self.contains(target) {
                target.clone()
            } else if let Some(producer) = self.producer_of(Path::new(target)) {
                producer.to_string()
            } else {
                return Err(SeqdagError::TaskNotFound(target.clone()));
            };
            stack.push(name);
        }

        let mut selected = HashSet::new();
        while let Some(name) = stack.pop() {
            if selected.insert(name.clone()) {
                stack.extend(self.dependencies_of(&name).iter().cloned());
            }
        }
        Ok(selected)
    }
}

/// Settle output paths claimed by more than one task.
///
/// For each contested path the task with the highest rule priority wins and
/// the others are dropped from the plan. A tie at the top is an error.
pub fn resolve_producers(tasks: Vec<PlannedTask>) -> Result<Vec<PlannedTask>> {
    let losers: HashSet<usize> = {
        let mut claims: BTreeMap<&Path, Vec<usize>> = BTreeMap::new();
        for (i, task) in tasks.iter().enumerate() {
            for output in &task.outputs {
                claims.entry(output.as_path()).or_default().push(i);
            }
        }

        let mut losers = HashSet::new();
        for (path, claimants) in claims.iter().filter(|(_, c)| c.len() > 1) {
            let best = claimants
                .iter()
                .map(|&i| tasks[i].priority())
                .max()
                .unwrap_or(0);
            let winners: Vec<usize> = claimants
                .iter()
                .copied()
                .filter(|&i| tasks[i].priority() == best)
                .collect();

            if winners.len() > 1 {
                let names: Vec<&str> = winners.iter().map(|&i| tasks[i].name.as_str()).collect();
                return Err(SeqdagError::ConfigError(format!(
                    "tasks {} all produce '{}' with the same priority",
                    names.join(", "),
                    path.display()
                )));
            }

            let winner = &tasks[winners[0]].name;
            for &i in claimants.iter().filter(|&&i| i != winners[0]) {
                info!(
                    task = %tasks[i].name,
                    winner = %winner,
                    path = %path.display(),
                    "dropping lower-priority producer"
                );
                losers.insert(i);
            }
        }
        losers
    };

    Ok(tasks
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !losers.contains(i))
        .map(|(_, task)| task)
        .collect())
}
