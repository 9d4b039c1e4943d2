//! Stage graph - precedence derived from stage contracts

use crate::core::{
    stage::{StageId, StageSpec, TOPOLOGY},
    state::{Field, PipelineState},
    status::StageState,
};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Structural problems in a set of stage contracts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("field `{field}` is written by both {first} and {second}")]
    DuplicateWriter {
        field: Field,
        first: StageId,
        second: StageId,
    },

    #[error("stage {stage} reads `{field}` but no stage writes it")]
    UnsatisfiedRead { stage: StageId, field: Field },

    #[error("stage {0} writes the seed field `video_url`")]
    SeedWrite(StageId),

    #[error("dependency cycle through stage {0}")]
    Cycle(StageId),
}

/// Dependency graph over a fixed set of stages
#[derive(Debug, Clone)]
pub struct StageGraph {
    specs: BTreeMap<StageId, &'static StageSpec>,

    /// stage -> stages that write the fields it reads
    dependencies: BTreeMap<StageId, Vec<StageId>>,

    /// Topological order, deterministic
    execution_order: Vec<StageId>,
}

impl StageGraph {
    /// Graph of the digest pipeline
    pub fn digest() -> Self {
        Self::from_specs(&TOPOLOGY)
    }

    /// Build a graph from stage contracts
    ///
    /// Construction never fails; call [`StageGraph::validate`] to check the
    /// contracts form a well-founded DAG.
    pub fn from_specs(specs: &'static [StageSpec]) -> Self {
        let specs: BTreeMap<StageId, &'static StageSpec> =
            specs.iter().map(|spec| (spec.id, spec)).collect();

        let mut writers: BTreeMap<Field, StageId> = BTreeMap::new();
        for spec in specs.values() {
            for field in spec.writes {
                writers.entry(*field).or_insert(spec.id);
            }
        }

        let dependencies = specs
            .values()
            .map(|spec| {
                let mut deps: Vec<StageId> = spec
                    .reads
                    .iter()
                    .filter_map(|field| writers.get(field).copied())
                    .filter(|writer| *writer != spec.id)
                    .collect();
                deps.sort();
                deps.dedup();
                (spec.id, deps)
            })
            .collect();

        let execution_order = Self::topological_sort(&specs, &dependencies);

        Self {
            specs,
            dependencies,
            execution_order,
        }
    }

    /// Check single ownership of fields, satisfiable reads and acyclicity
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut writers: BTreeMap<Field, StageId> = BTreeMap::new();
        for spec in self.specs.values() {
            for field in spec.writes {
                if *field == Field::VideoUrl {
                    return Err(GraphError::SeedWrite(spec.id));
                }
                if let Some(first) = writers.insert(*field, spec.id) {
                    return Err(GraphError::DuplicateWriter {
                        field: *field,
                        first,
                        second: spec.id,
                    });
                }
            }
        }

        for spec in self.specs.values() {
            for field in spec.reads {
                if *field != Field::VideoUrl && !writers.contains_key(field) {
                    return Err(GraphError::UnsatisfiedRead {
                        stage: spec.id,
                        field: *field,
                    });
                }
            }
        }

        let mut finished = HashSet::new();
        let mut in_progress = HashSet::new();
        for id in self.specs.keys() {
            self.detect_cycle(*id, &mut finished, &mut in_progress)?;
        }

        Ok(())
    }

    fn detect_cycle(
        &self,
        id: StageId,
        finished: &mut HashSet<StageId>,
        in_progress: &mut HashSet<StageId>,
    ) -> Result<(), GraphError> {
        if finished.contains(&id) {
            return Ok(());
        }
        if !in_progress.insert(id) {
            return Err(GraphError::Cycle(id));
        }
        for dep in self.dependencies(id) {
            self.detect_cycle(*dep, finished, in_progress)?;
        }
        in_progress.remove(&id);
        finished.insert(id);
        Ok(())
    }

    /// Get the contract of a stage
    pub fn spec(&self, id: StageId) -> Option<&'static StageSpec> {
        self.specs.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Direct upstream stages
    pub fn dependencies(&self, id: StageId) -> &[StageId] {
        self.dependencies.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct downstream stages, in execution order
    pub fn dependents(&self, id: StageId) -> Vec<StageId> {
        self.execution_order
            .iter()
            .copied()
            .filter(|other| self.dependencies(*other).contains(&id))
            .collect()
    }

    /// Every stage reachable downstream of `id`, in execution order
    pub fn descendants(&self, id: StageId) -> Vec<StageId> {
        let mut reached: HashSet<StageId> = HashSet::new();
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for next in self.dependents(current) {
                if reached.insert(next) {
                    frontier.push(next);
                }
            }
        }

        self.execution_order
            .iter()
            .copied()
            .filter(|stage| reached.contains(stage))
            .collect()
    }

    /// Get execution order (topological sort)
    pub fn execution_order(&self) -> &[StageId] {
        &self.execution_order
    }

    /// Position of a stage in the execution order
    pub fn rank(&self, id: StageId) -> usize {
        self.execution_order
            .iter()
            .position(|stage| *stage == id)
            .unwrap_or(usize::MAX)
    }

    /// Pending stages whose inputs are all present in `state`
    pub fn ready_stages(
        &self,
        state: &PipelineState,
        statuses: &BTreeMap<StageId, StageState>,
    ) -> Vec<StageId> {
        self.execution_order
            .iter()
            .copied()
            .filter(|id| matches!(statuses.get(id), Some(StageState::Pending)))
            .filter(|id| {
                self.spec(*id)
                    .is_some_and(|spec| spec.reads.iter().all(|field| state.has(*field)))
            })
            .collect()
    }

    fn topological_sort(
        specs: &BTreeMap<StageId, &'static StageSpec>,
        dependencies: &BTreeMap<StageId, Vec<StageId>>,
    ) -> Vec<StageId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();

        // BTreeMap keys are already sorted, which keeps the order deterministic
        for id in specs.keys() {
            Self::visit(*id, dependencies, &mut visited, &mut result);
        }

        result
    }

    fn visit(
        id: StageId,
        dependencies: &BTreeMap<StageId, Vec<StageId>>,
        visited: &mut HashSet<StageId>,
        result: &mut Vec<StageId>,
    ) {
        // Marking before recursion stops cycles from looping; validate() reports them
        if !visited.insert(id) {
            return;
        }

        if let Some(deps) = dependencies.get(&id) {
            for dep in deps {
                Self::visit(*dep, dependencies, visited, result);
            }
        }

        result.push(id);
    }
}
