//! Per-target module graph construction.
//!
//! Starting from a target's extra modules, pulls in every module reachable
//! through dependency edges, composing each rule exactly once. Private
//! dependencies are included in the graph (they must still build) but are
//! marked so the settings merger can keep them out of dependents' view.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::core::context::Context;
use crate::core::registry::RuleRegistry;
use crate::core::target_rule::TargetRule;
use crate::resolver::compose::{compose, ModuleSettings};
use crate::resolver::errors::ResolutionError;
use crate::util::diagnostic::Diagnostic;

/// Edge kind between a module and one of its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Public,
    Private,
}

#[derive(Debug, Clone)]
struct NodeInfo {
    name: String,
    /// Declaration index in the registry; topological tie-breaker.
    decl_index: usize,
}

/// The assembled dependency graph for one target.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    graph: DiGraph<NodeInfo, DependencyKind>,
    node_index: BTreeMap<String, NodeIndex>,
    settings: BTreeMap<String, ModuleSettings>,
    /// Module names in discovery order (extra modules first, then BFS).
    insertion_order: Vec<String>,
}

impl ModuleGraph {
    /// Build the graph for a target draft.
    ///
    /// Returns the graph plus non-fatal diagnostics (redundant dependency
    /// declarations). Unknown module references and invalid predicates are
    /// fatal.
    pub fn build(
        registry: &RuleRegistry,
        ctx: &Context,
        target: &TargetRule,
    ) -> Result<(ModuleGraph, Vec<Diagnostic>), ResolutionError> {
        let mut diagnostics = Vec::new();
        let mut settings: BTreeMap<String, ModuleSettings> = BTreeMap::new();
        let mut insertion_order = Vec::new();

        let mut queue: VecDeque<(String, String)> = target
            .extra_modules
            .iter()
            .map(|m| (target.name.clone(), m.clone()))
            .collect();

        // Discover and compose every reachable module once.
        while let Some((referrer, name)) = queue.pop_front() {
            if settings.contains_key(&name) {
                continue;
            }
            if registry.module(&name).is_none() {
                return Err(ResolutionError::UnknownModuleReference {
                    referrer,
                    missing: name,
                });
            }

            let mut composed = compose(registry, ctx, &name)?;

            // A dependency declared both publicly and privately is
            // redundant; the public declaration wins.
            let redundant: Vec<String> = composed
                .private_dependencies
                .iter()
                .filter(|d| composed.public_dependencies.contains(d))
                .cloned()
                .collect();
            for dep in redundant {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "module `{}` declares `{}` as both a public and a private dependency",
                        name, dep
                    ))
                    .with_suggestion("Keep only the public declaration".to_string()),
                );
                composed.private_dependencies.retain(|d| *d != dep);
            }

            for dep in composed.all_dependencies() {
                queue.push_back((name.clone(), dep.clone()));
            }

            insertion_order.push(name.clone());
            settings.insert(name, composed);
        }

        // All nodes are known; wire up the graph.
        let mut graph = DiGraph::new();
        let mut node_index = BTreeMap::new();
        for name in &insertion_order {
            let decl_index = registry.declaration_index(name).unwrap_or(usize::MAX);
            let idx = graph.add_node(NodeInfo {
                name: name.clone(),
                decl_index,
            });
            node_index.insert(name.clone(), idx);
        }

        for name in &insertion_order {
            let from = node_index[name];
            let module = &settings[name];
            for dep in &module.public_dependencies {
                graph.add_edge(from, node_index[dep], DependencyKind::Public);
            }
            for dep in &module.private_dependencies {
                graph.add_edge(from, node_index[dep], DependencyKind::Private);
            }
        }

        tracing::debug!(
            target = %target.name,
            modules = insertion_order.len(),
            "module graph assembled"
        );

        Ok((
            ModuleGraph {
                graph,
                node_index,
                settings,
                insertion_order,
            },
            diagnostics,
        ))
    }

    /// Composed settings for a module.
    pub fn settings(&self, name: &str) -> Option<&ModuleSettings> {
        self.settings.get(name)
    }

    /// Module names in discovery order.
    pub fn module_names(&self) -> &[String] {
        &self.insertion_order
    }

    /// Number of modules in the graph.
    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    /// All edges in deterministic (discovery, declaration) order.
    pub fn edges(&self) -> Vec<(String, String, DependencyKind)> {
        let mut edges = Vec::new();
        for name in &self.insertion_order {
            let module = &self.settings[name];
            for dep in &module.public_dependencies {
                edges.push((name.clone(), dep.clone(), DependencyKind::Public));
            }
            for dep in &module.private_dependencies {
                edges.push((name.clone(), dep.clone(), DependencyKind::Private));
            }
        }
        edges
    }

    /// Detect dependency cycles.
    ///
    /// Depth-first traversal with an explicit recursion stack; on a back
    /// edge the full ordered cycle path is reported.
    pub fn check_cycles(&self) -> Result<(), ResolutionError> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            InStack,
            Done,
        }

        let mut state: BTreeMap<&str, State> = self
            .insertion_order
            .iter()
            .map(|n| (n.as_str(), State::Unvisited))
            .collect();

        fn visit<'a>(
            graph: &'a ModuleGraph,
            name: &'a str,
            state: &mut BTreeMap<&'a str, State>,
            stack: &mut Vec<&'a str>,
        ) -> Result<(), ResolutionError> {
            state.insert(name, State::InStack);
            stack.push(name);

            let module = &graph.settings[name];
            for dep in module.all_dependencies() {
                match state.get(dep.as_str()).copied() {
                    Some(State::InStack) => {
                        let start = stack.iter().position(|n| *n == dep).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[start..].iter().map(|s| s.to_string()).collect();
                        path.push(dep.clone());
                        return Err(ResolutionError::CyclicDependency { path });
                    }
                    Some(State::Unvisited) => visit(graph, dep, state, stack)?,
                    _ => {}
                }
            }

            stack.pop();
            state.insert(name, State::Done);
            Ok(())
        }

        let mut stack = Vec::new();
        for name in &self.insertion_order {
            if state[name.as_str()] == State::Unvisited {
                visit(self, name, &mut state, &mut stack)?;
            }
        }

        Ok(())
    }

    /// Topological order: dependencies before dependents, ties broken by
    /// declaration order in the registry.
    ///
    /// Assumes `check_cycles` has passed; nodes stuck in a cycle would be
    /// silently dropped here.
    pub fn topological_order(&self) -> Vec<String> {
        use petgraph::Direction;

        let mut out_degree: BTreeMap<NodeIndex, usize> = self
            .node_index
            .values()
            .map(|&idx| {
                (
                    idx,
                    self.graph.neighbors_directed(idx, Direction::Outgoing).count(),
                )
            })
            .collect();

        // Ready set keyed by (declaration index, name) for determinism.
        let mut ready: BTreeSet<(usize, String)> = out_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&idx, _)| {
                let info = &self.graph[idx];
                (info.decl_index, info.name.clone())
            })
            .collect();

        let mut order = Vec::with_capacity(self.insertion_order.len());
        while let Some(entry) = ready.iter().next().cloned() {
            ready.remove(&entry);
            let (_, name) = entry;
            let idx = self.node_index[&name];
            order.push(name);

            for dependent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if let Some(deg) = out_degree.get_mut(&dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        let info = &self.graph[dependent];
                        ready.insert((info.decl_index, info.name.clone()));
                    }
                }
            }
        }

        order
    }

    /// The set of modules whose public surface a module sees: its direct
    /// dependencies (public or private), expanded transitively through
    /// public edges only. Private dependencies of other modules never
    /// enter the set.
    pub fn visible_modules(&self, name: &str) -> Vec<String> {
        let mut visible: Vec<String> = Vec::new();
        let mut queue: VecDeque<&String> = match self.settings.get(name) {
            Some(module) => module.all_dependencies().collect(),
            None => return visible,
        };

        while let Some(dep) = queue.pop_front() {
            if dep == name || visible.contains(dep) {
                continue;
            }
            visible.push(dep.clone());
            if let Some(module) = self.settings.get(dep) {
                for transitive in &module.public_dependencies {
                    queue.push_back(transitive);
                }
            }
        }

        visible
    }
}
