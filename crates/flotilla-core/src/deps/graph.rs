use std::collections::HashMap;

use tracing::warn;

use flotilla_model::Project;

/// Traversal mark of a service node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// A dependency edge that closes a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEdge {
    pub from: String,
    pub to: String,
}

/// Result of ordering a project's services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Every service exactly once, dependencies before their dependents.
    pub services: Vec<String>,
    /// Edges left out of the ordering because they point back into the current path.
    pub cycles: Vec<CycleEdge>,
}

/// Service dependency graph built from `depends_on` edges.
///
/// Edges to services the project does not declare are kept out of the graph; the waiter reports
/// them when the dependent is reconciled.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    edges: Vec<(&'a str, Vec<&'a str>)>,
}

impl<'a> DependencyGraph<'a> {
    pub fn from_project(project: &'a Project) -> Self {
        let edges = project
            .services
            .iter()
            .map(|(name, svc)| {
                let deps = svc
                    .depends_on
                    .iter()
                    .map(|d| d.service.as_str())
                    .filter(|d| project.services.contains_key(*d))
                    .collect();
                (name.as_str(), deps)
            })
            .collect();
        Self { edges }
    }

    /// Depth-first ordering, roots taken in name order.
    ///
    /// An edge into a node still in progress is reported once with a warning and treated
    /// as satisfied, so the traversal always terminates.
    pub fn order(&self) -> DependencyOrder {
        let index: HashMap<&str, usize> = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (*name, i))
            .collect();
        let mut walk = Walk {
            graph: self,
            index,
            marks: vec![Mark::Unvisited; self.edges.len()],
            out: DependencyOrder::default(),
        };
        for i in 0..self.edges.len() {
            walk.visit(i);
        }
        walk.out
    }
}

struct Walk<'g, 'a> {
    graph: &'g DependencyGraph<'a>,
    index: HashMap<&'a str, usize>,
    marks: Vec<Mark>,
    out: DependencyOrder,
}

impl Walk<'_, '_> {
    fn visit(&mut self, node: usize) {
        if self.marks[node] != Mark::Unvisited {
            return;
        }
        self.marks[node] = Mark::InProgress;
        let graph = self.graph;
        let (name, deps) = &graph.edges[node];
        for dep in deps {
            let Some(&next) = self.index.get(dep) else {
                continue;
            };
            match self.marks[next] {
                Mark::Unvisited => self.visit(next),
                Mark::InProgress => {
                    warn!(service = %name, dependency = %dep, "dependency cycle detected; edge left out of ordering");
                    self.out.cycles.push(CycleEdge {
                        from: name.to_string(),
                        to: dep.to_string(),
                    });
                }
                Mark::Done => {}
            }
        }
        self.marks[node] = Mark::Done;
        self.out.services.push(name.to_string());
    }
}
