//! Class inheritance graph.
//!
//! Edges point from a class to its resolved base. Bases that do not resolve to
//! a class of the project (library classes, mixin calls, anything the resolver
//! cannot follow) have no edge, so every walk stops there.

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use tracing::debug;

use crate::model::ClassId;
use crate::project::Project;
use crate::resolve::Resolver;

#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    graph: DiGraphMap<ClassId, ()>,
}

impl ClassHierarchy {
    pub fn build(project: &Project, resolver: &Resolver<'_>) -> Self {
        let mut graph = DiGraphMap::new();
        for id in project.class_ids() {
            graph.add_node(id);
            let class = project.class(id);
            let Some(base) = &class.base else {
                continue;
            };
            match resolver.resolve_type(id.file, base) {
                Some(base_id) => {
                    graph.add_edge(id, base_id, ());
                }
                None => debug!(
                    class = %class.name,
                    base = %base,
                    "base class outside the project"
                ),
            }
        }
        Self { graph }
    }

    /// Immediate in-project base.
    pub fn base(&self, id: ClassId) -> Option<ClassId> {
        self.graph
            .neighbors_directed(id, Direction::Outgoing)
            .next()
    }

    /// In-project ancestors, nearest first. Stops at the first external base
    /// and at cycles.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut current = self.base(id);
        while let Some(base) = current {
            if !seen.insert(base) {
                break;
            }
            out.push(base);
            current = self.base(base);
        }
        out
    }

    /// The class followed by its ancestors.
    pub fn chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id));
        chain
    }

    /// Instance member names declared by any in-project ancestor.
    pub fn inherited_member_names<'p>(&self, project: &'p Project, id: ClassId) -> HashSet<&'p str> {
        self.ancestors(id)
            .into_iter()
            .flat_map(|ancestor| project.class(ancestor).member_names())
            .collect()
    }

    /// Classes in the chain of `id` that declare `name`: the nearest one an
    /// access resolves to, plus every overridden declaration above it.
    pub fn declaring_classes(&self, project: &Project, id: ClassId, name: &str) -> Vec<ClassId> {
        self.chain(id)
            .into_iter()
            .filter(|c| project.class(*c).declares(name))
            .collect()
    }
}
