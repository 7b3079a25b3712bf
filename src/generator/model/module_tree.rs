//! The generated crate: root module, nested sub-modules and the dependency set.

use super::types::{ModulePath, TypeGraph};
use crate::ids::{ClientId, EnumId, MarkerId, RecordId, UnionId};
use std::ops::Deref;

/// A dependency of the generated crate, without version information.
/// Versions are applied when the manifest is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateDependency {
    pub name: String,
    pub features: Vec<String>,
}

/// Dependency set with feature merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDependencies {
    items: Vec<CrateDependency>,
}

impl CrateDependencies {
    /// Add `name` with `features`. Adding an existing dependency merges its
    /// features instead of duplicating it.
    pub fn add(&mut self, name: &str, features: &[&str]) {
        let dep = match self.items.iter_mut().position(|d| d.name == name) {
            Some(i) => &mut self.items[i],
            None => {
                self.items.push(CrateDependency {
                    name: name.to_string(),
                    features: Vec::new(),
                });
                let last = self.items.len() - 1;
                &mut self.items[last]
            }
        };
        for feature in features {
            if !dep.features.iter().any(|f| f == feature) {
                dep.features.push(feature.to_string());
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrateDependency> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn sort(&mut self) {
        self.items.sort_by(|a, b| a.name.cmp(&b.name));
        for dep in &mut self.items {
            dep.features.sort();
        }
    }
}

/// Root package or sub-module. Entities are referenced by arena id.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Final module name; empty for the root
    pub name: String,
    pub path: ModulePath,
    pub enums: Vec<EnumId>,
    pub unions: Vec<UnionId>,
    pub records: Vec<RecordId>,
    pub markers: Vec<MarkerId>,
    pub clients: Vec<ClientId>,
    pub sub_modules: Vec<Module>,
}

impl Module {
    pub fn new(name: impl Into<String>, path: ModulePath) -> Self {
        Self {
            name: name.into(),
            path,
            ..Default::default()
        }
    }

    pub fn has_models(&self) -> bool {
        !(self.enums.is_empty()
            && self.unions.is_empty()
            && self.records.is_empty()
            && self.markers.is_empty())
    }

    pub fn has_content(&self) -> bool {
        self.has_models() || !self.clients.is_empty()
    }

    /// Whether this module or any module below it declares clients.
    pub fn has_clients_recursive(&self) -> bool {
        !self.clients.is_empty() || self.sub_modules.iter().any(Module::has_clients_recursive)
    }

    /// Get or create the child module named `name`.
    pub fn child_mut(&mut self, name: &str) -> &mut Module {
        let index = match self.sub_modules.iter().position(|m| m.name == name) {
            Some(i) => i,
            None => {
                let path = self.path.child(name);
                self.sub_modules.push(Module::new(name, path));
                self.sub_modules.len() - 1
            }
        };
        &mut self.sub_modules[index]
    }

    /// Get or create the module at `path`, relative to this one.
    pub fn descendant_mut(&mut self, path: &ModulePath) -> &mut Module {
        let mut module = self;
        for segment in path.segments() {
            module = module.child_mut(segment);
        }
        module
    }

    /// This module followed by every descendant, depth first.
    pub fn walk(&self) -> Vec<&Module> {
        let mut out = vec![self];
        for sub in &self.sub_modules {
            out.extend(sub.walk());
        }
        out
    }

    fn sort(&mut self, graph: &TypeGraph) {
        self.enums.sort_by(|a, b| graph.enum_(*a).name.cmp(&graph.enum_(*b).name));
        self.unions.sort_by(|a, b| graph.union(*a).name.cmp(&graph.union(*b).name));
        self.records.sort_by(|a, b| graph.record(*a).name.cmp(&graph.record(*b).name));
        self.markers.sort_by(|a, b| graph.marker(*a).name.cmp(&graph.marker(*b).name));
        self.clients.sort_by(|a, b| graph.client(*a).name.cmp(&graph.client(*b).name));
        self.sub_modules.sort_by(|a, b| a.name.cmp(&b.name));
        for sub in &mut self.sub_modules {
            sub.sort(graph);
        }
    }
}

/// The adapted crate, before sorting.
#[derive(Debug, Clone)]
pub struct Crate {
    pub name: String,
    pub version: String,
    pub dependencies: CrateDependencies,
    pub graph: TypeGraph,
    pub root: Module,
}

impl Crate {
    /// Sort every collection in the tree by name, recursively.
    ///
    /// Emitters only accept the resulting [`SortedCrate`].
    pub fn sort(mut self) -> SortedCrate {
        for e in &mut self.graph.enums {
            e.values.sort_by(|a, b| a.name.cmp(&b.name));
        }
        for r in &mut self.graph.records {
            r.fields.sort_by(|a, b| a.name.cmp(&b.name));
        }
        for u in &mut self.graph.unions {
            u.members.sort_by(|a, b| a.name.cmp(&b.name));
        }
        for c in &mut self.graph.clients {
            c.methods.sort_by(|a, b| a.name.cmp(&b.name));
            for m in &mut c.methods {
                m.options.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }
        self.dependencies.sort();
        self.root.sort(&self.graph);
        SortedCrate(self)
    }
}

/// A [`Crate`] whose collections are all in emission order.
#[derive(Debug, Clone)]
pub struct SortedCrate(Crate);

impl Deref for SortedCrate {
    type Target = Crate;

    fn deref(&self) -> &Crate {
        &self.0
    }
}
