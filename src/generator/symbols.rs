//! Collision-free name assignment within one naming scope.
//!
//! Names are assigned in two phases: every entity sharing a scope is
//! registered with [`SymbolTable::add`] first, then [`SymbolTable::get`]
//! resolves names. A requested name with a single claimant is returned as is;
//! when several entities request the same name each gets
//! `COLLIDES_<name>_ID<rank>`, where rank is the 1-based position of the
//! entity among the claimants ordered by source name, then registration order.

use super::diagnostics::{Diagnostic, Diagnostics, Severity};
use super::error::{GenerateError, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

#[derive(Debug)]
struct Claimant<K> {
    entity: K,
    source_name: String,
    order: usize,
}

#[derive(Debug)]
struct NameGroup<K> {
    claimants: Vec<Claimant<K>>,
    resolved: bool,
}

impl<K> Default for NameGroup<K> {
    fn default() -> Self {
        Self {
            claimants: Vec::new(),
            resolved: false,
        }
    }
}

#[derive(Debug)]
struct Claim {
    requested: String,
    resolved: Option<String>,
}

/// One naming scope (e.g. the types of a module, the fields of a record).
#[derive(Debug)]
pub struct SymbolTable<K> {
    scope: String,
    groups: HashMap<String, NameGroup<K>>,
    claims: HashMap<K, Claim>,
    registered: usize,
}

impl<K> SymbolTable<K>
where
    K: Clone + Eq + Hash + Display,
{
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            groups: HashMap::new(),
            claims: HashMap::new(),
            registered: 0,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Register `entity`'s intent to use `requested`.
    ///
    /// Fails if the entity is already registered in this scope, or if
    /// `requested` has already been handed out by [`get`](Self::get).
    pub fn add(
        &mut self,
        requested: impl Into<String>,
        entity: K,
        source_name: impl Into<String>,
    ) -> Result<()> {
        let requested = requested.into();
        if self.claims.contains_key(&entity) {
            return Err(GenerateError::DuplicateRegistration {
                scope: self.scope.clone(),
                entity: entity.to_string(),
            });
        }
        let group = self.groups.entry(requested.clone()).or_default();
        if group.resolved {
            return Err(GenerateError::NameAlreadyResolved {
                scope: self.scope.clone(),
                entity: entity.to_string(),
                name: requested,
            });
        }
        group.claimants.push(Claimant {
            entity: entity.clone(),
            source_name: source_name.into(),
            order: self.registered,
        });
        self.registered += 1;
        self.claims.insert(
            entity,
            Claim {
                requested,
                resolved: None,
            },
        );
        Ok(())
    }

    /// Final name of `entity`. Repeated calls return the cached name.
    ///
    /// The first resolution of a colliding name records one warning in
    /// `diagnostics`.
    pub fn get(&mut self, entity: &K, diagnostics: &mut Diagnostics) -> Result<String> {
        let claim = self
            .claims
            .get_mut(entity)
            .ok_or_else(|| GenerateError::UnregisteredSymbol {
                scope: self.scope.clone(),
                entity: entity.to_string(),
            })?;
        if let Some(name) = &claim.resolved {
            return Ok(name.clone());
        }

        let group = self
            .groups
            .get_mut(&claim.requested)
            .ok_or_else(|| GenerateError::UnregisteredSymbol {
                scope: self.scope.clone(),
                entity: entity.to_string(),
            })?;
        let first_resolution = !group.resolved;
        group.resolved = true;

        let name = if group.claimants.len() == 1 {
            claim.requested.clone()
        } else {
            let mut ranked: Vec<&Claimant<K>> = group.claimants.iter().collect();
            ranked.sort_by(|a, b| {
                a.source_name
                    .cmp(&b.source_name)
                    .then(a.order.cmp(&b.order))
            });
            if first_resolution {
                let names: Vec<&str> = ranked.iter().map(|c| c.source_name.as_str()).collect();
                diagnostics.push(
                    Diagnostic::new(
                        self.scope.clone(),
                        Severity::Warning,
                        "name_collision",
                        format!(
                            "{} entities requested the name '{}': {}",
                            ranked.len(),
                            claim.requested,
                            names.join(", ")
                        ),
                    )
                    .with_suggestion("rename the source entities so their names differ"),
                );
            }
            let rank = ranked
                .iter()
                .position(|c| &c.entity == entity)
                .map(|p| p + 1)
                .unwrap_or(0);
            format!("COLLIDES_{}_ID{}", claim.requested, rank)
        };

        claim.resolved = Some(name.clone());
        Ok(name)
    }
}
