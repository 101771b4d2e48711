//! Relmon core: an in-memory tracker for typed directed relations.
//!
//! The tracker ingests entity and relation mutations and maintains, per
//! relation type, the set of most-referenced destination entities together
//! with the count they share. The index is maintained incrementally:
//!
//! 1. **Entity arena**: identifier interning with stable `u32` slot handles
//!    and a roaring bitmap of live ids for registry-wide scans.
//! 2. **Incoming sets**: for each (destination, type), an ordered set of the
//!    distinct sources, kept in identifier byte order (red-black tree).
//! 3. **Global type registry**: per live type, the current maximum
//!    incoming-set size and the ordered top-set of destinations achieving
//!    it, entries sorted by type name for deterministic reporting.
//!
//! Mutations are strictly sequential and total: referring to an unknown
//! entity, re-adding a present relation, or deleting an absent one is a
//! silent no-op. Cheap incremental updates cover every path except two,
//! where the information needed to maintain the top-set has been lost (the
//! sole top destination dropping below the maximum, and entity deletion);
//! those fall back to a full per-type recompute.
//!
//! ## Module organization
//!
//! - `arena`: entity registry (identifier ↔ handle)
//! - `ordered_set`: the red-black ordered set of handles
//! - `types`: relation-type interner and the per-entity type map
//! - `registry`: the global per-type (maximum, top-set) index
//! - `report`: report rows and their wire rendering

pub mod arena;
pub mod ordered_set;
pub mod registry;
pub mod report;
pub mod types;

use serde::{Deserialize, Serialize};

pub use arena::EntityArena;
pub use ordered_set::{KeySource, OrderedSet};
pub use registry::{TypeEntry, TypeRegistry};
pub use report::{Report, ReportRow};
pub use types::{TypeInterner, TypeMap};

// ============================================================================
// Handles
// ============================================================================

/// Stable handle to a live entity (an arena slot index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned relation-type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// RelGraph: the tracker
// ============================================================================

/// The relation tracker: entity arena, incoming-set column, type interner,
/// and the global type registry, mutated only through the command methods.
#[derive(Debug, Default)]
pub struct RelGraph {
    entities: EntityArena,
    /// Incoming-set column, parallel to the arena's slots: `incoming[i]` is
    /// the per-type map of sources pointing at the entity in slot `i`.
    incoming: Vec<TypeMap>,
    types: TypeInterner,
    registry: TypeRegistry,
}

impl RelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// `addent`: register an entity. Re-registering is a silent no-op.
    pub fn add_entity(&mut self, id: &str) -> EntityId {
        let (handle, _created) = self.entities.register(id);
        if self.incoming.len() <= handle.index() {
            self.incoming.resize_with(handle.index() + 1, TypeMap::default);
        }
        handle
    }

    /// `addrel`: add the relation `from -[rel_type]-> to`. Unknown entities
    /// and already-present relations are silent no-ops.
    pub fn add_relation(&mut self, from: &str, to: &str, rel_type: &str) {
        let (Some(from), Some(to)) = (self.entities.lookup(from), self.entities.lookup(to))
        else {
            return;
        };
        let ty = self.types.intern(rel_type);
        let index = self.registry.ensure(ty, &self.types);

        let set = self.incoming[to.index()].get_or_create(ty);
        if !set.insert(from, &self.entities) {
            return;
        }
        let n = set.len() as u32;

        let entry = self.registry.entry_mut(index);
        if n == entry.current_maximum {
            entry.top_set.insert(to, &self.entities);
        } else if n > entry.current_maximum {
            entry.top_set.clear();
            entry.top_set.insert(to, &self.entities);
            entry.current_maximum = n;
        }
    }

    /// `delrel`: remove the relation `from -[rel_type]-> to`. Unknown
    /// entities, unknown types, and absent relations are silent no-ops.
    pub fn del_relation(&mut self, from: &str, to: &str, rel_type: &str) {
        let (Some(from), Some(to)) = (self.entities.lookup(from), self.entities.lookup(to))
        else {
            return;
        };
        let Some(ty) = self.types.get(rel_type) else {
            return;
        };
        let Some(index) = self.registry.position(ty) else {
            return;
        };
        let Some(set) = self.incoming[to.index()].get_mut(ty) else {
            return;
        };
        if !set.remove(from, &self.entities) {
            return;
        }
        let n_after = set.len() as u32;

        let entry = self.registry.entry_mut(index);
        if n_after + 1 != entry.current_maximum {
            // The destination was below the maximum; nothing to maintain.
            return;
        }
        if entry.top_set.len() > 1 {
            // The remaining members still tie at the maximum.
            entry.top_set.remove(to, &self.entities);
        } else {
            // `to` was the sole top; the new maximum is unknown.
            self.recompute(ty);
        }
    }

    /// `delent`: delete an entity and every relation it participates in, in
    /// either direction. Unknown entities are silent no-ops.
    pub fn del_entity(&mut self, id: &str) {
        let Some(e) = self.entities.lookup(id) else {
            return;
        };

        // Snapshots: `recompute` only ever drops the entry of the type being
        // processed, so the up-front type list stays valid across the loop.
        let live: Vec<EntityId> = self.entities.live_ids().collect();
        let type_ids = self.registry.type_ids();

        for ty in type_ids {
            for &u in &live {
                if u == e {
                    // Relations `* -> e`: drop the whole incoming set.
                    self.incoming[u.index()].remove(ty);
                } else if let Some(set) = self.incoming[u.index()].get_mut(ty) {
                    // Relations `e -> u`.
                    set.remove(e, &self.entities);
                }
            }
            if let Some(index) = self.registry.position(ty) {
                self.registry.entry_mut(index).top_set.remove(e, &self.entities);
            }
            self.recompute(ty);
        }

        self.incoming[e.index()].clear();
        self.entities.unregister(id);
    }

    /// `report`: one row per live type, types ascending by name and
    /// destinations ascending by identifier. Pure.
    pub fn report(&self) -> Report {
        let mut rows = Vec::with_capacity(self.registry.len());
        for entry in self.registry.iter() {
            rows.push(ReportRow {
                rel_type: self.types.name(entry.rel_type).to_string(),
                destinations: entry
                    .top_set
                    .iter()
                    .map(|id| self.entities.name(id).to_string())
                    .collect(),
                maximum: entry.current_maximum,
            });
        }
        Report { rows }
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Rebuild a type's registry entry from the ground truth: scan every
    /// live entity's incoming set under `ty` and re-derive the maximum and
    /// the top-set. Drops the entry if no non-empty set remains.
    ///
    /// O(entities · log entities); only invoked when the incremental paths
    /// cannot know the new maximum.
    fn recompute(&mut self, ty: TypeId) {
        let Some(index) = self.registry.position(ty) else {
            return;
        };
        {
            let entry = self.registry.entry_mut(index);
            entry.current_maximum = 0;
            entry.top_set.clear();
        }

        for x in self.entities.live_ids() {
            let Some(set) = self.incoming[x.index()].get(ty) else {
                continue;
            };
            let m = set.len() as u32;
            if m == 0 {
                continue;
            }
            let entry = self.registry.entry_mut(index);
            if m == entry.current_maximum {
                entry.top_set.insert(x, &self.entities);
            } else if m > entry.current_maximum {
                entry.top_set.clear();
                entry.top_set.insert(x, &self.entities);
                entry.current_maximum = m;
            }
        }

        if self.registry.entry(index).current_maximum == 0 {
            self.registry.remove_at(index);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.lookup(id).is_some()
    }

    /// Whether `from -[rel_type]-> to` currently exists.
    pub fn contains_relation(&self, from: &str, to: &str, rel_type: &str) -> bool {
        let (Some(from), Some(to)) = (self.entities.lookup(from), self.entities.lookup(to))
        else {
            return false;
        };
        let Some(ty) = self.types.get(rel_type) else {
            return false;
        };
        self.incoming[to.index()]
            .get(ty)
            .is_some_and(|set| set.contains(from, &self.entities))
    }

    /// Number of distinct sources pointing at `to` under `rel_type`.
    pub fn incoming_count(&self, to: &str, rel_type: &str) -> usize {
        let Some(to) = self.entities.lookup(to) else {
            return 0;
        };
        let Some(ty) = self.types.get(rel_type) else {
            return 0;
        };
        self.incoming[to.index()].get(ty).map_or(0, |set| set.len())
    }

    /// The current maximum for a type, if it has any relation.
    pub fn current_maximum(&self, rel_type: &str) -> Option<u32> {
        let ty = self.types.get(rel_type)?;
        let index = self.registry.position(ty)?;
        Some(self.registry.entry(index).current_maximum)
    }

    /// The top destinations for a type, ascending by identifier.
    pub fn top_of(&self, rel_type: &str) -> Vec<String> {
        let Some(ty) = self.types.get(rel_type) else {
            return Vec::new();
        };
        let Some(index) = self.registry.position(ty) else {
            return Vec::new();
        };
        self.registry
            .entry(index)
            .top_set
            .iter()
            .map(|id| self.entities.name(id).to_string())
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Total number of live relations (sum of incoming-set sizes).
    pub fn relation_count(&self) -> usize {
        self.entities
            .live_ids()
            .map(|x| {
                self.incoming[x.index()]
                    .iter()
                    .map(|(_, set)| set.len())
                    .sum::<usize>()
            })
            .sum()
    }

    /// Number of types currently holding at least one relation.
    pub fn type_count(&self) -> usize {
        self.registry.len()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check the tracker's global invariants against the ground truth.
    ///
    /// Intended for test harnesses; it scans everything and is far too slow
    /// for per-command use in production streams.
    pub fn check_invariants(&self) -> Result<(), String> {
        // Registry entries: maximum tightness and top-set exactness.
        for entry in self.registry.iter() {
            let ty = entry.rel_type;
            let ty_name = self.types.name(ty);

            let mut true_max = 0u32;
            let mut expected: Vec<&str> = Vec::new();
            for x in self.entities.live_ids() {
                let Some(set) = self.incoming[x.index()].get(ty) else {
                    continue;
                };
                let m = set.len() as u32;
                if m == 0 {
                    continue;
                }
                if m > true_max {
                    true_max = m;
                    expected.clear();
                }
                if m == true_max {
                    expected.push(self.entities.name(x));
                }
            }

            if true_max == 0 {
                return Err(format!(
                    "registry entry for {ty_name:?} but no non-empty incoming set exists"
                ));
            }
            if entry.current_maximum != true_max {
                return Err(format!(
                    "maximum for {ty_name:?} is {} but ground truth is {true_max}",
                    entry.current_maximum
                ));
            }

            for id in entry.top_set.iter() {
                if !self.entities.is_live(id) {
                    return Err(format!(
                        "top-set of {ty_name:?} holds a dead handle {}",
                        id.raw()
                    ));
                }
            }
            expected.sort_unstable();
            let listed: Vec<&str> = entry.top_set.iter().map(|id| self.entities.name(id)).collect();
            if listed != expected {
                return Err(format!(
                    "top-set of {ty_name:?} is {listed:?}, expected {expected:?}"
                ));
            }
        }

        // Ground truth: non-empty incoming sets require a registry entry, and
        // every set holds live handles in strictly ascending order.
        for x in self.entities.live_ids() {
            for (ty, set) in self.incoming[x.index()].iter() {
                if !set.is_empty() && self.registry.position(ty).is_none() {
                    return Err(format!(
                        "non-empty incoming set under {:?} with no registry entry",
                        self.types.name(ty)
                    ));
                }
                for id in set.iter() {
                    if !self.entities.is_live(id) {
                        return Err(format!(
                            "incoming set of {:?} holds a dead handle {}",
                            self.entities.name(x),
                            id.raw()
                        ));
                    }
                }
                let members: Vec<&str> = set.iter().map(|id| self.entities.name(id)).collect();
                for pair in members.windows(2) {
                    if pair[0] >= pair[1] {
                        return Err(format!(
                            "incoming set of {:?} is not strictly ascending: {members:?}",
                            self.entities.name(x)
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
