// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Entity identity table: id liveness, archetype location, and the
//! recycling freelist.

use crate::archetype::ArchetypeId;
use crate::error::{EcsError, Result};

/// Opaque 64-bit entity identifier. `0` is the reserved null entity and is
/// never returned by [`EntityTable::create`].
pub type EntityId = u64;

/// Entity id space sentinel (spec: "a large sentinel, e.g. 10^8").
pub const ENTITY_CAP: u64 = 100_000_000;

/// An entity's slot within its current archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype_id: ArchetypeId,
    pub order: usize,
}

impl EntityLocation {
    const NULL: EntityLocation = EntityLocation {
        archetype_id: 0,
        order: 0,
    };
}

/// Maps live entity ids to `(archetype, slot)` pairs and recycles destroyed
/// ids through a LIFO freelist when recycling is enabled.
pub struct EntityTable {
    /// `ids[e] == e` when `e` is alive, `0` otherwise. Indexed directly by
    /// entity id; index `0` is always dead (the null entity).
    ids: Vec<u64>,
    locations: Vec<EntityLocation>,
    /// Destroyed ids eligible for reuse, most-recently-freed first.
    freelist: Vec<u64>,
    /// Whether a dead id is already sitting in `freelist` (avoids double
    /// queuing from `reuse()` after an id was freed with recycling on).
    queued: Vec<bool>,
    reuse: bool,
    next_id: u64,
}

impl EntityTable {
    pub fn new() -> Self {
        Self {
            ids: vec![0],
            locations: vec![EntityLocation::NULL],
            freelist: Vec::new(),
            queued: vec![false],
            reuse: false,
            next_id: 1,
        }
    }

    pub fn set_reuse(&mut self, reuse: bool) {
        self.reuse = reuse;
    }

    pub fn reuse_enabled(&self) -> bool {
        self.reuse
    }

    /// `id[e] == 0` for every dead slot; `e != 0` and `id[e] == e` for every
    /// live one (invariant I6 plus the identity half of I1).
    pub fn is_alive(&self, e: EntityId) -> bool {
        e != 0 && (e as usize) < self.ids.len() && self.ids[e as usize] == e
    }

    /// Allocate a fresh or recycled id. The caller is responsible for
    /// placing the new entity into the empty archetype and calling
    /// [`EntityTable::set_location`] with the real slot.
    pub fn create(&mut self) -> Result<EntityId> {
        let id = if self.reuse {
            match self.freelist.pop() {
                Some(id) => {
                    self.queued[id as usize] = false;
                    id
                }
                None => self.fresh_id()?,
            }
        } else {
            self.fresh_id()?
        };
        self.ensure_capacity(id);
        self.ids[id as usize] = id;
        self.locations[id as usize] = EntityLocation::NULL;
        Ok(id)
    }

    fn fresh_id(&mut self) -> Result<EntityId> {
        loop {
            let candidate = self.next_id;
            if candidate >= ENTITY_CAP {
                return Err(EcsError::EntityExhausted);
            }
            self.next_id += 1;
            // Defensive: skip ids whose slot is already live. Cannot happen
            // through this table's own `create`, but keeps the invariant
            // if a future caller seeds slots out of band.
            if (candidate as usize) >= self.ids.len() || self.ids[candidate as usize] != candidate
            {
                return Ok(candidate);
            }
        }
    }

    fn ensure_capacity(&mut self, id: EntityId) {
        let needed = id as usize + 1;
        if self.ids.len() < needed {
            self.ids.resize(needed, 0);
            self.locations.resize(needed, EntityLocation::NULL);
            self.queued.resize(needed, false);
        }
    }

    pub fn set_location(&mut self, e: EntityId, loc: EntityLocation) {
        debug_assert!(self.is_alive(e));
        self.locations[e as usize] = loc;
    }

    pub fn location(&self, e: EntityId) -> Option<EntityLocation> {
        if self.is_alive(e) {
            Some(self.locations[e as usize])
        } else {
            None
        }
    }

    /// Returns `false` (a no-op) for `0` or an already-dead entity.
    pub fn destroy(&mut self, e: EntityId) -> bool {
        if !self.is_alive(e) {
            return false;
        }
        self.ids[e as usize] = 0;
        self.locations[e as usize] = EntityLocation::NULL;
        if self.reuse {
            self.freelist.push(e);
            self.queued[e as usize] = true;
        }
        true
    }

    /// Explicit batch recycling: sweep the allocated id range and queue any
    /// currently-dead id that isn't already on the freelist.
    pub fn reuse_sweep(&mut self) {
        for id in 1..self.ids.len() as u64 {
            let idx = id as usize;
            if self.ids[idx] == 0 && !self.queued[idx] {
                self.freelist.push(id);
                self.queued[idx] = true;
            }
        }
    }

    pub fn freelist_len(&self) -> usize {
        self.freelist.len()
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}
