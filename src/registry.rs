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

//! Archetype registry: interns bitmasks into dense archetype ids and keeps
//! the superset index (for the inclusive dispatcher) up to date.

use ahash::AHashMap;

use crate::archetype::{Archetype, ArchetypeId};
use crate::component::{ComponentInfo, COMPONENT_CAP};

pub struct ArchetypeRegistry {
    archetypes: Vec<Archetype>,
    by_bitmask: AHashMap<u64, ArchetypeId>,
}

impl ArchetypeRegistry {
    /// Bootstraps the empty archetype as id 0 (invariant I4).
    pub fn new(infos: &[Option<ComponentInfo>; COMPONENT_CAP + 1]) -> Self {
        let mut registry = Self {
            archetypes: Vec::new(),
            by_bitmask: AHashMap::new(),
        };
        let empty = registry.intern(0, infos);
        debug_assert_eq!(empty, 0);
        registry
    }

    /// Returns the id for `bitmask`, interning a new archetype record if
    /// this bitmask has never been seen before.
    pub fn intern(
        &mut self,
        bitmask: u64,
        infos: &[Option<ComponentInfo>; COMPONENT_CAP + 1],
    ) -> ArchetypeId {
        if let Some(&id) = self.by_bitmask.get(&bitmask) {
            return id;
        }
        let archetype = Archetype::new(bitmask, infos);
        self.archetypes.push(archetype);
        let id = self.archetypes.len() - 1;
        self.by_bitmask.insert(bitmask, id);
        self.rebuild_superset_index();
        id
    }

    pub fn archetype_of(&self, bitmask: u64) -> Option<ArchetypeId> {
        self.by_bitmask.get(&bitmask).copied()
    }

    pub fn get(&self, id: ArchetypeId) -> &Archetype {
        &self.archetypes[id]
    }

    pub fn get_mut(&mut self, id: ArchetypeId) -> &mut Archetype {
        &mut self.archetypes[id]
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Borrows two distinct archetypes mutably at once, for the migrator's
    /// cross-archetype component copy.
    pub fn pair_mut(
        &mut self,
        a: ArchetypeId,
        b: ArchetypeId,
    ) -> (&mut Archetype, &mut Archetype) {
        assert_ne!(a, b, "cannot borrow an archetype against itself");
        if a < b {
            let (left, right) = self.archetypes.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.archetypes.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    /// Rebuilds every archetype's superset list from scratch (spec §4.1:
    /// acceptable O(N^2), N is small in practice).
    fn rebuild_superset_index(&mut self) {
        let masks: Vec<u64> = self.archetypes.iter().map(Archetype::bitmask).collect();
        for a in 0..masks.len() {
            let mut supersets = Vec::new();
            for (b, &mask_b) in masks.iter().enumerate() {
                if a != b && (mask_b & masks[a]) == masks[a] {
                    supersets.push(b);
                }
            }
            self.archetypes[a].set_superset_ids(supersets);
        }
    }
}
