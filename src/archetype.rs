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

//! A single archetype's storage: the dense entity slot array plus one
//! column per component type the archetype carries.

use smallvec::SmallVec;

use crate::component::{ComponentId, ComponentInfo, COMPONENT_CAP};
use crate::entity::EntityId;
use crate::storage::Column;

/// Dense id assigned to an interned bitmask. `0` names the empty archetype.
pub type ArchetypeId = usize;

/// Sentinel stored in `components_order` for a component not present in
/// this archetype.
const NONE: usize = usize::MAX;

/// One archetype's column-oriented storage.
pub struct Archetype {
    bitmask: u64,
    /// Component ids present in this archetype, ascending.
    components_id: SmallVec<[ComponentId; 8]>,
    /// `components_order[cid]` -> column index of `cid`, or [`NONE`].
    components_order: [usize; COMPONENT_CAP + 1],
    /// Dense slot array: `entities[i]` is the entity occupying slot `i`.
    entities: Vec<EntityId>,
    columns: Vec<Column>,
    /// Other archetypes whose bitmask is a strict superset of this one's.
    superset_ids: Vec<ArchetypeId>,
}

impl Archetype {
    /// Builds a fresh, empty archetype record for `bitmask`, scanning its
    /// set bits low-to-high to derive `components_id` in canonical order
    /// (spec §4.1 "intern").
    pub fn new(bitmask: u64, infos: &[Option<ComponentInfo>; COMPONENT_CAP + 1]) -> Self {
        let mut components_id = SmallVec::new();
        let mut components_order = [NONE; COMPONENT_CAP + 1];
        let mut columns = Vec::new();

        for cid in 1..=COMPONENT_CAP {
            if bitmask & (1u64 << (cid - 1)) != 0 {
                let info = infos[cid].expect("bit set in archetype for an unregistered component");
                components_order[cid] = columns.len();
                columns.push(Column::new(info.bytesize));
                components_id.push(cid as ComponentId);
            }
        }

        Self {
            bitmask,
            components_id,
            components_order,
            entities: Vec::new(),
            columns,
            superset_ids: Vec::new(),
        }
    }

    pub fn bitmask(&self) -> u64 {
        self.bitmask
    }

    pub fn num_components(&self) -> usize {
        self.components_id.len()
    }

    pub fn components_id(&self) -> &[ComponentId] {
        &self.components_id
    }

    pub fn column_index(&self, cid: ComponentId) -> Option<usize> {
        if cid == 0 || cid as usize > COMPONENT_CAP {
            return None;
        }
        let idx = self.components_order[cid as usize];
        (idx != NONE).then_some(idx)
    }

    pub fn has_component(&self, cid: ComponentId) -> bool {
        self.column_index(cid).is_some()
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn column(&self, cid: ComponentId) -> Option<&Column> {
        self.column_index(cid).map(|idx| &self.columns[idx])
    }

    pub fn column_mut(&mut self, cid: ComponentId) -> Option<&mut Column> {
        let idx = self.column_index(cid)?;
        Some(&mut self.columns[idx])
    }

    pub fn column_by_index(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    pub fn column_by_index_mut(&mut self, idx: usize) -> &mut Column {
        &mut self.columns[idx]
    }

    /// Appends a zeroed slot for `entity` to the slot array and every
    /// column, keeping them in lockstep (invariant I2). Returns the new
    /// slot index.
    pub fn alloc_slot(&mut self, entity: EntityId) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in &mut self.columns {
            column.push_zeroed();
        }
        row
    }

    /// Scramble-deletes `row` from the slot array and every column in
    /// lockstep. Returns the entity promoted into `row`, if any (spec
    /// §4.2/§4.4 step 6).
    pub fn remove_slot(&mut self, row: usize) -> Option<EntityId> {
        debug_assert!(row < self.entities.len());
        let last = self.entities.len() - 1;
        let moved = last != row;
        self.entities.swap_remove(row);
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        if moved {
            Some(self.entities[row])
        } else {
            None
        }
    }

    pub fn superset_ids(&self) -> &[ArchetypeId] {
        &self.superset_ids
    }

    pub(crate) fn set_superset_ids(&mut self, ids: Vec<ArchetypeId>) {
        self.superset_ids = ids;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos_with(sizes: &[(usize, usize)]) -> [Option<ComponentInfo>; COMPONENT_CAP + 1] {
        let mut infos = [None; COMPONENT_CAP + 1];
        for &(cid, bytesize) in sizes {
            infos[cid] = Some(ComponentInfo::new(bytesize, None, None));
        }
        infos
    }

    #[test]
    fn scans_bits_low_to_high() {
        let infos = infos_with(&[(1, 4), (3, 8), (5, 2)]);
        let bitmask = (1 << 0) | (1 << 2) | (1 << 4); // components 1, 3, 5
        let arch = Archetype::new(bitmask, &infos);
        assert_eq!(arch.components_id(), &[1, 3, 5]);
    }

    #[test]
    fn alloc_and_remove_stay_in_lockstep() {
        let infos = infos_with(&[(1, 4)]);
        let bitmask = 1;
        let mut arch = Archetype::new(bitmask, &infos);
        arch.alloc_slot(10);
        arch.alloc_slot(20);
        arch.alloc_slot(30);
        assert_eq!(arch.num_entities(), 3);
        assert_eq!(arch.column_by_index(0).len(), 3);

        let promoted = arch.remove_slot(0);
        assert_eq!(promoted, Some(30));
        assert_eq!(arch.num_entities(), 2);
        assert_eq!(arch.column_by_index(0).len(), 2);
        assert_eq!(arch.entities(), &[30, 20]);
    }

    #[test]
    fn removing_last_entity_empties_columns() {
        let infos = infos_with(&[(1, 4)]);
        let mut arch = Archetype::new(1, &infos);
        arch.alloc_slot(1);
        let promoted = arch.remove_slot(0);
        assert_eq!(promoted, None);
        assert_eq!(arch.num_entities(), 0);
        assert_eq!(arch.column_by_index(0).len(), 0);
    }
}
