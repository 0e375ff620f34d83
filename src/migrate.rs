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

//! The single migration protocol shared by `entity_add`, `entity_remove`,
//! and `entity_create_with` (spec §4.4): move an entity between archetypes
//! when its component set changes.

use crate::archetype::ArchetypeId;
use crate::component::{ComponentId, ComponentInfo, COMPONENT_CAP};
use crate::entity::{EntityId, EntityLocation, EntityTable};
use crate::registry::ArchetypeRegistry;

/// Runs components `1..=COMPONENT_CAP` whose bit is set in `mask`.
fn for_each_component(mask: u64, mut f: impl FnMut(ComponentId)) {
    let mut remaining = mask;
    while remaining != 0 {
        let bit = remaining.trailing_zeros() as usize;
        f((bit + 1) as ComponentId);
        remaining &= remaining - 1;
    }
}

/// Moves `entity` from its current archetype/slot to the archetype named by
/// `new_bitmask`, finalizing removed components and initializing added
/// ones. No-op when `new_bitmask` already equals the entity's current
/// bitmask (spec §4.4 step 1). Returns the entity's new archetype id.
pub(crate) fn migrate(
    registry: &mut ArchetypeRegistry,
    infos: &[Option<ComponentInfo>; COMPONENT_CAP + 1],
    entities: &mut EntityTable,
    entity: EntityId,
    old_id: ArchetypeId,
    old_slot: usize,
    new_bitmask: u64,
) -> ArchetypeId {
    let old_bitmask = registry.get(old_id).bitmask();
    if old_bitmask == new_bitmask {
        return old_id;
    }

    // Step 2: finalize components being removed, while they still live at
    // (old_id, old_slot).
    let removed_mask = old_bitmask & !new_bitmask;
    if removed_mask != 0 {
        let old_arch = registry.get(old_id);
        for_each_component(removed_mask, |cid| {
            if let Some(free) = infos[cid as usize].and_then(|info| info.free) {
                let ptr = old_arch.column(cid).unwrap().ptr(old_slot) as *mut u8;
                unsafe {
                    free(ptr);
                }
            }
        });
    }

    // Step 3: intern the destination archetype.
    let new_id = registry.intern(new_bitmask, infos);

    // Step 4: allocate the new slot (this also appends a zeroed element to
    // every column of the new archetype, added and shared alike).
    let (old_arch, new_arch) = registry.pair_mut(old_id, new_id);
    let new_slot = new_arch.alloc_slot(entity);

    // Step 5: overwrite the zeroed slot of every shared component with the
    // bytes copied from the old archetype (memmove-equivalent; the two
    // columns are distinct allocations and never overlap).
    let shared_mask = old_bitmask & new_bitmask;
    if shared_mask != 0 {
        for_each_component(shared_mask, |cid| {
            let new_col = new_arch.column_mut(cid).unwrap();
            let old_col = old_arch.column(cid).unwrap();
            new_col.copy_from(new_slot, old_col, old_slot);
        });
    }

    // Step 6: remove the old slot (scramble), promoting the old
    // archetype's tail entity into the freed slot if one moved.
    if let Some(promoted) = old_arch.remove_slot(old_slot) {
        let loc = entities.location(promoted).expect("promoted entity is alive");
        entities.set_location(
            promoted,
            EntityLocation {
                archetype_id: old_id,
                order: old_slot,
            },
        );
        debug_assert_eq!(loc.archetype_id, old_id);
    }

    // Step 7: update the migrated entity's own location.
    entities.set_location(
        entity,
        EntityLocation {
            archetype_id: new_id,
            order: new_slot,
        },
    );

    // Step 8: initialize components being added, over their freshly
    // allocated, zero-initialized bytes.
    let added_mask = new_bitmask & !old_bitmask;
    if added_mask != 0 {
        let new_arch = registry.get_mut(new_id);
        for_each_component(added_mask, |cid| {
            if let Some(init) = infos[cid as usize].and_then(|info| info.init) {
                let ptr = new_arch.column_mut(cid).unwrap().ptr_mut(new_slot);
                unsafe {
                    init(ptr);
                }
            }
        });
    }

    new_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos(sizes: &[(usize, usize)]) -> [Option<ComponentInfo>; COMPONENT_CAP + 1] {
        let mut infos = [None; COMPONENT_CAP + 1];
        for &(cid, bytesize) in sizes {
            infos[cid] = Some(ComponentInfo::new(bytesize, None, None));
        }
        infos
    }

    #[test]
    fn create_with_components_lands_entity_in_target_archetype() {
        let infos = infos(&[(1, 4), (2, 4)]);
        let mut registry = ArchetypeRegistry::new(&infos);
        let mut entities = EntityTable::new();
        let e = entities.create().unwrap();
        let empty_slot = registry.get_mut(0).alloc_slot(e);
        entities.set_location(
            e,
            EntityLocation {
                archetype_id: 0,
                order: empty_slot,
            },
        );

        let new_id = migrate(&mut registry, &infos, &mut entities, e, 0, empty_slot, 0b11);
        assert_eq!(registry.get(new_id).bitmask(), 0b11);
        assert_eq!(entities.location(e).unwrap().archetype_id, new_id);
    }

    #[test]
    fn removing_all_components_returns_entity_to_empty_archetype() {
        let infos = infos(&[(1, 4)]);
        let mut registry = ArchetypeRegistry::new(&infos);
        let mut entities = EntityTable::new();
        let e = entities.create().unwrap();
        let slot0 = registry.get_mut(0).alloc_slot(e);
        entities.set_location(
            e,
            EntityLocation {
                archetype_id: 0,
                order: slot0,
            },
        );
        let with_pos = migrate(&mut registry, &infos, &mut entities, e, 0, slot0, 0b1);
        let loc = entities.location(e).unwrap();

        let back_to_empty = migrate(
            &mut registry,
            &infos,
            &mut entities,
            e,
            with_pos,
            loc.order,
            0,
        );
        assert_eq!(back_to_empty, 0);
        assert_eq!(entities.location(e).unwrap().archetype_id, 0);
    }

    #[test]
    fn shared_component_bytes_survive_migration() {
        let infos = infos(&[(1, 4), (2, 4)]);
        let mut registry = ArchetypeRegistry::new(&infos);
        let mut entities = EntityTable::new();
        let e = entities.create().unwrap();
        let slot0 = registry.get_mut(0).alloc_slot(e);
        entities.set_location(
            e,
            EntityLocation {
                archetype_id: 0,
                order: slot0,
            },
        );
        let a1 = migrate(&mut registry, &infos, &mut entities, e, 0, slot0, 0b1);
        unsafe {
            let ptr = registry.get_mut(a1).column_mut(1).unwrap().ptr_mut(0) as *mut i32;
            std::ptr::write(ptr, 42);
        }
        let loc = entities.location(e).unwrap();
        let a2 = migrate(
            &mut registry,
            &infos,
            &mut entities,
            e,
            a1,
            loc.order,
            0b11,
        );
        let loc2 = entities.location(e).unwrap();
        let value = unsafe {
            *(registry.get(a2).column(1).unwrap().ptr(loc2.order) as *const i32)
        };
        assert_eq!(value, 42);
    }
}
