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

//! `World`: the façade tying the archetype registry, entity table,
//! component registration, and dispatcher together into the crate's
//! public API.

use std::os::raw::c_void;

use smallvec::SmallVec;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::ArchetypeId;
use crate::component::{ComponentId, ComponentInfo, FreeHook, InitHook, COMPONENT_CAP};
use crate::entity::{EntityId, EntityLocation, EntityTable};
use crate::error::{EcsError, Result};
use crate::migrate;
use crate::registry::ArchetypeRegistry;
use crate::schedule::Dispatcher;
use crate::system::{PhaseId, PipelineId, SystemFn, SystemId};

/// Central ECS world: entities, archetypes, component registrations, and
/// the pipeline/phase dispatcher.
pub struct World {
    entities: EntityTable,
    registry: ArchetypeRegistry,
    infos: Box<[Option<ComponentInfo>; COMPONENT_CAP + 1]>,
    next_component_id: ComponentId,
    dispatcher: Dispatcher,
}

impl World {
    /// Creates a world with one pipeline (id 0) holding one phase (id 0),
    /// the empty archetype (id 0), no components, and no systems.
    pub fn new() -> Self {
        let infos = Box::new([None; COMPONENT_CAP + 1]);
        let registry = ArchetypeRegistry::new(&infos);
        let mut dispatcher = Dispatcher::new();
        let pipeline = dispatcher.register_pipeline();
        debug_assert_eq!(pipeline, 0);
        let phase = dispatcher
            .register_phase(pipeline)
            .expect("pipeline 0 was just registered");
        debug_assert_eq!(phase, 0);

        Self {
            entities: EntityTable::new(),
            registry,
            infos,
            next_component_id: 1,
            dispatcher,
        }
    }

    pub fn set_reuse(&mut self, reuse: bool) {
        self.entities.set_reuse(reuse);
    }

    /// Explicit batch recycling sweep (spec §4.3 `reuse`).
    pub fn reuse(&mut self) {
        self.entities.reuse_sweep();
    }

    pub fn is_alive(&self, e: EntityId) -> bool {
        self.entities.is_alive(e)
    }

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------

    pub fn register_component(
        &mut self,
        bytesize: usize,
        init: Option<InitHook>,
        free: Option<FreeHook>,
    ) -> Result<ComponentId> {
        if bytesize == 0 {
            return Err(EcsError::InvalidArgument(
                "component bytesize must be non-zero",
            ));
        }
        if self.next_component_id as usize > COMPONENT_CAP {
            return Err(EcsError::InvalidArgument(
                "component type capacity exhausted",
            ));
        }
        let id = self.next_component_id;
        self.infos[id as usize] = Some(ComponentInfo::new(bytesize, init, free));
        self.next_component_id += 1;
        Ok(id)
    }

    pub fn register_pipeline(&mut self) -> PipelineId {
        self.dispatcher.register_pipeline()
    }

    pub fn register_phase(&mut self, pipeline: PipelineId) -> Result<PhaseId> {
        self.dispatcher.register_phase(pipeline)
    }

    pub fn register_system(
        &mut self,
        func: SystemFn,
        pipeline: PipelineId,
        phase: PhaseId,
        exclusive: bool,
        archetype: u64,
    ) -> Result<SystemId> {
        self.validate_bitmask(archetype)?;
        // Intern eagerly so the exact archetype always exists (possibly
        // with zero entities), matching the dispatcher's "run once on the
        // exact archetype" contract for systems registered before any
        // matching entity is created.
        self.registry.intern(archetype, &self.infos);
        self.dispatcher
            .register_system(func, pipeline, phase, exclusive, archetype)
    }

    fn validate_bitmask(&self, bitmask: u64) -> Result<()> {
        if bitmask >> COMPONENT_CAP != 0 {
            return Err(EcsError::InvalidArgument(
                "bitmask sets the reserved high bit",
            ));
        }
        for cid in 1..=COMPONENT_CAP {
            if bitmask & (1u64 << (cid - 1)) != 0 && self.infos[cid].is_none() {
                return Err(EcsError::InvalidArgument(
                    "bitmask references an unregistered component",
                ));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------

    pub fn entity_create(&mut self) -> Result<EntityId> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.entity_create").entered();

        let e = self.entities.create()?;
        let slot = self.registry.get_mut(0).alloc_slot(e);
        self.entities.set_location(
            e,
            EntityLocation {
                archetype_id: 0,
                order: slot,
            },
        );
        Ok(e)
    }

    pub fn entity_create_with(&mut self, archetype: u64) -> Result<EntityId> {
        self.validate_bitmask(archetype)?;
        let e = self.entity_create()?;
        if archetype != 0 {
            let loc = self.entities.location(e).expect("just created");
            migrate::migrate(
                &mut self.registry,
                &self.infos,
                &mut self.entities,
                e,
                loc.archetype_id,
                loc.order,
                archetype,
            );
        }
        Ok(e)
    }

    pub fn entity_destroy(&mut self, e: EntityId) -> bool {
        let Some(loc) = self.entities.location(e) else {
            return false;
        };

        #[cfg(feature = "profiling")]
        let _span = info_span!("world.entity_destroy", entity = e).entered();

        let arch = self.registry.get(loc.archetype_id);
        let cids: SmallVec<[ComponentId; 8]> = arch.components_id().iter().copied().collect();
        for cid in cids {
            if let Some(free) = self.infos[cid as usize].and_then(|info| info.free) {
                let ptr = arch.column(cid).unwrap().ptr(loc.order) as *mut u8;
                unsafe {
                    free(ptr);
                }
            }
        }

        let arch = self.registry.get_mut(loc.archetype_id);
        if let Some(promoted) = arch.remove_slot(loc.order) {
            self.entities.set_location(
                promoted,
                EntityLocation {
                    archetype_id: loc.archetype_id,
                    order: loc.order,
                },
            );
        }
        self.entities.destroy(e);
        true
    }

    /// Adds the components named by `archetype` that the entity doesn't
    /// already carry; bits already present are left untouched (a no-op
    /// for those components, not a re-init).
    pub fn entity_add(&mut self, e: EntityId, archetype: u64) -> Result<()> {
        self.validate_bitmask(archetype)?;
        let loc = self
            .entities
            .location(e)
            .ok_or(EcsError::InvalidArgument("unknown or dead entity"))?;
        let old_bitmask = self.registry.get(loc.archetype_id).bitmask();
        let new_bitmask = old_bitmask | archetype;
        migrate::migrate(
            &mut self.registry,
            &self.infos,
            &mut self.entities,
            e,
            loc.archetype_id,
            loc.order,
            new_bitmask,
        );
        Ok(())
    }

    /// Removes the components named by `archetype` that the entity
    /// currently carries. Returns `false` (a no-op) if none of them were
    /// actually present.
    pub fn entity_remove(&mut self, e: EntityId, archetype: u64) -> Result<bool> {
        let loc = self
            .entities
            .location(e)
            .ok_or(EcsError::InvalidArgument("unknown or dead entity"))?;
        let old_bitmask = self.registry.get(loc.archetype_id).bitmask();
        let new_bitmask = old_bitmask & !archetype;
        if new_bitmask == old_bitmask {
            return Ok(false);
        }
        migrate::migrate(
            &mut self.registry,
            &self.infos,
            &mut self.entities,
            e,
            loc.archetype_id,
            loc.order,
            new_bitmask,
        );
        Ok(true)
    }

    pub fn entity_get(&self, e: EntityId, cid: ComponentId) -> Option<*const u8> {
        let loc = self.entities.location(e)?;
        let arch = self.registry.get(loc.archetype_id);
        Some(arch.column(cid)?.ptr(loc.order))
    }

    pub fn entity_get_mut(&mut self, e: EntityId, cid: ComponentId) -> Option<*mut u8> {
        let loc = self.entities.location(e)?;
        let arch = self.registry.get_mut(loc.archetype_id);
        Some(arch.column_mut(cid)?.ptr_mut(loc.order))
    }

    /// Typed convenience atop [`Self::entity_add`]/[`Self::entity_get_mut`]:
    /// adds `cid` to `e` (a no-op if already present) and writes `value`
    /// into its backing bytes.
    ///
    /// # Safety
    /// `cid` must have been registered with `bytesize == size_of::<T>()`,
    /// the way [`crate::component::free_hook_for`] expects.
    pub unsafe fn entity_add_value<T>(
        &mut self,
        e: EntityId,
        cid: ComponentId,
        value: T,
    ) -> Result<()> {
        self.entity_add(e, 1u64 << (cid - 1))?;
        let ptr = self.entity_get_mut(e, cid).expect("just added") as *mut T;
        unsafe {
            ptr.write(value);
        }
        Ok(())
    }

    pub fn archetype_of(&self, e: EntityId) -> Option<ArchetypeId> {
        self.entities.location(e).map(|loc| loc.archetype_id)
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    pub fn step_pipeline(&mut self, pipeline: PipelineId, dt: u64, data: *mut c_void) {
        #[cfg(debug_assertions)]
        self.dispatcher.clear_debug_lists();
        let Some(phases) = self.dispatcher.phases_of(pipeline).map(|s| s.to_vec()) else {
            return;
        };
        for phase in phases {
            self.run_phase(phase, dt, data);
        }
    }

    pub fn step_pipeline_phase(
        &mut self,
        pipeline: PipelineId,
        phase: PhaseId,
        dt: u64,
        data: *mut c_void,
    ) {
        #[cfg(debug_assertions)]
        self.dispatcher.clear_debug_lists();
        let belongs = self
            .dispatcher
            .phases_of(pipeline)
            .is_some_and(|phases| phases.contains(&phase));
        if !belongs {
            return;
        }
        self.run_phase(phase, dt, data);
    }

    pub fn step_world(&mut self, dt: u64, data: *mut c_void) {
        #[cfg(debug_assertions)]
        self.dispatcher.clear_debug_lists();
        let pipeline_count = self.dispatcher.pipelines().len() as PipelineId;
        for pipeline in 0..pipeline_count {
            let phases = self
                .dispatcher
                .phases_of(pipeline)
                .expect("pipeline id within range")
                .to_vec();
            for phase in phases {
                self.run_phase(phase, dt, data);
            }
        }
    }

    /// Runs `func` once per archetype matching `archetype`/`exclusive`,
    /// outside of any registered pipeline or phase.
    pub fn custom_run(
        &mut self,
        func: SystemFn,
        archetype: u64,
        exclusive: bool,
        dt: u64,
        data: *mut c_void,
    ) {
        let archetype_ids = self.matching_archetypes(archetype, exclusive);
        for arch_id in archetype_ids {
            func(self, arch_id, dt, data);
        }
    }

    #[cfg(debug_assertions)]
    pub fn scheduled(&self) -> &[SystemId] {
        self.dispatcher.scheduled()
    }

    #[cfg(debug_assertions)]
    pub fn executed(&self) -> &[SystemId] {
        self.dispatcher.executed()
    }

    fn run_phase(&mut self, phase: PhaseId, dt: u64, data: *mut c_void) {
        let Some(system_ids) = self.dispatcher.systems_of(phase).map(|s| s.to_vec()) else {
            return;
        };
        for sid in system_ids {
            self.run_system(sid, dt, data);
        }
    }

    fn run_system(&mut self, sid: SystemId, dt: u64, data: *mut c_void) {
        let system = *self.dispatcher.system(sid);
        let archetype_ids = self.matching_archetypes(system.bitmask, system.exclusive);
        for arch_id in archetype_ids {
            #[cfg(debug_assertions)]
            self.dispatcher.record_scheduled(sid);

            (system.func)(self, arch_id, dt, data);

            #[cfg(debug_assertions)]
            self.dispatcher.record_executed(sid);
        }
    }

    /// Exact archetype first, then (when not exclusive) every superset in
    /// ascending id order (spec §5 dispatch ordering).
    fn matching_archetypes(&self, bitmask: u64, exclusive: bool) -> SmallVec<[ArchetypeId; 4]> {
        let mut out = SmallVec::new();
        if let Some(exact) = self.registry.archetype_of(bitmask) {
            out.push(exact);
            if !exclusive {
                out.extend(self.registry.get(exact).superset_ids().iter().copied());
            }
        }
        out
    }

    pub fn registry(&self) -> &ArchetypeRegistry {
        &self.registry
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    /// Rust's destructor plays the role of `world_free`: run every live
    /// component's free hook before the backing columns are deallocated.
    fn drop(&mut self) {
        for archetype in self.registry.iter() {
            let cids = archetype.components_id();
            if cids.is_empty() {
                continue;
            }
            for row in 0..archetype.num_entities() {
                for &cid in cids {
                    if let Some(free) = self.infos[cid as usize].and_then(|info| info.free) {
                        let ptr = archetype.column(cid).unwrap().ptr(row) as *mut u8;
                        unsafe {
                            free(ptr);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_has_pipeline_zero_phase_zero_and_empty_archetype() {
        let mut world = World::new();
        assert_eq!(world.registry.archetype_of(0), Some(0));
        let phase = world.register_phase(0);
        // pipeline 0 already has phase 0 registered; this is phase 1.
        assert_eq!(phase, Ok(1));
    }

    #[test]
    fn entity_create_lands_in_empty_archetype() {
        let mut world = World::new();
        let e = world.entity_create().unwrap();
        assert_eq!(world.archetype_of(e), Some(0));
    }

    #[test]
    fn entity_destroy_zero_is_noop_success() {
        let mut world = World::new();
        assert!(!world.entity_destroy(0));
    }

    #[test]
    fn register_component_rejects_zero_bytesize() {
        let mut world = World::new();
        let err = world.register_component(0, None, None).unwrap_err();
        assert_eq!(err, EcsError::InvalidArgument("component bytesize must be non-zero"));
    }

    #[test]
    fn entity_add_then_remove_returns_to_prior_archetype() {
        let mut world = World::new();
        let pos = world.register_component(8, None, None).unwrap();
        let e = world.entity_create().unwrap();
        let mask = 1u64 << (pos - 1);
        world.entity_add(e, mask).unwrap();
        assert_eq!(world.archetype_of(e), Some(world.registry.archetype_of(mask).unwrap()));
        let removed = world.entity_remove(e, mask).unwrap();
        assert!(removed);
        assert_eq!(world.archetype_of(e), Some(0));
    }

    #[test]
    fn add_and_remove_of_empty_set_are_noops() {
        let mut world = World::new();
        let e = world.entity_create().unwrap();
        world.entity_add(e, 0).unwrap();
        assert_eq!(world.archetype_of(e), Some(0));
        let removed = world.entity_remove(e, 0).unwrap();
        assert!(!removed);
    }

    #[test]
    fn unregistered_component_in_bitmask_is_rejected() {
        let mut world = World::new();
        let e = world.entity_create().unwrap();
        assert!(world.entity_add(e, 0b1).is_err());
    }

    fn move_system(
        world: &mut World,
        archetype_id: ArchetypeId,
        dt: u64,
        _data: *mut c_void,
    ) {
        let entities: Vec<EntityId> = world.registry.get(archetype_id).entities().to_vec();
        for e in entities {
            unsafe {
                let ptr = world.entity_get_mut(e, 1).unwrap() as *mut [i32; 2];
                (*ptr)[0] += dt as i32;
            }
        }
    }

    #[test]
    fn entity_add_value_writes_through_the_newly_added_slot() {
        let mut world = World::new();
        let free = unsafe { crate::component::free_hook_for::<u64>() };
        let cid = world
            .register_component(std::mem::size_of::<u64>(), None, free)
            .unwrap();
        let e = world.entity_create().unwrap();
        unsafe {
            world.entity_add_value(e, cid, 42u64).unwrap();
        }
        let ptr = world.entity_get(e, cid).unwrap() as *const u64;
        assert_eq!(unsafe { *ptr }, 42);
    }

    #[test]
    fn step_world_runs_registered_system_over_its_archetype() {
        let mut world = World::new();
        let pos = world.register_component(8, None, None).unwrap();
        let e = world.entity_create_with(1u64 << (pos - 1)).unwrap();
        unsafe {
            let ptr = world.entity_get_mut(e, pos).unwrap() as *mut [i32; 2];
            (*ptr) = [1, 2];
        }
        world
            .register_system(move_system, 0, 0, true, 1u64 << (pos - 1))
            .unwrap();
        world.step_world(5, std::ptr::null_mut());
        unsafe {
            let ptr = world.entity_get(e, pos).unwrap() as *const [i32; 2];
            assert_eq!(*ptr, [6, 2]);
        }
    }
}
