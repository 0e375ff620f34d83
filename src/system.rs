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

//! System registration records.
//!
//! A system is a plain function pointer plus the archetype it was
//! registered against and whether that registration is exclusive (runs
//! only on the exact archetype) or inclusive (runs on the archetype and
//! every superset of it). There is no dependency analysis here: order is
//! determined entirely by registration order within a phase (see
//! [`crate::schedule`]).

use std::os::raw::c_void;

use crate::archetype::ArchetypeId;
use crate::world::World;

/// Dense id assigned to a registered pipeline.
pub type PipelineId = u32;

/// Dense id assigned to a registered phase, unique within its pipeline's
/// phase list (phases from different pipelines may share numeric ids).
pub type PhaseId = u32;

/// Dense id assigned to a registered system, in registration order.
pub type SystemId = u32;

/// A system's function signature: world, archetype being iterated, elapsed
/// time in the caller's own units, and an opaque user data pointer passed
/// through unchanged from [`World::step_world`] and friends.
pub type SystemFn = fn(world: &mut World, archetype_id: ArchetypeId, dt: u64, data: *mut c_void);

/// One system's registration record.
#[derive(Clone, Copy)]
pub struct SystemRecord {
    pub id: SystemId,
    pub func: SystemFn,
    pub pipeline: PipelineId,
    pub phase: PhaseId,
    /// The archetype bitmask this system was registered against.
    pub bitmask: u64,
    /// `true`: run only on the exact archetype. `false`: run on the exact
    /// archetype and every superset of it.
    pub exclusive: bool,
}
