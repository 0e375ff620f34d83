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

//! Pipeline/phase registration and the ordered list of systems each phase
//! runs. Execution itself (resolving a system's archetype matches and
//! calling into the world) lives in [`crate::world`] — this module only
//! owns the registration bookkeeping and, in debug builds, the
//! scheduled/executed system-id trails used to assert dispatch order in
//! tests.

use smallvec::SmallVec;

use crate::error::{EcsError, Result};
use crate::system::{PhaseId, PipelineId, SystemFn, SystemId, SystemRecord};

/// Owns every registered pipeline, phase, and system, plus the strict
/// lexicographic order systems run in.
pub struct Dispatcher {
    /// `pipelines[pipeline]` -> phase ids, in registration order.
    pipelines: Vec<SmallVec<[PhaseId; 4]>>,
    /// `phases[phase]` -> system ids, in registration order.
    phases: Vec<Vec<SystemId>>,
    systems: Vec<SystemRecord>,
    #[cfg(debug_assertions)]
    scheduled: Vec<SystemId>,
    #[cfg(debug_assertions)]
    executed: Vec<SystemId>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            pipelines: Vec::new(),
            phases: Vec::new(),
            systems: Vec::new(),
            #[cfg(debug_assertions)]
            scheduled: Vec::new(),
            #[cfg(debug_assertions)]
            executed: Vec::new(),
        }
    }

    pub fn register_pipeline(&mut self) -> PipelineId {
        self.pipelines.push(SmallVec::new());
        (self.pipelines.len() - 1) as PipelineId
    }

    pub fn register_phase(&mut self, pipeline: PipelineId) -> Result<PhaseId> {
        let phases = self
            .pipelines
            .get_mut(pipeline as usize)
            .ok_or(EcsError::InvalidArgument("unknown pipeline id"))?;
        let phase_id = self.phases.len() as PhaseId;
        self.phases.push(Vec::new());
        phases.push(phase_id);
        Ok(phase_id)
    }

    pub fn register_system(
        &mut self,
        func: SystemFn,
        pipeline: PipelineId,
        phase: PhaseId,
        exclusive: bool,
        bitmask: u64,
    ) -> Result<SystemId> {
        let belongs = self
            .pipelines
            .get(pipeline as usize)
            .is_some_and(|phases| phases.contains(&phase));
        if !belongs {
            return Err(EcsError::InvalidArgument(
                "phase does not belong to pipeline",
            ));
        }
        let id = self.systems.len() as SystemId;
        self.systems.push(SystemRecord {
            id,
            func,
            pipeline,
            phase,
            bitmask,
            exclusive,
        });
        self.phases[phase as usize].push(id);
        Ok(id)
    }

    pub fn pipelines(&self) -> &[SmallVec<[PhaseId; 4]>] {
        &self.pipelines
    }

    pub fn phases_of(&self, pipeline: PipelineId) -> Option<&[PhaseId]> {
        self.pipelines.get(pipeline as usize).map(|p| p.as_slice())
    }

    pub fn systems_of(&self, phase: PhaseId) -> Option<&[SystemId]> {
        self.phases.get(phase as usize).map(|s| s.as_slice())
    }

    pub fn system(&self, id: SystemId) -> &SystemRecord {
        &self.systems[id as usize]
    }

    #[cfg(debug_assertions)]
    pub fn clear_debug_lists(&mut self) {
        self.scheduled.clear();
        self.executed.clear();
    }

    #[cfg(debug_assertions)]
    pub fn record_scheduled(&mut self, id: SystemId) {
        self.scheduled.push(id);
    }

    #[cfg(debug_assertions)]
    pub fn record_executed(&mut self, id: SystemId) {
        self.executed.push(id);
    }

    #[cfg(debug_assertions)]
    pub fn scheduled(&self) -> &[SystemId] {
        &self.scheduled
    }

    #[cfg(debug_assertions)]
    pub fn executed(&self) -> &[SystemId] {
        &self.executed
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
