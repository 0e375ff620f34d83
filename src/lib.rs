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

//! tincs - a tiny archetype-based Entity-Component-System core.
//!
//! Entities are opaque ids, components are fixed-size byte records keyed
//! by a dense component id, and archetypes are the bitmask of component
//! types an entity carries. Systems are plain function pointers scheduled
//! into user-registered pipelines and phases.

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod migrate;
pub mod registry;
pub mod schedule;
pub mod storage;
pub mod system;
pub mod world;

pub use archetype::{Archetype, ArchetypeId};
pub use component::{ComponentId, ComponentInfo, FreeHook, InitHook, COMPONENT_CAP};
pub use entity::{EntityId, EntityLocation, ENTITY_CAP};
pub use error::{EcsError, Result};
pub use registry::ArchetypeRegistry;
pub use schedule::Dispatcher;
pub use storage::Column;
pub use system::{PhaseId, PipelineId, SystemFn, SystemId, SystemRecord};
pub use world::World;

pub mod prelude;
