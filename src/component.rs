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

//! Component type registration and lifecycle hooks.
//!
//! A component type is a dense integer id in `[1, COMPONENT_CAP]` with an
//! associated byte size and two optional hooks: `init`, run after a fresh
//! slot is allocated and zeroed, and `free`, run before a slot holding the
//! component is released. Components carry no Rust type information at the
//! core layer; callers operate on raw bytes, the way a C ECS would.

/// Component id `0` is reserved ("null component"); valid ids start at 1.
pub type ComponentId = u8;

/// One bit is reserved for the null sentinel, leaving 63 usable component
/// types per world (archetypes are encoded in a `u64` bitmask).
pub const COMPONENT_CAP: usize = 63;

/// Called once, after a component's backing bytes have been zeroed and
/// before any system observes them.
///
/// # Safety
/// The pointer references `bytesize` zeroed, properly aligned bytes owned
/// by the world; the hook may write through it but must not retain it.
pub type InitHook = unsafe fn(*mut u8);

/// Called once, before a component's backing bytes are released (on
/// `entity_destroy` or on removal via `entity_remove`), so the component
/// can release any owned heap resources.
///
/// # Safety
/// The pointer references `bytesize` live, properly aligned bytes; the
/// hook must not retain it past the call.
pub type FreeHook = unsafe fn(*mut u8);

/// Registration record for one component type.
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    pub bytesize: usize,
    pub init: Option<InitHook>,
    pub free: Option<FreeHook>,
}

impl ComponentInfo {
    pub(crate) fn new(bytesize: usize, init: Option<InitHook>, free: Option<FreeHook>) -> Self {
        Self {
            bytesize,
            init,
            free,
        }
    }
}

/// Hook pair that drops a Rust value of type `T` in place.
///
/// This is the thin typed convenience mentioned in the crate's design
/// notes: the core only ever sees raw bytes and a function pointer, but a
/// caller registering a plain Rust type can derive both from `T` instead of
/// hand-writing them.
///
/// # Safety
/// Only sound when every component of this type id is always written as a
/// valid `T` before any system or hook observes it (true for components
/// added through [`crate::world::World::entity_add_value`]).
pub unsafe fn free_hook_for<T>() -> Option<FreeHook> {
    if std::mem::needs_drop::<T>() {
        unsafe fn drop_raw<T>(ptr: *mut u8) {
            std::ptr::drop_in_place(ptr as *mut T);
        }
        Some(drop_raw::<T>)
    } else {
        None
    }
}
