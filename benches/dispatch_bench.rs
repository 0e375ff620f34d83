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

use std::os::raw::c_void;

use criterion::{criterion_group, criterion_main, Criterion};
use tincs::World;

fn move_system(world: &mut World, archetype_id: tincs::ArchetypeId, dt: u64, _data: *mut c_void) {
    let entities: Vec<_> = world.registry().get(archetype_id).entities().to_vec();
    for e in entities {
        unsafe {
            let ptr = world.entity_get_mut(e, 1).unwrap() as *mut [i32; 2];
            (*ptr)[0] += dt as i32;
        }
    }
}

fn bench_step_world(c: &mut Criterion) {
    let mut world = World::new();
    let pos = world.register_component(8, None, None).unwrap();
    let vel = world.register_component(8, None, None).unwrap();
    let mask = (1u64 << (pos - 1)) | (1u64 << (vel - 1));
    for _ in 0..1000 {
        world.entity_create_with(mask).unwrap();
    }
    world.register_system(move_system, 0, 0, true, mask).unwrap();

    c.bench_function("step_world/1000_entities_one_system", |b| {
        b.iter(|| world.step_world(1, std::ptr::null_mut()));
    });
}

criterion_group!(benches, bench_step_world);
criterion_main!(benches);
