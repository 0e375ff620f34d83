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

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tincs::World;

fn bench_entity_create(c: &mut Criterion) {
    c.bench_function("entity_create/empty_archetype", |b| {
        let mut world = World::new();
        b.iter(|| black_box(world.entity_create().unwrap()));
    });
}

fn bench_entity_create_with_components(c: &mut Criterion) {
    c.bench_function("entity_create_with/two_components", |b| {
        let mut world = World::new();
        let pos = world.register_component(8, None, None).unwrap();
        let vel = world.register_component(8, None, None).unwrap();
        let mask = (1u64 << (pos - 1)) | (1u64 << (vel - 1));
        b.iter(|| black_box(world.entity_create_with(mask).unwrap()));
    });
}

fn bench_entity_add_remove(c: &mut Criterion) {
    c.bench_function("entity_add_remove/round_trip", |b| {
        let mut world = World::new();
        let pos = world.register_component(8, None, None).unwrap();
        let mask = 1u64 << (pos - 1);
        let e = world.entity_create().unwrap();
        b.iter(|| {
            world.entity_add(e, mask).unwrap();
            world.entity_remove(e, mask).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_entity_create,
    bench_entity_create_with_components,
    bench_entity_add_remove
);
criterion_main!(benches);
