//! Physics workload: entities with Position + Velocity stepped by one system.
//!
//! Run with: `cargo bench --package keystone-ecs`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keystone_ecs::{EntityManager, Result, System, SystemId, SystemView};

const ENTITY_COUNT: usize = 10_000;

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
}

struct PhysicsSystem {
    id: SystemId,
}

impl System for PhysicsSystem {
    fn id(&self) -> SystemId {
        self.id
    }

    fn update(&mut self, manager: &mut EntityManager, dt: f32) -> Result<()> {
        let SystemView {
            entities,
            mut components,
        } = manager.system_view(self.id)?;
        for &entity in entities {
            let (position, velocity) =
                components.get_components_mut::<(Position, Velocity)>(entity)?;
            position.x += velocity.x * dt;
            position.y += velocity.y * dt;
        }
        Ok(())
    }
}

fn populated(count: usize) -> (EntityManager, PhysicsSystem) {
    let mut manager = EntityManager::new(512, 32);
    manager.register_component::<Position>().unwrap();
    manager.register_component::<Velocity>().unwrap();
    let system = manager
        .create_system(|setup| {
            setup.require::<(Position, Velocity)>()?;
            Ok(PhysicsSystem { id: setup.id() })
        })
        .unwrap();
    manager.reserve(count);
    for _ in 0..count {
        let entity = manager.create_entity();
        manager
            .add_component(entity, Position { x: 0.0, y: 0.0 })
            .unwrap();
        manager
            .add_component(entity, Velocity { x: 1.0, y: 1.0 })
            .unwrap();
    }
    (manager, system)
}

/// Benchmark: create entities and attach both components.
fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");

    for count in [1_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let (manager, _) = populated(count);
                black_box(manager.entity_count())
            });
        });
    }

    group.finish();
}

/// Benchmark: one physics step over every entity.
fn bench_physics_step(c: &mut Criterion) {
    let (mut manager, mut system) = populated(ENTITY_COUNT);
    c.bench_function("physics_step_10k", |b| {
        b.iter(|| {
            system
                .update(&mut manager, black_box(1.0 / 60.0))
                .unwrap();
        });
    });
}

/// Benchmark: destroy and recreate half the entities, exercising slot reuse.
fn bench_churn(c: &mut Criterion) {
    let (mut manager, system) = populated(ENTITY_COUNT);
    c.bench_function("churn_half_10k", |b| {
        b.iter(|| {
            let victims: Vec<_> = system
                .managed_entities(&manager)
                .unwrap()
                .iter()
                .step_by(2)
                .copied()
                .collect();
            for entity in victims {
                manager.destroy_entity(entity).unwrap();
                let fresh = manager.create_entity();
                manager
                    .add_component(fresh, Position { x: 0.0, y: 0.0 })
                    .unwrap();
                manager
                    .add_component(fresh, Velocity { x: 1.0, y: 1.0 })
                    .unwrap();
            }
            black_box(manager.entity_count())
        });
    });
}

criterion_group!(benches, bench_populate, bench_physics_step, bench_churn);
criterion_main!(benches);
