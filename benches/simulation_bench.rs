//! Single-iteration and batch throughput.
//!
//! Run with: `cargo bench --bench simulation_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dpsim::aggregate::run_batch;
use dpsim::combat::{AbilityDef, AbilityKind, DamageSpec, DirectDamage, DotSpec, PeriodicDamage};
use dpsim::core::{
    ActionId, CancelToken, IdRegistry, SimConfig, SimTime, SpellSchool, Stat, Stats,
};
use dpsim::entity::{CharacterConfig, ResourceConfig, ResourceCost};
use dpsim::rotation::{Condition, PriorityEntry, PriorityRotation};
use dpsim::simulation::Scenario;

const SHADOW_BOLT: ActionId = ActionId::spell(27209);
const CORRUPTION: ActionId = ActionId::spell(27216);

fn warlock(registry: &IdRegistry) -> CharacterConfig {
    let tick = DotSpec::new(registry, "Corruption", 6, SimTime::from_secs(3))
        .with_tick_damage(150.0, 0.1563);
    let marker = tick.marker.id;
    let corruption = AbilityDef::new(
        CORRUPTION,
        "Corruption",
        SpellSchool::Shadow,
        AbilityKind::Periodic(PeriodicDamage {
            hit: DamageSpec::magic(0.0, 0.0, 0.0),
            tick,
        }),
    )
    .with_cost(ResourceCost::mana(370.0));
    let shadow_bolt = AbilityDef::new(
        SHADOW_BOLT,
        "Shadow Bolt",
        SpellSchool::Shadow,
        AbilityKind::Direct(DirectDamage {
            damage: DamageSpec::magic(544.0, 607.0, 0.8571),
        }),
    )
    .with_cast_time(SimTime::from_millis(2500))
    .with_cost(ResourceCost::mana(420.0));

    let rotation = PriorityRotation::new(vec![
        PriorityEntry::when(
            CORRUPTION,
            Condition::TargetAuraMissing {
                aura: marker,
                refresh_within_secs: 0.0,
            },
        ),
        PriorityEntry::always(SHADOW_BOLT),
    ]);
    CharacterConfig::new("Warlock", rotation)
        .with_stats(
            Stats::new()
                .with(Stat::SpellPower, 1100.0)
                .with(Stat::SpellCrit, 250.0)
                .with(Stat::SpellHit, 120.0)
                .with(Stat::Mana, 12_000.0),
        )
        .with_resources(ResourceConfig {
            mana: true,
            ..ResourceConfig::default()
        })
        .with_ability(corruption)
        .with_ability(shadow_bolt)
}

fn scenario(iterations: u32) -> Scenario {
    let registry = IdRegistry::new();
    let mut config = SimConfig::default();
    config.options.iterations = iterations;
    config.encounter.debuffs.misery = true;
    config.encounter.debuffs.shadow_weaving = true;
    Scenario::new(config, vec![warlock(&registry)], &registry).expect("valid scenario")
}

fn bench_single_iteration(c: &mut Criterion) {
    let scenario = scenario(1);
    let cancel = CancelToken::new();
    let mut index = 0u32;
    c.bench_function("iteration_180s", |b| {
        b.iter(|| {
            index = index.wrapping_add(1);
            black_box(scenario.run_iteration(index, &cancel).expect("iteration"))
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let scenario = scenario(500);
    let cancel = CancelToken::new();
    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    group.bench_function("500_iterations", |b| {
        b.iter(|| black_box(run_batch(&scenario, &cancel).expect("batch")));
    });
    group.finish();
}

criterion_group!(benches, bench_single_iteration, bench_batch);
criterion_main!(benches);
