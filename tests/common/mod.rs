//! Shared builders for integration tests

#![allow(dead_code)]

use dpsim::combat::{AbilityDef, AbilityKind, DamageSpec, DirectDamage, SpellFlags};
use dpsim::core::{ActionId, IdRegistry, SimConfig, SimTime, SpellSchool, Stat, Stats};
use dpsim::entity::{CharacterConfig, ResourceConfig, ResourceCost};
use dpsim::rotation::{NoRotation, PriorityEntry, PriorityRotation};
use dpsim::simulation::Scenario;

pub const FROSTBOLT: ActionId = ActionId::spell(27072);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Config with `iterations` iterations of a `duration_secs` fight.
pub fn config(duration_secs: f64, iterations: u32) -> SimConfig {
    let mut config = SimConfig::default();
    config.encounter.duration_secs = duration_secs;
    config.options.iterations = iterations;
    config.options.random_seed = 42;
    config
}

/// Instant fire spell that always hits for exactly `damage` and never
/// partially resists.
pub fn fixed_nuke(id: ActionId, damage: f64) -> AbilityDef {
    AbilityDef::new(
        id,
        "Fixed Nuke",
        SpellSchool::Fire,
        AbilityKind::Direct(DirectDamage {
            damage: DamageSpec::magic(damage, damage, 0.0),
        }),
    )
    .with_flags(SpellFlags::ALWAYS_HITS | SpellFlags::BINARY)
}

pub fn frostbolt() -> AbilityDef {
    AbilityDef::new(
        FROSTBOLT,
        "Frostbolt",
        SpellSchool::Frost,
        AbilityKind::Direct(DirectDamage {
            damage: DamageSpec::magic(600.0, 647.0, 0.814),
        }),
    )
    .with_cast_time(SimTime::from_millis(2500))
    .with_cost(ResourceCost::mana(400.0))
}

/// Frost mage spamming Frostbolt with `mana` mana.
pub fn frost_mage(mana: f64) -> CharacterConfig {
    CharacterConfig::new(
        "Mage",
        PriorityRotation::new(vec![PriorityEntry::always(FROSTBOLT)]),
    )
    .with_stats(
        Stats::new()
            .with(Stat::SpellPower, 1000.0)
            .with(Stat::SpellCrit, 300.0)
            .with(Stat::SpellHit, 80.0)
            .with(Stat::Mana, mana),
    )
    .with_resources(ResourceConfig {
        mana: true,
        ..ResourceConfig::default()
    })
    .with_ability(frostbolt())
}

/// Character that only acts when a test casts for it.
pub fn puppet(name: &str) -> CharacterConfig {
    CharacterConfig::new(name, NoRotation)
}

pub fn scenario(config: SimConfig, characters: Vec<CharacterConfig>) -> Scenario {
    Scenario::new(config, characters, &IdRegistry::new()).unwrap()
}
