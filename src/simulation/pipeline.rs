//! Resolution of a single effect against a single target
//!
//! Stages run in a fixed order and each stage only adds to what the earlier
//! ones decided:
//! 1. before-hit hooks of the caster's, then the target's auras
//! 2. the outcome roll (magic two-roll or physical attack table)
//! 3. base damage
//! 4. caster and target multipliers, armor or partial resist, block, outcome
//! 5. threat
//! 6. metrics, log line and damage totals
//! 7. proc dispatch: effect-local, caster auras, target auras
//!
//! DoT ticks reuse the tail of the same chain against their snapshot.

use std::sync::Arc;

use crate::aura::hooks::ActiveHook;
use crate::aura::AuraOwner;
use crate::combat::ability::{AbilityDef, DamageInput, DamageSpec, ResolvedEffect};
use crate::combat::armor::armor_damage_reduction;
use crate::combat::constants::{
    base_dodge_chance, base_glance_chance, base_miss_chance, crit_suppression, hit_suppression,
    DUAL_WIELD_MISS_PENALTY,
};
use crate::combat::effect::{Effect, EffectModifiers, HitContext};
use crate::combat::outcome::{CritRollCategory, HitOutcome, OutcomeRollCategory, ProcMask, SpellFlags};
use crate::combat::resolution::{
    self, expertise_dodge_reduction, magic_crit_chance, magic_hit_chance, melee_crit_chance,
    melee_hit_chance, outcome_multiplier, roll_crit, roll_magic, roll_partial_resist,
    roll_physical, roll_spell_hit, AttackTable,
};
use crate::core::error::{Result, SimError};
use crate::core::rng::RandomSource;
use crate::core::stats::Stat;
use crate::core::types::{ActionId, ActorIndex, TargetIndex};
use crate::entity::character::Character;
use crate::entity::resources::{rage_from_white_hit, ResourceKind};
use crate::entity::target::Target;
use crate::entity::weapons::Hand;
use crate::proc::{dispatch, ProcContext};
use crate::simulation::Simulation;

/// Physical attack table of `actor` against `target`.
fn attack_table(
    actor: &Character,
    target: &Target,
    roll: OutcomeRollCategory,
    mods: &EffectModifiers,
) -> AttackTable {
    let diff = target.level_diff();
    let hit_rating =
        actor.stats.get(Stat::MeleeHit) + mods.bonus_hit_rating + target.pseudo.bonus_hit_rating_taken;
    let hit = (melee_hit_chance(hit_rating) - hit_suppression(diff)).max(0.0);
    let dual_wield = if roll == OutcomeRollCategory::White && actor.weapons.is_dual_wield() {
        DUAL_WIELD_MISS_PENALTY
    } else {
        0.0
    };
    let base_dodge = base_dodge_chance(diff);
    let crit_rating =
        actor.stats.get(Stat::MeleeCrit) + mods.bonus_crit_rating + target.pseudo.bonus_crit_rating_taken;

    AttackTable {
        miss: (base_miss_chance(diff) + dual_wield - hit).max(0.0),
        dodge: base_dodge - expertise_dodge_reduction(actor.stats.get(Stat::Expertise), base_dodge),
        parry: target.defense.parry_chance,
        block: target.defense.block_chance,
        glance: if roll == OutcomeRollCategory::White {
            base_glance_chance(diff)
        } else {
            0.0
        },
        crit: (melee_crit_chance(crit_rating) - crit_suppression(diff)).max(0.0),
    }
}

fn spell_crit_chance(actor: &Character, target: &Target, mods: &EffectModifiers) -> f64 {
    magic_crit_chance(
        actor.stats.get(Stat::SpellCrit) + mods.bonus_crit_rating + target.pseudo.bonus_crit_rating_taken,
    )
}

fn spell_hit_chance(actor: &Character, target: &Target, mods: &EffectModifiers) -> f64 {
    magic_hit_chance(
        actor.stats.get(Stat::SpellHit) + mods.bonus_hit_rating + target.pseudo.bonus_hit_rating_taken,
    )
}

/// Crit chance for `spec`'s crit category, with the stream it is drawn from.
fn crit_roll_for(
    actor: &Character,
    target: &Target,
    spec: &DamageSpec,
    mods: &EffectModifiers,
) -> Option<(&'static str, f64)> {
    match spec.crit_roll {
        CritRollCategory::None => None,
        CritRollCategory::Magical => {
            Some((resolution::MAGIC_CRIT_LABEL, spell_crit_chance(actor, target, mods)))
        }
        CritRollCategory::Physical => Some((
            resolution::PHYSICAL_CRIT_LABEL,
            attack_table(actor, target, OutcomeRollCategory::Special, mods).crit,
        )),
    }
}

/// Decide the outcome of one effect. Exactly one outcome comes back.
fn roll_outcome(
    rng: &mut RandomSource,
    actor: &Character,
    target: &Target,
    def: &AbilityDef,
    spec: &DamageSpec,
    mods: &EffectModifiers,
) -> HitOutcome {
    let always_hits = def.flags.contains(SpellFlags::ALWAYS_HITS);
    match spec.roll {
        OutcomeRollCategory::White | OutcomeRollCategory::Special | OutcomeRollCategory::Ranged
            if !always_hits =>
        {
            let mut table = attack_table(actor, target, spec.roll, mods);
            table.crit = match spec.crit_roll {
                CritRollCategory::None => 0.0,
                CritRollCategory::Magical => spell_crit_chance(actor, target, mods),
                CritRollCategory::Physical => table.crit,
            };
            let can_dodge = !def.flags.contains(SpellFlags::CANNOT_BE_DODGED);
            roll_physical(rng, &table, spec.roll, can_dodge)
        }
        roll => {
            if roll == OutcomeRollCategory::Magic
                && !always_hits
                && !roll_spell_hit(rng, spell_hit_chance(actor, target, mods))
            {
                return HitOutcome::MISS;
            }
            match crit_roll_for(actor, target, spec, mods) {
                Some((label, chance)) if roll_crit(rng, label, chance) => HitOutcome::CRIT,
                _ => HitOutcome::HIT,
            }
        }
    }
}

impl Simulation {
    fn hooks_for(&self, caster: ActorIndex, target: TargetIndex) -> (Vec<ActiveHook>, Vec<ActiveHook>) {
        (
            self.actors[caster.0].auras.active_hooks(AuraOwner::Actor(caster)),
            self.targets[target.0].auras.active_hooks(AuraOwner::Target(target)),
        )
    }

    pub(super) fn resolve_effect(
        &mut self,
        caster: ActorIndex,
        def: &Arc<AbilityDef>,
        target: TargetIndex,
        phantom: bool,
        depth: u8,
    ) -> Result<()> {
        self.target_exists(target)?;
        let now = self.now;
        let behavior = def.behavior();
        let spec = *behavior.damage_spec();
        let hand = behavior.weapon_hand();
        let ranged = hand.map_or(spec.roll == OutcomeRollCategory::Ranged, |h| h.is_ranged());
        let ignore_modifiers = def.flags.contains(SpellFlags::IGNORE_MODIFIERS);

        let actor = &self.actors[caster.0];
        let weapon = hand.and_then(|h| actor.weapons.get(h).copied());
        let hit = HitContext {
            action: def.id,
            caster,
            target,
            school: def.school,
            roll: spec.roll,
            proc_mask: def.proc_mask(),
            periodic: false,
            phantom,
            weapon_speed: weapon.map(|w| w.speed_secs),
            now,
        };

        // 1. before-hit hooks
        let (caster_hooks, target_hooks) = self.hooks_for(caster, target);
        let mut effect = Effect::new(target);
        if !ignore_modifiers {
            for hook in caster_hooks.iter().chain(&target_hooks) {
                hook.before_hit(&hit, &mut effect.mods);
            }
        }

        // 2. outcome
        let outcome = roll_outcome(
            &mut self.rng,
            &self.actors[caster.0],
            &self.targets[target.0],
            def,
            &spec,
            &effect.mods,
        );
        effect.set_outcome(def.id, outcome)?;

        // 3. base damage
        let actor = &self.actors[caster.0];
        let input = DamageInput {
            spell_power: actor.spell_power(def.school),
            attack_power: actor.attack_power(ranged),
            bonus_power: effect.mods.bonus_power,
            bonus_flat_damage: effect.mods.bonus_flat_damage,
            weapon,
            bonus_weapon_damage: actor.pseudo.bonus_weapon_damage,
        };
        let dealt_multiplier = actor.damage_dealt_multiplier(def.school, ranged);
        let threat_multiplier = actor.threat_multiplier(def.school);
        let armor_penetration = actor.stats.get(Stat::ArmorPenetration);
        let base = behavior
            .base_damage(&input, def.school, &mut self.rng)
            .ok_or_else(|| SimError::invariant(def.id, "base damage unavailable (no weapon equipped?)"))?;
        if !base.is_finite() {
            return Err(SimError::invariant(def.id, format!("non-finite base damage {base}")));
        }

        // 4. multiplier chain
        let target_ref = &self.targets[target.0];
        let mut damage = base;
        if !ignore_modifiers {
            damage *= dealt_multiplier * effect.mods.damage_multiplier;
        }
        damage *= spec.static_multiplier;
        if !ignore_modifiers {
            damage *= target_ref.damage_taken_multiplier(def.school, false);
            if def.school.is_physical() && spec.has_damage() {
                damage += target_ref.pseudo.bonus_physical_damage_taken;
            }
        }
        let ignore_resists = def.flags.contains(SpellFlags::IGNORE_RESISTS);
        if def.school.is_physical() {
            if !ignore_resists {
                damage *= 1.0 - armor_damage_reduction(target_ref.armor(), armor_penetration);
            }
        } else if !ignore_resists && !def.flags.contains(SpellFlags::BINARY) {
            let (tag, fraction) = roll_partial_resist(&mut self.rng);
            if effect.landed() {
                damage *= fraction;
                effect.tag_partial(def.id, tag)?;
            }
        }
        let block_value = self.targets[target.0].defense.block_value;
        let outcome = effect.outcome();
        if outcome.contains(HitOutcome::BLOCK) {
            damage = (damage - block_value).max(0.0);
        }
        damage = (damage * outcome_multiplier(outcome, spec.crit_multiplier)).max(0.0);

        // 5. threat
        let landed = effect.landed();
        effect.damage = damage;
        effect.threat = resolution::threat(
            damage,
            spec.flat_threat,
            spec.threat_multiplier * threat_multiplier,
            landed,
        );

        // 6. results
        self.record_damage(caster, target, def.id, &effect);
        if def.is_auto_attack() && landed {
            self.gain_swing_rage(caster, hand, effect.damage, outcome);
        }
        if self.log_enabled() && !def.flags.contains(SpellFlags::NO_COMBAT_LOG) {
            let line = format!(
                "{} {} {} for {:.0} damage. (Threat: {:.0})",
                self.actors[caster.0].name,
                def.name,
                effect.outcome(),
                effect.damage,
                effect.threat
            );
            self.push_log(line);
        }

        // 7. procs
        let mut local = Vec::new();
        behavior.on_resolved(
            &ResolvedEffect {
                action: def.id,
                caster,
                target,
                landed,
            },
            &mut local,
        );
        let event = effect.to_event(hit);
        let reactions = {
            let mut ctx = ProcContext::new(&mut self.rng, now);
            dispatch(&event, local, &caster_hooks, &target_hooks, &mut ctx);
            ctx.into_reactions()
        };
        self.apply_reactions(reactions, depth)
    }

    fn record_damage(
        &mut self,
        caster: ActorIndex,
        target: TargetIndex,
        action: ActionId,
        effect: &Effect,
    ) {
        self.metrics
            .entry(action)
            .or_default()
            .record(effect.outcome(), effect.damage, effect.threat);
        self.actors[caster.0].damage_done += effect.damage;
        self.targets[target.0].damage_taken += effect.damage;
        self.total_damage += effect.damage;
    }

    fn gain_swing_rage(
        &mut self,
        caster: ActorIndex,
        hand: Option<Hand>,
        damage: f64,
        outcome: HitOutcome,
    ) {
        let actor = &mut self.actors[caster.0];
        let Some((hand, weapon)) = hand.and_then(|h| actor.weapons.get(h).copied().map(|w| (h, w))) else {
            return;
        };
        if !actor.resources.has(ResourceKind::Rage) {
            return;
        }
        let mut factor = hand.rage_hit_factor();
        if outcome.contains(HitOutcome::CRIT) {
            factor *= 2.0;
        }
        let rage = rage_from_white_hit(damage, weapon.speed_secs, factor);
        actor.resources.restore(ResourceKind::Rage, rage);
    }

    /// One tick of the DoT with `serial`, using its snapshot.
    pub(super) fn tick_dot(&mut self, serial: u64) -> Result<()> {
        let Some(index) = self.dots.iter().position(|d| d.serial == serial) else {
            return Ok(());
        };
        let dot = self.dots[index].clone();
        let now = self.now;
        let ignore_modifiers = dot.flags.contains(SpellFlags::IGNORE_MODIFIERS);
        let hit = HitContext {
            action: dot.action,
            caster: dot.caster,
            target: dot.target,
            school: dot.school,
            roll: if dot.roll_ticks {
                OutcomeRollCategory::Magic
            } else {
                OutcomeRollCategory::None
            },
            proc_mask: ProcMask::PERIODIC,
            periodic: true,
            phantom: false,
            weapon_speed: None,
            now,
        };

        let (caster_hooks, target_hooks) = self.hooks_for(dot.caster, dot.target);
        let mut damage = dot.snapshot.damage_per_tick;
        if !ignore_modifiers {
            for hook in caster_hooks.iter().chain(&target_hooks) {
                hook.before_periodic(&hit, &mut damage);
            }
            let target = &self.targets[dot.target.0];
            damage *= target.damage_taken_multiplier(dot.school, true);
            if dot.school.is_physical() {
                damage += target.pseudo.bonus_physical_damage_taken;
            }
        }

        let outcome = if dot.roll_ticks {
            roll_magic(&mut self.rng, dot.snapshot.hit_chance, dot.snapshot.crit_chance)
        } else {
            HitOutcome::HIT
        };
        let mut effect = Effect::new(dot.target);
        effect.set_outcome(dot.action, outcome)?;
        if !dot.school.is_physical()
            && !dot.flags.contains(SpellFlags::IGNORE_RESISTS)
            && !dot.flags.contains(SpellFlags::BINARY)
        {
            let (tag, fraction) = roll_partial_resist(&mut self.rng);
            if effect.landed() {
                damage *= fraction;
                effect.tag_partial(dot.action, tag)?;
            }
        }
        damage = (damage * outcome_multiplier(effect.outcome(), dot.crit_multiplier)).max(0.0);

        let threat_multiplier = self.actors[dot.caster.0].threat_multiplier(dot.school);
        effect.damage = damage;
        effect.threat = resolution::threat(damage, 0.0, threat_multiplier, effect.landed());
        self.record_damage(dot.caster, dot.target, dot.action, &effect);

        if self.log_enabled() && !dot.flags.contains(SpellFlags::NO_COMBAT_LOG) {
            let name = self.actors[dot.caster.0]
                .ability(dot.action)
                .map_or_else(|| dot.action.to_string(), |def| def.name.clone());
            let line = format!(
                "{} {} tick {} for {:.0} damage. (Threat: {:.0})",
                self.actors[dot.caster.0].name,
                name,
                effect.outcome(),
                effect.damage,
                effect.threat
            );
            self.push_log(line);
        }

        let event = effect.to_event(hit);
        let reactions = {
            let mut ctx = ProcContext::new(&mut self.rng, now);
            dispatch(&event, Vec::new(), &caster_hooks, &target_hooks, &mut ctx);
            ctx.into_reactions()
        };

        if let Some(index) = self.dots.iter().position(|d| d.serial == serial) {
            if self.dots[index].advance() {
                self.finish_dot(index);
            }
        }
        self.apply_reactions(reactions, 0)
    }

    /// Drop a finished or cancelled DoT and clear its marker unless another
    /// DoT on the same target still uses it.
    pub(super) fn finish_dot(&mut self, index: usize) {
        let dot = self.dots.remove(index);
        let shared = self
            .dots
            .iter()
            .any(|d| d.target == dot.target && d.marker == dot.marker && !d.is_complete());
        if !shared {
            let now = self.now;
            let target = &mut self.targets[dot.target.0];
            target.auras.remove(&mut target.stats, dot.marker, now);
        }
    }
}
