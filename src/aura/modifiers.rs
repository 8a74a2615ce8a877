//! Reusable hook building blocks for common aura shapes
//!
//! Each block is parameterized data; concrete talents and debuffs are built
//! by choosing schools and magnitudes.

use crate::aura::hooks::{AuraHooks, CastTiming};
use crate::aura::set::AuraState;
use crate::aura::AuraOwner;
use crate::combat::constants::{
    MELEE_CRIT_RATING_PER_CRIT_CHANCE, MELEE_HIT_RATING_PER_HIT_CHANCE,
    SPELL_CRIT_RATING_PER_CRIT_CHANCE, SPELL_HIT_RATING_PER_HIT_CHANCE,
};
use crate::combat::effect::{EffectModifiers, HitContext};
use crate::core::types::{SchoolMask, SimTime};
use crate::proc::{ProcContext, Reaction};

fn hit_rating_for(hit: &HitContext, chance: f64) -> f64 {
    let per_percent = if hit.roll.is_physical() {
        MELEE_HIT_RATING_PER_HIT_CHANCE
    } else {
        SPELL_HIT_RATING_PER_HIT_CHANCE
    };
    chance * per_percent * 100.0
}

fn crit_rating_for(hit: &HitContext, chance: f64) -> f64 {
    let per_percent = if hit.roll.is_physical() {
        MELEE_CRIT_RATING_PER_CRIT_CHANCE
    } else {
        SPELL_CRIT_RATING_PER_CRIT_CHANCE
    };
    chance * per_percent * 100.0
}

/// `1 + per_stack × stacks` damage multiplier on matching schools
/// (Improved Scorch, Shadow Weaving).
#[derive(Debug, Clone, Copy)]
pub struct SchoolDamageBonus {
    pub schools: SchoolMask,
    pub per_stack: f64,
}

impl SchoolDamageBonus {
    fn factor(&self, aura: &AuraState) -> f64 {
        1.0 + self.per_stack * aura.stacks as f64
    }
}

impl AuraHooks for SchoolDamageBonus {
    fn on_before_hit(&self, aura: &AuraState, hit: &HitContext, mods: &mut EffectModifiers) {
        if self.schools.contains(hit.school) {
            mods.damage_multiplier *= self.factor(aura);
        }
    }

    fn on_before_periodic(&self, aura: &AuraState, hit: &HitContext, damage: &mut f64) {
        if self.schools.contains(hit.school) {
            *damage *= self.factor(aura);
        }
    }
}

/// Extra crit chance per stack on matching schools (Winter's Chill).
#[derive(Debug, Clone, Copy)]
pub struct SchoolCritBonus {
    pub schools: SchoolMask,
    pub chance_per_stack: f64,
}

impl AuraHooks for SchoolCritBonus {
    fn on_before_hit(&self, aura: &AuraState, hit: &HitContext, mods: &mut EffectModifiers) {
        if self.schools.contains(hit.school) {
            mods.bonus_crit_rating += crit_rating_for(hit, self.chance_per_stack * aura.stacks as f64);
        }
    }
}

/// Flat extra hit chance on matching schools (Improved Faerie Fire).
#[derive(Debug, Clone, Copy)]
pub struct SchoolHitBonus {
    pub schools: SchoolMask,
    pub chance: f64,
}

impl AuraHooks for SchoolHitBonus {
    fn on_before_hit(&self, _aura: &AuraState, hit: &HitContext, mods: &mut EffectModifiers) {
        if self.schools.contains(hit.school) {
            mods.bonus_hit_rating += hit_rating_for(hit, self.chance);
        }
    }
}

/// Shortens the next cast with a cast time, then removes itself
/// (Nature's Grace).
#[derive(Debug, Clone, Copy)]
pub struct CastTimeReduction {
    pub reduction: SimTime,
}

impl AuraHooks for CastTimeReduction {
    fn on_cast_start(
        &self,
        aura: &AuraState,
        owner: AuraOwner,
        timing: &mut CastTiming,
        ctx: &mut ProcContext<'_>,
    ) {
        if timing.cast_time.is_zero() {
            return;
        }
        timing.cast_time = timing.cast_time.saturating_sub(self.reduction);
        ctx.push(Reaction::RemoveAura {
            owner,
            aura: aura.id,
        });
    }
}
