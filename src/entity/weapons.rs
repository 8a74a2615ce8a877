//! Equipped weapons and auto-attack configuration

use serde::{Deserialize, Serialize};

use crate::combat::constants::OFF_HAND_DAMAGE_MULTIPLIER;
use crate::combat::outcome::ProcMask;
use crate::core::error::{Result, SimError};
use crate::core::rng::RandomSource;
use crate::core::types::{secs, ActionId, SimTime};

pub const WEAPON_DAMAGE_LABEL: &str = "Weapon Damage Roll";

/// Attack power contributing one point of weapon DPS.
const ATTACK_POWER_PER_DPS: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    MainHand,
    OffHand,
    Ranged,
}

impl Hand {
    pub fn auto_attack_id(self) -> ActionId {
        match self {
            Hand::MainHand => ActionId::other(1).with_tag(1),
            Hand::OffHand => ActionId::other(1).with_tag(2),
            Hand::Ranged => ActionId::other(2),
        }
    }

    pub fn auto_proc_mask(self) -> ProcMask {
        match self {
            Hand::MainHand => ProcMask::MELEE_MH_AUTO,
            Hand::OffHand => ProcMask::MELEE_OH_AUTO,
            Hand::Ranged => ProcMask::RANGED_AUTO,
        }
    }

    pub fn special_proc_mask(self) -> ProcMask {
        match self {
            Hand::MainHand => ProcMask::MELEE_MH_SPECIAL,
            Hand::OffHand => ProcMask::MELEE_OH_SPECIAL,
            Hand::Ranged => ProcMask::RANGED_SPECIAL,
        }
    }

    /// Rage hit factor for white hits (doubled on crits by the caller).
    pub fn rage_hit_factor(self) -> f64 {
        match self {
            Hand::MainHand => 3.5,
            Hand::OffHand => 1.75,
            Hand::Ranged => 0.0,
        }
    }

    pub fn is_ranged(self) -> bool {
        self == Hand::Ranged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub min_damage: f64,
    pub max_damage: f64,
    pub speed_secs: f64,
}

impl Weapon {
    pub fn new(min_damage: f64, max_damage: f64, speed_secs: f64) -> Self {
        Self {
            min_damage,
            max_damage,
            speed_secs,
        }
    }

    pub fn speed(&self) -> SimTime {
        secs(self.speed_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_damage >= 0.0) || !(self.max_damage >= self.min_damage) {
            return Err(SimError::Config(format!(
                "weapon damage range [{}, {}] is invalid",
                self.min_damage, self.max_damage
            )));
        }
        if !(self.speed_secs > 0.0) || !self.speed_secs.is_finite() {
            return Err(SimError::Config(format!(
                "weapon speed ({}) must be positive",
                self.speed_secs
            )));
        }
        Ok(())
    }

    /// `uniform(min, max) + AP/14 × speed + bonus`, halved for the off hand.
    pub fn roll_damage(
        &self,
        rng: &mut RandomSource,
        hand: Hand,
        attack_power: f64,
        bonus_weapon_damage: f64,
    ) -> f64 {
        let rolled = rng.uniform(WEAPON_DAMAGE_LABEL, self.min_damage, self.max_damage);
        let damage = rolled + attack_power / ATTACK_POWER_PER_DPS * self.speed_secs + bonus_weapon_damage;
        if hand == Hand::OffHand {
            damage * OFF_HAND_DAMAGE_MULTIPLIER
        } else {
            damage
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoAttackMode {
    #[default]
    None,
    Melee,
    Ranged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weapons {
    pub main_hand: Option<Weapon>,
    pub off_hand: Option<Weapon>,
    pub ranged: Option<Weapon>,
    pub auto_attack: AutoAttackMode,
}

impl Weapons {
    pub fn get(&self, hand: Hand) -> Option<&Weapon> {
        match hand {
            Hand::MainHand => self.main_hand.as_ref(),
            Hand::OffHand => self.off_hand.as_ref(),
            Hand::Ranged => self.ranged.as_ref(),
        }
    }

    pub fn is_dual_wield(&self) -> bool {
        self.main_hand.is_some() && self.off_hand.is_some()
    }

    /// Hands that swing automatically.
    pub fn swinging_hands(&self) -> Vec<Hand> {
        match self.auto_attack {
            AutoAttackMode::None => Vec::new(),
            AutoAttackMode::Melee => [Hand::MainHand, Hand::OffHand]
                .into_iter()
                .filter(|hand| self.get(*hand).is_some())
                .collect(),
            AutoAttackMode::Ranged => self.ranged.map(|_| Hand::Ranged).into_iter().collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for weapon in [self.main_hand, self.off_hand, self.ranged].iter().flatten() {
            weapon.validate()?;
        }
        match self.auto_attack {
            AutoAttackMode::Melee if self.main_hand.is_none() => Err(SimError::Config(
                "melee auto-attacks need a main-hand weapon".into(),
            )),
            AutoAttackMode::Ranged if self.ranged.is_none() => Err(SimError::Config(
                "ranged auto-attacks need a ranged weapon".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_hand_damage_halved() {
        let weapon = Weapon::new(100.0, 100.0, 2.8);
        let mut rng = RandomSource::new(1);
        let mh = weapon.roll_damage(&mut rng, Hand::MainHand, 1400.0, 0.0);
        let oh = weapon.roll_damage(&mut rng, Hand::OffHand, 1400.0, 0.0);
        assert!((mh - 380.0).abs() < 1e-9);
        assert!((oh - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_swinging_hands() {
        let weapons = Weapons {
            main_hand: Some(Weapon::new(200.0, 300.0, 2.6)),
            off_hand: Some(Weapon::new(150.0, 250.0, 2.6)),
            ranged: None,
            auto_attack: AutoAttackMode::Melee,
        };
        assert!(weapons.is_dual_wield());
        assert_eq!(weapons.swinging_hands(), vec![Hand::MainHand, Hand::OffHand]);
        assert!(weapons.validate().is_ok());
    }

    #[test]
    fn test_ranged_mode_requires_ranged_weapon() {
        let weapons = Weapons {
            auto_attack: AutoAttackMode::Ranged,
            ..Weapons::default()
        };
        assert!(weapons.validate().is_err());
    }
}
