//! Combat configuration with documented constants
//!
//! All balance numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section deserializes with
//! defaults, so a TOML file only needs the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ReckoningError, Result};

/// Damage pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Armor points per point of flat damage mitigation
    ///
    /// At 5.0, a hull with 20 frontal armor shaves 4 damage off every hit.
    pub armor_divisor: f32,

    /// Multiplier applied to damage against units tagged `Fortress`
    pub fortress_multiplier: f32,

    /// Smallest damage an ability hit can deal after scaling
    pub min_ability_damage: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            armor_divisor: 5.0,
            fortress_multiplier: 0.5,
            min_ability_damage: 1.0,
        }
    }
}

/// Morale integrator and hysteresis thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoraleConfig {
    /// Seconds without hull damage before passive recovery starts
    pub recovery_delay: f32,

    /// Morale regained per second once recovering
    ///
    /// Scaled by leadership relative to `reference_leadership`.
    pub recovery_rate: f32,

    /// Leadership value at which recovery runs at exactly `recovery_rate`
    pub reference_leadership: f32,

    /// Morale lost per percent of max hp in the recent-damage window
    pub damage_weight: f32,

    /// Fraction of tracked recent damage that bleeds off per second
    pub recent_damage_decay: f32,

    /// Recent damage below this is snapped to zero
    pub recent_damage_floor: f32,

    /// Morale drained per second while pinned
    pub pinned_drain: f32,

    /// Morale drained per second while suppressed (but not pinned)
    pub suppressed_drain: f32,

    /// Morale drained per second per hostile in the rear arc
    pub rear_penalty: f32,

    /// Morale drained per second per hostile in a flank arc
    pub flank_penalty: f32,

    /// Radius (tiles) for flank, aura and ally-support queries
    pub awareness_radius: f32,

    /// Drain per second from each nearby hostile with the `Fear` trait
    pub fear_drain: f32,

    /// Drain per second from each nearby hostile with the `Terror` trait
    pub terror_drain: f32,

    /// Below this morale a terror source forces an immediate rout
    pub terror_break_floor: f32,

    /// Boost per second from each nearby ally with the `Inspiring` trait
    pub inspiration_boost: f32,

    /// Boost per second when more than `ally_support_count` allies are close
    pub ally_support_bonus: f32,

    /// Allies that must be exceeded to earn `ally_support_bonus`
    pub ally_support_count: usize,

    /// Steady units become Shaken below this
    pub shaken_below: f32,

    /// Shaken units recover to Steady above this
    pub steady_above: f32,

    /// Routing units rally to Shaken above this
    ///
    /// Must be the highest of the three thresholds, otherwise a unit could
    /// flicker between states every update.
    pub rally_above: f32,

    /// Rally abilities lift a routing unit to Shaken above this
    pub ability_rally_above: f32,
}

impl Default for MoraleConfig {
    fn default() -> Self {
        Self {
            recovery_delay: 10.0,
            recovery_rate: 5.0,
            reference_leadership: 70.0,
            damage_weight: 0.5,
            recent_damage_decay: 0.2,
            recent_damage_floor: 0.1,
            pinned_drain: 15.0,
            suppressed_drain: 2.0,
            rear_penalty: 20.0,
            flank_penalty: 10.0,
            awareness_radius: 15.0,
            fear_drain: 5.0,
            terror_drain: 15.0,
            terror_break_floor: 20.0,
            inspiration_boost: 10.0,
            ally_support_bonus: 1.0,
            ally_support_count: 3,
            shaken_below: 30.0,
            steady_above: 40.0,
            rally_above: 50.0,
            ability_rally_above: 30.0,
        }
    }
}

/// Suppression intake and decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// Suppression gained per point of hull damage
    pub per_hull_damage: f32,

    /// Suppression at or above which a unit counts as suppressed
    pub suppressed_threshold: f32,

    /// Suppression at or above which a unit counts as pinned
    pub pinned_threshold: f32,

    /// Hard cap on accumulated suppression
    pub max_suppression: f32,

    /// Suppression shed per second
    pub decay_per_second: f32,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            per_hull_damage: 0.5,
            suppressed_threshold: 25.0,
            pinned_threshold: 75.0,
            max_suppression: 100.0,
            decay_per_second: 10.0,
        }
    }
}

/// Experience awards and level curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// XP needed to leave level 1
    ///
    /// Level `n` needs `xp_per_level_base * n^growth_exponent`.
    pub xp_per_level_base: f32,
    pub growth_exponent: f32,
    pub max_level: u32,

    /// Chance to upgrade an owned ability instead of discovering a new one
    pub upgrade_probability: f64,

    /// XP per point of damage dealt
    pub xp_damage_ratio: f32,

    /// Flat XP for destroying a unit
    pub xp_kill: f32,

    /// XP per point of hp restored
    pub xp_heal_ratio: f32,

    /// XP for surviving a discrete round
    pub xp_survival_round: f32,

    /// XP per second survived in real-time mode
    pub xp_survival_second: f32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_per_level_base: 100.0,
            growth_exponent: 1.2,
            max_level: 50,
            upgrade_probability: 0.3,
            xp_damage_ratio: 0.05,
            xp_kill: 50.0,
            xp_heal_ratio: 0.1,
            xp_survival_round: 10.0,
            xp_survival_second: 1.0,
        }
    }
}

/// Boarding troop scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardingConfig {
    /// Attack bonus per point of embarked troop power on the boarding side
    pub attacker_power_scaling: f32,

    /// Defense bonus per point of embarked troop power on the defending side
    ///
    /// Larger than the attacker scaling: defenders fight from prepared positions.
    pub defender_power_scaling: f32,
}

impl Default for BoardingConfig {
    fn default() -> Self {
        Self {
            attacker_power_scaling: 0.5,
            defender_power_scaling: 1.0,
        }
    }
}

/// Battle loop termination and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Hard cap on update steps
    pub max_rounds: u64,

    /// Hard cap on simulated seconds (real-time mode)
    pub max_time: f32,

    /// Consecutive steps with zero damage before a forced draw
    pub stalemate_rounds: u32,

    /// Consecutive steps without a kill before the battle is decided on integrity
    pub kill_stalemate_rounds: u32,

    /// Tiles within which ground units fight hand to hand
    pub melee_range: f32,

    /// Seconds between volleys for weapons that declare no cooldown
    pub default_weapon_cooldown: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5000,
            max_time: 3600.0,
            stalemate_rounds: 500,
            kill_stalemate_rounds: 300,
            melee_range: 1.5,
            default_weapon_cooldown: 1.0,
        }
    }
}

/// Configuration for the combat core
///
/// Constructed once and handed to the engine and battles that need it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub damage: DamageConfig,
    pub morale: MoraleConfig,
    pub suppression: SuppressionConfig,
    pub progression: ProgressionConfig,
    pub boarding: BoardingConfig,
    pub battle: LoopConfig,
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let m = &self.morale;
        if !(m.shaken_below < m.steady_above && m.steady_above < m.rally_above) {
            return Err(ReckoningError::InvalidConfig(format!(
                "morale thresholds must satisfy shaken_below ({}) < steady_above ({}) < rally_above ({})",
                m.shaken_below, m.steady_above, m.rally_above
            )));
        }

        if self.damage.armor_divisor <= 0.0 {
            return Err(ReckoningError::InvalidConfig(
                "armor_divisor must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.progression.upgrade_probability) {
            return Err(ReckoningError::InvalidConfig(format!(
                "upgrade_probability ({}) must be within [0, 1]",
                self.progression.upgrade_probability
            )));
        }

        let s = &self.suppression;
        if s.suppressed_threshold > s.pinned_threshold {
            return Err(ReckoningError::InvalidConfig(format!(
                "suppressed_threshold ({}) should be <= pinned_threshold ({})",
                s.suppressed_threshold, s.pinned_threshold
            )));
        }

        if m.recovery_rate < 0.0 || s.decay_per_second < 0.0 || m.recent_damage_decay < 0.0 {
            return Err(ReckoningError::InvalidConfig(
                "Rates must not be negative".into(),
            ));
        }

        if self.battle.max_rounds == 0 {
            return Err(ReckoningError::InvalidConfig(
                "max_rounds must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CombatConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CombatConfig::from_toml_str(
            r#"
            [morale]
            recovery_rate = 8.0

            [battle]
            stalemate_rounds = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.morale.recovery_rate, 8.0);
        assert_eq!(config.morale.rally_above, 50.0);
        assert_eq!(config.battle.stalemate_rounds, 20);
        assert_eq!(config.damage.armor_divisor, 5.0);
    }

    #[test]
    fn test_inverted_hysteresis_rejected() {
        let mut config = CombatConfig::default();
        config.morale.rally_above = 35.0;
        assert!(matches!(
            config.validate(),
            Err(ReckoningError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_probability_rejected() {
        let result = CombatConfig::from_toml_str("[progression]\nupgrade_probability = 1.5\n");
        assert!(result.is_err());
    }
}
