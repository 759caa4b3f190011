//! Morale integrator and Steady/Shaken/Routing machine
//!
//! Integration runs first, then the state check. Thresholds differ by
//! direction: a unit recovering must climb past a higher bar than the one
//! that broke it, so it cannot flip state every update.

use tracing::debug;

use crate::combat::constants::{TRAIT_FEAR, TRAIT_INSPIRING, TRAIT_TERROR};
use crate::components::{MoraleState, Suppressible};
use crate::core::config::{CombatConfig, MoraleConfig};
use crate::core::types::{relative_bearing, Facing};
use crate::unit::modifiers::FLANK_IMMUNITY;
use crate::unit::{Roster, Unit};

/// What a unit can see around it this update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoraleEnvironment {
    pub rear_threats: usize,
    pub flank_threats: usize,
    pub fear_sources: usize,
    pub terror_sources: usize,
    pub inspiring_allies: usize,
    pub nearby_allies: usize,
}

impl MoraleEnvironment {
    /// Count threats and support within `radius` of the unit
    pub fn survey<F>(unit: &Unit, roster: &Roster, radius: f32, is_hostile: F) -> Self
    where
        F: Fn(&Unit, &Unit) -> bool,
    {
        let mut env = Self::default();
        let heading = unit.heading();

        for other in roster.iter() {
            if other.id == unit.id || !other.is_combat_effective() {
                continue;
            }
            if unit.position.distance(&other.position) > radius {
                continue;
            }

            if is_hostile(unit, other) {
                let bearing = relative_bearing(unit.position, heading, other.position);
                match Facing::from_bearing(bearing) {
                    Facing::Rear => env.rear_threats += 1,
                    Facing::Side => env.flank_threats += 1,
                    _ => {}
                }
                if other.traits.has(TRAIT_TERROR) {
                    env.terror_sources += 1;
                } else if other.traits.has(TRAIT_FEAR) {
                    env.fear_sources += 1;
                }
            } else if other.faction == unit.faction {
                env.nearby_allies += 1;
                if other.traits.has(TRAIT_INSPIRING) {
                    env.inspiring_allies += 1;
                }
            }
        }
        env
    }
}

/// Hysteresis step from `current` given the integrated morale
pub fn next_state(current: MoraleState, morale: f32, config: &MoraleConfig) -> MoraleState {
    if morale <= 0.0 {
        return MoraleState::Routing;
    }
    match current {
        MoraleState::Routing if morale > config.rally_above => MoraleState::Shaken,
        MoraleState::Shaken if morale > config.steady_above => MoraleState::Steady,
        MoraleState::Steady if morale < config.shaken_below => MoraleState::Shaken,
        state => state,
    }
}

/// Integrate one update of `dt` seconds and apply the state machine
///
/// Returns `(from, to)` when the state changed.
pub fn update_morale(
    unit: &mut Unit,
    env: &MoraleEnvironment,
    config: &CombatConfig,
    dt: f32,
) -> Option<(MoraleState, MoraleState)> {
    let cfg = &config.morale;
    let sup = &config.suppression;
    let max_hp = unit.health.as_ref().map(|h| h.max_hp).unwrap_or(0.0);
    let flank_immune = unit.modifiers.has_flag(FLANK_IMMUNITY);
    let morale = unit.morale.as_mut()?;

    // Passive recovery
    morale.time_since_last_damage += dt;
    if morale.time_since_last_damage > cfg.recovery_delay && cfg.reference_leadership > 0.0 {
        let leadership_factor = morale.leadership / cfg.reference_leadership;
        morale.adjust(cfg.recovery_rate * leadership_factor * dt);
    }

    // Recent damage
    if max_hp > 0.0 && morale.recent_damage > 0.0 {
        let percent_lost = morale.recent_damage / max_hp * 100.0;
        morale.adjust(-percent_lost * cfg.damage_weight * dt);
    }
    morale.recent_damage *= (1.0 - cfg.recent_damage_decay * dt).max(0.0);
    if morale.recent_damage < cfg.recent_damage_floor {
        morale.recent_damage = 0.0;
    }

    // Suppression
    if morale.is_suppressed(sup.pinned_threshold) {
        morale.adjust(-cfg.pinned_drain * dt);
    } else if morale.is_suppressed(sup.suppressed_threshold) {
        morale.adjust(-cfg.suppressed_drain * dt);
    }
    morale.decay_suppression(sup.decay_per_second * dt);

    // Position
    if !flank_immune {
        let positional = env.rear_threats as f32 * cfg.rear_penalty
            + env.flank_threats as f32 * cfg.flank_penalty;
        morale.adjust(-positional * dt);
    }

    // Auras
    let aura = env.inspiring_allies as f32 * cfg.inspiration_boost
        - env.fear_sources as f32 * cfg.fear_drain
        - env.terror_sources as f32 * cfg.terror_drain;
    morale.adjust(aura * dt);
    if env.nearby_allies > cfg.ally_support_count {
        morale.adjust(cfg.ally_support_bonus * dt);
    }

    let from = morale.state;
    let to = if env.terror_sources > 0 && morale.current_morale < cfg.terror_break_floor {
        MoraleState::Routing
    } else {
        next_state(from, morale.current_morale, cfg)
    };
    morale.state = to;

    if from != to {
        debug!(unit = %unit.name, ?from, ?to, morale = morale.current_morale, "Morale state changed");
        Some((from, to))
    } else {
        None
    }
}

/// Rally effect: raise morale and lift a routing unit to Shaken if high enough
pub fn rally(unit: &mut Unit, boost: f32, config: &MoraleConfig) -> bool {
    let Some(morale) = unit.morale.as_mut() else {
        return false;
    };
    morale.adjust(boost);
    if morale.state == MoraleState::Routing && morale.current_morale > config.ability_rally_above {
        morale.state = MoraleState::Shaken;
    }
    true
}
