//! Battle termination and reporting
//!
//! A battle ends when at most one faction still fields a combat-effective
//! unit, when nobody has dealt damage for too long (draw), or when it is
//! forced to a decision by the kill breaker or a hard cap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::LoopConfig;
use crate::core::types::{BattleId, Round, SimTime};
use crate::unit::Roster;

const INTEGRITY_TIE: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// One faction left standing
    Victory,
    /// Nobody left standing
    Annihilation,
    /// No damage dealt for too long
    Stalemate,
    /// Damage but no kills for too long; decided on the field
    Attrition,
    RoundLimit,
    TimeLimit,
}

impl EndReason {
    /// Ended by a breaker or cap rather than by one side being wiped out
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::Attrition | Self::RoundLimit | Self::TimeLimit)
    }
}

/// Per-faction running totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionStats {
    pub units_start: usize,
    pub units_lost: usize,
    pub damage_dealt: f32,
    pub kills: u32,
    pub captures: u32,
    pub abilities_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survivor {
    pub name: String,
    pub faction: String,
    pub hp_ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub battle_id: BattleId,
    pub winner: Option<String>,
    pub reason: EndReason,
    pub rounds: Round,
    pub elapsed: SimTime,
    pub survivors: Vec<Survivor>,
    pub stats: BTreeMap<String, FactionStats>,
}

impl BattleReport {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    pub fn survivors_of(&self, faction: &str) -> usize {
        self.survivors.iter().filter(|s| s.faction == faction).count()
    }
}

/// Hull totals of one faction's remaining units
#[derive(Debug, Clone, PartialEq)]
pub struct FactionStanding {
    pub faction: String,
    pub current_hp: f32,
    pub max_hp: f32,
}

impl FactionStanding {
    pub fn integrity(&self) -> f32 {
        if self.max_hp > 0.0 {
            self.current_hp / self.max_hp
        } else {
            0.0
        }
    }
}

/// Standings of every faction with a unit still alive, in name order
pub fn standings(roster: &Roster) -> Vec<FactionStanding> {
    let mut totals: BTreeMap<&str, (f32, f32)> = BTreeMap::new();
    for unit in roster.iter().filter(|u| u.is_alive()) {
        let entry = totals.entry(unit.faction.as_str()).or_default();
        if let Some(h) = &unit.health {
            entry.0 += h.current_hp;
            entry.1 += h.max_hp;
        }
    }
    totals
        .into_iter()
        .map(|(faction, (current_hp, max_hp))| FactionStanding {
            faction: faction.to_string(),
            current_hp,
            max_hp,
        })
        .collect()
}

/// Winner of a battle forced to a decision
///
/// Defenders still on the field hold it. Otherwise the best integrity wins;
/// near-ties go to the larger total hull, then to name order.
pub fn decide(standings: &[FactionStanding], defenders: &[String], active: &[String]) -> Option<String> {
    let mut holding: Vec<&String> = defenders.iter().filter(|d| active.contains(d)).collect();
    holding.sort();
    if let Some(defender) = holding.first() {
        return Some((*defender).clone());
    }

    let mut best: Option<&FactionStanding> = None;
    for standing in standings {
        best = match best {
            None => Some(standing),
            Some(current) => {
                let (a, b) = (standing.integrity(), current.integrity());
                if a > b + INTEGRITY_TIE
                    || ((a - b).abs() < INTEGRITY_TIE && standing.max_hp > current.max_hp)
                {
                    Some(standing)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.map(|s| s.faction.clone())
}

/// Inputs to the end-of-step check
#[derive(Debug, Clone, Copy)]
pub struct EndCheck {
    pub round: Round,
    pub elapsed: SimTime,
    pub rounds_without_damage: u32,
    pub rounds_without_kills: u32,
}

/// Whether the battle is over, and who won
pub fn check_battle_end(
    roster: &Roster,
    defenders: &[String],
    check: EndCheck,
    limits: &LoopConfig,
    real_time: bool,
) -> Option<(Option<String>, EndReason)> {
    let active = roster.active_factions();

    match active.len() {
        0 => return Some((None, EndReason::Annihilation)),
        1 => return Some((active.first().cloned(), EndReason::Victory)),
        _ => {}
    }

    if check.rounds_without_damage >= limits.stalemate_rounds {
        return Some((None, EndReason::Stalemate));
    }

    let reason = if check.rounds_without_kills >= limits.kill_stalemate_rounds {
        EndReason::Attrition
    } else if check.round >= limits.max_rounds {
        EndReason::RoundLimit
    } else if real_time && check.elapsed >= limits.max_time {
        EndReason::TimeLimit
    } else {
        return None;
    };

    let standings: Vec<FactionStanding> = standings(roster)
        .into_iter()
        .filter(|s| active.contains(&s.faction))
        .collect();
    Some((decide(&standings, defenders, &active), reason))
}
