//! Combat telemetry
//!
//! Events flow one way: the core emits, sinks consume, nothing is read back.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::components::MoraleState;
use crate::core::types::{AbilityId, Round, UnitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    AbilityUsed {
        source: UnitId,
        target: UnitId,
        ability: AbilityId,
        applied: bool,
    },
    DamageDealt {
        source: Option<UnitId>,
        target: UnitId,
        shield: f32,
        hull: f32,
    },
    UnitDestroyed {
        unit: UnitId,
        name: String,
        by: Option<UnitId>,
    },
    UnitCaptured {
        unit: UnitId,
        by: UnitId,
        new_faction: String,
    },
    MoraleChanged {
        unit: UnitId,
        from: MoraleState,
        to: MoraleState,
    },
    BattleEnded {
        winner: Option<String>,
        rounds: Round,
    },
}

pub trait TelemetrySink {
    fn emit(&mut self, event: CombatEvent);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&mut self, _event: CombatEvent) {}
}

/// Keeps every event in order
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<CombatEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, pred: impl Fn(&CombatEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&mut self, event: CombatEvent) {
        match event {
            CombatEvent::UnitDestroyed { name, .. } => info!(unit = %name, "Unit destroyed"),
            CombatEvent::UnitCaptured { unit, new_faction, .. } => {
                info!(%unit, faction = %new_faction, "Unit captured")
            }
            CombatEvent::BattleEnded { winner, rounds } => {
                info!(winner = ?winner, rounds, "Battle ended")
            }
            other => debug!(event = ?other, "Combat event"),
        }
    }
}

/// Event tagged with when it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: Round,
    pub event: CombatEvent,
}

/// Log of events from a single step
#[derive(Debug, Clone, Default)]
pub struct BattleEventLog {
    pub round: Round,
    pub events: Vec<CombatEvent>,
}

impl BattleEventLog {
    pub fn new(round: Round) -> Self {
        Self {
            round,
            events: Vec::new(),
        }
    }

    pub fn kills(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CombatEvent::UnitDestroyed { .. }))
            .count()
    }

    pub fn captures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CombatEvent::UnitCaptured { .. }))
            .count()
    }

    /// Events tagged with this log's round
    pub fn stamped(&self) -> Vec<BattleEvent> {
        self.events
            .iter()
            .map(|event| BattleEvent {
                round: self.round,
                event: event.clone(),
            })
            .collect()
    }

    /// Shield plus hull damage dealt this step
    pub fn damage_dealt(&self) -> f32 {
        self.events
            .iter()
            .map(|e| match e {
                CombatEvent::DamageDealt { shield, hull, .. } => shield + hull,
                _ => 0.0,
            })
            .sum()
    }
}

impl TelemetrySink for BattleEventLog {
    fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }
}
