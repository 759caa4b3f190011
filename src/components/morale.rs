use serde::{Deserialize, Serialize};

use super::Suppressible;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoraleState {
    #[default]
    Steady,
    Shaken,
    Routing,
}

/// Leadership, morale pool and suppression
///
/// The integrator and state transitions live in `combat::morale`; this
/// component only stores the numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoraleComponent {
    pub leadership: f32,
    pub max_morale: f32,
    pub current_morale: f32,
    #[serde(default)]
    pub suppression: f32,
    #[serde(default)]
    pub state: MoraleState,
    /// Hull damage taken recently, decays over time
    #[serde(default)]
    pub recent_damage: f32,
    #[serde(default)]
    pub time_since_last_damage: f32,
}

impl MoraleComponent {
    pub fn new(leadership: f32, max_morale: f32) -> Self {
        Self {
            leadership,
            max_morale,
            current_morale: max_morale,
            suppression: 0.0,
            state: MoraleState::Steady,
            recent_damage: 0.0,
            time_since_last_damage: 0.0,
        }
    }

    /// Note hull damage for the recent-damage penalty and reset the recovery timer
    pub fn record_damage(&mut self, hull_damage: f32) {
        if hull_damage <= 0.0 {
            return;
        }
        self.recent_damage += hull_damage;
        self.time_since_last_damage = 0.0;
    }

    pub fn adjust(&mut self, delta: f32) {
        self.current_morale = (self.current_morale + delta).clamp(0.0, self.max_morale);
    }

    pub fn decay_suppression(&mut self, amount: f32) {
        self.suppression = (self.suppression - amount).max(0.0);
    }

    pub fn is_routing(&self) -> bool {
        self.state == MoraleState::Routing
    }
}

impl Suppressible for MoraleComponent {
    fn add_suppression(&mut self, amount: f32, cap: f32) {
        self.suppression = (self.suppression + amount.max(0.0)).min(cap);
    }

    fn suppression(&self) -> f32 {
        self.suppression
    }
}
