//! Crew complement and boarding attrition

use serde::{Deserialize, Serialize};

use crate::combat::constants::CREW_DEFENSE_DIVISOR;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewComponent {
    pub max_crew_base: u32,
    #[serde(default)]
    pub max_crew_bonus: u32,
    pub current_crew: u32,
    /// Fighting quality of each crew member when repelling boarders
    pub troop_value: u32,
    #[serde(default)]
    pub is_hulk: bool,
    /// Combined power of embarked troops, feeds boarding bonuses
    #[serde(default)]
    pub embarked_power: f32,
}

impl CrewComponent {
    pub fn new(max_crew: u32, troop_value: u32) -> Self {
        Self {
            max_crew_base: max_crew,
            max_crew_bonus: 0,
            current_crew: max_crew,
            troop_value,
            is_hulk: max_crew == 0,
            embarked_power: 0.0,
        }
    }

    pub fn with_embarked_power(mut self, power: f32) -> Self {
        self.embarked_power = power.max(0.0);
        self
    }

    pub fn max_crew(&self) -> u32 {
        self.max_crew_base + self.max_crew_bonus
    }

    pub fn is_hulk(&self) -> bool {
        self.is_hulk || self.current_crew == 0
    }

    /// Kill crew, returning how many died
    ///
    /// `divisor = max(1, (defense + bonus_defense) / 5)` and
    /// `killed = (amount + bonus_attack / 5) / divisor`, all integer maths.
    /// Any positive attack kills at least one. `effective_defense` defaults
    /// to the crew's own troop value.
    pub fn take_crew_damage(
        &mut self,
        amount: u32,
        bonus_attack: u32,
        effective_defense: Option<u32>,
        bonus_defense: u32,
    ) -> u32 {
        if self.is_hulk() {
            return 0;
        }

        let defense = effective_defense.unwrap_or(self.troop_value);
        let divisor = (defense.saturating_add(bonus_defense) / CREW_DEFENSE_DIVISOR).max(1);
        let attack = amount.saturating_add(bonus_attack / CREW_DEFENSE_DIVISOR);
        let mut killed = (attack / divisor).min(self.current_crew);
        if amount > 0 && killed == 0 {
            killed = 1;
        }

        self.current_crew -= killed;
        if self.current_crew == 0 {
            self.is_hulk = true;
        }
        killed
    }

    /// Man the ship with a prize crew
    pub fn capture(&mut self, initial_crew: u32) {
        self.is_hulk = false;
        self.current_crew = initial_crew.min(self.max_crew());
        if self.current_crew == 0 {
            self.is_hulk = true;
        }
    }
}
