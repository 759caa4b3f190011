//! Orders issued to units by whoever drives the battle
//!
//! Ability orders are one-shot and consumed by the next step. Move and
//! attack orders stand until completed or the unit leaves the battle.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{AbilityId, GridPos, UnitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum Order {
    UseAbility {
        source: UnitId,
        target: UnitId,
        ability: AbilityId,
    },
    MoveTo {
        unit: UnitId,
        destination: GridPos,
    },
    Attack {
        source: UnitId,
        target: UnitId,
    },
}

/// A queued ability cast
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityOrder {
    pub source: UnitId,
    pub target: UnitId,
    pub ability: AbilityId,
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    casts: Vec<AbilityOrder>,
    destinations: AHashMap<UnitId, GridPos>,
    focus: AHashMap<UnitId, UnitId>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, order: Order) {
        match order {
            Order::UseAbility {
                source,
                target,
                ability,
            } => self.casts.push(AbilityOrder {
                source,
                target,
                ability,
            }),
            Order::MoveTo { unit, destination } => {
                self.focus.remove(&unit);
                self.destinations.insert(unit, destination);
            }
            Order::Attack { source, target } => {
                self.destinations.remove(&source);
                self.focus.insert(source, target);
            }
        }
    }

    /// Ability orders in issue order, emptying the queue
    pub fn take_casts(&mut self) -> Vec<AbilityOrder> {
        std::mem::take(&mut self.casts)
    }

    pub fn destination(&self, unit: UnitId) -> Option<GridPos> {
        self.destinations.get(&unit).copied()
    }

    pub fn attack_target(&self, unit: UnitId) -> Option<UnitId> {
        self.focus.get(&unit).copied()
    }

    pub fn arrived(&mut self, unit: UnitId) {
        self.destinations.remove(&unit);
    }

    /// Drop every order given to or aimed at `unit`
    pub fn forget(&mut self, unit: UnitId) {
        self.destinations.remove(&unit);
        self.focus.remove(&unit);
        self.focus.retain(|_, target| *target != unit);
        self.casts.retain(|c| c.source != unit && c.target != unit);
    }

    pub fn is_empty(&self) -> bool {
        self.casts.is_empty() && self.destinations.is_empty() && self.focus.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_replaces_attack() {
        let mut book = OrderBook::new();
        let (a, b) = (UnitId::new(), UnitId::new());
        book.issue(Order::Attack { source: a, target: b });
        book.issue(Order::MoveTo {
            unit: a,
            destination: GridPos::new(3, 4),
        });
        assert_eq!(book.attack_target(a), None);
        assert_eq!(book.destination(a), Some(GridPos::new(3, 4)));
    }

    #[test]
    fn test_casts_are_one_shot() {
        let mut book = OrderBook::new();
        let (a, b) = (UnitId::new(), UnitId::new());
        book.issue(Order::UseAbility {
            source: a,
            target: b,
            ability: "smite".into(),
        });
        assert_eq!(book.take_casts().len(), 1);
        assert!(book.take_casts().is_empty());
    }

    #[test]
    fn test_forget_clears_orders_aimed_at_unit() {
        let mut book = OrderBook::new();
        let (a, b) = (UnitId::new(), UnitId::new());
        book.issue(Order::Attack { source: a, target: b });
        book.issue(Order::UseAbility {
            source: a,
            target: b,
            ability: "smite".into(),
        });
        book.forget(b);
        assert!(book.is_empty());
    }

    #[test]
    fn test_orders_from_json() {
        let json = r#"{"order":"move_to","unit":"00000000-0000-0000-0000-000000000001","destination":{"x":1,"y":2}}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(matches!(order, Order::MoveTo { destination, .. } if destination == GridPos::new(1, 2)));
    }
}
