//! Unit table with army handles
//!
//! The roster owns every unit in a battle. Armies are lists of ids plus a
//! cached strength total; units point back at their army by handle only.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{ArmyId, UnitId};
use crate::unit::entity::Unit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    pub name: String,
    pub faction: String,
    pub members: Vec<UnitId>,
    #[serde(skip)]
    cached_strength: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
    armies: AHashMap<ArmyId, Army>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: Unit) -> UnitId {
        let id = unit.id;
        if let Some(&idx) = self.index.get(&id) {
            self.units[idx] = unit;
        } else {
            self.index.insert(id, self.units.len());
            self.units.push(unit);
        }
        id
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.index.get(&id).map(|&idx| &self.units[idx])
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.index.get(&id).map(|&idx| &mut self.units[idx])
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.index.contains_key(&id)
    }

    /// Remove a unit and its army membership
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let idx = self.index.remove(&id)?;
        let unit = self.units.remove(idx);
        for (i, later) in self.units.iter().enumerate().skip(idx) {
            self.index.insert(later.id, i);
        }
        if let Some(army) = unit.army.and_then(|a| self.armies.get_mut(&a)) {
            army.members.retain(|m| *m != id);
            army.cached_strength = None;
        }
        Some(unit)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    pub fn create_army(&mut self, name: impl Into<String>, faction: impl Into<String>) -> ArmyId {
        let army = Army {
            id: ArmyId::new(),
            name: name.into(),
            faction: faction.into(),
            members: Vec::new(),
            cached_strength: None,
        };
        let id = army.id;
        self.armies.insert(id, army);
        id
    }

    pub fn army(&self, id: ArmyId) -> Option<&Army> {
        self.armies.get(&id)
    }

    pub fn armies(&self) -> impl Iterator<Item = &Army> {
        self.armies.values()
    }

    /// Move a unit into an army, leaving its previous one
    pub fn assign(&mut self, unit_id: UnitId, army_id: ArmyId) -> bool {
        if !self.armies.contains_key(&army_id) || !self.contains(unit_id) {
            return false;
        }
        self.clear_army(unit_id);
        if let Some(unit) = self.get_mut(unit_id) {
            unit.army = Some(army_id);
        }
        if let Some(army) = self.armies.get_mut(&army_id) {
            army.members.push(unit_id);
            army.cached_strength = None;
        }
        true
    }

    /// Detach a unit from its army, if any
    pub fn clear_army(&mut self, unit_id: UnitId) {
        let Some(army_id) = self.get_mut(unit_id).and_then(|u| u.army.take()) else {
            return;
        };
        if let Some(army) = self.armies.get_mut(&army_id) {
            army.members.retain(|m| *m != unit_id);
            army.cached_strength = None;
        }
    }

    /// Army strength total, recounted only when a member was invalidated
    pub fn army_strength(&mut self, army_id: ArmyId) -> f32 {
        let Some(army) = self.armies.get(&army_id) else {
            return 0.0;
        };

        let mut dirty = army.cached_strength.is_none();
        for member in &army.members {
            if let Some(&idx) = self.index.get(member) {
                dirty |= self.units[idx].take_container_dirty();
            }
        }

        if !dirty {
            return army.cached_strength.unwrap_or(0.0);
        }

        let members = army.members.clone();
        let mut total = 0.0;
        for member in members {
            if let Some(&idx) = self.index.get(&member) {
                let unit = &mut self.units[idx];
                if unit.is_combat_effective() {
                    total += unit.strength();
                }
            }
        }
        if let Some(army) = self.armies.get_mut(&army_id) {
            army.cached_strength = Some(total);
        }
        total
    }

    /// Distinct factions that still field a combat-effective unit
    pub fn active_factions(&self) -> Vec<String> {
        let mut factions: Vec<String> = self
            .units
            .iter()
            .filter(|u| u.is_combat_effective())
            .map(|u| u.faction.clone())
            .collect();
        factions.sort();
        factions.dedup();
        factions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::HealthComponent;
    use crate::core::types::Domain;

    fn cruiser(faction: &str) -> Unit {
        Unit::new("Cruiser", faction, Domain::Space)
            .with_health(HealthComponent::new(100.0))
            .with_power(10.0)
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut roster = Roster::new();
        let a = roster.insert(cruiser("A"));
        let b = roster.insert(cruiser("B"));
        let c = roster.insert(cruiser("C"));

        assert!(roster.remove(a).is_some());
        assert_eq!(roster.get(c).map(|u| u.faction.as_str()), Some("C"));
        assert_eq!(roster.get(b).map(|u| u.faction.as_str()), Some("B"));
        assert!(roster.get(a).is_none());
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_remove_preserves_insertion_order() {
        let mut roster = Roster::new();
        let ids: Vec<UnitId> = ["A", "B", "C", "D"].iter().map(|f| roster.insert(cruiser(f))).collect();

        roster.remove(ids[1]);

        assert_eq!(roster.ids(), vec![ids[0], ids[2], ids[3]]);
        assert_eq!(roster.get(ids[3]).map(|u| u.faction.as_str()), Some("D"));
        assert_eq!(roster.get(ids[2]).map(|u| u.faction.as_str()), Some("C"));
    }

    #[test]
    fn test_army_strength_recounts_after_invalidation() {
        let mut roster = Roster::new();
        let army = roster.create_army("First Fleet", "A");
        let a = roster.insert(cruiser("A"));
        let b = roster.insert(cruiser("A"));
        roster.assign(a, army);
        roster.assign(b, army);

        assert_eq!(roster.army_strength(army), 20.0);

        if let Some(unit) = roster.get_mut(a) {
            if let Some(h) = unit.health.as_mut() {
                h.take_damage(50.0);
            }
        }
        // No invalidation yet: cached total stands
        assert_eq!(roster.army_strength(army), 20.0);

        if let Some(unit) = roster.get_mut(a) {
            unit.invalidate_strength();
        }
        assert_eq!(roster.army_strength(army), 15.0);
    }

    #[test]
    fn test_clear_army_removes_membership() {
        let mut roster = Roster::new();
        let army = roster.create_army("Raiders", "B");
        let a = roster.insert(cruiser("B"));
        roster.assign(a, army);
        roster.clear_army(a);

        assert!(roster.get(a).is_some_and(|u| u.army.is_none()));
        assert!(roster.army(army).is_some_and(|x| x.members.is_empty()));
        assert_eq!(roster.army_strength(army), 0.0);
    }
}
