//! Ability cost payment
//!
//! Energy, fuel and ammo come from the caster's own pools and are treated as
//! unlimited when the unit does not track them. Every other resource belongs
//! to the faction and fails closed without a faction store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::constants::is_unit_local;
use crate::core::error::AbilityError;
use crate::unit::Unit;

/// Shared faction stockpile
pub trait FactionResources {
    fn get(&self, resource: &str) -> f32;

    /// Remove `amount`, returning false (and changing nothing) if short
    fn deduct(&mut self, resource: &str, amount: f32) -> bool;
}

/// Plain map-backed stockpile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Treasury {
    pub balances: BTreeMap<String, f32>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: impl Into<String>, amount: f32) -> Self {
        self.balances.insert(resource.into(), amount);
        self
    }

    pub fn credit(&mut self, resource: &str, amount: f32) {
        *self.balances.entry(resource.to_string()).or_insert(0.0) += amount;
    }
}

impl FactionResources for Treasury {
    fn get(&self, resource: &str) -> f32 {
        self.balances.get(resource).copied().unwrap_or(0.0)
    }

    fn deduct(&mut self, resource: &str, amount: f32) -> bool {
        match self.balances.get_mut(resource) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => amount <= 0.0,
        }
    }
}

/// Check every cost without paying anything
pub fn check_costs(
    unit: &Unit,
    faction: Option<&dyn FactionResources>,
    cost: &BTreeMap<String, f32>,
) -> Result<(), AbilityError> {
    for (resource, &required) in cost {
        if required <= 0.0 {
            continue;
        }
        let available = if is_unit_local(resource) {
            match unit.resources.get(resource) {
                Some(&pool) => pool,
                None => continue,
            }
        } else {
            match faction {
                Some(store) => store.get(resource),
                None => 0.0,
            }
        };
        if available < required {
            return Err(AbilityError::InsufficientResources {
                resource: resource.clone(),
                required,
                available,
            });
        }
    }
    Ok(())
}

/// Pay costs previously accepted by `check_costs`
pub fn pay_costs(
    unit: &mut Unit,
    mut faction: Option<&mut (dyn FactionResources + '_)>,
    cost: &BTreeMap<String, f32>,
) {
    for (resource, &amount) in cost {
        if amount <= 0.0 {
            continue;
        }
        if is_unit_local(resource) {
            if let Some(pool) = unit.resources.get_mut(resource) {
                *pool = (*pool - amount).max(0.0);
            }
        } else if let Some(store) = faction.as_deref_mut() {
            store.deduct(resource, amount);
        }
    }
}
