//! Ability discovery on level-up
//!
//! Two pools: upgrades (next tier of a family the unit already owns) and
//! discoveries (unowned tier-1 abilities for the unit's domain, from
//! families it does not have yet).

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::abilities::definition::AbilityDefinition;
use crate::abilities::registry::AbilityRegistry;
use crate::core::types::AbilityId;
use crate::unit::Unit;

/// Next-tier versions of families the unit owns
pub fn upgrade_candidates<'r>(unit: &Unit, registry: &'r AbilityRegistry) -> Vec<&'r AbilityDefinition> {
    let owned: Vec<(&str, u32)> = unit
        .traits
        .abilities
        .iter()
        .filter_map(|id| registry.get(id).ok())
        .filter_map(|def| def.family.as_deref().map(|f| (f, def.tier)))
        .collect();

    registry
        .iter()
        .filter(|def| !unit.traits.knows(&def.id))
        .filter(|def| {
            def.family.as_deref().is_some_and(|family| {
                owned.iter().any(|(f, tier)| *f == family && def.tier == tier + 1)
            })
        })
        .collect()
}

/// Unowned first-tier abilities the unit could learn from scratch
pub fn discovery_candidates<'r>(unit: &Unit, registry: &'r AbilityRegistry) -> Vec<&'r AbilityDefinition> {
    let owned_families: Vec<&str> = unit
        .traits
        .abilities
        .iter()
        .filter_map(|id| registry.get(id).ok())
        .filter_map(|def| def.family.as_deref())
        .collect();

    registry
        .iter()
        .filter(|def| def.tier == 1 && !unit.traits.knows(&def.id))
        .filter(|def| def.domain.map_or(true, |d| d == unit.domain))
        .filter(|def| {
            def.family
                .as_deref()
                .map_or(true, |family| !owned_families.contains(&family))
        })
        .collect()
}

/// Pick one ability for a level-up, preferring upgrades with `upgrade_probability`
pub fn pick_ability(
    unit: &Unit,
    registry: &AbilityRegistry,
    upgrade_probability: f64,
    rng: &mut ChaCha8Rng,
) -> Option<AbilityId> {
    let upgrades = upgrade_candidates(unit, registry);
    let discoveries = discovery_candidates(unit, registry);

    let pool = match (upgrades.is_empty(), discoveries.is_empty()) {
        (true, true) => return None,
        (false, true) => &upgrades,
        (true, false) => &discoveries,
        (false, false) => {
            if rng.gen_bool(upgrade_probability.clamp(0.0, 1.0)) {
                &upgrades
            } else {
                &discoveries
            }
        }
    };
    pool.choose(rng).map(|def| def.id.clone())
}

/// Teach `ability`, retiring the lower tier it replaces
pub fn learn(unit: &mut Unit, registry: &AbilityRegistry, ability: &str) {
    if let Ok(def) = registry.get(ability) {
        if let Some(family) = def.family.as_deref() {
            let superseded: Vec<AbilityId> = unit
                .traits
                .abilities
                .iter()
                .filter(|id| {
                    registry
                        .get(id)
                        .is_ok_and(|old| old.family.as_deref() == Some(family) && old.tier < def.tier)
                })
                .cloned()
                .collect();
            for id in superseded {
                unit.traits.abilities.remove(&id);
            }
        }
    }
    unit.traits.abilities.insert(ability.to_string());
}
