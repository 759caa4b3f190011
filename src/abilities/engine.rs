//! Ability execution
//!
//! registry lookup -> cooldown gate -> cost gate -> payload handler ->
//! cooldown stamp, cost payment, experience, telemetry, mechanics hook.
//!
//! Gate failures come back as `Err` and leave every unit untouched. Once a
//! handler has run the invocation counts as used, even if the effect did not
//! apply (the outcome then carries the reason).

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::abilities::context::AbilityContext;
use crate::abilities::discovery::{learn, pick_ability};
use crate::abilities::handlers::{dispatch, Cast};
use crate::abilities::registry::AbilityRegistry;
use crate::abilities::resources::{check_costs, pay_costs, FactionResources};
use crate::battle::events::CombatEvent;
use crate::core::config::CombatConfig;
use crate::core::error::AbilityError;
use crate::core::types::{AbilityId, UnitId};
use crate::unit::{Roster, Unit};

/// Result of an ability that passed its gates
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityOutcome {
    pub ability: AbilityId,
    pub payload: &'static str,
    pub applied: bool,
    pub description: String,
    /// Why the effect did not (fully) apply
    pub reason: Option<AbilityError>,
    pub damage_dealt: f32,
    pub healing_done: f32,
    pub kills: u32,
    pub captured: bool,
    pub affected: Vec<UnitId>,
    /// Abilities the caster learned from experience gained
    pub learned: Vec<AbilityId>,
    pub experience_gained: f32,
}

impl AbilityOutcome {
    pub fn new(ability: &str, payload: &'static str) -> Self {
        Self {
            ability: ability.to_string(),
            payload,
            applied: false,
            description: String::new(),
            reason: None,
            damage_dealt: 0.0,
            healing_done: 0.0,
            kills: 0,
            captured: false,
            affected: Vec::new(),
            learned: Vec::new(),
            experience_gained: 0.0,
        }
    }
}

pub struct AbilityEngine {
    registry: Arc<AbilityRegistry>,
    config: Arc<CombatConfig>,
    rng: ChaCha8Rng,
}

impl AbilityEngine {
    pub fn new(registry: Arc<AbilityRegistry>, config: Arc<CombatConfig>, seed: u64) -> Self {
        Self {
            registry,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn registry(&self) -> &AbilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Cast `ability_id` from `source` at `target`
    pub fn execute(
        &mut self,
        roster: &mut Roster,
        source: UnitId,
        target: UnitId,
        ability_id: &str,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<AbilityOutcome, AbilityError> {
        let registry = Arc::clone(&self.registry);
        let config = Arc::clone(&self.config);
        let def = registry.get(ability_id).inspect_err(|e| {
            debug!(ability = ability_id, error = %e, "Ability lookup failed");
        })?;

        if !roster.contains(target) {
            return Err(AbilityError::InvalidTarget(format!("unit {target} not in battle")));
        }
        let caster = roster
            .get(source)
            .ok_or_else(|| AbilityError::InvalidTarget(format!("caster {source} not in battle")))?;

        let ready_at = caster.ready_at(ability_id);
        if ctx.now < ready_at {
            return Err(AbilityError::OnCooldown {
                id: ability_id.to_string(),
                ready_at,
                now: ctx.now,
            });
        }

        check_costs(caster, ctx.faction.as_deref(), &def.cost)?;
        let faction = caster.faction.clone();

        let cast = Cast {
            source,
            target,
            def,
            config: &config,
        };
        let mut outcome = dispatch(&cast, roster, ctx, &mut self.rng);

        if let Some(caster) = roster.get_mut(source) {
            let faction_store = ctx
                .faction
                .as_mut()
                .map(|f| &mut **f as &mut dyn FactionResources);
            pay_costs(caster, faction_store, &def.cost);
            caster.cooldowns.insert(ability_id.to_string(), ctx.now + def.cooldown);

            let progression = &config.progression;
            let xp = outcome.damage_dealt * progression.xp_damage_ratio
                + outcome.healing_done * progression.xp_heal_ratio
                + outcome.kills as f32 * progression.xp_kill;
            outcome.experience_gained = xp;
            outcome.learned = self.grant_experience(caster, xp);
        }

        ctx.emit(CombatEvent::AbilityUsed {
            source,
            target,
            ability: ability_id.to_string(),
            applied: outcome.applied,
        });
        if let Some(hook) = ctx.hook.as_deref_mut() {
            hook.on_ability_use(&faction, source, target, ability_id, &outcome);
        }

        debug!(
            ability = ability_id,
            payload = outcome.payload,
            applied = outcome.applied,
            description = %outcome.description,
            "Ability executed"
        );
        Ok(outcome)
    }

    /// Bank experience and hand out one ability per level gained
    ///
    /// Rewards are skipped if the unit is already in the middle of a level-up.
    pub fn grant_experience(&mut self, unit: &mut Unit, amount: f32) -> Vec<AbilityId> {
        let levels = unit.progression.add_experience(amount, &self.config.progression);
        if levels == 0 || unit.progression.leveling {
            return Vec::new();
        }

        unit.progression.leveling = true;
        let mut learned = Vec::new();
        for _ in 0..levels {
            let pick = pick_ability(
                unit,
                &self.registry,
                self.config.progression.upgrade_probability,
                &mut self.rng,
            );
            if let Some(ability) = pick {
                learn(unit, &self.registry, &ability);
                info!(unit = %unit.name, level = unit.progression.level, %ability, "Ability learned");
                learned.push(ability);
            }
        }
        unit.progression.leveling = false;
        learned
    }
}
