//! One handler per payload kind
//!
//! Handlers never fail the invocation. When an effect cannot apply they
//! leave `applied` false and record why in `reason`.

use ordered_float::OrderedFloat;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::abilities::context::AbilityContext;
use crate::abilities::definition::{AbilityDefinition, Payload};
use crate::abilities::engine::AbilityOutcome;
use crate::combat::boarding::{attacker_bonus, resolve_boarding, seize};
use crate::combat::constants::{FACTION_STAT_PREFIX, MAX_TELEPORT_ATTEMPTS};
use crate::combat::damage::{attack_facing, resolve_damage, DamageReport, DamageRequest};
use crate::combat::morale::rally;
use crate::battle::events::CombatEvent;
use crate::core::config::CombatConfig;
use crate::core::error::AbilityError;
use crate::core::types::{GridPos, UnitId};
use crate::unit::modifiers::{EffectSet, ABILITY_POWER_MULT, DAMAGE_MULT};
use crate::unit::Roster;

/// One invocation after the gates have passed
pub(crate) struct Cast<'a> {
    pub source: UnitId,
    pub target: UnitId,
    pub def: &'a AbilityDefinition,
    pub config: &'a CombatConfig,
}

pub(crate) fn dispatch(
    cast: &Cast<'_>,
    roster: &mut Roster,
    ctx: &mut AbilityContext<'_>,
    rng: &mut ChaCha8Rng,
) -> AbilityOutcome {
    let mut out = AbilityOutcome::new(&cast.def.id, cast.def.payload.kind());

    match &cast.def.payload {
        Payload::Damage { amount } => damage(cast, roster, ctx, *amount, &mut out),
        Payload::Buff { effects, duration } => {
            let bonus = scaling_bonus(cast, roster, ctx);
            let mut effects = effects.clone();
            if bonus > 0.0 {
                for value in effects.values_mut() {
                    *value += bonus;
                }
            }
            modify(cast, roster, cast.target, effects, *duration, &mut out)
        }
        Payload::Debuff { effects, duration } => {
            modify(cast, roster, cast.target, effects.clone(), *duration, &mut out)
        }
        Payload::Heal { amount } => heal(cast, roster, *amount, &mut out),
        Payload::Stun { duration } => stun(cast, roster, *duration, &mut out),
        Payload::AoeDamage {
            amount,
            radius,
            friendly_fire,
        } => aoe_damage(cast, roster, ctx, *amount, *radius, *friendly_fire, &mut out),
        Payload::ShieldRegen { amount } => shield_regen(cast, roster, *amount, &mut out),
        Payload::Drain { amount, heal_ratio } => drain(cast, roster, ctx, *amount, *heal_ratio, &mut out),
        Payload::Capture {
            threshold,
            assault,
            initial_crew,
        } => capture(cast, roster, ctx, *threshold, *assault, *initial_crew, &mut out),
        Payload::Teleport { range } => teleport(cast, roster, ctx, rng, *range, &mut out),
        Payload::MindControl => mind_control(cast, roster, ctx, &mut out),
        Payload::Rally { boost } => rally_target(cast, roster, *boost, &mut out),
        Payload::Charge { effects, duration } | Payload::GuardMode { effects, duration } => {
            modify(cast, roster, cast.target, effects.clone(), *duration, &mut out)
        }
    }

    out
}

fn skip(out: &mut AbilityOutcome, reason: AbilityError) {
    out.applied = false;
    out.description = reason.to_string();
    out.reason = Some(reason);
}

/// Extra magnitude from the caster's resources or its faction's stockpile
fn scaling_bonus(cast: &Cast<'_>, roster: &Roster, ctx: &AbilityContext<'_>) -> f32 {
    let Some(scaling) = &cast.def.scaling else {
        return 0.0;
    };
    let value = match scaling.source_stat.strip_prefix(FACTION_STAT_PREFIX) {
        Some(resource) => ctx.faction.as_deref().map(|f| f.get(resource)).unwrap_or(0.0),
        None => roster
            .get(cast.source)
            .and_then(|u| u.resources.get(&scaling.source_stat).copied())
            .unwrap_or(0.0),
    };
    value * scaling.factor
}

/// Damage for a direct ability hit after scaling and the caster's power multiplier
fn scaled_damage(cast: &Cast<'_>, roster: &Roster, ctx: &AbilityContext<'_>, base: f32) -> f32 {
    let mult = roster
        .get(cast.source)
        .map(|u| u.modifiers.mult(ABILITY_POWER_MULT))
        .unwrap_or(1.0);
    let amount = (base + scaling_bonus(cast, roster, ctx)) * mult;
    amount.floor().max(cast.config.damage.min_ability_damage)
}

/// Run one hit through the damage pipeline and record it
///
/// Returns `None` when the victim is missing, has no hull or is already a wreck.
#[allow(clippy::too_many_arguments)]
fn strike(
    roster: &mut Roster,
    attacker: UnitId,
    attacker_pos: GridPos,
    victim: UnitId,
    request: DamageRequest,
    config: &CombatConfig,
    ctx: &mut AbilityContext<'_>,
    out: &mut AbilityOutcome,
) -> Option<DamageReport> {
    let unit = roster.get_mut(victim)?;
    if !unit.health.as_ref().is_some_and(|h| h.is_alive()) {
        return None;
    }

    let request = DamageRequest {
        facing: attack_facing(attacker_pos, unit),
        ..request
    };
    let report = resolve_damage(unit, &request, config);
    let name = unit.name.clone();

    out.damage_dealt += report.total();
    out.affected.push(victim);
    ctx.emit(CombatEvent::DamageDealt {
        source: Some(attacker),
        target: victim,
        shield: report.shield_damage,
        hull: report.hull_damage,
    });
    if report.destroyed {
        out.kills += 1;
        debug!(unit = %name, "Destroyed by ability");
        ctx.emit(CombatEvent::UnitDestroyed {
            unit: victim,
            name,
            by: Some(attacker),
        });
    }
    Some(report)
}

fn position_of(roster: &Roster, id: UnitId) -> GridPos {
    roster.get(id).map(|u| u.position).unwrap_or_default()
}

/// Validate that `id` can be hit, returning its name
fn hittable(roster: &Roster, id: UnitId) -> Result<String, AbilityError> {
    let unit = roster
        .get(id)
        .ok_or_else(|| AbilityError::InvalidTarget(format!("unit {id} not in battle")))?;
    match &unit.health {
        None => Err(AbilityError::InvalidTarget(format!("{} cannot take damage", unit.name))),
        Some(h) if !h.is_alive() => Err(AbilityError::InvalidTarget(format!("{} is already destroyed", unit.name))),
        Some(_) => Ok(unit.name.clone()),
    }
}

fn damage(cast: &Cast<'_>, roster: &mut Roster, ctx: &mut AbilityContext<'_>, base: f32, out: &mut AbilityOutcome) {
    let name = match hittable(roster, cast.target) {
        Ok(name) => name,
        Err(reason) => return skip(out, reason),
    };
    let amount = scaled_damage(cast, roster, ctx, base);
    let origin = position_of(roster, cast.source);
    let request = DamageRequest::new(amount, Default::default());

    if let Some(report) = strike(roster, cast.source, origin, cast.target, request, cast.config, ctx, out) {
        out.applied = true;
        out.description = format!("Dealt {:.0} damage to {}", report.total(), name);
    }
}

fn modify(
    cast: &Cast<'_>,
    roster: &mut Roster,
    subject: UnitId,
    effects: EffectSet,
    duration: f32,
    out: &mut AbilityOutcome,
) {
    let Some(unit) = roster.get_mut(subject) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {subject} not in battle")));
    };
    unit.modifiers.apply(&cast.def.id, effects, duration);
    unit.invalidate_strength();
    out.applied = true;
    out.affected.push(subject);
    out.description = format!("{} applied to {} for {:.0}s", cast.def.name, unit.name, duration);
}

fn heal(cast: &Cast<'_>, roster: &mut Roster, amount: f32, out: &mut AbilityOutcome) {
    let Some(unit) = roster.get_mut(cast.target) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.target)));
    };
    let Some(health) = unit.health.as_mut() else {
        return skip(out, AbilityError::InvalidTarget(format!("{} cannot be repaired", unit.name)));
    };
    if !health.is_alive() {
        return skip(out, AbilityError::InvalidTarget(format!("{} is already destroyed", unit.name)));
    }

    let restored = health.heal(amount);
    if restored > 0.0 {
        unit.invalidate_strength();
    }
    out.healing_done += restored;
    out.applied = true;
    out.affected.push(cast.target);
    out.description = format!("Restored {:.0} hp to {}", restored, unit.name);
}

fn stun(cast: &Cast<'_>, roster: &mut Roster, duration: f32, out: &mut AbilityOutcome) {
    let Some(unit) = roster.get_mut(cast.target) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.target)));
    };
    // The movement flag only lasts until cleanup; the modifier carries the duration
    unit.modifiers
        .apply(&cast.def.id, AbilityDefinition::stasis_effects(), duration);
    match unit.movement.as_mut() {
        Some(movement) => {
            movement.stunned = true;
            out.description = format!("{} stunned for {:.1}s", unit.name, duration);
        }
        None => out.description = format!("Stasis applied to {} for {:.1}s", unit.name, duration),
    }
    out.applied = true;
    out.affected.push(cast.target);
}

#[allow(clippy::too_many_arguments)]
fn aoe_damage(
    cast: &Cast<'_>,
    roster: &mut Roster,
    ctx: &mut AbilityContext<'_>,
    base: f32,
    radius: f32,
    friendly_fire: bool,
    out: &mut AbilityOutcome,
) {
    if ctx.grid.is_none() {
        damage(cast, roster, ctx, base, out);
        if out.applied {
            out.description.push_str(" (area effect degraded: no grid)");
            out.reason = Some(AbilityError::GridUnavailable(cast.def.id.clone()));
        }
        return;
    }

    let Some(target) = roster.get(cast.target) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.target)));
    };
    let center = target.position;
    let source_faction = roster.get(cast.source).map(|u| u.faction.clone()).unwrap_or_default();

    let mut victims: Vec<UnitId> = if friendly_fire || ctx.candidates.is_empty() {
        let nearby = ctx
            .grid
            .as_deref()
            .map(|g| g.units_within(center, radius))
            .unwrap_or_default();
        nearby
            .into_iter()
            .filter(|id| {
                friendly_fire || roster.get(*id).is_some_and(|u| u.faction != source_faction)
            })
            .collect()
    } else {
        ctx.candidates
            .iter()
            .copied()
            .filter(|id| roster.get(*id).is_some_and(|u| u.position.distance(&center) <= radius))
            .collect()
    };
    victims.retain(|id| *id != cast.source);
    victims.dedup();

    let amount = scaled_damage(cast, roster, ctx, base);
    let origin = position_of(roster, cast.source);
    let mut hits = 0;
    for victim in victims {
        let request = DamageRequest::new(amount, Default::default());
        if strike(roster, cast.source, origin, victim, request, cast.config, ctx, out).is_some() {
            hits += 1;
        }
    }

    out.applied = hits > 0;
    out.description = format!("Blast hit {} units for {:.0} total", hits, out.damage_dealt);
    if hits == 0 {
        out.reason = Some(AbilityError::InvalidTarget("no units in blast radius".into()));
    }
}

fn shield_regen(cast: &Cast<'_>, roster: &mut Roster, amount: f32, out: &mut AbilityOutcome) {
    let Some(unit) = roster.get_mut(cast.target) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.target)));
    };
    let Some(health) = unit.health.as_mut().filter(|h| h.max_shield > 0.0) else {
        return skip(out, AbilityError::InvalidTarget(format!("{} has no shields", unit.name)));
    };
    let added = health.recharge_shields(amount);
    if added > 0.0 {
        unit.invalidate_strength();
    }
    out.applied = true;
    out.affected.push(cast.target);
    out.description = format!("Shields restored by {:.0}", added);
}

fn drain(
    cast: &Cast<'_>,
    roster: &mut Roster,
    ctx: &mut AbilityContext<'_>,
    base: f32,
    heal_ratio: f32,
    out: &mut AbilityOutcome,
) {
    damage(cast, roster, ctx, base, out);
    if !out.applied {
        return;
    }

    let siphoned = out.damage_dealt * heal_ratio;
    if let Some(source) = roster.get_mut(cast.source) {
        if let Some(health) = source.health.as_mut() {
            let restored = health.heal(siphoned);
            out.healing_done += restored;
            if restored > 0.0 {
                source.invalidate_strength();
            }
        }
    }
    out.description = format!("Drained {:.0}, restored {:.0}", out.damage_dealt, out.healing_done);
}

#[allow(clippy::too_many_arguments)]
fn capture(
    cast: &Cast<'_>,
    roster: &mut Roster,
    ctx: &mut AbilityContext<'_>,
    threshold: f32,
    assault: u32,
    initial_crew: Option<u32>,
    out: &mut AbilityOutcome,
) {
    let Some(source) = roster.get(cast.source) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.source)));
    };
    let new_faction = source.faction.clone();
    let bonus_attack = attacker_bonus(source, &cast.config.boarding);

    if let Err(reason) = hittable(roster, cast.target) {
        return skip(out, reason);
    }
    let Some(target) = roster.get(cast.target) else {
        return;
    };
    if target.faction == new_faction {
        return skip(out, AbilityError::InvalidTarget(format!("{} is already friendly", target.name)));
    }
    let ratio = target.hp_ratio();
    if ratio > threshold {
        return skip(out, AbilityError::CaptureResisted { ratio, threshold });
    }

    let crewed = target.crew.as_ref().is_some_and(|c| !c.is_hulk());
    if assault > 0 && crewed {
        let Some(target) = roster.get_mut(cast.target) else {
            return;
        };
        let result = resolve_boarding(assault, bonus_attack, target, &cast.config.boarding);
        out.affected.push(cast.target);
        if !result.defender_hulked {
            out.applied = true;
            out.description = format!("Boarders killed {} crew aboard {}", result.crew_killed, target.name);
            return;
        }
    }

    roster.clear_army(cast.target);
    let Some(target) = roster.get_mut(cast.target) else {
        return;
    };
    seize(target, &new_faction, initial_crew);
    out.applied = true;
    out.captured = true;
    if !out.affected.contains(&cast.target) {
        out.affected.push(cast.target);
    }
    out.description = format!("{} captured at {:.1}% hull", target.name, ratio * 100.0);
    ctx.emit(CombatEvent::UnitCaptured {
        unit: cast.target,
        by: cast.source,
        new_faction,
    });
}

fn teleport(
    cast: &Cast<'_>,
    roster: &mut Roster,
    ctx: &mut AbilityContext<'_>,
    rng: &mut ChaCha8Rng,
    range: f32,
    out: &mut AbilityOutcome,
) {
    let Some(grid) = ctx.grid.as_deref_mut() else {
        return skip(out, AbilityError::GridUnavailable(cast.def.id.clone()));
    };
    let Some(unit) = roster.get_mut(cast.source) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.source)));
    };

    let reach = range.floor() as i32;
    let from = unit.position;
    if reach > 0 {
        for _ in 0..MAX_TELEPORT_ATTEMPTS {
            let dest = GridPos::new(
                from.x + rng.gen_range(-reach..=reach),
                from.y + rng.gen_range(-reach..=reach),
            );
            if dest == from || from.distance(&dest) > range {
                continue;
            }
            if !grid.is_valid(dest) || grid.is_occupied(dest) {
                continue;
            }
            let moved = if grid.position_of(cast.source).is_some() {
                grid.move_unit(cast.source, dest)
            } else {
                grid.place(cast.source, dest)
            };
            if moved {
                unit.position = dest;
                out.applied = true;
                out.affected.push(cast.source);
                out.description = format!("{} jumped to ({}, {})", unit.name, dest.x, dest.y);
                return;
            }
        }
    }
    skip(out, AbilityError::InvalidTarget("no free tile within range".into()));
}

fn mind_control(cast: &Cast<'_>, roster: &mut Roster, ctx: &mut AbilityContext<'_>, out: &mut AbilityOutcome) {
    if ctx.grid.is_none() {
        return skip(out, AbilityError::GridUnavailable(cast.def.id.clone()));
    }
    let Some(puppet) = roster.get(cast.target) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.target)));
    };
    if !puppet.is_alive() {
        return skip(out, AbilityError::InvalidTarget(format!("{} is already destroyed", puppet.name)));
    }

    let puppet_pos = puppet.position;
    let Some((weapon_damage, ap)) = puppet
        .weapons
        .iter()
        .find(|w| !w.is_destroyed)
        .map(|w| (w.volley_damage() * puppet.modifiers.mult(DAMAGE_MULT), w.stats.ap))
    else {
        return skip(out, AbilityError::InvalidTarget(format!("{} has no weapon", puppet.name)));
    };

    let pool: Vec<UnitId> = if ctx.candidates.is_empty() {
        roster
            .iter()
            .filter(|u| u.faction == puppet.faction)
            .map(|u| u.id)
            .collect()
    } else {
        ctx.candidates.clone()
    };
    let victim = pool
        .into_iter()
        .filter(|id| *id != cast.target && *id != cast.source)
        .filter_map(|id| roster.get(id))
        .filter(|u| u.is_alive())
        .min_by_key(|u| (OrderedFloat(u.position.distance(&puppet_pos)), u.id))
        .map(|u| (u.id, u.name.clone()));
    let Some((victim, victim_name)) = victim else {
        return skip(out, AbilityError::InvalidTarget("no ally nearby to attack".into()));
    };

    let request = DamageRequest::new(weapon_damage, Default::default()).with_armor_piercing(ap);
    if strike(roster, cast.target, puppet_pos, victim, request, cast.config, ctx, out).is_some() {
        out.applied = true;
        out.description = format!("Confused! Attacked {}", victim_name);
    } else {
        skip(out, AbilityError::InvalidTarget(format!("{} cannot take damage", victim_name)));
    }
}

fn rally_target(cast: &Cast<'_>, roster: &mut Roster, boost: f32, out: &mut AbilityOutcome) {
    let Some(unit) = roster.get_mut(cast.target) else {
        return skip(out, AbilityError::InvalidTarget(format!("unit {} not in battle", cast.target)));
    };
    if !rally(unit, boost, &cast.config.morale) {
        return skip(out, AbilityError::InvalidTarget(format!("{} has no morale to rally", unit.name)));
    }
    out.applied = true;
    out.affected.push(cast.target);
    out.description = format!("Rallied: +{:.0} morale", boost);
}
