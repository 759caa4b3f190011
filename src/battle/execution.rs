//! Battle execution loop
//!
//! Each step: movement -> abilities -> shooting -> melee -> morale -> cleanup

use std::collections::BTreeMap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::abilities::{AbilityContext, AbilityEngine, AbilityRegistry, Treasury};
use crate::battle::constants::{
    DEFAULT_ACCURACY, DEFAULT_REAL_TIME_DT, MIN_DEFENSE_MULT, MIN_DT, ROUND_SECONDS,
};
use crate::battle::events::{BattleEventLog, CombatEvent, NullSink, TelemetrySink};
use crate::battle::hostility::{AllAtWar, Hostility};
use crate::battle::orders::{Order, OrderBook};
use crate::battle::outcome::{
    check_battle_end, BattleReport, EndCheck, EndReason, FactionStats, Survivor,
};
use crate::combat::damage::{attack_facing, resolve_damage, DamageReport, DamageRequest};
use crate::combat::morale::{update_morale, MoraleEnvironment};
use crate::components::MoraleState;
use crate::core::config::CombatConfig;
use crate::core::types::{relative_bearing, BattleId, Domain, GridPos, Round, SimTime, UnitId};
use crate::spatial::{SpatialGrid, TacticalGrid};
use crate::unit::modifiers::{
    DAMAGE_MULT, DEFENSE_MULT, IMPACT_DAMAGE_MULT, MOVEMENT_SPEED_MULT, SPEED_MULT,
};
use crate::unit::{Roster, Unit};

/// How simulated time advances
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeModel {
    /// Discrete rounds, one second each
    #[default]
    Rounds,
    /// Fixed timestep in seconds
    RealTime {
        #[serde(default = "default_dt")]
        dt: f32,
    },
}

fn default_dt() -> f32 {
    DEFAULT_REAL_TIME_DT
}

impl TimeModel {
    pub fn step_seconds(&self) -> f32 {
        match self {
            Self::Rounds => ROUND_SECONDS,
            Self::RealTime { dt } => dt.max(MIN_DT),
        }
    }

    pub fn is_real_time(&self) -> bool {
        matches!(self, Self::RealTime { .. })
    }
}

/// Where a unit wants to go this step
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stride {
    Towards(GridPos),
    Away(GridPos),
    /// Already in reach: turn to face, do not move
    Face(GridPos),
}

/// One weapon's contribution to a volley
#[derive(Debug, Clone)]
struct Shot {
    weapon: usize,
    hit: bool,
    amount: f32,
    armor_piercing: i32,
    shield_mult: f32,
    hull_mult: f32,
}

/// Complete battle state
///
/// Owns its units outright; nothing here is shared with another battle.
pub struct BattleState {
    pub id: BattleId,
    pub roster: Roster,
    pub grid: TacticalGrid,
    pub time_model: TimeModel,

    // Time
    pub round: Round,
    pub elapsed: SimTime,

    /// Factions holding the field; they win forced decisions
    pub defenders: Vec<String>,
    pub orders: OrderBook,
    pub treasuries: BTreeMap<String, Treasury>,
    pub stats: BTreeMap<String, FactionStats>,

    engine: AbilityEngine,
    config: Arc<CombatConfig>,
    hostility: Box<dyn Hostility + Send + Sync>,
    telemetry: Box<dyn TelemetrySink + Send>,
    rng: ChaCha8Rng,

    // Breakers
    rounds_without_damage: u32,
    rounds_without_kills: u32,

    report: Option<BattleReport>,
}

impl BattleState {
    pub fn new(
        roster: Roster,
        grid: TacticalGrid,
        registry: Arc<AbilityRegistry>,
        config: Arc<CombatConfig>,
        seed: u64,
    ) -> Self {
        let mut state = Self {
            id: BattleId::new(),
            roster,
            grid,
            time_model: TimeModel::Rounds,
            round: 0,
            elapsed: 0.0,
            defenders: Vec::new(),
            orders: OrderBook::new(),
            treasuries: BTreeMap::new(),
            stats: BTreeMap::new(),
            engine: AbilityEngine::new(registry, Arc::clone(&config), seed),
            config,
            hostility: Box::new(AllAtWar),
            telemetry: Box::new(NullSink),
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            rounds_without_damage: 0,
            rounds_without_kills: 0,
            report: None,
        };
        state.deploy();
        state
    }

    pub fn with_time_model(mut self, time_model: TimeModel) -> Self {
        self.time_model = time_model;
        self
    }

    pub fn with_defenders(mut self, defenders: Vec<String>) -> Self {
        self.defenders = defenders;
        self
    }

    pub fn with_hostility(mut self, hostility: impl Hostility + Send + Sync + 'static) -> Self {
        self.hostility = Box::new(hostility);
        self
    }

    pub fn with_treasury(mut self, faction: impl Into<String>, treasury: Treasury) -> Self {
        self.treasuries.insert(faction.into(), treasury);
        self
    }

    pub fn with_telemetry(mut self, telemetry: impl TelemetrySink + Send + 'static) -> Self {
        self.telemetry = Box::new(telemetry);
        self
    }

    /// Put every unit on the map, shifting to the nearest free tile on collisions
    fn deploy(&mut self) {
        for id in self.roster.ids() {
            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            let wanted = self.grid.clamp(unit.position);
            let tile = if self.grid.is_occupied(wanted) {
                self.grid.nearest_free(wanted)
            } else {
                Some(wanted)
            };
            match tile {
                Some(pos) if self.grid.place(id, pos) => unit.position = pos,
                _ => warn!(unit = %unit.name, "No free tile to deploy on"),
            }
            self.stats.entry(unit.faction.clone()).or_default().units_start += 1;
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn dt(&self) -> f32 {
        self.time_model.step_seconds()
    }

    pub fn is_finished(&self) -> bool {
        self.report.is_some()
    }

    pub fn report(&self) -> Option<&BattleReport> {
        self.report.as_ref()
    }

    pub fn issue(&mut self, order: Order) {
        self.orders.issue(order);
    }

    pub fn unit_named(&self, name: &str) -> Option<&Unit> {
        self.roster.iter().find(|u| u.name == name)
    }

    fn is_routing(unit: &Unit) -> bool {
        unit.morale.as_ref().is_some_and(|m| m.is_routing())
    }

    /// Combat-effective units at war with `faction`, in roster order
    fn hostiles_of(&self, faction: &str) -> Vec<UnitId> {
        self.roster
            .iter()
            .filter(|u| u.is_combat_effective() && self.hostility.at_war(faction, &u.faction))
            .map(|u| u.id)
            .collect()
    }

    fn nearest_hostile(&self, unit: &Unit, accept: impl Fn(&Unit) -> bool) -> Option<UnitId> {
        self.roster
            .iter()
            .filter(|o| o.id != unit.id && o.is_combat_effective())
            .filter(|o| self.hostility.at_war(&unit.faction, &o.faction))
            .filter(|o| accept(o))
            .min_by_key(|o| OrderedFloat(unit.position.distance(&o.position)))
            .map(|o| o.id)
    }

    /// Ordered focus target while it lives, otherwise the nearest hostile
    fn engagement_target(&self, unit: &Unit) -> Option<UnitId> {
        self.orders
            .attack_target(unit.id)
            .filter(|t| self.roster.get(*t).is_some_and(|t| t.is_alive()))
            .or_else(|| self.nearest_hostile(unit, |_| true))
    }

    /// Distance at which a unit stops closing in
    fn reach(&self, unit: &Unit) -> f32 {
        let range = unit.longest_range();
        if range > 0.0 {
            range
        } else {
            self.config.battle.melee_range
        }
    }

    /// Run a complete battle step
    pub fn run_round(&mut self) -> BattleEventLog {
        let mut events = BattleEventLog::new(self.round);

        if self.is_finished() {
            return events;
        }
        let dt = self.dt();

        // ===== PHASE 1: MOVEMENT =====
        self.phase_movement(dt, &mut events);

        // ===== PHASE 2: ABILITIES =====
        self.phase_abilities(&mut events);

        // ===== PHASE 3: SHOOTING =====
        self.phase_shooting(&mut events);

        // ===== PHASE 4: MELEE =====
        self.phase_melee(dt, &mut events);

        // ===== PHASE 5: MORALE =====
        self.phase_morale(dt, &mut events);

        // ===== PHASE 6: CLEANUP =====
        self.phase_cleanup(dt, &mut events);

        for event in &events.events {
            self.telemetry.emit(event.clone());
        }
        events
    }

    /// Step until the battle ends; the round and time caps guarantee it does
    pub fn run_to_completion(&mut self) -> BattleReport {
        loop {
            if let Some(report) = &self.report {
                return report.clone();
            }
            self.run_round();
        }
    }

    fn phase_movement(&mut self, dt: f32, _events: &mut BattleEventLog) {
        for id in self.roster.ids() {
            if let Some(stride) = self.plan_move(id) {
                self.walk(id, stride, dt);
            }
        }
    }

    fn plan_move(&mut self, id: UnitId) -> Option<Stride> {
        let unit = self.roster.get(id)?;
        if !unit.is_combat_effective() || unit.is_stunned() || unit.movement.is_none() {
            return None;
        }

        if Self::is_routing(unit) {
            let threat = self.nearest_hostile(unit, |_| true)?;
            return self.roster.get(threat).map(|t| Stride::Away(t.position));
        }

        if let Some(destination) = self.orders.destination(id) {
            if unit.position == destination {
                self.orders.arrived(id);
                return None;
            }
            return Some(Stride::Towards(destination));
        }

        let target = self.engagement_target(unit)?;
        let target_pos = self.roster.get(target)?.position;
        if unit.position.distance(&target_pos) <= self.reach(unit) {
            Some(Stride::Face(target_pos))
        } else {
            Some(Stride::Towards(target_pos))
        }
    }

    /// First free tile that makes progress, trying the diagonal then each axis
    fn next_step(&self, from: GridPos, stride: Stride) -> Option<GridPos> {
        let (direct, anchor, closer) = match stride {
            Stride::Towards(goal) => (from.step_towards(&goal), goal, true),
            Stride::Away(threat) => (from.step_away(&threat), threat, false),
            Stride::Face(_) => return None,
        };
        let before = from.distance(&anchor);
        [direct, GridPos::new(direct.x, from.y), GridPos::new(from.x, direct.y)]
            .into_iter()
            .find(|c| {
                let after = c.distance(&anchor);
                *c != from
                    && self.grid.is_valid(*c)
                    && !self.grid.is_occupied(*c)
                    && if closer { after < before } else { after > before }
            })
    }

    fn walk(&mut self, id: UnitId, stride: Stride, dt: f32) {
        let tiles = {
            let Some(unit) = self.roster.get_mut(id) else {
                return;
            };
            if let Stride::Face(pos) = stride {
                if let Some(movement) = unit.movement.as_mut() {
                    if pos != unit.position {
                        movement.heading_deg = unit.position.heading_to(&pos);
                    }
                }
                return;
            }
            let mult = unit.modifiers.mult(SPEED_MULT) * unit.modifiers.mult(MOVEMENT_SPEED_MULT);
            unit.movement
                .as_mut()
                .map(|m| m.advance(dt, mult))
                .unwrap_or(0)
        };

        for _ in 0..tiles {
            let Some(from) = self.roster.get(id).map(|u| u.position) else {
                return;
            };
            let next = match self.next_step(from, stride) {
                Some(next) if self.grid.move_unit(id, next) => next,
                _ => {
                    if let Some(movement) = self.roster.get_mut(id).and_then(|u| u.movement.as_mut()) {
                        movement.halt();
                    }
                    return;
                }
            };
            if let Some(unit) = self.roster.get_mut(id) {
                unit.position = next;
                if let Some(movement) = unit.movement.as_mut() {
                    movement.heading_deg = from.heading_to(&next);
                }
            }
        }
    }

    fn phase_abilities(&mut self, events: &mut BattleEventLog) {
        for cast in self.orders.take_casts() {
            let Some(caster) = self.roster.get(cast.source) else {
                continue;
            };
            if !caster.is_combat_effective() || caster.is_stunned() {
                debug!(unit = %caster.name, ability = %cast.ability, "Caster unable to act");
                continue;
            }
            let faction = caster.faction.clone();
            let candidates = self.hostiles_of(&faction);

            let mut ctx = AbilityContext::at(self.elapsed)
                .with_grid(&mut self.grid)
                .with_candidates(candidates)
                .with_telemetry(events);
            if let Some(treasury) = self.treasuries.get_mut(&faction) {
                ctx = ctx.with_faction(treasury);
            }

            match self
                .engine
                .execute(&mut self.roster, cast.source, cast.target, &cast.ability, &mut ctx)
            {
                Ok(outcome) => {
                    let stats = self.stats.entry(faction).or_default();
                    stats.abilities_used += 1;
                    stats.damage_dealt += outcome.damage_dealt;
                    stats.kills += outcome.kills;
                    if outcome.captured {
                        stats.captures += 1;
                    }
                    if !outcome.learned.is_empty() {
                        debug!(learned = ?outcome.learned, "Abilities learned in battle");
                    }
                }
                Err(e) => debug!(ability = %cast.ability, error = %e, "Ability order rejected"),
            }
        }
    }

    fn phase_shooting(&mut self, events: &mut BattleEventLog) {
        let mut shooters = self.roster.ids();
        shooters.shuffle(&mut self.rng);

        for id in shooters {
            let Some((target, shots)) = self.aim(id) else {
                continue;
            };
            self.fire(id, target, shots, events);
        }
    }

    /// Pick a target and roll every weapon that can bear on it
    fn aim(&mut self, id: UnitId) -> Option<(UnitId, Vec<Shot>)> {
        let unit = self.roster.get(id)?;
        if !unit.is_combat_effective() || unit.is_stunned() || Self::is_routing(unit) {
            return None;
        }
        let target_id = self.engagement_target(unit)?;
        let target = self.roster.get(target_id)?;

        let distance = unit.position.distance(&target.position);
        let bearing = relative_bearing(unit.position, unit.heading(), target.position);
        let accuracy = unit.stats.as_ref().map(|s| s.accuracy()).unwrap_or(DEFAULT_ACCURACY);
        let scale = unit.modifiers.mult(DAMAGE_MULT)
            / target.modifiers.mult(DEFENSE_MULT).max(MIN_DEFENSE_MULT);

        let mut shots = Vec::new();
        for (idx, weapon) in unit.ready_weapons() {
            if weapon.stats.range < distance || !weapon.covers_bearing(bearing) {
                continue;
            }
            shots.push(Shot {
                weapon: idx,
                hit: self.rng.gen_bool(accuracy),
                amount: weapon.volley_damage() * scale,
                armor_piercing: weapon.stats.ap,
                shield_mult: weapon.shield_mult,
                hull_mult: weapon.hull_mult,
            });
        }
        if shots.is_empty() {
            None
        } else {
            Some((target_id, shots))
        }
    }

    fn fire(&mut self, id: UnitId, target: UnitId, shots: Vec<Shot>, events: &mut BattleEventLog) {
        let default_cooldown = self.config.battle.default_weapon_cooldown;
        let Some(shooter) = self.roster.get_mut(id) else {
            return;
        };
        for shot in &shots {
            if let Some(weapon) = shooter.weapons.get_mut(shot.weapon) {
                weapon.mark_fired(default_cooldown);
            }
        }
        let origin = shooter.position;

        let mut dealt = 0.0;
        let mut kills = 0;
        for shot in shots.iter().filter(|s| s.hit) {
            let request = DamageRequest::new(shot.amount, Default::default())
                .with_armor_piercing(shot.armor_piercing)
                .with_multipliers(shot.shield_mult, shot.hull_mult);
            let Some(report) = self.land_hit(id, origin, target, request, events) else {
                break;
            };
            dealt += report.total();
            if report.destroyed {
                kills += 1;
                break;
            }
        }
        self.credit(id, dealt, kills);
    }

    /// Resolve one hit on a live target and report it
    fn land_hit(
        &mut self,
        source: UnitId,
        origin: GridPos,
        target: UnitId,
        request: DamageRequest,
        events: &mut BattleEventLog,
    ) -> Option<DamageReport> {
        let victim = self.roster.get_mut(target)?;
        if !victim.is_alive() {
            return None;
        }
        let request = DamageRequest {
            facing: attack_facing(origin, victim),
            ..request
        };
        let report = resolve_damage(victim, &request, &self.config);

        events.emit(CombatEvent::DamageDealt {
            source: Some(source),
            target,
            shield: report.shield_damage,
            hull: report.hull_damage,
        });
        if report.destroyed {
            info!(unit = %victim.name, "Unit destroyed");
            events.emit(CombatEvent::UnitDestroyed {
                unit: target,
                name: victim.name.clone(),
                by: Some(source),
            });
        }
        Some(report)
    }

    /// Book damage and kills to the attacker's faction and experience
    fn credit(&mut self, id: UnitId, damage: f32, kills: u32) {
        let Some(unit) = self.roster.get_mut(id) else {
            return;
        };
        let stats = self.stats.entry(unit.faction.clone()).or_default();
        stats.damage_dealt += damage;
        stats.kills += kills;

        let progression = &self.config.progression;
        let xp = damage * progression.xp_damage_ratio + kills as f32 * progression.xp_kill;
        if xp > 0.0 {
            let learned = self.engine.grant_experience(unit, xp);
            if !learned.is_empty() {
                debug!(unit = %unit.name, ?learned, "Abilities learned in battle");
            }
        }
    }

    fn phase_melee(&mut self, dt: f32, events: &mut BattleEventLog) {
        let mut fighters = self.roster.ids();
        fighters.shuffle(&mut self.rng);

        for id in fighters {
            let Some((target, amount)) = self.engage(id, dt) else {
                continue;
            };
            let Some(origin) = self.roster.get(id).map(|u| u.position) else {
                continue;
            };
            let request = DamageRequest::new(amount, Default::default());
            if let Some(report) = self.land_hit(id, origin, target, request, events) {
                self.credit(id, report.total(), u32::from(report.destroyed));
            }
        }
    }

    /// Hand-to-hand strike for a ground unit with an adjacent ground enemy
    fn engage(&self, id: UnitId, dt: f32) -> Option<(UnitId, f32)> {
        let unit = self.roster.get(id)?;
        if unit.domain != Domain::Ground
            || !unit.is_combat_effective()
            || unit.is_stunned()
            || Self::is_routing(unit)
        {
            return None;
        }
        let stats = unit.stats.as_ref()?;
        let reach = self.config.battle.melee_range;
        let target_id = self.nearest_hostile(unit, |o| {
            o.domain == Domain::Ground && unit.position.distance(&o.position) <= reach
        })?;
        let target = self.roster.get(target_id)?;

        let defender_md = target.stats.as_ref().map(|s| s.md).unwrap_or(0.0);
        let amount = stats.melee_damage_against(defender_md)
            * unit.modifiers.mult(DAMAGE_MULT)
            * unit.modifiers.mult(IMPACT_DAMAGE_MULT)
            / target.modifiers.mult(DEFENSE_MULT).max(MIN_DEFENSE_MULT)
            * dt;
        (amount > 0.0).then_some((target_id, amount))
    }

    fn phase_morale(&mut self, dt: f32, events: &mut BattleEventLog) {
        let radius = self.config.morale.awareness_radius;

        for id in self.roster.ids() {
            let env = {
                let Some(unit) = self.roster.get(id) else {
                    continue;
                };
                if unit.morale.is_none() || !unit.is_alive() {
                    continue;
                }
                let hostility = &self.hostility;
                MoraleEnvironment::survey(unit, &self.roster, radius, |a, b| {
                    hostility.at_war(&a.faction, &b.faction)
                })
            };

            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            if let Some((from, to)) = update_morale(unit, &env, &self.config, dt) {
                if to == MoraleState::Routing {
                    info!(unit = %unit.name, "Unit routing");
                }
                events.emit(CombatEvent::MoraleChanged { unit: id, from, to });
            }
        }
    }

    fn phase_cleanup(&mut self, dt: f32, events: &mut BattleEventLog) {
        // Regeneration runs once per simulated second
        let whole_second = (self.elapsed + dt).floor() > self.elapsed.floor();
        let survival_xp = match self.time_model {
            TimeModel::Rounds => self.config.progression.xp_survival_round,
            TimeModel::RealTime { .. } => self.config.progression.xp_survival_second * dt,
        };

        for id in self.roster.ids() {
            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            if whole_second {
                unit.regenerate_hull();
                unit.regenerate_shields();
            }
            for expired in unit.modifiers.tick(dt) {
                debug!(unit = %unit.name, modifier = %expired, "Modifier expired");
            }
            if let Some(movement) = unit.movement.as_mut() {
                movement.stunned = false;
            }
            for weapon in &mut unit.weapons {
                weapon.tick(dt);
            }
            if unit.is_combat_effective() && survival_xp > 0.0 {
                self.engine.grant_experience(unit, survival_xp);
            }
        }

        // Wrecks leave the field; units seized this step get one step's grace
        let wrecks: Vec<UnitId> = self
            .roster
            .iter()
            .filter(|u| !u.is_alive() && !u.captured_this_step)
            .map(|u| u.id)
            .collect();
        for id in wrecks {
            if let Some(unit) = self.roster.remove(id) {
                self.grid.remove(id);
                self.orders.forget(id);
                self.stats.entry(unit.faction.clone()).or_default().units_lost += 1;
                debug!(unit = %unit.name, "Wreck removed");
            }
        }
        for unit in self.roster.iter_mut() {
            unit.captured_this_step = false;
        }

        if events.damage_dealt() > 0.0 {
            self.rounds_without_damage = 0;
        } else {
            self.rounds_without_damage += 1;
        }
        if events.kills() + events.captures() > 0 {
            self.rounds_without_kills = 0;
        } else {
            self.rounds_without_kills += 1;
        }

        self.round += 1;
        self.elapsed += dt;

        let check = EndCheck {
            round: self.round,
            elapsed: self.elapsed,
            rounds_without_damage: self.rounds_without_damage,
            rounds_without_kills: self.rounds_without_kills,
        };
        if let Some((winner, reason)) = check_battle_end(
            &self.roster,
            &self.defenders,
            check,
            &self.config.battle,
            self.time_model.is_real_time(),
        ) {
            self.end_battle(winner, reason, events);
        }
    }

    /// End the battle, routing the losers of a forced decision
    fn end_battle(&mut self, winner: Option<String>, reason: EndReason, events: &mut BattleEventLog) {
        if reason.is_forced() {
            if let Some(winner) = &winner {
                for unit in self.roster.iter_mut().filter(|u| &u.faction != winner) {
                    if let Some(morale) = unit.morale.as_mut() {
                        morale.state = MoraleState::Routing;
                    }
                }
            }
        }

        let survivors = self
            .roster
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| Survivor {
                name: u.name.clone(),
                faction: u.faction.clone(),
                hp_ratio: u.hp_ratio(),
            })
            .collect();

        info!(battle = %self.id.0, winner = ?winner, ?reason, rounds = self.round, "Battle ended");
        events.emit(CombatEvent::BattleEnded {
            winner: winner.clone(),
            rounds: self.round,
        });
        self.report = Some(BattleReport {
            battle_id: self.id,
            winner,
            reason,
            rounds: self.round,
            elapsed: self.elapsed,
            survivors,
            stats: self.stats.clone(),
        });
    }
}
