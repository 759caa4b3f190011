//! Parsed ability definitions
//!
//! Registry entries arrive as loose records with a `payload_type` string and
//! payload-specific fields. They are parsed once into a closed `Payload`
//! enum so the engine never compares strings per call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::types::{AbilityId, Domain};
use crate::unit::modifiers::{
    EffectSet, DAMAGE_MULT, DEFENSE_MULT, FLANK_IMMUNITY, IMPACT_DAMAGE_MULT, MOVEMENT_SPEED_MULT,
    SPEED_MULT, STUNNED,
};

/// A registry record exactly as written in the data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAbility {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_payload_type")]
    pub payload_type: String,
    #[serde(default)]
    pub cost: BTreeMap<String, f32>,
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(default)]
    pub scaling: Option<Scaling>,
    /// Payload-specific fields (damage, radius, effects, ...)
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

fn default_payload_type() -> String {
    "damage".to_string()
}

/// Bonus magnitude read from the caster's resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    /// Unit resource name, or `faction:<resource>` for a faction pool
    pub source_stat: String,
    #[serde(default = "default_scaling_factor")]
    pub factor: f32,
}

fn default_scaling_factor() -> f32 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Damage { amount: f32 },
    Buff { effects: EffectSet, duration: f32 },
    Debuff { effects: EffectSet, duration: f32 },
    Heal { amount: f32 },
    Stun { duration: f32 },
    AoeDamage { amount: f32, radius: f32, friendly_fire: bool },
    ShieldRegen { amount: f32 },
    Drain { amount: f32, heal_ratio: f32 },
    Capture {
        threshold: f32,
        /// Boarding strength; 0 seizes without a fight
        assault: u32,
        initial_crew: Option<u32>,
    },
    Teleport { range: f32 },
    MindControl,
    Rally { boost: f32 },
    Charge { effects: EffectSet, duration: f32 },
    GuardMode { effects: EffectSet, duration: f32 },
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Damage { .. } => "damage",
            Payload::Buff { .. } => "buff",
            Payload::Debuff { .. } => "debuff",
            Payload::Heal { .. } => "heal",
            Payload::Stun { .. } => "stun",
            Payload::AoeDamage { .. } => "aoe_damage",
            Payload::ShieldRegen { .. } => "shield_regen",
            Payload::Drain { .. } => "drain",
            Payload::Capture { .. } => "capture",
            Payload::Teleport { .. } => "teleport",
            Payload::MindControl => "mind_control",
            Payload::Rally { .. } => "rally",
            Payload::Charge { .. } => "charge",
            Payload::GuardMode { .. } => "guard_mode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub name: String,
    pub payload: Payload,
    pub cost: BTreeMap<String, f32>,
    pub cooldown: f32,
    /// Theatre restriction for discovery; `None` fits every unit
    pub domain: Option<Domain>,
    /// Upgrade line this ability belongs to
    pub family: Option<String>,
    pub tier: u32,
    pub scaling: Option<Scaling>,
}

impl AbilityDefinition {
    /// Validate a raw record, returning the reason it is unusable otherwise
    pub fn from_raw(id: &str, raw: RawAbility) -> Result<Self, String> {
        if raw.cooldown < 0.0 || !raw.cooldown.is_finite() {
            return Err(format!("cooldown must be a non-negative number, got {}", raw.cooldown));
        }
        if let Some((resource, amount)) = raw.cost.iter().find(|(_, v)| **v < 0.0) {
            return Err(format!("cost of {resource} is negative ({amount})"));
        }

        let p = &raw.params;
        let payload = match raw.payload_type.as_str() {
            "damage" => Payload::Damage {
                amount: number(p, "damage", 10.0)?,
            },
            "buff" => {
                let (effects, duration) = timed_effects(p, &[(DAMAGE_MULT, 1.1)])?;
                Payload::Buff { effects, duration }
            }
            "debuff" => {
                let (effects, duration) = timed_effects(p, &[(SPEED_MULT, 0.5)])?;
                Payload::Debuff { effects, duration }
            }
            "heal" | "repair" => Payload::Heal {
                amount: number(p, "heal", 20.0)?,
            },
            "stun" => Payload::Stun {
                duration: number(p, "duration", 1.0)?,
            },
            "aoe_damage" | "aoe" => Payload::AoeDamage {
                amount: number(p, "damage", 10.0)?,
                radius: non_negative(p, "radius", 2.0)?,
                friendly_fire: flag(p, "friendly_fire")?,
            },
            "shield_regen" => Payload::ShieldRegen {
                amount: number(p, "amount", 50.0)?,
            },
            "drain" => Payload::Drain {
                amount: number(p, "damage", 10.0)?,
                heal_ratio: non_negative(p, "heal_ratio", 1.0)?,
            },
            "capture" | "boarding" => {
                let threshold = number(p, "capture_threshold", 0.2)?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(format!("capture_threshold {threshold} outside [0, 1]"));
                }
                Payload::Capture {
                    threshold,
                    assault: non_negative(p, "assault", 0.0)? as u32,
                    initial_crew: optional_count(p, "initial_crew")?,
                }
            }
            "teleport" => Payload::Teleport {
                range: non_negative(p, "range", 10.0)?,
            },
            "mind_control" => Payload::MindControl,
            "rally" => Payload::Rally {
                boost: number(p, "morale_boost", 50.0)?,
            },
            "charge" => Payload::Charge {
                effects: effects(
                    p,
                    &[
                        (MOVEMENT_SPEED_MULT, 1.5),
                        (DAMAGE_MULT, 1.25),
                        (IMPACT_DAMAGE_MULT, 2.0),
                    ],
                )?,
                duration: number(p, "duration", 5.0)?,
            },
            "guard_mode" => Payload::GuardMode {
                effects: effects(
                    p,
                    &[
                        (MOVEMENT_SPEED_MULT, 0.0),
                        (DEFENSE_MULT, 2.5),
                        (FLANK_IMMUNITY, 1.0),
                    ],
                )?,
                duration: number(p, "duration", 10.0)?,
            },
            other => return Err(format!("unknown payload_type '{other}'")),
        };

        Ok(Self {
            id: id.to_string(),
            name: raw.name.unwrap_or_else(|| id.to_string()),
            payload,
            cost: raw.cost,
            cooldown: raw.cooldown,
            domain: raw.domain,
            family: raw.family,
            tier: raw.tier.unwrap_or(1).max(1),
            scaling: raw.scaling,
        })
    }

    /// Effect set applied by a stun when the target has no movement component
    pub fn stasis_effects() -> EffectSet {
        [(MOVEMENT_SPEED_MULT.to_string(), 0.0), (STUNNED.to_string(), 1.0)].into()
    }
}

fn number(params: &Map<String, Value>, key: &str, default: f32) -> Result<f32, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("field '{key}' is not a finite number")),
        Some(other) => Err(format!("field '{key}' must be a number, got {other}")),
    }
}

fn non_negative(params: &Map<String, Value>, key: &str, default: f32) -> Result<f32, String> {
    let value = number(params, key, default)?;
    if value < 0.0 {
        return Err(format!("field '{key}' must not be negative ({value})"));
    }
    Ok(value)
}

fn optional_count(params: &Map<String, Value>, key: &str) -> Result<Option<u32>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => Ok(Some(non_negative(params, key, 0.0)? as u32)),
    }
}

fn flag(params: &Map<String, Value>, key: &str) -> Result<bool, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(format!("field '{key}' must be true or false, got {other}")),
    }
}

/// `effects` plus how long they last
///
/// A `duration` inside the effects table is a lifetime, not a modifier; the
/// top-level `duration` wins when both are given.
fn timed_effects(
    params: &Map<String, Value>,
    defaults: &[(&str, f32)],
) -> Result<(EffectSet, f32), String> {
    let mut effects = effects(params, defaults)?;
    let nested = effects.remove("duration");
    let duration = match params.get("duration") {
        None | Some(Value::Null) => nested.unwrap_or(1.0),
        Some(_) => number(params, "duration", 1.0)?,
    };
    Ok((effects, duration))
}

/// `effects` table, falling back to `defaults` when absent
///
/// Booleans are stored as flags (1.0 / 0.0).
fn effects(params: &Map<String, Value>, defaults: &[(&str, f32)]) -> Result<EffectSet, String> {
    let Some(value) = params.get("effects") else {
        return Ok(defaults.iter().map(|(k, v)| (k.to_string(), *v)).collect());
    };
    let Value::Object(table) = value else {
        return Err(format!("field 'effects' must be a table, got {value}"));
    };

    let mut out = EffectSet::new();
    for (key, v) in table {
        let parsed = match v {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        match parsed {
            Some(f) if f.is_finite() => {
                out.insert(key.clone(), f);
            }
            _ => return Err(format!("effect '{key}' must be a number or flag, got {v}")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawAbility {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let def = AbilityDefinition::from_raw("smite", raw(json!({}))).unwrap();
        assert_eq!(def.payload, Payload::Damage { amount: 10.0 });
        assert_eq!(def.tier, 1);
        assert_eq!(def.name, "smite");

        let def = AbilityDefinition::from_raw("hold", raw(json!({"payload_type": "guard_mode"}))).unwrap();
        match def.payload {
            Payload::GuardMode { effects, duration } => {
                assert_eq!(duration, 10.0);
                assert_eq!(effects.get(DEFENSE_MULT), Some(&2.5));
                assert_eq!(effects.get(FLANK_IMMUNITY), Some(&1.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_repair_is_heal() {
        let def = AbilityDefinition::from_raw(
            "field_repair",
            raw(json!({"payload_type": "repair", "heal": 35})),
        )
        .unwrap();
        assert_eq!(def.payload, Payload::Heal { amount: 35.0 });
    }

    #[test]
    fn test_effects_with_flags() {
        let def = AbilityDefinition::from_raw(
            "bulwark",
            raw(json!({"payload_type": "buff", "effects": {"defense_mult": 1.5, "flank_immunity": true}, "duration": 3})),
        )
        .unwrap();
        match def.payload {
            Payload::Buff { effects, duration } => {
                assert_eq!(duration, 3.0);
                assert_eq!(effects.get(FLANK_IMMUNITY), Some(&1.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_duration_lifted_out_of_effects() {
        let def = AbilityDefinition::from_raw(
            "iron_halo",
            raw(json!({"payload_type": "buff", "effects": {"damage_mult": 1.5, "duration": 5}})),
        )
        .unwrap();
        match def.payload {
            Payload::Buff { effects, duration } => {
                assert_eq!(duration, 5.0);
                assert!(!effects.contains_key("duration"));
                assert_eq!(effects.get(DAMAGE_MULT), Some(&1.5));
            }
            other => panic!("unexpected payload {other:?}"),
        }

        // A top-level duration takes precedence
        let def = AbilityDefinition::from_raw(
            "hex",
            raw(json!({"payload_type": "debuff", "effects": {"speed_mult": 0.7, "duration": 5}, "duration": 2})),
        )
        .unwrap();
        assert!(matches!(def.payload, Payload::Debuff { duration, .. } if duration == 2.0));
    }

    #[test]
    fn test_malformed_entries_rejected() {
        assert!(AbilityDefinition::from_raw("x", raw(json!({"payload_type": "summon_daemon"}))).is_err());
        assert!(AbilityDefinition::from_raw("x", raw(json!({"damage": "lots"}))).is_err());
        assert!(AbilityDefinition::from_raw("x", raw(json!({"cooldown": -1.0}))).is_err());
        assert!(AbilityDefinition::from_raw(
            "x",
            raw(json!({"payload_type": "capture", "capture_threshold": 2.0}))
        )
        .is_err());
        assert!(AbilityDefinition::from_raw("x", raw(json!({"payload_type": "aoe_damage", "radius": -3}))).is_err());
    }
}
