//! Ability registry: load once, look up by id
//!
//! Entries that fail to parse are remembered with their reason so that using
//! them fails closed instead of looking like an unknown id.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::abilities::definition::{AbilityDefinition, RawAbility};
use crate::core::error::{AbilityError, ReckoningError, Result};
use crate::core::types::AbilityId;

#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    abilities: BTreeMap<AbilityId, AbilityDefinition>,
    rejected: BTreeMap<AbilityId, String>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every raw record, keeping malformed ones aside
    pub fn from_raw(raw: BTreeMap<AbilityId, RawAbility>) -> Self {
        let mut registry = Self::new();
        for (id, record) in raw {
            match AbilityDefinition::from_raw(&id, record) {
                Ok(def) => {
                    registry.abilities.insert(id, def);
                }
                Err(reason) => {
                    warn!(ability = %id, %reason, "Rejected ability definition");
                    registry.rejected.insert(id, reason);
                }
            }
        }
        info!(
            loaded = registry.abilities.len(),
            rejected = registry.rejected.len(),
            "Ability registry built"
        );
        registry
    }

    /// TOML document with one table per ability id
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<AbilityId, RawAbility> = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// JSON object keyed by ability id
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<AbilityId, RawAbility> = serde_json::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ReckoningError::InvalidConfig(format!(
                "Unsupported ability registry format: {}",
                path.display()
            ))),
        }
    }

    pub fn insert(&mut self, definition: AbilityDefinition) {
        self.rejected.remove(&definition.id);
        self.abilities.insert(definition.id.clone(), definition);
    }

    /// Look up a usable definition
    pub fn get(&self, id: &str) -> std::result::Result<&AbilityDefinition, AbilityError> {
        if let Some(def) = self.abilities.get(id) {
            return Ok(def);
        }
        match self.rejected.get(id) {
            Some(reason) => Err(AbilityError::MalformedDefinition {
                id: id.to_string(),
                reason: reason.clone(),
            }),
            None => Err(AbilityError::AbilityUnavailable(id.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.abilities.values()
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&AbilityId, &String)> {
        self.rejected.iter()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}
