use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::AbilityId;

/// String tags and learned abilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitSet {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub abilities: BTreeSet<AbilityId>,
}

impl TraitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_ability(mut self, ability: impl Into<AbilityId>) -> Self {
        self.abilities.insert(ability.into());
        self
    }

    pub fn has(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn knows(&self, ability: &str) -> bool {
        self.abilities.contains(ability)
    }
}
