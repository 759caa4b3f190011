//! Many independent battles at once
//!
//! Each battle owns its whole unit graph, so they run on rayon's pool with
//! nothing shared but read-only registries and config.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::abilities::AbilityRegistry;
use crate::battle::execution::BattleState;
use crate::battle::outcome::BattleReport;
use crate::battle::scenario::Scenario;
use crate::core::config::CombatConfig;
use crate::core::error::Result;

pub fn run_battles(battles: Vec<BattleState>) -> Vec<BattleReport> {
    battles
        .into_par_iter()
        .map(|mut battle| battle.run_to_completion())
        .collect()
}

/// Replay one scenario under each seed
pub fn run_seeds(
    scenario: &Scenario,
    registry: Arc<AbilityRegistry>,
    config: Arc<CombatConfig>,
    seeds: &[u64],
) -> Result<Vec<BattleReport>> {
    seeds
        .par_iter()
        .map(|&seed| {
            let mut battle = scenario.build(Arc::clone(&registry), Arc::clone(&config), seed)?;
            Ok(battle.run_to_completion())
        })
        .collect()
}

/// Win counts over a batch of reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinTally {
    pub wins: BTreeMap<String, usize>,
    pub draws: usize,
}

impl WinTally {
    pub fn from_reports(reports: &[BattleReport]) -> Self {
        let mut tally = Self::default();
        for report in reports {
            match &report.winner {
                Some(winner) => *tally.wins.entry(winner.clone()).or_insert(0) += 1,
                None => tally.draws += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.wins.values().sum::<usize>() + self.draws
    }
}
