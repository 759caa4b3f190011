//! Everything an ability invocation may consult besides the two units

use crate::abilities::engine::AbilityOutcome;
use crate::abilities::resources::FactionResources;
use crate::battle::events::{CombatEvent, TelemetrySink};
use crate::core::types::{SimTime, UnitId};
use crate::spatial::SpatialGrid;

/// External rules that react to ability use (e.g. faction mechanics)
pub trait MechanicsHook {
    fn on_ability_use(
        &mut self,
        faction: &str,
        caster: UnitId,
        target: UnitId,
        ability_id: &str,
        outcome: &AbilityOutcome,
    );
}

/// Collaborators for one invocation; all optional
///
/// `candidates` is the caller's pre-filtered list of legal targets, used by
/// area and mind-control effects.
#[derive(Default)]
pub struct AbilityContext<'a> {
    pub now: SimTime,
    pub faction: Option<&'a mut dyn FactionResources>,
    pub grid: Option<&'a mut dyn SpatialGrid>,
    pub candidates: Vec<UnitId>,
    pub telemetry: Option<&'a mut dyn TelemetrySink>,
    pub hook: Option<&'a mut dyn MechanicsHook>,
}

impl<'a> AbilityContext<'a> {
    pub fn at(now: SimTime) -> Self {
        Self {
            now,
            ..Default::default()
        }
    }

    pub fn with_faction(mut self, faction: &'a mut dyn FactionResources) -> Self {
        self.faction = Some(faction);
        self
    }

    pub fn with_grid(mut self, grid: &'a mut dyn SpatialGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<UnitId>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_telemetry(mut self, telemetry: &'a mut dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_hook(mut self, hook: &'a mut dyn MechanicsHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn emit(&mut self, event: CombatEvent) {
        if let Some(sink) = self.telemetry.as_deref_mut() {
            sink.emit(event);
        }
    }
}
