//! Registry-driven ability system
//!
//! Definitions are parsed once into a closed payload enum; the engine gates
//! on cooldown and cost, then hands off to exactly one handler.

pub mod context;
pub mod definition;
pub mod discovery;
pub mod engine;
pub(crate) mod handlers;
pub mod registry;
pub mod resources;

pub use context::{AbilityContext, MechanicsHook};
pub use definition::{AbilityDefinition, Payload, RawAbility, Scaling};
pub use engine::{AbilityEngine, AbilityOutcome};
pub use registry::AbilityRegistry;
pub use resources::{FactionResources, Treasury};
