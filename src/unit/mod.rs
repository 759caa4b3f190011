pub mod entity;
pub mod modifiers;
pub mod progression;
pub mod roster;
pub mod snapshot;

pub use entity::Unit;
pub use modifiers::{EffectSet, TempModifiers};
pub use progression::Progression;
pub use roster::{Army, Roster};
pub use snapshot::UnitSnapshot;
