//! Battle loop - phase-ordered steps over one self-contained roster
//!
//! Movement, abilities, shooting, melee, morale and cleanup run in that order
//! every step. A battle always terminates: one side left, a stalemate
//! breaker, or a hard round/time cap.

pub mod constants;
pub mod events;
pub mod execution;
pub mod hostility;
pub mod orders;
pub mod outcome;
pub mod parallel;
pub mod scenario;

pub use events::{
    BattleEvent, BattleEventLog, CombatEvent, NullSink, RecordingSink, TelemetrySink, TracingSink,
};
pub use execution::{BattleState, TimeModel};
pub use hostility::{AllAtWar, Alliances, Hostility};
pub use orders::{AbilityOrder, Order, OrderBook};
pub use outcome::{check_battle_end, BattleReport, EndReason, FactionStats, Survivor};
pub use parallel::{run_battles, run_seeds, WinTally};
pub use scenario::{Deployment, Scenario};
