//! Per-instance execution pipeline.
//!
//! One instance flows through up to three bounded subprocess stages and then
//! verification:
//!
//! ```text
//! Start → RunPrimary → [RunHeuristic → RunLifting] → Verify → Reported
//! ```
//!
//! The bracketed stages exist only in kernel mode, where the kernelizer's
//! stdout seeds the heuristic and both artifacts feed the lifting stage. A
//! stage that fails or times out shortcuts straight to verification with
//! whatever artifacts exist.

pub mod config;
pub mod discover;
pub mod orchestrator;

pub use config::{HarnessConfig, Mode, StagePrograms, HEURISTIC_TIME_LIMIT_SECS};
pub use discover::{discover_groups, numeric_prefix, InstanceGroup};
pub use orchestrator::{InstanceRow, LiftingInput, Orchestrator, ScratchSpace};
