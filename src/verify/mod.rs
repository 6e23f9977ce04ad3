//! Verification and scoring for contestant solutions.
//!
//! The in-process checker in [`checker`] is the default path: pure decision
//! procedures over artifact files that produce a structured [`Verdict`].
//! [`external`] preserves the legacy out-of-process protocol (literal `OK`
//! token on stdout, score on the third line) for contests that ship their
//! own checker executable.

pub mod checker;
pub mod external;

pub use checker::{check_exact, check_kernel, check_lb, check_ub, Verdict, VerdictStatus};
pub use external::run_external_checker;
