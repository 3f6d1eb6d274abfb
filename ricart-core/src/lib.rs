//! # ricart-core
//!
//! Ricart-Agrawala mutual exclusion for a set of shared, named files.
//! Provides a Lamport clock, per-client request bookkeeping, the
//! acknowledge-or-defer decision, and an async coordinator that gates
//! every read and write on a quorum of peer acknowledgments.

pub mod clock;
pub mod coordinator;
pub mod deferral;
pub mod error;
pub mod infrastructure;
#[path = "infrastructure_fs.rs"]
pub mod infrastructure_fs;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
#[cfg(feature = "sqlite")]
#[path = "infrastructure_sqlite.rs"]
pub mod infrastructure_sqlite;
pub mod registry;
pub mod scheduler;
pub mod simulation;
pub mod state;
pub mod types;

#[cfg(test)]
mod clock_test;
#[cfg(test)]
mod deferral_test;
#[cfg(test)]
#[path = "infrastructure_test.rs"]
mod infrastructure_test;
