//! Service layer: batch parsing, migration orchestration and the
//! shared status registry.
//!
//! Everything here is UI-agnostic and shared by the CLI and the web
//! server.

pub mod batch;
pub mod migration;
pub mod registry;
pub mod runner;

pub use batch::{parse_batch, BatchError, MissingFolder};
pub use migration::{MigrationReport, Migrator};
pub use registry::StatusRegistry;
pub use runner::{spawn_batch, ParkedMigrators};
