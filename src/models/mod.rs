//! Data models shared across the migration pipeline.

mod field_map;
mod item;

pub use field_map::{FieldMap, MatchResult, StreetCandidate};
pub use item::{ItemStatus, MigrationItem, ProgressEvent, Step, StepBoard, StepState};
