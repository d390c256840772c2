//! Aggregations behind the dashboards
//!
//! Pure functions from typed records to chart-ready rows.

pub mod lap_time;
pub mod league;
pub mod pass_network;
pub mod passing_map;
pub mod standings;
pub mod super_time;

pub use pass_network::{CutoffPolicy, PassNetwork};
pub use super_time::{EntityKind, SuperTimeRow};
