//! Typed endpoints of each data provider

pub mod football;
pub mod formula1;
pub mod open_data;

pub use football::FootballApi;
pub use formula1::Formula1Api;
pub use open_data::{MatchDataSource, OpenDataSource};
