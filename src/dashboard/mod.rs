//! Dashboard pages as request-scoped functions
//!
//! Each page takes the current selections as arguments, fetches what it
//! needs and returns every table its charts are drawn from. Fetch errors
//! end the page; empty selections come back as [`PageOutcome::NoData`].

pub mod league;
pub mod passing;
pub mod season;

pub use league::{league_analytics, LeagueReport};
pub use passing::{passing_analysis, PassingReport, TeamPassingReport};
pub use season::{season_analysis, SeasonReport};

/// Notice shown when a selection has nothing to display
pub const NO_DATA: &str = "No data available, please change selection";

/// A rendered page or the reason there is nothing to render
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    Ready(T),
    NoData(String),
}

impl<T> PageOutcome<T> {
    pub fn no_data() -> Self {
        PageOutcome::NoData(NO_DATA.to_string())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PageOutcome::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            PageOutcome::Ready(value) => Some(value),
            PageOutcome::NoData(_) => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            PageOutcome::Ready(value) => Some(value),
            PageOutcome::NoData(_) => None,
        }
    }
}
