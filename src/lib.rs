//! fars - FARS accident data loading, monthly summaries & state maps
//!
//! Reads the yearly `accident_<year>.csv.bz2` files of the Fatality Analysis
//! Reporting System, counts accidents per month and year, and draws accident
//! locations on a state map.

pub mod charts;
pub mod config;
pub mod data;
pub mod logging;

#[cfg(test)]
mod testutil;

pub use charts::{StateMap, StateMapper, StaticMapRenderer};
pub use config::FarsConfig;
pub use data::{make_filename, DataProcessor, DatasetLoader, SummaryTable, Year};
