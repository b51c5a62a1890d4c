//! State Map Module
//! Selects the plottable accident coordinates of one state and year.

use crate::data::{DatasetLoader, LoaderError, Year};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, info};

/// Smallest coordinate span drawn, in degrees.
const MIN_SPAN: f64 = 0.5;

#[derive(Error, Debug)]
pub enum MapError {
    #[error(transparent)]
    LoaderError(#[from] LoaderError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("invalid STATE number: {0}")]
    InvalidState(u32),
}

/// Accident points of one state in one year, as (longitude, latitude).
#[derive(Debug, Clone, PartialEq)]
pub struct StateMap {
    state: u32,
    year: Year,
    points: Vec<(f64, f64)>,
}

impl StateMap {
    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// (min, max) longitude of the points.
    pub fn lon_range(&self) -> (f64, f64) {
        min_max(self.points.iter().map(|p| p.0))
    }

    /// (min, max) latitude of the points.
    pub fn lat_range(&self) -> (f64, f64) {
        min_max(self.points.iter().map(|p| p.1))
    }

    /// Axis ranges around the points, widened by `padding` of the span on
    /// each side.
    pub fn padded_ranges(&self, padding: f64) -> (Range<f64>, Range<f64>) {
        (
            padded(self.lon_range(), padding),
            padded(self.lat_range(), padding),
        )
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

fn padded((lo, hi): (f64, f64), padding: f64) -> Range<f64> {
    let mid = (lo + hi) / 2.0;
    let half = (hi - lo).max(MIN_SPAN) * (0.5 + padding);
    (mid - half)..(mid + half)
}

/// Distinct `STATE` numbers present in a dataset.
pub fn known_states(df: &DataFrame) -> PolarsResult<BTreeSet<u32>> {
    let states = df.column("STATE")?.cast(&DataType::UInt32)?;
    Ok(states.u32()?.into_iter().flatten().collect())
}

/// Builds state maps from the yearly datasets.
pub struct StateMapper;

impl StateMapper {
    /// Load `year` and collect the accident coordinates of `state`.
    ///
    /// Returns `Ok(None)` when the state has no accident with a known
    /// location; there is nothing to plot.
    pub fn map_state(
        loader: &DatasetLoader,
        state: u32,
        year: Year,
    ) -> Result<Option<StateMap>, MapError> {
        let df = loader.read_accidents(year)?;
        Self::from_accidents(&df, state, year)
    }

    /// Same as [`StateMapper::map_state`] on an already masked dataset.
    pub fn from_accidents(
        df: &DataFrame,
        state: u32,
        year: Year,
    ) -> Result<Option<StateMap>, MapError> {
        if !known_states(df)?.contains(&state) {
            return Err(MapError::InvalidState(state));
        }

        let subset = df
            .clone()
            .lazy()
            .filter(col("STATE").cast(DataType::UInt32).eq(lit(state)))
            .collect()?;

        let lon = subset.column("LONGITUD")?.cast(&DataType::Float64)?;
        let lat = subset.column("LATITUDE")?.cast(&DataType::Float64)?;
        let points: Vec<(f64, f64)> = lon
            .f64()?
            .into_iter()
            .zip(lat.f64()?.into_iter())
            .filter_map(|(x, y)| Some((x?, y?)))
            .collect();

        debug!(state, %year, rows = subset.height(), points = points.len(), "state subset");

        if points.is_empty() {
            info!("no accidents to plot");
            return Ok(None);
        }

        Ok(Some(StateMap {
            state,
            year,
            points,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mask_sentinels;
    use crate::testutil::{write_bz2, ACCIDENTS_2013};
    use tempfile::TempDir;

    fn fixture_loader() -> (TempDir, DatasetLoader) {
        let dir = TempDir::new().unwrap();
        write_bz2(dir.path(), "accident_2013.csv.bz2", ACCIDENTS_2013);
        let loader = DatasetLoader::new(dir.path().to_path_buf());
        (dir, loader)
    }

    #[test]
    fn unknown_state_is_rejected() {
        let (_dir, loader) = fixture_loader();

        let err = StateMapper::map_state(&loader, 99, Year(2013)).unwrap_err();
        assert!(matches!(err, MapError::InvalidState(99)));
        assert_eq!(err.to_string(), "invalid STATE number: 99");
    }

    #[test]
    fn missing_year_is_a_loader_error() {
        let (_dir, loader) = fixture_loader();

        let err = StateMapper::map_state(&loader, 1, Year(2014)).unwrap_err();
        assert!(matches!(err, MapError::LoaderError(LoaderError::NotFound(_))));
    }

    #[test]
    fn sentinel_coordinates_are_excluded() {
        let (_dir, loader) = fixture_loader();

        let map = StateMapper::map_state(&loader, 1, Year(2013))
            .unwrap()
            .expect("Alabama has plottable accidents");
        assert_eq!(map.state(), 1);
        assert_eq!(map.year(), Year(2013));
        assert_eq!(map.points(), &[(-86.2, 32.5), (-87.0, 33.1)]);
        assert_eq!(map.lon_range(), (-87.0, -86.2));
        assert_eq!(map.lat_range(), (32.5, 33.1));
    }

    #[test]
    fn state_without_known_locations_plots_nothing() {
        let (_dir, loader) = fixture_loader();

        let map = StateMapper::map_state(&loader, 4, Year(2013)).unwrap();
        assert!(map.is_none());
    }

    #[test]
    fn partial_sentinel_drops_the_point() {
        let df = DataFrame::new(vec![
            Column::new("STATE".into(), vec![6i64, 6, 6]),
            Column::new("LONGITUD".into(), vec![-118.2, 999.9999, -120.0]),
            Column::new("LATITUDE".into(), vec![34.1, 35.0, 99.9999]),
        ])
        .unwrap();
        let df = mask_sentinels(df).unwrap();

        let map = StateMapper::from_accidents(&df, 6, Year(2015))
            .unwrap()
            .unwrap();
        assert_eq!(map.points(), &[(-118.2, 34.1)]);
    }

    #[test]
    fn lists_known_states() {
        let (_dir, loader) = fixture_loader();
        let df = loader.read_accidents(Year(2013)).unwrap();

        let states: Vec<u32> = known_states(&df).unwrap().into_iter().collect();
        assert_eq!(states, vec![1, 4]);
    }

    #[test]
    fn single_point_gets_a_minimum_span() {
        let map = StateMap {
            state: 1,
            year: Year(2013),
            points: vec![(-86.0, 32.0)],
        };

        let (x, y) = map.padded_ranges(0.0);
        assert!((x.end - x.start - MIN_SPAN).abs() < 1e-9);
        assert!((y.end - y.start - MIN_SPAN).abs() < 1e-9);
        assert!(x.start < -86.0 && x.end > -86.0);
    }

    #[test]
    fn padding_widens_both_sides() {
        let map = StateMap {
            state: 1,
            year: Year(2013),
            points: vec![(-88.0, 30.0), (-86.0, 34.0)],
        };

        let (x, y) = map.padded_ranges(0.1);
        assert!((x.start - -88.2).abs() < 1e-9);
        assert!((x.end - -85.8).abs() < 1e-9);
        assert!((y.start - 29.6).abs() < 1e-9);
        assert!((y.end - 34.4).abs() < 1e-9);
    }
}
