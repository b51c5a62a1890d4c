//! Dataset Loader Module
//! Handles locating, decompressing and parsing the yearly accident files using Polars.

use crate::config::FarsConfig;
use crate::data::processor::DataProcessor;
use bzip2::read::MultiBzDecoder;
use polars::prelude::*;
use rayon::prelude::*;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Longitudes above this are the "unknown" code.
pub const LONGITUDE_SENTINEL: f64 = 900.0;
/// Latitudes above this are the "unknown" code.
pub const LATITUDE_SENTINEL: f64 = 90.0;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("invalid year: {0}")]
    InvalidYear(String),
}

/// Calendar year of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(pub i32);

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for Year {
    fn from(year: i32) -> Self {
        Year(year)
    }
}

impl From<u16> for Year {
    fn from(year: u16) -> Self {
        Year(i32::from(year))
    }
}

/// Fractional years are truncated toward zero.
impl TryFrom<f64> for Year {
    type Error = LoaderError;

    fn try_from(year: f64) -> Result<Self, Self::Error> {
        let truncated = year.trunc();
        if !truncated.is_finite()
            || truncated < f64::from(i32::MIN)
            || truncated > f64::from(i32::MAX)
        {
            return Err(LoaderError::InvalidYear(year.to_string()));
        }
        Ok(Year(truncated as i32))
    }
}

impl FromStr for Year {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(year) = s.parse::<i32>() {
            return Ok(Year(year));
        }
        s.parse::<f64>()
            .map_err(|_| LoaderError::InvalidYear(s.to_string()))
            .and_then(Year::try_from)
    }
}

/// Conventional file name of a year's dataset. Does not check that it exists.
pub fn make_filename(year: impl Into<Year>) -> String {
    format!("accident_{}.csv.bz2", year.into())
}

/// Replace sentinel coordinates with nulls.
///
/// Frames without `LONGITUD` / `LATITUDE` pass through untouched.
pub fn mask_sentinels(mut df: DataFrame) -> PolarsResult<DataFrame> {
    for (name, limit) in [
        ("LONGITUD", LONGITUDE_SENTINEL),
        ("LATITUDE", LATITUDE_SENTINEL),
    ] {
        let Ok(column) = df.column(name) else {
            continue;
        };
        let values = column.cast(&DataType::Float64)?;
        let masked: Vec<Option<f64>> = values
            .f64()?
            .into_iter()
            .map(|v| v.filter(|v| *v <= limit))
            .collect();
        df.with_column(Column::new(name.into(), masked))?;
    }
    Ok(df)
}

/// One slot of a multi-year load: the month/year frame or why it failed.
#[derive(Debug)]
pub struct YearLoad {
    pub year: Year,
    pub result: Result<DataFrame, LoaderError>,
}

impl YearLoad {
    /// The `MONTH`/`year` frame, `None` if the year failed to load.
    pub fn frame(&self) -> Option<&DataFrame> {
        self.result.as_ref().ok()
    }

    pub fn is_loaded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reads yearly accident files from a data directory.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl DatasetLoader {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn from_config(config: &FarsConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a year's dataset inside the data directory.
    pub fn path_for(&self, year: Year) -> PathBuf {
        self.data_dir.join(make_filename(year))
    }

    /// Load a CSV file (bzip2-compressed if it ends in `.bz2`) verbatim.
    pub fn read(path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let mut bytes = Vec::new();
        let file = File::open(path)?;
        if path.extension().is_some_and(|ext| ext == "bz2") {
            MultiBzDecoder::new(file).read_to_end(&mut bytes)?;
        } else {
            let mut file = file;
            file.read_to_end(&mut bytes)?;
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), columns = df.width(), "loaded dataset");
        Ok(df)
    }

    /// Load one year's dataset verbatim.
    pub fn read_year(&self, year: Year) -> Result<DataFrame, LoaderError> {
        Self::read(self.path_for(year))
    }

    /// Load one year's dataset with sentinel coordinates masked to null.
    pub fn read_accidents(&self, year: Year) -> Result<DataFrame, LoaderError> {
        Ok(mask_sentinels(self.read_year(year)?)?)
    }

    /// Load the `MONTH`/`year` frame of every requested year.
    ///
    /// Returns one slot per year in request order. A year that fails to load
    /// is logged and its slot carries the error; other years are unaffected.
    pub fn read_years(&self, years: &[Year]) -> Vec<YearLoad> {
        years
            .par_iter()
            .map(|&year| {
                let result = self
                    .read_year(year)
                    .and_then(|df| Ok(DataProcessor::month_year(df, year)?));
                if let Err(e) = &result {
                    warn!(%year, error = %e, "invalid year: {}", year);
                }
                YearLoad { year, result }
            })
            .collect()
    }
}
