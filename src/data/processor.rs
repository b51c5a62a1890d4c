//! Data Processor Module
//! Handles month/year tagging and the monthly summary pivot.

use crate::data::loader::{DatasetLoader, Year, YearLoad};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One summary row: the accident count of a month in each year column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRow {
    pub month: u32,
    /// Aligned with [`SummaryTable::years`]; `None` where no accident was recorded.
    pub counts: Vec<Option<u32>>,
}

/// Accident counts with months as rows and years as columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
    years: Vec<Year>,
    rows: Vec<MonthRow>,
}

impl SummaryTable {
    /// Year columns, ascending.
    pub fn years(&self) -> &[Year] {
        &self.years
    }

    /// Month rows, ascending.
    pub fn rows(&self) -> &[MonthRow] {
        &self.rows
    }

    pub fn months(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.month).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count for a (month, year) cell; `None` if the combination is absent.
    pub fn count(&self, month: u32, year: Year) -> Option<u32> {
        let col = self.years.iter().position(|y| *y == year)?;
        self.rows
            .iter()
            .find(|r| r.month == month)
            .and_then(|r| r.counts[col])
    }

    /// Wide frame: `MONTH` followed by one column per year.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![Column::new("MONTH".into(), self.months())];
        for (i, year) in self.years.iter().enumerate() {
            let counts: Vec<Option<u32>> = self.rows.iter().map(|r| r.counts[i]).collect();
            columns.push(Column::new(year.to_string().into(), counts));
        }
        DataFrame::new(columns)
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}", "MONTH")?;
        for year in &self.years {
            write!(f, " {:>6}", year)?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:>5}", row.month)?;
            for count in &row.counts {
                match count {
                    Some(n) => write!(f, " {:>6}", n)?,
                    None => write!(f, " {:>6}", "")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Handles reshaping of loaded datasets.
pub struct DataProcessor;

impl DataProcessor {
    /// Tag every record with `year` and keep only `MONTH` and `year`.
    pub fn month_year(mut df: DataFrame, year: Year) -> PolarsResult<DataFrame> {
        let height = df.height();
        df.with_column(Column::new("year".into(), vec![year.0; height]))?;
        df.select(["MONTH", "year"])
    }

    /// Load the requested years and summarize accidents per month.
    ///
    /// Years that fail to load are skipped (the loader has already warned).
    pub fn summarize_years(
        loader: &DatasetLoader,
        years: &[Year],
    ) -> Result<SummaryTable, ProcessorError> {
        let loads = loader.read_years(years);
        Self::summarize(&loads)
    }

    /// Concatenate the loaded month/year frames, count per (year, month) and
    /// pivot years into columns.
    pub fn summarize(loads: &[YearLoad]) -> Result<SummaryTable, ProcessorError> {
        let frames: Vec<LazyFrame> = loads
            .iter()
            .filter_map(YearLoad::frame)
            .map(|df| {
                df.clone()
                    .lazy()
                    .with_column(col("MONTH").cast(DataType::UInt32))
            })
            .collect();

        if frames.is_empty() {
            return Ok(SummaryTable::default());
        }

        let grouped = concat(frames, UnionArgs::default())?
            .filter(col("MONTH").is_not_null())
            .group_by([col("year"), col("MONTH")])
            .agg([len().alias("n")])
            .collect()?;

        let years = grouped.column("year")?.cast(&DataType::Int32)?;
        let months = grouped.column("MONTH")?.cast(&DataType::UInt32)?;
        let counts = grouped.column("n")?.cast(&DataType::UInt32)?;

        // month -> year -> count
        let mut cells: BTreeMap<u32, BTreeMap<Year, u32>> = BTreeMap::new();
        let mut year_columns: Vec<Year> = Vec::new();

        for ((year, month), n) in years
            .i32()?
            .into_iter()
            .zip(months.u32()?.into_iter())
            .zip(counts.u32()?.into_iter())
        {
            if let (Some(year), Some(month), Some(n)) = (year, month, n) {
                let year = Year(year);
                cells.entry(month).or_default().insert(year, n);
                if !year_columns.contains(&year) {
                    year_columns.push(year);
                }
            }
        }
        year_columns.sort();

        let rows = cells
            .into_iter()
            .map(|(month, by_year)| MonthRow {
                month,
                counts: year_columns
                    .iter()
                    .map(|y| by_year.get(y).copied())
                    .collect(),
            })
            .collect();

        Ok(SummaryTable {
            years: year_columns,
            rows,
        })
    }
}
