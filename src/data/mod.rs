//! Data module - dataset loading and the monthly summary

mod loader;
mod processor;

pub use loader::{
    make_filename, mask_sentinels, DatasetLoader, LoaderError, Year, YearLoad,
    LATITUDE_SENTINEL, LONGITUDE_SENTINEL,
};
pub use processor::{DataProcessor, MonthRow, ProcessorError, SummaryTable};
