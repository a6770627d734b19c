//! Corpus preparation: loading, cleaning, and unit construction

mod clean;
mod loader;
mod units;

pub use clean::clean;
pub use loader::{load, load_table, RawRecord, RawTable};
pub use units::{
    build_units, load_units, quality_report, save_units, QualityReport, CATEGORY, SOURCE_TAG,
};
