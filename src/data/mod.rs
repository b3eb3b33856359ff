//! Data module - survey table loading and cleaning

mod loader;
mod processor;
pub mod schema;
mod tables;

pub use loader::DataStore;
pub use processor::DataProcessor;
pub use tables::{RentRecord, RentTable, SalaryTable};

#[cfg(test)]
pub use tables::fixtures;
#[cfg(test)]
pub use loader::SurveyTable;
