//! Stats module - derived metrics and descriptive statistics

mod calculator;
mod metrics;

pub use calculator::ColumnSummary;
pub use metrics::{
    CantonPriceChange, MetricsEngine, MetricsError, PeriodAverage, PriceExtremes, RegionalGrowth,
    RentSalaryComparison, Trend,
};

#[cfg(test)]
pub use metrics::{RegionIncrease, YearlyComparison};
