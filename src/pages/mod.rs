//! Pages module - maps dashboard pages onto metrics engine calls

mod renderer;

pub use renderer::PageRenderer;

use serde::Serialize;
use tracing::warn;

use crate::cli::Page;
use crate::stats::{
    CantonPriceChange, ColumnSummary, MetricsEngine, MetricsError, PeriodAverage, PriceExtremes,
    RegionalGrowth, RentSalaryComparison, Trend,
};

/// Selections a page is computed for.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: Page,
    pub region: Option<String>,
    pub cantons: Option<Vec<String>>,
    pub change_from_year: i32,
    pub change_to_year: i32,
    pub default_canton_count: usize,
    pub normalize: bool,
}

/// One block of a page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    PriceChange {
        from_year: i32,
        to_year: i32,
        changes: Vec<CantonPriceChange>,
    },
    PriceExtremes(PriceExtremes),
    Describe {
        columns: Vec<ColumnSummary>,
    },
    CantonTrends {
        trends: Vec<Trend>,
    },
    PeriodAverages {
        averages: Vec<PeriodAverage>,
    },
    Comparison(RentSalaryComparison),
    SalaryTrends {
        trends: Vec<Trend>,
    },
    RegionalGrowth(RegionalGrowth),
    /// A metric that could not be computed for the current selection.
    NoData {
        heading: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub title: String,
    pub sections: Vec<Section>,
}

/// Turn a failed metric into a visible "no data" block.
fn or_no_data<T>(
    heading: &str,
    result: Result<T, MetricsError>,
    section: impl FnOnce(T) -> Section,
) -> Section {
    match result {
        Ok(value) => section(value),
        Err(e) => {
            warn!("{}: {}", heading, e);
            Section::NoData {
                heading: heading.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Compute every section of the requested page.
pub fn build_page(engine: &MetricsEngine<'_>, request: &PageRequest) -> PageView {
    let sections = match request.page {
        Page::GeneralFacts => general_facts(engine, request),
        Page::PriceTrends => price_trends(engine, request),
        Page::SalaryRent => salary_rent(engine, request),
        Page::SalaryTrends => salary_trends(engine),
    };

    PageView {
        title: request.page.title().to_string(),
        sections,
    }
}

fn general_facts(engine: &MetricsEngine<'_>, request: &PageRequest) -> Vec<Section> {
    let (from_year, to_year) = (request.change_from_year, request.change_to_year);
    let changes = engine.price_change_by_canton(from_year, to_year);

    let change_section = if changes.is_empty() {
        Section::NoData {
            heading: format!("Price Change from {from_year} to {to_year} by Canton"),
            message: format!("no canton has prices for both {from_year} and {to_year}"),
        }
    } else {
        Section::PriceChange {
            from_year,
            to_year,
            changes,
        }
    };

    vec![
        change_section,
        or_no_data(
            "Highest vs Lowest Average Rent",
            engine.price_extremes(),
            Section::PriceExtremes,
        ),
        or_no_data("Descriptive Statistics", engine.describe(), |columns| {
            Section::Describe { columns }
        }),
    ]
}

fn price_trends(engine: &MetricsEngine<'_>, request: &PageRequest) -> Vec<Section> {
    let cantons = request.cantons.clone().unwrap_or_else(|| {
        engine
            .cantons()
            .into_iter()
            .take(request.default_canton_count)
            .collect()
    });

    vec![
        Section::CantonTrends {
            trends: engine.canton_price_trends(&cantons),
        },
        Section::PeriodAverages {
            averages: engine.construction_period_averages(),
        },
    ]
}

fn salary_rent(engine: &MetricsEngine<'_>, request: &PageRequest) -> Vec<Section> {
    let region = request
        .region
        .clone()
        .or_else(|| engine.comparison_regions().into_iter().next());

    let result = match region {
        Some(region) => engine.rent_salary_comparison(&region, request.normalize),
        None => Err(MetricsError::NoData(
            "no region has both rent and salary figures".to_string(),
        )),
    };

    vec![or_no_data(
        "Rent vs Salary Trends",
        result,
        Section::Comparison,
    )]
}

fn salary_trends(engine: &MetricsEngine<'_>) -> Vec<Section> {
    vec![
        Section::SalaryTrends {
            trends: engine.salary_trends(),
        },
        or_no_data(
            "Salary increases by region",
            engine.regional_salary_growth(),
            Section::RegionalGrowth,
        ),
    ]
}
