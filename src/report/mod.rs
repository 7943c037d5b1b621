//! Report module - assembles the dashboard outputs for a presenter

mod presenter;

pub use presenter::{ConsolePresenter, JsonPresenter, Presenter};

use polars::prelude::DataFrame;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::analysis::{
    Aggregator, AggregateError, CityTotal, DailyCumulative, FactorBreakdown, FactorTotals,
    HeadlineTotals, MetricCalculator, MetricError, SexTotals,
};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// Scalar indicators shown as dashboard cards and narrative lines.
/// `None` means the metric is undefined for this dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicators {
    pub active_cases: i64,
    pub total_tests: i64,
    pub growth_rate: Option<f64>,
    pub positive_rate: Option<f64>,
    pub average_age: Option<f64>,
    pub average_hospitalization_days: Option<f64>,
    pub sex: SexTotals,
    pub factors: FactorTotals,
    pub residency: Vec<(String, u32)>,
}

/// The fixed set of outputs handed to a presenter, computed fresh from the
/// loaded record set on every render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub totals: HeadlineTotals,
    pub indicators: Indicators,
    pub daily: DailyCumulative,
    pub cities: Vec<CityTotal>,
    pub factor_series: FactorBreakdown,
    pub age_histogram: Vec<(i64, u32)>,
    pub city_histogram: Vec<(String, u32)>,
    pub origin_counts: Vec<(String, u32)>,
}

/// Run the aggregation and metric passes over loaded records.
///
/// Pure with respect to the input frame: two calls over the same records
/// yield identical reports. An empty dataset is a fatal error, never a
/// zero-filled report.
pub fn build_report(records: &DataFrame) -> Result<DashboardReport, ReportError> {
    let daily = Aggregator::daily_cumulative(records)?;
    let totals = MetricCalculator::latest_totals(&daily)?;

    let indicators = Indicators {
        active_cases: totals.active_cases(),
        total_tests: totals.total_tests(),
        growth_rate: MetricCalculator::growth_rate(&daily),
        positive_rate: MetricCalculator::positive_rate(&totals),
        average_age: MetricCalculator::average_age(records)?,
        average_hospitalization_days: MetricCalculator::average_hospitalization_days(records)?,
        sex: MetricCalculator::sex_totals(records)?,
        factors: MetricCalculator::factor_totals(records)?,
        residency: MetricCalculator::residency_counts(records)?,
    };

    debug!(days = daily.len(), "assembled dashboard report");
    Ok(DashboardReport {
        totals,
        indicators,
        daily,
        cities: Aggregator::city_totals(records)?,
        factor_series: Aggregator::factor_breakdown(records)?,
        age_histogram: MetricCalculator::age_histogram(records)?,
        city_histogram: MetricCalculator::city_histogram(records)?,
        origin_counts: MetricCalculator::origin_counts(records)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_records;

    const HEADER: &str = "Date;Ville;Positif;Negatif;Décédé;Guéri;Facteur;Source/Voyage;Age;Homme;Femme;Resident Senegal;Temps Hospitalisation (j)";

    fn frame(rows: &[&str]) -> DataFrame {
        let csv = format!("{HEADER}\n{}\n", rows.join("\n"));
        parse_records(csv.as_bytes()).unwrap()
    }

    fn sample() -> DataFrame {
        frame(&[
            "02.03.20;Dakar;1;10;0;0;Importé;France;54;1;0;Oui;8",
            "03.03.20;Dakar;1;5;0;0;Contact;;33;0;1;Oui;",
            "04.03.20;Touba;2;15;0;1;Importé;Italie;60;1;0;Non;12",
        ])
    }

    #[test]
    fn report_covers_all_outputs() {
        let report = build_report(&sample()).unwrap();
        assert_eq!(report.totals.positive, 4);
        assert_eq!(report.indicators.active_cases, 3);
        assert_eq!(report.daily.len(), 3);
        assert_eq!(report.cities.len(), 2);
        assert_eq!(report.factor_series.dates.len(), 3);
        assert_eq!(report.indicators.factors.imported, 2);
        assert!(!report.age_histogram.is_empty());
        assert!(!report.origin_counts.is_empty());
    }

    #[test]
    fn report_is_deterministic() {
        let records = sample();
        let a = serde_json::to_string(&build_report(&records).unwrap()).unwrap();
        let b = serde_json::to_string(&build_report(&records).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_dataset_is_a_fatal_precondition() {
        let records = sample().head(Some(0));
        let err = build_report(&records).unwrap_err();
        assert!(matches!(err, ReportError::Metric(MetricError::EmptySeries)));
    }
}
