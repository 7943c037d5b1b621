//! Metric Calculator Module
//! Scalar indicators derived from the cumulative series and raw records.

use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::analysis::aggregator::DailyCumulative;
use crate::data::columns;

#[derive(Error, Debug)]
pub enum MetricError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("cannot compute totals over an empty series")]
    EmptySeries,
}

/// Cumulative totals at the most recent date in the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadlineTotals {
    pub positive: i64,
    pub negative: i64,
    pub deceased: i64,
    pub recovered: i64,
}

impl HeadlineTotals {
    /// Cumulative positive minus cumulative recovered. Can only go negative
    /// if recoveries overtake positives, which the source data never shows
    /// since recoveries lag.
    pub fn active_cases(&self) -> i64 {
        self.positive - self.recovered
    }

    /// Positive plus negative test events. Retests of the same individual
    /// count as separate events.
    pub fn total_tests(&self) -> i64 {
        self.positive + self.negative
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct SexTotals {
    pub male: i64,
    pub female: i64,
}

/// Row count per infection factor, taken directly from the raw records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct FactorTotals {
    pub imported: i64,
    pub contact: i64,
    pub community: i64,
}

/// Derives the named scalar indicators. Metrics with an insufficient or zero
/// denominator come back as `None`, never as zero or infinity.
pub struct MetricCalculator;

impl MetricCalculator {
    /// Value of each cumulative column at the latest date. An empty series is
    /// a precondition violation, not a zero report.
    pub fn latest_totals(series: &DailyCumulative) -> Result<HeadlineTotals, MetricError> {
        if series.is_empty() {
            return Err(MetricError::EmptySeries);
        }
        let last = series.len() - 1;
        Ok(HeadlineTotals {
            positive: series.positive[last],
            negative: series.negative[last],
            deceased: series.deceased[last],
            recovered: series.recovered[last],
        })
    }

    /// Geometric 2-period growth rate of cumulative positives, expressed as
    /// an equivalent single-period percentage:
    /// (sqrt(positive(t) / positive(t-2)) - 1) * 100, rounded to 2 decimals.
    ///
    /// The source publishes new cases roughly every 2 days, hence the spacing;
    /// an irregular reporting cadence degrades the metric's meaning. With
    /// fewer than 2 prior periods, or a zero base, the rate is undefined.
    pub fn growth_rate(series: &DailyCumulative) -> Option<f64> {
        let n = series.len();
        if n < 3 {
            return None;
        }
        let current = series.positive[n - 1] as f64;
        let base = series.positive[n - 3] as f64;
        if base <= 0.0 {
            return None;
        }
        Some(round_to(((current / base).sqrt() - 1.0) * 100.0, 2))
    }

    /// Share of positive outcomes among all test events, in percent, rounded
    /// to 1 decimal. Undefined when no tests were recorded.
    pub fn positive_rate(totals: &HeadlineTotals) -> Option<f64> {
        let tests = totals.total_tests();
        if tests == 0 {
            return None;
        }
        Some(round_to(totals.positive as f64 / tests as f64 * 100.0, 1))
    }

    /// Mean age over known values, rounded to the nearest whole year.
    /// Undefined when every age is missing.
    pub fn average_age(df: &DataFrame) -> Result<Option<f64>, MetricError> {
        Ok(column_mean(df, columns::AGE)?.map(f64::round))
    }

    /// Mean hospitalization duration in days over known values, unrounded.
    pub fn average_hospitalization_days(df: &DataFrame) -> Result<Option<f64>, MetricError> {
        column_mean(df, columns::HOSPITAL_DAYS)
    }

    /// Sums of the male and female indicator columns.
    pub fn sex_totals(df: &DataFrame) -> Result<SexTotals, MetricError> {
        Ok(SexTotals {
            male: column_sum(df, columns::MALE)?,
            female: column_sum(df, columns::FEMALE)?,
        })
    }

    /// Frequency per distinct residency value, missing excluded.
    pub fn residency_counts(df: &DataFrame) -> Result<Vec<(String, u32)>, MetricError> {
        string_frequencies(df, columns::RESIDENT)
    }

    /// Record count per city, missing excluded. Counts rows, unlike
    /// [`Aggregator::city_totals`] which sums positives.
    ///
    /// [`Aggregator::city_totals`]: crate::analysis::Aggregator::city_totals
    pub fn city_histogram(df: &DataFrame) -> Result<Vec<(String, u32)>, MetricError> {
        string_frequencies(df, columns::CITY)
    }

    /// Record count per source country, missing excluded.
    pub fn origin_counts(df: &DataFrame) -> Result<Vec<(String, u32)>, MetricError> {
        string_frequencies(df, columns::ORIGIN)
    }

    /// Record count per distinct age, ascending by age, missing excluded.
    pub fn age_histogram(df: &DataFrame) -> Result<Vec<(i64, u32)>, MetricError> {
        let ages = df.column(columns::AGE)?.cast(&DataType::Int64)?;
        let ages = ages.i64()?;
        let mut counts: BTreeMap<i64, u32> = BTreeMap::new();
        for age in ages.into_iter().flatten() {
            *counts.entry(age).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    /// Row count per infection factor category, independent of the
    /// time-series breakdown.
    pub fn factor_totals(df: &DataFrame) -> Result<FactorTotals, MetricError> {
        let frequencies = string_frequencies(df, columns::FACTOR)?;
        let count = |category: &str| {
            frequencies
                .iter()
                .find(|(value, _)| value == category)
                .map(|(_, count)| *count as i64)
                .unwrap_or(0)
        };
        Ok(FactorTotals {
            imported: count(columns::FACTOR_IMPORTED),
            contact: count(columns::FACTOR_CONTACT),
            community: count(columns::FACTOR_COMMUNITY),
        })
    }
}

/// Frequency of each distinct non-null value in a string column, most
/// frequent first, ties broken alphabetically.
pub fn string_frequencies(df: &DataFrame, name: &str) -> Result<Vec<(String, u32)>, MetricError> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column.str()?;
    let mut counts: HashMap<String, u32> = HashMap::new();
    for value in values.into_iter().flatten() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        *counts.entry(value.to_string()).or_default() += 1;
    }
    let mut out: Vec<(String, u32)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(out)
}

fn column_mean(df: &DataFrame, name: &str) -> Result<Option<f64>, MetricError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.as_materialized_series().mean())
}

fn column_sum(df: &DataFrame, name: &str) -> Result<i64, MetricError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().flatten().sum())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
