//! Aggregator Module
//! Turns raw per-record rows into cumulative time series and breakdowns.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::data::columns;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Running totals of the four outcome columns, one row per distinct date,
/// dates ascending. Dates absent from the data stay absent, no interpolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCumulative {
    pub dates: Vec<NaiveDate>,
    pub positive: Vec<i64>,
    pub negative: Vec<i64>,
    pub deceased: Vec<i64>,
    pub recovered: Vec<i64>,
}

impl DailyCumulative {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Active cases per date: cumulative positive minus cumulative recovered.
    pub fn active(&self) -> Vec<i64> {
        self.positive
            .iter()
            .zip(&self.recovered)
            .map(|(p, r)| p - r)
            .collect()
    }
}

/// Total positive count for one city. Not a time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityTotal {
    pub city: String,
    pub positive: i64,
}

/// Cumulative case counts per infection factor, merged on date.
///
/// A date present in any one category appears in the merge; categories with
/// no entry on that date carry their last known cumulative value forward, and
/// leading gaps are zero. A category with zero occurrences overall yields an
/// all-zero column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorBreakdown {
    pub dates: Vec<NaiveDate>,
    pub imported: Vec<i64>,
    pub contact: Vec<i64>,
    pub community: Vec<i64>,
}

/// Read-only aggregation passes over the loaded record frame.
pub struct Aggregator;

impl Aggregator {
    /// Group by date, sum the outcome columns, then take the running
    /// cumulative sum of each, dates ascending.
    pub fn daily_cumulative(df: &DataFrame) -> Result<DailyCumulative, AggregateError> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(columns::DATE)])
            .agg([
                col(columns::POSITIVE).sum(),
                col(columns::NEGATIVE).sum(),
                col(columns::DECEASED).sum(),
                col(columns::RECOVERED).sum(),
            ])
            .sort([columns::DATE], Default::default())
            .collect()?;

        Ok(DailyCumulative {
            dates: date_values(&grouped)?,
            positive: cumulative_sum(&grouped, columns::POSITIVE)?,
            negative: cumulative_sum(&grouped, columns::NEGATIVE)?,
            deceased: cumulative_sum(&grouped, columns::DECEASED)?,
            recovered: cumulative_sum(&grouped, columns::RECOVERED)?,
        })
    }

    /// Total positive count per city, rows with a missing city excluded.
    pub fn city_totals(df: &DataFrame) -> Result<Vec<CityTotal>, AggregateError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(col(columns::CITY).is_not_null())
            .group_by([col(columns::CITY)])
            .agg([col(columns::POSITIVE).sum()])
            .sort([columns::CITY], Default::default())
            .collect()?;

        let cities = grouped.column(columns::CITY)?.str()?;
        let positives = grouped.column(columns::POSITIVE)?.cast(&DataType::Int64)?;
        let positives = positives.i64()?;

        Ok(cities
            .into_iter()
            .zip(positives.into_iter())
            .filter_map(|(city, positive)| {
                city.map(|city| CityTotal {
                    city: city.to_string(),
                    positive: positive.unwrap_or(0),
                })
            })
            .collect())
    }

    /// Cumulative count series for the three known factor categories,
    /// outer-merged on date.
    pub fn factor_breakdown(df: &DataFrame) -> Result<FactorBreakdown, AggregateError> {
        let imported = Self::factor_counts(df, columns::FACTOR_IMPORTED)?;
        let contact = Self::factor_counts(df, columns::FACTOR_CONTACT)?;
        let community = Self::factor_counts(df, columns::FACTOR_COMMUNITY)?;

        // Union of dates across categories = the outer join on date.
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        dates.extend(imported.keys().copied());
        dates.extend(contact.keys().copied());
        dates.extend(community.keys().copied());

        let mut merged = FactorBreakdown {
            dates: Vec::with_capacity(dates.len()),
            imported: Vec::with_capacity(dates.len()),
            contact: Vec::with_capacity(dates.len()),
            community: Vec::with_capacity(dates.len()),
        };

        // Accumulating per-date counts while walking dates ascending carries
        // the last known cumulative value across gaps (forward-fill) and
        // leaves categories not yet seen at zero.
        let (mut imp, mut con, mut com) = (0i64, 0i64, 0i64);
        for date in dates {
            imp += imported.get(&date).copied().unwrap_or(0);
            con += contact.get(&date).copied().unwrap_or(0);
            com += community.get(&date).copied().unwrap_or(0);
            merged.dates.push(date);
            merged.imported.push(imp);
            merged.contact.push(con);
            merged.community.push(com);
        }

        Ok(merged)
    }

    /// New case count per date for one factor category.
    fn factor_counts(
        df: &DataFrame,
        category: &str,
    ) -> Result<BTreeMap<NaiveDate, i64>, AggregateError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(col(columns::FACTOR).eq(lit(category)))
            .group_by([col(columns::DATE)])
            .agg([col(columns::FACTOR).count().alias("Count")])
            .collect()?;

        let dates = grouped.column(columns::DATE)?.as_materialized_series().date()?.as_date_iter();
        let counts = grouped.column("Count")?.cast(&DataType::Int64)?;
        let counts = counts.i64()?;

        Ok(dates
            .zip(counts.into_iter())
            .filter_map(|(date, count)| Some((date?, count.unwrap_or(0))))
            .collect())
    }
}

fn date_values(df: &DataFrame) -> Result<Vec<NaiveDate>, AggregateError> {
    let dates = df.column(columns::DATE)?.as_materialized_series().date()?;
    Ok(dates.as_date_iter().flatten().collect())
}

fn cumulative_sum(df: &DataFrame, name: &str) -> Result<Vec<i64>, AggregateError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let values = column.i64()?;
    let mut total = 0i64;
    Ok(values
        .into_iter()
        .map(|v| {
            total += v.unwrap_or(0);
            total
        })
        .collect())
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

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn cumulative_positive_sums_across_dates() {
        let df = frame(&[
            "02.03.20;Dakar;1;5;0;0;Importé;France;54;1;0;Oui;8",
            "04.03.20;Dakar;2;3;0;1;Contact;;33;0;1;Oui;",
        ]);
        let series = Aggregator::daily_cumulative(&df).unwrap();
        assert_eq!(series.dates, vec![date("2020-03-02"), date("2020-03-04")]);
        assert_eq!(series.positive, vec![1, 3]);
        assert_eq!(series.negative, vec![5, 8]);
        assert_eq!(series.recovered, vec![0, 1]);
    }

    #[test]
    fn same_day_rows_are_summed_before_accumulating() {
        let df = frame(&[
            "02.03.20;Dakar;1;0;0;0;;;;;;;",
            "02.03.20;Touba;2;0;0;0;;;;;;;",
            "03.03.20;Dakar;1;0;0;0;;;;;;;",
        ]);
        let series = Aggregator::daily_cumulative(&df).unwrap();
        assert_eq!(series.positive, vec![3, 4]);
    }

    #[test]
    fn cumulative_columns_are_non_decreasing() {
        let df = frame(&[
            "02.03.20;Dakar;1;5;0;0;;;;;;;",
            "03.03.20;Dakar;0;2;1;1;;;;;;;",
            "05.03.20;Dakar;4;0;0;0;;;;;;;",
        ]);
        let series = Aggregator::daily_cumulative(&df).unwrap();
        for column in [
            &series.positive,
            &series.negative,
            &series.deceased,
            &series.recovered,
        ] {
            assert!(column.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn active_is_positive_minus_recovered() {
        let df = frame(&[
            "02.03.20;Dakar;3;0;0;1;;;;;;;",
            "03.03.20;Dakar;2;0;0;1;;;;;;;",
        ]);
        let series = Aggregator::daily_cumulative(&df).unwrap();
        assert_eq!(series.active(), vec![2, 3]);
    }

    #[test]
    fn city_totals_exclude_missing_city() {
        let df = frame(&[
            "02.03.20;Dakar;2;0;0;0;;;;;;;",
            "03.03.20;;5;0;0;0;;;;;;;",
            "04.03.20;Dakar;1;0;0;0;;;;;;;",
            "04.03.20;Touba;4;0;0;0;;;;;;;",
        ]);
        let totals = Aggregator::city_totals(&df).unwrap();
        assert_eq!(
            totals,
            vec![
                CityTotal {
                    city: "Dakar".into(),
                    positive: 3
                },
                CityTotal {
                    city: "Touba".into(),
                    positive: 4
                },
            ]
        );
    }

    #[test]
    fn factor_breakdown_forward_fills_missing_dates() {
        let df = frame(&[
            "02.03.20;Dakar;1;0;0;0;Importé;;;;;;",
            "02.03.20;Dakar;1;0;0;0;Importé;;;;;;",
            "04.03.20;Dakar;1;0;0;0;Contact;;;;;;",
        ]);
        let breakdown = Aggregator::factor_breakdown(&df).unwrap();
        assert_eq!(
            breakdown.dates,
            vec![date("2020-03-02"), date("2020-03-04")]
        );
        // No Importé entry on the second date: last value carried forward.
        assert_eq!(breakdown.imported, vec![2, 2]);
        // No Contact entry before the second date: leading gap is zero.
        assert_eq!(breakdown.contact, vec![0, 1]);
    }

    #[test]
    fn absent_category_yields_all_zero_column() {
        let df = frame(&[
            "02.03.20;Dakar;1;0;0;0;Importé;;;;;;",
            "03.03.20;Dakar;1;0;0;0;Contact;;;;;;",
        ]);
        let breakdown = Aggregator::factor_breakdown(&df).unwrap();
        assert_eq!(breakdown.community, vec![0, 0]);
    }

    #[test]
    fn missing_factor_rows_are_excluded() {
        let df = frame(&[
            "02.03.20;Dakar;1;0;0;0;Importé;;;;;;",
            "02.03.20;Dakar;1;0;0;0;;;;;;;",
        ]);
        let breakdown = Aggregator::factor_breakdown(&df).unwrap();
        assert_eq!(breakdown.imported, vec![1]);
    }

    #[test]
    fn aggregation_leaves_source_frame_untouched() {
        let df = frame(&[
            "02.03.20;Dakar;1;5;0;0;Importé;France;54;1;0;Oui;8",
            "04.03.20;Dakar;2;3;0;1;Contact;;33;0;1;Oui;",
        ]);
        let before = df.clone();
        Aggregator::daily_cumulative(&df).unwrap();
        Aggregator::city_totals(&df).unwrap();
        Aggregator::factor_breakdown(&df).unwrap();
        assert!(df.equals_missing(&before));
    }
}
