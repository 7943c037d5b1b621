//! Analysis module - aggregation passes and scalar indicators

mod aggregator;
mod metrics;

pub use aggregator::{AggregateError, Aggregator, CityTotal, DailyCumulative, FactorBreakdown};
pub use metrics::{FactorTotals, HeadlineTotals, MetricCalculator, MetricError, SexTotals};
