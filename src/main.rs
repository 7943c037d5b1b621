//! senecovid - COVID-19 Senegal reporting dashboard
//!
//! One linear pass per invocation: fetch the remote case CSV, aggregate it
//! into cumulative series and breakdowns, derive the scalar indicators, and
//! hand everything to a presenter. Nothing is cached or persisted between
//! invocations.

mod analysis;
mod charts;
mod data;
mod report;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use data::CaseLoader;
use report::{ConsolePresenter, Presenter};

const DATA_URL: &str =
    "https://raw.githubusercontent.com/maelfabien/COVID-19-Senegal/master/COVID_Senegal.csv";
const CHART_DIR: &str = "charts";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let records = CaseLoader::new(DATA_URL)
        .load()
        .context("loading case data")?;
    let report = report::build_report(&records).context("building dashboard report")?;
    info!(days = report.daily.len(), "report computed");

    ConsolePresenter::new(CHART_DIR)
        .present(&report)
        .context("rendering dashboard")?;
    Ok(())
}
