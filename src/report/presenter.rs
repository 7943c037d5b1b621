//! Presenter implementations.
//! The pipeline hands a finished report over; presenters never reach back
//! into the raw records or any ambient render context.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::charts::ChartRenderer;
use crate::report::DashboardReport;

/// Consumes a computed report and renders it somewhere.
pub trait Presenter {
    fn present(&self, report: &DashboardReport) -> Result<()>;
}

/// Prints the dashboard narrative and tables to stdout and writes the chart
/// images next to it.
pub struct ConsolePresenter {
    charts: ChartRenderer,
}

impl ConsolePresenter {
    pub fn new(chart_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts: ChartRenderer::new(chart_dir),
        }
    }
}

impl Presenter for ConsolePresenter {
    fn present(&self, report: &DashboardReport) -> Result<()> {
        let totals = &report.totals;
        let ind = &report.indicators;

        println!("COVID-19 au Sénégal");
        println!("===================\n");

        println!("En bref");
        println!("  Cas actifs              {}", ind.active_cases);
        println!("  Décès                   {}", totals.deceased);
        println!("  Guérisons               {}", totals.recovered);
        println!("  Total cas               {}", totals.positive);
        println!("  Taux de croissance      {}", percent(ind.growth_rate));
        println!("  Tests négatifs          {}", totals.negative);
        println!("  Total tests             {}", ind.total_tests);
        println!("  Taux de tests positifs  {}", percent(ind.positive_rate));

        println!("\nContamination");
        println!("  Cas importés            {}", ind.factors.imported);
        println!("  Cas contact             {}", ind.factors.contact);
        println!("  Cas communauté          {}", ind.factors.community);
        if !report.origin_counts.is_empty() {
            println!("  Provenance des malades:");
            for (origin, count) in &report.origin_counts {
                println!("    {origin:<20} {count}");
            }
        }

        println!("\nPopulation touchée");
        println!("  Age moyen               {}", years(ind.average_age));
        println!("  Hommes                  {}", ind.sex.male);
        println!("  Femmes                  {}", ind.sex.female);
        println!("  Résidence:");
        for (residency, count) in &ind.residency {
            println!("    {residency:<20} {count}");
        }
        println!(
            "  Hospitalisation moyenne {}",
            days(ind.average_hospitalization_days)
        );

        println!("\nCas positifs par ville");
        for city in &report.cities {
            println!("  {:<22} {}", city.city, city.positive);
        }

        let charts = [
            self.charts.case_evolution(&report.daily)?,
            self.charts.factor_breakdown(&report.factor_series)?,
            self.charts.city_totals(&report.cities)?,
            self.charts.age_histogram(&report.age_histogram)?,
        ];
        println!();
        for chart in &charts {
            println!("Graphique écrit: {}", chart.display());
        }
        info!(charts = charts.len(), "dashboard rendered");
        Ok(())
    }
}

/// Serializes the full report to a JSON file.
pub struct JsonPresenter {
    path: PathBuf,
}

impl JsonPresenter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Presenter for JsonPresenter {
    fn present(&self, report: &DashboardReport) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        serde_json::to_writer_pretty(file, report).context("serializing report")?;
        info!(path = %self.path.display(), "report written");
        Ok(())
    }
}

// Undefined metrics render as "n/a", never as zero or infinity.
fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}%"))
}

fn years(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0} ans"))
}

fn days(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1} jours"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_records;
    use crate::report::build_report;

    fn report() -> DashboardReport {
        let csv = "\
Date;Ville;Positif;Negatif;Décédé;Guéri;Facteur;Source/Voyage;Age;Homme;Femme;Resident Senegal;Temps Hospitalisation (j)
02.03.20;Dakar;1;10;0;0;Importé;France;54;1;0;Oui;8
04.03.20;Touba;2;15;0;1;Contact;;33;0;1;Oui;
";
        build_report(&parse_records(csv.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn json_presenter_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        JsonPresenter::new(&path).present(&report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["totals"]["positive"], 3);
        assert_eq!(value["indicators"]["active_cases"], 2);
        // Two observations only: the growth rate is undefined, not zero.
        assert!(value["indicators"]["growth_rate"].is_null());
    }

    #[test]
    fn undefined_metrics_render_as_na() {
        assert_eq!(percent(None), "n/a");
        assert_eq!(percent(Some(11.11)), "11.11%");
        assert_eq!(years(Some(33.0)), "33 ans");
        assert_eq!(days(None), "n/a");
    }
}
