//! Static Chart Renderer
//! Draws the dashboard charts as PNG files with plotters.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use plotters::prelude::*;

use crate::analysis::{CityTotal, DailyCumulative, FactorBreakdown};

const CHART_SIZE: (u32, u32) = (900, 500);

const POSITIVE_COLOR: RGBColor = RGBColor(231, 76, 60);
const ACTIVE_COLOR: RGBColor = RGBColor(52, 152, 219);
const IMPORTED_COLOR: RGBColor = RGBColor(52, 152, 219);
const CONTACT_COLOR: RGBColor = RGBColor(243, 156, 18);
const COMMUNITY_COLOR: RGBColor = RGBColor(231, 76, 60);
const BAR_COLOR: RGBColor = RGBColor(52, 152, 219);

/// Renders the dashboard charts into an output directory.
pub struct ChartRenderer {
    out_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Line chart of cumulative positive and active cases over time.
    pub fn case_evolution(&self, series: &DailyCumulative) -> Result<PathBuf> {
        let path = self.target("evolution_cas.png")?;
        let (first, last) = date_span(&series.dates).context("empty cumulative series")?;
        let active = series.active();
        let y_max = pad_max(series.positive.iter().copied().max().unwrap_or(0));

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Evolution du nombre de cas positifs", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(first..last, 0i64..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Nombre de cas")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                series.dates.iter().copied().zip(series.positive.iter().copied()),
                &POSITIVE_COLOR,
            ))?
            .label("Positif")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], POSITIVE_COLOR));
        chart
            .draw_series(LineSeries::new(
                series.dates.iter().copied().zip(active),
                &ACTIVE_COLOR,
            ))?
            .label("Actifs")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ACTIVE_COLOR));

        chart.configure_series_labels().border_style(BLACK).draw()?;
        root.present()?;
        Ok(path.clone())
    }

    /// Multi-line chart of the cumulative factor breakdown.
    pub fn factor_breakdown(&self, breakdown: &FactorBreakdown) -> Result<PathBuf> {
        let path = self.target("contamination.png")?;
        let (first, last) = date_span(&breakdown.dates).context("empty factor breakdown")?;
        let y_max = pad_max(
            breakdown
                .imported
                .iter()
                .chain(&breakdown.contact)
                .chain(&breakdown.community)
                .copied()
                .max()
                .unwrap_or(0),
        );

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Contamination par facteur", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(first..last, 0i64..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Nombre de cas")
            .draw()?;

        let lines = [
            ("Importés", &breakdown.imported, IMPORTED_COLOR),
            ("Contact", &breakdown.contact, CONTACT_COLOR),
            ("Communauté", &breakdown.community, COMMUNITY_COLOR),
        ];
        for (name, values, color) in lines {
            chart
                .draw_series(LineSeries::new(
                    breakdown.dates.iter().copied().zip(values.iter().copied()),
                    &color,
                ))?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart.configure_series_labels().border_style(BLACK).draw()?;
        root.present()?;
        Ok(path.clone())
    }

    /// Bar chart of total positive cases per city.
    pub fn city_totals(&self, cities: &[CityTotal]) -> Result<PathBuf> {
        let path = self.target("cas_par_ville.png")?;
        let labels: Vec<&str> = cities.iter().map(|c| c.city.as_str()).collect();
        let y_max = pad_max(cities.iter().map(|c| c.positive).max().unwrap_or(0));

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Nombre de cas par ville", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d((0..cities.len()).into_segmented(), 0i64..y_max)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(cities.len().max(1))
            .x_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(i) => labels.get(*i).copied().unwrap_or("").to_string(),
                _ => String::new(),
            })
            .x_desc("Ville")
            .y_desc("Cas positifs")
            .draw()?;

        chart.draw_series(cities.iter().enumerate().map(|(i, city)| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), city.positive),
                ],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 4, 4);
            bar
        }))?;

        root.present()?;
        Ok(path.clone())
    }

    /// Bar chart of record counts per patient age.
    pub fn age_histogram(&self, ages: &[(i64, u32)]) -> Result<PathBuf> {
        let path = self.target("age_patients.png")?;
        let x_max = ages.iter().map(|&(age, _)| age).max().unwrap_or(0) + 2;
        let y_max = pad_max(ages.iter().map(|&(_, count)| count as i64).max().unwrap_or(0));

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Age des patients", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0i64..x_max, 0i64..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Age")
            .y_desc("Nombre de cas")
            .draw()?;

        chart.draw_series(ages.iter().map(|&(age, count)| {
            Rectangle::new([(age, 0), (age + 1, count as i64)], BAR_COLOR.filled())
        }))?;

        root.present()?;
        Ok(path.clone())
    }

    fn target(&self, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating chart directory {}", self.out_dir.display()))?;
        Ok(self.out_dir.join(name))
    }
}

fn date_span(dates: &[NaiveDate]) -> Option<(NaiveDate, NaiveDate)> {
    let first = *dates.first()?;
    let last = *dates.last()?;
    if first == last {
        // A one-day span still needs a non-degenerate axis.
        Some((first, last.checked_add_days(Days::new(1))?))
    } else {
        Some((first, last))
    }
}

fn pad_max(max: i64) -> i64 {
    (max + max / 10).max(1) + 1
}
