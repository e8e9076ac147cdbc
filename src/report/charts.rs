//! PNG chart rendering.
//!
//! Two figures, each split into a left and a right panel:
//!
//! * activity: step scatter with the LOWESS trend per subject, and average
//!   walking speed per subject;
//! * demographics: mean steps per age bracket as bars, and walking
//!   asymmetry per subject.
//!
//! Every figure gets its own drawing area; nothing is shared between calls.
//! Dates are plotted as day numbers and labelled back as dates.

use crate::config::ChartsConfig;
use crate::models::{AnalysisReport, SubjectSeries};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CAPTION_FONT: (&str, u32) = ("sans-serif", 28);
const MARKER_SIZE: u32 = 4;

/// Render both figures into `output_dir`, returning the written paths.
pub fn write_charts(
    report: &AnalysisReport,
    config: &ChartsConfig,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    let size = (config.width, config.height);
    let activity = output_dir.join(&config.activity_file);
    let demographics = output_dir.join(&config.demographics_file);

    render_activity_figure(report, &activity, size)
        .with_context(|| format!("Failed to render {}", activity.display()))?;
    info!("Wrote {}", activity.display());

    render_demographics_figure(report, &demographics, size)
        .with_context(|| format!("Failed to render {}", demographics.display()))?;
    info!("Wrote {}", demographics.display());

    Ok(vec![activity, demographics])
}

/// Steps with trend lines (left), average walking speed (right).
pub fn render_activity_figure(report: &AnalysisReport, path: &Path, size: (u32, u32)) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((1, 2));
    draw_steps_panel(&panels[0], report)?;
    draw_series_panel(
        &panels[1],
        report,
        "Average Walking Speed Of Subjects",
        "Average Walking Speed",
        |s| &s.avg_walking_speed,
    )?;

    root.present()?;
    Ok(())
}

/// Mean steps per age bracket (left), walking asymmetry (right).
pub fn render_demographics_figure(
    report: &AnalysisReport,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((1, 2));
    draw_age_bars(&panels[0], report)?;
    draw_series_panel(
        &panels[1],
        report,
        "Walking Asymmetry Of Subjects",
        "Walking Asymmetry",
        |s| &s.walking_asymmetry,
    )?;

    root.present()?;
    Ok(())
}

fn draw_steps_panel<DB>(area: &DrawingArea<DB, Shift>, report: &AnalysisReport) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let steps = report
        .series
        .iter()
        .flat_map(|s| s.steps.iter().map(|v| *v as f64));
    let fitted = report
        .trends
        .iter()
        .flat_map(|t| t.points.iter().map(|p| p.fitted));
    let (y_min, y_max) = value_range(steps.chain(fitted));
    let (x_min, x_max) = date_range(report);

    let mut chart = ChartBuilder::on(area)
        .caption("Steps taken by different subjects", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Number of steps")
        .x_label_formatter(&day_label)
        .draw()?;

    for (i, series) in report.series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points: Vec<(f64, f64)> = series
            .dates
            .iter()
            .zip(&series.steps)
            .map(|(d, s)| (day_number(*d), *s as f64))
            .collect();

        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|p| Circle::new(p, MARKER_SIZE, color.filled())),
            )?
            .label(series.subject.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), MARKER_SIZE, color.filled()));

        if let Some(trend) = report.trends.iter().find(|t| t.subject == series.subject) {
            let runs = finite_runs(
                trend
                    .points
                    .iter()
                    .map(|p| (day_number(p.date), p.fitted)),
            );
            for run in runs {
                chart.draw_series(LineSeries::new(run, &color))?;
            }
        }
    }

    draw_legend(&mut chart)?;
    Ok(())
}

/// One line per subject for a per-row measurement.
fn draw_series_panel<DB, F>(
    area: &DrawingArea<DB, Shift>,
    report: &AnalysisReport,
    caption: &str,
    y_desc: &str,
    values: F,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    F: Fn(&SubjectSeries) -> &Vec<f64>,
{
    let (y_min, y_max) = value_range(report.series.iter().flat_map(|s| values(s).iter().copied()));
    let (x_min, x_max) = date_range(report);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(y_desc)
        .x_label_formatter(&day_label)
        .draw()?;

    for (i, series) in report.series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let runs = finite_runs(
            series
                .dates
                .iter()
                .zip(values(series))
                .map(|(d, v)| (day_number(*d), *v)),
        );

        for (run_index, run) in runs.into_iter().enumerate() {
            let drawn = chart.draw_series(LineSeries::new(run, &color))?;
            if run_index == 0 {
                drawn
                    .label(series.subject.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
        }
    }

    draw_legend(&mut chart)?;
    Ok(())
}

fn draw_age_bars<DB>(area: &DrawingArea<DB, Shift>, report: &AnalysisReport) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let means = &report.age_step_means;
    let (_, y_max) = value_range(means.iter().map(|m| m.mean_steps));
    let ages: Vec<u32> = means.iter().map(|m| m.age).collect();
    let bar_label = |v: &f64| -> String {
        let index = v.round();
        if (v - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        ages.get(index as usize)
            .map(ToString::to_string)
            .unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(area)
        .caption("Average Steps per age group", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(means.len().max(1) as f64 - 0.5), 0.0..y_max.max(1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Age")
        .y_desc("Number of Steps")
        .x_labels(means.len().max(1))
        .x_label_formatter(&bar_label)
        .draw()?;

    chart.draw_series(
        means
            .iter()
            .enumerate()
            .filter(|(_, m)| m.mean_steps.is_finite())
            .map(|(i, m)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, m.mean_steps)], BLUE.filled())
            }),
    )?;

    Ok(())
}

fn draw_legend<'a, DB>(chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
{
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    Ok(())
}

/// Day number used as the x coordinate of a date.
fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn day_label(value: &f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

/// Date axis range padded by half a day on both sides.
fn date_range(report: &AnalysisReport) -> (f64, f64) {
    match (report.metadata.first_date, report.metadata.last_date) {
        (Some(first), Some(last)) => (day_number(first) - 0.5, day_number(last) + 0.5),
        _ => (0.0, 1.0),
    }
}

/// Range over the finite values with 5% headroom; `(0, 1)` if there are none.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }

    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// Split a line at non-finite points; each run is drawn on its own so
/// missing days leave a gap.
fn finite_runs(points: impl Iterator<Item = (f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for (x, y) in points {
        if x.is_finite() && y.is_finite() {
            current.push((x, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    debug!("Plotting {} line segment(s)", runs.len());
    runs
}
