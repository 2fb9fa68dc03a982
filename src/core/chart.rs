use serde::Serialize;
use thiserror::Error;

use super::types::SimulationResult;

pub const EXPECTED_GROWTH: &str = "Expected Growth";
pub const CONFIDENCE_INTERVAL: &str = "Confidence Interval";
pub const BEST_CASE: &str = "Best Case";
pub const WORST_CASE: &str = "Worst Case";

const EXPECTED_COLOR: &str = "rgb(31, 119, 180)";
const BAND_FILL_COLOR: &str = "rgba(31, 119, 180, 0.2)";
const BEST_COLOR: &str = "rgba(0, 255, 0, 0.5)";
const WORST_COLOR: &str = "rgba(255, 0, 0, 0.5)";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    Solid,
    Dashed,
    /// Outline not drawn; used for filled areas.
    Hidden,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Fill {
    None,
    /// Close the path back to its first point and fill the enclosed polygon.
    ToSelf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    pub dash: LineDash,
    pub fill: Fill,
    pub color: &'static str,
    pub fill_color: Option<&'static str>,
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub name: &'static str,
    pub x: Vec<u32>,
    pub y: Vec<f64>,
    pub style: SeriesStyle,
}

impl ChartSeries {
    pub fn points(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub title: &'static str,
    pub x_axis_title: &'static str,
    pub y_axis_title: &'static str,
    pub hover_mode: &'static str,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            title: "Investment Growth Simulation",
            x_axis_title: "Years",
            y_axis_title: "Investment Value ($)",
            hover_mode: "x unified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub layout: ChartLayout,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    pub fn series(&self, name: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartBuildError {
    #[error("series `{series}` has {actual} points, expected {expected} to match years")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Reshapes a simulation summary into four renderable series.
///
/// The confidence band is emitted as a closed polygon: the 75th percentile
/// traced left to right, then the 25th percentile traced right to left.
pub fn build_chart(result: &SimulationResult) -> Result<ChartSpec, ChartBuildError> {
    check_lengths(result)?;

    let years = &result.years;
    let band_x: Vec<u32> = years.iter().chain(years.iter().rev()).copied().collect();
    let band_y: Vec<f64> = result
        .percentile_75
        .iter()
        .chain(result.percentile_25.iter().rev())
        .copied()
        .collect();

    Ok(ChartSpec {
        layout: ChartLayout::default(),
        series: vec![
            ChartSeries {
                name: EXPECTED_GROWTH,
                x: years.clone(),
                y: result.mean_values.clone(),
                style: SeriesStyle {
                    dash: LineDash::Solid,
                    fill: Fill::None,
                    color: EXPECTED_COLOR,
                    fill_color: None,
                    width: Some(2.0),
                },
            },
            ChartSeries {
                name: CONFIDENCE_INTERVAL,
                x: band_x,
                y: band_y,
                style: SeriesStyle {
                    dash: LineDash::Hidden,
                    fill: Fill::ToSelf,
                    color: "rgba(255, 255, 255, 0)",
                    fill_color: Some(BAND_FILL_COLOR),
                    width: None,
                },
            },
            dashed_line(BEST_CASE, years, &result.best_case, BEST_COLOR),
            dashed_line(WORST_CASE, years, &result.worst_case, WORST_COLOR),
        ],
    })
}

fn dashed_line(name: &'static str, years: &[u32], y: &[f64], color: &'static str) -> ChartSeries {
    ChartSeries {
        name,
        x: years.to_vec(),
        y: y.to_vec(),
        style: SeriesStyle {
            dash: LineDash::Dashed,
            fill: Fill::None,
            color,
            fill_color: None,
            width: None,
        },
    }
}

fn check_lengths(result: &SimulationResult) -> Result<(), ChartBuildError> {
    let expected = result.years.len();
    for (series, values) in [
        ("meanValues", &result.mean_values),
        ("percentile25", &result.percentile_25),
        ("percentile75", &result.percentile_75),
        ("worstCase", &result.worst_case),
        ("bestCase", &result.best_case),
    ] {
        if values.len() != expected {
            return Err(ChartBuildError::LengthMismatch {
                series,
                expected,
                actual: values.len(),
            });
        }
    }
    Ok(())
}
