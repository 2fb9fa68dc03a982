use serde::Serialize;
use thiserror::Error;

/// Longest horizon a single run accepts; bounds the sampled population.
pub const MAX_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub initial_investment: f64,
    /// Expected annual growth as a decimal fraction, 0.07 = 7%.
    pub growth_rate: f64,
    pub years: u32,
    /// Standard deviation of the annual return multiplier.
    pub volatility: f64,
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.years == 0 {
            return Err(SimulationError::InvalidParameter(
                "years must be > 0".to_string(),
            ));
        }

        if self.years > MAX_YEARS {
            return Err(SimulationError::InvalidParameter(format!(
                "years must be <= {MAX_YEARS}, got {}",
                self.years
            )));
        }

        if !self.initial_investment.is_finite() || self.initial_investment <= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "initial_investment must be a positive number, got {}",
                self.initial_investment
            )));
        }

        if !self.growth_rate.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "growth_rate must be finite, got {}",
                self.growth_rate
            )));
        }

        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "volatility must be >= 0, got {}",
                self.volatility
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub years: Vec<u32>,
    pub mean_values: Vec<f64>,
    #[serde(rename = "percentile25")]
    pub percentile_25: Vec<f64>,
    #[serde(rename = "percentile75")]
    pub percentile_75: Vec<f64>,
    pub worst_case: Vec<f64>,
    pub best_case: Vec<f64>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn final_year(&self) -> Option<YearSummary> {
        self.year(self.len().checked_sub(1)?)
    }

    pub fn year(&self, index: usize) -> Option<YearSummary> {
        Some(YearSummary {
            year: *self.years.get(index)?,
            mean: *self.mean_values.get(index)?,
            percentile_25: *self.percentile_25.get(index)?,
            percentile_75: *self.percentile_75.get(index)?,
            worst_case: *self.worst_case.get(index)?,
            best_case: *self.best_case.get(index)?,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = YearSummary> + '_ {
        (0..self.len()).filter_map(|idx| self.year(idx))
    }
}

/// One column of a [`SimulationResult`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct YearSummary {
    pub year: u32,
    pub mean: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub worst_case: f64,
    pub best_case: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}
