use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::types::{MAX_YEARS, SimulationError, SimulationParameters, SimulationResult};

/// Number of sample paths per run.
pub const TRIAL_COUNT: usize = 1000;

/// Runs the projection with a caller-owned random source.
///
/// Draws are taken trial-major: all years of trial 0, then trial 1, and so on.
/// The whole population is kept in one row-major buffer of
/// `TRIAL_COUNT * years` values and reduced column by column.
pub fn run_simulation<R: Rng + ?Sized>(
    params: &SimulationParameters,
    rng: &mut R,
) -> Result<SimulationResult, SimulationError> {
    if let Err(err) = params.validate() {
        log::warn!("Simulation rejected: {err}");
        return Err(err);
    }

    let years = params.years as usize;
    let returns = Normal::new(1.0 + params.growth_rate, params.volatility)
        .map_err(|e| SimulationError::InvalidParameter(format!("return distribution: {e}")))?;

    let values = sample_paths(params.initial_investment, years, &returns, rng);
    let result = reduce_population(&values, years).inspect_err(|err| {
        log::warn!("Simulation failed for {params:?}: {err}");
    })?;

    log::debug!(
        "Simulated {TRIAL_COUNT} trials over {years} years (final mean {:.2})",
        result.mean_values[years - 1]
    );
    Ok(result)
}

/// Owns a random source and re-runs the projection on demand.
///
/// Holds no result state; every call to [`Simulator::run`] is independent.
#[derive(Debug, Clone)]
pub struct Simulator<R = StdRng> {
    rng: R,
}

impl Simulator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for Simulator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Simulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn run(
        &mut self,
        params: &SimulationParameters,
    ) -> Result<SimulationResult, SimulationError> {
        run_simulation(params, &mut self.rng)
    }
}

fn sample_paths<R: Rng + ?Sized>(
    initial_investment: f64,
    years: usize,
    returns: &Normal<f64>,
    rng: &mut R,
) -> Vec<f64> {
    let mut values = Vec::with_capacity(TRIAL_COUNT * years);
    for _ in 0..TRIAL_COUNT {
        let mut factor = 1.0;
        for _ in 0..years {
            factor *= returns.sample(rng);
            values.push(initial_investment * factor);
        }
    }
    values
}

fn reduce_population(values: &[f64], years: usize) -> Result<SimulationResult, SimulationError> {
    debug_assert_eq!(values.len(), TRIAL_COUNT * years);

    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(SimulationError::NumericalInstability(format!(
            "trial {} produced a non-finite value in year {}",
            pos / years,
            pos % years + 1
        )));
    }

    let mut result = SimulationResult {
        years: (1..=years as u32).collect(),
        mean_values: Vec::with_capacity(years),
        percentile_25: Vec::with_capacity(years),
        percentile_75: Vec::with_capacity(years),
        worst_case: Vec::with_capacity(years),
        best_case: Vec::with_capacity(years),
    };

    let mut column = Vec::with_capacity(TRIAL_COUNT);
    for year in 0..years {
        column.clear();
        column.extend(values.iter().skip(year).step_by(years).copied());

        let mean = column.iter().sum::<f64>() / column.len() as f64;
        if !mean.is_finite() {
            return Err(SimulationError::NumericalInstability(format!(
                "mean overflowed in year {}",
                year + 1
            )));
        }

        column.sort_by(|a, b| a.total_cmp(b));
        let n = column.len();
        // Summation rounding must not push the mean outside [min, max].
        result.mean_values.push(mean.clamp(column[0], column[n - 1]));
        result.percentile_25.push(percentile_sorted(&column, 25.0));
        result.percentile_75.push(percentile_sorted(&column, 75.0));
        result.worst_case.push(column[0]);
        result.best_case.push(column[n - 1]);
    }

    Ok(result)
}

/// Linear interpolation between order statistics, `rank = p/100 * (n - 1)`.
/// `values` must already be sorted ascending.
fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] + (values[upper] - values[lower]) * w
    }
}
