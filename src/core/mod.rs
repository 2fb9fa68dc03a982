mod chart;
mod engine;
mod types;

pub use chart::{
    BEST_CASE, CONFIDENCE_INTERVAL, ChartBuildError, ChartLayout, ChartSeries, ChartSpec,
    EXPECTED_GROWTH, Fill, LineDash, SeriesStyle, WORST_CASE, build_chart,
};
pub use engine::{Simulator, TRIAL_COUNT, run_simulation};
pub use types::{MAX_YEARS, SimulationError, SimulationParameters, SimulationResult, YearSummary};
