use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ChartBuildError, ChartSpec, MAX_YEARS, SimulationError, SimulationParameters,
    SimulationResult, Simulator, TRIAL_COUNT, build_chart,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

pub const DEFAULT_PORT: u16 = 8080;

const DEFAULT_INITIAL_INVESTMENT: f64 = 10_000.0;
const DEFAULT_GROWTH_RATE_PCT: f64 = 7.0;
const DEFAULT_YEARS: u32 = 10;
const DEFAULT_VOLATILITY_PCT: f64 = 15.0;

#[derive(Parser, Debug)]
#[command(
    name = "whatif",
    about = "Monte Carlo investment growth projections (CLI and HTTP chart service)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the chart page and the JSON API
    Serve {
        #[arg(default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Run one simulation and print the summary
    Simulate(SimulateArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Chart,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = DEFAULT_INITIAL_INVESTMENT)]
    pub initial_investment: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_GROWTH_RATE_PCT,
        allow_negative_numbers = true,
        help = "Expected annual growth in percent, e.g. 7"
    )]
    pub growth_rate: f64,
    #[arg(long, default_value_t = DEFAULT_YEARS)]
    pub years: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_VOLATILITY_PCT,
        help = "Standard deviation of the annual return in percent"
    )]
    pub volatility: f64,
    #[arg(long, help = "Seed for reproducible runs; random when omitted")]
    pub seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            growth_rate: DEFAULT_GROWTH_RATE_PCT,
            years: DEFAULT_YEARS,
            volatility: DEFAULT_VOLATILITY_PCT,
            seed: None,
            format: OutputFormat::Table,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_investment: Option<f64>,
    growth_rate: Option<f64>,
    years: Option<u32>,
    volatility: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug)]
struct ApiRequest {
    params: SimulationParameters,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    parameters: SimulationParameters,
    seed: Option<u64>,
    trials: usize,
    result: SimulationResult,
    chart: ChartSpec,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Chart(#[from] ChartBuildError),
}

impl RunError {
    fn status(&self) -> StatusCode {
        match self {
            RunError::Simulation(SimulationError::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            RunError::Simulation(SimulationError::NumericalInstability(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RunError::Chart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn build_parameters(args: &SimulateArgs) -> Result<SimulationParameters, String> {
    if !args.initial_investment.is_finite() || args.initial_investment <= 0.0 {
        return Err("--initial-investment must be > 0".to_string());
    }

    if !args.growth_rate.is_finite() {
        return Err("--growth-rate must be a finite percentage".to_string());
    }

    if args.years == 0 {
        return Err("--years must be > 0".to_string());
    }

    if args.years > MAX_YEARS {
        return Err(format!("--years must be <= {MAX_YEARS}"));
    }

    if !args.volatility.is_finite() || args.volatility < 0.0 {
        return Err("--volatility must be >= 0".to_string());
    }

    Ok(SimulationParameters {
        initial_investment: args.initial_investment,
        growth_rate: args.growth_rate / 100.0,
        years: args.years,
        volatility: args.volatility / 100.0,
    })
}

fn simulate(params: &SimulationParameters, seed: Option<u64>) -> Result<SimulateResponse, RunError> {
    let mut simulator = match seed {
        Some(seed) => Simulator::seeded(seed),
        None => Simulator::new(),
    };
    let result = simulator.run(params)?;
    let chart = build_chart(&result)?;

    Ok(SimulateResponse {
        parameters: *params,
        seed,
        trials: TRIAL_COUNT,
        result,
        chart,
    })
}

/// Runs the `simulate` subcommand and renders its output.
pub fn run_simulate_command(args: SimulateArgs) -> Result<String, String> {
    let params = build_parameters(&args)?;
    let response = simulate(&params, args.seed).map_err(|e| e.to_string())?;

    match args.format {
        OutputFormat::Table => Ok(format_table(&response.result)),
        OutputFormat::Json => serde_json::to_string_pretty(&response.result)
            .map_err(|e| format!("Failed to encode result: {e}")),
        OutputFormat::Chart => serde_json::to_string_pretty(&response.chart)
            .map_err(|e| format!("Failed to encode chart: {e}")),
    }
}

fn format_table(result: &SimulationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "Year", "Worst", "P25", "Mean", "P75", "Best"
    );
    let _ = writeln!(out, "{}", "-".repeat(79));
    for row in result.rows() {
        let _ = writeln!(
            out,
            "{:>4} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            row.year, row.worst_case, row.percentile_25, row.mean, row.percentile_75, row.best_case
        );
    }
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    log::info!("whatif HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    log::info!(
        "Simulating {:?} (seed {:?})",
        request.params,
        request.seed
    );
    match simulate(&request.params, request.seed) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            log::warn!("Simulation request failed: {err}");
            error_response(err.status(), &err.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut args = SimulateArgs::default();

    if let Some(v) = payload.initial_investment {
        args.initial_investment = v;
    }
    if let Some(v) = payload.growth_rate {
        args.growth_rate = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.volatility {
        args.volatility = v;
    }

    let params = build_parameters(&args).map_err(|msg| api_field_message(&msg))?;
    Ok(ApiRequest {
        params,
        seed: payload.seed,
    })
}

/// Rewrites CLI flag names in validation messages to the JSON keys.
fn api_field_message(msg: &str) -> String {
    msg.replace("--initial-investment", "initialInvestment")
        .replace("--growth-rate", "growthRate")
        .replace("--years", "years")
        .replace("--volatility", "volatility")
}
