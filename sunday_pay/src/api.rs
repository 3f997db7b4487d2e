//! HTTP API for the Sunday pay engine.
//!
//! This module exposes a minimal JSON API around the pay projection
//! engine and the shift-allocation simulator using the
//! [`axum`](https://crates.io/crates/axum) framework.  Every endpoint
//! is a thin wrapper over a pure function in the library; simulations
//! run on the blocking pool so they do not stall the runtime.

use crate::bands::{BandRates, BAND_TABLE};
use crate::config::AppConfig;
use crate::engine::{project_pay_range, project_pay_with, EngineConfig};
use crate::error::PayError;
use crate::models::{PayRange, PayScenarioInputs, PayScenarioResult};
use crate::simulation::{run_simulation, shift_draws, SimulationReport};
use crate::staffing::{FairShare, StaffPoolConfig};
use crate::tax::{load_tax_laws_from_dir, RestOfUkCalculator, TaxCalculator, TaxLaw, TaxResult};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Application state shared across requests.
pub struct AppState {
    pub tax_laws: HashMap<String, TaxLaw>,
    pub calculators: HashMap<String, Arc<dyn TaxCalculator>>,
    pub default_law: String,
    pub engine: EngineConfig,
    pub max_trials: usize,
    pub max_staff: usize,
    pub max_shift_draws: u64,
}

impl AppState {
    /// Registers the built-in rUK law plus any laws found in the
    /// configured directory.  A file with the same key as the built-in
    /// law replaces it.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let builtin = TaxLaw::builtin();
        let default_law = builtin.key();
        let mut laws = vec![builtin];
        laws.extend(load_tax_laws_from_dir(&config.tax_law_dir).with_context(|| {
            format!("failed to read tax laws from {}", config.tax_law_dir.display())
        })?);
        Ok(Self::from_laws(laws, default_law, config))
    }

    /// Builds the state from already loaded laws, taking request limits
    /// from `config`.
    pub fn from_laws(laws: Vec<TaxLaw>, default_law: String, config: &AppConfig) -> Self {
        let mut tax_laws = HashMap::new();
        let mut calculators: HashMap<String, Arc<dyn TaxCalculator>> = HashMap::new();
        for law in laws {
            let key = law.key();
            calculators.insert(key.clone(), Arc::new(RestOfUkCalculator::from(&law)));
            tax_laws.insert(key, law);
        }
        info!(laws = tax_laws.len(), default = %default_law, "registered tax laws");
        Self {
            tax_laws,
            calculators,
            default_law,
            engine: EngineConfig::default(),
            max_trials: config.max_trials,
            max_staff: config.max_staff,
            max_shift_draws: config.max_shift_draws,
        }
    }

    fn calculator(&self, key: Option<&str>) -> Result<Arc<dyn TaxCalculator>, PayError> {
        let key = key.unwrap_or(&self.default_law);
        self.calculators
            .get(key)
            .cloned()
            .ok_or_else(|| PayError::UnknownTaxLaw(key.to_string()))
    }

    /// Rejects simulations larger than the configured limits before any
    /// per-staff state is allocated.
    fn check_simulation(&self, pool: &StaffPoolConfig, trials: usize) -> Result<(), PayError> {
        if trials > self.max_trials {
            return Err(PayError::TooManyTrials {
                requested: trials,
                max: self.max_trials,
            });
        }
        if pool.total_staff > self.max_staff {
            return Err(PayError::TooManyStaff {
                requested: pool.total_staff,
                max: self.max_staff,
            });
        }
        pool.validate()?;
        let draws = shift_draws(pool, trials);
        if draws > self.max_shift_draws {
            return Err(PayError::SimulationTooLarge {
                draws,
                max: self.max_shift_draws,
            });
        }
        Ok(())
    }
}

/// Errors returned to API clients as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Pay(PayError),
    Internal(String),
}

impl From<PayError> for ApiError {
    fn from(err: PayError) -> Self {
        ApiError::Pay(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Pay(err @ PayError::UnknownTaxLaw(_)) => (StatusCode::NOT_FOUND, err.to_string()),
            ApiError::Pay(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ApiError::Internal(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct TaxRequest {
    pub annual_gross: f64,
    #[serde(default)]
    pub pension_deduction: f64,
    #[serde(default)]
    pub tax_law: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub inputs: PayScenarioInputs,
    #[serde(default)]
    pub tax_law: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub pool: StaffPoolConfig,
    pub trials: usize,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub inputs: PayScenarioInputs,
    pub pool: StaffPoolConfig,
    pub trials: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub tax_law: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub range: PayRange,
    pub simulation: SimulationReport,
}

/// Build the API router over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/tax", post(tax_handler))
        .route("/api/project", post(project_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/range", post(range_handler))
        .route("/api/fair-share", post(fair_share_handler))
        .route("/api/bands", get(bands_handler))
        .with_state(state)
}

/// Handler for POST /api/tax
async fn tax_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaxRequest>,
) -> ApiResult<TaxResult> {
    let calculator = state.calculator(req.tax_law.as_deref())?;
    Ok(Json(calculator.calculate(req.annual_gross, req.pension_deduction)))
}

/// Handler for POST /api/project
async fn project_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<PayScenarioResult> {
    let calculator = state.calculator(req.tax_law.as_deref())?;
    let result = project_pay_with(&req.inputs, &state.engine, calculator.as_ref())?;
    info!(
        gross_change = result.change.gross_monthly,
        take_home_change = result.change.take_home_monthly,
        "projected pay"
    );
    Ok(Json(result))
}

/// Handler for POST /api/simulate
async fn simulate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> ApiResult<SimulationReport> {
    state.check_simulation(&req.pool, req.trials)?;
    info!(trials = req.trials, seed = req.seed, "simulating shift allocation");
    let report =
        tokio::task::spawn_blocking(move || run_simulation(&req.pool, req.trials, req.seed))
            .await??;
    Ok(Json(report))
}

/// Handler for POST /api/range
async fn range_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> ApiResult<RangeResponse> {
    state.check_simulation(&req.pool, req.trials)?;
    let calculator = state.calculator(req.tax_law.as_deref())?;
    let engine = state.engine.clone();
    info!(trials = req.trials, seed = req.seed, "projecting pay range");
    let (range, simulation) = tokio::task::spawn_blocking(move || {
        project_pay_range(
            &req.inputs,
            &req.pool,
            req.trials,
            req.seed,
            &engine,
            calculator.as_ref(),
        )
    })
    .await??;
    Ok(Json(RangeResponse { range, simulation }))
}

/// Handler for POST /api/fair-share
async fn fair_share_handler(Json(pool): Json<StaffPoolConfig>) -> ApiResult<FairShare> {
    pool.validate()?;
    Ok(Json(pool.fair_share()))
}

/// Handler for GET /api/bands
async fn bands_handler() -> Json<Vec<BandRates>> {
    Json(BAND_TABLE.to_vec())
}

/// Launch the API server.  This function loads tax laws, binds to the
/// configured address and blocks until the server terminates.
pub async fn serve(config: AppConfig) -> Result<()> {
    let state = Arc::new(AppState::load(&config)?);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
