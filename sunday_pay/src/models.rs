//! Data models for the Sunday pay engine.
//!
//! The `models` module defines the serialisable value types that flow
//! into and out of the pay projection engine.  They derive `Serialize`
//! and `Deserialize` so they can be transmitted over the HTTP API
//! unchanged.  Every result is recomputed from its inputs; nothing
//! here carries identity or mutable state.

use crate::error::{ensure_positive, ensure_range, Result};
use crate::tax::TaxResult;
use serde::{Deserialize, Serialize};

/// Parameters of a single current-versus-new comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayScenarioInputs {
    /// Base hourly rate for the pay point.
    pub base_hourly_rate: f64,
    pub contracted_hours_per_week: f64,
    /// Bank Sundays worked per month under the current pattern.
    pub bank_sundays_per_month: f64,
    /// Hours claimed per bank Sunday.
    pub bank_sunday_hours: f64,
    pub bank_sunday_hourly_rate: f64,
    /// Contracted Sundays worked per month under the new pattern.
    pub new_sundays_per_month: f64,
    /// Premium on the base rate for contracted Sunday hours (0.60 is
    /// time plus 60%).
    #[serde(default = "default_enhancement")]
    pub sunday_enhancement: f64,
    pub pension_rate: f64,
    #[serde(default = "default_true")]
    pub include_leave_uplift: bool,
    #[serde(default = "default_leave_weeks")]
    pub annual_leave_weeks: f64,
}

pub const DEFAULT_SUNDAY_ENHANCEMENT: f64 = 0.60;
pub const DEFAULT_ANNUAL_LEAVE_WEEKS: f64 = 6.5;

fn default_enhancement() -> f64 {
    DEFAULT_SUNDAY_ENHANCEMENT
}

fn default_true() -> bool {
    true
}

fn default_leave_weeks() -> f64 {
    DEFAULT_ANNUAL_LEAVE_WEEKS
}

impl PayScenarioInputs {
    /// Rejects inputs outside their plausible range rather than
    /// clamping them.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("base_hourly_rate", self.base_hourly_rate)?;
        ensure_range(
            "contracted_hours_per_week",
            self.contracted_hours_per_week,
            f64::MIN_POSITIVE,
            168.0,
            "greater than 0 and at most 168",
        )?;
        ensure_range(
            "bank_sundays_per_month",
            self.bank_sundays_per_month,
            0.0,
            31.0,
            "between 0 and 31",
        )?;
        ensure_range(
            "bank_sunday_hours",
            self.bank_sunday_hours,
            0.0,
            24.0,
            "between 0 and 24",
        )?;
        ensure_positive("bank_sunday_hourly_rate", self.bank_sunday_hourly_rate)?;
        ensure_range(
            "new_sundays_per_month",
            self.new_sundays_per_month,
            0.0,
            31.0,
            "between 0 and 31",
        )?;
        ensure_range(
            "sunday_enhancement",
            self.sunday_enhancement,
            0.0,
            10.0,
            "between 0 and 10",
        )?;
        ensure_range("pension_rate", self.pension_rate, 0.0, 1.0, "between 0 and 1")?;
        ensure_range(
            "annual_leave_weeks",
            self.annual_leave_weeks,
            f64::MIN_POSITIVE,
            52.0,
            "greater than 0 and at most 52",
        )?;
        Ok(())
    }

    /// Same scenario with a different new-pattern Sunday count.
    pub fn with_new_sundays(&self, new_sundays_per_month: f64) -> Self {
        Self {
            new_sundays_per_month,
            ..self.clone()
        }
    }
}

/// Monthly and annual figures for one pay pattern.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioBreakdown {
    pub weekend_monthly: f64,
    pub leave_uplift_monthly: f64,
    pub gross_monthly: f64,
    pub gross_annual: f64,
    pub pension_monthly: f64,
    pub pension_annual: f64,
    pub tax: TaxResult,
    pub take_home_monthly: f64,
    pub take_home_annual: f64,
}

/// New minus current, per month.  Any field may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayDelta {
    pub weekend_monthly: f64,
    pub leave_uplift_monthly: f64,
    pub gross_monthly: f64,
    pub pension_monthly: f64,
    pub take_home_monthly: f64,
}

impl PayDelta {
    pub fn between(current: &ScenarioBreakdown, new: &ScenarioBreakdown) -> Self {
        Self {
            weekend_monthly: new.weekend_monthly - current.weekend_monthly,
            leave_uplift_monthly: new.leave_uplift_monthly - current.leave_uplift_monthly,
            gross_monthly: new.gross_monthly - current.gross_monthly,
            pension_monthly: new.pension_monthly - current.pension_monthly,
            take_home_monthly: new.take_home_monthly - current.take_home_monthly,
        }
    }
}

/// Full comparison produced by [`crate::engine::project_pay`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayScenarioResult {
    pub base_monthly: f64,
    pub current: ScenarioBreakdown,
    pub new: ScenarioBreakdown,
    pub change: PayDelta,
}

/// Pay projected at one point of the simulated Sunday distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePay {
    /// Percentile in `[0, 100]`.
    pub percentile: f64,
    pub sundays_per_month: f64,
    pub result: PayScenarioResult,
}

/// Pay range correlated with simulated staffing variability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRange {
    pub low: PercentilePay,
    pub median: PercentilePay,
    pub high: PercentilePay,
}
