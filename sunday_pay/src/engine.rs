//! Pay projection engine.
//!
//! The `engine` module turns a [`PayScenarioInputs`] into a
//! [`PayScenarioResult`] comparing the current bank-Sunday pattern
//! against contracted Sundays with an enhancement.  Tax is delegated to
//! an implementation of the [`TaxCalculator`] trait, called once per
//! pattern on annualised figures.

use crate::error::Result;
use crate::models::{
    PayDelta, PayRange, PayScenarioInputs, PayScenarioResult, PercentilePay, ScenarioBreakdown,
};
use crate::simulation::{percentiles, run_simulation, SimulationReport, REPORTED_PERCENTILES};
use crate::staffing::StaffPoolConfig;
use crate::tax::{RestOfUkCalculator, TaxCalculator};
use serde::{Deserialize, Serialize};

/// Fixed assumptions of the pay model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shift length of a contracted Sunday, independent of weekly hours.
    pub new_sunday_hours: f64,
    pub weeks_per_year: f64,
    pub months_per_year: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            new_sunday_hours: 12.0,
            weeks_per_year: 52.0,
            months_per_year: 12.0,
        }
    }
}

/// Projects pay with the default assumptions and the built-in tax
/// model.
pub fn project_pay(inputs: &PayScenarioInputs) -> Result<PayScenarioResult> {
    project_pay_with(inputs, &EngineConfig::default(), &RestOfUkCalculator::default())
}

pub fn project_pay_with(
    inputs: &PayScenarioInputs,
    config: &EngineConfig,
    calculator: &dyn TaxCalculator,
) -> Result<PayScenarioResult> {
    inputs.validate()?;
    let months = config.months_per_year;
    let weeks = config.weeks_per_year;

    let base_monthly =
        inputs.base_hourly_rate * inputs.contracted_hours_per_week * weeks / months;

    let current_weekend = inputs.bank_sundays_per_month
        * inputs.bank_sunday_hours
        * inputs.bank_sunday_hourly_rate;

    let new_sunday_base =
        inputs.new_sundays_per_month * config.new_sunday_hours * inputs.base_hourly_rate;
    let new_weekend = new_sunday_base * (1.0 + inputs.sunday_enhancement);

    // Holiday pay carries the average enhancement a worker would have
    // earned, spread flat across the year.
    let leave_uplift = if inputs.include_leave_uplift {
        let enhancement_monthly = new_sunday_base * inputs.sunday_enhancement;
        enhancement_monthly * months / weeks * inputs.annual_leave_weeks / months
    } else {
        0.0
    };

    // Bank Sundays are non-pensionable; contracted Sunday pay and the
    // leave uplift are.
    let current = breakdown(base_monthly, current_weekend, 0.0, 0.0, months, calculator);
    let new = breakdown(
        base_monthly,
        new_weekend,
        leave_uplift,
        inputs.pension_rate * (new_weekend + leave_uplift),
        months,
        calculator,
    );

    Ok(PayScenarioResult {
        base_monthly,
        change: PayDelta::between(&current, &new),
        current,
        new,
    })
}

fn breakdown(
    base_monthly: f64,
    weekend_monthly: f64,
    leave_uplift_monthly: f64,
    pension_monthly: f64,
    months: f64,
    calculator: &dyn TaxCalculator,
) -> ScenarioBreakdown {
    let gross_monthly = base_monthly + weekend_monthly + leave_uplift_monthly;
    let gross_annual = gross_monthly * months;
    let pension_annual = pension_monthly * months;
    let tax = calculator.calculate(gross_annual, pension_annual);
    let take_home_annual = gross_annual - pension_annual - tax.income_tax - tax.employee_ni;
    ScenarioBreakdown {
        weekend_monthly,
        leave_uplift_monthly,
        gross_monthly,
        gross_annual,
        pension_monthly,
        pension_annual,
        tax,
        take_home_monthly: take_home_annual / months,
        take_home_annual,
    }
}

/// Pay at the low, median and high points of a simulated distribution
/// of Sundays per month.
pub fn pay_range_from_report(
    inputs: &PayScenarioInputs,
    report: &SimulationReport,
    config: &EngineConfig,
    calculator: &dyn TaxCalculator,
) -> Result<PayRange> {
    let sundays = percentiles(&report.outcomes, &REPORTED_PERCENTILES)?;
    let project = |i: usize| -> Result<PercentilePay> {
        let sundays_per_month = sundays[i];
        let result =
            project_pay_with(&inputs.with_new_sundays(sundays_per_month), config, calculator)?;
        Ok(PercentilePay {
            percentile: REPORTED_PERCENTILES[i],
            sundays_per_month,
            result,
        })
    };
    Ok(PayRange {
        low: project(0)?,
        median: project(1)?,
        high: project(2)?,
    })
}

/// Simulates shift allocation for `pool` and projects pay at the
/// reported percentiles.
pub fn project_pay_range(
    inputs: &PayScenarioInputs,
    pool: &StaffPoolConfig,
    trials: usize,
    seed: u64,
    config: &EngineConfig,
    calculator: &dyn TaxCalculator,
) -> Result<(PayRange, SimulationReport)> {
    inputs.validate()?;
    let report = run_simulation(pool, trials, seed)?;
    let range = pay_range_from_report(inputs, &report, config, calculator)?;
    Ok((range, report))
}
