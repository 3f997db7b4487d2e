//! Income tax and employee National Insurance.
//!
//! The `tax` module implements a simplified annualised model of UK
//! (England, Wales and Northern Ireland) income tax and Class 1
//! employee NI.  It is intended for "direction of travel" comparisons
//! between two pay patterns, not for payroll.  The thresholds and rates
//! live in a [`TaxConfig`] value that is passed in at call time, and
//! the engine reaches the model through the [`TaxCalculator`] trait so
//! that other regimes can be slotted in.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Region code of the built-in regime.
pub const RUK_REGION: &str = "rUK";
/// Tax year of the built-in thresholds.
pub const RUK_DEFAULT_VERSION: &str = "2024-25";

/// How the width of the 40% band is derived.
///
/// Two approximations of the higher-rate ceiling are in circulation.
/// `AllowanceAdjusted` subtracts the (tapered) personal allowance from
/// the ceiling, so the band moves with the taper.  `FixedCeiling` uses
/// the ceiling minus the basic band only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HigherBandMode {
    #[default]
    AllowanceAdjusted,
    FixedCeiling,
}

/// Thresholds and rates for the simplified model.  All amounts are
/// annual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    pub personal_allowance: f64,
    /// Adjusted net income above which the allowance starts to taper.
    pub taper_threshold: f64,
    /// Allowance withdrawn per £1 of income above the taper threshold.
    pub taper_rate: f64,
    pub basic_band_width: f64,
    /// Upper bound of the higher-rate band, before [`HigherBandMode`]
    /// is applied.
    pub higher_rate_ceiling: f64,
    pub basic_rate: f64,
    pub higher_rate: f64,
    pub additional_rate: f64,
    pub higher_band_mode: HigherBandMode,
    pub ni_primary_threshold: f64,
    pub ni_upper_earnings_limit: f64,
    pub ni_main_rate: f64,
    pub ni_upper_rate: f64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            personal_allowance: 12_570.0,
            taper_threshold: 100_000.0,
            taper_rate: 0.5,
            basic_band_width: 37_700.0,
            higher_rate_ceiling: 125_140.0,
            basic_rate: 0.20,
            higher_rate: 0.40,
            additional_rate: 0.45,
            higher_band_mode: HigherBandMode::AllowanceAdjusted,
            ni_primary_threshold: 12_570.0,
            ni_upper_earnings_limit: 50_270.0,
            ni_main_rate: 0.08,
            ni_upper_rate: 0.02,
        }
    }
}

/// Outcome of a single annual tax computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxResult {
    pub taxable_income: f64,
    pub income_tax: f64,
    pub employee_ni: f64,
    pub personal_allowance_used: f64,
}

/// Personal allowance after the high-income taper.
pub fn personal_allowance(config: &TaxConfig, adjusted_net_income: f64) -> f64 {
    let full = config.personal_allowance.max(0.0);
    let excess = (adjusted_net_income - config.taper_threshold).max(0.0);
    (full - excess * config.taper_rate).clamp(0.0, full)
}

/// Income tax on `annual_gross` after deducting pension contributions.
///
/// The returned [`TaxResult`] has `employee_ni` set to zero; use
/// [`tax_and_ni`] for the combined figure.
pub fn income_tax(config: &TaxConfig, annual_gross: f64, pension_deduction: f64) -> TaxResult {
    let adjusted = (annual_gross.max(0.0) - pension_deduction.max(0.0)).max(0.0);
    let allowance = personal_allowance(config, adjusted);
    let taxable = (adjusted - allowance).max(0.0);

    let basic_width = config.basic_band_width.max(0.0);
    let higher_width = match config.higher_band_mode {
        HigherBandMode::AllowanceAdjusted => {
            (config.higher_rate_ceiling - allowance - basic_width).max(0.0)
        }
        HigherBandMode::FixedCeiling => (config.higher_rate_ceiling - basic_width).max(0.0),
    };

    let mut remaining = taxable;
    let mut tax = 0.0;
    for (width, rate) in [
        (basic_width, config.basic_rate),
        (higher_width, config.higher_rate),
        (f64::INFINITY, config.additional_rate),
    ] {
        if remaining <= 0.0 {
            break;
        }
        let slice = remaining.min(width);
        tax += slice * rate;
        remaining -= slice;
    }

    TaxResult {
        taxable_income: taxable,
        income_tax: tax,
        employee_ni: 0.0,
        personal_allowance_used: allowance,
    }
}

/// Annualised Class 1 employee NI.  Pension contributions do not reduce
/// the NI base in this model.
pub fn employee_ni(config: &TaxConfig, annual_gross: f64) -> f64 {
    let gross = annual_gross.max(0.0);
    let threshold = config.ni_primary_threshold;
    if gross <= threshold {
        return 0.0;
    }
    let main = gross.min(config.ni_upper_earnings_limit) - threshold;
    let above = (gross - config.ni_upper_earnings_limit).max(0.0);
    main.max(0.0) * config.ni_main_rate + above * config.ni_upper_rate
}

/// Income tax and NI for one annual gross figure.
pub fn tax_and_ni(config: &TaxConfig, annual_gross: f64, pension_deduction: f64) -> TaxResult {
    let mut result = income_tax(config, annual_gross, pension_deduction);
    result.employee_ni = employee_ni(config, annual_gross);
    result
}

/// Versioned tax rules for a region.  Tax laws may be stored
/// externally as JSON files; the `rules` field carries the thresholds
/// and rates, with any omitted field falling back to the 2024/25 rUK
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLaw {
    /// A region code such as `"rUK"`.
    pub region: String,
    /// Tax year, e.g. `"2024-25"`.
    pub version: String,
    #[serde(default)]
    pub rules: TaxConfig,
}

impl TaxLaw {
    /// Lookup key used by the API: `"<region>-<version>"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.region, self.version)
    }

    pub fn builtin() -> Self {
        Self {
            region: RUK_REGION.to_string(),
            version: RUK_DEFAULT_VERSION.to_string(),
            rules: TaxConfig::default(),
        }
    }
}

/// Computes annual income tax and NI for a gross figure.
///
/// Tax calculators must be thread-safe (`Send + Sync`) because the
/// engine and the API share them across threads.
pub trait TaxCalculator: Send + Sync {
    /// Returns the canonical region code (e.g. `"rUK"`).
    fn region_code(&self) -> &str;
    fn calculate(&self, annual_gross: f64, pension_deduction: f64) -> TaxResult;
}

/// Calculator for the simplified England/Wales/NI regime.
#[derive(Debug, Clone, Default)]
pub struct RestOfUkCalculator {
    pub config: TaxConfig,
}

impl RestOfUkCalculator {
    pub fn new(config: TaxConfig) -> Self {
        Self { config }
    }
}

impl From<&TaxLaw> for RestOfUkCalculator {
    fn from(law: &TaxLaw) -> Self {
        Self::new(law.rules.clone())
    }
}

impl TaxCalculator for RestOfUkCalculator {
    fn region_code(&self) -> &str {
        RUK_REGION
    }

    fn calculate(&self, annual_gross: f64, pension_deduction: f64) -> TaxResult {
        tax_and_ni(&self.config, annual_gross, pension_deduction)
    }
}

/// Load all tax law definitions from a directory.
///
/// This helper scans a directory and attempts to parse any `.json`
/// files as [`TaxLaw`] objects.  Files that fail to parse are skipped
/// with a warning.  A missing directory yields an empty vector.
pub fn load_tax_laws_from_dir(path: &std::path::Path) -> Result<Vec<TaxLaw>> {
    let mut laws = Vec::new();
    if !path.is_dir() {
        return Ok(laws);
    }
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file = entry.path();
        if !entry.file_type()?.is_file() || file.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file)?;
        match serde_json::from_str::<TaxLaw>(&data) {
            Ok(law) => laws.push(law),
            Err(err) => warn!(path = %file.display(), %err, "failed to parse tax law"),
        }
    }
    Ok(laws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn allowance_tapers_between_thresholds() {
        let cfg = TaxConfig::default();
        assert_eq!(personal_allowance(&cfg, 50_000.0), 12_570.0);
        assert_eq!(personal_allowance(&cfg, 100_000.0), 12_570.0);
        assert_approx(personal_allowance(&cfg, 110_000.0), 7_570.0);
        assert_eq!(personal_allowance(&cfg, 125_140.0), 0.0);
        assert_eq!(personal_allowance(&cfg, 200_000.0), 0.0);
    }

    #[test]
    fn basic_band_boundary_is_exact() {
        let cfg = TaxConfig::default();
        let result = income_tax(&cfg, 50_270.0, 0.0);
        assert_approx(result.taxable_income, 37_700.0);
        assert_approx(result.income_tax, 7_540.0);
        assert_eq!(result.employee_ni, 0.0);
    }

    #[test]
    fn pension_reduces_taxable_income() {
        let cfg = TaxConfig::default();
        let result = income_tax(&cfg, 40_000.0, 2_000.0);
        assert_approx(result.taxable_income, 40_000.0 - 2_000.0 - 12_570.0);
        assert_approx(result.income_tax, 0.20 * 25_430.0);
    }

    #[test]
    fn higher_and_additional_bands_apply_in_order() {
        let cfg = TaxConfig::default();
        // Allowance fully tapered: higher band width is 125,140 - 0 - 37,700.
        let result = income_tax(&cfg, 200_000.0, 0.0);
        let higher = 125_140.0 - 37_700.0;
        let additional = 200_000.0 - 37_700.0 - higher;
        assert_eq!(result.personal_allowance_used, 0.0);
        assert_approx(
            result.income_tax,
            0.20 * 37_700.0 + 0.40 * higher + 0.45 * additional,
        );
    }

    #[test]
    fn higher_band_modes_agree_under_default_thresholds() {
        let adjusted = TaxConfig::default();
        let fixed = TaxConfig {
            higher_band_mode: HigherBandMode::FixedCeiling,
            ..TaxConfig::default()
        };
        // While any allowance remains, taxable income cannot reach the
        // adjusted ceiling, so the two widths only differ in principle.
        for gross in [30_000.0, 99_000.0, 112_000.0, 125_140.0, 140_000.0, 250_000.0] {
            assert_approx(
                income_tax(&adjusted, gross, 0.0).income_tax,
                income_tax(&fixed, gross, 0.0).income_tax,
            );
        }
    }

    #[test]
    fn fixed_ceiling_keeps_more_income_in_higher_band() {
        let untapered = TaxConfig {
            personal_allowance: 20_000.0,
            taper_threshold: 1_000_000.0,
            ..TaxConfig::default()
        };
        let fixed = TaxConfig {
            higher_band_mode: HigherBandMode::FixedCeiling,
            ..untapered.clone()
        };
        let a = income_tax(&untapered, 150_000.0, 0.0);
        let f = income_tax(&fixed, 150_000.0, 0.0);
        // taxable 130,000; adjusted higher width 67,440, fixed 87,440.
        assert_approx(a.income_tax, 0.20 * 37_700.0 + 0.40 * 67_440.0 + 0.45 * 24_860.0);
        assert_approx(f.income_tax, 0.20 * 37_700.0 + 0.40 * 87_440.0 + 0.45 * 4_860.0);
    }

    #[test]
    fn ni_thresholds() {
        let cfg = TaxConfig::default();
        assert_eq!(employee_ni(&cfg, 12_570.0), 0.0);
        assert_approx(employee_ni(&cfg, 50_270.0), 3_016.0);
        assert_approx(employee_ni(&cfg, 60_270.0), 3_216.0);
    }

    #[test]
    fn ni_ignores_pension_deduction() {
        let cfg = TaxConfig::default();
        let with = tax_and_ni(&cfg, 40_000.0, 5_000.0);
        let without = tax_and_ni(&cfg, 40_000.0, 0.0);
        assert_eq!(with.employee_ni, without.employee_ni);
        assert!(with.income_tax < without.income_tax);
    }

    #[test]
    fn negative_inputs_produce_no_tax() {
        let cfg = TaxConfig::default();
        let result = tax_and_ni(&cfg, -10_000.0, -5_000.0);
        assert_eq!(result.taxable_income, 0.0);
        assert_eq!(result.income_tax, 0.0);
        assert_eq!(result.employee_ni, 0.0);
    }

    #[test]
    fn calculator_delegates_to_config() {
        let calc = RestOfUkCalculator::from(&TaxLaw::builtin());
        assert_eq!(calc.region_code(), "rUK");
        let result = calc.calculate(60_270.0, 0.0);
        assert_approx(result.employee_ni, 3_216.0);
        assert_eq!(result, tax_and_ni(&TaxConfig::default(), 60_270.0, 0.0));
    }

    #[test]
    fn tax_law_rules_default_missing_fields() {
        let law: TaxLaw = serde_json::from_str(
            r#"{"region": "rUK", "version": "2025-26", "rules": {"basic_rate": 0.19}}"#,
        )
        .unwrap();
        assert_eq!(law.key(), "rUK-2025-26");
        assert_eq!(law.rules.basic_rate, 0.19);
        assert_eq!(law.rules.personal_allowance, 12_570.0);
    }

    #[test]
    fn loading_missing_dir_is_empty() {
        let laws = load_tax_laws_from_dir(std::path::Path::new("does/not/exist")).unwrap();
        assert!(laws.is_empty());
    }

    #[test]
    fn loading_skips_unparseable_files() {
        let dir = std::env::temp_dir().join(format!("sunday_pay_tax_laws_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("ruk_2025.json"),
            r#"{"region": "rUK", "version": "2025-26"}"#,
        )
        .unwrap();
        std::fs::write(dir.join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let laws = load_tax_laws_from_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(laws.len(), 1);
        assert_eq!(laws[0].version, "2025-26");
        assert_eq!(laws[0].rules, TaxConfig::default());
    }

    proptest! {
        #[test]
        fn prop_allowance_is_non_increasing(a in 0u32..300_000, b in 0u32..300_000) {
            let cfg = TaxConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(personal_allowance(&cfg, lo as f64) >= personal_allowance(&cfg, hi as f64));
        }

        #[test]
        fn prop_tax_is_non_decreasing_in_gross(
            a in 0u32..400_000,
            b in 0u32..400_000,
            pension in 0u32..20_000,
        ) {
            let cfg = TaxConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let t_lo = income_tax(&cfg, lo as f64, pension as f64).income_tax;
            let t_hi = income_tax(&cfg, hi as f64, pension as f64).income_tax;
            prop_assert!(t_lo <= t_hi + 1e-9);
        }

        #[test]
        fn prop_tax_and_ni_are_non_negative(gross in -50_000i32..400_000, pension in -5_000i32..50_000) {
            let result = tax_and_ni(&TaxConfig::default(), gross as f64, pension as f64);
            prop_assert!(result.taxable_income >= 0.0);
            prop_assert!(result.income_tax >= 0.0);
            prop_assert!(result.employee_ni >= 0.0);
            prop_assert!((0.0..=12_570.0).contains(&result.personal_allowance_used));
        }
    }
}
