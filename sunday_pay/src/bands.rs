//! Pay band table and default scenarios.

use crate::models::{PayScenarioInputs, DEFAULT_ANNUAL_LEAVE_WEEKS, DEFAULT_SUNDAY_ENHANCEMENT};
use crate::staffing::StaffPoolConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayBand {
    #[serde(rename = "band-6")]
    Band6,
    #[serde(rename = "band-7")]
    Band7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayPoint {
    Entry,
    Mid,
    Top,
}

/// Hourly rates for one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRates {
    pub band: PayBand,
    pub entry: f64,
    pub mid: f64,
    pub top: f64,
    /// Assumed hourly rate for a bank Sunday.
    pub bank_sunday: f64,
}

pub const BAND_TABLE: [BandRates; 2] = [
    BandRates {
        band: PayBand::Band6,
        entry: 20.44,
        mid: 21.57,
        top: 24.61,
        bank_sunday: 44.70,
    },
    BandRates {
        band: PayBand::Band7,
        entry: 25.26,
        mid: 26.56,
        top: 28.90,
        bank_sunday: 51.48,
    },
];

pub const DEFAULT_CONTRACTED_HOURS: f64 = 37.5;
pub const DEFAULT_BANK_SUNDAYS: f64 = 1.0;
pub const DEFAULT_BANK_HOURS: f64 = 10.5;
pub const DEFAULT_PENSION_RATE: f64 = 0.107;

impl PayBand {
    pub fn rates(self) -> &'static BandRates {
        match self {
            PayBand::Band6 => &BAND_TABLE[0],
            PayBand::Band7 => &BAND_TABLE[1],
        }
    }

    pub fn hourly_rate(self, point: PayPoint) -> f64 {
        let rates = self.rates();
        match point {
            PayPoint::Entry => rates.entry,
            PayPoint::Mid => rates.mid,
            PayPoint::Top => rates.top,
        }
    }

    pub fn bank_sunday_rate(self) -> f64 {
        self.rates().bank_sunday
    }
}

impl PayScenarioInputs {
    /// Default scenario for a pay point: one bank Sunday a month now,
    /// and the fair share of the default 22-person pool afterwards.
    pub fn for_band(band: PayBand, point: PayPoint) -> Self {
        let fair_share = StaffPoolConfig::default().fair_share().per_person;
        Self {
            base_hourly_rate: band.hourly_rate(point),
            contracted_hours_per_week: DEFAULT_CONTRACTED_HOURS,
            bank_sundays_per_month: DEFAULT_BANK_SUNDAYS,
            bank_sunday_hours: DEFAULT_BANK_HOURS,
            bank_sunday_hourly_rate: band.bank_sunday_rate(),
            new_sundays_per_month: (fair_share * 100.0).round() / 100.0,
            sunday_enhancement: DEFAULT_SUNDAY_ENHANCEMENT,
            pension_rate: DEFAULT_PENSION_RATE,
            include_leave_uplift: true,
            annual_leave_weeks: DEFAULT_ANNUAL_LEAVE_WEEKS,
        }
    }
}
