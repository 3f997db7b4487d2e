//! Staff pool composition.
//!
//! A pool is laid out positionally: the first `opt_out` members never
//! work Sundays, the next `keen` members are more likely to pick shifts
//! up, and everybody else shares the remainder at the normal weight.

use crate::error::{PayError, Result};
use crate::simulation::AllocationMode;
use serde::{Deserialize, Serialize};

/// Average number of Sundays in a month.
pub const SUNDAYS_PER_MONTH: f64 = 52.0 / 12.0;

/// Classification of a staff member for Sunday working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonType {
    OptOut,
    Keen,
    #[default]
    Average,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffPoolConfig {
    pub total_staff: usize,
    pub staff_per_shift: usize,
    #[serde(default)]
    pub opt_out: usize,
    #[serde(default)]
    pub keen: usize,
    #[serde(default = "default_keen_weight")]
    pub keen_weight: f64,
    #[serde(default = "default_normal_weight")]
    pub normal_weight: f64,
    /// Per-person monthly shift cap.  Defaults to the whole number of
    /// Sundays in an average month.
    #[serde(default)]
    pub monthly_cap: Option<u32>,
    #[serde(default)]
    pub target: PersonType,
    #[serde(default)]
    pub allocation: AllocationMode,
}

fn default_keen_weight() -> f64 {
    2.0
}

fn default_normal_weight() -> f64 {
    1.0
}

impl Default for StaffPoolConfig {
    fn default() -> Self {
        Self {
            total_staff: 22,
            staff_per_shift: 5,
            opt_out: 4,
            keen: 0,
            keen_weight: default_keen_weight(),
            normal_weight: default_normal_weight(),
            monthly_cap: None,
            target: PersonType::Average,
            allocation: AllocationMode::Capped,
        }
    }
}

/// Why a requested classification could not be honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fallback {
    NoOptOutStaff,
    NoKeenStaff,
    NoNormalStaff,
    /// Neither normal nor keen staff exist; index 0 is used.
    NoEligibleStaff,
}

/// The representative worker whose Sundays the simulator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelection {
    pub index: usize,
    pub requested: PersonType,
    pub resolved: PersonType,
    /// Each fallback taken, in order (at most two).
    pub fallbacks: [Option<Fallback>; 2],
}

impl TargetSelection {
    pub fn is_fallback(&self) -> bool {
        self.fallbacks[0].is_some()
    }
}

/// Context figures describing an even split of shifts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairShare {
    pub sundays_per_month: f64,
    pub total_shifts_per_month: f64,
    pub per_person: f64,
    /// Share per remaining person if every opt-out works none.
    pub per_person_after_opt_outs: f64,
    /// Shifts per month left over by opt-outs.
    pub extra_pool: f64,
    /// Most a single keen person could take on if they absorbed the
    /// whole extra pool, bounded by the Sundays in a month.
    pub keen_upper_bound: f64,
}

impl StaffPoolConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PayError::InvalidStaffPool(msg));
        if self.total_staff == 0 {
            return invalid("total_staff must be greater than 0".into());
        }
        if self.staff_per_shift == 0 || self.staff_per_shift > self.total_staff {
            return invalid(format!(
                "staff_per_shift must be between 1 and {} (got {})",
                self.total_staff, self.staff_per_shift
            ));
        }
        if self.opt_out + self.keen > self.total_staff {
            return invalid(format!(
                "opt_out + keen ({}) exceeds total_staff ({})",
                self.opt_out + self.keen,
                self.total_staff
            ));
        }
        if !(self.keen_weight.is_finite() && self.keen_weight > 0.0) {
            return invalid(format!("keen_weight must be > 0 (got {})", self.keen_weight));
        }
        if !(self.normal_weight.is_finite() && self.normal_weight > 0.0) {
            return invalid(format!(
                "normal_weight must be > 0 (got {})",
                self.normal_weight
            ));
        }
        if self.monthly_cap == Some(0) {
            return invalid("monthly_cap must be greater than 0".into());
        }
        Ok(())
    }

    pub fn normal(&self) -> usize {
        self.total_staff.saturating_sub(self.opt_out + self.keen)
    }

    /// Shifts to fill each month.
    pub fn monthly_quota(&self) -> u32 {
        (self.staff_per_shift as f64 * SUNDAYS_PER_MONTH).round() as u32
    }

    pub fn cap(&self) -> u32 {
        self.monthly_cap
            .unwrap_or(SUNDAYS_PER_MONTH.floor() as u32)
    }

    /// Selection weight of each staff member, by position.
    pub fn weights(&self) -> Vec<f64> {
        let keen_end = (self.opt_out + self.keen).min(self.total_staff);
        (0..self.total_staff)
            .map(|i| {
                if i < self.opt_out {
                    0.0
                } else if i < keen_end {
                    self.keen_weight
                } else {
                    self.normal_weight
                }
            })
            .collect()
    }

    pub fn resolve_target(&self) -> TargetSelection {
        resolve_target(self.opt_out, self.keen, self.normal(), self.target)
    }

    pub fn fair_share(&self) -> FairShare {
        let total_shifts = self.staff_per_shift as f64 * SUNDAYS_PER_MONTH;
        let per_person = total_shifts / self.total_staff.max(1) as f64;
        let remaining = self.total_staff.saturating_sub(self.opt_out).max(1);
        let extra_pool = per_person * self.opt_out as f64;
        FairShare {
            sundays_per_month: SUNDAYS_PER_MONTH,
            total_shifts_per_month: total_shifts,
            per_person,
            per_person_after_opt_outs: total_shifts / remaining as f64,
            extra_pool,
            keen_upper_bound: SUNDAYS_PER_MONTH.min(per_person + extra_pool),
        }
    }
}

/// Picks the representative worker for a pool of `opt_out`, `keen` and
/// `normal` members laid out in that order.
pub fn resolve_target(
    opt_out: usize,
    keen: usize,
    normal: usize,
    requested: PersonType,
) -> TargetSelection {
    let mut fallbacks = [None; 2];
    let mut push = |fallback: Fallback| {
        if let Some(slot) = fallbacks.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(fallback);
        }
    };

    let mut wanted = requested;
    if wanted == PersonType::OptOut && opt_out == 0 {
        push(Fallback::NoOptOutStaff);
        wanted = PersonType::Average;
    }
    if wanted == PersonType::Keen && keen == 0 {
        push(Fallback::NoKeenStaff);
        wanted = PersonType::Average;
    }

    let (index, resolved) = match wanted {
        PersonType::OptOut => (0, PersonType::OptOut),
        PersonType::Keen => (opt_out, PersonType::Keen),
        PersonType::Average if normal > 0 => (opt_out + keen, PersonType::Average),
        PersonType::Average if keen > 0 => {
            push(Fallback::NoNormalStaff);
            (opt_out, PersonType::Keen)
        }
        PersonType::Average => {
            push(Fallback::NoEligibleStaff);
            (0, PersonType::OptOut)
        }
    };

    TargetSelection {
        index,
        requested,
        resolved,
        fallbacks,
    }
}
