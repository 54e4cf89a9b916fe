//! Temporary (locum) coverage models.

use serde::{Deserialize, Serialize};

/// How a locum's shift rate is quoted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftRate {
    /// Hourly rate times hours worked per shift
    Hourly { hourly_rate: f64, hours_per_shift: f64 },
    /// Flat amount per shift
    Flat { per_shift: f64 },
}

impl ShiftRate {
    /// Cost of one locum for one shift, excluding travel.
    pub fn per_shift(&self) -> f64 {
        match *self {
            ShiftRate::Hourly {
                hourly_rate,
                hours_per_shift,
            } => hourly_rate * hours_per_shift,
            ShiftRate::Flat { per_shift } => per_shift,
        }
    }
}

impl Default for ShiftRate {
    fn default() -> Self {
        ShiftRate::Flat { per_shift: 0.0 }
    }
}

/// Whether travel is paid for each locum or once per shift.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TravelBasis {
    /// Travel is folded into each locum's rate and multiplied by the count
    #[default]
    PerLocum,
    /// Travel is a single per-shift add-on regardless of count
    PerShift,
}

/// Fixed per-shift premiums paid on top of locum rates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ShiftAddons {
    #[serde(default)]
    pub call_stipend: f64,
    #[serde(default)]
    pub overtime_premium: f64,
    #[serde(default)]
    pub holiday_premium: f64,
}

impl ShiftAddons {
    pub fn total(&self) -> f64 {
        self.call_stipend + self.overtime_premium + self.holiday_premium
    }
}

/// Locum coverage configuration for the with-coverage scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocumCoverage {
    /// Locums per shift
    pub count: u32,
    /// Locum shift rate
    pub rate: ShiftRate,
    /// Travel and lodging per locum per day
    #[serde(default)]
    pub travel_per_locum: f64,
    /// Spread travel over this many shifts (None or 0 = no amortization)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_amortization_shifts: Option<u32>,
    /// Travel billing policy
    #[serde(default)]
    pub travel_basis: TravelBasis,
    /// Percentage points of capacity the locums add to baseline occupancy
    pub utilization_pct: f64,
    /// Per-shift premiums
    #[serde(default)]
    pub addons: ShiftAddons,
}

impl LocumCoverage {
    /// Coverage that adds nothing and costs nothing.
    pub fn none() -> Self {
        Self {
            count: 0,
            rate: ShiftRate::default(),
            travel_per_locum: 0.0,
            travel_amortization_shifts: None,
            travel_basis: TravelBasis::PerLocum,
            utilization_pct: 0.0,
            addons: ShiftAddons::default(),
        }
    }

    /// Travel cost attributable to one shift for one locum.
    pub fn travel_per_shift(&self) -> f64 {
        match self.travel_amortization_shifts {
            Some(shifts) if shifts > 0 => self.travel_per_locum / f64::from(shifts),
            _ => self.travel_per_locum,
        }
    }

    /// Composed per-locum rate used as the staffing cost rate.
    pub fn staffing_cost_rate(&self) -> f64 {
        match self.travel_basis {
            TravelBasis::PerLocum => self.rate.per_shift() + self.travel_per_shift(),
            TravelBasis::PerShift => self.rate.per_shift(),
        }
    }

    /// Per-shift add-on not multiplied by the locum count.
    pub fn fixed_addon(&self) -> f64 {
        match self.travel_basis {
            TravelBasis::PerLocum => self.addons.total(),
            TravelBasis::PerShift => self.addons.total() + self.travel_per_shift(),
        }
    }

    /// Total travel cost for one shift under the configured basis.
    pub fn travel_total(&self) -> f64 {
        match self.travel_basis {
            TravelBasis::PerLocum => self.travel_per_shift() * f64::from(self.count),
            TravelBasis::PerShift => self.travel_per_shift(),
        }
    }

    /// Per-locum shift rate at which the coverage scenario breaks even.
    ///
    /// Excludes travel and add-ons, which stay at their configured values.
    /// Returns `None` when there are no locums to price.
    pub fn breakeven_shift_rate(&self, net_before_staffing_cost: f64) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let room = net_before_staffing_cost.max(0.0) - (self.travel_total() + self.addons.total());
        Some(room.max(0.0) / f64::from(self.count))
    }
}
