//! Scenario input models.

use serde::{Deserialize, Serialize};

/// One downstream referral type and its share of referral volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralType {
    /// Display name (e.g., "Cardiology")
    pub name: String,
    /// Share of referral volume, in percent
    pub share_pct: f64,
    /// Revenue per referral for this type; falls back to the scenario default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_revenue: Option<f64>,
}

impl ReferralType {
    /// Create a referral type with its own per-referral revenue.
    pub fn new(name: impl Into<String>, share_pct: f64, unit_revenue: f64) -> Self {
        Self {
            name: name.into(),
            share_pct,
            unit_revenue: Some(unit_revenue),
        }
    }

    /// Per-referral revenue, using `default_revenue` when the type has none.
    pub fn revenue_or(&self, default_revenue: f64) -> f64 {
        self.unit_revenue.unwrap_or(default_revenue)
    }
}

/// Base that overhead is applied to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverheadBase {
    /// Gross (direct) revenue only
    #[default]
    Direct,
    /// Gross revenue plus referral revenue
    Total,
}

/// Optional cost loadings applied on top of unit-level costs.
///
/// Both percentages are in percent (20.0 means 20%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CostLoadings {
    /// Variable operating cost as a percent of gross revenue
    #[serde(default)]
    pub variable_cost_pct: f64,
    /// Overhead as a percent of the overhead base
    #[serde(default)]
    pub overhead_pct: f64,
    /// What the overhead percentage applies to
    #[serde(default)]
    pub overhead_base: OverheadBase,
}

impl CostLoadings {
    /// Variable cost for a given gross revenue.
    pub fn variable_cost(&self, gross_revenue: f64) -> f64 {
        gross_revenue * self.variable_cost_pct / 100.0
    }

    /// Overhead for the given revenue components.
    pub fn overhead(&self, gross_revenue: f64, referral_revenue: f64) -> f64 {
        let base = match self.overhead_base {
            OverheadBase::Direct => gross_revenue,
            OverheadBase::Total => gross_revenue + referral_revenue,
        };
        base * self.overhead_pct / 100.0
    }
}

/// Inputs for a single scenario evaluation.
///
/// Built fresh for every evaluation; the with-coverage and without-coverage
/// scenarios are two independent values over the same baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioParameters {
    /// Capacity denominator (beds, shifts, studies, ...)
    pub total_units: f64,
    /// Effective coverage percentage; clamped to [0, 100] during evaluation
    pub staffed_pct: f64,
    /// Direct revenue per covered unit
    pub unit_revenue: f64,
    /// Direct cost per covered unit
    pub unit_cost: f64,
    /// Expected downstream referrals per covered unit
    pub referral_rate: f64,
    /// Partition of referral volume by downstream type
    pub referral_type_mix: Vec<ReferralType>,
    /// Per-referral revenue for types without their own rate
    pub default_referral_revenue: f64,
    /// Cost of one staffing unit for the shift (already composed)
    pub staffing_cost_rate: f64,
    /// Number of staffing units (e.g., locums) for the shift
    pub staffing_units_count: u32,
    /// Flat per-shift add-on on top of `count x rate`
    pub staffing_fixed_addon: f64,
    /// Variable cost and overhead loadings, if modeled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadings: Option<CostLoadings>,
}

impl ScenarioParameters {
    /// Staffed percentage clamped to [0, 100].
    pub fn clamped_staffed_pct(&self) -> f64 {
        self.staffed_pct.clamp(0.0, 100.0)
    }

    /// Total staffing cost for the shift.
    ///
    /// The count multiplies the composed rate once; the add-on is never
    /// multiplied.
    pub fn staffing_cost(&self) -> f64 {
        f64::from(self.staffing_units_count) * self.staffing_cost_rate + self.staffing_fixed_addon
    }

    /// Margin forgone for each unit that is not covered.
    pub fn missed_unit_margin(&self) -> f64 {
        self.unit_revenue + self.referral_rate * self.default_referral_revenue - self.unit_cost
    }
}
