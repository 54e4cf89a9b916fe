//! Derived scenario, period, and comparison results.

use serde::{Deserialize, Serialize};

/// Which staffing scenario a result describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Baseline occupancy plus locum coverage
    #[default]
    WithCoverage,
    /// Baseline occupancy only, no locum cost
    WithoutCoverage,
}

impl ScenarioKind {
    /// The other scenario of the comparison pair.
    pub fn alternate(self) -> Self {
        match self {
            ScenarioKind::WithCoverage => ScenarioKind::WithoutCoverage,
            ScenarioKind::WithoutCoverage => ScenarioKind::WithCoverage,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::WithCoverage => "with_coverage",
            ScenarioKind::WithoutCoverage => "without_coverage",
        }
    }
}

/// Which percentage mix an advisory refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MixKind {
    Referral,
    Payer,
}

/// Non-fatal condition surfaced alongside a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advisory {
    /// Mix did not sum to 100 and was rescaled
    MixRescaled { mix: MixKind, original_sum: f64 },
    /// Mix did not sum to 100 and was used as entered
    MixImbalance { mix: MixKind, sum: f64 },
    /// Mix summed to zero and was replaced by an even split
    EvenSplitApplied { mix: MixKind },
    /// Staffed volume is above the safe capacity for the service line
    CapacityExceeded { units: f64, safe_capacity: f64 },
    /// Estimates are shown without the disclaimer being acknowledged
    DisclaimerPending,
}

impl Advisory {
    /// Human-readable advisory text.
    pub fn message(&self) -> String {
        match self {
            Advisory::MixRescaled { mix, original_sum } => format!(
                "{} mix summed to {:.1}% and was auto-normalized to 100%",
                mix_label(*mix),
                original_sum
            ),
            Advisory::MixImbalance { mix, sum } => format!(
                "{} mix sums to {:.1}%, not 100%; results use the percentages as entered",
                mix_label(*mix),
                sum
            ),
            Advisory::EvenSplitApplied { mix } => {
                format!("{} mix was empty and was split evenly", mix_label(*mix))
            }
            Advisory::CapacityExceeded {
                units,
                safe_capacity,
            } => format!(
                "Entered volume ({:.1}) exceeds safe capacity ({:.1}); results may be unrealistic",
                units, safe_capacity
            ),
            Advisory::DisclaimerPending => {
                "Estimates are illustrative; the disclaimer has not been acknowledged".to_string()
            }
        }
    }
}

fn mix_label(mix: MixKind) -> &'static str {
    match mix {
        MixKind::Referral => "Referral type",
        MixKind::Payer => "Payer",
    }
}

/// Revenue contributed by one referral type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralContribution {
    pub name: String,
    /// Share actually applied (after normalization), in percent
    pub share_pct: f64,
    /// Referrals attributed to this type
    pub referrals: f64,
    /// Revenue per referral used
    pub unit_revenue: f64,
    /// referrals x unit_revenue
    pub revenue: f64,
}

/// Per-shift financial breakdown for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioResult {
    /// Capacity denominator the scenario was evaluated against
    pub total_units: f64,
    /// Staffed percentage after clamping
    pub staffed_pct: f64,
    /// Units covered this shift
    pub units_covered: u32,
    /// Units left uncovered this shift
    pub units_missed: u32,
    /// Direct revenue from covered units
    pub gross_revenue: f64,
    /// Direct cost of covered units
    pub operating_cost: f64,
    /// Downstream referrals generated this shift
    pub referral_volume: f64,
    /// Downstream referral revenue
    pub referral_revenue: f64,
    /// Referral revenue by type
    pub referral_breakdown: Vec<ReferralContribution>,
    /// Variable operating cost loading
    pub variable_cost: f64,
    /// Overhead loading
    pub overhead_cost: f64,
    /// Staffing (coverage) cost for the shift
    pub staffing_cost: f64,
    /// gross + referral - operating - variable - overhead
    pub net_before_staffing_cost: f64,
    /// net_before_staffing_cost - staffing_cost
    pub net_after_staffing_cost: f64,
    /// Net after staffing as a percent of staffing cost
    pub roi_pct: Option<f64>,
    /// Staffing cost at which net after staffing is zero
    pub breakeven_staffing_cost: f64,
    /// Value forgone per uncovered unit
    pub missed_unit_margin: f64,
    /// Non-fatal conditions met while evaluating
    pub advisories: Vec<Advisory>,
}

impl ScenarioResult {
    /// Gross plus referral revenue.
    pub fn total_revenue(&self) -> f64 {
        self.gross_revenue + self.referral_revenue
    }

    /// All costs including staffing.
    pub fn total_cost(&self) -> f64 {
        self.operating_cost + self.variable_cost + self.overhead_cost + self.staffing_cost
    }
}

/// A scenario scaled to a multi-day period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodResult {
    pub period_days: u32,
    pub gross_revenue: f64,
    pub referral_revenue: f64,
    pub operating_cost: f64,
    pub net_before_staffing_cost: f64,
    /// Staffing cost over the period (computed or exact override)
    pub staffing_cost: f64,
    /// True when `staffing_cost` is the exact user-supplied total
    pub staffing_cost_overridden: bool,
    /// net_before_staffing_cost - staffing_cost
    pub net: f64,
    /// Units left uncovered per shift
    pub missed_units: u32,
    /// Value forgone by uncovered units over the period
    pub missed_opportunity: f64,
}

/// Active scenario minus alternate scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDelta {
    pub extra_units: i64,
    pub extra_gross_revenue: f64,
    pub extra_referral_revenue: f64,
    /// Per-shift net after staffing cost
    pub extra_net: f64,
    /// Period net
    pub extra_period_net: f64,
}

impl ScenarioDelta {
    /// Compute `active - alternate` for both per-shift and period figures.
    pub fn between(
        active: &ScenarioResult,
        active_period: &PeriodResult,
        alternate: &ScenarioResult,
        alternate_period: &PeriodResult,
    ) -> Self {
        Self {
            extra_units: i64::from(active.units_covered) - i64::from(alternate.units_covered),
            extra_gross_revenue: active.gross_revenue - alternate.gross_revenue,
            extra_referral_revenue: active.referral_revenue - alternate.referral_revenue,
            extra_net: active.net_after_staffing_cost - alternate.net_after_staffing_cost,
            extra_period_net: active_period.net - alternate_period.net,
        }
    }
}
