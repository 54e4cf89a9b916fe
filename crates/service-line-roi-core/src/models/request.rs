//! Evaluation request: one immutable snapshot of calculator inputs.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluator::{normalize_fractions, RoiResult, ZeroSumPolicy};

use super::coverage::{LocumCoverage, ShiftRate};
use super::parameters::{CostLoadings, ReferralType, ScenarioParameters};
use super::results::{Advisory, MixKind, ScenarioKind};

/// Baseline service-line inputs shared by both scenarios.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineInputs {
    /// Capacity denominator (beds, shifts, studies, ...)
    pub total_units: f64,
    /// Staffed percentage without locums
    pub occupancy_pct: f64,
    /// Direct revenue per unit (before payer blending)
    pub unit_revenue: f64,
    /// Direct cost per unit
    pub unit_cost: f64,
    /// Referrals per covered unit
    pub referral_rate: f64,
    /// Per-referral revenue for types without their own rate
    pub default_referral_revenue: f64,
    /// Downstream referral types
    #[serde(default)]
    pub referral_types: Vec<ReferralType>,
    /// Safe staffed volume for the service line, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_capacity: Option<f64>,
}

/// One payer segment of the revenue mix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayerSegment {
    pub name: String,
    /// Share of volume, in percent
    pub share_pct: f64,
    /// Multiplier on the base unit revenue for this payer
    pub rate_factor: f64,
}

/// Payer mix used to blend the base unit revenue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayerMix {
    pub segments: Vec<PayerSegment>,
}

impl PayerMix {
    /// Medicare / Commercial / Medicaid at 50/35/15 with factors 1.00/1.30/0.80.
    pub fn standard() -> Self {
        Self {
            segments: vec![
                PayerSegment {
                    name: "Medicare".into(),
                    share_pct: 50.0,
                    rate_factor: 1.00,
                },
                PayerSegment {
                    name: "Commercial".into(),
                    share_pct: 35.0,
                    rate_factor: 1.30,
                },
                PayerSegment {
                    name: "Medicaid".into(),
                    share_pct: 15.0,
                    rate_factor: 0.80,
                },
            ],
        }
    }

    /// Weighted rate factor and whether the shares had to be normalized.
    pub fn blended_factor(&self) -> RoiResult<(f64, bool)> {
        let shares: Vec<f64> = self.segments.iter().map(|s| s.share_pct).collect();
        let (fractions, changed) = normalize_fractions(&shares)?;
        let factor = fractions
            .iter()
            .zip(&self.segments)
            .map(|(fraction, segment)| fraction * segment.rate_factor)
            .sum();
        Ok((factor, changed))
    }
}

/// Quick what-if adjustments, each a 10% bump on one input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Capacity x 1.10, rounded to two decimals
    Volume,
    /// Locum cost per shift x 1.10, rounded to whole dollars
    LocumRate,
    /// Commercial payer rate factor x 1.10, rounded to two decimals
    CommercialFactor,
}

impl Sensitivity {
    pub fn label(&self) -> &'static str {
        match self {
            Sensitivity::Volume => "+10% volume",
            Sensitivity::LocumRate => "+10% locum rate",
            Sensitivity::CommercialFactor => "+10% commercial factor",
        }
    }
}

const SENSITIVITY_FACTOR: f64 = 1.10;
const COMMERCIAL_SEGMENT: &str = "Commercial";

/// Round half-to-even to `places` decimals.
fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}

/// Flags and policies that shape an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationOptions {
    /// Rescale mixes that do not sum to 100
    pub auto_normalize: bool,
    /// How to treat a zero-sum mix
    #[serde(default)]
    pub zero_sum_policy: ZeroSumPolicy,
    /// Replace the computed period staffing cost with `exact_total_value`
    #[serde(default)]
    pub use_exact_total_override: bool,
    /// Exact staffing spend for the whole period
    #[serde(default)]
    pub exact_total_value: f64,
    /// The user acknowledged that figures are illustrative estimates
    #[serde(default)]
    pub acknowledge_disclaimer: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            auto_normalize: true,
            zero_sum_policy: ZeroSumPolicy::EvenSplit,
            use_exact_total_override: false,
            exact_total_value: 0.0,
            acknowledge_disclaimer: false,
        }
    }
}

impl EvaluationOptions {
    /// Exact total to hand to the period aggregator, if enabled.
    pub fn exact_total_override(&self) -> Option<f64> {
        self.use_exact_total_override.then_some(self.exact_total_value)
    }
}

/// Full calculator input snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRequest {
    /// Service line being modeled (display name)
    pub service_line: String,
    pub baseline: BaselineInputs,
    pub coverage: LocumCoverage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_mix: Option<PayerMix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadings: Option<CostLoadings>,
    /// Days the active scenario is scaled to
    pub period_days: u32,
    /// Scenario reported as the period result
    #[serde(default)]
    pub active: ScenarioKind,
    #[serde(default)]
    pub options: EvaluationOptions,
}

impl EvaluationRequest {
    /// Staffed percentage for a scenario, before clamping.
    ///
    /// Locum utilization stacks on top of occupancy and may overshoot 100.
    pub fn staffed_pct(&self, kind: ScenarioKind) -> f64 {
        match kind {
            ScenarioKind::WithCoverage => {
                self.baseline.occupancy_pct + self.coverage.utilization_pct
            }
            ScenarioKind::WithoutCoverage => self.baseline.occupancy_pct,
        }
    }

    /// Build the evaluator input for one scenario.
    ///
    /// Returns advisories raised while composing the parameters (payer mix
    /// normalization).
    pub fn scenario_parameters(
        &self,
        kind: ScenarioKind,
    ) -> RoiResult<(ScenarioParameters, Vec<Advisory>)> {
        let mut advisories = Vec::new();

        let unit_revenue = match &self.payer_mix {
            Some(mix) => {
                let (factor, changed) = mix.blended_factor()?;
                if changed {
                    advisories.push(Advisory::MixRescaled {
                        mix: MixKind::Payer,
                        original_sum: mix.segments.iter().map(|s| s.share_pct).sum(),
                    });
                }
                self.baseline.unit_revenue * factor
            }
            None => self.baseline.unit_revenue,
        };

        let (staffing_cost_rate, staffing_units_count, staffing_fixed_addon) = match kind {
            ScenarioKind::WithCoverage => (
                self.coverage.staffing_cost_rate(),
                self.coverage.count,
                self.coverage.fixed_addon(),
            ),
            ScenarioKind::WithoutCoverage => (0.0, 0, 0.0),
        };

        let params = ScenarioParameters {
            total_units: self.baseline.total_units,
            staffed_pct: self.staffed_pct(kind),
            unit_revenue,
            unit_cost: self.baseline.unit_cost,
            referral_rate: self.baseline.referral_rate,
            referral_type_mix: self.baseline.referral_types.clone(),
            default_referral_revenue: self.baseline.default_referral_revenue,
            staffing_cost_rate,
            staffing_units_count,
            staffing_fixed_addon,
            loadings: self.loadings,
        };

        Ok((params, advisories))
    }

    /// Copy of this request with one sensitivity bump applied.
    ///
    /// An hourly locum rate keeps its shift length; the hourly rate is
    /// derived from the bumped shift cost. A request without a payer mix
    /// gets the standard mix before its commercial factor is raised. A mix
    /// with no commercial segment is left as is.
    pub fn with_sensitivity(&self, sensitivity: Sensitivity) -> EvaluationRequest {
        let mut request = self.clone();

        match sensitivity {
            Sensitivity::Volume => {
                request.baseline.total_units =
                    round_to(request.baseline.total_units * SENSITIVITY_FACTOR, 2);
            }
            Sensitivity::LocumRate => match &mut request.coverage.rate {
                ShiftRate::Flat { per_shift } => {
                    *per_shift = round_to(*per_shift * SENSITIVITY_FACTOR, 0);
                }
                ShiftRate::Hourly {
                    hourly_rate,
                    hours_per_shift,
                } => {
                    if *hours_per_shift > 0.0 {
                        let shift_cost = *hourly_rate * *hours_per_shift;
                        *hourly_rate =
                            round_to(shift_cost * SENSITIVITY_FACTOR, 0) / *hours_per_shift;
                    }
                }
            },
            Sensitivity::CommercialFactor => {
                let mix = request.payer_mix.get_or_insert_with(PayerMix::standard);
                match mix
                    .segments
                    .iter_mut()
                    .find(|s| s.name.eq_ignore_ascii_case(COMMERCIAL_SEGMENT))
                {
                    Some(segment) => {
                        segment.rate_factor =
                            round_to(segment.rate_factor * SENSITIVITY_FACTOR, 2);
                    }
                    None => warn!("payer mix has no commercial segment, sensitivity not applied"),
                }
            }
        }

        request
    }

    /// Canonical JSON used for fingerprinting and saved inputs.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
