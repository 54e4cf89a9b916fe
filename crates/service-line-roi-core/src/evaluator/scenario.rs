//! Per-shift scenario evaluation.

use tracing::{debug, warn};

use crate::models::{MixKind, ReferralContribution, ScenarioParameters, ScenarioResult};

use super::normalizer::MixNormalizer;
use super::{RoiError, RoiResult};

/// Largest capacity that unit counts can represent.
pub const MAX_TOTAL_UNITS: f64 = u32::MAX as f64;

/// Evaluates one staffing scenario for a single shift.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioEvaluator {
    normalizer: MixNormalizer,
}

impl ScenarioEvaluator {
    /// Create an evaluator that normalizes referral mixes with `normalizer`.
    pub fn new(normalizer: MixNormalizer) -> Self {
        Self { normalizer }
    }

    /// Compute the per-shift financial breakdown for `params`.
    ///
    /// Negative or non-finite inputs are rejected. An imbalanced referral mix
    /// is not an error: the result is still produced and carries an advisory.
    pub fn evaluate(&self, params: &ScenarioParameters) -> RoiResult<ScenarioResult> {
        validate(params)?;

        let staffed_pct = params.clamped_staffed_pct();
        let units_covered = (params.total_units * staffed_pct / 100.0).round_ties_even() as u32;
        let units_missed = (params.total_units - f64::from(units_covered))
            .max(0.0)
            .round_ties_even() as u32;

        let gross_revenue = f64::from(units_covered) * params.unit_revenue;
        let operating_cost = f64::from(units_covered) * params.unit_cost;

        // Referrals
        let referral_volume = params.total_units * params.referral_rate * staffed_pct / 100.0;
        let raw_shares: Vec<f64> = params
            .referral_type_mix
            .iter()
            .map(|t| t.share_pct)
            .collect();
        let mix = self.normalizer.normalize(&raw_shares)?;

        let mut advisories = Vec::new();
        if let Some(advisory) = mix.status.advisory(MixKind::Referral) {
            if !mix.is_valid() {
                warn!(advisory = %advisory.message(), "referral mix imbalance");
            }
            advisories.push(advisory);
        }

        let referral_breakdown: Vec<ReferralContribution> = params
            .referral_type_mix
            .iter()
            .zip(&mix.shares)
            .map(|(referral_type, &share_pct)| {
                let referrals = referral_volume * share_pct / 100.0;
                let unit_revenue = referral_type.revenue_or(params.default_referral_revenue);
                ReferralContribution {
                    name: referral_type.name.clone(),
                    share_pct,
                    referrals,
                    unit_revenue,
                    revenue: referrals * unit_revenue,
                }
            })
            .collect();
        let referral_revenue: f64 = referral_breakdown.iter().map(|c| c.revenue).sum();

        // Loadings
        let (variable_cost, overhead_cost) = match &params.loadings {
            Some(loadings) => (
                loadings.variable_cost(gross_revenue),
                loadings.overhead(gross_revenue, referral_revenue),
            ),
            None => (0.0, 0.0),
        };

        let staffing_cost = params.staffing_cost();
        let net_before_staffing_cost =
            gross_revenue + referral_revenue - operating_cost - variable_cost - overhead_cost;
        let net_after_staffing_cost = net_before_staffing_cost - staffing_cost;

        let roi_pct = (staffing_cost > 0.0).then(|| net_after_staffing_cost / staffing_cost * 100.0);

        debug!(
            units_covered,
            gross_revenue,
            referral_revenue,
            staffing_cost,
            net_after_staffing_cost,
            "evaluated scenario"
        );

        Ok(ScenarioResult {
            total_units: params.total_units,
            staffed_pct,
            units_covered,
            units_missed,
            gross_revenue,
            operating_cost,
            referral_volume,
            referral_revenue,
            referral_breakdown,
            variable_cost,
            overhead_cost,
            staffing_cost,
            net_before_staffing_cost,
            net_after_staffing_cost,
            roi_pct,
            breakeven_staffing_cost: net_before_staffing_cost.max(0.0),
            missed_unit_margin: params.missed_unit_margin(),
            advisories,
        })
    }
}

/// Reject negative or non-finite amounts before any arithmetic.
fn validate(params: &ScenarioParameters) -> RoiResult<()> {
    non_negative("total_units", params.total_units)?;
    if params.total_units > MAX_TOTAL_UNITS {
        return Err(RoiError::InvalidInput(format!(
            "total_units must be at most {}, got {}",
            MAX_TOTAL_UNITS, params.total_units
        )));
    }
    if !params.staffed_pct.is_finite() {
        return Err(RoiError::InvalidInput(format!(
            "staffed_pct must be a finite number, got {}",
            params.staffed_pct
        )));
    }
    non_negative("unit_revenue", params.unit_revenue)?;
    non_negative("unit_cost", params.unit_cost)?;
    non_negative("referral_rate", params.referral_rate)?;
    non_negative("default_referral_revenue", params.default_referral_revenue)?;
    non_negative("staffing_cost_rate", params.staffing_cost_rate)?;
    non_negative("staffing_fixed_addon", params.staffing_fixed_addon)?;

    for referral_type in &params.referral_type_mix {
        if let Some(revenue) = referral_type.unit_revenue {
            non_negative("referral type unit_revenue", revenue)?;
        }
    }

    if let Some(loadings) = &params.loadings {
        percentage("variable_cost_pct", loadings.variable_cost_pct)?;
        percentage("overhead_pct", loadings.overhead_pct)?;
    }
    Ok(())
}

pub(crate) fn non_negative(field: &str, value: f64) -> RoiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(RoiError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

pub(crate) fn percentage(field: &str, value: f64) -> RoiResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(RoiError::InvalidInput(format!(
            "{} must be between 0 and 100, got {}",
            field, value
        )));
    }
    Ok(())
}
