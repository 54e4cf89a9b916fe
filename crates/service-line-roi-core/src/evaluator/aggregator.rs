//! Period aggregation of per-shift results.

use tracing::debug;

use crate::models::{PeriodResult, ScenarioResult};

use super::scenario::{non_negative, MAX_TOTAL_UNITS};
use super::{RoiError, RoiResult};

/// Longest supported analysis period, in days.
pub const MAX_PERIOD_DAYS: u32 = 366;

/// Scale a per-shift result to `period_days`.
///
/// When `exact_total_override` is present and positive it replaces the
/// computed `staffing_cost x period_days`, since real staffing spend is often
/// known exactly while per-shift estimates are not.
pub fn aggregate(
    result: &ScenarioResult,
    period_days: u32,
    exact_total_override: Option<f64>,
) -> RoiResult<PeriodResult> {
    if !(1..=MAX_PERIOD_DAYS).contains(&period_days) {
        return Err(RoiError::InvalidInput(format!(
            "period_days must be between 1 and {}, got {}",
            MAX_PERIOD_DAYS, period_days
        )));
    }
    if let Some(total) = exact_total_override {
        non_negative("exact_total_override", total)?;
    }
    if !(0.0..=MAX_TOTAL_UNITS).contains(&result.total_units) {
        return Err(RoiError::InvalidInput(format!(
            "total_units must be between 0 and {}, got {}",
            MAX_TOTAL_UNITS, result.total_units
        )));
    }

    let days = f64::from(period_days);
    let net_before_staffing_cost = result.net_before_staffing_cost * days;

    let (staffing_cost, staffing_cost_overridden) = match exact_total_override {
        Some(total) if total > 0.0 => (total, true),
        _ => (result.staffing_cost * days, false),
    };

    let missed_units = (result.total_units - f64::from(result.units_covered))
        .max(0.0)
        .round_ties_even() as u32;
    let missed_opportunity = f64::from(missed_units) * result.missed_unit_margin * days;

    debug!(
        period_days,
        staffing_cost, staffing_cost_overridden, "aggregated period"
    );

    Ok(PeriodResult {
        period_days,
        gross_revenue: result.gross_revenue * days,
        referral_revenue: result.referral_revenue * days,
        operating_cost: result.operating_cost * days,
        net_before_staffing_cost,
        staffing_cost,
        staffing_cost_overridden,
        net: net_before_staffing_cost - staffing_cost,
        missed_units,
        missed_opportunity,
    })
}
