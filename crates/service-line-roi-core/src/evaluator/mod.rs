//! Scenario evaluation pipeline.
//!
//! Pipeline: Request → Mix Normalization → Scenario Evaluation (x2) → Period Aggregation → Delta

mod aggregator;
mod normalizer;
mod scenario;

pub use aggregator::*;
pub use normalizer::*;
pub use scenario::*;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    Advisory, ComparisonReport, EvaluationRequest, LocumCoverage, ScenarioDelta, ScenarioKind,
};

use scenario::{non_negative, percentage};

/// Evaluation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type RoiResult<T> = Result<T, RoiError>;

/// Main evaluator that runs both scenarios and compares them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    scenario: ScenarioEvaluator,
}

impl Evaluator {
    /// Create an evaluator for a request's normalization policies.
    pub fn new(normalizer: MixNormalizer) -> Self {
        Self {
            scenario: ScenarioEvaluator::new(normalizer),
        }
    }

    /// Create an evaluator configured from the request's options.
    pub fn for_request(request: &EvaluationRequest) -> Self {
        Self::new(MixNormalizer::new(
            request.options.auto_normalize,
            request.options.zero_sum_policy,
        ))
    }

    /// Get the scenario evaluator for direct access.
    pub fn scenario_evaluator(&self) -> &ScenarioEvaluator {
        &self.scenario
    }

    /// Evaluate both scenarios, aggregate the active one, and compute the delta.
    pub fn compare(&self, request: &EvaluationRequest) -> RoiResult<ComparisonReport> {
        validate_request(request)?;

        let mut advisories = Vec::new();

        // Step 1: Evaluate both scenarios independently
        let (with_params, with_advisories) =
            request.scenario_parameters(ScenarioKind::WithCoverage)?;
        let with_coverage = self.scenario.evaluate(&with_params)?;

        let (without_params, without_advisories) =
            request.scenario_parameters(ScenarioKind::WithoutCoverage)?;
        let without_coverage = self.scenario.evaluate(&without_params)?;

        for advisory in with_advisories
            .into_iter()
            .chain(without_advisories)
            .chain(with_coverage.advisories.iter().cloned())
            .chain(without_coverage.advisories.iter().cloned())
        {
            push_unique(&mut advisories, advisory);
        }

        // Step 2: Capacity guardrail
        if let Some(safe_capacity) = request.baseline.safe_capacity {
            let staffed = f64::from(with_coverage.units_covered);
            if staffed > safe_capacity {
                warn!(staffed, safe_capacity, "staffed volume exceeds safe capacity");
                push_unique(
                    &mut advisories,
                    Advisory::CapacityExceeded {
                        units: staffed,
                        safe_capacity,
                    },
                );
            }
        }

        // Step 3: Aggregate active and alternate scenarios over the period
        let active = request.active;
        let (active_result, alternate_result) = match active {
            ScenarioKind::WithCoverage => (&with_coverage, &without_coverage),
            ScenarioKind::WithoutCoverage => (&without_coverage, &with_coverage),
        };
        let period = aggregate(
            active_result,
            request.period_days,
            request.options.exact_total_override(),
        )?;
        let alternate_period = aggregate(alternate_result, request.period_days, None)?;

        let delta = ScenarioDelta::between(active_result, &period, alternate_result, &alternate_period);
        let breakeven_locum_rate = request
            .coverage
            .breakeven_shift_rate(with_coverage.net_before_staffing_cost);

        if !request.options.acknowledge_disclaimer {
            push_unique(&mut advisories, Advisory::DisclaimerPending);
        }

        debug!(
            service_line = %request.service_line,
            active = active.label(),
            extra_net = delta.extra_net,
            period_net = period.net,
            "compared scenarios"
        );

        Ok(ComparisonReport {
            service_line: request.service_line.clone(),
            active,
            with_coverage,
            without_coverage,
            period,
            alternate_period,
            delta,
            breakeven_locum_rate,
            advisories,
            disclaimer_acknowledged: request.options.acknowledge_disclaimer,
        })
    }
}

/// Request-level checks the scenario evaluator cannot see.
fn validate_request(request: &EvaluationRequest) -> RoiResult<()> {
    if !request.baseline.occupancy_pct.is_finite() {
        return Err(RoiError::InvalidInput(format!(
            "occupancy_pct must be a finite number, got {}",
            request.baseline.occupancy_pct
        )));
    }
    if let Some(safe_capacity) = request.baseline.safe_capacity {
        non_negative("safe_capacity", safe_capacity)?;
    }
    if request.options.use_exact_total_override {
        non_negative("exact_total_value", request.options.exact_total_value)?;
    }
    validate_coverage(&request.coverage)?;

    if let Some(mix) = &request.payer_mix {
        for segment in &mix.segments {
            non_negative("payer rate_factor", segment.rate_factor)?;
        }
    }
    Ok(())
}

fn validate_coverage(coverage: &LocumCoverage) -> RoiResult<()> {
    match coverage.rate {
        crate::models::ShiftRate::Hourly {
            hourly_rate,
            hours_per_shift,
        } => {
            non_negative("hourly_rate", hourly_rate)?;
            non_negative("hours_per_shift", hours_per_shift)?;
        }
        crate::models::ShiftRate::Flat { per_shift } => {
            non_negative("flat_rate_per_shift", per_shift)?;
        }
    }
    non_negative("travel_per_locum", coverage.travel_per_locum)?;
    non_negative("call_stipend", coverage.addons.call_stipend)?;
    non_negative("overtime_premium", coverage.addons.overtime_premium)?;
    non_negative("holiday_premium", coverage.addons.holiday_premium)?;
    percentage("utilization_pct", coverage.utilization_pct)?;
    Ok(())
}

fn push_unique(advisories: &mut Vec<Advisory>, advisory: Advisory) {
    if !advisories.contains(&advisory) {
        advisories.push(advisory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BaselineInputs, EvaluationOptions, ReferralType, ShiftAddons, ShiftRate, TravelBasis,
    };

    fn hospitalist_request() -> EvaluationRequest {
        EvaluationRequest {
            service_line: "Daytime Hospitalist (Med-Surg only)".into(),
            baseline: BaselineInputs {
                total_units: 18.0,
                occupancy_pct: 75.0,
                unit_revenue: 2750.0,
                unit_cost: 1850.0,
                referral_rate: 1.2,
                default_referral_revenue: 900.0,
                referral_types: vec![
                    ReferralType::new("Cardiology", 30.0, 500.0),
                    ReferralType::new("GI", 25.0, 1200.0),
                    ReferralType::new("Surgery", 25.0, 3000.0),
                    ReferralType::new("Imaging/Diagnostics", 20.0, 800.0),
                ],
                safe_capacity: None,
            },
            coverage: LocumCoverage {
                count: 1,
                rate: ShiftRate::Hourly {
                    hourly_rate: 265.0,
                    hours_per_shift: 10.0,
                },
                travel_per_locum: 390.0,
                travel_amortization_shifts: None,
                travel_basis: TravelBasis::PerLocum,
                utilization_pct: 80.0,
                addons: ShiftAddons::default(),
            },
            payer_mix: None,
            loadings: None,
            period_days: 365,
            active: ScenarioKind::WithCoverage,
            options: EvaluationOptions {
                acknowledge_disclaimer: true,
                ..EvaluationOptions::default()
            },
        }
    }

    #[test]
    fn test_compare_hospitalist() {
        let request = hospitalist_request();
        let report = Evaluator::for_request(&request).compare(&request).unwrap();

        // 75% + 80% locum utilization, capped at 100%
        assert_eq!(report.with_coverage.units_covered, 18);
        assert_eq!(report.without_coverage.units_covered, 14);
        assert_eq!(report.delta.extra_units, 4);
        assert_eq!(report.delta.extra_gross_revenue, 4.0 * 2750.0);

        assert_eq!(report.without_coverage.staffing_cost, 0.0);
        assert_eq!(report.period.staffing_cost, 3040.0 * 365.0);
        assert!(report.advisories.is_empty());
        assert!(report.pending_disclaimer().is_none());
    }

    #[test]
    fn test_delta_is_active_minus_alternate() {
        let mut request = hospitalist_request();
        let with_active = Evaluator::for_request(&request).compare(&request).unwrap();

        request.active = ScenarioKind::WithoutCoverage;
        let without_active = Evaluator::for_request(&request).compare(&request).unwrap();

        assert_eq!(without_active.delta.extra_units, -with_active.delta.extra_units);
        assert!((without_active.delta.extra_net + with_active.delta.extra_net).abs() < 1e-6);
        assert_eq!(without_active.active_result(), &with_active.without_coverage);
    }

    #[test]
    fn test_override_applies_to_active_period_only() {
        let mut request = hospitalist_request();
        request.options.use_exact_total_override = true;
        request.options.exact_total_value = 50_000.0;

        let report = Evaluator::for_request(&request).compare(&request).unwrap();

        assert_eq!(report.period.staffing_cost, 50_000.0);
        assert!(report.period.staffing_cost_overridden);
        assert!(!report.alternate_period.staffing_cost_overridden);
        assert_eq!(report.alternate_period.staffing_cost, 0.0);
    }

    #[test]
    fn test_capacity_advisory() {
        let mut request = hospitalist_request();
        request.baseline.safe_capacity = Some(16.0);

        let report = Evaluator::for_request(&request).compare(&request).unwrap();

        assert!(report.advisories.contains(&Advisory::CapacityExceeded {
            units: 18.0,
            safe_capacity: 16.0
        }));
    }

    #[test]
    fn test_disclaimer_pending() {
        let mut request = hospitalist_request();
        request.options.acknowledge_disclaimer = false;

        let report = Evaluator::for_request(&request).compare(&request).unwrap();

        assert!(report.advisories.contains(&Advisory::DisclaimerPending));
        assert!(report.pending_disclaimer().is_some());
    }

    #[test]
    fn test_referral_advisory_reported_once() {
        let mut request = hospitalist_request();
        request.baseline.referral_types[0].share_pct = 20.0;

        let report = Evaluator::for_request(&request).compare(&request).unwrap();

        let rescaled = report
            .advisories
            .iter()
            .filter(|a| matches!(a, Advisory::MixRescaled { .. }))
            .count();
        assert_eq!(rescaled, 1);
    }

    #[test]
    fn test_breakeven_locum_rate() {
        let request = hospitalist_request();
        let report = Evaluator::for_request(&request).compare(&request).unwrap();

        let net_before = report.with_coverage.net_before_staffing_cost;
        let rate = report.breakeven_locum_rate.unwrap();
        assert!((rate - (net_before - 390.0)).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_request_rejected() {
        let mut request = hospitalist_request();
        request.period_days = 0;
        assert!(Evaluator::for_request(&request).compare(&request).is_err());

        let mut request = hospitalist_request();
        request.coverage.rate = ShiftRate::Hourly {
            hourly_rate: -265.0,
            hours_per_shift: 10.0,
        };
        let err = Evaluator::for_request(&request).compare(&request).unwrap_err();
        assert_eq!(
            err,
            RoiError::InvalidInput("hourly_rate must be a non-negative number, got -265".into())
        );
    }
}
