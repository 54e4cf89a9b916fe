//! Property tests for the computation core.

use proptest::prelude::*;

use service_line_roi_core::evaluator::{
    aggregate, MixNormalizer, MixStatus, ScenarioEvaluator, ZeroSumPolicy,
};
use service_line_roi_core::models::{ReferralType, ScenarioParameters};

fn referral_mix() -> impl Strategy<Value = Vec<ReferralType>> {
    prop::collection::vec((0u32..100, 0u32..5_000), 0..6).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(idx, (share, revenue))| {
                ReferralType::new(format!("type-{}", idx), f64::from(share), f64::from(revenue))
            })
            .collect()
    })
}

prop_compose! {
    fn scenario_params()(
        total_units in 0u32..500,
        staffed_pct in 0.0f64..150.0,
        unit_revenue in 0.0f64..10_000.0,
        unit_cost in 0.0f64..10_000.0,
        referral_rate in 0.0f64..5.0,
        referral_type_mix in referral_mix(),
        staffing_cost_rate in 0.0f64..10_000.0,
        staffing_units_count in 0u32..5,
        staffing_fixed_addon in 0.0f64..1_000.0,
    ) -> ScenarioParameters {
        ScenarioParameters {
            total_units: f64::from(total_units),
            staffed_pct,
            unit_revenue,
            unit_cost,
            referral_rate,
            referral_type_mix,
            default_referral_revenue: 900.0,
            staffing_cost_rate,
            staffing_units_count,
            staffing_fixed_addon,
            loadings: None,
        }
    }
}

fn evaluator() -> ScenarioEvaluator {
    ScenarioEvaluator::new(MixNormalizer::new(true, ZeroSumPolicy::EvenSplit))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_unstaffed_scenario_earns_nothing(mut params in scenario_params()) {
        params.staffed_pct = 0.0;
        let result = evaluator().evaluate(&params).unwrap();

        prop_assert_eq!(result.units_covered, 0);
        prop_assert_eq!(result.gross_revenue, 0.0);
        prop_assert_eq!(result.operating_cost, 0.0);
        prop_assert_eq!(result.referral_revenue, 0.0);
    }

    #[test]
    fn prop_fully_staffed_covers_all_units(mut params in scenario_params()) {
        params.staffed_pct = 100.0;
        let result = evaluator().evaluate(&params).unwrap();

        prop_assert_eq!(f64::from(result.units_covered), params.total_units);
        prop_assert_eq!(result.units_missed, 0);
    }

    #[test]
    fn prop_net_after_is_net_before_minus_staffing(params in scenario_params()) {
        let result = evaluator().evaluate(&params).unwrap();

        prop_assert_eq!(
            result.net_after_staffing_cost,
            result.net_before_staffing_cost - result.staffing_cost
        );
        prop_assert!(result.staffed_pct >= 0.0 && result.staffed_pct <= 100.0);
    }

    #[test]
    fn prop_net_monotone_in_unit_revenue(
        params in scenario_params(),
        bump in 0.0f64..5_000.0,
    ) {
        let low = evaluator().evaluate(&params).unwrap();
        let mut raised = params.clone();
        raised.unit_revenue += bump;
        let high = evaluator().evaluate(&raised).unwrap();

        prop_assert!(high.net_before_staffing_cost >= low.net_before_staffing_cost);
        prop_assert!(high.net_after_staffing_cost >= low.net_after_staffing_cost);
    }

    #[test]
    fn prop_rescaled_mix_sums_to_100(
        raw in prop::collection::vec(0u32..100, 1..8),
    ) {
        prop_assume!(raw.iter().any(|&share| share > 0));
        let shares: Vec<f64> = raw.into_iter().map(f64::from).collect();

        let mix = MixNormalizer::default().normalize(&shares).unwrap();
        prop_assert_eq!(mix.shares.len(), shares.len());
        prop_assert_eq!(mix.shares.iter().sum::<f64>(), 100.0);
        prop_assert!(mix.shares.iter().all(|&share| share >= 0.0));

        // Normalizing a normalized mix changes nothing
        let again = MixNormalizer::default().normalize(&mix.shares).unwrap();
        prop_assert_eq!(again.status, MixStatus::Balanced);
        prop_assert_eq!(again.shares, mix.shares);
    }

    #[test]
    fn prop_override_replaces_period_staffing(
        params in scenario_params(),
        period_days in 1u32..=366,
        exact_total in 1.0f64..5_000_000.0,
    ) {
        let result = evaluator().evaluate(&params).unwrap();
        let period = aggregate(&result, period_days, Some(exact_total)).unwrap();

        prop_assert_eq!(period.staffing_cost, exact_total);
        prop_assert!(period.staffing_cost_overridden);
    }

    #[test]
    fn prop_period_net_identity(
        params in scenario_params(),
        period_days in 1u32..=366,
    ) {
        let result = evaluator().evaluate(&params).unwrap();
        let period = aggregate(&result, period_days, None).unwrap();
        let days = f64::from(period_days);

        let expected = result.net_before_staffing_cost * days - period.staffing_cost;
        prop_assert!((period.net - expected).abs() <= 1e-6 * expected.abs().max(1.0));
        prop_assert_eq!(period.staffing_cost, result.staffing_cost * days);
    }
}
