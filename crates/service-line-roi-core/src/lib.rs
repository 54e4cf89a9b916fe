//! Service-Line ROI Core Library
//!
//! Staffing ROI calculator for clinical service lines: compares the net
//! financial impact of a shift with temporary (locum) coverage against the
//! same shift without it.
//!
//! # Architecture
//!
//! ```text
//! Form / Presets → EvaluationRequest (immutable snapshot)
//!                        │
//!              ┌─────────┴─────────┐
//!              ▼                   ▼
//!        With coverage       Without coverage
//!              │                   │
//!              └──── Mix Normalizer (referral / payer shares)
//!              │                   │
//!              ▼                   ▼
//!        ScenarioResult      ScenarioResult
//!              │                   │
//!              └─────────┬─────────┘
//!                        ▼
//!          Period Aggregator (active scenario,
//!           optional exact staffing total)
//!                        │
//!                        ▼
//!          ComparisonReport ──► Flattened Export (CSV / JSON)
//! ```
//!
//! # Core Principle
//!
//! **Advisory, never fatal.** Invalid inputs are rejected with a clear
//! validation error; everything else (mix imbalance, capacity overrun)
//! produces a best-effort result with advisories attached.
//!
//! # Modules
//!
//! - [`models`]: Domain types (ScenarioParameters, ScenarioResult, PeriodResult, etc.)
//! - [`evaluator`]: Mix normalizer, scenario evaluator, period aggregator
//! - [`export`]: Flattened result export

pub mod evaluator;
pub mod export;
pub mod models;

// Re-export commonly used types
pub use evaluator::{
    aggregate, Evaluator, MixNormalizer, MixStatus, NormalizedMix, RoiError, RoiResult,
    ScenarioEvaluator, ZeroSumPolicy,
};
pub use export::{flatten, ExportField, ExportValue, ScenarioExport};
pub use models::{
    Advisory, BaselineInputs, ComparisonReport, CostLoadings, EvaluationOptions,
    EvaluationRequest, LocumCoverage, OverheadBase, PayerMix, PayerSegment, PeriodResult,
    ReferralType, ScenarioDelta, ScenarioKind, ScenarioParameters, ScenarioResult, Sensitivity,
    ShiftAddons, ShiftRate, TravelBasis, DISCLAIMER,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RoiCoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<RoiError> for RoiCoreError {
    fn from(e: RoiError) -> Self {
        match e {
            RoiError::InvalidInput(msg) => RoiCoreError::InvalidInput(msg),
        }
    }
}

impl From<serde_json::Error> for RoiCoreError {
    fn from(e: serde_json::Error) -> Self {
        RoiCoreError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Exported Functions
// =========================================================================

/// Evaluate both scenarios and return the comparison.
#[uniffi::export]
pub fn evaluate_comparison(
    request: FfiEvaluationRequest,
) -> Result<FfiComparisonReport, RoiCoreError> {
    let request: EvaluationRequest = request.into();
    let report = Evaluator::for_request(&request).compare(&request)?;
    Ok(report.into())
}

/// Normalize a percentage mix to sum to 100.
#[uniffi::export]
pub fn normalize_mix(
    shares: Vec<f64>,
    auto_normalize: bool,
    even_split_on_zero: bool,
) -> Result<FfiNormalizedMix, RoiCoreError> {
    let normalizer = MixNormalizer::new(auto_normalize, zero_sum_policy(even_split_on_zero));
    let mix = normalizer.normalize(&shares)?;
    Ok(mix.into())
}

/// Export the comparison as a CSV header and row.
#[uniffi::export]
pub fn export_comparison_csv(request: FfiEvaluationRequest) -> Result<String, RoiCoreError> {
    let export = build_export(request)?;
    Ok(export.to_csv())
}

/// Export the comparison as JSON.
#[uniffi::export]
pub fn export_comparison_json(request: FfiEvaluationRequest) -> Result<String, RoiCoreError> {
    let export = build_export(request)?;
    Ok(export.to_json()?)
}

/// Disclaimer text to show alongside estimates.
#[uniffi::export]
pub fn disclaimer_text() -> String {
    DISCLAIMER.to_string()
}

fn build_export(request: FfiEvaluationRequest) -> Result<ScenarioExport, RoiCoreError> {
    let request: EvaluationRequest = request.into();
    let report = Evaluator::for_request(&request).compare(&request)?;
    Ok(ScenarioExport::new(&request, &report)?)
}

fn zero_sum_policy(even_split_on_zero: bool) -> ZeroSumPolicy {
    if even_split_on_zero {
        ZeroSumPolicy::EvenSplit
    } else {
        ZeroSumPolicy::Reject
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe referral type.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferralType {
    pub name: String,
    pub share_pct: f64,
    pub unit_revenue: Option<f64>,
}

impl From<FfiReferralType> for ReferralType {
    fn from(t: FfiReferralType) -> Self {
        ReferralType {
            name: t.name,
            share_pct: t.share_pct,
            unit_revenue: t.unit_revenue,
        }
    }
}

/// FFI-safe payer segment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPayerSegment {
    pub name: String,
    pub share_pct: f64,
    pub rate_factor: f64,
}

/// FFI-safe evaluation request (flat form state).
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEvaluationRequest {
    pub service_line: String,
    pub total_units: f64,
    pub occupancy_pct: f64,
    pub unit_revenue: f64,
    pub unit_cost: f64,
    pub referral_rate: f64,
    pub default_referral_revenue: f64,
    pub referral_types: Vec<FfiReferralType>,
    pub safe_capacity: Option<f64>,
    pub locum_count: u32,
    pub hourly_rate: f64,
    pub hours_per_shift: f64,
    /// When set, replaces hourly_rate x hours_per_shift
    pub flat_rate_per_shift: Option<f64>,
    pub travel_per_locum: f64,
    pub travel_amortization_shifts: Option<u32>,
    /// Bill travel once per shift instead of per locum
    pub travel_per_shift: bool,
    pub utilization_pct: f64,
    pub call_stipend: f64,
    pub overtime_premium: f64,
    pub holiday_premium: f64,
    /// Empty means no payer blending
    pub payer_segments: Vec<FfiPayerSegment>,
    pub variable_cost_pct: Option<f64>,
    pub overhead_pct: Option<f64>,
    /// Apply overhead to gross + referral revenue instead of gross only
    pub overhead_on_total: bool,
    pub period_days: u32,
    pub coverage_active: bool,
    pub auto_normalize: bool,
    pub even_split_on_zero: bool,
    pub use_exact_total_override: bool,
    pub exact_total_value: f64,
    pub acknowledge_disclaimer: bool,
}

impl From<FfiEvaluationRequest> for EvaluationRequest {
    fn from(req: FfiEvaluationRequest) -> Self {
        let rate = match req.flat_rate_per_shift {
            Some(per_shift) => ShiftRate::Flat { per_shift },
            None => ShiftRate::Hourly {
                hourly_rate: req.hourly_rate,
                hours_per_shift: req.hours_per_shift,
            },
        };

        let loadings = if req.variable_cost_pct.is_some() || req.overhead_pct.is_some() {
            Some(CostLoadings {
                variable_cost_pct: req.variable_cost_pct.unwrap_or(0.0),
                overhead_pct: req.overhead_pct.unwrap_or(0.0),
                overhead_base: if req.overhead_on_total {
                    OverheadBase::Total
                } else {
                    OverheadBase::Direct
                },
            })
        } else {
            None
        };

        let payer_mix = (!req.payer_segments.is_empty()).then(|| PayerMix {
            segments: req
                .payer_segments
                .into_iter()
                .map(|s| PayerSegment {
                    name: s.name,
                    share_pct: s.share_pct,
                    rate_factor: s.rate_factor,
                })
                .collect(),
        });

        EvaluationRequest {
            service_line: req.service_line,
            baseline: BaselineInputs {
                total_units: req.total_units,
                occupancy_pct: req.occupancy_pct,
                unit_revenue: req.unit_revenue,
                unit_cost: req.unit_cost,
                referral_rate: req.referral_rate,
                default_referral_revenue: req.default_referral_revenue,
                referral_types: req.referral_types.into_iter().map(|t| t.into()).collect(),
                safe_capacity: req.safe_capacity,
            },
            coverage: LocumCoverage {
                count: req.locum_count,
                rate,
                travel_per_locum: req.travel_per_locum,
                travel_amortization_shifts: req.travel_amortization_shifts,
                travel_basis: if req.travel_per_shift {
                    TravelBasis::PerShift
                } else {
                    TravelBasis::PerLocum
                },
                utilization_pct: req.utilization_pct,
                addons: ShiftAddons {
                    call_stipend: req.call_stipend,
                    overtime_premium: req.overtime_premium,
                    holiday_premium: req.holiday_premium,
                },
            },
            payer_mix,
            loadings,
            period_days: req.period_days,
            active: if req.coverage_active {
                ScenarioKind::WithCoverage
            } else {
                ScenarioKind::WithoutCoverage
            },
            options: EvaluationOptions {
                auto_normalize: req.auto_normalize,
                zero_sum_policy: zero_sum_policy(req.even_split_on_zero),
                use_exact_total_override: req.use_exact_total_override,
                exact_total_value: req.exact_total_value,
                acknowledge_disclaimer: req.acknowledge_disclaimer,
            },
        }
    }
}

/// FFI-safe normalized mix.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNormalizedMix {
    pub shares: Vec<f64>,
    /// "balanced", "rescaled", "even_split", or "imbalanced"
    pub status: String,
    /// Advisory text, if the mix was changed or is invalid
    pub advisory: Option<String>,
}

impl From<NormalizedMix> for FfiNormalizedMix {
    fn from(mix: NormalizedMix) -> Self {
        let status = match mix.status {
            MixStatus::Balanced => "balanced",
            MixStatus::Rescaled { .. } => "rescaled",
            MixStatus::EvenSplit => "even_split",
            MixStatus::Imbalanced { .. } => "imbalanced",
        };
        Self {
            advisory: mix
                .status
                .advisory(models::MixKind::Referral)
                .map(|a| a.message()),
            status: status.to_string(),
            shares: mix.shares,
        }
    }
}

/// FFI-safe per-shift scenario result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScenarioResult {
    pub staffed_pct: f64,
    pub units_covered: u32,
    pub units_missed: u32,
    pub gross_revenue: f64,
    pub operating_cost: f64,
    pub referral_revenue: f64,
    pub variable_cost: f64,
    pub overhead_cost: f64,
    pub staffing_cost: f64,
    pub net_before_staffing_cost: f64,
    pub net_after_staffing_cost: f64,
    pub roi_pct: Option<f64>,
}

impl From<ScenarioResult> for FfiScenarioResult {
    fn from(result: ScenarioResult) -> Self {
        Self {
            staffed_pct: result.staffed_pct,
            units_covered: result.units_covered,
            units_missed: result.units_missed,
            gross_revenue: result.gross_revenue,
            operating_cost: result.operating_cost,
            referral_revenue: result.referral_revenue,
            variable_cost: result.variable_cost,
            overhead_cost: result.overhead_cost,
            staffing_cost: result.staffing_cost,
            net_before_staffing_cost: result.net_before_staffing_cost,
            net_after_staffing_cost: result.net_after_staffing_cost,
            roi_pct: result.roi_pct,
        }
    }
}

/// FFI-safe period result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPeriodResult {
    pub period_days: u32,
    pub net_before_staffing_cost: f64,
    pub staffing_cost: f64,
    pub staffing_cost_overridden: bool,
    pub net: f64,
    pub missed_units: u32,
    pub missed_opportunity: f64,
}

impl From<PeriodResult> for FfiPeriodResult {
    fn from(period: PeriodResult) -> Self {
        Self {
            period_days: period.period_days,
            net_before_staffing_cost: period.net_before_staffing_cost,
            staffing_cost: period.staffing_cost,
            staffing_cost_overridden: period.staffing_cost_overridden,
            net: period.net,
            missed_units: period.missed_units,
            missed_opportunity: period.missed_opportunity,
        }
    }
}

/// FFI-safe comparison report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiComparisonReport {
    pub service_line: String,
    pub coverage_active: bool,
    pub with_coverage: FfiScenarioResult,
    pub without_coverage: FfiScenarioResult,
    pub period: FfiPeriodResult,
    pub extra_units: i64,
    pub extra_gross_revenue: f64,
    pub extra_referral_revenue: f64,
    pub extra_net: f64,
    pub extra_period_net: f64,
    pub breakeven_locum_rate: Option<f64>,
    pub advisories: Vec<String>,
    /// Present until the disclaimer is acknowledged
    pub disclaimer: Option<String>,
}

impl From<ComparisonReport> for FfiComparisonReport {
    fn from(report: ComparisonReport) -> Self {
        let disclaimer = report.pending_disclaimer().map(str::to_string);
        Self {
            service_line: report.service_line,
            coverage_active: report.active == ScenarioKind::WithCoverage,
            with_coverage: report.with_coverage.into(),
            without_coverage: report.without_coverage.into(),
            period: report.period.into(),
            extra_units: report.delta.extra_units,
            extra_gross_revenue: report.delta.extra_gross_revenue,
            extra_referral_revenue: report.delta.extra_referral_revenue,
            extra_net: report.delta.extra_net,
            extra_period_net: report.delta.extra_period_net,
            breakeven_locum_rate: report.breakeven_locum_rate,
            advisories: report.advisories.iter().map(|a| a.message()).collect(),
            disclaimer,
        }
    }
}
