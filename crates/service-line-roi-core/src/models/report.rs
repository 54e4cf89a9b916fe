//! Comparison report for the with/without coverage pair.

use serde::{Deserialize, Serialize};

use super::results::{Advisory, PeriodResult, ScenarioDelta, ScenarioKind, ScenarioResult};

/// Disclaimer shown with every set of estimates.
pub const DISCLAIMER: &str = "All figures are illustrative estimates based on the assumptions \
entered. They are not accounting, billing, or financial advice and should be validated \
against actual service-line data before use.";

/// Both scenarios, the active scenario's period result, and their delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonReport {
    pub service_line: String,
    /// Scenario the period result and delta are reported for
    pub active: ScenarioKind,
    pub with_coverage: ScenarioResult,
    pub without_coverage: ScenarioResult,
    /// Active scenario scaled to the period
    pub period: PeriodResult,
    /// Alternate scenario scaled to the period (never overridden)
    pub alternate_period: PeriodResult,
    /// Active minus alternate
    pub delta: ScenarioDelta,
    /// Per-locum shift rate at which coverage breaks even
    pub breakeven_locum_rate: Option<f64>,
    /// All advisories raised while building the report
    pub advisories: Vec<Advisory>,
    pub disclaimer_acknowledged: bool,
}

impl ComparisonReport {
    /// Result for the given scenario.
    pub fn scenario(&self, kind: ScenarioKind) -> &ScenarioResult {
        match kind {
            ScenarioKind::WithCoverage => &self.with_coverage,
            ScenarioKind::WithoutCoverage => &self.without_coverage,
        }
    }

    /// Result for the active scenario.
    pub fn active_result(&self) -> &ScenarioResult {
        self.scenario(self.active)
    }

    /// Disclaimer text while it is still unacknowledged.
    pub fn pending_disclaimer(&self) -> Option<&'static str> {
        (!self.disclaimer_acknowledged).then_some(DISCLAIMER)
    }
}
