//! Flattened scenario export (single delimited row or JSON document).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{ComparisonReport, EvaluationRequest, PeriodResult, ScenarioResult, DISCLAIMER};

/// A single exported value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExportValue {
    Text(String),
    Integer(i64),
    Amount(f64),
    Flag(bool),
    Missing,
}

impl ExportValue {
    /// Render for a delimited row. Amounts are rounded to cents.
    pub fn render(&self) -> String {
        match self {
            ExportValue::Text(s) => escape_csv(s),
            ExportValue::Integer(n) => n.to_string(),
            ExportValue::Amount(x) => format!("{:.2}", x),
            ExportValue::Flag(b) => b.to_string(),
            ExportValue::Missing => String::new(),
        }
    }
}

impl From<f64> for ExportValue {
    fn from(x: f64) -> Self {
        ExportValue::Amount(x)
    }
}

impl From<Option<f64>> for ExportValue {
    fn from(x: Option<f64>) -> Self {
        x.map_or(ExportValue::Missing, ExportValue::Amount)
    }
}

impl From<u32> for ExportValue {
    fn from(n: u32) -> Self {
        ExportValue::Integer(i64::from(n))
    }
}

impl From<i64> for ExportValue {
    fn from(n: i64) -> Self {
        ExportValue::Integer(n)
    }
}

impl From<bool> for ExportValue {
    fn from(b: bool) -> Self {
        ExportValue::Flag(b)
    }
}

impl From<&str> for ExportValue {
    fn from(s: &str) -> Self {
        ExportValue::Text(s.to_string())
    }
}

/// One named field of the flattened report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportField {
    pub name: String,
    pub value: ExportValue,
}

/// Flatten a report to an ordered list of field name → value.
///
/// Order: identification, both per-shift scenarios (each followed by its
/// per-type referral breakdown), the active period, the alternate period,
/// the delta.
pub fn flatten(report: &ComparisonReport) -> Vec<ExportField> {
    let mut fields = Vec::new();
    let mut push = |name: &str, value: ExportValue| {
        fields.push(ExportField {
            name: name.to_string(),
            value,
        })
    };

    push("service_line", report.service_line.as_str().into());
    push("active_scenario", report.active.label().into());

    for (prefix, result) in [
        ("with_coverage", &report.with_coverage),
        ("without_coverage", &report.without_coverage),
    ] {
        for (name, value) in scenario_fields(result) {
            push(&format!("{}_{}", prefix, name), value);
        }
        for (name, value) in referral_fields(result) {
            push(&format!("{}_{}", prefix, name), value);
        }
    }

    for (prefix, period) in [
        ("period", &report.period),
        ("alternate_period", &report.alternate_period),
    ] {
        for (name, value) in period_fields(period) {
            push(&format!("{}_{}", prefix, name), value);
        }
    }

    push("extra_units", report.delta.extra_units.into());
    push("extra_gross_revenue", report.delta.extra_gross_revenue.into());
    push("extra_referral_revenue", report.delta.extra_referral_revenue.into());
    push("extra_net", report.delta.extra_net.into());
    push("extra_period_net", report.delta.extra_period_net.into());
    push("breakeven_locum_rate", report.breakeven_locum_rate.into());
    push("disclaimer_acknowledged", report.disclaimer_acknowledged.into());

    fields
}

fn scenario_fields(result: &ScenarioResult) -> Vec<(&'static str, ExportValue)> {
    vec![
        ("total_units", result.total_units.into()),
        ("staffed_pct", result.staffed_pct.into()),
        ("units_covered", result.units_covered.into()),
        ("units_missed", result.units_missed.into()),
        ("gross_revenue", result.gross_revenue.into()),
        ("operating_cost", result.operating_cost.into()),
        ("referral_revenue", result.referral_revenue.into()),
        ("variable_cost", result.variable_cost.into()),
        ("overhead_cost", result.overhead_cost.into()),
        ("staffing_cost", result.staffing_cost.into()),
        ("net_before_staffing_cost", result.net_before_staffing_cost.into()),
        ("net_after_staffing_cost", result.net_after_staffing_cost.into()),
        ("roi_pct", result.roi_pct.into()),
        ("referral_volume", result.referral_volume.into()),
        ("breakeven_staffing_cost", result.breakeven_staffing_cost.into()),
        ("missed_unit_margin", result.missed_unit_margin.into()),
    ]
}

/// Per-type referral fields, numbered from 1 in mix order.
fn referral_fields(result: &ScenarioResult) -> Vec<(String, ExportValue)> {
    let mut fields: Vec<(String, ExportValue)> = Vec::new();
    for (idx, contribution) in result.referral_breakdown.iter().enumerate() {
        let n = idx + 1;
        fields.push((format!("referral_{}_name", n), contribution.name.as_str().into()));
        fields.push((format!("referral_{}_share_pct", n), contribution.share_pct.into()));
        fields.push((format!("referral_{}_referrals", n), contribution.referrals.into()));
        fields.push((format!("referral_{}_unit_revenue", n), contribution.unit_revenue.into()));
        fields.push((format!("referral_{}_revenue", n), contribution.revenue.into()));
    }

    fields
}

fn period_fields(period: &PeriodResult) -> Vec<(&'static str, ExportValue)> {
    vec![
        ("days", period.period_days.into()),
        ("gross_revenue", period.gross_revenue.into()),
        ("referral_revenue", period.referral_revenue.into()),
        ("operating_cost", period.operating_cost.into()),
        ("net_before_staffing_cost", period.net_before_staffing_cost.into()),
        ("staffing_cost", period.staffing_cost.into()),
        ("staffing_cost_overridden", period.staffing_cost_overridden.into()),
        ("net", period.net.into()),
        ("missed_units", period.missed_units.into()),
        ("missed_opportunity", period.missed_opportunity.into()),
    ]
}

/// Export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Unique export ID
    pub export_id: String,
    /// Export timestamp
    pub exported_at: String,
    /// SHA-256 of the request's canonical JSON
    pub input_fingerprint: String,
    /// Disclaimer text
    pub disclaimer: String,
}

/// A flattened scenario export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioExport {
    pub metadata: ExportMetadata,
    pub fields: Vec<ExportField>,
}

impl ScenarioExport {
    /// Create an export from a request and the report computed from it.
    pub fn new(
        request: &EvaluationRequest,
        report: &ComparisonReport,
    ) -> Result<Self, serde_json::Error> {
        let canonical = request.to_canonical_json()?;
        Ok(Self {
            metadata: ExportMetadata {
                export_id: uuid::Uuid::new_v4().to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
                input_fingerprint: fingerprint(canonical.as_bytes()),
                disclaimer: DISCLAIMER.to_string(),
            },
            fields: flatten(report),
        })
    }

    /// Value of a field by name.
    pub fn field(&self, name: &str) -> Option<&ExportValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format (header + one row).
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        let header: Vec<String> = std::iter::once("export_id".to_string())
            .chain(self.fields.iter().map(|f| f.name.clone()))
            .chain(std::iter::once("input_fingerprint".to_string()))
            .collect();
        csv.push_str(&header.join(","));
        csv.push('\n');

        // Row
        let row: Vec<String> = std::iter::once(escape_csv(&self.metadata.export_id))
            .chain(self.fields.iter().map(|f| f.value.render()))
            .chain(std::iter::once(escape_csv(&self.metadata.input_fingerprint)))
            .collect();
        csv.push_str(&row.join(","));
        csv.push('\n');

        csv
    }
}

/// SHA-256 hex digest.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;
    use crate::models::{
        BaselineInputs, EvaluationOptions, LocumCoverage, ReferralType, ScenarioKind, ShiftRate,
    };

    fn make_request() -> EvaluationRequest {
        let mut coverage = LocumCoverage::none();
        coverage.count = 1;
        coverage.rate = ShiftRate::Flat { per_shift: 2500.0 };
        coverage.utilization_pct = 20.0;

        EvaluationRequest {
            service_line: "Radiology (DX, CT blend)".into(),
            baseline: BaselineInputs {
                total_units: 40.0,
                occupancy_pct: 50.0,
                unit_revenue: 150.0,
                unit_cost: 30.0,
                referral_rate: 0.12,
                default_referral_revenue: 600.0,
                referral_types: vec![ReferralType {
                    name: "Follow-up".into(),
                    share_pct: 100.0,
                    unit_revenue: None,
                }],
                safe_capacity: Some(50.0),
            },
            coverage,
            payer_mix: None,
            loadings: None,
            period_days: 260,
            active: ScenarioKind::WithCoverage,
            options: EvaluationOptions::default(),
        }
    }

    fn make_export() -> ScenarioExport {
        let request = make_request();
        let report = Evaluator::for_request(&request).compare(&request).unwrap();
        ScenarioExport::new(&request, &report).unwrap()
    }

    #[test]
    fn test_flatten_order() {
        let export = make_export();
        let names: Vec<&str> = export.fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names[0], "service_line");
        assert_eq!(names[1], "active_scenario");
        assert_eq!(names[2], "with_coverage_total_units");
        assert_eq!(names.last(), Some(&"disclaimer_acknowledged"));
        assert!(names.contains(&"period_staffing_cost"));
        assert!(names.contains(&"extra_net"));

        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(position("with_coverage_roi_pct") < position("with_coverage_referral_volume"));
        assert!(position("with_coverage_referral_1_revenue") < position("without_coverage_total_units"));
        assert!(position("period_missed_opportunity") < position("alternate_period_days"));
        assert!(position("alternate_period_missed_opportunity") < position("extra_units"));
    }

    #[test]
    fn test_flatten_includes_referral_detail_and_alternate_period() {
        let export = make_export();

        // 28 covered units x 0.12 referrals
        match export.field("with_coverage_referral_volume") {
            Some(ExportValue::Amount(x)) => assert!((x - 3.36).abs() < 1e-9),
            other => panic!("unexpected referral volume: {:?}", other),
        }
        assert!(matches!(
            export.field("with_coverage_breakeven_staffing_cost"),
            Some(ExportValue::Amount(_))
        ));
        assert!(matches!(
            export.field("without_coverage_missed_unit_margin"),
            Some(ExportValue::Amount(_))
        ));
        assert_eq!(
            export.field("with_coverage_referral_1_name"),
            Some(&ExportValue::Text("Follow-up".into()))
        );
        assert_eq!(
            export.field("with_coverage_referral_1_share_pct"),
            Some(&ExportValue::Amount(100.0))
        );
        assert!(export.field("with_coverage_referral_2_name").is_none());

        // Active period is with coverage, so the alternate is without
        assert_eq!(
            export.field("alternate_period_days"),
            Some(&ExportValue::Integer(260))
        );
        assert_eq!(
            export.field("alternate_period_staffing_cost"),
            Some(&ExportValue::Amount(0.0))
        );
        assert_eq!(
            export.field("alternate_period_missed_units"),
            Some(&ExportValue::Integer(20))
        );
    }

    #[test]
    fn test_field_lookup() {
        let export = make_export();
        assert_eq!(
            export.field("with_coverage_units_covered"),
            Some(&ExportValue::Integer(28))
        );
        assert_eq!(
            export.field("without_coverage_roi_pct"),
            Some(&ExportValue::Missing)
        );
        assert_eq!(
            export.field("active_scenario"),
            Some(&ExportValue::Text("with_coverage".into()))
        );
    }

    #[test]
    fn test_export_csv() {
        let export = make_export();
        let csv = export.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2); // Header + 1 row
        assert!(lines[0].starts_with("export_id,service_line,active_scenario"));
        // Service line contains a comma and must be quoted
        assert!(lines[1].contains("\"Radiology (DX, CT blend)\""));
        assert!(lines[1].contains(",2500.00,"));
    }

    #[test]
    fn test_export_json() {
        let export = make_export();
        let json = export.to_json().unwrap();
        assert!(json.contains("input_fingerprint"));
        assert!(json.contains("with_coverage_net_after_staffing_cost"));
    }

    #[test]
    fn test_fingerprint_stable_for_same_inputs() {
        let request = make_request();
        let report = Evaluator::for_request(&request).compare(&request).unwrap();
        let a = ScenarioExport::new(&request, &report).unwrap();
        let b = ScenarioExport::new(&request, &report).unwrap();

        assert_eq!(a.metadata.input_fingerprint, b.metadata.input_fingerprint);
        assert_ne!(a.metadata.export_id, b.metadata.export_id);
        assert_eq!(a.metadata.input_fingerprint.len(), 64);
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
