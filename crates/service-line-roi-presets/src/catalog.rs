//! Service-line presets and the catalog that holds them.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use service_line_roi_core::models::{
    BaselineInputs, CostLoadings, EvaluationOptions, EvaluationRequest, LocumCoverage,
    ReferralType, ScenarioKind, ShiftAddons, ShiftRate, TravelBasis,
};

/// Minimum Jaro-Winkler similarity for a fuzzy preset lookup.
const FUZZY_MATCH_THRESHOLD: f64 = 0.85;

/// Analysis period used when a preset is turned into a request.
pub const DEFAULT_PERIOD_DAYS: u32 = 365;

/// Volume multiplier applied to a preset's capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolumeScenario {
    Conservative,
    #[default]
    Base,
    Stretch,
}

impl VolumeScenario {
    pub fn multiplier(self) -> f64 {
        match self {
            VolumeScenario::Conservative => 0.90,
            VolumeScenario::Base => 1.00,
            VolumeScenario::Stretch => 1.10,
        }
    }

    /// Scale a unit count, rounded to two decimals.
    pub fn scale(self, units: f64) -> f64 {
        (units * self.multiplier() * 100.0).round_ties_even() / 100.0
    }
}

/// Baseline defaults of a preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetDefaults {
    /// Capacity in the preset's own unit (beds, studies, cases)
    pub total_units: f64,
    /// Staffed percentage without locums
    #[serde(default)]
    pub occupancy_pct: f64,
    /// Direct revenue per unit
    #[serde(alias = "unit_rev")]
    pub unit_revenue: f64,
    /// Direct cost per unit
    #[serde(default)]
    pub unit_cost: f64,
    /// Referrals generated per covered unit
    #[serde(default)]
    pub referrals_per_unit: f64,
    /// Safe staffed volume, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_capacity: Option<f64>,
}

/// One referral type of a preset's partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralTypePreset {
    pub name: String,
    /// Share of referrals, in percent
    pub pct: f64,
    /// Revenue per referral of this type (falls back to the preset default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_rev: Option<f64>,
}

/// Referral section of a preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferralPreset {
    /// Default revenue per referral
    #[serde(default)]
    pub revenue_per_referral: f64,
    #[serde(default)]
    pub types: Vec<ReferralTypePreset>,
}

/// Locum section of a preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocumPreset {
    /// Whether coverage is the active scenario by default
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_locum_count")]
    pub default_count: u32,
    #[serde(default)]
    pub utilization_pct: f64,
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub hours_per_shift: f64,
    /// Flat per-shift rate; replaces hourly x hours when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_rate_per_shift: Option<f64>,
    /// Travel and lodging per locum per day
    #[serde(default)]
    pub travel_per_day: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_amortization_shifts: Option<u32>,
    #[serde(default)]
    pub travel_basis: TravelBasis,
}

fn default_locum_count() -> u32 {
    1
}

impl Default for LocumPreset {
    fn default() -> Self {
        Self {
            enabled: false,
            default_count: default_locum_count(),
            utilization_pct: 0.0,
            hourly_rate: 0.0,
            hours_per_shift: 0.0,
            flat_rate_per_shift: None,
            travel_per_day: 0.0,
            travel_amortization_shifts: None,
            travel_basis: TravelBasis::default(),
        }
    }
}

impl LocumPreset {
    fn shift_rate(&self) -> ShiftRate {
        match self.flat_rate_per_shift {
            Some(per_shift) => ShiftRate::Flat { per_shift },
            None => ShiftRate::Hourly {
                hourly_rate: self.hourly_rate,
                hours_per_shift: self.hours_per_shift,
            },
        }
    }
}

fn default_capacity_label() -> String {
    "Units".to_string()
}

/// A service-line preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceLinePreset {
    /// Stable lookup key
    pub key: String,
    /// Name shown to users and carried into reports
    pub display_name: String,
    /// Label for the capacity unit
    #[serde(default = "default_capacity_label")]
    pub capacity_label: String,
    #[serde(alias = "default")]
    pub defaults: PresetDefaults,
    #[serde(default)]
    pub referrals: ReferralPreset,
    #[serde(default)]
    pub locum: LocumPreset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadings: Option<CostLoadings>,
}

impl ServiceLinePreset {
    /// Build an evaluation request from this preset's defaults.
    ///
    /// Options start at their defaults; the caller adjusts period, flags and
    /// active scenario before evaluating.
    pub fn to_request(&self, volume: VolumeScenario) -> EvaluationRequest {
        let referral_types = self
            .referrals
            .types
            .iter()
            .map(|t| ReferralType {
                name: t.name.clone(),
                share_pct: t.pct,
                unit_revenue: t.unit_rev,
            })
            .collect();

        let coverage = LocumCoverage {
            count: self.locum.default_count,
            rate: self.locum.shift_rate(),
            travel_per_locum: self.locum.travel_per_day,
            travel_amortization_shifts: self.locum.travel_amortization_shifts,
            travel_basis: self.locum.travel_basis,
            utilization_pct: self.locum.utilization_pct,
            addons: ShiftAddons::default(),
        };

        EvaluationRequest {
            service_line: self.display_name.clone(),
            baseline: BaselineInputs {
                total_units: volume.scale(self.defaults.total_units),
                occupancy_pct: self.defaults.occupancy_pct,
                unit_revenue: self.defaults.unit_revenue,
                unit_cost: self.defaults.unit_cost,
                referral_rate: self.defaults.referrals_per_unit,
                default_referral_revenue: self.referrals.revenue_per_referral,
                referral_types,
                safe_capacity: self.defaults.safe_capacity,
            },
            coverage,
            payer_mix: None,
            loadings: self.loadings,
            period_days: DEFAULT_PERIOD_DAYS,
            active: if self.locum.enabled {
                ScenarioKind::WithCoverage
            } else {
                ScenarioKind::WithoutCoverage
            },
            options: EvaluationOptions::default(),
        }
    }
}

/// An ordered collection of presets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetCatalog {
    #[serde(default)]
    pub service_lines: Vec<ServiceLinePreset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PresetCatalog {
    /// The built-in catalog: a single daytime hospitalist preset.
    pub fn builtin() -> Self {
        let referral = |name: &str, pct: f64, unit_rev: f64| ReferralTypePreset {
            name: name.to_string(),
            pct,
            unit_rev: Some(unit_rev),
        };

        Self {
            service_lines: vec![ServiceLinePreset {
                key: "hospitalist_med_surg".into(),
                display_name: "Daytime Hospitalist (Med-Surg only)".into(),
                capacity_label: "Beds".into(),
                defaults: PresetDefaults {
                    total_units: 18.0,
                    occupancy_pct: 75.0,
                    unit_revenue: 2750.0,
                    unit_cost: 1850.0,
                    referrals_per_unit: 1.2,
                    safe_capacity: None,
                },
                referrals: ReferralPreset {
                    revenue_per_referral: 900.0,
                    types: vec![
                        referral("Cardiology", 30.0, 500.0),
                        referral("GI", 25.0, 1200.0),
                        referral("Surgery", 25.0, 3000.0),
                        referral("Imaging/Diagnostics", 20.0, 800.0),
                    ],
                },
                locum: LocumPreset {
                    enabled: true,
                    default_count: 1,
                    utilization_pct: 80.0,
                    hourly_rate: 265.0,
                    hours_per_shift: 10.0,
                    travel_per_day: 390.0,
                    ..LocumPreset::default()
                },
                loadings: None,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.service_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.service_lines.is_empty()
    }

    /// The first preset, used when nothing was selected.
    pub fn default_preset(&self) -> Option<&ServiceLinePreset> {
        self.service_lines.first()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.service_lines.iter().map(|p| p.key.as_str())
    }

    /// Look up a preset by key, display name, or close spelling.
    pub fn find(&self, query: &str) -> Option<&ServiceLinePreset> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        // Step 1: Exact key
        if let Some(preset) = self.service_lines.iter().find(|p| p.key == query) {
            return Some(preset);
        }

        // Step 2: Display name, case-insensitive
        if let Some(preset) = self
            .service_lines
            .iter()
            .find(|p| p.display_name.eq_ignore_ascii_case(query))
        {
            return Some(preset);
        }

        // Step 3: Closest key or display name
        let needle = query.to_lowercase();
        self.service_lines
            .iter()
            .map(|p| {
                let by_key = jaro_winkler(&needle, &p.key.to_lowercase());
                let by_name = jaro_winkler(&needle, &p.display_name.to_lowercase());
                (p, by_key.max(by_name))
            })
            .filter(|(_, score)| *score > FUZZY_MATCH_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(p, _)| p)
    }
}
