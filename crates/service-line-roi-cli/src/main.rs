//! Command-line staffing ROI report.
//!
//! Builds an evaluation request from a service-line preset (or a saved
//! request file), compares the with- and without-coverage scenarios, and
//! prints a summary, the JSON export, or the CSV export.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use service_line_roi_core::evaluator::{Evaluator, ZeroSumPolicy};
use service_line_roi_core::export::ScenarioExport;
use service_line_roi_core::models::{
    ComparisonReport, CostLoadings, EvaluationRequest, PayerMix, ScenarioKind, Sensitivity,
};
use service_line_roi_presets::{PresetStore, VolumeScenario, DEFAULT_CONFIG_PATH};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "roi-report")]
#[command(about = "Compare service-line staffing scenarios with and without locum coverage")]
#[command(version)]
struct Args {
    /// Preset catalog (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List available service lines and exit
    #[arg(long)]
    list: bool,

    /// Service line key or name (defaults to the first preset)
    #[arg(short, long)]
    service_line: Option<String>,

    /// Load a saved request instead of a preset
    #[arg(long, conflicts_with = "service_line")]
    request: Option<PathBuf>,

    /// Write the effective request to a file
    #[arg(long)]
    save_request: Option<PathBuf>,

    /// Volume scenario applied to the preset's capacity
    #[arg(long, value_enum, default_value_t = VolumeArg::Base)]
    volume: VolumeArg,

    /// Analysis period in days
    #[arg(short, long)]
    days: Option<u32>,

    /// Locums per shift
    #[arg(long)]
    locums: Option<u32>,

    /// Exact staffing spend for the whole period
    #[arg(long)]
    exact_total: Option<f64>,

    /// Report the without-coverage scenario as the period result
    #[arg(long)]
    without_coverage: bool,

    /// Blend unit revenue with the standard Medicare/Commercial/Medicaid mix
    #[arg(long)]
    payer_mix: bool,

    /// Overhead percentage applied to direct revenue
    #[arg(long)]
    overhead_pct: Option<f64>,

    /// Raise one input by 10% after all other overrides
    #[arg(long, value_enum)]
    sensitivity: Option<SensitivityArg>,

    /// Keep mixes that do not sum to 100 as entered
    #[arg(long)]
    no_auto_normalize: bool,

    /// Flag zero-sum mixes instead of splitting them evenly
    #[arg(long)]
    reject_zero_sum: bool,

    /// Acknowledge that figures are illustrative estimates
    #[arg(long)]
    acknowledge: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VolumeArg {
    Conservative,
    Base,
    Stretch,
}

impl From<VolumeArg> for VolumeScenario {
    fn from(arg: VolumeArg) -> Self {
        match arg {
            VolumeArg::Conservative => VolumeScenario::Conservative,
            VolumeArg::Base => VolumeScenario::Base,
            VolumeArg::Stretch => VolumeScenario::Stretch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SensitivityArg {
    Volume,
    LocumRate,
    CommercialFactor,
}

impl From<SensitivityArg> for Sensitivity {
    fn from(arg: SensitivityArg) -> Self {
        match arg {
            SensitivityArg::Volume => Sensitivity::Volume,
            SensitivityArg::LocumRate => Sensitivity::LocumRate,
            SensitivityArg::CommercialFactor => Sensitivity::CommercialFactor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
    Csv,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = preset_store(args.config.as_deref());

    if args.list {
        for preset in &store.get().service_lines {
            println!("{:<24} {}", preset.key, preset.display_name);
        }
        return Ok(());
    }

    let request = build_request(&args, &store)?;

    if let Some(path) = &args.save_request {
        let json = serde_json::to_string_pretty(&request).context("Failed to serialize request")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write request to {}", path.display()))?;
        info!(path = %path.display(), "saved request");
    }

    let report = Evaluator::for_request(&request)
        .compare(&request)
        .context("Evaluation rejected")?;

    let output = match args.format {
        OutputFormat::Summary => render_summary(&report),
        OutputFormat::Json => ScenarioExport::new(&request, &report)
            .and_then(|export| export.to_json())
            .context("Failed to export JSON")?,
        OutputFormat::Csv => ScenarioExport::new(&request, &report)
            .context("Failed to build export")?
            .to_csv(),
    };
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}

/// Use the given catalog, else the conventional file if present, else the built-in preset.
fn preset_store(config: Option<&Path>) -> PresetStore {
    match config {
        Some(path) => PresetStore::new(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => PresetStore::new(DEFAULT_CONFIG_PATH),
        None => PresetStore::builtin(),
    }
}

fn build_request(args: &Args, store: &PresetStore) -> Result<EvaluationRequest> {
    let mut request = match &args.request {
        Some(path) => load_request(path)?,
        None => {
            let catalog = store.get();
            let preset = match &args.service_line {
                Some(query) => match catalog.find(query) {
                    Some(preset) => preset,
                    None => {
                        let known: Vec<&str> = catalog.keys().collect();
                        bail!(
                            "Unknown service line '{}' (available: {})",
                            query,
                            known.join(", ")
                        );
                    }
                },
                None => catalog
                    .default_preset()
                    .context("Preset catalog is empty")?,
            };
            debug!(key = %preset.key, "selected preset");
            preset.to_request(args.volume.into())
        }
    };

    apply_overrides(args, &mut request);
    if let Some(arg) = args.sensitivity {
        let sensitivity = Sensitivity::from(arg);
        info!(sensitivity = sensitivity.label(), "applying sensitivity");
        request = request.with_sensitivity(sensitivity);
    }
    Ok(request)
}

fn load_request(path: &Path) -> Result<EvaluationRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request in {}", path.display()))
}

fn apply_overrides(args: &Args, request: &mut EvaluationRequest) {
    if let Some(days) = args.days {
        request.period_days = days;
    }
    if let Some(count) = args.locums {
        request.coverage.count = count;
    }
    if let Some(total) = args.exact_total {
        request.options.use_exact_total_override = true;
        request.options.exact_total_value = total;
    }
    if args.without_coverage {
        request.active = ScenarioKind::WithoutCoverage;
    }
    if args.payer_mix {
        request.payer_mix = Some(PayerMix::standard());
    }
    if let Some(overhead_pct) = args.overhead_pct {
        let loadings = request.loadings.get_or_insert_with(CostLoadings::default);
        loadings.overhead_pct = overhead_pct;
    }
    if args.no_auto_normalize {
        request.options.auto_normalize = false;
    }
    if args.reject_zero_sum {
        request.options.zero_sum_policy = ZeroSumPolicy::Reject;
    }
    if args.acknowledge {
        request.options.acknowledge_disclaimer = true;
    }
}

/// Plain-text report of the comparison.
fn render_summary(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let active = report.active_result();

    let _ = writeln!(out, "Service line: {}", report.service_line);
    let _ = writeln!(out, "Active scenario: {}", report.active.label());
    let _ = writeln!(out);

    for kind in [ScenarioKind::WithCoverage, ScenarioKind::WithoutCoverage] {
        let result = report.scenario(kind);
        let _ = writeln!(out, "[{}]", kind.label());
        let _ = writeln!(
            out,
            "  units covered     {} of {} ({:.1}%)",
            result.units_covered, result.total_units, result.staffed_pct
        );
        let _ = writeln!(out, "  gross revenue     {:>14.2}", result.gross_revenue);
        let _ = writeln!(out, "  referral revenue  {:>14.2}", result.referral_revenue);
        let _ = writeln!(out, "  total revenue     {:>14.2}", result.total_revenue());
        let _ = writeln!(out, "  operating cost    {:>14.2}", result.operating_cost);
        let _ = writeln!(out, "  staffing cost     {:>14.2}", result.staffing_cost);
        let _ = writeln!(out, "  total cost        {:>14.2}", result.total_cost());
        let _ = writeln!(out, "  net per shift     {:>14.2}", result.net_after_staffing_cost);
        if let Some(roi) = result.roi_pct {
            let _ = writeln!(out, "  ROI               {:>13.1}%", roi);
        }
    }

    let period = &report.period;
    let _ = writeln!(out);
    let _ = writeln!(out, "[period: {} days, {}]", period.period_days, report.active.label());
    let _ = writeln!(out, "  net before staffing {:>14.2}", period.net_before_staffing_cost);
    let _ = writeln!(
        out,
        "  staffing cost       {:>14.2}{}",
        period.staffing_cost,
        if period.staffing_cost_overridden { " (exact total)" } else { "" }
    );
    let _ = writeln!(out, "  net                 {:>14.2}", period.net);
    if active.units_missed > 0 {
        let _ = writeln!(
            out,
            "  missed opportunity  {:>14.2} ({} units/shift)",
            period.missed_opportunity, period.missed_units
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[delta: {} minus {}]", report.active.label(), report.active.alternate().label());
    let _ = writeln!(out, "  extra units         {:>14}", report.delta.extra_units);
    let _ = writeln!(out, "  extra net / shift   {:>14.2}", report.delta.extra_net);
    let _ = writeln!(out, "  extra net / period  {:>14.2}", report.delta.extra_period_net);
    if let Some(rate) = report.breakeven_locum_rate {
        let _ = writeln!(out, "  breakeven locum rate {:>13.2} per shift", rate);
    }

    if !report.advisories.is_empty() {
        let _ = writeln!(out);
        for advisory in &report.advisories {
            let _ = writeln!(out, "! {}", advisory.message());
        }
    }

    out
}
