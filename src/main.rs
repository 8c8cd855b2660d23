//! Press Advisor - hydraulic press duty-cycle simulator and performance advisor
//!
//! # Usage
//!
//! ```bash
//! # Simulate the default press and print a phase summary
//! press-advisor simulate
//!
//! # Full time series as JSON for a 8 cm bore
//! press-advisor simulate --bore-cm 8 --format json
//!
//! # Energy per phase (simulates unless --data is given)
//! press-advisor energy --data cycle.json
//!
//! # Predict with coefficients from a model service
//! press-advisor --model-url http://models.local/press/coefficients predict
//!
//! # Ask for a 10% faster cycle
//! press-advisor suggest --cycle-time-pct -10
//!
//! # Write the default configuration
//! press-advisor config init press_config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `PRESS_CONFIG`: Path to press_config.toml
//! - `PRESS_MODEL_URL`: Remote coefficient endpoint (same as `--model-url`)
//! - `RUST_LOG`: Logging level (default: info). Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use press_advisor::config::{self, validation, PressConfig};
use press_advisor::ml_engine::{CacheState, PerformanceModel};
use press_advisor::simulation::{aggregate_energy_by_phase, CycleSimulator};
use press_advisor::types::{DataPoint, Goal, InputModel, Phase, SimulationOutput};
use press_advisor::SensitivityAdvisor;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "press-advisor")]
#[command(about = "Hydraulic press duty-cycle simulation and performance advisor")]
#[command(version)]
struct CliArgs {
    /// Path to press_config.toml (overrides PRESS_CONFIG and ./press_config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Remote coefficient endpoint
    #[arg(long, env = "PRESS_MODEL_URL", global = true)]
    model_url: Option<String>,

    /// Standardized model artifact (JSON) used when the remote source fails
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

/// Press configuration to evaluate.
#[derive(clap::Args, Debug, Clone)]
struct InputArgs {
    /// Read the whole input from a JSON file (camelCase fields); flags are ignored
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Cylinder bore (cm)
    #[arg(long, default_value_t = 6.5)]
    bore_cm: f64,

    /// Piston rod diameter (cm)
    #[arg(long, default_value_t = 3.0)]
    rod_cm: f64,

    /// Dead (tooling) load (metric tons)
    #[arg(long, default_value_t = 2.0)]
    dead_load_ton: f64,

    /// Holding (pressing) load (metric tons)
    #[arg(long, default_value_t = 8.0)]
    holding_load_ton: f64,

    /// Motor speed (rpm)
    #[arg(long, default_value_t = 1500.0)]
    motor_rpm: f64,

    /// Pump overall efficiency (0-1]
    #[arg(long, default_value_t = 0.9)]
    pump_efficiency: f64,

    /// Line and valve losses (bar)
    #[arg(long, default_value_t = 5.0)]
    system_loss_bar: f64,
}

impl InputArgs {
    fn resolve(&self) -> Result<InputModel> {
        if let Some(path) = &self.input {
            return read_json(path);
        }
        Ok(InputModel {
            bore_cm: self.bore_cm,
            rod_cm: self.rod_cm,
            dead_load_ton: self.dead_load_ton,
            holding_load_ton: self.holding_load_ton,
            motor_rpm: self.motor_rpm,
            pump_efficiency: self.pump_efficiency,
            system_loss_bar: self.system_loss_bar,
        })
    }
}

#[derive(clap::Args, Debug, Clone)]
struct GoalArgs {
    /// Requested cycle time change (%), negative for faster
    #[arg(long, allow_hyphen_values = true)]
    cycle_time_pct: Option<f64>,

    /// Requested max pressure change (%)
    #[arg(long, allow_hyphen_values = true)]
    pressure_pct: Option<f64>,

    /// Requested efficiency change (%)
    #[arg(long, allow_hyphen_values = true)]
    efficiency_pct: Option<f64>,
}

impl From<&GoalArgs> for Goal {
    fn from(args: &GoalArgs) -> Self {
        Self {
            target_cycle_time_pct: args.cycle_time_pct,
            target_max_pressure_pct: args.pressure_pct,
            target_efficiency_pct: args.efficiency_pct,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Simulate one duty cycle
    Simulate {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Energy per phase over a simulated or recorded series
    Energy {
        #[command(flatten)]
        input: InputArgs,
        /// JSON array of data points; simulates the input when omitted
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },

    /// Predict max pressure, efficiency and cycle time
    Predict {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Suggest parameter changes toward a goal
    Suggest {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        goal: GoalArgs,
    },

    /// Inspect or create press configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Validate a configuration file, reporting unknown keys and suspicious values
    Check {
        path: PathBuf,
    },
    /// Write the default configuration to a file
    Init {
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load config per search order, then apply CLI overrides.
fn load_config(args: &CliArgs) -> Result<PressConfig> {
    let mut cfg = match &args.config {
        Some(path) => PressConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PressConfig::load(),
    };
    if let Some(url) = &args.model_url {
        cfg.model_source.url = Some(url.clone());
    }
    if let Some(path) = &args.artifact {
        cfg.model_source.artifact_path = Some(path.clone());
    }
    Ok(cfg)
}

fn print_simulation_table(output: &SimulationOutput) {
    println!(
        "{:<10} {:>8} {:>10} {:>12} {:>12} {:>10} {:>10}",
        "phase", "samples", "time (s)", "p (bar)", "Q (L/min)", "hyd (kW)", "pump (kW)"
    );
    for phase in Phase::SEQUENCE {
        let points: Vec<&DataPoint> = output
            .data
            .iter()
            .filter(|p| p.phase == Some(phase) && (p.flow_lpm > 0.0 || p.pressure_bar > 0.0))
            .collect();
        let Some(first) = points.first() else { continue };
        println!(
            "{:<10} {:>8} {:>10.2} {:>12.2} {:>12.2} {:>10.2} {:>10.2}",
            phase.as_str(),
            points.len(),
            first.time_sec,
            first.pressure_bar,
            first.flow_lpm,
            first.hyd_power_kw,
            first.pump_power_kw
        );
    }
    let s = &output.sizing;
    println!();
    println!("cycle end          {:>10.2} s", output.end_time());
    println!("peak pressure      {:>10.2} bar", s.peak_pressure_bar);
    println!("relief setting     {:>10.2} bar", s.relief_setting_bar);
    println!("peak flow          {:>10.2} L/min", s.peak_flow_lpm);
    println!("pump displacement  {:>10.2} cc/rev", s.pump_displacement_cc);
    println!("peak pump power    {:>10.2} kW", s.peak_pump_power_kw);
    println!();
    for (i, step) in output.steps.iter().enumerate() {
        println!("{:>2}. {}", i + 1, step.formula);
        println!("    {}", step.calculation);
        println!("    = {}", step.result);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    // Config subcommands work on files directly
    if let Command::Config { action } = &args.command {
        return run_config(action, &args);
    }

    let cfg = load_config(&args)?;
    config::init(cfg);
    let cfg = config::get();

    match &args.command {
        Command::Simulate { input, format } => {
            let input = input.resolve()?;
            let output = CycleSimulator::with_config(&input, &cfg.simulation)
                .context("simulation rejected")?
                .run();
            match format {
                OutputFormat::Json => print_json(&output)?,
                OutputFormat::Text => print_simulation_table(&output),
            }
        }
        Command::Energy { input, data } => {
            let series: Vec<DataPoint> = match data {
                Some(path) => read_json(path)?,
                None => {
                    let input = input.resolve()?;
                    CycleSimulator::with_config(&input, &cfg.simulation)
                        .context("simulation rejected")?
                        .run()
                        .data
                }
            };
            print_json(&aggregate_energy_by_phase(&series))?;
        }
        Command::Predict { input } => {
            let input = input.resolve()?;
            let model = PerformanceModel::from_config(cfg);
            let prediction = model.predict(&input).await.context("prediction rejected")?;
            if let CacheState::Fallback(_) = model.cache().state() {
                warn!("Prediction uses embedded fallback coefficients");
            }
            print_json(&prediction)?;
        }
        Command::Suggest { input, goal } => {
            let input = input.resolve()?;
            let goal = Goal::from(goal);
            if goal.is_empty() {
                warn!("No goal given; pass --cycle-time-pct, --pressure-pct or --efficiency-pct");
            }
            let model = PerformanceModel::from_config(cfg);
            let advisor = SensitivityAdvisor::from_config(cfg);
            let suggestions = advisor
                .suggest_improvements(&model, &input, &goal)
                .await
                .context("suggestion rejected")?;
            info!(count = suggestions.len(), "Suggestions ready");
            print_json(&suggestions)?;
        }
        Command::Config { .. } => {}
    }

    Ok(())
}

fn run_config(action: &ConfigAction, args: &CliArgs) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let cfg = load_config(args)?;
            print!("{}", cfg.to_toml()?);
        }
        ConfigAction::Check { path } => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let cfg = PressConfig::load_from_file(path)
                .with_context(|| format!("validating {}", path.display()))?;
            let (errors, mut warnings) = validation::validate_physical_ranges(&cfg);
            warnings.extend(validation::validate_unknown_keys(&raw));
            for w in &warnings {
                println!("warning: {w}");
            }
            for e in &errors {
                println!("error: {e}");
            }
            if !errors.is_empty() {
                anyhow::bail!("{} has {} error(s)", path.display(), errors.len());
            }
            println!("{}: ok ({} warning(s))", path.display(), warnings.len());
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            PressConfig::default().save_to_file(path)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
