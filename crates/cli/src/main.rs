//! specidx CLI - spectral index computation from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::{Array1, Axis};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use specidx_algorithms::validate::missing_symbols;
use specidx_algorithms::{compute_index, compute_kernel, ComputeParams, Computed};
use specidx_core::{Bindings, Kernel, ProcessingMode, Registry, Value};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "specidx")]
#[command(author, version, about = "Spectral index computation", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Index catalogue (JSON) to use instead of the built-in one
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Worker threads for batch evaluation (0 = all cores)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available spectral indices
    List {
        /// Only indices of this application domain (vegetation, water, burn, ...)
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Show the definition of an index
    Describe {
        /// Index short name, e.g. NDVI
        index: String,
    },
    /// List band and constant symbols
    Symbols,
    /// Compute one or more indices
    Compute {
        /// Index short names
        #[arg(required = true)]
        indices: Vec<String>,
        /// Symbol binding, e.g. -p N=0.64 or -p N=0.64,0.52,0.31
        #[arg(short, long = "param", value_parser = parse_binding)]
        params: Vec<(String, Vec<f64>)>,
        /// Fill unbound constants with their default values
        #[arg(long)]
        defaults: bool,
        /// Print each index separately instead of one stacked result
        #[arg(long)]
        no_aggregate: bool,
        /// Name of the dimension indices are stacked along
        #[arg(long, default_value = "index")]
        axis: String,
    },
    /// Compute a kernel k(a, b): linear, poly or RBF
    Kernel {
        /// Kernel name
        kernel: String,
        /// Symbol binding, e.g. -p a=0.68 -p b=0.13 -p sigma=0.4
        #[arg(short, long = "param", value_parser = parse_binding)]
        params: Vec<(String, Vec<f64>)>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn load_registry(path: Option<&PathBuf>) -> Result<Registry> {
    match path {
        Some(path) => Registry::from_path(path)
            .with_context(|| format!("Failed to load index catalogue {}", path.display())),
        None => Registry::builtin().context("Failed to load built-in catalogue"),
    }
}

fn parse_binding(s: &str) -> Result<(String, Vec<f64>)> {
    let (symbol, values) = s
        .split_once('=')
        .with_context(|| format!("Binding must be 'SYMBOL=VALUE[,VALUE...]', got: {}", s))?;
    let values = values
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid value for {}: {}", symbol, v))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((symbol.trim().to_string(), values))
}

/// One value → scalar, several → 1-D array
fn to_bindings(params: Vec<(String, Vec<f64>)>) -> Bindings {
    params
        .into_iter()
        .map(|(symbol, values)| {
            let value = match values.as_slice() {
                [v] => Value::Scalar(*v),
                _ => Value::from(Array1::from(values)),
            };
            (symbol, value)
        })
        .collect()
}

fn print_value(label: &str, value: &Value) {
    match value {
        Value::Scalar(v) => println!("{} = {}", label, v),
        Value::Array(a) => println!("{} = {}", label, a),
        other => println!("{} = {:?}", label, other),
    }
}

/// Fail with every unbound symbol of every requested index at once
fn check_bindings(registry: &Registry, indices: &[String], bindings: &Bindings) -> Result<()> {
    let mut problems = Vec::new();
    for name in indices {
        let def = registry.index(name)?;
        let missing = missing_symbols(def.required_symbols(), bindings);
        if !missing.is_empty() {
            problems.push(format!("{} needs {}", name, missing.join(", ")));
        }
    }
    if !problems.is_empty() {
        bail!(
            "Missing parameters: {} (bind with -p SYMBOL=VALUE, or --defaults for constants)",
            problems.join("; ")
        );
    }
    Ok(())
}

fn done(elapsed: std::time::Duration) {
    info!("Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let registry = load_registry(cli.registry.as_ref())?;
    let mode = ProcessingMode::from_threads(cli.threads);

    match cli.command {
        // ── Catalogue ────────────────────────────────────────────────
        Commands::List { domain } => {
            let indices: Vec<_> = match &domain {
                Some(d) => registry.indices_in_domain(d).collect(),
                None => registry.indices().collect(),
            };
            for def in &indices {
                println!(
                    "{:<10} {:<12} {}",
                    def.short_name(),
                    def.application_domain(),
                    def.long_name()
                );
            }
            info!("{} indices", indices.len());
        }
        Commands::Describe { index } => {
            let def = registry.index(&index)?;
            println!("{}: {}", def.short_name(), def.long_name());
            println!("Formula: {}", def.formula());
            println!("Symbols: {}", def.required_symbols().join(", "));
            println!("Domain: {}", def.application_domain());
            if !def.platforms().is_empty() {
                println!("Platforms: {}", def.platforms().join(", "));
            }
            if !def.reference().is_empty() {
                println!("Reference: {}", def.reference());
            }
            if !def.contributor().is_empty() {
                println!("Added: {} by {}", def.date_of_addition(), def.contributor());
            }
        }
        Commands::Symbols => {
            println!("Bands:");
            for band in registry.bands() {
                println!(
                    "  {:<6} {} ({}-{} nm, center {:.1} nm)",
                    band.symbol,
                    band.long_name,
                    band.min_wavelength,
                    band.max_wavelength,
                    band.center_wavelength()
                );
            }
            println!("\nConstants:");
            for constant in registry.constants() {
                let default = constant
                    .default
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<6} {:<6} {}", constant.symbol, default, constant.description);
            }
        }

        // ── Computation ──────────────────────────────────────────────
        Commands::Compute {
            indices,
            params,
            defaults,
            no_aggregate,
            axis,
        } => {
            let mut bindings = to_bindings(params);
            if defaults {
                bindings.fill_defaults(&registry);
            }
            debug!("bound symbols: {:?}", bindings.symbols());
            check_bindings(&registry, &indices, &bindings)?;
            if mode.is_parallel() {
                debug!("evaluating indices with {:?}", mode);
            }

            // Scalars cannot be stacked; print them one by one
            let has_arrays = bindings.iter().any(|(_, v)| matches!(v, Value::Array(_)));
            let params = ComputeParams::new()
                .aggregate(!no_aggregate && has_arrays)
                .axis(axis)
                .mode(mode);

            let start = Instant::now();
            let result = compute_index(&registry, indices.clone(), &bindings, &params)
                .context("Index computation failed")?;
            done(start.elapsed());

            match result {
                Computed::List(values) => {
                    for (name, value) in indices.iter().zip(&values) {
                        print_value(name, value);
                    }
                }
                Computed::Single(Value::Array(stacked)) if indices.len() > 1 => {
                    for (name, row) in indices.iter().zip(stacked.axis_iter(Axis(0))) {
                        println!("{} = {}", name, row);
                    }
                }
                Computed::Single(value) => print_value(&indices.join(","), &value),
            }
        }
        Commands::Kernel { kernel, params } => {
            let kernel: Kernel = kernel.parse()?;
            let bindings = to_bindings(params);
            let value = compute_kernel(&registry, kernel, &bindings)
                .with_context(|| format!("{} kernel computation failed", kernel))?;
            print_value(&format!("k_{}", kernel), &value);
        }
    }

    Ok(())
}
