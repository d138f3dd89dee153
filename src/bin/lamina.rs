//! Lamina CLI: semantic document fragmentation.
//!
//! Usage:
//!   lamina run <input> [--config path] [--active-schemas a,b] [--mock] ...
//!   lamina schemas

use clap::{Args, Parser, Subcommand};
use lamina::{
    default_config_path, parse_active_set, Classifier, ConfigFile, Document, HeuristicClassifier,
    LaminaError, Pipeline, RemoteClassifier, SchemaId, Settings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "lamina",
    version,
    about = "Semantic document fragmentation engine"
)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fragment a document into a content-addressed run directory
    Run(RunArgs),
    /// List the schema registry
    Schemas,
}

#[derive(Args)]
struct RunArgs {
    /// Input document (.txt, .md, .rst or plain text)
    input: PathBuf,
    /// Config file, YAML or JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated schema names replacing the active set
    #[arg(long, value_delimiter = ',')]
    active_schemas: Option<Vec<String>>,
    /// Parent directory for run directories
    #[arg(long)]
    out: Option<PathBuf>,
    /// Chat model name
    #[arg(long)]
    model: Option<String>,
    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f64>,
    /// Completion token cap per window
    #[arg(long)]
    max_tokens: Option<u32>,
    /// Window length in characters
    #[arg(long)]
    window_chars: Option<usize>,
    /// Overlap between consecutive windows in characters
    #[arg(long)]
    overlap_chars: Option<usize>,
    /// Classify offline with the built-in heuristics
    #[arg(long)]
    mock: bool,
}

fn resolve_settings(args: &RunArgs) -> Result<Settings, String> {
    let mut settings = Settings::default();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path().filter(|path| path.exists()));
    if let Some(path) = config_path {
        let file = ConfigFile::load(&path).map_err(|e| e.to_string())?;
        tracing::debug!(path = %path.display(), "applying config file");
        file.apply(&mut settings);
    }

    if let Some(names) = &args.active_schemas {
        settings.active_schemas = parse_active_set(names);
    }
    if let Some(out) = &args.out {
        settings.out_dir = out.clone();
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        settings.temperature = temperature;
    }
    if let Some(max_tokens) = args.max_tokens {
        settings.max_tokens = max_tokens;
    }
    if let Some(window_chars) = args.window_chars {
        settings.window_chars = window_chars;
    }
    if let Some(overlap_chars) = args.overlap_chars {
        settings.overlap_chars = overlap_chars;
    }
    settings.mock = args.mock;

    settings.validate().map_err(|e| e.to_string())?;
    Ok(settings)
}

fn cmd_run(args: RunArgs) -> i32 {
    let settings = match resolve_settings(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let document = match Document::load(&args.input) {
        Ok(d) => d,
        Err(e) => {
            let e = LaminaError::from(e);
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };

    let classifier: Arc<dyn Classifier> = if settings.mock {
        Arc::new(HeuristicClassifier::new())
    } else {
        match RemoteClassifier::from_env(
            settings.model.as_str(),
            settings.temperature,
            settings.max_tokens,
        ) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {}", e);
            return 3;
        }
    };

    let pipeline = Pipeline::new(settings, classifier);
    match runtime.block_on(pipeline.run(&args.input, &document)) {
        Ok(outcome) => {
            println!(
                "[OK] saved {} fragments to {}",
                outcome.fragments,
                outcome.run_dir.display()
            );
            if outcome.recovered_errors > 0 {
                println!(
                    "     {} recovered errors, see {}",
                    outcome.recovered_errors,
                    outcome.run_dir.join("errors.log").display()
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn cmd_schemas() -> i32 {
    println!("{:<28}  {}", "SCHEMA", "DISPLAY NAME");
    println!("{}", "-".repeat(58));
    for schema in SchemaId::ALL {
        println!("{:<28}  {}", schema.as_str(), schema.display_name());
    }
    0
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Schemas => cmd_schemas(),
    };
    std::process::exit(code);
}
