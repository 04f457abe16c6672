//! semdiag CLI: inspect and reload diagram layouts.
//!
//! Usage:
//!   semdiag inspect <layout.json> [--config path]
//!   semdiag roundtrip --data <dataset.yaml> <layout.json> [--config path]

use clap::{Parser, Subcommand};
use semdiag::{Dataset, DiagramModel, LayoutData, MemoryProvider, ModelConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "semdiag", version, about = "Semantic diagram model toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to a YAML model configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a layout file
    Inspect {
        /// Layout file in JSON
        layout: PathBuf,
    },
    /// Import a layout against a dataset and print the exported result
    Roundtrip {
        /// Dataset file in YAML
        #[arg(long)]
        data: PathBuf,
        /// Layout file in JSON
        layout: PathBuf,
    },
}

fn read_layout(path: &Path) -> Result<LayoutData, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    LayoutData::from_json(&text).map_err(|e| format!("invalid layout '{}': {}", path.display(), e))
}

fn load_config(path: Option<PathBuf>) -> Result<ModelConfig, String> {
    match path {
        Some(path) => ModelConfig::from_path(&path)
            .map_err(|e| format!("invalid config '{}': {}", path.display(), e)),
        None => Ok(ModelConfig::default()),
    }
}

fn cmd_inspect(path: &Path) -> i32 {
    let layout = match read_layout(path) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("{:<24}  {:>7}", "CELLS", "COUNT");
    println!("{}", "-".repeat(33));
    println!("{:<24}  {:>7}", "nodes", layout.nodes.len());
    println!("{:<24}  {:>7}", "relationships", layout.relationships.len());
    println!("{:<24}  {:>7}", "type overrides", layout.relationship_type_options.len());
    for options in &layout.relationship_type_options {
        println!(
            "  {} visible={} show_label={}",
            options.type_id, options.visible, options.show_label
        );
    }
    0
}

async fn cmd_roundtrip(config: ModelConfig, data: &Path, path: &Path) -> i32 {
    let dataset = match std::fs::read_to_string(data)
        .map_err(|e| e.to_string())
        .and_then(|text| Dataset::from_yaml_str(&text).map_err(|e| e.to_string()))
    {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("Error: cannot load dataset '{}': {}", data.display(), e);
            return 1;
        }
    };
    let layout = match read_layout(path) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let model = DiagramModel::with_config(Arc::new(MemoryProvider::new(dataset)), config);
    if let Err(e) = model.import_layout(layout).await {
        eprintln!("Error: import failed: {}", e);
        return 1;
    }
    model.wait_for_loading().await;

    match model.export_layout().to_json_pretty() {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Inspect { layout } => cmd_inspect(&layout),
        Commands::Roundtrip { data, layout } => {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("Error: cannot start runtime: {}", e);
                    std::process::exit(1);
                }
            };
            runtime.block_on(cmd_roundtrip(config, &data, &layout))
        }
    };
    std::process::exit(code);
}
