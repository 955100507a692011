use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use veffgen::diagnostic::render_diagnostics;
use veffgen::pipeline::build_symbol_table;
use veffgen::translate::translate;
use veffgen::{GenerateConfig, Pipeline};

#[derive(Parser)]
#[command(
    name = "veffgen",
    version,
    about = "Effective-potential code generator — algebra in, evaluators out."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the numeric package and IR snapshot from a manifest
    Generate {
        /// Path to the generation manifest (veffgen.json)
        manifest: PathBuf,
        /// Print per-family progress
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate all inputs without writing any output
    Check {
        /// Path to the generation manifest (veffgen.json)
        manifest: PathBuf,
        /// Print per-family progress
        #[arg(short, long)]
        verbose: bool,
    },
    /// Translate one expression line and print its IR record
    Translate {
        /// Expression in external notation, e.g. 'x -> Sqrt[λ] / (4 * Pi)'
        expression: String,
        /// JSON symbol list; enables positional params[i] substitution
        #[arg(long, value_name = "PATH")]
        symbols: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate { manifest, verbose } => cmd_generate(&manifest, verbose),
        Command::Check { manifest, verbose } => cmd_check(&manifest, verbose),
        Command::Translate {
            expression,
            symbols,
        } => cmd_translate(&expression, symbols.as_deref()),
    };

    if let Err(message) = result {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn cmd_generate(manifest: &std::path::Path, verbose: bool) -> Result<(), String> {
    let config = GenerateConfig::load(manifest)?;
    let prepared = Pipeline::new(config, verbose).run()?;
    println!("generated {} files", prepared.artifacts.len());
    Ok(())
}

fn cmd_check(manifest: &std::path::Path, verbose: bool) -> Result<(), String> {
    let config = GenerateConfig::load(manifest)?;
    let prepared = Pipeline::new(config, verbose).check()?;
    println!("ok: {} files would be generated", prepared.artifacts.len());
    Ok(())
}

fn cmd_translate(expression: &str, symbols: Option<&std::path::Path>) -> Result<(), String> {
    let table = match symbols {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
            let names: Vec<String> = serde_json::from_str(&content)
                .map_err(|e| format!("invalid JSON in '{}': {}", path.display(), e))?;
            Some(build_symbol_table(names)?)
        }
        None => None,
    };

    match translate(expression, 0, table.as_ref()) {
        Ok(parsed) => {
            let json = serde_json::to_string_pretty(&parsed)
                .map_err(|e| format!("cannot serialize record: {}", e))?;
            println!("{}", json);
            Ok(())
        }
        Err(diagnostics) => {
            render_diagnostics(&diagnostics, "<expression>", expression);
            Err("translation failed".to_string())
        }
    }
}
