//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads the model (a startup gate: nothing runs without it)
//! - hands the model to the chosen front-end

use clap::Parser;
use tracing::info;

use crate::cli::{Command, InputArgs, PredictArgs};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{Predictor, load_default_model};

pub mod pipeline;

/// Entry point for the `solar` binary.
pub fn run() -> Result<(), AppError> {
    // `solar` and `solar --temperature 30` behave like `solar tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let config = AppConfig::from_env();
    if let Err(err) = crate::logging::init(&config) {
        eprintln!("warning: {err}");
    }

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Predict(args) => handle_predict(args),
        Command::Inputs(args) => handle_inputs(args),
    }
}

fn handle_tui(args: InputArgs) -> Result<(), AppError> {
    // Validate flags before touching the model or the terminal.
    let inputs = args.to_inputs()?;
    let model = load_default_model()?;
    info!(model = %model.describe(), "starting interactive form");
    crate::tui::run(&model, inputs)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let inputs = args.inputs.to_inputs()?;
    let model = load_default_model()?;

    if args.show_features {
        let features = pipeline::assemble_features(&inputs);
        print!("{}", crate::report::format_feature_vector(&features));
    }

    let kw = pipeline::predict(&model, &inputs)?;
    println!("{}", crate::report::format_prediction(kw));
    Ok(())
}

fn handle_inputs(args: InputArgs) -> Result<(), AppError> {
    let inputs = args.to_inputs()?;
    print!("{}", crate::report::format_input_table(&inputs));
    Ok(())
}

/// Rewrite argv so `solar` defaults to `solar tui`.
///
/// Rules:
/// - `solar`                       -> `solar tui`
/// - `solar --humidity 60 ...`     -> `solar tui --humidity 60 ...`
/// - `solar --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "predict" | "inputs");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is and let clap report it.
    argv
}
