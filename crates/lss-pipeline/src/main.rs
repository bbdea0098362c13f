//! `synthesize` CLI: runs one layout-constraint synthesis from a JSON input
//! file and writes (or prints) the resulting constraint set.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use lss_io::{InputFormat, InstantiationMethod, LearningMethodOption, NumericType, PruningMethod, SynthesisOptions};

#[derive(Parser, Debug)]
#[command(name = "lss", about = "Layout constraint synthesizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the synthesis pipeline on a JSON input file.
    Synthesize(SynthesizeArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum InputFormatArg {
    Default,
    Bench,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum NumericTypeArg {
    N,
    R,
    Q,
    Z,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum InstantiationMethodArg {
    Numpy,
    Prolog,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LearningMethodArg {
    Simple,
    Heuristic,
    Noisetolerant,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PruningMethodArg {
    Baseline,
    Hierarchical,
}

#[derive(clap::Args, Debug)]
struct SynthesizeArgs {
    /// Path to the JSON input document.
    #[arg(long = "input-file", short = 'i')]
    input_file: PathBuf,
    /// Input document shape.
    #[arg(long = "input-format", value_enum, default_value_t = InputFormatArg::Default)]
    input_format: InputFormatArg,
    /// Canonical numeric type for rect coordinates.
    #[arg(long = "numeric-type", value_enum, default_value_t = NumericTypeArg::R)]
    numeric_type: NumericTypeArg,
    /// Template enumerator flavor.
    #[arg(long = "instantiation-method", value_enum, default_value_t = InstantiationMethodArg::Numpy)]
    instantiation_method: InstantiationMethodArg,
    /// Parameter learning strategy.
    #[arg(long = "learning-method", value_enum, default_value_t = LearningMethodArg::Noisetolerant)]
    learning_method: LearningMethodArg,
    /// Direct vs hierarchical Max-SMT pruning.
    #[arg(long = "pruning-method", value_enum, default_value_t = PruningMethodArg::Hierarchical)]
    pruning_method: PruningMethodArg,
    /// Enable the CEGIS unambiguity refinement loop.
    #[arg(long = "unambig", default_value_t = false)]
    unambig: bool,
    /// Disable the unambiguity refinement loop (the default).
    #[arg(long = "no-unambig", conflicts_with = "unambig")]
    no_unambig: bool,
    /// Path to write the output JSON document to (default: stdout).
    #[arg(long = "output-file", short = 'o')]
    output_file: Option<PathBuf>,
    /// Path to dump the unsat core to if synthesis proves infeasible.
    #[arg(long = "conflict-dump")]
    conflict_dump: Option<PathBuf>,
}

impl From<InputFormatArg> for InputFormat {
    fn from(value: InputFormatArg) -> Self {
        match value {
            InputFormatArg::Default => InputFormat::Default,
            InputFormatArg::Bench => InputFormat::Bench,
        }
    }
}

impl From<NumericTypeArg> for NumericType {
    fn from(value: NumericTypeArg) -> Self {
        match value {
            NumericTypeArg::N => NumericType::N,
            NumericTypeArg::R => NumericType::R,
            NumericTypeArg::Q => NumericType::Q,
            NumericTypeArg::Z => NumericType::Z,
        }
    }
}

impl From<InstantiationMethodArg> for InstantiationMethod {
    fn from(value: InstantiationMethodArg) -> Self {
        match value {
            InstantiationMethodArg::Numpy => InstantiationMethod::Numpy,
            InstantiationMethodArg::Prolog => InstantiationMethod::Prolog,
        }
    }
}

impl From<LearningMethodArg> for LearningMethodOption {
    fn from(value: LearningMethodArg) -> Self {
        match value {
            LearningMethodArg::Simple => LearningMethodOption::Simple,
            LearningMethodArg::Heuristic => LearningMethodOption::Heuristic,
            LearningMethodArg::Noisetolerant => LearningMethodOption::Noisetolerant,
        }
    }
}

impl From<PruningMethodArg> for PruningMethod {
    fn from(value: PruningMethodArg) -> Self {
        match value {
            PruningMethodArg::Baseline => PruningMethod::Baseline,
            PruningMethodArg::Hierarchical => PruningMethod::Hierarchical,
        }
    }
}

fn run(args: SynthesizeArgs) -> Result<(), String> {
    let input_json = std::fs::read_to_string(&args.input_file)
        .map_err(|err| format!("failed to read '{}': {err}", args.input_file.display()))?;

    let options = SynthesisOptions {
        input_format: args.input_format.into(),
        numeric_type: args.numeric_type.into(),
        instantiation_method: args.instantiation_method.into(),
        learning_method: args.learning_method.into(),
        pruning_method: args.pruning_method.into(),
        unambig: args.unambig,
        conflict_dump_path: args.conflict_dump.clone(),
        ..SynthesisOptions::default()
    };

    let result = lss_pipeline::synthesize(&input_json, &options).map_err(|err| err.to_string())?;
    log::info!(
        "synthesis done: {} examples, {} templates, {} candidates, {} constraints selected",
        result.report.example_count,
        result.report.template_count,
        result.report.candidate_count,
        result.report.selected_count,
    );

    let output_json = lss_io::write_output(&result.output).map_err(|err| err.to_string())?;
    match args.output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| format!("failed to create '{}': {err}", parent.display()))?;
                }
            }
            std::fs::write(&path, &output_json).map_err(|err| format!("failed to write '{}': {err}", path.display()))?;
            println!("\u{2713} Synthesis complete. Output saved to {}", path.display());
        }
        None => println!("{output_json}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let Command::Synthesize(args) = cli.command;
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("\u{2717} Error: {message}");
            ExitCode::FAILURE
        }
    }
}
