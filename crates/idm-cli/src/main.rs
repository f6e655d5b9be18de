//! IDM command-line driver
//!
//! Run with: cargo run --bin idm -- generate --generator gn --output-dir out lighting.matter

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use idm::codegen::{self, FileSystemStorage};
use idm::{CodegenRunOptions, Diagnostic, GeneratorOptions, IdlError, PipelineContext};

#[derive(Parser)]
#[command(name = "idm")]
#[command(about = "Interaction Data Model toolchain")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a code generator
    Generate {
        /// Generator key (java, bridge, cpp-app, cpp-sdk, gn, idl)
        #[arg(short, long)]
        generator: String,

        /// Directory receiving the outputs
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Generator option as key:value, repeatable
        #[arg(long = "option")]
        options: Vec<String>,

        /// Render without writing
        #[arg(long)]
        dry_run: bool,

        /// File listing the paths the generator must produce
        #[arg(long)]
        expected_outputs: Option<PathBuf>,

        /// One .matter file or any number of .xml files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Check a model against a rule file
    Lint {
        /// Rule file
        #[arg(short, long)]
        rules: PathBuf,

        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Check that an updated model stays backwards compatible
    Compat {
        original: PathBuf,
        updated: PathBuf,
    },

    /// Expand output path patterns against a model
    Paths {
        /// Pattern such as `{{server_cluster_name}}/callbacks.cpp`, repeatable
        #[arg(short, long, required = true)]
        pattern: Vec<String>,

        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the parsed model as JSON
    Dump {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn report(diagnostics: &[Diagnostic]) -> ExitCode {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
    if diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(command: Command) -> Result<ExitCode, IdlError> {
    match command {
        Command::Generate {
            generator,
            output_dir,
            options,
            dry_run,
            expected_outputs,
            inputs,
        } => {
            let idl = idm::load_model(&inputs)?;
            let options = GeneratorOptions::from_pairs(options.iter().map(String::as_str))?;
            let context = PipelineContext::new()?.with_options(options);

            let mut run_options = CodegenRunOptions::new().dry_run(dry_run);
            if let Some(path) = expected_outputs {
                let text = fs::read_to_string(&path).map_err(|e| IdlError::storage(&path, e))?;
                run_options = run_options.expected_outputs(codegen::parse_expected_outputs(&text));
            }

            let mut storage = FileSystemStorage::new(output_dir);
            let report = context.generate(&generator, &idl, &mut storage, &run_options)?;
            for path in report.skipped.iter().chain(report.written.iter()) {
                println!("{}", path);
            }
            info!(
                written = report.written.len(),
                unchanged = report.unchanged.len(),
                "done"
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Lint { rules, inputs } => {
            let idl = idm::load_model(&inputs)?;
            Ok(report(&idm::lint_file(&idl, rules)?))
        }
        Command::Compat { original, updated } => {
            let original = idm::load_model(&[original])?;
            let updated = idm::load_model(&[updated])?;
            Ok(report(&idm::check_compatibility(&original, &updated).diagnostics))
        }
        Command::Paths { pattern, inputs } => {
            let idl = idm::load_model(&inputs)?;
            for pattern in &pattern {
                for path in idm::expand(&idl, pattern) {
                    println!("{}", path);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Dump { inputs } => {
            let idl = idm::load_model(&inputs)?;
            let json = serde_json::to_string_pretty(&idl)?;
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr, stdout carries results
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("error: cannot install logger: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
