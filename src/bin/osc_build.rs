use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use osc_catalog::app::{App, BuildRunOptions};
use osc_catalog::catalog::FileModificationTimes;
use osc_catalog::config::ConfigLoader;
use osc_catalog::error::CatalogError;
use osc_catalog::output::{ConsoleOutput, JsonOutput, OutputMode};
use osc_catalog::segmentation::SingletonGroups;

#[derive(Parser)]
#[command(name = "osc-build")]
#[command(about = "Assemble the Open Science Catalog from its CSV tables")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check the tables for unresolved references")]
    Validate(ValidateArgs),
    #[command(about = "Build the catalog documents and metrics")]
    Build(BuildArgs),
}

#[derive(Args)]
struct ValidateArgs {
    data_dir: Utf8PathBuf,
}

#[derive(Args)]
struct BuildArgs {
    data_dir: Utf8PathBuf,

    #[arg(short, long)]
    out_dir: Utf8PathBuf,

    #[arg(long)]
    config: Option<Utf8PathBuf>,

    #[arg(long)]
    root_href: Option<String>,

    #[arg(long)]
    no_pretty_print: bool,

    #[arg(long)]
    no_images: bool,

    #[arg(long, value_enum)]
    singleton_collections: Option<SingletonGroups>,

    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::MissingConfig(_)
        | CatalogError::ConfigRead(_)
        | CatalogError::ConfigParse(_)
        | CatalogError::MissingTable(_) => 2,
        CatalogError::UnresolvedLink { .. } => 3,
        CatalogError::ValidationFailed(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let app = App::new(FileModificationTimes);

    match cli.command {
        Commands::Validate(args) => run_validate(args, &app, output_mode),
        Commands::Build(args) => run_build(args, &app, output_mode),
    }
}

fn run_validate(
    args: ValidateArgs,
    app: &App<FileModificationTimes>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let result = match output_mode {
        OutputMode::NonInteractive => {
            let result = app.validate(&args.data_dir, &JsonOutput)?;
            JsonOutput::print_validate(&result).into_diagnostic()?;
            result
        }
        OutputMode::Interactive => {
            let result = app.validate(&args.data_dir, &ConsoleOutput)?;
            ConsoleOutput::print_validate(&result);
            result
        }
    };
    if !result.valid {
        return Err(CatalogError::ValidationFailed(result.issue_count).into());
    }
    Ok(())
}

fn run_build(
    args: BuildArgs,
    app: &App<FileModificationTimes>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let BuildArgs {
        data_dir,
        out_dir,
        config,
        root_href,
        no_pretty_print,
        no_images,
        singleton_collections,
        strict,
    } = args;

    let mut resolved = ConfigLoader::resolve(config.as_deref())?;
    if let Some(root_href) = root_href {
        resolved.root_href = Some(root_href);
    }
    if no_pretty_print {
        resolved.pretty_print = false;
    }
    if no_images {
        resolved.copy_images = false;
    }
    if let Some(singletons) = singleton_collections {
        resolved.build.segmentation.singletons = singletons;
    }
    let options = BuildRunOptions { strict };

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.build(&data_dir, &out_dir, &resolved, options, &JsonOutput)?;
            JsonOutput::print_build(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let result = app.build(&data_dir, &out_dir, &resolved, options, &ConsoleOutput)?;
            ConsoleOutput::print_build(&result);
        }
    }
    Ok(())
}
