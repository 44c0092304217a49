use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_module_matrix::annotation::DEFAULT_PATTERN;
use kira_module_matrix::app::{App, DEFAULT_DPI, ReferenceResult, RunOptions, RunSummary};
use kira_module_matrix::config::{ConfigLoader, PathOverrides};
use kira_module_matrix::error::KiraError;
use kira_module_matrix::kegg::KeggHttpClient;
use kira_module_matrix::output::{JsonOutput, MAX_DPI};

#[derive(Parser)]
#[command(name = "kira-mm")]
#[command(about = "Build KEGG module count matrices from eggNOG-mapper annotations")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Aggregate annotations, compute QC and join metadata")]
    Run(RunArgs),
    #[command(about = "Download the KEGG module reference list")]
    Reference(PathArgs),
}

#[derive(Args, Clone)]
struct PathArgs {
    #[arg(long)]
    repo_root: Option<Utf8PathBuf>,

    #[arg(long)]
    input_dir: Option<String>,

    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long)]
    analysis_name: Option<String>,
}

#[derive(Args, Clone)]
struct RunArgs {
    #[command(flatten)]
    paths: PathArgs,

    #[arg(long, default_value = DEFAULT_PATTERN)]
    pattern: String,

    #[arg(long)]
    no_reference: bool,

    #[arg(
        long,
        default_value_t = DEFAULT_DPI,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DPI))
    )]
    dpi: u32,
}

impl From<PathArgs> for PathOverrides {
    fn from(args: PathArgs) -> Self {
        Self {
            repo_root: args.repo_root,
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            analysis_name: args.analysis_name,
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::NoInputFiles { .. }
        | KiraError::InvalidPattern { .. }
        | KiraError::NoValidAnnotations
        | KiraError::MetadataRead(_)
        | KiraError::MissingEnv(_) => 2,
        KiraError::KeggHttp(_) | KiraError::KeggStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_pipeline(args, cli.json),
        Commands::Reference(args) => run_reference(args, cli.json),
    }
}

fn run_pipeline(args: RunArgs, json: bool) -> miette::Result<()> {
    let paths = ConfigLoader::resolve(args.paths.into())?;
    let kegg = KeggHttpClient::new()?;
    let app = App::new(paths, kegg);
    let options = RunOptions {
        pattern: args.pattern,
        fetch_reference: !args.no_reference,
        dpi: args.dpi,
    };
    let summary = app.run(&options)?;
    if json {
        JsonOutput::print(&summary).into_diagnostic()?;
    } else {
        print_run_summary(&summary);
    }
    Ok(())
}

fn run_reference(args: PathArgs, json: bool) -> miette::Result<()> {
    let paths = ConfigLoader::resolve(args.into())?;
    let kegg = KeggHttpClient::new()?;
    let app = App::new(paths, kegg);
    let result = app.fetch_reference()?;
    if json {
        JsonOutput::print(&result).into_diagnostic()?;
    } else {
        print_reference_summary(&result);
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}KIRA-MM summary{reset}");
    println!(
        "{green}samples: {}  modules: {}  rows: {}{reset}",
        summary.samples, summary.quality.n_modules, summary.annotation_rows
    );
    println!("{green}sparsity: {:.2}%{reset}", summary.quality.sparsity);
    match summary.quality.percent_unmapped {
        Some(pct) => println!("{green}unmapped modules: {pct:.2}%{reset}"),
        None => println!("{yellow}unmapped modules: skipped (no reference){reset}"),
    }
    println!(
        "{green}design: {} samples{reset}",
        summary.design_samples
    );
    if !summary.missing_metadata.is_empty() {
        println!(
            "{yellow}without metadata: {}{reset}",
            summary.missing_metadata.join(", ")
        );
    }
    for path in &summary.outputs {
        println!("{cyan}   {path}{reset}");
    }
}

fn print_reference_summary(result: &ReferenceResult) {
    println!("KEGG modules: {}", result.modules);
    println!("saved: {}", result.path);
}
