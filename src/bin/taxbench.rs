use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taxbench_tools::bioboxes::validate_bioboxes;
use taxbench_tools::compare::{CompareOptions, parse_list, run_comparison};
use taxbench_tools::config::{ConfigLoader, ResolvedConfig};
use taxbench_tools::convert::{ConversionOptions, convert_file};
use taxbench_tools::domain::Rank;
use taxbench_tools::gold::{DEFAULT_GOLD_SAMPLE_ID, fix_gold_standard};
use taxbench_tools::output::{JsonOutput, ReportFormat, TextOutput};
use taxbench_tools::profiler::{check_profiler_output, find_profiler};
use taxbench_tools::taxonomy::TaxonomyLookup;
use taxbench_tools::taxpasta::validate_taxpasta;
use taxbench_tools::validation::ValidationReport;

#[derive(Parser)]
#[command(name = "taxbench")]
#[command(about = "Taxonomic profile conversion, validation and comparison for classifier benchmarks")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, global = true, help = "JSON config file (default: ./taxbench.json if present)")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Convert a taxpasta standardised profile to CAMI Bioboxes")]
    Convert(ConvertArgs),
    #[command(about = "Validate a CAMI Bioboxes profile")]
    ValidateBioboxes(ValidateArgs),
    #[command(about = "Validate a taxpasta standardised profile")]
    ValidateTaxpasta(ValidateArgs),
    #[command(about = "Add a TAXPATH column to a gold-standard profile")]
    FixGoldStandard(FixGoldArgs),
    #[command(about = "Check a raw profiler output before standardisation")]
    CheckProfiler(CheckProfilerArgs),
    #[command(about = "Compare classifiers on one sample using OPAL results")]
    Compare(CompareArgs),
}

#[derive(Args, Clone)]
struct TaxonomyArgs {
    #[arg(long, help = "Directory holding NCBI nodes.dmp and names.dmp")]
    taxdump: Option<String>,

    #[arg(long, conflicts_with = "taxdump", help = "Skip taxonomy lookups")]
    no_taxonomy: bool,
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(short, long)]
    input: String,

    #[arg(short, long)]
    output: String,

    #[arg(short, long)]
    sample_id: String,

    #[arg(short, long, help = "Ranks to keep, pipe or comma separated")]
    ranks: Option<String>,

    #[arg(short = 'd', long)]
    taxonomy_db: Option<String>,

    #[arg(long)]
    bioboxes_version: Option<String>,

    #[arg(long, help = "Print the conversion summary as JSON")]
    json: bool,

    #[command(flatten)]
    taxonomy: TaxonomyArgs,
}

#[derive(Args)]
struct ValidateArgs {
    input: String,

    #[arg(long, help = "Fail on warnings as well as errors")]
    strict: bool,

    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

#[derive(Args)]
struct FixGoldArgs {
    #[arg(short, long)]
    input: String,

    #[arg(short, long)]
    output: String,

    #[arg(short, long, default_value = DEFAULT_GOLD_SAMPLE_ID)]
    sample_id: String,

    #[arg(long, help = "Print the fix summary as JSON")]
    json: bool,

    #[command(flatten)]
    taxonomy: TaxonomyArgs,
}

#[derive(Args)]
struct CheckProfilerArgs {
    profiler: String,

    #[arg(required_unless_present = "show_spec")]
    file: Option<String>,

    #[arg(long, help = "Print the expected layout for the profiler")]
    show_spec: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CompareArgs {
    #[arg(long)]
    opal_dir: String,

    #[arg(long)]
    gold_standard: String,

    #[arg(long)]
    sample_id: String,

    #[arg(long, help = "Comma-separated classifier labels")]
    labels: String,

    #[arg(long)]
    output_prefix: String,

    #[arg(long, help = "Comma-separated Bioboxes profiles, one per label")]
    profiles: Option<String>,

    #[arg(long, help = "Minimum abundance difference in percentage points")]
    threshold: Option<f64>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> miette::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Commands::Convert(args) => run_convert(args, &config),
        Commands::ValidateBioboxes(args) => {
            let report = validate_bioboxes(Utf8Path::new(&args.input));
            print_validation(&args, ReportFormat::Bioboxes, &report)
        }
        Commands::ValidateTaxpasta(args) => {
            let report = validate_taxpasta(Utf8Path::new(&args.input));
            print_validation(&args, ReportFormat::Taxpasta, &report)
        }
        Commands::FixGoldStandard(args) => run_fix_gold(args, &config),
        Commands::CheckProfiler(args) => run_check_profiler(args),
        Commands::Compare(args) => run_compare(args, &config),
    }
}

fn taxonomy_lookup(args: &TaxonomyArgs, config: &ResolvedConfig) -> TaxonomyLookup {
    if args.no_taxonomy {
        return TaxonomyLookup::offline();
    }
    let dir = args
        .taxdump
        .as_deref()
        .map(Utf8PathBuf::from)
        .or_else(|| config.taxdump_dir.clone());
    TaxonomyLookup::resolve(dir.as_deref())
}

fn run_convert(args: ConvertArgs, config: &ResolvedConfig) -> miette::Result<ExitCode> {
    let ranks = match args.ranks.as_deref() {
        Some(value) => Rank::parse_list(value).into_diagnostic()?,
        None => config.ranks.clone(),
    };
    let options = ConversionOptions {
        sample_id: args.sample_id,
        ranks,
        taxonomy_db: args
            .taxonomy_db
            .unwrap_or_else(|| config.taxonomy_db.clone()),
        version: args
            .bioboxes_version
            .unwrap_or_else(|| config.bioboxes_version.clone()),
    };
    let taxonomy = taxonomy_lookup(&args.taxonomy, config);

    let summary = convert_file(
        Utf8Path::new(&args.input),
        Utf8Path::new(&args.output),
        &options,
        &taxonomy,
    )
    .into_diagnostic()?;
    if let Some(total) = summary.renormalized_from {
        info!("percentages renormalized from {total:.2}% to 100%");
    }
    if args.json {
        JsonOutput::print_json(&summary).into_diagnostic()?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_validation(
    args: &ValidateArgs,
    format: ReportFormat,
    report: &ValidationReport,
) -> miette::Result<ExitCode> {
    if args.json {
        JsonOutput::print_report(&args.input, report, args.strict).into_diagnostic()?;
    } else {
        TextOutput::print_report(&args.input, format, report, args.strict).into_diagnostic()?;
    }
    Ok(exit_code(report.passes(args.strict)))
}

fn run_fix_gold(args: FixGoldArgs, config: &ResolvedConfig) -> miette::Result<ExitCode> {
    let taxonomy = taxonomy_lookup(&args.taxonomy, config);
    let summary = fix_gold_standard(
        Utf8Path::new(&args.input),
        Utf8Path::new(&args.output),
        &args.sample_id,
        &taxonomy,
    )
    .into_diagnostic()?;
    if summary.skipped_unparsable > 0 {
        info!("{} unparsable rows were skipped", summary.skipped_unparsable);
    }
    if args.json {
        JsonOutput::print_json(&summary).into_diagnostic()?;
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check_profiler(args: CheckProfilerArgs) -> miette::Result<ExitCode> {
    if args.show_spec {
        let spec = find_profiler(&args.profiler).into_diagnostic()?;
        println!("{}", spec.describe());
        return Ok(ExitCode::SUCCESS);
    }
    let file = args
        .file
        .ok_or_else(|| miette::Report::msg("a profiler output file is required"))?;
    let profiler = args.profiler.to_ascii_lowercase();
    let report = check_profiler_output(&profiler, Utf8Path::new(&file));
    let passed = report.passes(false);

    if args.json {
        JsonOutput::print_report(&file, &report, false).into_diagnostic()?;
    } else {
        let text = TextOutput::render_profiler_check(&profiler, &file, &report);
        if passed {
            print!("{text}");
        } else {
            eprint!("{text}");
        }
    }
    Ok(exit_code(passed))
}

fn run_compare(args: CompareArgs, config: &ResolvedConfig) -> miette::Result<ExitCode> {
    let options = CompareOptions {
        opal_dir: Utf8PathBuf::from(args.opal_dir),
        gold_standard: Utf8PathBuf::from(args.gold_standard),
        sample_id: args.sample_id,
        labels: parse_list(&args.labels),
        output_prefix: args.output_prefix,
        profiles: args
            .profiles
            .as_deref()
            .map(parse_list)
            .unwrap_or_default()
            .into_iter()
            .map(Utf8PathBuf::from)
            .collect(),
        threshold: args.threshold.unwrap_or(config.diff_threshold),
    };
    let summary = run_comparison(&options).into_diagnostic()?;
    info!(
        mode = summary.mode,
        classifiers = summary.classifiers,
        differential_taxa = summary.differential_taxa,
        "comparison finished"
    );
    Ok(ExitCode::SUCCESS)
}

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
