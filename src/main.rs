use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::Path;

mod classify;
mod convert;
mod error;
mod evaluate;
mod layout;
mod loader;
mod logger;
mod output;
mod render;

use classify::{ClassificationConfig, CorrelationClass, Rgb};
use logger::Logger;
use output::OutputFormat;
use render::RenderConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a correlation circle plot from a structure file and correlation pairs
    Render(RenderArgs),
    /// Generate a positional (CT) file from a FASTA sequence
    Fasta2ct(convert::FastaToCtArgs),
    /// Reformat raw cross-correlation output into the three-column correlation file
    Reformat(convert::ReformatArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Positional/structure file (CT format)
    pub structure: String,
    /// Correlation file (header line, then `i j value`)
    pub corr_data: String,
    /// Output plot (.ps or .svg)
    pub output: String,

    // Classification
    /// Minimum correlation drawn as a positive connector
    #[arg(long = "positive-threshold", default_value_t = 0.10, allow_hyphen_values = true)]
    pub positive_threshold: f64,
    /// Maximum correlation drawn as a negative connector
    #[arg(long = "negative-threshold", default_value_t = -0.04, allow_hyphen_values = true)]
    pub negative_threshold: f64,

    // Layout
    /// Number printed for the first base
    #[arg(long = "offset", default_value_t = 1)]
    pub offset: usize,
    /// Skip the grey connector closing the ring from the first to the last base
    #[arg(long = "no-ring-closure", default_value_t = false)]
    pub no_ring_closure: bool,

    /// Reference structure (CT); enables sensitivity/PPV of the pairing columns
    #[arg(short = 'r', long = "reference")]
    pub reference: Option<String>,
    /// Output format (default: from the output extension)
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Log file path (default: <output>.log)
    #[arg(short = 'l', long = "log")]
    pub log: Option<String>,
}

impl RenderArgs {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            classification: ClassificationConfig {
                positive_threshold: self.positive_threshold,
                negative_threshold: self.negative_threshold,
                positive_color: Rgb::DARK_GREEN,
                negative_color: Rgb::MAGENTA,
            },
            offset: self.offset,
            ring_closure: !self.no_ring_closure,
        }
    }

    fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output))
    }
}

/// Validate render command arguments
fn validate_render_args(args: &RenderArgs) -> Result<(), Box<dyn Error>> {
    for (label, path) in [("Structure", &args.structure), ("Correlation", &args.corr_data)] {
        if !Path::new(path).exists() {
            return Err(format!("Error: {} file does not exist: {}", label, path).into());
        }
    }
    if let Some(reference) = &args.reference {
        if !Path::new(reference).exists() {
            return Err(format!("Error: Reference structure does not exist: {}", reference).into());
        }
    }
    if args.output.trim().is_empty() {
        return Err("Error: Output file path cannot be empty".into());
    }
    if !args.positive_threshold.is_finite() || !args.negative_threshold.is_finite() {
        return Err("Error: Thresholds must be finite numbers".into());
    }
    Ok(())
}

fn render_main(args: &RenderArgs, logger: &mut Logger) -> Result<(), Box<dyn Error>> {
    let config = args.render_config();
    let format = args.output_format();

    logger.param("Structure File", &args.structure)?;
    logger.param("Correlation File", &args.corr_data)?;
    logger.param("Format", format!("{:?}", format))?;
    logger.param(
        "Thresholds",
        format!(
            ">= {} positive, <= {} negative",
            config.classification.positive_threshold, config.classification.negative_threshold
        ),
    )?;
    if let Some(reference) = &args.reference {
        logger.param("Reference Structure", reference)?;
    }

    let bases = loader::parse_positions(Path::new(&args.structure))?;
    logger.step(&format!("Loaded {} bases", bases.len()))?;
    let records = loader::parse_correlations(Path::new(&args.corr_data))?;
    logger.step(&format!("Loaded {} correlation pairs", records.len()))?;

    let statistics = match &args.reference {
        Some(reference) => {
            let reference_bases = loader::parse_positions(Path::new(reference))?;
            let comparison = evaluate::compare_structures(&bases, &reference_bases, reference)?;
            let stats = comparison.statistics()?;
            logger.param("Accepted pairs", stats.accepted)?;
            logger.param("Missing pairs", stats.missing)?;
            logger.param("Extra pairs", stats.extra)?;
            logger.param("Sensitivity", format!("{:.3}", stats.sensitivity))?;
            logger.param("PPV", format!("{:.3}", stats.ppv))?;
            Some(stats)
        }
        None => None,
    };

    let plot = render::render_plot(&bases, &records, &config, statistics.as_ref())?;
    logger.step(&format!(
        "Drew {} of {} correlation pairs",
        plot.connector_count, plot.record_count
    ))?;
    let positive = plot
        .connectors
        .iter()
        .filter(|c| c.class == CorrelationClass::Positive)
        .count();
    logger.param("Positive connectors", positive)?;
    logger.param("Negative connectors", plot.connector_count - positive)?;
    logger.param(
        "Layout",
        format!(
            "scale factor {:.6}, radius {}, angle {:.6}",
            plot.layout.scale_factor, plot.layout.radius, plot.layout.angle_per_base
        ),
    )?;

    output::write_atomic(Path::new(&args.output), &format.serialize(&plot.commands)?)?;
    logger.finish(&format!("Plot written: {}", args.output))?;
    Ok(())
}

/// Run a subcommand, recording its error in the run log before returning it
fn run_logged<A>(
    args: &A,
    logger: &mut Logger,
    task: fn(&A, &mut Logger) -> Result<(), Box<dyn Error>>,
) -> Result<(), Box<dyn Error>> {
    let result = task(args, logger);
    if let Err(e) = &result {
        logger.fail(e)?;
    }
    result
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => {
            validate_render_args(&args)?;
            let mut logger = Logger::start("render", args.log.as_deref(), Path::new(&args.output))?;
            run_logged(&args, &mut logger, render_main)
        }
        Commands::Fasta2ct(args) => {
            convert::validate_fasta_args(&args)?;
            let mut logger = Logger::start("fasta2ct", args.log.as_deref(), &args.output_path())?;
            run_logged(&args, &mut logger, convert::fasta_to_ct_main)
        }
        Commands::Reformat(args) => {
            convert::validate_reformat_args(&args)?;
            let mut logger = Logger::start("reformat", args.log.as_deref(), Path::new(&args.output))?;
            run_logged(&args, &mut logger, convert::reformat_main)
        }
    }
}
