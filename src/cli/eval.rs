
use anyhow::{bail, ensure};
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::orientor::Orientor;
use crate::path_finder::{DEFAULT_MAX_COMPLEXITY, DEFAULT_MAX_ITERATIONS};
use crate::path_preference::PathPreference;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct EvalSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    okapi_version: String,

    /// Reference FASTA file
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_fn: PathBuf,

    /// Baseline and calls variants (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "variants")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub variants_fn: PathBuf,

    /// Output directory containing the summary and variant status files
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional output debug folder
    #[clap(long = "debug-folder")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Orientation strategy for the baseline variants
    #[clap(long = "baseline-orientor")]
    #[clap(value_name = "ORIENTOR")]
    #[clap(help_heading = Some("Comparison"))]
    #[clap(default_value = "unphased")]
    pub baseline_orientor: Orientor,

    /// Orientation strategy for the calls variants
    #[clap(long = "calls-orientor")]
    #[clap(value_name = "ORIENTOR")]
    #[clap(help_heading = Some("Comparison"))]
    #[clap(default_value = "unphased")]
    pub calls_orientor: Orientor,

    /// Compares alleles without regard to genotype, overrides both orientors with squash_ploidy
    #[clap(long = "squash-ploidy")]
    #[clap(help_heading = Some("Comparison"))]
    pub squash_ploidy: bool,

    /// Treats the missing allele of a half-call (e.g. "./1") as an unknown allele instead of the reference
    #[clap(long = "explicit-half-calls")]
    #[clap(help_heading = Some("Comparison"))]
    pub explicit_half_calls: bool,

    /// Annotates leftover false negatives and false positives that match at the allele level
    #[clap(long = "flag-alternates")]
    #[clap(help_heading = Some("Comparison"))]
    pub flag_alternates: bool,

    /// Ranking used to choose between equivalent reconciliations
    #[clap(long = "path-preference")]
    #[clap(value_name = "PREFERENCE")]
    #[clap(help_heading = Some("Search parameters"))]
    #[clap(default_value = "max_sum_both")]
    pub path_preference: PathPreference,

    /// Abandon a region once more than this many paths are unresolved
    #[clap(long = "max-paths")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Search parameters"))]
    #[clap(default_value_t = DEFAULT_MAX_COMPLEXITY)]
    pub max_complexity: usize,

    /// Abandon a region after this many iterations without resolving to a single path
    #[clap(long = "max-iterations")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Search parameters"))]
    #[clap(default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Keeps paths where only one side changed since the last sync point
    #[clap(long = "disable-noop-pruning")]
    #[clap(help_heading = Some("Search parameters"))]
    pub disable_noop_pruning: bool,

    /// Number of threads to use in the evaluation step
    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_eval_settings(mut settings: EvalSettings) -> anyhow::Result<EvalSettings> {
    // hard code the version in
    settings.okapi_version = FULL_VERSION.clone();
    info!("Okapi version: {:?}", &settings.okapi_version);
    info!("Sub-command: eval");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.reference_fn, "Reference FASTA")?;
    check_required_filename(&settings.variants_fn, "Variants JSON")?;

    // dump stuff to the logger
    info!("\tReference: {:?}", &settings.reference_fn);
    info!("\tVariants: {:?}", &settings.variants_fn);

    // outputs
    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    info!("Comparison:");
    if settings.squash_ploidy {
        settings.baseline_orientor = Orientor::SquashPloidy;
        settings.calls_orientor = Orientor::SquashPloidy;
        info!("\tSquash ploidy: ENABLED");
    }
    info!("\tBaseline orientor: {}", settings.baseline_orientor);
    info!("\tCalls orientor: {}", settings.calls_orientor);
    let (baseline_haplotypes, calls_haplotypes) = (settings.baseline_orientor.haplotypes(), settings.calls_orientor.haplotypes());
    if baseline_haplotypes != calls_haplotypes {
        bail!(
            "--baseline-orientor {} uses {baseline_haplotypes} haplotype(s) but --calls-orientor {} uses {calls_haplotypes}",
            settings.baseline_orientor, settings.calls_orientor
        );
    }
    info!("\tExplicit half-calls: {}", if settings.explicit_half_calls { "ENABLED" } else { "DISABLED" });
    info!("\tFlag alternates: {}", if settings.flag_alternates { "ENABLED" } else { "DISABLED" });

    info!("Search parameters:");
    ensure!(settings.max_complexity > 0, "--max-paths must be >0");
    ensure!(settings.max_iterations > 0, "--max-iterations must be >0");
    info!("\tPath preference: {}", settings.path_preference);
    info!("\tMaximum paths: {}", settings.max_complexity);
    info!("\tMaximum iterations: {}", settings.max_iterations);
    info!("\tNo-op pruning: {}", if settings.disable_noop_pruning { "DISABLED" } else { "ENABLED" });

    ensure!(settings.threads > 0, "--threads must be >0");
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
