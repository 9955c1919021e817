
use log::{LevelFilter, error, info, warn};
use rust_lib_reference_genome::reference_genome::ReferenceGenome;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use okapi::cli::core::{Commands, get_cli};
use okapi::cli::eval::{EvalSettings, check_eval_settings};
use okapi::evaluation::{SequenceOutcome, evaluate_sequences};
use okapi::parsing::problem_loader::load_sequence_problems;
use okapi::path_finder::{PathFinderConfigBuilder, SearchDiagnostics};
use okapi::sequence_evaluator::EvaluationConfigBuilder;
use okapi::util::json_io::save_json;
use okapi::writers::summary::SummaryWriter;
use okapi::writers::variant_status::VariantStatusWriter;

/// Per-sequence entry of the diagnostics debug file
#[derive(Serialize)]
struct SequenceDiagnostics<'a> {
    sequence_name: &'a str,
    /// One of "completed", "aborted", or "failed"
    outcome: &'static str,
    error: Option<&'a str>,
    search: Option<&'a SearchDiagnostics>
}

fn run_eval(settings: EvalSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_eval_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // create a debug folder if specified and save the settings there
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // load the reference genome
    info!("Pre-loading reference genome into memory...");
    let reference_genome = match ReferenceGenome::from_fasta(&settings.reference_fn) {
        Ok(rg) => rg,
        Err(e) => {
            error!("Error while loading reference genome: {e:?}");
            std::process::exit(exitcode::IOERR);
        }
    };

    info!("Loading variants...");
    let problems = match load_sequence_problems(&settings.variants_fn, &reference_genome, settings.explicit_half_calls) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while loading variants: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    // the templates are copied into each problem, so the full reference can go
    drop(reference_genome);
    info!("Loaded {} sequences to evaluate.", problems.len());

    // build our configuration
    let path_finder_config = match PathFinderConfigBuilder::default()
        .path_preference(settings.path_preference)
        .max_complexity(settings.max_complexity)
        .max_iterations(settings.max_iterations)
        .flag_alternates(settings.flag_alternates)
        .prune_noops(!settings.disable_noop_pruning)
        .build() {
        Ok(pc) => pc,
        Err(e) => {
            error!("Error while building search config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };
    let eval_config = match EvaluationConfigBuilder::default()
        .baseline_orientor(settings.baseline_orientor)
        .calls_orientor(settings.calls_orientor)
        .path_finder(path_finder_config)
        .build() {
        Ok(ec) => ec,
        Err(e) => {
            error!("Error while building evaluation config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // run the parallel evaluation
    info!("Evaluating sequences...");
    let abort = AtomicBool::new(false);
    let all_results = evaluate_sequences(problems, &eval_config, &abort);
    info!("Sequence evaluation complete, saving all outputs...");

    let variants_fn = settings.output_folder.join("variants.tsv.gz");
    info!("Saving variant statuses to {variants_fn:?}...");
    let mut variant_writer = match VariantStatusWriter::new(&variants_fn) {
        Ok(vw) => vw,
        Err(e) => {
            error!("Error while opening variant status file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let mut summary_writer = SummaryWriter::new();
    let mut diagnostics = vec![];
    for (sequence_name, outcome) in all_results.iter() {
        let (label, message, search) = match outcome {
            SequenceOutcome::Completed(evaluation) => {
                if let Err(e) = variant_writer.write_evaluation(evaluation) {
                    error!("Error while writing variant statuses: {e:#}");
                    std::process::exit(exitcode::IOERR);
                }
                summary_writer.add_sequence_evaluation(evaluation);
                ("completed", None, Some(evaluation.diagnostics()))
            },
            SequenceOutcome::Aborted => {
                warn!("Evaluation of {sequence_name} was aborted");
                summary_writer.add_error();
                ("aborted", None, None)
            },
            SequenceOutcome::Failed(message) => {
                summary_writer.add_error();
                ("failed", Some(message.as_str()), None)
            }
        };
        diagnostics.push(SequenceDiagnostics { sequence_name, outcome: label, error: message, search });
    }
    if let Err(e) = variant_writer.finish() {
        error!("Error while saving variant status file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        let diagnostics_json = debug_folder.join("diagnostics.json");
        info!("Saving search diagnostics to {diagnostics_json:?}...");
        if let Err(e) = save_json(&diagnostics, &diagnostics_json) {
            error!("Error while saving search diagnostics: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    let joint_metrics = summary_writer.total_metrics();
    info!("Joint: {joint_metrics:?}");
    info!("\tRecall: {:?}", joint_metrics.recall());
    info!("\tPrecision: {:?}", joint_metrics.precision());
    info!("\tF1: {:?}", joint_metrics.f1());
    info!("Phasing: {:?}", summary_writer.total_phasing());
    info!("Solved:error sequences: {} : {}", summary_writer.solved_sequences(), summary_writer.error_sequences());

    // now write things
    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving output summary to {summary_fn:?}...");
    if let Err(e) = summary_writer.write_summary(&summary_fn) {
        error!("Error while saving summary file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    if summary_writer.error_sequences() > 0 {
        error!("{} sequence(s) could not be evaluated, see the log for details", summary_writer.error_sequences());
        std::process::exit(exitcode::SOFTWARE);
    }

    info!("Evaluation completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Eval(settings) => {
            run_eval(*settings);
        }
    }

    info!("Process finished successfully.");
}
