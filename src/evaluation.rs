/*!
# Evaluation
Runs the sequence evaluator over every reference sequence on the global rayon pool.

Sequences are independent, each search is single-threaded.
A shared abort flag is checked before a sequence starts, so an abort lets running searches finish while the rest are skipped.
*/

use indicatif::ParallelProgressIterator;
use log::{debug, error};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::data_types::summary_metrics::SummaryMetrics;
use crate::sequence_evaluator::{evaluate_sequence, EvaluationConfig, SequenceEvaluation, SequenceProblem};
use crate::util::progress_bar::get_progress_style;

/// What happened to one sequence
#[derive(Debug)]
pub enum SequenceOutcome {
    /// The sequence was fully evaluated
    Completed(Box<SequenceEvaluation>),
    /// The abort flag was set before the sequence started
    Aborted,
    /// The evaluation failed; contains the error message
    Failed(String)
}

impl SequenceOutcome {
    /// Returns the evaluation if the sequence completed
    pub fn evaluation(&self) -> Option<&SequenceEvaluation> {
        match self {
            SequenceOutcome::Completed(evaluation) => Some(evaluation.as_ref()),
            SequenceOutcome::Aborted |
            SequenceOutcome::Failed(_) => None
        }
    }
}

/// Evaluates every sequence problem in parallel.
/// # Arguments
/// * `problems` - one problem per reference sequence
/// * `config` - settings shared by all sequences
/// * `abort` - once set, sequences that have not started yet are reported as aborted
/// # Returns
/// * the sequence name and outcome of each problem, in the input order
pub fn evaluate_sequences(problems: Vec<SequenceProblem>, config: &EvaluationConfig, abort: &AtomicBool) -> Vec<(String, SequenceOutcome)> {
    let style = get_progress_style();
    let mut results: Vec<(usize, String, SequenceOutcome)> = problems.into_par_iter()
        .enumerate()
        .map(|(index, problem)| {
            if abort.load(Ordering::Relaxed) {
                debug!("Skipping {} after abort", problem.sequence_name);
                return (index, problem.sequence_name, SequenceOutcome::Aborted);
            }
            let outcome = match evaluate_sequence(&problem, config) {
                Ok(evaluation) => SequenceOutcome::Completed(Box::new(evaluation)),
                Err(e) => {
                    error!("Error while evaluating {}: {e:#}", problem.sequence_name);
                    SequenceOutcome::Failed(format!("{e:#}"))
                }
            };
            (index, problem.sequence_name, outcome)
        })
        .progress_with_style(style)
        .collect();

    results.sort_by_key(|(index, _, _)| *index);
    results.into_iter()
        .map(|(_, name, outcome)| (name, outcome))
        .collect()
}

/// Sums the summary metrics of every completed sequence
pub fn total_summary(results: &[(String, SequenceOutcome)]) -> SummaryMetrics {
    let mut total = SummaryMetrics::default();
    for evaluation in results.iter().filter_map(|(_, outcome)| outcome.evaluation()) {
        total += evaluation.summary();
    }
    total
}
