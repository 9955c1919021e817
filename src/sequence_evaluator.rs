/*!
# Sequence evaluator
Classifies every baseline and calls variant on one reference sequence.

The best path of a PathFinder search decides which variants are true positives; calls weights are then balanced within each sync region.
Optionally, a second allele-level search over the leftovers marks variants that only match at the allele level.
*/

use anyhow::Context;
use derive_builder::Builder;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use strum_macros::EnumString;

use crate::data_types::oriented_variant::OrientedVariant;
use crate::data_types::summary_metrics::SummaryMetrics;
use crate::data_types::variants::{AlleleId, Variant};
use crate::orientor::Orientor;
use crate::path_finder::{PathFinder, PathFinderConfig, SearchDiagnostics};
use crate::phasing_evaluator::{count_misphasings, PhasingCounts};
use crate::replay::path::{Path, SyncPoint};

/// Settings shared by every sequence of one evaluation
#[derive(Builder, Clone, Copy, Debug, Default)]
#[builder(default)]
pub struct EvaluationConfig {
    /// Orientation strategy for the baseline variants
    baseline_orientor: Orientor,
    /// Orientation strategy for the calls variants
    calls_orientor: Orientor,
    /// Search settings
    path_finder: PathFinderConfig
}

impl EvaluationConfig {
    // getters
    pub fn baseline_orientor(&self) -> Orientor {
        self.baseline_orientor
    }

    pub fn calls_orientor(&self) -> Orientor {
        self.calls_orientor
    }

    pub fn path_finder(&self) -> &PathFinderConfig {
        &self.path_finder
    }
}

/// All inputs needed to evaluate one reference sequence
#[derive(Clone, Debug)]
pub struct SequenceProblem {
    /// Name of the reference sequence
    pub sequence_name: String,
    /// Reference bases
    pub template: Arc<[u8]>,
    /// Baseline variants, in the order results should be reported
    pub baseline: Vec<Arc<Variant>>,
    /// Calls variants, in the order results should be reported
    pub calls: Vec<Arc<Variant>>
}

/// Final classification of a variant
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display, EnumString, Serialize)]
pub enum VariantStatus {
    #[strum(serialize = "TP")]
    #[serde(rename = "TP")]
    TruePositive,
    #[strum(serialize = "FP")]
    #[serde(rename = "FP")]
    FalsePositive,
    #[strum(serialize = "FN")]
    #[serde(rename = "FN")]
    FalseNegative,
    /// The variant was in a region the search abandoned
    #[strum(serialize = "TOO_COMPLEX")]
    #[serde(rename = "TOO_COMPLEX")]
    TooComplex
}

/// A variant together with its classification
#[derive(Clone, Debug)]
pub struct ClassifiedVariant {
    variant: Arc<Variant>,
    status: VariantStatus,
    /// Contribution to the weighted true positive count; 1.0 for baseline true positives
    weight: f64,
    /// The (A, B) alleles chosen on the best path, only for true positives
    orientation: Option<(AlleleId, AlleleId)>,
    /// Set when the variant only matched in the allele-level pass
    alternate_match: bool
}

impl ClassifiedVariant {
    fn new(variant: Arc<Variant>, status: VariantStatus) -> Self {
        Self {
            variant,
            status,
            weight: 0.0,
            orientation: None,
            alternate_match: false
        }
    }

    fn true_positive(oriented: &OrientedVariant, weight: f64) -> Self {
        Self {
            variant: oriented.variant().clone(),
            status: VariantStatus::TruePositive,
            weight,
            orientation: Some((oriented.allele_a(), oriented.allele_b())),
            alternate_match: false
        }
    }

    /// The chosen orientation as a genotype string, e.g. "0|1", or "." when there is none
    pub fn orientation_string(&self) -> String {
        match self.orientation {
            Some((a, b)) => format!("{a}|{b}"),
            None => ".".to_string()
        }
    }

    // getters
    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }

    pub fn status(&self) -> VariantStatus {
        self.status
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn orientation(&self) -> Option<(AlleleId, AlleleId)> {
        self.orientation
    }

    pub fn alternate_match(&self) -> bool {
        self.alternate_match
    }
}

/// Everything learned about one reference sequence
#[derive(Clone, Debug)]
pub struct SequenceEvaluation {
    sequence_name: String,
    /// Baseline variants in the input order
    baseline: Vec<ClassifiedVariant>,
    /// Calls variants in the input order
    calls: Vec<ClassifiedVariant>,
    sync_points: Vec<SyncPoint>,
    phasing: PhasingCounts,
    diagnostics: SearchDiagnostics
}

impl SequenceEvaluation {
    /// Tallies the classifications into summary counts
    pub fn summary(&self) -> SummaryMetrics {
        let mut summary = SummaryMetrics::default();
        for cv in self.baseline.iter() {
            match cv.status {
                VariantStatus::TruePositive => summary.baseline_tp += 1,
                VariantStatus::FalseNegative => summary.baseline_fn += 1,
                VariantStatus::TooComplex => summary.baseline_too_complex += 1,
                VariantStatus::FalsePositive => {}
            }
        }
        for cv in self.calls.iter() {
            match cv.status {
                VariantStatus::TruePositive => {
                    summary.calls_tp += 1;
                    summary.calls_tp_weighted += cv.weight;
                },
                VariantStatus::FalsePositive => summary.calls_fp += 1,
                VariantStatus::TooComplex => summary.calls_too_complex += 1,
                VariantStatus::FalseNegative => {}
            }
        }
        summary
    }

    // getters
    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }

    pub fn baseline(&self) -> &[ClassifiedVariant] {
        &self.baseline
    }

    pub fn calls(&self) -> &[ClassifiedVariant] {
        &self.calls
    }

    pub fn sync_points(&self) -> &[SyncPoint] {
        &self.sync_points
    }

    pub fn phasing(&self) -> PhasingCounts {
        self.phasing
    }

    pub fn diagnostics(&self) -> &SearchDiagnostics {
        &self.diagnostics
    }
}

/// Evaluates the calls against the baseline on one reference sequence.
/// # Arguments
/// * `problem` - the template and variants of the sequence
/// * `config` - orientation and search settings
/// # Errors
/// * if the orientors cannot be applied to the variants or disagree on ploidy
/// * if the search fails to produce a path
pub fn evaluate_sequence(problem: &SequenceProblem, config: &EvaluationConfig) -> anyhow::Result<SequenceEvaluation> {
    if problem.baseline.is_empty() || problem.calls.is_empty() {
        debug!(
            "Skipping search on {}: {} baseline and {} calls variants",
            problem.sequence_name, problem.baseline.len(), problem.calls.len()
        );
        return Ok(SequenceEvaluation {
            sequence_name: problem.sequence_name.clone(),
            baseline: problem.baseline.iter().map(|v| ClassifiedVariant::new(v.clone(), VariantStatus::FalseNegative)).collect(),
            calls: problem.calls.iter().map(|v| ClassifiedVariant::new(v.clone(), VariantStatus::FalsePositive)).collect(),
            sync_points: vec![],
            phasing: PhasingCounts::default(),
            diagnostics: SearchDiagnostics::default()
        });
    }

    let mut finder = PathFinder::new(
        &problem.sequence_name, problem.template.clone(),
        problem.baseline.clone(), problem.calls.clone(),
        config.baseline_orientor, config.calls_orientor, config.path_finder
    )?;
    let best = finder.best_path()
        .with_context(|| format!("Error while searching {}:", problem.sequence_name))?;

    let baseline_tps = best.baseline_included();
    let (called_tps, demoted) = Path::calculate_weights(&best, best.calls_included(), &baseline_tps);

    let mut baseline_status: FxHashMap<usize, ClassifiedVariant> = FxHashMap::default();
    for ov in baseline_tps.iter() {
        baseline_status.insert(ov.variant().id(), ClassifiedVariant::true_positive(ov, 1.0));
    }
    for v in best.baseline_excluded().into_iter() {
        baseline_status.insert(v.id(), ClassifiedVariant::new(v, VariantStatus::FalseNegative));
    }

    let mut calls_status: FxHashMap<usize, ClassifiedVariant> = FxHashMap::default();
    for ov in called_tps.iter() {
        calls_status.insert(ov.variant().id(), ClassifiedVariant::true_positive(ov, ov.weight()));
    }
    for ov in demoted.into_iter() {
        calls_status.insert(ov.variant().id(), ClassifiedVariant::new(ov.variant().clone(), VariantStatus::FalsePositive));
    }
    for v in best.calls_excluded().into_iter() {
        calls_status.insert(v.id(), ClassifiedVariant::new(v, VariantStatus::FalsePositive));
    }

    if config.path_finder.flag_alternates() &&
        config.baseline_orientor.is_sample_diploid() && config.calls_orientor.is_sample_diploid() {
        flag_alternate_matches(problem, config, &mut baseline_status, &mut calls_status)?;
    }

    let baseline = collect_in_order(&problem.baseline, baseline_status);
    let calls = collect_in_order(&problem.calls, calls_status);

    Ok(SequenceEvaluation {
        sequence_name: problem.sequence_name.clone(),
        baseline,
        calls,
        sync_points: best.sync_points(),
        phasing: count_misphasings(&best),
        diagnostics: finder.diagnostics().clone()
    })
}

/// Runs an allele-level search over the remaining false negatives and false positives and marks the variants it matches.
/// The statuses themselves are not changed.
fn flag_alternate_matches(
    problem: &SequenceProblem, config: &EvaluationConfig,
    baseline_status: &mut FxHashMap<usize, ClassifiedVariant>,
    calls_status: &mut FxHashMap<usize, ClassifiedVariant>
) -> anyhow::Result<()> {
    let remaining = |variants: &[Arc<Variant>], statuses: &FxHashMap<usize, ClassifiedVariant>, status: VariantStatus| -> Vec<Arc<Variant>> {
        variants.iter()
            .filter(|v| statuses.get(&v.id()).map(|cv| cv.status == status).unwrap_or(false))
            .cloned()
            .collect()
    };
    let baseline_fn = remaining(&problem.baseline, baseline_status, VariantStatus::FalseNegative);
    let calls_fp = remaining(&problem.calls, calls_status, VariantStatus::FalsePositive);
    if baseline_fn.is_empty() || calls_fp.is_empty() {
        return Ok(());
    }

    debug!("Allele-level pass on {} with {} baseline and {} calls variants", problem.sequence_name, baseline_fn.len(), calls_fp.len());
    let mut finder = PathFinder::new(
        &problem.sequence_name, problem.template.clone(),
        baseline_fn, calls_fp,
        Orientor::AlleleGt, Orientor::AlleleGt, config.path_finder
    )?;
    let alternate = finder.best_path()
        .with_context(|| format!("Error during allele-level search of {}:", problem.sequence_name))?;

    for ov in alternate.baseline_included().iter() {
        if let Some(cv) = baseline_status.get_mut(&ov.variant().id()) {
            cv.alternate_match = true;
        }
    }
    for ov in alternate.calls_included().iter() {
        if let Some(cv) = calls_status.get_mut(&ov.variant().id()) {
            cv.alternate_match = true;
        }
    }
    Ok(())
}

/// Lays out the classifications in input order; anything the search never decided is too complex
fn collect_in_order(variants: &[Arc<Variant>], mut statuses: FxHashMap<usize, ClassifiedVariant>) -> Vec<ClassifiedVariant> {
    variants.iter()
        .map(|v| {
            statuses.remove(&v.id())
                .unwrap_or_else(|| ClassifiedVariant::new(v.clone(), VariantStatus::TooComplex))
        })
        .collect()
}
