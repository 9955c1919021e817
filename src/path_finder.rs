/*!
# Path finder
Best-first search for the reconciliation of baseline and calls variants on one reference sequence.

The frontier holds candidate paths ordered by replay state. Each iteration takes the least path and either branches it on the next variant of one side, or steps it one base and keeps it if both sides still agree.
Whenever a single path remains it becomes the restart point; if a region grows past the configured complexity bounds, the search restarts from that point and skips every variant in the region.
*/

use derive_builder::Builder;
use log::{debug, trace, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data_types::variants::Variant;
use crate::orientor::{Orientor, OrientorError};
use crate::path_preference::PathPreference;
use crate::replay::half_path::HalfPath;
use crate::replay::path::Path;
use crate::replay::{ReplayError, Side};

/// Default ceiling on the number of simultaneously unresolved paths
pub const DEFAULT_MAX_COMPLEXITY: usize = 50000;
/// Default ceiling on the number of iterations since the last single-path checkpoint
pub const DEFAULT_MAX_ITERATIONS: usize = 10000000;

#[derive(thiserror::Error, Debug)]
pub enum PathFinderError {
    #[error("baseline orientor {baseline} uses {baseline_haplotypes} haplotypes but calls orientor {calls} uses {calls_haplotypes}")]
    HaplotypeMismatch {
        baseline: Orientor,
        baseline_haplotypes: usize,
        calls: Orientor,
        calls_haplotypes: usize
    },
    #[error(transparent)]
    Orientor(#[from] OrientorError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("search on {sequence_name} ended without a finished path")]
    NoFinishedPath { sequence_name: String }
}

/// Controls the search
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct PathFinderConfig {
    /// Ranking for competing paths
    path_preference: PathPreference,
    /// Abandon a region once more than this many paths are unresolved
    max_complexity: usize,
    /// Abandon a region once this many iterations pass without reducing to a single path
    max_iterations: usize,
    /// If true, the caller runs a second allele-level pass to annotate alternate matches
    flag_alternates: bool,
    /// If true, paths where only one side included variants since the last sync point are dropped when they reach sync
    prune_noops: bool
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        Self {
            path_preference: PathPreference::MaxSumBoth,
            max_complexity: DEFAULT_MAX_COMPLEXITY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            flag_alternates: false,
            prune_noops: true
        }
    }
}

impl PathFinderConfig {
    // getters
    pub fn path_preference(&self) -> PathPreference {
        self.path_preference
    }

    pub fn max_complexity(&self) -> usize {
        self.max_complexity
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn flag_alternates(&self) -> bool {
        self.flag_alternates
    }

    pub fn prune_noops(&self) -> bool {
        self.prune_noops
    }
}

/// Advisory statistics from one search
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchDiagnostics {
    /// Largest number of unresolved paths seen in one region
    pub max_frontier_size: usize,
    /// The region, as `name:start-end` (1-based), where `max_frontier_size` was reached
    pub max_frontier_region: String,
    /// Regions that were abandoned because they were too complex
    pub too_complex_regions: Vec<String>
}

/// Search driver for one reference sequence
pub struct PathFinder {
    /// Name of the reference sequence, used in messages
    sequence_name: String,
    /// Reference bases
    template: Arc<[u8]>,
    /// Baseline variants in natural order
    baseline: Vec<Arc<Variant>>,
    /// Calls variants in natural order
    calls: Vec<Arc<Variant>>,
    baseline_orientor: Orientor,
    calls_orientor: Orientor,
    config: PathFinderConfig,
    /// Largest start of any variant branched on so far
    current_max_pos: i64,
    diagnostics: SearchDiagnostics
}

impl PathFinder {
    /// Creates a search over one reference sequence; the variants are sorted into natural order here.
    /// # Arguments
    /// * `sequence_name` - name of the reference sequence
    /// * `template` - the reference bases
    /// * `baseline` - baseline variants on this sequence
    /// * `calls` - calls variants on this sequence
    /// * `baseline_orientor` - orientation strategy for the baseline
    /// * `calls_orientor` - orientation strategy for the calls
    /// * `config` - search settings
    /// # Errors
    /// * if the two orientors disagree on the number of haplotypes
    pub fn new(
        sequence_name: &str, template: Arc<[u8]>,
        mut baseline: Vec<Arc<Variant>>, mut calls: Vec<Arc<Variant>>,
        baseline_orientor: Orientor, calls_orientor: Orientor,
        config: PathFinderConfig
    ) -> Result<Self, PathFinderError> {
        if baseline_orientor.haplotypes() != calls_orientor.haplotypes() {
            return Err(PathFinderError::HaplotypeMismatch {
                baseline: baseline_orientor,
                baseline_haplotypes: baseline_orientor.haplotypes(),
                calls: calls_orientor,
                calls_haplotypes: calls_orientor.haplotypes()
            });
        }
        baseline.sort();
        calls.sort();
        Ok(Self {
            sequence_name: sequence_name.to_string(),
            template,
            baseline,
            calls,
            baseline_orientor,
            calls_orientor,
            config,
            current_max_pos: 0,
            diagnostics: SearchDiagnostics::default()
        })
    }

    /// Runs the search and returns the best finished path.
    /// With no variants on either side this is a finished path with no history.
    /// # Errors
    /// * if an orientor cannot be applied to one of the variants
    /// * if replay detects misordered alleles
    pub fn best_path(&mut self) -> Result<Path, PathFinderError> {
        debug!("Starting path-finding for {} using {},{}", self.sequence_name, self.baseline_orientor, self.calls_orientor);
        let initial = Path::new(self.template.clone());
        let mut frontier: BTreeSet<Path> = BTreeSet::new();
        frontier.insert(initial.clone());

        let mut best: Option<Path> = None;
        let mut current_iterations: usize = 0;
        let mut current_max: usize = 0;
        let mut last_sync_path = initial;
        let mut last_sync_pos: i64 = 0;
        // (region, message) of the last abandoned region, reported once the search settles again
        let mut pending_warning: Option<(String, String)> = None;
        self.current_max_pos = 0;
        self.diagnostics = SearchDiagnostics::default();

        while let Some(mut head) = frontier.pop_first() {
            current_max = current_max.max(frontier.len() + 1);
            current_iterations += 1;
            trace!("Size: {} Range: {}-{} LocalIterations: {current_iterations}", frontier.len() + 1, last_sync_pos + 1, self.current_max_pos + 1);

            if frontier.is_empty() {
                if let Some(warning) = pending_warning.take() {
                    self.report_too_complex(warning);
                }
                let current_sync_pos = head.calls().position();
                if current_max > self.diagnostics.max_frontier_size {
                    self.diagnostics.max_frontier_size = current_max;
                    self.diagnostics.max_frontier_region = format!("{}:{}-{}", self.sequence_name, last_sync_pos + 1, current_sync_pos + 1);
                    debug!(
                        "Maximum path complexity now {}, at {} with {current_iterations} iterations",
                        self.diagnostics.max_frontier_size, self.diagnostics.max_frontier_region
                    );
                }
                current_max = 0;
                current_iterations = 0;
                last_sync_pos = current_sync_pos;
                last_sync_path = head.clone();
            } else if frontier.len() > self.config.max_complexity || current_iterations > self.config.max_iterations {
                let region = format!("{}:{}-{}", self.sequence_name, last_sync_pos + 1, self.current_max_pos + 2);
                let message = format!(
                    "Evaluation too complex ({} unresolved paths, {current_iterations} iterations) at reference region {region}. Variants in this region will not be included in results.",
                    frontier.len()
                );
                pending_warning = Some((region, message));
                frontier.clear();
                current_iterations = 0;
                head = last_sync_path.clone();
                self.skip_region(&mut head)?;
            }

            if head.finished() {
                let candidate = head.with_final_sync_point();
                best = Some(match best.take() {
                    Some(previous) => self.config.path_preference.better(candidate, previous),
                    None => candidate
                });
                continue;
            }

            if self.enqueue_variant(&mut frontier, &head, Side::Calls)? {
                continue;
            }
            if self.enqueue_variant(&mut frontier, &head, Side::Baseline)? {
                continue;
            }

            head.step()?;
            if head.in_sync() {
                if self.config.prune_noops && head.is_noop() {
                    trace!("Discarding no-op path at {}", head.calls().position());
                    continue;
                }
                self.skip_to_next_variant(&mut head)?;
            }

            if head.matches() {
                add_if_better(&mut frontier, head, self.config.path_preference);
            } else {
                trace!("Head mismatch, discard");
            }
        }

        if let Some(warning) = pending_warning.take() {
            self.report_too_complex(warning);
        }
        debug!(
            "Reference {} had maximum path complexity of {} at {}",
            self.sequence_name, self.diagnostics.max_frontier_size, self.diagnostics.max_frontier_region
        );
        best.ok_or_else(|| PathFinderError::NoFinishedPath { sequence_name: self.sequence_name.clone() })
    }

    fn report_too_complex(&mut self, (region, message): (String, String)) {
        warn!("{message}");
        self.diagnostics.too_complex_regions.push(region);
    }

    fn variants(&self, side: Side) -> &[Arc<Variant>] {
        match side {
            Side::Baseline => &self.baseline,
            Side::Calls => &self.calls
        }
    }

    fn orientor(&self, side: Side) -> &Orientor {
        match side {
            Side::Baseline => &self.baseline_orientor,
            Side::Calls => &self.calls_orientor
        }
    }

    /// Branches `head` on the next variant of one side if that variant is due at the current position.
    /// Returns true if the head was branched.
    fn enqueue_variant(&mut self, frontier: &mut BTreeSet<Path>, head: &Path, side: Side) -> Result<bool, PathFinderError> {
        let Some(index) = next_variant(head.half_path(side), self.variants(side)) else {
            return Ok(false);
        };
        self.current_max_pos = self.current_max_pos.max(self.variants(side)[index].start());
        let variant = &self.variants(side)[index];
        trace!("Add alternatives to {side} {variant}");

        let children = head.add_variant(side, variant, index, self.orientor(side))?;
        for child in children.into_iter() {
            add_if_better(frontier, child, self.config.path_preference);
        }
        Ok(true)
    }

    /// Restarts from a checkpoint past the abandoned region: every variant starting at or before `current_max_pos` is consumed without a decision
    fn skip_region(&self, head: &mut Path) -> Result<(), ReplayError> {
        let skip_before = self.current_max_pos + 1;
        for side in [Side::Calls, Side::Baseline] {
            let variants = self.variants(side);
            let first = head.half_path(side).next_variant_index();
            let mut next = first;
            while next < variants.len() && variants[next].start() < skip_before {
                next += 1;
            }
            if next > first {
                debug!("Skipped {side} variants before {}, variant index {first} -> {next}", skip_before + 1);
                head.skip_variants_to(side, next - 1);
            }
        }
        let last_template_pos = self.template.len() as i64 - 1;
        head.abandon_to(self.current_max_pos.min(last_template_pos))
    }

    /// Moves an in-sync path to just before the next variant on either side
    fn skip_to_next_variant(&self, head: &mut Path) -> Result<(), ReplayError> {
        let last_template_pos = self.template.len() as i64 - 1;
        let calls_next = self.future_variant_pos(head.calls(), Side::Calls);
        let baseline_next = self.future_variant_pos(head.baseline(), Side::Baseline);
        let next_pos = calls_next.min(baseline_next).min(last_template_pos) - 1;
        debug_assert_eq!(head.calls().position(), head.baseline().position());
        if next_pos > head.calls().position() {
            head.move_forward(next_pos)?;
        }
        Ok(())
    }

    /// Start of the next unconsumed variant, or the last template position if there is none
    fn future_variant_pos(&self, half_path: &HalfPath, side: Side) -> i64 {
        self.variants(side)
            .get(half_path.next_variant_index())
            .map(|v| v.start())
            .unwrap_or(self.template.len() as i64 - 1)
    }

    // getters
    pub fn diagnostics(&self) -> &SearchDiagnostics {
        &self.diagnostics
    }

    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }
}

/// Index of the next variant if it must be branched on before `half_path` can advance
fn next_variant(half_path: &HalfPath, variants: &[Arc<Variant>]) -> Option<usize> {
    let index = half_path.next_variant_index();
    let variant = variants.get(index)?;
    if variant.start() <= half_path.position() + 1 ||
        (half_path.wants_future_variant_bases() && variant.start() <= half_path.variant_end_position()) {
        Some(index)
    } else {
        None
    }
}

/// Adds a path to the frontier; if one with the same replay state is present, the preferred of the two is kept
fn add_if_better(frontier: &mut BTreeSet<Path>, path: Path, preference: PathPreference) {
    let replace = match frontier.get(&path) {
        Some(existing) => preference.compare(&path, existing) == Ordering::Greater,
        None => true
    };
    if replace {
        frontier.replace(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use rustc_hash::FxHashSet as HashSet;

    use crate::data_types::variants::{AlleleId, GenotypeSource};

    /// ACGT repeated; position p holds `ACGT[p % 4]`
    fn template(len: usize) -> Arc<[u8]> {
        (0..len).map(|i| b"ACGT"[i % 4]).collect::<Vec<u8>>().into()
    }

    fn variant(id: usize, position: i64, reference: &[u8], alts: &[&[u8]], genotype: (AlleleId, AlleleId)) -> Arc<Variant> {
        let alts: Vec<Vec<u8>> = alts.iter().map(|a| a.to_vec()).collect();
        let genotype = GenotypeSource::Sample { allele_a: genotype.0, allele_b: genotype.1, haploid: false };
        let mut v = Variant::new(id, Arc::from("chr1"), position, reference, &alts, genotype, false, None).unwrap();
        v.trim_alleles(true);
        Arc::new(v)
    }

    fn search(
        template: Arc<[u8]>, baseline: Vec<Arc<Variant>>, calls: Vec<Arc<Variant>>,
        orientor: Orientor, config: PathFinderConfig
    ) -> (Path, SearchDiagnostics) {
        let mut finder = PathFinder::new("chr1", template, baseline, calls, orientor, orientor, config).unwrap();
        let best = finder.best_path().unwrap();
        (best, finder.diagnostics().clone())
    }

    fn ids(variants: &[crate::data_types::oriented_variant::OrientedVariant]) -> Vec<usize> {
        variants.iter().map(|v| v.variant().id()).collect()
    }

    fn excluded_ids(variants: &[Arc<Variant>]) -> Vec<usize> {
        variants.iter().map(|v| v.id()).collect()
    }

    /// every input ID is in exactly one of the two lists
    fn assert_partitioned(included: &[usize], excluded: &[usize], total: usize) {
        let mut seen: HashSet<usize> = HashSet::default();
        for id in included.iter().chain(excluded.iter()) {
            assert!(seen.insert(*id), "variant {id} decided twice");
        }
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_exact_match() {
        let baseline = vec![variant(1, 100, b"A", &[b"G"], (0, 1))];
        let calls = vec![variant(1, 100, b"A", &[b"G"], (0, 1))];
        let (best, diagnostics) = search(template(300), baseline, calls, Orientor::Unphased, PathFinderConfig::default());

        assert!(best.finished());
        assert_eq!(ids(&best.calls_included()), vec![1]);
        assert_eq!(ids(&best.baseline_included()), vec![1]);
        assert!(best.calls_excluded().is_empty());
        assert!(best.baseline_excluded().is_empty());
        assert!(diagnostics.too_complex_regions.is_empty());

        let sync_points = best.sync_points();
        assert!(sync_points.iter().any(|s| s.position() >= 100 && s.called_tp_count() == 1 && s.baseline_tp_count() == 1));

        let (tp, fp) = Path::calculate_weights(&best, best.calls_included(), &best.baseline_included());
        assert!(fp.is_empty());
        assert_eq!(tp.len(), 1);
        assert_approx_eq!(tp[0].weight(), 1.0);
    }

    #[test]
    fn test_representational_shift() {
        // ACGT at 100..104; the baseline deletes CG, the calls delete ACG and insert A in front of the T
        let baseline = vec![variant(1, 100, b"ACG", &[b"A"], (0, 1))];
        let calls = vec![
            variant(1, 99, b"TACG", &[b"T"], (0, 1)),
            variant(2, 103, b"T", &[b"AT"], (0, 1))
        ];
        let template = template(200);
        let (best, _) = search(template.clone(), baseline, calls, Orientor::Unphased, PathFinderConfig::default());

        assert_eq!(ids(&best.calls_included()), vec![1, 2]);
        assert_eq!(ids(&best.baseline_included()), vec![1]);

        // both included lists replay to the same haplotypes
        let end = template.len() as i64;
        let calls_haplotypes = best.calls().dump_haplotypes(0, end).unwrap();
        let baseline_haplotypes = best.baseline().dump_haplotypes(0, end).unwrap();
        assert_eq!(calls_haplotypes, baseline_haplotypes);
        assert_eq!(calls_haplotypes.0.len() + calls_haplotypes.1.len(), 2 * template.len() - 2);

        let (tp, _) = Path::calculate_weights(&best, best.calls_included(), &best.baseline_included());
        assert_approx_eq!(tp.iter().map(|v| v.weight()).sum::<f64>(), 1.0);
    }

    #[test]
    fn test_genuine_mismatch() {
        let baseline = vec![variant(1, 100, b"A", &[b"G"], (0, 1))];
        let calls = vec![variant(1, 100, b"A", &[b"C"], (0, 1))];
        let (best, _) = search(template(300), baseline, calls, Orientor::Unphased, PathFinderConfig::default());

        assert!(best.calls_included().is_empty());
        assert!(best.baseline_included().is_empty());
        assert_eq!(excluded_ids(&best.calls_excluded()), vec![1]);
        assert_eq!(excluded_ids(&best.baseline_excluded()), vec![1]);
    }

    #[test]
    fn test_dense_cluster_abandoned() {
        let template = template(300);
        let snp = |id: usize, position: i64, alt: u8, genotype: (AlleleId, AlleleId)| {
            let reference = [template[position as usize]];
            variant(id, position, &reference, &[&[alt]], genotype)
        };
        let other_base = |position: i64, k: usize| -> u8 {
            let reference = template[position as usize];
            *b"ACGT".iter().filter(|&&b| b != reference).nth(k % 3).unwrap()
        };

        let baseline = vec![
            snp(1, 20, other_base(20, 0), (0, 1)),
            snp(2, 200, other_base(200, 1), (1, 1))
        ];
        let mut calls = vec![snp(1, 20, other_base(20, 0), (0, 1))];
        for k in 0..50 {
            let position = 100 + (k / 5) as i64;
            calls.push(snp(calls.len() + 1, position, other_base(position, k), (0, 1)));
        }
        calls.push(snp(calls.len() + 1, 200, other_base(200, 1), (1, 1)));
        assert_eq!(calls.len(), 52);

        let config = PathFinderConfigBuilder::default()
            .max_complexity(4)
            .build().unwrap();
        let (best, diagnostics) = search(template, baseline, calls, Orientor::Unphased, config);

        assert_eq!(diagnostics.too_complex_regions.len(), 1);
        assert!(diagnostics.too_complex_regions[0].starts_with("chr1:100-"));

        // the cluster is in neither list, the flanking SNPs still match
        assert_eq!(ids(&best.calls_included()), vec![1, 52]);
        assert!(best.calls_excluded().is_empty());
        assert_eq!(ids(&best.baseline_included()), vec![1, 2]);
        assert!(best.baseline_excluded().is_empty());
    }

    #[test]
    fn test_iteration_limit_abandoned() {
        let template = template(300);
        let other_base = |position: i64, k: usize| -> u8 {
            let reference = template[position as usize];
            *b"ACGT".iter().filter(|&&b| b != reference).nth(k % 3).unwrap()
        };
        let snp = |id: usize, position: i64, k: usize, genotype: (AlleleId, AlleleId)| {
            variant(id, position, &[template[position as usize]], &[&[other_base(position, k)]], genotype)
        };

        let baseline = vec![snp(1, 20, 0, (0, 1)), snp(2, 200, 1, (1, 1))];
        let mut calls = vec![snp(1, 20, 0, (0, 1))];
        // thirty calls stacked on one base, each needs its own branching step
        for k in 0..30 {
            calls.push(snp(calls.len() + 1, 100, k, (0, 1)));
        }
        calls.push(snp(calls.len() + 1, 200, 1, (1, 1)));

        // the frontier stays small, only the iteration bound can trip
        let config = PathFinderConfigBuilder::default()
            .max_iterations(50)
            .build().unwrap();
        let (best, diagnostics) = search(template, baseline, calls, Orientor::Unphased, config);

        assert_eq!(diagnostics.too_complex_regions.len(), 1);
        assert!(diagnostics.too_complex_regions[0].starts_with("chr1:100-"));

        // the stacked calls are undecided, the flanking SNPs still match
        assert_eq!(ids(&best.calls_included()), vec![1, 32]);
        assert!(best.calls_excluded().is_empty());
        assert_eq!(ids(&best.baseline_included()), vec![1, 2]);
        assert!(best.baseline_excluded().is_empty());
    }

    #[test]
    fn test_noop_pruning_policy() {
        // the calls delete AC at 100 and insert AC at 102, which replays to the template
        let baseline = vec![variant(1, 200, b"A", &[b"G"], (1, 1))];
        let calls = vec![
            variant(1, 99, b"TAC", &[b"T"], (1, 1)),
            variant(2, 101, b"C", &[b"CAC"], (1, 1)),
            variant(3, 200, b"A", &[b"G"], (1, 1))
        ];

        for prune_noops in [true, false] {
            let config = PathFinderConfigBuilder::default()
                .prune_noops(prune_noops)
                .build().unwrap();
            let (best, diagnostics) = search(template(300), baseline.clone(), calls.clone(), Orientor::Unphased, config);
            assert!(diagnostics.too_complex_regions.is_empty());

            // a calls-only change with no baseline counterpart never wins
            assert_eq!(ids(&best.calls_included()), vec![3]);
            assert_eq!(excluded_ids(&best.calls_excluded()), vec![1, 2]);
            assert_eq!(ids(&best.baseline_included()), vec![1]);
        }
    }

    #[test]
    fn test_squash_ploidy() {
        let baseline = vec![variant(1, 100, b"A", &[b"G"], (0, 1))];
        let calls = vec![variant(1, 100, b"A", &[b"G"], (1, 1))];

        // diploid comparison cannot reconcile a het with a hom
        let (strict, _) = search(template(300), baseline.clone(), calls.clone(), Orientor::Unphased, PathFinderConfig::default());
        assert!(strict.calls_included().is_empty());

        let (squashed, _) = search(template(300), baseline, calls, Orientor::SquashPloidy, PathFinderConfig::default());
        assert_eq!(ids(&squashed.calls_included()), vec![1]);
        assert_eq!(ids(&squashed.baseline_included()), vec![1]);
    }

    #[test]
    fn test_swapped_alleles() {
        // a 1/2 genotype with the ALTs listed in the opposite order
        let baseline = vec![variant(1, 100, b"A", &[b"C", b"G"], (1, 2))];
        let calls = vec![variant(1, 100, b"A", &[b"G", b"C"], (1, 2))];
        let (best, _) = search(template(300), baseline, calls, Orientor::Unphased, PathFinderConfig::default());
        assert_eq!(ids(&best.calls_included()), vec![1]);
        assert_eq!(ids(&best.baseline_included()), vec![1]);
    }

    #[test]
    fn test_partition_and_conservation() {
        let baseline = vec![
            variant(1, 40, b"A", &[b"T"], (1, 1)),
            variant(2, 60, b"A", &[b"C"], (0, 1)),
            variant(3, 100, b"ACG", &[b"A"], (0, 1)),
            variant(4, 150, b"G", &[b"T"], (0, 1))
        ];
        let calls = vec![
            variant(1, 40, b"A", &[b"T"], (1, 1)),
            variant(2, 61, b"C", &[b"G"], (0, 1)),
            variant(3, 99, b"TACG", &[b"T"], (0, 1)),
            variant(4, 103, b"T", &[b"AT"], (0, 1)),
            variant(5, 150, b"G", &[b"T"], (0, 1))
        ];
        let (best, diagnostics) = search(template(300), baseline, calls, Orientor::Unphased, PathFinderConfig::default());
        assert!(diagnostics.too_complex_regions.is_empty());

        assert_partitioned(&ids(&best.calls_included()), &excluded_ids(&best.calls_excluded()), 5);
        assert_partitioned(&ids(&best.baseline_included()), &excluded_ids(&best.baseline_excluded()), 4);
        assert_eq!(ids(&best.calls_included()), vec![1, 3, 4, 5]);
        assert_eq!(ids(&best.baseline_included()), vec![1, 3, 4]);

        let baseline_tps = best.baseline_included();
        let (tp, fp) = Path::calculate_weights(&best, best.calls_included(), &baseline_tps);
        assert!(fp.is_empty());
        assert_approx_eq!(tp.iter().map(|v| v.weight()).sum::<f64>(), baseline_tps.len() as f64);

        // per interval as well
        let mut previous = i64::MIN;
        for sync_point in best.sync_points() {
            let interval_weight: f64 = tp.iter()
                .filter(|v| v.start() > previous && v.start() <= sync_point.position())
                .map(|v| v.weight())
                .sum();
            assert!((interval_weight - sync_point.baseline_tp_count() as f64).abs() < 1e-9);
            previous = sync_point.position();
        }
    }

    #[test]
    fn test_deterministic() {
        let build = || {
            let baseline = vec![
                variant(1, 100, b"ACG", &[b"A"], (0, 1)),
                variant(2, 120, b"A", &[b"G"], (1, 1))
            ];
            let calls = vec![
                variant(1, 99, b"TACG", &[b"T"], (0, 1)),
                variant(2, 103, b"T", &[b"AT"], (1, 0)),
                variant(3, 120, b"A", &[b"G"], (1, 1))
            ];
            search(template(200), baseline, calls, Orientor::Unphased, PathFinderConfig::default()).0
        };
        let first = build();
        let second = build();
        assert_eq!(first, second);
        let orientation = |p: &Path| -> Vec<(usize, AlleleId, AlleleId)> {
            p.calls_included().iter().map(|v| (v.variant().id(), v.allele_a(), v.allele_b())).collect()
        };
        assert_eq!(orientation(&first), orientation(&second));
        assert_eq!(first.sync_point_positions(), second.sync_point_positions());
    }

    #[test]
    fn test_empty_input() {
        let (best, diagnostics) = search(template(50), vec![], vec![], Orientor::Unphased, PathFinderConfig::default());
        assert!(best.finished());
        assert!(best.calls_included().is_empty());
        assert!(best.baseline_excluded().is_empty());
        assert_eq!(best.sync_point_count(), 1);
        assert!(diagnostics.too_complex_regions.is_empty());

        let (best, _) = search(Arc::from(b"".as_slice()), vec![], vec![], Orientor::Unphased, PathFinderConfig::default());
        assert!(best.finished());
    }

    #[test]
    fn test_haplotype_mismatch() {
        let result = PathFinder::new("chr1", template(10), vec![], vec![], Orientor::Unphased, Orientor::SquashPloidy, PathFinderConfig::default());
        assert!(matches!(result, Err(PathFinderError::HaplotypeMismatch { baseline_haplotypes: 2, calls_haplotypes: 1, .. })));
    }

    #[test]
    fn test_config_builder() {
        let config = PathFinderConfigBuilder::default()
            .path_preference(PathPreference::MaxCallsMinBaseline)
            .prune_noops(false)
            .build().unwrap();
        assert_eq!(config.path_preference(), PathPreference::MaxCallsMinBaseline);
        assert_eq!(config.max_complexity(), DEFAULT_MAX_COMPLEXITY);
        assert_eq!(config.max_iterations(), DEFAULT_MAX_ITERATIONS);
        assert!(!config.prune_noops());
        assert!(!config.flag_alternates());
    }
}
