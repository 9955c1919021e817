
use itertools::Itertools;
use serde::Serialize;
use std::iter::Peekable;
use std::sync::Arc;

use crate::data_types::oriented_variant::OrientedVariant;
use crate::data_types::variants::Variant;
use crate::replay::path::Path;

/// Phasing consistency of the calls against the baseline along a best path
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PhasingCounts {
    /// Phased calls whose phase change relative to the previous phased call agrees with the baseline
    pub correct_phasings: u64,
    /// Phased calls whose phase change relative to the previous phased call disagrees with the baseline
    pub misphasings: u64,
    /// Phased calls in sync regions where the baseline itself is not consistently phased
    pub unphaseable: u64
}

impl std::ops::AddAssign for PhasingCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.correct_phasings += rhs.correct_phasings;
        self.misphasings += rhs.misphasings;
        self.unphaseable += rhs.unphaseable;
    }
}

/// Compact view of one decided variant for phasing purposes
#[derive(Clone, Copy, Debug)]
struct PhaseSummary {
    start: i64,
    phased: bool,
    included: bool,
    /// Orientation chosen for the variant, always false for excluded variants
    phase: bool
}

impl PhaseSummary {
    fn included(variant: &OrientedVariant) -> Self {
        Self {
            start: variant.start(),
            phased: variant.variant().is_phased(),
            included: true,
            phase: variant.is_allele_a()
        }
    }

    fn excluded(variant: &Variant) -> Self {
        Self {
            start: variant.start(),
            phased: variant.is_phased(),
            included: false,
            phase: false
        }
    }
}

/// Merges the included and excluded variants of one side into a single stream in template order.
/// Excluded variants are kept so that a false positive can bridge a phasing run.
fn merged_summaries(included: &[OrientedVariant], excluded: &[Arc<Variant>]) -> Vec<PhaseSummary> {
    included.iter().map(PhaseSummary::included)
        .merge_by(excluded.iter().map(|v| PhaseSummary::excluded(v)), |a, b| a.start <= b.start)
        .collect()
}

/// Pulls every summary starting before `position` off the front of the stream
fn take_before<I: Iterator<Item = PhaseSummary>>(stream: &mut Peekable<I>, position: i64) -> Vec<PhaseSummary> {
    let mut section = vec![];
    while let Some(summary) = stream.next_if(|s| s.start < position) {
        section.push(summary);
    }
    section
}

/// True if every variant in the group is phased with the same orientation; an empty group is trivially in phase
fn group_in_phase(group: &[PhaseSummary]) -> bool {
    match group.first() {
        None => true,
        Some(first) => first.phased && group.iter().all(|s| s.phased && s.phase == first.phase)
    }
}

/// Counts correct phasings, misphasings and unphaseable calls along the best path.
/// Within each sync region the baseline must be consistently phased; a phased call then continues its phasing run,
/// and is a misphasing when its phase flips relative to the previous phased call without a matching flip in the baseline.
/// # Arguments
/// * `best` - the best path of a search, including its final sync point
pub fn count_misphasings(best: &Path) -> PhasingCounts {
    let mut baseline = merged_summaries(&best.baseline_included(), &best.baseline_excluded()).into_iter().peekable();
    let mut calls = merged_summaries(&best.calls_included(), &best.calls_excluded()).into_iter().peekable();

    let mut counts = PhasingCounts::default();
    let mut base_is_phased = false;
    let mut base_phase = false;
    let mut call_is_phased = false;
    let mut call_phase = false;
    for position in best.sync_point_positions() {
        let baseline_section = take_before(&mut baseline, position);
        let call_section = take_before(&mut calls, position);

        if !group_in_phase(&baseline_section) {
            counts.unphaseable += call_section.iter().filter(|s| s.phased).count() as u64;
            base_is_phased = false;
            call_is_phased = false;
            continue;
        }

        // set when the baseline orientation flipped going into this region
        let mut transition = false;
        if !base_is_phased {
            call_is_phased = false;
        }
        for summary in baseline_section.iter() {
            if summary.phased {
                if base_phase != summary.phase {
                    transition = true;
                }
                base_is_phased = true;
            }
            base_phase = summary.phase;
        }

        for call in call_section.iter() {
            if !call.phased {
                call_is_phased = false;
            } else if !call_is_phased {
                // start of a phasing run
                call_is_phased = true;
                call_phase = call.phase;
            } else if call.included {
                let call_transition = call.phase != call_phase;
                if call_transition == transition {
                    counts.correct_phasings += 1;
                } else {
                    counts.misphasings += 1;
                }
                call_phase = call.phase;
            }
            transition = false;
        }
    }
    counts
}
