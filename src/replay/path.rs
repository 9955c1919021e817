
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::data_types::oriented_variant::OrientedVariant;
use crate::data_types::variants::Variant;
use crate::orientor::{Orientor, OrientorError};
use crate::replay::half_path::HalfPath;
use crate::replay::{ReplayError, Side};
use crate::util::linked_list::LinkedHistory;

/// A position where both sides rest on the template in agreement, with the included counts of the interval that ends there
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SyncPoint {
    /// 0-based template position of the sync point
    position: i64,
    /// Number of included calls variants starting in the interval ending at this point
    called_tp_count: usize,
    /// Number of included baseline variants starting in the interval ending at this point
    baseline_tp_count: usize
}

impl SyncPoint {
    pub fn new(position: i64, called_tp_count: usize, baseline_tp_count: usize) -> Self {
        Self {
            position,
            called_tp_count,
            baseline_tp_count
        }
    }

    // getters
    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn called_tp_count(&self) -> usize {
        self.called_tp_count
    }

    pub fn baseline_tp_count(&self) -> usize {
        self.baseline_tp_count
    }
}

/// One candidate reconciliation of the baseline and calls up to some template position.
/// Paths are extended by cloning; a path that sits in the search frontier is never changed.
#[derive(Clone, Debug)]
pub struct Path {
    /// The calls side
    calls: HalfPath,
    /// The baseline side
    baseline: HalfPath,
    /// Sync point positions, most recent first
    sync_points: LinkedHistory<i64>,
    /// Calls variants included since the last sync point
    calls_since_sync: usize,
    /// Baseline variants included since the last sync point
    baseline_since_sync: usize
}

impl Path {
    /// Creates an empty path over a template
    pub fn new(template: Arc<[u8]>) -> Self {
        Self {
            calls: HalfPath::new(template.clone()),
            baseline: HalfPath::new(template),
            sync_points: LinkedHistory::new(),
            calls_since_sync: 0,
            baseline_since_sync: 0
        }
    }

    /// Returns the half path for one side
    pub fn half_path(&self, side: Side) -> &HalfPath {
        match side {
            Side::Baseline => &self.baseline,
            Side::Calls => &self.calls
        }
    }

    fn half_path_mut(&mut self, side: Side) -> &mut HalfPath {
        match side {
            Side::Baseline => &mut self.baseline,
            Side::Calls => &mut self.calls
        }
    }

    /// Builds every child of this path for one decision on `variant`: the exclusion first, then one inclusion per orientation that fits.
    /// If this path is in sync, the children record a new sync point at the current position.
    /// # Arguments
    /// * `side` - the side the variant belongs to
    /// * `variant` - the next unconsumed variant on that side
    /// * `index` - index of `variant` in the sorted input of that side
    /// * `orientor` - strategy that enumerates the orientations of `variant`
    /// # Errors
    /// * if the orientor cannot be applied to the variant
    pub fn add_variant(&self, side: Side, variant: &Arc<Variant>, index: usize, orientor: &Orientor) -> Result<Vec<Path>, OrientorError> {
        let orientations = orientor.orientations(variant)?;

        let mut parent = self.clone();
        if self.in_sync() {
            let position = self.calls.position();
            if self.sync_points.front() != Some(&position) {
                parent.sync_points = self.sync_points.prepend(position);
            }
            parent.calls_since_sync = 0;
            parent.baseline_since_sync = 0;
        }

        let mut paths = Vec::with_capacity(orientations.len() + 1);
        let mut exclude = parent.clone();
        exclude.half_path_mut(side).exclude(variant.clone(), index);
        paths.push(exclude);

        for orientation in orientations.into_iter() {
            if self.half_path(side).is_new(&orientation) {
                let mut include = parent.clone();
                include.half_path_mut(side).include(orientation, index);
                match side {
                    Side::Baseline => include.baseline_since_sync += 1,
                    Side::Calls => include.calls_since_sync += 1
                };
                paths.push(include);
            }
        }
        Ok(paths)
    }

    /// Consumes variants on one side up to and including `index` without a decision, used when abandoning a region
    pub fn skip_variants_to(&mut self, side: Side, index: usize) {
        self.half_path_mut(side).skip_variants_to(index);
    }

    /// True when all four haplotypes are on the template at the same position and past every variant seen so far
    pub fn in_sync(&self) -> bool {
        self.calls.compare_haplotype_positions() == Ordering::Equal &&
            self.baseline.compare_haplotype_positions() == Ordering::Equal &&
            self.calls.position() == self.baseline.position() &&
            self.calls.position() >= self.calls.variant_end_position() &&
            self.baseline.position() >= self.baseline.variant_end_position() &&
            self.calls.is_on_template() &&
            self.baseline.is_on_template()
    }

    /// True for a path in sync where exactly one side included variants since the last sync point.
    /// Those variants replay to nothing, so the match is spurious.
    pub fn is_noop(&self) -> bool {
        self.in_sync() && ((self.calls_since_sync == 0) != (self.baseline_since_sync == 0))
    }

    /// Advances one base; a lagging haplotype catches up before both move together
    /// # Errors
    /// * if replay finds alleles out of order
    pub fn step(&mut self) -> Result<(), ReplayError> {
        match self.calls.compare_haplotype_positions() {
            Ordering::Greater => {
                self.calls.haplotype_b_step()?;
                self.baseline.haplotype_b_step()
            },
            Ordering::Less => {
                self.calls.haplotype_a_step()?;
                self.baseline.haplotype_a_step()
            },
            Ordering::Equal => {
                self.calls.step()?;
                self.baseline.step()
            }
        }
    }

    /// True if the current bases of both sides agree
    pub fn matches(&self) -> bool {
        self.calls.matches(&self.baseline)
    }

    /// True once both sides have replayed the whole template
    pub fn finished(&self) -> bool {
        self.calls.finished() && self.baseline.finished()
    }

    /// Moves both sides to a template position
    /// # Errors
    /// * if either side is inside an allele
    pub fn move_forward(&mut self, position: i64) -> Result<(), ReplayError> {
        self.calls.move_forward(position)?;
        self.baseline.move_forward(position)
    }

    /// Drops partially replayed alleles on both sides and lands them on `position`
    /// # Errors
    /// * if either side cannot be moved
    pub fn abandon_to(&mut self, position: i64) -> Result<(), ReplayError> {
        self.calls.abandon_to(position)?;
        self.baseline.abandon_to(position)
    }

    /// Returns a copy with a closing sync point at the current calls position, used once the path is finished
    pub fn with_final_sync_point(&self) -> Path {
        let mut path = self.clone();
        path.sync_points = self.sync_points.prepend(self.calls.position());
        path
    }

    /// Sync point positions in template order
    pub fn sync_point_positions(&self) -> Vec<i64> {
        self.sync_points.to_vec_oldest_first()
    }

    /// Sync points with the number of included variants on each side that start in each interval
    pub fn sync_points(&self) -> Vec<SyncPoint> {
        count_sync_intervals(&self.sync_point_positions(), &self.baseline.included(), &self.calls.included())
    }

    /// Weights the calls true positives so that, within each sync interval, their weights sum to the baseline true positive count.
    /// A call in an interval without any baseline true positive is returned as a false positive instead.
    /// # Arguments
    /// * `best` - the winning path, which provides the sync points
    /// * `called_tps` - included calls variants in template order
    /// * `baseline_tps` - included baseline variants in template order
    /// # Returns
    /// * `(true positives with weights set, demoted false positives)`
    pub fn calculate_weights(best: &Path, called_tps: Vec<OrientedVariant>, baseline_tps: &[OrientedVariant]) -> (Vec<OrientedVariant>, Vec<OrientedVariant>) {
        let mut positions = best.sync_point_positions();
        if positions.is_empty() {
            positions.push(i64::MAX);
        }
        let intervals = count_sync_intervals(&positions, baseline_tps, &called_tps);

        let mut tp = Vec::with_capacity(called_tps.len());
        let mut fp = vec![];
        let mut interval_index = 0;
        let mut interval_start = 0;
        for mut variant in called_tps.into_iter() {
            while intervals[interval_index].position < variant.start() && interval_index + 1 < intervals.len() {
                interval_start = intervals[interval_index].position;
                interval_index += 1;
            }
            let interval = &intervals[interval_index];
            if interval.baseline_tp_count == 0 {
                debug!(
                    "Called variant {variant} demoted to false positive, no baseline variants in sync region {}:{}-{}",
                    variant.variant().sequence_name(), interval_start + 1, interval.position + 1
                );
                fp.push(variant);
            } else {
                variant.set_weight(interval.baseline_tp_count as f64 / interval.called_tp_count as f64);
                tp.push(variant);
            }
        }
        (tp, fp)
    }

    /// Included calls variants in template order
    pub fn calls_included(&self) -> Vec<OrientedVariant> {
        self.calls.included()
    }

    /// Excluded calls variants in template order
    pub fn calls_excluded(&self) -> Vec<Arc<Variant>> {
        self.calls.excluded()
    }

    /// Included baseline variants in template order
    pub fn baseline_included(&self) -> Vec<OrientedVariant> {
        self.baseline.included()
    }

    /// Excluded baseline variants in template order
    pub fn baseline_excluded(&self) -> Vec<Arc<Variant>> {
        self.baseline.excluded()
    }

    // getters
    pub fn calls(&self) -> &HalfPath {
        &self.calls
    }

    pub fn baseline(&self) -> &HalfPath {
        &self.baseline
    }

    pub fn calls_since_sync(&self) -> usize {
        self.calls_since_sync
    }

    pub fn baseline_since_sync(&self) -> usize {
        self.baseline_since_sync
    }

    pub fn sync_point_count(&self) -> usize {
        self.sync_points.len()
    }
}

/// Counts, for each sync position, the variants on each side that start after the previous sync position and at or before this one
fn count_sync_intervals(positions: &[i64], baseline: &[OrientedVariant], called: &[OrientedVariant]) -> Vec<SyncPoint> {
    let mut baseline_index = 0;
    let mut called_index = 0;
    positions.iter()
        .map(|&position| {
            let baseline_start = baseline_index;
            while baseline_index < baseline.len() && baseline[baseline_index].start() <= position {
                baseline_index += 1;
            }
            let called_start = called_index;
            while called_index < called.len() && called[called_index].start() <= position {
                called_index += 1;
            }
            SyncPoint::new(position, called_index - called_start, baseline_index - baseline_start)
        })
        .collect()
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.calls.cmp(&other.calls)
            .then_with(|| self.baseline.cmp(&other.baseline))
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Path {}
