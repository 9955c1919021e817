
use std::cmp::Ordering;
use std::sync::Arc;

use crate::data_types::oriented_variant::OrientedVariant;
use crate::data_types::variants::Variant;
use crate::replay::ReplayError;
use crate::replay::haplotype_playback::HaplotypePlayback;
use crate::util::linked_list::LinkedHistory;

/// One side (baseline or calls) of a candidate path: the replay of up to two haplotypes and the decisions that produced it.
/// Haplotype B is only allocated once something makes it differ from haplotype A; until then it mirrors A.
#[derive(Clone, Debug)]
pub struct HalfPath {
    /// First haplotype
    haplotype_a: HaplotypePlayback,
    /// Second haplotype, None while it is identical to the first
    haplotype_b: Option<HaplotypePlayback>,
    /// Variants included on this side, most recent first
    included: LinkedHistory<OrientedVariant>,
    /// Variants excluded on this side, most recent first
    excluded: LinkedHistory<Arc<Variant>>,
    /// Index of the last variant that was included, excluded, or skipped
    last_variant_index: Option<usize>,
    /// Furthest end of any included or excluded variant
    variant_end_position: i64,
    /// Furthest end of any included variant
    included_end_position: i64
}

impl HalfPath {
    /// Creates an empty half path over a template
    pub fn new(template: Arc<[u8]>) -> Self {
        Self {
            haplotype_a: HaplotypePlayback::new(template),
            haplotype_b: None,
            included: LinkedHistory::new(),
            excluded: LinkedHistory::new(),
            last_variant_index: None,
            variant_end_position: 0,
            included_end_position: 0
        }
    }

    /// Returns true if the orientation can be included without overlapping already included alleles on either haplotype
    pub fn is_new(&self, variant: &OrientedVariant) -> bool {
        self.haplotype_a.is_new(variant.nt_allele_a()) &&
            self.haplotype_b().is_new(variant.nt_allele_b())
    }

    /// Includes an oriented variant, feeding its alleles to the haplotypes
    /// # Arguments
    /// * `variant` - the orientation to include
    /// * `index` - index of the variant in the sorted input, must be greater than any previous index
    pub fn include(&mut self, variant: OrientedVariant, index: usize) {
        self.advance_index(index);
        self.variant_end_position = self.variant_end_position.max(variant.end());
        self.included_end_position = self.included_end_position.max(variant.end());

        if self.haplotype_b.is_none() && variant.is_heterozygous() {
            self.haplotype_b = Some(self.haplotype_a.clone());
        }
        self.haplotype_a.add_allele(variant.nt_allele_a());
        if let Some(haplotype_b) = self.haplotype_b.as_mut() {
            haplotype_b.add_allele(variant.nt_allele_b());
        }
        self.included = self.included.prepend(variant);
    }

    /// Records that a variant was excluded; the haplotypes are unaffected
    /// # Arguments
    /// * `variant` - the excluded variant
    /// * `index` - index of the variant in the sorted input, must be greater than any previous index
    pub fn exclude(&mut self, variant: Arc<Variant>, index: usize) {
        self.advance_index(index);
        self.variant_end_position = self.variant_end_position.max(variant.end());
        self.excluded = self.excluded.prepend(variant);
    }

    /// Marks every variant up to and including `index` as consumed without recording them in either history
    pub fn skip_variants_to(&mut self, index: usize) {
        self.advance_index(index);
    }

    fn advance_index(&mut self, index: usize) {
        assert!(
            self.last_variant_index.map_or(true, |last| last < index),
            "variant index must strictly increase: {index} after {:?}", self.last_variant_index
        );
        self.last_variant_index = Some(index);
    }

    /// Index of the first variant that has not been consumed yet
    pub fn next_variant_index(&self) -> usize {
        self.last_variant_index.map(|i| i + 1).unwrap_or(0)
    }

    fn ensure_haplotype_b(&mut self) {
        if self.haplotype_b.is_none() {
            self.haplotype_b = Some(self.haplotype_a.clone());
        }
    }

    /// Advances both haplotypes by one base
    /// # Errors
    /// * if replay finds alleles out of order
    pub fn step(&mut self) -> Result<(), ReplayError> {
        self.haplotype_a.step()?;
        if let Some(haplotype_b) = self.haplotype_b.as_mut() {
            haplotype_b.step()?;
        }
        Ok(())
    }

    /// Advances only haplotype A
    /// # Errors
    /// * if replay finds alleles out of order
    pub fn haplotype_a_step(&mut self) -> Result<(), ReplayError> {
        self.ensure_haplotype_b();
        self.haplotype_a.step()
    }

    /// Advances only haplotype B
    /// # Errors
    /// * if replay finds alleles out of order
    pub fn haplotype_b_step(&mut self) -> Result<(), ReplayError> {
        self.ensure_haplotype_b();
        match self.haplotype_b.as_mut() {
            Some(haplotype_b) => haplotype_b.step(),
            None => Ok(())
        }
    }

    /// Jumps both haplotypes to a template position
    /// # Errors
    /// * if either haplotype is inside an allele
    pub fn move_forward(&mut self, position: i64) -> Result<(), ReplayError> {
        self.haplotype_a.move_forward(position)?;
        if let Some(haplotype_b) = self.haplotype_b.as_mut() {
            haplotype_b.move_forward(position)?;
        }
        Ok(())
    }

    /// Abandons any partially replayed alleles and lands both haplotypes on `position` (or leaves them if already past it)
    /// # Errors
    /// * if the haplotypes cannot be moved
    pub fn abandon_to(&mut self, position: i64) -> Result<(), ReplayError> {
        for haplotype in std::iter::once(&mut self.haplotype_a).chain(self.haplotype_b.as_mut()) {
            haplotype.abandon_pending();
            if haplotype.template_position() < position {
                haplotype.move_forward(position)?;
            }
        }
        Ok(())
    }

    /// Compares the template positions of the two haplotypes; a finished haplotype counts as ahead
    pub fn compare_haplotype_positions(&self) -> Ordering {
        let haplotype_b = self.haplotype_b();
        match (self.haplotype_a.is_finished(), haplotype_b.is_finished()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => self.haplotype_a.template_position().cmp(&haplotype_b.template_position())
        }
    }

    /// The furthest template position of the two haplotypes
    pub fn position(&self) -> i64 {
        self.haplotype_a.template_position().max(self.haplotype_b().template_position())
    }

    /// True if both haplotypes are reading from the template
    pub fn is_on_template(&self) -> bool {
        self.haplotype_a.is_on_template() && self.haplotype_b().is_on_template()
    }

    pub fn wants_future_variant_bases(&self) -> bool {
        self.haplotype_a.wants_future_variant_bases() || self.haplotype_b().wants_future_variant_bases()
    }

    /// Per-base equality of both haplotypes against the other side
    pub fn matches(&self, other: &HalfPath) -> bool {
        self.haplotype_a.matches(&other.haplotype_a) &&
            self.haplotype_b().matches(other.haplotype_b())
    }

    pub fn finished_haplotype_a(&self) -> bool {
        self.haplotype_a.is_finished()
    }

    pub fn finished_haplotype_b(&self) -> bool {
        self.haplotype_b().is_finished()
    }

    /// True once both haplotypes have replayed the entire template
    pub fn finished(&self) -> bool {
        self.finished_haplotype_a() && self.finished_haplotype_b()
    }

    pub fn next_haplotype_a_base(&self) -> u8 {
        self.haplotype_a.nt()
    }

    pub fn next_haplotype_b_base(&self) -> u8 {
        self.haplotype_b().nt()
    }

    /// Included variants in the order they were added
    pub fn included(&self) -> Vec<OrientedVariant> {
        self.included.to_vec_oldest_first()
    }

    /// Excluded variants in the order they were added
    pub fn excluded(&self) -> Vec<Arc<Variant>> {
        self.excluded.to_vec_oldest_first()
    }

    /// Replays the included variants from scratch and returns the bases of each haplotype that fall within `[start, end)`.
    /// Bases of an allele are reported at the allele start position.
    /// # Arguments
    /// * `start` - first template position to report
    /// * `end` - template position to stop reporting at
    /// # Errors
    /// * if the included variants cannot be replayed
    pub fn dump_haplotypes(&self, start: i64, end: i64) -> Result<(Vec<u8>, Vec<u8>), ReplayError> {
        let template = self.haplotype_a.template().clone();
        let mut replay_a = HaplotypePlayback::new(template.clone());
        let mut replay_b = HaplotypePlayback::new(template);
        for variant in self.included.to_vec_oldest_first() {
            replay_a.add_allele(variant.nt_allele_a());
            replay_b.add_allele(variant.nt_allele_b());
        }

        let collect = |playback: &mut HaplotypePlayback| -> Result<Vec<u8>, ReplayError> {
            let mut bases = vec![];
            while playback.has_next() {
                playback.next()?;
                let position = playback.template_position();
                if position >= end {
                    break;
                }
                if position >= start {
                    bases.push(playback.nt());
                }
            }
            Ok(bases)
        };
        let hap_a = collect(&mut replay_a)?;
        let hap_b = collect(&mut replay_b)?;
        Ok((hap_a, hap_b))
    }

    /// Haplotype B, or haplotype A when B has not diverged yet
    fn haplotype_b(&self) -> &HaplotypePlayback {
        self.haplotype_b.as_ref().unwrap_or(&self.haplotype_a)
    }

    // getters
    pub fn haplotype_a(&self) -> &HaplotypePlayback {
        &self.haplotype_a
    }

    pub fn has_haplotype_b(&self) -> bool {
        self.haplotype_b.is_some()
    }

    pub fn last_variant_index(&self) -> Option<usize> {
        self.last_variant_index
    }

    pub fn variant_end_position(&self) -> i64 {
        self.variant_end_position
    }

    pub fn included_end_position(&self) -> i64 {
        self.included_end_position
    }

    pub fn included_count(&self) -> usize {
        self.included.len()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Iterates included variants from most recent to oldest
    pub fn included_history(&self) -> impl Iterator<Item = &OrientedVariant> {
        self.included.iter()
    }
}

impl Ord for HalfPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.haplotype_a.template_position().cmp(&other.haplotype_a.template_position())
            .then_with(|| self.haplotype_a.cmp(&other.haplotype_a))
            .then_with(|| self.haplotype_b().cmp(other.haplotype_b()))
    }
}

impl PartialOrd for HalfPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Equality is replay-state equality; the histories are not compared
impl PartialEq for HalfPath {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HalfPath {}
