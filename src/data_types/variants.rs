
use itertools::Itertools;
use log::trace;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::data_types::allele::Allele;

/// Allele identifier within a Variant; 0 is the reference, 1.. are the alternates, -1 is missing
pub type AlleleId = i32;
/// Allele identifier for an explicit missing / unknown allele (e.g. `.` in a genotype)
pub const MISSING_ALLELE: AlleleId = -1;
/// Allele identifier for the reference allele
pub const REFERENCE_ALLELE: AlleleId = 0;
/// Base used for the explicit half-call token
const UNKNOWN_NUCLEOTIDE: u8 = b'N';

#[derive(thiserror::Error, Debug)]
pub enum VariantError {
    #[error("reference allele must not be empty")]
    EmptyReference,
    #[error("a variant must have at least one alternate allele")]
    NoAlternates,
    #[error("alternate allele #{index} is empty or symbolic")]
    InvalidAlternate { index: usize },
    #[error("genotype allele {allele} is not defined; record has {num_alleles} alleles")]
    UndefinedGenotypeAllele { allele: AlleleId, num_alleles: usize },
    #[error("genotype must have 1 or 2 alleles, found {count}")]
    UnsupportedPloidy { count: usize }
}

/// Describes where the allele-to-haplotype information of a Variant came from.
/// This controls which comparison strategies can be applied to the Variant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum GenotypeSource {
    /// A single sample genotype; haploid calls have `allele_a == allele_b` and `haploid` set
    Sample {
        allele_a: AlleleId,
        allele_b: AlleleId,
        haploid: bool
    },
    /// A population record without a sample genotype, every ALT is a candidate
    Population,
    /// Genotypes of the two parents, ordered (first, second) within each parent
    Parental {
        paternal: (AlleleId, AlleleId),
        maternal: (AlleleId, AlleleId)
    }
}

impl GenotypeSource {
    /// Returns the allele IDs that are referenced by this genotype, None for population records
    fn referenced_alleles(&self) -> Option<Vec<AlleleId>> {
        match self {
            GenotypeSource::Sample { allele_a, allele_b, .. } => Some(vec![*allele_a, *allele_b]),
            GenotypeSource::Population => None,
            GenotypeSource::Parental { paternal, maternal } => Some(vec![paternal.0, paternal.1, maternal.0, maternal.1])
        }
    }
}

/// One call or truth record: a locus with candidate alleles and the genotype that selects between them.
#[derive(Clone, Debug)]
pub struct Variant {
    /// 1-based ordinal assigned by the loader, used to relate results back to the input
    id: usize,
    /// The reference sequence name
    sequence_name: Arc<str>,
    /// 0-based start, the minimum start of all defined alleles
    start: i64,
    /// 0-based exclusive end, the maximum end of all defined alleles
    end: i64,
    /// Index `k` holds allele ID `k - 1`; slot 0 is the missing allele, None unless half-calls are explicit
    alleles: Vec<Option<Allele>>,
    /// If true, the genotype ordering is meaningful
    phased: bool,
    /// Optional score carried through for downstream ranking
    sort_value: Option<f64>,
    /// Where the allele assignment information came from
    genotype: GenotypeSource
}

impl Variant {
    /// Creates a new variant from an untrimmed VCF-style record.
    /// Alleles that are not referenced by the genotype are dropped so they cannot affect the variant bounds.
    /// # Arguments
    /// * `id` - the 1-based identifier of this record
    /// * `sequence_name` - the reference sequence name
    /// * `position` - 0-based position of the first reference base
    /// * `reference` - the reference allele bases
    /// * `alternates` - the alternate allele bases, in ID order starting from 1
    /// * `genotype` - the genotype source for this record
    /// * `phased` - true if the genotype is phased
    /// * `sort_value` - an optional score
    /// # Errors
    /// * if the reference allele is empty or there are no usable alternates
    /// * if the genotype references alleles that do not exist
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize, sequence_name: Arc<str>, position: i64,
        reference: &[u8], alternates: &[Vec<u8>],
        genotype: GenotypeSource, phased: bool, sort_value: Option<f64>
    ) -> Result<Variant, VariantError> {
        if reference.is_empty() {
            return Err(VariantError::EmptyReference);
        }
        if alternates.is_empty() {
            return Err(VariantError::NoAlternates);
        }

        let num_alleles = alternates.len() + 1;
        let referenced = genotype.referenced_alleles();
        if let Some(ids) = referenced.as_ref() {
            for &allele in ids.iter() {
                if allele < MISSING_ALLELE || (allele > MISSING_ALLELE && allele as usize >= num_alleles) {
                    return Err(VariantError::UndefinedGenotypeAllele { allele, num_alleles });
                }
            }
        }

        let end = position + reference.len() as i64;
        let mut alleles: Vec<Option<Allele>> = Vec::with_capacity(num_alleles + 1);
        alleles.push(None);
        alleles.push(Some(Allele::new(sequence_name.clone(), position, end, reference)));
        for (i, alt) in alternates.iter().enumerate() {
            let allele_id = (i + 1) as AlleleId;
            let used = referenced.as_ref()
                .map(|ids| ids.contains(&allele_id))
                .unwrap_or(true);
            if !used {
                alleles.push(None);
                continue;
            }
            if alt.is_empty() || alt.iter().any(|b| !b.is_ascii_alphabetic()) {
                return Err(VariantError::InvalidAlternate { index: i + 1 });
            }
            alleles.push(Some(Allele::new(sequence_name.clone(), position, end, alt)));
        }

        Ok(Variant {
            id,
            sequence_name,
            start: position,
            end,
            alleles,
            phased,
            sort_value,
            genotype
        })
    }

    /// Turns the missing allele into an explicit unknown token, so that a half-call only matches another half-call.
    /// The token replaces the reference span with a single `N`. It is added to population records and to
    /// genotypes that contain a missing allele, and is never trimmed.
    pub fn with_explicit_half_call(mut self) -> Self {
        let has_missing = match self.genotype.referenced_alleles() {
            Some(ids) => ids.contains(&MISSING_ALLELE),
            None => true
        };
        if has_missing {
            self.alleles[0] = Some(Allele::new(self.sequence_name.clone(), self.start, self.end, &[UNKNOWN_NUCLEOTIDE]));
        }
        self
    }

    /// Returns the allele for a given allele ID; None for a missing allele without a token, a trimmed reference, or an unused allele
    pub fn allele(&self, allele_id: AlleleId) -> Option<&Allele> {
        let index = allele_id + 1;
        if index < 0 {
            return None;
        }
        self.alleles.get(index as usize).and_then(|a| a.as_ref())
    }

    /// Number of allele IDs including the reference, i.e. valid IDs are `0..num_alleles()`
    pub fn num_alleles(&self) -> usize {
        self.alleles.len() - 1
    }

    /// Returns true if the genotype contains no alternate allele that changes the haplotype
    pub fn is_reference_only(&self) -> bool {
        match self.genotype.referenced_alleles() {
            Some(ids) => ids.iter().all(|&id| id <= REFERENCE_ALLELE || self.allele(id).is_none()),
            None => (1..self.num_alleles() as AlleleId).all(|id| self.allele(id).is_none())
        }
    }

    /// Removes common leading and trailing bases shared between the reference and each alternate.
    /// The reference allele itself is dropped afterwards, since the template provides it.
    /// # Arguments
    /// * `left_first` - if true, strip the common prefix before the common suffix
    pub fn trim_alleles(&mut self, left_first: bool) {
        let reference: Vec<u8> = match self.alleles[1].take() {
            Some(r) => r.nucleotides().to_vec(),
            None => return
        };

        for slot in self.alleles.iter_mut().skip(2) {
            if let Some(allele) = slot.as_ref() {
                let alt = allele.nucleotides();
                let (strip_leading, strip_trailing) = if left_first {
                    let leading = longest_prefix(0, &reference, alt);
                    (leading, longest_suffix(leading, &reference, alt))
                } else {
                    let trailing = longest_suffix(0, &reference, alt);
                    (longest_prefix(trailing, &reference, alt), trailing)
                };
                if strip_leading > 0 || strip_trailing > 0 {
                    let trimmed = Allele::new(
                        self.sequence_name.clone(),
                        allele.start() + strip_leading as i64,
                        allele.end() - strip_trailing as i64,
                        &alt[strip_leading..(alt.len() - strip_trailing)]
                    );
                    // an alternate identical to the reference changes nothing
                    *slot = if trimmed.is_noop() { None } else { Some(trimmed) };
                }
            }
        }

        // new bounds are over whatever alleles remain
        if let Some((start, end)) = self.alleles.iter().flatten()
            .map(|a| (a.start(), a.end()))
            .reduce(|(s1, e1), (s2, e2)| (s1.min(s2), e1.max(e2))) {
            self.start = start;
            self.end = end;
        }
    }

    /// Returns the maximum number of bases that could be trimmed from either side of any alternate
    fn trim_flexibility(&self) -> (usize, usize) {
        let reference = match self.alleles[1].as_ref() {
            Some(r) => r.nucleotides(),
            None => return (0, 0)
        };
        self.alleles.iter().skip(2).flatten()
            .fold((0, 0), |(lead, trail), a| {
                (
                    lead.max(longest_prefix(0, reference, a.nucleotides())),
                    trail.max(longest_suffix(0, reference, a.nucleotides()))
                )
            })
    }

    /// Returns true if the two variants share any reference bases
    pub fn overlaps(&self, other: &Variant) -> bool {
        self.sequence_name == other.sequence_name &&
            self.start < other.end && other.start < self.end
    }

    /// Short string of the genotype for reporting, e.g. "0/1" or "1|0"
    pub fn genotype_string(&self) -> String {
        let fmt_id = |id: AlleleId| if id == MISSING_ALLELE { ".".to_string() } else { id.to_string() };
        let sep = if self.phased { "|" } else { "/" };
        match &self.genotype {
            GenotypeSource::Sample { allele_a, allele_b, haploid } => {
                if *haploid {
                    fmt_id(*allele_a)
                } else {
                    format!("{}{sep}{}", fmt_id(*allele_a), fmt_id(*allele_b))
                }
            },
            GenotypeSource::Population => ".".to_string(),
            GenotypeSource::Parental { paternal, maternal } => {
                format!("{}/{}x{}/{}", fmt_id(paternal.0), fmt_id(paternal.1), fmt_id(maternal.0), fmt_id(maternal.1))
            }
        }
    }

    /// Comma separated alternate alleles; "-" marks an empty allele and "." an unused one
    pub fn alternates_string(&self) -> String {
        self.alleles.iter().skip(2)
            .map(|a| match a {
                Some(allele) if allele.is_empty() => "-".to_string(),
                Some(allele) => String::from_utf8_lossy(allele.nucleotides()).to_string(),
                None => ".".to_string()
            })
            .join(",")
    }

    // getters
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    pub fn sort_value(&self) -> Option<f64> {
        self.sort_value
    }

    pub fn genotype(&self) -> &GenotypeSource {
        &self.genotype
    }
}

/// Variants are equal when they occupy the same locus
impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Variant {}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sequence_name.cmp(&other.sequence_name)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{} ({}) {}", self.sequence_name, self.start + 1, self.end, self.alternates_string(), self.genotype_string())
    }
}

/// Length of the shared prefix of `a` and `b`, leaving at least `skip` bases untouched at the end
fn longest_prefix(skip: usize, a: &[u8], b: &[u8]) -> usize {
    let limit = a.len().min(b.len()).saturating_sub(skip);
    a.iter().zip(b.iter())
        .take(limit)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Length of the shared suffix of `a` and `b`, leaving at least `skip` bases untouched at the start
fn longest_suffix(skip: usize, a: &[u8], b: &[u8]) -> usize {
    let limit = a.len().min(b.len()).saturating_sub(skip);
    a.iter().rev().zip(b.iter().rev())
        .take(limit)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Trims the alleles of a sorted set of variants.
/// Isolated variants are trimmed left-first.
/// When a variant overlaps its neighbors and could be trimmed on either side, it is trimmed on the side that resolves the most overlaps.
/// # Arguments
/// * `variants` - the untrimmed variants, sorted by natural order
pub fn trim_variant_alleles(variants: &mut [Variant]) {
    let mut first_overlap = 0;
    let mut last_overlap = 0;
    for v in 0..variants.len() {
        while last_overlap < variants.len() && (last_overlap <= v || variants[v].overlaps(&variants[last_overlap])) {
            last_overlap += 1;
        }
        while first_overlap < v && !variants[v].overlaps(&variants[first_overlap]) {
            first_overlap += 1;
        }

        if first_overlap == v && last_overlap == v + 1 {
            // nothing overlaps this one
            variants[v].trim_alleles(true);
            continue;
        }

        let (strip_leading, strip_trailing) = variants[v].trim_flexibility();
        if strip_leading == 0 || strip_trailing == 0 {
            // no choice to make, but we still need the reference dropped
            variants[v].trim_alleles(true);
            continue;
        }

        let current_start = variants[v].start();
        let current_end = variants[v].end();
        let mut left_count = 0;
        let mut right_count = 0;
        for (i, other) in variants.iter().enumerate().take(last_overlap).skip(first_overlap) {
            if i == v {
                continue;
            }
            let left_overlap = other.end() - current_start;
            let right_overlap = current_end - other.start();
            if left_overlap <= 0 && right_overlap <= 0 {
                continue;
            }
            if left_overlap > 0 && left_overlap <= strip_leading as i64 {
                left_count += 1;
            }
            if right_overlap > 0 && right_overlap < strip_trailing as i64 {
                right_count += 1;
            }
        }
        trace!("Trimming {} with flexibility ({strip_leading}, {strip_trailing}), left={left_count} right={right_count}", variants[v]);
        variants[v].trim_alleles(left_count > right_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gt(a: AlleleId, b: AlleleId) -> GenotypeSource {
        GenotypeSource::Sample { allele_a: a, allele_b: b, haploid: false }
    }

    fn new_variant(position: i64, reference: &[u8], alts: &[&[u8]], genotype: GenotypeSource) -> Variant {
        let alts: Vec<Vec<u8>> = alts.iter().map(|a| a.to_vec()).collect();
        Variant::new(1, Arc::from("chr1"), position, reference, &alts, genotype, false, None).unwrap()
    }

    #[test]
    fn test_basic_snv() {
        let mut variant = new_variant(10, b"A", &[b"G"], sample_gt(0, 1));
        assert_eq!(variant.num_alleles(), 2);
        assert!(variant.allele(REFERENCE_ALLELE).is_some());
        variant.trim_alleles(true);
        assert!(variant.allele(REFERENCE_ALLELE).is_none());
        assert!(variant.allele(MISSING_ALLELE).is_none());
        let alt = variant.allele(1).unwrap();
        assert_eq!((alt.start(), alt.end()), (10, 11));
        assert_eq!(alt.nucleotides(), b"G");
        assert_eq!((variant.start(), variant.end()), (10, 11));
        assert_eq!(variant.genotype_string(), "0/1");
    }

    #[test]
    fn test_trim_insertion() {
        let mut variant = new_variant(20, b"A", &[b"AGT"], sample_gt(1, 1));
        variant.trim_alleles(true);
        let alt = variant.allele(1).unwrap();
        assert_eq!((alt.start(), alt.end()), (21, 21));
        assert_eq!(alt.nucleotides(), b"GT");
        assert_eq!((variant.start(), variant.end()), (21, 21));
    }

    #[test]
    fn test_trim_deletion() {
        let mut variant = new_variant(20, b"ACG", &[b"A"], sample_gt(0, 1));
        variant.trim_alleles(true);
        let alt = variant.allele(1).unwrap();
        assert_eq!((alt.start(), alt.end()), (21, 23));
        assert!(alt.is_empty());
    }

    #[test]
    fn test_trim_right_first() {
        // ACA -> A can be trimmed to a deletion of "AC" or "CA"
        let mut left = new_variant(20, b"ACA", &[b"A"], sample_gt(0, 1));
        left.trim_alleles(true);
        assert_eq!(left.allele(1).unwrap().start(), 21);

        let mut right = new_variant(20, b"ACA", &[b"A"], sample_gt(0, 1));
        right.trim_alleles(false);
        assert_eq!(right.allele(1).unwrap().start(), 20);
        assert_eq!(right.allele(1).unwrap().end(), 22);
    }

    #[test]
    fn test_unused_alleles_dropped() {
        let variant = new_variant(10, b"ACGT", &[b"A", b"ACGTACGT"], sample_gt(0, 1));
        assert!(variant.allele(1).is_some());
        assert!(variant.allele(2).is_none());
        assert_eq!(variant.num_alleles(), 3);

        // population records keep everything
        let variant = new_variant(10, b"ACGT", &[b"A", b"ACGTACGT"], GenotypeSource::Population);
        assert!(variant.allele(2).is_some());
    }

    #[test]
    fn test_errors() {
        let alts = vec![b"G".to_vec()];
        assert!(matches!(
            Variant::new(1, Arc::from("chr1"), 0, b"", &alts, sample_gt(0, 1), false, None),
            Err(VariantError::EmptyReference)
        ));
        assert!(matches!(
            Variant::new(1, Arc::from("chr1"), 0, b"A", &[], sample_gt(0, 1), false, None),
            Err(VariantError::NoAlternates)
        ));
        assert!(matches!(
            Variant::new(1, Arc::from("chr1"), 0, b"A", &alts, sample_gt(0, 2), false, None),
            Err(VariantError::UndefinedGenotypeAllele { allele: 2, num_alleles: 2 })
        ));
        let symbolic = vec![b"<DEL>".to_vec()];
        assert!(matches!(
            Variant::new(1, Arc::from("chr1"), 0, b"A", &symbolic, sample_gt(0, 1), false, None),
            Err(VariantError::InvalidAlternate { index: 1 })
        ));
    }

    #[test]
    fn test_reference_only() {
        let mut variant = new_variant(10, b"A", &[b"G"], sample_gt(0, 0));
        variant.trim_alleles(true);
        assert!(variant.is_reference_only());

        let mut variant = new_variant(10, b"A", &[b"G"], sample_gt(MISSING_ALLELE, 1));
        variant.trim_alleles(true);
        assert!(!variant.is_reference_only());
        assert_eq!(variant.genotype_string(), "./1");
    }

    #[test]
    fn test_alternate_equal_to_reference() {
        let mut variant = new_variant(10, b"AC", &[b"AC", b"A"], sample_gt(1, 2));
        variant.trim_alleles(true);
        assert!(variant.allele(1).is_none());
        assert!(variant.allele(2).is_some());
        assert!(!variant.is_reference_only());

        let mut variant = new_variant(10, b"A", &[b"A"], sample_gt(0, 1));
        assert!(!variant.is_reference_only());
        variant.trim_alleles(true);
        assert!(variant.allele(1).is_none());
        assert!(variant.is_reference_only());
    }

    #[test]
    fn test_explicit_half_call() {
        let mut variant = new_variant(10, b"AC", &[b"A"], sample_gt(MISSING_ALLELE, 1)).with_explicit_half_call();
        variant.trim_alleles(true);
        let token = variant.allele(MISSING_ALLELE).unwrap();
        assert_eq!((token.start(), token.end()), (10, 12));
        assert_eq!(token.nucleotides(), b"N");
        // the token keeps the variant spanning the whole reference
        assert_eq!((variant.start(), variant.end()), (10, 12));
        assert_eq!(variant.allele(1).unwrap().start(), 11);

        // no token without a missing allele in the genotype
        let variant = new_variant(10, b"A", &[b"G"], sample_gt(0, 1)).with_explicit_half_call();
        assert!(variant.allele(MISSING_ALLELE).is_none());

        let variant = new_variant(10, b"A", &[b"G"], GenotypeSource::Population).with_explicit_half_call();
        assert!(variant.allele(MISSING_ALLELE).is_some());
    }

    #[test]
    fn test_natural_order() {
        let a = new_variant(10, b"A", &[b"G"], sample_gt(0, 1));
        let b = new_variant(10, b"AC", &[b"G"], sample_gt(0, 1));
        let c = new_variant(11, b"A", &[b"G"], sample_gt(0, 1));
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, new_variant(10, b"A", &[b"T"], sample_gt(1, 1)));
    }

    #[test]
    fn test_overlap_aware_trimming() {
        // CAC -> C could become a deletion of "CA" at 10 (right-first) or "AC" at 11 (left-first);
        // neither side is strictly better for the SNP at 12, which falls back to right-first
        let mut variants = vec![
            new_variant(10, b"CAC", &[b"C"], sample_gt(0, 1)),
            new_variant(12, b"C", &[b"T"], sample_gt(0, 1)),
        ];
        trim_variant_alleles(&mut variants);
        let deletion = variants[0].allele(1).unwrap();
        assert_eq!((deletion.start(), deletion.end()), (10, 12));
        assert_eq!((variants[1].start(), variants[1].end()), (12, 13));
    }

    #[test]
    fn test_display() {
        let mut variant = new_variant(10, b"AC", &[b"A"], sample_gt(1, 0));
        variant.trim_alleles(true);
        assert_eq!(variant.to_string(), "chr1:12-12 (-) 1/0");
    }
}
