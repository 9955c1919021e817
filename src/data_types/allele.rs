
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// An immutable substitution of a reference span with a nucleotide sequence.
/// * A zero-length `nucleotides` denotes a deletion of `[start, end)`.
/// * `start == end` with non-empty `nucleotides` denotes a pure insertion before `start`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Allele {
    /// The reference sequence this allele is placed on
    sequence_name: Arc<str>,
    /// 0-based start of the replaced reference span
    start: i64,
    /// 0-based exclusive end of the replaced reference span
    end: i64,
    /// The bases that replace the reference span
    nucleotides: Arc<[u8]>
}

impl Allele {
    /// Constructor
    /// # Arguments
    /// * `sequence_name` - the reference sequence (contig) name
    /// * `start` - 0-based start of the span being replaced
    /// * `end` - 0-based exclusive end of the span being replaced, must be >= `start`
    /// * `nucleotides` - replacement bases, empty for a deletion
    pub fn new(sequence_name: Arc<str>, start: i64, end: i64, nucleotides: &[u8]) -> Self {
        assert!(start <= end, "allele end must not precede start");
        Self {
            sequence_name,
            start,
            end,
            nucleotides: Arc::from(nucleotides)
        }
    }

    /// Returns true if this allele does not change the haplotype when replayed, i.e. an empty insertion
    pub fn is_noop(&self) -> bool {
        self.start == self.end && self.nucleotides.is_empty()
    }

    /// Number of replacement bases
    pub fn len(&self) -> usize {
        self.nucleotides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nucleotides.is_empty()
    }

    /// Number of reference bases replaced by this allele
    pub fn reference_span(&self) -> i64 {
        self.end - self.start
    }

    /// Returns true if the two alleles touch the same reference bases
    pub fn overlaps(&self, other: &Allele) -> bool {
        self.sequence_name == other.sequence_name &&
            self.start < other.end && other.start < self.end
    }

    // getters
    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn nucleotides(&self) -> &[u8] {
        &self.nucleotides
    }
}

impl Ord for Allele {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then(self.nucleotides.len().cmp(&other.nucleotides.len()))
            .then_with(|| self.nucleotides.cmp(&other.nucleotides))
            .then_with(|| self.sequence_name.cmp(&other.sequence_name))
    }
}

impl PartialOrd for Allele {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nt = if self.nucleotides.is_empty() {
            "-".to_string()
        } else {
            String::from_utf8_lossy(&self.nucleotides).to_string()
        };
        write!(f, "{}:{}-{}({})", self.sequence_name, self.start + 1, self.end, nt)
    }
}
