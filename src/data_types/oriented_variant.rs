
use std::fmt;
use std::sync::Arc;

use crate::data_types::allele::Allele;
use crate::data_types::variants::{AlleleId, Variant};

/// A Variant with a specific assignment of its alleles onto haplotypes A and B.
#[derive(Clone, Debug)]
pub struct OrientedVariant {
    /// The underlying variant, shared with every other orientation of it
    variant: Arc<Variant>,
    /// True if this is the default orientation of the genotype
    is_allele_a: bool,
    /// Allele placed on haplotype A
    allele_a: AlleleId,
    /// Allele placed on haplotype B
    allele_b: AlleleId,
    /// Contribution of this variant to the weighted true positive count, set after the search
    weight: f64
}

impl OrientedVariant {
    /// Creates a homozygous (or haploid) orientation with the same allele on both haplotypes
    pub fn new_homozygous(variant: Arc<Variant>, allele_id: AlleleId) -> Self {
        Self::new(variant, true, allele_id, allele_id)
    }

    /// Constructor
    /// # Arguments
    /// * `variant` - the variant being oriented
    /// * `is_allele_a` - true if this is the default orientation
    /// * `allele_a` - the allele ID placed on haplotype A
    /// * `allele_b` - the allele ID placed on haplotype B
    pub fn new(variant: Arc<Variant>, is_allele_a: bool, allele_a: AlleleId, allele_b: AlleleId) -> Self {
        Self {
            variant,
            is_allele_a,
            allele_a,
            allele_b,
            weight: 0.0
        }
    }

    /// Returns the same variant reflected onto the opposite haplotypes
    pub fn other(&self) -> Self {
        Self {
            variant: self.variant.clone(),
            is_allele_a: !self.is_allele_a,
            allele_a: self.allele_b,
            allele_b: self.allele_a,
            weight: self.weight
        }
    }

    pub fn is_heterozygous(&self) -> bool {
        self.allele_a != self.allele_b
    }

    /// The allele this orientation replays on haplotype A, None if it does not alter the template
    pub fn nt_allele_a(&self) -> Option<&Allele> {
        self.variant.allele(self.allele_a)
    }

    /// The allele this orientation replays on haplotype B, None if it does not alter the template
    pub fn nt_allele_b(&self) -> Option<&Allele> {
        self.variant.allele(self.allele_b)
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    // getters
    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }

    pub fn is_allele_a(&self) -> bool {
        self.is_allele_a
    }

    pub fn allele_a(&self) -> AlleleId {
        self.allele_a
    }

    pub fn allele_b(&self) -> AlleleId {
        self.allele_b
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn start(&self) -> i64 {
        self.variant.start()
    }

    pub fn end(&self) -> i64 {
        self.variant.end()
    }
}

impl fmt::Display for OrientedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_allele_a { "|" } else { "/" };
        write!(f, "{}:{}-{} {}{sep}{}", self.variant.sequence_name(), self.start() + 1, self.end(), self.allele_a, self.allele_b)
    }
}
