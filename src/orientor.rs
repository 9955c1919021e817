/*!
# Orientor module
Strategies that expand a `Variant` into every allele-to-haplotype assignment a comparison mode allows.
The search branches once per returned orientation, so the choice of orientor defines what counts as a match.
*/

use itertools::Itertools;
use serde::Serialize;
use std::sync::Arc;
use strum_macros::EnumString;

use crate::data_types::oriented_variant::OrientedVariant;
use crate::data_types::variants::{AlleleId, GenotypeSource, Variant, MISSING_ALLELE, REFERENCE_ALLELE};

#[derive(thiserror::Error, Debug)]
pub enum OrientorError {
    #[error("orientor {orientor} cannot be applied to variant {variant}: {reason}")]
    IncompatibleVariant { orientor: Orientor, variant: String, reason: &'static str }
}

/// Comparison policy used to enumerate the orientations of a variant
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, strum_macros::Display, strum_macros::EnumIter, EnumString, Serialize, clap::ValueEnum)]
pub enum Orientor {
    /// Diploid; both phases of a heterozygous genotype are tried
    #[default]
    #[strum(ascii_case_insensitive, serialize = "unphased")]
    #[clap(name = "unphased")]
    Unphased,
    /// Diploid; phased genotypes are only tried in their recorded phase
    #[strum(ascii_case_insensitive, serialize = "phased")]
    #[clap(name = "phased")]
    Phased,
    /// Diploid; phased genotypes are only tried in the opposite of their recorded phase
    #[strum(ascii_case_insensitive, serialize = "phase_inverted")]
    #[clap(name = "phase_inverted")]
    PhaseInverted,
    /// Haploid; each non-reference allele of the genotype is tried on its own
    #[strum(ascii_case_insensitive, serialize = "squash_ploidy")]
    #[clap(name = "squash_ploidy")]
    SquashPloidy,
    /// Diploid; any genotype built from the alleles of the call
    #[strum(ascii_case_insensitive, serialize = "allele_gt")]
    #[clap(name = "allele_gt")]
    AlleleGt,
    /// Haploid; any single alternate allele of a population record
    #[strum(ascii_case_insensitive, serialize = "haploid_population")]
    #[clap(name = "haploid_population")]
    HaploidPopulation,
    /// Diploid; any pair of alleles of a population record, including half calls
    #[strum(ascii_case_insensitive, serialize = "diploid_population")]
    #[clap(name = "diploid_population")]
    DiploidPopulation,
    /// Haploid; any non-reference allele that either parent could transmit
    #[strum(ascii_case_insensitive, serialize = "parental_haploid")]
    #[clap(name = "parental_haploid")]
    ParentalHaploid,
    /// Diploid; one allele transmitted from each parent, paternal on haplotype A
    #[strum(ascii_case_insensitive, serialize = "parental_diploid")]
    #[clap(name = "parental_diploid")]
    ParentalDiploid
}

impl Orientor {
    /// Number of haplotypes the orientations of this strategy describe
    pub fn haplotypes(&self) -> usize {
        match self {
            Orientor::Unphased |
            Orientor::Phased |
            Orientor::PhaseInverted |
            Orientor::AlleleGt |
            Orientor::DiploidPopulation |
            Orientor::ParentalDiploid => 2,

            Orientor::SquashPloidy |
            Orientor::HaploidPopulation |
            Orientor::ParentalHaploid => 1
        }
    }

    /// True for the diploid strategies that read a single sample genotype
    pub fn is_sample_diploid(&self) -> bool {
        matches!(self, Orientor::Unphased | Orientor::Phased | Orientor::PhaseInverted)
    }

    /// Enumerates the orientations of a variant under this strategy.
    /// An empty result means the variant can only be excluded.
    /// # Arguments
    /// * `variant` - the variant to orient, shared by all returned orientations
    /// # Errors
    /// * if the variant does not carry the genotype information this strategy needs
    pub fn orientations(&self, variant: &Arc<Variant>) -> Result<Vec<OrientedVariant>, OrientorError> {
        let orientations = match self {
            Orientor::Unphased => {
                let (a, b) = self.sample_alleles(variant)?;
                unphased(variant, a, b)
            },
            Orientor::Phased |
            Orientor::PhaseInverted => {
                let (a, b) = self.sample_alleles(variant)?;
                if a != b && variant.is_phased() {
                    if *self == Orientor::PhaseInverted {
                        vec![OrientedVariant::new(variant.clone(), false, b, a)]
                    } else {
                        vec![OrientedVariant::new(variant.clone(), true, a, b)]
                    }
                } else {
                    unphased(variant, a, b)
                }
            },
            Orientor::SquashPloidy => {
                let (a, b) = self.sample_alleles(variant)?;
                match replayable_pair(variant, a, b) {
                    Some((la, lb)) if la == lb => vec![OrientedVariant::new_homozygous(variant.clone(), la)],
                    Some((la, lb)) => vec![
                        OrientedVariant::new_homozygous(variant.clone(), la),
                        OrientedVariant::new_homozygous(variant.clone(), lb)
                    ],
                    None => vec![]
                }
            },
            Orientor::AlleleGt => {
                let (a, b) = self.sample_alleles(variant)?;
                match replayable_pair(variant, a, b) {
                    Some((la, lb)) if la == lb => vec![
                        OrientedVariant::new(variant.clone(), true, REFERENCE_ALLELE, la),
                        OrientedVariant::new(variant.clone(), true, la, REFERENCE_ALLELE),
                        OrientedVariant::new_homozygous(variant.clone(), la)
                    ],
                    Some((la, lb)) => [
                        (REFERENCE_ALLELE, la), (REFERENCE_ALLELE, lb),
                        (la, REFERENCE_ALLELE), (lb, REFERENCE_ALLELE),
                        (la, lb), (lb, la)
                    ].into_iter()
                        .map(|(x, y)| OrientedVariant::new(variant.clone(), true, x, y))
                        .collect(),
                    None => vec![]
                }
            },
            Orientor::HaploidPopulation => {
                self.check_not_parental(variant)?;
                defined_alternates(variant)
                    .map(|i| OrientedVariant::new_homozygous(variant.clone(), i))
                    .collect()
            },
            Orientor::DiploidPopulation => {
                self.check_not_parental(variant)?;
                let alternates: Vec<AlleleId> = defined_alternates(variant).collect();
                // without a half-call token the missing allele stands in for the reference, so 0 is only paired when there is one
                let explicit_half_call = variant.allele(MISSING_ALLELE).is_some();
                let mut orientations = Vec::with_capacity(alternates.len() * (alternates.len() + 3));
                for (n, &i) in alternates.iter().enumerate() {
                    let partners = std::iter::once(MISSING_ALLELE)
                        .chain(explicit_half_call.then_some(REFERENCE_ALLELE))
                        .chain(alternates[..n].iter().copied());
                    for j in partners {
                        orientations.push(OrientedVariant::new(variant.clone(), true, i, j));
                        orientations.push(OrientedVariant::new(variant.clone(), false, j, i));
                    }
                    orientations.push(OrientedVariant::new(variant.clone(), true, i, i));
                }
                orientations
            },
            Orientor::ParentalHaploid => {
                let (paternal, maternal) = self.parental_alleles(variant)?;
                paternal.iter().chain(maternal.iter())
                    .copied()
                    .filter(|&id| id > REFERENCE_ALLELE)
                    .unique()
                    .map(|id| OrientedVariant::new_homozygous(variant.clone(), id))
                    .collect()
            },
            Orientor::ParentalDiploid => {
                let (paternal, maternal) = self.parental_alleles(variant)?;
                paternal.iter()
                    .cartesian_product(maternal.iter())
                    .filter(|&(&p, &m)| p > REFERENCE_ALLELE || m > REFERENCE_ALLELE)
                    .map(|(&p, &m)| OrientedVariant::new(variant.clone(), false, p, m))
                    .collect()
            }
        };
        Ok(orientations)
    }

    /// The (A, B) alleles of a single sample genotype
    fn sample_alleles(&self, variant: &Variant) -> Result<(AlleleId, AlleleId), OrientorError> {
        match variant.genotype() {
            GenotypeSource::Sample { allele_a, allele_b, .. } => Ok((*allele_a, *allele_b)),
            _ => Err(self.incompatible(variant, "a sample genotype is required"))
        }
    }

    /// The distinct alleles of each parent; missing alleles count as reference
    fn parental_alleles(&self, variant: &Variant) -> Result<(Vec<AlleleId>, Vec<AlleleId>), OrientorError> {
        match variant.genotype() {
            GenotypeSource::Parental { paternal, maternal } => {
                let distinct = |(x, y): (AlleleId, AlleleId)| -> Vec<AlleleId> {
                    [x, y].into_iter()
                        .map(|id| id.max(REFERENCE_ALLELE))
                        .unique()
                        .collect()
                };
                Ok((distinct(*paternal), distinct(*maternal)))
            },
            _ => Err(self.incompatible(variant, "parental genotypes are required"))
        }
    }

    fn check_not_parental(&self, variant: &Variant) -> Result<(), OrientorError> {
        match variant.genotype() {
            GenotypeSource::Parental { .. } => Err(self.incompatible(variant, "population strategies do not read parental genotypes")),
            _ => Ok(())
        }
    }

    fn incompatible(&self, variant: &Variant, reason: &'static str) -> OrientorError {
        OrientorError::IncompatibleVariant {
            orientor: *self,
            variant: variant.to_string(),
            reason
        }
    }
}

/// Both phases of a heterozygous genotype, or the single homozygous one
fn unphased(variant: &Arc<Variant>, a: AlleleId, b: AlleleId) -> Vec<OrientedVariant> {
    if a != b {
        vec![
            OrientedVariant::new(variant.clone(), true, a, b),
            OrientedVariant::new(variant.clone(), false, b, a)
        ]
    } else {
        vec![OrientedVariant::new_homozygous(variant.clone(), a)]
    }
}

/// Picks the replayable non-reference alleles of a genotype, each side falling back to the other.
/// Returns None if neither allele changes the haplotype.
fn replayable_pair(variant: &Variant, a: AlleleId, b: AlleleId) -> Option<(AlleleId, AlleleId)> {
    let replayable = |id: AlleleId| id > REFERENCE_ALLELE && variant.allele(id).is_some();
    match (replayable(a), replayable(b)) {
        (true, true) => Some((a, b)),
        (true, false) => Some((a, a)),
        (false, true) => Some((b, b)),
        (false, false) => None
    }
}

/// Alternate allele IDs that are defined on the variant, in ID order
fn defined_alternates(variant: &Variant) -> impl Iterator<Item = AlleleId> + '_ {
    (1..variant.num_alleles() as AlleleId)
        .filter(|&id| variant.allele(id).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn build(genotype: GenotypeSource, phased: bool, alts: &[&[u8]]) -> Arc<Variant> {
        let alts: Vec<Vec<u8>> = alts.iter().map(|a| a.to_vec()).collect();
        let mut variant = Variant::new(1, Arc::from("chr1"), 10, b"A", &alts, genotype, phased, None).unwrap();
        variant.trim_alleles(true);
        Arc::new(variant)
    }

    fn sample(a: AlleleId, b: AlleleId, phased: bool) -> Arc<Variant> {
        build(GenotypeSource::Sample { allele_a: a, allele_b: b, haploid: false }, phased, &[b"C", b"G"])
    }

    fn pairs(orientations: &[OrientedVariant]) -> Vec<(bool, AlleleId, AlleleId)> {
        orientations.iter().map(|o| (o.is_allele_a(), o.allele_a(), o.allele_b())).collect()
    }

    #[test]
    fn test_unphased() {
        let het = Orientor::Unphased.orientations(&sample(0, 1, false)).unwrap();
        assert_eq!(pairs(&het), vec![(true, 0, 1), (false, 1, 0)]);

        let hom = Orientor::Unphased.orientations(&sample(2, 2, false)).unwrap();
        assert_eq!(pairs(&hom), vec![(true, 2, 2)]);

        let half_call = Orientor::Unphased.orientations(&sample(MISSING_ALLELE, 1, false)).unwrap();
        assert_eq!(pairs(&half_call), vec![(true, -1, 1), (false, 1, -1)]);
        assert!(half_call[0].nt_allele_a().is_none());
    }

    #[test]
    fn test_phased() {
        let phased = sample(0, 1, true);
        assert_eq!(pairs(&Orientor::Phased.orientations(&phased).unwrap()), vec![(true, 0, 1)]);
        assert_eq!(pairs(&Orientor::PhaseInverted.orientations(&phased).unwrap()), vec![(false, 1, 0)]);

        // unphased genotypes fall back to both phases
        let unphased = sample(1, 2, false);
        assert_eq!(pairs(&Orientor::Phased.orientations(&unphased).unwrap()), vec![(true, 1, 2), (false, 2, 1)]);
    }

    #[test]
    fn test_squash_ploidy() {
        assert_eq!(pairs(&Orientor::SquashPloidy.orientations(&sample(0, 1, false)).unwrap()), vec![(true, 1, 1)]);
        assert_eq!(pairs(&Orientor::SquashPloidy.orientations(&sample(1, 1, false)).unwrap()), vec![(true, 1, 1)]);
        assert_eq!(pairs(&Orientor::SquashPloidy.orientations(&sample(1, 2, false)).unwrap()), vec![(true, 1, 1), (true, 2, 2)]);
        assert_eq!(Orientor::SquashPloidy.haplotypes(), 1);
    }

    #[test]
    fn test_allele_gt() {
        let single = Orientor::AlleleGt.orientations(&sample(1, 1, false)).unwrap();
        assert_eq!(pairs(&single), vec![(true, 0, 1), (true, 1, 0), (true, 1, 1)]);

        let double = Orientor::AlleleGt.orientations(&sample(2, 1, false)).unwrap();
        assert_eq!(pairs(&double), vec![
            (true, 0, 2), (true, 0, 1), (true, 2, 0), (true, 1, 0), (true, 2, 1), (true, 1, 2)
        ]);
    }

    #[test]
    fn test_population() {
        let population = build(GenotypeSource::Population, false, &[b"C", b"G", b"T"]);
        let haploid = Orientor::HaploidPopulation.orientations(&population).unwrap();
        assert_eq!(pairs(&haploid), vec![(true, 1, 1), (true, 2, 2), (true, 3, 3)]);

        let two_alts = build(GenotypeSource::Population, false, &[b"C", b"G"]);
        let diploid = Orientor::DiploidPopulation.orientations(&two_alts).unwrap();
        assert_eq!(pairs(&diploid), vec![
            (true, 1, -1), (false, -1, 1), (true, 1, 1),
            (true, 2, -1), (false, -1, 2), (true, 2, 1), (false, 1, 2), (true, 2, 2)
        ]);
    }

    #[test]
    fn test_diploid_population_explicit_half_call() {
        let alts: Vec<Vec<u8>> = vec![b"C".to_vec(), b"G".to_vec()];
        let mut variant = Variant::new(1, Arc::from("chr1"), 10, b"A", &alts, GenotypeSource::Population, false, None)
            .unwrap()
            .with_explicit_half_call();
        variant.trim_alleles(true);
        let variant = Arc::new(variant);

        let diploid = Orientor::DiploidPopulation.orientations(&variant).unwrap();
        assert_eq!(pairs(&diploid), vec![
            (true, 1, -1), (false, -1, 1), (true, 1, 0), (false, 0, 1), (true, 1, 1),
            (true, 2, -1), (false, -1, 2), (true, 2, 0), (false, 0, 2), (true, 2, 1), (false, 1, 2), (true, 2, 2)
        ]);
        // the half-call side replays the unknown token
        assert_eq!(diploid[1].nt_allele_a().unwrap().nucleotides(), b"N");

        // a sample half-call carries the token through the unphased strategy
        let alts: Vec<Vec<u8>> = vec![b"C".to_vec()];
        let genotype = GenotypeSource::Sample { allele_a: MISSING_ALLELE, allele_b: 1, haploid: false };
        let mut half_call = Variant::new(2, Arc::from("chr1"), 10, b"A", &alts, genotype, false, None)
            .unwrap()
            .with_explicit_half_call();
        half_call.trim_alleles(true);
        let unphased = Orientor::Unphased.orientations(&Arc::new(half_call)).unwrap();
        assert_eq!(pairs(&unphased), vec![(true, -1, 1), (false, 1, -1)]);
        assert!(unphased[0].nt_allele_a().is_some());
    }

    #[test]
    fn test_parental() {
        let hom_het = build(GenotypeSource::Parental { paternal: (1, 1), maternal: (0, 2) }, false, &[b"C", b"G"]);
        let diploid = Orientor::ParentalDiploid.orientations(&hom_het).unwrap();
        assert_eq!(pairs(&diploid), vec![(false, 1, 0), (false, 1, 2)]);

        let haploid = Orientor::ParentalHaploid.orientations(&hom_het).unwrap();
        assert_eq!(pairs(&haploid), vec![(true, 1, 1), (true, 2, 2)]);

        // a missing parental allele is treated as reference, and reference/reference is never offered
        let het_het = build(GenotypeSource::Parental { paternal: (MISSING_ALLELE, 1), maternal: (0, 1) }, false, &[b"C"]);
        let diploid = Orientor::ParentalDiploid.orientations(&het_het).unwrap();
        assert_eq!(pairs(&diploid), vec![(false, 0, 1), (false, 1, 0), (false, 1, 1)]);
    }

    #[test]
    fn test_incompatible_variant() {
        let population = build(GenotypeSource::Population, false, &[b"C"]);
        assert!(matches!(
            Orientor::Unphased.orientations(&population),
            Err(OrientorError::IncompatibleVariant { orientor: Orientor::Unphased, .. })
        ));
        assert!(Orientor::ParentalDiploid.orientations(&sample(0, 1, false)).is_err());

        // population strategies ignore a sample genotype and use every defined alternate
        let haploid = Orientor::HaploidPopulation.orientations(&sample(0, 1, false)).unwrap();
        assert_eq!(pairs(&haploid), vec![(true, 1, 1)]);
    }

    #[test]
    fn test_names() {
        assert_eq!(Orientor::from_str("Squash_Ploidy").unwrap(), Orientor::SquashPloidy);
        assert_eq!(Orientor::DiploidPopulation.to_string(), "diploid_population");
        assert!(Orientor::Unphased.is_sample_diploid());
        assert!(!Orientor::AlleleGt.is_sample_diploid());

        // every strategy parses back from its display name
        for orientor in Orientor::iter() {
            assert_eq!(Orientor::from_str(&orientor.to_string()).unwrap(), orientor);
        }
        assert_eq!(Orientor::iter().filter(|o| o.haplotypes() == 1).count(), 3);
    }
}
