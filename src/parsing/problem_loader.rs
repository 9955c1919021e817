
use anyhow::{bail, Context};
use log::{debug, info};
use rust_lib_reference_genome::reference_genome::ReferenceGenome;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::data_types::variants::{trim_variant_alleles, AlleleId, GenotypeSource, Variant, VariantError, MISSING_ALLELE};
use crate::replay::Side;
use crate::sequence_evaluator::SequenceProblem;
use crate::util::json_io::load_json;

#[derive(thiserror::Error, Debug)]
pub enum LoaderError {
    #[error("could not parse genotype {genotype:?}")]
    InvalidGenotype { genotype: String },
    #[error("parental records need both a paternal and a maternal genotype")]
    MissingParent,
    #[error("parental genotype {genotype:?} must have two alleles")]
    InvalidParentalGenotype { genotype: String },
    #[error(transparent)]
    Variant(#[from] VariantError)
}

/// One VCF-like input record
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VariantRecord {
    /// Reference sequence name
    pub chrom: String,
    /// 0-based position of the first reference base
    pub position: i64,
    /// Reference allele bases
    #[serde(rename = "ref")]
    pub reference: String,
    /// Alternate allele bases, allele IDs 1..
    pub alts: Vec<String>,
    /// Sample genotype in VCF syntax, e.g. "0/1" or "1|0"
    #[serde(default)]
    pub genotype: Option<String>,
    /// Genotype of the first parent, for parental records
    #[serde(default)]
    pub paternal: Option<String>,
    /// Genotype of the second parent, for parental records
    #[serde(default)]
    pub maternal: Option<String>,
    /// Optional score, carried through to the outputs
    #[serde(default)]
    pub score: Option<f64>
}

/// The full input, both variant sets
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VariantSetFile {
    pub baseline: Vec<VariantRecord>,
    pub calls: Vec<VariantRecord>
}

/// Parses a VCF style genotype into (allele A, allele B, phased, haploid)
/// # Errors
/// * if an allele is not `.` or an integer
/// * if there are more than two alleles
fn parse_genotype(genotype: &str) -> Result<(AlleleId, AlleleId, bool, bool), LoaderError> {
    let invalid = || LoaderError::InvalidGenotype { genotype: genotype.to_string() };
    let parse_allele = |s: &str| -> Result<AlleleId, LoaderError> {
        match s.trim() {
            "." => Ok(MISSING_ALLELE),
            value => value.parse::<AlleleId>().ok()
                .filter(|&id| id >= 0)
                .ok_or_else(invalid)
        }
    };

    let phased = genotype.contains('|');
    let alleles: Vec<&str> = genotype.split(['/', '|']).collect();
    match alleles.as_slice() {
        [single] => {
            let id = parse_allele(single)?;
            Ok((id, id, false, true))
        },
        [a, b] => Ok((parse_allele(a)?, parse_allele(b)?, phased, false)),
        _ => Err(LoaderError::Variant(VariantError::UnsupportedPloidy { count: alleles.len() }))
    }
}

/// Determines the genotype source of a record and whether it is phased
fn genotype_source(record: &VariantRecord) -> Result<(GenotypeSource, bool), LoaderError> {
    match (&record.paternal, &record.maternal) {
        (Some(paternal), Some(maternal)) => {
            let parent = |gt: &str| -> Result<(AlleleId, AlleleId), LoaderError> {
                match parse_genotype(gt)? {
                    (a, b, _, false) => Ok((a, b)),
                    _ => Err(LoaderError::InvalidParentalGenotype { genotype: gt.to_string() })
                }
            };
            Ok((GenotypeSource::Parental { paternal: parent(paternal)?, maternal: parent(maternal)? }, false))
        },
        (Some(_), None) |
        (None, Some(_)) => Err(LoaderError::MissingParent),
        (None, None) => match &record.genotype {
            Some(gt) => {
                let (allele_a, allele_b, phased, haploid) = parse_genotype(gt)?;
                Ok((GenotypeSource::Sample { allele_a, allele_b, haploid }, phased))
            },
            None => Ok((GenotypeSource::Population, false))
        }
    }
}

/// Converts one record into an untrimmed Variant, None if it cannot change a haplotype
fn record_to_variant(id: usize, sequence_name: Arc<str>, record: &VariantRecord, explicit_half_calls: bool) -> Result<Option<Variant>, LoaderError> {
    let (genotype, phased) = genotype_source(record)?;
    let reference = record.reference.to_ascii_uppercase().into_bytes();
    let alternates: Vec<Vec<u8>> = record.alts.iter()
        .map(|a| a.to_ascii_uppercase().into_bytes())
        .collect();
    let mut variant = Variant::new(id, sequence_name, record.position, &reference, &alternates, genotype, phased, record.score)?;
    if explicit_half_calls {
        variant = variant.with_explicit_half_call();
    }
    if variant.is_reference_only() {
        Ok(None)
    } else {
        Ok(Some(variant))
    }
}

/// Converts the records of one side into variants grouped by sequence name.
/// IDs are the 1-based index of the record in the input.
fn group_records(records: &[VariantRecord], side: Side, explicit_half_calls: bool) -> anyhow::Result<FxHashMap<String, Vec<Variant>>> {
    let mut names: FxHashMap<String, Arc<str>> = FxHashMap::default();
    let mut grouped: FxHashMap<String, Vec<Variant>> = FxHashMap::default();
    let mut skipped: usize = 0;
    for (index, record) in records.iter().enumerate() {
        let name = names.entry(record.chrom.clone())
            .or_insert_with(|| Arc::from(record.chrom.as_str()))
            .clone();
        let variant = record_to_variant(index + 1, name, record, explicit_half_calls)
            .with_context(|| format!("Error while parsing {side} record #{}, {}:{}", index + 1, record.chrom, record.position + 1))?;
        match variant {
            Some(v) => grouped.entry(record.chrom.clone()).or_default().push(v),
            None => skipped += 1
        }
    }
    debug!("Skipped {skipped} {side} records without a non-reference allele");
    Ok(grouped)
}

/// Builds one problem per reference sequence from the parsed input.
/// Sequences are ordered by their first appearance, baseline before calls.
/// # Arguments
/// * `variant_set` - both variant sets
/// * `reference_genome` - the reference providing each sequence template
/// * `explicit_half_calls` - if true, the missing allele of a half-call is a token of its own instead of the reference
/// # Errors
/// * if any record is malformed
/// * if a sequence is missing from the reference, or a variant extends past its end
pub fn build_sequence_problems(variant_set: &VariantSetFile, reference_genome: &ReferenceGenome, explicit_half_calls: bool) -> anyhow::Result<Vec<SequenceProblem>> {
    let mut baseline = group_records(&variant_set.baseline, Side::Baseline, explicit_half_calls)?;
    let mut calls = group_records(&variant_set.calls, Side::Calls, explicit_half_calls)?;

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let order: Vec<&str> = variant_set.baseline.iter().chain(variant_set.calls.iter())
        .map(|r| r.chrom.as_str())
        .filter(|name| seen.insert(*name))
        .filter(|name| baseline.contains_key(*name) || calls.contains_key(*name))
        .collect();

    let contigs = reference_genome.contig_keys();
    let mut problems = Vec::with_capacity(order.len());
    for name in order.into_iter() {
        if !contigs.iter().any(|k| k.as_str() == name) {
            bail!("Sequence {name:?} is not present in the reference genome");
        }
        let template: Arc<[u8]> = Arc::from(reference_genome.get_full_chromosome(name).to_ascii_uppercase());

        let prepare = |side: Side, grouped: &mut FxHashMap<String, Vec<Variant>>| -> anyhow::Result<Vec<Arc<Variant>>> {
            let mut variants = grouped.remove(name).unwrap_or_default();
            variants.sort();
            if let Some(v) = variants.iter().find(|v| v.start() < 0 || v.end() > template.len() as i64) {
                bail!("{side} variant {v} extends past the end of {name} ({} bp)", template.len());
            }
            trim_variant_alleles(&mut variants);
            // an alternate can turn out identical to the reference once trimmed
            let before = variants.len();
            variants.retain(|v| !v.is_reference_only());
            if variants.len() < before {
                debug!("Skipped {} {side} records on {name} whose alternates match the reference", before - variants.len());
            }
            Ok(variants.into_iter().map(Arc::new).collect())
        };
        let baseline_variants = prepare(Side::Baseline, &mut baseline)?;
        let calls_variants = prepare(Side::Calls, &mut calls)?;

        debug!("Loaded {name}: {} baseline, {} calls", baseline_variants.len(), calls_variants.len());
        problems.push(SequenceProblem {
            sequence_name: name.to_string(),
            template,
            baseline: baseline_variants,
            calls: calls_variants
        });
    }
    Ok(problems)
}

/// Loads the variant sets from a JSON file (optionally gzipped) and groups them into per-sequence problems.
/// # Arguments
/// * `variants_fn` - the JSON input with `baseline` and `calls` record lists
/// * `reference_genome` - the reference providing each sequence template
/// * `explicit_half_calls` - if true, the missing allele of a half-call is a token of its own
/// # Errors
/// * if the file cannot be read or parsed
/// * if any record is invalid for the reference
pub fn load_sequence_problems(variants_fn: &Path, reference_genome: &ReferenceGenome, explicit_half_calls: bool) -> anyhow::Result<Vec<SequenceProblem>> {
    let variant_set: VariantSetFile = load_json(variants_fn)?;
    info!("Loaded {} baseline and {} calls records from {variants_fn:?}", variant_set.baseline.len(), variant_set.calls.len());
    build_sequence_problems(&variant_set, reference_genome, explicit_half_calls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceGenome {
        let mut reference_genome = ReferenceGenome::empty_reference();
        reference_genome.add_contig("chr1".to_string(), "ACGTACGTACGTACGTACGT").unwrap();
        reference_genome.add_contig("chr2".to_string(), "acgtacgtac").unwrap();
        reference_genome
    }

    fn record(chrom: &str, position: i64, reference: &str, alts: &[&str], genotype: Option<&str>) -> VariantRecord {
        VariantRecord {
            chrom: chrom.to_string(),
            position,
            reference: reference.to_string(),
            alts: alts.iter().map(|s| s.to_string()).collect(),
            genotype: genotype.map(|s| s.to_string()),
            paternal: None,
            maternal: None,
            score: None
        }
    }

    #[test]
    fn test_parse_genotype() {
        assert_eq!(parse_genotype("0/1").unwrap(), (0, 1, false, false));
        assert_eq!(parse_genotype("1|0").unwrap(), (1, 0, true, false));
        assert_eq!(parse_genotype("./1").unwrap(), (MISSING_ALLELE, 1, false, false));
        assert_eq!(parse_genotype("2").unwrap(), (2, 2, false, true));
        assert_eq!(parse_genotype(".").unwrap(), (MISSING_ALLELE, MISSING_ALLELE, false, true));
        assert!(matches!(parse_genotype("0/x"), Err(LoaderError::InvalidGenotype { .. })));
        assert!(matches!(parse_genotype("-1/1"), Err(LoaderError::InvalidGenotype { .. })));
        assert!(matches!(parse_genotype("0/1/1"), Err(LoaderError::Variant(VariantError::UnsupportedPloidy { count: 3 }))));
    }

    #[test]
    fn test_genotype_source() {
        let (source, phased) = genotype_source(&record("chr1", 0, "A", &["G"], Some("1|0"))).unwrap();
        assert_eq!(source, GenotypeSource::Sample { allele_a: 1, allele_b: 0, haploid: false });
        assert!(phased);

        let (source, _) = genotype_source(&record("chr1", 0, "A", &["G"], None)).unwrap();
        assert_eq!(source, GenotypeSource::Population);

        let mut parental = record("chr1", 0, "A", &["G"], None);
        parental.paternal = Some("0/1".to_string());
        assert!(matches!(genotype_source(&parental), Err(LoaderError::MissingParent)));
        parental.maternal = Some("1/1".to_string());
        let (source, _) = genotype_source(&parental).unwrap();
        assert_eq!(source, GenotypeSource::Parental { paternal: (0, 1), maternal: (1, 1) });
        parental.maternal = Some("1".to_string());
        assert!(matches!(genotype_source(&parental), Err(LoaderError::InvalidParentalGenotype { .. })));
    }

    #[test]
    fn test_build_problems() {
        let variant_set = VariantSetFile {
            baseline: vec![
                record("chr1", 8, "a", &["g"], Some("0/1")),
                record("chr1", 4, "A", &["AGT"], Some("1/1")),
                record("chr1", 12, "A", &["G"], Some("0/0"))
            ],
            calls: vec![
                record("chr2", 1, "C", &["T"], Some("1")),
                record("chr1", 8, "A", &["G"], Some("1|0"))
            ]
        };
        let problems = build_sequence_problems(&variant_set, &reference(), false).unwrap();
        assert_eq!(problems.len(), 2);

        let chr1 = &problems[0];
        assert_eq!(chr1.sequence_name, "chr1");
        assert_eq!(chr1.template.len(), 20);
        // sorted, with the reference-only record dropped
        let ids: Vec<usize> = chr1.baseline.iter().map(|v| v.id()).collect();
        assert_eq!(ids, vec![2, 1]);
        // the insertion is trimmed down to its inserted bases
        let insertion = chr1.baseline[0].allele(1).unwrap();
        assert_eq!((insertion.start(), insertion.end()), (5, 5));
        assert_eq!(insertion.nucleotides(), b"GT");
        assert_eq!(chr1.baseline[1].allele(1).unwrap().nucleotides(), b"G");
        assert_eq!(chr1.calls.len(), 1);
        assert!(chr1.calls[0].is_phased());

        let chr2 = &problems[1];
        assert_eq!(chr2.sequence_name, "chr2");
        assert!(chr2.baseline.is_empty());
        assert_eq!(chr2.calls[0].id(), 1);
        assert_eq!(&chr2.template[..4], b"ACGT");
    }

    #[test]
    fn test_alternate_matching_reference() {
        let variant_set = VariantSetFile {
            baseline: vec![
                record("chr1", 2, "G", &["G"], Some("0/1")),
                record("chr1", 5, "CG", &["CG", "C"], Some("1/2"))
            ],
            calls: vec![]
        };
        let problems = build_sequence_problems(&variant_set, &reference(), false).unwrap();
        let baseline = &problems[0].baseline;
        assert_eq!(baseline.len(), 1);
        assert_eq!(baseline[0].id(), 2);
        assert!(baseline[0].allele(1).is_none());
        assert!(baseline[0].allele(2).unwrap().is_empty());
    }

    #[test]
    fn test_explicit_half_calls() {
        let variant_set = VariantSetFile {
            baseline: vec![record("chr1", 2, "G", &["T"], Some("./1"))],
            calls: vec![record("chr1", 2, "G", &["T"], Some("0/1"))]
        };
        let problems = build_sequence_problems(&variant_set, &reference(), true).unwrap();
        assert_eq!(problems[0].baseline[0].allele(MISSING_ALLELE).unwrap().nucleotides(), b"N");
        assert!(problems[0].calls[0].allele(MISSING_ALLELE).is_none());

        let problems = build_sequence_problems(&variant_set, &reference(), false).unwrap();
        assert!(problems[0].baseline[0].allele(MISSING_ALLELE).is_none());
    }

    #[test]
    fn test_missing_sequence() {
        let variant_set = VariantSetFile {
            baseline: vec![record("chr3", 1, "C", &["T"], Some("0/1"))],
            calls: vec![]
        };
        assert!(build_sequence_problems(&variant_set, &reference(), false).is_err());
    }

    #[test]
    fn test_out_of_bounds() {
        let variant_set = VariantSetFile {
            baseline: vec![],
            calls: vec![record("chr2", 9, "CA", &["T"], Some("0/1"))]
        };
        assert!(build_sequence_problems(&variant_set, &reference(), false).is_err());
    }

    #[test]
    fn test_symbolic_rejected() {
        let variant_set = VariantSetFile {
            baseline: vec![record("chr1", 1, "C", &["<DEL>"], Some("0/1"))],
            calls: vec![]
        };
        assert!(build_sequence_problems(&variant_set, &reference(), false).is_err());
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{"baseline": [{"chrom": "chr1", "position": 3, "ref": "T", "alts": ["C"], "genotype": "0|1", "score": 2.5}], "calls": []}"#;
        let variant_set: VariantSetFile = serde_json::from_str(json).unwrap();
        assert_eq!(variant_set.baseline[0].reference, "T");
        assert_eq!(variant_set.baseline[0].score, Some(2.5));
        assert!(variant_set.baseline[0].paternal.is_none());
    }
}
