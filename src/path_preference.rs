
use serde::Serialize;
use std::cmp::Ordering;
use strum_macros::EnumString;

use crate::data_types::oriented_variant::OrientedVariant;
use crate::replay::half_path::HalfPath;
use crate::replay::path::Path;

/// Ranking used to pick between competing paths with the same replay state, and between finished paths
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, strum_macros::Display, EnumString, Serialize, clap::ValueEnum)]
pub enum PathPreference {
    /// Maximize the number of included variants summed over both sides
    #[default]
    #[strum(ascii_case_insensitive, serialize = "max_sum_both")]
    #[clap(name = "max_sum_both")]
    MaxSumBoth,
    /// Maximize the included calls, then minimize the included baseline
    #[strum(ascii_case_insensitive, serialize = "max_calls_min_baseline")]
    #[clap(name = "max_calls_min_baseline")]
    MaxCallsMinBaseline
}

impl PathPreference {
    /// Compares two paths, `Ordering::Greater` means `a` is preferred over `b`.
    /// Only identical decision histories compare as equal.
    pub fn compare(&self, a: &Path, b: &Path) -> Ordering {
        // a known no-op always loses
        let noop = b.is_noop().cmp(&a.is_noop());
        if noop != Ordering::Equal {
            return noop;
        }

        let primary = match self {
            PathPreference::MaxSumBoth => {
                total_included(a).cmp(&total_included(b))
            },
            PathPreference::MaxCallsMinBaseline => {
                a.calls().included_count().cmp(&b.calls().included_count())
                    .then_with(|| b.baseline().included_count().cmp(&a.baseline().included_count()))
            }
        };

        primary
            .then_with(|| since_sync_imbalance(b).cmp(&since_sync_imbalance(a)))
            .then_with(|| a.sync_point_count().cmp(&b.sync_point_count()))
            .then_with(|| compare_history(a.calls(), b.calls()))
            .then_with(|| compare_history(a.baseline(), b.baseline()))
    }

    /// Returns the preferred path, `a` unless `b` is strictly preferred
    pub fn better(&self, a: Path, b: Path) -> Path {
        match self.compare(&a, &b) {
            Ordering::Less => b,
            Ordering::Equal |
            Ordering::Greater => a
        }
    }
}

fn total_included(path: &Path) -> usize {
    path.calls().included_count() + path.baseline().included_count()
}

fn since_sync_imbalance(path: &Path) -> usize {
    path.baseline_since_sync().abs_diff(path.calls_since_sync())
}

/// Deterministic ordering of the included histories, most recent decision first
fn compare_history(a: &HalfPath, b: &HalfPath) -> Ordering {
    let key = |v: &OrientedVariant| (v.variant().id(), v.allele_a(), v.allele_b());
    a.included_history().map(key).cmp(b.included_history().map(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::str::FromStr;

    use crate::data_types::variants::{GenotypeSource, Variant};
    use crate::orientor::Orientor;
    use crate::replay::Side;

    fn template() -> Arc<[u8]> {
        Arc::from(b"ACGTACGTACGTACGT".as_slice())
    }

    fn variant(id: usize, position: i64, reference: &[u8], alt: &[u8]) -> Arc<Variant> {
        let genotype = GenotypeSource::Sample { allele_a: 1, allele_b: 1, haploid: false };
        let mut v = Variant::new(id, Arc::from("chr1"), position, reference, &[alt.to_vec()], genotype, false, None).unwrap();
        v.trim_alleles(true);
        Arc::new(v)
    }

    #[test]
    fn test_more_included_wins() {
        let v = variant(1, 4, b"A", b"G");
        let children = Path::new(template()).add_variant(Side::Calls, &v, 0, &Orientor::Unphased).unwrap();
        let (exclude, include) = (&children[0], &children[1]);

        assert_eq!(PathPreference::MaxSumBoth.compare(include, exclude), Ordering::Greater);
        assert_eq!(PathPreference::MaxSumBoth.compare(exclude, include), Ordering::Less);
        assert_eq!(PathPreference::MaxCallsMinBaseline.compare(include, exclude), Ordering::Greater);

        let chosen = PathPreference::MaxSumBoth.better(exclude.clone(), include.clone());
        assert_eq!(chosen.calls().included_count(), 1);
    }

    #[test]
    fn test_min_baseline() {
        let v = variant(1, 4, b"A", b"G");
        let children = Path::new(template()).add_variant(Side::Baseline, &v, 0, &Orientor::Unphased).unwrap();
        let (exclude, include) = (&children[0], &children[1]);

        assert_eq!(PathPreference::MaxSumBoth.compare(include, exclude), Ordering::Greater);
        assert_eq!(PathPreference::MaxCallsMinBaseline.compare(include, exclude), Ordering::Less);
    }

    #[test]
    fn test_history_tie_break() {
        // same replay state reached through different variant IDs
        let first = Path::new(template()).add_variant(Side::Calls, &variant(1, 4, b"A", b"G"), 0, &Orientor::Unphased).unwrap().remove(1);
        let second = Path::new(template()).add_variant(Side::Calls, &variant(2, 4, b"A", b"G"), 0, &Orientor::Unphased).unwrap().remove(1);
        assert_eq!(first, second);

        let pref = PathPreference::MaxSumBoth;
        assert_eq!(pref.compare(&second, &first), Ordering::Greater);
        assert_eq!(pref.compare(&first, &second), Ordering::Less);
        assert_eq!(pref.compare(&first, &first), Ordering::Equal);
        assert_eq!(pref.better(first.clone(), second.clone()).calls_included()[0].variant().id(), 2);
    }

    #[test]
    fn test_names() {
        assert_eq!(PathPreference::from_str("MAX_SUM_BOTH").unwrap(), PathPreference::MaxSumBoth);
        assert_eq!(PathPreference::MaxCallsMinBaseline.to_string(), "max_calls_min_baseline");
    }
}
