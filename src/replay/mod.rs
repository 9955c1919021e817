/*!
# Replay module
Haplotype replay for the reconciliation search.
A `HaplotypePlayback` replays one haplotype base-by-base, a `HalfPath` holds the haplotypes for one side of the comparison, and a `Path` pairs the baseline and calls sides.
*/

/// Two-haplotype replay for one side of a comparison, plus its variant history
pub mod half_path;
/// Single haplotype replay automaton
pub mod haplotype_playback;
/// A candidate reconciliation of both sides, with sync points and weighting
pub mod path;

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error("Out of order alleles during replay: allele starts at {expected} but replay is at {position}")]
    OutOfOrder { expected: i64, position: i64 },
    #[error("Attempt to move forward while still inside an allele at {position}")]
    MoveInsideAllele { position: i64 },
    #[error("Attempt to replay past the end of the template at {position}")]
    PastTemplateEnd { position: i64 }
}

/// Identifies which side of the comparison an operation applies to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[strum(serialize = "baseline")]
    Baseline,
    #[strum(serialize = "calls")]
    Calls
}
