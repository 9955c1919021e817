
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Runs the sequence evaluations in parallel
pub mod evaluation;
/// Orientation strategies that define what counts as a match
pub mod orientor;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Best-first search for the reconciliation of two variant sets
pub mod path_finder;
/// Rankings for choosing between competing paths
pub mod path_preference;
/// Phasing analysis along the best path
pub mod phasing_evaluator;
/// Haplotype replay automata and the paths built from them
pub mod replay;
/// Classifies the variants of a single reference sequence
pub mod sequence_evaluator;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
