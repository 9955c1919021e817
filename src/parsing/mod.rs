/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Loads the JSON variant sets into per-sequence problems
pub mod problem_loader;
