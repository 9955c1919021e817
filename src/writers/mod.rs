/*!
# Writers module
Contains the logic for writing the output files for the eval command.
*/
/// Generates the summary file
pub mod summary;
/// Generates the per-variant status file
pub mod variant_status;
