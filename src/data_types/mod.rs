
/// Contains the allele definition, a sequence at a locus
pub mod allele;
/// Contains a variant bound to a specific haplotype assignment
pub mod oriented_variant;
/// Contains tracker for TP, FP, FN and derived metrics
pub mod summary_metrics;
/// Contains variant definition functionality and checks
pub mod variants;
