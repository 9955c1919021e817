
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::summary_metrics::SummaryMetrics;
use crate::phasing_evaluator::PhasingCounts;
use crate::sequence_evaluator::SequenceEvaluation;

/// Label used for the row that sums every sequence
pub const ALL_SEQUENCES: &str = "ALL";

/// This is a wrapper for writing out summary stats to a file
#[derive(Default)]
pub struct SummaryWriter {
    /// Per-sequence metrics, in the order they were added
    sequence_metrics: Vec<(String, SummaryMetrics, PhasingCounts)>,
    /// Running total over all sequences
    total_metrics: SummaryMetrics,
    /// Running total of the phasing counts
    total_phasing: PhasingCounts,
    /// Number of sequences that were evaluated
    solved_sequences: u64,
    /// Number of sequences that failed or were aborted
    error_sequences: u64
}

/// Contains all the data written to each row of our stats file
#[derive(Serialize)]
struct SummaryRow {
    /// Sequence name, or ALL
    sequence: String,
    /// Total number of variants in the baseline
    baseline_total: u64,
    baseline_tp: u64,
    baseline_fn: u64,
    baseline_too_complex: u64,
    /// Total number of variants in the calls
    calls_total: u64,
    calls_tp: u64,
    /// Calls TP count after weighting; sums to baseline TP within each sync region
    calls_tp_weighted: f64,
    calls_fp: u64,
    calls_too_complex: u64,
    correct_phasings: u64,
    misphasings: u64,
    unphaseable: u64,
    /// Recall = baseline.TP / (baseline.TP + baseline.FN)
    metric_recall: Option<f64>,
    /// Precision = calls.weighted_TP / (calls.weighted_TP + calls.FP)
    metric_precision: Option<f64>,
    /// F1 = combination score of recall and precision
    metric_f1: Option<f64>
}

impl SummaryRow {
    /// Creates a new row from a label and summary metrics
    fn new(sequence: String, metrics: &SummaryMetrics, phasing: &PhasingCounts) -> Self {
        Self {
            sequence,
            baseline_total: metrics.baseline_tp + metrics.baseline_fn + metrics.baseline_too_complex,
            baseline_tp: metrics.baseline_tp,
            baseline_fn: metrics.baseline_fn,
            baseline_too_complex: metrics.baseline_too_complex,
            calls_total: metrics.calls_tp + metrics.calls_fp + metrics.calls_too_complex,
            calls_tp: metrics.calls_tp,
            calls_tp_weighted: metrics.calls_tp_weighted,
            calls_fp: metrics.calls_fp,
            calls_too_complex: metrics.calls_too_complex,
            correct_phasings: phasing.correct_phasings,
            misphasings: phasing.misphasings,
            unphaseable: phasing.unphaseable,
            metric_recall: metrics.recall(),
            metric_precision: metrics.precision(),
            metric_f1: metrics.f1()
        }
    }
}

impl SummaryWriter {
    /// Creates a new writer to accumulate stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the metrics of one evaluated sequence
    /// # Arguments
    /// * `evaluation` - the results for the sequence
    pub fn add_sequence_evaluation(&mut self, evaluation: &SequenceEvaluation) {
        let metrics = evaluation.summary();
        let phasing = evaluation.phasing();
        self.total_metrics += metrics;
        self.total_phasing += phasing;
        self.sequence_metrics.push((evaluation.sequence_name().to_string(), metrics, phasing));
        self.solved_sequences += 1;
    }

    /// Records a sequence that produced no evaluation
    pub fn add_error(&mut self) {
        self.error_sequences += 1;
    }

    /// Will write the summary out to the given file path
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        csv_writer.serialize(SummaryRow::new(ALL_SEQUENCES.to_string(), &self.total_metrics, &self.total_phasing))?;
        for (sequence, metrics, phasing) in self.sequence_metrics.iter() {
            csv_writer.serialize(SummaryRow::new(sequence.clone(), metrics, phasing))?;
        }

        // save everything
        csv_writer.flush()?;
        Ok(())
    }

    // getters
    pub fn total_metrics(&self) -> &SummaryMetrics {
        &self.total_metrics
    }

    pub fn total_phasing(&self) -> &PhasingCounts {
        &self.total_phasing
    }

    pub fn solved_sequences(&self) -> u64 {
        self.solved_sequences
    }

    pub fn error_sequences(&self) -> u64 {
        self.error_sequences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::data_types::variants::{GenotypeSource, Variant};
    use crate::sequence_evaluator::{evaluate_sequence, EvaluationConfig, SequenceProblem};

    fn evaluation(name: &str, calls_alt: &[u8]) -> SequenceEvaluation {
        let snp = |alt: &[u8]| {
            let genotype = GenotypeSource::Sample { allele_a: 1, allele_b: 1, haploid: false };
            let mut v = Variant::new(1, Arc::from(name), 8, b"A", &[alt.to_vec()], genotype, false, None).unwrap();
            v.trim_alleles(true);
            Arc::new(v)
        };
        let problem = SequenceProblem {
            sequence_name: name.to_string(),
            template: Arc::from(b"ACGTACGTACGTACGT".as_slice()),
            baseline: vec![snp(b"G")],
            calls: vec![snp(calls_alt)]
        };
        evaluate_sequence(&problem, &EvaluationConfig::default()).unwrap()
    }

    #[test]
    fn test_write_summary() {
        let mut writer = SummaryWriter::new();
        writer.add_sequence_evaluation(&evaluation("chr1", b"G"));
        writer.add_sequence_evaluation(&evaluation("chr2", b"C"));
        writer.add_error();
        assert_eq!(writer.solved_sequences(), 2);
        assert_eq!(writer.error_sequences(), 1);
        assert_eq!(*writer.total_metrics(), SummaryMetrics::new(1, 1, 1, 1));

        let filename = std::env::temp_dir().join(format!("okapi_summary_{}.csv", std::process::id()));
        writer.write_summary(&filename).unwrap();
        let contents = std::fs::read_to_string(&filename).unwrap();
        std::fs::remove_file(&filename).unwrap();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("sequence,baseline_total,baseline_tp"));
        assert!(lines[1].starts_with("ALL,2,1,1,0,2,1,1.0,1,0"));
        assert!(lines[2].starts_with("chr1,1,1,0,0,1,1,1.0,0,0"));
        assert!(lines[3].starts_with("chr2,1,0,1,0,1,0,0.0,1,0"));
    }
}
