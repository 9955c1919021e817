
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::replay::Side;
use crate::sequence_evaluator::{ClassifiedVariant, SequenceEvaluation, VariantStatus};

/// Writes one row per input variant with its classification
pub struct VariantStatusWriter {
    /// Handle on the writer, optionally gzip compressed
    csv_writer: StatusOutput
}

/// The gzip stream is kept by type so its trailer can be written explicitly
enum StatusOutput {
    Plain(csv::Writer<File>),
    Gzip(csv::Writer<GzEncoder<File>>)
}

/// Contains all the data written to each row of the variant file
#[derive(Serialize)]
struct VariantStatusRow {
    side: Side,
    sequence: String,
    /// 1-based ID of the record in the input
    id: usize,
    /// 1-based first position touched by the trimmed alleles
    start: i64,
    /// 1-based inclusive end
    end: i64,
    alleles: String,
    genotype: String,
    status: VariantStatus,
    weight: f64,
    /// Orientation chosen on the best path, "." if none
    orientation: String,
    alternate_match: bool,
    score: Option<f64>
}

impl VariantStatusRow {
    fn new(side: Side, classified: &ClassifiedVariant) -> Self {
        let variant = classified.variant();
        Self {
            side,
            sequence: variant.sequence_name().to_string(),
            id: variant.id(),
            start: variant.start() + 1,
            end: variant.end(),
            alleles: variant.alternates_string(),
            genotype: variant.genotype_string(),
            status: classified.status(),
            weight: classified.weight(),
            orientation: classified.orientation_string(),
            alternate_match: classified.alternate_match(),
            score: variant.sort_value()
        }
    }
}

impl VariantStatusWriter {
    /// Opens the output; a `.gz` extension enables compression and a `.csv` extension switches to commas
    /// # Arguments
    /// * `filename` - path to the output file
    /// # Errors
    /// * if the file cannot be created
    pub fn new(filename: &Path) -> std::io::Result<Self> {
        let stem = if filename.extension().unwrap_or_default() == "gz" {
            filename.file_stem().map(Path::new).unwrap_or(filename)
        } else {
            filename
        };
        let is_csv: bool = stem.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };

        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(delimiter);
        let csv_writer = if filename.extension().unwrap_or_default() == "gz" {
            StatusOutput::Gzip(builder.from_writer(GzEncoder::new(
                File::create(filename)?,
                flate2::Compression::default()
            )))
        } else {
            StatusOutput::Plain(builder.from_writer(File::create(filename)?))
        };
        Ok(Self {
            csv_writer
        })
    }

    fn write_row(&mut self, row: VariantStatusRow) -> csv::Result<()> {
        match &mut self.csv_writer {
            StatusOutput::Plain(writer) => writer.serialize(row),
            StatusOutput::Gzip(writer) => writer.serialize(row)
        }
    }

    /// Writes every baseline then every calls variant of a sequence
    pub fn write_evaluation(&mut self, evaluation: &SequenceEvaluation) -> csv::Result<()> {
        for classified in evaluation.baseline().iter() {
            self.write_row(VariantStatusRow::new(Side::Baseline, classified))?;
        }
        for classified in evaluation.calls().iter() {
            self.write_row(VariantStatusRow::new(Side::Calls, classified))?;
        }
        Ok(())
    }

    /// Flushes and closes the output, writing the gzip trailer if compressed
    /// # Errors
    /// * if the buffered rows or the gzip trailer cannot be written
    pub fn finish(self) -> csv::Result<()> {
        match self.csv_writer {
            StatusOutput::Plain(mut writer) => writer.flush()?,
            StatusOutput::Gzip(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
            }
        };
        Ok(())
    }
}
