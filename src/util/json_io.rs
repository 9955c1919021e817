
use anyhow::Context;
use std::io::{BufReader, BufWriter, Read, Write};
use std::fs::File;
use std::path::Path;

/// True if the path should be treated as gzip compressed
fn is_gzip(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

/// Loads a JSON file into some type; a `.gz` extension is decompressed on the fly
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let fp: Box<dyn Read> = if is_gzip(filename) {
        Box::new(flate2::read::MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let result: T = serde_json::from_reader(BufReader::new(fp))
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

/// Saves a serializable struct as pretty JSON; a `.gz` extension is compressed
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let file: Box<dyn Write> = if is_gzip(out_filename) {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}
