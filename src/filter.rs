use std::num::NonZeroUsize;

use anyhow::{Context, Result};

use crate::reader::FastaReader;
use crate::record::SequenceRecord;
use crate::writer::FastaWriter;

pub struct FilterOpts {
    pub minimum_basepairs: usize,
    pub max_unknown: Option<usize>,
}

/// Whether a record survives the length and `N' content thresholds.
pub fn keep(record: &SequenceRecord, opts: &FilterOpts) -> bool {
    if record.len() < opts.minimum_basepairs {
        return false;
    }

    match opts.max_unknown {
        Some(max) => record.sequence.bytes().filter(|&b| b == b'N').count() <= max,
        None => true,
    }
}

/// Stream records from `input`, dropping the ones that fail the filters, and
/// write the survivors to `output`.
pub fn filter_sequences(
    input: &str,
    output: &str,
    opts: &FilterOpts,
    line_length: Option<NonZeroUsize>,
) -> Result<()> {
    let mut reader =
        FastaReader::from_path(input).with_context(|| format!("could not open {input}"))?;
    let mut writer = FastaWriter::to_path(output, line_length)
        .with_context(|| format!("could not create {output}"))?;

    for record in reader.by_ref() {
        let record = record?;
        if keep(&record, opts) {
            writer.write_sequence(&record)?;
        }
    }
    writer.flush()?;

    info!(
        "kept {} of {} sequences",
        writer.sequences_written(),
        reader.sequence_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(minimum_basepairs: usize, max_unknown: Option<usize>) -> FilterOpts {
        FilterOpts {
            minimum_basepairs,
            max_unknown,
        }
    }

    #[test]
    fn drops_short_sequences() {
        let rec = SequenceRecord::new(">short", "ACGT");
        assert!(!keep(&rec, &opts(5, None)));
        assert!(keep(&rec, &opts(4, None)));
    }

    #[test]
    fn drops_sequences_with_too_many_unknowns() {
        let rec = SequenceRecord::new(">gappy", "ACNNGTNN");
        assert!(keep(&rec, &opts(0, Some(4))));
        assert!(!keep(&rec, &opts(0, Some(3))));
        assert!(keep(&rec, &opts(0, None)));
    }
}
