use std::fs::File;
use std::io::{self, stdout, BufWriter, Write};
use std::num::NonZeroUsize;

use thiserror::Error;

use crate::reader::SequenceFormat;
use crate::record::SequenceRecord;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error(
        "cannot write `{description}' as FASTQ: quality length ({qual}) \
         does not match sequence length ({seq})"
    )]
    QualityMismatch {
        description: String,
        seq: usize,
        qual: usize,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Buffered destination stream; contents are flushed when the writer that
/// owns it goes out of scope.
pub type BoxedWriter = BufWriter<Box<dyn Write + Send>>;

/// Open a destination path for writing, where `-' means standard output.
pub fn open_destination(path: &str) -> io::Result<BoxedWriter> {
    let inner: Box<dyn Write + Send> = match path {
        "-" => Box::new(stdout()),
        _ => Box::new(File::create(path)?),
    };
    Ok(BufWriter::new(inner))
}

/// Write `text` in fixed-width chunks of `line_length` characters, one chunk
/// per line; the final chunk may be shorter. `None` disables wrapping and
/// places the whole text on a single line.
fn write_wrapped<W: Write>(
    stream: &mut W,
    text: &str,
    line_length: Option<NonZeroUsize>,
) -> io::Result<()> {
    match line_length {
        None => {
            stream.write_all(text.as_bytes())?;
            stream.write_all(b"\n")
        }
        Some(width) => {
            for chunk in text.as_bytes().chunks(width.get()) {
                stream.write_all(chunk)?;
                stream.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

/// Serializes records to FASTA: description line verbatim, then the sequence
/// wrapped at `line_length`.
pub struct FastaWriter<W: Write> {
    stream: W,
    line_length: Option<NonZeroUsize>,
    sequences_written: usize,
}

impl FastaWriter<BoxedWriter> {
    pub fn to_path(path: &str, line_length: Option<NonZeroUsize>) -> io::Result<Self> {
        Ok(Self::new(open_destination(path)?, line_length))
    }
}

impl<W: Write> FastaWriter<W> {
    pub fn new(stream: W, line_length: Option<NonZeroUsize>) -> Self {
        Self {
            stream,
            line_length,
            sequences_written: 0,
        }
    }

    pub fn write_sequence(&mut self, record: &SequenceRecord) -> Result<(), WriteError> {
        writeln!(self.stream, "{}", record.description)?;
        write_wrapped(&mut self.stream, &record.sequence, self.line_length)?;
        self.sequences_written += 1;
        Ok(())
    }

    /// Write every record of a finite sequence, preserving order.
    pub fn write_sequences<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a SequenceRecord>,
    ) -> Result<(), WriteError> {
        for record in records {
            self.write_sequence(record)?;
        }
        Ok(())
    }

    /// Number of records written so far.
    pub fn sequences_written(&self) -> usize {
        self.sequences_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Serializes records to FASTQ: header, sequence, `+' separator, quality.
///
/// Sequence and quality are wrapped at the same width, so their chunk lines
/// stay aligned pair-for-pair. A record whose quality does not cover its
/// sequence cannot be represented and is rejected.
pub struct FastqWriter<W: Write> {
    stream: W,
    line_length: Option<NonZeroUsize>,
    sequences_written: usize,
}

impl FastqWriter<BoxedWriter> {
    pub fn to_path(path: &str, line_length: Option<NonZeroUsize>) -> io::Result<Self> {
        Ok(Self::new(open_destination(path)?, line_length))
    }
}

impl<W: Write> FastqWriter<W> {
    pub fn new(stream: W, line_length: Option<NonZeroUsize>) -> Self {
        Self {
            stream,
            line_length,
            sequences_written: 0,
        }
    }

    pub fn write_sequence(&mut self, record: &SequenceRecord) -> Result<(), WriteError> {
        if record.quality.len() != record.sequence.len() {
            return Err(WriteError::QualityMismatch {
                description: record.description.clone(),
                seq: record.sequence.len(),
                qual: record.quality.len(),
            });
        }

        writeln!(self.stream, "{}", record.description)?;
        write_wrapped(&mut self.stream, &record.sequence, self.line_length)?;
        writeln!(self.stream, "+")?;
        write_wrapped(&mut self.stream, &record.quality, self.line_length)?;
        self.sequences_written += 1;
        Ok(())
    }

    /// Write every record of a finite sequence, preserving order.
    pub fn write_sequences<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a SequenceRecord>,
    ) -> Result<(), WriteError> {
        for record in records {
            self.write_sequence(record)?;
        }
        Ok(())
    }

    /// Number of records written so far.
    pub fn sequences_written(&self) -> usize {
        self.sequences_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Format-dispatching writer, mirroring [`crate::reader::SequenceReader`].
pub enum SequenceWriter<W: Write> {
    Fasta(FastaWriter<W>),
    Fastq(FastqWriter<W>),
}

impl SequenceWriter<BoxedWriter> {
    pub fn to_path(
        path: &str,
        format: SequenceFormat,
        line_length: Option<NonZeroUsize>,
    ) -> io::Result<Self> {
        Ok(Self::new(open_destination(path)?, format, line_length))
    }
}

impl<W: Write> SequenceWriter<W> {
    pub fn new(stream: W, format: SequenceFormat, line_length: Option<NonZeroUsize>) -> Self {
        match format {
            SequenceFormat::Fasta => SequenceWriter::Fasta(FastaWriter::new(stream, line_length)),
            SequenceFormat::Fastq => SequenceWriter::Fastq(FastqWriter::new(stream, line_length)),
        }
    }

    pub fn write_sequence(&mut self, record: &SequenceRecord) -> Result<(), WriteError> {
        match self {
            SequenceWriter::Fasta(w) => w.write_sequence(record),
            SequenceWriter::Fastq(w) => w.write_sequence(record),
        }
    }

    pub fn sequences_written(&self) -> usize {
        match self {
            SequenceWriter::Fasta(w) => w.sequences_written(),
            SequenceWriter::Fastq(w) => w.sequences_written(),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            SequenceWriter::Fasta(w) => w.flush(),
            SequenceWriter::Fastq(w) => w.flush(),
        }
    }
}
