use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use thiserror::Error;

use crate::record::{QualityEncoding, RecordError, SequenceRecord};

/// On-disk sequence file format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}

impl SequenceFormat {
    /// The character that introduces a record header.
    pub fn marker(self) -> char {
        match self {
            SequenceFormat::Fasta => '>',
            SequenceFormat::Fastq => '@',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SequenceFormat::Fasta => "fa",
            SequenceFormat::Fastq => "fq",
        }
    }
}

impl fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceFormat::Fasta => f.write_str("FASTA"),
            SequenceFormat::Fastq => f.write_str("FASTQ"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("not a valid {format} source: line {line} does not start with `{}'", .format.marker())]
    InvalidFormat { format: SequenceFormat, line: u64 },

    #[error("unexpected end of file inside the record at line {line}")]
    UnexpectedEof { line: u64 },

    #[error("quality length ({qual}) does not match sequence length ({seq}) at line {line}")]
    LengthMismatch { seq: usize, qual: usize, line: u64 },

    #[error("expected a `@' record header on line {line}")]
    MissingHeader { line: u64 },

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Line-oriented source shared by both readers: strips line endings and keeps
/// a running line number for error reporting.
struct LineReader {
    rdr: Box<dyn BufRead + Send>,
    line_num: u64,
}

impl LineReader {
    fn new(rdr: Box<dyn BufRead + Send>) -> Self {
        Self { rdr, line_num: 0 }
    }

    /// Read one line with the trailing `\n` (and `\r`, if any) removed.
    /// Returns `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.rdr.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }

        self.line_num += 1;
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Consume leading blank lines and return the first record header.
    /// Anything else, including an empty source, fails format validation.
    fn first_header(&mut self, format: SequenceFormat) -> Result<String, ParseError> {
        loop {
            match self.read_line()? {
                None => {
                    return Err(ParseError::InvalidFormat {
                        format,
                        line: self.line_num,
                    })
                }
                Some(line) if line.is_empty() => continue,
                Some(line) if line.starts_with(format.marker()) => return Ok(line),
                Some(_) => {
                    return Err(ParseError::InvalidFormat {
                        format,
                        line: self.line_num,
                    })
                }
            }
        }
    }
}

/// Open a source path for reading, where `-' means standard input.
fn open_source(path: &str) -> io::Result<Box<dyn BufRead + Send>> {
    Ok(match path {
        "-" => Box::new(BufReader::new(io::stdin())),
        _ => Box::new(BufReader::new(File::open(path)?)),
    })
}

/// Streaming FASTA reader.
///
/// Records are produced lazily, one per `next` call; the stream is consumed as
/// records are pulled and cannot be restarted. The underlying handle is
/// released when the reader is dropped, including on early stops and errors.
pub struct FastaReader {
    src: LineReader,
    pending: Option<String>,
    sequence_count: usize,
}

impl fmt::Debug for FastaReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastaReader")
            .field("line_num", &self.src.line_num)
            .field("pending", &self.pending)
            .field("sequence_count", &self.sequence_count)
            .finish()
    }
}

impl FastaReader {
    pub fn from_path(path: &str) -> Result<Self, ParseError> {
        Self::from_bufread(open_source(path)?)
    }

    pub fn from_bufread<R: BufRead + Send + 'static>(rdr: R) -> Result<Self, ParseError> {
        let mut src = LineReader::new(Box::new(rdr));
        let header = src.first_header(SequenceFormat::Fasta)?;

        Ok(Self {
            src,
            pending: Some(header),
            sequence_count: 0,
        })
    }

    /// Number of records emitted so far.
    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }
}

impl Iterator for FastaReader {
    type Item = Result<SequenceRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.pending.take()?;
        let mut sequence = String::new();

        // accumulate body lines until the next header or end of input; both
        // complete the record, so a header with no body yields an empty
        // sequence rather than an error
        loop {
            match self.src.read_line() {
                Err(e) => return Some(Err(e.into())),
                Ok(None) => break,
                Ok(Some(line)) => {
                    if line.starts_with('>') {
                        self.pending = Some(line);
                        break;
                    }
                    sequence.push_str(&line);
                }
            }
        }

        self.sequence_count += 1;
        Some(Ok(SequenceRecord::new(header, sequence)))
    }
}

/// Streaming FASTQ reader with the same lazy emission model as [`FastaReader`].
///
/// Quality lines are consumed until the quality covers the sequence, so a
/// quality line that happens to begin with `@` is never mistaken for the next
/// record header. A record whose quality cannot be made to match its sequence
/// length is rejected at parse time.
pub struct FastqReader {
    src: LineReader,
    pending: Option<String>,
    encoding: QualityEncoding,
    sequence_count: usize,
}

impl fmt::Debug for FastqReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastqReader")
            .field("line_num", &self.src.line_num)
            .field("pending", &self.pending)
            .field("encoding", &self.encoding)
            .field("sequence_count", &self.sequence_count)
            .finish()
    }
}

impl FastqReader {
    pub fn from_path(path: &str, encoding: QualityEncoding) -> Result<Self, ParseError> {
        Self::from_bufread(open_source(path)?, encoding)
    }

    pub fn from_bufread<R: BufRead + Send + 'static>(
        rdr: R,
        encoding: QualityEncoding,
    ) -> Result<Self, ParseError> {
        let mut src = LineReader::new(Box::new(rdr));
        let header = src.first_header(SequenceFormat::Fastq)?;

        Ok(Self {
            src,
            pending: Some(header),
            encoding,
            sequence_count: 0,
        })
    }

    /// Number of records emitted so far.
    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }

    fn read_record(&mut self, header: String) -> Result<SequenceRecord, ParseError> {
        // sequence lines accumulate until the `+' separator line
        let mut sequence = String::new();
        loop {
            match self.src.read_line()? {
                None => {
                    return Err(ParseError::UnexpectedEof {
                        line: self.src.line_num,
                    })
                }
                Some(line) if line.starts_with('+') => break,
                Some(line) => sequence.push_str(&line),
            }
        }

        // quality lines accumulate until they cover the sequence
        let mut quality = String::with_capacity(sequence.len());
        while quality.len() < sequence.len() {
            match self.src.read_line()? {
                None => {
                    return Err(ParseError::LengthMismatch {
                        seq: sequence.len(),
                        qual: quality.len(),
                        line: self.src.line_num,
                    })
                }
                Some(line) => quality.push_str(&line),
            }
        }

        if quality.len() > sequence.len() {
            return Err(ParseError::LengthMismatch {
                seq: sequence.len(),
                qual: quality.len(),
                line: self.src.line_num,
            });
        }

        // the record is complete; the next non-blank line must be a header
        loop {
            match self.src.read_line()? {
                None => break,
                Some(line) if line.is_empty() => continue,
                Some(line) if line.starts_with('@') => {
                    self.pending = Some(line);
                    break;
                }
                Some(_) => {
                    return Err(ParseError::MissingHeader {
                        line: self.src.line_num,
                    })
                }
            }
        }

        Ok(SequenceRecord::with_quality(
            header, sequence, quality, self.encoding,
        )?)
    }
}

impl Iterator for FastqReader {
    type Item = Result<SequenceRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.pending.take()?;

        let result = self.read_record(header);
        if result.is_ok() {
            self.sequence_count += 1;
        }
        Some(result)
    }
}

/// Format-dispatching reader, so callers can hold either kind behind one type.
pub enum SequenceReader {
    Fasta(FastaReader),
    Fastq(FastqReader),
}

impl SequenceReader {
    pub fn from_path(
        path: &str,
        format: SequenceFormat,
        encoding: QualityEncoding,
    ) -> Result<Self, ParseError> {
        Ok(match format {
            SequenceFormat::Fasta => SequenceReader::Fasta(FastaReader::from_path(path)?),
            SequenceFormat::Fastq => {
                SequenceReader::Fastq(FastqReader::from_path(path, encoding)?)
            }
        })
    }

    pub fn sequence_count(&self) -> usize {
        match self {
            SequenceReader::Fasta(r) => r.sequence_count(),
            SequenceReader::Fastq(r) => r.sequence_count(),
        }
    }
}

impl Iterator for SequenceReader {
    type Item = Result<SequenceRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SequenceReader::Fasta(r) => r.next(),
            SequenceReader::Fastq(r) => r.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fasta(source: &'static str) -> FastaReader {
        FastaReader::from_bufread(source.as_bytes()).unwrap()
    }

    fn fastq(source: &'static str) -> FastqReader {
        FastqReader::from_bufread(source.as_bytes(), QualityEncoding::Phred33).unwrap()
    }

    #[test]
    fn fasta_two_records() {
        let mut reader = fasta(">seq1\nACGT\nACGT\n>seq2\nTTTT\n");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.name().unwrap(), "seq1");
        assert_eq!(rec.sequence, "ACGTACGT");
        assert_eq!(rec.description, ">seq1");
        assert_eq!(reader.sequence_count(), 1);

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.name().unwrap(), "seq2");
        assert_eq!(rec.sequence, "TTTT");

        assert!(reader.next().is_none());
        assert_eq!(reader.sequence_count(), 2);
    }

    #[test]
    fn fasta_emits_one_record_per_header() {
        let headers = 5;
        let source: String = (0..headers).map(|i| format!(">s{i}\nACGT\n")).collect();
        let reader = FastaReader::from_bufread(std::io::Cursor::new(source)).unwrap();
        assert_eq!(reader.map(Result::unwrap).count(), headers);
    }

    #[test]
    fn fasta_single_record_without_trailing_newline() {
        let mut reader = fasta(">only\nACGT");
        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.sequence, "ACGT");
        assert!(reader.next().is_none());
    }

    #[test]
    fn fasta_empty_sequence_between_headers() {
        let mut reader = fasta(">empty\n>full\nACGT\n");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.description, ">empty");
        assert_eq!(rec.sequence, "");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.sequence, "ACGT");
    }

    #[test]
    fn fasta_rejects_headerless_source() {
        let err = FastaReader::from_bufread("ACGT\n>seq1\nACGT\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidFormat {
                format: SequenceFormat::Fasta,
                ..
            }
        ));
        assert!(err.to_string().contains("not a valid FASTA source"));
    }

    #[test]
    fn fasta_rejects_empty_source() {
        assert!(matches!(
            FastaReader::from_bufread("".as_bytes()),
            Err(ParseError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn fasta_skips_leading_blank_lines() {
        let mut reader = fasta("\n\n>seq1\nACGT\n");
        assert_eq!(reader.next().unwrap().unwrap().sequence, "ACGT");
    }

    #[test]
    fn fasta_strips_crlf() {
        let mut reader = fasta(">seq1\r\nACGT\r\nAC\r\n");
        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.description, ">seq1");
        assert_eq!(rec.sequence, "ACGTAC");
    }

    #[test]
    fn fastq_two_records() {
        let mut reader = fastq("@read1 desc\nACGT\n+\n!!!!\n@read2\nAA\n+\nII\n");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.name().unwrap(), "read1");
        assert_eq!(rec.sequence, "ACGT");
        assert_eq!(rec.quality, "!!!!");
        assert_eq!(rec.quality_scores().unwrap(), vec![0, 0, 0, 0]);

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.name().unwrap(), "read2");
        assert_eq!(rec.quality, "II");

        assert!(reader.next().is_none());
        assert_eq!(reader.sequence_count(), 2);
    }

    #[test]
    fn fastq_reassembles_wrapped_records() {
        let mut reader = fastq("@read1\nACG\nTAC\n+\n!!!\n!!!\n@read2\nAA\n+\nII\n");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.sequence, "ACGTAC");
        assert_eq!(rec.quality, "!!!!!!");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.name().unwrap(), "read2");
    }

    #[test]
    fn fastq_quality_line_starting_with_at_is_not_a_header() {
        let mut reader = fastq("@read1\nACGT\nAC\n+\n@@@@\n@@\n@read2\nAA\n+\nII\n");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.sequence, "ACGTAC");
        assert_eq!(rec.quality, "@@@@@@");

        let rec = reader.next().unwrap().unwrap();
        assert_eq!(rec.name().unwrap(), "read2");
        assert!(reader.next().is_none());
    }

    #[test]
    fn fastq_rejects_length_mismatch() {
        // quality overshoots the sequence within one line
        let mut reader = fastq("@read1\nACGT\n+\n!!!!!!\n");
        assert!(matches!(
            reader.next().unwrap(),
            Err(ParseError::LengthMismatch { seq: 4, qual: 6, .. })
        ));

        // the stream is aborted after the failure
        assert!(reader.next().is_none());
    }

    #[test]
    fn fastq_rejects_truncated_quality() {
        let mut reader = fastq("@read1\nACGT\n+\n!!\n");
        assert!(matches!(
            reader.next().unwrap(),
            Err(ParseError::LengthMismatch { seq: 4, qual: 2, .. })
        ));
    }

    #[test]
    fn fastq_rejects_missing_separator() {
        let mut reader = fastq("@read1\nACGT\n");
        assert!(matches!(
            reader.next().unwrap(),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn fastq_rejects_fasta_source() {
        let err = FastqReader::from_bufread(">seq1\nACGT\n".as_bytes(), QualityEncoding::Phred33)
            .unwrap_err();
        assert!(err.to_string().contains("not a valid FASTQ source"));
    }

    #[test]
    fn from_path_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.fa");
        std::fs::write(&path, ">seq1\nACGT\n").unwrap();

        let mut reader = FastaReader::from_path(path.to_str().unwrap()).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().sequence, "ACGT");
        assert!(reader.next().is_none());
    }

    #[test]
    fn format_dispatch() {
        assert_eq!(SequenceFormat::Fasta.marker(), '>');
        assert_eq!(SequenceFormat::Fastq.marker(), '@');
        assert_eq!(SequenceFormat::Fasta.extension(), "fa");
        assert_eq!(SequenceFormat::Fastq.extension(), "fq");
    }
}
