use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Quality score encoding scheme. The offset is fixed per scheme and is
/// resolved once, when the record is constructed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum QualityEncoding {
    /// Sanger/Illumina 1.8+ encoding, ASCII offset 33.
    #[default]
    Phred33,

    /// Illumina 1.3-1.7 encoding, ASCII offset 64.
    Phred64,
}

impl QualityEncoding {
    pub fn offset(self) -> u8 {
        match self {
            QualityEncoding::Phred33 => 33,
            QualityEncoding::Phred64 => 64,
        }
    }
}

impl FromStr for QualityEncoding {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phred33" | "33" => Ok(QualityEncoding::Phred33),
            "phred64" | "64" => Ok(QualityEncoding::Phred64),
            _ => Err(RecordError::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for QualityEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityEncoding::Phred33 => f.write_str("phred33"),
            QualityEncoding::Phred64 => f.write_str("phred64"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("unknown quality encoding `{0}': expected phred33 or phred64")]
    UnknownEncoding(String),

    #[error("description `{0}' does not start with a `>' or `@' marker")]
    MissingMarker(String),

    #[error("description `{0}' contains no sequence name")]
    MissingName(String),

    #[error("quality length ({qual}) does not match sequence length ({seq})")]
    QualityLength { seq: usize, qual: usize },

    #[error("record has no quality scores")]
    EmptyQuality,

    #[error("quality character `{chr}' is below the {encoding} offset")]
    QualityUnderflow { chr: char, encoding: QualityEncoding },
}

/// A single sequence entry: header, residues and (for FASTQ) quality string.
///
/// The description keeps its leading marker character exactly as it appeared
/// in the source; the record name is always derived from it on demand rather
/// than stored, so the two can never fall out of sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub sequence: String,
    pub description: String,
    pub quality: String,
    pub encoding: QualityEncoding,
}

impl SequenceRecord {
    /// Create a quality-less (FASTA) record.
    pub fn new(description: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            description: description.into(),
            quality: String::new(),
            encoding: QualityEncoding::default(),
        }
    }

    /// Create a FASTQ record. The quality string must cover every residue.
    pub fn with_quality(
        description: impl Into<String>,
        sequence: impl Into<String>,
        quality: impl Into<String>,
        encoding: QualityEncoding,
    ) -> Result<Self, RecordError> {
        let sequence = sequence.into();
        let quality = quality.into();

        if quality.len() != sequence.len() {
            return Err(RecordError::QualityLength {
                seq: sequence.len(),
                qual: quality.len(),
            });
        }

        Ok(Self {
            sequence,
            description: description.into(),
            quality,
            encoding,
        })
    }

    /// The first whitespace-delimited token of the description, marker stripped.
    pub fn name(&self) -> Result<&str, RecordError> {
        let marked = self
            .description
            .strip_prefix('>')
            .or_else(|| self.description.strip_prefix('@'));

        let Some(rest) = marked else {
            return Err(RecordError::MissingMarker(self.description.clone()));
        };

        rest.split_whitespace()
            .next()
            .ok_or_else(|| RecordError::MissingName(self.description.clone()))
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Decode the quality string into numeric scores using the record's
    /// encoding offset. A record without quality (FASTA) is an error rather
    /// than an empty score list.
    pub fn quality_scores(&self) -> Result<Vec<u8>, RecordError> {
        if self.quality.is_empty() {
            return Err(RecordError::EmptyQuality);
        }

        let offset = self.encoding.offset();
        self.quality
            .bytes()
            .map(|b| {
                b.checked_sub(offset).ok_or(RecordError::QualityUnderflow {
                    chr: b as char,
                    encoding: self.encoding,
                })
            })
            .collect()
    }
}
