use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indoc::formatdoc;

use crate::reader::{SequenceFormat, SequenceReader};
use crate::record::QualityEncoding;
use crate::writer::SequenceWriter;

pub struct SplitOpts {
    /// Number of output files, or sequences per output file with `per_file`.
    pub number: usize,
    pub per_file: bool,
    pub format: SequenceFormat,
    pub encoding: QualityEncoding,
    pub prefix: String,
    pub directory: String,
    pub line_length: Option<NonZeroUsize>,
}

/// Split a sequence file into several smaller files under `opts.directory`.
pub fn split_file(input: &str, opts: &SplitOpts) -> Result<()> {
    let directory = opts.directory.trim_end_matches('/');
    if !Path::new(directory).is_dir() {
        fs::create_dir_all(directory)
            .with_context(|| format!("could not create directory {directory}"))?;
    }

    if opts.per_file {
        split_by_chunk_size(input, directory, opts)
    } else {
        split_by_file_count(input, directory, opts)
    }
}

fn out_path(
    directory: &str,
    prefix: &str,
    index: usize,
    width: usize,
    format: SequenceFormat,
) -> String {
    let ext = format.extension();
    format!("{directory}/{prefix}-{index:0width$}.{ext}")
}

fn open_reader(input: &str, opts: &SplitOpts) -> Result<SequenceReader> {
    SequenceReader::from_path(input, opts.format, opts.encoding)
        .with_context(|| format!("could not open {input}"))
}

/// Distribute the input across exactly `opts.number` files. The sequences
/// have to be counted up front, so the input is read twice and cannot be
/// standard input.
fn split_by_file_count(input: &str, directory: &str, opts: &SplitOpts) -> Result<()> {
    if input == "-" {
        bail!(formatdoc! {"
            cannot split standard input into a fixed number of files, since \
            counting the sequences requires reading the input twice
            suggestion: pass --sequence-number to give the number of sequences \
            per file instead, or give a file path with --input"});
    }

    // counting pass; the writing pass below re-opens the input
    let mut counter = open_reader(input, opts)?;
    for record in counter.by_ref() {
        record?;
    }
    let count = counter.sequence_count();

    let total_files = opts.number.min(count);
    if total_files < opts.number {
        warn!(
            "only {count} sequences for {} files; writing {total_files} files",
            opts.number
        );
    }

    let width = total_files.to_string().len();
    let per_file = count / total_files;
    let remainder = count % total_files;

    let mut reader = open_reader(input, opts)?;
    for index in 1..=total_files {
        // the first `remainder` files each take one extra sequence
        let quota = per_file + usize::from(index <= remainder);

        let path = out_path(directory, &opts.prefix, index, width, opts.format);
        let mut writer = SequenceWriter::to_path(&path, opts.format, opts.line_length)
            .with_context(|| format!("could not create {path}"))?;

        for _ in 0..quota {
            let record = reader
                .next()
                .context("input ended before the counted number of sequences")??;
            writer.write_sequence(&record)?;
        }
        writer.flush()?;
    }

    info!("split {count} sequences into {total_files} files under {directory}/");
    Ok(())
}

/// Stream the input into files of `opts.number` sequences each; only the
/// last file may hold fewer. A single pass, so standard input works here.
fn split_by_chunk_size(input: &str, directory: &str, opts: &SplitOpts) -> Result<()> {
    let mut reader = open_reader(input, opts)?;
    let mut file_count = 0;

    loop {
        let Some(first) = reader.next() else { break };
        let first = first?;

        file_count += 1;
        let path = out_path(directory, &opts.prefix, file_count, 1, opts.format);
        let mut writer = SequenceWriter::to_path(&path, opts.format, opts.line_length)
            .with_context(|| format!("could not create {path}"))?;

        writer.write_sequence(&first)?;
        while writer.sequences_written() < opts.number {
            match reader.next() {
                None => break,
                Some(record) => writer.write_sequence(&record?)?,
            }
        }
        writer.flush()?;
    }

    info!(
        "split {} sequences into {file_count} files under {directory}/",
        reader.sequence_count()
    );
    Ok(())
}
