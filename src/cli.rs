use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Parser, Subcommand};

use crate::reader::SequenceFormat;
use crate::record::QualityEncoding;

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🌱 rnaseeker version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   tools for splitting and filtering FASTA/FASTQ sequence files";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    flatten_help = true,
    styles = STYLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a FASTA/FASTQ file into multiple smaller files
    #[command(arg_required_else_help = true)]
    Split {
        /// the number of files to split the input into, or the number of
        /// sequences to place in each file when --sequence-number is given
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,

        /// the input file; reads from standard input if `-'
        #[arg(short, long, default_value = "-")]
        input: String,

        /// format of the input file
        #[arg(short, long, value_enum, default_value = "fasta")]
        format: SequenceFormat,

        /// quality score encoding of FASTQ input
        #[arg(long, value_enum, default_value = "phred33")]
        encoding: QualityEncoding,

        /// treat NUMBER as the number of sequences to place in each split
        /// file rather than the number of files
        #[arg(short, long)]
        sequence_number: bool,

        /// prefix for naming the split files
        #[arg(short, long, default_value = "split")]
        prefix: String,

        /// directory to place the split files in; created if missing
        #[arg(short, long, default_value = ".")]
        directory: String,

        /// maximum line length for sequence lines in the output files;
        /// 0 places each sequence on a single line
        #[arg(short, long, default_value_t = 60)]
        line_length: u64,
    },

    /// Filter FASTA sequences by length and `N' content
    #[command(arg_required_else_help = true)]
    Filter {
        /// path to the FASTA file; reads from standard input if `-'
        fasta_path: String,

        /// minimum size of sequence in base pairs to keep
        minimum_basepairs: u64,

        /// drop sequences containing more than this many `N' residues
        #[arg(long)]
        max_n: Option<u64>,

        /// path to the output FASTA file; writes to standard output if `-'
        #[arg(short, long, default_value = "-")]
        output: String,

        /// maximum line length for sequence lines in the output file;
        /// 0 places each sequence on a single line
        #[arg(short, long, default_value_t = 60)]
        line_length: u64,
    },
}
