extern crate env_logger;
#[macro_use]
extern crate log;

use std::num::NonZeroUsize;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod filter;
mod reader;
mod record;
mod split;
mod writer;

use cli::{Cli, Commands};

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Split {
            number,
            input,
            format,
            encoding,
            sequence_number,
            prefix,
            directory,
            line_length,
        } => {
            let opts = split::SplitOpts {
                number: *number as usize,
                per_file: *sequence_number,
                format: *format,
                encoding: *encoding,
                prefix: prefix.clone(),
                directory: directory.clone(),
                line_length: NonZeroUsize::new(*line_length as usize),
            };

            split::split_file(input, &opts)?;
        }
        Commands::Filter {
            fasta_path,
            minimum_basepairs,
            max_n,
            output,
            line_length,
        } => {
            let opts = filter::FilterOpts {
                minimum_basepairs: *minimum_basepairs as usize,
                max_unknown: max_n.map(|n| n as usize),
            };

            filter::filter_sequences(
                fasta_path,
                output,
                &opts,
                NonZeroUsize::new(*line_length as usize),
            )?;
        }
    };
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
