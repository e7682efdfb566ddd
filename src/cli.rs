//! Command line interface for the `s7commp` binary.
//!
//! The binary reads captured segments as text, runs them through one
//! analysis session and prints every decoded telegram as JSON.

use std::{num::NonZeroUsize, path::PathBuf};

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `s7commp` binary.
#[derive(Debug, Parser)]
#[command(
    name = "s7commp",
    version,
    about = "Decode and reassemble S7comm-plus telegrams"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode segments listed one per line as `CONNECTION SEGMENT HEX`.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    Decode(DecodeArgs),
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// File to read segments from; standard input when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Deepest struct or object nesting decoded.
    #[arg(long, default_value = "64")]
    pub max_depth: NonZeroUsize,

    /// Largest reassembled telegram, in bytes.
    #[arg(long, default_value = "1048576")]
    pub max_telegram_size: NonZeroUsize,

    /// Reassembled telegrams kept for segments listed again.
    #[arg(long, default_value = "4096")]
    pub max_retained_telegrams: NonZeroUsize,

    /// Print the label tree next to each telegram.
    #[arg(short, long)]
    pub labels: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_decode_options() {
        let cli = Cli::parse_from([
            "s7commp",
            "decode",
            "--input",
            "capture.txt",
            "--max-depth",
            "8",
            "--labels",
        ]);
        let Command::Decode(args) = cli.command;
        assert_eq!(
            args.input.as_deref(),
            Some(std::path::Path::new("capture.txt"))
        );
        assert_eq!(args.max_depth.get(), 8);
        assert_eq!(args.max_telegram_size.get(), 1 << 20);
        assert_eq!(args.max_retained_telegrams.get(), 4096);
        assert!(args.labels);
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(Cli::try_parse_from(["s7commp", "decode", "--max-depth", "0"]).is_err());
    }
}
