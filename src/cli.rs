use std::path::PathBuf;

use clap::Parser;

use rgroup_enum::format::Format;

/// Attach every combination of R-group substituents to a scaffold.
///
/// The first record of INPUT is the scaffold; its labelled placeholder atoms
/// (R1, R2, ...) mark attachment sites. Every later record carrying exactly
/// one labelled placeholder is a substituent for that label. One record per
/// product is written to OUTPUT.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Scaffold followed by substituents
    pub input: PathBuf,

    /// Destination of the enumerated products
    #[arg(required_unless_present = "dry_run")]
    pub output: Option<PathBuf>,

    /// Format of INPUT, instead of guessing it from the extension
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub input_format: Option<Format>,

    /// Format of OUTPUT, instead of guessing it from the extension
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub output_format: Option<Format>,

    /// Keep input coordinates instead of placing substituents in 2-D
    #[arg(long)]
    pub no_layout: bool,

    /// Also write a CSV naming the substituents of every product
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Only print how many products would be enumerated
    #[arg(long)]
    pub dry_run: bool,

    /// Increase verbosity level (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_paths_and_flags() {
        let cli = Cli::try_parse_from(["rgroup-enum", "in.sdf", "out.sdf", "--no-layout", "-vv"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("in.sdf"));
        assert_eq!(cli.output, Some(PathBuf::from("out.sdf")));
        assert!(cli.no_layout);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn output_is_required_unless_dry_run() {
        assert!(Cli::try_parse_from(["rgroup-enum", "in.sdf"]).is_err());
        let cli = Cli::try_parse_from(["rgroup-enum", "in.sdf", "--dry-run"]).unwrap();
        assert!(cli.output.is_none());
    }

    #[test]
    fn format_override() {
        let cli = Cli::try_parse_from(["rgroup-enum", "in.txt", "out.txt", "--input-format", "sdf"]).unwrap();
        assert_eq!(cli.input_format, Some(Format::Sdf));
        assert_eq!(cli.output_format, None);
    }
}
