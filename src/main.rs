use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use thiserror::Error;
use tracing::{debug, error, info};

use rgroup_enum::{
    emit::{EmitConfig, SdfSink},
    error::{EmitError, LoadError},
    format::Format,
    loader::MolReader,
    manifest::Manifest,
    rgroup::Library,
};

// Command-line surface
mod cli;

// Subscriber setup
mod logging;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("Could not find the input file format for '{}'.", .0.display())]
    InputFormat(PathBuf),

    #[error("Could not find the output file format for '{}'.", .0.display())]
    OutputFormat(PathBuf),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to write products: {0}")]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Usage errors never get here; clap exits with 2 for those.
    fn exit_code(&self) -> u8 {
        match self {
            CliError::InputFormat(_) | CliError::OutputFormat(_) => 3,
            CliError::Load(LoadError::Scaffold(_) | LoadError::MissingScaffold) => 4,
            CliError::Load(LoadError::Io(_)) | CliError::Emit(_) | CliError::Other(_) => 1,
        }
    }
}

fn resolve(path: &Path, forced: Option<Format>) -> Option<Format> {
    forced.or_else(|| Format::from_path(path))
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let in_format = resolve(&cli.input, cli.input_format)
        .ok_or_else(|| CliError::InputFormat(cli.input.clone()))?;
    let output = match &cli.output {
        Some(path) => Some((
            path.as_path(),
            resolve(path, cli.output_format).ok_or_else(|| CliError::OutputFormat(path.clone()))?,
        )),
        None => None,
    };
    debug!(%in_format, "Resolved input format");

    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open input file '{}'", cli.input.display()))?;
    let library = match in_format {
        Format::Sdf => Library::load(&mut MolReader::new(BufReader::new(input)))?,
    };
    info!(
        sites = library.sites.len(),
        labels = library.rgroups.len(),
        substituents = library.report.accepted,
        skipped = library.report.unlabelled + library.report.rejected + library.report.unreadable,
        "Library loaded"
    );

    let enumerator = library.enumerator();
    let Some((out_path, out_format)) = output.filter(|_| !cli.dry_run) else {
        println!("{}", enumerator.count());
        return Ok(());
    };
    debug!(%out_format, "Resolved output format");

    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create output file '{}'", out_path.display()))?;
    let config = EmitConfig {
        layout: !cli.no_layout,
    };

    let report = match (out_format, &cli.manifest) {
        (Format::Sdf, Some(manifest_path)) => {
            let file = File::create(manifest_path).with_context(|| {
                format!("failed to create manifest '{}'", manifest_path.display())
            })?;
            let labels = library.rgroups.labels().map(str::to_string).collect();
            let manifest = Manifest::new(file, labels)?;
            let mut sink = SdfSink::new(BufWriter::new(out_file), config).with_manifest(manifest);
            let report = enumerator.run(&library.scaffold, &mut sink)?;
            sink.finish()?;
            report
        }
        (Format::Sdf, None) => {
            let mut sink: SdfSink<_> = SdfSink::new(BufWriter::new(out_file), config);
            let report = enumerator.run(&library.scaffold, &mut sink)?;
            sink.finish()?;
            report
        }
    };

    info!(
        "Wrote {} products to {}{}",
        report.products,
        out_path.display(),
        if report.abandoned > 0 {
            format!(" ({} branches abandoned)", report.abandoned)
        } else {
            String::new()
        }
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
