use thiserror::Error;

use crate::format::Format;

/// Failure to read one structure record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Syntax {
        format: Format,
        line: usize,
        details: String,
    },
}

impl ParseError {
    pub fn syntax(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Syntax {
            format,
            line,
            details: details.into(),
        }
    }
}

/// Failure to build a scaffold/substituent library. Problems with individual
/// substituents are not errors; they are logged and the record is skipped.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read the scaffold molecule: {0}")]
    Scaffold(#[source] ParseError),

    #[error("could not read the scaffold molecule: input is empty")]
    MissingScaffold,

    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the best-effort 2-D placement of a product.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("atom #{0} referenced by a placement is missing from the product")]
    MissingAtom(usize),

    #[error("placement produced non-finite coordinates for atom #{0}")]
    NonFinite(usize),
}

/// Failure to hand a product to its destination.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write manifest: {0}")]
    Manifest(#[from] csv::Error),
}
