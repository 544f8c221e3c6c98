//! Structure file formats and their resolution from file extensions.

use std::{fmt, path::Path};

use clap::ValueEnum;

/// A structure file format understood by the reader and writer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Format {
    /// MDL molfile / SD file (V2000). A `.mol` file is an SD file with a
    /// single record.
    Sdf,
}

impl Format {
    /// Resolve a format from the extension of `path`, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "sdf" | "sd" | "mol" | "mdl" => Some(Format::Sdf),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Sdf => write!(f, "SDF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_extensions() {
        for name in ["lib.sdf", "lib.SD", "scaffold.mol", "x/y/z.Mdl"] {
            assert_eq!(Format::from_path(Path::new(name)), Some(Format::Sdf), "{name}");
        }
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        assert_eq!(Format::from_path(Path::new("lib.smi")), None);
        assert_eq!(Format::from_path(Path::new("library")), None);
    }
}
