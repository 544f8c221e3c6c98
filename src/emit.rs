//! Emission of finished products to an SD stream.

use std::io::Write;

use tracing::{info, warn};

use crate::{
    enumerate::{Product, ProductSink},
    error::EmitError,
    layout,
    manifest::Manifest,
    writer::MolWriter,
};

/// Options controlling how products are written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EmitConfig {
    /// Run 2-D placement of substituents before writing.
    pub layout: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self { layout: true }
    }
}

/// A [`ProductSink`] writing each product as one SD record, optionally also
/// recording it in a CSV manifest.
pub struct SdfSink<W: Write, M: Write = std::fs::File> {
    writer: MolWriter<W>,
    manifest: Option<Manifest<M>>,
    config: EmitConfig,
}

impl<W: Write, M: Write> SdfSink<W, M> {
    pub fn new(writer: W, config: EmitConfig) -> Self {
        Self {
            writer: MolWriter::new(writer),
            manifest: None,
            config,
        }
    }

    pub fn with_manifest(mut self, manifest: Manifest<M>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Flush all outputs and return the product stream.
    pub fn finish(mut self) -> Result<W, EmitError> {
        self.writer.flush()?;
        if let Some(manifest) = &mut self.manifest {
            manifest.flush()?;
        }
        Ok(self.writer.into_inner())
    }
}

impl<W: Write, M: Write> ProductSink for SdfSink<W, M> {
    fn emit(&mut self, mut product: Product) -> Result<(), EmitError> {
        if self.config.layout {
            if let Err(e) = layout::place(&mut product.molecule, &product.placements) {
                warn!(
                    "Layout failed for product {}: {e}; writing input coordinates",
                    product.index + 1
                );
            }
        }

        self.writer.write(&product.molecule)?;
        if let Some(manifest) = &mut self.manifest {
            manifest.record(&product)?;
        }
        info!("product...");
        Ok(())
    }
}
