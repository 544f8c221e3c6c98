//! CSV manifest naming the candidate chosen for each label of each product.
//!
//! ```text
//! product,R1,R2
//! 1,methyl,chloro
//! 2,methyl,bromo
//! ```

use std::io::Write;

use crate::{enumerate::Product, error::EmitError};

pub struct Manifest<W: Write> {
    writer: csv::Writer<W>,
    labels: Vec<String>,
}

impl<W: Write> Manifest<W> {
    /// Start a manifest with one column per label, writing the header row.
    pub fn new(writer: W, labels: Vec<String>) -> Result<Self, EmitError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(std::iter::once("product").chain(labels.iter().map(String::as_str)))?;
        Ok(Self { writer, labels })
    }

    /// Append the row of `product`. Products are numbered from 1.
    pub fn record(&mut self, product: &Product) -> Result<(), EmitError> {
        let mut row = Vec::with_capacity(self.labels.len() + 1);
        row.push((product.index + 1).to_string());
        for label in &self.labels {
            let name = product
                .choices
                .iter()
                .find(|c| &c.label == label)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            row.push(name);
        }
        self.writer.write_record(&row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), EmitError> {
        self.writer.flush()?;
        Ok(())
    }
}
