// Molecule definition, graph primitives
pub mod molecule;

// Data IO
pub mod format;
pub mod loader;
pub mod writer;

// Scaffold/substituent tables
pub mod rgroup;

// The hard bit: enumerate every product
pub mod enumerate;

// Placement of substituents and product output
pub mod emit;
pub mod layout;
pub mod manifest;

pub mod error;

// Python library
#[cfg(feature = "python")]
pub mod python;
