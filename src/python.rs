use pyo3::{exceptions::PyValueError, prelude::*};

use crate::{
    emit::{EmitConfig, SdfSink},
    enumerate::{Product, ProductSink},
    error::EmitError,
    loader::MolReader,
    rgroup::Library,
};

fn to_sdf(product: Product, config: EmitConfig) -> Result<String, EmitError> {
    let mut sink: SdfSink<Vec<u8>> = SdfSink::new(Vec::new(), config);
    sink.emit(product)?;
    let bytes = sink.finish()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Enumerate the products of an SD text holding a scaffold followed by its
/// substituents. Returns one SD record per product, in enumeration order.
#[pyfunction]
#[pyo3(signature = (sdf, layout = true))]
fn enumerate_sdf(sdf: String, layout: bool) -> PyResult<Vec<String>> {
    let library = Library::load(&mut MolReader::new(sdf.as_bytes()))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let mut products: Vec<Product> = Vec::new();
    library
        .enumerator()
        .run(&library.scaffold, &mut products)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    products
        .into_iter()
        .map(|p| to_sdf(p, EmitConfig { layout }).map_err(|e| PyValueError::new_err(e.to_string())))
        .collect()
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
#[pyo3(name = "rgroup_enum")]
fn _rgroup_enum(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(enumerate_sdf, m)?)?;

    Ok(())
}
