use pyo3::{exceptions::PyValueError, prelude::*};

use crate::{
    capacity::Capacities,
    enumerate::{AugmentMode, ElementMode, Generator},
    handler::{CollectingHandler, CountingHandler},
    loader::parse_formula,
};

fn generator(formula: &str) -> PyResult<Generator> {
    let formula = parse_formula(formula).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Generator::for_formula(
        &formula,
        AugmentMode::Atom,
        ElementMode::Multiset,
        Capacities::default(),
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Number of structures with the given formula.
#[pyfunction]
fn count_isomers(formula: String) -> PyResult<usize> {
    let handler = CountingHandler::new();
    generator(&formula)?
        .run(&handler)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(handler.count())
}

/// Every structure with the given formula, as molecule strings.
#[pyfunction]
fn enumerate_isomers(formula: String) -> PyResult<Vec<String>> {
    let handler = CollectingHandler::new();
    generator(&formula)?
        .run(&handler)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(handler
        .into_molecules()
        .iter()
        .map(|m| m.to_string())
        .collect())
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn canaug(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(count_isomers, m)?)?;
    m.add_function(wrap_pyfunction!(enumerate_isomers, m)?)?;

    Ok(())
}
