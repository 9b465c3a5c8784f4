use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyTuple};
use std::path::Path;

use crate::cone::{compute_cone_angles, ExclusionReason, TriangleOutcome};
use crate::extract::extract;
use crate::structure::Coordinate;
use crate::trajectory::MdTrajectory;

fn to_coordinate(p: (f64, f64, f64)) -> Coordinate {
    Coordinate::new(p.0, p.1, p.2)
}

fn to_tuple(py: Python<'_>, c: Coordinate) -> Bound<'_, PyTuple> {
    PyTuple::new_bound(py, &[c.x, c.y, c.z])
}

/// Python binding for residue coordinate extraction
#[pyfunction]
#[pyo3(signature = (trajectory_file, frame, res_ids, topology_file=None))]
fn extract_coordinates(
    py: Python<'_>,
    trajectory_file: &str,
    frame: usize,
    res_ids: Vec<i32>,
    topology_file: Option<&str>,
) -> PyResult<PyObject> {
    let trajectory = MdTrajectory::load(Path::new(trajectory_file), topology_file.map(Path::new))
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to load trajectory: {}", e)))?;

    let extraction = extract(&trajectory, frame, &res_ids)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;

    // List of (ResID, atom_index, (x, y, z)) in Ångström
    let py_samples = PyList::empty_bound(py);
    for sample in extraction.samples {
        let py_sample = PyTuple::new_bound(
            py,
            &[
                sample.residue_id.into_py(py),
                sample.atom_index.into_py(py),
                to_tuple(py, sample.position).into_py(py),
            ],
        );
        py_samples.append(py_sample)?;
    }

    Ok(py_samples.into())
}

/// Python binding for the cone angle calculation
#[pyfunction]
fn cone_angles(
    py: Python<'_>,
    tip: (f64, f64, f64),
    base_points: Vec<(f64, f64, f64)>,
) -> PyResult<PyObject> {
    let base: Vec<Coordinate> = base_points.into_iter().map(to_coordinate).collect();
    let result = compute_cone_angles(to_coordinate(tip), &base)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;

    let py_triangles = PyList::empty_bound(py);
    for triangle in &result.triangles {
        let py_triangle = PyDict::new_bound(py);
        py_triangle.set_item("point", to_tuple(py, triangle.point))?;
        py_triangle.set_item("hypotenuse", triangle.hypotenuse)?;
        py_triangle.set_item("base", triangle.base)?;
        match triangle.outcome {
            TriangleOutcome::Included(angles) => {
                py_triangle.set_item("angles", (angles.theta_a, angles.theta_b, angles.theta_c))?;
            }
            TriangleOutcome::Excluded(reason) => {
                let reason = match reason {
                    ExclusionReason::ZeroHypotenuse => "zero_hypotenuse",
                    ExclusionReason::NonPositiveHeight => "non_positive_height",
                    ExclusionReason::BaseExceedsHypotenuse => "base_exceeds_hypotenuse",
                    ExclusionReason::NonFiniteBase => "non_finite_base",
                };
                py_triangle.set_item("excluded", reason)?;
            }
        }
        py_triangles.append(py_triangle)?;
    }

    let py_result = PyDict::new_bound(py);
    py_result.set_item("triangles", py_triangles)?;
    py_result.set_item(
        "averages",
        result.averages.map(|a| (a.theta_a, a.theta_b, a.theta_c)),
    )?;
    py_result.set_item("base_centroid", to_tuple(py, result.base_centroid()))?;
    py_result.set_item("height", result.height)?;

    Ok(py_result.into())
}

/// Python module definition
#[pymodule]
fn cone_analysis_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extract_coordinates, m)?)?;
    m.add_function(wrap_pyfunction!(cone_angles, m)?)?;
    m.add("__doc__", "Cone angle analysis Rust library with Python bindings")?;
    Ok(())
}
