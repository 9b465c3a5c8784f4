use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::error::{ConeError, Result};
use crate::structure::Coordinate;

/// Fewest points that define a plane
pub const MIN_PLANE_POINTS: usize = 3;

/// Best-fit plane through a point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEstimate {
    pub centroid: Coordinate,
    /// Unit normal, or the zero vector when the fit is under-determined
    pub normal: Vector3<f64>,
}

impl PlaneEstimate {
    /// True when no normal exists: fewer than three points, or non-finite input.
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vector3::zeros()
    }
}

/// Fit a plane by principal-component analysis.
///
/// The normal is the right-singular vector of the sample covariance matrix
/// with the smallest singular value, i.e. the direction of least variance.
/// With one or two points the centroid is still returned but the normal is
/// zero (see [`PlaneEstimate::is_degenerate`]).
pub fn fit_plane(points: &[Coordinate]) -> Result<PlaneEstimate> {
    let centroid = Coordinate::centroid(points).ok_or(ConeError::EmptyPointSet)?;

    if points.len() < MIN_PLANE_POINTS {
        debug!(
            "Plane fit over {} point(s) is under-determined; normal left at zero",
            points.len()
        );
        return Ok(PlaneEstimate {
            centroid,
            normal: Vector3::zeros(),
        });
    }

    let covariance = covariance(points, centroid);
    if !covariance.iter().all(|v| v.is_finite()) {
        debug!("Non-finite coordinates in plane fit; normal left at zero");
        return Ok(PlaneEstimate {
            centroid,
            normal: Vector3::zeros(),
        });
    }
    let svd = covariance.svd(false, true);
    let normal = match svd.v_t {
        Some(v_t) => {
            let smallest = svd.singular_values.imin();
            v_t.row(smallest).transpose().normalize()
        }
        None => Vector3::zeros(),
    };

    Ok(PlaneEstimate { centroid, normal })
}

/// Sample covariance (divisor n - 1) of the centred points
fn covariance(points: &[Coordinate], centroid: Coordinate) -> Matrix3<f64> {
    let scatter = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d: Vector3<f64> = (*p - centroid).into();
        acc + d * d.transpose()
    });
    scatter / (points.len() - 1) as f64
}
