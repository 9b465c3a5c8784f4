use tracing::debug;

use crate::error::Result;
use crate::plane::{fit_plane, PlaneEstimate};
use crate::structure::Coordinate;

/// Height never exceeds this fraction of the shortest hypotenuse
pub const HEIGHT_CLAMP_FACTOR: f64 = 0.9;

/// Angles (degrees) of the triangle apex / base point / base centroid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleAngles {
    /// At the base point
    pub theta_a: f64,
    /// At the apex (cone tip angle)
    pub theta_b: f64,
    /// At the base centroid, `180 - (theta_a + theta_b)`
    pub theta_c: f64,
}

impl TriangleAngles {
    pub fn from_sides(height: f64, base: f64, hypotenuse: f64) -> Self {
        let theta_a = (height / hypotenuse).asin().to_degrees();
        let theta_b = (base / hypotenuse).asin().to_degrees();
        Self {
            theta_a,
            theta_b,
            theta_c: 180.0 - (theta_a + theta_b),
        }
    }

    /// Per-angle arithmetic mean, `None` for an empty slice.
    pub fn mean(angles: &[TriangleAngles]) -> Option<TriangleAngles> {
        if angles.is_empty() {
            return None;
        }
        let n = angles.len() as f64;
        Some(TriangleAngles {
            theta_a: angles.iter().map(|a| a.theta_a).sum::<f64>() / n,
            theta_b: angles.iter().map(|a| a.theta_b).sum::<f64>() / n,
            theta_c: angles.iter().map(|a| a.theta_c).sum::<f64>() / n,
        })
    }

    pub fn sum(&self) -> f64 {
        self.theta_a + self.theta_b + self.theta_c
    }
}

/// Why a base point was left out of the averages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Base point coincides with the apex
    ZeroHypotenuse,
    /// Apex sits on the base centroid or on a base point
    NonPositiveHeight,
    /// Base side longer than the hypotenuse; arcsine undefined
    BaseExceedsHypotenuse,
    /// Base side is NaN or infinite, e.g. from a non-finite coordinate
    NonFiniteBase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleOutcome {
    Included(TriangleAngles),
    Excluded(ExclusionReason),
}

impl TriangleOutcome {
    pub fn angles(&self) -> Option<&TriangleAngles> {
        match self {
            TriangleOutcome::Included(angles) => Some(angles),
            TriangleOutcome::Excluded(_) => None,
        }
    }
}

/// Triangle formed by the apex, one base point and the base centroid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTriangle {
    pub point: Coordinate,
    /// Apex to base point
    pub hypotenuse: f64,
    /// Base point to base centroid
    pub base: f64,
    pub outcome: TriangleOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConeAngleResult {
    pub apex: Coordinate,
    pub plane: PlaneEstimate,
    /// Clamped apex to base-centroid distance shared by every triangle
    pub height: f64,
    /// One entry per base point, in input order
    pub triangles: Vec<BaseTriangle>,
    /// Averages over included triangles; `None` when every point was excluded
    pub averages: Option<TriangleAngles>,
}

impl ConeAngleResult {
    pub fn base_centroid(&self) -> Coordinate {
        self.plane.centroid
    }

    /// Mean cone tip angle, the primary output
    pub fn average_theta_b(&self) -> Option<f64> {
        self.averages.map(|a| a.theta_b)
    }

    pub fn included(&self) -> impl Iterator<Item = (&BaseTriangle, &TriangleAngles)> {
        self.triangles
            .iter()
            .filter_map(|t| t.outcome.angles().map(|angles| (t, angles)))
    }

    pub fn n_included(&self) -> usize {
        self.included().count()
    }
}

/// Shared height: apex-to-centroid distance capped at
/// `HEIGHT_CLAMP_FACTOR` times the shortest hypotenuse.
pub fn clamp_height(apex_to_centroid: f64, hypotenuses: &[f64]) -> f64 {
    let shortest = hypotenuses.iter().copied().fold(f64::INFINITY, f64::min);
    apex_to_centroid.min(shortest * HEIGHT_CLAMP_FACTOR)
}

/// Decide whether one base point yields a usable triangle.
pub fn classify_triangle(hypotenuse: f64, base: f64, height: f64) -> TriangleOutcome {
    if hypotenuse.is_nan() || hypotenuse <= 0.0 {
        TriangleOutcome::Excluded(ExclusionReason::ZeroHypotenuse)
    } else if height.is_nan() || height <= 0.0 {
        TriangleOutcome::Excluded(ExclusionReason::NonPositiveHeight)
    } else if !base.is_finite() {
        TriangleOutcome::Excluded(ExclusionReason::NonFiniteBase)
    } else if base > hypotenuse {
        TriangleOutcome::Excluded(ExclusionReason::BaseExceedsHypotenuse)
    } else {
        TriangleOutcome::Included(TriangleAngles::from_sides(height, base, hypotenuse))
    }
}

/// Compute the cone angles between an apex and its base points.
///
/// Each base point forms a triangle with the apex and the base centroid.
/// Degenerate triangles are excluded from the averages, never raised as errors.
///
/// # Arguments
/// * `apex` - cone tip, in Ångström
/// * `base_points` - rim points, at least one
pub fn compute_cone_angles(apex: Coordinate, base_points: &[Coordinate]) -> Result<ConeAngleResult> {
    let plane = fit_plane(base_points)?;
    let base_centroid = plane.centroid;

    let hypotenuses: Vec<f64> = base_points.iter().map(|p| apex.distance_to(p)).collect();
    let height = clamp_height(apex.distance_to(&base_centroid), &hypotenuses);

    let triangles: Vec<BaseTriangle> = base_points
        .iter()
        .zip(hypotenuses.iter())
        .map(|(point, &hypotenuse)| {
            let base = point.distance_to(&base_centroid);
            let outcome = classify_triangle(hypotenuse, base, height);
            if let TriangleOutcome::Excluded(reason) = outcome {
                debug!("Base point {} excluded: {:?}", point, reason);
            }
            BaseTriangle {
                point: *point,
                hypotenuse,
                base,
                outcome,
            }
        })
        .collect();

    let included: Vec<TriangleAngles> = triangles
        .iter()
        .filter_map(|t| t.outcome.angles().copied())
        .collect();
    let averages = TriangleAngles::mean(&included);

    Ok(ConeAngleResult {
        apex,
        plane,
        height,
        triangles,
        averages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConeError;

    fn c(x: f64, y: f64, z: f64) -> Coordinate {
        Coordinate::new(x, y, z)
    }

    fn configurations() -> Vec<(Coordinate, Vec<Coordinate>)> {
        vec![
            (c(0.0, 0.0, 10.0), vec![c(0.0, 0.0, 0.0), c(1.0, 0.0, 0.0), c(0.0, 1.0, 0.0)]),
            (c(2.0, -1.0, 4.0), vec![c(3.0, 0.5, 0.2), c(-1.0, 2.0, -0.4), c(0.5, -3.0, 0.1), c(1.5, 1.5, 1.5)]),
            (c(30.0, 0.0, 1.0), vec![c(0.0, 0.0, 0.0), c(5.0, 0.0, 0.0), c(0.0, 5.0, 0.0)]),
            (c(0.0, 0.0, 0.5), vec![c(6.0, 0.0, 0.0), c(-6.0, 0.0, 0.0), c(0.0, 6.0, 0.0), c(0.0, -6.0, 0.0)]),
            (c(1.0, 1.0, 1.0), vec![c(1.0, 1.0, -2.0)]),
        ]
    }

    #[test]
    fn test_reference_cone() {
        let apex = c(0.0, 0.0, 10.0);
        let base = vec![c(0.0, 0.0, 0.0), c(1.0, 0.0, 0.0), c(0.0, 1.0, 0.0)];
        let result = compute_cone_angles(apex, &base).unwrap();

        let centroid = result.base_centroid();
        assert!((centroid.x - 1.0 / 3.0).abs() < 1e-9);
        assert!((centroid.y - 1.0 / 3.0).abs() < 1e-9);
        assert!(centroid.z.abs() < 1e-12);

        assert!((result.triangles[0].hypotenuse - 10.0).abs() < 1e-9);
        assert!((result.triangles[1].hypotenuse - 101f64.sqrt()).abs() < 1e-9);
        // Apex-to-centroid (~10.011) is above 0.9 * 10, so the clamp applies
        assert!((result.height - 9.0).abs() < 1e-9);

        assert_eq!(result.n_included(), 3);
        let theta_b = result.average_theta_b().unwrap();
        assert!(theta_b > 0.0 && theta_b < 90.0);
        assert!(result.plane.normal.z.abs() > 1.0 - 1e-9);
    }

    #[test]
    fn test_angles_sum_to_180() {
        for (apex, base) in configurations() {
            let result = compute_cone_angles(apex, &base).unwrap();
            for (_, angles) in result.included() {
                assert!((angles.sum() - 180.0).abs() < 1e-6, "{:?}", angles);
            }
            if let Some(avg) = result.averages {
                assert!((avg.sum() - 180.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_height_never_exceeds_clamp() {
        for (apex, base) in configurations() {
            let result = compute_cone_angles(apex, &base).unwrap();
            let shortest = result
                .triangles
                .iter()
                .map(|t| t.hypotenuse)
                .fold(f64::INFINITY, f64::min);
            assert!(result.height <= HEIGHT_CLAMP_FACTOR * shortest + 1e-12);
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        for (apex, base) in configurations() {
            let first = compute_cone_angles(apex, &base).unwrap();
            let second = compute_cone_angles(apex, &base).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_single_base_point() {
        let apex = c(0.0, 0.0, 5.0);
        let result = compute_cone_angles(apex, &[c(3.0, 0.0, 0.0)]).unwrap();

        assert!(result.plane.is_degenerate());
        assert_eq!(result.base_centroid(), c(3.0, 0.0, 0.0));
        assert!((result.height - 0.9 * 34f64.sqrt()).abs() < 1e-9);

        // The base side collapses to zero, so the tip angle is zero
        let avg = result.averages.unwrap();
        assert_eq!(avg.theta_b, 0.0);
        assert!((avg.sum() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_apex_on_centroid_excludes_every_point() {
        let base = vec![c(1.0, 0.0, 0.0), c(-1.0, 0.0, 0.0), c(0.0, 1.0, 0.0), c(0.0, -1.0, 0.0)];
        let result = compute_cone_angles(c(0.0, 0.0, 0.0), &base).unwrap();
        assert_eq!(result.height, 0.0);
        assert_eq!(result.n_included(), 0);
        assert!(result.averages.is_none());
        assert!(result.average_theta_b().is_none());
        for t in &result.triangles {
            assert_eq!(
                t.outcome,
                TriangleOutcome::Excluded(ExclusionReason::NonPositiveHeight)
            );
        }
    }

    #[test]
    fn test_apex_on_base_point() {
        let base = vec![c(0.0, 0.0, 0.0), c(4.0, 0.0, 0.0), c(0.0, 4.0, 0.0)];
        let result = compute_cone_angles(c(0.0, 0.0, 0.0), &base).unwrap();
        assert_eq!(
            result.triangles[0].outcome,
            TriangleOutcome::Excluded(ExclusionReason::ZeroHypotenuse)
        );
        assert!(result.averages.is_none());
    }

    #[test]
    fn test_base_longer_than_hypotenuse_is_excluded() {
        let base = vec![c(10.0, 0.0, 0.0), c(-10.0, 0.0, 0.0), c(0.0, 10.0, 0.0)];
        let result = compute_cone_angles(c(10.0, 0.0, 1.0), &base).unwrap();
        assert_eq!(
            result.triangles[0].outcome,
            TriangleOutcome::Excluded(ExclusionReason::BaseExceedsHypotenuse)
        );
        assert_eq!(result.n_included(), 2);
        assert!(result.average_theta_b().unwrap().is_finite());
    }

    #[test]
    fn test_empty_base_is_rejected() {
        assert!(matches!(
            compute_cone_angles(c(0.0, 0.0, 1.0), &[]),
            Err(ConeError::EmptyPointSet)
        ));
    }

    #[test]
    fn test_classify_triangle_policy() {
        assert_eq!(
            classify_triangle(0.0, 1.0, 1.0),
            TriangleOutcome::Excluded(ExclusionReason::ZeroHypotenuse)
        );
        assert_eq!(
            classify_triangle(2.0, 1.0, 0.0),
            TriangleOutcome::Excluded(ExclusionReason::NonPositiveHeight)
        );
        match classify_triangle(2.0, 1.0, 1.0) {
            TriangleOutcome::Included(angles) => {
                assert!((angles.theta_a - 30.0).abs() < 1e-9);
                assert!((angles.theta_b - 30.0).abs() < 1e-9);
                assert!((angles.theta_c - 120.0).abs() < 1e-9);
            }
            other => panic!("expected included triangle, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_base_is_excluded() {
        assert_eq!(
            classify_triangle(2.0, f64::NAN, 1.0),
            TriangleOutcome::Excluded(ExclusionReason::NonFiniteBase)
        );
        assert_eq!(
            classify_triangle(2.0, f64::INFINITY, 1.0),
            TriangleOutcome::Excluded(ExclusionReason::NonFiniteBase)
        );
    }

    #[test]
    fn test_nan_coordinate_does_not_poison_averages() {
        let base = vec![c(1.0, 0.0, 0.0), c(0.0, 1.0, 0.0), c(f64::NAN, 0.0, 0.0)];
        let result = compute_cone_angles(c(0.0, 0.0, 5.0), &base).unwrap();
        for t in &result.triangles {
            assert!(matches!(t.outcome, TriangleOutcome::Excluded(_)), "{:?}", t);
        }
        assert!(result.averages.is_none());
    }

    #[test]
    fn test_clamp_height() {
        assert_eq!(clamp_height(5.0, &[10.0, 20.0]), 5.0);
        assert!((clamp_height(12.0, &[10.0, 20.0]) - 9.0).abs() < 1e-12);
    }
}
