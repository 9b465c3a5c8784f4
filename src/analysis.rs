use tracing::info;

use crate::cone::{compute_cone_angles, ConeAngleResult};
use crate::error::{ConeError, Result};
use crate::extract::extract;
use crate::structure::{Coordinate, ResidueSample};
use crate::trajectory::Trajectory;

/// Residues picked for one cone in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ConeSelection {
    /// 0-indexed frame
    pub frame: usize,
    pub base_residues: Vec<i32>,
    pub tip_residue: i32,
}

/// A cone resolved against a trajectory frame
#[derive(Debug, Clone)]
pub struct ConeAnalysis {
    pub selection: ConeSelection,
    pub tip: ResidueSample,
    /// Base residues that were found, in selection order
    pub base: Vec<ResidueSample>,
    /// Base residues absent from the topology
    pub missing_base: Vec<i32>,
    pub result: ConeAngleResult,
}

/// Extract the selected residues from a frame and compute their cone angles.
///
/// Missing base residues are skipped; a missing tip or an empty base set is
/// an error since no cone can be formed.
pub fn analyze_cone<T: Trajectory + ?Sized>(
    trajectory: &T,
    selection: &ConeSelection,
) -> Result<ConeAnalysis> {
    let tip = extract(trajectory, selection.frame, &[selection.tip_residue])?
        .samples
        .into_iter()
        .next()
        .ok_or(ConeError::MissingTip(selection.tip_residue))?;

    let base_extraction = extract(trajectory, selection.frame, &selection.base_residues)?;
    if base_extraction.samples.is_empty() {
        return Err(ConeError::EmptyPointSet);
    }

    let base_points: Vec<Coordinate> = base_extraction.samples.iter().map(|s| s.position).collect();
    let result = compute_cone_angles(tip.position, &base_points)?;

    info!(
        frame = selection.frame,
        tip = selection.tip_residue,
        base = base_points.len(),
        included = result.n_included(),
        "Cone computed"
    );

    Ok(ConeAnalysis {
        selection: selection.clone(),
        tip,
        base: base_extraction.samples,
        missing_base: base_extraction.missing,
        result,
    })
}
