use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::analysis::ConeAnalysis;
use crate::cone::{ExclusionReason, TriangleOutcome};
use crate::error::Result;

/// One completed cone, as written to the session report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConeRecord {
    pub iteration: usize,
    /// 1-indexed, as entered by the user
    pub frame: usize,
    pub tip_residue: i32,
    pub base_points: usize,
    pub included_points: usize,
    pub height: f64,
    pub avg_theta_a: f64,
    pub avg_theta_b: f64,
    pub avg_theta_c: f64,
}

impl ConeRecord {
    /// `None` when no triangle of the cone was usable.
    pub fn from_analysis(iteration: usize, analysis: &ConeAnalysis) -> Option<Self> {
        let averages = analysis.result.averages?;
        Some(Self {
            iteration,
            frame: analysis.selection.frame + 1,
            tip_residue: analysis.selection.tip_residue,
            base_points: analysis.base.len(),
            included_points: analysis.result.n_included(),
            height: analysis.result.height,
            avg_theta_a: averages.theta_a,
            avg_theta_b: averages.theta_b,
            avg_theta_c: averages.theta_c,
        })
    }
}

/// Mean of the per-cone average tip angles
pub fn overall_tip_angle(records: &[ConeRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().map(|r| r.avg_theta_b).sum::<f64>() / records.len() as f64)
}

/// Save completed cones to a CSV file
pub fn save_records_to_csv(records: &[ConeRecord], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(output_path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn describe(reason: ExclusionReason) -> &'static str {
    match reason {
        ExclusionReason::ZeroHypotenuse => "base point coincides with tip",
        ExclusionReason::NonPositiveHeight => "zero height",
        ExclusionReason::BaseExceedsHypotenuse => "base longer than hypotenuse",
        ExclusionReason::NonFiniteBase => "non-finite coordinates",
    }
}

/// Labelled text view of a cone: tip, base centroid, and the three angles of
/// every triangle.
pub fn write_cone_report<W: Write>(out: &mut W, analysis: &ConeAnalysis) -> io::Result<()> {
    let result = &analysis.result;

    writeln!(
        out,
        "Cone Tip (B)      ResID {:>5}  {}",
        analysis.tip.residue_id, result.apex
    )?;
    writeln!(out, "Base Centroid              {}", result.base_centroid())?;
    writeln!(out, "Height (h)                 {:.4} Å", result.height)?;
    writeln!(out)?;
    writeln!(
        out,
        "{:>6}  {:>28}  {:>10}  {:>10}  {:>9}  {:>9}  {:>9}",
        "ResID", "Base Point (A)", "c (Å)", "b (Å)", "θ_A", "θ_B", "θ_C"
    )?;

    for (sample, triangle) in analysis.base.iter().zip(result.triangles.iter()) {
        let point = triangle.point.to_string();
        match triangle.outcome {
            TriangleOutcome::Included(angles) => writeln!(
                out,
                "{:>6}  {:>28}  {:>10.4}  {:>10.4}  {:>8.2}°  {:>8.2}°  {:>8.2}°",
                sample.residue_id,
                point,
                triangle.hypotenuse,
                triangle.base,
                angles.theta_a,
                angles.theta_b,
                angles.theta_c
            )?,
            TriangleOutcome::Excluded(reason) => writeln!(
                out,
                "{:>6}  {:>28}  {:>10.4}  {:>10.4}  excluded: {}",
                sample.residue_id,
                point,
                triangle.hypotenuse,
                triangle.base,
                describe(reason)
            )?,
        }
    }

    if let Some(avg) = result.averages {
        writeln!(
            out,
            "{:>6}  {:>28}  {:>10}  {:>10}  {:>8.2}°  {:>8.2}°  {:>8.2}°",
            "mean", "", "", "", avg.theta_a, avg.theta_b, avg.theta_c
        )?;
    }
    Ok(())
}
