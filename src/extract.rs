use tracing::warn;

use crate::error::{ConeError, Result};
use crate::structure::ResidueSample;
use crate::trajectory::Trajectory;

/// Trajectory positions are nanometres; all geometry runs in Ångström.
pub const NM_TO_ANGSTROM: f64 = 10.0;

/// Outcome of a residue lookup for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Resolved residues, in request order
    pub samples: Vec<ResidueSample>,
    /// Requested residue ids with no atoms in the topology
    pub missing: Vec<i32>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Pick one representative point per residue for a frame.
///
/// Each residue is represented by its last atom in topology order. Unknown
/// residue ids are reported and skipped; they never abort the batch.
///
/// # Arguments
/// * `frame` - 0-indexed frame number, must be below `trajectory.n_frames()`
/// * `residue_ids` - residue sequence numbers to look up
pub fn extract<T: Trajectory + ?Sized>(
    trajectory: &T,
    frame: usize,
    residue_ids: &[i32],
) -> Result<Extraction> {
    let n_frames = trajectory.n_frames();
    if frame >= n_frames {
        return Err(ConeError::FrameOutOfRange { frame, n_frames });
    }

    let residue_atoms = trajectory.topology().residue_atoms();
    let mut extraction = Extraction::default();

    for &residue_id in residue_ids {
        let last_atom = residue_atoms
            .get(&residue_id)
            .and_then(|atoms| atoms.last().copied());

        let sample = last_atom.and_then(|atom_index| {
            trajectory
                .position(frame, atom_index)
                .map(|position| ResidueSample {
                    residue_id,
                    atom_index,
                    position: position * NM_TO_ANGSTROM,
                })
        });

        match sample {
            Some(sample) => extraction.samples.push(sample),
            None => {
                warn!("ResID {} not found in trajectory!", residue_id);
                extraction.missing.push(residue_id);
            }
        }
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Coordinate, Topology};
    use crate::trajectory::MdTrajectory;

    fn trajectory() -> MdTrajectory {
        // residue 3 has atoms 0, 1, 4; residue 8 has atoms 2, 3
        let topology = Topology::from_residue_seqs(&[3, 3, 8, 8, 3]);
        let frame0 = vec![
            Coordinate::new(0.1, 0.2, 0.3),
            Coordinate::new(0.4, 0.5, 0.6),
            Coordinate::new(0.7, 0.8, 0.9),
            Coordinate::new(1.25, -0.5, 0.125),
            Coordinate::new(2.0, 2.5, 3.0),
        ];
        let frame1 = frame0.iter().map(|c| *c * 2.0).collect();
        MdTrajectory::new(topology, vec![frame0, frame1]).unwrap()
    }

    #[test]
    fn test_uses_last_atom_of_residue() {
        let extraction = extract(&trajectory(), 0, &[3, 8]).unwrap();
        assert!(extraction.is_complete());
        assert_eq!(extraction.samples[0].residue_id, 3);
        assert_eq!(extraction.samples[0].atom_index, 4);
        assert_eq!(extraction.samples[1].atom_index, 3);
    }

    #[test]
    fn test_positions_are_ten_times_source_units() {
        let traj = trajectory();
        for frame in 0..traj.n_frames() {
            let extraction = extract(&traj, frame, &[8, 3]).unwrap();
            for sample in &extraction.samples {
                let raw = traj.position(frame, sample.atom_index).unwrap();
                assert_eq!(sample.position.x, raw.x * 10.0);
                assert_eq!(sample.position.y, raw.y * 10.0);
                assert_eq!(sample.position.z, raw.z * 10.0);
            }
        }
    }

    #[test]
    fn test_missing_residue_is_skipped() {
        let extraction = extract(&trajectory(), 1, &[8, 42, 3]).unwrap();
        assert_eq!(extraction.samples.len(), 2);
        assert_eq!(extraction.missing, vec![42]);
        assert_eq!(extraction.samples[0].residue_id, 8);
        assert_eq!(extraction.samples[1].residue_id, 3);
        assert_eq!(extraction.samples[1].position, Coordinate::new(40.0, 50.0, 60.0));
    }

    #[test]
    fn test_frame_out_of_range() {
        let err = extract(&trajectory(), 2, &[3]).unwrap_err();
        assert!(matches!(
            err,
            ConeError::FrameOutOfRange {
                frame: 2,
                n_frames: 2
            }
        ));
    }

    #[test]
    fn test_duplicate_requests_are_preserved() {
        let extraction = extract(&trajectory(), 0, &[8, 8]).unwrap();
        assert_eq!(extraction.samples.len(), 2);
        assert_eq!(extraction.samples[0], extraction.samples[1]);
    }
}
