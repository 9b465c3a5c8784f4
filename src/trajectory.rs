use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::dcd;
use crate::error::{ConeError, Result};
use crate::pdb;
use crate::structure::{Coordinate, Topology};

/// Positions of every atom in one frame, in nanometres
pub type FrameData = Vec<Coordinate>;

/// Read access to a loaded molecular-dynamics trajectory
pub trait Trajectory {
    /// Total number of frames
    fn n_frames(&self) -> usize;

    /// Atom list in stable topology order
    fn topology(&self) -> &Topology;

    /// Position of `atom` in `frame`, in nanometres.
    ///
    /// Returns `None` if either index is out of range.
    fn position(&self, frame: usize, atom: usize) -> Option<Coordinate>;
}

/// In-memory trajectory: one topology plus a coordinate set per frame
#[derive(Debug, Clone)]
pub struct MdTrajectory {
    topology: Topology,
    frames: Vec<FrameData>,
}

impl MdTrajectory {
    /// Every frame must hold exactly one position per topology atom.
    pub fn new(topology: Topology, frames: Vec<FrameData>) -> Result<Self> {
        for frame in &frames {
            if frame.len() != topology.n_atoms() {
                return Err(ConeError::AtomCountMismatch {
                    topology: topology.n_atoms(),
                    trajectory: frame.len(),
                });
            }
        }
        Ok(Self { topology, frames })
    }

    /// Load a trajectory file, dispatching on its extension.
    ///
    /// # Arguments
    /// * `trajectory_path` - `.dcd` coordinates or a (multi-model) `.pdb`
    /// * `topology_path` - PDB topology; required for DCD, optional for PDB where
    ///   it replaces the atom list read from the first model
    pub fn load(trajectory_path: &Path, topology_path: Option<&Path>) -> Result<Self> {
        let extension = trajectory_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let trajectory = match extension.as_str() {
            "dcd" => {
                let topology_path = topology_path.ok_or_else(|| {
                    ConeError::UnsupportedFormat(
                        "DCD trajectories need a PDB topology file".to_string(),
                    )
                })?;
                let (topology, _) = pdb::read_pdb(topology_path, Some(1))?;
                let frames = dcd::read_dcd(trajectory_path)?;
                MdTrajectory::new(topology, frames)?
            }
            "pdb" => {
                let (topology, frames) = pdb::read_pdb(trajectory_path, None)?;
                match topology_path {
                    Some(path) => {
                        let (topology, _) = pdb::read_pdb(path, Some(1))?;
                        MdTrajectory::new(topology, frames)?
                    }
                    None => MdTrajectory::new(topology, frames)?,
                }
            }
            other => {
                return Err(ConeError::UnsupportedFormat(format!(
                    "'{}' ({})",
                    other,
                    trajectory_path.display()
                )))
            }
        };

        info!(
            frames = trajectory.n_frames(),
            atoms = trajectory.topology.n_atoms(),
            "Loaded trajectory {}",
            trajectory_path.display()
        );
        Ok(trajectory)
    }
}

impl Trajectory for MdTrajectory {
    fn n_frames(&self) -> usize {
        self.frames.len()
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn position(&self, frame: usize, atom: usize) -> Option<Coordinate> {
        self.frames.get(frame)?.get(atom).copied()
    }
}

/// Progress bar for frame-by-frame readers
pub(crate) fn frame_progress(total_frames: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_frames);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} frames ({percent}%) | ETA: {eta}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Reading trajectory frames");
    pb
}
