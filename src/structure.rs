use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use nalgebra::Vector3;

/// 3D coordinate vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Calculate Euclidean distance to another coordinate
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Component-wise mean. `None` for an empty slice.
    pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
        if points.is_empty() {
            return None;
        }
        let sum = points
            .iter()
            .fold(Coordinate::origin(), |acc, p| acc + *p);
        Some(sum * (1.0 / points.len() as f64))
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Coordinate {
    type Output = Coordinate;

    fn mul(self, factor: f64) -> Coordinate {
        Coordinate::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl From<Coordinate> for Vector3<f64> {
    fn from(c: Coordinate) -> Self {
        Vector3::new(c.x, c.y, c.z)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// One atom of the topology, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub index: usize,
    pub name: String,
    pub residue_name: String,
    pub residue_seq: i32,
}

/// Ordered atom list shared by every frame of a trajectory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    atoms: Vec<AtomRecord>,
}

impl Topology {
    pub fn new(atoms: Vec<AtomRecord>) -> Self {
        Self { atoms }
    }

    /// Build a topology with anonymous atoms from a residue number per atom.
    pub fn from_residue_seqs(residue_seqs: &[i32]) -> Self {
        let atoms = residue_seqs
            .iter()
            .enumerate()
            .map(|(index, &residue_seq)| AtomRecord {
                index,
                name: "X".to_string(),
                residue_name: "UNK".to_string(),
                residue_seq,
            })
            .collect();
        Self { atoms }
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    /// Maps residue number to its atom indices in topology order
    pub fn residue_atoms(&self) -> HashMap<i32, Vec<usize>> {
        let mut grouped: HashMap<i32, Vec<usize>> = HashMap::new();
        for atom in &self.atoms {
            grouped
                .entry(atom.residue_seq)
                .or_insert_with(Vec::new)
                .push(atom.index);
        }
        grouped
    }
}

/// Representative point of one residue in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueSample {
    pub residue_id: i32,
    /// Index of the last atom of the residue in topology order
    pub atom_index: usize,
    /// Position in Ångström
    pub position: Coordinate,
}
