//! Reader for CHARMM/NAMD DCD trajectories.
//!
//! A DCD file is a sequence of Fortran unformatted records, each framed by a
//! 4-byte length marker on both sides. The header record starts with `CORD`
//! followed by twenty control integers; every frame stores an optional unit
//! cell record and then one `f32` record per axis, in Ångström.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use tracing::{debug, warn};

use crate::error::{ConeError, Result};
use crate::structure::Coordinate;
use crate::trajectory::{frame_progress, FrameData};

const HEADER_LEN: u32 = 84;
const ANGSTROM_TO_NM: f64 = 0.1;

/// Read every frame of a DCD file, positions converted to nanometres.
pub fn read_dcd(path: &Path) -> Result<Vec<FrameData>> {
    let file = File::open(path)?;
    parse_dcd(BufReader::new(file), path)
}

pub(crate) fn parse_dcd<R: Read>(mut reader: R, source: &Path) -> Result<Vec<FrameData>> {
    let mut marker = [0u8; 4];
    reader.read_exact(&mut marker)?;

    if LittleEndian::read_u32(&marker) == HEADER_LEN {
        read_frames::<LittleEndian, R>(reader, source)
    } else if BigEndian::read_u32(&marker) == HEADER_LEN {
        debug!("Big-endian DCD: {}", source.display());
        read_frames::<BigEndian, R>(reader, source)
    } else {
        Err(ConeError::parse(source, "not a DCD file (bad header record length)"))
    }
}

fn read_frames<B: ByteOrder, R: Read>(mut reader: R, source: &Path) -> Result<Vec<FrameData>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != b"CORD" {
        return Err(ConeError::parse(source, "missing CORD signature"));
    }

    let mut icntrl = [0i32; 20];
    reader.read_i32_into::<B>(&mut icntrl)?;
    expect_marker::<B, R>(&mut reader, HEADER_LEN, source)?;

    let n_set = icntrl[0].max(0) as usize;
    let n_fixed = icntrl[8];
    let charmm = icntrl[19] != 0;
    let has_unit_cell = charmm && icntrl[10] != 0;
    let four_dims = charmm && icntrl[11] != 0;

    if n_fixed != 0 {
        return Err(ConeError::parse(
            source,
            format!("{} fixed atoms; fixed-atom DCD files are not supported", n_fixed),
        ));
    }

    // Title block
    let title_len = reader.read_u32::<B>()?;
    skip(&mut reader, title_len, source)?;
    expect_marker::<B, R>(&mut reader, title_len, source)?;

    expect_marker::<B, R>(&mut reader, 4, source)?;
    let n_atoms = reader.read_i32::<B>()?;
    expect_marker::<B, R>(&mut reader, 4, source)?;
    if n_atoms <= 0 {
        return Err(ConeError::parse(source, format!("invalid atom count {}", n_atoms)));
    }
    let n_atoms = n_atoms as usize;

    // The header count is advisory; frames are read until end of file
    let pb = frame_progress(n_set as u64);
    let mut frames = Vec::new();

    while let Some(mut record_len) = read_marker::<B, R>(&mut reader)? {
        if has_unit_cell {
            skip(&mut reader, record_len, source)?;
            expect_marker::<B, R>(&mut reader, record_len, source)?;
            record_len = reader.read_u32::<B>()?;
        }

        let xs = read_axis::<B, R>(&mut reader, record_len, n_atoms, source)?;
        let y_len = reader.read_u32::<B>()?;
        let ys = read_axis::<B, R>(&mut reader, y_len, n_atoms, source)?;
        let z_len = reader.read_u32::<B>()?;
        let zs = read_axis::<B, R>(&mut reader, z_len, n_atoms, source)?;

        if four_dims {
            let w_len = reader.read_u32::<B>()?;
            skip(&mut reader, w_len, source)?;
            expect_marker::<B, R>(&mut reader, w_len, source)?;
        }

        let frame: FrameData = xs
            .iter()
            .zip(ys.iter())
            .zip(zs.iter())
            .map(|((&x, &y), &z)| Coordinate::new(x as f64, y as f64, z as f64) * ANGSTROM_TO_NM)
            .collect();
        frames.push(frame);
        pb.inc(1);
    }

    pb.finish_with_message("Trajectory loaded");

    if n_set != 0 && frames.len() != n_set {
        warn!(
            "DCD header announces {} frames but {} were read from {}",
            n_set,
            frames.len(),
            source.display()
        );
    }

    Ok(frames)
}

/// Leading record marker, or `None` at end of file.
fn read_marker<B: ByteOrder, R: Read>(reader: &mut R) -> Result<Option<u32>> {
    let mut buf = [0u8; 4];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(B::read_u32(&buf))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn expect_marker<B: ByteOrder, R: Read>(reader: &mut R, expected: u32, source: &Path) -> Result<()> {
    let found = reader.read_u32::<B>()?;
    if found != expected {
        return Err(ConeError::parse(
            source,
            format!("record marker mismatch: expected {}, found {}", expected, found),
        ));
    }
    Ok(())
}

fn read_axis<B: ByteOrder, R: Read>(
    reader: &mut R,
    record_len: u32,
    n_atoms: usize,
    source: &Path,
) -> Result<Vec<f32>> {
    if record_len as usize != n_atoms * 4 {
        return Err(ConeError::parse(
            source,
            format!("coordinate record of {} bytes for {} atoms", record_len, n_atoms),
        ));
    }
    // Buffer grows with the bytes actually present, not the declared atom count
    let mut bytes = Vec::new();
    reader.by_ref().take(record_len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != record_len as usize {
        return Err(ConeError::parse(source, "unexpected end of file"));
    }
    let mut values = vec![0f32; n_atoms];
    B::read_f32_into(&bytes, &mut values);
    expect_marker::<B, R>(reader, record_len, source)?;
    Ok(values)
}

fn skip<R: Read>(reader: &mut R, len: u32, source: &Path) -> Result<()> {
    let copied = io::copy(&mut reader.by_ref().take(len as u64), &mut io::sink())?;
    if copied != len as u64 {
        return Err(ConeError::parse(source, "unexpected end of file"));
    }
    Ok(())
}
