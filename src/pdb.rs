use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ConeError, Result};
use crate::structure::{AtomRecord, Coordinate, Topology};
use crate::trajectory::FrameData;

/// PDB files store Ångström; trajectories are held in nanometres.
const ANGSTROM_TO_NM: f64 = 0.1;

/// Read a PDB file as a topology plus one frame per MODEL.
///
/// The topology comes from the first model. Files without MODEL records are
/// read as a single frame.
///
/// # Arguments
/// * `max_frames` - Maximum number of models to read (None for all models)
pub fn read_pdb(path: &Path, max_frames: Option<usize>) -> Result<(Topology, Vec<FrameData>)> {
    let file = File::open(path)?;
    parse_pdb(BufReader::new(file), path, max_frames)
}

pub(crate) fn parse_pdb<R: BufRead>(
    reader: R,
    source: &Path,
    max_frames: Option<usize>,
) -> Result<(Topology, Vec<FrameData>)> {
    let mut atoms: Vec<AtomRecord> = Vec::new();
    let mut frames: Vec<FrameData> = Vec::new();
    let mut current = FrameData::new();

    for (line_no, line_result) in reader.lines().enumerate() {
        let line = line_result?;

        if line.starts_with("MODEL") {
            // A model without ENDMDL is closed by the next MODEL
            if !current.is_empty() {
                push_frame(&mut frames, &mut current, atoms.len())?;
            }
            if reached(max_frames, frames.len()) {
                break;
            }
        } else if line.starts_with("ATOM") || line.starts_with("HETATM") {
            let position = parse_position(&line)
                .ok_or_else(|| ConeError::parse(source, format!("bad coordinates on line {}", line_no + 1)))?;

            if frames.is_empty() {
                let raw = field(&line, 22, 26);
                let residue_seq = parse_residue_seq(&raw).ok_or_else(|| {
                    ConeError::parse(
                        source,
                        format!(
                            "bad residue number {:?} on line {} (neither decimal nor hybrid-36)",
                            raw,
                            line_no + 1
                        ),
                    )
                })?;
                atoms.push(AtomRecord {
                    index: atoms.len(),
                    name: field(&line, 12, 16),
                    residue_name: field(&line, 17, 20),
                    residue_seq,
                });
            }
            current.push(position * ANGSTROM_TO_NM);
        } else if line.starts_with("ENDMDL") {
            if !current.is_empty() {
                push_frame(&mut frames, &mut current, atoms.len())?;
            }
            if reached(max_frames, frames.len()) {
                break;
            }
        }
    }

    // Last model without ENDMDL, or a single-model file without MODEL markers
    if !current.is_empty() && !reached(max_frames, frames.len()) {
        push_frame(&mut frames, &mut current, atoms.len())?;
    }

    if atoms.is_empty() {
        return Err(ConeError::parse(source, "no ATOM or HETATM records"));
    }

    Ok((Topology::new(atoms), frames))
}

fn push_frame(frames: &mut Vec<FrameData>, current: &mut FrameData, n_atoms: usize) -> Result<()> {
    if current.len() != n_atoms {
        return Err(ConeError::AtomCountMismatch {
            topology: n_atoms,
            trajectory: current.len(),
        });
    }
    frames.push(std::mem::take(current));
    Ok(())
}

fn reached(max_frames: Option<usize>, n: usize) -> bool {
    max_frames.map_or(false, |max| n >= max)
}

fn field(line: &str, start: usize, end: usize) -> String {
    line.get(start..end.min(line.len()))
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Residue number from columns 23-26: plain decimal, or hybrid-36 once the
/// numbering passes 9999 ("A000" = 10000, "a000" follows "ZZZZ").
fn parse_residue_seq(raw: &str) -> Option<i32> {
    if let Ok(n) = raw.parse::<i32>() {
        return Some(n);
    }
    const WIDTH: u32 = 4;
    let first = raw.chars().next()?;
    if raw.len() != WIDTH as usize {
        return None;
    }
    let upper = if first.is_ascii_uppercase() {
        true
    } else if first.is_ascii_lowercase() {
        false
    } else {
        return None;
    };

    let mut value: i32 = 0;
    for ch in raw.chars() {
        let valid = ch.is_ascii_digit()
            || (upper && ch.is_ascii_uppercase())
            || (!upper && ch.is_ascii_lowercase());
        if !valid {
            return None;
        }
        value = value * 36 + ch.to_digit(36)? as i32;
    }

    let block = 36i32.pow(WIDTH - 1);
    let offset = 10_000 - 10 * block;
    Some(if upper {
        value + offset
    } else {
        value + offset + 26 * block
    })
}

// PDB format: columns 31-38 = x, 39-46 = y, 47-54 = z (1-indexed)
fn parse_position(line: &str) -> Option<Coordinate> {
    let x = line.get(30..38)?.trim().parse::<f64>().ok()?;
    let y = line.get(38..46)?.trim().parse::<f64>().ok()?;
    let z = line.get(46..54)?.trim().parse::<f64>().ok()?;
    Some(Coordinate::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const TWO_MODELS: &str = "\
MODEL        1
ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.000  21.000  31.000  1.00  0.00           C
ATOM      3  CA  GLY A   2      12.000  22.000  32.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  N   ALA A   1       1.000   2.000   3.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       4.000   5.000   6.000  1.00  0.00           C
ATOM      3  CA  GLY A   2       7.000   8.000   9.000  1.00  0.00           C
ENDMDL
END
";

    fn parse(text: &str, max_frames: Option<usize>) -> Result<(Topology, Vec<FrameData>)> {
        parse_pdb(Cursor::new(text), Path::new("test.pdb"), max_frames)
    }

    fn close(a: Coordinate, b: Coordinate) -> bool {
        a.distance_to(&b) < 1e-9
    }

    #[test]
    fn test_reads_models_as_frames_in_nm() {
        let (topology, frames) = parse(TWO_MODELS, None).unwrap();
        assert_eq!(topology.n_atoms(), 3);
        assert_eq!(frames.len(), 2);

        let atoms = topology.atoms();
        assert_eq!(atoms[1].name, "CA");
        assert_eq!(atoms[1].residue_name, "ALA");
        assert_eq!(atoms[2].residue_seq, 2);

        assert!(close(frames[0][0], Coordinate::new(1.0, 2.0, 3.0)));
        assert!(close(frames[1][2], Coordinate::new(0.7, 0.8, 0.9)));
    }

    #[test]
    fn test_max_frames_limits_models() {
        let (_, frames) = parse(TWO_MODELS, Some(1)).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_single_model_without_markers() {
        let text = "\
ATOM      1  O   HOH W  10       1.000   1.000   1.000  1.00  0.00           O
HETATM    2 NA    NA I  11       2.000   2.000   2.000  1.00  0.00          NA
END
";
        let (topology, frames) = parse(text, None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(topology.atoms()[1].residue_seq, 11);
    }

    #[test]
    fn test_mismatched_model_is_rejected() {
        let text = "\
MODEL        1
ATOM      1  CA  ALA A   1       1.000   1.000   1.000  1.00  0.00           C
ATOM      2  CA  ALA A   2       1.000   1.000   1.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       1.000   1.000   1.000  1.00  0.00           C
ENDMDL
";
        assert!(matches!(
            parse(text, None),
            Err(ConeError::AtomCountMismatch { .. })
        ));
    }

    #[test]
    fn test_hybrid36_residue_numbers() {
        assert_eq!(parse_residue_seq("9999"), Some(9999));
        assert_eq!(parse_residue_seq("-12"), Some(-12));
        assert_eq!(parse_residue_seq("A000"), Some(10000));
        assert_eq!(parse_residue_seq("A001"), Some(10001));
        assert_eq!(parse_residue_seq("ZZZZ"), Some(1_223_055));
        assert_eq!(parse_residue_seq("a000"), Some(1_223_056));
        assert_eq!(parse_residue_seq("Aa00"), None);
        assert_eq!(parse_residue_seq("A0"), None);
        assert_eq!(parse_residue_seq("#000"), None);
    }

    #[test]
    fn test_hybrid36_residue_in_file() {
        let text = "\
ATOM      1  CA  ALA AA000       1.000   1.000   1.000  1.00  0.00           C
ATOM      2  CA  GLY AA001       2.000   2.000   2.000  1.00  0.00           C
END
";
        let (topology, _) = parse(text, None).unwrap();
        assert_eq!(topology.atoms()[0].residue_seq, 10000);
        assert_eq!(topology.atoms()[1].residue_seq, 10001);
    }

    #[test]
    fn test_bad_residue_number_names_numbering_schemes() {
        let text = "\
ATOM      1  CA  ALA A ?!?       1.000   1.000   1.000  1.00  0.00           C
END
";
        match parse(text, None) {
            Err(ConeError::Parse { message, .. }) => assert!(message.contains("hybrid-36"), "{}", message),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_an_error() {
        assert!(matches!(parse("END\n", None), Err(ConeError::Parse { .. })));
    }

    #[test]
    fn test_read_pdb_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".pdb").tempfile().unwrap();
        file.write_all(TWO_MODELS.as_bytes()).unwrap();
        let (topology, frames) = read_pdb(file.path(), None).unwrap();
        assert_eq!(topology.n_atoms(), 3);
        assert_eq!(frames.len(), 2);
    }
}
