pub mod analysis;
pub mod cone;
pub mod dcd;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pdb;
pub mod plane;
pub mod report;
pub mod session;
pub mod structure;
pub mod trajectory;

#[cfg(feature = "python")]
pub mod python_bindings;

// Re-export commonly used types and traits
pub use analysis::{analyze_cone, ConeAnalysis, ConeSelection};
pub use cone::{compute_cone_angles, ConeAngleResult, ExclusionReason, TriangleAngles, TriangleOutcome};
pub use error::{ConeError, Result};
pub use extract::{extract, Extraction};
pub use plane::{fit_plane, PlaneEstimate};
pub use report::{save_records_to_csv, write_cone_report, ConeRecord};
pub use session::{run_session, Prompter, SessionSummary};
pub use structure::{Coordinate, ResidueSample, Topology};
pub use trajectory::{MdTrajectory, Trajectory};
