use clap::{Parser, Subcommand};
use cone_analysis_rs::logging::setup_logging;
use cone_analysis_rs::{
    analyze_cone, run_session, save_records_to_csv, write_cone_report, ConeSelection, MdTrajectory,
    Prompter, Trajectory,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Command-line tool for measuring cone angles in molecular-dynamics trajectories
#[derive(Parser)]
#[command(name = "cone-analysis")]
#[command(about = "Measure cone tip angles between residues of MD trajectory frames", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively measure cones and average their tip angles
    Session {
        /// Path to the trajectory file (.dcd, or multi-model .pdb)
        #[arg(short, long)]
        trajectory: PathBuf,

        /// Path to the PDB topology file (required for .dcd trajectories)
        #[arg(long)]
        topology: Option<PathBuf>,

        /// Optional CSV path listing every completed cone
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Measure a single cone in one frame
    Compute {
        /// Path to the trajectory file (.dcd, or multi-model .pdb)
        #[arg(short, long)]
        trajectory: PathBuf,

        /// Path to the PDB topology file (required for .dcd trajectories)
        #[arg(long)]
        topology: Option<PathBuf>,

        /// Frame number, starting at 1
        #[arg(short, long)]
        frame: usize,

        /// Base residue IDs (comma-separated)
        #[arg(short, long, value_delimiter = ',', num_args = 1.., required = true)]
        base: Vec<i32>,

        /// Tip residue ID
        #[arg(long)]
        tip: i32,
    },
}

fn load(trajectory: &Path, topology: Option<&Path>) -> MdTrajectory {
    println!("Reading trajectory: {:?}", trajectory);
    if let Some(top) = topology {
        println!("Using topology: {:?}", top);
    }
    match MdTrajectory::load(trajectory, topology) {
        Ok(traj) => {
            println!("✅ Loaded {} frames", traj.n_frames());
            traj
        }
        Err(e) => {
            eprintln!("❌ Error loading trajectory: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Session {
            trajectory,
            topology,
            report,
        } => {
            let traj = load(&trajectory, topology.as_deref());

            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            let summary = match run_session(&traj, &mut prompter) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("❌ Session failed: {}", e);
                    std::process::exit(1);
                }
            };

            if let Some(report_path) = report {
                match save_records_to_csv(&summary.records, &report_path) {
                    Ok(()) => println!("📄 Report saved to: {:?}", report_path),
                    Err(e) => {
                        eprintln!("❌ Error saving report: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Compute {
            trajectory,
            topology,
            frame,
            base,
            tip,
        } => {
            let traj = load(&trajectory, topology.as_deref());

            if frame == 0 || frame > traj.n_frames() {
                eprintln!(
                    "❌ Frame {} is out of range (1-{})",
                    frame,
                    traj.n_frames()
                );
                std::process::exit(1);
            }

            let selection = ConeSelection {
                frame: frame - 1,
                base_residues: base,
                tip_residue: tip,
            };

            let analysis = match analyze_cone(&traj, &selection) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("❌ Error computing cone: {}", e);
                    std::process::exit(1);
                }
            };

            let mut stdout = io::stdout().lock();
            let written = write_cone_report(&mut stdout, &analysis).and_then(|_| {
                match analysis.result.average_theta_b() {
                    Some(theta_b) => writeln!(stdout, "\nAverage θ_B (Cone Tip Angle) = {:.6}°", theta_b),
                    None => writeln!(stdout, "\nNo triangle passed the geometry checks."),
                }
            });
            if let Err(e) = written {
                eprintln!("❌ Error writing report: {}", e);
                std::process::exit(1);
            }
        }
    }
}
