//! Interactive cone-angle session.
//!
//! The session repeatedly asks for a frame, a list of base residues and a tip
//! residue, computes the cone, and finally reports the mean of the per-cone
//! average tip angles. End of input closes the session at any prompt.

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::analysis::{analyze_cone, ConeSelection};
use crate::error::Result;
use crate::extract::extract;
use crate::report::{overall_tip_angle, write_cone_report, ConeRecord};
use crate::trajectory::Trajectory;

/// One entry of the base-residue list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEntry {
    Residue(i32),
    /// Any non-integer input terminates the list
    Done,
}

impl ListEntry {
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i32>() {
            Ok(id) => ListEntry::Residue(id),
            Err(_) => ListEntry::Done,
        }
    }
}

/// Line-oriented prompts over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one line; `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn ask_yes_no(&mut self, prompt: &str) -> io::Result<Option<bool>> {
        Ok(self
            .ask(prompt)?
            .map(|answer| answer.eq_ignore_ascii_case("y")))
    }

    /// Ask for a 1-indexed frame number until one is in range.
    ///
    /// Returns the 0-indexed frame.
    pub fn ask_frame(&mut self, n_frames: usize) -> io::Result<Option<usize>> {
        loop {
            let Some(answer) = self.ask("Enter an integer Frame Number: ")? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(number) if (1..=n_frames).contains(&number) => return Ok(Some(number - 1)),
                _ => writeln!(self.output, "invalid frame number (1-{}).\n", n_frames)?,
            }
        }
    }

    pub fn say(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }
}

/// Result of a whole session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    /// Cones that produced an average tip angle, in completion order
    pub records: Vec<ConeRecord>,
}

impl SessionSummary {
    pub fn overall_tip_angle(&self) -> Option<f64> {
        overall_tip_angle(&self.records)
    }
}

enum Step<T> {
    Value(T),
    /// Abandon this cone and go to the continue prompt
    Skip,
    /// Input exhausted
    Quit,
}

/// Run the interactive loop until the user stops or input ends.
pub fn run_session<T, R, W>(trajectory: &T, prompter: &mut Prompter<R, W>) -> Result<SessionSummary>
where
    T: Trajectory + ?Sized,
    R: BufRead,
    W: Write,
{
    let n_frames = trajectory.n_frames();
    prompter.say(format!("Total number of frames in current load: {}", n_frames))?;

    let mut summary = SessionSummary::default();
    let mut iteration = 0;

    loop {
        let Some(frame) = prompter.ask_frame(n_frames)? else {
            break;
        };

        let base_residues = match collect_base_residues(trajectory, frame, prompter)? {
            Step::Value(ids) => ids,
            Step::Skip => Vec::new(),
            Step::Quit => break,
        };

        let tip_residue = match collect_tip(trajectory, frame, prompter)? {
            Step::Value(id) => Some(id),
            Step::Skip => None,
            Step::Quit => break,
        };

        if let Some(tip_residue) = tip_residue {
            if base_residues.is_empty() {
                prompter.say("No base points collected. Skipping this set.\n")?;
            } else {
                let selection = ConeSelection {
                    frame,
                    base_residues,
                    tip_residue,
                };
                match analyze_cone(trajectory, &selection) {
                    Ok(analysis) => {
                        iteration += 1;
                        write_cone_report(prompter.output(), &analysis)?;
                        match ConeRecord::from_analysis(iteration, &analysis) {
                            Some(record) => {
                                prompter.say("\n--- Final Average Angle at B ---")?;
                                prompter.say(format!(
                                    "Average θ_B (Cone Tip Angle) = {:.6}°",
                                    record.avg_theta_b
                                ))?;
                                prompter.say("--------------------------------\n")?;
                                summary.records.push(record);
                            }
                            None => prompter.say(
                                "\nNo triangle passed the geometry checks; this cone is not counted.\n",
                            )?,
                        }
                    }
                    Err(e) => {
                        warn!("Cone skipped: {}", e);
                        prompter.say(format!("Cone skipped: {}\n", e))?;
                    }
                }
            }
        }

        match prompter.ask_yes_no("Would you like to analyze another cone? (y/n): ")? {
            Some(true) => continue,
            _ => break,
        }
    }

    match summary.overall_tip_angle() {
        Some(overall) => {
            prompter.say("\n=======================================")?;
            prompter.say(format!("Final Average of All θ_B Angles: {:.6}°", overall))?;
            prompter.say(format!("From {} total iterations.", summary.records.len()))?;
            prompter.say("=======================================\n")?;
        }
        None => prompter.say("\nNo angle data was collected.\n")?,
    }

    Ok(summary)
}

fn collect_base_residues<T, R, W>(
    trajectory: &T,
    frame: usize,
    prompter: &mut Prompter<R, W>,
) -> Result<Step<Vec<i32>>>
where
    T: Trajectory + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut ids = Vec::new();
    loop {
        let Some(answer) =
            prompter.ask("Enter an integer resID for basepoints (or any non-integer to finish): ")?
        else {
            return Ok(Step::Quit);
        };
        match ListEntry::parse(&answer) {
            ListEntry::Residue(id) => {
                if extract(trajectory, frame, &[id])?.is_complete() {
                    ids.push(id);
                } else {
                    prompter.say(format!("ResID {} not found in trajectory!", id))?;
                }
            }
            ListEntry::Done => {
                prompter.say("Finished collecting basepoints.\n")?;
                return Ok(Step::Value(ids));
            }
        }
    }
}

fn collect_tip<T, R, W>(trajectory: &T, frame: usize, prompter: &mut Prompter<R, W>) -> Result<Step<i32>>
where
    T: Trajectory + ?Sized,
    R: BufRead,
    W: Write,
{
    loop {
        let Some(answer) = prompter.ask("Enter an integer resID for tip: ")? else {
            return Ok(Step::Quit);
        };
        let Ok(id) = answer.parse::<i32>() else {
            prompter.say("Invalid input for tip. Skipping this set.\n")?;
            return Ok(Step::Skip);
        };
        match prompter.ask_yes_no(&format!("Is {} the correct tip resID? (y/n): ", id))? {
            None => return Ok(Step::Quit),
            Some(false) => continue,
            Some(true) => {}
        }
        if extract(trajectory, frame, &[id])?.is_complete() {
            return Ok(Step::Value(id));
        }
        prompter.say(format!("Tip ResID {} not found in trajectory! Skipping this set.\n", id))?;
        return Ok(Step::Skip);
    }
}
