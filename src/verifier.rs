//! Submission verifier.
//!
//! Re-evaluates every submitted tour and packing plan of an instance and
//! compares the result against the reported objectives. The first violation
//! aborts the run; exceeding the per-instance submission cap only warns.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::evaluator::{simulate_from, EvaluationError, ObjectiveMismatch, START_CITY};
use crate::problem::{LoadError, Problem};
use crate::submission::{
    objective_lines, parse_objective_line, parse_packing_line, parse_tour_line, SolutionBlocks,
    SubmissionError,
};

/// Absolute tolerance on time and on profit.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Cap for instances no rule matches.
pub const DEFAULT_SUBMISSION_CAP: usize = i32::MAX as usize;

/// The nine GECCO'19 competition instances.
pub const GECCO19_INSTANCES: [&str; 9] = [
    "a280-n279",
    "a280-n1395",
    "a280-n2790",
    "fnl4461-n4460",
    "fnl4461-n22300",
    "fnl4461-n44600",
    "pla33810-n33809",
    "pla33810-n169045",
    "pla33810-n338090",
];

/// Per-instance limits on the number of submitted solutions.
///
/// Rules are `(name substring, cap)` pairs tried in order; the first rule
/// whose substring occurs in the instance name wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionLimits {
    rules: Vec<(String, usize)>,
    default_cap: usize,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_cap: DEFAULT_SUBMISSION_CAP,
        }
    }
}

impl SubmissionLimits {
    /// GECCO'19 caps: 100 for a280, 50 for fnl4461, 20 for pla33810.
    pub fn competition() -> Self {
        Self::default()
            .with_rule("a280", 100)
            .with_rule("fnl4461", 50)
            .with_rule("pla33810", 20)
    }

    pub fn with_rule(mut self, pattern: impl Into<String>, cap: usize) -> Self {
        self.rules.push((pattern.into(), cap));
        self
    }

    pub fn with_default_cap(mut self, cap: usize) -> Self {
        self.default_cap = cap;
        self
    }

    pub fn cap_for(&self, instance: &str) -> usize {
        self.rules
            .iter()
            .find(|(pattern, _)| instance.contains(pattern.as_str()))
            .map(|&(_, cap)| cap)
            .unwrap_or(self.default_cap)
    }
}

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Allowed absolute deviation on each of time and profit.
    pub tolerance: f64,
    pub limits: SubmissionLimits,
    /// City every submitted tour has to begin at.
    pub start_city: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            limits: SubmissionLimits::competition(),
            start_city: START_CITY,
        }
    }
}

/// Where a competition run finds its files.
///
/// Problems live in `<root>/src/main/resources/<instance>.txt`; a team's
/// files in `<root>/submissions/<team>/<team>_<instance>.{x,f}`.
#[derive(Debug, Clone)]
pub struct CompetitionLayout {
    pub root: PathBuf,
    pub team: String,
    pub instances: Vec<String>,
}

impl CompetitionLayout {
    pub fn gecco19(root: impl Into<PathBuf>, team: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            team: team.into(),
            instances: GECCO19_INSTANCES.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn problem_path(&self, instance: &str) -> PathBuf {
        self.root
            .join("src")
            .join("main")
            .join("resources")
            .join(format!("{}.txt", instance))
    }

    pub fn solutions_path(&self, instance: &str) -> PathBuf {
        self.submission_dir().join(format!("{}_{}.x", self.team, instance))
    }

    pub fn objectives_path(&self, instance: &str) -> PathBuf {
        self.submission_dir().join(format!("{}_{}.f", self.team, instance))
    }

    fn submission_dir(&self) -> PathBuf {
        self.root.join("submissions").join(&self.team)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Problem,
    Objectives,
    Solutions,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Problem => "problem",
            FileKind::Objectives => "objective",
            FileKind::Solutions => "solution",
        };
        f.write_str(name)
    }
}

/// Fatal verification failures. Solution ordinals count from 0.
#[derive(Debug)]
pub enum VerifyError {
    MissingFile { kind: FileKind, path: PathBuf },
    Io { path: PathBuf, source: io::Error },
    Load { path: PathBuf, source: LoadError },
    Parse { solution: usize, source: SubmissionError },
    ShapeMismatch { solution: usize, tour_len: usize, num_cities: usize },
    /// Some cities are never visited, or the tour names cities that do not exist.
    CoverageViolation {
        solution: usize,
        unvisited: Vec<usize>,
        unknown: Vec<usize>,
    },
    Evaluation { solution: usize, source: EvaluationError },
    MissingObjective { solution: usize },
    ObjectiveMismatch { solution: usize, mismatch: ObjectiveMismatch },
}

impl VerifyError {
    /// Ordinal of the rejected solution, if the failure concerns one.
    pub fn solution(&self) -> Option<usize> {
        match self {
            VerifyError::Parse { solution, .. }
            | VerifyError::ShapeMismatch { solution, .. }
            | VerifyError::CoverageViolation { solution, .. }
            | VerifyError::Evaluation { solution, .. }
            | VerifyError::MissingObjective { solution }
            | VerifyError::ObjectiveMismatch { solution, .. } => Some(*solution),
            VerifyError::MissingFile { .. } | VerifyError::Io { .. } | VerifyError::Load { .. } => {
                None
            }
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::MissingFile { kind, path } => {
                write!(f, "{} file not found: {}", kind, path.display())
            }
            VerifyError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            VerifyError::Load { path, source } => {
                write!(f, "failed to load {}: {}", path.display(), source)
            }
            VerifyError::Parse { solution, source } => {
                write!(f, "solution {}: {}", solution, source)
            }
            VerifyError::ShapeMismatch {
                solution,
                tour_len,
                num_cities,
            } => write!(
                f,
                "solution {}: wrong tour length {} != {}",
                solution, tour_len, num_cities
            ),
            VerifyError::CoverageViolation {
                solution,
                unvisited,
                unknown,
            } => {
                write!(f, "solution {}: not all cities are visited", solution)?;
                if let Some(first) = unvisited.first() {
                    write!(f, " ({} missing, first is {})", unvisited.len(), first)?;
                }
                if !unknown.is_empty() {
                    write!(f, ", unknown cities {:?}", unknown)?;
                }
                Ok(())
            }
            VerifyError::Evaluation { solution, source } => {
                write!(f, "solution {}: {}", solution, source)
            }
            VerifyError::MissingObjective { solution } => {
                write!(f, "solution {}: no objective line reported", solution)
            }
            VerifyError::ObjectiveMismatch { solution, mismatch } => write!(
                f,
                "solution {}: submissions do not match, {}",
                solution, mismatch
            ),
        }
    }
}

impl std::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerifyError::Io { source, .. } => Some(source),
            VerifyError::Load { source, .. } => Some(source),
            VerifyError::Parse { source, .. } => Some(source),
            VerifyError::Evaluation { source, .. } => Some(source),
            VerifyError::ObjectiveMismatch { mismatch, .. } => Some(mismatch),
            _ => None,
        }
    }
}

/// Outcome of a fully accepted instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceReport {
    pub instance: String,
    pub accepted: usize,
    pub cap: usize,
}

impl InstanceReport {
    /// More solutions than the competition allows. Not a rejection.
    pub fn over_cap(&self) -> bool {
        self.accepted > self.cap
    }
}

impl fmt::Display for InstanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Submission is correct ({} / {}).",
            self.instance, self.accepted, self.cap
        )
    }
}

/// Verify the contents of a solution file against an objective file.
pub fn verify_submission(
    problem: &Problem,
    solutions: &str,
    objectives: &str,
    options: &VerifyOptions,
) -> Result<InstanceReport, VerifyError> {
    let reported = objective_lines(objectives);
    let mut accepted = 0;

    for (ordinal, block) in SolutionBlocks::new(solutions).enumerate() {
        let parse_error = |source| VerifyError::Parse {
            solution: ordinal,
            source,
        };
        let (tour_line, packing_line) = block.map_err(parse_error)?;
        let tour = parse_tour_line(tour_line).map_err(parse_error)?;

        if tour.len() != problem.num_cities() {
            return Err(VerifyError::ShapeMismatch {
                solution: ordinal,
                tour_len: tour.len(),
                num_cities: problem.num_cities(),
            });
        }
        check_coverage(ordinal, &tour, problem.num_cities())?;

        let plan = parse_packing_line(packing_line);
        let journey = simulate_from(problem, options.start_city, &tour, &plan).map_err(|source| {
            VerifyError::Evaluation {
                solution: ordinal,
                source,
            }
        })?;

        let line = reported
            .get(ordinal)
            .ok_or(VerifyError::MissingObjective { solution: ordinal })?;
        let (time, profit) = parse_objective_line(line).map_err(parse_error)?;

        if !within(time, journey.time, options.tolerance)
            || !within(profit, journey.profit, options.tolerance)
        {
            return Err(VerifyError::ObjectiveMismatch {
                solution: ordinal,
                mismatch: ObjectiveMismatch {
                    reported: (time, profit),
                    evaluated: (journey.time, journey.profit),
                },
            });
        }

        accepted += 1;
    }

    let report = InstanceReport {
        instance: problem.name().to_string(),
        accepted,
        cap: options.limits.cap_for(problem.name()),
    };

    if report.over_cap() {
        warn!(
            instance = %report.instance,
            accepted = report.accepted,
            cap = report.cap,
            "the competition allows only {} solutions to be submitted, found {}",
            report.cap,
            report.accepted
        );
    }
    info!(
        instance = %report.instance,
        accepted = report.accepted,
        cap = report.cap,
        "submission accepted"
    );

    Ok(report)
}

/// Load the three files of one instance and verify them.
///
/// `instance` names the problem for cap lookup and reporting.
pub fn verify_files(
    instance: &str,
    problem_path: &Path,
    solutions_path: &Path,
    objectives_path: &Path,
    options: &VerifyOptions,
) -> Result<InstanceReport, VerifyError> {
    require(FileKind::Problem, problem_path)?;
    let problem = Problem::load(problem_path)
        .map_err(|source| VerifyError::Load {
            path: problem_path.to_path_buf(),
            source,
        })?
        .with_name(instance);

    require(FileKind::Objectives, objectives_path)?;
    require(FileKind::Solutions, solutions_path)?;
    let objectives = read(objectives_path)?;
    let solutions = read(solutions_path)?;

    verify_submission(&problem, &solutions, &objectives, options)
}

/// Verify every instance of a competition layout, stopping at the first failure.
pub fn verify_competition(
    layout: &CompetitionLayout,
    options: &VerifyOptions,
) -> Result<Vec<InstanceReport>, VerifyError> {
    layout
        .instances
        .iter()
        .map(|instance| {
            verify_files(
                instance,
                &layout.problem_path(instance),
                &layout.solutions_path(instance),
                &layout.objectives_path(instance),
                options,
            )
        })
        .collect()
}

fn check_coverage(ordinal: usize, tour: &[usize], num_cities: usize) -> Result<(), VerifyError> {
    let mut visited = vec![false; num_cities];
    let mut unknown = Vec::new();
    for &city in tour {
        match visited.get_mut(city) {
            Some(seen) => *seen = true,
            None => unknown.push(city),
        }
    }

    let unvisited: Vec<usize> = visited
        .iter()
        .enumerate()
        .filter(|&(_, &seen)| !seen)
        .map(|(city, _)| city)
        .collect();

    if unvisited.is_empty() && unknown.is_empty() {
        Ok(())
    } else {
        Err(VerifyError::CoverageViolation {
            solution: ordinal,
            unvisited,
            unknown,
        })
    }
}

fn within(reported: f64, evaluated: f64, tolerance: f64) -> bool {
    reported == evaluated || (reported - evaluated).abs() <= tolerance
}

fn require(kind: FileKind, path: &Path) -> Result<(), VerifyError> {
    if path.exists() {
        Ok(())
    } else {
        Err(VerifyError::MissingFile {
            kind,
            path: path.to_path_buf(),
        })
    }
}

fn read(path: &Path) -> Result<String, VerifyError> {
    fs::read_to_string(path).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })
}
