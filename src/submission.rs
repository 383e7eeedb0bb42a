//! Reading and writing the submission file formats.
//!
//! A solution file (`.x`) is a sequence of blocks: a tour line, a packing
//! line, and an optional blank separator. Tours may be 0-based or 1-based;
//! a tour whose first index is `1` is taken as 1-based and shifted down.
//! The objective file (`.f`) holds one `time profit` pair per solution.

use std::fmt;
use std::io::{self, Write};

use crate::solution::{PackingPlan, Tour};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// A token that is not a city index.
    InvalidCity(String),
    /// A 1-based tour that contains `0`.
    ZeroInOneBasedTour,
    EmptyTour,
    /// The file ended right after a tour line.
    MissingPackingPlan,
    InvalidObjective(String),
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::InvalidCity(token) => write!(f, "invalid city index {:?}", token),
            SubmissionError::ZeroInOneBasedTour => {
                write!(f, "tour starts with 1 but also contains city 0")
            }
            SubmissionError::EmptyTour => write!(f, "empty tour line"),
            SubmissionError::MissingPackingPlan => write!(f, "missing packing plan line"),
            SubmissionError::InvalidObjective(line) => {
                write!(f, "expected `<time> <profit>`, got {:?}", line)
            }
        }
    }
}

impl std::error::Error for SubmissionError {}

/// Numbering used when writing tours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    Zero,
    #[default]
    One,
}

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Parse a tour line, detecting 1-based numbering from the first index.
pub fn parse_tour_line(line: &str) -> Result<Tour, SubmissionError> {
    let mut tour = tokens(line)
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| SubmissionError::InvalidCity(token.to_string()))
        })
        .collect::<Result<Tour, _>>()?;

    match tour.first() {
        None => Err(SubmissionError::EmptyTour),
        Some(&1) => {
            for city in tour.iter_mut() {
                *city = city.checked_sub(1).ok_or(SubmissionError::ZeroInOneBasedTour)?;
            }
            Ok(tour)
        }
        Some(_) => Ok(tour),
    }
}

/// Parse a packing line. `1` and `true` pick an item, anything else skips it.
pub fn parse_packing_line(line: &str) -> PackingPlan {
    tokens(line)
        .map(|token| matches!(token, "1" | "true" | "True" | "TRUE"))
        .collect()
}

/// Parse one `time profit` line of an objective file.
pub fn parse_objective_line(line: &str) -> Result<(f64, f64), SubmissionError> {
    let invalid = || SubmissionError::InvalidObjective(line.to_string());
    let mut values = line.split_whitespace().map(str::parse::<f64>);
    match (values.next(), values.next()) {
        (Some(Ok(time)), Some(Ok(profit))) => Ok((time, profit)),
        _ => Err(invalid()),
    }
}

/// Non-empty lines of an objective file, in order.
pub fn objective_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Iterator over the `(tour line, packing line)` blocks of a solution file.
///
/// Tours are not parsed here so the caller can attach the solution ordinal
/// to any error.
pub struct SolutionBlocks<'a> {
    lines: std::iter::Peekable<std::str::Lines<'a>>,
}

impl<'a> SolutionBlocks<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().peekable(),
        }
    }
}

impl<'a> Iterator for SolutionBlocks<'a> {
    type Item = Result<(&'a str, &'a str), SubmissionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let tour_line = loop {
            let line = self.lines.next()?.trim();
            if !line.is_empty() {
                break line;
            }
        };

        let Some(packing_line) = self.lines.next() else {
            return Some(Err(SubmissionError::MissingPackingPlan));
        };

        // Optional blank separator.
        if self.lines.peek().is_some_and(|line| line.trim().is_empty()) {
            self.lines.next();
        }

        Some(Ok((tour_line, packing_line.trim())))
    }
}

/// Write one `.x` block: tour line, packing line, blank separator.
pub fn write_solution_block<W: Write>(
    writer: &mut W,
    tour: &[usize],
    plan: &[bool],
    base: IndexBase,
) -> io::Result<()> {
    let offset = match base {
        IndexBase::Zero => 0,
        IndexBase::One => 1,
    };
    let tour_line = tour
        .iter()
        .map(|city| (city + offset).to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let packing_line = plan
        .iter()
        .map(|&picked| if picked { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", tour_line)?;
    writeln!(writer, "{}", packing_line)?;
    writeln!(writer)
}

/// Write one `.f` line. Values use the shortest exact representation.
pub fn write_objective_line<W: Write>(writer: &mut W, time: f64, profit: f64) -> io::Result<()> {
    writeln!(writer, "{} {}", time, profit)
}
