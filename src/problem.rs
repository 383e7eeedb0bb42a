//! Traveling Thief problem model and its text loader.
//!
//! A [`Problem`] is built in two steps. The loader fills a [`ProblemBuilder`]
//! from the field-keyed description, then [`ProblemBuilder::initialize`]
//! checks every required scalar and derives the city to items index. Once
//! initialized a `Problem` is immutable and can be shared freely across
//! threads.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::EdgeWeightType;
use crate::traits::{DistanceMetric, Point};

/// Name given to problems whose description carries no `PROBLEM NAME`.
pub const UNKNOWN_NAME: &str = "unknown";

#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    /// A line could not be understood.
    Malformed { line: usize, reason: String },
    /// A required field never appeared in the description.
    MissingField(&'static str),
    UnsupportedEdgeWeight(String),
    ItemCityOutOfRange { item: usize, city: usize },
    /// Required scalars were still unset when `initialize` ran.
    Initialization(Vec<&'static str>),
    /// All fields present, but they contradict each other.
    Invalid(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read problem: {}", err),
            LoadError::Malformed { line, reason } => {
                write!(f, "malformed problem description at line {}: {}", line, reason)
            }
            LoadError::MissingField(field) => {
                write!(f, "malformed problem description: missing {}", field)
            }
            LoadError::UnsupportedEdgeWeight(token) => {
                write!(f, "unsupported edge weight type {:?}, only CEIL_2D is supported", token)
            }
            LoadError::ItemCityOutOfRange { item, city } => {
                write!(f, "item {} refers to city {} which does not exist", item, city)
            }
            LoadError::Initialization(fields) => write!(
                f,
                "error while initializing problem, unset fields: {}",
                fields.join(", ")
            ),
            LoadError::Invalid(reason) => write!(f, "invalid problem: {}", reason),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

/// An item that can be stolen at a city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Zero-based index of the city holding the item.
    pub city: usize,
    pub weight: f64,
    pub profit: f64,
}

/// A fully initialized TTP instance.
#[derive(Debug, Clone)]
pub struct Problem {
    name: String,
    coordinates: Vec<Point>,
    items: Vec<Item>,
    items_at_city: Vec<Vec<usize>>,
    capacity: f64,
    min_speed: f64,
    max_speed: f64,
    renting_ratio: f64,
    edge_weight: EdgeWeightType,
}

impl Problem {
    /// Read and initialize a problem description from disk.
    ///
    /// The problem name defaults to the file stem when the description has
    /// no `PROBLEM NAME` line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut builder = ProblemBuilder::parse(&text)?;
        if builder.name.is_none() {
            builder.name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string);
        }
        builder.initialize()
    }

    pub fn builder() -> ProblemBuilder {
        ProblemBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the instance, e.g. to the competition instance key.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn num_cities(&self) -> usize {
        self.coordinates.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn coordinates(&self) -> &[Point] {
        &self.coordinates
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Indices of the items located at `city`.
    pub fn items_at_city(&self, city: usize) -> &[usize] {
        self.items_at_city.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Knapsack capacity.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn min_speed(&self) -> f64 {
        self.min_speed
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn renting_ratio(&self) -> f64 {
        self.renting_ratio
    }

    pub fn edge_weight(&self) -> EdgeWeightType {
        self.edge_weight
    }

    /// Rounded travel distance between two cities.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.edge_weight
            .distance(self.coordinates[from], self.coordinates[to])
    }
}

impl FromStr for Problem {
    type Err = LoadError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        ProblemBuilder::parse(text)?.initialize()
    }
}

/// Problem fields as they are being collected.
///
/// Scalars are `None` until set, so an infinite renting ratio or a zero
/// speed is never mistaken for a missing value.
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    pub name: Option<String>,
    pub num_cities: Option<usize>,
    pub num_items: Option<usize>,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub capacity: Option<f64>,
    pub renting_ratio: Option<f64>,
    pub edge_weight: Option<EdgeWeightType>,
    pub coordinates: Vec<Point>,
    pub items: Vec<Item>,
}

impl ProblemBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the cities; also fixes the city count.
    pub fn cities(mut self, coordinates: Vec<Point>) -> Self {
        self.num_cities = Some(coordinates.len());
        self.coordinates = coordinates;
        self
    }

    /// Set the items; also fixes the item count.
    pub fn items(mut self, items: Vec<Item>) -> Self {
        self.num_items = Some(items.len());
        self.items = items;
        self
    }

    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn speeds(mut self, min_speed: f64, max_speed: f64) -> Self {
        self.min_speed = Some(min_speed);
        self.max_speed = Some(max_speed);
        self
    }

    pub fn renting_ratio(mut self, renting_ratio: f64) -> Self {
        self.renting_ratio = Some(renting_ratio);
        self
    }

    /// Parse a problem description.
    ///
    /// Header lines are `KEY : value`. `NODE_COORD_SECTION` and
    /// `ITEMS SECTION` are each followed by exactly as many rows as
    /// `DIMENSION` and `NUMBER OF ITEMS` announced. Unknown lines are skipped.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut builder = ProblemBuilder::default();
        let mut seen_coords = false;
        let mut seen_items = false;
        let mut lines = text.lines().enumerate().map(|(idx, line)| (idx + 1, line.trim()));

        while let Some((line_no, line)) = lines.next() {
            if line.is_empty() {
                continue;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                let n = builder.num_cities.ok_or_else(|| LoadError::Malformed {
                    line: line_no,
                    reason: "NODE_COORD_SECTION before DIMENSION".to_string(),
                })?;
                builder.coordinates = Vec::with_capacity(n);
                for _ in 0..n {
                    let (row_no, row) = next_row(&mut lines, line_no, "NODE_COORD_SECTION")?;
                    builder.coordinates.push(parse_coordinate_row(row_no, row)?);
                }
                seen_coords = true;
            } else if line.starts_with("ITEMS SECTION") {
                let m = builder.num_items.ok_or_else(|| LoadError::Malformed {
                    line: line_no,
                    reason: "ITEMS SECTION before NUMBER OF ITEMS".to_string(),
                })?;
                builder.items = Vec::with_capacity(m);
                for _ in 0..m {
                    let (row_no, row) = next_row(&mut lines, line_no, "ITEMS SECTION")?;
                    builder.items.push(parse_item_row(row_no, row)?);
                }
                seen_items = true;
            } else if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                if key.contains("PROBLEM NAME") {
                    builder.name = Some(value.to_string());
                } else if key.contains("DIMENSION") {
                    builder.num_cities = Some(parse_value(line_no, "DIMENSION", value)?);
                } else if key.contains("NUMBER OF ITEMS") {
                    builder.num_items = Some(parse_value(line_no, "NUMBER OF ITEMS", value)?);
                } else if key.contains("RENTING RATIO") {
                    builder.renting_ratio = Some(parse_value(line_no, "RENTING RATIO", value)?);
                } else if key.contains("CAPACITY OF KNAPSACK") {
                    builder.capacity = Some(parse_value(line_no, "CAPACITY OF KNAPSACK", value)?);
                } else if key.contains("MIN SPEED") {
                    builder.min_speed = Some(parse_value(line_no, "MIN SPEED", value)?);
                } else if key.contains("MAX SPEED") {
                    builder.max_speed = Some(parse_value(line_no, "MAX SPEED", value)?);
                } else if key.contains("EDGE_WEIGHT_TYPE") {
                    let edge_weight = EdgeWeightType::from_token(value)
                        .ok_or_else(|| LoadError::UnsupportedEdgeWeight(value.to_string()))?;
                    builder.edge_weight = Some(edge_weight);
                }
            }
        }

        if let Some(field) = builder.first_unset() {
            return Err(LoadError::MissingField(field));
        }
        if !seen_coords {
            return Err(LoadError::MissingField("NODE_COORD_SECTION"));
        }
        if !seen_items && builder.num_items.unwrap_or(0) > 0 {
            return Err(LoadError::MissingField("ITEMS SECTION"));
        }

        Ok(builder)
    }

    /// Check every required field and derive the city to items index.
    pub fn initialize(self) -> Result<Problem, LoadError> {
        let unset = self.unset_fields();
        let (
            Some(num_cities),
            Some(num_items),
            Some(min_speed),
            Some(max_speed),
            Some(capacity),
            Some(renting_ratio),
        ) = (
            self.num_cities,
            self.num_items,
            self.min_speed,
            self.max_speed,
            self.capacity,
            self.renting_ratio,
        )
        else {
            return Err(LoadError::Initialization(unset));
        };

        if num_cities == 0 {
            return Err(LoadError::Invalid("a problem needs at least one city".to_string()));
        }
        if self.coordinates.len() != num_cities {
            return Err(LoadError::Invalid(format!(
                "{} coordinates given for {} cities",
                self.coordinates.len(),
                num_cities
            )));
        }
        if self.items.len() != num_items {
            return Err(LoadError::Invalid(format!(
                "{} items given, expected {}",
                self.items.len(),
                num_items
            )));
        }
        if min_speed > max_speed {
            return Err(LoadError::Invalid(format!(
                "min speed {} exceeds max speed {}",
                min_speed, max_speed
            )));
        }
        if !(capacity > 0.0) {
            return Err(LoadError::Invalid(format!(
                "knapsack capacity must be positive, got {}",
                capacity
            )));
        }

        let mut items_at_city = vec![Vec::new(); num_cities];
        for (index, item) in self.items.iter().enumerate() {
            let slot = items_at_city
                .get_mut(item.city)
                .ok_or(LoadError::ItemCityOutOfRange { item: index, city: item.city })?;
            slot.push(index);
        }

        let problem = Problem {
            name: self.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            coordinates: self.coordinates,
            items: self.items,
            items_at_city,
            capacity,
            min_speed,
            max_speed,
            renting_ratio,
            edge_weight: self.edge_weight.unwrap_or(EdgeWeightType::Ceil2d),
        };

        debug!(
            name = %problem.name,
            cities = problem.num_cities(),
            items = problem.num_items(),
            capacity = problem.capacity,
            "problem initialized"
        );

        Ok(problem)
    }

    fn unset_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("DIMENSION", self.num_cities.is_none()),
            ("NUMBER OF ITEMS", self.num_items.is_none()),
            ("RENTING RATIO", self.renting_ratio.is_none()),
            ("CAPACITY OF KNAPSACK", self.capacity.is_none()),
            ("MIN SPEED", self.min_speed.is_none()),
            ("MAX SPEED", self.max_speed.is_none()),
        ];
        checks
            .into_iter()
            .filter(|&(_, unset)| unset)
            .map(|(field, _)| field)
            .collect()
    }

    fn first_unset(&self) -> Option<&'static str> {
        self.unset_fields().into_iter().next()
    }
}

fn next_row<'a, I>(
    lines: &mut I,
    section_line: usize,
    section: &str,
) -> Result<(usize, &'a str), LoadError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    lines.next().ok_or_else(|| LoadError::Malformed {
        line: section_line,
        reason: format!("{} ended early", section),
    })
}

fn parse_value<T: FromStr>(line: usize, field: &str, value: &str) -> Result<T, LoadError> {
    value.parse().map_err(|_| LoadError::Malformed {
        line,
        reason: format!("cannot parse {} from {:?}", field, value),
    })
}

fn parse_coordinate_row(line: usize, row: &str) -> Result<Point, LoadError> {
    let tokens: Vec<&str> = row.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(LoadError::Malformed {
            line,
            reason: format!("expected `<id> <x> <y>`, got {:?}", row),
        });
    }
    let x = parse_value(line, "x coordinate", tokens[1])?;
    let y = parse_value(line, "y coordinate", tokens[2])?;
    Ok((x, y))
}

fn parse_item_row(line: usize, row: &str) -> Result<Item, LoadError> {
    let tokens: Vec<&str> = row.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(LoadError::Malformed {
            line,
            reason: format!("expected `<id> <profit> <weight> <city>`, got {:?}", row),
        });
    }
    let profit = parse_value(line, "item profit", tokens[1])?;
    let weight = parse_value(line, "item weight", tokens[2])?;
    let node: usize = parse_value(line, "item city", tokens[3])?;
    // Cities are numbered from 1 in the description.
    let city = node.checked_sub(1).ok_or_else(|| LoadError::Malformed {
        line,
        reason: "item city numbers start at 1".to_string(),
    })?;
    Ok(Item { city, weight, profit })
}
