//! Test fixtures for thief-eval.
//!
//! Provides:
//! - A builder that renders TTP problem descriptions in the text format
//! - The four-city square instance used throughout the tests
//! - Scratch directories for file-based verifier tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use thief_eval::problem::Problem;

/// Builder for problem descriptions with sensible defaults.
#[derive(Clone, Debug)]
pub struct InstanceText {
    pub name: String,
    pub cities: Vec<(f64, f64)>,
    /// `(profit, weight, zero-based city)`
    pub items: Vec<(f64, f64, usize)>,
    pub capacity: Option<u64>,
    pub min_speed: f64,
    pub max_speed: f64,
    pub renting_ratio: f64,
    pub edge_weight: String,
}

impl InstanceText {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cities: Vec::new(),
            items: Vec::new(),
            capacity: Some(10),
            min_speed: 1.0,
            max_speed: 1.0,
            renting_ratio: 1.0,
            edge_weight: "CEIL_2D".to_string(),
        }
    }

    pub fn city(mut self, x: f64, y: f64) -> Self {
        self.cities.push((x, y));
        self
    }

    pub fn item(mut self, profit: f64, weight: f64, city: usize) -> Self {
        self.items.push((profit, weight, city));
        self
    }

    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn without_capacity(mut self) -> Self {
        self.capacity = None;
        self
    }

    pub fn speeds(mut self, min: f64, max: f64) -> Self {
        self.min_speed = min;
        self.max_speed = max;
        self
    }

    pub fn renting_ratio(mut self, ratio: f64) -> Self {
        self.renting_ratio = ratio;
        self
    }

    pub fn edge_weight(mut self, token: &str) -> Self {
        self.edge_weight = token.to_string();
        self
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str(&format!("PROBLEM NAME: \t{}\n", self.name));
        text.push_str("KNAPSACK DATA TYPE: \tbounded strongly corr\n");
        text.push_str(&format!("DIMENSION:\t{}\n", self.cities.len()));
        text.push_str(&format!("NUMBER OF ITEMS: \t{}\n", self.items.len()));
        if let Some(capacity) = self.capacity {
            text.push_str(&format!("CAPACITY OF KNAPSACK: \t{}\n", capacity));
        }
        text.push_str(&format!("MIN SPEED: \t{}\n", self.min_speed));
        text.push_str(&format!("MAX SPEED: \t{}\n", self.max_speed));
        text.push_str(&format!("RENTING RATIO: \t{}\n", self.renting_ratio));
        text.push_str(&format!("EDGE_WEIGHT_TYPE:\t{}\n", self.edge_weight));
        text.push_str("NODE_COORD_SECTION\t(INDEX, X, Y): \n");
        for (i, (x, y)) in self.cities.iter().enumerate() {
            text.push_str(&format!("{}\t{}\t{}\n", i + 1, x, y));
        }
        text.push_str("ITEMS SECTION\t(INDEX, PROFIT, WEIGHT, ASSIGNED NODE NUMBER): \n");
        for (i, (profit, weight, city)) in self.items.iter().enumerate() {
            text.push_str(&format!("{}\t{}\t{}\t{}\n", i + 1, profit, weight, city + 1));
        }
        text
    }

    pub fn problem(&self) -> Problem {
        self.render().parse().expect("fixture problem should load")
    }
}

/// Cities at (0,0), (0,3), (4,3), (4,0); one item (profit 10, weight 2) at city 1.
pub fn square() -> InstanceText {
    InstanceText::new("square")
        .city(0.0, 0.0)
        .city(0.0, 3.0)
        .city(4.0, 3.0)
        .city(4.0, 0.0)
        .item(10.0, 2.0, 1)
        .capacity(10)
        .speeds(1.0, 1.0)
        .renting_ratio(1.0)
}

/// A slightly larger instance with a real speed range and several items per city.
pub fn grid(side: usize) -> InstanceText {
    let mut text = InstanceText::new("grid")
        .speeds(0.1, 1.0)
        .renting_ratio(0.37)
        .capacity(40);
    for i in 0..side * side {
        text = text.city((i % side) as f64 * 7.0, (i / side) as f64 * 5.0);
    }
    for city in 1..side * side {
        text = text
            .item((city * 3 % 17 + 1) as f64, (city * 5 % 11 + 1) as f64, city)
            .item((city * 7 % 13 + 2) as f64, (city % 4 + 1) as f64, city);
    }
    text
}

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh directory under the system temp dir, removed on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let id = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "thief-eval-{}-{}-{}",
            label,
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create scratch dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write scratch file");
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
