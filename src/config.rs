//! Read-only configuration consumed by the scheduling core.
//!
//! The period table maps numbered teaching periods to clock-time windows.
//! It is supplied by the surrounding administration system, either from a
//! TOML file or via [`PeriodTable::standard`].

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::slot::{ClockWindow, PeriodNumber};

/// Period number to clock-time window mapping.
#[derive(Debug, Clone)]
pub struct PeriodTable {
    windows: HashMap<PeriodNumber, ClockWindow>,
}

#[derive(Deserialize)]
struct PeriodTableFile {
    #[serde(default)]
    period: Vec<PeriodEntry>,
}

#[derive(Deserialize)]
struct PeriodEntry {
    number: u8,
    start: String,
    end: String,
}

impl PeriodTable {
    /// Build a table from explicit entries.
    pub fn new(entries: impl IntoIterator<Item = (PeriodNumber, ClockWindow)>) -> Self {
        Self {
            windows: entries.into_iter().collect(),
        }
    }

    /// The standard 12-period teaching day.
    pub fn standard() -> Self {
        const SLOTS: [(u8, (u32, u32), (u32, u32)); 12] = [
            (1, (8, 0), (8, 45)),
            (2, (8, 55), (9, 40)),
            (3, (10, 0), (10, 45)),
            (4, (10, 55), (11, 40)),
            (5, (12, 10), (12, 55)),
            (6, (13, 5), (13, 50)),
            (7, (14, 10), (14, 55)),
            (8, (15, 5), (15, 50)),
            (9, (16, 10), (16, 55)),
            (10, (17, 5), (17, 50)),
            (11, (19, 0), (19, 45)),
            (12, (19, 55), (20, 40)),
        ];

        let windows = SLOTS
            .iter()
            .map(|&(number, (sh, sm), (eh, em))| {
                // Constants above are static and within range.
                let period = PeriodNumber::new(number).expect("standard period number");
                let start = NaiveTime::from_hms_opt(sh, sm, 0).expect("standard start time");
                let end = NaiveTime::from_hms_opt(eh, em, 0).expect("standard end time");
                let window = ClockWindow::new(start, end).expect("standard window");
                (period, window)
            })
            .collect();

        Self { windows }
    }

    /// Parse a period table from TOML text.
    ///
    /// Expected format:
    ///
    /// ```toml
    /// [[period]]
    /// number = 1
    /// start = "08:00"
    /// end = "08:45"
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: PeriodTableFile =
            toml::from_str(text).context("Failed to parse period table TOML")?;

        let mut windows = HashMap::new();
        for entry in file.period {
            let number = PeriodNumber::new(entry.number)
                .map_err(|e| anyhow::anyhow!("Invalid period number in period table: {}", e))?;
            let start = parse_clock(&entry.start)
                .with_context(|| format!("Invalid start time for period {}", entry.number))?;
            let end = parse_clock(&entry.end)
                .with_context(|| format!("Invalid end time for period {}", entry.number))?;
            let window = ClockWindow::new(start, end)
                .map_err(|e| anyhow::anyhow!("Invalid window for period {}: {}", entry.number, e))?;
            if windows.insert(number, window).is_some() {
                anyhow::bail!("Duplicate period number {} in period table", entry.number);
            }
        }

        Ok(Self { windows })
    }

    /// Load a period table from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read period table {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&text)
    }

    /// Clock window for a period number, if the table defines it.
    pub fn window(&self, number: PeriodNumber) -> Option<ClockWindow> {
        self.windows.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for PeriodTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn parse_clock(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .with_context(|| format!("Expected HH:MM clock time, got {:?}", text))
}
