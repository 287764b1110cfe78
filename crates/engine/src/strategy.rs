//! Scoring strategies and their weight table.

use crate::task::Note;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named weighting scheme mapping sub-scores to a final priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Deadlines dominate.
    DeadlineDriven,
    /// Importance ratings dominate.
    ImportanceDriven,
    /// Position in the dependency graph dominates.
    CriticalPath,
    /// Even mix of deadlines and importance.
    #[default]
    Balanced,
}

/// Percentage weights of the four sub-scores. Every row sums to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Weights {
    /// Weight of the deadline sub-score.
    pub urgency: u8,
    /// Weight of the importance sub-score.
    pub importance: u8,
    /// Weight of the upstream-effort sub-score.
    pub critical_path: u8,
    /// Weight of the descendant-count sub-score.
    pub blocking_fanout: u8,
}

impl Weights {
    /// Sum of the four weights.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.urgency as u32
            + self.importance as u32
            + self.critical_path as u32
            + self.blocking_fanout as u32
    }
}

const _: () = {
    let mut i = 0;
    while i < Strategy::ALL.len() {
        assert!(
            Strategy::ALL[i].weights().total() == 100,
            "strategy weights must sum to 100"
        );
        i += 1;
    }
};

impl Strategy {
    /// Every strategy, in display order.
    pub const ALL: [Self; 4] = [
        Self::DeadlineDriven,
        Self::ImportanceDriven,
        Self::CriticalPath,
        Self::Balanced,
    ];

    /// The weight row for this strategy.
    #[must_use]
    pub const fn weights(self) -> Weights {
        match self {
            Self::DeadlineDriven => Weights {
                urgency: 60,
                importance: 20,
                critical_path: 10,
                blocking_fanout: 10,
            },
            Self::ImportanceDriven => Weights {
                urgency: 15,
                importance: 60,
                critical_path: 15,
                blocking_fanout: 10,
            },
            Self::CriticalPath => Weights {
                urgency: 15,
                importance: 15,
                critical_path: 40,
                blocking_fanout: 30,
            },
            Self::Balanced => Weights {
                urgency: 35,
                importance: 35,
                critical_path: 15,
                blocking_fanout: 15,
            },
        }
    }

    /// The wire name, e.g. `deadline_driven`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeadlineDriven => "deadline_driven",
            Self::ImportanceDriven => "importance_driven",
            Self::CriticalPath => "critical_path",
            Self::Balanced => "balanced",
        }
    }

    /// One-line description for listings.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::DeadlineDriven => "Tasks due soonest first",
            Self::ImportanceDriven => "Most important tasks first",
            Self::CriticalPath => "Tasks that unblock the most work first",
            Self::Balanced => "Deadlines and importance weighed equally (default)",
        }
    }

    /// Look up a strategy by name.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `-` like `_`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
    }

    /// Resolve a caller-supplied selector.
    ///
    /// A missing or blank selector means the default. An unrecognized name
    /// also falls back to the default, along with a note that is attached
    /// to every analyzed task.
    #[must_use]
    pub fn resolve(selector: Option<&str>) -> (Self, Option<Note>) {
        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            None => (Self::default(), None),
            Some(name) => match Self::from_name(name) {
                Some(strategy) => (strategy, None),
                None => (
                    Self::default(),
                    Some(Note::UnknownStrategy {
                        name: name.to_string(),
                    }),
                ),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let known = Self::ALL.map(Self::as_str).join(", ");
            format!("Unknown strategy '{s}' (expected one of: {known})")
        })
    }
}
