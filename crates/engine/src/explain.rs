//! Explanations for scores.
//!
//! Factors are kept structured (what drove the score and by how much) and
//! only turned into sentences through `Display`.

use crate::config::ScoringConfig;
use crate::score::{Contributions, SubScores};
use crate::strategy::Strategy;
use crate::task::{Note, Task};
use chrono::NaiveDate;
use std::fmt;
use taskrank_graph::GraphMetrics;

/// Slack for comparing contributions against the materiality threshold.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Chains at least this deep are called long.
const LONG_CHAIN_DEPTH: usize = 3;

/// The facts behind one weighted sub-score.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorDetail {
    /// Deadline pressure from a due date.
    Deadline {
        /// Days from the reference date to the due date; negative when overdue.
        days_until_due: i64,
    },
    /// The importance rating.
    Importance {
        /// Rating, 1 through 10.
        importance: u8,
    },
    /// Upstream effort along the dependency chain.
    DependencyChain {
        /// Chain length before this task.
        depth: usize,
        /// Hours along the heaviest chain, including this task.
        upstream_hours: f64,
    },
    /// Tasks waiting on this one.
    Blocking {
        /// Transitive dependent count.
        descendants: usize,
    },
}

/// One contributing factor of a score.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    /// What the factor is about.
    pub detail: FactorDetail,
    /// The normalized sub-score, in `[0, 1]`.
    pub sub_score: f64,
    /// Weighted contribution, as a fraction of the full scale.
    pub contribution: f64,
}

/// One entry of an explanation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// A material scoring factor.
    Factor(Factor),
    /// No factor was material.
    LowSignal(Strategy),
    /// A validation or graph note.
    Note(Note),
}

/// Build the ordered explanation for one task.
///
/// Material factors come first, largest contribution first (ties keep the
/// order urgency, importance, critical path, fanout). Without any material
/// factor a single low-signal reason stands in. `notes` follow, in order.
#[must_use]
pub fn explain(
    task: &Task,
    metrics: &GraphMetrics,
    subs: &SubScores,
    strategy: Strategy,
    today: NaiveDate,
    config: &ScoringConfig,
    notes: &[Note],
) -> Vec<Reason> {
    let contributions = Contributions::new(strategy.weights(), subs);

    let mut candidates = Vec::with_capacity(4);
    // An undated task's baseline urgency is not a signal worth explaining
    if let Some(due) = task.due_date {
        candidates.push(Factor {
            detail: FactorDetail::Deadline {
                days_until_due: (due - today).num_days(),
            },
            sub_score: subs.urgency,
            contribution: contributions.urgency,
        });
    }
    candidates.push(Factor {
        detail: FactorDetail::Importance {
            importance: task.importance,
        },
        sub_score: subs.importance,
        contribution: contributions.importance,
    });
    candidates.push(Factor {
        detail: FactorDetail::DependencyChain {
            depth: metrics.depth,
            upstream_hours: metrics.cumulative_upstream_hours,
        },
        sub_score: subs.critical_path,
        contribution: contributions.critical_path,
    });
    candidates.push(Factor {
        detail: FactorDetail::Blocking {
            descendants: metrics.descendant_count,
        },
        sub_score: subs.blocking_fanout,
        contribution: contributions.blocking_fanout,
    });

    candidates.retain(|f| f.contribution + THRESHOLD_EPSILON >= config.materiality);
    candidates.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

    let mut reasons: Vec<Reason> = if candidates.is_empty() {
        vec![Reason::LowSignal(strategy)]
    } else {
        candidates.into_iter().map(Reason::Factor).collect()
    };
    reasons.extend(notes.iter().cloned().map(Reason::Note));
    reasons
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factor(factor) => fmt::Display::fmt(factor, f),
            Self::LowSignal(Strategy::Balanced) => f.write_str(
                "No strong prioritization signal; default balanced scoring applied",
            ),
            Self::LowSignal(strategy) => write!(
                f,
                "No strong prioritization signal; {strategy} scoring applied"
            ),
            Self::Note(note) => fmt::Display::fmt(note, f),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            FactorDetail::Deadline { days_until_due } => match *days_until_due {
                d if d < 0 => write!(
                    f,
                    "Overdue by {} — maximum urgency",
                    plural(d.unsigned_abs(), "day")
                ),
                0 => f.write_str("Due today — maximum urgency"),
                d => {
                    let level = if self.sub_score >= 0.75 {
                        "high"
                    } else if self.sub_score >= 0.4 {
                        "moderate"
                    } else {
                        "low"
                    };
                    write!(
                        f,
                        "Due in {} — {level} urgency",
                        plural(d.unsigned_abs(), "day")
                    )
                }
            },
            FactorDetail::Importance { importance } => {
                let level = match importance {
                    8.. => "High",
                    5..=7 => "Moderate",
                    _ => "Low",
                };
                write!(f, "{level} importance ({importance}/10)")
            }
            FactorDetail::DependencyChain {
                depth: 0,
                upstream_hours,
            } => write!(
                f,
                "Carries {}h of work on the critical path",
                format_hours(*upstream_hours)
            ),
            FactorDetail::DependencyChain {
                depth,
                upstream_hours,
            } => write!(
                f,
                "{} in a {}dependency chain totaling {}h of upstream work",
                ordinal(depth + 1),
                if *depth >= LONG_CHAIN_DEPTH { "long " } else { "" },
                format_hours(*upstream_hours)
            ),
            FactorDetail::Blocking { descendants } => write!(
                f,
                "Blocks {} other {}",
                descendants,
                if *descendants == 1 { "task" } else { "tasks" }
            ),
        }
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn format_hours(hours: f64) -> String {
    let text = format!("{hours:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
