//! Batch validation.
//!
//! Turns a raw JSON batch into [`ValidatedTask`]s. Field-level problems are
//! corrected and recorded as [`Note`]s; only a batch that is not an array of
//! objects is rejected.

use crate::task::{Note, Task, UNTITLED_TASK, ValidatedTask};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use taskrank_graph::TaskKey;
use tracing::{debug, warn};

const DEFAULT_IMPORTANCE: u8 = 5;
const DEFAULT_HOURS: f64 = 1.0;
/// Largest accepted estimate. Keeps chain sums finite on any realistic batch.
pub const MAX_HOURS: f64 = 100_000.0;
const MIN_IMPORTANCE: i64 = 1;
const MAX_IMPORTANCE: i64 = 10;

/// Validate a raw batch.
///
/// Tasks come back in input order, duplicates included; duplicates carry a
/// non-primary [`TaskKey`].
///
/// # Errors
///
/// Returns [`Error::MalformedBatch`] if `batch` is not an array or any entry
/// is not an object.
pub fn validate_batch(batch: &Value) -> Result<Vec<ValidatedTask>> {
    let Some(entries) = batch.as_array() else {
        warn!(kind = json_kind(batch), "Rejected batch that is not an array");
        return Err(Error::malformed_batch(format!(
            "expected an array of task records, found {}",
            json_kind(batch)
        )));
    };

    let records: Vec<&Map<String, Value>> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.as_object().ok_or_else(|| {
                Error::malformed_batch(format!(
                    "entry {index} is {}, not a task record",
                    json_kind(entry)
                ))
            })
        })
        .collect::<Result<_>>()?;

    let ids = assign_ids(&records);
    let present: HashSet<i64> = ids.iter().map(|(id, _)| *id).collect();

    let mut occurrences: HashMap<i64, u32> = HashMap::new();
    for (id, _) in &ids {
        *occurrences.entry(*id).or_default() += 1;
    }

    let mut seen: HashMap<i64, u32> = HashMap::new();
    let validated: Vec<ValidatedTask> = records
        .iter()
        .zip(ids)
        .map(|(record, (id, assigned))| {
            let occurrence = seen.entry(id).or_default();
            let key = TaskKey::new(id, *occurrence);
            *occurrence += 1;

            let mut notes = Vec::new();
            if assigned {
                notes.push(Note::IdAssigned { id });
            }
            if occurrences.get(&id).copied().unwrap_or(0) > 1 {
                notes.push(Note::DuplicateId { id });
            }
            let task = validate_record(id, record, &present, &mut notes);

            ValidatedTask {
                key,
                task,
                notes,
                has_circular_dependency: false,
            }
        })
        .collect();

    debug!(
        tasks = validated.len(),
        distinct = occurrences.len(),
        notes = validated.iter().map(|v| v.notes.len()).sum::<usize>(),
        "Validated batch"
    );

    Ok(validated)
}

/// Resolve every record's id. Records without a usable id get fresh ids
/// above the batch maximum, in input order. Once that range is exhausted
/// the smallest unused positive id is taken instead.
fn assign_ids(records: &[&Map<String, Value>]) -> Vec<(i64, bool)> {
    let given: Vec<Option<i64>> = records
        .iter()
        .map(|record| record.get("id").and_then(as_integer))
        .collect();
    let mut used: HashSet<i64> = given.iter().flatten().copied().collect();
    let mut above = given.iter().flatten().max().copied().unwrap_or(0);
    let mut lowest = 1_i64;

    given
        .into_iter()
        .map(|id| {
            if let Some(id) = id {
                return (id, false);
            }
            let fresh = if let Some(next) = above.checked_add(1) {
                above = next;
                next
            } else {
                while used.contains(&lowest) {
                    lowest += 1;
                }
                lowest
            };
            used.insert(fresh);
            (fresh, true)
        })
        .collect()
}

fn validate_record(
    id: i64,
    record: &Map<String, Value>,
    present: &HashSet<i64>,
    notes: &mut Vec<Note>,
) -> Task {
    let title = match record.get("title").and_then(Value::as_str) {
        Some(title) if !title.trim().is_empty() => title.to_string(),
        _ => {
            notes.push(Note::UntitledTask);
            UNTITLED_TASK.to_string()
        }
    };

    let due_date = match record.get("due_date") {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let parsed = raw.as_str().and_then(parse_date);
            if parsed.is_none() {
                notes.push(Note::InvalidDueDate {
                    raw: display_raw(raw),
                });
            }
            parsed
        }
    };

    let importance = match record.get("importance").and_then(as_real) {
        Some(value) => clamp_importance(value, notes),
        None => {
            notes.push(Note::ImportanceDefaulted {
                value: DEFAULT_IMPORTANCE,
            });
            DEFAULT_IMPORTANCE
        }
    };

    let estimated_hours = match record.get("estimated_hours").and_then(as_real) {
        Some(hours) if hours < 0.0 => {
            notes.push(Note::HoursClamped { given: hours });
            0.0
        }
        Some(hours) if hours > MAX_HOURS => {
            notes.push(Note::HoursCapped {
                given: hours,
                cap: MAX_HOURS,
            });
            MAX_HOURS
        }
        Some(hours) => hours,
        None => {
            notes.push(Note::HoursDefaulted {
                value: DEFAULT_HOURS,
            });
            DEFAULT_HOURS
        }
    };

    let dependencies = validate_dependencies(id, record.get("dependencies"), present, notes);

    Task {
        id,
        title,
        due_date,
        estimated_hours,
        importance,
        dependencies,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_importance(value: f64, notes: &mut Vec<Note>) -> u8 {
    let rounded = value.round();
    // Values beyond i64 saturate, which still clamps correctly below
    let given = rounded as i64;
    let clamped = given.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE);
    if clamped != given {
        notes.push(Note::ImportanceClamped {
            given,
            clamped: clamped as u8,
        });
    }
    clamped as u8
}

fn validate_dependencies(
    id: i64,
    raw: Option<&Value>,
    present: &HashSet<i64>,
    notes: &mut Vec<Note>,
) -> Vec<i64> {
    let entries: &[Value] = match raw {
        None | Some(Value::Null) => &[],
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            notes.push(Note::InvalidDependency {
                raw: display_raw(other),
            });
            &[]
        }
    };

    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    for entry in entries {
        let Some(dep) = as_integer(entry) else {
            notes.push(Note::InvalidDependency {
                raw: display_raw(entry),
            });
            continue;
        };
        if !seen.insert(dep) {
            continue;
        }
        if dep == id {
            notes.push(Note::SelfDependency);
        } else if !present.contains(&dep) {
            notes.push(Note::DanglingDependency { id: dep });
        } else {
            dependencies.push(dep);
        }
    }
    dependencies
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Integers, integral floats and numeric strings (form fields arrive as text).
#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Finite numbers and numeric strings.
fn as_real(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|f: &f64| f.is_finite())
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(batch: Value) -> Vec<ValidatedTask> {
        validate_batch(&batch).unwrap()
    }

    fn notes_of(task: &ValidatedTask) -> Vec<String> {
        task.notes.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_well_formed_task_has_no_notes() {
        let tasks = validate(json!([{
            "id": 1,
            "title": "Write report",
            "due_date": "2024-03-10",
            "estimated_hours": 3.5,
            "importance": 7,
            "dependencies": []
        }]));

        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert!(t.notes.is_empty());
        assert_eq!(t.key, TaskKey::primary(1));
        assert_eq!(t.task.title, "Write report");
        assert_eq!(t.task.due_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert!((t.task.estimated_hours - 3.5).abs() < f64::EPSILON);
        assert_eq!(t.task.importance, 7);
    }

    #[test]
    fn test_empty_batch() {
        assert!(validate(json!([])).is_empty());
    }

    #[test]
    fn test_non_array_batch_is_rejected() {
        let err = validate_batch(&json!({"tasks": []})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed task batch: expected an array of task records, found an object"
        );
    }

    #[test]
    fn test_non_object_entry_is_rejected() {
        let err = validate_batch(&json!([{"id": 1}, 42])).unwrap_err();
        assert!(matches!(err, Error::MalformedBatch { .. }));
        assert!(err.to_string().contains("entry 1 is a number"));
    }

    #[test]
    fn test_blank_title_replaced() {
        let tasks = validate(json!([
            {"id": 1, "title": "   ", "estimated_hours": 1, "importance": 5},
            {"id": 2, "estimated_hours": 1, "importance": 5}
        ]));
        for t in &tasks {
            assert_eq!(t.task.title, UNTITLED_TASK);
            assert_eq!(t.notes, vec![Note::UntitledTask]);
        }
    }

    #[test]
    fn test_missing_due_date_is_not_noted() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "due_date": null, "estimated_hours": 1, "importance": 5}
        ]));
        assert_eq!(tasks[0].task.due_date, None);
        assert!(tasks[0].notes.is_empty());
    }

    #[test]
    fn test_invalid_due_date_is_noted() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "due_date": "next week", "estimated_hours": 1, "importance": 5}
        ]));
        assert_eq!(tasks[0].task.due_date, None);
        assert_eq!(
            notes_of(&tasks[0]),
            vec!["due date 'next week' is not a valid date; treated as no deadline"]
        );
    }

    #[test]
    fn test_rfc3339_due_date() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "due_date": "2024-03-10T17:30:00Z", "estimated_hours": 1, "importance": 5}
        ]));
        assert_eq!(tasks[0].task.due_date, NaiveDate::from_ymd_opt(2024, 3, 10));
    }

    #[test]
    fn test_importance_clamped() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": 1, "importance": 14},
            {"id": 2, "title": "b", "estimated_hours": 1, "importance": -3},
            {"id": 3, "title": "c", "estimated_hours": 1, "importance": "8"}
        ]));
        assert_eq!(tasks[0].task.importance, 10);
        assert_eq!(notes_of(&tasks[0]), vec!["importance 14 clamped to 10"]);
        assert_eq!(tasks[1].task.importance, 1);
        assert_eq!(notes_of(&tasks[1]), vec!["importance -3 clamped to 1"]);
        assert_eq!(tasks[2].task.importance, 8);
        assert!(tasks[2].notes.is_empty());
    }

    #[test]
    fn test_missing_importance_and_hours_use_defaults() {
        let tasks = validate(json!([{"id": 1, "title": "a"}]));
        assert_eq!(tasks[0].task.importance, 5);
        assert!((tasks[0].task.estimated_hours - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            notes_of(&tasks[0]),
            vec![
                "importance missing; defaulted to 5",
                "estimated hours missing; defaulted to 1h"
            ]
        );
    }

    #[test]
    fn test_negative_hours_clamped() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": -2, "importance": 5}
        ]));
        assert!(tasks[0].task.estimated_hours.abs() < f64::EPSILON);
        assert_eq!(notes_of(&tasks[0]), vec!["estimated hours -2 clamped to 0"]);
    }

    #[test]
    fn test_dangling_and_self_dependencies_dropped() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": 1, "importance": 5, "dependencies": [1, 2, 99]},
            {"id": 2, "title": "b", "estimated_hours": 1, "importance": 5}
        ]));
        assert_eq!(tasks[0].task.dependencies, vec![2]);
        assert_eq!(
            notes_of(&tasks[0]),
            vec![
                "self-dependency ignored",
                "dependency #99 ignored: not found in batch"
            ]
        );
    }

    #[test]
    fn test_dependency_entries_deduplicated_and_typed() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": 1, "importance": 5},
            {"id": 2, "title": "b", "estimated_hours": 1, "importance": 5,
             "dependencies": [1, "1", 1.0, "x"]}
        ]));
        assert_eq!(tasks[1].task.dependencies, vec![1]);
        assert_eq!(
            notes_of(&tasks[1]),
            vec!["dependency entry 'x' ignored: not a task id"]
        );
    }

    #[test]
    fn test_non_array_dependencies() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": 1, "importance": 5, "dependencies": "2"}
        ]));
        assert!(tasks[0].task.dependencies.is_empty());
        assert_eq!(
            notes_of(&tasks[0]),
            vec!["dependency entry '2' ignored: not a task id"]
        );
    }

    #[test]
    fn test_duplicate_ids_flagged_on_both() {
        let tasks = validate(json!([
            {"id": 7, "title": "first", "estimated_hours": 1, "importance": 5},
            {"id": 7, "title": "second", "estimated_hours": 1, "importance": 5},
            {"id": 8, "title": "third", "estimated_hours": 1, "importance": 5, "dependencies": [7]}
        ]));

        assert_eq!(tasks[0].key, TaskKey::primary(7));
        assert_eq!(tasks[1].key, TaskKey::new(7, 1));
        assert_eq!(tasks[0].notes, vec![Note::DuplicateId { id: 7 }]);
        assert_eq!(tasks[1].notes, vec![Note::DuplicateId { id: 7 }]);
        assert!(tasks[2].notes.is_empty());
        assert_eq!(tasks[2].task.dependencies, vec![7]);
    }

    #[test]
    fn test_missing_ids_assigned_above_maximum() {
        let tasks = validate(json!([
            {"title": "a", "estimated_hours": 1, "importance": 5},
            {"id": 10, "title": "b", "estimated_hours": 1, "importance": 5},
            {"id": "oops", "title": "c", "estimated_hours": 1, "importance": 5}
        ]));
        assert_eq!(tasks[0].task.id, 11);
        assert_eq!(tasks[2].task.id, 12);
        assert_eq!(notes_of(&tasks[0]), vec!["id missing; assigned #11"]);
        assert_eq!(notes_of(&tasks[2]), vec!["id missing; assigned #12"]);
    }

    #[test]
    fn test_missing_ids_fall_back_below_maximum() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": 1, "importance": 5},
            {"id": i64::MAX, "title": "b", "estimated_hours": 1, "importance": 5},
            {"title": "c", "estimated_hours": 1, "importance": 5},
            {"title": "d", "estimated_hours": 1, "importance": 5}
        ]));

        assert_eq!(tasks[2].task.id, 2);
        assert_eq!(tasks[3].task.id, 3);
        assert_eq!(notes_of(&tasks[2]), vec!["id missing; assigned #2"]);
        assert!(tasks.iter().all(|t| t.key.occurrence() == 0));
        assert!(tasks[1].notes.is_empty());
    }

    #[test]
    fn test_huge_hours_capped() {
        let tasks = validate(json!([
            {"id": 1, "title": "a", "estimated_hours": 1e308, "importance": 5},
            {"id": 2, "title": "b", "estimated_hours": MAX_HOURS, "importance": 5}
        ]));

        assert!((tasks[0].task.estimated_hours - MAX_HOURS).abs() < f64::EPSILON);
        assert_eq!(
            tasks[0].notes,
            vec![Note::HoursCapped {
                given: 1e308,
                cap: MAX_HOURS
            }]
        );
        assert!(tasks[1].notes.is_empty());
    }
}
