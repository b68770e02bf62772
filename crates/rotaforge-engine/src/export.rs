//! Result exporters turning an assignment into a schedule table.

use std::fmt;

use rotaforge_core::ProblemSpecification;
use serde::Serialize;

use crate::assignment::Assignment;

/// A pure function from an assignment to some output. Nothing flows back into the
/// engine.
pub trait ResultExporter {
    type Output;

    fn export(&self, assignment: &Assignment, spec: &ProblemSpecification) -> Self::Output;
}

/// One row of the detailed assignment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub entity: String,
    pub day: Option<i64>,
    pub slot: String,
}

/// Detailed assignment list plus a day by entity summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleTable {
    pub rows: Vec<ScheduleRow>,
    pub entities: Vec<String>,
    /// Day labels of the summary, one per summary row.
    pub days: Vec<String>,
    /// `summary[day][entity]`: slot labels joined by `/`, or the rest label.
    pub summary: Vec<Vec<String>>,
}

impl ScheduleTable {
    pub fn cell(&self, day: usize, entity: &str) -> Option<&str> {
        let column = self.entities.iter().position(|e| e == entity)?;
        self.summary.get(day)?.get(column).map(String::as_str)
    }
}

impl fmt::Display for ScheduleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity_width = self.rows.iter().map(|r| r.entity.len()).max().unwrap_or(0).max(6);
        writeln!(f, "{:<entity_width$}  {:>4}  slot", "entity", "day")?;
        for row in &self.rows {
            let day = row.day.map(|d| d.to_string()).unwrap_or_default();
            writeln!(f, "{:<entity_width$}  {:>4}  {}", row.entity, day, row.slot)?;
        }

        if self.summary.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        let label_width = self.days.iter().map(String::len).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| {
                self.summary
                    .iter()
                    .filter_map(|r| r.get(i).map(String::len))
                    .chain(std::iter::once(e.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        write!(f, "{:<label_width$}", "")?;
        for (entity, width) in self.entities.iter().zip(&widths) {
            write!(f, "  {:<width$}", entity, width = *width)?;
        }
        writeln!(f)?;
        for (label, cells) in self.days.iter().zip(&self.summary) {
            write!(f, "{:<label_width$}", label)?;
            for (cell, width) in cells.iter().zip(&widths) {
                write!(f, "  {:<width$}", cell, width = *width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Builds a [`ScheduleTable`].
#[derive(Debug, Clone)]
pub struct TableExporter {
    rest_label: String,
}

impl Default for TableExporter {
    fn default() -> Self {
        Self {
            rest_label: "Rest".to_string(),
        }
    }
}

impl TableExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for summary cells without an assignment.
    pub fn with_rest_label(mut self, label: impl Into<String>) -> Self {
        self.rest_label = label.into();
        self
    }
}

impl ResultExporter for TableExporter {
    type Output = ScheduleTable;

    fn export(&self, assignment: &Assignment, spec: &ProblemSpecification) -> ScheduleTable {
        let horizon = spec.horizon();
        let shifts = assignment.shifts();

        let rows: Vec<ScheduleRow> = shifts
            .iter()
            .map(|s| {
                let slot = match (s.slot, &s.container) {
                    (Some(slot), _) => horizon.slot_label(slot as usize),
                    (None, Some(container)) => container.clone(),
                    (None, None) => String::new(),
                };
                ScheduleRow {
                    entity: s.entity.clone(),
                    day: s.day,
                    slot,
                }
            })
            .collect();

        // Columns come from the entity list holding the assigned ids.
        let entities: Vec<String> = rows
            .first()
            .and_then(|row| {
                spec.entity_lists()
                    .values()
                    .find(|ids| ids.contains(&row.entity))
            })
            .or_else(|| spec.entity_lists().values().next())
            .cloned()
            .unwrap_or_default();

        let mut days = Vec::new();
        let mut summary = Vec::new();
        if rows.iter().any(|r| r.day.is_some()) {
            for day in 0..horizon.day_count {
                days.push(format!("Day {}", day + 1));
                let cells = entities
                    .iter()
                    .map(|entity| {
                        let slots: Vec<&str> = rows
                            .iter()
                            .filter(|r| r.entity == *entity && r.day == Some(day as i64))
                            .map(|r| r.slot.as_str())
                            .collect();
                        if slots.is_empty() {
                            self.rest_label.clone()
                        } else {
                            slots.join("/")
                        }
                    })
                    .collect();
                summary.push(cells);
            }
        }

        ScheduleTable {
            rows,
            entities,
            days,
            summary,
        }
    }
}
