//! Cascading Region → District → Territory filter.
//!
//! The transition and derivation logic lives in free functions over
//! [`Selection`] so it can be driven without any UI attached:
//! - [`apply`] moves one selector and invalidates everything below it,
//! - [`options_for`] derives the valid choices for a level,
//! - [`filter`], [`drill_level`] and [`scope_label`] read a selection.
//!
//! [`HierarchicalFilterState`] owns the dataset plus the current selection
//! and returns a [`FilterUpdate`] after every change so a presentation
//! layer can repopulate its selectors.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{DrillLevel, HierarchyId, Level, LevelValue, Row, Selection};

/// Choices for one selector. A level with no choices is disabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelOptions {
    pub level: Level,
    pub enabled: bool,
    pub options: Vec<HierarchyId>,
}

/// Result of a selection change: the new selection and the option sets of
/// every level the change could have affected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterUpdate {
    pub selection: Selection,
    pub refreshed: Vec<LevelOptions>,
}

/// Sorted, de-duplicated choices for `level` under the ancestors set in
/// `selection`. District and territory are empty until their parent is set.
pub fn options_for(rows: &[Row], level: Level, selection: &Selection) -> Vec<HierarchyId> {
    let selection = selection.sanitized();
    match level {
        Level::Region => distinct(rows.iter().map(|r| &r.region)),
        Level::District => match &selection.region {
            LevelValue::All => Vec::new(),
            LevelValue::Only(region) => distinct(
                rows.iter()
                    .filter(|r| &r.region == region)
                    .map(|r| &r.district),
            ),
        },
        Level::Territory => match &selection.district {
            LevelValue::All => Vec::new(),
            LevelValue::Only(district) => distinct(
                rows.iter()
                    .filter(|r| selection.region.matches(&r.region) && &r.district == district)
                    .map(|r| &r.territory),
            ),
        },
    }
}

fn distinct<'a>(ids: impl Iterator<Item = &'a HierarchyId>) -> Vec<HierarchyId> {
    ids.collect::<BTreeSet<_>>().into_iter().cloned().collect()
}

/// Sets `level` to `value` and resets every level below it to `all`.
///
/// A concrete district under `region = all`, or a concrete territory under
/// `district = all`, has no valid ancestor; such a value is dropped and the
/// level stays `all`. The value is otherwise not checked against the
/// current option set.
pub fn apply(level: Level, value: LevelValue, selection: &Selection) -> Selection {
    let mut next = selection.sanitized();
    let orphaned = level
        .parent()
        .map(|parent| next.get(parent).is_all() && !value.is_all())
        .unwrap_or(false);
    if orphaned {
        warn!(%level, %value, "ignoring selection without a parent; keeping all");
    }
    let value = if orphaned { LevelValue::All } else { value };

    match level {
        Level::Region => {
            next.region = value;
            next.district = LevelValue::All;
            next.territory = LevelValue::All;
        }
        Level::District => {
            next.district = value;
            next.territory = LevelValue::All;
        }
        Level::Territory => {
            next.territory = value;
        }
    }
    debug!(
        %level,
        region = %next.region,
        district = %next.district,
        territory = %next.territory,
        "filter transition"
    );
    next
}

pub fn reset() -> Selection {
    Selection::default()
}

pub fn drill_level(selection: &Selection) -> DrillLevel {
    if !selection.territory.is_all() {
        DrillLevel::Territory
    } else if !selection.district.is_all() {
        DrillLevel::District
    } else if !selection.region.is_all() {
        DrillLevel::Region
    } else {
        DrillLevel::Company
    }
}

/// Rows matching every set level, in input order.
pub fn filter<'a, I>(rows: I, selection: &Selection) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter().filter(|r| selection.matches(r)).collect()
}

/// Breadcrumb such as `Region 1 → District 4`; `None` at company scope.
pub fn scope_label(selection: &Selection) -> Option<String> {
    let region = selection.region.id()?;
    let mut label = Level::Region.option_label(region);
    if let Some(district) = selection.district.id() {
        label.push_str(" → ");
        label.push_str(&Level::District.option_label(district));
    }
    if let Some(territory) = selection.territory.id() {
        label.push_str(" → ");
        label.push_str(&Level::Territory.option_label(territory));
    }
    Some(label)
}

pub struct HierarchicalFilterState {
    rows: Vec<Row>,
    current: Selection,
}

impl HierarchicalFilterState {
    pub fn new(rows: Vec<Row>) -> Self {
        HierarchicalFilterState {
            rows,
            current: Selection::default(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn current(&self) -> &Selection {
        &self.current
    }

    pub fn options_for(&self, level: Level, selection: &Selection) -> Vec<HierarchyId> {
        options_for(&self.rows, level, selection)
    }

    pub fn level_options(&self, level: Level) -> LevelOptions {
        let options = self.options_for(level, &self.current);
        LevelOptions {
            level,
            enabled: !options.is_empty(),
            options,
        }
    }

    /// Option sets for all three selectors under the current selection.
    pub fn snapshot(&self) -> Vec<LevelOptions> {
        Level::ALL.iter().map(|l| self.level_options(*l)).collect()
    }

    /// Handles a "level changed to value" event.
    pub fn select(&mut self, level: Level, value: LevelValue) -> FilterUpdate {
        self.current = apply(level, value, &self.current);
        FilterUpdate {
            selection: self.current.clone(),
            refreshed: level
                .descendants()
                .into_iter()
                .map(|l| self.level_options(l))
                .collect(),
        }
    }

    pub fn reset_current(&mut self) -> FilterUpdate {
        self.current = reset();
        FilterUpdate {
            selection: self.current.clone(),
            refreshed: Level::Region
                .descendants()
                .into_iter()
                .map(|l| self.level_options(l))
                .collect(),
        }
    }

    pub fn current_drill_level(&self) -> DrillLevel {
        drill_level(&self.current)
    }

    pub fn current_rows(&self) -> Vec<&Row> {
        filter(&self.rows, &self.current)
    }

    pub fn current_scope_label(&self) -> Option<String> {
        scope_label(&self.current)
    }
}
