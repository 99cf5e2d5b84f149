//! The list of active filters behind the chips row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ustr::Ustr;

use super::clause::is_date_bound;
use super::{
    END_DATE, FilterClause, FilterCondition, FilterDefinition, Relation, START_DATE, UserRef,
    find_definition, group_conditions,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A mutation produced by the filter picker.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent {
    Option { filter_id: Ustr, option_id: Ustr },
    DateRange { start: NaiveDate, end: NaiveDate },
    User { filter_id: Ustr, user: UserRef },
}

/// How a chip was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipKind {
    Option,
    DateRange,
    User,
    /// The definition or option could not be found; the label is the raw id.
    Unknown,
}

/// Render-ready description of one removable chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub filter_id: Ustr,
    pub option_id: Ustr,
    pub name: String,
    pub label: String,
    pub icon: Option<String>,
    pub kind: ChipKind,
}

/// Ordered list of active clauses plus the relation chosen per filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterModel {
    clauses: Vec<FilterClause>,
    relations: BTreeMap<Ustr, Relation>,
}

impl FilterModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn contains(&self, filter_id: &str, option_id: &str) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.matches(filter_id, option_id))
    }

    /// Applies a picker event. Returns whether the clauses changed.
    pub fn apply(&mut self, event: FilterEvent) -> bool {
        match event {
            FilterEvent::Option {
                filter_id,
                option_id,
            } => self.select_option(&filter_id, &option_id),
            FilterEvent::DateRange { start, end } => self.set_date_range(start, end),
            FilterEvent::User { filter_id, user } => self.select_user(&filter_id, &user),
        }
    }

    /// Adds `(filter_id, option_id)` unless it is already active.
    pub fn select_option(&mut self, filter_id: &str, option_id: &str) -> bool {
        if self.contains(filter_id, option_id) {
            return false;
        }
        self.clauses.push(FilterClause::new(filter_id, option_id));
        true
    }

    /// Replaces every date bound with exactly one `start_date` and one `end_date`.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
        let (start, end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        if self.date_range() == Some((start, end)) {
            return false;
        }
        self.clauses.retain(|clause| !clause.is_date_bound());
        self.clauses.push(FilterClause::new(
            START_DATE,
            &start.format(DATE_FORMAT).to_string(),
        ));
        self.clauses
            .push(FilterClause::new(END_DATE, &end.format(DATE_FORMAT).to_string()));
        true
    }

    /// The active range, when both bounds are present and parse.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let bound = |filter_id: &str| {
            self.clauses
                .iter()
                .find(|clause| clause.filter_id.as_str() == filter_id)
                .and_then(|clause| NaiveDate::parse_from_str(&clause.option_id, DATE_FORMAT).ok())
        };
        Some((bound(START_DATE)?, bound(END_DATE)?))
    }

    /// Adds a clause for `user`, keeping the whole user for the chip label.
    pub fn select_user(&mut self, filter_id: &str, user: &UserRef) -> bool {
        if self.contains(filter_id, &user.id) {
            return false;
        }
        let data = match serde_json::to_value(user) {
            Ok(data) => Some(data),
            Err(err) => {
                log::warn!("Failed to serialize user {} for filter chip: {err}", user.id);
                None
            }
        };
        self.clauses.push(FilterClause {
            filter_id: Ustr::from(filter_id),
            option_id: Ustr::from(user.id.as_str()),
            option_data: data,
        });
        true
    }

    /// Removes exactly the matching pair. Either date bound removes both.
    pub fn remove(&mut self, filter_id: &str, option_id: &str) -> bool {
        let before = self.clauses.len();
        if is_date_bound(filter_id) {
            self.clauses.retain(|clause| !clause.is_date_bound());
        } else {
            self.clauses
                .retain(|clause| !clause.matches(filter_id, option_id));
        }
        self.clauses.len() != before
    }

    /// Drops every clause. Chosen relations stay.
    pub fn clear_all(&mut self) -> bool {
        let changed = !self.clauses.is_empty();
        self.clauses.clear();
        changed
    }

    /// Chooses the operator for `filter_id`. Returns whether it changed.
    pub fn set_relation(&mut self, filter_id: &str, relation: Relation) -> bool {
        self.relations.insert(Ustr::from(filter_id), relation) != Some(relation)
    }

    /// Chosen relation, else the definition's default.
    ///
    /// `start_date` and `end_date` clauses answer to the date range
    /// definition that produced them.
    pub fn relation(&self, filter_id: &str, definitions: &[FilterDefinition]) -> Relation {
        let filter_id = relation_key(filter_id, definitions);
        self.relations
            .get(&filter_id)
            .copied()
            .or_else(|| find_definition(definitions, &filter_id).map(FilterDefinition::default_relation))
            .unwrap_or_default()
    }

    /// Relations of the filters that currently have clauses.
    pub fn active_relations(&self, definitions: &[FilterDefinition]) -> BTreeMap<Ustr, Relation> {
        self.clauses
            .iter()
            .map(|clause| {
                (
                    clause.filter_id,
                    self.relation(&clause.filter_id, definitions),
                )
            })
            .collect()
    }

    /// Clauses grouped per filter with their relation, in first-seen order.
    pub fn conditions(&self, definitions: &[FilterDefinition]) -> Vec<FilterCondition> {
        group_conditions(&self.clauses, &self.active_relations(definitions))
    }

    /// One chip per clause, except that both date bounds share a chip.
    pub fn chips(&self, definitions: &[FilterDefinition]) -> Vec<FilterChip> {
        let mut chips = Vec::with_capacity(self.clauses.len());
        let mut date_chip_done = false;

        for clause in &self.clauses {
            if clause.is_date_bound() {
                if !date_chip_done {
                    date_chip_done = true;
                    chips.push(self.date_range_chip(definitions));
                }
                continue;
            }

            let Some(definition) = find_definition(definitions, &clause.filter_id) else {
                log::warn!(
                    "No filter definition for '{}', showing raw option '{}'",
                    clause.filter_id,
                    clause.option_id
                );
                chips.push(unknown_chip(clause, clause.filter_id.to_string()));
                continue;
            };

            let chip = match definition {
                FilterDefinition::Component { field, .. } => match definition.option(&clause.option_id) {
                    Some(option) => FilterChip {
                        filter_id: clause.filter_id,
                        option_id: clause.option_id,
                        name: field.name.clone(),
                        label: option.label.clone(),
                        icon: option.icon.clone().or_else(|| field.icon.clone()),
                        kind: ChipKind::Option,
                    },
                    None => {
                        log::warn!(
                            "Filter '{}' has no option '{}'",
                            clause.filter_id,
                            clause.option_id
                        );
                        unknown_chip(clause, field.name.clone())
                    }
                },
                FilterDefinition::UserSelect { field } => FilterChip {
                    filter_id: clause.filter_id,
                    option_id: clause.option_id,
                    name: field.name.clone(),
                    label: user_label(clause),
                    icon: field.icon.clone(),
                    kind: ChipKind::User,
                },
                FilterDefinition::DateRange { field } => {
                    log::warn!(
                        "Filter '{}' is a date range but holds option '{}'",
                        clause.filter_id,
                        clause.option_id
                    );
                    unknown_chip(clause, field.name.clone())
                }
                FilterDefinition::Divider => unknown_chip(clause, clause.filter_id.to_string()),
            };
            chips.push(chip);
        }

        chips
    }

    fn date_range_chip(&self, definitions: &[FilterDefinition]) -> FilterChip {
        let definition = definitions
            .iter()
            .find(|definition| matches!(definition, FilterDefinition::DateRange { .. }));
        if definition.is_none() {
            log::warn!("Date range clauses are active but no date range filter is defined");
        }

        let bound = |filter_id: &str| {
            self.clauses
                .iter()
                .find(|clause| clause.filter_id.as_str() == filter_id)
                .map_or_else(|| "…".to_owned(), |clause| clause.option_id.to_string())
        };

        FilterChip {
            filter_id: Ustr::from(START_DATE),
            option_id: Ustr::from(END_DATE),
            name: definition.map_or_else(|| "Date".to_owned(), |d| d.name().to_owned()),
            label: format!("{} – {}", bound(START_DATE), bound(END_DATE)),
            icon: definition.and_then(|d| d.field()).and_then(|field| field.icon.clone()),
            kind: ChipKind::DateRange,
        }
    }
}

/// Id the relation of `filter_id` is stored under.
fn relation_key(filter_id: &str, definitions: &[FilterDefinition]) -> Ustr {
    if is_date_bound(filter_id)
        && let Some(id) = definitions.iter().find_map(|definition| match definition {
            FilterDefinition::DateRange { field } => Some(field.id),
            _ => None,
        })
    {
        return id;
    }
    Ustr::from(filter_id)
}

fn unknown_chip(clause: &FilterClause, name: String) -> FilterChip {
    FilterChip {
        filter_id: clause.filter_id,
        option_id: clause.option_id,
        name,
        label: clause.option_id.to_string(),
        icon: None,
        kind: ChipKind::Unknown,
    }
}

fn user_label(clause: &FilterClause) -> String {
    clause
        .option_data
        .clone()
        .and_then(|data| serde_json::from_value::<UserRef>(data).ok())
        .map_or_else(
            || clause.option_id.to_string(),
            |user| user.display_name().to_owned(),
        )
}
