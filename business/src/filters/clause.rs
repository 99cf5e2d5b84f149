//! Active filter values. Clauses that share a `filter_id` are alternatives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ustr::Ustr;

use super::Relation;

/// Filter id of the lower bound written by a date range selection.
pub const START_DATE: &str = "start_date";
/// Filter id of the upper bound written by a date range selection.
pub const END_DATE: &str = "end_date";

/// One active `(filter_id, option_id)` constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub filter_id: Ustr,
    pub option_id: Ustr,
    /// Full object behind the option, e.g. the selected user, for chip rendering.
    pub option_data: Option<serde_json::Value>,
}

impl FilterClause {
    pub fn new(filter_id: &str, option_id: &str) -> Self {
        Self {
            filter_id: Ustr::from(filter_id),
            option_id: Ustr::from(option_id),
            option_data: None,
        }
    }

    /// Attaches the picked object, such as a whole user.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.option_data = Some(data);
        self
    }

    /// Clause identity is the `(filter_id, option_id)` pair.
    pub fn matches(&self, filter_id: &str, option_id: &str) -> bool {
        self.filter_id.as_str() == filter_id && self.option_id.as_str() == option_id
    }

    pub fn is_date_bound(&self) -> bool {
        is_date_bound(self.filter_id.as_str())
    }
}

pub(crate) fn is_date_bound(filter_id: &str) -> bool {
    filter_id == START_DATE || filter_id == END_DATE
}

/// A user returned by the directory search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRef {
    /// Name, else email, else id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email.as_deref().unwrap_or(&self.id)
        } else {
            &self.name
        }
    }
}

/// All clauses of one filter id, combined with an explicit relation.
///
/// `values` are alternatives: a row matches when it matches any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    pub filter_id: Ustr,
    pub relation: Relation,
    pub values: Vec<Ustr>,
}

/// Groups clauses by filter id, keeping first-seen order of ids and values.
pub fn group_conditions(
    clauses: &[FilterClause],
    relations: &BTreeMap<Ustr, Relation>,
) -> Vec<FilterCondition> {
    let mut conditions: Vec<FilterCondition> = Vec::new();
    for clause in clauses {
        match conditions
            .iter_mut()
            .find(|condition| condition.filter_id == clause.filter_id)
        {
            Some(condition) => {
                if !condition.values.contains(&clause.option_id) {
                    condition.values.push(clause.option_id);
                }
            }
            None => conditions.push(FilterCondition {
                filter_id: clause.filter_id,
                relation: relations.get(&clause.filter_id).copied().unwrap_or_default(),
                values: vec![clause.option_id],
            }),
        }
    }
    conditions
}
