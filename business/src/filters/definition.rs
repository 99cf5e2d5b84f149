//! Static description of the filters a view offers.

use serde::{Deserialize, Serialize};
use ustr::Ustr;

/// Comparison a filter applies to its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    #[default]
    Is,
    IsNot,
    Equals,
    Before,
    After,
    Contains,
}

impl Relation {
    /// Operator as sent in `<filter_id>__relation`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsNot => "is_not",
            Self::Equals => "equals",
            Self::Before => "before",
            Self::After => "after",
            Self::Contains => "contains",
        }
    }

    /// Human label for the relation selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::Equals => "equals",
            Self::Before => "before",
            Self::After => "after",
            Self::Contains => "contains",
        }
    }
}

/// One selectable value of a component filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub id: Ustr,
    pub label: String,
    pub icon: Option<String>,
}

impl FilterOption {
    pub fn new(id: &str, label: impl Into<String>) -> Self {
        Self {
            id: Ustr::from(id),
            label: label.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// What every selectable definition has in common.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub id: Ustr,
    pub name: String,
    pub icon: Option<String>,
    pub relations: Vec<Relation>,
}

impl FilterField {
    fn new(id: &str, name: impl Into<String>) -> Self {
        Self {
            id: Ustr::from(id),
            name: name.into(),
            icon: None,
            relations: Vec::new(),
        }
    }
}

/// A filterable field offered by a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDefinition {
    /// Fixed list of options.
    Component {
        field: FilterField,
        options: Vec<FilterOption>,
    },
    /// Calendar range, stored as `start_date` / `end_date` clauses.
    DateRange { field: FilterField },
    /// Async user search.
    UserSelect { field: FilterField },
    /// Visual separator in the picker.
    Divider,
}

impl FilterDefinition {
    /// A filter with a fixed list of options.
    pub fn component(id: &str, name: impl Into<String>, options: Vec<FilterOption>) -> Self {
        Self::Component {
            field: FilterField::new(id, name),
            options,
        }
    }

    /// A calendar range filter.
    pub fn date_range(id: &str, name: impl Into<String>) -> Self {
        Self::DateRange {
            field: FilterField::new(id, name),
        }
    }

    /// A filter whose options come from the user directory.
    pub fn user_select(id: &str, name: impl Into<String>) -> Self {
        Self::UserSelect {
            field: FilterField::new(id, name),
        }
    }

    pub fn divider() -> Self {
        Self::Divider
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        if let Some(field) = self.field_mut() {
            field.icon = Some(icon.into());
        }
        self
    }

    /// Operators offered for this filter. The first one is the default.
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        if let Some(field) = self.field_mut() {
            field.relations = relations;
        }
        self
    }

    pub fn field(&self) -> Option<&FilterField> {
        match self {
            Self::Component { field, .. } | Self::DateRange { field } | Self::UserSelect { field } => {
                Some(field)
            }
            Self::Divider => None,
        }
    }

    fn field_mut(&mut self) -> Option<&mut FilterField> {
        match self {
            Self::Component { field, .. } | Self::DateRange { field } | Self::UserSelect { field } => {
                Some(field)
            }
            Self::Divider => None,
        }
    }

    /// `None` for dividers.
    pub fn id(&self) -> Option<Ustr> {
        self.field().map(|field| field.id)
    }

    pub fn name(&self) -> &str {
        self.field().map_or("", |field| field.name.as_str())
    }

    pub fn is_divider(&self) -> bool {
        matches!(self, Self::Divider)
    }

    pub fn relations(&self) -> &[Relation] {
        self.field().map_or(&[], |field| field.relations.as_slice())
    }

    /// First declared relation, `is` when none were declared.
    pub fn default_relation(&self) -> Relation {
        self.relations().first().copied().unwrap_or_default()
    }

    /// Looks up one option of a component filter.
    pub fn options(&self) -> &[FilterOption] {
        match self {
            Self::Component { options, .. } => options,
            Self::DateRange { .. } | Self::UserSelect { .. } | Self::Divider => &[],
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&FilterOption> {
        self.options()
            .iter()
            .find(|option| option.id.as_str() == option_id)
    }

    /// Case-insensitive match against the name and, for components, option labels.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        match self {
            Self::Divider => false,
            Self::Component { field, options } => {
                field.name.to_lowercase().contains(&query)
                    || options
                        .iter()
                        .any(|option| option.label.to_lowercase().contains(&query))
            }
            Self::DateRange { field } | Self::UserSelect { field } => {
                field.name.to_lowercase().contains(&query)
            }
        }
    }
}

/// First definition with `filter_id`. Dividers never match.
pub fn find_definition<'a>(
    definitions: &'a [FilterDefinition],
    filter_id: &str,
) -> Option<&'a FilterDefinition> {
    definitions
        .iter()
        .find(|definition| definition.id().is_some_and(|id| id.as_str() == filter_id))
}
