//! In-memory search and sort over a cached document collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Sortable document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Number,
    CaseNumber,
    Name,
    Code,
    Date,
    Scope,
    Link,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Number => "number",
            SortField::CaseNumber => "caseNumber",
            SortField::Name => "name",
            SortField::Code => "code",
            SortField::Date => "date",
            SortField::Scope => "scope",
            SortField::Link => "link",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    /// Value of this field on `doc`.
    pub fn value<'a>(&self, doc: &'a Document) -> &'a str {
        match self {
            SortField::Number => &doc.number,
            SortField::CaseNumber => &doc.case_number,
            SortField::Name => &doc.name,
            SortField::Code => &doc.code,
            SortField::Date => &doc.date,
            SortField::Scope => &doc.scope,
            SortField::Link => &doc.link,
            SortField::CreatedAt => &doc.created_at,
            SortField::UpdatedAt => &doc.updated_at,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    /// Accepts the JSON key (`caseNumber`) or its snake/kebab spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "number" => Ok(SortField::Number),
            "casenumber" => Ok(SortField::CaseNumber),
            "name" => Ok(SortField::Name),
            "code" => Ok(SortField::Code),
            "date" => Ok(SortField::Date),
            "scope" => Ok(SortField::Scope),
            "link" => Ok(SortField::Link),
            "createdat" => Ok(SortField::CreatedAt),
            "updatedat" => Ok(SortField::UpdatedAt),
            _ => Err(format!("unknown sort field '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Current sort of the client cache. `field` is `None` until the first sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl SortState {
    /// Re-selecting the current field flips direction; a new field starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == Some(field) {
            self.direction = self.direction.reversed();
        } else {
            self.field = Some(field);
            self.direction = SortDirection::Asc;
        }
    }
}

/// Case-insensitive substring match on name, scope or code.
///
/// An empty query returns every document.
pub fn search<'a>(documents: &'a [Document], query: &str) -> Vec<&'a Document> {
    if query.is_empty() {
        return documents.iter().collect();
    }

    let needle = query.to_lowercase();
    documents
        .iter()
        .filter(|doc| {
            [&doc.name, &doc.scope, &doc.code]
                .iter()
                .any(|value| value.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable in-place sort by one field. Empty values compare as the empty
/// string, so they come first when ascending.
pub fn sort_documents(documents: &mut [Document], field: SortField, direction: SortDirection) {
    documents.sort_by(|a, b| {
        let ordering = field.value(a).cmp(field.value(b));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, name: &str, code: &str) -> Document {
        Document {
            id: id.into(),
            name: name.into(),
            code: code.into(),
            scope: "Общая".into(),
            ..Default::default()
        }
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_toggle_direction() {
        let mut state = SortState::default();
        assert_eq!(state.field, None);

        state.toggle(SortField::Name);
        assert_eq!(state.field, Some(SortField::Name));
        assert_eq!(state.direction, SortDirection::Asc);

        state.toggle(SortField::Name);
        assert_eq!(state.direction, SortDirection::Desc);

        state.toggle(SortField::Code);
        assert_eq!(state.field, Some(SortField::Code));
        assert_eq!(state.direction, SortDirection::Asc);
    }

    #[test]
    fn test_blanks_sort_first_ascending() {
        let mut docs = vec![doc("a", "A", "Z-1"), doc("b", "B", ""), doc("c", "C", "A-1")];
        sort_documents(&mut docs, SortField::Code, SortDirection::Asc);
        assert_eq!(ids(&docs), vec!["b", "c", "a"]);

        sort_documents(&mut docs, SortField::Code, SortDirection::Desc);
        assert_eq!(ids(&docs), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut docs = vec![
            doc("1", "Same", "x"),
            doc("2", "Other", "x"),
            doc("3", "Same", "x"),
        ];
        sort_documents(&mut docs, SortField::Code, SortDirection::Asc);
        assert_eq!(ids(&docs), vec!["1", "2", "3"]);

        sort_documents(&mut docs, SortField::Name, SortDirection::Desc);
        assert_eq!(ids(&docs), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_sort_is_lexicographic() {
        let mut docs = vec![doc("ten", "10", ""), doc("nine", "9", ""), doc("one", "1", "")];
        sort_documents(&mut docs, SortField::Name, SortDirection::Asc);
        assert_eq!(ids(&docs), vec!["one", "ten", "nine"]);
    }

    #[test]
    fn test_search_case_insensitive_cyrillic() {
        let docs = vec![
            doc("1", "Программа «Прогресс»", "П-1"),
            doc("2", "Регламент", "Р-2"),
        ];
        let found = search(&docs, "прогресс");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");

        let found = search(&docs, "PROG");
        assert!(found.is_empty());
    }

    #[test]
    fn test_search_matches_any_of_three_fields() {
        let mut by_scope = doc("scope", "Нет", "");
        by_scope.scope = "Progress department".into();
        let docs = vec![
            doc("name", "Progress report", ""),
            by_scope,
            doc("code", "Нет", "PROG-7"),
            doc("none", "Нет", ""),
        ];
        let found: Vec<&str> = search(&docs, "prog").iter().map(|d| d.id.as_str()).collect();
        assert_eq!(found, vec!["name", "scope", "code"]);
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let docs = vec![doc("1", "A", ""), doc("2", "B", "")];
        assert_eq!(search(&docs, "").len(), 2);
    }

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!("caseNumber".parse::<SortField>(), Ok(SortField::CaseNumber));
        assert_eq!("case-number".parse::<SortField>(), Ok(SortField::CaseNumber));
        assert_eq!("updated_at".parse::<SortField>(), Ok(SortField::UpdatedAt));
        assert!("bogus".parse::<SortField>().is_err());
        assert_eq!(SortField::CaseNumber.to_string(), "caseNumber");
    }
}
