//! Document model: one regulatory-document metadata entry.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A document record as held by the authoritative store.
///
/// `id`, `created_at` and `updated_at` are assigned by the store and never
/// chosen by a client. Text fields missing from stored JSON read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Display sequence, kept as text to preserve formatting
    pub number: String,
    pub case_number: String,
    pub name: String,
    pub code: String,
    /// Approval date in `DD.MM.YYYY` display form, not validated
    pub date: String,
    pub scope: String,
    /// URL or plain label
    pub link: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// Whether the link looks like something a browser can open.
    pub fn has_url_link(&self) -> bool {
        self.link.starts_with("http://") || self.link.starts_with("https://")
    }

    /// Record written to a fresh store on its first read.
    pub fn sample(id: String, timestamp: String) -> Self {
        Self {
            id,
            number: "1".to_string(),
            case_number: "01-05".to_string(),
            name: "Политика в области качества".to_string(),
            code: "П-01".to_string(),
            date: "15.01.2024".to_string(),
            scope: "Все подразделения".to_string(),
            link: "https://example.com/docs/quality-policy".to_string(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }
}

/// Request body for creating a document; also the shape of an imported CSV row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub case_number: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub date: String,
    pub scope: String,
    #[serde(default)]
    pub link: String,
}

impl NewDocument {
    /// Check the required free-text fields.
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("name", &self.name)?;
        require_text("scope", &self.scope)
    }

    /// Materialise a stored record with store-assigned identity and timestamps.
    pub fn into_document(self, id: String, timestamp: String) -> Document {
        Document {
            id,
            number: self.number,
            case_number: self.case_number,
            name: self.name,
            code: self.code,
            date: self.date,
            scope: self.scope,
            link: self.link,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }
}

impl From<&Document> for NewDocument {
    fn from(doc: &Document) -> Self {
        Self {
            number: doc.number.clone(),
            case_number: doc.case_number.clone(),
            name: doc.name.clone(),
            code: doc.code.clone(),
            date: doc.date.clone(),
            scope: doc.scope.clone(),
            link: doc.link.clone(),
        }
    }
}

/// Request body for updating a document. Absent fields are left as stored.
///
/// Identity and timestamps are not part of the patch; if a client sends
/// them they are dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl DocumentPatch {
    /// Reject patches that would blank out a required field.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(scope) = &self.scope {
            require_text("scope", scope)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Shallow field-level overwrite of `doc` with the fields present here.
    pub fn apply_to(&self, doc: &mut Document) {
        let fields = [
            (&self.number, &mut doc.number),
            (&self.case_number, &mut doc.case_number),
            (&self.name, &mut doc.name),
            (&self.code, &mut doc.code),
            (&self.date, &mut doc.date),
            (&self.scope, &mut doc.scope),
            (&self.link, &mut doc.link),
        ];
        for (patch, target) in fields {
            if let Some(value) = patch {
                target.clone_from(value);
            }
        }
    }
}

impl From<NewDocument> for DocumentPatch {
    fn from(doc: NewDocument) -> Self {
        Self {
            number: Some(doc.number),
            case_number: Some(doc.case_number),
            name: Some(doc.name),
            code: Some(doc.code),
            date: Some(doc.date),
            scope: Some(doc.scope),
            link: Some(doc.link),
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Field '{}' is required", field)));
    }
    Ok(())
}

/// Current time in the store's timestamp format (RFC 3339, millis, `Z`).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
