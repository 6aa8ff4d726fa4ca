//! Request and response payloads of the analysis backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DrXasError;

/// A file shipped with a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    /// File name, the identity of the attachment.
    pub name: String,
    /// File content decoded as UTF-8 (lossy).
    pub content: String,
}

impl FilePayload {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Body of `POST /chat`.
///
/// Built fresh from a session snapshot for every submission and moved into the
/// worker that issues it, so it is never mutated after issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub message: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(rename = "spectrumIds", default)]
    pub spectrum_ids: Vec<String>,
    #[serde(default)]
    pub files: Vec<FilePayload>,
}

impl ChatRequest {
    pub fn new(conversation_id: &str, message: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            message: message.to_string(),
            materials: Vec::new(),
            spectrum_ids: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// The `messages` member of a result, either rows, free text or anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultMessages {
    Rows(Vec<Value>),
    Text(String),
    Other(Value),
}

impl Default for ResultMessages {
    fn default() -> Self {
        ResultMessages::Text(String::new())
    }
}

impl ResultMessages {
    /// Rows as display cells. Array rows become one cell per element, scalar
    /// rows a single cell.
    pub fn rows(&self) -> Option<Vec<Vec<String>>> {
        match self {
            ResultMessages::Rows(rows) => Some(
                rows.iter()
                    .map(|row| match row {
                        Value::Array(cells) => cells.iter().map(cell_text).collect(),
                        other => vec![cell_text(other)],
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Free-text rendering used when the payload is not a sequence of rows.
    pub fn text(&self) -> String {
        match self {
            ResultMessages::Text(text) => text.clone(),
            ResultMessages::Rows(rows) => Value::Array(rows.clone()).to_string(),
            ResultMessages::Other(Value::Null) => String::new(),
            ResultMessages::Other(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Storage-backed artifacts a result may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// `material_url`, a crystal structure (CIF) file.
    Structure,
    /// `xas_url`, the spectrum data or its rendering.
    Spectrum,
    /// `fitting_result_url`, the fit report image.
    Fitting,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Spectrum,
        ArtifactKind::Structure,
        ArtifactKind::Fitting,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            ArtifactKind::Structure => "material_url",
            ArtifactKind::Spectrum => "xas_url",
            ArtifactKind::Fitting => "fitting_result_url",
        }
    }
}

/// Response of `POST /chat`. Every optional member is independently present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub messages: ResultMessages,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xas_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitting_result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

const ENVELOPE_FIELDS: [&str; 5] = [
    "messages",
    "material_url",
    "xas_url",
    "fitting_result_url",
    "message",
];

impl ResultEnvelope {
    pub fn from_text(text: &str) -> Self {
        Self {
            messages: ResultMessages::Text(text.to_string()),
            ..Default::default()
        }
    }

    /// Interprets whatever JSON the backend answered with.
    ///
    /// Objects carrying envelope members are decoded as such; a JSON string is
    /// unwrapped once (the backend may double encode) and otherwise treated as
    /// free text; anything else becomes the `messages` payload.
    pub fn from_value(value: Value) -> Result<Self, DrXasError> {
        match value {
            Value::Object(map) if ENVELOPE_FIELDS.iter().any(|f| map.contains_key(*f)) => {
                Ok(serde_json::from_value(Value::Object(map))?)
            }
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(inner @ Value::Object(_)) => ResultEnvelope::from_value(inner),
                _ => Ok(ResultEnvelope::from_text(&text)),
            },
            Value::Array(rows) => Ok(Self {
                messages: ResultMessages::Rows(rows),
                ..Default::default()
            }),
            other => Ok(Self {
                messages: ResultMessages::Other(other),
                ..Default::default()
            }),
        }
    }

    /// The locator for an artifact, absent when missing or blank.
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&str> {
        let value = match kind {
            ArtifactKind::Structure => self.material_url.as_deref(),
            ArtifactKind::Spectrum => self.xas_url.as_deref(),
            ArtifactKind::Fitting => self.fitting_result_url.as_deref(),
        };

        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Headline shown above the tabular panel.
    pub fn headline(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Response of `GET /xafs_database`: catalog title to spectrum identifiers.
///
/// The first element of each list is the spectrum id used for `GET /xafs/{id}`;
/// the backend may append the specimen name after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(pub BTreeMap<String, Vec<String>>);

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn material_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn spectrum_ids(&self, material_id: &str) -> &[String] {
        self.0
            .get(material_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn primary_spectrum(&self, material_id: &str) -> Option<&str> {
        self.spectrum_ids(material_id)
            .first()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}
