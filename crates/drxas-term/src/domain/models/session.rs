use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use super::AttachedFiles;
use super::MaterialSelection;
use super::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum Tab {
    #[default]
    Chat,
    Report,
}

/// One immutable version of the conversation.
///
/// Snapshots are never mutated once published; every transition produces a
/// new value with `version` bumped by one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub version: u64,
    pub messages: Vec<Message>,
    pub input: String,
    pub attached_files: AttachedFiles,
    pub selections: Vec<MaterialSelection>,
    pub materials: Vec<String>,
    pub formula_query: String,
    pub error_banner: Option<String>,
    pub report_visible: bool,
    pub active_tab: Tab,
    pub pending: bool,
}

impl SessionState {
    pub fn selection(&self, material_id: &str) -> Option<&MaterialSelection> {
        return self
            .selections
            .iter()
            .find(|selection| selection.material_id == material_id);
    }

    /// Spectrum ids of the current selections, in selection order without
    /// duplicates.
    pub fn spectrum_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = vec![];
        for id in self
            .selections
            .iter()
            .filter_map(|s| s.resolved_spectrum_id.as_ref())
        {
            if !ids.contains(id) {
                ids.push(id.to_string());
            }
        }

        return ids;
    }
}
