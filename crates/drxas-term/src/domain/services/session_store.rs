#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use std::sync::Arc;

use drxas_types::ChatRequest;
use drxas_types::DrXasError;

use crate::domain::models::AttachedFile;
use crate::domain::models::FileOrigin;
use crate::domain::models::MaterialSelection;
use crate::domain::models::Message;
use crate::domain::models::MessagePatch;
use crate::domain::models::SessionState;
use crate::domain::models::Tab;

/// Pure transitions. Each returns a new snapshot with `version` bumped and
/// leaves `self` untouched.
impl SessionState {
    fn next(&self) -> SessionState {
        let mut next = self.clone();
        next.version += 1;
        return next;
    }

    pub fn append_message(&self, message: Message) -> (SessionState, usize) {
        let mut next = self.next();
        next.messages.push(message);
        let index = next.messages.len() - 1;
        return (next, index);
    }

    /// Merges `patch` into the message at `index`, clamped to the last valid
    /// index. Does nothing to an empty history.
    pub fn update_message(&self, index: usize, patch: &MessagePatch) -> SessionState {
        let mut next = self.next();
        if next.messages.is_empty() {
            return next;
        }

        let index = index.min(next.messages.len() - 1);
        next.messages[index] = next.messages[index].apply(patch);
        return next;
    }

    /// Drops the last `n` messages, or nothing when fewer exist.
    pub fn truncate(&self, n: usize) -> SessionState {
        let mut next = self.next();
        if n <= next.messages.len() {
            let len = next.messages.len() - n;
            next.messages.truncate(len);
        }

        return next;
    }

    pub fn undo(&self) -> SessionState {
        return self.truncate(2);
    }

    pub fn clear(&self) -> SessionState {
        return SessionState {
            version: self.version + 1,
            ..Default::default()
        };
    }

    pub fn set_input(&self, input: &str) -> SessionState {
        let mut next = self.next();
        next.input = input.to_string();
        return next;
    }

    pub fn attach_file(&self, file: AttachedFile) -> Result<SessionState, DrXasError> {
        let mut next = self.next();
        next.attached_files.insert(file)?;
        return Ok(next);
    }

    /// Removes the file named `name` together with the selection recorded for
    /// it. A structure file also takes the material it was fetched for.
    pub fn remove_file(&self, name: &str) -> SessionState {
        let mut next = self.next();
        let removed = next.attached_files.remove(name);
        next.selections.retain(|s| s.file_name() != name);

        if let Some(AttachedFile {
            origin: FileOrigin::StructureDatabase { formula },
            ..
        }) = removed
        {
            next.materials.retain(|m| *m != formula);
        }
        return next;
    }

    /// Records a selection, replacing an earlier one for the same material.
    pub fn select_material(&self, selection: MaterialSelection) -> SessionState {
        let mut next = self.next();
        match next
            .selections
            .iter_mut()
            .find(|s| s.material_id == selection.material_id)
        {
            Some(existing) => *existing = selection,
            None => next.selections.push(selection),
        }

        return next;
    }

    pub fn set_selection_formula(&self, material_id: &str, formula: &str) -> SessionState {
        let mut next = self.next();
        if let Some(selection) = next
            .selections
            .iter_mut()
            .find(|s| s.material_id == material_id)
        {
            selection.chemical_formula = Some(formula.to_string()).filter(|f| !f.is_empty());
        }

        return next;
    }

    pub fn set_formula_query(&self, formula: &str) -> SessionState {
        let mut next = self.next();
        next.formula_query = formula.to_string();
        return next;
    }

    pub fn add_material(&self, material: &str) -> SessionState {
        let mut next = self.next();
        if !next.materials.iter().any(|m| m == material) {
            next.materials.push(material.to_string());
        }

        return next;
    }

    pub fn set_active_tab(&self, tab: Tab) -> SessionState {
        let mut next = self.next();
        next.active_tab = tab;
        return next;
    }

    pub fn show_report(&self) -> SessionState {
        let mut next = self.next();
        next.report_visible = true;
        return next;
    }

    pub fn hide_report(&self) -> SessionState {
        let mut next = self.next();
        next.report_visible = false;
        return next;
    }

    pub fn set_banner(&self, text: &str) -> SessionState {
        let mut next = self.next();
        next.error_banner = Some(text.to_string());
        return next;
    }

    pub fn dismiss_banner(&self) -> SessionState {
        let mut next = self.next();
        next.error_banner = None;
        return next;
    }

    pub fn set_pending(&self, pending: bool) -> SessionState {
        let mut next = self.next();
        next.pending = pending;
        return next;
    }

    /// Builds the request for `text` from this snapshot.
    pub fn compose_request(&self, conversation_id: &str, text: &str) -> ChatRequest {
        let mut request = ChatRequest::new(conversation_id, text);
        request.materials = self.materials.clone();
        request.spectrum_ids = self.spectrum_ids();
        request.files = self.attached_files.payloads();
        return request;
    }
}

/// Holds the current snapshot and publishes new ones.
#[derive(Default)]
pub struct SessionStore {
    current: Arc<SessionState>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        return SessionStore::default();
    }

    pub fn snapshot(&self) -> Arc<SessionState> {
        return self.current.clone();
    }

    pub fn state(&self) -> &SessionState {
        return &self.current;
    }

    pub fn apply<F>(&mut self, transition: F) -> Arc<SessionState>
    where
        F: FnOnce(&SessionState) -> SessionState,
    {
        let next = transition(&self.current);
        tracing::trace!(version = next.version, "Session snapshot published");
        self.current = Arc::new(next);
        return self.current.clone();
    }

    pub fn append_message(&mut self, message: Message) -> usize {
        let (next, index) = self.current.append_message(message);
        self.apply(|_| next);
        return index;
    }

    pub fn update_message(&mut self, index: usize, patch: &MessagePatch) {
        self.apply(|s| s.update_message(index, patch));
    }

    pub fn truncate(&mut self, n: usize) {
        self.apply(|s| s.truncate(n));
    }

    pub fn clear(&mut self) {
        self.apply(SessionState::clear);
    }

    /// Attaches `file` unless its name is taken.
    pub fn attach_file(&mut self, file: AttachedFile) -> Result<(), DrXasError> {
        let next = self.current.attach_file(file)?;
        self.apply(|_| next);
        return Ok(());
    }
}
