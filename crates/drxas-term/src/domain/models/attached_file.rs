use std::sync::Arc;

use drxas_types::DrXasError;
use drxas_types::FilePayload;

/// Where an attachment came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOrigin {
    Upload,
    Paste,
    Drop,
    /// Downloaded from the reference catalog for a selected material.
    SpectrumCatalog { spectrum_id: String },
    /// Downloaded from the structure database for a formula.
    StructureDatabase { formula: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub origin: FileOrigin,
}

impl AttachedFile {
    pub fn new(name: &str, bytes: &[u8], origin: FileOrigin) -> AttachedFile {
        return AttachedFile {
            name: name.to_string(),
            bytes: Arc::from(bytes),
            origin,
        };
    }

    /// The identity used for every membership and removal check.
    pub fn identity(&self) -> &str {
        return &self.name;
    }

    pub fn to_payload(&self) -> FilePayload {
        return FilePayload::from_bytes(&self.name, &self.bytes);
    }
}

/// Attachments in insertion order, unique by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachedFiles {
    files: Vec<AttachedFile>,
}

impl AttachedFiles {
    pub fn contains(&self, name: &str) -> bool {
        return self.files.iter().any(|file| file.identity() == name);
    }

    pub fn get(&self, name: &str) -> Option<&AttachedFile> {
        return self.files.iter().find(|file| file.identity() == name);
    }

    pub fn insert(&mut self, file: AttachedFile) -> Result<(), DrXasError> {
        if file.identity().trim().is_empty() {
            return Err(DrXasError::validation("file name is empty"));
        }
        if self.contains(file.identity()) {
            return Err(DrXasError::validation(format!(
                "a file named {} is already attached",
                file.identity()
            )));
        }

        self.files.push(file);
        return Ok(());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttachedFile> {
        let position = self.files.iter().position(|file| file.identity() == name)?;
        return Some(self.files.remove(position));
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttachedFile> {
        return self.files.iter();
    }

    pub fn names(&self) -> Vec<String> {
        return self.files.iter().map(|f| f.name.to_string()).collect();
    }

    pub fn len(&self) -> usize {
        return self.files.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.files.is_empty();
    }

    pub fn payloads(&self) -> Vec<FilePayload> {
        return self.files.iter().map(AttachedFile::to_payload).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_duplicate_names() {
        let mut files = AttachedFiles::default();
        files
            .insert(AttachedFile::new("Ni_foil", b"1 2\n", FileOrigin::Upload))
            .unwrap();

        let err = files
            .insert(AttachedFile::new("Ni_foil", b"3 4\n", FileOrigin::Paste))
            .unwrap_err();
        assert!(matches!(err, DrXasError::Validation { .. }));
        assert_eq!(files.len(), 1);
        assert_eq!(&*files.get("Ni_foil").unwrap().bytes, b"1 2\n");
    }

    #[test]
    fn it_keeps_insertion_order_and_removes_by_name() {
        let mut files = AttachedFiles::default();
        for name in ["b.txt", "a.txt", "c.cif"] {
            files
                .insert(AttachedFile::new(name, b"", FileOrigin::Upload))
                .unwrap();
        }

        assert_eq!(files.names(), vec!["b.txt", "a.txt", "c.cif"]);
        assert!(files.remove("a.txt").is_some());
        assert!(files.remove("a.txt").is_none());
        assert_eq!(files.names(), vec!["b.txt", "c.cif"]);
    }

    #[test]
    fn it_decodes_payloads_lossily() {
        let file = AttachedFile::new("raw", &[b'o', b'k', 0xff], FileOrigin::Drop);
        assert_eq!(file.to_payload().content, "ok\u{fffd}");
    }
}
