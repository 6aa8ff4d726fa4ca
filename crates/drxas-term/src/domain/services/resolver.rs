#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;

use std::sync::Arc;

use drxas_client::BackendClient;
use drxas_types::Catalog;
use drxas_types::DrXasError;

use crate::domain::models::AttachedFile;
use crate::domain::models::AttachedFiles;
use crate::domain::models::FileOrigin;

/// Longer answers are free text from a backend that could not resolve the id.
pub const MAX_FORMULA_LEN: usize = 20;

pub const STRUCTURE_NOT_FOUND_TEXT: &str =
    "CIF file not found for this formula. Please upload the structure file manually.";

pub fn structure_file_name(formula: &str) -> String {
    return format!("{formula}.cif");
}

/// Looks up catalog entries, formulas, spectra and structure files.
pub struct MaterialResolver {
    backend: Arc<dyn BackendClient>,
}

impl MaterialResolver {
    pub fn new(backend: Arc<dyn BackendClient>) -> MaterialResolver {
        return MaterialResolver { backend };
    }

    /// The catalog, or an empty one when the backend cannot be reached.
    pub async fn list_catalog(&self) -> Catalog {
        match self.backend.catalog().await {
            Ok(catalog) => {
                tracing::debug!(materials = catalog.len(), "Catalog loaded");
                return catalog;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Catalog unavailable");
                return Catalog::default();
            }
        }
    }

    /// The formula of a catalog material, or an empty string.
    pub async fn resolve_formula(&self, material_id: &str) -> String {
        match self.backend.chemical_formula(material_id).await {
            Ok(formula) if formula.len() <= MAX_FORMULA_LEN => return formula,
            Ok(formula) => {
                tracing::warn!(
                    material_id = material_id,
                    length = formula.len(),
                    "Formula lookup returned free text"
                );
                return "".to_string();
            }
            Err(err) => {
                tracing::warn!(material_id = material_id, error = %err, "Formula lookup failed");
                return "".to_string();
            }
        }
    }

    /// Downloads a catalog spectrum as an attachment named `title`.
    ///
    /// Returns `None` without a request when `files` already holds `title`.
    pub async fn fetch_spectrum_payload(
        &self,
        spectrum_id: &str,
        title: &str,
        files: &AttachedFiles,
    ) -> Result<Option<AttachedFile>, DrXasError> {
        if files.contains(title) {
            tracing::debug!(title = title, "Spectrum already attached");
            return Ok(None);
        }
        if spectrum_id.trim().is_empty() {
            return Err(DrXasError::validation(format!(
                "no spectrum id recorded for {title}"
            )));
        }

        let bytes = self.backend.spectrum(spectrum_id).await?;
        return Ok(Some(AttachedFile::new(
            title,
            &bytes,
            FileOrigin::SpectrumCatalog {
                spectrum_id: spectrum_id.to_string(),
            },
        )));
    }

    /// Downloads the structure file for `formula` as `{formula}.cif`.
    ///
    /// A missing structure surfaces as `DrXasError::NotFound`.
    pub async fn fetch_structure_by_formula(
        &self,
        formula: &str,
        files: &AttachedFiles,
    ) -> Result<Option<AttachedFile>, DrXasError> {
        let formula = formula.trim();
        if formula.is_empty() {
            return Err(DrXasError::validation("enter a chemical formula first"));
        }

        let name = structure_file_name(formula);
        if files.contains(&name) {
            tracing::debug!(name = %name, "Structure already attached");
            return Ok(None);
        }

        let bytes = self.backend.structure(formula).await?;
        return Ok(Some(AttachedFile::new(
            &name,
            &bytes,
            FileOrigin::StructureDatabase {
                formula: formula.to_string(),
            },
        )));
    }
}
