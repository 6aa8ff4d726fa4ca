use serde::Deserialize;
use serde::Serialize;

/// A catalog material the user picked, joined with what was resolved for it.
///
/// The spectrum id sent with a request is always read from here, so it cannot
/// outlive the selection that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSelection {
    pub material_id: String,
    pub resolved_spectrum_id: Option<String>,
    pub chemical_formula: Option<String>,
}

impl MaterialSelection {
    pub fn new(material_id: &str, spectrum_id: Option<&str>) -> MaterialSelection {
        return MaterialSelection {
            material_id: material_id.to_string(),
            resolved_spectrum_id: spectrum_id.map(str::to_string),
            chemical_formula: None,
        };
    }

    /// Name of the attachment the catalog spectrum is stored under.
    pub fn file_name(&self) -> &str {
        return &self.material_id;
    }
}
