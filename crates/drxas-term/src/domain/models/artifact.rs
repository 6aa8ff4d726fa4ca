use chrono::DateTime;
use chrono::Utc;
use drxas_client::is_network_locator;
use drxas_types::ArtifactKind;
use strum_macros::Display;
use strum_macros::EnumIter;

use super::SpectrumData;

pub const ZOOM_STEP: f64 = 0.2;
pub const MIN_SCALE: f64 = 0.2;
pub const MAX_SCALE: f64 = 5.0;

/// The collapsible panels of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum PanelKind {
    #[strum(serialize = "XAS Spectra Viewer")]
    Spectrum,
    #[strum(serialize = "Crystal Structure Viewer")]
    Structure,
    #[strum(serialize = "Fitting Results")]
    Fitting,
    #[strum(serialize = "Results Table")]
    Table,
}

impl PanelKind {
    pub fn artifact(&self) -> Option<ArtifactKind> {
        match self {
            PanelKind::Spectrum => return Some(ArtifactKind::Spectrum),
            PanelKind::Structure => return Some(ArtifactKind::Structure),
            PanelKind::Fitting => return Some(ArtifactKind::Fitting),
            PanelKind::Table => return None,
        }
    }

    pub fn for_artifact(kind: ArtifactKind) -> PanelKind {
        match kind {
            ArtifactKind::Spectrum => return PanelKind::Spectrum,
            ArtifactKind::Structure => return PanelKind::Structure,
            ArtifactKind::Fitting => return PanelKind::Fitting,
        }
    }
}

/// A result artifact as named by the backend, plus the URL issued for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub storage_key: String,
    pub resolved_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ArtifactRef {
    pub fn new(kind: ArtifactKind, locator: &str) -> ArtifactRef {
        return ArtifactRef {
            kind,
            storage_key: locator.trim().to_string(),
            resolved_url: None,
            expires_at: None,
        };
    }

    /// Full URLs are used as-is and never expire.
    pub fn is_storage_backed(&self) -> bool {
        return !is_network_locator(&self.storage_key);
    }

    pub fn usable_url(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.is_expired(now) {
            return None;
        }

        return self.resolved_url.as_deref();
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        return self.expires_at.is_some_and(|expires_at| now >= expires_at);
    }

    /// Last path segment of the locator, without any query string.
    pub fn file_name(&self) -> &str {
        let path = self.storage_key.split('?').next().unwrap_or_default();
        return path.rsplit('/').next().unwrap_or(path);
    }
}

/// Lifecycle of one report panel.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum PanelState<T> {
    /// The result names no artifact for this panel.
    #[default]
    Empty,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> PanelState<T> {
    pub fn is_loading(&self) -> bool {
        return matches!(self, PanelState::Loading);
    }

    pub fn is_failed(&self) -> bool {
        return matches!(self, PanelState::Failed(_));
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            PanelState::Ready(value) => return Some(value),
            _ => return None,
        }
    }
}

/// Zoom and pan of an image panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        return ViewTransform {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
    }
}

impl ViewTransform {
    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    pub fn reset(&mut self) {
        *self = ViewTransform::default();
    }

    fn set_scale(&mut self, scale: f64) {
        // Round to one decimal so repeated steps land on exact values.
        let rounded = (scale * 10.0).round() / 10.0;
        self.scale = rounded.clamp(MIN_SCALE, MAX_SCALE);
    }
}

/// What the spectrum panel ended up showing.
#[derive(Clone, Debug, PartialEq)]
pub enum SpectrumContent {
    Plot(SpectrumData),
    Image { url: String },
}

/// Request to resolve one artifact of a report generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub generation: u64,
    pub kind: ArtifactKind,
    pub locator: String,
}

/// A retrieval URL and the content behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use chrono::TimeZone;

    #[test]
    fn it_clamps_zoom_between_bounds() {
        let mut transform = ViewTransform::default();
        for _ in 0..40 {
            transform.zoom_in();
        }
        assert_eq!(transform.scale, MAX_SCALE);

        for _ in 0..40 {
            transform.zoom_out();
        }
        assert_eq!(transform.scale, MIN_SCALE);
    }

    #[test]
    fn it_steps_zoom_exactly() {
        let mut transform = ViewTransform::default();
        transform.zoom_in();
        transform.zoom_in();
        transform.zoom_out();
        assert_eq!(transform.scale, 1.2);

        transform.pan(10.0, -4.0);
        transform.reset();
        assert_eq!(transform, ViewTransform::default());
    }

    #[test]
    fn it_expires_storage_urls() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let artifact = ArtifactRef {
            kind: ArtifactKind::Fitting,
            storage_key: "fit/Ni_foil_fit.png".to_string(),
            resolved_url: Some("https://signed".to_string()),
            expires_at: Some(issued + Duration::seconds(3600)),
        };

        assert!(artifact.is_storage_backed());
        assert_eq!(artifact.usable_url(issued), Some("https://signed"));
        assert_eq!(artifact.usable_url(issued + Duration::seconds(3600)), None);
        assert_eq!(artifact.file_name(), "Ni_foil_fit.png");
    }

    #[test]
    fn it_treats_full_urls_as_direct() {
        let artifact = ArtifactRef::new(
            ArtifactKind::Spectrum,
            "https://cdn.example.com/viz/Ni_all.txt?sig=1",
        );
        assert!(!artifact.is_storage_backed());
        assert_eq!(artifact.file_name(), "Ni_all.txt");
    }
}
