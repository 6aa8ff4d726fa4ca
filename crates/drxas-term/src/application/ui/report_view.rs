use chrono::DateTime;
use chrono::Utc;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Stylize;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use strum::IntoEnumIterator;

use super::ImagePanel;
use super::ResultTable;
use super::SpectrumPlot;
use super::StructureView;
use crate::domain::models::PanelKind;
use crate::domain::models::PanelState;
use crate::domain::models::SpectrumContent;
use crate::domain::services::Report;

/// Every panel of a report, stacked, each collapsible on its own.
///
/// Image panels only show URLs that are still valid at `now`.
pub struct ReportView<'a> {
    report: &'a Report,
    now: DateTime<Utc>,
}

impl<'a> ReportView<'a> {
    pub fn new(report: &'a Report, now: DateTime<Utc>) -> ReportView<'a> {
        return ReportView { report, now };
    }

    /// Panels with something to show: artifacts the result named, and the table.
    pub fn panels(&self) -> Vec<PanelKind> {
        return PanelKind::iter()
            .filter(|panel| match panel.artifact() {
                Some(kind) => self.report.artifact(kind).is_some(),
                None => true,
            })
            .collect();
    }

    fn title(&self, panel: PanelKind) -> String {
        if self.report.is_collapsed(panel) {
            return format!("▸ {panel}");
        }
        return format!("▾ {panel}");
    }

    fn render_state<T, F>(&self, state: &PanelState<T>, title: String, area: Rect, buf: &mut Buffer, ready: F)
    where
        F: FnOnce(&T, String, Rect, &mut Buffer),
    {
        let placeholder = match state {
            PanelState::Ready(value) => {
                ready(value, title, area, buf);
                return;
            }
            PanelState::Loading => Paragraph::new("Loading..."),
            PanelState::Failed(message) => Paragraph::new(message.to_string()).fg(Color::Red),
            PanelState::Empty => Paragraph::new("No data"),
        };

        placeholder
            .block(Block::bordered().title(title))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }

    fn image_url(&self, panel: PanelKind) -> Option<&'a str> {
        let report: &'a Report = self.report;
        return report.artifact(panel.artifact()?)?.usable_url(self.now);
    }

    fn render_image(&self, panel: PanelKind, title: String, area: Rect, buf: &mut Buffer) {
        match self.image_url(panel) {
            Some(url) => ImagePanel::new(url, &title, self.report.transform(panel)).render(area, buf),
            None => Paragraph::new("Refreshing...")
                .block(Block::bordered().title(title))
                .render(area, buf),
        }
    }

    fn render_panel(&self, panel: PanelKind, area: Rect, buf: &mut Buffer) {
        let title = self.title(panel);
        if self.report.is_collapsed(panel) {
            Block::bordered().title(title).render(area, buf);
            return;
        }

        let transform = self.report.transform(panel);
        match panel {
            PanelKind::Spectrum => {
                self.render_state(&self.report.spectrum, title, area, buf, |content, title, area, buf| {
                    match content {
                        SpectrumContent::Plot(data) => {
                            SpectrumPlot::new(data, &title).render(area, buf)
                        }
                        SpectrumContent::Image { .. } => self.render_image(panel, title, area, buf),
                    }
                });
            }
            PanelKind::Structure => {
                self.render_state(&self.report.structure, title, area, buf, |model, title, area, buf| {
                    StructureView::new(model, &title, transform).render(area, buf)
                });
            }
            PanelKind::Fitting => {
                self.render_state(&self.report.fitting, title, area, buf, |_, title, area, buf| {
                    self.render_image(panel, title, area, buf)
                });
            }
            PanelKind::Table => {
                ResultTable::new(self.report.headline(), self.report.table(), &title).render(area, buf);
            }
        }
    }
}

impl Widget for ReportView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let panels = self.panels();
        let constraints = panels
            .iter()
            .map(|panel| {
                if self.report.is_collapsed(*panel) {
                    return Constraint::Length(1);
                }
                return Constraint::Fill(1);
            })
            .collect::<Vec<Constraint>>();
        let areas = Layout::vertical(constraints).split(area);

        for (panel, panel_area) in panels.iter().zip(areas.iter()) {
            self.render_panel(*panel, *panel_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use drxas_types::ArtifactKind;
    use drxas_types::DrXasError;
    use drxas_types::ResultEnvelope;
    use serde_json::json;

    use super::*;
    use crate::application::ui::buffer_text;
    use crate::domain::models::ResolvedArtifact;
    use crate::domain::services::ReportPipeline;
    use crate::test_support::NI_SPECTRUM;

    fn pipeline() -> ReportPipeline {
        let envelope = ResultEnvelope::from_value(json!({
            "messages": [["amp", 0.8]],
            "message": "Fit complete",
            "xas_url": "viz/Ni_foil.txt",
            "material_url": "cif/Ni_foil.cif"
        }))
        .unwrap();

        let mut pipeline = ReportPipeline::default();
        pipeline.load(envelope);
        return pipeline;
    }

    fn render(report: &Report) -> String {
        let mut buf = Buffer::empty(Rect::new(0, 0, 70, 40));
        ReportView::new(report, Utc::now()).render(buf.area, &mut buf);
        return buffer_text(&buf);
    }

    #[test]
    fn it_lists_only_named_artifacts_and_the_table() {
        let pipeline = pipeline();
        let view = ReportView::new(pipeline.current().unwrap(), Utc::now());

        assert_eq!(
            view.panels(),
            vec![PanelKind::Spectrum, PanelKind::Structure, PanelKind::Table]
        );
    }

    #[test]
    fn it_shows_loading_then_per_panel_results() {
        let mut pipeline = pipeline();
        let text = render(pipeline.current().unwrap());
        assert!(text.contains("▾ XAS Spectra Viewer"));
        assert!(text.contains("Loading..."));
        assert!(text.contains("Fit complete"));
        assert!(!text.contains("Fitting Results"));

        let generation = pipeline.current().unwrap().generation();
        pipeline.apply(
            generation,
            ArtifactKind::Spectrum,
            Ok(ResolvedArtifact {
                url: "https://signed.test/viz/Ni_foil.txt".to_string(),
                expires_at: None,
                bytes: NI_SPECTRUM.as_bytes().to_vec(),
            }),
        );
        pipeline.apply(
            generation,
            ArtifactKind::Structure,
            Err(DrXasError::not_found("artifact cif/Ni_foil.cif")),
        );

        let text = render(pipeline.current().unwrap());
        assert!(text.contains("Energy [eV]") || text.contains("8330"));
        assert!(text.contains("Not found"));
        assert!(!text.contains("Loading..."));
    }

    #[test]
    fn it_collapses_panels_to_their_title() {
        let mut pipeline = pipeline();
        let report = pipeline.current_mut().unwrap();
        report.toggle(PanelKind::Spectrum);
        report.toggle(PanelKind::Structure);

        let text = render(pipeline.current().unwrap());
        assert!(text.contains("▸ XAS Spectra Viewer"));
        assert!(text.contains("▸ Crystal Structure Viewer"));
        assert!(!text.contains("Loading..."));
        assert!(text.contains("amp"));
    }

    #[test]
    fn it_hides_an_expired_fitting_url_until_it_is_refreshed() {
        let envelope = ResultEnvelope::from_value(json!({"fitting_result_url": "fit/Ni_fit.png"})).unwrap();
        let mut pipeline = ReportPipeline::default();
        pipeline.load(envelope);

        let now = Utc::now();
        let generation = pipeline.current().unwrap().generation();
        pipeline.apply(
            generation,
            ArtifactKind::Fitting,
            Ok(ResolvedArtifact {
                url: "https://signed.test/fit/Ni_fit.png".to_string(),
                expires_at: Some(now - chrono::Duration::seconds(60)),
                bytes: vec![],
            }),
        );

        let render_at = |at: DateTime<Utc>| {
            let mut buf = Buffer::empty(Rect::new(0, 0, 90, 20));
            ReportView::new(pipeline.current().unwrap(), at).render(buf.area, &mut buf);
            return buffer_text(&buf);
        };

        let text = render_at(now);
        assert!(text.contains("Fitting Results"));
        assert!(text.contains("Refreshing..."));
        assert!(!text.contains("signed.test"));

        let text = render_at(now - chrono::Duration::seconds(120));
        assert!(text.contains("signed.test"));
        assert!(!text.contains("Refreshing..."));
    }
}
