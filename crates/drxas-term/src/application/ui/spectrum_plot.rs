use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::Axis;
use ratatui::widgets::Block;
use ratatui::widgets::Chart;
use ratatui::widgets::Dataset;
use ratatui::widgets::GraphType;
use ratatui::widgets::Widget;

use crate::domain::models::SpectrumData;

/// Line chart of absorption over energy.
pub struct SpectrumPlot<'a> {
    data: &'a SpectrumData,
    title: String,
}

impl<'a> SpectrumPlot<'a> {
    pub fn new(data: &'a SpectrumData, title: &str) -> SpectrumPlot<'a> {
        return SpectrumPlot {
            data,
            title: title.to_string(),
        };
    }
}

impl Widget for SpectrumPlot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let points = self.data.points();
        let [x_min, x_max] = self.data.energy_bounds();
        let [y_min, y_max] = self.data.absorption_bounds();

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(
                Block::bordered()
                    .title(self.title)
                    .title_top(Line::from(self.data.title.to_string()).right_aligned()),
            )
            .x_axis(
                Axis::default()
                    .title("Energy [eV]")
                    .bounds([x_min, x_max])
                    .labels(vec![format!("{x_min:.0}"), format!("{x_max:.0}")]),
            )
            .y_axis(
                Axis::default()
                    .title("μt")
                    .bounds([y_min, y_max])
                    .labels(vec![format!("{y_min:.2}"), format!("{y_max:.2}")]),
            );

        chart.render(area, buf);
    }
}
