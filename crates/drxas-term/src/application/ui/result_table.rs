use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Row;
use ratatui::widgets::Table;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;

use crate::domain::services::TableBody;

/// The `messages` of a result, with the optional headline above it.
pub struct ResultTable<'a> {
    headline: Option<&'a str>,
    body: TableBody,
    title: String,
}

impl<'a> ResultTable<'a> {
    pub fn new(headline: Option<&'a str>, body: TableBody, title: &str) -> ResultTable<'a> {
        return ResultTable {
            headline,
            body,
            title: title.to_string(),
        };
    }
}

impl Widget for ResultTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(self.title.to_string());
        let inner = block.inner(area);
        block.render(area, buf);

        let [headline_area, body_area] = match self.headline {
            Some(_) => Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner),
            None => Layout::vertical([Constraint::Length(0), Constraint::Min(0)]).areas(inner),
        };

        if let Some(headline) = self.headline {
            Line::from(headline.to_string()).bold().render(headline_area, buf);
        }

        match self.body {
            TableBody::Rows(rows) => {
                let columns = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
                let widths = vec![Constraint::Fill(1); columns];
                let rows = rows.into_iter().map(Row::new).collect::<Vec<Row>>();
                Widget::render(Table::new(rows, widths).column_spacing(2), body_area, buf);
            }
            TableBody::Text(text) => {
                Paragraph::new(text)
                    .wrap(Wrap { trim: false })
                    .render(body_area, buf);
            }
        }
    }
}
