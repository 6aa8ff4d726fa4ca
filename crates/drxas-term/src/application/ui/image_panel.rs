use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;

use crate::domain::models::ViewTransform;

/// An image artifact: where to fetch it and how it is zoomed and panned.
pub struct ImagePanel<'a> {
    url: &'a str,
    title: String,
    transform: ViewTransform,
}

impl<'a> ImagePanel<'a> {
    pub fn new(url: &'a str, title: &str, transform: ViewTransform) -> ImagePanel<'a> {
        return ImagePanel {
            url,
            title: title.to_string(),
            transform,
        };
    }
}

impl Widget for ImagePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let file_name = self
            .url
            .split('?')
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or(self.url);

        let lines = vec![
            Line::from(file_name.to_string()).bold(),
            Line::from(self.url.to_string()).underlined(),
            Line::from(format!(
                "Zoom {:.1}x  Offset ({:.0}, {:.0})",
                self.transform.scale, self.transform.offset_x, self.transform.offset_y
            )),
        ];

        Paragraph::new(lines)
            .block(Block::bordered().title(self.title))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
