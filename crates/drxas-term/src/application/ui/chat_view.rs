use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;

use crate::domain::models::MessagePart;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::SessionState;

/// Conversation history with the error banner and attachments above it.
pub struct ChatView<'a> {
    state: &'a SessionState,
}

impl<'a> ChatView<'a> {
    pub fn new(state: &'a SessionState) -> ChatView<'a> {
        return ChatView { state };
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = vec![];
        for message in &self.state.messages {
            let (author, color) = match message.role {
                Role::User => ("You", Color::Blue),
                Role::Assistant => ("Dr.XAS", Color::Magenta),
            };
            let style = match message.message_type {
                MessageType::Normal => Style::default(),
                MessageType::Provisional => Style::default().italic().dim(),
                MessageType::Error => Style::default().fg(Color::Red),
            };

            lines.push(Line::from(Span::from(format!("{author}:")).fg(color).bold()));
            for part in &message.content {
                match part {
                    MessagePart::Text { text } | MessagePart::Code { text } => {
                        for line in text.lines() {
                            lines.push(Line::styled(line.to_string(), style));
                        }
                    }
                    MessagePart::Image { source } => {
                        lines.push(Line::styled(format!("[image] {source}"), style));
                    }
                }
            }
            lines.push(Line::default());
        }

        return lines;
    }
}

impl Widget for ChatView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let banner_height = if self.state.error_banner.is_some() { 3 } else { 0 };
        let files_height = if self.state.attached_files.is_empty() { 0 } else { 1 };
        let [banner_area, files_area, history_area] = Layout::vertical([
            Constraint::Length(banner_height),
            Constraint::Length(files_height),
            Constraint::Min(0),
        ])
        .areas(area);

        if let Some(banner) = &self.state.error_banner {
            Paragraph::new(banner.to_string())
                .fg(Color::Red)
                .block(Block::bordered().title("Error"))
                .render(banner_area, buf);
        }

        if !self.state.attached_files.is_empty() {
            let names = self.state.attached_files.names().join(", ");
            Line::from(format!("Attached: {names}")).dim().render(files_area, buf);
        }

        let lines = self.lines();
        let height = history_area.height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(height) as u16;
        Paragraph::new(lines)
            .block(Block::bordered().title("Chat"))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(history_area, buf);
    }
}
