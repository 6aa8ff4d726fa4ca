//! Ratatui widgets for the chat transcript and the report panels.
//!
//! Widgets borrow from `AppState` and render into a `Buffer`, so the host
//! terminal decides layout and drawing cadence.

mod chat_view;
mod image_panel;
mod report_view;
mod result_table;
mod spectrum_plot;
mod structure_view;

pub use chat_view::ChatView;
pub use image_panel::ImagePanel;
pub use report_view::ReportView;
pub use result_table::ResultTable;
pub use spectrum_plot::SpectrumPlot;
pub use structure_view::StructureView;

#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    return buf
        .content
        .chunks(buf.area.width as usize)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<String>>()
        .join("\n");
}
