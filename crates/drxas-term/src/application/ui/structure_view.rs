use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::Canvas;
use ratatui::widgets::canvas::Circle;
use ratatui::widgets::canvas::Line as CanvasLine;
use ratatui::widgets::Block;
use ratatui::widgets::Widget;

use crate::domain::models::StructureModel;
use crate::domain::models::ViewTransform;

// Depth offset of the oblique projection.
const DEPTH: f64 = 0.35;
const ATOM_RADIUS: f64 = 0.3;

/// Stick and sphere rendering of a crystal structure, projected obliquely.
pub struct StructureView<'a> {
    model: &'a StructureModel,
    title: String,
    transform: ViewTransform,
}

impl<'a> StructureView<'a> {
    pub fn new(model: &'a StructureModel, title: &str, transform: ViewTransform) -> StructureView<'a> {
        return StructureView {
            model,
            title: title.to_string(),
            transform,
        };
    }

    fn projected(&self) -> Vec<(f64, f64)> {
        return self
            .model
            .atoms
            .iter()
            .map(|atom| {
                let [x, y, z] = atom.position;
                return (x + DEPTH * z, y + DEPTH * z);
            })
            .collect();
    }

    /// Square viewport around the structure, zoomed and panned.
    fn viewport(&self, points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
        if points.is_empty() {
            return ([-1.0, 1.0], [-1.0, 1.0]);
        }

        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (x, y) in points {
            x_min = x_min.min(*x);
            x_max = x_max.max(*x);
            y_min = y_min.min(*y);
            y_max = y_max.max(*y);
        }

        let half = ((x_max - x_min).max(y_max - y_min) / 2.0 + 1.0) / self.transform.scale;
        let cx = (x_min + x_max) / 2.0 - self.transform.offset_x;
        let cy = (y_min + y_max) / 2.0 + self.transform.offset_y;

        return ([cx - half, cx + half], [cy - half, cy + half]);
    }
}

fn element_color(element: &str) -> Color {
    match element {
        "O" => return Color::Red,
        "N" => return Color::Blue,
        "C" => return Color::Gray,
        "S" => return Color::Yellow,
        "Fe" | "Co" | "Ni" | "Cu" | "Zn" | "Mn" | "Cr" | "Ti" | "V" => return Color::Green,
        "Cl" | "F" | "Br" | "I" => return Color::LightGreen,
        _ => return Color::White,
    }
}

impl Widget for StructureView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let points = self.projected();
        let (x_bounds, y_bounds) = self.viewport(&points);
        let summary = format!(
            "{} atoms, {} bonds",
            self.model.atoms.len(),
            self.model.bonds.len()
        );

        Canvas::default()
            .block(Block::bordered().title(self.title.to_string()).title_bottom(summary))
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                for (a, b) in &self.model.bonds {
                    let (Some(from), Some(to)) = (points.get(*a), points.get(*b)) else {
                        continue;
                    };
                    ctx.draw(&CanvasLine::new(from.0, from.1, to.0, to.1, Color::DarkGray));
                }

                for (atom, (x, y)) in self.model.atoms.iter().zip(&points) {
                    ctx.draw(&Circle {
                        x: *x,
                        y: *y,
                        radius: ATOM_RADIUS,
                        color: element_color(&atom.element),
                    });
                }

                ctx.layer();
                for (atom, (x, y)) in self.model.atoms.iter().zip(&points) {
                    ctx.print(*x, *y, atom.element.to_string());
                }
            })
            .render(area, buf);
    }
}
