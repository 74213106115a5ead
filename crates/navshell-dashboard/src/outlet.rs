#![forbid(unsafe_code)]

//! Content slot for the nested routed view.

use navshell_core::geometry::Rect;
use navshell_render::drawing::Draw;
use navshell_render::frame::Frame;
use navshell_render::truncate_to_width;

use crate::navigation::item_for_path;
use crate::theme;

/// Renders whatever lives at `path` inside the shell's content area.
pub trait Outlet {
    fn render(&self, path: &str, frame: &mut Frame, area: Rect);
}

/// Shows the page title and path for any route.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutePlaceholder;

impl Outlet for RoutePlaceholder {
    fn render(&self, path: &str, frame: &mut Frame, area: Rect) {
        if area.is_empty() {
            return;
        }
        let title = item_for_path(path).map_or("Page", |item| item.label);
        let width = area.width as usize;
        let max_x = area.right();

        frame.print_text_clipped(
            area.x,
            area.y,
            &truncate_to_width(title, width),
            theme::page_heading(),
            max_x,
        );
        if let Some(row) = area.row(1) {
            frame.print_text_clipped(
                row.x,
                row.y,
                &truncate_to_width(path, width),
                theme::page_muted(),
                max_x,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navshell_render::buffer::Buffer;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.width())
            .filter_map(|x| buf.get(x, y).and_then(|c| c.content.as_char()))
            .collect()
    }

    #[test]
    fn shows_label_and_path() {
        let mut frame = Frame::new(40, 3);
        RoutePlaceholder.render("/dashboard/rewards", &mut frame, Rect::new(1, 0, 39, 3));
        assert_eq!(row(&frame.buffer, 0), "Rewards");
        assert_eq!(row(&frame.buffer, 1), "/dashboard/rewards");
    }

    #[test]
    fn unknown_route_gets_generic_title() {
        let mut frame = Frame::new(20, 2);
        let area = frame.bounds();
        RoutePlaceholder.render("/upgrade", &mut frame, area);
        assert_eq!(row(&frame.buffer, 0), "Page");
    }

    #[test]
    fn empty_area_draws_nothing() {
        let mut frame = Frame::new(5, 1);
        RoutePlaceholder.render("/dashboard", &mut frame, Rect::new(0, 0, 0, 0));
        assert!(frame.buffer.cells().iter().all(|c| c.is_empty()));
    }
}
