//! Property-based invariant tests for buffer writes.
//!
//! 1. Nothing is written outside the active scissor.
//! 2. `print_text_clipped` never returns a column past `max_x`
//!    unless it started past it.
//! 3. Presenting any buffer never fails on an in-memory writer.

use navshell_core::geometry::Rect;
use navshell_render::buffer::Buffer;
use navshell_render::cell::Cell;
use navshell_render::drawing::Draw;
use navshell_render::presenter::Presenter;
use proptest::prelude::*;

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![Just('a'), Just('Z'), Just(' '), Just('界'), Just('⌘'), Just('\u{301}')],
        0..40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn writes_stay_inside_scissor(
        w in 1u16..40,
        h in 1u16..10,
        sx in 0u16..40,
        sy in 0u16..10,
        sw in 0u16..40,
        sh in 0u16..10,
        x in 0u16..45,
        y in 0u16..12,
        text in text_strategy(),
    ) {
        let mut buf = Buffer::new(w, h);
        let scissor = Rect::new(sx, sy, sw, sh);
        buf.push_scissor(scissor);
        buf.print_text(x, y, &text, Cell::default());
        buf.fill(Rect::new(0, 0, w, h), Cell::from_char('#'));
        buf.pop_scissor();

        for cy in 0..h {
            for cx in 0..w {
                let cell = buf.get(cx, cy).copied().unwrap_or_default();
                if !scissor.contains(cx, cy) {
                    prop_assert!(cell.is_empty(), "wrote outside scissor at ({cx}, {cy})");
                }
            }
        }
    }

    #[test]
    fn clipped_print_respects_max_x(x in 0u16..30, max_x in 0u16..30, text in text_strategy()) {
        let mut buf = Buffer::new(32, 1);
        let end = buf.print_text_clipped(x, 0, &text, Cell::default(), max_x);
        prop_assert!(end <= max_x.max(x));
    }

    #[test]
    fn present_never_fails(w in 1u16..30, h in 1u16..6, text in text_strategy()) {
        let mut buf = Buffer::new(w, h);
        buf.print_text(0, 0, &text, Cell::default());
        let mut presenter = Presenter::new(Vec::new());
        prop_assert!(presenter.present(None, &buf).is_ok());
    }
}
