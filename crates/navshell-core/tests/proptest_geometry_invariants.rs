//! Property-based invariant tests for the layout geometry helpers.
//!
//! 1. Intersection is commutative and fits within both inputs.
//! 2. `split_left` / `split_top` partition the input exactly.
//! 3. `inner` never grows a rectangle.
//! 4. No panics on extreme u16 values.

use navshell_core::geometry::{Rect, Sides};
use proptest::prelude::*;

fn small_rect_strategy() -> impl Strategy<Value = Rect> {
    (0u16..=500, 0u16..=500, 0u16..=500, 0u16..=500).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>())
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

proptest! {
    #[test]
    fn intersection_commutative(a in small_rect_strategy(), b in small_rect_strategy()) {
        prop_assert_eq!(a.intersection(&b), b.intersection(&a));
    }

    #[test]
    fn intersection_within_inputs(a in small_rect_strategy(), b in small_rect_strategy()) {
        let i = a.intersection(&b);
        if !i.is_empty() {
            prop_assert!(i.x >= a.x && i.right() <= a.right());
            prop_assert!(i.y >= b.y && i.bottom() <= b.bottom());
        }
    }

    #[test]
    fn split_left_partitions(r in small_rect_strategy(), w in 0u16..=600) {
        let (left, right) = r.split_left(w);
        prop_assert_eq!(left.width + right.width, r.width);
        prop_assert_eq!(left.x, r.x);
        prop_assert_eq!(right.x, left.right());
        prop_assert_eq!(left.height, r.height);
        prop_assert_eq!(right.height, r.height);
    }

    #[test]
    fn split_top_partitions(r in small_rect_strategy(), h in 0u16..=600) {
        let (top, rest) = r.split_top(h);
        prop_assert_eq!(top.height + rest.height, r.height);
        prop_assert_eq!(rest.y, top.bottom());
    }

    #[test]
    fn inner_never_grows(r in small_rect_strategy(), m in 0u16..=300) {
        let inner = r.inner(Sides::all(m));
        prop_assert!(inner.width <= r.width);
        prop_assert!(inner.height <= r.height);
    }

    #[test]
    fn extreme_values_do_not_panic(r in rect_strategy(), x in any::<u16>(), y in any::<u16>()) {
        let _ = r.contains(x, y);
        let _ = r.right();
        let _ = r.bottom();
        let _ = r.inner(Sides::all(x));
        let _ = r.intersection(&Rect::new(x, y, x, y));
    }
}
