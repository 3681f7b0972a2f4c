/// Windowing and selection state over one ordered list.
///
/// The visible window is the half-open range `start..end` with
/// `start <= end <= count` and `end - start <= height`. In cursor mode exactly
/// one item is selected and the window follows it; in scroll mode
/// (`scroll_lock`) there is no selection and navigation moves the window.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    count: usize,
    start: usize,
    end: usize,
    height: usize,
    width: usize,
    cursor: Option<usize>,
    marked: Option<usize>,
    /// Last search match in scroll mode
    hit: Option<usize>,
    scroll_lock: bool,
}

impl Viewport {
    /// Viewport with a selectable cursor (commit and file lists)
    pub fn cursor_mode(count: usize) -> Self {
        Self::new(count, false)
    }

    /// Free-scrolling viewport without a cursor (diff text)
    pub fn scroll_mode(count: usize) -> Self {
        Self::new(count, true)
    }

    fn new(count: usize, scroll_lock: bool) -> Self {
        let mut vp = Viewport {
            count,
            start: 0,
            end: 0,
            height: 0,
            width: 0,
            cursor: None,
            marked: None,
            hit: None,
            scroll_lock,
        };
        vp.fit();
        vp
    }

    // ── Accessors ──

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn marked(&self) -> Option<usize> {
        self.marked
    }

    pub fn hit(&self) -> Option<usize> {
        self.hit
    }

    /// Indices currently on screen
    pub fn visible(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Position shown in the status line: the cursor, or the last visible
    /// row in scroll mode
    pub fn position(&self) -> Option<usize> {
        if self.scroll_lock {
            self.end.checked_sub(1)
        } else {
            self.cursor
        }
    }

    // ── Window maintenance ──

    /// Re-establish every invariant after `count`, `height`, `start` or `cursor` moved.
    fn fit(&mut self) {
        if self.count == 0 {
            self.start = 0;
            self.end = 0;
            self.cursor = None;
            self.marked = None;
            self.hit = None;
            return;
        }

        let visible = self.height.min(self.count);

        if !self.scroll_lock {
            let cursor = self.cursor.unwrap_or(0).min(self.count - 1);
            self.cursor = Some(cursor);
            if visible > 0 {
                if cursor < self.start {
                    self.start = cursor;
                } else if cursor >= self.start + visible {
                    self.start = cursor + 1 - visible;
                }
            }
        }

        self.start = self.start.min(self.count - visible);
        self.end = self.start + visible;

        if self.marked.is_some_and(|m| m >= self.count) {
            self.marked = None;
        }
        if self.hit.is_some_and(|h| h >= self.count) {
            self.hit = None;
        }
    }

    /// Terminal region changed. Calling it again with the same size is a no-op.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.fit();
    }

    /// Start over on a new data set, keeping the addressing mode and size
    pub fn reset(&mut self, count: usize) {
        let (width, height) = (self.width, self.height);
        *self = Self::new(count, self.scroll_lock);
        self.set_size(width, height);
    }

    /// Item count changed after a refresh. The cursor is pulled back in bounds
    /// before the window is re-derived.
    pub fn set_count(&mut self, count: usize) {
        self.count = count;
        self.fit();
    }

    // ── Navigation ──

    pub fn next_page(&mut self) {
        self.shift_forward(self.height);
    }

    pub fn prev_page(&mut self) {
        self.shift_backward(self.height);
    }

    pub fn next_item(&mut self) {
        if self.scroll_lock {
            self.shift_forward(1);
        } else if let Some(cursor) = self.cursor {
            self.set_cursor(cursor + 1);
        }
    }

    pub fn prev_item(&mut self) {
        if self.scroll_lock {
            self.shift_backward(1);
        } else if let Some(cursor) = self.cursor {
            self.set_cursor(cursor.saturating_sub(1));
        }
    }

    /// Move window (and cursor, in cursor mode) forward by `delta`, clamped
    fn shift_forward(&mut self, delta: usize) {
        if self.count == 0 {
            return;
        }
        self.start = self.start.saturating_add(delta);
        if let Some(cursor) = self.cursor {
            self.cursor = Some(cursor.saturating_add(delta).min(self.count - 1));
        }
        self.fit();
    }

    /// Move window (and cursor, in cursor mode) backward by `delta`, clamped at 0
    fn shift_backward(&mut self, delta: usize) {
        if self.count == 0 {
            return;
        }
        self.start = self.start.saturating_sub(delta);
        if let Some(cursor) = self.cursor {
            self.cursor = Some(cursor.saturating_sub(delta));
        }
        self.fit();
    }

    /// Select item `index` (clamped), sliding the window just enough to show it.
    /// No effect in scroll mode or on an empty list.
    pub fn set_cursor(&mut self, index: usize) {
        if self.scroll_lock || self.count == 0 {
            return;
        }
        self.cursor = Some(index.min(self.count - 1));
        self.fit();
    }

    pub fn scroll_to_top(&mut self) {
        if self.scroll_lock {
            self.start = 0;
            self.fit();
        } else {
            self.set_cursor(0);
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        if self.scroll_lock {
            self.start = self.count;
            self.fit();
        } else {
            self.set_cursor(self.count.saturating_sub(1));
        }
    }

    /// Toggle the mark on the cursor item
    pub fn toggle_mark(&mut self) {
        if let Some(cursor) = self.cursor {
            self.marked = if self.marked == Some(cursor) {
                None
            } else {
                Some(cursor)
            };
        }
    }

    // ── Search ──

    fn visible_hit(&self) -> Option<usize> {
        self.hit.filter(|h| self.visible().contains(h))
    }

    /// Case-insensitive search forward from just after the current position.
    /// `text` yields the rendered text of a row. Returns whether a match was found;
    /// on a miss nothing moves.
    pub fn find_next(&mut self, query: &str, text: impl Fn(usize) -> String) -> bool {
        if query.is_empty() || self.count == 0 {
            return false;
        }
        let needle = query.to_lowercase();
        let from = if self.scroll_lock {
            self.visible_hit().map(|h| h + 1).unwrap_or(self.start)
        } else {
            self.cursor.map(|c| c + 1).unwrap_or(0)
        };

        let found = (from..self.count).find(|&i| text(i).to_lowercase().contains(&needle));
        if let Some(index) = found {
            self.jump_to_match(index);
        }
        found.is_some()
    }

    /// Case-insensitive search backward, scanning from just before the current
    /// position down to index 0.
    pub fn find_prev(&mut self, query: &str, text: impl Fn(usize) -> String) -> bool {
        if query.is_empty() || self.count == 0 {
            return false;
        }
        let needle = query.to_lowercase();
        let before = if self.scroll_lock {
            self.visible_hit().unwrap_or(self.end)
        } else {
            self.cursor.unwrap_or(0)
        };

        let found = (0..before)
            .rev()
            .find(|&i| text(i).to_lowercase().contains(&needle));
        if let Some(index) = found {
            self.jump_to_match(index);
        }
        found.is_some()
    }

    fn jump_to_match(&mut self, index: usize) {
        if self.scroll_lock {
            self.hit = Some(index);
            if !self.visible().contains(&index) {
                self.start = index;
            }
            self.fit();
        } else {
            self.set_cursor(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(mut vp: Viewport, height: usize) -> Viewport {
        vp.set_size(80, height);
        vp
    }

    fn assert_valid(vp: &Viewport) {
        assert!(vp.start <= vp.end, "{:?}", vp);
        assert!(vp.end <= vp.count(), "{:?}", vp);
        assert!(vp.end - vp.start <= vp.height(), "{:?}", vp);
        if vp.count() == 0 {
            assert_eq!(vp.cursor(), None);
            assert_eq!((vp.start, vp.end), (0, 0));
        }
        if vp.scroll_lock {
            assert_eq!(vp.cursor(), None);
        } else if vp.count() > 0 {
            let cursor = vp.cursor().expect("cursor mode list has a cursor");
            assert!(cursor < vp.count(), "{:?}", vp);
            if vp.height() > 0 {
                assert!(vp.visible().contains(&cursor), "{:?}", vp);
            }
        }
    }

    // ── construction & sizing ──

    #[test]
    fn new_cursor_mode_selects_first_item() {
        let vp = sized(Viewport::cursor_mode(5), 10);
        assert_eq!(vp.cursor(), Some(0));
        assert_eq!(vp.visible(), 0..5);
        assert_eq!(vp.marked(), None);
    }

    #[test]
    fn new_scroll_mode_has_no_cursor() {
        let vp = sized(Viewport::scroll_mode(50), 10);
        assert_eq!(vp.cursor(), None);
        assert_eq!(vp.visible(), 0..10);
        assert_eq!(vp.position(), Some(9));
    }

    #[test]
    fn zero_height_is_empty_window() {
        let mut vp = sized(Viewport::cursor_mode(10), 0);
        assert_eq!(vp.visible(), 0..0);
        vp.next_item();
        assert_eq!(vp.cursor(), Some(1));
        assert_valid(&vp);
    }

    #[test]
    fn set_size_twice_is_idempotent() {
        let mut vp = sized(Viewport::cursor_mode(100), 10);
        vp.set_cursor(55);
        vp.set_size(80, 7);
        let once = vp.clone();
        vp.set_size(80, 7);
        assert_eq!(vp, once);
    }

    #[test]
    fn shrinking_height_keeps_cursor_visible() {
        let mut vp = sized(Viewport::cursor_mode(100), 20);
        vp.set_cursor(15);
        vp.set_size(80, 5);
        assert_eq!(vp.visible(), 11..16);
        assert_eq!(vp.cursor(), Some(15));
    }

    #[test]
    fn growing_height_near_end_pulls_start_back() {
        let mut vp = sized(Viewport::cursor_mode(30), 10);
        vp.scroll_to_bottom();
        assert_eq!(vp.visible(), 20..30);
        vp.set_size(80, 25);
        assert_eq!(vp.visible(), 5..30);
        assert_eq!(vp.cursor(), Some(29));
    }

    // ── reset ──

    #[test]
    fn reset_keeps_size_and_mode() {
        let mut vp = sized(Viewport::cursor_mode(100), 10);
        vp.set_cursor(70);
        vp.toggle_mark();
        vp.reset(30);
        assert_eq!(vp.cursor(), Some(0));
        assert_eq!(vp.marked(), None);
        assert_eq!(vp.visible(), 0..10);
        assert_eq!(vp.width(), 80);
        assert!(!vp.scroll_lock);
    }

    // ── set_count ──

    #[test]
    fn set_count_zero_clears_everything() {
        let mut vp = sized(Viewport::cursor_mode(40), 10);
        vp.set_cursor(33);
        vp.toggle_mark();
        vp.set_count(0);
        assert_eq!(vp.cursor(), None);
        assert_eq!(vp.marked(), None);
        assert_eq!(vp.visible(), 0..0);
    }

    #[test]
    fn empty_list_stays_cursorless_until_count_rises() {
        let mut vp = sized(Viewport::cursor_mode(0), 10);
        vp.next_item();
        vp.next_page();
        vp.scroll_to_bottom();
        assert_eq!(vp.cursor(), None);
        vp.set_count(3);
        assert_eq!(vp.cursor(), Some(0));
        assert_eq!(vp.visible(), 0..3);
    }

    #[test]
    fn set_count_below_cursor_pulls_cursor_in() {
        let mut vp = sized(Viewport::cursor_mode(100), 10);
        vp.set_cursor(80);
        vp.set_count(12);
        assert_eq!(vp.cursor(), Some(11));
        assert_eq!(vp.visible(), 2..12);
        assert_valid(&vp);
    }

    #[test]
    fn set_count_drops_out_of_range_mark() {
        let mut vp = sized(Viewport::cursor_mode(20), 10);
        vp.set_cursor(15);
        vp.toggle_mark();
        vp.set_count(10);
        assert_eq!(vp.marked(), None);
    }

    #[test]
    fn set_count_in_scroll_mode_clamps_window() {
        let mut vp = sized(Viewport::scroll_mode(100), 10);
        vp.scroll_to_bottom();
        vp.set_count(15);
        assert_eq!(vp.visible(), 5..15);
    }

    // ── paging ──

    #[test]
    fn cursor_paging_example() {
        let mut vp = sized(Viewport::cursor_mode(100), 10);
        for _ in 0..3 {
            vp.next_page();
        }
        assert_eq!(vp.cursor(), Some(30));
        assert_eq!(vp.visible(), 30..40);
        for _ in 0..5 {
            vp.prev_page();
        }
        assert_eq!(vp.cursor(), Some(0));
        assert_eq!(vp.visible(), 0..10);
    }

    #[test]
    fn next_page_clamps_at_end() {
        let mut vp = sized(Viewport::cursor_mode(25), 10);
        for _ in 0..10 {
            vp.next_page();
        }
        assert_eq!(vp.cursor(), Some(24));
        assert_eq!(vp.visible(), 15..25);
    }

    #[test]
    fn scroll_paging_moves_window_only() {
        let mut vp = sized(Viewport::scroll_mode(35), 10);
        vp.next_page();
        assert_eq!(vp.visible(), 10..20);
        vp.next_page();
        vp.next_page();
        assert_eq!(vp.visible(), 25..35);
        vp.prev_page();
        assert_eq!(vp.visible(), 15..25);
        assert_eq!(vp.cursor(), None);
    }

    // ── item steps ──

    #[test]
    fn next_item_scrolls_window_when_cursor_leaves_it() {
        let mut vp = sized(Viewport::cursor_mode(20), 5);
        for _ in 0..5 {
            vp.next_item();
        }
        assert_eq!(vp.cursor(), Some(5));
        assert_eq!(vp.visible(), 1..6);
    }

    #[test]
    fn item_steps_clamp_at_both_ends() {
        let mut vp = sized(Viewport::cursor_mode(3), 5);
        vp.prev_item();
        assert_eq!(vp.cursor(), Some(0));
        for _ in 0..10 {
            vp.next_item();
        }
        assert_eq!(vp.cursor(), Some(2));
    }

    #[test]
    fn scroll_mode_example() {
        let mut vp = sized(Viewport::scroll_mode(500), 20);
        vp.scroll_to_bottom();
        assert_eq!(vp.visible(), 480..500);
        vp.prev_item();
        assert_eq!(vp.visible(), 479..499);
        vp.scroll_to_top();
        assert_eq!(vp.visible(), 0..20);
    }

    #[test]
    fn scroll_mode_short_text_never_scrolls() {
        let mut vp = sized(Viewport::scroll_mode(4), 20);
        vp.next_item();
        vp.next_page();
        assert_eq!(vp.visible(), 0..4);
    }

    // ── set_cursor ──

    #[test]
    fn set_cursor_slides_window_forward_and_back() {
        let mut vp = sized(Viewport::cursor_mode(100), 10);
        vp.set_cursor(42);
        assert_eq!(vp.visible(), 33..43);
        vp.set_cursor(5);
        assert_eq!(vp.visible(), 5..15);
        vp.set_cursor(500);
        assert_eq!(vp.cursor(), Some(99));
    }

    #[test]
    fn set_cursor_ignored_in_scroll_mode() {
        let mut vp = sized(Viewport::scroll_mode(100), 10);
        vp.set_cursor(50);
        assert_eq!(vp.cursor(), None);
        assert_eq!(vp.visible(), 0..10);
    }

    // ── mark ──

    #[test]
    fn toggle_mark_sets_and_clears() {
        let mut vp = sized(Viewport::cursor_mode(10), 5);
        vp.set_cursor(3);
        vp.toggle_mark();
        assert_eq!(vp.marked(), Some(3));
        vp.set_cursor(1);
        vp.toggle_mark();
        assert_eq!(vp.marked(), Some(1));
        vp.toggle_mark();
        assert_eq!(vp.marked(), None);
    }

    #[test]
    fn toggle_mark_is_noop_in_scroll_mode() {
        let mut vp = sized(Viewport::scroll_mode(10), 5);
        vp.toggle_mark();
        assert_eq!(vp.marked(), None);
    }

    // ── search ──

    fn rows() -> Vec<String> {
        ["alpha", "Beta", "gamma", "beta two", "delta", "BETA three"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn find_next_is_case_insensitive_and_starts_after_cursor() {
        let rows = rows();
        let mut vp = sized(Viewport::cursor_mode(rows.len()), 10);
        assert!(vp.find_next("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(1));
        assert!(vp.find_next("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(3));
        assert!(vp.find_next("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(5));
    }

    #[test]
    fn find_next_miss_leaves_cursor() {
        let rows = rows();
        let mut vp = sized(Viewport::cursor_mode(rows.len()), 10);
        vp.set_cursor(2);
        assert!(!vp.find_next("zeta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(2));
        vp.set_cursor(5);
        assert!(!vp.find_next("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(5));
    }

    #[test]
    fn find_prev_scans_down_to_zero() {
        let rows = rows();
        let mut vp = sized(Viewport::cursor_mode(rows.len()), 10);
        vp.set_cursor(5);
        assert!(vp.find_prev("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(3));
        assert!(vp.find_prev("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(1));
        assert!(!vp.find_prev("beta", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(1));
        assert!(vp.find_prev("alpha", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(0));
    }

    #[test]
    fn find_prev_at_top_terminates_without_match() {
        let rows = rows();
        let mut vp = sized(Viewport::cursor_mode(rows.len()), 10);
        assert!(!vp.find_prev("alpha", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(0));
    }

    #[test]
    fn find_scrolls_cursor_into_view() {
        let rows: Vec<String> = (0..100).map(|i| format!("row {}", i)).collect();
        let mut vp = sized(Viewport::cursor_mode(rows.len()), 10);
        assert!(vp.find_next("row 57", |i| rows[i].clone()));
        assert_eq!(vp.cursor(), Some(57));
        assert!(vp.visible().contains(&57));
    }

    #[test]
    fn scroll_mode_search_walks_hits_and_reveals_them() {
        let rows: Vec<String> = (0..100)
            .map(|i| if i % 30 == 7 { format!("needle {}", i) } else { "hay".to_string() })
            .collect();
        let mut vp = sized(Viewport::scroll_mode(rows.len()), 10);

        assert!(vp.find_next("needle", |i| rows[i].clone()));
        assert_eq!(vp.hit(), Some(7));
        assert_eq!(vp.visible(), 0..10);

        assert!(vp.find_next("needle", |i| rows[i].clone()));
        assert_eq!(vp.hit(), Some(37));
        assert_eq!(vp.visible(), 37..47);

        assert!(vp.find_next("needle", |i| rows[i].clone()));
        assert!(vp.find_next("needle", |i| rows[i].clone()));
        assert_eq!(vp.hit(), Some(97));
        assert_eq!(vp.visible(), 90..100);

        assert!(!vp.find_next("needle", |i| rows[i].clone()));
        assert_eq!(vp.hit(), Some(97));

        assert!(vp.find_prev("needle", |i| rows[i].clone()));
        assert_eq!(vp.hit(), Some(67));
        assert_eq!(vp.visible(), 67..77);
        assert_eq!(vp.cursor(), None);
    }

    #[test]
    fn empty_query_never_matches() {
        let rows = rows();
        let mut vp = sized(Viewport::cursor_mode(rows.len()), 10);
        assert!(!vp.find_next("", |i| rows[i].clone()));
        assert!(!vp.find_prev("", |i| rows[i].clone()));
    }

    // ── invariants under arbitrary operation sequences ──

    #[test]
    fn invariants_hold_for_pseudo_random_operations() {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed % bound
        };

        for scroll in [false, true] {
            let mut vp = if scroll {
                Viewport::scroll_mode(0)
            } else {
                Viewport::cursor_mode(0)
            };
            for _ in 0..5000 {
                match next(11) {
                    0 => vp.set_size(80, next(30) as usize),
                    1 => vp.set_count(next(120) as usize),
                    2 => vp.next_page(),
                    3 => vp.prev_page(),
                    4 => vp.next_item(),
                    5 => vp.prev_item(),
                    6 => vp.set_cursor(next(150) as usize),
                    7 => vp.scroll_to_top(),
                    8 => vp.scroll_to_bottom(),
                    9 => vp.toggle_mark(),
                    _ => {
                        let target = next(10);
                        let _ = vp.find_next("x", |i| {
                            if i as u64 % 10 == target { "x".into() } else { String::new() }
                        });
                    }
                }
                assert_valid(&vp);
            }
        }
    }
}
