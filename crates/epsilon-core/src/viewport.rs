//! Scroll position of the thread view

/// Vertical scroll state in rows.
///
/// Rows are counted in `u32` so threads taller than a terminal buffer
/// can be addressed.
///
/// The host reports content and visible heights every frame through
/// [`Viewport::resize`] and the session revision through
/// [`Viewport::follow`]; any new revision snaps the view to the bottom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    offset: u32,
    content_height: u32,
    visible_height: u32,
    seen_revision: u64,
}

impl Viewport {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn max_offset(&self) -> u32 {
        self.content_height.saturating_sub(self.visible_height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset == self.max_offset()
    }

    pub fn resize(&mut self, content_height: u32, visible_height: u32) {
        self.content_height = content_height;
        self.visible_height = visible_height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Scroll to the bottom if the thread changed since the last call
    pub fn follow(&mut self, revision: u64) {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_up(&mut self, rows: u32) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u32) {
        self.offset = self.offset.saturating_add(rows).min(self.max_offset());
    }

    /// Scroll just enough to bring rows `top..top + height` into view
    pub fn reveal(&mut self, top: u32, height: u32) {
        let bottom = top.saturating_add(height);
        if top < self.offset {
            self.offset = top;
        } else if bottom > self.offset.saturating_add(self.visible_height) {
            self.offset = bottom.saturating_sub(self.visible_height).min(top);
        }
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn half_page(&self) -> u32 {
        (self.visible_height / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_lands_on_bottom_for_any_length() {
        let mut viewport = Viewport::default();
        let mut content = 0u32;
        for revision in 1..=60u64 {
            content += 3 + (revision % 5) as u32;
            viewport.resize(content, 20);
            viewport.follow(revision);
            assert!(viewport.is_at_bottom(), "revision {revision}");
            assert_eq!(viewport.offset(), content.saturating_sub(20));
        }
    }

    #[test]
    fn test_manual_scroll_kept_until_next_change() {
        let mut viewport = Viewport::default();
        viewport.resize(100, 10);
        viewport.follow(1);
        assert_eq!(viewport.offset(), 90);

        viewport.scroll_up(30);
        viewport.follow(1);
        assert_eq!(viewport.offset(), 60);

        viewport.follow(2);
        assert_eq!(viewport.offset(), 90);
    }

    #[test]
    fn test_short_content_never_scrolls() {
        let mut viewport = Viewport::default();
        viewport.resize(4, 10);
        viewport.follow(1);
        viewport.scroll_down(5);
        assert_eq!(viewport.offset(), 0);
        assert!(viewport.is_at_bottom());
    }

    #[test]
    fn test_shrinking_content_clamps_offset() {
        let mut viewport = Viewport::default();
        viewport.resize(50, 10);
        viewport.scroll_to_bottom();
        viewport.resize(0, 10);
        assert_eq!(viewport.offset(), 0);
    }

    #[test]
    fn test_reveal() {
        let mut viewport = Viewport::default();
        viewport.resize(100, 10);
        viewport.reveal(40, 4);
        assert_eq!(viewport.offset(), 34);
        viewport.reveal(20, 4);
        assert_eq!(viewport.offset(), 20);
        // taller than the view: show its top
        viewport.reveal(50, 30);
        assert_eq!(viewport.offset(), 50);
    }

    #[test]
    fn test_follow_past_u16_rows() {
        let mut viewport = Viewport::default();
        let content = u16::MAX as u32 * 3;
        viewport.resize(content, 30);
        viewport.follow(1);
        assert_eq!(viewport.offset(), content - 30);
        assert!(viewport.is_at_bottom());

        viewport.reveal(70_000, 12);
        assert_eq!(viewport.offset(), 70_000);
    }
}
