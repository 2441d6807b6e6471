//! Event cursor.
//!
//! `Uninitialized → Ready → (Advancing ⇄ Ready) → Exhausted`
//!
//! The cursor only tracks positions; the reader performs the row load and
//! the pipeline run between `begin` and `finish`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Uninitialized,
    Ready,
    Advancing,
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct EventCursor {
    state: CursorState,
    /// Row the next `advance` will load; one past the current row.
    next_row: usize,
    rows_processed: usize,
    update_disabled: bool,
}

impl Default for EventCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl EventCursor {
    pub fn new() -> Self {
        Self {
            state: CursorState::Uninitialized,
            next_row: 0,
            rows_processed: 0,
            update_disabled: false,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Schema populated; ready for the first advance.
    pub fn ready(&mut self) {
        self.state = CursorState::Ready;
    }

    pub fn next_row(&self) -> usize {
        self.next_row
    }

    /// Index of the row currently loaded.
    pub fn current_row(&self) -> Option<usize> {
        match self.rows_processed {
            0 => None,
            _ => Some(self.next_row - 1),
        }
    }

    /// One-based number of the current event; 0 before the first.
    pub fn event_number(&self) -> usize {
        self.next_row
    }

    pub fn rows_processed(&self) -> usize {
        self.rows_processed
    }

    /// Registration window: nothing loaded yet, or only one row so far.
    pub fn is_first_event(&self) -> bool {
        self.rows_processed <= 1
    }

    pub fn begin(&mut self) {
        self.state = CursorState::Advancing;
    }

    /// `row` has been loaded.
    pub fn finish(&mut self, row: usize) {
        self.next_row = row + 1;
        self.rows_processed += 1;
        self.state = CursorState::Ready;
    }

    /// A failed load leaves the position unchanged.
    pub fn abort(&mut self) {
        self.state = CursorState::Ready;
    }

    pub fn exhaust(&mut self) {
        self.state = CursorState::Exhausted;
    }

    pub fn disable_update(&mut self) {
        self.update_disabled = true;
    }

    pub fn update_disabled(&self) -> bool {
        self.update_disabled
    }
}
