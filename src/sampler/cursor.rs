/// Forward-only read position in a sequential frame source.
///
/// Starts at `-1` (nothing read). Only [`Cursor::advance`] moves it, one frame at a time, so the
/// position never decreases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    position: i64,
}

impl Cursor {
    /// A cursor before the first frame.
    pub const fn new() -> Self {
        Self { position: -1 }
    }

    /// Index of the frame most recently read, or `-1`.
    pub fn position(self) -> i64 {
        self.position
    }

    /// Number of frames read so far.
    pub fn frames_read(self) -> u64 {
        (self.position + 1) as u64
    }

    /// `true` while the cursor has not yet reached frame `z`.
    pub fn is_before(self, z: i64) -> bool {
        self.position < z
    }

    pub(crate) fn advance(&mut self) {
        self.position += 1;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
