use crate::window::ByteWindow;

/// The reader's single cache slot: one contiguous prefetched window.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub start: u64,
    pub data: Vec<u8>,
}

impl CacheEntry {
    pub fn window(&self) -> ByteWindow {
        ByteWindow::new(self.start, self.data.len() as u64)
    }

    /// Bytes for `want` if the slot covers it entirely.
    pub fn slice(&self, want: &ByteWindow) -> Option<&[u8]> {
        if !self.window().contains(want) {
            return None;
        }
        let from = (want.start - self.start) as usize;
        self.data.get(from..from + want.length as usize)
    }
}
