use mbroker_proto::BOX_SIZE;

use crate::invariants::{
    debug_assert_bounded_len, debug_assert_cursor_in_bounds, debug_assert_single_publisher,
};

/// A box's backing byte-log: an append-only buffer capped at [`BOX_SIZE`].
///
/// Content survives for the lifetime of the box; subscribers each keep
/// their own read cursor into it rather than consuming shared state.
pub struct BoxInode {
    name: String,
    data: Vec<u8>,
    n_publishers: u32,
    n_subscribers: u32,
}

impl BoxInode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
            n_publishers: 0,
            n_subscribers: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn n_publishers(&self) -> u32 {
        self.n_publishers
    }

    pub fn n_subscribers(&self) -> u32 {
        self.n_subscribers
    }

    pub fn has_open_handles(&self) -> bool {
        self.n_publishers > 0 || self.n_subscribers > 0
    }

    pub fn attach_publisher(&mut self) -> bool {
        debug_assert_single_publisher!(self.n_publishers);
        if self.n_publishers > 0 {
            return false;
        }
        self.n_publishers = 1;
        true
    }

    pub fn detach_publisher(&mut self) {
        self.n_publishers = self.n_publishers.saturating_sub(1);
    }

    pub fn attach_subscriber(&mut self) {
        self.n_subscribers += 1;
    }

    pub fn detach_subscriber(&mut self) {
        self.n_subscribers = self.n_subscribers.saturating_sub(1);
    }

    pub fn truncate(&mut self) {
        self.data.clear();
    }

    /// Appends as much of `buf` as fits under [`BOX_SIZE`], returning the
    /// number of bytes actually written. Never blocks; callers own waiting
    /// for room.
    pub fn append(&mut self, buf: &[u8]) -> usize {
        let room = BOX_SIZE.saturating_sub(self.data.len());
        let n = buf.len().min(room);
        self.data.extend_from_slice(&buf[..n]);
        debug_assert_bounded_len!(self.data.len(), BOX_SIZE);
        n
    }

    /// Copies bytes starting at `cursor` into `out`, returning how many
    /// were copied. `cursor` is owned by the caller (one per subscriber).
    pub fn read_from(&self, cursor: usize, out: &mut [u8]) -> usize {
        debug_assert_cursor_in_bounds!(cursor, self.data.len());
        if cursor >= self.data.len() {
            return 0;
        }
        let available = &self.data[cursor..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_truncates_at_capacity() {
        let mut inode = BoxInode::new("/a");
        let n = inode.append(&vec![1u8; BOX_SIZE + 10]);
        assert_eq!(n, BOX_SIZE);
        assert_eq!(inode.len(), BOX_SIZE);

        let n2 = inode.append(&[9u8]);
        assert_eq!(n2, 0, "box is already full, nothing more fits");
    }

    #[test]
    fn read_from_cursor_advances_independently() {
        let mut inode = BoxInode::new("/a");
        inode.append(b"hello world");

        let mut buf = [0u8; 5];
        let n = inode.read_from(0, &mut buf);
        assert_eq!(&buf[..n], b"hello");

        let mut buf2 = [0u8; 20];
        let n2 = inode.read_from(5, &mut buf2);
        assert_eq!(&buf2[..n2], b" world");
    }

    #[test]
    fn only_one_publisher_may_attach() {
        let mut inode = BoxInode::new("/a");
        assert!(inode.attach_publisher());
        assert!(!inode.attach_publisher());
        inode.detach_publisher();
        assert!(inode.attach_publisher());
    }
}
