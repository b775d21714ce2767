/// How a publisher's handle is opened against an existing box.
///
/// Mirrors the three meaningful combinations of `TFS_O_CREAT` /
/// `TFS_O_TRUNC` / `TFS_O_APPEND` the original byte-log supported, minus
/// the parts that only matter for a real filesystem (there is no separate
/// create-a-file-without-opening-it step here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Box must not already hold data; starts empty.
    Create,
    /// Box may hold data; it is discarded before the first write.
    Truncate,
    /// Box may hold data; writes are appended after it.
    Append,
}

/// A publisher's attachment to a box. Only one may exist per box at a time.
pub struct PublisherHandle {
    box_name: String,
}

impl PublisherHandle {
    pub(crate) fn new(box_name: String) -> Self {
        Self { box_name }
    }

    pub fn box_name(&self) -> &str {
        &self.box_name
    }
}

/// A subscriber's attachment to a box, with its own read cursor.
///
/// Every subscriber starts at the beginning of the box's log, regardless
/// of when it attaches: it sees the full backlog published so far, then
/// everything published afterward, in order. Reattaching starts a fresh
/// cursor back at zero.
pub struct SubscriberHandle {
    box_name: String,
    cursor: usize,
}

impl SubscriberHandle {
    pub(crate) fn new(box_name: String, cursor: usize) -> Self {
        Self { box_name, cursor }
    }

    pub fn box_name(&self) -> &str {
        &self.box_name
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.cursor += n;
    }
}
