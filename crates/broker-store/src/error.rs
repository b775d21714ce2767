use thiserror::Error;

/// Errors produced by the byte-log store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `create` was called for a name that already has a live box.
    #[error("box already exists")]
    AlreadyExists,
    /// `open`/`unlink` referenced a name with no live box.
    #[error("box does not exist")]
    NotFound,
    /// Every slot is occupied; the pool has no room for another box.
    #[error("box pool is full")]
    PoolFull,
    /// A publisher tried to attach to a box that already has one.
    #[error("box already has a publisher")]
    PublisherTaken,
}
