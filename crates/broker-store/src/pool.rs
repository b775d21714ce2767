use std::sync::Mutex;

use mbroker_proto::MAX_N_BOXES;

use crate::error::StoreError;
use crate::handle::{OpenMode, PublisherHandle, SubscriberHandle};
use crate::inode::BoxInode;

/// A point-in-time view of one box's bookkeeping, used for `BOX_LIST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxSnapshot {
    pub name: String,
    pub size: u64,
    pub n_publishers: u64,
    pub n_subscribers: u64,
}

/// Fixed pool of [`MAX_N_BOXES`] byte-log slots.
///
/// Structural changes (create/remove) are serialized by `alloc_lock`, the
/// same partial-ordering role the original registry-wide lock played
/// ahead of any per-box lock. Reads and writes against an existing box
/// only ever touch that box's own slot.
pub struct Store {
    alloc_lock: Mutex<()>,
    slots: [Mutex<Option<BoxInode>>; MAX_N_BOXES],
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            alloc_lock: Mutex::new(()),
            slots: std::array::from_fn(|_| Mutex::new(None)),
        }
    }

    /// Allocates a new, empty box. Fails if the name is taken or the pool
    /// has no free slot.
    pub fn create(&self, name: &str) -> Result<(), StoreError> {
        let _alloc = self.alloc_lock.lock().unwrap();
        for slot in &self.slots {
            let guard = slot.lock().unwrap();
            if matches!(guard.as_ref(), Some(inode) if inode.name() == name) {
                return Err(StoreError::AlreadyExists);
            }
        }
        for slot in &self.slots {
            let mut guard = slot.lock().unwrap();
            if guard.is_none() {
                *guard = Some(BoxInode::new(name));
                return Ok(());
            }
        }
        Err(StoreError::PoolFull)
    }

    /// Frees a box's slot so its name can be reused. Any publisher or
    /// subscriber still holding a handle keeps working against its own
    /// detached copy of the bytes already read; nothing new will arrive.
    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let _alloc = self.alloc_lock.lock().unwrap();
        for slot in &self.slots {
            let mut guard = slot.lock().unwrap();
            if matches!(guard.as_ref(), Some(inode) if inode.name() == name) {
                *guard = None;
                return Ok(());
            }
        }
        Err(StoreError::NotFound)
    }

    pub fn open_publisher(
        &self,
        name: &str,
        mode: OpenMode,
    ) -> Result<PublisherHandle, StoreError> {
        for slot in &self.slots {
            let mut guard = slot.lock().unwrap();
            if let Some(inode) = guard.as_mut() {
                if inode.name() == name {
                    if !inode.attach_publisher() {
                        return Err(StoreError::PublisherTaken);
                    }
                    if mode == OpenMode::Truncate {
                        inode.truncate();
                    }
                    return Ok(PublisherHandle::new(name.to_string()));
                }
            }
        }
        Err(StoreError::NotFound)
    }

    pub fn open_subscriber(&self, name: &str) -> Result<SubscriberHandle, StoreError> {
        for slot in &self.slots {
            let mut guard = slot.lock().unwrap();
            if let Some(inode) = guard.as_mut() {
                if inode.name() == name {
                    inode.attach_subscriber();
                    return Ok(SubscriberHandle::new(name.to_string(), 0));
                }
            }
        }
        Err(StoreError::NotFound)
    }

    pub fn write(&self, handle: &PublisherHandle, buf: &[u8]) -> Result<usize, StoreError> {
        self.with_inode_mut(handle.box_name(), |inode| inode.append(buf))
    }

    pub fn read(&self, handle: &mut SubscriberHandle, buf: &mut [u8]) -> Result<usize, StoreError> {
        let cursor = handle.cursor();
        let n = self.with_inode(handle.box_name(), |inode| inode.read_from(cursor, buf))?;
        handle.advance(n);
        Ok(n)
    }

    pub fn close_publisher(&self, handle: PublisherHandle) {
        let _ = self.with_inode_mut(handle.box_name(), |inode| inode.detach_publisher());
    }

    pub fn close_subscriber(&self, handle: SubscriberHandle) {
        let _ = self.with_inode_mut(handle.box_name(), |inode| inode.detach_subscriber());
    }

    /// Snapshot of every live box, in slot order (callers sort as needed).
    pub fn list(&self) -> Vec<BoxSnapshot> {
        let mut out = Vec::new();
        for slot in &self.slots {
            let guard = slot.lock().unwrap();
            if let Some(inode) = guard.as_ref() {
                out.push(BoxSnapshot {
                    name: inode.name().to_string(),
                    size: inode.len() as u64,
                    n_publishers: u64::from(inode.n_publishers()),
                    n_subscribers: u64::from(inode.n_subscribers()),
                });
            }
        }
        out
    }

    fn with_inode_mut<R>(&self, name: &str, f: impl FnOnce(&mut BoxInode) -> R) -> Result<R, StoreError> {
        for slot in &self.slots {
            let mut guard = slot.lock().unwrap();
            if let Some(inode) = guard.as_mut() {
                if inode.name() == name {
                    return Ok(f(inode));
                }
            }
        }
        Err(StoreError::NotFound)
    }

    fn with_inode<R>(&self, name: &str, f: impl FnOnce(&BoxInode) -> R) -> Result<R, StoreError> {
        for slot in &self.slots {
            let guard = slot.lock().unwrap();
            if let Some(inode) = guard.as_ref() {
                if inode.name() == name {
                    return Ok(f(inode));
                }
            }
        }
        Err(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_remove_frees_the_slot_name() {
        let store = Store::new();
        store.create("/a").unwrap();
        assert_eq!(store.create("/a"), Err(StoreError::AlreadyExists));
        store.remove("/a").unwrap();
        store.create("/a").unwrap();
    }

    #[test]
    fn pool_full_when_every_slot_is_taken() {
        let store = Store::new();
        for i in 0..MAX_N_BOXES {
            store.create(&format!("/b{i}")).unwrap();
        }
        assert_eq!(store.create("/overflow"), Err(StoreError::PoolFull));
    }

    #[test]
    fn only_one_publisher_handle_per_box() {
        let store = Store::new();
        store.create("/a").unwrap();
        let _h1 = store.open_publisher("/a", OpenMode::Append).unwrap();
        assert_eq!(
            store.open_publisher("/a", OpenMode::Append),
            Err(StoreError::PublisherTaken)
        );
    }

    #[test]
    fn subscriber_sees_the_full_backlog_plus_whatever_comes_after() {
        let store = Store::new();
        store.create("/a").unwrap();
        let pub_handle = store.open_publisher("/a", OpenMode::Append).unwrap();
        store.write(&pub_handle, b"before").unwrap();

        let mut sub = store.open_subscriber("/a").unwrap();
        store.write(&pub_handle, b"after").unwrap();

        let mut buf = [0u8; 32];
        let n = store.read(&mut sub, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"beforeafter");
    }

    #[test]
    fn removing_a_box_frees_its_name_for_reuse() {
        let store = Store::new();
        store.create("/a").unwrap();
        let pub_handle = store.open_publisher("/a", OpenMode::Append).unwrap();
        store.write(&pub_handle, b"data").unwrap();
        store.remove("/a").unwrap();

        store.create("/a").unwrap();
        let snapshot = store
            .list()
            .into_iter()
            .find(|b| b.name == "/a")
            .unwrap();
        assert_eq!(snapshot.size, 0, "recreated box must start empty");
    }
}
