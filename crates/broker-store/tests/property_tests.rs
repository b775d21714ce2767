//! Property-based tests for the byte-log store's size and ordering
//! invariants.

use mbroker_proto::BOX_SIZE;
use mbroker_store::{OpenMode, Store};
use proptest::prelude::*;

proptest! {
    /// INV-STORE-01: appended bytes never push a box past BOX_SIZE, no
    /// matter how the writes are chunked.
    #[test]
    fn prop_append_never_exceeds_box_size(chunk_sizes in prop::collection::vec(0usize..200, 0..50)) {
        let store = Store::new();
        store.create("/p").unwrap();
        let handle = store.open_publisher("/p", OpenMode::Append).unwrap();

        let mut total_written = 0usize;
        for size in chunk_sizes {
            let chunk = vec![7u8; size];
            let n = store.write(&handle, &chunk).unwrap();
            total_written += n;
            prop_assert!(total_written <= BOX_SIZE);
        }
    }

    /// INV-STORE-03: a subscriber reads the box's entire backlog plus
    /// whatever is written afterward, as one ordered prefix, no matter
    /// when within that window it attaches.
    #[test]
    fn prop_subscriber_reads_backlog_then_new_writes(
        pre_write in 0usize..300,
        post_write in 0usize..300,
    ) {
        let store = Store::new();
        store.create("/p").unwrap();
        let pub_handle = store.open_publisher("/p", OpenMode::Append).unwrap();
        store.write(&pub_handle, &vec![1u8; pre_write]).unwrap();

        let mut sub = store.open_subscriber("/p").unwrap();
        store.write(&pub_handle, &vec![2u8; post_write]).unwrap();

        let mut total_read = 0usize;
        let mut buf = [0u8; 64];
        loop {
            let n = store.read(&mut sub, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            total_read += n;
        }
        let expected = (pre_write + post_write).min(BOX_SIZE);
        prop_assert_eq!(total_read, expected);
    }
}
