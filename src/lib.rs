//! A tree map, a chained hash map and the linked list the hash map chains on,
//! all storing their nodes flat in a Vec and linking them by index.
//!
//! ```
//! use mysterious_maps::{ChainedHashMap, Error, LinkedList, TreeMap};
//!
//! let mut tree: TreeMap<u32, &str> = TreeMap::new();
//! tree.upsert(2, "two");
//! tree.upsert(1, "one");
//! assert_eq!(vec![&1, &2], tree.keys().collect::<Vec<_>>());
//! assert_eq!(Err(Error::NotFound), tree.get(&3));
//!
//! let mut hashed: ChainedHashMap<&str, u32> = ChainedHashMap::with_buckets(16);
//! *hashed.get_or_insert_default("hits") += 1;
//! assert_eq!(Ok(&1), hashed.get("hits"));
//!
//! let mut list = LinkedList::from([1, 2, 3]);
//! assert_eq!(Ok(1), list.pop_first());
//! ```

mod arena;
pub mod error;
pub mod hash_map;
pub mod linked_list;
pub mod tree_map;

pub use error::{Error, Result};
pub use hash_map::{ChainedHashMap, DEFAULT_BUCKET_COUNT};
pub use linked_list::LinkedList;
pub use tree_map::TreeMap;
