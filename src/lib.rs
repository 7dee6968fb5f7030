//! An ordered bidirectional map implemented with two cross-linked AVL trees.
//!
//! [`AvlBiMap`] keeps its keys in one AVL tree and its values in another. Every
//! key node holds the [`Handle`] of its value node and vice versa, which gives
//! logarithmic lookup, removal and min/max queries from either side.
//!
//! The balancing engine is available on its own as [`Tree`].
//!
//! ```
//! use avl_bimap::{AvlBiMap, BoundedText, Duplicated, Error};
//!
//! let mut map = AvlBiMap::new();
//! for (key, value) in [("a", "1"), ("b", "2"), ("c", "3")] {
//!     map.insert_pair(BoundedText::new(key)?, BoundedText::new(value)?)?;
//! }
//! assert_eq!(map.key_height(), Some(1));
//! assert_eq!(map.get_by_key("b").map(|v| v.as_str()), Some("2"));
//! assert_eq!(map.min_by_key().map(|(k, _)| k.as_str()), Some("a"));
//!
//! assert_eq!(
//!     map.insert_pair(BoundedText::new("a")?, BoundedText::new("4")?),
//!     Err(Error::DuplicatePairElement(Duplicated::Key))
//! );
//!
//! map.delete_by_key("b")?;
//! assert!(map.find_by_value("2").is_none());
//! # Ok::<(), avl_bimap::Error>(())
//! ```

mod arena;
mod bimap;
mod error;
mod text;
pub mod tree;

pub use arena::Handle;
pub use bimap::{AvlBiMap, Iter, IterByValue};
pub use error::{Duplicated, Error, Result};
pub use text::{BoundedText, OversizePolicy, TextLimit, MAX_TEXT_LEN};
pub use tree::Tree;
