//! Core data model types for state_trie

mod key;
mod path;
mod value;

pub use key::Key;
pub use path::{matching_prefix_len, Path};
pub use value::{Encoded, Serializable, ValueNode};

/// Round/block sequence number stamped onto nodes as their origin
pub type Sequence = u64;
