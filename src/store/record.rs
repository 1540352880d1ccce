//! Node record - the unit of content-addressed storage
//!
//! Record layout:
//! ```text
//! [kind tag: 1 byte][origin: 8 bytes (u64 LE)][body: bincode]
//! ```
//! The tag and body together are the node's canonical encoding; the origin
//! sits between them so it can be rewritten without touching the hashed bytes.

use crate::error::InvariantViolation;
use crate::model::{Key, Sequence};
use crate::trie::{Node, NodeKind};
use crate::{Error, Result};

const ORIGIN_SIZE: usize = 8;
const HEADER_SIZE: usize = 1 + ORIGIN_SIZE;

/// A stored node: its kind, origin stamp, and encoded body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub origin: Sequence,
    pub body: Vec<u8>,
}

impl NodeRecord {
    pub fn from_node(node: &Node) -> Self {
        NodeRecord {
            kind: node.kind(),
            origin: node.origin(),
            body: node.encode_body(),
        }
    }

    /// Content key of the stored node
    pub fn hash(&self) -> Key {
        Key::digest_many(&[&[self.kind.tag()], &self.body])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(HEADER_SIZE + self.body.len());
        output.push(self.kind.tag());
        output.extend_from_slice(&self.origin.to_le_bytes());
        output.extend_from_slice(&self.body);
        output
    }

    /// Parse a stored record. `key` is only used for error context.
    pub fn from_bytes(key: &Key, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(decoding(key, "node record", "empty record"));
        }

        let kind = NodeKind::from_tag(data[0]).ok_or_else(|| InvariantViolation::UnknownNodeType {
            key: key.to_hex(),
            tag: data[0],
        })?;

        if data.len() < HEADER_SIZE {
            return Err(decoding(
                key,
                kind.name(),
                format!("record truncated to {} bytes", data.len()),
            ));
        }

        let mut origin = [0u8; ORIGIN_SIZE];
        origin.copy_from_slice(&data[1..HEADER_SIZE]);

        Ok(NodeRecord {
            kind,
            origin: Sequence::from_le_bytes(origin),
            body: data[HEADER_SIZE..].to_vec(),
        })
    }

    pub fn into_node(self, key: &Key) -> Result<Node> {
        Node::decode_body(self.kind, &self.body, self.origin)
            .map_err(|e| decoding(key, self.kind.name(), e.to_string()))
    }
}

/// Encode a node for storage
pub fn encode_node(node: &Node) -> Vec<u8> {
    NodeRecord::from_node(node).to_bytes()
}

/// Decode a stored node
pub fn decode_node(key: &Key, data: &[u8]) -> Result<Node> {
    NodeRecord::from_bytes(key, data)?.into_node(key)
}

fn decoding(key: &Key, expected: &'static str, reason: impl Into<String>) -> Error {
    Error::Decoding {
        key: key.to_hex(),
        expected,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Path, ValueNode};
    use crate::trie::{FullNode, LeafNode};

    fn sample_leaf() -> Node {
        LeafNode::new(
            Path::from_bytes(b"cat"),
            7,
            Some(ValueNode::new(b"A".to_vec())),
        )
        .into()
    }

    #[test]
    fn test_record_roundtrip_keeps_origin() {
        let node = sample_leaf();
        let key = node.hash();
        let restored = decode_node(&key, &encode_node(&node)).unwrap();

        assert_eq!(restored, node);
        assert_eq!(restored.origin(), 7);
    }

    #[test]
    fn test_record_hash_matches_node_hash() {
        let mut full = FullNode::new(Some(ValueNode::new(b"v".to_vec())), 3);
        full.put_child(1, Some(Key::digest(b"c")));
        let node: Node = full.into();
        assert_eq!(NodeRecord::from_node(&node).hash(), node.hash());
    }

    #[test]
    fn test_unknown_tag_is_invariant_violation() {
        let key = Key::digest(b"k");
        let err = decode_node(&key, &[0x20, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_truncated_record_is_decoding_error() {
        let key = Key::digest(b"k");
        let err = decode_node(&key, &[1, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::Decoding { expected: "leaf node", .. }));

        let err = decode_node(&key, &[]).unwrap_err();
        assert!(matches!(err, Error::Decoding { .. }));
    }

    #[test]
    fn test_corrupt_body_is_decoding_error() {
        let node = sample_leaf();
        let key = node.hash();
        let mut bytes = encode_node(&node);
        bytes.truncate(bytes.len() - 1);
        bytes[HEADER_SIZE] = 0xff;

        let err = decode_node(&key, &bytes).unwrap_err();
        assert!(matches!(err, Error::Decoding { .. }));
        assert!(err.to_string().contains(&key.to_hex()));
    }

    #[test]
    fn test_out_of_range_nibble_is_decoding_error() {
        let key = Key::digest(b"k");
        let mut bytes = vec![NodeKind::Leaf.tag()];
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend(bincode::serialize(&(vec![0x20u8], Some(b"v".to_vec()))).unwrap());

        let err = decode_node(&key, &bytes).unwrap_err();
        assert!(matches!(err, Error::Decoding { expected: "leaf node", .. }));
        assert!(err.to_string().contains(&key.to_hex()));
    }
}
