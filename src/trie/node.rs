//! Trie node types

use crate::model::{Key, Path, Sequence, ValueNode};
use std::ops::BitOr;

/// Number of children of a full node, one per nibble
pub const FULL_NODE_CHILDREN: usize = 16;

/// A set of node kinds, used both as the iteration filter and as the tag
/// byte leading every encoded node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeTypes(u8);

impl NodeTypes {
    pub const LEAF: NodeTypes = NodeTypes(1);
    pub const FULL: NodeTypes = NodeTypes(2);
    pub const EXTENSION: NodeTypes = NodeTypes(4);
    /// The values carried by leaf and full nodes
    pub const VALUE: NodeTypes = NodeTypes(8);
    pub const ALL_NODES: NodeTypes = NodeTypes(1 | 2 | 4);
    pub const ALL: NodeTypes = NodeTypes(1 | 2 | 4 | 8);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn includes(self, other: NodeTypes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NodeTypes {
    type Output = NodeTypes;

    fn bitor(self, rhs: NodeTypes) -> NodeTypes {
        NodeTypes(self.0 | rhs.0)
    }
}

/// The three node shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Leaf,
    Full,
    Extension,
}

impl NodeKind {
    pub fn tag(self) -> u8 {
        self.types().bits()
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(NodeKind::Leaf),
            2 => Some(NodeKind::Full),
            4 => Some(NodeKind::Extension),
            _ => None,
        }
    }

    pub fn types(self) -> NodeTypes {
        match self {
            NodeKind::Leaf => NodeTypes::LEAF,
            NodeKind::Full => NodeTypes::FULL,
            NodeKind::Extension => NodeTypes::EXTENSION,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf node",
            NodeKind::Full => "full node",
            NodeKind::Extension => "extension node",
        }
    }
}

/// End of a path: the residual suffix and the value stored there
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNode {
    pub path: Path,
    pub value: Option<ValueNode>,
    pub origin: Sequence,
}

impl LeafNode {
    pub fn new(path: Path, origin: Sequence, value: Option<ValueNode>) -> Self {
        LeafNode {
            path,
            value,
            origin,
        }
    }
}

/// A shared prefix in front of exactly one full node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionNode {
    pub path: Path,
    pub child: Key,
    pub origin: Sequence,
}

impl ExtensionNode {
    pub fn new(path: Path, child: Key, origin: Sequence) -> Self {
        ExtensionNode {
            path,
            child,
            origin,
        }
    }
}

/// A fan-out point with up to sixteen children and an optional value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FullNode {
    pub children: [Option<Key>; FULL_NODE_CHILDREN],
    pub value: Option<ValueNode>,
    pub origin: Sequence,
}

impl FullNode {
    pub fn new(value: Option<ValueNode>, origin: Sequence) -> Self {
        FullNode {
            children: Default::default(),
            value,
            origin,
        }
    }

    pub fn child(&self, nibble: u8) -> Option<&Key> {
        self.children[nibble as usize].as_ref()
    }

    pub fn put_child(&mut self, nibble: u8, key: Option<Key>) {
        self.children[nibble as usize] = key;
    }

    pub fn num_children(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    /// Present children in ascending nibble order
    pub fn iter_children(&self) -> impl Iterator<Item = (u8, &Key)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|k| (i as u8, k)))
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// A node in the merkle patricia trie
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Extension(ExtensionNode),
    Full(FullNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Extension(_) => NodeKind::Extension,
            Node::Full(_) => NodeKind::Full,
        }
    }

    /// Canonical encoding: the kind tag followed by the bincode body.
    /// The origin stamp is metadata and is left out.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.kind().tag()];
        out.extend(self.encode_body());
        out
    }

    pub(crate) fn encode_body(&self) -> Vec<u8> {
        match self {
            Node::Leaf(n) => bincode::serialize(&(&n.path, &n.value)),
            Node::Extension(n) => bincode::serialize(&(&n.path, &n.child)),
            Node::Full(n) => bincode::serialize(&(&n.children, &n.value)),
        }
        .expect("serialization should not fail")
    }

    pub(crate) fn decode_body(
        kind: NodeKind,
        body: &[u8],
        origin: Sequence,
    ) -> std::result::Result<Node, bincode::Error> {
        Ok(match kind {
            NodeKind::Leaf => {
                let (path, value): (Path, Option<ValueNode>) = bincode::deserialize(body)?;
                Node::Leaf(LeafNode::new(path, origin, value))
            }
            NodeKind::Extension => {
                let (path, child): (Path, Key) = bincode::deserialize(body)?;
                Node::Extension(ExtensionNode::new(path, child, origin))
            }
            NodeKind::Full => {
                let (children, value): ([Option<Key>; FULL_NODE_CHILDREN], Option<ValueNode>) =
                    bincode::deserialize(body)?;
                Node::Full(FullNode {
                    children,
                    value,
                    origin,
                })
            }
        })
    }

    /// The content key of this node
    pub fn hash(&self) -> Key {
        Key::digest(&self.encode())
    }

    pub fn value(&self) -> Option<&ValueNode> {
        match self {
            Node::Leaf(n) => n.value.as_ref(),
            Node::Full(n) => n.value.as_ref(),
            Node::Extension(_) => None,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value().is_some()
    }

    pub fn origin(&self) -> Sequence {
        match self {
            Node::Leaf(n) => n.origin,
            Node::Extension(n) => n.origin,
            Node::Full(n) => n.origin,
        }
    }

    pub fn set_origin(&mut self, origin: Sequence) {
        match self {
            Node::Leaf(n) => n.origin = origin,
            Node::Extension(n) => n.origin = origin,
            Node::Full(n) => n.origin = origin,
        }
    }

    pub fn with_origin(mut self, origin: Sequence) -> Self {
        self.set_origin(origin);
        self
    }
}

impl From<LeafNode> for Node {
    fn from(node: LeafNode) -> Self {
        Node::Leaf(node)
    }
}

impl From<ExtensionNode> for Node {
    fn from(node: ExtensionNode) -> Self {
        Node::Extension(node)
    }
}

impl From<FullNode> for Node {
    fn from(node: FullNode) -> Self {
        Node::Full(node)
    }
}
