//! Shader node graphs
//!
//! Materials and worlds carry a node tree: typed nodes with named input and
//! output sockets, connected by links. Sockets are addressed by identifier
//! (falling back to their display name), never by position.

use serde::{Deserialize, Serialize};

/// Node type as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    OutputMaterial,
    OutputWorld,
    BsdfPrincipled,
    BsdfDiffuse,
    BsdfGlossy,
    TexImage,
    TexEnvironment,
    Background,
    NormalMap,
    Math,
    VectMath,
    #[serde(rename = "MIX_RGB")]
    MixRgb,
    Value,
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    /// Surface shader nodes that can feed a material output
    pub fn is_bsdf(&self) -> bool {
        matches!(
            self,
            NodeKind::BsdfPrincipled | NodeKind::BsdfDiffuse | NodeKind::BsdfGlossy
        )
    }

    /// Nodes able to multiply two inputs
    pub fn is_multiply(&self) -> bool {
        matches!(self, NodeKind::Math | NodeKind::VectMath | NodeKind::MixRgb)
    }
}

/// Unlinked socket value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SocketValue {
    Scalar(f32),
    Vector(Vec<f32>),
}

impl SocketValue {
    /// Scalar value, or the first component of a vector
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            SocketValue::Scalar(v) => Some(*v),
            SocketValue::Vector(v) => v.first().copied(),
        }
    }
}

/// Node input or output socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub name: String,
    /// Unique key within the node; defaults to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SocketValue>,
}

impl Socket {
    pub fn identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or(&self.name)
    }
}

/// Shader node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub inputs: Vec<Socket>,
    #[serde(default)]
    pub outputs: Vec<Socket>,
    /// Image data-block name for texture nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub is_active_output: bool,
}

impl Node {
    /// Input socket by identifier or name
    pub fn input(&self, key: &str) -> Option<&Socket> {
        self.inputs
            .iter()
            .find(|s| s.identifier() == key)
            .or_else(|| self.inputs.iter().find(|s| s.name == key))
    }

    /// First input socket matching any of the given names
    pub fn input_any(&self, keys: &[&str]) -> Option<&Socket> {
        keys.iter().find_map(|key| self.input(key))
    }

    pub fn output(&self, key: &str) -> Option<&Socket> {
        self.outputs
            .iter()
            .find(|s| s.identifier() == key)
            .or_else(|| self.outputs.iter().find(|s| s.name == key))
    }
}

/// Connection from an output socket to an input socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_node: String,
    pub from_socket: String,
    pub to_node: String,
    pub to_socket: String,
}

/// Node graph owned by a material or world
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTree {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl NodeTree {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Nodes of the given kind, in tree order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// The active output node of a kind, or the first one
    pub fn active_output(&self, kind: NodeKind) -> Option<&Node> {
        self.nodes_of_kind(kind)
            .find(|n| n.is_active_output)
            .or_else(|| self.nodes_of_kind(kind).next())
    }

    /// Link feeding the given input socket of a node
    pub fn link_into(&self, node: &Node, socket: &Socket) -> Option<&Link> {
        self.links.iter().find(|l| {
            l.to_node == node.name
                && node
                    .input(&l.to_socket)
                    .is_some_and(|target| std::ptr::eq(target, socket))
        })
    }

    /// Node feeding the given input socket, with the link that connects it
    pub fn upstream(&self, node: &Node, socket: &Socket) -> Option<(&Node, &Link)> {
        let link = self.link_into(node, socket)?;
        self.node(&link.from_node).map(|from| (from, link))
    }

    /// Whether an input socket has an incoming link
    pub fn is_linked(&self, node: &Node, socket: &Socket) -> bool {
        self.link_into(node, socket).is_some()
    }
}
