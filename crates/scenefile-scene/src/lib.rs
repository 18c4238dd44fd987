//! Scene document model
//!
//! The authoring application dumps its data-blocks (collections, objects,
//! meshes, lights, materials, worlds and images) to a JSON scene document.
//! This crate loads that document and offers the traversal, transform,
//! node-graph and mesh-editing queries the exporter needs.

pub mod document;
pub mod light;
pub mod mesh;
pub mod node;
pub mod object;

pub use document::{Collection, Document, Image, Material, World};
pub use light::{LightData, LightKind};
pub use mesh::{Corner, MeshData, Polygon, TriangulatedMesh, UvLayer};
pub use node::{Link, Node, NodeKind, NodeTree, Socket, SocketValue};
pub use object::{Object, ObjectKind, RotationMode};
