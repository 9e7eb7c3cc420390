use std::collections::HashSet;

use log::warn;

use super::error::CanvasError;
use super::types::{
	Connection, ConnectionId, DataPatch, Node, NodeData, NodeId, NodeKind, NodePatch, Point,
};

/// Owns the nodes and connections of one editor session.
///
/// Every operation is total: unknown ids degrade to no-ops so that stale
/// references coming from the UI never leave the graph inconsistent.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	nodes: Vec<Node>,
	connections: Vec<Connection>,
	next_id: u64,
}

/// Node creations and connections produced by an importer, merged additively.
#[derive(Clone, Debug, Default)]
pub struct GraphDelta {
	/// Nodes to create, in order.
	pub nodes: Vec<NodeDraft>,
	/// `(source, target, label)` as indices into `nodes`.
	pub connections: Vec<(usize, usize, String)>,
}

/// A node to be created; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NodeDraft {
	/// Node type.
	pub kind: NodeKind,
	/// Model-space position.
	pub position: Point,
	/// Data applied over the kind's defaults.
	pub data: DataPatch,
}

impl GraphStore {
	/// An empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a store from loaded parts, restoring the store invariants.
	///
	/// Duplicate node ids are rejected. Connections with a missing endpoint,
	/// self-loops and repeated pairs are dropped.
	pub fn from_parts(nodes: Vec<Node>, connections: Vec<Connection>) -> Result<Self, CanvasError> {
		let mut seen = HashSet::new();
		for node in &nodes {
			if !seen.insert(&node.id) {
				return Err(CanvasError::DuplicateNodeId(node.id.clone()));
			}
		}

		let mut store = Self {
			nodes,
			connections: Vec::with_capacity(connections.len()),
			next_id: 0,
		};
		for conn in connections {
			let (source, target) = (conn.source.clone(), conn.target.clone());
			if store.create_connection(&source, &target, conn.label).is_none() {
				warn!("dropping connection {} ({source} -> {target})", conn.id);
			}
		}
		Ok(store)
	}

	/// Nodes in creation order; later nodes draw on top.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Connections in creation order.
	pub fn connections(&self) -> &[Connection] {
		&self.connections
	}

	/// Looks up a node by id.
	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.iter().find(|node| node.id == *id)
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: &NodeId) -> bool {
		self.node(id).is_some()
	}

	/// Looks up a connection by id.
	pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
		self.connections.iter().find(|conn| conn.id == *id)
	}

	/// The connection from `source` to `target`, if any. Direction matters.
	pub fn connection_between(&self, source: &NodeId, target: &NodeId) -> Option<&Connection> {
		self.connections
			.iter()
			.find(|conn| conn.source == *source && conn.target == *target)
	}

	fn allocate_id(&mut self) -> NodeId {
		loop {
			self.next_id += 1;
			let id = NodeId(format!("node-{}", self.next_id));
			if !self.contains(&id) {
				return id;
			}
		}
	}

	/// Creates a node of `kind` at a model-space position and returns a copy of it.
	pub fn create_node(&mut self, kind: NodeKind, position: Point, overrides: DataPatch) -> Node {
		let mut data = NodeData {
			label: kind.placeholder_label(),
			..NodeData::default()
		};
		overrides.apply(&mut data);
		let node = Node {
			id: self.allocate_id(),
			kind,
			position,
			data,
		};
		self.nodes.push(node.clone());
		node
	}

	/// Merges `patch` into the node. Returns `false` if no such node exists.
	pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> bool {
		let Some(node) = self.nodes.iter_mut().find(|node| node.id == *id) else {
			return false;
		};
		if let Some(kind) = patch.kind {
			node.kind = kind;
		}
		if let Some(position) = patch.position {
			node.position = position;
		}
		patch.data.apply(&mut node.data);
		true
	}

	/// Removes the node and every connection touching it.
	pub fn delete_node(&mut self, id: &NodeId) -> Option<Node> {
		let idx = self.nodes.iter().position(|node| node.id == *id)?;
		self.connections.retain(|conn| !conn.touches(id));
		Some(self.nodes.remove(idx))
	}

	/// Links two existing, distinct nodes. Returns the new connection id, or
	/// `None` when an endpoint is missing, the pair is a self-loop, or the
	/// ordered pair is already connected.
	pub fn create_connection(
		&mut self,
		source: &NodeId,
		target: &NodeId,
		label: impl Into<String>,
	) -> Option<ConnectionId> {
		if source == target || !self.contains(source) || !self.contains(target) {
			return None;
		}
		if self.connection_between(source, target).is_some() {
			return None;
		}
		let id = ConnectionId::for_pair(source, target);
		self.connections.push(Connection {
			id: id.clone(),
			source: source.clone(),
			target: target.clone(),
			label: label.into(),
		});
		Some(id)
	}

	/// Removes a connection, returning it.
	pub fn delete_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
		let idx = self.connections.iter().position(|conn| conn.id == *id)?;
		Some(self.connections.remove(idx))
	}

	/// Creates every drafted node and connection; returns the new node ids in draft order.
	pub fn apply(&mut self, delta: GraphDelta) -> Vec<NodeId> {
		let ids: Vec<NodeId> = delta
			.nodes
			.into_iter()
			.map(|draft| self.create_node(draft.kind, draft.position, draft.data).id)
			.collect();
		for (source, target, label) in delta.connections {
			if let (Some(source), Some(target)) = (ids.get(source), ids.get(target)) {
				self.create_connection(source, target, label);
			}
		}
		ids
	}

	/// Topmost node whose disc of `radius` contains `point` (model space).
	pub fn node_at(&self, point: Point, radius: f64) -> Option<&Node> {
		self.nodes
			.iter()
			.rev()
			.find(|node| node.position.distance(point) <= radius)
	}

	/// Topmost connection whose segment passes within `tolerance` of `point`.
	pub fn connection_at(&self, point: Point, tolerance: f64) -> Option<&Connection> {
		self.connections.iter().rev().find(|conn| {
			match (self.node(&conn.source), self.node(&conn.target)) {
				(Some(a), Some(b)) => segment_distance(point, a.position, b.position) <= tolerance,
				_ => false,
			}
		})
	}
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
	let ab = b - a;
	let len_sq = ab.x * ab.x + ab.y * ab.y;
	if len_sq < f64::EPSILON {
		return p.distance(a);
	}
	let ap = p - a;
	let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
	p.distance(a + ab.scale(t))
}
