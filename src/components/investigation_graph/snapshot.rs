//! Export/import of the whole canvas as a JSON document:
//!
//! ```json
//! { "nodes": [...], "connections": [...],
//!   "metadata": { "created": "...", "zoom": 1.0, "pan": { "x": 0, "y": 0 } } }
//! ```

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::error::CanvasError;
use super::store::GraphStore;
use super::types::{Connection, Node, Point};
use super::view::ViewTransform;

#[derive(Serialize)]
struct SnapshotOut<'a> {
	nodes: &'a [Node],
	connections: &'a [Connection],
	metadata: MetadataOut,
}

#[derive(Serialize)]
struct MetadataOut {
	created: DateTime<Utc>,
	zoom: f64,
	pan: Point,
}

#[derive(Deserialize)]
struct SnapshotIn {
	nodes: Vec<Node>,
	#[serde(default)]
	connections: Option<Vec<Connection>>,
	#[serde(default)]
	metadata: Option<MetadataIn>,
}

#[derive(Deserialize, Default)]
struct MetadataIn {
	created: Option<DateTime<Utc>>,
	zoom: Option<f64>,
	pan: Option<Point>,
}

/// A fully parsed snapshot, ready to replace the live graph and view.
#[derive(Debug)]
pub struct Snapshot {
	/// Nodes and the connections that survived validation.
	pub store: GraphStore,
	/// Saved zoom and pan, defaulted when absent.
	pub view: ViewTransform,
	/// When the snapshot was written, if recorded.
	pub created: Option<DateTime<Utc>>,
}

/// Pretty-printed snapshot stamped with the current time.
pub fn serialize(store: &GraphStore, view: &ViewTransform) -> Result<Vec<u8>, CanvasError> {
	serialize_at(store, view, Utc::now())
}

/// Like [`serialize`] with an explicit creation time.
pub fn serialize_at(
	store: &GraphStore,
	view: &ViewTransform,
	created: DateTime<Utc>,
) -> Result<Vec<u8>, CanvasError> {
	let doc = SnapshotOut {
		nodes: store.nodes(),
		connections: store.connections(),
		metadata: MetadataOut {
			created,
			zoom: view.zoom,
			pan: view.pan,
		},
	};
	serde_json::to_vec_pretty(&doc).map_err(CanvasError::Encode)
}

/// Parses a snapshot document. Nothing is applied here; the caller swaps the
/// result in only once this has succeeded.
pub fn deserialize(bytes: &[u8]) -> Result<Snapshot, CanvasError> {
	let doc: SnapshotIn = serde_json::from_slice(bytes).map_err(CanvasError::MalformedSnapshot)?;
	let metadata = doc.metadata.unwrap_or_default();
	let store = GraphStore::from_parts(doc.nodes, doc.connections.unwrap_or_default())?;
	info!(
		"parsed snapshot: {} nodes, {} connections",
		store.nodes().len(),
		store.connections().len()
	);
	Ok(Snapshot {
		store,
		view: ViewTransform::new(metadata.zoom.unwrap_or(1.0), metadata.pan.unwrap_or_default()),
		created: metadata.created,
	})
}
