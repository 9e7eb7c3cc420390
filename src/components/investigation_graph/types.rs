use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value bag carried on nodes; opaque to the editor.
pub type Metadata = Map<String, Value>;

/// A 2D position or offset, in screen or model space depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// The origin.
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	/// A point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Both coordinates multiplied by `k`.
	pub fn scale(self, k: f64) -> Self {
		Self::new(self.x * k, self.y * k)
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

/// Entity kinds a node can represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	/// A registered domain.
	Domain,
	/// A host under a domain.
	Subdomain,
	/// An IP address.
	Ip,
	/// A person.
	Person,
	/// An email address.
	Email,
	/// A document or file.
	File,
	/// A finding such as a CVE.
	Vulnerability,
	/// An exposed database.
	Database,
	/// A networked camera.
	Camera,
	/// A search engine hit, typically from a dork query.
	#[serde(rename = "search", alias = "search-result")]
	SearchResult,
}

/// Display attributes of a node kind.
pub struct KindStyle {
	/// Wire name, as written in snapshots.
	pub key: &'static str,
	/// Human-readable name.
	pub label: &'static str,
	/// Fill color as a CSS hex string.
	pub color: &'static str,
}

const KIND_STYLES: &[KindStyle] = &[
	KindStyle { key: "domain", label: "Domain", color: "#3B82F6" },
	KindStyle { key: "subdomain", label: "Subdomain", color: "#10B981" },
	KindStyle { key: "ip", label: "IP Address", color: "#F59E0B" },
	KindStyle { key: "person", label: "Person", color: "#EF4444" },
	KindStyle { key: "email", label: "Email", color: "#8B5CF6" },
	KindStyle { key: "file", label: "File", color: "#6B7280" },
	KindStyle { key: "vulnerability", label: "Vulnerability", color: "#DC2626" },
	KindStyle { key: "database", label: "Database", color: "#059669" },
	KindStyle { key: "camera", label: "Camera", color: "#7C3AED" },
	KindStyle { key: "search", label: "Search Result", color: "#0EA5E9" },
];

impl NodeKind {
	/// Registry order, used by the node menu and the type selector.
	pub const ALL: [NodeKind; 10] = [
		NodeKind::Domain,
		NodeKind::Subdomain,
		NodeKind::Ip,
		NodeKind::Person,
		NodeKind::Email,
		NodeKind::File,
		NodeKind::Vulnerability,
		NodeKind::Database,
		NodeKind::Camera,
		NodeKind::SearchResult,
	];

	/// Registry entry for this kind.
	pub fn style(self) -> &'static KindStyle {
		&KIND_STYLES[self as usize]
	}

	/// Wire name, e.g. `ip`.
	pub fn key(self) -> &'static str {
		self.style().key
	}

	/// Display name, e.g. `IP Address`.
	pub fn label(self) -> &'static str {
		self.style().label
	}

	/// Fill color.
	pub fn color(self) -> &'static str {
		self.style().color
	}

	/// Parses a wire name, accepting `search-result` for search results.
	pub fn from_key(key: &str) -> Option<NodeKind> {
		match key {
			"search-result" => Some(NodeKind::SearchResult),
			_ => Self::ALL.into_iter().find(|kind| kind.key() == key),
		}
	}

	/// Label given to freshly created nodes of this kind.
	pub fn placeholder_label(self) -> String {
		format!("New {}", self.label())
	}
}

/// Unique node identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

/// Connection identifier, derived from its endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
	/// The id of the connection `source -> target`.
	pub fn for_pair(source: &NodeId, target: &NodeId) -> Self {
		Self(format!("{source}->{target}"))
	}
}

impl fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Editable payload of a node. Unknown keys found in snapshot files are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
	/// Text drawn under the node.
	#[serde(default)]
	pub label: String,
	/// Free-form notes.
	#[serde(default)]
	pub description: String,
	/// Source data, e.g. the import entry the node came from. Read-only in the UI.
	#[serde(default)]
	pub metadata: Metadata,
	/// Any other keys, preserved verbatim.
	#[serde(flatten)]
	pub extra: Metadata,
}

/// A graph vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique within the store.
	pub id: NodeId,
	/// Node type, written as `type`.
	#[serde(rename = "type")]
	pub kind: NodeKind,
	/// Model-space centre, written as top-level `x`/`y`.
	#[serde(flatten)]
	pub position: Point,
	/// Label, description and metadata.
	#[serde(default)]
	pub data: NodeData,
}

/// A directed, labelled edge between two distinct nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
	/// Unique within the store.
	pub id: ConnectionId,
	/// Start node.
	pub source: NodeId,
	/// End node; the arrow points here.
	pub target: NodeId,
	/// Text drawn at the midpoint.
	#[serde(default)]
	pub label: String,
}

impl Connection {
	/// Whether `id` is either endpoint.
	pub fn touches(&self, id: &NodeId) -> bool {
		self.source == *id || self.target == *id
	}
}

/// Partial update of a node's data bag. `metadata` merges into the existing bag,
/// recursing into nested objects; any other value replaces what was there.
#[derive(Clone, Debug, Default)]
pub struct DataPatch {
	/// New label.
	pub label: Option<String>,
	/// New description.
	pub description: Option<String>,
	/// Keys to merge into the metadata bag.
	pub metadata: Option<Metadata>,
}

impl DataPatch {
	/// A patch that only sets the label.
	pub fn label(label: impl Into<String>) -> Self {
		Self {
			label: Some(label.into()),
			..Self::default()
		}
	}

	/// A patch that only sets the description.
	pub fn description(description: impl Into<String>) -> Self {
		Self {
			description: Some(description.into()),
			..Self::default()
		}
	}

	/// Writes the set fields into `data`.
	pub fn apply(self, data: &mut NodeData) {
		if let Some(label) = self.label {
			data.label = label;
		}
		if let Some(description) = self.description {
			data.description = description;
		}
		if let Some(metadata) = self.metadata {
			merge_metadata(&mut data.metadata, metadata);
		}
	}
}

fn merge_metadata(into: &mut Metadata, patch: Metadata) {
	for (key, value) in patch {
		match value {
			Value::Object(nested) => match into.get_mut(&key) {
				Some(Value::Object(existing)) => merge_metadata(existing, nested),
				_ => {
					into.insert(key, Value::Object(nested));
				}
			},
			value => {
				into.insert(key, value);
			}
		}
	}
}

/// Partial update of a node. Unset fields are left alone.
#[derive(Clone, Debug, Default)]
pub struct NodePatch {
	/// New kind.
	pub kind: Option<NodeKind>,
	/// New model-space position.
	pub position: Option<Point>,
	/// Changes to the data bag.
	pub data: DataPatch,
}

impl NodePatch {
	/// A patch that only moves the node.
	pub fn position(position: Point) -> Self {
		Self {
			position: Some(position),
			..Self::default()
		}
	}

	/// A patch that only changes the kind.
	pub fn kind(kind: NodeKind) -> Self {
		Self {
			kind: Some(kind),
			..Self::default()
		}
	}

	/// A patch that only touches the data bag.
	pub fn data(data: DataPatch) -> Self {
		Self {
			data,
			..Self::default()
		}
	}
}
