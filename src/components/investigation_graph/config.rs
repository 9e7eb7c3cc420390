use super::types::Point;

/// Tunables of the editor, passed to the canvas component as a prop.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
	/// Node disc radius in model units; also the pointer hit radius.
	pub node_radius: f64,
	/// Max pointer distance (screen px) from a connection line that still selects it.
	pub connection_hit_tolerance: f64,
	/// Pointer travel (screen px) below which a press on a node counts as a click.
	pub click_slop: f64,
	/// Keep Connecting mode active after a connection is completed.
	pub chain_connections: bool,
	/// Label given to connections drawn with the link tool.
	pub default_connection_label: String,
	/// Screen position imported bundles are centred on.
	pub import_center: Point,
	/// Radius (screen px at 100% zoom) of the ring imported nodes are laid out on.
	pub import_radius: f64,
	/// `sessionStorage` key producers leave import bundles under.
	pub import_storage_key: String,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			node_radius: 25.0,
			connection_hit_tolerance: 6.0,
			click_slop: 3.0,
			chain_connections: true,
			default_connection_label: "connected to".into(),
			import_center: Point::new(400.0, 300.0),
			import_radius: 150.0,
			import_storage_key: "canvasImport".into(),
		}
	}
}
