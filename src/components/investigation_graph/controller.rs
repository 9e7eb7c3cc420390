use log::{debug, info, warn};
use serde_json::Value;

use super::config::EditorConfig;
use super::error::CanvasError;
use super::import;
use super::snapshot;
use super::store::GraphStore;
use super::types::{ConnectionId, DataPatch, Node, NodeId, NodeKind, NodePatch, Point};
use super::view::ViewTransform;

/// What the pointer is currently doing. Exactly one mode is active at a time;
/// the "add node" menu is tracked separately and may be open in any mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
	/// Nothing held.
	Idle,
	/// A node is held. `grab_offset` is the pointer position relative to the
	/// node's screen position at press time, so the node does not jump.
	DraggingNode {
		/// Node being dragged.
		id: NodeId,
		/// Pointer minus node, in screen space.
		grab_offset: Point,
		/// Where the press happened, for the click slop.
		press: Point,
		/// Set once the pointer left the click slop.
		moved: bool,
	},
	/// Background held; pointer motion pans the view.
	Panning {
		/// Previous pointer position in screen space.
		last: Point,
	},
	/// Link tool is on; `source` is the pending first endpoint.
	Connecting {
		/// First endpoint, once picked.
		source: Option<NodeId>,
	},
}

/// What the properties panel and Delete key act on.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
	/// Nothing selected.
	#[default]
	None,
	/// A node.
	Node(NodeId),
	/// A connection line.
	Connection(ConnectionId),
}

/// Summary the overlay UI renders from.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorStatus {
	/// Zoom as a rounded percentage.
	pub zoom_percent: u32,
	/// Number of nodes in the graph.
	pub node_count: usize,
	/// Number of connections in the graph.
	pub connection_count: usize,
	/// Link tool is on.
	pub connecting: bool,
	/// Screen position of the open node menu.
	pub menu_at: Option<Point>,
	/// Copy of the selected node for the properties panel.
	pub selected: Option<Node>,
	/// Status bar hint for the current mode.
	pub hint: &'static str,
}

/// Turns pointer and keyboard input into graph and view changes for one editor session.
pub struct InteractionController {
	store: GraphStore,
	view: ViewTransform,
	mode: Mode,
	/// Screen position of the open "add node" menu.
	menu: Option<Point>,
	selection: Selection,
	config: EditorConfig,
}

impl Default for InteractionController {
	fn default() -> Self {
		Self::new(EditorConfig::default())
	}
}

/// Client coordinates relative to the canvas origin, if the canvas has been laid out.
fn locate(client: Point, origin: Option<Point>) -> Option<Point> {
	match origin {
		Some(origin) => Some(client - origin),
		None => {
			debug!("pointer event before canvas layout, ignored");
			None
		}
	}
}

impl InteractionController {
	/// Empty graph, default view.
	pub fn new(config: EditorConfig) -> Self {
		Self {
			store: GraphStore::new(),
			view: ViewTransform::default(),
			mode: Mode::Idle,
			menu: None,
			selection: Selection::None,
			config,
		}
	}

	/// The graph being edited.
	pub fn store(&self) -> &GraphStore {
		&self.store
	}

	/// Current zoom and pan.
	pub fn view(&self) -> &ViewTransform {
		&self.view
	}

	/// Current pointer mode.
	pub fn mode(&self) -> &Mode {
		&self.mode
	}

	/// Screen position of the node menu, if open.
	pub fn menu_at(&self) -> Option<Point> {
		self.menu
	}

	/// Current selection.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Settings this session was created with.
	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	/// Whether the link tool is on.
	pub fn is_connecting(&self) -> bool {
		matches!(self.mode, Mode::Connecting { .. })
	}

	/// First endpoint picked with the link tool.
	pub fn pending_source(&self) -> Option<&NodeId> {
		match &self.mode {
			Mode::Connecting { source } => source.as_ref(),
			_ => None,
		}
	}

	/// Node currently being moved. A held node that has not left the click slop is not dragged yet.
	pub fn dragged_node(&self) -> Option<&NodeId> {
		match &self.mode {
			Mode::DraggingNode { id, moved: true, .. } => Some(id),
			_ => None,
		}
	}

	/// The selected node, if the selection is a node.
	pub fn selected_node(&self) -> Option<&Node> {
		match &self.selection {
			Selection::Node(id) => self.store.node(id),
			_ => None,
		}
	}

	/// Primary button press. `client` is in page coordinates, `origin` is the canvas'
	/// top-left corner (`None` before layout), `clicks` the browser's click count.
	///
	/// A node press starts a drag, or picks an endpoint while connecting. A press on
	/// a connection selects it. A double press on the background opens the node menu.
	pub fn pointer_down(&mut self, client: Point, origin: Option<Point>, clicks: u32) {
		let Some(screen) = locate(client, origin) else {
			return;
		};
		let model = self.view.screen_to_model(screen);
		self.menu = None;

		if let Some(node) = self.store.node_at(model, self.config.node_radius) {
			let id = node.id.clone();
			if self.is_connecting() {
				self.connect_click(id);
			} else {
				let grab_offset = screen - self.view.model_to_screen(node.position);
				self.mode = Mode::DraggingNode {
					id,
					grab_offset,
					press: screen,
					moved: false,
				};
			}
			return;
		}

		if !self.is_connecting() {
			let tolerance = self.config.connection_hit_tolerance / self.view.zoom;
			if let Some(conn) = self.store.connection_at(model, tolerance) {
				self.selection = Selection::Connection(conn.id.clone());
				self.mode = Mode::Idle;
				return;
			}
		}

		self.background_press(screen, clicks);
	}

	fn background_press(&mut self, screen: Point, clicks: u32) {
		if clicks >= 2 {
			self.menu = Some(screen);
			return;
		}
		if let Mode::Connecting { source } = &mut self.mode {
			if source.take().is_some() {
				debug!("pending connection aborted");
			}
			self.selection = Selection::None;
			return;
		}
		self.selection = Selection::None;
		self.mode = Mode::Panning { last: screen };
	}

	/// Moves the dragged node or pans the view.
	pub fn pointer_move(&mut self, client: Point, origin: Option<Point>) {
		let Some(screen) = locate(client, origin) else {
			return;
		};
		let mut lost = false;
		match &mut self.mode {
			Mode::DraggingNode {
				id,
				grab_offset,
				press,
				moved,
			} => {
				if !*moved && screen.distance(*press) < self.config.click_slop {
					return;
				}
				*moved = true;
				let position = self.view.screen_to_model(screen - *grab_offset);
				lost = !self.store.update_node(id, NodePatch::position(position));
			}
			Mode::Panning { last } => {
				let delta = screen - *last;
				*last = screen;
				self.view.pan_by(delta);
			}
			_ => {}
		}
		if lost {
			self.mode = Mode::Idle;
		}
	}

	/// Ends any drag or pan. A press on a node that never moved counts as a click.
	pub fn pointer_up(&mut self) {
		match std::mem::replace(&mut self.mode, Mode::Idle) {
			Mode::DraggingNode { id, moved: false, .. } => self.click_node(id),
			Mode::DraggingNode { .. } | Mode::Panning { .. } => {}
			other => self.mode = other,
		}
	}

	/// Zooms one step towards the cursor. Purely horizontal scrolls carry no
	/// vertical delta and are ignored.
	pub fn wheel(&mut self, client: Point, origin: Option<Point>, delta_y: f64) {
		if delta_y == 0.0 {
			return;
		}
		let Some(screen) = locate(client, origin) else {
			return;
		};
		let step = if delta_y > 0.0 {
			-super::view::ZOOM_STEP
		} else {
			super::view::ZOOM_STEP
		};
		self.view.zoom_around(screen, self.view.zoom + step);
	}

	fn click_node(&mut self, id: NodeId) {
		if self.store.contains(&id) {
			self.selection = Selection::Node(id);
		}
	}

	fn connect_click(&mut self, id: NodeId) {
		let Mode::Connecting { source } = &self.mode else {
			return;
		};
		match source.clone() {
			None => {
				self.mode = Mode::Connecting { source: Some(id) };
			}
			Some(source) if source == id => {}
			Some(source) => {
				let label = self.config.default_connection_label.clone();
				if let Some(conn) = self.store.create_connection(&source, &id, label) {
					info!("created connection {conn}");
				}
				self.mode = if self.config.chain_connections {
					Mode::Connecting { source: None }
				} else {
					Mode::Idle
				};
			}
		}
	}

	/// Turns the link tool on or off. Any pending source is dropped.
	pub fn set_connecting(&mut self, on: bool) {
		if on == self.is_connecting() {
			return;
		}
		self.mode = if on {
			Mode::Connecting { source: None }
		} else {
			Mode::Idle
		};
	}

	/// Flips the link tool.
	pub fn toggle_connecting(&mut self) {
		self.set_connecting(!self.is_connecting());
	}

	/// Creates a node of `kind` where the menu was opened and closes the menu.
	/// The pointer mode, including a pending connection source, is left alone.
	pub fn choose_node_kind(&mut self, kind: NodeKind) -> Option<NodeId> {
		let at = self.menu.take()?;
		let position = self.view.screen_to_model(at);
		Some(self.store.create_node(kind, position, DataPatch::default()).id)
	}

	/// Closes the node menu without creating anything.
	pub fn close_menu(&mut self) {
		self.menu = None;
	}

	/// Edits the selected node. Returns `false` when no node is selected.
	pub fn update_selected(&mut self, patch: NodePatch) -> bool {
		match &self.selection {
			Selection::Node(id) => self.store.update_node(id, patch),
			_ => false,
		}
	}

	/// Clears a node selection.
	pub fn close_properties(&mut self) {
		if matches!(self.selection, Selection::Node(_)) {
			self.selection = Selection::None;
		}
	}

	/// Deletes a node and drops every piece of UI state that referred to it.
	pub fn delete_node(&mut self, id: &NodeId) -> bool {
		if self.store.delete_node(id).is_none() {
			return false;
		}
		let stale_selection = match &self.selection {
			Selection::Node(selected) => selected == id,
			Selection::Connection(conn) => self.store.connection(conn).is_none(),
			Selection::None => false,
		};
		if stale_selection {
			self.selection = Selection::None;
		}
		let was_dragged = match &mut self.mode {
			Mode::DraggingNode { id: dragged, .. } => *dragged == *id,
			Mode::Connecting { source } => {
				if source.as_ref() == Some(id) {
					*source = None;
				}
				false
			}
			_ => false,
		};
		if was_dragged {
			self.mode = Mode::Idle;
		}
		true
	}

	/// Deletes the selected node or connection.
	pub fn delete_selected(&mut self) -> bool {
		match std::mem::take(&mut self.selection) {
			Selection::Node(id) => self.delete_node(&id),
			Selection::Connection(id) => self.store.delete_connection(&id).is_some(),
			Selection::None => false,
		}
	}

	/// Handles `Escape` and `Delete`/`Backspace`; other keys are ignored.
	pub fn key_down(&mut self, key: &str) {
		match key {
			"Escape" => {
				self.selection = Selection::None;
				if self.menu.take().is_some() {
					return;
				}
				self.mode = match std::mem::replace(&mut self.mode, Mode::Idle) {
					Mode::Connecting { source: Some(_) } => Mode::Connecting { source: None },
					Mode::Connecting { source: None } => Mode::Idle,
					other => other,
				};
			}
			"Delete" | "Backspace" => {
				self.delete_selected();
			}
			_ => {}
		}
	}

	/// One zoom step in, around the canvas origin.
	pub fn zoom_in(&mut self) {
		self.view.zoom_in();
	}

	/// One zoom step out, around the canvas origin.
	pub fn zoom_out(&mut self) {
		self.view.zoom_out();
	}

	/// Back to 100% with no pan.
	pub fn reset_view(&mut self) {
		self.view.reset();
	}

	/// Merges an external result bundle into the graph. Unknown bundle types are skipped.
	pub fn import_bundle(&mut self, bundle: &Value) -> Result<Vec<NodeId>, CanvasError> {
		let center = self.view.screen_to_model(self.config.import_center);
		let radius = self.config.import_radius / self.view.zoom;
		match import::import_bundle(bundle, center, radius) {
			Ok(delta) => {
				let ids = self.store.apply(delta);
				info!("imported {} nodes", ids.len());
				Ok(ids)
			}
			Err(CanvasError::UnknownBundle(tag)) => {
				debug!("skipping import bundle of unknown type `{tag}`");
				Ok(Vec::new())
			}
			Err(err) => {
				warn!("import failed: {err}");
				Err(err)
			}
		}
	}

	/// Encodes graph and view as a JSON snapshot.
	pub fn save_snapshot(&self) -> Result<Vec<u8>, CanvasError> {
		snapshot::serialize(&self.store, &self.view)
	}

	/// Replaces graph and view with a parsed snapshot. On error nothing changes.
	pub fn load_snapshot(&mut self, bytes: &[u8]) -> Result<(), CanvasError> {
		let loaded = snapshot::deserialize(bytes)?;
		self.store = loaded.store;
		self.view = loaded.view;
		self.mode = Mode::Idle;
		self.menu = None;
		self.selection = Selection::None;
		Ok(())
	}

	/// Snapshot of everything the overlay UI shows.
	pub fn status(&self) -> EditorStatus {
		let hint = match &self.mode {
			Mode::Connecting { source: Some(_) } => "Click another node to connect them",
			Mode::Connecting { source: None } => "Click a node to start connecting",
			_ => "Double-click to add node | Click \"Connect\" then click two nodes to link them",
		};
		EditorStatus {
			zoom_percent: (self.view.zoom * 100.0).round() as u32,
			node_count: self.store.nodes().len(),
			connection_count: self.store.connections().len(),
			connecting: self.is_connecting(),
			menu_at: self.menu,
			selected: self.selected_node().cloned(),
			hint,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	const ORIGIN: Option<Point> = Some(Point::ZERO);

	fn p(x: f64, y: f64) -> Point {
		Point::new(x, y)
	}

	fn click(ctl: &mut InteractionController, at: Point) {
		ctl.pointer_down(at, ORIGIN, 1);
		ctl.pointer_up();
	}

	fn add_node(ctl: &mut InteractionController, at: Point, kind: NodeKind) -> NodeId {
		ctl.pointer_down(at, ORIGIN, 2);
		ctl.choose_node_kind(kind).unwrap()
	}

	#[test]
	fn test_double_click_opens_menu_and_creates_node() {
		let mut ctl = InteractionController::default();
		ctl.pointer_down(p(100.0, 100.0), ORIGIN, 2);
		assert_eq!(ctl.menu_at(), Some(p(100.0, 100.0)));

		let id = ctl.choose_node_kind(NodeKind::Email).unwrap();
		let node = ctl.store().node(&id).unwrap();
		assert_eq!(node.position, p(100.0, 100.0));
		assert_eq!(node.data.label, "New Email");
		assert_eq!(ctl.menu_at(), None);
		assert_eq!(ctl.mode(), &Mode::Idle);
		assert!(ctl.choose_node_kind(NodeKind::Email).is_none());
	}

	#[test]
	fn test_menu_position_goes_through_view() {
		let mut ctl = InteractionController::default();
		ctl.zoom_in();
		ctl.zoom_in();
		let id = add_node(&mut ctl, p(120.0, 60.0), NodeKind::Ip);
		let pos = ctl.store().node(&id).unwrap().position;
		assert!((pos.x - 100.0).abs() < 1e-9 && (pos.y - 50.0).abs() < 1e-9);
	}

	#[test]
	fn test_events_without_canvas_bounds_are_ignored() {
		let mut ctl = InteractionController::default();
		let id = add_node(&mut ctl, p(50.0, 50.0), NodeKind::File);
		ctl.pointer_down(p(50.0, 50.0), None, 1);
		assert_eq!(ctl.mode(), &Mode::Idle);

		ctl.pointer_down(p(50.0, 50.0), ORIGIN, 1);
		ctl.pointer_move(p(200.0, 200.0), None);
		ctl.wheel(p(0.0, 0.0), None, -1.0);
		ctl.pointer_up();
		assert_eq!(ctl.store().node(&id).unwrap().position, p(50.0, 50.0));
		assert_eq!(ctl.view().zoom, 1.0);
	}

	#[test]
	fn test_canvas_origin_offsets_client_coordinates() {
		let mut ctl = InteractionController::default();
		ctl.pointer_down(p(130.0, 90.0), Some(p(30.0, 40.0)), 2);
		assert_eq!(ctl.menu_at(), Some(p(100.0, 50.0)));
	}

	#[test]
	fn test_click_selects_and_drag_does_not_jump() {
		let mut ctl = InteractionController::default();
		let id = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Person);

		click(&mut ctl, p(110.0, 95.0));
		assert_eq!(ctl.selection(), &Selection::Node(id.clone()));
		assert_eq!(ctl.status().selected.map(|n| n.id), Some(id.clone()));

		// grab off-centre; the node keeps its offset to the pointer
		ctl.pointer_down(p(110.0, 95.0), ORIGIN, 1);
		ctl.pointer_move(p(160.0, 95.0), ORIGIN);
		assert_eq!(ctl.dragged_node(), Some(&id));
		ctl.pointer_up();
		assert_eq!(ctl.store().node(&id).unwrap().position, p(150.0, 100.0));
		assert_eq!(ctl.mode(), &Mode::Idle);
	}

	#[test]
	fn test_small_jitter_is_still_a_click() {
		let mut ctl = InteractionController::default();
		let id = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Camera);
		ctl.pointer_down(p(100.0, 100.0), ORIGIN, 1);
		ctl.pointer_move(p(101.0, 101.0), ORIGIN);
		ctl.pointer_up();
		assert_eq!(ctl.store().node(&id).unwrap().position, p(100.0, 100.0));
		assert_eq!(ctl.selection(), &Selection::Node(id));
	}

	#[test]
	fn test_background_press_clears_selection_and_pans() {
		let mut ctl = InteractionController::default();
		let id = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		click(&mut ctl, p(100.0, 100.0));
		assert_eq!(ctl.selection(), &Selection::Node(id.clone()));

		ctl.pointer_down(p(400.0, 400.0), ORIGIN, 1);
		assert_eq!(ctl.selection(), &Selection::None);
		ctl.pointer_move(p(420.0, 390.0), ORIGIN);
		ctl.pointer_up();
		assert_eq!(ctl.view().pan, p(20.0, -10.0));
		// model coordinates are untouched by panning
		assert_eq!(ctl.store().node(&id).unwrap().position, p(100.0, 100.0));
	}

	#[test]
	fn test_background_press_closes_menu() {
		let mut ctl = InteractionController::default();
		ctl.pointer_down(p(10.0, 10.0), ORIGIN, 2);
		click(&mut ctl, p(300.0, 300.0));
		assert_eq!(ctl.menu_at(), None);
		assert_eq!(ctl.mode(), &Mode::Idle);
		assert!(ctl.choose_node_kind(NodeKind::Ip).is_none());
		assert!(ctl.store().nodes().is_empty());
	}

	#[test]
	fn test_connecting_chain() {
		let mut ctl = InteractionController::default();
		let a = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		let b = add_node(&mut ctl, p(300.0, 100.0), NodeKind::Subdomain);
		let c = add_node(&mut ctl, p(500.0, 100.0), NodeKind::Ip);

		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		assert_eq!(ctl.pending_source(), Some(&a));
		// clicking the pending source again is a no-op
		click(&mut ctl, p(100.0, 100.0));
		assert_eq!(ctl.pending_source(), Some(&a));
		click(&mut ctl, p(300.0, 100.0));
		assert!(ctl.is_connecting());
		assert_eq!(ctl.pending_source(), None);

		click(&mut ctl, p(300.0, 100.0));
		click(&mut ctl, p(500.0, 100.0));

		let conns = ctl.store().connections();
		assert_eq!(conns.len(), 2);
		assert_eq!((&conns[0].source, &conns[0].target), (&a, &b));
		assert_eq!((&conns[1].source, &conns[1].target), (&b, &c));
		assert_eq!(conns[0].label, "connected to");
		// nodes never moved while connecting
		assert_eq!(ctl.store().node(&a).unwrap().position, p(100.0, 100.0));
	}

	#[test]
	fn test_one_shot_connecting() {
		let mut ctl = InteractionController::new(EditorConfig {
			chain_connections: false,
			..EditorConfig::default()
		});
		add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		add_node(&mut ctl, p(300.0, 100.0), NodeKind::Domain);
		ctl.set_connecting(true);
		click(&mut ctl, p(100.0, 100.0));
		click(&mut ctl, p(300.0, 100.0));
		assert_eq!(ctl.mode(), &Mode::Idle);
		assert_eq!(ctl.store().connections().len(), 1);
	}

	#[test]
	fn test_background_click_aborts_pending_source() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		click(&mut ctl, p(600.0, 600.0));
		assert_eq!(ctl.mode(), &Mode::Connecting { source: None });
		assert_eq!(ctl.menu_at(), None);
	}

	#[test]
	fn test_double_click_while_connecting_opens_menu() {
		let mut ctl = InteractionController::default();
		let a = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		ctl.set_connecting(true);
		ctl.pointer_down(p(300.0, 300.0), ORIGIN, 2);
		assert_eq!(ctl.menu_at(), Some(p(300.0, 300.0)));
		assert_eq!(ctl.mode(), &Mode::Connecting { source: None });
		assert!(ctl.status().connecting);
		assert_eq!(ctl.status().menu_at, Some(p(300.0, 300.0)));

		// the new node can be linked straight away with the tool still on
		let b = ctl.choose_node_kind(NodeKind::Ip).unwrap();
		assert!(ctl.is_connecting());
		click(&mut ctl, p(100.0, 100.0));
		click(&mut ctl, p(300.0, 300.0));
		assert!(ctl.store().connection_between(&a, &b).is_some());
	}

	#[test]
	fn test_menu_keeps_pending_source() {
		let mut ctl = InteractionController::default();
		let a = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		ctl.set_connecting(true);
		click(&mut ctl, p(100.0, 100.0));
		ctl.pointer_down(p(400.0, 400.0), ORIGIN, 2);
		assert_eq!(ctl.pending_source(), Some(&a));
		ctl.close_menu();
		assert_eq!(ctl.menu_at(), None);
		assert_eq!(ctl.pending_source(), Some(&a));
	}

	#[test]
	fn test_toggle_off_clears_pending_source() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		ctl.toggle_connecting();
		assert_eq!(ctl.mode(), &Mode::Idle);
		ctl.toggle_connecting();
		assert_eq!(ctl.pending_source(), None);
	}

	#[test]
	fn test_delete_selected_node() {
		let mut ctl = InteractionController::default();
		let a = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		let b = add_node(&mut ctl, p(300.0, 100.0), NodeKind::Domain);
		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		click(&mut ctl, p(300.0, 100.0));
		ctl.toggle_connecting();

		click(&mut ctl, p(100.0, 100.0));
		assert!(ctl.delete_selected());
		assert_eq!(ctl.selection(), &Selection::None);
		assert!(ctl.store().node(&a).is_none());
		assert!(ctl.store().connections().is_empty());
		assert!(ctl.store().node(&b).is_some());
		assert!(ctl.status().selected.is_none());
	}

	#[test]
	fn test_deleting_pending_source_resets_it() {
		let mut ctl = InteractionController::default();
		let a = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		add_node(&mut ctl, p(300.0, 100.0), NodeKind::Domain);
		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		assert!(ctl.delete_node(&a));
		assert_eq!(ctl.mode(), &Mode::Connecting { source: None });
		click(&mut ctl, p(300.0, 100.0));
		assert!(ctl.store().connections().is_empty());
	}

	#[test]
	fn test_connection_selection_and_keyboard_delete() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		add_node(&mut ctl, p(300.0, 100.0), NodeKind::Domain);
		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		click(&mut ctl, p(300.0, 100.0));
		ctl.toggle_connecting();

		click(&mut ctl, p(200.0, 103.0));
		assert!(matches!(ctl.selection(), Selection::Connection(_)));
		assert!(ctl.status().selected.is_none());
		ctl.key_down("Delete");
		assert!(ctl.store().connections().is_empty());
		assert_eq!(ctl.store().nodes().len(), 2);
	}

	#[test]
	fn test_escape() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		ctl.toggle_connecting();
		click(&mut ctl, p(100.0, 100.0));
		ctl.key_down("Escape");
		assert_eq!(ctl.mode(), &Mode::Connecting { source: None });
		ctl.key_down("Escape");
		assert_eq!(ctl.mode(), &Mode::Idle);

		ctl.pointer_down(p(500.0, 500.0), ORIGIN, 2);
		ctl.key_down("Escape");
		assert_eq!(ctl.menu_at(), None);
		assert_eq!(ctl.mode(), &Mode::Idle);

		// with the tool on, Escape closes the menu before touching the tool
		ctl.set_connecting(true);
		ctl.pointer_down(p(500.0, 500.0), ORIGIN, 2);
		ctl.key_down("Escape");
		assert_eq!(ctl.menu_at(), None);
		assert!(ctl.is_connecting());
		ctl.set_connecting(false);
		ctl.key_down("a");
		assert_eq!(ctl.mode(), &Mode::Idle);
	}

	#[test]
	fn test_update_selected() {
		let mut ctl = InteractionController::default();
		let id = add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		assert!(!ctl.update_selected(NodePatch::data(DataPatch::label("nope"))));
		click(&mut ctl, p(100.0, 100.0));
		assert!(ctl.update_selected(NodePatch::data(DataPatch::label("example.org"))));
		assert!(ctl.update_selected(NodePatch::kind(NodeKind::Subdomain)));
		let node = ctl.store().node(&id).unwrap();
		assert_eq!(node.data.label, "example.org");
		assert_eq!(node.kind, NodeKind::Subdomain);

		ctl.close_properties();
		assert_eq!(ctl.selection(), &Selection::None);
	}

	#[test]
	fn test_wheel_zoom_keeps_cursor_anchor() {
		let mut ctl = InteractionController::default();
		let anchor = p(250.0, 120.0);
		let before = ctl.view().screen_to_model(anchor);
		ctl.wheel(anchor, ORIGIN, -120.0);
		assert!((ctl.view().zoom - 1.1).abs() < 1e-12);
		assert!(ctl.view().screen_to_model(anchor).distance(before) < 1e-9);
		ctl.wheel(anchor, ORIGIN, 120.0);
		assert!((ctl.view().zoom - 1.0).abs() < 1e-12);
	}

	#[test]
	fn test_horizontal_scroll_does_not_zoom() {
		let mut ctl = InteractionController::default();
		ctl.wheel(p(250.0, 120.0), ORIGIN, 0.0);
		assert_eq!(ctl.view(), &ViewTransform::default());
		ctl.wheel(p(250.0, 120.0), ORIGIN, -0.0);
		assert_eq!(ctl.view().zoom, 1.0);
	}

	#[test]
	fn test_status_hint_and_counts() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(100.0, 100.0), NodeKind::Domain);
		ctl.zoom_in();
		let status = ctl.status();
		assert_eq!(status.zoom_percent, 110);
		assert_eq!(status.node_count, 1);
		assert!(status.hint.starts_with("Double-click"));
		ctl.toggle_connecting();
		assert_eq!(ctl.status().hint, "Click a node to start connecting");
	}

	#[test]
	fn test_import_unknown_bundle_is_skipped() {
		let mut ctl = InteractionController::default();
		let ids = ctl.import_bundle(&json!({ "type": "nmap", "ports": [22] })).unwrap();
		assert!(ids.is_empty());
		assert!(ctl.store().nodes().is_empty());
	}

	#[test]
	fn test_import_is_additive() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(10.0, 10.0), NodeKind::Person);
		let ids = ctl
			.import_bundle(&json!({ "type": "dork", "query": "intitle:\"index of\"" }))
			.unwrap();
		assert_eq!(ids.len(), 1);
		assert_eq!(ctl.store().nodes().len(), 2);
		assert_eq!(ctl.store().node(&ids[0]).unwrap().position, p(400.0, 300.0));
	}

	#[test]
	fn test_failed_load_leaves_graph_untouched() {
		let mut ctl = InteractionController::default();
		let id = add_node(&mut ctl, p(10.0, 10.0), NodeKind::Person);
		ctl.zoom_in();
		assert!(ctl.load_snapshot(b"{\"connections\": []}").is_err());
		assert!(ctl.store().node(&id).is_some());
		assert!((ctl.view().zoom - 1.1).abs() < 1e-12);
	}

	#[test]
	fn test_save_then_load_replaces_state() {
		let mut ctl = InteractionController::default();
		add_node(&mut ctl, p(10.0, 10.0), NodeKind::Person);
		let bytes = ctl.save_snapshot().unwrap();

		let mut other = InteractionController::default();
		add_node(&mut other, p(99.0, 99.0), NodeKind::Camera);
		add_node(&mut other, p(199.0, 99.0), NodeKind::Camera);
		other.pointer_down(p(500.0, 500.0), ORIGIN, 2);
		other.load_snapshot(&bytes).unwrap();
		assert_eq!(other.store().nodes(), ctl.store().nodes());
		assert_eq!(other.mode(), &Mode::Idle);
		assert_eq!(other.menu_at(), None);
	}
}
