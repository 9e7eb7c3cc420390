//! Investigation graph editor: a node/connection model edited on a zoomable canvas.
//!
//! The model (`store`, `view`, `controller`, `snapshot`, `import`) has no browser
//! dependency; `component` and `render` bind it to the DOM.

mod component;
mod config;
mod controller;
mod error;
mod import;
mod render;
pub mod snapshot;
mod store;
mod types;
mod view;

pub use component::InvestigationCanvas;
pub use config::EditorConfig;
pub use controller::{EditorStatus, InteractionController, Mode, Selection};
pub use error::CanvasError;
pub use store::{GraphDelta, GraphStore, NodeDraft};
pub use types::{
	Connection, ConnectionId, DataPatch, KindStyle, Metadata, Node, NodeData, NodeId, NodeKind,
	NodePatch, Point,
};
pub use view::{MAX_ZOOM, MIN_ZOOM, ViewTransform, ZOOM_STEP};
