use thiserror::Error;

use super::types::NodeId;

/// Failures of snapshot and import handling. Graph edits themselves never fail.
#[derive(Debug, Error)]
pub enum CanvasError {
	/// The snapshot is not JSON or does not have the snapshot shape.
	#[error("malformed snapshot: {0}")]
	MalformedSnapshot(#[source] serde_json::Error),

	/// Two nodes in a snapshot share an id.
	#[error("snapshot contains node id `{0}` more than once")]
	DuplicateNodeId(NodeId),

	/// Writing a snapshot failed.
	#[error("failed to encode snapshot: {0}")]
	Encode(#[source] serde_json::Error),

	/// An import bundle with a known type but an unexpected shape.
	#[error("malformed import bundle: {0}")]
	MalformedBundle(#[source] serde_json::Error),

	/// An import bundle whose `type` tag is not recognised.
	#[error("unknown import bundle type `{0}`")]
	UnknownBundle(String),
}
