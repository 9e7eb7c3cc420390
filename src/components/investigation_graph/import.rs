//! Turns result bundles left by external tools into graph content.

use std::f64::consts::PI;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::CanvasError;
use super::store::{GraphDelta, NodeDraft};
use super::types::{DataPatch, Metadata, NodeKind, Point};

/// Result bundles other tools hand to the canvas, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImportBundle {
	/// Subdomain enumeration for one domain.
	Subfinder(SubfinderResult),
	/// A search engine dork query.
	Dork(DorkQuery),
	/// Any other tag; skipped by callers.
	#[serde(other)]
	Unknown,
}

/// Body of a `subfinder` bundle.
#[derive(Debug, Deserialize)]
pub struct SubfinderResult {
	/// The enumerated domain.
	pub domain: String,
	/// One entry per discovered host.
	#[serde(default)]
	pub subdomains: Vec<SubdomainEntry>,
}

/// A discovered subdomain and whatever the producer knew about it.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubdomainEntry {
	/// Host name.
	pub subdomain: String,
	#[serde(
		rename = "httpStatus",
		default,
		deserialize_with = "lenient_http_status",
		skip_serializing_if = "Option::is_none"
	)]
	/// HTTP status returned by the subdomain, if it answered.
	pub http_status: Option<u16>,
	/// Producer's verdict, e.g. `active`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	/// Remaining fields, kept as node metadata.
	#[serde(flatten)]
	pub rest: Metadata,
}

/// Producers disagree on whether the status is a number or a string; anything
/// that is not a valid code is dropped instead of failing the whole bundle.
fn lenient_http_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Number(n) => n.as_u64().and_then(|code| u16::try_from(code).ok()),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	})
}

/// Body of a `dork` bundle.
#[derive(Debug, Deserialize)]
pub struct DorkQuery {
	/// The query text.
	pub query: String,
}

/// Reason phrase for the status codes the scanners report.
pub fn http_status_text(code: u16) -> Option<&'static str> {
	Some(match code {
		0 => "No Response",
		200 => "OK",
		301 => "Moved Permanently",
		302 => "Found",
		401 => "Unauthorized",
		403 => "Forbidden",
		404 => "Not Found",
		500 => "Server Error",
		502 => "Bad Gateway",
		503 => "Service Unavailable",
		504 => "Gateway Timeout",
		_ => return None,
	})
}

impl SubdomainEntry {
	/// Connection label summarising how the subdomain answered, e.g. `200 OK (active)`.
	pub fn reachability(&self) -> String {
		let code = self.http_status.map(|code| match http_status_text(code) {
			Some(text) => format!("{code} {text}"),
			None => code.to_string(),
		});
		match (code, self.status.as_deref()) {
			(Some(code), Some(status)) => format!("{code} ({status})"),
			(Some(code), None) => code,
			(None, Some(status)) => status.to_owned(),
			(None, None) => "subdomain of".to_owned(),
		}
	}

	fn description(&self) -> String {
		let code = self
			.http_status
			.map_or_else(|| "unknown".to_owned(), |code| code.to_string());
		format!("Status: {code} - {}", self.status.as_deref().unwrap_or("unknown"))
	}
}

/// Maps a bundle onto node/connection drafts laid out around `center` (model space).
///
/// Bundles with an unrecognised `type` yield [`CanvasError::UnknownBundle`],
/// which callers are expected to skip silently.
pub fn import_bundle(bundle: &Value, center: Point, radius: f64) -> Result<GraphDelta, CanvasError> {
	let parsed = ImportBundle::deserialize(bundle).map_err(CanvasError::MalformedBundle)?;
	let whole = bundle.as_object().cloned().unwrap_or_default();

	let mut delta = GraphDelta::default();
	match parsed {
		ImportBundle::Subfinder(result) => {
			delta.nodes.push(NodeDraft {
				kind: NodeKind::Domain,
				position: center,
				data: DataPatch {
					label: Some(result.domain.clone()),
					description: Some(format!("Main domain: {}", result.domain)),
					metadata: Some(whole),
				},
			});

			let count = result.subdomains.len();
			for (i, entry) in result.subdomains.into_iter().enumerate() {
				let angle = (i as f64 / count as f64) * 2.0 * PI;
				let position = center + Point::new(angle.cos(), angle.sin()).scale(radius);
				let label = entry.reachability();
				let description = entry.description();
				let metadata = match serde_json::to_value(&entry).map_err(CanvasError::MalformedBundle)? {
					Value::Object(map) => map,
					_ => Metadata::new(),
				};
				delta.nodes.push(NodeDraft {
					kind: NodeKind::Subdomain,
					position,
					data: DataPatch {
						label: Some(entry.subdomain),
						description: Some(description),
						metadata: Some(metadata),
					},
				});
				delta.connections.push((0, i + 1, label));
			}
		}
		ImportBundle::Dork(dork) => {
			delta.nodes.push(NodeDraft {
				kind: NodeKind::SearchResult,
				position: center,
				data: DataPatch {
					label: Some("Search Result".into()),
					description: Some(dork.query),
					metadata: Some(whole),
				},
			});
		}
		ImportBundle::Unknown => {
			let tag = bundle.get("type").and_then(Value::as_str).unwrap_or_default();
			return Err(CanvasError::UnknownBundle(tag.to_owned()));
		}
	}
	Ok(delta)
}
