//! Persisted keymap override format.
//!
//! Overrides are stored as a KDL document, one `section` node per
//! configuration section, each mapping a `(context-tuple, action-name)`
//! key to a list of `(accelerator, priority)` entries:
//!
//! ```kdl
//! section "editor" {
//!     override "doc" action="save" {
//!         key "<ctrl>s" priority=0
//!         key "<ctrl><shift>s" priority=1
//!     }
//! }
//! section "generic" {
//!     override "*" action="quit" {
//!         key "<ctrl>q" priority=0
//!     }
//! }
//! ```
//!
//! The reserved `"generic"` section holds context-independent overrides
//! (context spelled `"*"`). Parsing is tolerant: anomalies inside an
//! otherwise valid document are collected as warnings and the offending
//! entries skipped, never raised.

use std::collections::BTreeMap;
use std::path::PathBuf;

use kdl::KdlDocument;
use thiserror::Error;

/// Errors that can occur when reading the override file.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing KDL syntax.
	#[error("KDL parse error: {0}")]
	Kdl(#[from] kdl::KdlError),

	/// Error reading the override file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

/// `(context parts, action name)` override key.
pub(crate) type OverrideKey = (Vec<String>, String);

/// Overrides of one configuration section.
pub(crate) type SectionOverrides = BTreeMap<OverrideKey, Vec<(String, i32)>>;

/// All persisted overrides, by section.
pub(crate) type OverrideMap = BTreeMap<String, SectionOverrides>;

pub(crate) struct ParsedOverrides {
	pub map: OverrideMap,
	pub warnings: Vec<String>,
}

/// Parses an override document.
pub(crate) fn parse_overrides(input: &str) -> Result<ParsedOverrides, ConfigError> {
	let doc: KdlDocument = input.parse()?;
	let mut map = OverrideMap::new();
	let mut warnings = Vec::new();

	for node in doc.nodes() {
		if node.name().value() != "section" {
			warnings.push(format!("unknown top-level node '{}'", node.name().value()));
			continue;
		}
		let Some(section) = node.get(0).and_then(|v| v.as_string()) else {
			warnings.push("section node without a name".to_string());
			continue;
		};
		let overrides = map.entry(section.to_string()).or_default();

		let Some(children) = node.children() else {
			continue;
		};
		for child in children.nodes() {
			if child.name().value() != "override" {
				warnings.push(format!("unknown node '{}' in section '{section}'", child.name().value()));
				continue;
			}

			let ctx: Vec<String> = child
				.entries()
				.iter()
				.filter(|e| e.name().is_none())
				.filter_map(|e| e.value().as_string().map(String::from))
				.collect();
			let Some(action) = child.get("action").and_then(|v| v.as_string()) else {
				warnings.push(format!("override without an action in section '{section}'"));
				continue;
			};
			if ctx.is_empty() {
				warnings.push(format!("override '{action}' without a context in section '{section}'"));
				continue;
			}

			let mut keys = Vec::new();
			if let Some(key_nodes) = child.children() {
				for key_node in key_nodes.nodes() {
					if key_node.name().value() != "key" {
						warnings.push(format!("unknown node '{}' in override '{action}'", key_node.name().value()));
						continue;
					}
					let Some(accel) = key_node.get(0).and_then(|v| v.as_string()) else {
						warnings.push(format!("key without an accelerator in override '{action}'"));
						continue;
					};
					let priority = key_node
						.get("priority")
						.and_then(|v| v.as_integer())
						.and_then(|v| i32::try_from(v).ok())
						.unwrap_or(0);
					keys.push((accel.to_string(), priority));
				}
			}

			overrides.insert((ctx, action.to_string()), keys);
		}
	}

	Ok(ParsedOverrides { map, warnings })
}

/// Renders the override map back to its KDL form.
pub(crate) fn render_overrides(map: &OverrideMap) -> String {
	let mut out = String::new();
	for (section, overrides) in map {
		if overrides.is_empty() {
			continue;
		}
		out.push_str(&format!("section {} {{\n", quote(section)));
		for ((ctx, action), keys) in overrides {
			let ctx_args: Vec<String> = ctx.iter().map(|c| quote(c)).collect();
			out.push_str(&format!("\toverride {} action={} {{\n", ctx_args.join(" "), quote(action)));
			for (accel, priority) in keys {
				out.push_str(&format!("\t\tkey {} priority={priority}\n", quote(accel)));
			}
			out.push_str("\t}\n");
		}
		out.push_str("}\n");
	}
	out
}

fn quote(s: &str) -> String {
	format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
