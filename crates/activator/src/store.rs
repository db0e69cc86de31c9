//! Process-wide keymap store.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use plume_keymap::Chord;

use crate::activator::Activator;
use crate::config::{self, OverrideMap};
use crate::context::ContextId;

/// Reserved section for context-independent overrides.
const GENERIC_SECTION: &str = "generic";

struct KeyMapState {
	path: Option<PathBuf>,
	/// Compiled-in generic shortcut sets, in registration order. Rebuilt
	/// from `map_generic` calls at every startup, never persisted.
	generic_defaults: FxHashMap<String, Vec<(Chord, i32)>>,
	/// Persisted override deltas, by section.
	changed: OverrideMap,
}

/// Shared handle to the process-wide keymap store.
///
/// Owns the generic (context-independent) shortcuts and the persisted
/// override deltas. Activators share this store and are recreated per
/// top-level window; the store's state survives them.
#[derive(Clone)]
pub struct KeyMap {
	inner: Rc<RefCell<KeyMapState>>,
}

impl KeyMap {
	/// Creates a store backed by `path` and loads any persisted overrides.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		let keymap = Self {
			inner: Rc::new(RefCell::new(KeyMapState {
				path: Some(path.into()),
				generic_defaults: FxHashMap::default(),
				changed: OverrideMap::new(),
			})),
		};
		keymap.load();
		keymap
	}

	/// Creates a store with no backing file; [`KeyMap::save`] is a no-op.
	pub fn in_memory() -> Self {
		Self {
			inner: Rc::new(RefCell::new(KeyMapState {
				path: None,
				generic_defaults: FxHashMap::default(),
				changed: OverrideMap::new(),
			})),
		}
	}

	/// (Re)loads persisted overrides.
	///
	/// A missing file means no overrides. Malformed content is logged and
	/// treated as empty; this never fails.
	pub fn load(&self) {
		let mut state = self.inner.borrow_mut();
		state.changed.clear();
		let Some(path) = state.path.clone() else {
			return;
		};

		let content = match std::fs::read_to_string(&path) {
			Ok(content) => content,
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => return,
			Err(error) => {
				warn!(path = %path.display(), %error, "can't read keymap overrides");
				return;
			}
		};

		match config::parse_overrides(&content) {
			Ok(parsed) => {
				for warning in &parsed.warnings {
					warn!(path = %path.display(), %warning, "keymap override entry skipped");
				}
				state.changed = parsed.map;
			}
			Err(error) => {
				warn!(path = %path.display(), %error, "malformed keymap overrides, ignoring");
			}
		}
	}

	/// Writes the override deltas back. Best-effort: a missing backing
	/// path is a silent no-op and write failures are only logged. Missing
	/// parent directories are created.
	pub fn save(&self) {
		let state = self.inner.borrow();
		let Some(path) = &state.path else {
			return;
		};

		if let Some(parent) = path.parent()
			&& let Err(error) = std::fs::create_dir_all(parent)
		{
			warn!(path = %path.display(), %error, "can't create settings directory");
			return;
		}

		if let Err(error) = std::fs::write(path, config::render_overrides(&state.changed)) {
			warn!(path = %path.display(), %error, "can't save keymap overrides");
		}
	}

	/// Creates the dispatch engine for one top-level window, persisting
	/// its overrides under `section`.
	pub fn get_activator(&self, section: &str) -> Activator {
		Activator::new(self.clone(), section)
	}

	/// Registers a compiled-in generic shortcut.
	///
	/// Generic shortcuts apply in every context that binds an action of
	/// this name. Defaults are established purely by call order at each
	/// startup; a persisted override substitutes its list at lookup time.
	pub fn map_generic(&self, name: &str, accel: &str, priority: i32) {
		let km = match plume_keymap::parse(accel) {
			Ok(km) => km,
			Err(error) => {
				warn!(accel, %error, "can't parse accelerator");
				return;
			}
		};
		self.inner
			.borrow_mut()
			.generic_defaults
			.entry(name.to_string())
			.or_default()
			.push((km, priority));
	}

	/// Replaces the generic shortcut set for `name`.
	///
	/// The persisted delta is updated; a set equal to the compiled-in
	/// defaults (order-independent comparison) removes the override
	/// entirely. Activators pick the change up when they are recreated.
	pub fn replace_generics(&self, name: &str, keys: &[(Chord, i32)]) {
		{
			let mut state = self.inner.borrow_mut();
			let defaults: FxHashSet<(Chord, i32)> =
				state.generic_defaults.get(name).into_iter().flatten().copied().collect();
			let new_set: FxHashSet<(Chord, i32)> = keys.iter().copied().collect();
			let key = (vec!["*".to_string()], name.to_string());

			if new_set == defaults {
				let empty = if let Some(section) = state.changed.get_mut(GENERIC_SECTION) {
					section.remove(&key);
					section.is_empty()
				} else {
					false
				};
				if empty {
					state.changed.remove(GENERIC_SECTION);
				}
			} else {
				state
					.changed
					.entry(GENERIC_SECTION.to_string())
					.or_default()
					.insert(key, keys.iter().map(|(km, p)| (km.to_string(), *p)).collect());
			}
		}
		self.save();
	}

	/// Effective generic shortcuts for an action name: the persisted
	/// override when present, the compiled-in defaults otherwise.
	pub(crate) fn effective_generics(&self, name: &str) -> Vec<(Chord, i32)> {
		let state = self.inner.borrow();
		if let Some(section) = state.changed.get(GENERIC_SECTION)
			&& let Some(keys) = section.get(&(vec!["*".to_string()], name.to_string()))
		{
			return parse_keys(keys);
		}
		state.generic_defaults.get(name).cloned().unwrap_or_default()
	}

	/// The persisted override for a `(context, name)` pair, if any.
	pub(crate) fn override_for(&self, section: &str, ctx: &ContextId, name: &str) -> Option<Vec<(Chord, i32)>> {
		let state = self.inner.borrow();
		let keys = state.changed.get(section)?.get(&(ctx.parts(), name.to_string()))?;
		Some(parse_keys(keys))
	}

	/// Every pair with a persisted override in `section`.
	pub(crate) fn override_pairs(&self, section: &str) -> Vec<(ContextId, String)> {
		let state = self.inner.borrow();
		state
			.changed
			.get(section)
			.map(|overrides| {
				overrides
					.keys()
					.map(|(parts, name)| (ContextId::from_parts(parts), name.clone()))
					.collect()
			})
			.unwrap_or_default()
	}

	pub(crate) fn set_override(&self, section: &str, ctx: &ContextId, name: &str, keys: &[(Chord, i32)]) {
		self.inner
			.borrow_mut()
			.changed
			.entry(section.to_string())
			.or_default()
			.insert(
				(ctx.parts(), name.to_string()),
				keys.iter().map(|(km, p)| (km.to_string(), *p)).collect(),
			);
	}

	pub(crate) fn clear_override(&self, section: &str, ctx: &ContextId, name: &str) {
		let mut state = self.inner.borrow_mut();
		let empty = if let Some(overrides) = state.changed.get_mut(section) {
			overrides.remove(&(ctx.parts(), name.to_string()));
			overrides.is_empty()
		} else {
			false
		};
		if empty {
			state.changed.remove(section);
		}
	}
}

/// Parses persisted accelerator strings, dropping (with a warning) any
/// that no longer parse.
fn parse_keys(keys: &[(String, i32)]) -> Vec<(Chord, i32)> {
	keys.iter()
		.filter_map(|(accel, priority)| match plume_keymap::parse(accel) {
			Ok(km) => Some((km, *priority)),
			Err(error) => {
				warn!(accel, %error, "can't parse persisted accelerator");
				None
			}
		})
		.collect()
}
