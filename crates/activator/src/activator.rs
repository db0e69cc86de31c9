//! Binding registration and shortcut dispatch.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, warn};

use plume_keymap::Chord;

use crate::action::{ActionKind, ActionResult, GenerateFn, ResolveDynFn};
use crate::context::{ContextId, ContextRegistry, ContextValue, Resolved, ResolveCache};
use crate::menu::{MenuChild, MenuTree};
use crate::store::KeyMap;

/// Errors that indicate binding-table corruption.
///
/// These are programming errors (a plugin unregistered an action that is
/// still referenced by a shortcut or menu entry); dispatch aborts rather
/// than silently doing nothing, since swallowing would hide plugin bugs.
#[derive(Debug, Error)]
pub enum DispatchError {
	/// A shortcut or menu entry references an action name that is not in
	/// the action table.
	#[error("action '{name}' is not bound in context {context:?}")]
	UnboundAction {
		context: ContextId,
		name: String,
	},
}

/// Terminal outcome of one dispatch.
#[derive(Debug)]
pub enum Outcome {
	/// The key event was consumed.
	Consumed,
	/// Nothing executed (or the action asked for propagation); the event
	/// falls through to normal widget input handling.
	Pass,
	/// The event was consumed by a menu accelerator: the rendering
	/// collaborator should open the submenu at this path.
	Menu(String),
	/// Multiple candidates tied at the best priority. The rendering
	/// collaborator shows a disambiguation menu; dismissing it (escape)
	/// simply drops the set and no finalist executes.
	Disambiguate(Vec<Finalist>),
}

impl From<ActionResult> for Outcome {
	fn from(result: ActionResult) -> Self {
		match result {
			ActionResult::Consumed => Outcome::Consumed,
			ActionResult::Pass => Outcome::Pass,
		}
	}
}

/// An invocable action reference carrying the context resolved at
/// dispatch or menu-build time.
#[derive(Debug)]
pub struct ActionTarget {
	pub context: ContextId,
	pub action: String,
	pub(crate) resolved: Resolved,
}

/// A candidate that survived context resolution at the best priority.
#[derive(Debug)]
pub struct Finalist {
	pub label: String,
	pub target: ActionTarget,
}

/// One visible entry of a built menu level.
#[derive(Debug)]
pub enum MenuEntry {
	/// A submenu container. Contents are computed lazily: query
	/// [`Activator::menu_entries`] with `path` when it is opened.
	Submenu { label: String, path: String },
	Item(MenuItem),
}

/// A leaf menu item ready for rendering.
#[derive(Debug)]
pub struct MenuItem {
	pub label: String,
	/// Human-readable hint of the first mapped shortcut, if any.
	pub accel: Option<String>,
	/// Check state for checkbox/radio style items.
	pub check: Option<bool>,
	pub radio: bool,
	pub target: ActionTarget,
}

/// One entry of a chord's candidate list, kept sorted by stored priority.
///
/// Stored priority is the negated user-facing priority, so lower values
/// are tried first.
#[derive(Clone, Debug)]
struct ShortcutEntry {
	priority: i32,
	ctx: ContextId,
	name: String,
	generic: bool,
}

type Pair = (ContextId, String);

/// The dispatch core of one top-level window.
///
/// Owns its shortcut table, action table and menu tree exclusively for
/// its lifetime; shares the [`KeyMap`] with every other activator.
pub struct Activator {
	section: String,
	keymap: KeyMap,
	contexts: ContextRegistry,
	actions: FxHashMap<ContextId, FxHashMap<String, ActionKind>>,
	labels: FxHashMap<Pair, String>,
	shortcuts: FxHashMap<Chord, Vec<ShortcutEntry>>,
	menu: MenuTree,
	/// Compiled-in default shortcut sets, recorded in registration order.
	defaults: FxHashMap<Pair, Vec<(Chord, i32)>>,
	/// Pairs whose persisted override has already been installed.
	overridden: FxHashSet<Pair>,
}

impl Activator {
	pub(crate) fn new(keymap: KeyMap, section: &str) -> Self {
		Self {
			section: section.to_string(),
			keymap,
			contexts: ContextRegistry::default(),
			actions: FxHashMap::default(),
			labels: FxHashMap::default(),
			shortcuts: FxHashMap::default(),
			menu: MenuTree::default(),
			defaults: FxHashMap::default(),
			overridden: FxHashSet::default(),
		}
	}

	/// The configuration section this activator persists overrides under.
	pub fn section(&self) -> &str {
		&self.section
	}

	/// Registers a context provider. See [`ContextRegistry::add`].
	pub fn add_context<F>(&mut self, name: impl Into<String>, depends: &[&str], provide: F)
	where
		F: Fn(&[ContextValue]) -> Option<ContextValue> + 'static,
	{
		self.contexts.add(name, depends, provide);
	}

	/// Context-holder sugar: returns a proxy that binds and maps within
	/// one context.
	pub fn on(&mut self, ctx: impl Into<ContextId>) -> ContextHolder<'_> {
		ContextHolder {
			activator: self,
			ctx: ctx.into(),
		}
	}

	/// Registers a plain action.
	///
	/// With a menu path the action also becomes a menu leaf. The returned
	/// handle allows a fluent `.to(accel, priority)` to map a shortcut.
	pub fn bind<F>(&mut self, ctx: impl Into<ContextId>, name: &str, menu_path: Option<&str>, callback: F) -> Bound<'_>
	where
		F: Fn(&Resolved) -> ActionResult + 'static,
	{
		self.bind_kind(ctx.into(), name, menu_path, ActionKind::Plain(Box::new(callback)))
	}

	/// Registers a checkbox-style action: `probe` computes the check state
	/// at menu-build time, `toggle` executes.
	pub fn bind_check<P, F>(
		&mut self,
		ctx: impl Into<ContextId>,
		name: &str,
		menu_path: Option<&str>,
		probe: P,
		toggle: F,
	) -> Bound<'_>
	where
		P: Fn(&Resolved) -> bool + 'static,
		F: Fn(&Resolved) -> ActionResult + 'static,
	{
		self.bind_kind(
			ctx.into(),
			name,
			menu_path,
			ActionKind::Check {
				probe: Box::new(probe),
				toggle: Box::new(toggle),
			},
		)
	}

	/// Registers a dynamic submenu resolved at open time.
	///
	/// `generate` yields the entries; `resolve` reconstructs one action
	/// from a stored entry id. Synthesized leaves carry composite names
	/// `"<name>/<id>"`, which is also the form persisted shortcuts use.
	pub fn bind_dynamic(
		&mut self,
		ctx: impl Into<ContextId>,
		name: &str,
		menu_path: &str,
		generate: GenerateFn,
		resolve: ResolveDynFn,
		as_radio: bool,
	) -> Bound<'_> {
		let ctx = ctx.into();
		let bound = self.bind_kind(
			ctx.clone(),
			name,
			Some(menu_path),
			ActionKind::Dynamic {
				generate,
				resolve,
				radio: as_radio,
			},
		);
		let activator = bound.activator;

		// Persisted shortcuts for generated entries reference ids that do
		// not exist until the generator runs; install their overrides now
		// so they dispatch without the menu ever being opened.
		let prefix = format!("{name}/");
		for (octx, oname) in activator.keymap.override_pairs(&activator.section) {
			if octx == ctx && oname.starts_with(&prefix) {
				activator.install_override(&octx, &oname);
			}
		}

		Bound {
			activator,
			ctx,
			name: name.to_string(),
		}
	}

	/// Ensures the submenu at `path` exists (label-only container).
	pub fn bind_menu(&mut self, path: &str) {
		self.menu.ensure_menu(path);
		let normalized = MenuTree::normalize(path);
		self.actions
			.entry(ContextId::Any)
			.or_default()
			.insert(normalized.clone(), ActionKind::Menu { path: normalized });
	}

	/// Binds an accelerator that opens the submenu at `path`.
	pub fn map_menu(&mut self, path: &str, accel: &str, priority: i32) {
		self.bind_menu(path);
		let normalized = MenuTree::normalize(path);
		self.map(ContextId::Any, &normalized, accel, priority);
	}

	/// Associates a key combination with an already-bound action name.
	///
	/// A parse failure is a warning and the mapping is skipped — the
	/// action stays reachable through the menu.
	pub fn map(&mut self, ctx: impl Into<ContextId>, name: &str, accel: &str, priority: i32) {
		let ctx = ctx.into();
		let km = match plume_keymap::parse(accel) {
			Ok(km) => km,
			Err(error) => {
				warn!(accel, %error, "can't parse accelerator");
				return;
			}
		};

		let pair = (ctx.clone(), name.to_string());
		self.defaults.entry(pair).or_default().push((km, priority));

		if self.override_installed(&ctx, name) {
			return;
		}

		self.add_shortcut(km, ctx, name.to_string(), -priority, false);
	}

	fn bind_kind(&mut self, ctx: ContextId, name: &str, menu_path: Option<&str>, kind: ActionKind) -> Bound<'_> {
		let table = self.actions.entry(ctx.clone()).or_default();
		let rebound = table.insert(name.to_string(), kind).is_some();

		if let Some(path) = menu_path
			&& let Some(label) = self.menu.insert_leaf(path, ctx.clone(), name.to_string())
		{
			self.labels.insert((ctx.clone(), name.to_string()), label);
		}

		// Generic shortcuts apply wherever an action of this name exists;
		// a persisted override for the exact pair supersedes them.
		if !rebound && !self.override_installed(&ctx, name) {
			for (km, priority) in self.keymap.effective_generics(name) {
				self.add_shortcut(km, ctx.clone(), name.to_string(), -priority, true);
			}
		}

		Bound {
			activator: self,
			ctx,
			name: name.to_string(),
		}
	}

	/// Installs the persisted override for a pair, once. Returns whether
	/// an override governs the pair.
	fn override_installed(&mut self, ctx: &ContextId, name: &str) -> bool {
		if self.overridden.contains(&(ctx.clone(), name.to_string())) {
			return true;
		}
		if self.keymap.override_for(&self.section, ctx, name).is_some() {
			self.install_override(ctx, name);
			return true;
		}
		false
	}

	fn install_override(&mut self, ctx: &ContextId, name: &str) {
		let pair = (ctx.clone(), name.to_string());
		if self.overridden.contains(&pair) {
			return;
		}
		if let Some(keys) = self.keymap.override_for(&self.section, ctx, name) {
			for (km, priority) in keys {
				self.add_shortcut(km, ctx.clone(), name.to_string(), -priority, false);
			}
			self.overridden.insert(pair);
		}
	}

	fn add_shortcut(&mut self, km: Chord, ctx: ContextId, name: String, priority: i32, generic: bool) {
		let entries = self.shortcuts.entry(km).or_default();
		let at = entries.partition_point(|e| e.priority <= priority);
		entries.insert(
			at,
			ShortcutEntry {
				priority,
				ctx,
				name,
				generic,
			},
		);
	}

	/// Dispatches a key event.
	///
	/// Builds a fresh context cache from `seeds`, walks the chord's
	/// candidate list in ascending stored priority, and collects every
	/// candidate that resolves at the best priority found; scanning stops
	/// at the first candidate strictly worse than that. One finalist
	/// executes immediately; several produce [`Outcome::Disambiguate`].
	pub fn activate<I>(&self, chord: Chord, seeds: I) -> Result<Outcome, DispatchError>
	where
		I: IntoIterator<Item = (String, ContextValue)>,
	{
		let mut cache = ResolveCache::new();
		for (name, value) in seeds {
			cache.seed(name, value);
		}

		let Some(entries) = self.shortcuts.get(&chord) else {
			return Ok(Outcome::Pass);
		};

		let mut best: Option<i32> = None;
		let mut finalists = Vec::new();
		for entry in entries {
			if let Some(best) = best
				&& entry.priority > best
			{
				break;
			}

			let Some(resolved) = self.contexts.resolve(&entry.ctx, &mut cache) else {
				continue;
			};

			// Fail loudly before committing to this candidate: a shortcut
			// naming an unregistered action is table corruption.
			self.find_action(&entry.ctx, &entry.name)?;

			best = Some(entry.priority);
			finalists.push(Finalist {
				label: self.label_for(&entry.ctx, &entry.name),
				target: ActionTarget {
					context: entry.ctx.clone(),
					action: entry.name.clone(),
					resolved,
				},
			});
		}

		match finalists.len() {
			0 => Ok(Outcome::Pass),
			1 => self.invoke(&finalists[0].target),
			n => {
				debug!(chord = %chord, finalists = n, "priority tie, deferring to disambiguation menu");
				Ok(Outcome::Disambiguate(finalists))
			}
		}
	}

	/// Executes a finalist or menu item action.
	pub fn invoke(&self, target: &ActionTarget) -> Result<Outcome, DispatchError> {
		let (kind, dyn_id) = self.find_action(&target.context, &target.action)?;

		let outcome = match kind {
			ActionKind::Plain(callback) => callback(&target.resolved).into(),
			ActionKind::Check { toggle, .. } => toggle(&target.resolved).into(),
			ActionKind::Menu { path } => Outcome::Menu(path.clone()),
			ActionKind::Dynamic { resolve, .. } => {
				let Some(id) = dyn_id else {
					warn!(action = %target.action, "dynamic action activated without an entry id");
					return Ok(Outcome::Pass);
				};
				match resolve(&target.resolved, id) {
					Some(callback) => callback(&target.resolved).into(),
					None => {
						debug!(action = %target.action, id, "dynamic entry id did not resolve");
						Outcome::Pass
					}
				}
			}
		};

		Ok(outcome)
	}

	/// Looks up an action, decomposing composite dynamic names.
	fn find_action<'a>(
		&'a self,
		ctx: &ContextId,
		name: &'a str,
	) -> Result<(&'a ActionKind, Option<&'a str>), DispatchError> {
		if let Some(table) = self.actions.get(ctx) {
			if let Some(kind) = table.get(name) {
				return Ok((kind, None));
			}
			if let Some((base, id)) = name.split_once('/')
				&& let Some(kind @ ActionKind::Dynamic { .. }) = table.get(base)
			{
				return Ok((kind, Some(id)));
			}
		}

		Err(DispatchError::UnboundAction {
			context: ctx.clone(),
			name: name.to_string(),
		})
	}

	fn label_for(&self, ctx: &ContextId, name: &str) -> String {
		if let Some(label) = self.labels.get(&(ctx.clone(), name.to_string())) {
			return label.clone();
		}
		// Dynamic finalists fall back to the base entry's label.
		if let Some((base, id)) = name.split_once('/') {
			if let Some(label) = self.labels.get(&(ctx.clone(), base.to_string())) {
				return format!("{label}: {id}");
			}
		}
		name.to_string()
	}

	/// Builds one visible menu level.
	///
	/// A fresh context cache is built from `seeds` and shared across the
	/// whole level. Leaves whose context does not resolve are skipped;
	/// submenu containers are always yielded, their contents computed only
	/// when opened.
	pub fn menu_entries<I>(&self, path: &str, seeds: I) -> Result<Vec<MenuEntry>, DispatchError>
	where
		I: IntoIterator<Item = (String, ContextValue)>,
	{
		let mut cache = ResolveCache::new();
		for (name, value) in seeds {
			cache.seed(name, value);
		}

		let Some(node) = self.menu.node_at(path) else {
			// Not a structural node: the path may name a dynamic submenu,
			// whose contents only exist while it is open.
			return self.dynamic_entries(path, &mut cache);
		};

		let mut out = Vec::new();
		for (key, child) in node.entries() {
			let sub_path = if path.is_empty() {
				key.to_string()
			} else {
				format!("{path}/{key}")
			};
			match child {
				MenuChild::Node(sub) => out.push(MenuEntry::Submenu {
					label: sub.label.clone(),
					path: sub_path,
				}),
				MenuChild::Leaf(leaf) => {
					let Some(resolved) = self.contexts.resolve(&leaf.ctx, &mut cache) else {
						continue;
					};
					let (kind, _) = self.find_action(&leaf.ctx, &leaf.name)?;
					match kind {
						ActionKind::Plain(_) | ActionKind::Menu { .. } => out.push(MenuEntry::Item(MenuItem {
							label: leaf.label.clone(),
							accel: self.accel_hint(&leaf.ctx, &leaf.name),
							check: None,
							radio: false,
							target: ActionTarget {
								context: leaf.ctx.clone(),
								action: leaf.name.clone(),
								resolved,
							},
						})),
						ActionKind::Check { probe, .. } => out.push(MenuEntry::Item(MenuItem {
							label: leaf.label.clone(),
							accel: self.accel_hint(&leaf.ctx, &leaf.name),
							check: Some(probe(&resolved)),
							radio: false,
							target: ActionTarget {
								context: leaf.ctx.clone(),
								action: leaf.name.clone(),
								resolved,
							},
						})),
						// Dynamic bindings are submenu containers at this
						// level; their entries are generated when opened.
						ActionKind::Dynamic { .. } => out.push(MenuEntry::Submenu {
							label: leaf.label.clone(),
							path: sub_path,
						}),
					}
				}
			}
		}

		Ok(out)
	}

	/// Expands a dynamic submenu named by `path`.
	fn dynamic_entries(&self, path: &str, cache: &mut ResolveCache) -> Result<Vec<MenuEntry>, DispatchError> {
		let (parent_path, last) = path.rsplit_once('/').unwrap_or(("", path));
		let Some(parent) = self.menu.node_at(parent_path) else {
			return Ok(Vec::new());
		};
		let Some((_, MenuChild::Leaf(leaf))) = parent.entries().find(|(key, _)| *key == last) else {
			return Ok(Vec::new());
		};
		let Some(resolved) = self.contexts.resolve(&leaf.ctx, cache) else {
			return Ok(Vec::new());
		};
		let (kind, _) = self.find_action(&leaf.ctx, &leaf.name)?;
		let ActionKind::Dynamic { generate, radio, .. } = kind else {
			return Ok(Vec::new());
		};

		let mut out = Vec::new();
		for entry in generate(&resolved) {
			let action = format!("{}/{}", leaf.name, entry.id);
			out.push(MenuEntry::Item(MenuItem {
				label: entry.label,
				accel: self.accel_hint(&leaf.ctx, &action),
				check: radio.then_some(entry.selected),
				radio: *radio,
				target: ActionTarget {
					context: leaf.ctx.clone(),
					action,
					resolved: resolved.clone(),
				},
			}));
		}
		Ok(out)
	}

	fn accel_hint(&self, ctx: &ContextId, name: &str) -> Option<String> {
		self.get_km_for_action(ctx.clone(), name)
			.first()
			.map(|(km, _, _)| km.label())
	}

	/// Returns the exact set of `(chord, priority, is_generic)` entries
	/// currently mapped to an action, for the shortcut-editing UI.
	pub fn get_km_for_action(&self, ctx: impl Into<ContextId>, name: &str) -> Vec<(Chord, i32, bool)> {
		let ctx = ctx.into();
		let mut result = Vec::new();
		for (km, entries) in &self.shortcuts {
			for entry in entries {
				if entry.ctx == ctx && entry.name == name {
					result.push((*km, -entry.priority, entry.generic));
				}
			}
		}
		result.sort();
		result
	}

	/// The compiled-in default shortcut set for a pair (context-specific
	/// `map` calls plus applicable generics), as the editor shows it.
	pub fn default_keys(&self, ctx: impl Into<ContextId>, name: &str) -> Vec<(Chord, i32)> {
		let ctx = ctx.into();
		let mut keys = self
			.defaults
			.get(&(ctx, name.to_string()))
			.cloned()
			.unwrap_or_default();
		keys.extend(self.keymap.effective_generics(name));
		keys
	}

	/// Atomically replaces every shortcut of `(ctx, name)` with `keys`.
	///
	/// Removes the pair's entries (dropping chord lists that become
	/// empty), then either reinstates the compiled-in state — when `keys`
	/// equals the default set, in which case the persisted override is
	/// deleted — or installs `keys` and records the override delta.
	/// Equality is order-independent set comparison.
	pub fn replace_keys(&mut self, ctx: impl Into<ContextId>, name: &str, keys: &[(Chord, i32)]) {
		let ctx = ctx.into();
		let pair = (ctx.clone(), name.to_string());

		self.shortcuts.retain(|_, entries| {
			entries.retain(|e| e.ctx != ctx || e.name != name);
			!entries.is_empty()
		});

		let specific = self.defaults.get(&pair).cloned().unwrap_or_default();
		let generics = self.keymap.effective_generics(name);
		let default_set: FxHashSet<(Chord, i32)> = specific.iter().chain(generics.iter()).copied().collect();
		let new_set: FxHashSet<(Chord, i32)> = keys.iter().copied().collect();

		if new_set == default_set {
			for (km, priority) in specific {
				self.add_shortcut(km, ctx.clone(), name.to_string(), -priority, false);
			}
			for (km, priority) in generics {
				self.add_shortcut(km, ctx.clone(), name.to_string(), -priority, true);
			}
			self.overridden.remove(&pair);
			self.keymap.clear_override(&self.section, &ctx, name);
		} else {
			for (km, priority) in keys {
				self.add_shortcut(*km, ctx.clone(), name.to_string(), -priority, false);
			}
			self.overridden.insert(pair);
			self.keymap.set_override(&self.section, &ctx, name, keys);
		}

		self.keymap.save();
	}
}

/// Fluent handle returned by the `bind*` family.
pub struct Bound<'a> {
	activator: &'a mut Activator,
	ctx: ContextId,
	name: String,
}

impl Bound<'_> {
	/// Also maps a shortcut for the action just bound.
	pub fn to(self, accel: &str, priority: i32) -> Self {
		self.activator.map(self.ctx.clone(), &self.name, accel, priority);
		self
	}
}

/// Proxy that scopes `bind`/`map` calls to one context.
pub struct ContextHolder<'a> {
	activator: &'a mut Activator,
	ctx: ContextId,
}

impl ContextHolder<'_> {
	pub fn bind<F>(&mut self, name: &str, menu_path: Option<&str>, callback: F) -> Bound<'_>
	where
		F: Fn(&Resolved) -> ActionResult + 'static,
	{
		self.activator.bind(self.ctx.clone(), name, menu_path, callback)
	}

	pub fn bind_check<P, F>(&mut self, name: &str, menu_path: Option<&str>, probe: P, toggle: F) -> Bound<'_>
	where
		P: Fn(&Resolved) -> bool + 'static,
		F: Fn(&Resolved) -> ActionResult + 'static,
	{
		self.activator.bind_check(self.ctx.clone(), name, menu_path, probe, toggle)
	}

	pub fn map(&mut self, name: &str, accel: &str, priority: i32) {
		self.activator.map(self.ctx.clone(), name, accel, priority);
	}
}
