//! Action entry kinds and callback signatures.

use crate::context::Resolved;

/// What an executed action tells the dispatcher about the key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
	/// The key event was handled; stop propagation.
	Consumed,
	/// Let the event fall through to the focused widget's default handling.
	Pass,
}

/// Callback of a plain or check action.
pub type ActionFn = Box<dyn Fn(&Resolved) -> ActionResult>;

/// Computes the check state of a checkbox-style menu item at build time.
pub type ProbeFn = Box<dyn Fn(&Resolved) -> bool>;

/// Produces the entries of a dynamic submenu at open time.
pub type GenerateFn = Box<dyn Fn(&Resolved) -> Vec<DynEntry>>;

/// Reconstructs a single dynamic action from a stored entry id.
///
/// Shortcuts persist only the id string, never the generated closure, so
/// re-dispatch after a restart (or a later menu reopen) goes through here.
/// Returning `None` makes the entry silently unavailable.
pub type ResolveDynFn = Box<dyn Fn(&Resolved, &str) -> Option<ActionFn>>;

/// One generated entry of a dynamic submenu.
pub struct DynEntry {
	pub label: String,
	pub id: String,
	/// Current state for radio-style dynamic menus.
	pub selected: bool,
}

impl DynEntry {
	pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			id: id.into(),
			selected: false,
		}
	}

	pub fn selected(mut self, selected: bool) -> Self {
		self.selected = selected;
		self
	}
}

/// Closed set of entry kinds an action can be bound as.
pub(crate) enum ActionKind {
	Plain(ActionFn),
	Check { probe: ProbeFn, toggle: ActionFn },
	Dynamic { generate: GenerateFn, resolve: ResolveDynFn, radio: bool },
	/// Opens the submenu at `path`; used by accelerators bound to menus.
	Menu { path: String },
}
