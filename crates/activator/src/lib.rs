//! Context-gated action binding and shortcut dispatch.
//!
//! The engine behind a window's keyboard shortcuts and dynamically built
//! menus:
//!
//! - [`ContextRegistry`] resolves named pieces of runtime state ("the
//!   focused document", "the current selection") on demand, memoized per
//!   input event.
//! - [`Activator`] binds actions to `(context, name)` pairs, maps chords
//!   to prioritized candidate lists, and dispatches a key press to the
//!   first eligible action — or hands back a disambiguation set when
//!   several candidates tie.
//! - [`MenuTree`] (internal) keeps the ordered, nested menu structure that
//!   [`Activator::menu_entries`] walks, yielding only entries whose
//!   context resolves.
//! - [`KeyMap`] is the process-wide store of generic shortcuts and
//!   persisted user overrides, shared by every activator.
//!
//! Everything here is single-threaded by design: context objects are only
//! valid for the duration of one input event, and resolution caches never
//! outlive the dispatch that created them.

mod action;
mod activator;
mod config;
mod context;
mod menu;
mod store;

pub use plume_keymap as keymap;

pub use action::{ActionFn, ActionResult, DynEntry, GenerateFn, ProbeFn, ResolveDynFn};
pub use activator::{
	ActionTarget, Activator, Bound, ContextHolder, DispatchError, Finalist, MenuEntry, MenuItem, Outcome,
};
pub use config::ConfigError;
pub use context::{ContextId, ContextRegistry, ContextValue, Resolved, ResolveCache};
pub use store::KeyMap;
