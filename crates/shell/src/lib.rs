//! Mechanical UX plumbing around the dispatch engine.
//!
//! Everything here is toolkit-agnostic bookkeeping for collaborators that
//! own the actual widgets: a priority-ordered escape stack, a transient
//! overlay manager, generation-guarded completion fill tasks, a
//! selection-tracking list model, plugin loading with per-plugin failure
//! isolation, and settings path helpers.

pub mod complete;
pub mod escape;
pub mod feedback;
pub mod paths;
pub mod plugins;
pub mod selection;
