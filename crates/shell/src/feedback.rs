//! Transient overlay feedbacks anchored to a parent widget.
//!
//! The manager only does bookkeeping and stacking math; the rendering
//! collaborator owns the widgets and calls [`FeedbackManager::arrange`]
//! whenever the parent resizes or the set changes. Ownership is explicit:
//! the owning window supplies an opaque [`ParentId`] and tears the
//! association down with [`FeedbackManager::remove_parent`] when it is
//! destroyed.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

/// Category of a text feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
	Info,
	Done,
	Warn,
	Error,
}

impl Category {
	/// Stable color tag for the rendering collaborator.
	pub fn color(&self) -> &'static str {
		match self {
			Category::Info => "#55C",
			Category::Done => "#5C5",
			Category::Warn => "#CC5",
			Category::Error => "#C55",
		}
	}
}

/// Display timeout for a text feedback, derived from its length.
pub fn text_timeout(text: &str) -> Duration {
	Duration::from_millis((500 + text.chars().count() as u64 * 50).max(1500))
}

/// Rectangle in parent-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub w: i32,
	pub h: i32,
}

/// Opaque id of the owning parent widget.
pub type ParentId = u64;

/// Id of one overlay within its parent.
pub type FeedbackId = u64;

struct Entry<W> {
	id: FeedbackId,
	widget: W,
	priority: i32,
	vertical: bool,
	size: (i32, i32),
	deadline: Option<Instant>,
}

/// Per-parent ordered sets of transient overlays.
pub struct FeedbackManager<W> {
	parents: FxHashMap<ParentId, Vec<Entry<W>>>,
	seq: u64,
}

impl<W> Default for FeedbackManager<W> {
	fn default() -> Self {
		Self {
			parents: FxHashMap::default(),
			seq: 0,
		}
	}
}

impl<W> FeedbackManager<W> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an overlay. `vertical` entries stack bottom-up at the
	/// parent's right edge, the rest extend to the left of them. A
	/// timeout makes the entry expire at `now + timeout`, collected by
	/// [`FeedbackManager::purge_expired`].
	#[allow(clippy::too_many_arguments)]
	pub fn add(
		&mut self,
		parent: ParentId,
		widget: W,
		priority: i32,
		size: (i32, i32),
		vertical: bool,
		timeout: Option<Duration>,
		now: Instant,
	) -> FeedbackId {
		self.seq += 1;
		let entry = Entry {
			id: self.seq,
			widget,
			priority,
			vertical,
			size,
			deadline: timeout.map(|t| now + t),
		};
		self.parents.entry(parent).or_default().push(entry);
		self.seq
	}

	/// Removes one overlay; returns its widget for teardown.
	pub fn remove(&mut self, parent: ParentId, id: FeedbackId) -> Option<W> {
		let entries = self.parents.get_mut(&parent)?;
		let at = entries.iter().position(|e| e.id == id)?;
		Some(entries.remove(at).widget)
	}

	/// Tears down every overlay of a destroyed parent.
	pub fn remove_parent(&mut self, parent: ParentId) -> Vec<W> {
		self.parents
			.remove(&parent)
			.map(|entries| entries.into_iter().map(|e| e.widget).collect())
			.unwrap_or_default()
	}

	/// Drops overlays whose deadline has passed, returning their widgets.
	pub fn purge_expired(&mut self, now: Instant) -> Vec<W> {
		let mut expired = Vec::new();
		for entries in self.parents.values_mut() {
			let mut kept = Vec::with_capacity(entries.len());
			for entry in entries.drain(..) {
				if entry.deadline.is_some_and(|d| d <= now) {
					expired.push(entry.widget);
				} else {
					kept.push(entry);
				}
			}
			*entries = kept;
		}
		self.parents.retain(|_, entries| !entries.is_empty());
		expired
	}

	/// Computes stacked geometry for a parent's overlays.
	///
	/// Entries are placed in `(priority, insertion)` order starting at the
	/// bottom-right corner of `area`: vertical ones grow upwards with a
	/// 2px gap, horizontal ones extend leftwards with a 5px gap.
	pub fn arrange(&self, parent: ParentId, area: Rect) -> Vec<(&W, Rect)> {
		let Some(entries) = self.parents.get(&parent) else {
			return Vec::new();
		};

		let mut sorted: Vec<&Entry<W>> = entries.iter().collect();
		sorted.sort_by_key(|e| (e.priority, e.id));

		let mut out = Vec::new();
		let mut y = area.y + area.h;
		let mut first_width = 0;
		for entry in sorted.iter().filter(|e| e.vertical) {
			let (w, h) = entry.size;
			y -= h;
			out.push((&entry.widget, Rect { x: area.x + area.w - w, y, w, h }));
			if first_width == 0 {
				first_width = w;
			}
			y -= 2;
		}

		let mut x = area.x + area.w - if first_width > 0 { first_width + 5 } else { 0 };
		for entry in sorted.iter().filter(|e| !e.vertical) {
			let (w, h) = entry.size;
			x -= w;
			out.push((&entry.widget, Rect { x, y: area.y + area.h - h, w, h }));
			x -= 5;
		}

		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const AREA: Rect = Rect { x: 0, y: 0, w: 200, h: 100 };

	#[test]
	fn vertical_overlays_stack_bottom_up() {
		let now = Instant::now();
		let mut manager = FeedbackManager::new();
		manager.add(1, "first", 0, (40, 10), true, None, now);
		manager.add(1, "second", 0, (60, 20), true, None, now);

		let placed = manager.arrange(1, AREA);
		assert_eq!(placed[0], (&"first", Rect { x: 160, y: 90, w: 40, h: 10 }));
		assert_eq!(placed[1], (&"second", Rect { x: 140, y: 68, w: 60, h: 20 }));
	}

	#[test]
	fn priority_orders_the_stack() {
		let now = Instant::now();
		let mut manager = FeedbackManager::new();
		manager.add(1, "late-low", 0, (10, 10), true, None, now);
		manager.add(1, "high", -1, (10, 10), true, None, now);

		let placed = manager.arrange(1, AREA);
		assert_eq!(*placed[0].0, "high");
	}

	#[test]
	fn horizontal_overlays_extend_left_of_the_column() {
		let now = Instant::now();
		let mut manager = FeedbackManager::new();
		manager.add(1, "v", 0, (40, 10), true, None, now);
		manager.add(1, "h", 0, (30, 10), false, None, now);

		let placed = manager.arrange(1, AREA);
		assert_eq!(placed[1], (&"h", Rect { x: 125, y: 90, w: 30, h: 10 }));
	}

	#[test]
	fn expired_overlays_are_purged() {
		let now = Instant::now();
		let mut manager = FeedbackManager::new();
		manager.add(1, "short", 0, (10, 10), true, Some(Duration::from_millis(100)), now);
		manager.add(1, "long", 0, (10, 10), true, Some(Duration::from_secs(10)), now);

		let expired = manager.purge_expired(now + Duration::from_secs(1));
		assert_eq!(expired, ["short"]);
		assert_eq!(manager.arrange(1, AREA).len(), 1);
	}

	#[test]
	fn removing_the_parent_returns_all_widgets() {
		let now = Instant::now();
		let mut manager = FeedbackManager::new();
		manager.add(7, "a", 0, (10, 10), true, None, now);
		manager.add(7, "b", 0, (10, 10), false, None, now);

		let widgets = manager.remove_parent(7);
		assert_eq!(widgets.len(), 2);
		assert!(manager.arrange(7, AREA).is_empty());
	}

	#[test]
	fn text_timeout_is_floored() {
		assert_eq!(text_timeout("hi"), Duration::from_millis(1500));
		assert_eq!(text_timeout(&"x".repeat(40)), Duration::from_millis(2500));
	}
}
