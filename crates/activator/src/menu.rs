//! Ordered, nested menu entry tree.
//!
//! Path segments carry two annotation conventions: a leading `$` pins the
//! entry to the tail of its sibling order (separator-adjacent items like
//! "Misc"), and a trailing `#N` pins an explicit position. Entries with
//! neither keep registration order through monotonically increasing
//! implicit indices.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::context::ContextId;

/// A menu leaf: an action reference plus its display label.
#[derive(Clone, Debug)]
pub(crate) struct MenuLeaf {
	pub ctx: ContextId,
	pub name: String,
	pub label: String,
}

pub(crate) enum MenuChild {
	Node(MenuNode),
	Leaf(MenuLeaf),
}

/// Ordering record for one sibling.
struct Sibling {
	key: String,
	tail: bool,
	weight: u32,
}

#[derive(Default)]
pub(crate) struct MenuNode {
	pub label: String,
	order: Vec<Sibling>,
	children: FxHashMap<String, MenuChild>,
	next_index: u32,
}

/// One parsed path segment.
struct Segment {
	key: String,
	tail: bool,
	weight: Option<u32>,
}

fn parse_segment(raw: &str) -> Segment {
	let (raw, tail) = match raw.strip_prefix('$') {
		Some(rest) => (rest, true),
		None => (raw, false),
	};

	let (key, weight) = match raw.rsplit_once('#') {
		Some((head, num)) => match num.parse::<u32>() {
			Ok(weight) => (head, Some(weight)),
			Err(_) => (raw, None),
		},
		None => (raw, None),
	};

	Segment {
		key: key.to_string(),
		tail,
		weight,
	}
}

impl MenuNode {
	/// Inserts `child` under the segment's normalized key.
	///
	/// Duplicate insertion at an existing key is idempotent: the existing
	/// child stays, order and label untouched.
	fn ensure_child(&mut self, seg: &Segment, make: impl FnOnce() -> MenuChild) -> &mut MenuChild {
		if !self.children.contains_key(&seg.key) {
			let weight = seg.weight.unwrap_or(self.next_index);
			self.next_index = self.next_index.max(weight + 1);

			let at = self
				.order
				.partition_point(|s| (s.tail, s.weight) <= (seg.tail, weight));
			self.order.insert(
				at,
				Sibling {
					key: seg.key.clone(),
					tail: seg.tail,
					weight,
				},
			);
			self.children.insert(seg.key.clone(), make());
		}

		self.children.get_mut(&seg.key).expect("just ensured")
	}

	/// Children in display order.
	pub fn entries(&self) -> impl Iterator<Item = (&str, &MenuChild)> {
		self.order.iter().map(|s| (s.key.as_str(), &self.children[&s.key]))
	}
}

/// The menu structure of one activator.
#[derive(Default)]
pub(crate) struct MenuTree {
	root: MenuNode,
}

impl MenuTree {
	/// Inserts a leaf at `path`, creating intermediate submenu nodes.
	pub fn insert_leaf(&mut self, path: &str, ctx: ContextId, name: String) -> Option<String> {
		let mut segments: Vec<Segment> = path.split('/').filter(|s| !s.is_empty()).map(parse_segment).collect();
		let last = segments.pop()?;

		let Some(node) = Self::descend(&mut self.root, &segments, path) else {
			return None;
		};

		let label = last.key.clone();
		node.ensure_child(&last, || {
			MenuChild::Leaf(MenuLeaf {
				ctx,
				name,
				label: label.clone(),
			})
		});
		Some(label)
	}

	/// Ensures every segment of `path` exists as a submenu node.
	pub fn ensure_menu(&mut self, path: &str) {
		let segments: Vec<Segment> = path.split('/').filter(|s| !s.is_empty()).map(parse_segment).collect();
		Self::descend(&mut self.root, &segments, path);
	}

	fn descend<'a>(mut node: &'a mut MenuNode, segments: &[Segment], path: &str) -> Option<&'a mut MenuNode> {
		for seg in segments {
			let child = node.ensure_child(seg, || {
				MenuChild::Node(MenuNode {
					label: seg.key.clone(),
					..MenuNode::default()
				})
			});
			match child {
				MenuChild::Node(next) => node = next,
				MenuChild::Leaf(_) => {
					warn!(path, segment = %seg.key, "menu path segment already bound as an item");
					return None;
				}
			}
		}
		Some(node)
	}

	/// Looks up the node at a normalized `/`-separated path.
	pub fn node_at(&self, path: &str) -> Option<&MenuNode> {
		let mut node = &self.root;
		for key in path.split('/').filter(|s| !s.is_empty()) {
			match node.children.get(key) {
				Some(MenuChild::Node(next)) => node = next,
				_ => return None,
			}
		}
		Some(node)
	}

	/// Normalizes a registration path to its annotation-free lookup form.
	pub fn normalize(path: &str) -> String {
		path.split('/')
			.filter(|s| !s.is_empty())
			.map(|seg| parse_segment(seg).key)
			.collect::<Vec<_>>()
			.join("/")
	}
}
