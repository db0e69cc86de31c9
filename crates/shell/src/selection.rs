//! List model with a tracked multi-row selection.
//!
//! Keeps the selected indices ordered, compacts them when rows are
//! removed, and notifies registered listeners on every selection change.

use std::collections::BTreeSet;

type Listener = Box<dyn Fn(&BTreeSet<usize>)>;

/// Rows plus an ordered selection over them.
#[derive(Default)]
pub struct SelectionList<T> {
	rows: Vec<T>,
	selected: BTreeSet<usize>,
	selected_all: bool,
	listeners: Vec<Listener>,
}

impl<T> SelectionList<T> {
	pub fn new() -> Self {
		Self {
			rows: Vec::new(),
			selected: BTreeSet::new(),
			selected_all: false,
			listeners: Vec::new(),
		}
	}

	pub fn push(&mut self, row: T) {
		self.rows.push(row);
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&T> {
		self.rows.get(index)
	}

	pub fn rows(&self) -> &[T] {
		&self.rows
	}

	/// Ordered selected indices.
	pub fn selection(&self) -> &BTreeSet<usize> {
		&self.selected
	}

	pub fn is_selected(&self, index: usize) -> bool {
		self.selected.contains(&index)
	}

	pub fn is_selected_all(&self) -> bool {
		self.selected_all
	}

	pub fn connect_selection_changed(&mut self, listener: impl Fn(&BTreeSet<usize>) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	fn notify(&self) {
		for listener in &self.listeners {
			listener(&self.selected);
		}
	}

	pub fn select(&mut self, index: usize) {
		if self.selected.insert(index) {
			self.notify();
		}
	}

	pub fn unselect(&mut self, index: usize) {
		if self.selected.remove(&index) {
			self.selected_all = false;
			self.notify();
		}
	}

	pub fn invert_selection(&mut self, index: usize) {
		if self.is_selected(index) {
			self.unselect(index);
		} else {
			self.select(index);
		}
	}

	pub fn select_all(&mut self) {
		self.selected_all = true;
		self.selected = (0..self.rows.len()).collect();
		self.notify();
	}

	pub fn clear_selection(&mut self) {
		self.selected_all = false;
		self.selected.clear();
		self.notify();
	}

	/// Removes a row, compacting the selection: the removed row leaves
	/// the selection and every selected index after it shifts down.
	pub fn remove(&mut self, index: usize) -> T {
		let row = self.rows.remove(index);

		if !self.selected.is_empty() {
			if self.selected.remove(&index) {
				self.selected_all = false;
			}
			let shifted: Vec<usize> = self.selected.iter().copied().filter(|i| *i > index).collect();
			for i in shifted {
				self.selected.remove(&i);
				self.selected.insert(i - 1);
			}
			self.notify();
		}

		row
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn store() -> SelectionList<&'static str> {
		let mut store = SelectionList::new();
		store.push("one");
		store.push("two");
		store.push("three");
		store
	}

	#[test]
	fn delete_shifts_later_selection() {
		let mut store = store();
		store.select(0);
		store.select(2);
		assert!(store.is_selected(0));
		assert!(!store.is_selected(1));
		assert!(store.is_selected(2));

		store.remove(1);

		assert!(store.is_selected(0));
		assert!(store.is_selected(1));
	}

	#[test]
	fn delete_from_start() {
		let mut store = store();
		store.select(0);
		store.select(2);
		store.remove(0);

		assert!(!store.is_selected(0));
		assert!(store.is_selected(1));
	}

	#[test]
	fn delete_from_end() {
		let mut store = store();
		store.select(0);
		store.select(2);
		store.remove(2);

		assert!(store.is_selected(0));
		assert!(!store.is_selected(1));
	}

	#[test]
	fn delete_the_only_selected_row() {
		let mut store = store();
		store.select(1);
		store.remove(1);

		assert!(!store.is_selected(0));
		assert!(!store.is_selected(1));
	}

	#[test]
	fn select_all_then_unselect_clears_the_flag() {
		let mut store = store();
		store.select_all();
		assert!(store.is_selected_all());
		assert_eq!(store.selection().len(), 3);

		store.unselect(1);
		assert!(!store.is_selected_all());
	}

	#[test]
	fn listeners_observe_changes() {
		use std::cell::Cell;
		use std::rc::Rc;

		let mut store = store();
		let count = Rc::new(Cell::new(0));
		let seen = count.clone();
		store.connect_selection_changed(move |_| seen.set(seen.get() + 1));

		store.select(0);
		store.select(0);
		store.invert_selection(0);
		assert_eq!(count.get(), 2);
	}
}
