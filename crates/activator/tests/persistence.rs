//! Round-trip tests for the persisted override store: replace, save,
//! rebuild from disk.

use std::any::Any;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use plume_activator::keymap::{Chord, parse};
use plume_activator::{ActionResult, Activator, ContextValue, DynEntry, KeyMap, Outcome};

fn seeds(window: &str) -> Vec<(String, ContextValue)> {
	vec![("window".to_string(), Rc::new(window.to_string()) as Rc<dyn Any>)]
}

fn chord(accel: &str) -> Chord {
	parse(accel).unwrap()
}

/// Simulates one process startup: loads the keymap from `path` and
/// replays the compiled-in registration calls.
fn startup(path: &Path) -> (KeyMap, Activator, Rc<RefCell<Vec<String>>>) {
	let keymap = KeyMap::new(path);
	keymap.map_generic("quit", "<ctrl>q", 0);

	let mut act = keymap.get_activator("editor");
	act.add_context("doc", &["window"], |args| Some(args[0].clone()));

	let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
	let saved = log.clone();
	act.bind("doc", "save", Some("File/Save"), move |_| {
		saved.borrow_mut().push("save".to_string());
		ActionResult::Consumed
	})
	.to("<ctrl>s", 0);

	let quit = log.clone();
	act.bind("doc", "quit", Some("File/Quit"), move |_| {
		quit.borrow_mut().push("quit".to_string());
		ActionResult::Consumed
	});

	(keymap, act, log)
}

fn km_set(act: &Activator, ctx: &str, name: &str) -> Vec<(Chord, i32)> {
	let mut set: Vec<(Chord, i32)> = act
		.get_km_for_action(ctx, name)
		.into_iter()
		.map(|(km, priority, _)| (km, priority))
		.collect();
	set.sort();
	set
}

#[test]
fn replace_keys_round_trips_through_the_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("keymap.kdl");

	{
		let (_keymap, mut act, _) = startup(&path);
		act.replace_keys("doc", "save", &[(chord("F2"), 0), (chord("<ctrl><shift>s"), 1)]);
	}

	let (_keymap, act, log) = startup(&path);
	assert_eq!(km_set(&act, "doc", "save"), vec![(chord("F2"), 0), (chord("<ctrl><shift>s"), 1)]);

	// The compiled-in default no longer fires.
	assert!(matches!(act.activate(chord("<ctrl>s"), seeds("w")).unwrap(), Outcome::Pass));
	assert!(matches!(act.activate(chord("F2"), seeds("w")).unwrap(), Outcome::Consumed));
	assert_eq!(*log.borrow(), ["save"]);
}

#[test]
fn default_equal_replacement_persists_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("keymap.kdl");

	{
		let (_keymap, mut act, _) = startup(&path);
		// Same set as the compiled-in default, in a different order and
		// with an override previously on disk.
		act.replace_keys("doc", "save", &[(chord("F2"), 0)]);
		act.replace_keys("doc", "save", &[(chord("<ctrl>s"), 0)]);
	}

	let content = std::fs::read_to_string(&path).unwrap();
	assert!(!content.contains("save"), "no override should be persisted: {content}");

	let (_keymap, act, _) = startup(&path);
	assert_eq!(km_set(&act, "doc", "save"), vec![(chord("<ctrl>s"), 0)]);
}

#[test]
fn missing_file_means_no_overrides() {
	let dir = tempfile::tempdir().unwrap();
	let (_keymap, act, _) = startup(&dir.path().join("absent.kdl"));
	assert_eq!(km_set(&act, "doc", "save"), vec![(chord("<ctrl>s"), 0)]);
}

#[test]
fn malformed_file_is_treated_as_empty() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("keymap.kdl");
	std::fs::write(&path, "section \"editor\" { override ").unwrap();

	let (_keymap, act, _) = startup(&path);
	assert_eq!(km_set(&act, "doc", "save"), vec![(chord("<ctrl>s"), 0)]);
}

#[test]
fn save_creates_missing_parent_directories() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("nested/config/keymap.kdl");

	let (_keymap, mut act, _) = startup(&path);
	act.replace_keys("doc", "save", &[(chord("F2"), 0)]);

	assert!(path.exists());
}

#[test]
fn generic_override_round_trips() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("keymap.kdl");

	{
		let (keymap, _act, _) = startup(&path);
		keymap.replace_generics("quit", &[(chord("<alt>F4"), 0)]);
	}

	let (_keymap, act, log) = startup(&path);
	// The generic default is substituted by the override at merge time.
	assert_eq!(act.get_km_for_action("doc", "quit"), vec![(chord("<alt>F4"), 0, true)]);
	assert!(matches!(act.activate(chord("<alt>F4"), seeds("w")).unwrap(), Outcome::Consumed));
	assert_eq!(*log.borrow(), ["quit"]);

	// Restoring the defaults removes the persisted delta.
	{
		let (keymap, _act, _) = startup(&path);
		keymap.replace_generics("quit", &[(chord("<ctrl>q"), 0)]);
	}
	let content = std::fs::read_to_string(&path).unwrap();
	assert!(!content.contains("quit"), "{content}");
}

#[test]
fn dynamic_entry_shortcut_survives_restart() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("keymap.kdl");

	let opened: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

	let build = |path: &Path, opened: &Rc<RefCell<Vec<String>>>| {
		let keymap = KeyMap::new(path);
		let mut act = keymap.get_activator("editor");
		act.add_context("view", &["window"], |args| Some(args[0].clone()));

		let log = opened.clone();
		act.bind_dynamic(
			"view",
			"recent",
			"File/Recent",
			Box::new(|_| vec![DynEntry::new("a.txt", "a")]),
			Box::new(move |_, id| {
				let log = log.clone();
				let id = id.to_string();
				Some(Box::new(move |_: &plume_activator::Resolved| {
					log.borrow_mut().push(id.clone());
					ActionResult::Consumed
				}))
			}),
			false,
		);
		act
	};

	{
		let mut act = build(&path, &opened);
		// The shortcut editor assigns a key to one generated entry; only
		// the id string is persisted.
		act.replace_keys("view", "recent/a", &[(chord("<ctrl>r"), 0)]);
	}

	let act = build(&path, &opened);
	match act.activate(chord("<ctrl>r"), seeds("w")).unwrap() {
		Outcome::Consumed => {}
		other => panic!("Expected Consumed, got {other:?}"),
	}
	assert_eq!(*opened.borrow(), ["a"]);
}
