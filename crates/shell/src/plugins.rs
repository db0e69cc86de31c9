//! Plugin loading with per-plugin failure isolation.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::warn;

use plume_activator::Activator;

/// Error returned by a plugin's initialization.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PluginError {
	message: String,
}

impl PluginError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// A feature module that registers its contexts, bindings and menus.
pub trait Plugin {
	fn name(&self) -> &'static str;

	/// Called once at load time. Failing here only skips this plugin.
	fn init(&mut self, activator: &mut Activator, registry: &mut ReadyRegistry) -> Result<(), PluginError>;
}

type ReadyCallback = Box<dyn Fn(&Rc<dyn Any>)>;

/// Named readiness registry.
///
/// Plugins announce objects under a name; subscribers that arrive later
/// get already-ready objects replayed before new ones.
#[derive(Default)]
pub struct ReadyRegistry {
	objects: FxHashMap<String, Vec<Rc<dyn Any>>>,
	callbacks: FxHashMap<String, Vec<ReadyCallback>>,
}

impl ReadyRegistry {
	pub fn ready(&mut self, name: &str, object: Rc<dyn Any>) {
		if let Some(callbacks) = self.callbacks.get(name) {
			for callback in callbacks {
				callback(&object);
			}
		}
		self.objects.entry(name.to_string()).or_default().push(object);
	}

	pub fn on_ready(&mut self, name: &str, callback: impl Fn(&Rc<dyn Any>) + 'static) {
		if let Some(objects) = self.objects.get(name) {
			for object in objects {
				callback(object);
			}
		}
		self.callbacks.entry(name.to_string()).or_default().push(Box::new(callback));
	}
}

/// Loads plugins into one activator.
#[derive(Default)]
pub struct PluginManager {
	plugins: Vec<Box<dyn Plugin>>,
	registry: ReadyRegistry,
}

impl PluginManager {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn registry_mut(&mut self) -> &mut ReadyRegistry {
		&mut self.registry
	}

	/// Initializes and keeps a plugin. A failing plugin is logged and
	/// dropped so it cannot prevent the others from loading.
	pub fn add_plugin(&mut self, activator: &mut Activator, mut plugin: Box<dyn Plugin>) -> bool {
		if let Err(error) = plugin.init(activator, &mut self.registry) {
			warn!(plugin = plugin.name(), %error, "plugin failed to initialize, skipping");
			return false;
		}
		self.plugins.push(plugin);
		true
	}

	/// Names of the successfully loaded plugins.
	pub fn loaded(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.plugins.iter().map(|p| p.name())
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use plume_activator::KeyMap;

	use super::*;

	struct Recording {
		name: &'static str,
		fail: bool,
		log: Rc<RefCell<Vec<&'static str>>>,
	}

	impl Plugin for Recording {
		fn name(&self) -> &'static str {
			self.name
		}

		fn init(&mut self, _activator: &mut Activator, _registry: &mut ReadyRegistry) -> Result<(), PluginError> {
			if self.fail {
				return Err(PluginError::new("deliberately broken"));
			}
			self.log.borrow_mut().push(self.name);
			Ok(())
		}
	}

	#[test]
	fn one_broken_plugin_does_not_stop_the_rest() {
		let mut activator = KeyMap::in_memory().get_activator("test");
		let mut manager = PluginManager::new();
		let log = Rc::new(RefCell::new(Vec::new()));

		assert!(manager.add_plugin(
			&mut activator,
			Box::new(Recording { name: "first", fail: false, log: log.clone() }),
		));
		assert!(!manager.add_plugin(
			&mut activator,
			Box::new(Recording { name: "broken", fail: true, log: log.clone() }),
		));
		assert!(manager.add_plugin(
			&mut activator,
			Box::new(Recording { name: "second", fail: false, log: log.clone() }),
		));

		assert_eq!(*log.borrow(), ["first", "second"]);
		assert_eq!(manager.loaded().collect::<Vec<_>>(), ["first", "second"]);
	}

	#[test]
	fn ready_objects_are_replayed_to_late_subscribers() {
		let mut registry = ReadyRegistry::default();
		let seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));

		registry.ready("filler", Rc::new(1_i32));

		let log = seen.clone();
		registry.on_ready("filler", move |object| {
			if let Ok(n) = object.clone().downcast::<i32>() {
				log.borrow_mut().push(*n);
			}
		});
		registry.ready("filler", Rc::new(2_i32));

		assert_eq!(*seen.borrow(), [1, 2]);
	}
}
