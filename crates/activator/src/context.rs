//! Context identifiers, providers and per-dispatch resolution.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::warn;

/// A resolved context object.
///
/// Context objects are UI state scoped to a single input event (a window,
/// a selection, a focused document), so they are reference-counted but
/// never sent across threads.
pub type ContextValue = Rc<dyn Any>;

/// Identifies a resolvable piece of runtime state.
///
/// A tuple id is a composite context: it resolves to a tuple of resolved
/// sub-contexts and fails as a whole if any element fails. [`ContextId::Any`]
/// is the wildcard used by bindings that apply everywhere; it always
/// resolves without a provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextId {
	/// Wildcard context, always resolvable.
	Any,
	Name(String),
	Tuple(Vec<String>),
}

impl ContextId {
	pub fn name(name: impl Into<String>) -> Self {
		ContextId::Name(name.into())
	}

	pub fn tuple<I, S>(parts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		ContextId::Tuple(parts.into_iter().map(Into::into).collect())
	}

	/// Serialized form used as a persisted override key. The wildcard
	/// context is reserved as `"*"`.
	pub(crate) fn parts(&self) -> Vec<String> {
		match self {
			ContextId::Any => vec!["*".to_string()],
			ContextId::Name(name) => vec![name.clone()],
			ContextId::Tuple(parts) => parts.clone(),
		}
	}

	pub(crate) fn from_parts(parts: &[String]) -> Self {
		match parts {
			[single] if single == "*" => ContextId::Any,
			[single] => ContextId::Name(single.clone()),
			many => ContextId::Tuple(many.to_vec()),
		}
	}
}

impl From<&str> for ContextId {
	fn from(name: &str) -> Self {
		ContextId::Name(name.to_string())
	}
}

impl From<String> for ContextId {
	fn from(name: String) -> Self {
		ContextId::Name(name)
	}
}

impl<const N: usize> From<[&str; N]> for ContextId {
	fn from(parts: [&str; N]) -> Self {
		ContextId::tuple(parts)
	}
}

/// The result of resolving a [`ContextId`].
#[derive(Clone)]
pub enum Resolved {
	/// Empty result of the wildcard context.
	Unit,
	One(ContextValue),
	Tuple(Vec<ContextValue>),
}

impl std::fmt::Debug for Resolved {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Resolved::Unit => f.write_str("Resolved::Unit"),
			Resolved::One(_) => f.write_str("Resolved::One(..)"),
			Resolved::Tuple(values) => write!(f, "Resolved::Tuple({} values)", values.len()),
		}
	}
}

impl Resolved {
	/// Downcasts a single-context result to a concrete type.
	pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
		match self {
			Resolved::One(value) => value.clone().downcast::<T>().ok(),
			_ => None,
		}
	}

	/// Downcasts the `idx`-th element of a composite result.
	pub fn downcast_nth<T: 'static>(&self, idx: usize) -> Option<Rc<T>> {
		match self {
			Resolved::Tuple(values) => values.get(idx)?.clone().downcast::<T>().ok(),
			_ => None,
		}
	}
}

type ProviderFn = Box<dyn Fn(&[ContextValue]) -> Option<ContextValue>>;

struct Provider {
	depends: Vec<String>,
	provide: ProviderFn,
}

/// Mapping from context names to provider functions plus their
/// dependencies.
///
/// Providers are pure functions of their declared dependency contexts,
/// registered once at setup time (re-registration overwrites) and invoked
/// lazily during [`ContextRegistry::resolve`].
#[derive(Default)]
pub struct ContextRegistry {
	providers: FxHashMap<String, Provider>,
}

impl ContextRegistry {
	/// Registers a provider for `name`, depending on `depends`.
	pub fn add<F>(&mut self, name: impl Into<String>, depends: &[&str], provide: F)
	where
		F: Fn(&[ContextValue]) -> Option<ContextValue> + 'static,
	{
		self.providers.insert(
			name.into(),
			Provider {
				depends: depends.iter().map(|d| d.to_string()).collect(),
				provide: Box::new(provide),
			},
		);
	}

	/// Resolves a context id against `cache`.
	///
	/// An unknown context name is a recoverable failure: it resolves to
	/// `None` (logged once per cache) and the candidate that needed it is
	/// simply skipped. Provider panics are not caught.
	pub fn resolve(&self, id: &ContextId, cache: &mut ResolveCache) -> Option<Resolved> {
		match id {
			ContextId::Any => Some(Resolved::Unit),
			ContextId::Name(name) => self.resolve_name(name, cache).map(Resolved::One),
			ContextId::Tuple(parts) => {
				let mut values = Vec::with_capacity(parts.len());
				for part in parts {
					values.push(self.resolve_name(part, cache)?);
				}
				Some(Resolved::Tuple(values))
			}
		}
	}

	fn resolve_name(&self, name: &str, cache: &mut ResolveCache) -> Option<ContextValue> {
		if let Some(cached) = cache.values.get(name) {
			return cached.clone();
		}

		let Some(provider) = self.providers.get(name) else {
			warn!(context = name, "no registered provider for context");
			cache.values.insert(name.to_string(), None);
			return None;
		};

		let mut args = Vec::with_capacity(provider.depends.len());
		let mut failed = false;
		for dep in &provider.depends {
			match self.resolve_name(dep, cache) {
				Some(value) => args.push(value),
				None => {
					failed = true;
					break;
				}
			}
		}

		let result = if failed { None } else { (provider.provide)(&args) };
		cache.values.insert(name.to_string(), result.clone());
		result
	}
}

/// Per-dispatch memoization of resolved contexts.
///
/// One cache exists per dispatch or menu-build call and is dropped with
/// it; resolution results (including failures) must never leak into the
/// next input event.
#[derive(Default)]
pub struct ResolveCache {
	values: FxHashMap<String, Option<ContextValue>>,
}

impl ResolveCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pre-populates the cache with an externally supplied context object,
	/// typically the window the input event arrived at.
	pub fn seed(&mut self, name: impl Into<String>, value: ContextValue) {
		self.values.insert(name.into(), Some(value));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn registry_with_doc() -> ContextRegistry {
		let mut registry = ContextRegistry::default();
		registry.add("doc", &["window"], |args| {
			let window = args[0].clone().downcast::<String>().ok()?;
			window.starts_with("doc:").then(|| Rc::new(window.to_string()) as ContextValue)
		});
		registry
	}

	fn seeded(window: &str) -> ResolveCache {
		let mut cache = ResolveCache::new();
		cache.seed("window", Rc::new(window.to_string()) as ContextValue);
		cache
	}

	#[test]
	fn resolves_through_dependencies() {
		let registry = registry_with_doc();
		let mut cache = seeded("doc:main");
		let resolved = registry.resolve(&ContextId::name("doc"), &mut cache);
		assert!(resolved.is_some());
	}

	#[test]
	fn dependency_failure_fails_resolution() {
		let registry = registry_with_doc();
		let mut cache = ResolveCache::new();
		assert!(registry.resolve(&ContextId::name("doc"), &mut cache).is_none());
	}

	#[test]
	fn unknown_context_is_recoverable() {
		let registry = ContextRegistry::default();
		let mut cache = ResolveCache::new();
		assert!(registry.resolve(&ContextId::name("nope"), &mut cache).is_none());
	}

	#[test]
	fn any_resolves_without_provider() {
		let registry = ContextRegistry::default();
		let mut cache = ResolveCache::new();
		assert!(matches!(registry.resolve(&ContextId::Any, &mut cache), Some(Resolved::Unit)));
	}

	#[test]
	fn tuple_fails_as_a_whole() {
		let registry = registry_with_doc();
		let mut cache = seeded("plain");
		let id = ContextId::tuple(["window", "doc"]);
		assert!(registry.resolve(&id, &mut cache).is_none());

		let mut cache = seeded("doc:main");
		match registry.resolve(&id, &mut cache) {
			Some(Resolved::Tuple(values)) => assert_eq!(values.len(), 2),
			other => panic!("Expected tuple, got {:?}", other.is_some()),
		}
	}

	#[test]
	fn provider_is_memoized_per_cache() {
		use std::cell::Cell;

		let calls = Rc::new(Cell::new(0));
		let mut registry = ContextRegistry::default();
		let seen = calls.clone();
		registry.add("counted", &[], move |_| {
			seen.set(seen.get() + 1);
			Some(Rc::new(()) as ContextValue)
		});

		let mut cache = ResolveCache::new();
		registry.resolve(&ContextId::name("counted"), &mut cache).unwrap();
		registry.resolve(&ContextId::name("counted"), &mut cache).unwrap();
		assert_eq!(calls.get(), 1);

		let mut cache = ResolveCache::new();
		registry.resolve(&ContextId::name("counted"), &mut cache).unwrap();
		assert_eq!(calls.get(), 2);
	}
}
