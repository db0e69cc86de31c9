//! Settings, data and cache path helpers.

use std::io;
use std::path::{Path, PathBuf};

/// Joins `parts` under the user configuration directory
/// (`$XDG_CONFIG_HOME` or the platform equivalent).
pub fn join_to_settings_dir(parts: &[&str]) -> Option<PathBuf> {
	join_under(dirs::config_dir()?, parts)
}

/// Joins `parts` under the user data directory.
pub fn join_to_data_dir(parts: &[&str]) -> Option<PathBuf> {
	join_under(dirs::data_dir()?, parts)
}

/// Joins `parts` under the user cache directory.
pub fn join_to_cache_dir(parts: &[&str]) -> Option<PathBuf> {
	join_under(dirs::cache_dir()?, parts)
}

fn join_under(mut base: PathBuf, parts: &[&str]) -> Option<PathBuf> {
	for part in parts {
		base.push(part);
	}
	Some(base)
}

/// Creates the missing parent directories of a file path.
pub fn make_missing_dirs(path: &Path) -> io::Result<()> {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn settings_path_ends_with_the_parts() {
		let path = join_to_settings_dir(&["plume", "keymap.kdl"]).unwrap();
		assert!(path.ends_with("plume/keymap.kdl"));
	}

	#[test]
	fn make_missing_dirs_creates_the_parent_chain() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("a/b/c.kdl");

		make_missing_dirs(&file).unwrap();
		assert!(file.parent().unwrap().is_dir());

		// Idempotent, and a bare file name is a no-op.
		make_missing_dirs(&file).unwrap();
		make_missing_dirs(Path::new("plain.kdl")).unwrap();
	}
}
