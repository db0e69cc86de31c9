//! Chord, key and modifier types.

use std::fmt;

use bitflags::bitflags;

bitflags! {
	/// Modifier mask attached to a [`Chord`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
	pub struct Modifiers: u8 {
		const CTRL = 1;
		const SHIFT = 1 << 1;
		const ALT = 1 << 2;
		const SUPER = 1 << 3;
	}
}

/// Resolves a modifier token name as it appears between angle brackets.
///
/// Accepts the common aliases: `primary` and `control` for ctrl, `meta`
/// for super. Matching is case-insensitive.
pub(crate) fn modifier_from_name(name: &str) -> Option<Modifiers> {
	match name.to_ascii_lowercase().as_str() {
		"ctrl" | "control" | "primary" => Some(Modifiers::CTRL),
		"shift" => Some(Modifiers::SHIFT),
		"alt" => Some(Modifiers::ALT),
		"super" | "meta" => Some(Modifiers::SUPER),
		_ => None,
	}
}

impl Modifiers {
	/// Canonical accelerator tokens in the order they are rendered.
	const TOKENS: [(Modifiers, &'static str, &'static str); 4] = [
		(Modifiers::CTRL, "<ctrl>", "Ctrl"),
		(Modifiers::SHIFT, "<shift>", "Shift"),
		(Modifiers::ALT, "<alt>", "Alt"),
		(Modifiers::SUPER, "<super>", "Super"),
	];
}

/// A key identifier: a printable character, a function key, or a named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	/// Printable ASCII character key.
	Char(char),
	/// Function key (`F1` to `F35`).
	F(u8),
	BackSpace,
	Tab,
	Return,
	Escape,
	Delete,
	Insert,
	Home,
	End,
	PageUp,
	PageDown,
	Up,
	Down,
	Left,
	Right,
	Menu,
}

impl Key {
	/// Parses a named key identifier (`"BackSpace"`, `"Page_Up"`, …).
	///
	/// Single characters and function keys are handled by the parser
	/// before named keys are tried, so this only deals with multi-letter
	/// names. `"space"` maps to the space character key.
	pub(crate) fn from_name(name: &str) -> Option<Key> {
		match name {
			"BackSpace" => Some(Key::BackSpace),
			"Tab" => Some(Key::Tab),
			"Return" => Some(Key::Return),
			"Escape" => Some(Key::Escape),
			"Delete" => Some(Key::Delete),
			"Insert" => Some(Key::Insert),
			"Home" => Some(Key::Home),
			"End" => Some(Key::End),
			"Page_Up" => Some(Key::PageUp),
			"Page_Down" => Some(Key::PageDown),
			"Up" => Some(Key::Up),
			"Down" => Some(Key::Down),
			"Left" => Some(Key::Left),
			"Right" => Some(Key::Right),
			"Menu" => Some(Key::Menu),
			"space" => Some(Key::Char(' ')),
			_ => None,
		}
	}

	/// Canonical accelerator spelling of the key.
	fn name(&self) -> String {
		match self {
			Key::Char(' ') => "space".to_string(),
			Key::Char(c) => c.to_string(),
			Key::F(n) => format!("F{n}"),
			Key::BackSpace => "BackSpace".to_string(),
			Key::Tab => "Tab".to_string(),
			Key::Return => "Return".to_string(),
			Key::Escape => "Escape".to_string(),
			Key::Delete => "Delete".to_string(),
			Key::Insert => "Insert".to_string(),
			Key::Home => "Home".to_string(),
			Key::End => "End".to_string(),
			Key::PageUp => "Page_Up".to_string(),
			Key::PageDown => "Page_Down".to_string(),
			Key::Up => "Up".to_string(),
			Key::Down => "Down".to_string(),
			Key::Left => "Left".to_string(),
			Key::Right => "Right".to_string(),
			Key::Menu => "Menu".to_string(),
		}
	}

	/// Human-readable spelling used in menu accelerator hints.
	fn display_name(&self) -> String {
		match self {
			Key::Char(' ') => "Space".to_string(),
			Key::Char(c) => c.to_ascii_uppercase().to_string(),
			Key::PageUp => "PgUp".to_string(),
			Key::PageDown => "PgDn".to_string(),
			other => other.name(),
		}
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name())
	}
}

/// A key combination: modifier mask plus key.
///
/// `Display` renders the canonical accelerator string (`"<ctrl><shift>s"`),
/// which round-trips through [`crate::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chord {
	pub mods: Modifiers,
	pub key: Key,
}

impl Chord {
	pub fn new(mods: Modifiers, key: Key) -> Self {
		Self { mods, key }
	}

	/// Human-readable label for menu hints, e.g. `"Ctrl+Shift+S"`.
	pub fn label(&self) -> String {
		let mut parts = Vec::new();
		for (flag, _, human) in Modifiers::TOKENS {
			if self.mods.contains(flag) {
				parts.push(human.to_string());
			}
		}
		parts.push(self.key.display_name());
		parts.join("+")
	}
}

impl From<Key> for Chord {
	fn from(key: Key) -> Self {
		Self::new(Modifiers::empty(), key)
	}
}

impl fmt::Display for Chord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (flag, token, _) in Modifiers::TOKENS {
			if self.mods.contains(flag) {
				f.write_str(token)?;
			}
		}
		write!(f, "{}", self.key)
	}
}
