//! # Parser
//!
//! Parses plain-text accelerator definitions into structured chords. The
//! grammar is the toolkit-standard modifier-prefixed form:
//!
//! ```text
//! accel     = modifier* key
//! modifier  = "<" name ">"
//! name      = "ctrl" | "control" | "primary" | "shift" | "alt" | "super" | "meta"
//! key       = fn-key | named-key | char
//! fn-key    = ("F" | "f") digit digit?
//! named-key = "BackSpace" | "Return" | "Page_Up" | ...
//! char      = ascii-char
//! ```
//!
//! Examples: `"<ctrl>1"`, `"<ctrl><shift>s"`, `"BackSpace"`, `"<alt>F4"`.

use std::str::FromStr;

use crate::node::{Chord, Key, Modifiers, modifier_from_name};

#[cfg(test)]
mod tests;

/// Function pointer type for parser combinators.
type ParserFn<T> = fn(&mut Parser) -> Result<Option<T>, ParseError>;

/// Represents an error that occurred during parsing.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

impl std::fmt::Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Parse error at position {}: {}", self.position, self.message)
	}
}

impl std::error::Error for ParseError {}

/// Maintains the parser's state for recursive descent parsing.
struct Parser<'a> {
	/// The input string being parsed.
	input: &'a str,
	/// Current byte position in the input.
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	/// Peeks at the next character without consuming it.
	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	/// Peeks at the character `n` positions ahead without consuming it.
	fn peek_at(&self, n: usize) -> Option<char> {
		self.input.chars().nth(n)
	}

	/// Consumes and returns the next character, advancing the parser.
	fn next(&mut self) -> Option<char> {
		if let Some(ch) = self.peek() {
			self.position += ch.len_utf8();
			self.input = &self.input[ch.len_utf8()..];

			Some(ch)
		} else {
			None
		}
	}

	/// Returns `true` if the parser has consumed all input.
	fn is_end(&self) -> bool {
		self.input.is_empty()
	}

	/// Consumes the next character if it matches the expected one.
	///
	/// # Errors
	///
	/// Returns a [`ParseError`] if the character doesn't match or if input
	/// is exhausted.
	fn take(&mut self, expected: char) -> Result<(), ParseError> {
		match self.next() {
			Some(ch) if ch == expected => Ok(()),
			Some(ch) => Err(ParseError {
				message: format!("expected '{expected}', found '{ch}'"),
				position: self.position - ch.len_utf8(),
			}),
			None => Err(ParseError {
				message: format!("expected '{expected}', found end of input"),
				position: self.position,
			}),
		}
	}

	/// Attempts to parse with a fallback: restores state if parsing fails.
	///
	/// Returns `Ok(Some(value))` if successful, or `Ok(None)` on failure.
	fn try_parse<T, F>(&mut self, f: F) -> Result<Option<T>, ParseError>
	where
		F: FnOnce(&mut Parser<'a>) -> Result<Option<T>, ParseError>,
	{
		let snapshot = (self.input, self.position);
		match f(self) {
			Ok(Some(val)) => Ok(Some(val)),
			Ok(None) | Err(_) => {
				self.input = snapshot.0;
				self.position = snapshot.1;
				Ok(None)
			}
		}
	}

	/// Consumes and returns characters that satisfy a predicate.
	fn take_while<F>(&mut self, predicate: F) -> String
	where
		F: Fn(char) -> bool,
	{
		let mut result = String::new();

		while let Some(ch) = self.peek() {
			if predicate(ch) {
				result.push(ch);
				self.next();
			} else {
				break;
			}
		}

		result
	}

	/// Tries multiple parsers in sequence, returning the result of the first
	/// successful one.
	fn alt<T>(&mut self, parsers: &[ParserFn<T>]) -> Result<Option<T>, ParseError> {
		for p in parsers {
			match p(self)? {
				Some(value) => return Ok(Some(value)),
				None => continue,
			}
		}

		Ok(None)
	}

	/// Creates a [`ParseError`] with the current parser position.
	fn error(&self, message: String) -> ParseError {
		ParseError {
			message,
			position: self.position,
		}
	}
}

/// Parses a single accelerator expression into a [`Chord`].
///
/// Accepts strings like `"<ctrl>s"`, `"<ctrl><shift>Return"`, or `"F5"`.
///
/// # Errors
///
/// Returns a [`ParseError`] if the input does not match the expected
/// grammar.
pub fn parse(s: &str) -> Result<Chord, ParseError> {
	let mut parser = Parser::new(s);
	let chord = parse_chord(&mut parser)?;

	if !parser.is_end() {
		return Err(parser.error(format!("expected end of input, found: {}", parser.peek().unwrap())));
	}

	Ok(chord)
}

/// Parses a key combination with optional modifiers followed by a key.
///
/// Grammar: `accel = modifier* key`
fn parse_chord(parser: &mut Parser) -> Result<Chord, ParseError> {
	let mut mods = Modifiers::empty();

	while let Some(modifier) = parse_modifier(parser)? {
		mods |= modifier;
	}

	let key = parse_key(parser)?;
	Ok(Chord::new(mods, key))
}

/// Parses a single angle-bracketed modifier token.
///
/// Returns `None` when the input does not start with `<`. A bracketed
/// token that is not a known modifier name is a hard error, not a
/// fallback to a char key.
fn parse_modifier(parser: &mut Parser) -> Result<Option<Modifiers>, ParseError> {
	if parser.peek() != Some('<') {
		return Ok(None);
	}

	parser.take('<')?;
	let name = parser.take_while(|ch| ch.is_ascii_alphabetic());
	let Some(modifier) = modifier_from_name(&name) else {
		return Err(parser.error(format!("unknown modifier: '<{name}>'")));
	};
	parser.take('>')?;

	Ok(Some(modifier))
}

/// Parses a key value, which may be a function key, named key, or char.
fn parse_key(parser: &mut Parser) -> Result<Key, ParseError> {
	match parser.alt(&[try_parse_fn_key, try_parse_named_key, try_parse_char])? {
		Some(key) => Ok(key),
		None => Err(parser.error("expected a valid key".to_string())),
	}
}

/// Attempts to parse a function key (e.g., `"F1"` to `"F35"`).
///
/// Only activates when the input starts with `F` (or `f`) followed by a
/// digit. Once activated, the digits must form a valid function key number
/// (1-35) or an error is returned (no silent degradation to a char key).
fn try_parse_fn_key(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	if !matches!(parser.peek(), Some('F' | 'f')) {
		return Ok(None);
	}

	if !matches!(parser.peek_at(1), Some(ch) if ch.is_ascii_digit()) {
		return Ok(None);
	}

	parser.next();
	let num = parser.take_while(|ch| ch.is_ascii_digit());

	match num.parse::<u8>() {
		Ok(n) if (1..=35).contains(&n) => Ok(Some(Key::F(n))),
		_ => Err(parser.error("invalid function key number (must be 1-35)".to_string())),
	}
}

/// Attempts to parse a named key such as `"BackSpace"` or `"Page_Up"`.
fn try_parse_named_key(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	parser.try_parse(|p| {
		let name = p.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
		if name.len() < 2 {
			return Ok(None);
		}

		Ok(Key::from_name(&name))
	})
}

/// Attempts to parse a single ASCII character as a key.
fn try_parse_char(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	if let Some(ch) = parser.peek() {
		if ch.is_ascii() && !ch.is_ascii_whitespace() {
			parser.next();
			Ok(Some(Key::Char(ch)))
		} else {
			Ok(None)
		}
	} else {
		Ok(None)
	}
}

impl FromStr for Chord {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}
