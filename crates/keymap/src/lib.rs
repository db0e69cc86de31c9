//! Key chord model and accelerator-string parsing for plume.
//!
//! Provides the `(key, modifier)` data model used by the shortcut tables and
//! a parser for toolkit-standard accelerator strings:
//!
//! - Modifier-prefixed combinations: `"<ctrl>1"`, `"<ctrl><shift>s"`
//! - Named keys: `"BackSpace"`, `"Page_Down"`, `"F5"`
//!
//! Parsed chords render back to their canonical accelerator form via
//! [`std::fmt::Display`], and to a human-readable menu hint via
//! [`Chord::label`].

pub mod node;
pub mod parser;

pub use node::{Chord, Key, Modifiers};
pub use parser::{ParseError, parse};
