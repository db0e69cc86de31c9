use super::*;

#[test]
fn plain_char() {
	assert_eq!(parse("s").unwrap(), Chord::from(Key::Char('s')));
	assert_eq!(parse("1").unwrap(), Chord::from(Key::Char('1')));
}

#[test]
fn modifier_prefixed() {
	assert_eq!(parse("<ctrl>1").unwrap(), Chord::new(Modifiers::CTRL, Key::Char('1')));
	assert_eq!(
		parse("<ctrl><shift>s").unwrap(),
		Chord::new(Modifiers::CTRL | Modifiers::SHIFT, Key::Char('s')),
	);
}

#[test]
fn modifier_aliases() {
	assert_eq!(parse("<Control>q").unwrap(), parse("<ctrl>q").unwrap());
	assert_eq!(parse("<Primary>q").unwrap(), parse("<ctrl>q").unwrap());
	assert_eq!(parse("<meta>q").unwrap(), parse("<super>q").unwrap());
}

#[test]
fn named_keys() {
	assert_eq!(parse("BackSpace").unwrap(), Chord::from(Key::BackSpace));
	assert_eq!(parse("<alt>Page_Down").unwrap(), Chord::new(Modifiers::ALT, Key::PageDown));
	assert_eq!(parse("space").unwrap(), Chord::from(Key::Char(' ')));
}

#[test]
fn fn_keys() {
	assert_eq!(parse("F5").unwrap(), Chord::from(Key::F(5)));
	assert_eq!(parse("<ctrl>F12").unwrap(), Chord::new(Modifiers::CTRL, Key::F(12)));
	assert!(parse("F99").is_err());
}

#[test]
fn unknown_modifier_is_error() {
	let err = parse("<hyper>x").unwrap_err();
	assert!(err.message.contains("unknown modifier"), "{err}");
}

#[test]
fn trailing_garbage_is_error() {
	assert!(parse("<ctrl>ss").is_err());
	assert!(parse("BackSpacex").is_err());
}

#[test]
fn empty_input_is_error() {
	assert!(parse("").is_err());
}

#[test]
fn unterminated_modifier_is_error() {
	assert!(parse("<ctrl").is_err());
}

#[test]
fn display_round_trips() {
	for accel in ["<ctrl>1", "<ctrl><shift>s", "BackSpace", "<alt>F4", "<super>space"] {
		let chord = parse(accel).unwrap();
		assert_eq!(parse(&chord.to_string()).unwrap(), chord, "{accel}");
	}
}

#[test]
fn labels() {
	assert_eq!(parse("<ctrl><shift>s").unwrap().label(), "Ctrl+Shift+S");
	assert_eq!(parse("<alt>Page_Up").unwrap().label(), "Alt+PgUp");
	assert_eq!(parse("BackSpace").unwrap().label(), "BackSpace");
}
