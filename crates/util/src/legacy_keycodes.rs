//! Translation between legacy numeric key codes (`event.which`) and key names.
//!
//! Modern input sources report key names directly; this table only exists for
//! sources that still report numeric codes. It is deliberately isolated from
//! the canonical key enumeration: names returned here may fall outside it
//! (`Backspace`, `PageUp`, ...) and callers decide how to canonicalize them.
//!
//! Translation is lossy for punctuation: a single code covers both the plain
//! and the shifted character of a key (`'` and `"` share 222), so
//! `name_to_code` accepts either character while `code_to_name` always
//! answers with the one listed in the table.

/// Code to name table, codes 8-222.
const KEY_TABLE: &[(u16, &str)] = &[
    (8, "Backspace"),
    (9, "Tab"),
    (13, "Enter"),
    (16, "Shift"),
    (17, "Control"),
    (18, "Alt"),
    (27, "Escape"),
    (32, "Space"),
    (33, "PageUp"),
    (34, "PageDown"),
    (35, "End"),
    (36, "Home"),
    (37, "ArrowLeft"),
    (38, "ArrowUp"),
    (39, "ArrowRight"),
    (40, "ArrowDown"),
    (44, "PrintScreen"),
    (45, "Insert"),
    (46, "Delete"),
    (48, "0"),
    (49, "1"),
    (50, "2"),
    (51, "3"),
    (52, "4"),
    (53, "5"),
    (54, "6"),
    (55, "7"),
    (56, "8"),
    (57, "9"),
    (65, "a"),
    (66, "b"),
    (67, "c"),
    (68, "d"),
    (69, "e"),
    (70, "f"),
    (71, "g"),
    (72, "h"),
    (73, "i"),
    (74, "j"),
    (75, "k"),
    (76, "l"),
    (77, "m"),
    (78, "n"),
    (79, "o"),
    (80, "p"),
    (81, "q"),
    (82, "r"),
    (83, "s"),
    (84, "t"),
    (85, "u"),
    (86, "v"),
    (87, "w"),
    (88, "x"),
    (89, "y"),
    (90, "z"),
    (186, ";"),
    (187, "+"),
    (188, ","),
    (189, "-"),
    (190, "."),
    (191, "?"),
    (219, "["),
    (220, "\\"),
    (221, "]"),
    (222, "\""),
];

/// Second character sharing a punctuation code.
const SHARED_PUNCTUATION: &[(&str, u16)] = &[
    (":", 186),
    ("=", 187),
    ("<", 188),
    ("_", 189),
    (">", 190),
    ("/", 191),
    ("{", 219),
    ("|", 220),
    ("}", 221),
    ("'", 222),
];

/// Looks up the key name for a legacy code.
pub fn code_to_name(code: u16) -> Option<&'static str> {
    KEY_TABLE.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// Looks up the legacy code for a key name. Letters match case-insensitively;
/// legacy aliases (`Esc`, `Left`, `Up`, `Right`, `Down`, `Del`, `" "`) are
/// accepted.
pub fn name_to_code(name: &str) -> Option<u16> {
    let normalized = match name {
        " " | "Spacebar" => "Space",
        "Esc" => "Escape",
        "Left" => "ArrowLeft",
        "Up" => "ArrowUp",
        "Right" => "ArrowRight",
        "Down" => "ArrowDown",
        "Del" => "Delete",
        other => other,
    };
    if let Some((code, _)) = KEY_TABLE.iter().find(|(_, n)| *n == normalized) {
        return Some(*code);
    }
    if normalized.chars().count() == 1 {
        let lower = normalized.to_lowercase();
        if let Some((code, _)) = KEY_TABLE.iter().find(|(_, n)| *n == lower) {
            return Some(*code);
        }
    }
    SHARED_PUNCTUATION.iter().find(|(n, _)| *n == normalized).map(|(_, code)| *code)
}

/// True when `code` covers more than one character, so the round trip through
/// `name_to_code` is not unique.
pub fn is_ambiguous(code: u16) -> bool {
    SHARED_PUNCTUATION.iter().any(|(_, c)| *c == code)
}

/// Every code in the table, ascending.
pub fn codes() -> impl Iterator<Item = u16> {
    KEY_TABLE.iter().map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unambiguous_codes() {
        for code in codes().filter(|c| !is_ambiguous(*c)) {
            let name = code_to_name(code).expect("code present");
            assert_eq!(name_to_code(name), Some(code), "round trip failed for {code} ({name})");
        }
    }

    #[test]
    fn shared_punctuation_is_lossy() {
        assert_eq!(name_to_code("'"), Some(222));
        assert_eq!(name_to_code("\""), Some(222));
        assert_eq!(code_to_name(222), Some("\""));
        assert!(is_ambiguous(222));
        assert!(!is_ambiguous(65));
    }

    #[test]
    fn accepts_legacy_aliases() {
        assert_eq!(name_to_code("Esc"), Some(27));
        assert_eq!(name_to_code(" "), Some(32));
        assert_eq!(name_to_code("Down"), Some(40));
        assert_eq!(name_to_code("Q"), Some(81));
    }

    #[test]
    fn unknown_entries_are_none() {
        assert_eq!(code_to_name(0), None);
        assert_eq!(code_to_name(223), None);
        assert_eq!(name_to_code("F5"), None);
    }
}
