//! Placeholder tokens such as `/NAME_01/` that must survive translation.

use std::sync::LazyLock;
use regex::Regex;

static CONSTANT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[A-Z0-9_]+/").expect("constant pattern is valid"));

/// Distinct constants of `text` in order of first appearance
pub fn extract_constants(text: &str) -> Vec<String> {
    let mut constants: Vec<String> = Vec::new();
    for m in CONSTANT_PATTERN.find_iter(text) {
        if !constants.iter().any(|c| c == m.as_str()) {
            constants.push(m.as_str().to_string());
        }
    }
    constants
}

pub fn contains_all_constants(text: &str, constants: &[String]) -> bool {
    constants.iter().all(|c| text.contains(c.as_str()))
}

/// A piece of text split around constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Text(&'a str),
    Constant(&'a str),
}

/// Split `text` on constants, keeping them as their own pieces
pub fn split_on_constants(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for m in CONSTANT_PATTERN.find_iter(text) {
        if m.start() > last {
            pieces.push(Piece::Text(&text[last..m.start()]));
        }
        pieces.push(Piece::Constant(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        pieces.push(Piece::Text(&text[last..]));
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_constants() {
        assert_eq!(
            extract_constants("Give /NAME_01/ the /ITEM_1/, /NAME_01/!"),
            vec!["/NAME_01/".to_string(), "/ITEM_1/".to_string()]
        );
        assert!(extract_constants("and/or /lower/ / /").is_empty());
    }

    #[test]
    fn test_contains_all_constants_ignores_order() {
        let constants = extract_constants("/A/ then /B/");
        assert!(contains_all_constants("/B/ puis /A/", &constants));
        assert!(!contains_all_constants("/B/ seul", &constants));
    }

    #[test]
    fn test_split_on_constants() {
        assert_eq!(
            split_on_constants("Hi /A//B/ there"),
            vec![
                Piece::Text("Hi "),
                Piece::Constant("/A/"),
                Piece::Constant("/B/"),
                Piece::Text(" there"),
            ]
        );
        assert_eq!(split_on_constants("/A/"), vec![Piece::Constant("/A/")]);
        assert!(split_on_constants("").is_empty());
    }
}
