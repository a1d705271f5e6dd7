//! A small CSS-like selector language for querying documents.
//!
//! Supported grammar, enough for the declarative attribute contract:
//!
//! ```text
//! list     := compound ( "," compound )*
//! compound := ( tag | "*" )? simple*
//! simple   := "#" ident | "." ident | "[" ident ( "=" value )? "]" | ":not(" simple ")"
//! ```
//!
//! Combinators (descendant, child, sibling) are not supported; queries are
//! always scoped to a container instead.

use std::fmt;
use std::str::FromStr;

use keynav_types::attributes;
use thiserror::Error;

/// Selector parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("unexpected {found:?} at position {position}")]
    Unexpected { found: char, position: usize },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("combinators are not supported")]
    Combinator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
    Not(Box<Simple>),
}

impl Simple {
    fn matches(&self, attribute: &dyn Fn(&str) -> Option<String>) -> bool {
        match self {
            Simple::Id(id) => attribute(attributes::ID).as_deref() == Some(id.as_str()),
            Simple::Class(class) => attribute(attributes::CLASS)
                .map(|list| list.split_whitespace().any(|c| c == class))
                .unwrap_or(false),
            Simple::Attribute { name, value } => match (attribute(name), value) {
                (Some(actual), Some(expected)) => actual == *expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
            Simple::Not(inner) => !inner.matches(attribute),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    parts: Vec<Simple>,
}

/// Parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        let chars: Vec<char> = source.chars().collect();
        let mut parser = Parser { chars: &chars, pos: 0 };
        parser.skip_whitespace();
        if parser.at_end() {
            return Err(SelectorError::Empty);
        }
        loop {
            parser.skip_whitespace();
            alternatives.push(parser.compound()?);
            parser.skip_whitespace();
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some(_) => return Err(SelectorError::Combinator),
            }
        }
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Selector matching elements that carry `name` regardless of its value.
    pub fn attribute(name: &str) -> Self {
        Self {
            source: format!("[{name}]"),
            alternatives: vec![Compound {
                tag: None,
                parts: vec![Simple::Attribute {
                    name: name.to_string(),
                    value: None,
                }],
            }],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tests an element described by its tag name and an attribute accessor.
    pub fn matches_with(&self, tag: &str, attribute: &dyn Fn(&str) -> Option<String>) -> bool {
        self.alternatives.iter().any(|compound| {
            let tag_matches = compound
                .tag
                .as_deref()
                .map(|expected| expected.eq_ignore_ascii_case(tag))
                .unwrap_or(true);
            tag_matches && compound.parts.iter().all(|part| part.matches(attribute))
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.peek() {
            Some(found) if found == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(SelectorError::Unexpected {
                found,
                position: self.pos,
            }),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(SelectorError::Unexpected {
                    found,
                    position: self.pos,
                }),
                None => Err(SelectorError::UnexpectedEnd),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound {
            tag: None,
            parts: Vec::new(),
        };
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                universal = true;
                self.pos += 1;
            }
            Some(c) if c.is_alphabetic() => compound.tag = Some(self.ident()?),
            _ => {}
        }
        while let Some(c) = self.peek() {
            if c == ',' || c.is_whitespace() {
                break;
            }
            compound.parts.push(self.simple()?);
        }
        if !universal && compound.tag.is_none() && compound.parts.is_empty() {
            return match self.peek() {
                Some(found) => Err(SelectorError::Unexpected {
                    found,
                    position: self.pos,
                }),
                None => Err(SelectorError::UnexpectedEnd),
            };
        }
        Ok(compound)
    }

    fn simple(&mut self) -> Result<Simple, SelectorError> {
        match self.peek() {
            Some('#') => {
                self.pos += 1;
                Ok(Simple::Id(self.ident()?))
            }
            Some('.') => {
                self.pos += 1;
                Ok(Simple::Class(self.ident()?))
            }
            Some('[') => {
                self.pos += 1;
                self.skip_whitespace();
                let name = self.ident()?;
                self.skip_whitespace();
                let value = if self.peek() == Some('=') {
                    self.pos += 1;
                    self.skip_whitespace();
                    Some(self.value()?)
                } else {
                    None
                };
                self.skip_whitespace();
                self.expect(']')?;
                Ok(Simple::Attribute { name, value })
            }
            Some(':') => {
                self.pos += 1;
                let pseudo = self.ident()?;
                if !pseudo.eq_ignore_ascii_case("not") {
                    return Err(SelectorError::Unexpected {
                        found: ':',
                        position: self.pos - pseudo.chars().count() - 1,
                    });
                }
                self.expect('(')?;
                self.skip_whitespace();
                let inner = self.simple()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(Simple::Not(Box::new(inner)))
            }
            Some(found) => Err(SelectorError::Unexpected {
                found,
                position: self.pos,
            }),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.expect(quote)?;
                Ok(value)
            }
            _ => self.ident(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn element<'a>(attrs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = attrs.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn matches_attribute_presence_and_value() {
        let presence = Selector::parse("[data-knw-list]").unwrap();
        let with_value = Selector::parse("[tabindex=\"0\"]").unwrap();
        let attrs = [("data-knw-list", ""), ("tabindex", "0")];
        assert!(presence.matches_with("ul", &element(&attrs)));
        assert!(with_value.matches_with("li", &element(&attrs)));
        assert!(!with_value.matches_with("li", &element(&[("tabindex", "-1")])));
    }

    #[test]
    fn matches_tag_id_and_class() {
        let selector = Selector::parse("button#save.primary").unwrap();
        let attrs = [("id", "save"), ("class", "wide primary")];
        assert!(selector.matches_with("BUTTON", &element(&attrs)));
        assert!(!selector.matches_with("a", &element(&attrs)));
    }

    #[test]
    fn supports_lists_and_negation() {
        let selector = Selector::parse("a[href]:not([disabled]), button:not([disabled]), [data-knw-activatable]").unwrap();
        assert!(selector.matches_with("a", &element(&[("href", "#x")])));
        assert!(!selector.matches_with("button", &element(&[("disabled", "")])));
        assert!(selector.matches_with("div", &element(&[("data-knw-activatable", "")])));
        assert!(!selector.matches_with("div", &element(&[])));
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("ul li"), Err(SelectorError::Combinator));
        assert_eq!(Selector::parse("[data-x"), Err(SelectorError::UnexpectedEnd));
        assert!(matches!(Selector::parse(":hover"), Err(SelectorError::Unexpected { .. })));
    }

    #[test]
    fn universal_selector_matches_everything() {
        let selector = Selector::parse("*").unwrap();
        assert!(selector.matches_with("span", &element(&[])));
    }
}
