//! Minimal CSS selector engine.
//!
//! Supported: type selectors (`div`, `wc-chess-board`, `*`), `#id`,
//! `.class`, `[attr]`, `[attr=value]`, the descendant and child (`>`)
//! combinators, and comma-separated groups. Pseudo-classes are rejected.

use std::iter::Peekable;
use std::str::CharIndices;

use chesskit_protocols::NodeId;

use crate::error::SelectorError;

/// Read-only view of an element tree that selectors match against.
pub trait ElementView {
    /// Lowercase tag name, `None` for non-element nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn parent_element(&self, node: NodeId) -> Option<NodeId>;
}

/// A parsed selector group (`a, b c`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut selectors = Vec::new();
        for group in input.split(',') {
            let group = group.trim();
            if group.is_empty() {
                return Err(SelectorError::Empty(input.to_string()));
            }
            selectors.push(ComplexSelector::parse(group)?);
        }
        Ok(Self { selectors })
    }

    /// Whether `node` matches any selector of the group.
    pub fn matches<V: ElementView + ?Sized>(&self, view: &V, node: NodeId) -> bool {
        view.tag_name(node).is_some() && self.selectors.iter().any(|s| s.matches(view, node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Compound selectors joined by combinators. The combinator stored with
/// part `i` links it to part `i - 1`; the first one is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    parts: Vec<(Combinator, Compound)>,
}

impl ComplexSelector {
    fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parts = Vec::new();
        let mut chars = input.char_indices().peekable();
        let mut combinator = Combinator::Descendant;
        let mut explicit = false;

        loop {
            while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
                chars.next();
            }
            match chars.peek() {
                None => break,
                Some(&(offset, '>')) => {
                    if parts.is_empty() || explicit {
                        return Err(SelectorError::Unexpected {
                            selector: input.to_string(),
                            found: '>',
                            offset,
                        });
                    }
                    chars.next();
                    combinator = Combinator::Child;
                    explicit = true;
                    continue;
                }
                Some(_) => {}
            }

            let compound = Compound::parse(input, &mut chars)?;
            parts.push((combinator, compound));
            combinator = Combinator::Descendant;
            explicit = false;
        }

        if explicit {
            return Err(SelectorError::DanglingCombinator(input.to_string()));
        }
        if parts.is_empty() {
            return Err(SelectorError::Empty(input.to_string()));
        }
        Ok(Self { parts })
    }

    fn matches<V: ElementView + ?Sized>(&self, view: &V, node: NodeId) -> bool {
        self.matches_from(view, node, self.parts.len() - 1)
    }

    fn matches_from<V: ElementView + ?Sized>(&self, view: &V, node: NodeId, index: usize) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(view, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match combinator {
            Combinator::Child => view
                .parent_element(node)
                .is_some_and(|parent| self.matches_from(view, parent, index - 1)),
            Combinator::Descendant => {
                let mut current = view.parent_element(node);
                while let Some(ancestor) = current {
                    if self.matches_from(view, ancestor, index - 1) {
                        return true;
                    }
                    current = view.parent_element(ancestor);
                }
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

impl Compound {
    fn parse(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<Self, SelectorError> {
        let unexpected = |found: char, offset: usize| SelectorError::Unexpected {
            selector: input.to_string(),
            found,
            offset,
        };

        let mut compound = Compound::default();
        let mut empty = true;

        if let Some(&(_, c)) = chars.peek() {
            if c == '*' {
                chars.next();
                empty = false;
            } else if is_ident_char(c) {
                compound.tag = Some(read_ident(chars).to_ascii_lowercase());
                empty = false;
            }
        }

        while let Some(&(offset, c)) = chars.peek() {
            match c {
                '#' | '.' => {
                    chars.next();
                    let ident = read_ident(chars);
                    if ident.is_empty() {
                        return Err(unexpected(c, offset));
                    }
                    if c == '#' {
                        compound.id = Some(ident);
                    } else {
                        compound.classes.push(ident);
                    }
                }
                '[' => {
                    chars.next();
                    compound.attributes.push(parse_attribute(input, chars)?);
                }
                c if c.is_whitespace() || c == '>' => break,
                other => return Err(unexpected(other, offset)),
            }
            empty = false;
        }

        if empty {
            return Err(SelectorError::Empty(input.to_string()));
        }
        Ok(compound)
    }

    fn matches<V: ElementView + ?Sized>(&self, view: &V, node: NodeId) -> bool {
        let Some(tag) = view.tag_name(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if let Some(id) = &self.id {
            if view.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_list = view.attribute(node, "class").unwrap_or_default();
            let all_present = self
                .classes
                .iter()
                .all(|class| class_list.split_whitespace().any(|c| c == class));
            if !all_present {
                return false;
            }
        }
        self.attributes.iter().all(|attr| {
            match (view.attribute(node, &attr.name), &attr.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}

fn parse_attribute(
    input: &str,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<AttributeMatch, SelectorError> {
    let name = read_ident(chars);
    if name.is_empty() {
        return Err(SelectorError::UnterminatedAttribute(input.to_string()));
    }

    match chars.next() {
        Some((_, ']')) => Ok(AttributeMatch { name, value: None }),
        Some((_, '=')) => {
            let quote = match chars.peek() {
                Some(&(_, q)) if q == '"' || q == '\'' => {
                    chars.next();
                    Some(q)
                }
                _ => None,
            };

            let mut value = String::new();
            loop {
                match chars.next() {
                    None => return Err(SelectorError::UnterminatedAttribute(input.to_string())),
                    Some((_, c)) if Some(c) == quote => {
                        return match chars.next() {
                            Some((_, ']')) => Ok(AttributeMatch {
                                name,
                                value: Some(value),
                            }),
                            _ => Err(SelectorError::UnterminatedAttribute(input.to_string())),
                        };
                    }
                    Some((_, ']')) if quote.is_none() => {
                        return Ok(AttributeMatch {
                            name,
                            value: Some(value),
                        });
                    }
                    Some((_, c)) => value.push(c),
                }
            }
        }
        Some((offset, found)) => Err(SelectorError::Unexpected {
            selector: input.to_string(),
            found,
            offset,
        }),
        None => Err(SelectorError::UnterminatedAttribute(input.to_string())),
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
