//! Selectors
//!
//! The subset of CSS selectors the blog scripts use: compound selectors made
//! of a tag, `#id`, `.class`, `[attr]` and `[attr="value"]`, joined by the
//! descendant combinator, in comma-separated lists.

use crate::{DomTree, ElementData, NodeId};

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
}

/// `[name]` or `[name="value"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub value: Option<String>,
}

/// A compound selector such as `img.cover[data-src]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

impl CompoundSelector {
    /// Matches every element
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Self::any().with_class(class)
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Require an attribute to be present
    pub fn attr(mut self, name: &str) -> Self {
        self.attrs.push(AttrSelector {
            name: name.to_ascii_lowercase(),
            value: None,
        });
        self
    }

    /// Require an attribute with an exact value
    pub fn attr_eq(mut self, name: &str, value: &str) -> Self {
        self.attrs.push(AttrSelector {
            name: name.to_ascii_lowercase(),
            value: Some(value.to_string()),
        });
        self
    }

    pub fn matches(&self, elem: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != elem.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| elem.class_list.contains(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match (&a.value, elem.get_attr(&a.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(want), Some(have)) => want == have,
        })
    }
}

/// Compound selectors joined by descendant combinators; the last is the subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    parts: Vec<CompoundSelector>,
}

impl ComplexSelector {
    pub fn new(parts: Vec<CompoundSelector>) -> Self {
        Self { parts }
    }

    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some((subject, ancestors)) = self.parts.split_last() else {
            return false;
        };
        match tree.element(node) {
            Some(elem) if subject.matches(elem) => {}
            _ => return false,
        }

        // Right-to-left; greedy ancestor matching is exact for descendant-only chains
        let mut current = tree.parent(node);
        for part in ancestors.iter().rev() {
            loop {
                if !current.is_valid() {
                    return false;
                }
                let hit = tree.element(current).is_some_and(|e| part.matches(e));
                current = tree.parent(current);
                if hit {
                    break;
                }
            }
        }
        true
    }
}

impl From<CompoundSelector> for ComplexSelector {
    fn from(compound: CompoundSelector) -> Self {
        Self::new(vec![compound])
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn new(selectors: Vec<ComplexSelector>) -> Self {
        Self { selectors }
    }

    /// List of single compound selectors, e.g. `h5, h6`
    pub fn of(compounds: impl IntoIterator<Item = CompoundSelector>) -> Self {
        Self::new(compounds.into_iter().map(ComplexSelector::from).collect())
    }

    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, node))
    }

    /// Parse selector text
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut selectors = Vec::new();
        for group in split_outside_brackets(input, |c| c == ',') {
            let mut parts = Vec::new();
            for (offset, compound) in split_compounds(group.1) {
                parts.push(parse_compound(compound, group.0 + offset)?);
            }
            if parts.is_empty() {
                return Err(SelectorError::Empty);
            }
            selectors.push(ComplexSelector::new(parts));
        }
        Ok(Self::new(selectors))
    }
}

impl From<CompoundSelector> for SelectorList {
    fn from(compound: CompoundSelector) -> Self {
        Self::of([compound])
    }
}

/// Split on a delimiter that is not inside `[...]`, keeping start offsets
fn split_outside_brackets(input: &str, is_delim: impl Fn(char) -> bool) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if depth > 0 => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && is_delim(c) => {
                pieces.push((start, &input[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push((start, &input[start..]));
    pieces
}

fn split_compounds(group: &str) -> Vec<(usize, &str)> {
    split_outside_brackets(group, char::is_whitespace)
        .into_iter()
        .filter(|(_, s)| !s.is_empty())
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(text: &str, base: usize) -> Result<CompoundSelector, SelectorError> {
    let mut compound = CompoundSelector::any();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;

    let ident = |i: &mut usize| -> String {
        let mut s = String::new();
        while let Some(&(_, c)) = chars.get(*i) {
            if !is_ident_char(c) {
                break;
            }
            s.push(c);
            *i += 1;
        }
        s
    };

    while let Some(&(offset, c)) = chars.get(i) {
        let unexpected = SelectorError::UnexpectedChar { ch: c, offset: base + offset };
        match c {
            '*' if i == 0 => i += 1,
            c if i == 0 && is_ident_char(c) => {
                compound.tag = Some(ident(&mut i).to_ascii_lowercase());
            }
            '.' | '#' => {
                i += 1;
                let name = ident(&mut i);
                if name.is_empty() {
                    return Err(unexpected);
                }
                if c == '.' {
                    compound.classes.push(name);
                } else {
                    compound.id = Some(name);
                }
            }
            '[' => {
                i += 1;
                let name = ident(&mut i).to_ascii_lowercase();
                if name.is_empty() {
                    return Err(SelectorError::UnterminatedAttribute);
                }
                let value = match chars.get(i).map(|&(_, c)| c) {
                    Some(']') => None,
                    Some('=') => {
                        i += 1;
                        let mut value = String::new();
                        let quote = match chars.get(i).map(|&(_, c)| c) {
                            Some(q @ ('"' | '\'')) => {
                                i += 1;
                                Some(q)
                            }
                            _ => None,
                        };
                        loop {
                            match (chars.get(i).map(|&(_, c)| c), quote) {
                                (None, _) => return Err(SelectorError::UnterminatedAttribute),
                                (Some(c), Some(q)) if c == q => {
                                    i += 1;
                                    break;
                                }
                                (Some(']'), None) => break,
                                (Some(c), _) => {
                                    value.push(c);
                                    i += 1;
                                }
                            }
                        }
                        Some(value)
                    }
                    _ => return Err(SelectorError::UnterminatedAttribute),
                };
                if chars.get(i).map(|&(_, c)| c) != Some(']') {
                    return Err(SelectorError::UnterminatedAttribute);
                }
                i += 1;
                compound.attrs.push(AttrSelector { name, value });
            }
            _ => return Err(unexpected),
        }
    }

    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lazy_selectors() {
        let list = SelectorList::parse("img[data-src], img[data-srcset], source[data-srcset]").unwrap();
        let expected = SelectorList::of([
            CompoundSelector::tag("img").attr("data-src"),
            CompoundSelector::tag("img").attr("data-srcset"),
            CompoundSelector::tag("source").attr("data-srcset"),
        ]);
        assert_eq!(list, expected);
    }

    #[test]
    fn test_parse_compound_parts() {
        let list = SelectorList::parse(".timeline-year h3, #main .blog-item[data-url=\"/a b\"]").unwrap();
        let expected = SelectorList::new(vec![
            ComplexSelector::new(vec![
                CompoundSelector::class("timeline-year"),
                CompoundSelector::tag("h3"),
            ]),
            ComplexSelector::new(vec![
                CompoundSelector::any().with_id("main"),
                CompoundSelector::class("blog-item").attr_eq("data-url", "/a b"),
            ]),
        ]);
        assert_eq!(list, expected);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorList::parse("img, "), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("img[data-src"), Err(SelectorError::UnterminatedAttribute));
        assert!(matches!(
            SelectorList::parse("img > p"),
            Err(SelectorError::UnexpectedChar { ch: '>', .. })
        ));
    }
}
