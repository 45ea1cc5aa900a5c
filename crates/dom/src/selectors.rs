//! CSS selector parsing for document queries.
//!
//! Supports the subset the font-scaling selector tables use: type selectors,
//! `#id`, `.class`, the universal selector, compounds of those, and the
//! descendant / child combinators, in comma-separated lists. Pseudo-classes
//! and pseudo-elements are unsupported; a selector containing one is
//! discarded so it matches nothing.

use core::iter::Peekable;
use core::mem::take;

/// Combinator between two compound selector parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (whitespace).
    Descendant,
    /// Child combinator (`>`).
    Child,
}

/// One compound selector: tag and/or id and/or classes, or `*`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound {
    /// Optional tag name, lower-cased, for type selectors.
    pub tag: Option<String>,
    /// Optional element id, for `#id` selectors.
    pub element_id: Option<String>,
    /// Class list for `.class` selectors.
    pub classes: Vec<String>,
    /// Whether this compound is the universal selector.
    pub universal: bool,
}

impl Compound {
    fn has_content(&self) -> bool {
        self.universal || self.tag.is_some() || self.element_id.is_some() || !self.classes.is_empty()
    }
}

/// One part of a complex selector and the combinator linking it to the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorPart {
    /// The compound selector of this part.
    pub compound: Compound,
    /// The combinator to the following part, `None` on the last part.
    pub combinator_to_next: Option<Combinator>,
}

/// A full complex selector, leftmost part first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    /// The ordered compound parts.
    pub parts: Vec<SelectorPart>,
}

/// Parse a comma-separated selector list. Unparseable entries are dropped.
pub fn parse_selector_list(input: &str) -> Vec<Selector> {
    input.split(',').filter_map(parse_single_selector).collect()
}

/// Consume an identifier (letters, digits, `-`, `_`) from the stream.
fn consume_ident<I>(chars: &mut Peekable<I>) -> String
where
    I: Iterator<Item = char>,
{
    let mut out = String::new();
    while let Some(&character) = chars.peek() {
        if !(character.is_alphanumeric() || character == '-' || character == '_') {
            break;
        }
        out.push(character);
        chars.next();
    }
    out
}

/// Push `current` into `parts` with the given combinator and reset it.
fn commit_part(parts: &mut Vec<SelectorPart>, current: &mut Compound, combinator: Combinator) {
    parts.push(SelectorPart {
        compound: take(current),
        combinator_to_next: Some(combinator),
    });
}

fn parse_single_selector(selector_str: &str) -> Option<Selector> {
    let mut chars = selector_str.trim().chars().peekable();
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut current = Compound::default();

    loop {
        // Whitespace between compounds is the descendant combinator.
        let mut saw_whitespace = false;
        while chars.peek().is_some_and(|character| character.is_ascii_whitespace()) {
            saw_whitespace = true;
            chars.next();
        }
        let Some(character) = chars.peek().copied() else {
            break;
        };
        if saw_whitespace && current.has_content() && character != '>' {
            commit_part(&mut parts, &mut current, Combinator::Descendant);
        }
        match character {
            '>' => {
                chars.next();
                if !current.has_content() {
                    // Leading or doubled combinator.
                    return None;
                }
                commit_part(&mut parts, &mut current, Combinator::Child);
            }
            '*' => {
                chars.next();
                current.universal = true;
            }
            '#' => {
                chars.next();
                let ident = consume_ident(&mut chars);
                if ident.is_empty() {
                    return None;
                }
                current.element_id = Some(ident);
            }
            '.' => {
                chars.next();
                let ident = consume_ident(&mut chars);
                if ident.is_empty() {
                    return None;
                }
                current.classes.push(ident);
            }
            ':' => {
                // Pseudo-class or pseudo-element: unsupported, discard.
                return None;
            }
            character if character.is_alphanumeric() => {
                current.tag = Some(consume_ident(&mut chars).to_ascii_lowercase());
            }
            _ => {
                // Unsupported syntax (attribute selectors, sibling
                // combinators, ...): discard the selector.
                return None;
            }
        }
    }

    if current.has_content() {
        parts.push(SelectorPart {
            compound: current,
            combinator_to_next: None,
        });
    }
    if parts.is_empty() || parts.last().is_some_and(|part| part.combinator_to_next.is_some()) {
        return None;
    }
    Some(Selector { parts })
}
