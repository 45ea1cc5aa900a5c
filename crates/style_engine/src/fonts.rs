//! Built-in font class and selector tables.
//!
//! These are the design-system defaults; [`crate::StyleConfig`] can replace
//! or prefix the selector sets per class at engine construction. Each engine
//! gets a fresh copy of the tables, so merges never leak across instances.

use indexmap::IndexMap;

/// A named typography class of the design system: font properties plus the
/// multiplier the engine applies to resolved font sizes.
#[derive(Clone, Debug, PartialEq)]
pub struct FontClass {
    /// Font family name.
    pub family: String,
    /// Font weight, as authored (e.g. `"500"`).
    pub weight: String,
    /// Font style (e.g. `"normal"`).
    pub style: String,
    /// Multiplier applied to an element's resolved font size. `None`
    /// disables scaling for the class.
    pub size_factor: Option<f32>,
}

impl FontClass {
    fn new(family: &str, weight: &str, style: &str, size_factor: f32) -> Self {
        Self {
            family: family.to_owned(),
            weight: weight.to_owned(),
            style: style.to_owned(),
            size_factor: Some(size_factor),
        }
    }
}

/// The built-in style classes, in application order.
pub(crate) fn default_styles() -> IndexMap<String, FontClass> {
    let mut styles = IndexMap::new();
    styles.insert(
        "body".to_owned(),
        FontClass::new("MrsEavesRoman", "500", "normal", 1.30),
    );
    styles.insert(
        "secondary".to_owned(),
        FontClass::new("MrsEavesRoman", "500", "normal", 1.30),
    );
    styles.insert(
        "heading".to_owned(),
        FontClass::new("Futura Std", "700", "normal", 1.20),
    );
    styles.insert(
        "hero".to_owned(),
        FontClass::new("Bombshell Pro", "400", "normal", 1.20),
    );
    styles
}

/// The built-in selector set per class, in application order.
pub(crate) fn default_selectors() -> IndexMap<String, Vec<String>> {
    let owned = |list: &[&str]| list.iter().map(|&s| s.to_owned()).collect::<Vec<_>>();
    let mut selectors = IndexMap::new();
    selectors.insert("hero".to_owned(), owned(&[".m-hero-text"]));
    selectors.insert("secondary".to_owned(), owned(&[".m-secondary-text"]));
    selectors.insert(
        "body".to_owned(),
        owned(&["body", ".m-body-text", ".m-btn-base"]),
    );
    selectors.insert(
        "heading".to_owned(),
        owned(&[
            "h1",
            ".h1",
            "h2",
            ".h2",
            "h3",
            ".h3",
            "h4",
            ".h4",
            "h5",
            ".h5",
            "h6",
            ".h6",
            ".m-heading-text",
        ]),
    );
    selectors
}
