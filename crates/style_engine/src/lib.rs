//! Semantic font scaling driven by viewport classification.
//!
//! A [`StyleEngine`] owns a table of named style classes (font properties
//! plus a size factor) and a selector set per class. Applying a class reads
//! each matching element's *resolved* font size, multiplies it by the
//! class's factor, and writes the product back as an inline override,
//! tracking exactly which elements were touched. On a viewport transition
//! the engine drains that record, restoring cascade sizing, and reapplies
//! against the new resolved values; resetting first is what keeps factors
//! from compounding.

use anyhow::Result;
use dom::{Document, NodeKey};
use indexmap::IndexMap;
use log::debug;
use std::rc::Rc;
use viewport::{ViewportChange, ViewportSubscriber};

mod config;
mod fonts;

pub use config::{SelectorOverride, StyleConfig};
pub use fonts::FontClass;

/// Applies per-class font scaling and undoes it cleanly on demand.
pub struct StyleEngine<D: Document> {
    doc: Rc<D>,
    /// Style classes, in application order.
    styles: IndexMap<String, FontClass>,
    /// Selector set per class, in application order.
    selectors: IndexMap<String, Vec<String>>,
    /// Elements currently carrying an inline override from this engine, in
    /// application order. Drained fully before any reapplication.
    applied: Vec<NodeKey>,
}

impl<D: Document> StyleEngine<D> {
    /// Build an engine from the built-in tables merged with `config`, then
    /// run one synchronous apply pass so the first paint is already scaled,
    /// independent of any viewport event.
    pub fn new(doc: Rc<D>, config: StyleConfig) -> Self {
        let mut engine = Self {
            doc,
            styles: fonts::default_styles(),
            selectors: fonts::default_selectors(),
            applied: Vec::new(),
        };
        engine.merge_config(config);
        engine.apply_defaults();
        engine
    }

    /// Fold the per-class overrides into the selector table. `Replace` swaps
    /// the whole set (and may introduce a set for a class the built-ins lack
    /// a factor for, which then never applies); `Prefix` rewrites each
    /// built-in entry and is ignored for classes without one.
    fn merge_config(&mut self, config: StyleConfig) {
        for (name, selector_override) in config.selectors {
            match selector_override {
                SelectorOverride::Replace(list) => {
                    self.selectors.insert(name, list);
                }
                SelectorOverride::Prefix(prefix) => {
                    if let Some(defaults) = self.selectors.get_mut(&name) {
                        for selector in defaults.iter_mut() {
                            *selector = format!("{prefix}{selector}");
                        }
                    }
                }
            }
        }
    }

    /// One apply pass over every class, each against the comma-joined union
    /// of its selector set.
    pub fn apply_defaults(&mut self) {
        let passes: Vec<(String, String)> = self
            .selectors
            .iter()
            .map(|(name, list)| (name.clone(), list.join(", ")))
            .collect();
        for (name, selector) in passes {
            self.apply_size_factor(&name, &selector);
        }
        debug!("applied font scaling to {} elements", self.applied.len());
    }

    /// Scale every element matched by `selector` by the size factor of the
    /// class `name`. Elements already carrying an override from this engine
    /// are skipped, so repeating a call without an intervening reset never
    /// double-scales. A missing class, an unset factor, or an empty match
    /// are silent no-ops.
    pub fn apply_size_factor(&mut self, name: &str, selector: &str) {
        let Some(size_factor) = self
            .styles
            .get(name)
            .and_then(|class| class.size_factor)
        else {
            return;
        };
        for element in self.doc.query_selector_all(selector) {
            if self.applied.contains(&element) {
                continue;
            }
            let Some(resolved) = self.doc.computed_font_size(element) else {
                continue;
            };
            self.doc
                .set_inline_font_size(element, resolved * size_factor);
            self.applied.push(element);
        }
    }

    /// Drain the applied record completely, clearing every element's inline
    /// override so cascade-derived sizing is back in effect.
    pub fn remove_resizing(&mut self) {
        while let Some(element) = self.applied.pop() {
            self.doc.clear_inline_font_size(element);
        }
    }

    /// Number of elements currently carrying an override from this engine.
    pub fn applied_len(&self) -> usize {
        self.applied.len()
    }

    /// The font class registered under `name`.
    pub fn font_class(&self, name: &str) -> Option<&FontClass> {
        self.styles.get(name)
    }

    /// The (post-merge) selector set for `name`.
    pub fn selector_set(&self, name: &str) -> Option<&[String]> {
        self.selectors.get(name).map(Vec::as_slice)
    }
}

impl<D: Document> ViewportSubscriber for StyleEngine<D> {
    /// Reset, then reapply against the new resolved styles. Reapplying
    /// without draining first would scale already-scaled values.
    fn viewport_changed(&mut self, change: &ViewportChange) -> Result<()> {
        debug!(
            "viewport {:?} -> {:?}: re-deriving font scaling",
            change.last, change.current
        );
        self.remove_resizing();
        self.apply_defaults();
        Ok(())
    }
}
