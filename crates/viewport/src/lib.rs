//! Viewport classification via CSS-driven visibility probes.
//!
//! A [`ViewportClassifier`] owns a set of named probe markers inserted into
//! the document. Externally authored CSS shows or hides each marker per
//! viewport class; the classifier never decides thresholds itself, it only
//! observes which marker currently has a layout box. Resize activity is
//! coalesced by a trailing-edge debounce, and an actual change of the
//! classification is delivered to an explicit subscriber list.

use anyhow::Result;
use dom::{Document, NodeKey};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

mod debounce;

pub use debounce::Debouncer;

/// Container markup used when the embedder does not supply one.
pub const DEFAULT_PLACEHOLDER: &str = "<div class=\"breakpoint-detection\"></div>";

/// A completed viewport transition: the classification left and the one
/// entered. Either side is `None` when no marker was visible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewportChange {
    /// The classification before the transition.
    pub last: Option<String>,
    /// The classification after the transition.
    pub current: Option<String>,
}

/// Receiver of viewport transitions.
///
/// Errors are logged by the classifier and do not stop delivery to other
/// subscribers.
pub trait ViewportSubscriber {
    fn viewport_changed(&mut self, change: &ViewportChange) -> Result<()>;
}

/// Adapter turning a closure into a [`ViewportSubscriber`].
pub struct SubscriberFn<F>(pub F);

impl<F> ViewportSubscriber for SubscriberFn<F>
where
    F: FnMut(&ViewportChange) -> Result<()>,
{
    fn viewport_changed(&mut self, change: &ViewportChange) -> Result<()> {
        (self.0)(change)
    }
}

/// Forwarding impl so an embedder can keep a handle on a subscribed
/// component. Single-threaded by design, hence `Rc<RefCell<_>>`.
impl<T: ViewportSubscriber> ViewportSubscriber for Rc<RefCell<T>> {
    fn viewport_changed(&mut self, change: &ViewportChange) -> Result<()> {
        self.borrow_mut().viewport_changed(change)
    }
}

/// Classifies the viewport into a named breakpoint by probing marker
/// visibility, and emits debounced change notifications.
pub struct ViewportClassifier<D: Document> {
    doc: Rc<D>,
    /// Alias to marker markup, in configuration order.
    breakpoint_markup: IndexMap<String, String>,
    placeholder_markup: String,
    /// Container node, present once attached.
    placeholder: Option<NodeKey>,
    /// Marker node to alias, for traversal-order lookups.
    marker_alias: HashMap<NodeKey, String>,
    /// Alias to marker node, in configuration order.
    markers: IndexMap<String, NodeKey>,
    last: Option<String>,
    interval: Option<Duration>,
    debounce: Option<Debouncer>,
    subscribers: Vec<Box<dyn ViewportSubscriber>>,
}

impl<D: Document> ViewportClassifier<D> {
    /// Configure a classifier. Nothing touches the document until
    /// [`attach`](Self::attach); before that the classifier reports no
    /// classification at all.
    ///
    /// `breakpoints` maps alias to probe-marker markup; its insertion order
    /// is the tie-break order when several markers are visible at once.
    /// Without an `interval`, resize handling is inert and the
    /// classification is only ever read on demand.
    pub fn new(
        doc: Rc<D>,
        breakpoints: IndexMap<String, String>,
        interval: Option<Duration>,
        placeholder: Option<String>,
    ) -> Self {
        Self {
            doc,
            breakpoint_markup: breakpoints,
            placeholder_markup: placeholder.unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_owned()),
            placeholder: None,
            marker_alias: HashMap::new(),
            markers: IndexMap::new(),
            last: None,
            interval,
            debounce: None,
            subscribers: Vec::new(),
        }
    }

    /// One-shot continuation for the environment's "content ready" signal:
    /// insert the container, insert every probe marker at its front (later
    /// configuration entries therefore sit earlier in traversal order), and
    /// take the current classification as the baseline without notifying.
    /// Attaching again is a no-op.
    pub fn attach(&mut self) -> Result<()> {
        if self.placeholder.is_some() {
            return Ok(());
        }
        let placeholder = self.doc.append_body_fragment(&self.placeholder_markup)?;
        for (alias, marker_markup) in &self.breakpoint_markup {
            let marker = self.doc.prepend_fragment(placeholder, marker_markup)?;
            self.marker_alias.insert(marker, alias.clone());
            self.markers.insert(alias.clone(), marker);
        }
        self.placeholder = Some(placeholder);
        if let Some(interval) = self.interval {
            self.debounce = Some(Debouncer::new(interval));
        }
        self.last = self.current();
        info!(
            "viewport classifier attached: {} breakpoints, baseline {:?}",
            self.markers.len(),
            self.last
        );
        Ok(())
    }

    /// True iff a marker exists for `alias` and the environment reports it
    /// as laid out (not hidden).
    pub fn is(&self, alias: &str) -> bool {
        self.markers
            .get(alias)
            .is_some_and(|&marker| !self.doc.is_hidden(marker))
    }

    /// The current classification, recomputed from live marker visibility on
    /// every call.
    ///
    /// Walks the container's children in traversal order with no early exit
    /// and keeps the last visible alias. Markers are prepended at attach
    /// time, so traversal order is the reverse of configuration order: when
    /// several markers are visible at once, the earliest-configured alias
    /// wins.
    pub fn current(&self) -> Option<String> {
        let placeholder = self.placeholder?;
        let mut current = None;
        for child in self.doc.child_nodes(placeholder) {
            let Some(alias) = self.marker_alias.get(&child) else {
                continue;
            };
            if self.is(alias) {
                current = Some(alias.clone());
            }
        }
        current
    }

    /// The classification as of the last completed debounce tick (or the
    /// attach baseline).
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Register a subscriber for viewport transitions.
    pub fn subscribe(&mut self, subscriber: Box<dyn ViewportSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Feed a resize event observed at `now` into the debounce window.
    pub fn handle_resize(&mut self, now: Instant) {
        if let Some(debounce) = &mut self.debounce {
            debounce.poke(now);
        }
    }

    /// Drive the debounce clock. At most one recomputation runs per
    /// quiescence window; a transition dispatches one [`ViewportChange`] to
    /// every subscriber, and `last` is updated only after dispatch, so
    /// subscribers consistently observe the pre-transition value in the
    /// event.
    pub fn tick(&mut self, now: Instant) {
        let due = self
            .debounce
            .as_mut()
            .is_some_and(|debounce| debounce.fire_if_due(now));
        if !due {
            return;
        }
        let current = self.current();
        if current != self.last {
            let change = ViewportChange {
                last: self.last.clone(),
                current: current.clone(),
            };
            debug!(
                "viewport changed: {:?} -> {:?}",
                change.last, change.current
            );
            for subscriber in &mut self.subscribers {
                if let Err(error) = subscriber.viewport_changed(&change) {
                    warn!("viewport subscriber failed: {error:#}");
                }
            }
        }
        self.last = current;
    }
}
