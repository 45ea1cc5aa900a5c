use anyhow::anyhow;
use dom::{Document as _, MemoryDocument, NodeKey};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use viewport::{SubscriberFn, ViewportChange, ViewportClassifier};

const INTERVAL: Duration = Duration::from_millis(100);

fn breakpoints() -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    map.insert(
        "mobile".to_owned(),
        "<div class=\"bp bp-mobile\"></div>".to_owned(),
    );
    map.insert(
        "desktop".to_owned(),
        "<div class=\"bp bp-desktop\"></div>".to_owned(),
    );
    map
}

fn marker(doc: &MemoryDocument, class: &str) -> NodeKey {
    let found = doc.query_selector_all(&format!(".{class}"));
    assert_eq!(found.len(), 1, "expected one marker for .{class}");
    found[0]
}

fn recording_subscriber() -> (
    Rc<RefCell<Vec<ViewportChange>>>,
    Box<dyn viewport::ViewportSubscriber>,
) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscriber = Box::new(SubscriberFn(
        move |change: &ViewportChange| -> anyhow::Result<()> {
            sink.borrow_mut().push(change.clone());
            Ok(())
        },
    ));
    (seen, subscriber)
}

#[test]
fn inert_before_attach() {
    let _ = env_logger::builder().is_test(true).try_init();
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier =
        ViewportClassifier::new(Rc::clone(&doc), breakpoints(), Some(INTERVAL), None);
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);

    assert!(!classifier.is("mobile"));
    assert_eq!(classifier.current(), None);
    assert_eq!(classifier.last(), None);

    let start = Instant::now();
    classifier.handle_resize(start);
    classifier.tick(start + INTERVAL);
    assert!(seen.borrow().is_empty());
    assert!(doc.query_selector_all(".breakpoint-detection").is_empty());
}

#[test]
fn attach_inserts_markers_front_first_and_takes_a_silent_baseline() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier =
        ViewportClassifier::new(Rc::clone(&doc), breakpoints(), Some(INTERVAL), None);
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);
    classifier.attach().unwrap();

    // Later configuration entries end up earlier in traversal order.
    let holder = marker(&doc, "breakpoint-detection");
    let children = doc.child_nodes(holder);
    assert_eq!(children, vec![marker(&doc, "bp-desktop"), marker(&doc, "bp-mobile")]);

    // Baseline established with no notification.
    assert_eq!(classifier.last(), Some("mobile"));
    assert!(seen.borrow().is_empty());
}

#[test]
fn earliest_configured_alias_wins_when_both_markers_are_visible() {
    let doc = Rc::new(MemoryDocument::new());
    let mut map = IndexMap::new();
    map.insert("a".to_owned(), "<div class=\"bp-a\"></div>".to_owned());
    map.insert("b".to_owned(), "<div class=\"bp-b\"></div>".to_owned());
    let mut classifier = ViewportClassifier::new(Rc::clone(&doc), map, None, None);
    classifier.attach().unwrap();

    assert!(classifier.is("a"));
    assert!(classifier.is("b"));
    assert_eq!(classifier.current(), Some("a".to_owned()));
}

#[test]
fn is_reflects_marker_visibility() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier = ViewportClassifier::new(Rc::clone(&doc), breakpoints(), None, None);
    classifier.attach().unwrap();

    assert!(classifier.is("mobile"));
    doc.set_hidden(marker(&doc, "bp-mobile"), true);
    assert!(!classifier.is("mobile"));
    assert!(!classifier.is("tablet"));
    assert_eq!(classifier.current(), Some("desktop".to_owned()));
}

#[test]
fn resize_burst_coalesces_into_one_notification_after_the_interval() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier =
        ViewportClassifier::new(Rc::clone(&doc), breakpoints(), Some(INTERVAL), None);
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);
    classifier.attach().unwrap();
    assert_eq!(classifier.last(), Some("mobile"));

    // The viewport crosses a threshold: authored CSS hides the mobile marker.
    doc.set_hidden(marker(&doc, "bp-mobile"), true);

    let start = Instant::now();
    for tick in 0..10 {
        classifier.handle_resize(start + Duration::from_millis(tick * 10));
    }
    let last_resize = start + Duration::from_millis(90);

    // Mid-window: the burst has not quiesced, nothing fires.
    classifier.tick(last_resize + Duration::from_millis(50));
    assert!(seen.borrow().is_empty());
    assert_eq!(classifier.last(), Some("mobile"));

    // One notification, one interval after the last event of the burst.
    classifier.tick(last_resize + INTERVAL);
    assert_eq!(
        *seen.borrow(),
        vec![ViewportChange {
            last: Some("mobile".to_owned()),
            current: Some("desktop".to_owned()),
        }]
    );
    assert_eq!(classifier.last(), Some("desktop"));

    // The deadline was consumed; later ticks stay quiet.
    classifier.tick(last_resize + Duration::from_secs(5));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn unchanged_classification_is_suppressed() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier =
        ViewportClassifier::new(Rc::clone(&doc), breakpoints(), Some(INTERVAL), None);
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);
    classifier.attach().unwrap();

    let start = Instant::now();
    classifier.handle_resize(start);
    classifier.tick(start + INTERVAL);

    assert!(seen.borrow().is_empty());
    assert_eq!(classifier.last(), Some("mobile"));
}

#[test]
fn transition_to_unclassified_is_reported() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier =
        ViewportClassifier::new(Rc::clone(&doc), breakpoints(), Some(INTERVAL), None);
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);
    classifier.attach().unwrap();

    doc.set_hidden(marker(&doc, "bp-mobile"), true);
    doc.set_hidden(marker(&doc, "bp-desktop"), true);

    let start = Instant::now();
    classifier.handle_resize(start);
    classifier.tick(start + INTERVAL);

    assert_eq!(
        *seen.borrow(),
        vec![ViewportChange {
            last: Some("mobile".to_owned()),
            current: None,
        }]
    );
    assert_eq!(classifier.last(), None);
}

#[test]
fn without_an_interval_resizes_are_inert() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier = ViewportClassifier::new(Rc::clone(&doc), breakpoints(), None, None);
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);
    classifier.attach().unwrap();

    doc.set_hidden(marker(&doc, "bp-mobile"), true);
    let start = Instant::now();
    classifier.handle_resize(start);
    classifier.tick(start + Duration::from_secs(1));

    assert!(seen.borrow().is_empty());
    // The classification itself still reads live.
    assert_eq!(classifier.current(), Some("desktop".to_owned()));
    assert_eq!(classifier.last(), Some("mobile"));
}

#[test]
fn attach_twice_is_a_no_op() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier = ViewportClassifier::new(Rc::clone(&doc), breakpoints(), None, None);
    classifier.attach().unwrap();
    classifier.attach().unwrap();

    assert_eq!(doc.query_selector_all(".breakpoint-detection").len(), 1);
    assert_eq!(doc.query_selector_all(".bp").len(), 2);
}

#[test]
fn custom_placeholder_markup_is_used() {
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier = ViewportClassifier::new(
        Rc::clone(&doc),
        breakpoints(),
        None,
        Some("<section class=\"probes\"></section>".to_owned()),
    );
    classifier.attach().unwrap();

    assert!(doc.query_selector_all(".breakpoint-detection").is_empty());
    let holder = marker(&doc, "probes");
    assert_eq!(doc.child_nodes(holder).len(), 2);
}

#[test]
fn a_failing_subscriber_does_not_stop_delivery() {
    let _ = env_logger::builder().is_test(true).try_init();
    let doc = Rc::new(MemoryDocument::new());
    let mut classifier =
        ViewportClassifier::new(Rc::clone(&doc), breakpoints(), Some(INTERVAL), None);
    classifier.subscribe(Box::new(SubscriberFn(
        |_: &ViewportChange| -> anyhow::Result<()> { Err(anyhow!("subscriber exploded")) },
    )));
    let (seen, subscriber) = recording_subscriber();
    classifier.subscribe(subscriber);
    classifier.attach().unwrap();

    doc.set_hidden(marker(&doc, "bp-mobile"), true);
    let start = Instant::now();
    classifier.handle_resize(start);
    classifier.tick(start + INTERVAL);

    assert_eq!(seen.borrow().len(), 1);
}
