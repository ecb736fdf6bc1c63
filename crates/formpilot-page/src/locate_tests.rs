use formpilot_protocols::{HopBoundary, Locator, LocatorHop};

use super::*;
use crate::dom::PageDocument;

fn doc_with_email() -> (PageDocument, Locator) {
    let mut doc = PageDocument::new("https://jobs.example.com/apply");
    let body = doc.add_element(doc.root, "body");
    let form = doc.add_element(body, "form");
    doc.set_attrs(form, |a| a.id = Some("apply".to_string()));
    let input = doc.add_element(form, "input");
    doc.set_attrs(input, |a| {
        a.name = Some("email".to_string());
        a.r#type = Some("email".to_string());
    });
    let locator = Locator::new(vec![
        hop_for(&doc, doc.root, None),
        hop_for(&doc, body, None),
        hop_for(&doc, form, None),
        hop_for(&doc, input, None),
    ]);
    (doc, locator)
}

#[test]
fn test_hop_for_records_identifying_attrs() {
    let (doc, locator) = doc_with_email();
    let _ = doc;
    let last = locator.hops.last().unwrap();
    assert_eq!(last.tag, "input");
    assert_eq!(last.attributes.get("name").map(String::as_str), Some("email"));
    assert_eq!(last.attributes.get("type").map(String::as_str), Some("email"));
    assert!(!last.attributes.contains_key("placeholder"));
}

#[test]
fn test_resolve_exactly_one() {
    let (doc, locator) = doc_with_email();
    let path = resolve(&doc, &locator).unwrap();
    assert!(path.frames.is_empty());
    assert_eq!(doc.node(path.node).attributes.get("name"), Some("email"));
}

#[test]
fn test_resolve_not_found() {
    let (doc, _) = doc_with_email();
    let locator = Locator::new(vec![
        LocatorHop::new("html"),
        LocatorHop::new("body"),
        LocatorHop::new("input").with_attr("name", "missing"),
    ]);
    assert!(matches!(resolve(&doc, &locator), Err(PageError::NotFound(_))));
}

#[test]
fn test_resolve_ambiguous_fails_closed() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    doc.add_element(body, "input");
    doc.add_element(body, "input");
    let locator = Locator::new(vec![
        LocatorHop::new("html"),
        LocatorHop::new("body"),
        LocatorHop::new("input"),
    ]);
    match resolve(&doc, &locator) {
        Err(PageError::Ambiguous { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected ambiguous, got {:?}", other),
    }
}

#[test]
fn test_resolve_empty_locator() {
    let (doc, _) = doc_with_email();
    assert!(matches!(
        resolve(&doc, &Locator::default()),
        Err(PageError::NotFound(_))
    ));
}

#[test]
fn test_resolve_through_shadow_root() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let widget = doc.add_element(body, "custom-widget");
    doc.set_attrs(widget, |a| a.id = Some("host".to_string()));
    let shadow = doc.attach_shadow(widget);
    let inner = doc.add_element(shadow, "input");
    doc.set_attrs(inner, |a| a.name = Some("city".to_string()));

    let locator = Locator::new(vec![
        hop_for(&doc, doc.root, None),
        hop_for(&doc, body, None),
        hop_for(&doc, widget, None),
        hop_for(&doc, inner, Some(HopBoundary::ShadowRoot)),
    ]);
    let path = resolve(&doc, &locator).unwrap();
    assert_eq!(path.node, inner);
}

#[test]
fn test_resolve_through_frame() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let iframe = doc.add_element(body, "iframe");

    let mut inner_doc = PageDocument::new("https://x.test/frame");
    let frame_body = inner_doc.add_element(inner_doc.root, "body");
    let input = inner_doc.add_element(frame_body, "input");
    inner_doc.set_attrs(input, |a| a.name = Some("phone".to_string()));

    let locator = Locator::new(vec![
        hop_for(&doc, doc.root, None),
        hop_for(&doc, body, None),
        hop_for(&doc, iframe, None),
        hop_for(&inner_doc, inner_doc.root, Some(HopBoundary::Frame)),
        hop_for(&inner_doc, frame_body, None),
        hop_for(&inner_doc, input, None),
    ]);
    doc.attach_frame(iframe, Some(inner_doc));

    let path = resolve(&doc, &locator).unwrap();
    assert_eq!(path.frames, vec![0]);
    let frame_doc = doc.document_at(&path.frames).unwrap();
    assert_eq!(frame_doc.node(path.node).attributes.get("name"), Some("phone"));
}

#[test]
fn test_resolve_cross_origin_frame_not_found() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let iframe = doc.add_element(body, "iframe");
    doc.attach_frame(iframe, None);

    let locator = Locator::new(vec![
        hop_for(&doc, doc.root, None),
        hop_for(&doc, body, None),
        hop_for(&doc, iframe, None),
        LocatorHop::new("html").with_boundary(HopBoundary::Frame),
        LocatorHop::new("input"),
    ]);
    assert!(matches!(resolve(&doc, &locator), Err(PageError::NotFound(_))));
}
