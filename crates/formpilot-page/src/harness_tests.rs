use formpilot_protocols::Locator;

use super::*;
use crate::locate::hop_for;

struct Fixture {
    page: HarnessPage,
    email: Locator,
    next: Locator,
    submit: Locator,
    city: Locator,
}

fn fixture() -> Fixture {
    let mut doc = PageDocument::new("https://jobs.example.com/apply");
    let body = doc.add_element(doc.root, "body");
    let form = doc.add_element(body, "form");

    let email = doc.add_element(form, "input");
    doc.set_attrs(email, |a| {
        a.name = Some("email".to_string());
        a.r#type = Some("email".to_string());
    });

    let city = doc.add_element(form, "input");
    doc.set_attrs(city, |a| {
        a.name = Some("city".to_string());
        a.hidden = true;
        a.data.insert("stage".to_string(), "1".to_string());
    });

    let next = doc.add_element(form, "button");
    doc.set_attrs(next, |a| {
        a.id = Some("next".to_string());
        a.data.insert("advance".to_string(), "1".to_string());
    });

    let submit = doc.add_element(form, "button");
    doc.set_attrs(submit, |a| {
        a.id = Some("submit".to_string());
        a.r#type = Some("submit".to_string());
    });

    let path = |node| {
        Locator::new(vec![
            hop_for(&doc, doc.root, None),
            hop_for(&doc, body, None),
            hop_for(&doc, form, None),
            hop_for(&doc, node, None),
        ])
    };
    let (email_loc, city_loc, next_loc, submit_loc) =
        (path(email), path(city), path(next), path(submit));

    Fixture {
        page: HarnessPage::new(doc),
        email: email_loc,
        next: next_loc,
        submit: submit_loc,
        city: city_loc,
    }
}

#[test]
fn test_set_value_dispatches_notifications() {
    let f = fixture();
    let path = f.page.resolve(&f.email).unwrap();
    f.page.set_value(&path, "alex@x.com").unwrap();

    assert_eq!(f.page.read_value(&path).unwrap(), "alex@x.com");
    let events = f.page.events();
    let email_events: Vec<_> = events
        .iter()
        .filter(|e| e.target == "email")
        .map(|e| e.event.as_str())
        .collect();
    assert_eq!(email_events, vec!["input", "change", "blur"]);
}

#[test]
fn test_injected_structural_failure() {
    let f = fixture();
    f.page.fail_structural_on("email");
    let path = f.page.resolve(&f.email).unwrap();
    assert!(matches!(
        f.page.set_value(&path, "x"),
        Err(PageError::MutationRejected(_))
    ));
    assert!(f.page.events().is_empty());
}

#[test]
fn test_file_input_rejects_assignment() {
    let mut doc = PageDocument::new("https://x.test/");
    let input = doc.add_element(doc.root, "input");
    doc.set_attrs(input, |a| {
        a.name = Some("resume".to_string());
        a.r#type = Some("file".to_string());
    });
    let locator = Locator::new(vec![hop_for(&doc, doc.root, None), hop_for(&doc, input, None)]);
    let page = HarnessPage::new(doc);
    let path = page.resolve(&locator).unwrap();
    assert!(matches!(
        page.set_value(&path, "/tmp/resume.pdf"),
        Err(PageError::MutationRejected(_))
    ));
}

#[test]
fn test_advance_click_reveals_stage() {
    let f = fixture();
    let city = f.page.resolve(&f.city).unwrap();
    assert!(!f.page.is_visible(&city).unwrap());

    let next = f.page.resolve(&f.next).unwrap();
    f.page.click(&next).unwrap();

    assert!(f.page.is_visible(&city).unwrap());
}

#[test]
fn test_submit_click_changes_url() {
    let f = fixture();
    let before = f.page.url();
    let submit = f.page.resolve(&f.submit).unwrap();
    f.page.click(&submit).unwrap();

    assert!(f.page.submitted());
    assert_ne!(f.page.url(), before);
    assert!(f.page.events().iter().any(|e| e.event == "submit"));
}

#[test]
fn test_checkbox_click_toggles() {
    let mut doc = PageDocument::new("https://x.test/");
    let input = doc.add_element(doc.root, "input");
    doc.set_attrs(input, |a| {
        a.name = Some("remote".to_string());
        a.r#type = Some("checkbox".to_string());
    });
    let locator = Locator::new(vec![hop_for(&doc, doc.root, None), hop_for(&doc, input, None)]);
    let page = HarnessPage::new(doc);
    let path = page.resolve(&locator).unwrap();

    page.click(&path).unwrap();
    assert_eq!(page.read_value(&path).unwrap(), "checked");
    page.click(&path).unwrap();
    assert_eq!(page.read_value(&path).unwrap(), "");
}

#[test]
fn test_scroll_into_view_moves_viewport() {
    let mut doc = PageDocument::new("https://x.test/");
    let input = doc.add_element(doc.root, "input");
    doc.set_attrs(input, |a| a.name = Some("deep".to_string()));
    doc.set_rect(input, formpilot_protocols::BoundingBox::new(8.0, 2000.0, 200.0, 24.0));
    let locator = Locator::new(vec![hop_for(&doc, doc.root, None), hop_for(&doc, input, None)]);
    let page = HarnessPage::new(doc);
    let deep = page.resolve(&locator).unwrap();

    page.scroll_into_view(&deep).unwrap();
    let after = page.viewport();
    assert!(after.scroll_y > 0.0);
    assert!(page.rect_of(&deep).unwrap().is_visible_in_viewport(&after));
}

#[test]
fn test_origin() {
    let f = fixture();
    assert_eq!(f.page.origin(), "https://jobs.example.com");
}
