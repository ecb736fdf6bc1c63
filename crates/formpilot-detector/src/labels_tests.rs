use formpilot_page::PageDocument;

use super::*;

#[test]
fn test_slug() {
    assert_eq!(slug("Email address"), "email-address");
    assert_eq!(slug("  First   Name "), "first-name");
    assert_eq!(slug("phone_number"), "phone-number");
    assert_eq!(slug("Résumé"), "résumé");
    assert_eq!(slug("---"), "");
}

#[test]
fn test_humanize() {
    assert_eq!(humanize("first_name"), "first name");
    assert_eq!(humanize("firstName"), "first name");
    assert_eq!(humanize("first-name"), "first name");
    assert_eq!(humanize("email"), "email");
    assert_eq!(humanize("linkedinURL"), "linkedin url");
}

fn input_with(doc: &mut PageDocument, parent: usize, name: Option<&str>) -> usize {
    let input = doc.add_element(parent, "input");
    doc.set_attrs(input, |a| a.name = name.map(String::from));
    input
}

#[test]
fn test_label_for_wins() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let label = doc.add_element(body, "label");
    doc.set_attrs(label, |a| a.for_target = Some("email-input".to_string()));
    doc.add_text(label, "Email address");
    let input = input_with(&mut doc, body, Some("email"));
    doc.set_attrs(input, |a| {
        a.id = Some("email-input".to_string());
        a.aria_label = Some("Your email".to_string());
        a.placeholder = Some("name@example.com".to_string());
    });

    let index = DocIndex::new(&doc);
    assert_eq!(index.associate(input, None).as_deref(), Some("Email address"));
}

#[test]
fn test_aria_label_beats_enclosing_label() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let label = doc.add_element(body, "label");
    doc.add_text(label, "Wrapped text");
    let input = input_with(&mut doc, label, Some("city"));
    doc.set_attrs(input, |a| a.aria_label = Some("City".to_string()));

    let index = DocIndex::new(&doc);
    assert_eq!(index.associate(input, None).as_deref(), Some("City"));
}

#[test]
fn test_enclosing_label_text() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let label = doc.add_element(body, "label");
    doc.add_text(label, "Years of experience");
    let input = input_with(&mut doc, label, Some("yoe"));

    let index = DocIndex::new(&doc);
    assert_eq!(
        index.associate(input, None).as_deref(),
        Some("Years of experience")
    );
}

#[test]
fn test_placeholder_fallback() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let input = input_with(&mut doc, body, Some("q"));
    doc.set_attrs(input, |a| a.placeholder = Some("Search jobs".to_string()));

    let index = DocIndex::new(&doc);
    assert_eq!(index.associate(input, None).as_deref(), Some("Search jobs"));
}

#[test]
fn test_preceding_text_fallback() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let input = input_with(&mut doc, body, Some("x1"));

    let index = DocIndex::new(&doc);
    assert_eq!(
        index.associate(input, Some("Cover letter")).as_deref(),
        Some("Cover letter")
    );
}

#[test]
fn test_name_token_last_resort() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let input = input_with(&mut doc, body, Some("desiredSalary"));

    let index = DocIndex::new(&doc);
    assert_eq!(index.associate(input, None).as_deref(), Some("desired salary"));
}

#[test]
fn test_no_label_available() {
    let mut doc = PageDocument::new("https://x.test/");
    let body = doc.add_element(doc.root, "body");
    let input = input_with(&mut doc, body, None);

    let index = DocIndex::new(&doc);
    assert_eq!(index.associate(input, None), None);
}
