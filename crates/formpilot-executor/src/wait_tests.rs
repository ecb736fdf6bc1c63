use std::sync::Arc;
use std::time::Duration;

use formpilot_page::{HarnessPage, PageDocument, hop_for};
use formpilot_protocols::Locator;

use super::*;

fn config() -> ExecutorConfig {
    ExecutorConfig {
        wait_timeout_ms: 500,
        wait_poll_interval_ms: 10,
        optical_confidence_threshold: 0.8,
    }
}

struct Wizard {
    page: Arc<HarnessPage>,
    city: Locator,
    next: Locator,
    submit: Locator,
}

fn wizard() -> Wizard {
    let mut doc = PageDocument::new("https://jobs.example.com/apply");
    let body = doc.add_element(doc.root, "body");

    let city = doc.add_element(body, "input");
    doc.set_attrs(city, |a| {
        a.name = Some("city".to_string());
        a.hidden = true;
        a.data.insert("stage".to_string(), "1".to_string());
    });
    let next = doc.add_element(body, "button");
    doc.set_attrs(next, |a| {
        a.id = Some("next".to_string());
        a.data.insert("advance".to_string(), "1".to_string());
    });
    let submit = doc.add_element(body, "button");
    doc.set_attrs(submit, |a| {
        a.id = Some("send".to_string());
        a.r#type = Some("submit".to_string());
    });

    let path = |node| Locator::new(vec![hop_for(&doc, doc.root, None), hop_for(&doc, body, None), hop_for(&doc, node, None)]);
    let (city_loc, next_loc, submit_loc) = (path(city), path(next), path(submit));
    Wizard {
        page: Arc::new(HarnessPage::new(doc)),
        city: city_loc,
        next: next_loc,
        submit: submit_loc,
    }
}

#[tokio::test]
async fn test_fixed_timeout_condition() {
    let w = wizard();
    let cancel = CancellationToken::new();
    let result = await_condition(
        &WaitCondition::Timeout { ms: 5 },
        &*w.page,
        &w.page.url(),
        &config(),
        &cancel,
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_element_appears_after_advance() {
    let w = wizard();
    let cancel = CancellationToken::new();

    let page = w.page.clone();
    let next = w.next.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let path = page.resolve(&next).unwrap();
        page.click(&path).unwrap();
    });

    let result = await_condition(
        &WaitCondition::ElementAppears { locator: w.city.clone() },
        &*w.page,
        &w.page.url(),
        &config(),
        &cancel,
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_url_change_after_submit() {
    let w = wizard();
    let cancel = CancellationToken::new();

    let page = w.page.clone();
    let submit = w.submit.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let path = page.resolve(&submit).unwrap();
        page.click(&path).unwrap();
    });

    let url_before = w.page.url();
    let result =
        await_condition(&WaitCondition::UrlChange, &*w.page, &url_before, &config(), &cancel).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_wait_times_out() {
    let w = wizard();
    let cancel = CancellationToken::new();
    let mut cfg = config();
    cfg.wait_timeout_ms = 50;

    let result = await_condition(
        &WaitCondition::ElementAppears { locator: w.city.clone() },
        &*w.page,
        &w.page.url(),
        &cfg,
        &cancel,
    )
    .await;
    assert_eq!(result, Err(ErrorKind::WaitTimeout));
}

#[tokio::test]
async fn test_wait_cancelled() {
    let w = wizard();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = await_condition(
        &WaitCondition::ElementAppears { locator: w.city.clone() },
        &*w.page,
        &w.page.url(),
        &config(),
        &cancel,
    )
    .await;
    assert_eq!(result, Err(ErrorKind::Cancelled));
}

#[tokio::test]
async fn test_element_disappears() {
    let w = wizard();
    let cancel = CancellationToken::new();
    // The next button never disappears; an unknown locator counts as gone.
    let missing = Locator::new(vec![formpilot_protocols::LocatorHop::new("input").with_attr("name", "ghost")]);
    let result = await_condition(
        &WaitCondition::ElementDisappears { locator: missing },
        &*w.page,
        &w.page.url(),
        &config(),
        &cancel,
    )
    .await;
    assert!(result.is_ok());
}
