use std::collections::BTreeSet;

use chrono::TimeZone;

use super::*;
use crate::field::LocatorHop;

fn step(id: u32, target_key: &str, stage: u32) -> ActionStep {
    ActionStep {
        id,
        target_key: target_key.to_string(),
        modes: vec![
            StrategyKind::StructuralMutation,
            StrategyKind::PrivilegedInput,
            StrategyKind::OpticalLocate,
            StrategyKind::ScriptedVerify,
        ],
        value: Some(serde_json::json!("x")),
        depends_on: BTreeSet::new(),
        wait_for: None,
        stage,
    }
}

fn plan(steps: Vec<ActionStep>) -> ActionPlan {
    ActionPlan {
        plan_id: Uuid::nil(),
        page_origin: "https://jobs.example.com".to_string(),
        generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        stage_count: 1,
        controls: BTreeMap::new(),
        steps,
    }
}

#[test]
fn test_strategy_kind_serde_kebab() {
    assert_eq!(
        serde_json::to_string(&StrategyKind::StructuralMutation).unwrap(),
        "\"structural-mutation\""
    );
    let back: StrategyKind = serde_json::from_str("\"privileged-input\"").unwrap();
    assert_eq!(back, StrategyKind::PrivilegedInput);
}

#[test]
fn test_strategy_kind_display_matches_serde() {
    for kind in [
        StrategyKind::StructuralMutation,
        StrategyKind::PrivilegedInput,
        StrategyKind::OpticalLocate,
        StrategyKind::ScriptedVerify,
    ] {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind));
    }
}

#[test]
fn test_wait_condition_round_trip() {
    let cond = WaitCondition::ElementAppears {
        locator: Locator::new(vec![LocatorHop::new("input").with_attr("name", "city")]),
    };
    let json = serde_json::to_string(&cond).unwrap();
    assert!(json.contains("element-appears"));
    let back: WaitCondition = serde_json::from_str(&json).unwrap();
    assert_eq!(cond, back);
}

#[test]
fn test_step_synthetic_keys() {
    assert!(step(1, SUBMIT_KEY, 0).is_submit());
    assert!(step(1, &advance_key(2), 1).is_advance());
    assert!(step(1, &advance_key(2), 1).is_synthetic());
    assert!(!step(1, "email", 0).is_synthetic());
}

#[test]
fn test_plan_round_trip_lossless() {
    let mut submit = step(3, SUBMIT_KEY, 0);
    submit.depends_on = BTreeSet::from([1, 2]);
    submit.wait_for = Some(WaitCondition::UrlChange);
    submit.value = None;

    let p = plan(vec![step(1, "first", 0), step(2, "last", 0), submit]);
    let json = serde_json::to_string_pretty(&p).unwrap();
    let back: ActionPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(p, back);
}

#[test]
fn test_plan_lookup_helpers() {
    let p = plan(vec![step(1, "email", 0), step(2, SUBMIT_KEY, 0)]);
    assert_eq!(p.step(1).unwrap().target_key, "email");
    assert!(p.step(99).is_none());
    assert_eq!(p.submit_step().unwrap().id, 2);
    assert_eq!(p.final_stage(), 0);
    assert!(!p.is_empty());
}

#[test]
fn test_final_stage_across_wizard() {
    let p = plan(vec![step(1, "email", 0), step(2, "city", 1), step(3, "cv", 2)]);
    assert_eq!(p.final_stage(), 2);
}
