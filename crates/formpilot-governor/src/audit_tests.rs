use formpilot_protocols::{ErrorKind, ExecutionResult, GateDecision, GateKind};

use super::*;

#[test]
fn test_memory_sink_appends_in_order() {
    let sink = MemoryAuditSink::new();
    assert!(sink.is_empty());

    sink.append(AuditRecord::gate(GateKind::Domain, GateDecision::Allow, "whitelisted"));
    sink.append(AuditRecord::Step(ExecutionResult::skipped(
        4,
        ErrorKind::QuotaExceeded,
        "daily quota reached",
    )));

    let records = sink.snapshot();
    assert_eq!(records.len(), 2);
    assert!(matches!(records[0], AuditRecord::Gate { gate: GateKind::Domain, .. }));
    assert!(matches!(records[1], AuditRecord::Step(_)));
}

#[test]
fn test_jsonl_sink_writes_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let sink = JsonlAuditSink::create(&path).unwrap();

    sink.append(AuditRecord::gate(GateKind::Quota, GateDecision::Deny, "quota reached"));
    sink.append(AuditRecord::gate(GateKind::Confirmation, GateDecision::Allow, "approved"));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let parsed: AuditRecord = serde_json::from_str(line).unwrap();
        assert!(matches!(parsed, AuditRecord::Gate { .. }));
    }
}
