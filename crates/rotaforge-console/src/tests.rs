use super::*;

fn visitor(event: &str) -> EventVisitor {
    EventVisitor {
        event: Some(event.to_string()),
        ..EventVisitor::default()
    }
}

#[test]
fn test_unknown_events_are_silent() {
    assert!(format_event(&visitor("progress")).is_empty());
    assert!(format_event(&EventVisitor::default()).is_empty());
}

#[test]
fn test_solve_end_shows_state_and_counts() {
    let mut v = visitor("solve_end");
    v.state = Some("INFEASIBLE".into());
    v.assigned = Some(1234);
    v.duration_ms = Some(2500);

    let out = format_event(&v);
    assert!(out.contains("INFEASIBLE"));
    assert!(out.contains("1,234"));
    assert!(out.contains("2.50s"));
}

#[test]
fn test_commit_and_mismatch_quote_the_phrase() {
    let mut v = visitor("commit");
    v.text = Some("ana is off".into());
    v.identifiers = Some(2);
    assert!(format_event(&v).contains("\"ana is off\""));

    v.event = Some("commit_mismatch".into());
    v.error = Some("unknown symbol 'medics'".into());
    assert!(format_event(&v).contains("unknown symbol 'medics'"));
}

#[test]
fn test_relaxation_end_formats_slack() {
    let mut v = visitor("relaxation_end");
    v.status = Some("OPTIMAL".into());
    v.total_slack = Some(8.0);
    v.phrases = Some(1);

    let out = format_event(&v);
    assert!(out.contains("8.000"));
    assert!(out.contains("OPTIMAL"));
}

#[test]
fn test_format_duration_ms() {
    assert_eq!(format_duration_ms(450), "450ms");
    assert_eq!(format_duration_ms(1500), "1.50s");
    assert_eq!(format_duration_ms(125_000), "2m 5s");
}

#[test]
fn test_init_is_idempotent() {
    init();
    init();
    assert!(INIT.get().is_some());
}
