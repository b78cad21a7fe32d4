//! Gemini streaming fixtures driven through the aggregator

use wesai::aggregator::{SAFETY_WARNING, StreamAggregator, StreamOutcome};
use wesai::cancel::CancelHandle;
use wesai::terminal::{Terminal, TerminalKind, TerminalPolicy};
use wesai::turn::{ConversationTurn, TurnStatus, TurnView};

use crate::support;

async fn aggregate_fixture(
    name: &str,
    policy: &TerminalPolicy,
) -> (ConversationTurn, wesai::aggregator::StreamReport, Vec<String>) {
    let fragments = support::fixture_fragments(name, policy).await;
    let mut turn = ConversationTurn::model();
    let mut seen = Vec::new();
    let report = StreamAggregator::default()
        .aggregate(
            &mut turn,
            support::fixture_stream(fragments),
            &CancelHandle::new(),
            |t| seen.push(t.content().to_string()),
        )
        .await;
    (turn, report, seen)
}

#[tokio::test]
async fn gemini_simple_text_then_finish_fixture() {
    let (turn, report, seen) =
        aggregate_fixture("simple_text_then_finish.sse", &TerminalPolicy::default()).await;
    assert_eq!(turn.content(), "Hello world");
    assert_eq!(turn.status(), TurnStatus::Finalized);
    assert_eq!(
        report.outcome,
        StreamOutcome::Completed {
            terminal: Some(Terminal::stop())
        }
    );
    assert_eq!(seen.first().map(String::as_str), Some("Hello"));
}

#[tokio::test]
async fn gemini_component_across_chunks_fixture() {
    let (mut turn, report, _) =
        aggregate_fixture("component_across_chunks.sse", &TerminalPolicy::default()).await;
    assert!(report.is_completed());
    assert_eq!(
        turn.extracted_snippet(),
        Some("function X(){ return (<div/>); }")
    );
    assert!(turn.toggle_preview());
    assert_eq!(
        turn.view(),
        TurnView::Preview("function X(){ return (<div/>); }")
    );
}

#[tokio::test]
async fn gemini_safety_after_partial_fixture() {
    let (turn, report, _) =
        aggregate_fixture("safety_after_partial.sse", &TerminalPolicy::default()).await;
    assert!(turn.content().starts_with("par"));
    assert!(turn.content().ends_with("*(Stream finished: SAFETY)*"));
    assert!(turn.blocked());
    assert_eq!(report.warning(), Some(SAFETY_WARNING));
}

#[tokio::test]
async fn gemini_max_tokens_finish_fixture() {
    let (turn, report, _) =
        aggregate_fixture("max_tokens_finish.sse", &TerminalPolicy::default()).await;
    assert_eq!(turn.content(), "A long answer that got cut");
    assert_eq!(
        report.outcome,
        StreamOutcome::Completed {
            terminal: Some(Terminal::length_limit())
        }
    );
}

#[tokio::test]
async fn gemini_unknown_reason_is_other_stop() {
    let (turn, report, _) =
        aggregate_fixture("recitation_stop.sse", &TerminalPolicy::default()).await;
    assert_eq!(turn.content(), "Quoted\n\n*(Stream finished: RECITATION)*");
    assert!(!turn.blocked());
    assert!(matches!(report.outcome, StreamOutcome::Stopped { .. }));
}

#[tokio::test]
async fn gemini_policy_can_reclassify_reasons() {
    let policy = TerminalPolicy::default().with_reason("RECITATION", TerminalKind::Safety);
    let (turn, report, _) = aggregate_fixture("recitation_stop.sse", &policy).await;
    assert!(turn.blocked());
    assert!(report.is_blocked());
}

#[tokio::test]
async fn gemini_prompt_block_without_candidates() {
    let (turn, report, _) =
        aggregate_fixture("prompt_blocked.sse", &TerminalPolicy::default()).await;
    assert_eq!(turn.content(), "\n\n*(Stream finished: SAFETY)*");
    assert!(report.is_blocked());
}

#[tokio::test]
async fn gemini_thought_parts_are_not_content() {
    let (turn, _, _) =
        aggregate_fixture("thought_then_text_stop.sse", &TerminalPolicy::default()).await;
    assert_eq!(turn.content(), "Final answer.");
}
