//! Code assistant operations over a scripted transport

mod support;

use support::{ScriptedTransport, StreamScript};
use wesai::aggregator::StreamOutcome;
use wesai::assistant::CodeAssistant;
use wesai::cancel::CancelHandle;
use wesai::config::AssistConfig;
use wesai::error::{AssistError, INVALID_API_KEY_MESSAGE};
use wesai::transport::{Fragment, GeneratedImage};
use wesai::turn::TurnStatus;

fn assistant(transport: &ScriptedTransport) -> CodeAssistant {
    CodeAssistant::new(transport.clone().shared(), AssistConfig::new()).unwrap()
}

#[tokio::test]
async fn review_sends_code_in_prompt() {
    let transport = ScriptedTransport::new();
    transport.push_generation(Ok("- looks fine".to_string()));
    let out = assistant(&transport).review_code("const a = 1;").await.unwrap();
    assert_eq!(out, "- looks fine");

    let request = &transport.chat_requests()[0];
    assert_eq!(request.messages.len(), 1);
    assert!(request.messages[0].text.contains("const a = 1;"));
    assert!(request.system_instruction.is_none());
}

#[tokio::test]
async fn empty_inputs_are_rejected_before_any_call() {
    let transport = ScriptedTransport::new();
    let a = assistant(&transport);
    let cancel = CancelHandle::new();

    assert_eq!(
        a.review_code(" ").await.unwrap_err(),
        AssistError::InvalidInput("Please enter some code to review.".into())
    );
    assert_eq!(
        a.generate_code("").await.unwrap_err(),
        AssistError::InvalidInput("Please enter a description to generate code based on.".into())
    );
    assert!(matches!(
        a.preview_component("\n").await,
        Err(AssistError::InvalidInput(_))
    ));
    assert!(matches!(
        a.refactor_code("", &cancel, |_| {}).await,
        Err(AssistError::InvalidInput(_))
    ));
    assert!(matches!(
        a.generate_image("", 1).await,
        Err(AssistError::InvalidInput(_))
    ));
    assert!(transport.chat_requests().is_empty());
}

#[tokio::test]
async fn transport_failures_name_the_operation() {
    let transport = ScriptedTransport::new();
    transport
        .push_generation(Err(AssistError::api_error(500, "internal")))
        .push_generation(Err(AssistError::AuthenticationError(
            INVALID_API_KEY_MESSAGE.to_string(),
        )))
        .push_generation(Err(AssistError::EmptyResponse("nothing".into())));
    let a = assistant(&transport);

    assert_eq!(
        a.generate_code("a counter").await.unwrap_err(),
        AssistError::api_error(500, "Gemini API request for code generation failed: internal")
    );
    assert_eq!(
        a.review_code("x").await.unwrap_err(),
        AssistError::AuthenticationError(INVALID_API_KEY_MESSAGE.to_string())
    );
    assert_eq!(
        a.preview_component("x").await.unwrap_err(),
        AssistError::EmptyResponse("Received an empty component preview from the API.".into())
    );
}

#[tokio::test]
async fn missing_key_is_a_configuration_error() {
    let a = assistant(&ScriptedTransport::without_key());
    assert!(matches!(
        a.generate_content("hello").await,
        Err(AssistError::ConfigurationError(_))
    ));
    assert!(matches!(
        a.refactor_code("x", &CancelHandle::new(), |_| {}).await,
        Err(AssistError::ConfigurationError(_))
    ));
    assert!(matches!(a.start_chat(), Err(AssistError::ConfigurationError(_))));
}

#[tokio::test]
async fn refactor_streams_into_seeded_turn() {
    let transport = ScriptedTransport::new();
    transport.push_stream(StreamScript::reply(&[
        "## Refactoring Summary:\nTidied.\n\n## Refactored Code:\n",
        "```tsx\nconst A = () => (<a/>);\n```",
    ]));
    let mut first_update = None;
    let result = assistant(&transport)
        .refactor_code("const A = () => <a/>", &CancelHandle::new(), |t| {
            first_update.get_or_insert_with(|| t.content().to_string());
        })
        .await
        .unwrap();

    assert_eq!(first_update.as_deref(), Some("## Refactoring Result:\n\n"));
    assert!(result.turn.content().starts_with("## Refactoring Result:\n\n## Refactoring Summary:"));
    assert_eq!(result.turn.extracted_snippet(), Some("const A = () => (<a/>);"));
    assert_eq!(result.turn.status(), TurnStatus::Finalized);
    assert!(result.report.is_completed());
}

#[tokio::test]
async fn refactor_open_failure_marks_turn() {
    let transport = ScriptedTransport::new();
    transport.push_stream(StreamScript::OpenError(AssistError::HttpError("refused".into())));
    let result = assistant(&transport)
        .refactor_code("x", &CancelHandle::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(result.turn.status(), TurnStatus::Errored);
    assert_eq!(
        result.turn.content(),
        "*(Error: Gemini API request for refactor stream failed: refused)*"
    );
    assert!(matches!(result.report.outcome, StreamOutcome::Failed { .. }));
}

#[tokio::test]
async fn refactor_cancelled_while_opening() {
    let transport = ScriptedTransport::new();
    transport.push_stream(StreamScript::NeverOpens);
    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        assistant(&transport).refactor_code("x", &cancel, |_| {}),
    )
    .await
    .expect("refactor should return once cancelled")
    .unwrap();

    assert_eq!(result.report.outcome, StreamOutcome::Cancelled);
    assert_eq!(result.turn.status(), TurnStatus::Cancelled);
    assert!(result.turn.content().starts_with("## Refactoring Result:"));
}

#[tokio::test]
async fn refactor_mid_stream_error() {
    let transport = ScriptedTransport::new();
    transport.push_stream(StreamScript::Fragments(vec![
        Ok(Fragment::text("## Refactoring Summary:")),
        Err(AssistError::TimeoutError("no data".into())),
    ]));
    let result = assistant(&transport)
        .refactor_code("x", &CancelHandle::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(result.report.error(), Some(&AssistError::TimeoutError("no data".into())));
    assert_eq!(result.turn.content(), "*(Error: no data)*");
}

#[tokio::test]
async fn image_generation_clamps_count() {
    let transport = ScriptedTransport::new();
    transport.push_images(Ok(vec![GeneratedImage {
        bytes: vec![1, 2, 3],
        mime_type: "image/png".into(),
    }]));
    let images = assistant(&transport).generate_image("a cat", 0).await.unwrap();
    assert_eq!(images.len(), 1);
    let request = &transport.image_requests()[0];
    assert_eq!(request.prompt, "a cat");
    assert_eq!(request.count, 1);
}

#[tokio::test]
async fn start_chat_uses_configured_instruction() {
    let transport = ScriptedTransport::new();
    let a = CodeAssistant::new(
        transport.clone().shared(),
        AssistConfig::new().with_system_instruction("Answer in haiku."),
    )
    .unwrap();
    let chat = a.start_chat().unwrap();
    assert_eq!(chat.system_instruction(), Some("Answer in haiku."));
    assert!(chat.turns().is_empty());
}
