//! End-to-end control-message validation through the public API: a message
//! is queued on a direct endpoint, a receive action validates it against the
//! declared expectations.

use std::sync::Arc;

use veritas::actions::{ReceiveMessageAction, TestAction};
use veritas::context::TestContext;
use veritas::endpoint::{DirectEndpoint, Endpoint};
use veritas::errors::EngineError;
use veritas::message::Message;
use veritas::validation::{
    HeaderValidationContext, MessageType, PathValidationContext, XmlValidationContext,
};

fn endpoint_with(message: Message) -> Arc<DirectEndpoint> {
    let endpoint = Arc::new(DirectEndpoint::new("inbound"));
    let mut ctx = TestContext::default();
    endpoint.create_producer().send(message, &mut ctx).unwrap();
    endpoint
}

#[test]
fn expected_headers_are_a_subset_requirement() {
    // Scenario A: extra received headers do not fail validation.
    let endpoint = endpoint_with(
        Message::text("<Ping/>")
            .with_header("operation", "foo")
            .with_header("extra", "x"),
    );
    let mut ctx = TestContext::default();
    ReceiveMessageAction::new(endpoint)
        .validate(HeaderValidationContext::new().expect("operation", "foo"))
        .execute(&mut ctx)
        .unwrap();
}

#[test]
fn ignored_path_tolerates_value_change() {
    // Scenario B.
    let endpoint = endpoint_with(Message::text("<Root><A>2</A></Root>"));
    let mut ctx = TestContext::default();
    ReceiveMessageAction::new(endpoint)
        .control_payload("<Root><A>1</A></Root>")
        .validate(XmlValidationContext::new().ignore("Root.A"))
        .execute(&mut ctx)
        .unwrap();
}

#[test]
fn value_change_without_ignore_fails_naming_the_element() {
    // Scenario C.
    let endpoint = endpoint_with(Message::text("<Root><A>2</A></Root>"));
    let mut ctx = TestContext::default();
    let err = ReceiveMessageAction::new(endpoint)
        .control_payload("<Root><A>1</A></Root>")
        .validate(XmlValidationContext::new())
        .execute(&mut ctx)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains('A'), "got: {message}");
    assert!(message.contains('1'), "got: {message}");
    assert!(message.contains('2'), "got: {message}");
}

#[test]
fn namespace_mismatch_names_prefix_and_both_uris() {
    // Scenario D.
    let endpoint = endpoint_with(Message::text("<pfx:Root xmlns:pfx=\"urn:y\"/>"));
    let mut ctx = TestContext::default();
    let err = ReceiveMessageAction::new(endpoint)
        .control_payload("<pfx:Root xmlns:pfx=\"urn:y\"/>")
        .validate(XmlValidationContext::new().expect_namespace("pfx", "urn:x"))
        .execute(&mut ctx)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("pfx"), "got: {message}");
    assert!(message.contains("urn:x"), "got: {message}");
    assert!(message.contains("urn:y"), "got: {message}");
}

#[test]
fn header_matcher_and_dynamic_content_combine() {
    let endpoint = endpoint_with(
        Message::text("<Order/>")
            .with_header("requestId", "REQ-7781")
            .with_header("operation", "createOrder"),
    );
    let mut ctx = TestContext::default();
    ctx.set_variable("op", "createOrder");
    ReceiveMessageAction::new(endpoint)
        .validate(
            HeaderValidationContext::new()
                .expect("requestId", "@matches(^REQ-\\d+$)@")
                .expect("operation", "${op}"),
        )
        .execute(&mut ctx)
        .unwrap();
}

#[test]
fn path_expressions_validate_and_extract_for_xml() {
    let endpoint = endpoint_with(Message::text(
        "<Order status=\"open\"><Id>4711</Id><Total>99.5</Total></Order>",
    ));
    let mut ctx = TestContext::default();
    ReceiveMessageAction::new(endpoint)
        .validate(
            PathValidationContext::new()
                .expect("/Order/Id", "4711")
                .expect("/Order/@status", "open")
                .expect("/Order/Total", "@greater-than(50)@"),
        )
        .extract("/Order/Id", "orderId")
        .execute(&mut ctx)
        .unwrap();
    assert_eq!(ctx.variable("orderId").unwrap(), "4711");
}

#[test]
fn path_expressions_validate_and_extract_for_json() {
    let endpoint = endpoint_with(Message::text(
        "{\"order\": {\"id\": 4711, \"status\": \"open\"}}",
    ));
    let mut ctx = TestContext::default();
    ReceiveMessageAction::new(endpoint)
        .message_type(MessageType::Json)
        .validate(
            PathValidationContext::new()
                .expect("$.order.id", "4711")
                .expect("$.order.status", "open"),
        )
        .extract("$.order.status", "status")
        .execute(&mut ctx)
        .unwrap();
    assert_eq!(ctx.variable("status").unwrap(), "open");
}

#[test]
fn missing_path_expression_node_is_unknown_element() {
    let endpoint = endpoint_with(Message::text("<Order><Id>4711</Id></Order>"));
    let mut ctx = TestContext::default();
    let err = ReceiveMessageAction::new(endpoint)
        .validate(PathValidationContext::new().expect("/Order/Missing", "x"))
        .execute(&mut ctx)
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownElement { .. }));
}

#[test]
fn xml_context_on_plain_text_message_is_a_config_error() {
    let endpoint = endpoint_with(Message::text("anything"));
    let mut ctx = TestContext::default();
    let err = ReceiveMessageAction::new(endpoint)
        .message_type(MessageType::PlainText)
        .control_payload("anything")
        .validate(XmlValidationContext::new())
        .execute(&mut ctx)
        .unwrap_err();
    assert!(matches!(err, EngineError::Config { .. }));
}

#[test]
fn unknown_matcher_name_is_a_config_error_not_a_validation_failure() {
    let endpoint = endpoint_with(Message::text("<Ping/>").with_header("operation", "x"));
    let mut ctx = TestContext::default();
    let err = ReceiveMessageAction::new(endpoint)
        .validate(HeaderValidationContext::new().expect("operation", "@no-such-matcher(1)@"))
        .execute(&mut ctx)
        .unwrap_err();
    assert!(matches!(err, EngineError::Config { .. }));
}

#[test]
fn validation_contexts_run_in_declaration_order() {
    // The header context is declared first and fails; the XML context would
    // also fail but is never reached, so the header failure is reported.
    let endpoint = endpoint_with(Message::text("<Root><A>2</A></Root>"));
    let mut ctx = TestContext::default();
    let err = ReceiveMessageAction::new(endpoint)
        .control_payload("<Root><A>1</A></Root>")
        .validate(HeaderValidationContext::new().expect("operation", "declared"))
        .validate(XmlValidationContext::new())
        .execute(&mut ctx)
        .unwrap_err();
    assert!(err.to_string().contains("operation"));
}

#[test]
fn control_payload_resolves_dynamic_content() {
    let endpoint = endpoint_with(Message::text("<Order><Id>4711</Id></Order>"));
    let mut ctx = TestContext::default();
    ctx.set_variable("expectedId", "4711");
    ReceiveMessageAction::new(endpoint)
        .control_payload("<Order><Id>${expectedId}</Id></Order>")
        .validate(XmlValidationContext::new())
        .execute(&mut ctx)
        .unwrap();
}
