use super::*;
use serde_json::json;

#[test]
fn test_parse_refresh() {
    let msg = ExtensionMessage::from_value(&json!({"type": "refresh"}));
    assert_eq!(msg, Some(ExtensionMessage::Refresh));
}

#[test]
fn test_parse_camel_case_kinds() {
    assert_eq!(
        ExtensionMessage::from_value(&json!({"type": "getStatus"})),
        Some(ExtensionMessage::GetStatus)
    );
    assert_eq!(
        ExtensionMessage::from_value(&json!({"type": "toggleDebug"})),
        Some(ExtensionMessage::ToggleDebug)
    );
}

#[test]
fn test_parse_unknown_kind() {
    assert!(ExtensionMessage::from_value(&json!({"type": "explode"})).is_none());
    assert!(ExtensionMessage::from_value(&json!({"kind": "refresh"})).is_none());
}

#[test]
fn test_kind_matches_wire_name() {
    for msg in [
        ExtensionMessage::Refresh,
        ExtensionMessage::GetStatus,
        ExtensionMessage::Enable,
        ExtensionMessage::Disable,
        ExtensionMessage::ToggleDebug,
    ] {
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(value["type"], msg.kind());
    }
}

#[test]
fn test_unknown_response() {
    let response = MessageResponse::unknown();
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Unknown message type"));

    let value = serde_json::to_value(&response).unwrap();
    assert!(value.get("status").is_none());
}

#[test]
fn test_status_serializes_camel_case() {
    let status = TransformationStatus {
        enabled: true,
        player_cards_extracted: true,
        css_injected: false,
        lag_overlay: false,
        state: "COMPLETED".to_string(),
    };
    let value = serde_json::to_value(MessageResponse::with_status(status)).unwrap();
    assert_eq!(value["status"]["playerCardsExtracted"], true);
    assert_eq!(value["status"]["cssInjected"], false);
    assert_eq!(value["success"], true);
}
