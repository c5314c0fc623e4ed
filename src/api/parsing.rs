use serde_json::Value;
use std::collections::HashMap;

use crate::core::models::Message;
use crate::errors::AlertError;

/// # Errors
///
/// Returns an error if the body is not valid JSON.
pub fn parse_json_body(body: &[u8]) -> Result<Value, AlertError> {
    serde_json::from_slice(body)
        .map_err(|e| AlertError::ParseError(format!("Invalid JSON body: {}", e)))
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

/// A non-empty string at `path`. Anything else counts as absent.
pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub fn v_array<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    v_path(root, path).and_then(|v| v.as_array())
}

/// Builds a message from an `/analyze`-style body. `None` when `text` or
/// `userId` is missing or empty.
pub fn message_from_value(body: &Value) -> Option<Message> {
    let text = v_str(body, &["text"])?;
    let user_id = v_str(body, &["userId"])?;

    let mut message = Message::new(text, user_id).with_names(
        v_str(body, &["userName"]).map(ToString::to_string),
        v_str(body, &["groupName"]).map(ToString::to_string),
    );
    message.group_id = v_str(body, &["groupId"]).map(ToString::to_string);
    Some(message)
}

/// Same as [`message_from_value`], for query-string parameters.
pub fn message_from_params(params: &HashMap<String, String>) -> Option<Message> {
    let get = |key: &str| params.get(key).map(String::as_str).filter(|s| !s.is_empty());

    let mut message = Message::new(get("text")?, get("userId")?).with_names(
        get("userName").map(ToString::to_string),
        get("groupName").map(ToString::to_string),
    );
    message.group_id = get("groupId").map(ToString::to_string);
    Some(message)
}

/// Text messages carried by a LINE webhook body.
///
/// Events that are not text messages, or whose source has no user id, are
/// skipped. Room ids are treated like group ids.
pub fn text_messages_from_webhook(body: &Value) -> Vec<Message> {
    let Some(events) = v_array(body, &["events"]) else {
        return Vec::new();
    };

    events
        .iter()
        .filter(|event| v_str(event, &["type"]) == Some("message"))
        .filter(|event| v_str(event, &["message", "type"]) == Some("text"))
        .filter_map(|event| {
            let text = v_str(event, &["message", "text"])?;
            let user_id = v_str(event, &["source", "userId"])?;
            let group_id =
                v_str(event, &["source", "groupId"]).or_else(|| v_str(event, &["source", "roomId"]));

            let mut message = Message::new(text, user_id);
            message.group_id = group_id.map(ToString::to_string);
            Some(message)
        })
        .collect()
}
