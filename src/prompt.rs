use crate::core::models::Message;

/// Max characters of user text embedded in a classification prompt
pub const MAX_PROMPT_TEXT_LEN: usize = 2000;

/// Max characters of an identifier or display name embedded in a prompt
pub const MAX_PROMPT_FIELD_LEN: usize = 100;

/// Default rubric telling the model what counts as urgent.
pub const DEFAULT_RUBRIC: &str = "IMPORTANT = ไฟไหม้ อุบัติเหตุ ระบบล่ม คดี\nNORMAL = เรื่องทั่วไป";

/// Remove control characters and hard-truncate to `max_len` characters.
/// Newlines are flattened to spaces so user text cannot fake prompt structure.
pub fn sanitize_prompt_field(raw: &str, max_len: usize) -> String {
    raw.chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect()
}

/// Builds the classification prompt for a message.
///
/// The model is asked to answer with a bare JSON object whose `level` is one
/// of `IMPORTANT` or `NORMAL`; `categories` and `keywords` are optional.
pub fn build_urgency_prompt(message: &Message, rubric: &str) -> String {
    let text = sanitize_prompt_field(&message.text, MAX_PROMPT_TEXT_LEN);
    let user_id = sanitize_prompt_field(&message.user_id, MAX_PROMPT_FIELD_LEN);
    let group_id = message
        .group_id
        .as_deref()
        .map(|g| sanitize_prompt_field(g, MAX_PROMPT_FIELD_LEN))
        .unwrap_or_default();

    // serde_json escapes quotes and backslashes in the embedded values
    let example = serde_json::json!({
        "level": "IMPORTANT หรือ NORMAL",
        "text": text,
        "userId": user_id,
        "groupId": group_id,
        "keywords": ["คำที่ทำให้สำคัญ"],
    });

    format!(
        "ตอบกลับเป็น JSON เท่านั้น ห้ามมีข้อความอื่น:\n{example}\n\n{rubric}\n",
        example = serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string()),
        rubric = rubric.trim()
    )
}
