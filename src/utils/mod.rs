//! Utility functions.
//!
//! Text helpers shared by the wizard, the moderation pipeline and the
//! command handlers.

/// Marker every stored channel handle starts with.
pub const CHANNEL_MARKER: char = '@';

/// Escape text for Telegram HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Clickable mention of a user by id, showing their first name.
pub fn mention_html(user_id: u64, first_name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id,
        html_escape(first_name)
    )
}

/// Ensure a channel handle carries the leading `@`.
pub fn normalize_channel_handle(handle: &str) -> String {
    let handle = handle.trim();
    if handle.starts_with(CHANNEL_MARKER) {
        handle.to_string()
    } else {
        format!("{}{}", CHANNEL_MARKER, handle)
    }
}

/// Whether an admin's answer looks like a channel handle (`@` plus a name).
pub fn is_channel_handle(text: &str) -> bool {
    text.strip_prefix(CHANNEL_MARKER)
        .is_some_and(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn test_mention_escapes_name() {
        assert_eq!(
            mention_html(42, "A<B"),
            "<a href=\"tg://user?id=42\">A&lt;B</a>"
        );
    }

    #[test]
    fn test_normalize_channel_handle() {
        assert_eq!(normalize_channel_handle("news"), "@news");
        assert_eq!(normalize_channel_handle("@news"), "@news");
        assert_eq!(normalize_channel_handle("  @news "), "@news");
    }

    #[test]
    fn test_is_channel_handle() {
        assert!(is_channel_handle("@validchannel"));
        assert!(!is_channel_handle("not-a-channel-handle"));
        assert!(!is_channel_handle("@"));
    }
}
