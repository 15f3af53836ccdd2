use chatbridge_channels::MessageEvent;

/// Label used when an event carries no usable name at all.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Human-readable author label: nickname, then global name, then username.
/// The first non-blank candidate wins.
pub fn display_name(event: &MessageEvent) -> String {
    [
        event.author_nickname.as_deref(),
        event.author_global_name.as_deref(),
        Some(event.author_username.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|name| !name.is_empty())
    .unwrap_or(UNKNOWN_AUTHOR)
    .to_string()
}

#[cfg(test)]
mod tests {
    use {super::*, chatbridge_channels::Platform};

    fn event(username: &str) -> MessageEvent {
        MessageEvent::new(Platform::Discord, "100", "1", username, "hi")
    }

    #[test]
    fn nickname_wins() {
        let ev = event("bob").with_global_name("Bob B").with_nickname("Bobby");
        assert_eq!(display_name(&ev), "Bobby");
    }

    #[test]
    fn global_name_beats_username() {
        assert_eq!(display_name(&event("bob").with_global_name("Bob B")), "Bob B");
    }

    #[test]
    fn blank_candidates_are_skipped() {
        let ev = event("bob").with_nickname("  ").with_global_name("");
        assert_eq!(display_name(&ev), "bob");
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(display_name(&event("")), UNKNOWN_AUTHOR);
    }
}
