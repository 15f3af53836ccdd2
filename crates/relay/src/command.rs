/// Whether `text` is a bind command for `keyword`.
///
/// Plain case-insensitive prefix match after leading whitespace; no
/// argument parsing and no escaping. `"/ack@relay_bot"` matches `/ack`.
pub fn is_bind_command(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return false;
    }
    text.trim_start()
        .to_lowercase()
        .starts_with(&keyword.to_lowercase())
}
