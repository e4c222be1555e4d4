//! Telegram MarkdownV2 helpers.

/// Characters that MarkdownV2 treats as markup.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Escapes every MarkdownV2 markup character so `text` renders literally.
///
/// ```
/// use work_schedule_bot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("8h 40m (-10m)"), "8h 40m \\(\\-10m\\)");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Bold span with escaped content.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown(text))
}
