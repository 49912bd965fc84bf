//! Text rendering helpers for tool output.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Render a Unix timestamp in seconds. Missing or zero renders as `Unknown`.
///
/// Callers convert first: documents and comments carry microseconds, users
/// carry seconds, and both expose `as_secs()`.
pub fn format_timestamp(secs: Option<i64>) -> String {
    match secs {
        Some(secs) if secs != 0 => secs.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Cut `text` to at most `max_chars` characters, ending with `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }

    let mut truncated: String = text.chars().take(max_chars - 3).collect();
    truncated.push_str("...");
    truncated
}

struct Rules {
    dropped: Regex,
    heading: Regex,
    line_break: Regex,
    block: Regex,
    strong: Regex,
    emphasis: Regex,
    code: Regex,
    link: Regex,
    list_item: Regex,
    list: Regex,
    tag: Regex,
    entity: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        dropped: compile(r"(?is)<script\b.*?</script>|<style\b.*?</style>"),
        heading: compile(r"(?is)<h([1-6])(?:\s[^>]*)?>(.*?)</h[1-6]>"),
        line_break: compile(r"(?i)<br\s*/?>"),
        block: compile(r"(?i)</?(?:p|div)(?:\s[^>]*)?>"),
        strong: compile(r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>"),
        emphasis: compile(r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>"),
        code: compile(r"(?is)<code(?:\s[^>]*)?>(.*?)</code>"),
        link: compile(r#"(?is)<a\s[^>]*?href="([^"]*)"[^>]*>(.*?)</a>"#),
        list_item: compile(r"(?i)<li(?:\s[^>]*)?>"),
        list: compile(r"(?i)</?(?:ul|ol)(?:\s[^>]*)?>"),
        tag: compile(r"<[^>]+>"),
        entity: compile(r"&(?:#[xX]([0-9a-fA-F]{1,6})|#([0-9]{1,7})|(nbsp|lt|gt|quot|apos|amp));"),
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid markdown conversion regex")
}

/// Convert document HTML into readable Markdown.
///
/// Handles headings, paragraphs, line breaks, bold, italic, inline code,
/// links and lists; every other tag is dropped, and common named entities and
/// numeric character references are decoded. Runs of blank lines collapse to
/// one.
pub fn html_to_markdown(html: &str) -> String {
    let rules = rules();

    let text = rules.dropped.replace_all(html, "");
    let text = rules.heading.replace_all(&text, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        format!("\n\n{} {}\n\n", "#".repeat(level), caps[2].trim())
    });
    let text = rules.line_break.replace_all(&text, "\n");
    let text = rules.block.replace_all(&text, "\n\n");
    let text = rules.strong.replace_all(&text, "**$1**");
    let text = rules.emphasis.replace_all(&text, "*$1*");
    let text = rules.code.replace_all(&text, "`$1`");
    let text = rules.link.replace_all(&text, "[$2]($1)");
    let text = rules.list_item.replace_all(&text, "\n- ");
    let text = rules.list.replace_all(&text, "\n\n");
    let text = rules.tag.replace_all(&text, "");

    let text = decode_entities(&rules.entity, &text);
    collapse_blank_lines(&text)
}

/// Decode named and numeric character references in one pass, so decoded
/// text is never decoded again. References to invalid code points are kept.
fn decode_entities(entity: &Regex, text: &str) -> String {
    entity
        .replace_all(text, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse().ok(),
                (None, None) => {
                    return match &caps[3] {
                        "nbsp" => " ",
                        "lt" => "<",
                        "gt" => ">",
                        "quot" => "\"",
                        "apos" => "'",
                        _ => "&",
                    }
                    .to_string()
                }
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if matches!(lines.last(), Some(last) if !last.is_empty()) {
                lines.push(line);
            }
        } else {
            lines.push(line);
        }
    }

    while matches!(lines.last(), Some(last) if last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
