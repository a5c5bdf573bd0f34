//! Minimal, injection-safe markdown subset used for chat bubbles.
//!
//! Supports `**strong**`, `*em*`, `-`/`*` bullet lists and paragraphs. Every
//! other character is escaped, so backend text can never produce markup of its
//! own.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid strong pattern"));
static EM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("valid em pattern"));
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*]\s+(.*)").expect("valid bullet pattern"));

/// Replaces `& < > " '` with character references. `&` goes first so the
/// references produced by later replacements are not escaped again.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Strong before em, otherwise `**a**` would read as two empty em runs.
pub fn format_inline(line: &str) -> String {
    let strong = STRONG.replace_all(line, "<strong>$1</strong>");
    EM.replace_all(&strong, "<em>$1</em>").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    List(Vec<String>),
}

impl Block {
    pub fn to_html(&self) -> String {
        match self {
            Block::Paragraph(content) => format!("<p>{}</p>", content),
            Block::List(items) => {
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", item))
                    .collect();
                format!("<ul>{}</ul>", items)
            }
        }
    }
}

/// Escapes `text` and groups its lines into paragraph and list blocks.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let escaped = escape_html(text);
    let mut blocks = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    fn flush(pending: &mut Vec<String>, blocks: &mut Vec<Block>) {
        if !pending.is_empty() {
            blocks.push(Block::List(std::mem::take(pending)));
        }
    }

    // `lines` splits on both `\n` and `\r\n`.
    for raw in escaped.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut pending, &mut blocks);
            continue;
        }
        if let Some(caps) = BULLET.captures(line) {
            let item = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            pending.push(format_inline(item));
            continue;
        }
        flush(&mut pending, &mut blocks);
        blocks.push(Block::Paragraph(format_inline(line)));
    }
    flush(&mut pending, &mut blocks);

    blocks
}

/// Renders `text` to presentation-safe markup; empty input gives empty output.
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    parse_blocks(text)
        .iter()
        .map(Block::to_html)
        .collect::<Vec<_>>()
        .join("\n")
}
