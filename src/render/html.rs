use crate::models::chat::{ Message, Role, Segment, VideoTimestamp };

use super::markdown::{ escape_html, render_markdown };

fn render_text(text: &str) -> String {
    format!("<div class=\"chat-text markdown\">{}</div>", render_markdown(text))
}

fn render_timestamps(timestamps: &[VideoTimestamp]) -> String {
    if timestamps.is_empty() {
        return String::new();
    }
    let chips: String = timestamps
        .iter()
        .map(|ts| {
            format!(
                "<button type=\"button\" class=\"timestamp-chip\" data-seconds=\"{}\">{}</button>",
                ts.seconds,
                escape_html(&ts.label)
            )
        })
        .collect();
    format!("<div class=\"video-timestamps\">{}</div>", chips)
}

pub fn render_segment(segment: &Segment) -> String {
    match segment {
        Segment::Text { text } => render_text(text),
        Segment::Image { url, alt, .. } =>
            format!(
                "<img src=\"{}\" alt=\"{}\" class=\"chat-image\">",
                escape_html(url),
                escape_html(alt.as_deref().unwrap_or("Image"))
            ),
        Segment::Video { url, timestamps } =>
            format!(
                "<div class=\"video-bubble\"><video class=\"chat-video\" controls><source src=\"{}\" type=\"video/mp4\"></video>{}</div>",
                escape_html(url),
                render_timestamps(timestamps)
            ),
    }
}

fn render_typing(message: &Message) -> String {
    let mut html = String::from(
        "<div class=\"chat-bubble typing-bubble\"><div class=\"typing-dots-container\"><span class=\"typing-dot\"></span><span class=\"typing-dot\"></span><span class=\"typing-dot\"></span></div>"
    );
    if message.show_thinking {
        html.push_str("<span class=\"typing-message\">Assistant is thinking</span>");
    }
    html.push_str("</div>");
    html
}

/// Renders one chat bubble. Segments win over `text` when present.
pub fn render_message(message: &Message) -> String {
    let side = match message.role {
        Role::User => "user",
        Role::Assistant | Role::System => "bot",
    };

    let body = if message.typing {
        render_typing(message)
    } else if message.segments.is_empty() {
        format!("<div class=\"chat-bubble\">{}</div>", render_text(&message.text))
    } else {
        let inner: String = message.segments.iter().map(render_segment).collect();
        format!("<div class=\"chat-bubble\">{}</div>", inner)
    };

    format!("<div class=\"chat-message {}\">{}</div>", side, body)
}
