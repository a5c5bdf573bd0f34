pub mod html;
pub mod markdown;
pub mod media;
pub mod segments;

pub use html::render_message;
pub use markdown::{ escape_html, render_markdown };
pub use media::media_from_answer;
pub use segments::{ compose_segments, SegmentComposer };
