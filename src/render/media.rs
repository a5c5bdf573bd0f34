use crate::models::backend::AskResponse;
use crate::models::chat::{ Segment, VideoTimestamp };

pub const DEFAULT_CONTENT_PREFIX: &str = "/content/images/";
const DEFAULT_IMAGE_ALT: &str = "Document image";
const MAX_VIDEO_TIMESTAMPS: usize = 4;

/// `HH:MM:SS`, or `MM:SS` when under an hour.
pub fn format_timecode(seconds: f64) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }
    let total = seconds.floor().max(0.0) as u64;
    let hrs = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    Some(if hrs > 0 {
        format!("{:02}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    })
}

pub fn resolve_image_url(path: &str, content_prefix: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", content_prefix, path)
    }
}

pub fn image_segments(answer: &AskResponse, content_prefix: &str) -> Vec<Segment> {
    answer.relevant_images
        .iter()
        .map(|img| {
            let path = img.path.clone().unwrap_or_default();
            Segment::Image {
                url: resolve_image_url(&path, content_prefix),
                alt: Some(
                    img.alt_text
                        .clone()
                        .filter(|alt| !alt.is_empty())
                        .unwrap_or_else(|| DEFAULT_IMAGE_ALT.to_string())
                ),
                position: img.position.and_then(|p| usize::try_from(p).ok()),
                path,
            }
        })
        .collect()
}

pub fn video_segments(answer: &AskResponse) -> Vec<Segment> {
    let first_clip = answer.video_context.first();
    let url = answer.answer_video_url
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| first_clip.and_then(|c| c.video_url.clone()).filter(|u| !u.is_empty()));
    let url = match url {
        Some(url) => url,
        None => {
            return Vec::new();
        }
    };

    let start = answer.answer_start_seconds.or_else(|| first_clip.and_then(|c| c.start_seconds));
    let end = answer.answer_end_seconds.or_else(|| first_clip.and_then(|c| c.end_seconds));

    let mut timestamps = Vec::new();
    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            let step = (end - start) / 3.0;
            for seconds in [start, start + step, start + 2.0 * step, end] {
                if let Some(label) = format_timecode(seconds) {
                    timestamps.push(VideoTimestamp { seconds, label });
                }
            }
        }
        _ => {
            for clip in answer.video_context.iter().take(MAX_VIDEO_TIMESTAMPS) {
                let seconds = clip.start_seconds.unwrap_or(0.0);
                let label = clip.timestamp
                    .clone()
                    .filter(|t| !t.is_empty())
                    .or_else(|| format_timecode(seconds))
                    .unwrap_or_else(|| "Clip".to_string());
                timestamps.push(VideoTimestamp { seconds, label });
            }
        }
    }

    vec![Segment::Video { url, timestamps }]
}

/// Media handed to the compositor for one answer: images first, then video.
pub fn media_from_answer(answer: &AskResponse, content_prefix: &str) -> Vec<Segment> {
    let mut media = image_segments(answer, content_prefix);
    media.extend(video_segments(answer));
    media
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AskResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn timecodes() {
        assert_eq!(format_timecode(0.0).as_deref(), Some("00:00"));
        assert_eq!(format_timecode(65.9).as_deref(), Some("01:05"));
        assert_eq!(format_timecode(3661.0).as_deref(), Some("01:01:01"));
        assert_eq!(format_timecode(-4.0).as_deref(), Some("00:00"));
        assert_eq!(format_timecode(f64::NAN), None);
    }

    #[test]
    fn image_urls_resolve_against_prefix() {
        let answer = response(
            json!({
                "success": true,
                "relevant_images": [
                    { "path": "manual/p1.png", "position": 10 },
                    { "path": "https://cdn.example.com/x.png", "alt_text": "Diagram" },
                    { "position": -1 }
                ]
            })
        );
        assert_eq!(image_segments(&answer, DEFAULT_CONTENT_PREFIX), vec![
            Segment::Image {
                url: "/content/images/manual/p1.png".into(),
                alt: Some("Document image".into()),
                position: Some(10),
                path: "manual/p1.png".into(),
            },
            Segment::Image {
                url: "https://cdn.example.com/x.png".into(),
                alt: Some("Diagram".into()),
                position: None,
                path: "https://cdn.example.com/x.png".into(),
            },
            Segment::Image {
                url: "/content/images/".into(),
                alt: Some("Document image".into()),
                position: None,
                path: String::new(),
            }
        ]);
    }

    #[test]
    fn answer_span_yields_four_evenly_spaced_timestamps() {
        let answer = response(
            json!({
                "success": true,
                "answer_video_url": "https://cdn.example.com/v.mp4",
                "answer_start_seconds": 30,
                "answer_end_seconds": 90
            })
        );
        let labels: Vec<(f64, String)> = match video_segments(&answer).pop() {
            Some(Segment::Video { timestamps, .. }) =>
                timestamps
                    .into_iter()
                    .map(|t| (t.seconds, t.label))
                    .collect(),
            other => panic!("expected video, got {:?}", other),
        };
        assert_eq!(labels, vec![
            (30.0, "00:30".to_string()),
            (50.0, "00:50".to_string()),
            (70.0, "01:10".to_string()),
            (90.0, "01:30".to_string())
        ]);
    }

    #[test]
    fn clips_are_used_when_span_is_missing() {
        let answer = response(
            json!({
                "success": true,
                "video_context": [
                    { "video_url": "v.mp4", "start_seconds": 12, "timestamp": "Intro" },
                    { "video_url": "v.mp4", "start_seconds": 75 },
                    { "video_url": "v.mp4" },
                    { "video_url": "v.mp4", "start_seconds": 5 },
                    { "video_url": "v.mp4", "start_seconds": 6 }
                ]
            })
        );
        assert_eq!(video_segments(&answer), vec![Segment::Video {
            url: "v.mp4".into(),
            timestamps: vec![
                VideoTimestamp { seconds: 12.0, label: "Intro".into() },
                VideoTimestamp { seconds: 75.0, label: "01:15".into() },
                VideoTimestamp { seconds: 0.0, label: "00:00".into() },
                VideoTimestamp { seconds: 5.0, label: "00:05".into() }
            ],
        }]);
    }

    #[test]
    fn span_falls_back_to_first_clip() {
        let answer = response(
            json!({
                "success": true,
                "video_context": [{ "video_url": "v.mp4", "start_seconds": 0, "end_seconds": 3 }]
            })
        );
        match video_segments(&answer).as_slice() {
            [Segment::Video { timestamps, .. }] => {
                let seconds: Vec<f64> = timestamps
                    .iter()
                    .map(|t| t.seconds)
                    .collect();
                assert_eq!(seconds, vec![0.0, 1.0, 2.0, 3.0]);
            }
            other => panic!("expected one video, got {:?}", other),
        }
    }

    #[test]
    fn no_video_url_means_no_video() {
        let answer = response(json!({ "success": true, "answer_start_seconds": 1, "answer_end_seconds": 2 }));
        assert!(video_segments(&answer).is_empty());
    }

    #[test]
    fn media_lists_images_before_video() {
        let answer = response(
            json!({
                "success": true,
                "answer_video_url": "v.mp4",
                "relevant_images": [{ "path": "a.png" }]
            })
        );
        let media = media_from_answer(&answer, "/img/");
        assert_eq!(media.len(), 2);
        assert!(media[0].is_image());
        assert!(matches!(media[1], Segment::Video { .. }));
    }
}
