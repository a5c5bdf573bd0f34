use std::collections::HashSet;

use crate::models::chat::Segment;

/// Interleaves anchored images into a partially revealed answer.
///
/// Built once per answer: the media list is partitioned and the images sorted
/// up front, so each streaming tick only pays for `compose`.
#[derive(Debug, Clone)]
pub struct SegmentComposer {
    text: String,
    /// Byte offset of every char in `text`, followed by `text.len()`.
    offsets: Vec<usize>,
    /// `(input index, image)`, sorted by anchor with unanchored last.
    images: Vec<(usize, Segment)>,
    others: Vec<Segment>,
}

fn image_position(segment: &Segment) -> Option<usize> {
    match segment {
        Segment::Image { position, .. } => *position,
        _ => None,
    }
}

fn placement_key(segment: &Segment) -> &str {
    match segment {
        Segment::Image { path, url, .. } if path.is_empty() => url.as_str(),
        Segment::Image { path, .. } => path.as_str(),
        Segment::Video { url, .. } => url.as_str(),
        Segment::Text { text } => text.as_str(),
    }
}

impl SegmentComposer {
    pub fn new(full_text: impl Into<String>, media: Vec<Segment>) -> Self {
        let text = full_text.into();
        let mut offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .collect();
        offsets.push(text.len());

        let (images, others): (Vec<Segment>, Vec<Segment>) = media
            .into_iter()
            .partition(Segment::is_image);
        let mut images: Vec<(usize, Segment)> = images.into_iter().enumerate().collect();
        // Stable: images sharing an anchor, and unanchored ones, keep input order.
        images.sort_by_key(|(_, img)| {
            match image_position(img) {
                Some(pos) => (false, pos),
                None => (true, 0),
            }
        });

        Self { text, offsets, images, others }
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// Length of the answer in chars, the unit of the reveal cursor.
    pub fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    /// First `reveal` chars of the answer.
    pub fn prefix(&self, reveal: usize) -> &str {
        self.slice(0, reveal.min(self.char_len()))
    }

    /// Segments visible once `reveal` chars of the answer are shown.
    pub fn compose(&self, reveal: usize) -> Vec<Segment> {
        let reveal = reveal.min(self.char_len());
        let mut segments = Vec::with_capacity(self.images.len() + self.others.len() + 2);
        let mut placed: HashSet<&str> = HashSet::new();
        let mut text_start = 0;

        for (_, image) in &self.images {
            let pos = match image_position(image) {
                Some(pos) if pos < reveal => pos,
                _ => continue,
            };
            if pos > text_start {
                self.push_text(&mut segments, text_start, pos);
            }
            segments.push(image.clone());
            placed.insert(placement_key(image));
            text_start = pos;
        }

        if text_start < reveal {
            self.push_text(&mut segments, text_start, reveal);
        }

        let mut unplaced: Vec<&(usize, Segment)> = self.images
            .iter()
            .filter(|(_, image)| !placed.contains(placement_key(image)))
            .collect();
        unplaced.sort_by_key(|(index, _)| *index);
        segments.extend(unplaced.into_iter().map(|(_, image)| image.clone()));

        segments.extend(self.others.iter().cloned());
        segments
    }

    fn push_text(&self, segments: &mut Vec<Segment>, start: usize, end: usize) {
        let chunk = self.slice(start, end);
        if !chunk.trim().is_empty() {
            segments.push(Segment::text(chunk));
        }
    }
}

/// One-shot form of [`SegmentComposer::compose`].
pub fn compose_segments(full_text: &str, reveal: usize, media: &[Segment]) -> Vec<Segment> {
    SegmentComposer::new(full_text, media.to_vec()).compose(reveal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::VideoTimestamp;
    use pretty_assertions::assert_eq;

    fn image(path: &str, position: Option<usize>) -> Segment {
        Segment::Image {
            url: format!("/content/images/{}", path),
            alt: None,
            position,
            path: path.to_string(),
        }
    }

    fn video() -> Segment {
        Segment::Video {
            url: "https://cdn.example.com/intro.mp4".into(),
            timestamps: vec![VideoTimestamp { seconds: 0.0, label: "00:00".into() }],
        }
    }

    fn joined_text(segments: &[Segment]) -> String {
        segments
            .iter()
            .filter_map(Segment::as_text)
            .collect()
    }

    #[test]
    fn image_is_inserted_at_its_anchor() {
        let text = "First part. Second part.";
        let media = vec![image("a.png", Some(11))];
        assert_eq!(
            compose_segments(text, text.chars().count(), &media),
            vec![Segment::text("First part."), image("a.png", Some(11)), Segment::text(" Second part.")]
        );
    }

    #[test]
    fn anchor_at_reveal_length_is_not_placed() {
        let media = vec![image("a.png", Some(5))];
        let segments = compose_segments("Hello world", 5, &media);
        assert_eq!(segments, vec![Segment::text("Hello"), image("a.png", Some(5))]);

        // Placed one char later: the image moves in front of the new text.
        let segments = compose_segments("Hello world", 6, &media);
        assert_eq!(segments, vec![Segment::text("Hello"), image("a.png", Some(5))]);
        let segments = compose_segments("Hello world", 7, &media);
        assert_eq!(segments, vec![Segment::text("Hello"), image("a.png", Some(5)), Segment::text(" w")]);
    }

    #[test]
    fn single_char_text_places_anchor_zero() {
        let media = vec![image("a.png", Some(0))];
        assert_eq!(compose_segments("x", 0, &media), vec![image("a.png", Some(0))]);
        assert_eq!(compose_segments("x", 1, &media), vec![image("a.png", Some(0)), Segment::text("x")]);
    }

    #[test]
    fn zero_reveal_yields_only_media() {
        let media = vec![video(), image("b.png", Some(3)), image("a.png", None)];
        assert_eq!(compose_segments("Some answer", 0, &media), vec![
            image("b.png", Some(3)),
            image("a.png", None),
            video()
        ]);
    }

    #[test]
    fn unanchored_images_follow_text_and_precede_video() {
        let media = vec![image("free.png", None), video(), image("anchored.png", Some(2))];
        let segments = compose_segments("abcdef", 6, &media);
        assert_eq!(segments, vec![
            Segment::text("ab"),
            image("anchored.png", Some(2)),
            Segment::text("cdef"),
            image("free.png", None),
            video()
        ]);
    }

    #[test]
    fn unplaced_images_keep_input_order() {
        let media = vec![image("late.png", Some(9)), image("free.png", None), image("later.png", Some(8))];
        let segments = compose_segments("abcdefghij", 3, &media);
        assert_eq!(segments, vec![
            Segment::text("abc"),
            image("late.png", Some(9)),
            image("free.png", None),
            image("later.png", Some(8))
        ]);
    }

    #[test]
    fn images_sharing_an_anchor_stay_adjacent() {
        let media = vec![image("b.png", Some(2)), image("a.png", Some(2))];
        assert_eq!(compose_segments("abcd", 4, &media), vec![
            Segment::text("ab"),
            image("b.png", Some(2)),
            image("a.png", Some(2)),
            Segment::text("cd")
        ]);
    }

    #[test]
    fn whitespace_only_slices_are_dropped() {
        let media = vec![image("a.png", Some(3)), image("b.png", Some(5))];
        let segments = compose_segments("abc  def", 8, &media);
        assert_eq!(segments, vec![
            Segment::text("abc"),
            image("a.png", Some(3)),
            image("b.png", Some(5)),
            Segment::text("def")
        ]);
    }

    #[test]
    fn duplicate_key_is_emitted_once_in_the_tail() {
        let media = vec![image("a.png", Some(1)), image("a.png", None)];
        assert_eq!(compose_segments("abc", 3, &media), vec![
            Segment::text("a"),
            image("a.png", Some(1)),
            Segment::text("bc")
        ]);
    }

    #[test]
    fn text_reconstructs_the_revealed_prefix() {
        let text = "Open **Settings**, then\n- pick *Account*\n- press Save.";
        let media = vec![image("a.png", Some(7)), image("b.png", Some(24)), image("c.png", None), video()];
        let len = text.chars().count();
        for reveal in 0..=len {
            let prefix: String = text.chars().take(reveal).collect();
            assert_eq!(joined_text(&compose_segments(text, reveal, &media)), prefix, "reveal {}", reveal);
        }
    }

    #[test]
    fn reveal_counts_chars_not_bytes() {
        let composer = SegmentComposer::new("héllo wörld", vec![image("a.png", Some(6))]);
        assert_eq!(composer.char_len(), 11);
        assert_eq!(composer.prefix(2), "hé");
        assert_eq!(composer.compose(8), vec![Segment::text("héllo "), image("a.png", Some(6)), Segment::text("wö")]);
    }

    #[test]
    fn placed_images_never_disappear_as_reveal_grows() {
        let text = "one two three four five";
        let media = vec![image("a.png", Some(4)), image("b.png", Some(14)), image("c.png", None)];
        let composer = SegmentComposer::new(text, media);
        let mut previous_text = 0;
        for reveal in 0..=composer.char_len() {
            let segments = composer.compose(reveal);
            let visible = joined_text(&segments).chars().count();
            assert!(visible >= previous_text);
            previous_text = visible;
            let first_text = segments.iter().position(|s| s.as_text().is_some());
            for anchor in [4usize, 14] {
                if anchor < reveal {
                    let at = segments
                        .iter()
                        .position(|s| image_position(s) == Some(anchor))
                        .expect("placed image present");
                    assert!(first_text.map_or(false, |t| t < at));
                }
            }
        }
    }

    #[test]
    fn compose_is_pure() {
        let composer = SegmentComposer::new("abc def", vec![image("a.png", Some(3)), video()]);
        assert_eq!(composer.compose(5), composer.compose(5));
    }

    #[test]
    fn reveal_beyond_text_is_clamped() {
        assert_eq!(compose_segments("abc", 10, &[]), vec![Segment::text("abc")]);
    }
}
