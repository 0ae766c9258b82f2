//! Batch timeline assembly.
//!
//! A [`Timeline`] is shared by every recording of a batch. Clips are appended
//! in order while a running cumulative duration positions chapter markers in
//! the final video.

use serde::Serialize;

use hlt_models::{Chapter, ClipInterval, LabelMark};

/// One physical clip placed on the batch timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineClip {
    /// Recording the clip is cut from.
    pub recording_id: String,
    /// Span within that recording.
    pub interval: ClipInterval,
    /// Offset of the clip's first frame in the concatenated output, before
    /// the intro is accounted for.
    pub offset: f64,
}

/// Ordered clips, chapters and label bookkeeping for one output video.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    intro_duration: f64,
    clips: Vec<TimelineClip>,
    cumulative_duration: f64,
    chapters: Vec<Chapter>,
    tags: Vec<String>,
    labels: Vec<String>,
    #[serde(skip)]
    active_label: String,
}

impl Timeline {
    /// Start an empty timeline whose tags begin with `base_tags`.
    pub fn new<I, T>(intro_duration: f64, base_tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut timeline = Self {
            intro_duration,
            clips: Vec::new(),
            cumulative_duration: 0.0,
            chapters: Vec::new(),
            tags: Vec::new(),
            labels: Vec::new(),
            active_label: String::new(),
        };
        for tag in base_tags {
            timeline.add_tag(tag.into());
        }
        timeline
    }

    /// Append the final intervals of one recording, in order.
    ///
    /// Each recording starts without an active label, so its first labeled
    /// clip always opens a chapter. Returns the number of clips appended.
    pub fn append_recording(&mut self, recording_id: &str, intervals: Vec<ClipInterval>) -> usize {
        self.active_label.clear();
        let count = intervals.len();
        for interval in intervals {
            self.append(recording_id, interval);
        }
        count
    }

    fn append(&mut self, recording_id: &str, interval: ClipInterval) {
        let clip_offset = self.cumulative_duration;

        let fallback;
        let marks: &[LabelMark] = if interval.marks.is_empty() {
            fallback = [LabelMark {
                at: interval.start,
                label: interval.label.clone(),
            }];
            &fallback
        } else {
            &interval.marks
        };

        for mark in marks {
            if mark.label.is_empty() || mark.label == self.active_label {
                continue;
            }
            let within = (mark.at - interval.start).clamp(0.0, interval.duration());
            let offset = self.intro_duration + clip_offset + within;
            record_chapter(&mut self.chapters, offset, &mark.label);
            self.active_label = mark.label.clone();
            self.add_label(mark.label.clone());
        }

        self.cumulative_duration += interval.duration();
        self.clips.push(TimelineClip {
            recording_id: recording_id.to_string(),
            interval,
            offset: clip_offset,
        });
    }

    fn add_label(&mut self, label: String) {
        if !self.labels.contains(&label) {
            self.labels.push(label.clone());
        }
        self.add_tag(label);
    }

    fn add_tag(&mut self, tag: String) {
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    /// Sum of all appended clip lengths, excluding intro and outro.
    pub fn cumulative_duration(&self) -> f64 {
        self.cumulative_duration
    }

    /// Chapters with strictly increasing offsets.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Base tags followed by every distinct label, in first-seen order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Distinct non-empty labels in first-seen order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// `MM:SS - Label` line per chapter.
    pub fn chapter_lines(&self) -> Vec<String> {
        self.chapters.iter().map(Chapter::description_line).collect()
    }
}

/// Push a chapter, or relabel the last one when the offset does not advance.
fn record_chapter(chapters: &mut Vec<Chapter>, offset: f64, label: &str) {
    match chapters.last_mut() {
        Some(last) if offset <= last.offset => last.label = label.to_string(),
        _ => chapters.push(Chapter::new(offset, label)),
    }
}
