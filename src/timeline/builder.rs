use crate::document::normalize::{Document, Stroke};

/// One stroke's slot on the global replay clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineEntry {
    /// Index into [`Document::pages`].
    pub page: usize,
    /// Index into that page's strokes.
    pub stroke: usize,
    /// Slot start on the global clock, in milliseconds.
    pub start_ms: f64,
    /// Slot end on the global clock, in milliseconds.
    pub end_ms: f64,
}

impl TimelineEntry {
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Closed-interval containment, so zero-width slots still match their instant.
    pub fn contains(&self, t_ms: f64) -> bool {
        self.start_ms <= t_ms && t_ms <= self.end_ms
    }

    /// Resolve the stroke this entry points at.
    pub fn resolve<'a>(&self, doc: &'a Document) -> Option<&'a Stroke> {
        doc.pages.get(self.page)?.strokes.get(self.stroke)
    }
}

/// Gap-free replay clock built from every drawable stroke.
///
/// Idle time between strokes is not represented: entry `i + 1` starts exactly where entry `i`
/// ends, and the first entry starts at 0. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    total_ms: f64,
}

impl Timeline {
    /// Assign each stroke with at least two samples a contiguous slot, pages then strokes in
    /// source order.
    pub fn build(doc: &Document) -> Self {
        let (entries, total_ms) = doc
            .pages
            .iter()
            .enumerate()
            .flat_map(|(pi, page)| {
                page.strokes
                    .iter()
                    .enumerate()
                    .filter_map(move |(si, s)| Some((pi, si, s.duration_ms()?)))
            })
            .fold(
                (Vec::new(), 0.0f64),
                |(mut entries, cum), (page, stroke, dur)| {
                    let end = cum + dur as f64;
                    entries.push(TimelineEntry {
                        page,
                        stroke,
                        start_ms: cum,
                        end_ms: end,
                    });
                    (entries, end)
                },
            );

        tracing::debug!(entries = entries.len(), total_ms, "built replay timeline");
        Self { entries, total_ms }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all included strokes' durations.
    pub fn total_duration_ms(&self) -> f64 {
        self.total_ms
    }

    /// First entry in build order whose `[start, end]` contains `t_ms`.
    ///
    /// Slots are contiguous, so end times never decrease: every entry before the first one with
    /// `end >= t` ends too early, and that entry matches iff it has started. At a shared
    /// boundary this picks the earlier entry, same as a front-to-back scan.
    pub fn active_entry_at(&self, t_ms: f64) -> Option<usize> {
        let i = self.entries.partition_point(|e| e.end_ms < t_ms);
        let e = self.entries.get(i)?;
        e.contains(t_ms).then_some(i)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;
