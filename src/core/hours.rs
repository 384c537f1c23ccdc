use crate::models::{OperatingHours, DAY_SECONDS};

/// How well a spot's opening window covers the wanted window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoursFit {
    /// The whole wanted window falls inside the opening window
    Contains,
    /// The windows share at least some time
    Overlaps,
    Disjoint,
}

/// Half-open span `[start, end)` in seconds since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u32,
    end: u32,
}

/// Split a window into at most two same-day spans.
///
/// A closing time earlier than the opening time wraps past midnight and yields
/// `[open, 24:00]` plus `[00:00, close]`.
fn spans(window: OperatingHours) -> Vec<Span> {
    let open = window.open_time.seconds();
    let close = window.close_time.seconds();

    if close < open {
        vec![
            Span {
                start: open,
                end: DAY_SECONDS,
            },
            Span {
                start: 0,
                end: close,
            },
        ]
    } else {
        vec![Span {
            start: open,
            end: close,
        }]
    }
}

pub fn hours_fit(available: OperatingHours, wanted: OperatingHours) -> HoursFit {
    let available = spans(available);
    let wanted = spans(wanted);

    let contained = wanted.iter().all(|w| {
        available
            .iter()
            .any(|a| a.start <= w.start && w.end <= a.end)
    });
    if contained {
        return HoursFit::Contains;
    }

    let overlapping = wanted
        .iter()
        .any(|w| available.iter().any(|a| a.end > w.start && a.start < w.end));
    if overlapping {
        HoursFit::Overlaps
    } else {
        HoursFit::Disjoint
    }
}
