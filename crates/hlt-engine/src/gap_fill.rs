//! Synthetic events for long uneventful stretches.
//!
//! The recording timeline is walked in fixed ticks. Whenever a tick finds
//! that nothing has happened for `max_time_without_events`, the gap since the
//! last event is scanned for its loudest window and an unlabeled event is
//! inserted there. A silent gap inserts nothing, but the event-free clock is
//! reset either way so the same gap is never rescanned.

use tracing::debug;

use hlt_media::EnergySampler;
use hlt_models::{sort_events, Event};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Insert synthetic events into `events`, returning how many were added.
///
/// `events` is sorted by time first and stays sorted. Detector events are
/// never removed or moved.
pub async fn fill_gaps<S>(
    sampler: &S,
    events: &mut Vec<Event>,
    config: &EngineConfig,
) -> EngineResult<usize>
where
    S: EnergySampler + ?Sized,
{
    config.validate()?;
    sort_events(events);

    let duration = sampler.duration();
    if duration <= 0.0 {
        return Ok(0);
    }

    let ticks = (duration / config.tick_secs).ceil() as usize;
    let mut last_event_time = 0.0_f64;
    let mut cursor = 0;
    let mut inserted = 0;

    for i in 1..=ticks {
        let now = (i as f64 * config.tick_secs).min(duration);

        while cursor < events.len() && events[cursor].time <= now {
            last_event_time = last_event_time.max(events[cursor].time);
            cursor += 1;
        }

        if now - last_event_time < config.max_time_without_events {
            continue;
        }

        if let Some(peak) = loudest_point(sampler, last_event_time, now, config).await? {
            debug!(
                gap_start = last_event_time,
                gap_end = now,
                peak,
                "Inserting synthetic event"
            );
            // Everything before the cursor is <= last_event_time < peak and
            // everything after it is > now > peak.
            events.insert(cursor, Event::unlabeled(peak));
            cursor += 1;
            inserted += 1;
        }

        last_event_time = now;
    }

    Ok(inserted)
}

/// Centre of the loudest scan window strictly inside `(from, to)`.
///
/// Returns `None` when every window is silent.
async fn loudest_point<S>(
    sampler: &S,
    from: f64,
    to: f64,
    config: &EngineConfig,
) -> EngineResult<Option<f64>>
where
    S: EnergySampler + ?Sized,
{
    let half_width = config.gap_scan_half_width;
    let limit = to - config.gap_scan_margin;

    let mut best: Option<(f64, f64)> = None;
    let mut center = from + config.gap_scan_margin;

    while center < limit {
        if sampler.contains(center, half_width) {
            let volume = sampler.sample(center, half_width).await?;
            if volume > best.map_or(0.0, |(_, v)| v) {
                best = Some((center, volume));
            }
        }
        center += config.gap_scan_step;
    }

    Ok(best.map(|(t, _)| t))
}
