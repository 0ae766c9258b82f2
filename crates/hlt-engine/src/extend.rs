//! Loudness-driven clip boundaries.
//!
//! Every event starts as `[time - pre, time + post]`. Each side then grows in
//! `extension_step` increments while the audio at the current boundary stays
//! loud, up to its cap.

use hlt_media::EnergySampler;
use hlt_models::{ClipInterval, Event};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Float slack when comparing accumulated steps with the cap.
const CAP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Backward,
    Forward,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Backward => -1.0,
            Direction::Forward => 1.0,
        }
    }
}

/// Turn one event into a clip interval with loudness-extended bounds.
pub async fn extend_event<S>(sampler: &S, event: &Event, config: &EngineConfig) -> EngineResult<ClipInterval>
where
    S: EnergySampler + ?Sized,
{
    config.validate()?;
    let base_start = event.time - config.pre_event_duration;
    let base_end = event.time + config.post_event_duration;

    let extra_start = grow(sampler, base_start, Direction::Backward, config.max_extra_start, config).await?;
    let extra_end = grow(sampler, base_end, Direction::Forward, config.max_extra_end, config).await?;

    let start = (base_start - extra_start).max(0.0);
    let end = base_end + extra_end;

    Ok(ClipInterval::new(start, end, event.label.clone()))
}

/// Extend every event, keeping input order.
pub async fn extend_events<S>(sampler: &S, events: &[Event], config: &EngineConfig) -> EngineResult<Vec<ClipInterval>>
where
    S: EnergySampler + ?Sized,
{
    let mut intervals = Vec::with_capacity(events.len());
    for event in events {
        intervals.push(extend_event(sampler, event, config).await?);
    }
    Ok(intervals)
}

/// Seconds to move `boundary` in `direction`.
///
/// Stops at the first quiet sample, when the next step would pass the cap,
/// or when the sampling window would leave the recording.
async fn grow<S>(
    sampler: &S,
    boundary: f64,
    direction: Direction,
    cap: f64,
    config: &EngineConfig,
) -> EngineResult<f64>
where
    S: EnergySampler + ?Sized,
{
    let half_width = config.sample_half_width;
    let step = config.extension_step;
    let mut extra = 0.0;

    loop {
        if extra + step > cap + CAP_EPSILON {
            break;
        }

        let at = boundary + direction.sign() * extra;
        if !sampler.contains(at, half_width) {
            break;
        }

        if sampler.sample(at, half_width).await? < config.volume_threshold {
            break;
        }

        extra += step;
    }

    Ok(extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlt_media::PcmAudio;

    const RATE: u32 = 100;

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: RATE,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_silence_keeps_base_bounds() {
        let audio = PcmAudio::from_fn(3600.0, RATE, |_| 0.0);
        let interval = extend_event(&audio, &Event::new(1800.0, "BossFight"), &config())
            .await
            .unwrap();

        assert_eq!(interval.start, 1790.0);
        assert_eq!(interval.end, 1804.0);
        assert_eq!(interval.label, "BossFight");
    }

    #[tokio::test]
    async fn test_loudness_extends_to_cap() {
        let audio = PcmAudio::from_fn(3600.0, RATE, |_| 0.5);
        let interval = extend_event(&audio, &Event::new(1800.0, ""), &config()).await.unwrap();

        assert!((interval.start - 1785.0).abs() < 1e-9);
        assert!((interval.end - 1809.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_partial_extension_stops_at_quiet_audio() {
        // Loud only in [1803, 1806]: forward grows while the window centre sits there
        let audio = PcmAudio::from_fn(3600.0, RATE, |t| if (1803.0..1806.0).contains(&t) { 0.5 } else { 0.0 });
        let interval = extend_event(&audio, &Event::new(1800.0, ""), &config()).await.unwrap();

        let extra_end = interval.end - 1804.0;
        assert!(extra_end > 0.0);
        assert!(extra_end < 5.0);
        assert_eq!(interval.start, 1790.0);
    }

    #[tokio::test]
    async fn test_start_is_floored_at_zero() {
        let audio = PcmAudio::from_fn(600.0, RATE, |_| 0.5);
        let interval = extend_event(&audio, &Event::new(3.0, ""), &config()).await.unwrap();

        assert_eq!(interval.start, 0.0);
        assert!(interval.end > 3.0);
    }

    #[tokio::test]
    async fn test_never_samples_past_the_end() {
        let audio = PcmAudio::from_fn(600.0, RATE, |_| 0.5);
        let interval = extend_event(&audio, &Event::new(599.0, ""), &config()).await.unwrap();

        // base_end is already past the recording, so no forward growth
        assert_eq!(interval.end, 603.0);
    }

    #[tokio::test]
    async fn test_rejects_zero_extension_step() {
        let audio = PcmAudio::from_fn(600.0, RATE, |_| 0.5);
        let config = EngineConfig {
            extension_step: 0.0,
            ..config()
        };

        let err = extend_events(&audio, &[Event::new(300.0, "")], &config)
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::EngineError::InvalidConfig(_)));
    }
}
