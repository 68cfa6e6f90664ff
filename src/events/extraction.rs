// Channel event extraction
// Probe, frame and puff onsets from the acquisition log's digital channels

use crate::acquisition::{debounce, find_edges, width_in_samples, AcquisitionLog, Edge};
use crate::config::ChannelConfig;

use super::types::{timestamps_at, EventKind};
use super::EventError;

/// Timestamps of `edge` transitions on `channel`, optionally debounced first
///
/// `min_pulse_width_s` of zero skips debouncing.
pub fn extract_channel_events(
    log: &AcquisitionLog,
    config: &ChannelConfig,
    channel: usize,
    edge: Edge,
    min_pulse_width_s: f64,
    kind: EventKind,
) -> Result<Vec<f64>, EventError> {
    let timestamps = log.channel(config.timestamp_column)?;
    let trace = log.channel(channel)?;

    let indices = if min_pulse_width_s > 0.0 {
        let dt = log
            .sample_interval(config.timestamp_column)?
            .filter(|dt| *dt > 0.0)
            .ok_or(EventError::NoSampleInterval)?;
        let min_width = width_in_samples(min_pulse_width_s, dt);
        let filtered = debounce(&trace, min_width, config.edge_threshold);
        find_edges(&filtered, edge, 0.5)
    } else {
        find_edges(&trace, edge, config.edge_threshold)
    };

    let events = timestamps_at(&timestamps, &indices, kind)?;
    log::info!("Extracted {} {} events from channel {}", events.len(), kind, channel);
    Ok(events)
}

/// Probe onsets: debounced rising edges on the probe channel
pub fn extract_probe_timestamps(
    log: &AcquisitionLog,
    config: &ChannelConfig,
) -> Result<Vec<f64>, EventError> {
    extract_channel_events(
        log,
        config,
        config.probe_column,
        Edge::Rising,
        config.probe_min_pulse_width_s,
        EventKind::Probe,
    )
}

/// Frame onsets: every transition of the camera trigger channel
pub fn extract_frame_timestamps(
    log: &AcquisitionLog,
    config: &ChannelConfig,
) -> Result<Vec<f64>, EventError> {
    extract_channel_events(log, config, config.frame_column, Edge::Both, 0.0, EventKind::Frame)
}

/// Puff onsets: rising edges on the puff valve channel
pub fn extract_puff_timestamps(
    log: &AcquisitionLog,
    config: &ChannelConfig,
) -> Result<Vec<f64>, EventError> {
    extract_channel_events(log, config, config.puff_column, Edge::Rising, 0.0, EventKind::Puff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiring() -> ChannelConfig {
        ChannelConfig {
            log_delimiter: '\t',
            timestamp_column: 0,
            probe_column: 1,
            frame_column: 2,
            puff_column: 3,
            edge_threshold: 0.5,
            probe_min_pulse_width_s: 0.003,
        }
    }

    // 1 kHz log: probe channel has a 1-sample glitch at row 2 and a 4-sample pulse at 5..9
    fn synthetic_log() -> AcquisitionLog {
        let probe = [0, 0, 1, 0, 0, 1, 1, 1, 1, 0, 0, 0];
        let frame = [0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0];
        let puff = [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0];

        let rows = (0..probe.len())
            .map(|i| {
                vec![
                    i as f64 * 0.001,
                    probe[i] as f64,
                    frame[i] as f64,
                    puff[i] as f64,
                ]
            })
            .collect();
        AcquisitionLog::from_rows(rows).unwrap()
    }

    #[test]
    fn test_probe_glitch_is_debounced() {
        let probes = extract_probe_timestamps(&synthetic_log(), &wiring()).unwrap();
        assert_eq!(probes.len(), 1);
        assert!((probes[0] - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_frames_use_both_edges() {
        let frames = extract_frame_timestamps(&synthetic_log(), &wiring()).unwrap();
        let expected = [0.0, 0.002, 0.004, 0.006, 0.008, 0.010];
        assert_eq!(frames.len(), expected.len());
        for (got, want) in frames.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_puff_rising_edge() {
        let puffs = extract_puff_timestamps(&synthetic_log(), &wiring()).unwrap();
        assert_eq!(puffs.len(), 1);
        assert!((puffs[0] - 0.006).abs() < 1e-12);
    }

    #[test]
    fn test_missing_channel_is_error() {
        let mut config = wiring();
        config.puff_column = 9;
        assert!(matches!(
            extract_puff_timestamps(&synthetic_log(), &config),
            Err(EventError::Acquisition(_))
        ));
    }
}
