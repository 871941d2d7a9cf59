//! Pitch Tracking and Glottal Pulse Detection
//!
//! Frames are analyzed with the McLeod pitch method. Runs of voiced frames
//! are then walked cycle by cycle, picking the waveform peak near each
//! expected period to recover individual glottal pulses.

use super::VoiceConfig;
use pitch_detection::detector::mcleod::McLeodDetector;
use pitch_detection::detector::PitchDetector;
use std::ops::Range;

/// Frame-wise fundamental frequency, 0.0 for unvoiced frames
#[derive(Debug, Clone)]
pub struct PitchTrack {
    /// F0 per frame (Hz)
    pub frequencies: Vec<f64>,
    /// Frame length (samples)
    pub frame_len: usize,
    /// Hop between frames (samples)
    pub hop: usize,
}

impl PitchTrack {
    /// Pitch values of voiced frames only
    pub fn voiced(&self) -> Vec<f64> {
        self.frequencies.iter().copied().filter(|f| *f > 0.0).collect()
    }

    /// Ranges of consecutive voiced frame indices
    pub fn voiced_runs(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, f) in self.frequencies.iter().enumerate() {
            match (start, *f > 0.0) {
                (None, true) => start = Some(i),
                (Some(s), false) => {
                    runs.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push(s..self.frequencies.len());
        }
        runs
    }

    /// Sample range covered by a run of frames
    pub fn sample_span(&self, run: &Range<usize>) -> Range<usize> {
        run.start * self.hop..(run.end - 1) * self.hop + self.frame_len
    }

    /// Frame whose center is nearest to a sample position, clamped to a run
    fn frame_at(&self, pos: usize, run: &Range<usize>) -> usize {
        let frame = (pos.saturating_sub(self.frame_len / 2) + self.hop / 2) / self.hop;
        frame.clamp(run.start, run.end - 1)
    }
}

/// Track pitch over the whole signal
pub fn track_pitch(samples: &[f64], sample_rate: u32, config: &VoiceConfig) -> PitchTrack {
    let frame_len = config.frame_len(sample_rate);
    let hop = config.hop_len(sample_rate);
    // Power gate scales with frame length so it reads as a minimum RMS
    let power_threshold = config.min_rms * config.min_rms * frame_len as f64;

    let mut detector = McLeodDetector::<f64>::new(frame_len, frame_len / 2);
    let mut frequencies = Vec::new();
    let mut start = 0;
    while start + frame_len <= samples.len() {
        let frame = &samples[start..start + frame_len];
        let f0 = detector
            .get_pitch(frame, sample_rate as usize, power_threshold, config.clarity_threshold)
            .map(|pitch| pitch.frequency)
            .filter(|f| *f >= config.min_pitch_hz && *f <= config.max_pitch_hz)
            .unwrap_or(0.0);
        frequencies.push(f0);
        start += hop;
    }

    PitchTrack {
        frequencies,
        frame_len,
        hop,
    }
}

/// One glottal pulse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    /// Seconds from the start of the signal
    pub time: f64,
    /// Peak amplitude
    pub amplitude: f64,
}

/// One glottal cycle between consecutive pulses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycle {
    /// Seconds
    pub period: f64,
    /// Peak amplitude at the start of the cycle
    pub amplitude: f64,
}

/// Detect glottal pulses inside each voiced run
pub fn detect_pulses(samples: &[f64], sample_rate: u32, track: &PitchTrack) -> Vec<Vec<Pulse>> {
    let fs = sample_rate as f64;
    let mut runs = Vec::new();

    for run in track.voiced_runs() {
        let span = track.sample_span(&run);
        let end = span.end.min(samples.len());
        let period_at = |pos: usize| fs / track.frequencies[track.frame_at(pos, &run)];

        let first_end = (span.start + period_at(span.start).round() as usize).min(end);
        let Some(mut idx) = argmax(samples, span.start..first_end) else {
            continue;
        };

        let mut pulses = vec![refine_peak(samples, idx, fs)];
        loop {
            let period = period_at(idx);
            let lo = idx + (0.8 * period).round() as usize;
            let hi = (idx + (1.2 * period).round() as usize + 1).min(end);
            match argmax(samples, lo..hi) {
                Some(next) => {
                    idx = next;
                    pulses.push(refine_peak(samples, idx, fs));
                }
                None => break,
            }
        }
        runs.push(pulses);
    }

    runs
}

/// Split pulse runs into cycle sequences of plausible, locally consistent periods
pub fn cycles(pulses: &[Vec<Pulse>], config: &VoiceConfig) -> Vec<Vec<Cycle>> {
    let min_period = 1.0 / config.max_pitch_hz;
    let max_period = 1.0 / config.min_pitch_hz;

    let mut sequences = Vec::new();
    for run in pulses {
        let mut current: Vec<Cycle> = Vec::new();
        for pair in run.windows(2) {
            let period = pair[1].time - pair[0].time;
            let in_range = period >= min_period && period <= max_period;
            let consistent = current.last().map_or(true, |prev| {
                let ratio = period / prev.period;
                ratio <= config.max_period_factor && ratio >= 1.0 / config.max_period_factor
            });

            if !in_range || !consistent {
                if current.len() > 1 {
                    sequences.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            if in_range {
                current.push(Cycle {
                    period,
                    amplitude: pair[0].amplitude,
                });
            }
        }
        if current.len() > 1 {
            sequences.push(current);
        }
    }
    sequences
}

fn argmax(samples: &[f64], range: Range<usize>) -> Option<usize> {
    let end = range.end.min(samples.len());
    (range.start..end).max_by(|&a, &b| samples[a].total_cmp(&samples[b]))
}

/// Parabolic interpolation around a sample peak
fn refine_peak(samples: &[f64], idx: usize, fs: f64) -> Pulse {
    if idx == 0 || idx + 1 >= samples.len() {
        return Pulse {
            time: idx as f64 / fs,
            amplitude: samples[idx],
        };
    }

    let (a, b, c) = (samples[idx - 1], samples[idx], samples[idx + 1]);
    let curvature = a - 2.0 * b + c;
    if curvature >= 0.0 {
        return Pulse {
            time: idx as f64 / fs,
            amplitude: b,
        };
    }
    let offset = 0.5 * (a - c) / curvature;
    Pulse {
        time: (idx as f64 + offset) / fs,
        amplitude: b - 0.25 * (a - c) * offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: u32, secs: f64, amplitude: f64) -> Vec<f64> {
        let n = (sample_rate as f64 * secs) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    #[test]
    fn test_constant_pitch_track() {
        let samples = sine(200.0, 16_000, 1.0, 0.5);
        let track = track_pitch(&samples, 16_000, &VoiceConfig::default());
        let voiced = track.voiced();
        assert!(voiced.len() > 80);
        for f in voiced {
            assert!((f - 200.0).abs() < 5.0, "pitch {}", f);
        }
        assert_eq!(track.voiced_runs().len(), 1);
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let samples = vec![0.0; 16_000];
        let track = track_pitch(&samples, 16_000, &VoiceConfig::default());
        assert!(!track.frequencies.is_empty());
        assert!(track.voiced().is_empty());
    }

    #[test]
    fn test_voiced_runs() {
        let track = PitchTrack {
            frequencies: vec![0.0, 100.0, 110.0, 0.0, 0.0, 120.0],
            frame_len: 4,
            hop: 2,
        };
        assert_eq!(track.voiced_runs(), vec![1..3, 5..6]);
        assert_eq!(track.sample_span(&(1..3)), 2..8);
    }

    #[test]
    fn test_pulses_follow_period() {
        let samples = sine(200.0, 16_000, 0.5, 0.5);
        let track = track_pitch(&samples, 16_000, &VoiceConfig::default());
        let pulses = detect_pulses(&samples, 16_000, &track);
        assert_eq!(pulses.len(), 1);

        let run = &pulses[0];
        assert!(run.len() > 80);
        for pair in run.windows(2) {
            assert!((pair[1].time - pair[0].time - 0.005).abs() < 1e-9);
        }
        for pulse in run {
            assert!((pulse.amplitude - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cycles_break_on_outliers() {
        let config = VoiceConfig::default();
        let times = [0.0, 0.005, 0.010, 0.015, 0.035, 0.040, 0.045];
        let run: Vec<Pulse> = times
            .iter()
            .map(|&time| Pulse { time, amplitude: 1.0 })
            .collect();
        let sequences = cycles(&[run], &config);
        // The 20 ms gap breaks consistency and starts a new sequence
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].len(), 3);
        assert_eq!(sequences[1].len(), 2);
    }

    #[test]
    fn test_refine_peak_interpolates() {
        let samples = [0.0, 0.8, 1.0, 0.6, 0.0];
        let pulse = refine_peak(&samples, 2, 1.0);
        // Larger left neighbour pulls the vertex back by 1/6 sample
        assert!((pulse.time - (2.0 - 1.0 / 6.0)).abs() < 1e-12);
        assert!((pulse.amplitude - (1.0 + 0.05 / 6.0)).abs() < 1e-12);
    }
}
