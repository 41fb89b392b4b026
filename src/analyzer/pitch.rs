//! Probabilistic YIN (pYIN) fundamental frequency tracking
//!
//! # How pYIN Works
//!
//! Plain YIN looks for the first dip of the cumulative-mean-normalized
//! difference function below a fixed threshold. pYIN replaces that single
//! threshold with a distribution over thresholds:
//!
//! 1. **Difference function**: for each frame, `d(τ) = Σ (x[j] - x[j+τ])²`
//!    over a half-frame window, normalized by its running mean.
//! 2. **Candidates**: every local minimum (trough) of the normalized curve is
//!    a period candidate. Sweeping 100 thresholds weighted by a Beta(2, 18)
//!    distribution, and preferring earlier troughs with a Boltzmann prior,
//!    turns the troughs into voicing probabilities.
//! 3. **Smoothing**: candidates are quantized to 10 bins per semitone and
//!    decoded with a hidden Markov model that has a voiced and an unvoiced
//!    copy of every pitch bin. Pitch may move at most ~36 octaves/second and
//!    the voicing state flips with 1% probability per frame.
//!
//! Frames decoded into the unvoiced half of the model report no F0.
//!
//! ```text
//! Parameter          | Default      | Meaning
//! -------------------|--------------|----------------------------------------
//! fmin / fmax        | C2 / C7      | 65.41 Hz .. 2093 Hz search range
//! frame / window     | 1024 / 512   | analysis frame / YIN integration window
//! thresholds         | 100          | Beta(2, 18) over [0, 1]
//! resolution         | 0.1 semitone | HMM pitch bin width
//! switch_prob        | 0.01         | voiced <-> unvoiced transition
//! ```

use super::frames::{self, Padding};
use crate::config::PitchConfig;

/// Values this close to zero in the energy and correlation terms are zeroed
const NUMERIC_FLOOR: f64 = 1e-6;

/// Smallest positive normal f64, added before logs and divisions
const TINY: f64 = f64::MIN_POSITIVE;

/// Per-frame output of the tracker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    /// Decoded F0 in Hz, `None` for unvoiced frames
    pub f0: Vec<Option<f64>>,
    /// Total observation probability of the voiced states per frame
    pub voiced_prob: Vec<f64>,
}

impl PitchTrack {
    fn unvoiced(num_frames: usize) -> Self {
        Self {
            f0: vec![None; num_frames],
            voiced_prob: vec![0.0; num_frames],
        }
    }

    pub fn num_frames(&self) -> usize {
        self.f0.len()
    }

    /// F0 values of the voiced frames, in frame order
    pub fn voiced(&self) -> impl Iterator<Item = f64> + '_ {
        self.f0.iter().filter_map(|f| *f)
    }

    pub fn voiced_count(&self) -> usize {
        self.f0.iter().filter(|f| f.is_some()).count()
    }
}

/// Track F0 over `samples` with centered frames of `frame_length`
pub fn pyin(
    samples: &[f64],
    sample_rate: u32,
    frame_length: usize,
    hop_length: usize,
    config: &PitchConfig,
) -> PitchTrack {
    let padded = frames::centered(samples, frame_length, Padding::Zero);
    let num_frames = frames::frame_count(padded.len(), frame_length, hop_length);

    let sr = sample_rate as f64;
    let win_length = frame_length / 2;
    let min_period = ((sr / config.fmax).floor() as usize).max(1);
    let max_period = ((sr / config.fmin).ceil() as usize)
        .min(frame_length.saturating_sub(win_length + 1));

    if max_period < min_period + 2 {
        log::debug!(
            "pitch search range [{}, {}] samples is empty at {} Hz",
            min_period,
            max_period,
            sample_rate
        );
        return PitchTrack::unvoiced(num_frames);
    }

    let beta_probs = threshold_probabilities(config);
    let model = PitchModel::new(sample_rate, hop_length, config);

    let observations: Vec<Observation> = frames::frames(&padded, frame_length, hop_length)
        .map(|frame| {
            let yin = normalized_difference(frame, win_length, min_period, max_period);
            let shifts = parabolic_shifts(&yin);
            let probs = trough_probabilities(&yin, &beta_probs, config);
            model.observe(&probs, &shifts, min_period, sr)
        })
        .collect();

    let states = model.viterbi(&observations);
    let f0 = states
        .iter()
        .map(|&state| model.frequency(state))
        .collect();

    PitchTrack {
        f0,
        voiced_prob: observations.iter().map(|o| o.voiced_prob).collect(),
    }
}

/// Cumulative-mean-normalized difference for lags `min_period..=max_period`
///
/// The window covers samples `1..=win_length` of the frame; energy and
/// correlation terms below 1e-6 are treated as zero so near-silent frames
/// produce a flat, trough-free curve.
fn normalized_difference(
    frame: &[f64],
    win_length: usize,
    min_period: usize,
    max_period: usize,
) -> Vec<f64> {
    // prefix[i] = sum of x[0..i]²
    let mut prefix = Vec::with_capacity(frame.len() + 1);
    prefix.push(0.0);
    for &x in frame {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + x * x);
    }

    let floor = |v: f64| if v.abs() < NUMERIC_FLOOR { 0.0 } else { v };
    let energy = |tau: usize| floor(prefix[tau + win_length + 1] - prefix[tau + 1]);
    let window = &frame[1..=win_length];

    let difference: Vec<f64> = (0..=max_period)
        .map(|tau| {
            let acf: f64 = window
                .iter()
                .zip(&frame[1 + tau..=win_length + tau])
                .map(|(a, b)| a * b)
                .sum();
            energy(0) + energy(tau) - 2.0 * floor(acf)
        })
        .collect();

    let mut cumulative = 0.0;
    let mut running_mean = vec![0.0; max_period + 1];
    for tau in 1..=max_period {
        cumulative += difference[tau];
        running_mean[tau] = cumulative / tau as f64;
    }

    (min_period..=max_period)
        .map(|tau| difference[tau] / (running_mean[tau] + TINY))
        .collect()
}

/// Sub-sample offset of each point's parabolic vertex (0 at the edges or when
/// the vertex falls more than one sample away)
fn parabolic_shifts(values: &[f64]) -> Vec<f64> {
    let mut shifts = vec![0.0; values.len()];
    for i in 1..values.len().saturating_sub(1) {
        let a = values[i + 1] + values[i - 1] - 2.0 * values[i];
        let b = (values[i + 1] - values[i - 1]) / 2.0;
        if b.abs() < a.abs() {
            shifts[i] = -b / a;
        }
    }
    shifts
}

/// Local minima: strictly below the left neighbour, not above the right one.
/// The first point is a trough when it is below the second; the last point
/// only needs to be below its left neighbour.
fn troughs(values: &[f64]) -> Vec<usize> {
    let n = values.len();
    (0..n)
        .filter(|&i| match i {
            0 => n > 1 && values[0] < values[1],
            _ if i == n - 1 => values[i] < values[i - 1],
            _ => values[i] < values[i - 1] && values[i] <= values[i + 1],
        })
        .collect()
}

/// Probability mass of each threshold interval under the Beta prior
fn threshold_probabilities(config: &PitchConfig) -> Vec<f64> {
    let n = config.n_thresholds;
    let cdf: Vec<f64> = (0..=n)
        .map(|k| beta_cdf(k as f64 / n as f64, config.beta_alpha, config.beta_beta))
        .collect();
    cdf.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect()
}

/// Regularized incomplete beta function for integer shape parameters
///
/// `I_x(a, b) = Σ_{j=a}^{a+b-1} C(a+b-1, j) x^j (1-x)^(a+b-1-j)`, evaluated
/// as one minus the lower binomial tail when `a <= b`. The lower tail keeps
/// the result monotone as `x` approaches 1.
fn beta_cdf(x: f64, a: u32, b: u32) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let n = a + b - 1;
    let term = |j: u32| binomial(n, j) * x.powi(j as i32) * (1.0 - x).powi((n - j) as i32);
    let value = if a <= b {
        1.0 - (0..a).map(term).sum::<f64>()
    } else {
        (a..=n).map(term).sum::<f64>()
    };
    value.clamp(0.0, 1.0)
}

fn binomial(n: u32, k: u32) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Boltzmann pmf over `0..count`
fn boltzmann_pmf(k: usize, lambda: f64, count: usize) -> f64 {
    (1.0 - (-lambda).exp()) * (-lambda * k as f64).exp() / (1.0 - (-lambda * count as f64).exp())
}

/// Voicing probability of each point of the normalized curve (non-zero only
/// at troughs)
fn trough_probabilities(yin: &[f64], beta_probs: &[f64], config: &PitchConfig) -> Vec<f64> {
    let mut probs = vec![0.0; yin.len()];
    let trough_index = troughs(yin);
    if trough_index.is_empty() {
        return probs;
    }

    let n = beta_probs.len();
    let heights: Vec<f64> = trough_index.iter().map(|&i| yin[i]).collect();

    // below[m][k]: trough m lies under threshold k+1
    let below: Vec<Vec<bool>> = heights
        .iter()
        .map(|&h| (1..=n).map(|k| h < k as f64 / n as f64).collect())
        .collect();

    for k in 0..n {
        let count = below.iter().filter(|row| row[k]).count();
        let mut position = 0;
        for (m, row) in below.iter().enumerate() {
            if row[k] {
                probs[trough_index[m]] +=
                    boltzmann_pmf(position, config.boltzmann, count) * beta_probs[k];
                position += 1;
            }
        }
    }

    // Thresholds that no trough gets under hand a share of their mass to the
    // deepest trough
    let global_min = heights
        .iter()
        .enumerate()
        .fold(0, |best, (i, &h)| if h < heights[best] { i } else { best });
    let missed = below[global_min].iter().filter(|&&b| !b).count();
    probs[trough_index[global_min]] +=
        config.no_trough_prob * beta_probs[..missed].iter().sum::<f64>();

    probs
}

/// Per-frame observation vector over `2 * num_bins` states
struct Observation {
    /// Probability assigned to each voiced pitch bin
    voiced: Vec<f64>,
    /// Probability shared by every unvoiced state
    unvoiced: f64,
    voiced_prob: f64,
}

/// Quantized pitch grid plus the voiced/unvoiced HMM
struct PitchModel {
    fmin: f64,
    bins_per_semitone: f64,
    num_bins: usize,
    /// Triangular local transition weights, already row-normalized per
    /// source bin: `band[i]` holds `(first_target, weights)`
    band: Vec<(usize, Vec<f64>)>,
    switch_prob: f64,
}

impl PitchModel {
    fn new(sample_rate: u32, hop_length: usize, config: &PitchConfig) -> Self {
        let bins_per_semitone = (1.0 / config.resolution).ceil();
        let octaves = (config.fmax / config.fmin).log2();
        let num_bins = (12.0 * bins_per_semitone * octaves + 1e-9).floor() as usize + 1;

        let max_semitones_per_frame = (config.max_transition_rate * 12.0 * hop_length as f64
            / sample_rate as f64)
            .round() as usize;
        let width = max_semitones_per_frame * bins_per_semitone as usize + 1;

        Self {
            fmin: config.fmin,
            bins_per_semitone,
            num_bins,
            band: local_transitions(num_bins, width),
            switch_prob: config.switch_prob,
        }
    }

    fn observe(&self, probs: &[f64], shifts: &[f64], min_period: usize, sr: f64) -> Observation {
        let mut voiced = vec![0.0; self.num_bins];
        let scale = 12.0 * self.bins_per_semitone;

        for (i, &p) in probs.iter().enumerate() {
            if p == 0.0 {
                continue;
            }
            let period = (min_period + i) as f64 + shifts[i];
            let f0 = sr / period;
            let bin = (scale * (f0 / self.fmin).log2()).round();
            let bin = bin.clamp(0.0, (self.num_bins - 1) as f64) as usize;
            voiced[bin] = p;
        }

        let voiced_prob = voiced.iter().sum::<f64>().clamp(0.0, 1.0);
        Observation {
            voiced,
            unvoiced: (1.0 - voiced_prob) / self.num_bins as f64,
            voiced_prob,
        }
    }

    fn frequency(&self, state: usize) -> Option<f64> {
        (state < self.num_bins)
            .then(|| self.fmin * 2f64.powf(state as f64 / (12.0 * self.bins_per_semitone)))
    }

    /// Most likely state sequence; the chain starts in the unvoiced half
    ///
    /// Transitions are banded, so each target only scans the sources within
    /// reach in both halves. Every out-of-band transition has the same
    /// log(TINY) weight and is covered by the best previous state overall.
    fn viterbi(&self, observations: &[Observation]) -> Vec<usize> {
        let n = self.num_bins;
        let states = 2 * n;
        if observations.is_empty() {
            return vec![];
        }

        let log_tiny = TINY.ln();
        let log_obs = |obs: &Observation, s: usize| {
            if s < n {
                (obs.voiced[s] + TINY).ln()
            } else {
                (obs.unvoiced + TINY).ln()
            }
        };

        // Column view of the band: for each target bin, every source bin in
        // reach with its log weight for staying in / switching half
        let stay = 1.0 - self.switch_prob;
        let mut incoming: Vec<Vec<(usize, f64, f64)>> = vec![Vec::new(); n];
        for (source, (first, weights)) in self.band.iter().enumerate() {
            for (offset, &w) in weights.iter().enumerate() {
                incoming[first + offset].push((
                    source,
                    (w * stay + TINY).ln(),
                    (w * self.switch_prob + TINY).ln(),
                ));
            }
        }

        let init = 1.0 / n as f64;
        let mut value: Vec<f64> = (0..states)
            .map(|s| {
                let p_init = if s < n { 0.0 } else { init };
                log_obs(&observations[0], s) + (p_init + TINY).ln()
            })
            .collect();
        let mut backpointers: Vec<Vec<usize>> = Vec::with_capacity(observations.len());

        for obs in &observations[1..] {
            let (best_prev, best_prev_value) = argmax(&value);
            let mut next = vec![0.0; states];
            let mut pointers = vec![0usize; states];

            for target in 0..states {
                let (block, bin) = (target / n, target % n);
                let mut best = (best_prev, best_prev_value + log_tiny);

                for &(source_bin, log_same, log_other) in &incoming[bin] {
                    for source_block in 0..2 {
                        let source = source_block * n + source_bin;
                        let log_w = if source_block == block { log_same } else { log_other };
                        let candidate = value[source] + log_w;
                        if candidate > best.1 || (candidate == best.1 && source < best.0) {
                            best = (source, candidate);
                        }
                    }
                }

                next[target] = best.1 + log_obs(obs, target);
                pointers[target] = best.0;
            }

            value = next;
            backpointers.push(pointers);
        }

        let mut path = vec![0usize; observations.len()];
        path[observations.len() - 1] = argmax(&value).0;
        for t in (1..observations.len()).rev() {
            path[t - 1] = backpointers[t - 1][path[t]];
        }
        path
    }
}

/// First index of the maximum
fn argmax(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
}

/// Triangular window of odd or even length, peak-normalized
fn triangle(width: usize) -> Vec<f64> {
    let mut half: Vec<f64>;
    if width % 2 == 1 {
        let m = (width + 1) / 2;
        half = (1..=m).map(|k| 2.0 * k as f64 / (width + 1) as f64).collect();
        let mirror: Vec<f64> = half[..m - 1].iter().rev().copied().collect();
        half.extend(mirror);
    } else {
        let m = width / 2;
        half = (1..=m).map(|k| (2 * k - 1) as f64 / width as f64).collect();
        let mirror: Vec<f64> = half.iter().rev().copied().collect();
        half.extend(mirror);
    }
    half
}

/// Banded, non-wrapping transition rows centered on each bin
fn local_transitions(num_bins: usize, width: usize) -> Vec<(usize, Vec<f64>)> {
    let window = triangle(width);
    let center = (width - 1) / 2;

    (0..num_bins)
        .map(|i| {
            let first = i.saturating_sub(center);
            let last = (i + width - 1 - center).min(num_bins - 1);
            let mut weights: Vec<f64> = (first..=last)
                .map(|j| window[j + center - i])
                .collect();
            let total: f64 = weights.iter().sum();
            for w in &mut weights {
                *w /= total;
            }
            (first, weights)
        })
        .collect()
}
