//! Technical indicators computed from daily closes
//!
//! Closes are passed oldest first. Every function returns `None` when the
//! history is too short for the indicator to be defined, never a padded value.

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Latest MACD reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Exponential moving average series, seeded with the SMA of the first
/// `period` values. Element `i` of the result corresponds to
/// `values[i + period - 1]`.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut ema = Vec::with_capacity(values.len() - period + 1);
    ema.push(seed);
    for value in &values[period..] {
        let prev = ema[ema.len() - 1];
        ema.push((value - prev) * k + prev);
    }
    ema
}

/// Relative Strength Index with Wilder smoothing
///
/// # Arguments
/// * `closes` - Closing prices, oldest first
/// * `period` - Lookback, 14 by convention
///
/// # Returns
/// * Latest RSI in `0.0..=100.0`, or `None` with fewer than `period + 1` closes
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (mut avg_gain, mut avg_loss) =
        changes[..period]
            .iter()
            .fold((0.0_f64, 0.0_f64), |(gain, loss), &change| {
                if change > 0.0 {
                    (gain + change, loss)
                } else {
                    (gain, loss - change)
                }
            });
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let n = period as f64;
    for change in &changes[period..] {
        let (gain, loss) = if *change > 0.0 {
            (*change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
    }

    if avg_loss == 0.0 {
        // flat series has no direction
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD 12/26/9 at the latest close
///
/// Needs `slow + signal - 1` closes (34 with the standard periods).
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || signal == 0 || fast >= slow || closes.len() < slow + signal - 1 {
        return None;
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    // Align the fast series to where the slow one starts
    let offset = slow - fast;
    let line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, slow_value)| fast_ema[i + offset] - slow_value)
        .collect();

    let signal_ema = calculate_ema(&line, signal);
    let macd = *line.last()?;
    let signal = *signal_ema.last()?;

    Some(Macd {
        macd,
        signal,
        histogram: macd - signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ema = calculate_ema(&values, 3);

        assert_eq!(ema.len(), 3);
        assert!(approx(ema[0], 2.0, 1e-12));
        // k = 0.5
        assert!(approx(ema[1], 3.0, 1e-12));
        assert!(approx(ema[2], 4.0, 1e-12));
    }

    #[test]
    fn test_ema_short_input() {
        assert!(calculate_ema(&[1.0, 2.0], 3).is_empty());
        assert!(calculate_ema(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_rsi_requires_period_plus_one() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(calculate_rsi(&closes, RSI_PERIOD), None);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(calculate_rsi(&rising, RSI_PERIOD), Some(100.0));

        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&falling, RSI_PERIOD).unwrap();
        assert!(approx(rsi, 0.0, 1e-9));

        let flat = vec![42.0; 20];
        assert_eq!(calculate_rsi(&flat, RSI_PERIOD), Some(50.0));
    }

    #[test]
    fn test_rsi_alternating_is_balanced() {
        // +1 / -1 alternating: equal average gain and loss over the seed window
        let closes: Vec<f64> = (0..15)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let rsi = calculate_rsi(&closes, RSI_PERIOD).unwrap();
        assert!(approx(rsi, 50.0, 1e-9));
    }

    #[test]
    fn test_rsi_reference_values() {
        // Wilder's worked example closes
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28,
        ];
        let rsi = calculate_rsi(&closes, RSI_PERIOD).unwrap();
        assert!(approx(rsi, 70.464, 0.001), "rsi was {}", rsi);
    }

    #[test]
    fn test_macd_requires_history() {
        let closes: Vec<f64> = (0..33).map(|i| 100.0 + i as f64).collect();
        assert_eq!(
            calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
            None
        );
    }

    #[test]
    fn test_macd_linear_trend() {
        // On a straight line both EMAs lag by (period - 1) / 2 steps, so the
        // line settles at slope * (slow - fast) / 2 and the histogram at zero
        let closes: Vec<f64> = (0..34).map(|i| 100.0 + 2.0 * i as f64).collect();
        let macd = calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).unwrap();

        assert!(approx(macd.macd, 14.0, 1e-9), "macd was {}", macd.macd);
        assert!(approx(macd.signal, 14.0, 1e-9));
        assert!(approx(macd.histogram, 0.0, 1e-9));
    }

    #[test]
    fn test_macd_flat_is_zero() {
        let closes = vec![10.0; 60];
        let macd = calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).unwrap();
        assert_eq!(macd, Macd { macd: 0.0, signal: 0.0, histogram: 0.0 });
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        let closes = vec![10.0; 60];
        assert_eq!(calculate_macd(&closes, 26, 12, 9), None);
        assert_eq!(calculate_macd(&closes, 0, 26, 9), None);
    }
}
