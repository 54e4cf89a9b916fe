//! Percentage mix normalizer.
//!
//! Handles:
//! - Rescaling a mix that does not sum to 100 (auto-normalize)
//! - Rounding drift correction (whole residual goes to the first element)
//! - Zero-sum mixes (even split or reject, per policy)
//! - Proportional fractions for payer mixes

use serde::{Deserialize, Serialize};

use crate::models::{Advisory, MixKind};

use super::{RoiError, RoiResult};

/// Target sum for percentage mixes.
const TARGET_PCT: f64 = 100.0;

/// Tolerance when deciding that a mix already sums to 100.
const SUM_TOLERANCE: f64 = 1e-9;

/// What to do with a mix whose values sum to zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSumPolicy {
    /// Replace with equal integer shares summing to 100
    #[default]
    EvenSplit,
    /// Leave the values unchanged and flag the mix as imbalanced
    Reject,
}

/// Outcome of normalizing a mix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MixStatus {
    /// Already summed to 100; values returned unchanged
    Balanced,
    /// Rescaled to 100 from the given sum
    Rescaled { original_sum: f64 },
    /// Zero-sum mix replaced by an even split
    EvenSplit,
    /// Not summing to 100 and not corrected
    Imbalanced { sum: f64 },
}

impl MixStatus {
    /// Advisory to surface for this status, if any.
    pub fn advisory(&self, mix: MixKind) -> Option<Advisory> {
        match *self {
            MixStatus::Balanced => None,
            MixStatus::Rescaled { original_sum } => Some(Advisory::MixRescaled { mix, original_sum }),
            MixStatus::EvenSplit => Some(Advisory::EvenSplitApplied { mix }),
            MixStatus::Imbalanced { sum } => Some(Advisory::MixImbalance { mix, sum }),
        }
    }
}

/// A normalized mix of percentages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedMix {
    /// Percent values, same order and length as the input
    pub shares: Vec<f64>,
    pub status: MixStatus,
}

impl NormalizedMix {
    /// Whether the shares can be trusted to sum to 100.
    pub fn is_valid(&self) -> bool {
        !matches!(self.status, MixStatus::Imbalanced { .. })
    }
}

/// Normalizer for percentage mixes (referral types, payers).
#[derive(Debug, Clone, Copy)]
pub struct MixNormalizer {
    auto_normalize: bool,
    zero_sum_policy: ZeroSumPolicy,
}

impl Default for MixNormalizer {
    fn default() -> Self {
        Self::new(true, ZeroSumPolicy::default())
    }
}

impl MixNormalizer {
    /// Create a normalizer with the given policies.
    pub fn new(auto_normalize: bool, zero_sum_policy: ZeroSumPolicy) -> Self {
        Self {
            auto_normalize,
            zero_sum_policy,
        }
    }

    pub fn auto_normalize(&self) -> bool {
        self.auto_normalize
    }

    pub fn zero_sum_policy(&self) -> ZeroSumPolicy {
        self.zero_sum_policy
    }

    /// Normalize a percentage mix so it sums to exactly 100.
    ///
    /// Rescaled values are rounded half-to-even and the rounding residual is
    /// applied to the first element. A negative residual never takes a share
    /// below zero: whatever the first element cannot absorb moves on to the
    /// next one, so `[0, 1, 1, 1, 1, 1, 1]` becomes `[0, 15, 17, 17, 17, 17, 17]`.
    pub fn normalize(&self, shares: &[f64]) -> RoiResult<NormalizedMix> {
        validate_shares(shares)?;

        let sum: f64 = shares.iter().sum();
        if shares.is_empty() || (sum - TARGET_PCT).abs() <= SUM_TOLERANCE {
            return Ok(NormalizedMix {
                shares: shares.to_vec(),
                status: MixStatus::Balanced,
            });
        }

        if sum == 0.0 {
            return Ok(match self.zero_sum_policy {
                ZeroSumPolicy::EvenSplit => NormalizedMix {
                    shares: even_split(shares.len()),
                    status: MixStatus::EvenSplit,
                },
                ZeroSumPolicy::Reject => NormalizedMix {
                    shares: shares.to_vec(),
                    status: MixStatus::Imbalanced { sum },
                },
            });
        }

        if !self.auto_normalize {
            return Ok(NormalizedMix {
                shares: shares.to_vec(),
                status: MixStatus::Imbalanced { sum },
            });
        }

        let scale = TARGET_PCT / sum;
        let mut rescaled: Vec<f64> = shares
            .iter()
            .map(|share| (share * scale).round_ties_even())
            .collect();
        correct_drift(&mut rescaled);

        Ok(NormalizedMix {
            shares: rescaled,
            status: MixStatus::Rescaled { original_sum: sum },
        })
    }
}

/// Proportional fractions summing to 1.0.
///
/// Unlike [`MixNormalizer::normalize`] there is no rounding: each share is
/// divided by the total. A zero-sum input becomes an even split. The flag is
/// true when the input did not already sum to 100.
pub fn normalize_fractions(shares: &[f64]) -> RoiResult<(Vec<f64>, bool)> {
    validate_shares(shares)?;

    if shares.is_empty() {
        return Ok((Vec::new(), false));
    }

    let total: f64 = shares.iter().sum();
    if total == 0.0 {
        let even = 1.0 / shares.len() as f64;
        return Ok((vec![even; shares.len()], true));
    }

    let fractions = shares.iter().map(|share| share / total).collect();
    let changed = (total - TARGET_PCT).abs() > SUM_TOLERANCE;
    Ok((fractions, changed))
}

/// Equal integer shares summing to 100, remainder on the first element.
fn even_split(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    let each = (TARGET_PCT / len as f64).floor();
    let mut shares = vec![each; len];
    correct_drift(&mut shares);
    shares
}

/// Apply `100 - sum` starting at the first element, clamping shares at zero.
fn correct_drift(shares: &mut [f64]) {
    let mut drift = TARGET_PCT - shares.iter().sum::<f64>();
    for share in shares.iter_mut() {
        if drift == 0.0 {
            break;
        }
        let adjusted = (*share + drift).max(0.0);
        drift -= adjusted - *share;
        *share = adjusted;
    }
}

fn validate_shares(shares: &[f64]) -> RoiResult<()> {
    for (idx, share) in shares.iter().enumerate() {
        if !share.is_finite() || *share < 0.0 {
            return Err(RoiError::InvalidInput(format!(
                "mix share #{} must be a non-negative number, got {}",
                idx + 1,
                share
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto() -> MixNormalizer {
        MixNormalizer::new(true, ZeroSumPolicy::EvenSplit)
    }

    #[test]
    fn test_balanced_mix_unchanged() {
        let mix = auto().normalize(&[30.0, 25.0, 25.0, 20.0]).unwrap();
        assert_eq!(mix.shares, vec![30.0, 25.0, 25.0, 20.0]);
        assert_eq!(mix.status, MixStatus::Balanced);
        assert!(mix.status.advisory(MixKind::Referral).is_none());
    }

    #[test]
    fn test_rescale_under_100() {
        // 50/30/10 scaled by 100/90 -> 55.6, 33.3, 11.1 -> 56, 33, 11
        let mix = auto().normalize(&[50.0, 30.0, 10.0]).unwrap();
        assert_eq!(mix.shares, vec![56.0, 33.0, 11.0]);
        assert_eq!(mix.status, MixStatus::Rescaled { original_sum: 90.0 });
    }

    #[test]
    fn test_first_element_absorbs_drift() {
        // 33.33 each rounds to 33, sum 99, residual 1 goes to the first
        let mix = auto().normalize(&[10.0, 10.0, 10.0]).unwrap();
        assert_eq!(mix.shares, vec![34.0, 33.0, 33.0]);

        // 16.67 each rounds to 17, sum 102, residual -2 goes to the first
        let mix = auto().normalize(&[1.0; 6]).unwrap();
        assert_eq!(mix.shares, vec![15.0, 17.0, 17.0, 17.0, 17.0, 17.0]);
    }

    #[test]
    fn test_drift_never_makes_a_share_negative() {
        // 0 stays 0; the -2 residual spills onto the second element
        let mix = auto().normalize(&[0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(mix.shares, vec![0.0, 15.0, 17.0, 17.0, 17.0, 17.0, 17.0]);
        assert!(mix.is_valid());

        let again = auto().normalize(&mix.shares).unwrap();
        assert_eq!(again.status, MixStatus::Balanced);
        assert_eq!(again.shares, mix.shares);
    }

    #[test]
    fn test_rounding_half_to_even() {
        // 12.5 -> 12 and 87.5 -> 88 under half-to-even
        let mix = auto().normalize(&[1.0, 7.0]).unwrap();
        assert_eq!(mix.shares, vec![12.0, 88.0]);
    }

    #[test]
    fn test_zero_sum_even_split() {
        let mix = auto().normalize(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(mix.shares, vec![34.0, 33.0, 33.0]);
        assert_eq!(mix.status, MixStatus::EvenSplit);
    }

    #[test]
    fn test_zero_sum_reject() {
        let normalizer = MixNormalizer::new(true, ZeroSumPolicy::Reject);
        let mix = normalizer.normalize(&[0.0, 0.0]).unwrap();
        assert_eq!(mix.shares, vec![0.0, 0.0]);
        assert_eq!(mix.status, MixStatus::Imbalanced { sum: 0.0 });
        assert!(!mix.is_valid());
    }

    #[test]
    fn test_auto_normalize_disabled() {
        let normalizer = MixNormalizer::new(false, ZeroSumPolicy::EvenSplit);
        let mix = normalizer.normalize(&[50.0, 30.0, 10.0]).unwrap();
        assert_eq!(mix.shares, vec![50.0, 30.0, 10.0]);
        assert_eq!(
            mix.status.advisory(MixKind::Referral),
            Some(Advisory::MixImbalance {
                mix: MixKind::Referral,
                sum: 90.0
            })
        );
    }

    #[test]
    fn test_negative_share_rejected() {
        let err = auto().normalize(&[50.0, -10.0]).unwrap_err();
        assert!(err.to_string().contains("mix share #2"));
    }

    #[test]
    fn test_empty_mix() {
        let mix = auto().normalize(&[]).unwrap();
        assert!(mix.shares.is_empty());
        assert_eq!(mix.status, MixStatus::Balanced);
    }

    #[test]
    fn test_fractions() {
        let (fractions, changed) = normalize_fractions(&[50.0, 35.0, 15.0]).unwrap();
        assert!(!changed);
        assert!((fractions[0] - 0.50).abs() < 1e-12);
        assert!((fractions[2] - 0.15).abs() < 1e-12);

        // Off by less than the tolerance counts as already summing to 100
        let (_, changed) = normalize_fractions(&[50.0, 50.0 + 1e-12]).unwrap();
        assert!(!changed);
        let (_, changed) = normalize_fractions(&[50.0, 50.0 + 1e-7]).unwrap();
        assert!(changed);

        let (fractions, changed) = normalize_fractions(&[1.0, 1.0]).unwrap();
        assert!(changed);
        assert_eq!(fractions, vec![0.5, 0.5]);

        let (fractions, changed) = normalize_fractions(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(changed);
        assert_eq!(fractions, vec![0.25; 4]);
    }
}
