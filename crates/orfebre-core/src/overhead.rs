//! # Overhead Allocation (PCG)
//!
//! Spreads the workshop's monthly fixed costs over the grams it produces.
//!
//! ```text
//!          Σ active fixed costs + Σ active monthly depreciation
//!   PCG = ─────────────────────────────────────────────────────
//!                     grams produced per month
//! ```
//!
//! With the reference data (≈ 17.1 M fixed + 1.5 M depreciation over 509 g)
//! every gram of finished jewelry carries about 36 600 COP of overhead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::config::{FallbackPolicy, GlobalConfig};
use crate::error::{CoreError, CoreResult};
use crate::types::{Depreciation, FixedCost};
use crate::validation::validate_non_negative;

/// Result of an overhead allocation, with the figures that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Overhead {
    pub monthly_fixed_costs: f64,
    pub monthly_depreciation: f64,
    pub grams_per_month: f64,
    /// Overhead per gram (PCG).
    pub pcg: f64,
    /// True when no configuration record existed and the fallback volume
    /// was used as denominator.
    pub used_default_volume: bool,
}

impl Overhead {
    /// Total monthly overhead being allocated.
    #[inline]
    pub fn monthly_total(&self) -> f64 {
        self.monthly_fixed_costs + self.monthly_depreciation
    }
}

/// Computes the per-gram overhead figure.
///
/// ## Rules
/// - Only records flagged `active` contribute
/// - A missing `config` falls back to `fallback.grams_produced_per_month`
///   (509 by default). This is a degraded mode, not a failure; it is flagged
///   in the result and logged
/// - A zero, negative or non-finite production volume is a configuration
///   error rather than an `Infinity` PCG
/// - Negative or non-finite cost amounts on active records are rejected
///
/// ## Example
/// ```rust
/// use orfebre_core::overhead::calculate_pcg;
/// use orfebre_core::types::FixedCost;
/// use orfebre_core::{FallbackPolicy, GlobalConfig};
///
/// let rent = FixedCost {
///     id: "rent".into(),
///     name: "Arriendo".into(),
///     category: "servicio".into(),
///     monthly_value: 509_000.0,
///     active: true,
/// };
/// let overhead = calculate_pcg(
///     Some(&GlobalConfig::default()),
///     &[rent],
///     &[],
///     &FallbackPolicy::default(),
/// )
/// .unwrap();
/// assert_eq!(overhead.pcg, 1000.0);
/// ```
pub fn calculate_pcg(
    config: Option<&GlobalConfig>,
    fixed_costs: &[FixedCost],
    depreciations: &[Depreciation],
    fallback: &FallbackPolicy,
) -> CoreResult<Overhead> {
    let (grams_per_month, used_default_volume) = match config {
        Some(config) => (config.grams_produced_per_month, false),
        None => {
            warn!(
                grams_per_month = fallback.grams_produced_per_month,
                "No global configuration, using fallback production volume"
            );
            (fallback.grams_produced_per_month, true)
        }
    };

    if !grams_per_month.is_finite() || grams_per_month <= 0.0 {
        return Err(CoreError::configuration(
            "grams_produced_per_month",
            format!("must be greater than zero, got {grams_per_month}"),
        ));
    }

    let mut monthly_fixed_costs = 0.0;
    for cost in fixed_costs.iter().filter(|c| c.active) {
        validate_non_negative("fixed_cost.monthly_value", cost.monthly_value)?;
        monthly_fixed_costs += cost.monthly_value;
    }

    let mut monthly_depreciation = 0.0;
    for dep in depreciations.iter().filter(|d| d.active) {
        monthly_depreciation += dep.monthly_value()?;
    }

    let pcg = (monthly_fixed_costs + monthly_depreciation) / grams_per_month;

    debug!(
        monthly_fixed_costs,
        monthly_depreciation,
        grams_per_month,
        pcg,
        "Calculated overhead per gram"
    );

    Ok(Overhead {
        monthly_fixed_costs,
        monthly_depreciation,
        grams_per_month,
        pcg,
        used_default_volume,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(id: &str, value: f64, active: bool) -> FixedCost {
        FixedCost {
            id: id.to_string(),
            name: id.to_string(),
            category: "servicio".to_string(),
            monthly_value: value,
            active,
        }
    }

    fn depreciation(id: &str, initial: f64, years: f64, active: bool) -> Depreciation {
        Depreciation {
            id: id.to_string(),
            name: id.to_string(),
            initial_value: initial,
            useful_life_years: years,
            active,
        }
    }

    #[test]
    fn test_pcg_reference_example() {
        let costs = vec![fixed("a", 4_000_000.0, true), fixed("b", 2_000_000.0, true)];
        let overhead =
            calculate_pcg(Some(&GlobalConfig::default()), &costs, &[], &FallbackPolicy::default())
                .unwrap();

        assert_eq!(overhead.monthly_total(), 6_000_000.0);
        assert!((overhead.pcg - 11_787.8193).abs() < 0.001);
        assert!(!overhead.used_default_volume);
    }

    #[test]
    fn test_inactive_records_are_ignored() {
        let costs = vec![fixed("on", 1_000.0, true), fixed("off", 9_999_999.0, false)];
        let deps = vec![
            depreciation("tools", 60_000_000.0, 5.0, true),
            depreciation("old", 60_000_000.0, 1.0, false),
        ];
        let config = GlobalConfig {
            grams_produced_per_month: 1_001.0,
            ..GlobalConfig::default()
        };

        let overhead = calculate_pcg(Some(&config), &costs, &deps, &FallbackPolicy::default())
            .unwrap();
        assert_eq!(overhead.monthly_fixed_costs, 1_000.0);
        assert_eq!(overhead.monthly_depreciation, 1_000_000.0);
        assert_eq!(overhead.pcg, 1_000.0);
    }

    #[test]
    fn test_missing_config_uses_fallback_volume() {
        let costs = vec![fixed("a", 509.0, true)];
        let overhead = calculate_pcg(None, &costs, &[], &FallbackPolicy::default()).unwrap();

        assert_eq!(overhead.grams_per_month, 509.0);
        assert_eq!(overhead.pcg, 1.0);
        assert!(overhead.used_default_volume);
    }

    #[test]
    fn test_zero_volume_is_configuration_error() {
        let config = GlobalConfig {
            grams_produced_per_month: 0.0,
            ..GlobalConfig::default()
        };
        let result = calculate_pcg(Some(&config), &[], &[], &FallbackPolicy::default());
        assert!(matches!(result, Err(CoreError::Configuration { .. })));
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let costs = vec![fixed("refund", -10.0, true)];
        let result = calculate_pcg(
            Some(&GlobalConfig::default()),
            &costs,
            &[],
            &FallbackPolicy::default(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_no_costs_means_zero_pcg() {
        let overhead =
            calculate_pcg(Some(&GlobalConfig::default()), &[], &[], &FallbackPolicy::default())
                .unwrap();
        assert_eq!(overhead.pcg, 0.0);
    }
}
