//! Property tests for the valuation and liquidation math.

use proptest::prelude::*;

use dsc_engine::engine::health::{health_factor, HealthFactor};
use dsc_engine::liquidation::plan;
use dsc_engine::oracle::adapter::{amount_at_price, value_at_price};
use dsc_engine::prelude::WAD;
use dsc_engine::utils::math::{bps_of, safe_add};

/// Raw 8-decimal oracle prices between $1 and $100,000
fn sane_price_raw() -> impl Strategy<Value = u128> {
    1_00000000u128..=100_000_00000000
}

/// Token amounts up to a billion whole tokens, in the chosen precision
fn amount_and_decimals() -> impl Strategy<Value = (u128, u32)> {
    prop::sample::select(vec![6u32, 8, 18])
        .prop_flat_map(|decimals| (1u128..=10u128.pow(decimals + 9), Just(decimals)))
}

/// Debt values that are either zero or at least one whole dollar
fn debt_usd() -> impl Strategy<Value = u128> {
    prop_oneof![Just(0u128), WAD..=1_000_000_000 * WAD]
}

proptest! {
    /// USD valuation round-trips back to the original token amount within
    /// one smallest unit, for 6-, 8-, and 18-decimal assets.
    #[test]
    fn prop_decimal_round_trip(
        (amount, decimals) in amount_and_decimals(),
        price_raw in sane_price_raw(),
    ) {
        let price_wad = price_raw * 10u128.pow(10);
        let value = value_at_price(price_wad, amount, decimals).unwrap();
        let back = amount_at_price(price_wad, value, decimals).unwrap();

        prop_assert!(back <= amount);
        prop_assert!(amount - back <= 1, "drift {} beyond 1 unit", amount - back);
    }

    /// For a position whose collateral value sits between 100% and 110% of
    /// the covered debt, planning a full liquidation never errors: the
    /// bonus-inclusive seizure clamps to the available amount.
    #[test]
    fn prop_full_liquidation_clamps_in_thin_band(
        debt in WAD..=1_000_000 * WAD,
        price_raw in sane_price_raw(),
        ratio_pct in 100u128..110,
    ) {
        let price_wad = price_raw * 10u128.pow(10);
        let base = amount_at_price(price_wad, debt, 18).unwrap();
        let available = base * ratio_pct / 100;

        let p = plan(debt, price_wad, 18, 1_000, available).unwrap();
        let with_bonus = safe_add(base, bps_of(base, 1_000).unwrap()).unwrap();

        prop_assert!(p.collateral_seized <= available);
        prop_assert!(
            p.collateral_seized == available || p.collateral_seized == with_bonus
        );
    }

    /// More collateral never lowers a health factor.
    #[test]
    fn prop_health_factor_monotonic_in_collateral(
        collateral in 0u128..=1_000_000_000 * WAD,
        extra in 0u128..=1_000_000_000 * WAD,
        debt in debt_usd(),
        threshold_bps in 1u64..=10_000,
    ) {
        let lo = health_factor(collateral, debt, threshold_bps).unwrap();
        let hi = health_factor(collateral + extra, debt, threshold_bps).unwrap();
        prop_assert!(hi >= lo);
    }

    /// Zero debt is unconditionally safe, whatever the collateral.
    #[test]
    fn prop_zero_debt_never_liquidatable(
        collateral in 0u128..=1_000_000_000 * WAD,
        threshold_bps in 1u64..=10_000,
    ) {
        let hf = health_factor(collateral, 0, threshold_bps).unwrap();
        prop_assert_eq!(hf, HealthFactor::MAX);
        prop_assert!(!hf.is_below(u128::MAX - 1));
    }
}
