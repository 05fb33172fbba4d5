//! Liquidation planning and records.
//!
//! Planning is a pure function from fresh state to the amounts a
//! liquidation moves; the engine applies a plan atomically. Eligibility and
//! amounts are recomputed from current state at the start of every attempt,
//! so a stale caller-supplied snapshot can never block a later, larger
//! attempt.

use serde::{Deserialize, Serialize};

use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::engine::health::HealthFactor;
use crate::error::Result;
use crate::oracle::adapter::amount_at_price;
use crate::utils::math::{bps_of, safe_add};

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION PLAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Amounts a liquidation call will move, computed from current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationPlan {
    /// Debt the caller repays, in DSC smallest units (== USD WAD)
    pub debt_to_cover: u128,
    /// Collateral paid to the caller, in asset native units
    pub collateral_seized: u128,
    /// Portion of the seizure attributable to the bonus
    pub bonus_collateral: u128,
    /// Whether the bonus-inclusive amount was clamped to the available
    /// position
    pub clamped: bool,
}

/// Compute the collateral owed for covering `debt_to_cover`, at the given
/// validated price, plus the configured bonus, clamped to the target's
/// deposited amount.
///
/// The clamp is mandatory: without it a fixed bonus makes positions in the
/// 100%–110% collateralization band unliquidatable, because the
/// bonus-inclusive amount always exceeds what the target holds.
pub fn plan(
    debt_to_cover: u128,
    price_wad: u128,
    token_decimals: u32,
    bonus_bps: u64,
    available_collateral: u128,
) -> Result<LiquidationPlan> {
    let base = amount_at_price(price_wad, debt_to_cover, token_decimals)?;
    let bonus = bps_of(base, bonus_bps)?;
    let with_bonus = safe_add(base, bonus)?;

    let clamped = with_bonus > available_collateral;
    let collateral_seized = if clamped {
        available_collateral
    } else {
        with_bonus
    };

    Ok(LiquidationPlan {
        debt_to_cover,
        collateral_seized,
        bonus_collateral: collateral_seized.saturating_sub(base),
        clamped,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Record of an executed liquidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationEvent {
    /// User whose position was liquidated
    pub target: AccountId,
    /// Caller who repaid the debt
    pub liquidator: AccountId,
    /// Collateral asset seized
    pub asset: AssetId,
    /// Debt covered, in DSC smallest units
    pub debt_covered: u128,
    /// Collateral seized, in asset native units
    pub collateral_seized: u128,
    /// Whether the seizure was clamped to the available position
    pub clamped: bool,
    /// Validated price used, in WAD
    pub price_wad: u128,
    /// Target health factor before the call
    pub health_before: HealthFactor,
    /// Target health factor after the call
    pub health_after: HealthFactor,
    /// Operation timestamp
    pub timestamp: u64,
}

/// Bounded history of liquidations plus aggregate counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationLog {
    events: Vec<LiquidationEvent>,
    max_events: usize,
    total_liquidations: u64,
    total_debt_covered: u128,
}

impl Default for LiquidationLog {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            max_events: 1000,
            total_liquidations: 0,
            total_debt_covered: 0,
        }
    }
}

impl LiquidationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an executed liquidation
    pub(crate) fn record(&mut self, event: LiquidationEvent) {
        self.total_liquidations += 1;
        self.total_debt_covered = self.total_debt_covered.saturating_add(event.debt_covered);
        self.events.push(event);
        if self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(0..excess);
        }
    }

    /// Recent liquidation events
    pub fn events(&self) -> &[LiquidationEvent] {
        &self.events
    }

    /// Number of liquidations ever executed
    pub fn total_liquidations(&self) -> u64 {
        self.total_liquidations
    }

    /// Total debt covered across all liquidations
    pub fn total_debt_covered(&self) -> u128 {
        self.total_debt_covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::WAD;

    #[test]
    fn test_plan_adds_bonus() {
        // Cover $1,000 at $1/unit on an 18-decimal asset, 10% bonus
        let plan = plan(1_000 * WAD, WAD, 18, 1_000, 10_000 * WAD).unwrap();
        assert_eq!(plan.collateral_seized, 1_100 * WAD);
        assert_eq!(plan.bonus_collateral, 100 * WAD);
        assert!(!plan.clamped);
    }

    #[test]
    fn test_plan_clamps_to_available() {
        // Target holds $1,050 of collateral against $1,000 of debt:
        // bonus-inclusive 1,100 exceeds the position, so the plan clamps
        let plan = plan(1_000 * WAD, WAD, 18, 1_000, 1_050 * WAD).unwrap();
        assert_eq!(plan.collateral_seized, 1_050 * WAD);
        assert_eq!(plan.bonus_collateral, 50 * WAD);
        assert!(plan.clamped);
    }

    #[test]
    fn test_plan_clamp_below_base() {
        // Position worth less than the repaid debt: everything is seized
        // and the liquidator eats the shortfall
        let plan = plan(1_000 * WAD, WAD, 18, 1_000, 900 * WAD).unwrap();
        assert_eq!(plan.collateral_seized, 900 * WAD);
        assert_eq!(plan.bonus_collateral, 0);
        assert!(plan.clamped);
    }

    #[test]
    fn test_plan_respects_token_decimals() {
        // $30,000/unit on an 8-decimal asset; covering $15,000 with no
        // bonus seizes half a unit
        let plan = plan(15_000 * WAD, 30_000 * WAD, 8, 0, 10_00000000).unwrap();
        assert_eq!(plan.collateral_seized, 50000000);
    }

    #[test]
    fn test_log_counters() {
        let mut log = LiquidationLog::new();
        let event = LiquidationEvent {
            target: AccountId::new([1; 32]),
            liquidator: AccountId::new([2; 32]),
            asset: AssetId::new("WETH"),
            debt_covered: 500,
            collateral_seized: 42,
            clamped: false,
            price_wad: WAD,
            health_before: HealthFactor::from_wad(WAD / 2),
            health_after: HealthFactor::ONE,
            timestamp: 7,
        };
        log.record(event.clone());
        log.record(event);

        assert_eq!(log.total_liquidations(), 2);
        assert_eq!(log.total_debt_covered(), 1_000);
        assert_eq!(log.events().len(), 2);
    }
}
