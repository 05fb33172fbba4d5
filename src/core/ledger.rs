//! Collateral and debt bookkeeping.
//!
//! Per-user, per-asset deposited amounts and per-user outstanding DSC
//! debt. The maps are exclusively owned and mutated by the engine: all
//! mutators are crate-private, and invariants (health factor, dust floors)
//! are enforced by the engine before it commits changes here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::error::{Error, Result};
use crate::utils::math::safe_add;

/// Per-user collateral positions and debt balances
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateralLedger {
    /// Deposited amounts: user → asset → amount in asset native units.
    /// Zero is a valid resting state; entries are never removed.
    positions: BTreeMap<AccountId, BTreeMap<AssetId, u128>>,
    /// Outstanding DSC debt per user, in the peg's smallest unit
    debt: BTreeMap<AccountId, u128>,
}

impl CollateralLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposited amount for a (user, asset) pair
    pub fn position(&self, user: &AccountId, asset: &AssetId) -> u128 {
        self.positions
            .get(user)
            .and_then(|by_asset| by_asset.get(asset))
            .copied()
            .unwrap_or(0)
    }

    /// All positions of a user, in asset identifier order
    pub fn positions_of(&self, user: &AccountId) -> impl Iterator<Item = (&AssetId, u128)> {
        self.positions
            .get(user)
            .into_iter()
            .flat_map(|by_asset| by_asset.iter().map(|(id, amount)| (id, *amount)))
    }

    /// Outstanding debt of a user
    pub fn debt_of(&self, user: &AccountId) -> u128 {
        self.debt.get(user).copied().unwrap_or(0)
    }

    /// All users that have ever held a position or debt
    pub fn users(&self) -> impl Iterator<Item = &AccountId> {
        let mut seen: Vec<&AccountId> = self.positions.keys().chain(self.debt.keys()).collect();
        seen.sort();
        seen.dedup();
        seen.into_iter()
    }

    /// Sum of all outstanding debt
    pub fn total_debt(&self) -> u128 {
        self.debt.values().sum()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATIONS (engine only)
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn credit_collateral(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: u128,
    ) -> Result<()> {
        let position = self.positions.entry(user).or_default().entry(asset).or_insert(0);
        *position = safe_add(*position, amount)?;
        Ok(())
    }

    pub(crate) fn debit_collateral(
        &mut self,
        user: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<()> {
        let available = self.position(user, asset);
        if available < amount {
            return Err(Error::InsufficientCollateral {
                required: amount,
                available,
            });
        }
        if let Some(position) = self
            .positions
            .get_mut(user)
            .and_then(|by_asset| by_asset.get_mut(asset))
        {
            *position -= amount;
        }
        Ok(())
    }

    pub(crate) fn add_debt(&mut self, user: AccountId, amount: u128) -> Result<()> {
        let debt = self.debt.entry(user).or_insert(0);
        *debt = safe_add(*debt, amount)?;
        Ok(())
    }

    pub(crate) fn sub_debt(&mut self, user: &AccountId, amount: u128) -> Result<()> {
        let outstanding = self.debt_of(user);
        if outstanding < amount {
            return Err(Error::InsufficientDebt {
                requested: amount,
                outstanding,
            });
        }
        if let Some(debt) = self.debt.get_mut(user) {
            *debt -= amount;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new([0x01; 32])
    }

    fn weth() -> AssetId {
        AssetId::new("WETH")
    }

    #[test]
    fn test_credit_and_debit() {
        let mut ledger = CollateralLedger::new();
        ledger.credit_collateral(alice(), weth(), 100).unwrap();
        assert_eq!(ledger.position(&alice(), &weth()), 100);

        ledger.debit_collateral(&alice(), &weth(), 60).unwrap();
        assert_eq!(ledger.position(&alice(), &weth()), 40);
    }

    #[test]
    fn test_debit_beyond_position_fails() {
        let mut ledger = CollateralLedger::new();
        ledger.credit_collateral(alice(), weth(), 100).unwrap();

        let err = ledger.debit_collateral(&alice(), &weth(), 101).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientCollateral {
                required: 101,
                available: 100
            }
        );
        // Failed debit left the position untouched
        assert_eq!(ledger.position(&alice(), &weth()), 100);
    }

    #[test]
    fn test_zero_is_a_valid_resting_state() {
        let mut ledger = CollateralLedger::new();
        ledger.credit_collateral(alice(), weth(), 100).unwrap();
        ledger.debit_collateral(&alice(), &weth(), 100).unwrap();

        assert_eq!(ledger.position(&alice(), &weth()), 0);
        assert_eq!(ledger.positions_of(&alice()).count(), 1);
    }

    #[test]
    fn test_debt_tracking() {
        let mut ledger = CollateralLedger::new();
        ledger.add_debt(alice(), 500).unwrap();
        assert_eq!(ledger.debt_of(&alice()), 500);

        ledger.sub_debt(&alice(), 200).unwrap();
        assert_eq!(ledger.debt_of(&alice()), 300);

        let err = ledger.sub_debt(&alice(), 400).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientDebt {
                requested: 400,
                outstanding: 300
            }
        );
    }

    #[test]
    fn test_total_debt() {
        let mut ledger = CollateralLedger::new();
        ledger.add_debt(alice(), 500).unwrap();
        ledger.add_debt(AccountId::new([0x02; 32]), 300).unwrap();
        assert_eq!(ledger.total_debt(), 800);
    }
}
