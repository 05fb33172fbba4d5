//! Fungible token ledgers.
//!
//! One `TokenLedger` instance backs the DSC pegged unit and one backs each
//! collateral asset. Mint and burn are gated by a single authorized
//! controller identity fixed at construction — the engine for DSC, the
//! asset's issuer for collateral — rather than by any inheritance-style
//! access modifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::account::AccountId;
use crate::error::{Error, Result};
use crate::utils::math::{bps_of, safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Type of token operation for event logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenOperation {
    /// Minting new units
    Mint,
    /// Burning units
    Burn,
    /// Transfer between accounts
    Transfer,
}

/// Record of a token operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEvent {
    /// Type of operation
    pub operation: TokenOperation,
    /// Sender (None for mint)
    pub from: Option<AccountId>,
    /// Recipient (None for burn)
    pub to: Option<AccountId>,
    /// Amount in the token's smallest unit
    pub amount: u128,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// A fungible balance ledger with capability-gated issuance.
///
/// Transfers have no implicit fee by default. `transfer_fee_bps` exists so
/// tests can model deviant fee-on-transfer collateral; the engine records
/// measured balance deltas on deposit precisely to bound that deviation.
/// The DSC ledger itself must keep the fee at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Token symbol
    symbol: String,
    /// Decimal places
    decimals: u32,
    /// Sole identity allowed to mint and burn; `None` freezes issuance
    controller: Option<AccountId>,
    /// Fee deducted in transit, in basis points (deviant assets only)
    transfer_fee_bps: u64,
    /// Total supply in the smallest unit
    total_supply: u128,
    /// Balances by account
    balances: BTreeMap<AccountId, u128>,
    /// Recent events
    events: Vec<TokenEvent>,
    /// Maximum events to keep in memory
    max_events: usize,
}

impl TokenLedger {
    /// Create a new ledger with no authorized issuer
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            controller: None,
            transfer_fee_bps: 0,
            total_supply: 0,
            balances: BTreeMap::new(),
            events: Vec::new(),
            max_events: 1000,
        }
    }

    /// Set the sole identity authorized to mint and burn
    pub fn with_controller(mut self, controller: AccountId) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Model a fee-on-transfer asset (tests of the measured-delta path)
    pub fn with_transfer_fee_bps(mut self, fee_bps: u64) -> Self {
        self.transfer_fee_bps = fee_bps;
        self
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Decimal places
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Total supply
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Balance of an account
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ISSUANCE
    // ═══════════════════════════════════════════════════════════════════════════

    fn ensure_controller(&self, caller: &AccountId) -> Result<()> {
        match self.controller {
            Some(ref controller) if controller == caller => Ok(()),
            _ => Err(Error::Unauthorized(format!(
                "{} may not mint or burn {}",
                caller, self.symbol
            ))),
        }
    }

    /// Mint new units to an account; caller must be the controller
    pub fn mint(&mut self, caller: &AccountId, to: AccountId, amount: u128) -> Result<()> {
        self.ensure_controller(caller)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let new_supply = safe_add(self.total_supply, amount)?;
        let new_balance = safe_add(self.balance_of(&to), amount)?;

        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;

        self.add_event(TokenEvent {
            operation: TokenOperation::Mint,
            from: None,
            to: Some(to),
            amount,
        });
        Ok(())
    }

    /// Burn units from an account; caller must be the controller
    pub fn burn(&mut self, caller: &AccountId, from: AccountId, amount: u128) -> Result<()> {
        self.ensure_controller(caller)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                token: self.symbol.clone(),
                required: amount,
                available: balance,
            });
        }

        self.set_balance(from, balance - amount);
        self.total_supply = safe_sub(self.total_supply, amount)?;

        self.add_event(TokenEvent {
            operation: TokenOperation::Burn,
            from: Some(from),
            to: None,
            amount,
        });
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSFER
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transfer units between accounts. If the ledger models a
    /// fee-on-transfer asset, the fee is destroyed in transit and the
    /// recipient is credited with the net amount.
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        if from == to {
            return Ok(());
        }

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                token: self.symbol.clone(),
                required: amount,
                available: from_balance,
            });
        }

        let fee = if self.transfer_fee_bps > 0 {
            bps_of(amount, self.transfer_fee_bps)?
        } else {
            0
        };
        let net = safe_sub(amount, fee)?;

        self.set_balance(from, from_balance - amount);
        let new_to_balance = safe_add(self.balance_of(&to), net)?;
        self.set_balance(to, new_to_balance);
        self.total_supply = safe_sub(self.total_supply, fee)?;

        self.add_event(TokenEvent {
            operation: TokenOperation::Transfer,
            from: Some(from),
            to: Some(to),
            amount: net,
        });
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Number of accounts with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Recent events
    pub fn recent_events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Verify supply invariant (total supply == sum of all balances)
    pub fn verify_supply_invariant(&self) -> bool {
        let sum: u128 = self.balances.values().sum();
        sum == self.total_supply
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    fn set_balance(&mut self, account: AccountId, balance: u128) {
        if balance == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    fn add_event(&mut self, event: TokenEvent) {
        self.events.push(event);
        if self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(0..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AccountId {
        AccountId::new([0xee; 32])
    }

    fn alice() -> AccountId {
        AccountId::new([0x01; 32])
    }

    fn bob() -> AccountId {
        AccountId::new([0x02; 32])
    }

    fn dsc() -> TokenLedger {
        TokenLedger::new("DSC", 18).with_controller(engine())
    }

    #[test]
    fn test_mint_requires_controller() {
        let mut token = dsc();

        let err = token.mint(&alice(), alice(), 100).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));

        token.mint(&engine(), alice(), 100).unwrap();
        assert_eq!(token.balance_of(&alice()), 100);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn test_no_controller_freezes_issuance() {
        let mut token = TokenLedger::new("WETH", 18);
        assert!(token.mint(&engine(), alice(), 100).is_err());
    }

    #[test]
    fn test_burn() {
        let mut token = dsc();
        token.mint(&engine(), alice(), 100).unwrap();
        token.burn(&engine(), alice(), 40).unwrap();

        assert_eq!(token.balance_of(&alice()), 60);
        assert_eq!(token.total_supply(), 60);
    }

    #[test]
    fn test_burn_insufficient_balance() {
        let mut token = dsc();
        token.mint(&engine(), alice(), 100).unwrap();

        let err = token.burn(&engine(), alice(), 200).unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));
    }

    #[test]
    fn test_transfer() {
        let mut token = dsc();
        token.mint(&engine(), alice(), 100).unwrap();
        token.transfer(alice(), bob(), 30).unwrap();

        assert_eq!(token.balance_of(&alice()), 70);
        assert_eq!(token.balance_of(&bob()), 30);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn test_transfer_zero_rejected() {
        let mut token = dsc();
        token.mint(&engine(), alice(), 100).unwrap();
        assert_eq!(token.transfer(alice(), bob(), 0), Err(Error::InvalidAmount));
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut token = dsc();
        token.mint(&engine(), alice(), 100).unwrap();
        token.transfer(alice(), alice(), 50).unwrap();
        assert_eq!(token.balance_of(&alice()), 100);
    }

    #[test]
    fn test_fee_on_transfer_reduces_received() {
        // 1% fee in transit
        let mut token = TokenLedger::new("FEE", 18)
            .with_controller(engine())
            .with_transfer_fee_bps(100);
        token.mint(&engine(), alice(), 10_000).unwrap();

        token.transfer(alice(), bob(), 10_000).unwrap();
        assert_eq!(token.balance_of(&bob()), 9_900);
        assert_eq!(token.total_supply(), 9_900);
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_supply_invariant() {
        let mut token = dsc();
        token.mint(&engine(), alice(), 1_000).unwrap();
        token.mint(&engine(), bob(), 500).unwrap();
        token.transfer(alice(), bob(), 200).unwrap();
        token.burn(&engine(), bob(), 100).unwrap();

        assert!(token.verify_supply_invariant());
        assert_eq!(token.holder_count(), 2);
    }
}
