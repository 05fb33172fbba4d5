//! The governing DSC engine.
//!
//! All user-facing operations (deposit, mint, burn, redeem, liquidate)
//! enter here. The engine exclusively owns the collateral ledger and debt
//! map, holds custody of deposited collateral on the per-asset token
//! ledgers, and is the sole authorized mint/burn caller on the DSC ledger.
//!
//! Every operation executes as one atomic unit: callers observe either the
//! pre-call or the fully-post-call state. Any error restores the pre-call
//! state exactly and is surfaced verbatim — oracle failures are never
//! substituted with a fallback price.

pub mod health;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::account::AccountId;
use crate::core::asset::{AssetId, AssetParams, AssetRegistry};
use crate::core::config::{DustPolicy, EngineConfig};
use crate::core::ledger::CollateralLedger;
use crate::core::token::TokenLedger;
use crate::error::{Error, Result};
use crate::liquidation::{self, LiquidationEvent, LiquidationLog, LiquidationPlan};
use crate::oracle::adapter::{amount_at_price, value_at_price, OracleAdapter};
use crate::oracle::source::{PriceSource, SequencerOracle};
use crate::utils::constants::{BPS_DIVISOR, DSC_DECIMALS, DSC_SYMBOL, WAD};
use crate::utils::math::{format_usd, mul_div_up, safe_add};

use health::{health_factor, HealthFactor};

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// The engine's complete mutable state. Cloneable and serializable: cloned
/// as the rollback checkpoint of every operation, serialized for snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    pub(crate) engine_account: AccountId,
    pub(crate) config: EngineConfig,
    pub(crate) assets: AssetRegistry,
    pub(crate) ledger: CollateralLedger,
    pub(crate) dsc: TokenLedger,
    pub(crate) collateral_tokens: BTreeMap<AssetId, TokenLedger>,
    pub(crate) liquidations: LiquidationLog,
}

/// Aggregate engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatistics {
    /// Users with a position or debt
    pub user_count: usize,
    /// Total outstanding DSC debt
    pub total_debt: u128,
    /// Total collateral value across all users, USD WAD
    pub total_collateral_value_usd: u128,
    /// Users currently below the minimum health factor
    pub unsafe_users: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DSC ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// The collateralized-debt engine governing the DSC pegged unit
#[derive(Debug)]
pub struct DscEngine {
    state: EngineState,
    oracle: OracleAdapter,
    /// Name of the operation currently in flight, if any. A single logical
    /// operation must finish its state mutations before the engine accepts
    /// another entry.
    in_flight: Option<&'static str>,
}

impl DscEngine {
    /// Create a new engine.
    ///
    /// `engine_account` is the engine's own identity: custodian of
    /// deposited collateral and sole authorized mint/burn caller on the
    /// DSC ledger.
    pub fn new(
        config: EngineConfig,
        engine_account: AccountId,
        price_source: Box<dyn PriceSource>,
    ) -> Result<Self> {
        config.validate()?;
        let dsc = TokenLedger::new(DSC_SYMBOL, DSC_DECIMALS).with_controller(engine_account);
        Ok(Self {
            state: EngineState {
                engine_account,
                config,
                assets: AssetRegistry::new(),
                ledger: CollateralLedger::new(),
                dsc,
                collateral_tokens: BTreeMap::new(),
                liquidations: LiquidationLog::new(),
            },
            oracle: OracleAdapter::new(price_source),
            in_flight: None,
        })
    }

    /// Attach a sequencer liveness signal. Price reads are refused while
    /// it reports down and for the configured grace period after recovery.
    pub fn with_sequencer(mut self, sequencer: Box<dyn SequencerOracle>) -> Self {
        let grace = self.state.config.sequencer_grace_secs;
        self.oracle = self.oracle.with_sequencer(sequencer, grace);
        self
    }

    /// Rebuild an engine from a persisted state snapshot
    pub fn from_state(state: EngineState, price_source: Box<dyn PriceSource>) -> Result<Self> {
        state.config.validate()?;
        Ok(Self {
            state,
            oracle: OracleAdapter::new(price_source),
            in_flight: None,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The engine's own account identity
    pub fn account_id(&self) -> AccountId {
        self.state.engine_account
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    /// Complete engine state, for persistence
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The DSC token ledger
    pub fn dsc(&self) -> &TokenLedger {
        &self.state.dsc
    }

    /// Mutable DSC ledger access for holder-side transfers. Mint and burn
    /// remain gated by the engine's controller capability.
    pub fn dsc_mut(&mut self) -> &mut TokenLedger {
        &mut self.state.dsc
    }

    /// A collateral asset's token ledger
    pub fn collateral_token(&self, asset: &AssetId) -> Result<&TokenLedger> {
        self.state
            .collateral_tokens
            .get(asset)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    /// Mutable collateral ledger access for holder-side transfers and
    /// issuer mints
    pub fn collateral_token_mut(&mut self, asset: &AssetId) -> Result<&mut TokenLedger> {
        self.state
            .collateral_tokens
            .get_mut(asset)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    /// Deposited amount for a (user, asset) pair
    pub fn position(&self, user: &AccountId, asset: &AssetId) -> u128 {
        self.state.ledger.position(user, asset)
    }

    /// Outstanding DSC debt of a user
    pub fn debt_of(&self, user: &AccountId) -> u128 {
        self.state.ledger.debt_of(user)
    }

    /// Liquidation history and counters
    pub fn liquidations(&self) -> &LiquidationLog {
        &self.state.liquidations
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALUATION VIEWS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Sum of the USD value of all of a user's positions, each asset
    /// counted at most once, at fresh validated prices
    pub fn total_collateral_value_usd(&self, user: &AccountId, now: u64) -> Result<u128> {
        let mut total = 0u128;
        for (asset_id, amount) in self.state.ledger.positions_of(user) {
            if amount == 0 {
                continue;
            }
            let params = self.state.assets.get(asset_id)?;
            let value = self.oracle.value_in_usd(params, amount, now)?;
            total = safe_add(total, value)?;
        }
        Ok(total)
    }

    /// A user's current health factor at fresh validated prices
    pub fn health_factor_of(&self, user: &AccountId, now: u64) -> Result<HealthFactor> {
        let collateral_value = self.total_collateral_value_usd(user, now)?;
        health_factor(
            collateral_value,
            self.state.ledger.debt_of(user),
            self.state.config.liquidation_threshold_bps,
        )
    }

    /// Amount of an asset redeemable without breaching the minimum health
    /// factor: the algebraic maximum, verified by trial re-evaluation.
    pub fn withdrawable_amount(&self, user: &AccountId, asset: &AssetId, now: u64) -> Result<u128> {
        let position = self.state.ledger.position(user, asset);
        if position == 0 {
            return Ok(0);
        }
        let debt = self.state.ledger.debt_of(user);
        if debt == 0 {
            return Ok(position);
        }

        let params = self.state.assets.get(asset)?.clone();
        let price = self.oracle.price_wad(&params, now)?;
        let total_value = self.total_collateral_value_usd(user, now)?;

        // Collateral value that must remain for hf >= minimum
        let config = &self.state.config;
        let adjusted_needed = mul_div_up(debt, config.min_health_factor_wad, WAD)?;
        let value_needed = mul_div_up(
            adjusted_needed,
            BPS_DIVISOR as u128,
            config.liquidation_threshold_bps as u128,
        )?;
        let excess = total_value.saturating_sub(value_needed);
        if excess == 0 {
            return Ok(0);
        }

        let mut candidate = amount_at_price(price, excess, params.token_decimals)?.min(position);

        // Integer rounding can overshoot by one unit; step down until the
        // trial position is safe.
        for _ in 0..2 {
            if candidate == 0 {
                break;
            }
            let removed = value_at_price(price, candidate, params.token_decimals)?;
            let trial = health_factor(
                total_value.saturating_sub(removed),
                debt,
                config.liquidation_threshold_bps,
            )?;
            if trial.is_below(config.min_health_factor_wad) {
                candidate -= 1;
            } else {
                return Ok(candidate);
            }
        }
        Ok(0)
    }

    /// Aggregate statistics at fresh validated prices
    pub fn statistics(&self, now: u64) -> Result<EngineStatistics> {
        let users: Vec<AccountId> = self.state.ledger.users().copied().collect();
        let mut total_value = 0u128;
        let mut unsafe_users = 0usize;

        for user in &users {
            total_value = safe_add(total_value, self.total_collateral_value_usd(user, now)?)?;
            if self
                .health_factor_of(user, now)?
                .is_below(self.state.config.min_health_factor_wad)
            {
                unsafe_users += 1;
            }
        }

        Ok(EngineStatistics {
            user_count: users.len(),
            total_debt: self.state.ledger.total_debt(),
            total_collateral_value_usd: total_value,
            unsafe_users,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ADMINISTRATIVE SURFACE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Admit a new collateral asset. The asset's fungible ledger is
    /// created with `issuer` as its authorized mint/burn identity.
    /// Duplicate identifiers are rejected.
    pub fn register_asset(&mut self, params: AssetParams, issuer: AccountId) -> Result<()> {
        let token =
            TokenLedger::new(params.symbol.clone(), params.token_decimals).with_controller(issuer);
        self.register_asset_with_ledger(params, token)
    }

    /// Admit a new collateral asset backed by a caller-provided ledger
    /// (used to model deviant assets, e.g. fee-on-transfer).
    pub fn register_asset_with_ledger(
        &mut self,
        params: AssetParams,
        token: TokenLedger,
    ) -> Result<()> {
        if token.decimals() != params.token_decimals {
            return Err(Error::InvalidParameter {
                name: "token".into(),
                reason: format!(
                    "ledger decimals {} do not match asset decimals {}",
                    token.decimals(),
                    params.token_decimals
                ),
            });
        }
        self.state.assets.register(params.clone())?;
        self.state.collateral_tokens.insert(params.id.clone(), token);
        tracing::info!(asset = %params.id, decimals = params.token_decimals, "asset registered");
        Ok(())
    }

    /// Update the staleness timeout for a registered asset
    pub fn set_stale_after(&mut self, asset: &AssetId, secs: u64) -> Result<()> {
        self.state.assets.set_stale_after(asset, secs)
    }

    /// Update the liquidation bonus
    pub fn set_liquidation_bonus_bps(&mut self, bps: u64) -> Result<()> {
        let mut config = self.state.config.clone();
        config.liquidation_bonus_bps = bps;
        config.validate()?;
        self.state.config = config;
        Ok(())
    }

    /// Update the minimum-position policy
    pub fn set_dust_policy(&mut self, policy: DustPolicy) {
        self.state.config.dust_policy = policy;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // USER OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit collateral. Returns the amount actually received by the
    /// engine (the measured balance delta, not the nominal amount).
    pub fn deposit_collateral(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: u128,
        now: u64,
    ) -> Result<u128> {
        self.with_atomic("deposit_collateral", |engine| {
            engine.deposit_inner(user, asset, amount, now)
        })
    }

    /// Mint DSC against deposited collateral
    pub fn mint_dsc(&mut self, user: AccountId, amount: u128, now: u64) -> Result<()> {
        self.with_atomic("mint_dsc", |engine| engine.mint_inner(user, amount, now))
    }

    /// Deposit collateral and mint DSC in one atomic operation
    pub fn deposit_and_mint(
        &mut self,
        user: AccountId,
        asset: AssetId,
        collateral_amount: u128,
        dsc_amount: u128,
        now: u64,
    ) -> Result<u128> {
        self.with_atomic("deposit_and_mint", |engine| {
            let received = engine.deposit_inner(user, asset, collateral_amount, now)?;
            engine.mint_inner(user, dsc_amount, now)?;
            Ok(received)
        })
    }

    /// Burn DSC, reducing the caller's own debt
    pub fn burn_dsc(&mut self, user: AccountId, amount: u128, now: u64) -> Result<()> {
        self.with_atomic("burn_dsc", |engine| engine.burn_inner(user, amount, now))
    }

    /// Redeem deposited collateral, keeping the caller safe
    pub fn redeem_collateral(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: u128,
        now: u64,
    ) -> Result<()> {
        self.with_atomic("redeem_collateral", |engine| {
            engine.redeem_inner(user, asset, amount, now)
        })
    }

    /// Burn DSC and redeem collateral in one atomic operation
    pub fn redeem_for_dsc(
        &mut self,
        user: AccountId,
        asset: AssetId,
        collateral_amount: u128,
        dsc_amount: u128,
        now: u64,
    ) -> Result<()> {
        self.with_atomic("redeem_for_dsc", |engine| {
            engine.burn_inner(user, dsc_amount, now)?;
            engine.redeem_inner(user, asset, collateral_amount, now)
        })
    }

    /// Liquidate an unsafe user: repay `debt_to_cover` of their debt from
    /// the caller's DSC balance in exchange for a bonus-adjusted slice of
    /// their collateral. The caller's own health factor is irrelevant.
    pub fn liquidate(
        &mut self,
        liquidator: AccountId,
        target: AccountId,
        asset: AssetId,
        debt_to_cover: u128,
        now: u64,
    ) -> Result<LiquidationPlan> {
        self.with_atomic("liquidate", |engine| {
            engine.liquidate_inner(liquidator, target, asset, debt_to_cover, now)
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OPERATION INTERNALS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run a mutating operation as one atomic unit: re-entrancy is
    /// rejected, and on any error the pre-call state is restored exactly.
    /// The in-flight flag is released on every exit path.
    fn with_atomic<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if let Some(in_flight) = self.in_flight {
            return Err(Error::Reentrant {
                operation: in_flight.to_string(),
            });
        }
        self.in_flight = Some(operation);
        let checkpoint = self.state.clone();

        let result = f(self);

        self.in_flight = None;
        if let Err(error) = &result {
            self.state = checkpoint;
            tracing::warn!(operation, %error, "operation rejected, state rolled back");
        }
        result
    }

    fn deposit_inner(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: u128,
        now: u64,
    ) -> Result<u128> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.state.assets.get(&asset)?;

        let engine_account = self.state.engine_account;
        let token = self
            .state
            .collateral_tokens
            .get_mut(&asset)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))?;

        // Record the verified post-transfer balance delta, not the nominal
        // amount: an asset that deducts in transit credits only what the
        // engine actually received.
        let balance_before = token.balance_of(&engine_account);
        token.transfer(user, engine_account, amount)?;
        let received = token.balance_of(&engine_account) - balance_before;
        if received == 0 {
            return Err(Error::InvalidAmount);
        }

        self.state
            .ledger
            .credit_collateral(user, asset.clone(), received)?;

        let policy = self.state.config.dust_policy;
        if policy.applies_at_deposit() {
            let value = self.total_collateral_value_usd(&user, now)?;
            if value < policy.floor_usd_wad {
                return Err(Error::PositionBelowMinimum {
                    value_usd: value,
                    floor_usd: policy.floor_usd_wad,
                });
            }
        }

        tracing::info!(
            %user,
            %asset,
            amount,
            received,
            "collateral deposited"
        );
        Ok(received)
    }

    fn mint_inner(&mut self, user: AccountId, amount: u128, now: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        // Check before any mutation: prospective debt against fresh prices
        let prospective_debt = safe_add(self.state.ledger.debt_of(&user), amount)?;
        let collateral_value = self.total_collateral_value_usd(&user, now)?;

        let config = &self.state.config;
        let policy = config.dust_policy;
        if policy.applies_at_mint() && collateral_value < policy.floor_usd_wad {
            return Err(Error::PositionBelowMinimum {
                value_usd: collateral_value,
                floor_usd: policy.floor_usd_wad,
            });
        }

        let hf = health_factor(
            collateral_value,
            prospective_debt,
            config.liquidation_threshold_bps,
        )?;
        if hf.is_below(config.min_health_factor_wad) {
            return Err(Error::HealthFactorBroken {
                health_factor: hf.wad(),
                minimum: config.min_health_factor_wad,
            });
        }

        let engine_account = self.state.engine_account;
        self.state.ledger.add_debt(user, amount)?;
        self.state.dsc.mint(&engine_account, user, amount)?;

        tracing::info!(
            %user,
            amount,
            collateral_value = %format_usd(collateral_value),
            health_factor = %hf,
            "DSC minted"
        );
        Ok(())
    }

    fn burn_inner(&mut self, user: AccountId, amount: u128, now: u64) -> Result<()> {
        let _ = now; // burn needs no valuation: reducing debt cannot lower a health factor
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let outstanding = self.state.ledger.debt_of(&user);
        if amount > outstanding {
            return Err(Error::InsufficientDebt {
                requested: amount,
                outstanding,
            });
        }

        let engine_account = self.state.engine_account;
        self.state.ledger.sub_debt(&user, amount)?;
        self.state.dsc.burn(&engine_account, user, amount)?;

        tracing::info!(%user, amount, "DSC burned");
        Ok(())
    }

    fn redeem_inner(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: u128,
        now: u64,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let params = self.state.assets.get(&asset)?.clone();
        let position = self.state.ledger.position(&user, &asset);
        if amount > position {
            return Err(Error::InsufficientCollateral {
                required: amount,
                available: position,
            });
        }

        // Check before any mutation: trial-subtract and re-evaluate
        let debt = self.state.ledger.debt_of(&user);
        if debt > 0 {
            let total_value = self.total_collateral_value_usd(&user, now)?;
            let removed = self.oracle.value_in_usd(&params, amount, now)?;
            let config = &self.state.config;
            let hf = health_factor(
                total_value.saturating_sub(removed),
                debt,
                config.liquidation_threshold_bps,
            )?;
            if hf.is_below(config.min_health_factor_wad) {
                return Err(Error::HealthFactorBroken {
                    health_factor: hf.wad(),
                    minimum: config.min_health_factor_wad,
                });
            }
        }

        let engine_account = self.state.engine_account;
        self.state.ledger.debit_collateral(&user, &asset, amount)?;
        let token = self
            .state
            .collateral_tokens
            .get_mut(&asset)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))?;
        token.transfer(engine_account, user, amount)?;

        tracing::info!(%user, %asset, amount, "collateral redeemed");
        Ok(())
    }

    fn liquidate_inner(
        &mut self,
        liquidator: AccountId,
        target: AccountId,
        asset: AssetId,
        debt_to_cover: u128,
        now: u64,
    ) -> Result<LiquidationPlan> {
        if debt_to_cover == 0 {
            return Err(Error::InvalidAmount);
        }

        let outstanding = self.state.ledger.debt_of(&target);
        if debt_to_cover > outstanding {
            return Err(Error::InsufficientDebt {
                requested: debt_to_cover,
                outstanding,
            });
        }

        // Eligibility and amounts come from current state on every
        // attempt; a stale caller-side snapshot cannot block a later one.
        let health_before = self.health_factor_of(&target, now)?;
        let config = &self.state.config;
        if !health_before.is_below(config.min_health_factor_wad) {
            return Err(Error::HealthFactorOk {
                health_factor: health_before.wad(),
            });
        }

        let params = self.state.assets.get(&asset)?.clone();
        let price = self.oracle.price_wad(&params, now)?;
        let available = self.state.ledger.position(&target, &asset);
        let plan = liquidation::plan(
            debt_to_cover,
            price,
            params.token_decimals,
            config.liquidation_bonus_bps,
            available,
        )?;
        if plan.collateral_seized == 0 {
            return Err(Error::InsufficientCollateral {
                required: amount_at_price(price, debt_to_cover, params.token_decimals)?,
                available,
            });
        }

        // Seize collateral from the target and pay it to the caller
        let engine_account = self.state.engine_account;
        self.state
            .ledger
            .debit_collateral(&target, &asset, plan.collateral_seized)?;
        let token = self
            .state
            .collateral_tokens
            .get_mut(&asset)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))?;
        token.transfer(engine_account, liquidator, plan.collateral_seized)?;

        // Burn the covered debt from the caller's balance: the engine
        // does not create funds
        self.state.ledger.sub_debt(&target, debt_to_cover)?;
        self.state.dsc.burn(&engine_account, liquidator, debt_to_cover)?;

        // The target must come out no worse than it went in
        let health_after = self.health_factor_of(&target, now)?;
        if health_after < health_before {
            return Err(Error::HealthFactorBroken {
                health_factor: health_after.wad(),
                minimum: health_before.wad(),
            });
        }

        self.state.liquidations.record(LiquidationEvent {
            target,
            liquidator,
            asset: asset.clone(),
            debt_covered: debt_to_cover,
            collateral_seized: plan.collateral_seized,
            clamped: plan.clamped,
            price_wad: price,
            health_before,
            health_after,
            timestamp: now,
        });

        tracing::info!(
            %target,
            %liquidator,
            %asset,
            debt_covered = %format_usd(debt_to_cover),
            collateral_seized = plan.collateral_seized,
            clamped = plan.clamped,
            health_before = %health_before,
            health_after = %health_after,
            "position liquidated"
        );
        Ok(plan)
    }
}
