use cosmwasm_std::{Addr, Decimal, StdError, StdResult};
use cw_storage_plus::Item;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CONFIG: Item<Config> = Item::new("config");

#[derive(Serialize, Debug, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Config {
    pub admin: Addr,
    /// Module account allowed to drive ledger mutations and the end-block hook
    pub staking_module: Addr,
    pub global_liquid_staking_cap: Decimal,
    pub validator_liquid_staking_cap: Decimal,
    /// None disables the validator bond cap entirely
    pub validator_bond_factor: Option<Decimal>,
    pub unbonding_period: u64, // seconds
    pub liquid_staker_address_length: u32,
    pub bonded_pool_address: Addr,
    pub staking_denom: String,
}

impl Config {
    pub fn validate(&self) -> StdResult<()> {
        if self.global_liquid_staking_cap > Decimal::one() {
            return Err(StdError::generic_err(
                "global liquid staking cap cannot exceed 1",
            ));
        }
        if self.validator_liquid_staking_cap > Decimal::one() {
            return Err(StdError::generic_err(
                "validator liquid staking cap cannot exceed 1",
            ));
        }
        Ok(())
    }

    /// Checks if the account associated with a delegation is related to
    /// liquid staking.
    ///
    /// ICA accounts and tokenize share record accounts carry 32-byte
    /// payloads, so their rendered addresses have a distinctive length
    /// compared to regular 20-byte accounts. The expected length is part of
    /// the config because it differs per chain.
    pub fn delegator_is_liquid_staker(&self, delegator: &Addr) -> bool {
        delegator.as_str().len() == self.liquid_staker_address_length as usize
    }
}
