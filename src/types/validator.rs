use cosmwasm_std::{Decimal, StdError, StdResult, Uint128};
use cw_storage_plus::Map;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const VALIDATORS: Map<&str, Validator> = Map::new("validators");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct Validator {
    pub operator_address: String,
    /// Bonded tokens backing the delegator share pool
    pub tokens: Uint128,
    /// Total shares issued to this validator's delegators
    pub delegator_shares: Decimal,
    /// Shares held through liquid staking providers
    pub liquid_shares: Decimal,
    /// Shares from the validator's own self bond
    pub validator_bond_shares: Decimal,
}

impl Validator {
    pub fn new(operator_address: String) -> Self {
        Validator {
            operator_address,
            tokens: Uint128::zero(),
            delegator_shares: Decimal::zero(),
            liquid_shares: Decimal::zero(),
            validator_bond_shares: Decimal::zero(),
        }
    }

    /// Token value of a share quantity at the validator's current exchange
    /// rate, truncated toward zero.
    pub fn tokens_from_shares(&self, shares: Decimal) -> StdResult<Uint128> {
        if self.delegator_shares.is_zero() {
            return Err(StdError::generic_err(
                "validator has no delegator shares",
            ));
        }

        // shares * tokens / delegator_shares on the raw fixed-point
        // representation, so the division truncates exactly once
        Ok(shares
            .atomics()
            .multiply_ratio(self.tokens, self.delegator_shares.atomics()))
    }
}
