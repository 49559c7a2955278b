use cosmwasm_std::{Addr, Decimal, Uint128};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct InstantiateMsg {
    /// Defaults to the instantiating account
    pub admin: Option<String>,
    pub staking_module: String,
    pub global_liquid_staking_cap: Decimal,
    pub validator_liquid_staking_cap: Decimal,
    /// None disables the validator bond cap
    pub validator_bond_factor: Option<Decimal>,
    pub unbonding_period: u64,
    pub liquid_staker_address_length: u32,
    pub bonded_pool_address: String,
    pub staking_denom: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    // validator/delegation record sync from the staking module
    SetValidator {
        address: String,
        tokens: Uint128,
        delegator_shares: Decimal,
    },
    SetDelegation {
        delegator: String,
        validator: String,
        shares: Decimal,
    },
    RemoveDelegation {
        delegator: String,
        validator: String,
    },

    // liquid stake accounting
    IncreaseTotalLiquidStake {
        amount: Uint128,
        shares_already_bonded: bool,
    },
    DecreaseTotalLiquidStake {
        amount: Uint128,
    },
    IncreaseValidatorLiquidShares {
        validator: String,
        shares: Decimal,
        shares_already_bonded: bool,
    },
    DecreaseValidatorLiquidShares {
        validator: String,
        shares: Decimal,
    },
    IncreaseValidatorBondShares {
        validator: String,
        shares: Decimal,
    },
    DecreaseValidatorBond {
        validator: String,
        shares: Decimal,
    },
    // full recount of liquid totals from the delegation set; recovery only
    RefreshTotals {},

    // tokenize share access control, called by delegators for themselves
    DisableTokenizeShares {},
    EnableTokenizeShares {},

    // per-block hook: sweep matured unlocks, advance the index rebuild
    EndBlock {},

    UpdateParams {
        global_liquid_staking_cap: Option<Decimal>,
        validator_liquid_staking_cap: Option<Decimal>,
        unbonding_period: Option<u64>,
    },
    SetValidatorBondFactor {
        factor: Option<Decimal>,
    },
    UpdateStakingModule {
        address: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Config {},
    TotalLiquidStaked {},
    Validator { address: String },
    TokenizeShareLock { address: String },
    AllTokenizeShareLocks {},
    PendingTokenizeShareAuthorizations { completion_time: u64 },
    ValidatorDelegations { validator: String },
    ExceedsGlobalLiquidStakingCap {
        tokens: Uint128,
        shares_already_bonded: bool,
    },
    IndexMigration {},
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct MigrateMsg {}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TokenizeShareLockEntry {
    pub address: String,
    pub status: String,
    pub completion_time: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryResponse {
    Config {
        admin: Addr,
        staking_module: Addr,
        global_liquid_staking_cap: Decimal,
        validator_liquid_staking_cap: Decimal,
        validator_bond_factor: Option<Decimal>,
        unbonding_period: u64,
        liquid_staker_address_length: u32,
        bonded_pool_address: Addr,
        staking_denom: String,
    },
    TotalLiquidStaked {
        tokens: Uint128,
    },
    Validator {
        operator_address: String,
        tokens: Uint128,
        delegator_shares: Decimal,
        liquid_shares: Decimal,
        validator_bond_shares: Decimal,
    },
    TokenizeShareLock {
        status: String,
        completion_time: Option<u64>,
    },
    AllTokenizeShareLocks {
        locks: Vec<TokenizeShareLockEntry>,
    },
    PendingTokenizeShareAuthorizations {
        addresses: Vec<String>,
    },
    ValidatorDelegations {
        delegators: Vec<Addr>,
    },
    ExceedsGlobalLiquidStakingCap {
        exceeds: bool,
    },
    IndexMigration {
        in_progress: bool,
    },
}
