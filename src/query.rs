use cosmwasm_std::{to_binary, Binary, Deps, StdError, StdResult, Uint128};

use crate::caps::{check_exceeds_global_liquid_staking_cap, get_total_liquid_staked_tokens};
use crate::delegations::get_validator_delegations;
use crate::index_migration::index_migration_in_progress;
use crate::locks::{get_all_tokenize_shares_locks, get_tokenize_shares_lock};
use crate::locks::get_pending_tokenize_share_authorizations;
use crate::msg::QueryResponse;
use crate::types::config::CONFIG;
use crate::types::validator::VALIDATORS;

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;

    to_binary(&QueryResponse::Config {
        admin: config.admin,
        staking_module: config.staking_module,
        global_liquid_staking_cap: config.global_liquid_staking_cap,
        validator_liquid_staking_cap: config.validator_liquid_staking_cap,
        validator_bond_factor: config.validator_bond_factor,
        unbonding_period: config.unbonding_period,
        liquid_staker_address_length: config.liquid_staker_address_length,
        bonded_pool_address: config.bonded_pool_address,
        staking_denom: config.staking_denom,
    })
}

pub fn query_total_liquid_staked(deps: Deps) -> StdResult<Binary> {
    let tokens = get_total_liquid_staked_tokens(deps.storage)?;

    to_binary(&QueryResponse::TotalLiquidStaked { tokens })
}

pub fn query_validator(deps: Deps, address: String) -> StdResult<Binary> {
    let validator = VALIDATORS.load(deps.storage, &address)?;

    to_binary(&QueryResponse::Validator {
        operator_address: validator.operator_address,
        tokens: validator.tokens,
        delegator_shares: validator.delegator_shares,
        liquid_shares: validator.liquid_shares,
        validator_bond_shares: validator.validator_bond_shares,
    })
}

pub fn query_tokenize_share_lock(deps: Deps, address: String) -> StdResult<Binary> {
    let address = deps.api.addr_validate(&address)?;
    let (status, unlock_time) = get_tokenize_shares_lock(deps.storage, &address)?;

    to_binary(&QueryResponse::TokenizeShareLock {
        status: status.as_str().to_string(),
        completion_time: if unlock_time == 0 {
            None
        } else {
            Some(unlock_time)
        },
    })
}

pub fn query_all_tokenize_share_locks(deps: Deps) -> StdResult<Binary> {
    let locks = get_all_tokenize_shares_locks(deps.storage)?;

    to_binary(&QueryResponse::AllTokenizeShareLocks { locks })
}

pub fn query_pending_tokenize_share_authorizations(
    deps: Deps,
    completion_time: u64,
) -> StdResult<Binary> {
    let addresses = get_pending_tokenize_share_authorizations(deps.storage, completion_time)?;

    to_binary(&QueryResponse::PendingTokenizeShareAuthorizations { addresses })
}

pub fn query_validator_delegations(deps: Deps, validator: String) -> StdResult<Binary> {
    let delegators = get_validator_delegations(deps.storage, &validator)?;

    to_binary(&QueryResponse::ValidatorDelegations { delegators })
}

pub fn query_exceeds_global_liquid_staking_cap(
    deps: Deps,
    tokens: Uint128,
    shares_already_bonded: bool,
) -> StdResult<Binary> {
    let exceeds = check_exceeds_global_liquid_staking_cap(deps, tokens, shares_already_bonded)
        .map_err(|err| StdError::generic_err(err.to_string()))?;

    to_binary(&QueryResponse::ExceedsGlobalLiquidStakingCap { exceeds })
}

pub fn query_index_migration(deps: Deps) -> StdResult<Binary> {
    let in_progress = index_migration_in_progress(deps.storage)?;

    to_binary(&QueryResponse::IndexMigration { in_progress })
}
