#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;

use cosmwasm_std::{
    Binary, Decimal, Deps, DepsMut, Env, MessageInfo, Response, StdError, StdResult,
};
use cw2::set_contract_version;

use crate::caps::{
    try_decrease_total_liquid_stake, try_decrease_validator_bond,
    try_decrease_validator_liquid_shares, try_increase_total_liquid_stake,
    try_increase_validator_bond_shares, try_increase_validator_liquid_shares,
    try_refresh_totals,
};
use crate::delegations::{try_remove_delegation, try_set_delegation, try_set_validator};
use crate::error::ContractError;
use crate::index_migration::{
    migrate_delegations_by_validator_step, start_index_migration, MIGRATION_WORK_LIMIT,
};
use crate::locks::{
    remove_expired_tokenize_share_locks, try_disable_tokenize_shares,
    try_enable_tokenize_shares,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_all_tokenize_share_locks, query_config, query_exceeds_global_liquid_staking_cap,
    query_index_migration, query_pending_tokenize_share_authorizations,
    query_tokenize_share_lock, query_total_liquid_staked, query_validator,
    query_validator_delegations,
};
use crate::types::config::{Config, CONFIG};

// version info for migration info
const CONTRACT_NAME: &str = "liquid-staking-guard";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let admin = match msg.admin {
        Some(admin) => deps.api.addr_validate(&admin)?,
        None => info.sender.clone(),
    };

    let config = Config {
        admin,
        staking_module: deps.api.addr_validate(&msg.staking_module)?,
        global_liquid_staking_cap: msg.global_liquid_staking_cap,
        validator_liquid_staking_cap: msg.validator_liquid_staking_cap,
        validator_bond_factor: msg.validator_bond_factor,
        unbonding_period: msg.unbonding_period,
        liquid_staker_address_length: msg.liquid_staker_address_length,
        bonded_pool_address: deps.api.addr_validate(&msg.bonded_pool_address)?,
        staking_denom: msg.staking_denom,
    };
    config.validate()?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "init")
        .add_attribute("sender", info.sender))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::SetValidator {
            address,
            tokens,
            delegator_shares,
        } => try_set_validator(deps, info, address, tokens, delegator_shares),
        ExecuteMsg::SetDelegation {
            delegator,
            validator,
            shares,
        } => try_set_delegation(deps, info, delegator, validator, shares),
        ExecuteMsg::RemoveDelegation {
            delegator,
            validator,
        } => try_remove_delegation(deps, info, delegator, validator),

        ExecuteMsg::IncreaseTotalLiquidStake {
            amount,
            shares_already_bonded,
        } => try_increase_total_liquid_stake(deps, info, amount, shares_already_bonded),
        ExecuteMsg::DecreaseTotalLiquidStake { amount } => {
            try_decrease_total_liquid_stake(deps, info, amount)
        }
        ExecuteMsg::IncreaseValidatorLiquidShares {
            validator,
            shares,
            shares_already_bonded,
        } => try_increase_validator_liquid_shares(
            deps,
            info,
            validator,
            shares,
            shares_already_bonded,
        ),
        ExecuteMsg::DecreaseValidatorLiquidShares { validator, shares } => {
            try_decrease_validator_liquid_shares(deps, info, validator, shares)
        }
        ExecuteMsg::IncreaseValidatorBondShares { validator, shares } => {
            try_increase_validator_bond_shares(deps, info, validator, shares)
        }
        ExecuteMsg::DecreaseValidatorBond { validator, shares } => {
            try_decrease_validator_bond(deps, info, validator, shares)
        }
        ExecuteMsg::RefreshTotals {} => try_refresh_totals(deps, info),

        ExecuteMsg::DisableTokenizeShares {} => try_disable_tokenize_shares(deps, info),
        ExecuteMsg::EnableTokenizeShares {} => try_enable_tokenize_shares(deps, env, info),

        ExecuteMsg::EndBlock {} => try_end_block(deps, env, info),

        ExecuteMsg::UpdateParams {
            global_liquid_staking_cap,
            validator_liquid_staking_cap,
            unbonding_period,
        } => try_update_params(
            deps,
            info,
            global_liquid_staking_cap,
            validator_liquid_staking_cap,
            unbonding_period,
        ),
        ExecuteMsg::SetValidatorBondFactor { factor } => {
            try_set_validator_bond_factor(deps, info, factor)
        }
        ExecuteMsg::UpdateStakingModule { address } => {
            try_update_staking_module(deps, info, address)
        }
    }
}

/// Per-block hook: releases every matured tokenize share unlock, then
/// advances the reverse-index rebuild by one bounded step.
pub fn try_end_block(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let unlocked =
        remove_expired_tokenize_share_locks(deps.storage, env.block.time.seconds())?;
    let migrated =
        migrate_delegations_by_validator_step(deps.storage, MIGRATION_WORK_LIMIT)?;

    let mut response = Response::new()
        .add_attribute("action", "end_block")
        .add_attribute("unlocked", unlocked.len().to_string())
        .add_attribute("index_migrated", migrated.to_string());
    if !unlocked.is_empty() {
        response = response.add_attribute("unlocked_addresses", unlocked.join(","));
    }

    Ok(response)
}

pub fn try_update_params(
    deps: DepsMut,
    info: MessageInfo,
    global_liquid_staking_cap: Option<Decimal>,
    validator_liquid_staking_cap: Option<Decimal>,
    unbonding_period: Option<u64>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    if let Some(cap) = global_liquid_staking_cap {
        config.global_liquid_staking_cap = cap;
    }
    if let Some(cap) = validator_liquid_staking_cap {
        config.validator_liquid_staking_cap = cap;
    }
    if let Some(period) = unbonding_period {
        config.unbonding_period = period;
    }

    config.validate()?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_params"))
}

pub fn try_set_validator_bond_factor(
    deps: DepsMut,
    info: MessageInfo,
    factor: Option<Decimal>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    config.validator_bond_factor = factor;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "set_validator_bond_factor")
        .add_attribute(
            "factor",
            factor.map_or("disabled".to_string(), |f| f.to_string()),
        ))
}

pub fn try_update_staking_module(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    config.staking_module = deps.api.addr_validate(&address)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_staking_module")
        .add_attribute("staking_module", address))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query_config(deps),
        QueryMsg::TotalLiquidStaked {} => query_total_liquid_staked(deps),
        QueryMsg::Validator { address } => query_validator(deps, address),
        QueryMsg::TokenizeShareLock { address } => query_tokenize_share_lock(deps, address),
        QueryMsg::AllTokenizeShareLocks {} => query_all_tokenize_share_locks(deps),
        QueryMsg::PendingTokenizeShareAuthorizations { completion_time } => {
            query_pending_tokenize_share_authorizations(deps, completion_time)
        }
        QueryMsg::ValidatorDelegations { validator } => {
            query_validator_delegations(deps, validator)
        }
        QueryMsg::ExceedsGlobalLiquidStakingCap {
            tokens,
            shares_already_bonded,
        } => query_exceeds_global_liquid_staking_cap(deps, tokens, shares_already_bonded),
        QueryMsg::IndexMigration {} => query_index_migration(deps),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let ver = cw2::get_contract_version(deps.storage)?;
    // ensure we are migrating from an allowed contract
    if ver.contract != CONTRACT_NAME {
        return Err(StdError::generic_err("Can only upgrade from same type").into());
    }
    // note: better to do proper semver compare, but string compare *usually* works
    if ver.version >= CONTRACT_VERSION.to_string() {
        return Err(StdError::generic_err("Cannot upgrade from a newer version").into());
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    // the delegations-by-validator index did not exist before this version;
    // rebuild it incrementally, a bounded batch per block
    start_index_migration(deps.storage)?;

    Ok(Response::default())
}
