use cosmwasm_std::{
    Decimal, Deps, DepsMut, MessageInfo, Order, Response, StdError, StdResult, Storage, Uint128,
};

use crate::delegations::get_all_delegations;
use crate::error::ContractError;
use crate::state::TOTAL_LIQUID_STAKED_TOKENS;
use crate::types::config::CONFIG;
use crate::types::validator::{Validator, VALIDATORS};

pub fn get_total_liquid_staked_tokens(store: &dyn Storage) -> StdResult<Uint128> {
    Ok(TOTAL_LIQUID_STAKED_TOKENS
        .may_load(store)?
        .unwrap_or_default())
}

pub fn set_total_liquid_staked_tokens(
    store: &mut dyn Storage,
    tokens: Uint128,
) -> StdResult<()> {
    TOTAL_LIQUID_STAKED_TOKENS.save(store, &tokens)
}

/// Checks if a liquid delegation of `tokens` would push the network past the
/// global liquid staking cap.
///
/// The total stake is the balance of the bonded pool. If the delegation's
/// shares are already bonded (e.g. a tokenized delegation) the tokens are
/// already reflected in the pool balance; otherwise the candidate amount
/// still has to be added on top.
pub fn check_exceeds_global_liquid_staking_cap(
    deps: Deps,
    tokens: Uint128,
    shares_already_bonded: bool,
) -> Result<bool, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let liquid_staked_amount = get_total_liquid_staked_tokens(deps.storage)?;

    let mut total_staked_amount = deps
        .querier
        .query_balance(config.bonded_pool_address, config.staking_denom)?
        .amount;
    if !shares_already_bonded {
        total_staked_amount = total_staked_amount
            .checked_add(tokens)
            .map_err(StdError::overflow)?;
    }

    let updated_liquid_staked = liquid_staked_amount
        .checked_add(tokens)
        .map_err(StdError::overflow)?;
    let liquid_stake_percent =
        Decimal::checked_from_ratio(updated_liquid_staked, total_staked_amount).map_err(
            |err| StdError::generic_err(format!("cannot compute liquid stake ratio: {}", err)),
        )?;

    Ok(liquid_stake_percent > config.global_liquid_staking_cap)
}

/// Checks if `shares` more liquid shares would exceed the validator bond cap
/// (bond shares times the bond factor). A disabled factor never caps.
pub fn check_exceeds_validator_bond_cap(
    store: &dyn Storage,
    validator: &Validator,
    shares: Decimal,
) -> Result<bool, ContractError> {
    let config = CONFIG.load(store)?;
    let bond_factor = match config.validator_bond_factor {
        Some(factor) => factor,
        None => return Ok(false),
    };

    let max_liquid_shares = validator
        .validator_bond_shares
        .checked_mul(bond_factor)
        .map_err(StdError::overflow)?;

    Ok(validator.liquid_shares + shares > max_liquid_shares)
}

/// Checks if `shares` more liquid shares would push the share of liquid
/// delegations on this validator past the per-validator cap. As with the
/// global check, already-bonded shares are part of the validator's delegator
/// shares and must not be counted twice in the denominator.
pub fn check_exceeds_validator_liquid_staking_cap(
    store: &dyn Storage,
    validator: &Validator,
    shares: Decimal,
    shares_already_bonded: bool,
) -> Result<bool, ContractError> {
    let config = CONFIG.load(store)?;

    let updated_liquid_shares = validator.liquid_shares + shares;
    let mut updated_total_shares = validator.delegator_shares;
    if !shares_already_bonded {
        updated_total_shares = updated_total_shares + shares;
    }

    let liquid_stake_percent = Decimal::checked_from_ratio(
        updated_liquid_shares.atomics(),
        updated_total_shares.atomics(),
    )
    .map_err(|err| {
        StdError::generic_err(format!("cannot compute validator liquid ratio: {}", err))
    })?;

    Ok(liquid_stake_percent > config.validator_liquid_staking_cap)
}

/// Increments the total liquid staked tokens if the global cap allows it.
/// The check runs before any write, so a rejection leaves no partial state.
pub fn safely_increase_total_liquid_staked_tokens(
    deps: DepsMut,
    amount: Uint128,
    shares_already_bonded: bool,
) -> Result<(), ContractError> {
    if check_exceeds_global_liquid_staking_cap(deps.as_ref(), amount, shares_already_bonded)? {
        return Err(ContractError::GlobalLiquidStakingCapExceeded {});
    }

    let total = get_total_liquid_staked_tokens(deps.storage)?;
    set_total_liquid_staked_tokens(deps.storage, total + amount)?;
    Ok(())
}

/// Decrements the total liquid staked tokens. Decreases are never cap
/// checked, only guarded against underflow.
pub fn decrease_total_liquid_staked_tokens(
    store: &mut dyn Storage,
    amount: Uint128,
) -> Result<(), ContractError> {
    let total = get_total_liquid_staked_tokens(store)?;
    if amount > total {
        return Err(ContractError::TotalLiquidStakedUnderflow {});
    }
    set_total_liquid_staked_tokens(store, total - amount)?;
    Ok(())
}

/// Increments a validator's liquid shares after passing both per-validator
/// gates. The bond cap runs first since it is the coarser check.
pub fn safely_increase_validator_liquid_shares(
    store: &mut dyn Storage,
    validator_address: &str,
    shares: Decimal,
    shares_already_bonded: bool,
) -> Result<Validator, ContractError> {
    let mut validator = VALIDATORS.load(store, validator_address)?;

    if check_exceeds_validator_bond_cap(store, &validator, shares)? {
        return Err(ContractError::InsufficientValidatorBondShares {});
    }
    if check_exceeds_validator_liquid_staking_cap(
        store,
        &validator,
        shares,
        shares_already_bonded,
    )? {
        return Err(ContractError::ValidatorLiquidStakingCapExceeded {});
    }

    validator.liquid_shares = validator.liquid_shares + shares;
    VALIDATORS.save(store, validator_address, &validator)?;

    Ok(validator)
}

pub fn decrease_validator_liquid_shares(
    store: &mut dyn Storage,
    validator_address: &str,
    shares: Decimal,
) -> Result<Validator, ContractError> {
    let mut validator = VALIDATORS.load(store, validator_address)?;

    if shares > validator.liquid_shares {
        return Err(ContractError::ValidatorLiquidSharesUnderflow {});
    }

    validator.liquid_shares = validator.liquid_shares - shares;
    VALIDATORS.save(store, validator_address, &validator)?;

    Ok(validator)
}

/// Increments the validator's self bond when a validator bond delegation
/// grows. No cap applies on the way up.
pub fn increase_validator_bond_shares(
    store: &mut dyn Storage,
    validator_address: &str,
    shares: Decimal,
) -> Result<Validator, ContractError> {
    let mut validator = VALIDATORS.load(store, validator_address)?;

    validator.validator_bond_shares = validator.validator_bond_shares + shares;
    VALIDATORS.save(store, validator_address, &validator)?;

    Ok(validator)
}

/// Decrements the validator's self bond so long as the current liquid shares
/// still fit under the ceiling recomputed from the post-decrease bond.
pub fn safely_decrease_validator_bond(
    store: &mut dyn Storage,
    validator_address: &str,
    shares: Decimal,
) -> Result<Validator, ContractError> {
    let mut validator = VALIDATORS.load(store, validator_address)?;

    if shares > validator.validator_bond_shares {
        return Err(ContractError::ValidatorBondSharesUnderflow {});
    }

    let config = CONFIG.load(store)?;
    if let Some(bond_factor) = config.validator_bond_factor {
        let max_liquid_shares = (validator.validator_bond_shares - shares)
            .checked_mul(bond_factor)
            .map_err(StdError::overflow)?;
        if validator.liquid_shares > max_liquid_shares {
            return Err(ContractError::InsufficientValidatorBondShares {});
        }
    }

    validator.validator_bond_shares = validator.validator_bond_shares - shares;
    VALIDATORS.save(store, validator_address, &validator)?;

    Ok(validator)
}

/// Recomputes the global total and every validator's liquid shares from the
/// full delegation set. Cost is proportional to the whole ledger, so this is
/// recovery tooling, not steady-state traffic.
///
/// Shares convert to tokens once, here, at each validator's current exchange
/// rate, truncated per delegation.
pub fn refresh_total_liquid_staked(deps: DepsMut) -> Result<Uint128, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    let validators: Vec<Validator> = VALIDATORS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, validator)| validator))
        .collect::<StdResult<_>>()?;
    for mut validator in validators {
        validator.liquid_shares = Decimal::zero();
        VALIDATORS.save(deps.storage, &validator.operator_address.clone(), &validator)?;
    }

    let delegations = get_all_delegations(deps.storage)?;

    let mut total_liquid_staked_tokens = Uint128::zero();
    for delegation in delegations {
        if !config.delegator_is_liquid_staker(&delegation.delegator_address) {
            continue;
        }

        let mut validator = VALIDATORS.load(deps.storage, &delegation.validator_address)?;
        let liquid_shares = delegation.shares;
        let liquid_tokens = validator.tokens_from_shares(liquid_shares)?;

        validator.liquid_shares = validator.liquid_shares + liquid_shares;
        VALIDATORS.save(deps.storage, &delegation.validator_address, &validator)?;

        total_liquid_staked_tokens += liquid_tokens;
    }

    set_total_liquid_staked_tokens(deps.storage, total_liquid_staked_tokens)?;

    Ok(total_liquid_staked_tokens)
}

pub fn try_increase_total_liquid_stake(
    deps: DepsMut,
    info: MessageInfo,
    amount: Uint128,
    shares_already_bonded: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    safely_increase_total_liquid_staked_tokens(deps, amount, shares_already_bonded)?;

    Ok(Response::new()
        .add_attribute("action", "increase_total_liquid_stake")
        .add_attribute("amount", amount))
}

pub fn try_decrease_total_liquid_stake(
    deps: DepsMut,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    decrease_total_liquid_staked_tokens(deps.storage, amount)?;

    Ok(Response::new()
        .add_attribute("action", "decrease_total_liquid_stake")
        .add_attribute("amount", amount))
}

pub fn try_increase_validator_liquid_shares(
    deps: DepsMut,
    info: MessageInfo,
    validator: String,
    shares: Decimal,
    shares_already_bonded: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let validator = safely_increase_validator_liquid_shares(
        deps.storage,
        &validator,
        shares,
        shares_already_bonded,
    )?;

    Ok(Response::new()
        .add_attribute("action", "increase_validator_liquid_shares")
        .add_attribute("validator", validator.operator_address)
        .add_attribute("liquid_shares", validator.liquid_shares.to_string()))
}

pub fn try_decrease_validator_liquid_shares(
    deps: DepsMut,
    info: MessageInfo,
    validator: String,
    shares: Decimal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let validator = decrease_validator_liquid_shares(deps.storage, &validator, shares)?;

    Ok(Response::new()
        .add_attribute("action", "decrease_validator_liquid_shares")
        .add_attribute("validator", validator.operator_address)
        .add_attribute("liquid_shares", validator.liquid_shares.to_string()))
}

pub fn try_increase_validator_bond_shares(
    deps: DepsMut,
    info: MessageInfo,
    validator: String,
    shares: Decimal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let validator = increase_validator_bond_shares(deps.storage, &validator, shares)?;

    Ok(Response::new()
        .add_attribute("action", "increase_validator_bond_shares")
        .add_attribute("validator", validator.operator_address)
        .add_attribute(
            "validator_bond_shares",
            validator.validator_bond_shares.to_string(),
        ))
}

pub fn try_decrease_validator_bond(
    deps: DepsMut,
    info: MessageInfo,
    validator: String,
    shares: Decimal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let validator = safely_decrease_validator_bond(deps.storage, &validator, shares)?;

    Ok(Response::new()
        .add_attribute("action", "decrease_validator_bond")
        .add_attribute("validator", validator.operator_address)
        .add_attribute(
            "validator_bond_shares",
            validator.validator_bond_shares.to_string(),
        ))
}

pub fn try_refresh_totals(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    let total = refresh_total_liquid_staked(deps)?;

    Ok(Response::new()
        .add_attribute("action", "refresh_totals")
        .add_attribute("total_liquid_staked_tokens", total))
}
