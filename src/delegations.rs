use cosmwasm_std::{
    Addr, Decimal, DepsMut, Empty, MessageInfo, Order, Response, StdResult, Storage, Uint128,
};

use crate::error::ContractError;
use crate::state::{Delegation, DELEGATIONS, DELEGATIONS_BY_VALIDATOR};
use crate::types::config::CONFIG;
use crate::types::validator::{Validator, VALIDATORS};

/// Writes a delegation record and its validator-side index marker.
pub fn set_delegation(store: &mut dyn Storage, delegation: &Delegation) -> StdResult<()> {
    DELEGATIONS.save(
        store,
        (
            &delegation.delegator_address,
            &delegation.validator_address,
        ),
        delegation,
    )?;

    DELEGATIONS_BY_VALIDATOR.save(
        store,
        (
            &delegation.validator_address,
            &delegation.delegator_address,
        ),
        &Empty {},
    )
}

/// Removes a delegation record and its validator-side index marker.
pub fn remove_delegation(store: &mut dyn Storage, delegator: &Addr, validator: &str) {
    DELEGATIONS.remove(store, (delegator, validator));
    DELEGATIONS_BY_VALIDATOR.remove(store, (validator, delegator));
}

pub fn get_all_delegations(store: &dyn Storage) -> StdResult<Vec<Delegation>> {
    DELEGATIONS
        .range(store, None, None, Order::Ascending)
        .map(|item| item.map(|(_, delegation)| delegation))
        .collect()
}

/// Delegator addresses of a validator, read from the reverse index.
pub fn get_validator_delegations(
    store: &dyn Storage,
    validator: &str,
) -> StdResult<Vec<Addr>> {
    DELEGATIONS_BY_VALIDATOR
        .prefix(validator)
        .keys(store, None, None, Order::Ascending)
        .collect()
}

/// Syncs a validator's externally-owned fields. The liquid and bond share
/// counters belong to this ledger and survive the sync; a validator seen for
/// the first time starts both at zero.
pub fn try_set_validator(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
    tokens: Uint128,
    delegator_shares: Decimal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let validator = match VALIDATORS.may_load(deps.storage, &address)? {
        Some(mut existing) => {
            existing.tokens = tokens;
            existing.delegator_shares = delegator_shares;
            existing
        }
        None => Validator {
            tokens,
            delegator_shares,
            ..Validator::new(address.clone())
        },
    };
    VALIDATORS.save(deps.storage, &address, &validator)?;

    Ok(Response::new()
        .add_attribute("action", "set_validator")
        .add_attribute("validator", address))
}

pub fn try_set_delegation(
    deps: DepsMut,
    info: MessageInfo,
    delegator: String,
    validator: String,
    shares: Decimal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let delegation = Delegation {
        delegator_address: deps.api.addr_validate(&delegator)?,
        validator_address: validator,
        shares,
    };
    set_delegation(deps.storage, &delegation)?;

    Ok(Response::new()
        .add_attribute("action", "set_delegation")
        .add_attribute("delegator", delegation.delegator_address)
        .add_attribute("validator", delegation.validator_address))
}

pub fn try_remove_delegation(
    deps: DepsMut,
    info: MessageInfo,
    delegator: String,
    validator: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.staking_module {
        return Err(ContractError::Unauthorized {});
    }

    let delegator = deps.api.addr_validate(&delegator)?;
    remove_delegation(deps.storage, &delegator, &validator);

    Ok(Response::new()
        .add_attribute("action", "remove_delegation")
        .add_attribute("delegator", delegator)
        .add_attribute("validator", validator))
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::testing::mock_dependencies;

    use super::*;

    fn delegation(delegator: &str, validator: &str, shares: u64) -> Delegation {
        Delegation {
            delegator_address: Addr::unchecked(delegator),
            validator_address: validator.to_string(),
            shares: Decimal::from_ratio(shares, 1u64),
        }
    }

    #[test]
    fn set_and_remove_keep_reverse_index_exact() {
        let mut deps = mock_dependencies();

        set_delegation(deps.as_mut().storage, &delegation("side1aaa", "valA", 10)).unwrap();
        set_delegation(deps.as_mut().storage, &delegation("side1bbb", "valA", 20)).unwrap();
        set_delegation(deps.as_mut().storage, &delegation("side1aaa", "valB", 30)).unwrap();

        let delegators = get_validator_delegations(&deps.storage, "valA").unwrap();
        assert_eq!(
            delegators,
            vec![Addr::unchecked("side1aaa"), Addr::unchecked("side1bbb")]
        );
        let delegators = get_validator_delegations(&deps.storage, "valB").unwrap();
        assert_eq!(delegators, vec![Addr::unchecked("side1aaa")]);

        remove_delegation(
            deps.as_mut().storage,
            &Addr::unchecked("side1aaa"),
            "valA",
        );
        let delegators = get_validator_delegations(&deps.storage, "valA").unwrap();
        assert_eq!(delegators, vec![Addr::unchecked("side1bbb")]);
        assert_eq!(get_all_delegations(&deps.storage).unwrap().len(), 2);
    }

    #[test]
    fn overwrite_does_not_duplicate_index_entries() {
        let mut deps = mock_dependencies();

        set_delegation(deps.as_mut().storage, &delegation("side1aaa", "valA", 10)).unwrap();
        set_delegation(deps.as_mut().storage, &delegation("side1aaa", "valA", 99)).unwrap();

        let delegators = get_validator_delegations(&deps.storage, "valA").unwrap();
        assert_eq!(delegators, vec![Addr::unchecked("side1aaa")]);

        let all = get_all_delegations(&deps.storage).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].shares, Decimal::from_ratio(99u64, 1u64));
    }
}
