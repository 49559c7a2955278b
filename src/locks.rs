use cosmwasm_std::{
    Addr, DepsMut, Env, MessageInfo, Order, Response, StdResult, Storage,
};
use cw_storage_plus::Bound;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::msg::TokenizeShareLockEntry;
use crate::state::{PENDING_TOKENIZE_SHARE_AUTHORIZATIONS, TOKENIZE_SHARE_LOCKS};
use crate::types::config::CONFIG;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenizeShareLockStatus {
    Unlocked,
    Locked,
    LockExpiring,
}

impl TokenizeShareLockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenizeShareLockStatus::Unlocked => "unlocked",
            TokenizeShareLockStatus::Locked => "locked",
            TokenizeShareLockStatus::LockExpiring => "lock_expiring",
        }
    }
}

/// Locks tokenizing shares for an account. The lock is stored with a zero
/// timestamp; the timestamp is filled in once an unlock is queued.
pub fn add_tokenize_shares_lock(store: &mut dyn Storage, address: &Addr) -> StdResult<()> {
    TOKENIZE_SHARE_LOCKS.save(store, address, &0u64)
}

pub fn remove_tokenize_shares_lock(store: &mut dyn Storage, address: &Addr) {
    TOKENIZE_SHARE_LOCKS.remove(store, address);
}

/// Marks the lock as expiring at `completion_time`.
pub fn set_tokenize_shares_unlock_time(
    store: &mut dyn Storage,
    address: &Addr,
    completion_time: u64,
) -> StdResult<()> {
    TOKENIZE_SHARE_LOCKS.save(store, address, &completion_time)
}

/// Lock status for one account plus the unlock time when the lock is
/// expiring.
pub fn get_tokenize_shares_lock(
    store: &dyn Storage,
    address: &Addr,
) -> StdResult<(TokenizeShareLockStatus, u64)> {
    match TOKENIZE_SHARE_LOCKS.may_load(store, address)? {
        None => Ok((TokenizeShareLockStatus::Unlocked, 0)),
        Some(0) => Ok((TokenizeShareLockStatus::Locked, 0)),
        Some(unlock_time) => Ok((TokenizeShareLockStatus::LockExpiring, unlock_time)),
    }
}

/// Every lock currently in place, in address order, for inspection/export.
pub fn get_all_tokenize_shares_locks(
    store: &dyn Storage,
) -> StdResult<Vec<TokenizeShareLockEntry>> {
    TOKENIZE_SHARE_LOCKS
        .range(store, None, None, Order::Ascending)
        .map(|item| {
            let (address, unlock_time) = item?;
            let status = if unlock_time == 0 {
                TokenizeShareLockStatus::Locked
            } else {
                TokenizeShareLockStatus::LockExpiring
            };
            Ok(TokenizeShareLockEntry {
                address: address.to_string(),
                status: status.as_str().to_string(),
                completion_time: if unlock_time == 0 {
                    None
                } else {
                    Some(unlock_time)
                },
            })
        })
        .collect()
}

pub fn get_pending_tokenize_share_authorizations(
    store: &dyn Storage,
    completion_time: u64,
) -> StdResult<Vec<String>> {
    Ok(PENDING_TOKENIZE_SHARE_AUTHORIZATIONS
        .may_load(store, completion_time)?
        .unwrap_or_default())
}

pub fn set_pending_tokenize_share_authorizations(
    store: &mut dyn Storage,
    completion_time: u64,
    addresses: &Vec<String>,
) -> StdResult<()> {
    PENDING_TOKENIZE_SHARE_AUTHORIZATIONS.save(store, completion_time, addresses)
}

/// Inserts the address into the unlock queue, where it sits for one
/// unbonding period. Addresses resolving to the same completion time share
/// one batch. Returns the completion time.
pub fn queue_tokenize_shares_authorization(
    store: &mut dyn Storage,
    address: &Addr,
    block_time: u64,
) -> StdResult<u64> {
    let config = CONFIG.load(store)?;
    let completion_time = block_time + config.unbonding_period;

    let mut authorizations = get_pending_tokenize_share_authorizations(store, completion_time)?;
    authorizations.push(address.to_string());

    set_pending_tokenize_share_authorizations(store, completion_time, &authorizations)?;
    set_tokenize_shares_unlock_time(store, address, completion_time)?;

    Ok(completion_time)
}

/// Drops the address from the batch at `completion_time`. The account's own
/// lock record is left for the caller to rewrite; an emptied batch stays in
/// place and is collected by the next sweep covering its timestamp.
pub fn cancel_tokenize_share_lock_expiration(
    store: &mut dyn Storage,
    address: &Addr,
    completion_time: u64,
) -> StdResult<()> {
    let authorizations = get_pending_tokenize_share_authorizations(store, completion_time)?;
    let updated: Vec<String> = authorizations
        .into_iter()
        .filter(|expiring| expiring.as_str() != address.as_str())
        .collect();
    set_pending_tokenize_share_authorizations(store, completion_time, &updated)
}

/// Releases every queued authorization that has waited out the unbonding
/// period: removes the lock record of each address in every batch with a
/// timestamp at or before `block_time` and deletes those batches. Returned
/// addresses are ordered by batch timestamp, then by append order within a
/// batch. Ordered iteration stops at the first batch past `block_time`.
pub fn remove_expired_tokenize_share_locks(
    store: &mut dyn Storage,
    block_time: u64,
) -> StdResult<Vec<String>> {
    let expired: Vec<(u64, Vec<String>)> = PENDING_TOKENIZE_SHARE_AUTHORIZATIONS
        .range(
            store,
            None,
            Some(Bound::inclusive(block_time)),
            Order::Ascending,
        )
        .collect::<StdResult<_>>()?;

    let mut unlocked_addresses = Vec::new();
    for (completion_time, addresses) in expired {
        PENDING_TOKENIZE_SHARE_AUTHORIZATIONS.remove(store, completion_time);
        for address in addresses {
            remove_tokenize_shares_lock(store, &Addr::unchecked(&address));
            unlocked_addresses.push(address);
        }
    }

    Ok(unlocked_addresses)
}

/// Blocks the sender from tokenizing any of their delegations until they
/// re-enable and wait out the unbonding period.
pub fn try_disable_tokenize_shares(
    deps: DepsMut,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let delegator = info.sender;

    let (status, completion_time) = get_tokenize_shares_lock(deps.storage, &delegator)?;
    if status == TokenizeShareLockStatus::Locked {
        return Err(ContractError::TokenizeSharesAlreadyDisabledForAccount {});
    }

    // a lock expiration in progress is overridden by the new lock
    if status == TokenizeShareLockStatus::LockExpiring {
        cancel_tokenize_share_lock_expiration(deps.storage, &delegator, completion_time)?;
    }

    add_tokenize_shares_lock(deps.storage, &delegator)?;

    Ok(Response::new()
        .add_attribute("action", "disable_tokenize_shares")
        .add_attribute("delegator", delegator))
}

/// Starts the countdown after which tokenizing shares by the sender is
/// allowed again.
pub fn try_enable_tokenize_shares(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let delegator = info.sender;

    let (status, completion_time) = get_tokenize_shares_lock(deps.storage, &delegator)?;
    if status == TokenizeShareLockStatus::Unlocked {
        return Err(ContractError::TokenizeSharesAlreadyEnabledForAccount {});
    }
    if status == TokenizeShareLockStatus::LockExpiring {
        return Err(ContractError::TokenizeSharesEnablementInProgress { completion_time });
    }

    let completion_time = queue_tokenize_shares_authorization(
        deps.storage,
        &delegator,
        env.block.time.seconds(),
    )?;

    Ok(Response::new()
        .add_attribute("action", "enable_tokenize_shares")
        .add_attribute("delegator", delegator)
        .add_attribute("completion_time", completion_time.to_string()))
}
