use cosmwasm_std::{Addr, Binary, Decimal, Empty, Uint128};
use cw_storage_plus::{Item, Map};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Network-wide tokens delegated through liquid staking providers.
/// Absent until the first increment, which reads as zero.
pub const TOTAL_LIQUID_STAKED_TOKENS: Item<Uint128> =
    Item::new("total_liquid_staked_tokens");

/// Per-account tokenize share lock. A value of zero means the lock has no
/// scheduled expiry; any other value is the unix time (seconds) at which
/// the lock lifts.
pub const TOKENIZE_SHARE_LOCKS: Map<&Addr, u64> = Map::new("tokenize_share_locks");

/// Accounts whose locks all expire at the same instant, in request order.
/// u64 keys are stored big-endian, so ascending range order is
/// chronological order.
pub const PENDING_TOKENIZE_SHARE_AUTHORIZATIONS: Map<u64, Vec<String>> =
    Map::new("pending_tokenize_share_authorizations");

/// Primary delegation store, keyed delegator then validator.
pub const DELEGATIONS: Map<(&Addr, &str), Delegation> = Map::new("delegations");

/// Reverse marker index, keyed validator then delegator.
pub const DELEGATIONS_BY_VALIDATOR: Map<(&str, &Addr), Empty> =
    Map::new("delegations_by_validator");

/// Raw primary-store key last mirrored into the reverse index. Absent means
/// no rebuild is in progress; empty means the rebuild starts from the first
/// key on the next step.
pub const INDEX_MIGRATION_CURSOR: Item<Binary> = Item::new("index_migration_cursor");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct Delegation {
    pub delegator_address: Addr,
    pub validator_address: String,
    pub shares: Decimal,
}
