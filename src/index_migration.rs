use cosmwasm_std::{Addr, Binary, Empty, Order, StdError, StdResult, Storage};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::state::{Delegation, DELEGATIONS, DELEGATIONS_BY_VALIDATOR, INDEX_MIGRATION_CURSOR};

/// Primary-store entries mirrored into the reverse index per end-block step.
pub const MIGRATION_WORK_LIMIT: usize = 100;

/// Marks the reverse-index rebuild as pending; the first step starts from
/// the beginning of the primary store.
pub fn start_index_migration(store: &mut dyn Storage) -> StdResult<()> {
    INDEX_MIGRATION_CURSOR.save(store, &Binary::default())
}

pub fn index_migration_in_progress(store: &dyn Storage) -> StdResult<bool> {
    Ok(INDEX_MIGRATION_CURSOR.may_load(store)?.is_some())
}

/// Splits a raw composite delegation key into delegator and validator.
/// Non-terminal key elements carry a two-byte big-endian length prefix; the
/// terminal element runs to the end of the key.
fn parse_delegation_key(raw: &[u8]) -> Result<(Addr, String), ContractError> {
    if raw.len() < 2 {
        return Err(ContractError::MalformedDelegationKey { length: raw.len() });
    }
    let delegator_len = u16::from_be_bytes([raw[0], raw[1]]) as usize;
    if raw.len() <= 2 + delegator_len {
        return Err(ContractError::MalformedDelegationKey { length: raw.len() });
    }

    let delegator = String::from_utf8(raw[2..2 + delegator_len].to_vec())
        .map_err(StdError::invalid_utf8)?;
    let validator = String::from_utf8(raw[2 + delegator_len..].to_vec())
        .map_err(StdError::invalid_utf8)?;

    Ok((Addr::unchecked(delegator), validator))
}

/// Runs one bounded step of the reverse-index rebuild and returns the number
/// of primary entries processed.
///
/// Each step re-opens a fresh iterator strictly after the persisted cursor,
/// so primary-store churn between steps is tolerated: entries inserted past
/// the cursor are picked up later, entries deleted before being visited
/// never appear, and entries already mirrored are never revisited. When the
/// iterator is exhausted before the limit the cursor is deleted and the
/// rebuild is finished; otherwise the last processed key becomes the cursor.
pub fn migrate_delegations_by_validator_step(
    store: &mut dyn Storage,
    work_limit: usize,
) -> Result<usize, ContractError> {
    let cursor = match INDEX_MIGRATION_CURSOR.may_load(store)? {
        Some(cursor) => cursor,
        None => return Ok(0),
    };

    let min = if cursor.as_slice().is_empty() {
        None
    } else {
        Some(Bound::ExclusiveRaw(cursor.as_slice().to_vec()))
    };

    let entries: Vec<(Vec<u8>, Delegation)> = DELEGATIONS
        .range_raw(store, min, None, Order::Ascending)
        .take(work_limit)
        .collect::<StdResult<_>>()?;

    for (raw_key, _) in &entries {
        let (delegator, validator) = parse_delegation_key(raw_key)?;
        DELEGATIONS_BY_VALIDATOR.save(store, (&validator, &delegator), &Empty {})?;
    }

    if entries.len() < work_limit {
        INDEX_MIGRATION_CURSOR.remove(store);
    } else if let Some((last_key, _)) = entries.last() {
        INDEX_MIGRATION_CURSOR.save(store, &Binary::from(last_key.as_slice()))?;
    }

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::testing::mock_dependencies;
    use cosmwasm_std::{to_vec, Decimal};
    use proptest::prelude::*;

    use super::*;

    fn save_primary(store: &mut dyn Storage, delegator: &str, validator: &str) {
        // write only the primary record, leaving the reverse index to the
        // migrator
        let delegation = Delegation {
            delegator_address: Addr::unchecked(delegator),
            validator_address: validator.to_string(),
            shares: Decimal::one(),
        };
        DELEGATIONS
            .save(
                store,
                (&delegation.delegator_address, validator),
                &delegation,
            )
            .unwrap();
    }

    fn index_pairs(store: &dyn Storage) -> Vec<(String, Addr)> {
        DELEGATIONS_BY_VALIDATOR
            .range(store, None, None, Order::Ascending)
            .map(|item| item.map(|(key, _)| key))
            .collect::<StdResult<_>>()
            .unwrap()
    }

    fn seed_primary_store(store: &mut dyn Storage, count: usize) {
        for i in 0..count {
            save_primary(
                store,
                &format!("side1delegator{:03}", i),
                &format!("sidevaloper{}", i % 5),
            );
        }
    }

    #[test]
    fn step_without_cursor_is_a_no_op() {
        let mut deps = mock_dependencies();
        seed_primary_store(deps.as_mut().storage, 4);

        let processed =
            migrate_delegations_by_validator_step(deps.as_mut().storage, 10).unwrap();
        assert_eq!(processed, 0);
        assert!(index_pairs(&deps.storage).is_empty());
    }

    #[test]
    fn single_unbounded_pass_completes() {
        let mut deps = mock_dependencies();
        seed_primary_store(deps.as_mut().storage, 12);

        start_index_migration(deps.as_mut().storage).unwrap();
        let processed =
            migrate_delegations_by_validator_step(deps.as_mut().storage, 1000).unwrap();
        assert_eq!(processed, 12);
        assert!(!index_migration_in_progress(&deps.storage).unwrap());
        assert_eq!(index_pairs(&deps.storage).len(), 12);
    }

    #[test]
    fn exact_limit_needs_one_empty_closing_step() {
        let mut deps = mock_dependencies();
        seed_primary_store(deps.as_mut().storage, 6);

        start_index_migration(deps.as_mut().storage).unwrap();
        let processed =
            migrate_delegations_by_validator_step(deps.as_mut().storage, 6).unwrap();
        assert_eq!(processed, 6);
        assert!(index_migration_in_progress(&deps.storage).unwrap());

        let processed =
            migrate_delegations_by_validator_step(deps.as_mut().storage, 6).unwrap();
        assert_eq!(processed, 0);
        assert!(!index_migration_in_progress(&deps.storage).unwrap());
    }

    #[test]
    fn chunked_steps_match_single_pass() {
        let mut full = mock_dependencies();
        seed_primary_store(full.as_mut().storage, 17);
        start_index_migration(full.as_mut().storage).unwrap();
        migrate_delegations_by_validator_step(full.as_mut().storage, 1000).unwrap();

        let mut chunked = mock_dependencies();
        seed_primary_store(chunked.as_mut().storage, 17);
        start_index_migration(chunked.as_mut().storage).unwrap();
        while index_migration_in_progress(&chunked.storage).unwrap() {
            migrate_delegations_by_validator_step(chunked.as_mut().storage, 3).unwrap();
        }

        assert_eq!(index_pairs(&full.storage), index_pairs(&chunked.storage));
    }

    #[test]
    fn inserts_after_cursor_are_picked_up() {
        let mut deps = mock_dependencies();
        save_primary(deps.as_mut().storage, "side1aaa", "valA");
        save_primary(deps.as_mut().storage, "side1bbb", "valA");

        start_index_migration(deps.as_mut().storage).unwrap();
        migrate_delegations_by_validator_step(deps.as_mut().storage, 2).unwrap();
        assert!(index_migration_in_progress(&deps.storage).unwrap());

        // lands past the cursor, so a later step must see it
        save_primary(deps.as_mut().storage, "side1zzz", "valB");

        while index_migration_in_progress(&deps.storage).unwrap() {
            migrate_delegations_by_validator_step(deps.as_mut().storage, 2).unwrap();
        }

        let pairs = index_pairs(&deps.storage);
        assert!(pairs.contains(&("valB".to_string(), Addr::unchecked("side1zzz"))));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn deleting_migrated_entry_keeps_index_marker() {
        let mut deps = mock_dependencies();
        save_primary(deps.as_mut().storage, "side1aaa", "valA");
        save_primary(deps.as_mut().storage, "side1bbb", "valA");
        save_primary(deps.as_mut().storage, "side1ccc", "valA");

        start_index_migration(deps.as_mut().storage).unwrap();
        migrate_delegations_by_validator_step(deps.as_mut().storage, 1).unwrap();

        // already mirrored; the migrator reflects the state at visit time
        DELEGATIONS.remove(deps.as_mut().storage, (&Addr::unchecked("side1aaa"), "valA"));
        // not yet visited; it must simply never appear
        DELEGATIONS.remove(deps.as_mut().storage, (&Addr::unchecked("side1bbb"), "valA"));

        while index_migration_in_progress(&deps.storage).unwrap() {
            migrate_delegations_by_validator_step(deps.as_mut().storage, 1).unwrap();
        }

        let pairs = index_pairs(&deps.storage);
        assert!(pairs.contains(&("valA".to_string(), Addr::unchecked("side1aaa"))));
        assert!(!pairs.contains(&("valA".to_string(), Addr::unchecked("side1bbb"))));
        assert!(pairs.contains(&("valA".to_string(), Addr::unchecked("side1ccc"))));
    }

    #[test]
    fn malformed_primary_key_aborts_the_step() {
        let mut deps = mock_dependencies();

        // a raw key with a truncated composite encoding, planted under the
        // primary store's namespace
        let namespace = b"delegations";
        let mut raw_key = vec![0u8, namespace.len() as u8];
        raw_key.extend_from_slice(namespace);
        raw_key.push(0u8);
        let delegation = Delegation {
            delegator_address: Addr::unchecked("side1aaa"),
            validator_address: "valA".to_string(),
            shares: Decimal::one(),
        };
        deps.as_mut()
            .storage
            .set(&raw_key, &to_vec(&delegation).unwrap());

        start_index_migration(deps.as_mut().storage).unwrap();
        let err =
            migrate_delegations_by_validator_step(deps.as_mut().storage, 10).unwrap_err();
        assert_eq!(err, ContractError::MalformedDelegationKey { length: 1 });
    }

    #[test]
    fn corrupt_primary_value_aborts_the_step() {
        let mut deps = mock_dependencies();
        save_primary(deps.as_mut().storage, "side1aaa", "valA");

        // overwrite the stored record with bytes that do not decode
        let full_key: Vec<u8> = DELEGATIONS
            .range_raw(&deps.storage, None, None, Order::Ascending)
            .map(|item| item.map(|(key, _)| key))
            .collect::<StdResult<Vec<_>>>()
            .unwrap()
            .pop()
            .map(|suffix| {
                let namespace = b"delegations";
                let mut key = vec![0u8, namespace.len() as u8];
                key.extend_from_slice(namespace);
                key.extend_from_slice(&suffix);
                key
            })
            .unwrap();
        deps.as_mut().storage.set(&full_key, b"garbage");

        start_index_migration(deps.as_mut().storage).unwrap();
        let err =
            migrate_delegations_by_validator_step(deps.as_mut().storage, 10).unwrap_err();
        assert!(matches!(err, ContractError::Std(_)));
    }

    proptest! {
        // any work-limit sequence converges to the same index as one
        // unbounded pass
        #[test]
        fn migration_converges_under_arbitrary_chunking(
            limits in proptest::collection::vec(1usize..8, 1..64),
            count in 0usize..30,
        ) {
            let mut full = mock_dependencies();
            seed_primary_store(full.as_mut().storage, count);
            start_index_migration(full.as_mut().storage).unwrap();
            migrate_delegations_by_validator_step(full.as_mut().storage, 1000).unwrap();

            let mut chunked = mock_dependencies();
            seed_primary_store(chunked.as_mut().storage, count);
            start_index_migration(chunked.as_mut().storage).unwrap();
            let mut next_limit = limits.iter().cycle();
            while index_migration_in_progress(&chunked.storage).unwrap() {
                let limit = *next_limit.next().unwrap();
                migrate_delegations_by_validator_step(chunked.as_mut().storage, limit)
                    .unwrap();
            }

            prop_assert_eq!(index_pairs(&full.storage), index_pairs(&chunked.storage));
        }
    }
}
