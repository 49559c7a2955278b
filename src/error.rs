use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Global liquid staking cap exceeded")]
    GlobalLiquidStakingCapExceeded {},

    #[error("Validator liquid staking cap exceeded")]
    ValidatorLiquidStakingCapExceeded {},

    #[error("Insufficient validator bond shares")]
    InsufficientValidatorBondShares {},

    #[error("Decrease exceeds total liquid staked tokens")]
    TotalLiquidStakedUnderflow {},

    #[error("Decrease exceeds validator liquid shares")]
    ValidatorLiquidSharesUnderflow {},

    #[error("Decrease exceeds validator bond shares")]
    ValidatorBondSharesUnderflow {},

    #[error("Tokenize shares already disabled for account")]
    TokenizeSharesAlreadyDisabledForAccount {},

    #[error("Tokenize shares already enabled for account")]
    TokenizeSharesAlreadyEnabledForAccount {},

    #[error("Tokenize shares re-enablement already in progress, ending at {completion_time}")]
    TokenizeSharesEnablementInProgress { completion_time: u64 },

    #[error("Malformed delegation key of {length} bytes")]
    MalformedDelegationKey { length: usize },
}
