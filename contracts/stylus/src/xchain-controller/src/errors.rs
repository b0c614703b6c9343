use alloc::vec::Vec;

use alloy_sol_types::sol;
use stylus_sdk::{
    alloy_primitives::{Address, U256},
    stylus_proc::SolidityError,
};

use xchain_controller_types::{PayloadError, RequestError};

use crate::host::ExternalCallError;

/// Errors raised by the protocol logic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XChainError {
    // Configuration
    NotOwner { caller: Address },
    AlreadyInitialized,
    ZeroAddress,
    TransportNotConfigured,
    PriceFeedNotConfigured,
    InvalidDefaultSlippage,

    // Authorization
    ExpiredSignature { deadline: U256, now: u64 },
    InvalidNonce {
        signer: Address,
        expected: U256,
        provided: U256,
    },
    InvalidSignature,
    UnauthorizedOrigin {
        caller: Address,
        origin_wallet: Address,
    },

    // Request shape
    Request(RequestError),
    InvalidDirection(u8),

    // Funds
    InsufficientFee { required: U256, provided: U256 },
    InsufficientAllowance {
        token: Address,
        allowance: U256,
        required: U256,
    },
    InsufficientBalance {
        token: Address,
        balance: U256,
        required: U256,
    },
    FeeExceedsAmount { reimbursement: U256, amount: U256 },

    // Inbound
    OnlyRegisteredEndpoint { caller: Address },
    MalformedPayload(PayloadError),
    DuplicateDelivery { src_chain: u16, nonce: U256 },

    // Prices
    StalePrice { feed: Address, updated_at: u64 },
    InvalidPrice { feed: Address },

    External(ExternalCallError),
}

impl From<RequestError> for XChainError {
    fn from(e: RequestError) -> Self {
        XChainError::Request(e)
    }
}

impl From<PayloadError> for XChainError {
    fn from(e: PayloadError) -> Self {
        XChainError::MalformedPayload(e)
    }
}

impl From<ExternalCallError> for XChainError {
    fn from(e: ExternalCallError) -> Self {
        XChainError::External(e)
    }
}

sol! {
    error NotOwner(address caller);
    error AlreadyInitialized();
    error ZeroAddress();
    error TransportNotConfigured();
    error PriceFeedNotConfigured();

    error ExpiredSignature(uint256 deadline, uint256 timestamp);
    error InvalidNonce(address signer, uint256 expected, uint256 provided);
    error InvalidSignature();
    error UnauthorizedOrigin(address caller, address originWallet);

    error ZeroAmount();
    error InvalidSlippageFactor();
    error DstGasTooHigh();
    error InvalidDestination();
    error InvalidDirection(uint8 direction);

    error InsufficientFee(uint256 required, uint256 provided);
    error InsufficientAllowance(address token, uint256 allowance, uint256 required);
    error InsufficientBalance(address token, uint256 balance, uint256 required);
    error FeeExceedsAmount(uint256 reimbursement, uint256 amount);

    error OnlyRegisteredEndpoint(address caller);
    error MalformedPayload();
    error DuplicateDelivery(uint16 srcChain, uint256 nonce);

    error StalePrice(address feed, uint256 updatedAt);
    error InvalidPrice(address feed);

    error ExternalCallFailed(address target);
}

/// Custom errors surfaced as revert data by the controller entrypoints.
#[derive(SolidityError)]
pub enum ControllerError {
    NotOwner(NotOwner),
    AlreadyInitialized(AlreadyInitialized),
    ZeroAddress(ZeroAddress),
    TransportNotConfigured(TransportNotConfigured),
    PriceFeedNotConfigured(PriceFeedNotConfigured),
    ExpiredSignature(ExpiredSignature),
    InvalidNonce(InvalidNonce),
    InvalidSignature(InvalidSignature),
    UnauthorizedOrigin(UnauthorizedOrigin),
    ZeroAmount(ZeroAmount),
    InvalidSlippageFactor(InvalidSlippageFactor),
    DstGasTooHigh(DstGasTooHigh),
    InvalidDestination(InvalidDestination),
    InvalidDirection(InvalidDirection),
    InsufficientFee(InsufficientFee),
    InsufficientAllowance(InsufficientAllowance),
    InsufficientBalance(InsufficientBalance),
    FeeExceedsAmount(FeeExceedsAmount),
    OnlyRegisteredEndpoint(OnlyRegisteredEndpoint),
    MalformedPayload(MalformedPayload),
    DuplicateDelivery(DuplicateDelivery),
    StalePrice(StalePrice),
    InvalidPrice(InvalidPrice),
    ExternalCallFailed(ExternalCallFailed),
}

impl From<XChainError> for ControllerError {
    fn from(e: XChainError) -> Self {
        use ControllerError as C;
        match e {
            XChainError::NotOwner { caller } => C::NotOwner(NotOwner { caller }),
            XChainError::AlreadyInitialized => C::AlreadyInitialized(AlreadyInitialized {}),
            XChainError::ZeroAddress => C::ZeroAddress(ZeroAddress {}),
            XChainError::TransportNotConfigured => {
                C::TransportNotConfigured(TransportNotConfigured {})
            }
            XChainError::PriceFeedNotConfigured => {
                C::PriceFeedNotConfigured(PriceFeedNotConfigured {})
            }
            XChainError::InvalidDefaultSlippage => {
                C::InvalidSlippageFactor(InvalidSlippageFactor {})
            }
            XChainError::ExpiredSignature { deadline, now } => {
                C::ExpiredSignature(ExpiredSignature {
                    deadline,
                    timestamp: U256::from(now),
                })
            }
            XChainError::InvalidNonce {
                signer,
                expected,
                provided,
            } => {
                C::InvalidNonce(InvalidNonce {
                    signer,
                    expected,
                    provided,
                })
            }
            XChainError::InvalidSignature => C::InvalidSignature(InvalidSignature {}),
            XChainError::UnauthorizedOrigin { caller, origin_wallet } => {
                C::UnauthorizedOrigin(UnauthorizedOrigin {
                    caller,
                    originWallet: origin_wallet,
                })
            }
            XChainError::Request(RequestError::ZeroAmount) => C::ZeroAmount(ZeroAmount {}),
            XChainError::Request(RequestError::InvalidSlippageFactor) => {
                C::InvalidSlippageFactor(InvalidSlippageFactor {})
            }
            XChainError::Request(RequestError::DstGasTooHigh) => C::DstGasTooHigh(DstGasTooHigh {}),
            XChainError::Request(RequestError::InvalidDestination) => {
                C::InvalidDestination(InvalidDestination {})
            }
            XChainError::InvalidDirection(direction) => {
                C::InvalidDirection(InvalidDirection { direction })
            }
            XChainError::InsufficientFee { required, provided } => {
                C::InsufficientFee(InsufficientFee { required, provided })
            }
            XChainError::InsufficientAllowance { token, allowance, required } => {
                C::InsufficientAllowance(InsufficientAllowance { token, allowance, required })
            }
            XChainError::InsufficientBalance { token, balance, required } => {
                C::InsufficientBalance(InsufficientBalance { token, balance, required })
            }
            XChainError::FeeExceedsAmount { reimbursement, amount } => {
                C::FeeExceedsAmount(FeeExceedsAmount { reimbursement, amount })
            }
            XChainError::OnlyRegisteredEndpoint { caller } => {
                C::OnlyRegisteredEndpoint(OnlyRegisteredEndpoint { caller })
            }
            XChainError::MalformedPayload(_) => C::MalformedPayload(MalformedPayload {}),
            XChainError::DuplicateDelivery { src_chain, nonce } => {
                C::DuplicateDelivery(DuplicateDelivery {
                    srcChain: src_chain,
                    nonce,
                })
            }
            XChainError::StalePrice { feed, updated_at } => C::StalePrice(StalePrice {
                feed,
                updatedAt: U256::from(updated_at),
            }),
            XChainError::InvalidPrice { feed } => C::InvalidPrice(InvalidPrice { feed }),
            XChainError::External(ExternalCallError::MalformedReturn { target })
            | XChainError::External(ExternalCallError::Rejected { target })
            | XChainError::External(ExternalCallError::Reverted { target, .. }) => {
                C::ExternalCallFailed(ExternalCallFailed { target })
            }
        }
    }
}

/// Revert data for a failed entrypoint.
///
/// A revert inside a collaborator (eg. the transport rejecting an unsupported chain) is re-raised
/// with the collaborator's own revert data; a revert without data falls back to
/// `ExternalCallFailed(target)`.
pub fn revert_data(e: XChainError) -> Vec<u8> {
    match e {
        XChainError::External(ExternalCallError::Reverted { data, .. }) if !data.is_empty() => data,
        other => ControllerError::from(other).into(),
    }
}
