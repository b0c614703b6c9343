//! Outbound side: quote, escrow and bridge a deposit or withdrawal request.
//!
//! Every send is checks-then-effects: the request, the quote and the attached fee are validated
//! before any token moves, and a failure after that point reverts the whole call.

use alloc::vec::Vec;

use alloy_primitives::{Address, U256};

use xchain_controller_types::{
    request::{apply_slippage, RequestError},
    CrossChainRequest, DepositInstruction, Direction, Payload, PayloadKind, PermitSignature,
    SendRequestPermit, WithdrawalInstruction,
};

use crate::{
    authorization::authorize,
    errors::XChainError,
    host::{BridgeTransfer, FeeQuoteRequest, Host},
    pricing::relayer_reimbursement,
    registry::{ControllerState, XChainConfig},
};

/// Who pays, who gets refunds, and how much native fee came with the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendContext {
    /// Owner of the escrowed tokens.
    pub payer: Address,
    /// Receives unspent native fee from the transport.
    pub refund_address: Address,
    /// `msg.value`, forwarded to the transport in full.
    pub native_fee: U256,
    /// Relayer reimbursement in native units; zero for direct sends.
    pub xc_fee: U256,
}

impl SendContext {
    /// A send made by the origin wallet itself.
    pub fn direct(caller: Address, msg_value: U256) -> Self {
        Self {
            payer: caller,
            refund_address: caller,
            native_fee: msg_value,
            xc_fee: U256::ZERO,
        }
    }
}

/// Outcome of a successful send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    pub kind: PayloadKind,
    pub sequence: u64,
    /// Stablecoin handed to the transport.
    pub bridged: U256,
    /// Stablecoin paid to the relayer.
    pub reimbursement: U256,
    pub payload: Vec<u8>,
}

fn validated(config: &XChainConfig, request: &CrossChainRequest) -> Result<(), XChainError> {
    request.validate(config.effective_dst_gas_ceiling())?;
    Ok(())
}

fn quote_payload<H: Host>(
    host: &H,
    router: Address,
    request: &CrossChainRequest,
    payload: &[u8],
) -> Result<U256, XChainError> {
    let fee = host.quote_fee(
        router,
        &FeeQuoteRequest {
            dst_chain: request.dst_chain,
            dst_controller: &request.dst_controller,
            payload,
            dst_gas_for_call: request.dst_gas_for_call,
        },
    )?;
    Ok(fee)
}

fn deposit_payload(request: &CrossChainRequest, amount: U256) -> Payload {
    Payload::Deposit(DepositInstruction {
        vault: request.vault,
        amount,
        slippage_factor: request.slippage_factor,
        dst_wallet: request.dst_wallet,
        data: request.data.clone(),
    })
}

fn withdrawal_payload(request: &CrossChainRequest) -> Payload {
    Payload::Withdrawal(WithdrawalInstruction { dst_wallet: request.dst_wallet })
}

/// Net deposit amount once the relayer has been reimbursed.
fn net_of_reimbursement(amount: U256, reimbursement: U256) -> Result<U256, XChainError> {
    if reimbursement >= amount {
        return Err(XChainError::FeeExceedsAmount { reimbursement, amount });
    }
    Ok(amount - reimbursement)
}

/// Native fee the transport charges to deliver a deposit of `request`.
pub fn quote_deposit<S: ControllerState, H: Host>(
    state: &S,
    host: &H,
    request: &CrossChainRequest,
) -> Result<U256, XChainError> {
    let config = state.config();
    let (router, _) = config.outbound_route()?;
    validated(&config, request)?;
    let payload = deposit_payload(request, request.amount).encode();
    quote_payload(host, router, request, &payload)
}

/// Native fee the transport charges to deliver a withdrawal of `request`.
pub fn quote_withdrawal<S: ControllerState, H: Host>(
    state: &S,
    host: &H,
    request: &CrossChainRequest,
) -> Result<U256, XChainError> {
    let config = state.config();
    let (router, _) = config.outbound_route()?;
    validated(&config, request)?;
    let payload = withdrawal_payload(request).encode();
    quote_payload(host, router, request, &payload)
}

/// Quote for a relayed request. Deposits carry the amount net of the relayer reimbursement,
/// so the quoted payload is the one `request_with_permit` will actually send.
pub fn quote_permit<S: ControllerState, H: Host>(
    state: &S,
    host: &H,
    request: &CrossChainRequest,
    direction: Direction,
    xc_fee: U256,
) -> Result<U256, XChainError> {
    match direction {
        Direction::Withdraw => quote_withdrawal(state, host, request),
        Direction::Deposit => {
            let config = state.config();
            let (router, _) = config.outbound_route()?;
            validated(&config, request)?;
            let reimbursement = relayer_reimbursement(host, &config.swap, xc_fee)?;
            let net = net_of_reimbursement(request.amount, reimbursement)?;
            quote_payload(host, router, request, &deposit_payload(request, net).encode())
        }
    }
}

fn ensure_fee_covers(quote: U256, provided: U256) -> Result<(), XChainError> {
    if provided < quote {
        return Err(XChainError::InsufficientFee {
            required: quote,
            provided,
        });
    }
    Ok(())
}

/// Move `amount` of `token` from `from` into this contract, checking allowance then balance.
fn pull<H: Host>(
    host: &mut H,
    token: Address,
    from: Address,
    amount: U256,
) -> Result<(), XChainError> {
    let this = host.contract_address();
    let allowance = host.allowance(token, from, this)?;
    if allowance < amount {
        return Err(XChainError::InsufficientAllowance {
            token,
            allowance,
            required: amount,
        });
    }
    let balance = host.balance_of(token, from)?;
    if balance < amount {
        return Err(XChainError::InsufficientBalance {
            token,
            balance,
            required: amount,
        });
    }
    host.transfer_from(token, from, this, amount)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn bridge<S: ControllerState, H: Host>(
    state: &mut S,
    host: &mut H,
    config: &XChainConfig,
    request: &CrossChainRequest,
    ctx: &SendContext,
    kind: PayloadKind,
    bridged: U256,
    reimbursement: U256,
    payload: Vec<u8>,
) -> Result<SendReceipt, XChainError> {
    let (router, stablecoin) = config.outbound_route()?;
    host.approve(stablecoin, router, bridged)?;
    let transfer = BridgeTransfer {
        dst_chain: request.dst_chain,
        src_pool_id: config.key.pool_id,
        dst_pool_id: request.dst_pool_id,
        refund_address: ctx.refund_address,
        amount: bridged,
        min_amount: apply_slippage(bridged, config.bridge_slippage(request.slippage_factor)),
        dst_gas_for_call: request.dst_gas_for_call,
        dst_controller: request.dst_controller.clone(),
        payload,
    };
    host.send(router, ctx.native_fee, &transfer)?;

    Ok(SendReceipt {
        kind,
        sequence: state.next_sequence(),
        bridged,
        reimbursement,
        payload: transfer.payload,
    })
}

/// Escrow `request.amount` of stablecoin from the payer and bridge it for a remote vault deposit.
pub fn send_deposit_request<S: ControllerState, H: Host>(
    state: &mut S,
    host: &mut H,
    request: &CrossChainRequest,
    ctx: &SendContext,
) -> Result<SendReceipt, XChainError> {
    ensure_origin(ctx.payer, request)?;
    let config = state.config();
    let (router, stablecoin) = config.outbound_route()?;
    validated(&config, request)?;

    let reimbursement = relayer_reimbursement(host, &config.swap, ctx.xc_fee)?;
    let bridged = net_of_reimbursement(request.amount, reimbursement)?;
    let instruction = deposit_payload(request, bridged);
    let payload = instruction.encode();

    let quote = quote_payload(host, router, request, &payload)?;
    ensure_fee_covers(quote, ctx.native_fee)?;

    pull(host, stablecoin, ctx.payer, request.amount)?;
    if !reimbursement.is_zero() {
        host.transfer(stablecoin, ctx.refund_address, reimbursement)?;
    }

    let kind = instruction.kind();
    bridge(state, host, &config, request, ctx, kind, bridged, reimbursement, payload)
}

/// Escrow `request.amount` vault shares, redeem them, and bridge the released stablecoin.
pub fn send_withdrawal_request<S: ControllerState, H: Host>(
    state: &mut S,
    host: &mut H,
    request: &CrossChainRequest,
    ctx: &SendContext,
) -> Result<SendReceipt, XChainError> {
    ensure_origin(ctx.payer, request)?;
    let config = state.config();
    let (router, _) = config.outbound_route()?;
    validated(&config, request)?;

    let reimbursement = relayer_reimbursement(host, &config.swap, ctx.xc_fee)?;
    let instruction = withdrawal_payload(request);
    let payload = instruction.encode();

    let quote = quote_payload(host, router, request, &payload)?;
    ensure_fee_covers(quote, ctx.native_fee)?;

    pull(host, request.vault, ctx.payer, request.amount)?;
    let this = host.contract_address();
    let released = host.debit_for_withdrawal(request.vault, request.amount, this)?;
    if released.is_zero() {
        return Err(RequestError::ZeroAmount.into());
    }
    let bridged = net_of_reimbursement(released, reimbursement)?;
    if !reimbursement.is_zero() {
        host.transfer(config.swap.stablecoin, ctx.refund_address, reimbursement)?;
    }

    let kind = instruction.kind();
    bridge(state, host, &config, request, ctx, kind, bridged, reimbursement, payload)
}

/// Relayed send: verify the signer's permit, then dispatch with the signer as payer and the
/// relayer as refund address and reimbursement recipient.
pub fn request_with_permit<S: ControllerState, H: Host>(
    state: &mut S,
    host: &mut H,
    relayer: Address,
    msg_value: U256,
    permit: &SendRequestPermit,
    signature: &PermitSignature,
) -> Result<SendReceipt, XChainError> {
    let signer = authorize(state, host, permit, signature)?;
    ensure_fee_covers(permit.xc_fee, msg_value)?;

    let ctx = SendContext {
        payer: signer,
        refund_address: relayer,
        native_fee: msg_value,
        xc_fee: permit.xc_fee,
    };
    match permit.direction {
        Direction::Deposit => send_deposit_request(state, host, &permit.request, &ctx),
        Direction::Withdraw => send_withdrawal_request(state, host, &permit.request, &ctx),
    }
}

/// Funds only ever leave the origin wallet named in the request.
fn ensure_origin(caller: Address, request: &CrossChainRequest) -> Result<(), XChainError> {
    if caller != request.origin_wallet {
        return Err(XChainError::UnauthorizedOrigin {
            caller,
            origin_wallet: request.origin_wallet,
        });
    }
    Ok(())
}
