use alloc::vec::Vec;

use stylus_sdk::{
    alloy_primitives::{Address, Bytes, B256, U256},
    alloy_sol_types::SolCall,
    call::RawCall,
};

use xchain_controller_types::{DepositInstruction, PermitSignature};

use crate::{
    host::{
        interfaces::{IPriceFeed, IStargateRouter, IXChainVault, IERC20},
        BridgeTransfer, Erc20, ExternalCallError, FeeQuoteRequest, PriceFeed, PriceQuote, Runtime,
        Transport, Vault, TYPE_SWAP_REMOTE,
    },
    utils::crypto::ecrecover,
};

/// Collaborators reached through raw EVM calls from inside a controller entrypoint.
///
/// Reverts are captured with their revert data so they can be bubbled up unchanged.
pub struct OnchainHost {
    this: Address,
    chain_id: u64,
    now: u64,
}

impl OnchainHost {
    pub fn new(this: Address, chain_id: u64, now: u64) -> Self {
        Self { this, chain_id, now }
    }

    fn static_call(&self, target: Address, data: &[u8]) -> Result<Vec<u8>, ExternalCallError> {
        unsafe { RawCall::new_static().call(target, data) }
            .map_err(|e| ExternalCallError::Reverted {
                target,
                data: e.into(),
            })
    }

    fn call(
        &mut self,
        target: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Vec<u8>, ExternalCallError> {
        unsafe { RawCall::new_with_value(value).call(target, data) }
            .map_err(|e| ExternalCallError::Reverted {
                target,
                data: e.into(),
            })
    }

    fn token_call(&mut self, token: Address, data: &[u8]) -> Result<(), ExternalCallError> {
        let out = self.call(token, U256::ZERO, data)?;
        // Tokens that return nothing (eg. USDT) are treated as success.
        if out.is_empty() {
            return Ok(());
        }
        if out.len() < 32 {
            return Err(ExternalCallError::MalformedReturn { target: token });
        }
        if U256::from_be_slice(&out[0..32]).is_zero() {
            return Err(ExternalCallError::Rejected { target: token });
        }
        Ok(())
    }
}

fn malformed(target: Address) -> impl FnOnce(alloy_sol_types::Error) -> ExternalCallError {
    move |_| ExternalCallError::MalformedReturn { target }
}

fn lz_tx_params(dst_gas_for_call: U256) -> IStargateRouter::LzTxParams {
    IStargateRouter::LzTxParams {
        dstGasForCall: dst_gas_for_call,
        dstNativeAmount: U256::ZERO,
        dstNativeAddr: Bytes::new(),
    }
}

impl Runtime for OnchainHost {
    fn contract_address(&self) -> Address {
        self.this
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn block_timestamp(&self) -> u64 {
        self.now
    }

    fn recover_signer(&self, digest: B256, signature: &PermitSignature) -> Option<Address> {
        ecrecover(digest, signature)
    }
}

impl Erc20 for OnchainHost {
    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ExternalCallError> {
        let out = self.static_call(token, &IERC20::allowanceCall { owner, spender }.abi_encode())?;
        let ret = IERC20::allowanceCall::abi_decode_returns(&out, true).map_err(malformed(token))?;
        Ok(ret._0)
    }

    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ExternalCallError> {
        let out = self.static_call(token, &IERC20::balanceOfCall { account: owner }.abi_encode())?;
        let ret = IERC20::balanceOfCall::abi_decode_returns(&out, true).map_err(malformed(token))?;
        Ok(ret._0)
    }

    fn decimals(&self, token: Address) -> Result<u8, ExternalCallError> {
        let out = self.static_call(token, &IERC20::decimalsCall {}.abi_encode())?;
        let ret = IERC20::decimalsCall::abi_decode_returns(&out, true).map_err(malformed(token))?;
        Ok(ret._0)
    }

    fn transfer(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        self.token_call(token, &IERC20::transferCall { to, amount }.abi_encode())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        self.token_call(token, &IERC20::transferFromCall { from, to, amount }.abi_encode())
    }

    fn approve(
        &mut self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        self.token_call(token, &IERC20::approveCall { spender, amount }.abi_encode())
    }
}

impl Transport for OnchainHost {
    fn quote_fee(
        &self,
        router: Address,
        request: &FeeQuoteRequest<'_>,
    ) -> Result<U256, ExternalCallError> {
        let call = IStargateRouter::quoteLayerZeroFeeCall {
            dstChainId: request.dst_chain,
            functionType: TYPE_SWAP_REMOTE,
            toAddress: Bytes::copy_from_slice(request.dst_controller),
            transferAndCallPayload: Bytes::copy_from_slice(request.payload),
            lzTxParams: lz_tx_params(request.dst_gas_for_call),
        };
        let out = self.static_call(router, &call.abi_encode())?;
        let ret = IStargateRouter::quoteLayerZeroFeeCall::abi_decode_returns(&out, true)
            .map_err(malformed(router))?;
        Ok(ret._0)
    }

    fn send(
        &mut self,
        router: Address,
        native_fee: U256,
        transfer: &BridgeTransfer,
    ) -> Result<(), ExternalCallError> {
        let call = IStargateRouter::swapCall {
            dstChainId: transfer.dst_chain,
            srcPoolId: transfer.src_pool_id,
            dstPoolId: transfer.dst_pool_id,
            refundAddress: transfer.refund_address,
            amountLD: transfer.amount,
            minAmountLD: transfer.min_amount,
            lzTxParams: lz_tx_params(transfer.dst_gas_for_call),
            to: Bytes::copy_from_slice(&transfer.dst_controller),
            payload: Bytes::copy_from_slice(&transfer.payload),
        };
        self.call(router, native_fee, &call.abi_encode())?;
        Ok(())
    }
}

impl Vault for OnchainHost {
    fn credit_deposit(
        &mut self,
        vault: Address,
        amount: U256,
        instruction: &DepositInstruction,
    ) -> Result<U256, ExternalCallError> {
        let call = IXChainVault::creditDepositCall {
            amount,
            slippageFactor: instruction.slippage_factor,
            recipient: instruction.dst_wallet,
            data: Bytes::copy_from_slice(&instruction.data),
        };
        let out = self.call(vault, U256::ZERO, &call.abi_encode())?;
        let ret = IXChainVault::creditDepositCall::abi_decode_returns(&out, true)
            .map_err(malformed(vault))?;
        Ok(ret._0)
    }

    fn debit_for_withdrawal(
        &mut self,
        vault: Address,
        shares: U256,
        recipient: Address,
    ) -> Result<U256, ExternalCallError> {
        let call = IXChainVault::debitForWithdrawalCall { shareAmount: shares, recipient };
        let out = self.call(vault, U256::ZERO, &call.abi_encode())?;
        let ret = IXChainVault::debitForWithdrawalCall::abi_decode_returns(&out, true)
            .map_err(malformed(vault))?;
        Ok(ret._0)
    }
}

impl PriceFeed for OnchainHost {
    fn latest_price(&self, feed: Address) -> Result<PriceQuote, ExternalCallError> {
        let out = self.static_call(feed, &IPriceFeed::latestRoundDataCall {}.abi_encode())?;
        let round = IPriceFeed::latestRoundDataCall::abi_decode_returns(&out, true)
            .map_err(malformed(feed))?;

        let out = self.static_call(feed, &IPriceFeed::decimalsCall {}.abi_encode())?;
        let decimals =
            IPriceFeed::decimalsCall::abi_decode_returns(&out, true).map_err(malformed(feed))?;

        Ok(PriceQuote {
            answer: round.answer,
            decimals: decimals._0,
            updated_at: round.updatedAt.saturating_to::<u64>(),
        })
    }
}
