//! Stylus entrypoint of the cross-chain vault controller.
//!
//! One instance is deployed per chain. On the source chain it escrows funds and hands them to
//! the transport together with an instruction payload; on the destination chain it receives the
//! transport callback and settles the instruction against the vault.
//!
//! All methods revert with ABI-encoded custom errors from `errors`, except when a collaborator
//! reverted: its revert data is re-raised as-is.

use alloc::vec::Vec;

use alloy_sol_types::sol;
use stylus_sdk::{
    abi::Bytes,
    alloy_primitives::{Address, B256, U16, U256, U64},
    prelude::*,
    stylus_core::log,
};

use xchain_controller_types::{
    permit::domain_separator, CrossChainRequest, Direction, PermitSignature, SendRequestPermit,
};

use crate::{
    authorization::permit_domain,
    coordinator::{self, SendContext, SendReceipt},
    errors::{revert_data, XChainError},
    host::{onchain::OnchainHost, Erc20},
    reconcile::{self, InboundDelivery, Reconciliation},
    registry::{
        delivery_key, validate_default_slippage, ControllerState, KeyXChainParams, SwapParams,
        XChainConfig,
    },
};

sol! {
    event SendMsg(uint8 msgType, uint64 nonce);
    event XChainDepositReceived(
        uint16 indexed srcChain,
        address indexed vault,
        address indexed recipient,
        uint256 amount,
        uint256 shares
    );
    event XChainWithdrawalReceived(
        uint16 indexed srcChain,
        address indexed recipient,
        uint256 amount
    );
    event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
    event StrandedFundsRecovered(address indexed token, address indexed to, uint256 amount);
}

/// ABI tuple of a request:
/// `(dstChain, dstPoolId, remoteControllerXChain, vault, originWallet, dstWallet, amount,
///   slippageFactor, dstGasForCall, data)`.
pub type RequestTuple = (u16, U256, Bytes, Address, Address, Address, U256, U256, U256, Bytes);

fn request_from_abi(t: RequestTuple) -> CrossChainRequest {
    let (
        dst_chain,
        dst_pool_id,
        dst_controller,
        vault,
        origin_wallet,
        dst_wallet,
        amount,
        slippage_factor,
        dst_gas_for_call,
        data,
    ) = t;
    CrossChainRequest {
        dst_chain,
        dst_pool_id,
        dst_controller: dst_controller.0,
        vault,
        origin_wallet,
        dst_wallet,
        amount,
        slippage_factor,
        dst_gas_for_call,
        data: data.0,
    }
}

fn direction_from_abi(direction: u8) -> Result<Direction, XChainError> {
    Direction::try_from(direction).map_err(|_| XChainError::InvalidDirection(direction))
}

sol_storage! {
    #[entrypoint]
    pub struct ControllerXChain {
        bool initialized;
        address owner;

        /// Transport wiring.
        address transport_endpoint;
        address value_transfer_router;
        uint16 current_chain;
        uint256 pool_id;

        /// Settlement asset and price sources.
        address swap_router;
        address stablecoin;
        address wrapped_native;
        address stablecoin_price_feed;
        address native_price_feed;
        uint256 default_slippage;

        /// Zero means the built-in default.
        uint256 dst_gas_ceiling;

        /// Next expected permit nonce per signer.
        mapping(address => uint256) nonces;

        /// Outbound packets sent so far.
        uint64 packet_sequence;

        /// Processed inbound deliveries, keyed by `delivery_key`.
        mapping(bytes32 => bool) delivered;
    }
}

#[public]
impl ControllerXChain {
    /// One-shot owner assignment for proxy-style deployments.
    pub fn initialize(&mut self, owner: Address) -> Result<(), Vec<u8>> {
        if self.initialized.get() {
            return Err(revert_data(XChainError::AlreadyInitialized));
        }
        if owner == Address::ZERO {
            return Err(revert_data(XChainError::ZeroAddress));
        }
        self.initialized.set(true);
        self.owner.set(owner);
        log(self.vm(), OwnershipTransferred {
            previousOwner: Address::ZERO,
            newOwner: owner,
        });
        Ok(())
    }

    pub fn owner(&self) -> Address {
        self.owner.get()
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<(), Vec<u8>> {
        self.only_owner()?;
        if new_owner == Address::ZERO {
            return Err(revert_data(XChainError::ZeroAddress));
        }
        let previous = self.owner.get();
        self.owner.set(new_owner);
        log(self.vm(), OwnershipTransferred {
            previousOwner: previous,
            newOwner: new_owner,
        });
        Ok(())
    }

    pub fn set_key_x_chain_params(
        &mut self,
        transport_endpoint: Address,
        value_transfer_router: Address,
        current_chain: u16,
        pool_id: U256,
    ) -> Result<(), Vec<u8>> {
        self.only_owner()?;
        self.transport_endpoint.set(transport_endpoint);
        self.value_transfer_router.set(value_transfer_router);
        self.current_chain.set(U16::from(current_chain));
        self.pool_id.set(pool_id);
        Ok(())
    }

    /// `(transportEndpoint, valueTransferRouter, currentChain, poolId)`
    pub fn key_x_chain_params(&self) -> (Address, Address, u16, U256) {
        let key = self.config().key;
        (key.transport_endpoint, key.value_transfer_router, key.current_chain, key.pool_id)
    }

    pub fn set_swap_params(
        &mut self,
        router: Address,
        stablecoin: Address,
        wrapped_native: Address,
        stablecoin_price_feed: Address,
        native_price_feed: Address,
        default_slippage: U256,
    ) -> Result<(), Vec<u8>> {
        self.only_owner()?;
        validate_default_slippage(default_slippage).map_err(revert_data)?;
        self.swap_router.set(router);
        self.stablecoin.set(stablecoin);
        self.wrapped_native.set(wrapped_native);
        self.stablecoin_price_feed.set(stablecoin_price_feed);
        self.native_price_feed.set(native_price_feed);
        self.default_slippage.set(default_slippage);
        Ok(())
    }

    /// `(router, stablecoin, wrappedNative, stablecoinPriceFeed, nativePriceFeed, defaultSlippage)`
    pub fn swap_params(&self) -> (Address, Address, Address, Address, Address, U256) {
        let swap = self.config().swap;
        (
            swap.router,
            swap.stablecoin,
            swap.wrapped_native,
            swap.stablecoin_price_feed,
            swap.native_price_feed,
            swap.default_slippage,
        )
    }

    pub fn set_dst_gas_ceiling(&mut self, ceiling: U256) -> Result<(), Vec<u8>> {
        self.only_owner()?;
        self.dst_gas_ceiling.set(ceiling);
        Ok(())
    }

    /// Effective ceiling (the default when unset).
    pub fn dst_gas_ceiling(&self) -> U256 {
        self.config().effective_dst_gas_ceiling()
    }

    /// Governance path for funds stranded by an undeliverable or malformed message.
    pub fn recover_stranded_funds(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Vec<u8>> {
        self.only_owner()?;
        if to == Address::ZERO {
            return Err(revert_data(XChainError::ZeroAddress));
        }
        let mut host = self.host();
        host.transfer(token, to, amount)
            .map_err(|e| revert_data(XChainError::External(e)))?;
        log(self.vm(), StrandedFundsRecovered { token, to, amount });
        Ok(())
    }

    pub fn nonces(&self, signer: Address) -> U256 {
        self.nonces.get(signer)
    }

    pub fn packet_sequence(&self) -> u64 {
        self.packet_sequence.get().to::<u64>()
    }

    pub fn is_delivered(&self, key: B256) -> bool {
        self.delivered.get(key)
    }

    pub fn delivery_key(&self, src_chain: u16, src_address: Bytes, nonce: U256) -> B256 {
        delivery_key(src_chain, &src_address.0, nonce)
    }

    pub fn domain_separator(&self) -> B256 {
        domain_separator(&permit_domain(&self.host()))
    }

    pub fn encode_deposit_request(
        &self,
        vault: Address,
        amount: U256,
        slippage_factor: U256,
        dst_wallet: Address,
        data: Bytes,
    ) -> Bytes {
        Bytes::from(xchain_controller_types::encode_deposit_request(
            vault,
            amount,
            slippage_factor,
            dst_wallet,
            &data.0,
        ))
    }

    pub fn encode_withdrawal_request(&self, dst_wallet: Address) -> Bytes {
        Bytes::from(xchain_controller_types::encode_withdrawal_request(dst_wallet))
    }

    pub fn get_deposit_quote(&self, request: RequestTuple) -> Result<U256, Vec<u8>> {
        coordinator::quote_deposit(self, &self.host(), &request_from_abi(request))
            .map_err(revert_data)
    }

    pub fn get_withdrawal_quote(&self, request: RequestTuple) -> Result<U256, Vec<u8>> {
        coordinator::quote_withdrawal(self, &self.host(), &request_from_abi(request))
            .map_err(revert_data)
    }

    pub fn get_permit_quote(
        &self,
        request: RequestTuple,
        direction: u8,
        xcfee: U256,
    ) -> Result<U256, Vec<u8>> {
        let direction = direction_from_abi(direction).map_err(revert_data)?;
        coordinator::quote_permit(self, &self.host(), &request_from_abi(request), direction, xcfee)
            .map_err(revert_data)
    }

    #[payable]
    pub fn send_x_chain_deposit_request(&mut self, request: RequestTuple) -> Result<(), Vec<u8>> {
        let ctx = SendContext::direct(self.vm().msg_sender(), self.vm().msg_value());
        let mut host = self.host();
        let request = request_from_abi(request);
        let receipt = coordinator::send_deposit_request(self, &mut host, &request, &ctx)
            .map_err(revert_data)?;
        self.emit_send(&receipt);
        Ok(())
    }

    #[payable]
    pub fn send_x_chain_withdrawal_request(
        &mut self,
        request: RequestTuple,
    ) -> Result<(), Vec<u8>> {
        let ctx = SendContext::direct(self.vm().msg_sender(), self.vm().msg_value());
        let mut host = self.host();
        let request = request_from_abi(request);
        let receipt = coordinator::send_withdrawal_request(self, &mut host, &request, &ctx)
            .map_err(revert_data)?;
        self.emit_send(&receipt);
        Ok(())
    }

    /// Relayed send: the origin wallet signed the request off-chain, the caller pays the native
    /// fee and is reimbursed `xcfee` worth of stablecoin.
    #[payable]
    pub fn send_request_with_permit(
        &mut self,
        request: RequestTuple,
        direction: u8,
        xcfee: U256,
        nonce: U256,
        deadline: U256,
        v: u8,
        r: B256,
        s: B256,
    ) -> Result<(), Vec<u8>> {
        let permit = SendRequestPermit {
            request: request_from_abi(request),
            direction: direction_from_abi(direction).map_err(revert_data)?,
            xc_fee: xcfee,
            nonce,
            deadline,
        };
        let signature = PermitSignature { v, r, s };
        let (relayer, value) = (self.vm().msg_sender(), self.vm().msg_value());
        let mut host = self.host();
        let receipt =
            coordinator::request_with_permit(self, &mut host, relayer, value, &permit, &signature)
                .map_err(revert_data)?;
        self.emit_send(&receipt);
        Ok(())
    }

    /// Transport receive callback (`IStargateReceiver.sgReceive`).
    pub fn sg_receive(
        &mut self,
        src_chain: u16,
        src_address: Bytes,
        nonce: U256,
        token: Address,
        amount_ld: U256,
        payload: Bytes,
    ) -> Result<(), Vec<u8>> {
        let delivery = InboundDelivery {
            caller: self.vm().msg_sender(),
            src_chain,
            src_address: &src_address.0,
            nonce,
            token,
            amount: amount_ld,
            payload: &payload.0,
        };
        let mut host = self.host();
        let outcome = reconcile::receive(self, &mut host, &delivery).map_err(revert_data)?;
        self.emit_reconciliation(src_chain, &outcome);
        Ok(())
    }
}

impl ControllerXChain {
    fn host(&self) -> OnchainHost {
        let vm = self.vm();
        OnchainHost::new(vm.contract_address(), vm.chain_id(), vm.block_timestamp())
    }

    fn only_owner(&self) -> Result<(), Vec<u8>> {
        self.config().ensure_owner(self.vm().msg_sender()).map_err(revert_data)
    }

    fn emit_send(&self, receipt: &SendReceipt) {
        log(
            self.vm(),
            SendMsg {
                msgType: receipt.kind as u8,
                nonce: receipt.sequence,
            },
        );
    }

    fn emit_reconciliation(&self, src_chain: u16, outcome: &Reconciliation) {
        match *outcome {
            Reconciliation::Deposit {
                vault,
                recipient,
                amount,
                shares,
            } => log(
                self.vm(),
                XChainDepositReceived {
                    srcChain: src_chain,
                    vault,
                    recipient,
                    amount,
                    shares,
                },
            ),
            Reconciliation::Withdrawal { recipient, amount } => log(
                self.vm(),
                XChainWithdrawalReceived {
                    srcChain: src_chain,
                    recipient,
                    amount,
                },
            ),
        }
    }
}

impl ControllerState for ControllerXChain {
    fn config(&self) -> XChainConfig {
        XChainConfig {
            owner: self.owner.get(),
            key: KeyXChainParams {
                transport_endpoint: self.transport_endpoint.get(),
                value_transfer_router: self.value_transfer_router.get(),
                current_chain: self.current_chain.get().to::<u16>(),
                pool_id: self.pool_id.get(),
            },
            swap: SwapParams {
                router: self.swap_router.get(),
                stablecoin: self.stablecoin.get(),
                wrapped_native: self.wrapped_native.get(),
                stablecoin_price_feed: self.stablecoin_price_feed.get(),
                native_price_feed: self.native_price_feed.get(),
                default_slippage: self.default_slippage.get(),
            },
            dst_gas_ceiling: self.dst_gas_ceiling.get(),
        }
    }

    fn nonce_of(&self, signer: Address) -> U256 {
        self.nonces.get(signer)
    }

    fn set_nonce(&mut self, signer: Address, nonce: U256) {
        self.nonces.insert(signer, nonce);
    }

    fn next_sequence(&mut self) -> u64 {
        let next = self.packet_sequence.get().to::<u64>().saturating_add(1);
        self.packet_sequence.set(U64::from(next));
        next
    }

    fn record_delivery(&mut self, key: B256) -> bool {
        if self.delivered.get(key) {
            return false;
        }
        self.delivered.insert(key, true);
        true
    }
}
