//! In-memory chain for exercising the protocol logic: ERC-20 ledger, a Stargate-like router,
//! a 1:N share vault, Chainlink-like feeds, and real secp256k1 recovery.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec,
    vec::Vec,
};

use alloy_primitives::{keccak256, Address, B256, I256, U256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use xchain_controller_types::{
    permit_digest, CrossChainRequest, DepositInstruction, PermitSignature, SendRequestPermit,
};

use crate::{
    authorization::permit_domain,
    errors::XChainError,
    host::{
        BridgeTransfer, Erc20, ExternalCallError, FeeQuoteRequest, PriceFeed, PriceQuote, Runtime,
        Transport, Vault,
    },
    reconcile::{receive, InboundDelivery, Reconciliation},
    registry::{ControllerState, KeyXChainParams, SwapParams, XChainConfig},
};

pub const CONTROLLER: Address = Address::repeat_byte(0xc0);
pub const OWNER: Address = Address::repeat_byte(0x0e);
pub const ENDPOINT: Address = Address::repeat_byte(0xe9);
pub const ROUTER: Address = Address::repeat_byte(0x5a);
pub const USDC: Address = Address::repeat_byte(0x05);
pub const WETH: Address = Address::repeat_byte(0xee);
pub const VAULT: Address = Address::repeat_byte(0x7a);
pub const NATIVE_FEED: Address = Address::repeat_byte(0xf1);
pub const STABLE_FEED: Address = Address::repeat_byte(0xf2);

pub const LOCAL_CHAIN: u16 = 110;
pub const REMOTE_CHAIN: u16 = 111;
pub const START_TIME: u64 = 1_700_000_000;

/// 1 USDC in token units.
pub fn usdc(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000u64)
}

fn revert(target: Address, reason: &str) -> ExternalCallError {
    ExternalCallError::Reverted {
        target,
        data: reason.as_bytes().to_vec(),
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    pub config: XChainConfig,
    pub nonces: BTreeMap<Address, U256>,
    pub sequence: u64,
    pub delivered: BTreeSet<B256>,
}

impl ControllerState for MemoryState {
    fn config(&self) -> XChainConfig {
        self.config
    }

    fn nonce_of(&self, signer: Address) -> U256 {
        self.nonces.get(&signer).copied().unwrap_or_default()
    }

    fn set_nonce(&mut self, signer: Address, nonce: U256) {
        self.nonces.insert(signer, nonce);
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn record_delivery(&mut self, key: B256) -> bool {
        self.delivered.insert(key)
    }
}

/// A send as observed by the router.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPacket {
    pub native_fee: U256,
    pub transfer: BridgeTransfer,
}

#[derive(Clone, Debug)]
pub struct MockChain {
    pub this: Address,
    pub chain_id: u64,
    pub now: u64,
    pub stablecoin: Address,
    pub balances: BTreeMap<(Address, Address), U256>,
    pub allowances: BTreeMap<(Address, Address, Address), U256>,
    pub decimals: BTreeMap<Address, u8>,
    pub fee_quote: U256,
    /// When set, the router reverts every quote and send with these bytes.
    pub router_revert: Option<Vec<u8>>,
    pub sent: Vec<SentPacket>,
    /// Settlement asset released per vault share.
    pub assets_per_share: U256,
    pub vault_revert: Option<Vec<u8>>,
    pub credited: Vec<(Address, U256, DepositInstruction)>,
    pub prices: BTreeMap<Address, PriceQuote>,
}

impl MockChain {
    pub fn new() -> Self {
        let mut chain = Self {
            this: CONTROLLER,
            chain_id: 42_161,
            now: START_TIME,
            stablecoin: USDC,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            decimals: BTreeMap::new(),
            fee_quote: U256::from(1_000_000_000_000_000u64),
            router_revert: None,
            sent: vec![],
            assets_per_share: U256::from(1u64),
            vault_revert: None,
            credited: vec![],
            prices: BTreeMap::new(),
        };
        chain.decimals.insert(USDC, 6);
        chain.decimals.insert(VAULT, 6);
        chain.set_price(NATIVE_FEED, 2_000_00000000, 8);
        chain.set_price(STABLE_FEED, 1_00000000, 8);
        chain
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.balances.get(&(token, owner)).copied().unwrap_or_default()
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let b = self.balance(token, to);
        self.balances.insert((token, to), b + amount);
    }

    pub fn set_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) {
        self.allowances.insert((token, owner, spender), amount);
    }

    pub fn set_price(&mut self, feed: Address, answer: i64, decimals: u8) {
        let quote = PriceQuote {
            answer: I256::try_from(answer).unwrap(),
            decimals,
            updated_at: self.now,
        };
        self.prices.insert(feed, quote);
    }

    fn move_balance(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        let from_balance = self.balance(token, from);
        if from_balance < amount {
            return Err(revert(token, "ERC20: transfer amount exceeds balance"));
        }
        self.balances.insert((token, from), from_balance - amount);
        let to_balance = self.balance(token, to);
        self.balances.insert((token, to), to_balance + amount);
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        let allowance = self.allowances.get(&(token, owner, spender)).copied().unwrap_or_default();
        if allowance < amount {
            return Err(revert(token, "ERC20: insufficient allowance"));
        }
        self.allowances.insert((token, owner, spender), allowance - amount);
        Ok(())
    }
}

impl Runtime for MockChain {
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
        let v = signature.normalized_v()?;
        let recovery_id = RecoveryId::from_byte(v - 27)?;
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(signature.r.as_slice());
        rs[32..].copy_from_slice(signature.s.as_slice());
        let sig = Signature::from_slice(&rs).ok()?;
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id).ok()?;
        Some(address_of(&key))
    }
}

impl Erc20 for MockChain {
    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ExternalCallError> {
        Ok(self.allowances.get(&(token, owner, spender)).copied().unwrap_or_default())
    }

    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ExternalCallError> {
        Ok(self.balance(token, owner))
    }

    fn decimals(&self, token: Address) -> Result<u8, ExternalCallError> {
        self.decimals.get(&token).copied().ok_or_else(|| revert(token, ""))
    }

    fn transfer(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        let this = self.this;
        self.move_balance(token, this, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        let this = self.this;
        self.spend_allowance(token, from, this, amount)?;
        self.move_balance(token, from, to, amount)
    }

    fn approve(
        &mut self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError> {
        let this = self.this;
        self.set_allowance(token, this, spender, amount);
        Ok(())
    }
}

impl Transport for MockChain {
    fn quote_fee(
        &self,
        router: Address,
        _request: &FeeQuoteRequest<'_>,
    ) -> Result<U256, ExternalCallError> {
        if let Some(data) = &self.router_revert {
            return Err(ExternalCallError::Reverted {
                target: router,
                data: data.clone(),
            });
        }
        Ok(self.fee_quote)
    }

    fn send(
        &mut self,
        router: Address,
        native_fee: U256,
        transfer: &BridgeTransfer,
    ) -> Result<(), ExternalCallError> {
        if let Some(data) = &self.router_revert {
            return Err(ExternalCallError::Reverted {
                target: router,
                data: data.clone(),
            });
        }
        if native_fee < self.fee_quote {
            return Err(revert(router, "Stargate: insufficient fee"));
        }
        if transfer.min_amount > transfer.amount {
            return Err(revert(router, "Stargate: slippage too high"));
        }
        let (this, stablecoin) = (self.this, self.stablecoin);
        self.spend_allowance(stablecoin, this, router, transfer.amount)?;
        self.move_balance(stablecoin, this, router, transfer.amount)?;
        self.sent.push(SentPacket {
            native_fee,
            transfer: transfer.clone(),
        });
        Ok(())
    }
}

impl Vault for MockChain {
    fn credit_deposit(
        &mut self,
        vault: Address,
        amount: U256,
        instruction: &DepositInstruction,
    ) -> Result<U256, ExternalCallError> {
        if let Some(data) = &self.vault_revert {
            return Err(ExternalCallError::Reverted {
                target: vault,
                data: data.clone(),
            });
        }
        let (this, asset) = (self.this, self.stablecoin);
        self.spend_allowance(asset, this, vault, amount)?;
        self.move_balance(asset, this, vault, amount)?;
        self.mint(vault, instruction.dst_wallet, amount);
        self.credited.push((vault, amount, instruction.clone()));
        Ok(amount)
    }

    fn debit_for_withdrawal(
        &mut self,
        vault: Address,
        shares: U256,
        recipient: Address,
    ) -> Result<U256, ExternalCallError> {
        if let Some(data) = &self.vault_revert {
            return Err(ExternalCallError::Reverted {
                target: vault,
                data: data.clone(),
            });
        }
        let this = self.this;
        let held = self.balance(vault, this);
        if held < shares {
            return Err(revert(vault, "Vault: burn amount exceeds balance"));
        }
        self.balances.insert((vault, this), held - shares);
        let released = shares * self.assets_per_share;
        let asset = self.stablecoin;
        self.move_balance(asset, vault, recipient, released)?;
        Ok(released)
    }
}

impl PriceFeed for MockChain {
    fn latest_price(&self, feed: Address) -> Result<PriceQuote, ExternalCallError> {
        self.prices.get(&feed).copied().ok_or_else(|| revert(feed, ""))
    }
}

/// One controller deployment plus the chain it lives on. `transact` gives revert semantics:
/// on error, every state change made by the call is discarded.
#[derive(Clone, Debug)]
pub struct Harness {
    pub state: MemoryState,
    pub chain: MockChain,
}

impl Harness {
    /// Fully configured controller with no balances.
    pub fn new() -> Self {
        let mut h = Self::unconfigured();
        h.state.config = XChainConfig {
            owner: OWNER,
            key: KeyXChainParams {
                transport_endpoint: ENDPOINT,
                value_transfer_router: ROUTER,
                current_chain: LOCAL_CHAIN,
                pool_id: U256::from(1u64),
            },
            swap: SwapParams {
                router: Address::repeat_byte(0x11),
                stablecoin: USDC,
                wrapped_native: WETH,
                stablecoin_price_feed: STABLE_FEED,
                native_price_feed: NATIVE_FEED,
                default_slippage: U256::ZERO,
            },
            dst_gas_ceiling: U256::ZERO,
        };
        h
    }

    pub fn unconfigured() -> Self {
        Self {
            state: MemoryState::default(),
            chain: MockChain::new(),
        }
    }

    pub fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut MemoryState, &mut MockChain) -> Result<T, XChainError>,
    ) -> Result<T, XChainError> {
        let snapshot = self.clone();
        let out = f(&mut self.state, &mut self.chain);
        if out.is_err() {
            *self = snapshot;
        }
        out
    }

    /// Give `wallet` `amount` of `token` and approve the controller for all of it.
    pub fn fund(&mut self, token: Address, wallet: Address, amount: U256) {
        self.chain.mint(token, wallet, amount);
        self.chain.set_allowance(token, wallet, CONTROLLER, amount);
    }

    /// Play `packet` into this controller as the transport would: release the bridged stablecoin
    /// to the controller, then invoke the receive callback from the endpoint.
    pub fn deliver(
        &mut self,
        packet: &SentPacket,
        src_chain: u16,
        nonce: u64,
    ) -> Result<Reconciliation, XChainError> {
        let amount = packet.transfer.amount;
        let stablecoin = self.chain.stablecoin;
        self.chain.mint(stablecoin, CONTROLLER, amount);
        let src_address = CONTROLLER.to_vec();
        let payload = packet.transfer.payload.clone();
        self.transact(|state, chain| {
            receive(
                state,
                chain,
                &InboundDelivery {
                    caller: ENDPOINT,
                    src_chain,
                    src_address: &src_address,
                    nonce: U256::from(nonce),
                    token: stablecoin,
                    amount,
                    payload: &payload,
                },
            )
        })
    }
}

pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// An EOA able to sign permits.
pub struct Wallet {
    key: SigningKey,
}

impl Wallet {
    pub fn from_seed(seed: u8) -> Self {
        Self {
            key: SigningKey::from_slice(&[seed; 32]).unwrap(),
        }
    }

    pub fn address(&self) -> Address {
        address_of(self.key.verifying_key())
    }

    pub fn sign<R: Runtime>(&self, rt: &R, permit: &SendRequestPermit) -> PermitSignature {
        let digest = permit_digest(&permit_domain(rt), permit);
        let (mut sig, mut recovery_id) =
            self.key.sign_prehash_recoverable(digest.as_slice()).unwrap();
        if let Some(low) = sig.normalize_s() {
            sig = low;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }
        let bytes = sig.to_bytes();
        PermitSignature {
            v: 27 + recovery_id.to_byte(),
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..]),
        }
    }
}

/// Deposit of 100 USDC from `0xa1..` to `0xb2..` on the remote chain.
pub fn sample_request() -> CrossChainRequest {
    CrossChainRequest {
        dst_chain: REMOTE_CHAIN,
        dst_pool_id: U256::from(1u64),
        dst_controller: CONTROLLER.to_vec(),
        vault: VAULT,
        origin_wallet: Address::repeat_byte(0xa1),
        dst_wallet: Address::repeat_byte(0xb2),
        amount: usdc(100),
        slippage_factor: U256::from(9_900u64),
        dst_gas_for_call: U256::from(200_000u64),
        data: vec![],
    }
}
