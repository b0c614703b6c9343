//! Inbound side: turn a transport delivery (bridged tokens + payload) into a vault credit or a
//! payout to the destination wallet.

use alloy_primitives::{Address, U256};

use xchain_controller_types::{decode_payload, Payload};

use crate::{
    errors::XChainError,
    host::Host,
    registry::{delivery_key, ControllerState},
};

/// Arguments of the transport's receive callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InboundDelivery<'a> {
    /// `msg.sender` of the callback.
    pub caller: Address,
    pub src_chain: u16,
    pub src_address: &'a [u8],
    /// Transport delivery nonce (unrelated to signer nonces).
    pub nonce: U256,
    /// Bridged token, already held by this contract.
    pub token: Address,
    pub amount: U256,
    pub payload: &'a [u8],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    Deposit {
        vault: Address,
        recipient: Address,
        amount: U256,
        shares: U256,
    },
    Withdrawal {
        recipient: Address,
        amount: U256,
    },
}

pub fn receive<S: ControllerState, H: Host>(
    state: &mut S,
    host: &mut H,
    delivery: &InboundDelivery<'_>,
) -> Result<Reconciliation, XChainError> {
    let endpoint = state.config().key.transport_endpoint;
    if endpoint == Address::ZERO {
        return Err(XChainError::TransportNotConfigured);
    }
    if delivery.caller != endpoint {
        return Err(XChainError::OnlyRegisteredEndpoint { caller: delivery.caller });
    }

    let payload = decode_payload(delivery.payload)?;

    let key = delivery_key(delivery.src_chain, delivery.src_address, delivery.nonce);
    if !state.record_delivery(key) {
        return Err(XChainError::DuplicateDelivery {
            src_chain: delivery.src_chain,
            nonce: delivery.nonce,
        });
    }

    match payload {
        Payload::Deposit(instruction) => {
            host.approve(delivery.token, instruction.vault, delivery.amount)?;
            let shares = host.credit_deposit(instruction.vault, delivery.amount, &instruction)?;
            Ok(Reconciliation::Deposit {
                vault: instruction.vault,
                recipient: instruction.dst_wallet,
                amount: delivery.amount,
                shares,
            })
        }
        Payload::Withdrawal(instruction) => {
            host.transfer(delivery.token, instruction.dst_wallet, delivery.amount)?;
            Ok(Reconciliation::Withdrawal {
                recipient: instruction.dst_wallet,
                amount: delivery.amount,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{usdc, Harness, CONTROLLER, ENDPOINT, REMOTE_CHAIN, USDC, VAULT};
    use alloc::vec;
    use alloc::vec::Vec;
    use xchain_controller_types::{encode_deposit_request, encode_withdrawal_request, PayloadError};

    fn delivery<'a>(caller: Address, payload: &'a [u8], nonce: u64) -> InboundDelivery<'a> {
        InboundDelivery {
            caller,
            src_chain: REMOTE_CHAIN,
            src_address: CONTROLLER.as_slice(),
            nonce: U256::from(nonce),
            token: USDC,
            amount: usdc(90),
            payload,
        }
    }

    fn deposit_payload(recipient: Address) -> Vec<u8> {
        encode_deposit_request(VAULT, usdc(90), U256::from(9_900u64), recipient, &[0xab])
    }

    #[test]
    fn deposit_credits_vault_for_destination_wallet() {
        let mut h = Harness::new();
        h.chain.mint(USDC, CONTROLLER, usdc(90));
        let recipient = Address::repeat_byte(0xb2);
        let payload = deposit_payload(recipient);

        let out = h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 1))).unwrap();
        assert_eq!(
            out,
            Reconciliation::Deposit { vault: VAULT, recipient, amount: usdc(90), shares: usdc(90) }
        );
        assert_eq!(h.chain.balance(VAULT, recipient), usdc(90));
        assert_eq!(h.chain.balance(USDC, CONTROLLER), U256::ZERO);
        assert_eq!(h.chain.credited[0].2.data, vec![0xab]);
    }

    #[test]
    fn withdrawal_pays_destination_wallet() {
        let mut h = Harness::new();
        h.chain.mint(USDC, CONTROLLER, usdc(90));
        let recipient = Address::repeat_byte(0xb3);
        let payload = encode_withdrawal_request(recipient);

        let out = h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 1))).unwrap();
        assert_eq!(out, Reconciliation::Withdrawal { recipient, amount: usdc(90) });
        assert_eq!(h.chain.balance(USDC, recipient), usdc(90));
    }

    #[test]
    fn rejects_caller_other_than_endpoint() {
        let mut h = Harness::new();
        h.chain.mint(USDC, CONTROLLER, usdc(90));
        let intruder = Address::repeat_byte(0x66);
        let payload = encode_withdrawal_request(intruder);

        let err = h.transact(|s, c| receive(s, c, &delivery(intruder, &payload, 1))).unwrap_err();
        assert_eq!(err, XChainError::OnlyRegisteredEndpoint { caller: intruder });
        assert_eq!(h.chain.balance(USDC, CONTROLLER), usdc(90));
    }

    #[test]
    fn unset_endpoint_is_a_configuration_error() {
        let mut h = Harness::unconfigured();
        let payload = encode_withdrawal_request(Address::repeat_byte(1));
        let err = h
            .transact(|s, c| receive(s, c, &delivery(Address::ZERO, &payload, 1)))
            .unwrap_err();
        assert_eq!(err, XChainError::TransportNotConfigured);
    }

    #[test]
    fn unknown_discriminator_is_malformed() {
        let mut h = Harness::new();
        let mut payload = encode_withdrawal_request(Address::repeat_byte(1));
        payload[1] = 0x09;
        let err = h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 1))).unwrap_err();
        assert_eq!(err, XChainError::MalformedPayload(PayloadError::UnknownKind(0x09)));
        assert!(h.state.delivered.is_empty());
    }

    #[test]
    fn duplicate_delivery_is_rejected() {
        let mut h = Harness::new();
        h.chain.mint(USDC, CONTROLLER, usdc(180));
        let recipient = Address::repeat_byte(0xb3);
        let payload = encode_withdrawal_request(recipient);

        h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 7))).unwrap();
        let err = h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 7))).unwrap_err();
        assert_eq!(
            err,
            XChainError::DuplicateDelivery {
                src_chain: REMOTE_CHAIN,
                nonce: U256::from(7u64),
            }
        );
        assert_eq!(h.chain.balance(USDC, recipient), usdc(90));

        // A fresh transport nonce is a distinct delivery.
        h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 8))).unwrap();
        assert_eq!(h.chain.balance(USDC, recipient), usdc(180));
    }

    #[test]
    fn failed_credit_leaves_delivery_retryable() {
        let mut h = Harness::new();
        h.chain.mint(USDC, CONTROLLER, usdc(90));
        h.chain.vault_revert = Some(b"Vault: paused".to_vec());
        let payload = deposit_payload(Address::repeat_byte(0xb2));

        let err = h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 1))).unwrap_err();
        assert!(matches!(err, XChainError::External(_)));
        assert!(h.state.delivered.is_empty());

        h.chain.vault_revert = None;
        assert!(h.transact(|s, c| receive(s, c, &delivery(ENDPOINT, &payload, 1))).is_ok());
    }
}
