use std::{fs, path::PathBuf};

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use xchain_controller_types::{
    permit::domain_separator, permit_digest, Direction, PermitSignature, SendRequestPermit,
};

use xchain_request_encoder::{
    encoder::{domain, parse_signing_key, payload_for, recover_signer, sign_permit},
    types::{parse_address, parse_hex, parse_u256, to_hex, RequestFile},
};

/// Build payloads and EIP-712 permits for the cross-chain vault controller.
///
/// Every command prints a single JSON object on stdout.
#[derive(Parser, Debug)]
#[command(name = "xchain-relayer", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode the payload the controller will bridge for a request.
    Payload {
        #[command(flatten)]
        request: RequestArgs,
        /// Deposit amount after relayer reimbursement (relayed deposits only).
        #[arg(long)]
        net_amount: Option<String>,
    },
    /// Compute the EIP-712 digest of a permit.
    Digest(PermitArgs),
    /// Sign a permit as the request's origin wallet.
    Sign {
        #[command(flatten)]
        permit: PermitArgs,
        /// Hex private key of the origin wallet.
        #[arg(long, env = "SIGNER_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// Recover the signer of a permit signature.
    Recover {
        #[command(flatten)]
        permit: PermitArgs,
        #[arg(long)]
        v: u8,
        #[arg(long)]
        r: String,
        #[arg(long)]
        s: String,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Path to the request JSON file.
    #[arg(long)]
    request: PathBuf,

    #[arg(long, value_enum)]
    direction: DirectionArg,
}

#[derive(Args, Debug)]
struct PermitArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Native fee (wei) the relayer fronts and the signer reimburses.
    #[arg(long, default_value = "0")]
    xc_fee: String,

    /// Signer nonce; read `nonces(originWallet)` from the controller.
    #[arg(long)]
    nonce: String,

    /// Unix timestamp after which the permit is rejected.
    #[arg(long)]
    deadline: String,

    #[arg(long, env = "CHAIN_ID")]
    chain_id: u64,

    /// Controller contract (EIP-712 verifying contract).
    #[arg(long, env = "CONTROLLER_ADDRESS")]
    controller: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    Deposit,
    Withdraw,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Deposit => Direction::Deposit,
            DirectionArg::Withdraw => Direction::Withdraw,
        }
    }
}

fn load_request(path: &PathBuf) -> Result<RequestFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing request JSON in {}", path.display()))
}

fn build_permit(args: &PermitArgs) -> Result<SendRequestPermit> {
    let file = load_request(&args.request.request)?;
    Ok(SendRequestPermit {
        request: file.to_request()?,
        direction: args.request.direction.into(),
        xc_fee: parse_u256("xc-fee", &args.xc_fee)?,
        nonce: parse_u256("nonce", &args.nonce)?,
        deadline: parse_u256("deadline", &args.deadline)?,
    })
}

fn parse_word(field: &str, s: &str) -> Result<B256> {
    let bytes = parse_hex(field, s)?;
    anyhow::ensure!(bytes.len() == 32, "`{field}` must be 32 bytes");
    Ok(B256::from_slice(&bytes))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let out = match &cli.command {
        Command::Payload { request, net_amount } => {
            let parsed = load_request(&request.request)?.to_request()?;
            let net = net_amount
                .as_deref()
                .map(|s| parse_u256("net-amount", s))
                .transpose()?;
            let payload = payload_for(&parsed, request.direction.into(), net);
            json!({ "payload": to_hex(&payload) })
        }
        Command::Digest(args) => {
            let permit = build_permit(args)?;
            let d = domain(args.chain_id, parse_address("controller", &args.controller)?);
            json!({
                "domainSeparator": domain_separator(&d).to_string(),
                "digest": permit_digest(&d, &permit).to_string(),
            })
        }
        Command::Sign { permit: args, private_key } => {
            let permit = build_permit(args)?;
            let d = domain(args.chain_id, parse_address("controller", &args.controller)?);
            let key = parse_signing_key(private_key)?;
            serde_json::to_value(sign_permit(&key, &d, &permit)?)?
        }
        Command::Recover { permit: args, v, r, s } => {
            let permit = build_permit(args)?;
            let d = domain(args.chain_id, parse_address("controller", &args.controller)?);
            let signature = PermitSignature {
                v: *v,
                r: parse_word("r", r)?,
                s: parse_word("s", s)?,
            };
            let signer: Address = recover_signer(permit_digest(&d, &permit), &signature)?;
            json!({
                "signer": signer.to_string(),
                "matchesOriginWallet": signer == permit.request.origin_wallet,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
