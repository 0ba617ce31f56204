//! Transaction envelope construction. Envelopes are built unsigned, enriched
//! with simulation output, then handed to the wallet as base64 XDR.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use stellar_xdr::curr as xdr;
use stellar_xdr::curr::{Limits, ReadXdr, WriteXdr};

use crate::amount::Amount;
use crate::codec;
use crate::constants::MEMO_TEXT_MAX;
use crate::error::{Error, Result};
use crate::rpc::SimulateResponse;
use crate::types::{AccountEntry, Network};

#[derive(Clone, Debug)]
pub struct ContractCall {
    pub contract_id: String,
    pub function: String,
    pub args: Vec<xdr::ScVal>,
}

impl ContractCall {
    pub fn new(contract_id: impl Into<String>, function: impl Into<String>) -> ContractCall {
        ContractCall { contract_id: contract_id.into(), function: function.into(), args: Vec::new() }
    }

    pub fn arg(mut self, value: xdr::ScVal) -> ContractCall {
        self.args.push(value);
        self
    }
}

#[derive(Clone, Debug)]
pub struct PaymentIntent {
    pub destination: String,
    pub amount: Amount,
    pub memo: Option<String>,
}

/// What a transaction is meant to do. The pipeline treats both kinds the
/// same; only the operation body differs.
#[derive(Clone, Debug)]
pub enum TxIntent {
    Invoke(ContractCall),
    Payment(PaymentIntent),
}

impl TxIntent {
    pub fn label(&self) -> &str {
        match self {
            TxIntent::Invoke(call) => &call.function,
            TxIntent::Payment(_) => "payment",
        }
    }
}

/// Unix timestamp after which a transaction built now stops being valid.
pub fn deadline(valid_secs: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now.saturating_add(valid_secs)
}

/// Builds an unsigned v1 envelope for `intent`, sourced from `account` at
/// its next sequence number and valid until `valid_until`.
pub fn build_envelope(
    network: &Network,
    account: &AccountEntry,
    intent: &TxIntent,
    valid_until: u64,
) -> Result<xdr::TransactionEnvelope> {
    let source = muxed_account(&account.address)?;
    let body = match intent {
        TxIntent::Invoke(call) => invoke_body(call)?,
        TxIntent::Payment(payment) => payment_body(payment)?,
    };
    let memo = match intent {
        TxIntent::Payment(PaymentIntent { memo: Some(text), .. }) => memo_text(text)?,
        _ => xdr::Memo::None,
    };
    let sequence = account
        .sequence
        .checked_add(1)
        .ok_or_else(|| Error::Xdr("account sequence overflow".into()))?;
    let operations: xdr::VecM<xdr::Operation, 100> =
        vec![xdr::Operation { source_account: None, body }].try_into()?;
    let tx = xdr::Transaction {
        source_account: source,
        fee: network.base_fee,
        seq_num: xdr::SequenceNumber(sequence),
        cond: xdr::Preconditions::Time(xdr::TimeBounds {
            min_time: xdr::TimePoint(0),
            max_time: xdr::TimePoint(valid_until),
        }),
        memo,
        operations,
        ext: xdr::TransactionExt::V0,
    };
    Ok(xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
        tx,
        signatures: xdr::VecM::default(),
    }))
}

/// Splices simulation output into an unsigned envelope: the resource
/// footprint, the resource fee on top of the base fee, and any required
/// authorization entries the operation does not carry yet.
pub fn attach_simulation(
    envelope: &mut xdr::TransactionEnvelope,
    sim: &SimulateResponse,
) -> Result<()> {
    let xdr::TransactionEnvelope::Tx(env) = envelope else {
        return Err(Error::Xdr("expected a v1 transaction envelope".into()));
    };
    if let Some(encoded) = &sim.transaction_data {
        let data =
            xdr::SorobanTransactionData::from_xdr(BASE64.decode(encoded)?, Limits::none())?;
        env.tx.ext = xdr::TransactionExt::V1(data);
    }
    let resource_fee = u32::try_from(sim.min_resource_fee).unwrap_or(u32::MAX);
    env.tx.fee = env.tx.fee.saturating_add(resource_fee);
    if !sim.auth.is_empty() {
        let mut entries = Vec::with_capacity(sim.auth.len());
        for encoded in &sim.auth {
            entries.push(xdr::SorobanAuthorizationEntry::from_xdr(
                BASE64.decode(encoded)?,
                Limits::none(),
            )?);
        }
        let mut operations = env.tx.operations.to_vec();
        for op in &mut operations {
            if let xdr::OperationBody::InvokeHostFunction(invoke) = &mut op.body {
                if invoke.auth.is_empty() {
                    invoke.auth = entries.clone().try_into()?;
                }
            }
        }
        env.tx.operations = operations.try_into()?;
    }
    Ok(())
}

pub fn envelope_to_base64(envelope: &xdr::TransactionEnvelope) -> Result<String> {
    Ok(BASE64.encode(envelope.to_xdr(Limits::none())?))
}

pub fn envelope_from_base64(encoded: &str) -> Result<xdr::TransactionEnvelope> {
    Ok(xdr::TransactionEnvelope::from_xdr(
        BASE64.decode(encoded)?,
        Limits::none(),
    )?)
}

fn muxed_account(address: &str) -> Result<xdr::MuxedAccount> {
    match stellar_strkey::Strkey::from_string(address) {
        Ok(stellar_strkey::Strkey::PublicKeyEd25519(pk)) => {
            Ok(xdr::MuxedAccount::Ed25519(xdr::Uint256(pk.0)))
        }
        _ => Err(Error::invalid_address(address, "expected an account strkey")),
    }
}

fn invoke_body(call: &ContractCall) -> Result<xdr::OperationBody> {
    let contract_address = codec::parse_address(&call.contract_id)?;
    if !matches!(contract_address, xdr::ScAddress::Contract(_)) {
        return Err(Error::invalid_address(&call.contract_id, "expected a contract strkey"));
    }
    let function_name: xdr::StringM<32> = call.function.as_str().try_into()?;
    let args: xdr::VecM<xdr::ScVal> = call.args.clone().try_into()?;
    Ok(xdr::OperationBody::InvokeHostFunction(xdr::InvokeHostFunctionOp {
        host_function: xdr::HostFunction::InvokeContract(xdr::InvokeContractArgs {
            contract_address,
            function_name: xdr::ScSymbol(function_name),
            args,
        }),
        auth: xdr::VecM::default(),
    }))
}

fn payment_body(payment: &PaymentIntent) -> Result<xdr::OperationBody> {
    let destination = muxed_account(&payment.destination)?;
    let stroops = i64::try_from(payment.amount.stroops()).map_err(|_| {
        Error::invalid_amount(&payment.amount.to_string(), "exceeds the classic amount range")
    })?;
    if stroops <= 0 {
        return Err(Error::invalid_amount(&payment.amount.to_string(), "must be positive"));
    }
    Ok(xdr::OperationBody::Payment(xdr::PaymentOp {
        destination,
        asset: xdr::Asset::Native,
        amount: stroops,
    }))
}

fn memo_text(text: &str) -> Result<xdr::Memo> {
    if text.len() > MEMO_TEXT_MAX {
        return Err(Error::InvalidMemo {
            reason: format!("text exceeds {MEMO_TEXT_MAX} bytes"),
        });
    }
    Ok(xdr::Memo::Text(text.try_into()?))
}
