//! Transaction records and their canonical encoding.
//!
//! Records arrive as JSON. Fields the builder does not interpret are kept in
//! `extra` maps so that re-encoding a parsed record reproduces it.

use crate::hash::{double_sha256, hash_concat, Hash};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction has no inputs")]
    NoInputs,
    #[error("first input txid is not valid hex")]
    InvalidInputTxid,
    #[error("canonical encoding failed: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, TransactionError>;

/// Witness stack attached to an input.
///
/// Item 0 is the signature and item 1 the public key, both hex encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Witness(pub Vec<String>);

impl Witness {
    /// Build a witness from a signature and a public key.
    pub fn new(signature_hex: impl Into<String>, public_key_hex: impl Into<String>) -> Self {
        Self(vec![signature_hex.into(), public_key_hex.into()])
    }

    /// The hex signature, if present.
    pub fn signature(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The hex public key, if present.
    pub fn public_key(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// Both halves, only when the stack carries at least two items.
    pub fn signature_and_key(&self) -> Option<(&str, &str)> {
        Some((self.signature()?, self.public_key()?))
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Id of the transaction being spent.
    pub txid: String,
    /// Optional signature + public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    /// Fields carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TxInput {
    /// An unsigned input spending `txid`.
    pub fn new(txid: impl Into<String>) -> Self {
        Self {
            txid: txid.into(),
            witness: None,
            extra: Map::new(),
        }
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    pub scriptpubkey: String,
    pub value: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TxOutput {
    pub fn new(scriptpubkey: impl Into<String>, value: u64) -> Self {
        Self {
            scriptpubkey: scriptpubkey.into(),
            value,
            extra: Map::new(),
        }
    }
}

/// An input as it appears in the signed payload: everything but the witness.
#[derive(Serialize)]
struct StrippedInput<'a> {
    txid: &'a str,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// One element of the concatenated `vin ++ vout` sequence.
#[derive(Serialize)]
#[serde(untagged)]
enum PayloadEntry<'a> {
    Input(StrippedInput<'a>),
    Output(&'a TxOutput),
}

/// A candidate transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex SHA-256 of the first input's txid followed by the canonical payload.
    pub txid: String,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
    /// Ordering key inside a block; lower goes first.
    #[serde(default)]
    pub priority: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Create a transaction whose `txid` is computed from its contents.
    pub fn new(vin: Vec<TxInput>, vout: Vec<TxOutput>, priority: f64) -> Result<Self> {
        let mut tx = Self {
            txid: String::new(),
            vin,
            vout,
            priority,
            extra: Map::new(),
        };
        tx.txid = tx.compute_txid()?;
        Ok(tx)
    }

    /// The first input, which carries the identifying txid and the witness.
    pub fn first_input(&self) -> Result<&TxInput> {
        self.vin.first().ok_or(TransactionError::NoInputs)
    }

    /// Compact JSON of `vin ++ vout` as one array, witnesses stripped.
    ///
    /// The witness signs this payload, so it cannot be part of it.
    pub fn canonical_payload(&self) -> Result<String> {
        let entries: Vec<PayloadEntry<'_>> = self
            .vin
            .iter()
            .map(|input| {
                PayloadEntry::Input(StrippedInput {
                    txid: &input.txid,
                    extra: &input.extra,
                })
            })
            .chain(self.vout.iter().map(PayloadEntry::Output))
            .collect();
        serde_json::to_string(&entries).map_err(|e| TransactionError::Encoding(e.to_string()))
    }

    /// Compact JSON of the whole record, used as the Merkle leaf preimage.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| TransactionError::Encoding(e.to_string()))
    }

    /// Recompute the identifier from the record's contents.
    pub fn compute_txid(&self) -> Result<String> {
        let first = self.first_input()?;
        let payload = self.canonical_payload()?;
        Ok(hash_concat(&[first.txid.as_bytes(), payload.as_bytes()]).to_hex())
    }

    /// Bytes covered by the first input's witness signature:
    /// the decoded first-input txid followed by the canonical payload.
    pub fn signing_message(&self) -> Result<Vec<u8>> {
        let first = self.first_input()?;
        let mut message =
            hex::decode(&first.txid).map_err(|_| TransactionError::InvalidInputTxid)?;
        message.extend_from_slice(self.canonical_payload()?.as_bytes());
        Ok(message)
    }

    /// Merkle leaf hash (double SHA-256 of the canonical record).
    pub fn leaf_hash(&self) -> Result<Hash> {
        Ok(double_sha256(&self.canonical_bytes()?))
    }

    /// The witness of the first input, if any.
    pub fn witness(&self) -> Option<&Witness> {
        self.vin.first().and_then(|input| input.witness.as_ref())
    }

    /// Parse a record from JSON text.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;
    use serde_json::json;

    fn sample_inputs() -> Vec<TxInput> {
        vec![TxInput::new("aa".repeat(32))]
    }

    fn sample_outputs() -> Vec<TxOutput> {
        vec![TxOutput::new("0014deadbeef", 5_000), TxOutput::new("0014cafe", 42)]
    }

    #[test]
    fn test_new_computes_txid() {
        let tx = Transaction::new(sample_inputs(), sample_outputs(), 1.0).unwrap();
        assert_eq!(tx.txid, tx.compute_txid().unwrap());
        assert_eq!(tx.txid.len(), 64);
    }

    #[test]
    fn test_txid_formula() {
        let tx = Transaction::new(sample_inputs(), sample_outputs(), 1.0).unwrap();
        let preimage = format!("{}{}", "aa".repeat(32), tx.canonical_payload().unwrap());
        assert_eq!(tx.txid, sha256(preimage.as_bytes()).to_hex());
    }

    #[test]
    fn test_canonical_payload_concatenates_inputs_then_outputs() {
        let tx = Transaction::new(sample_inputs(), sample_outputs(), 1.0).unwrap();
        let payload: Value = serde_json::from_str(&tx.canonical_payload().unwrap()).unwrap();
        let entries = payload.as_array().unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["txid"], json!("aa".repeat(32)));
        assert_eq!(entries[1]["value"], json!(5_000));
        assert_eq!(entries[2]["scriptpubkey"], json!("0014cafe"));
    }

    #[test]
    fn test_witness_excluded_from_payload_but_not_leaf() {
        let plain = Transaction::new(sample_inputs(), sample_outputs(), 1.0).unwrap();
        let mut signed = plain.clone();
        signed.vin[0].witness = Some(Witness::new("3044", "02ab"));

        assert_eq!(
            signed.canonical_payload().unwrap(),
            plain.canonical_payload().unwrap()
        );
        assert_eq!(signed.compute_txid().unwrap(), plain.txid);
        assert_ne!(signed.leaf_hash().unwrap(), plain.leaf_hash().unwrap());
    }

    #[test]
    fn test_no_inputs() {
        assert_eq!(
            Transaction::new(vec![], sample_outputs(), 0.0),
            Err(TransactionError::NoInputs)
        );
    }

    #[test]
    fn test_priority_excluded_from_txid() {
        let a = Transaction::new(sample_inputs(), sample_outputs(), 1.0).unwrap();
        let b = Transaction::new(sample_inputs(), sample_outputs(), 7.0).unwrap();
        assert_eq!(a.txid, b.txid);
        assert_ne!(a.leaf_hash().unwrap(), b.leaf_hash().unwrap());
    }

    #[test]
    fn test_parse_preserves_extra_fields() {
        let raw = json!({
            "txid": "00",
            "version": 2,
            "locktime": 0,
            "vin": [{
                "txid": "ab",
                "vout": 1,
                "sequence": 4294967295u64,
                "witness": ["3044", "02ff"]
            }],
            "vout": [{ "scriptpubkey": "51", "value": 10, "scriptpubkey_type": "p2tr" }],
            "priority": 3
        });
        let tx: Transaction = serde_json::from_value(raw).unwrap();

        assert_eq!(tx.priority, 3.0);
        assert_eq!(tx.extra["version"], json!(2));
        assert_eq!(tx.vin[0].extra["sequence"], json!(4294967295u64));
        assert_eq!(tx.vout[0].extra["scriptpubkey_type"], json!("p2tr"));
        assert_eq!(
            tx.witness().and_then(Witness::signature_and_key),
            Some(("3044", "02ff"))
        );
    }

    #[test]
    fn test_canonical_encoding_is_stable_across_reparse() {
        let tx = Transaction::new(sample_inputs(), sample_outputs(), 2.0).unwrap();
        let json = String::from_utf8(tx.canonical_bytes().unwrap()).unwrap();
        let reparsed = Transaction::from_json(&json).unwrap();

        assert_eq!(reparsed.canonical_bytes().unwrap(), tx.canonical_bytes().unwrap());
        assert_eq!(reparsed.compute_txid().unwrap(), tx.txid);
    }

    #[test]
    fn test_missing_required_field_fails_to_parse() {
        assert!(Transaction::from_json(r#"{"vin": [], "vout": []}"#).is_err());
    }

    #[test]
    fn test_witness_accessors() {
        assert_eq!(Witness::default().signature_and_key(), None);
        assert_eq!(Witness(vec!["sig".into()]).signature_and_key(), None);
        assert_eq!(
            Witness::new("sig", "key").signature_and_key(),
            Some(("sig", "key"))
        );
    }

    #[test]
    fn test_signing_message_requires_hex_txid() {
        let tx = Transaction::new(vec![TxInput::new("not-hex")], sample_outputs(), 0.0).unwrap();
        assert_eq!(tx.signing_message(), Err(TransactionError::InvalidInputTxid));

        let tx = Transaction::new(sample_inputs(), sample_outputs(), 0.0).unwrap();
        let message = tx.signing_message().unwrap();
        assert_eq!(&message[..32], &[0xAA; 32]);
        assert_eq!(&message[32..], tx.canonical_payload().unwrap().as_bytes());
    }
}
