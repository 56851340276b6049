use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::crypto::Address;

/// A transfer of value from one identity to another
///
/// Fields are private: once built, a transaction is only read. Amount sign
/// and identity format are not checked, balance policy is not modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Amount being transferred
    amount: f64,

    /// Payer's identity
    #[schema(value_type = String)]
    payer: Address,

    /// Payee's identity
    #[schema(value_type = String)]
    payee: Address,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `amount` - The amount to transfer
    /// * `payer` - The identity paying
    /// * `payee` - The identity being paid
    pub fn new(amount: f64, payer: Address, payee: Address) -> Self {
        Transaction {
            amount,
            payer,
            payee,
        }
    }

    /// The transaction seeding every chain: 100 from "genesis" to "satoshi"
    pub fn genesis() -> Self {
        Transaction::new(100.0, Address::from("genesis"), Address::from("satoshi"))
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn payer(&self) -> &Address {
        &self.payer
    }

    pub fn payee(&self) -> &Address {
        &self.payee
    }

    /// The bytes that are both signed by wallets and hashed into blocks
    ///
    /// Exactly `amount`, `payer` and `payee`, in that order, as compact JSON.
    pub fn canonical_encoding(&self) -> String {
        format!(
            "{{\"amount\":{},\"payer\":{},\"payee\":{}}}",
            encode_amount(self.amount),
            Value::String(self.payer.0.clone()),
            Value::String(self.payee.0.clone()),
        )
    }
}

/// JSON has no literal for infinities or NaN, so those are written as
/// strings instead of collapsing to `null`.
fn encode_amount(amount: f64) -> String {
    if amount.is_finite() {
        Value::from(amount).to_string()
    } else {
        Value::String(amount.to_string()).to_string()
    }
}
