use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use log::info;
use rand::rngs::OsRng;

use super::block::Block;
use super::chain::{Blockchain, BlockchainError};
use super::crypto::{Address, CryptoError, DigitalSignature};
use super::transaction::Transaction;

/// Represents a wallet with a keypair
///
/// The signing key never leaves the wallet except through
/// [`Wallet::export_secret_key`]; the address is the public identity.
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn new() -> Result<Self, CryptoError> {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        Ok(Self::from_signing_key(signing_key))
    }

    /// Creates a wallet from an existing secret key
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_array: [u8; 32] = secret_key_bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes_array)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key);

        Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Gets the wallet's public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Signs a message with the wallet's private key
    pub fn sign(&self, message: &[u8]) -> DigitalSignature {
        let signature = self.signing_key.sign(message);
        DigitalSignature::from_signature(&signature)
    }

    /// Exports the wallet's secret key as bytes
    pub fn export_secret_key(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }

    /// Pays `amount` to `payee` by appending a signed transaction to `chain`
    ///
    /// Blocks while the new block is mined.
    pub fn send_money(
        &self,
        chain: &Blockchain,
        amount: f64,
        payee: &Address,
    ) -> Result<Block, BlockchainError> {
        let transaction = Transaction::new(amount, self.address.clone(), payee.clone());
        let signature = self.sign(transaction.canonical_encoding().as_bytes());

        info!("Sending {} from {} to {}", amount, self.address, payee);
        chain.append_transaction(transaction, &self.address, &signature)
    }
}
