/// Transaction types for ChutCoin
use crate::crypto::{self, Address, KeyPair, Sha256Hash, SignatureHex};
use crate::error::ChainError;
use sha2::{Digest, Sha256};

/// Value unit. Signed so that malformed transfers can be represented and rejected.
pub type Amount = i64;

/// A value transfer. `sender == None` marks a mint (mining reward).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub sender: Option<Address>,
    pub recipient: Option<Address>,
    pub amount: Amount,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub signature: Option<SignatureHex>,
}

pub(crate) fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Presence byte followed by a length-prefixed body.
pub(crate) fn update_optional(hasher: &mut Sha256, value: Option<&[u8]>) {
    match value {
        Some(bytes) => {
            hasher.update([1u8]);
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        None => hasher.update([0u8]),
    }
}

impl Transaction {
    pub fn new(sender: Option<Address>, recipient: Option<Address>, amount: Amount) -> Self {
        Self::with_timestamp(sender, recipient, amount, now_millis())
    }

    pub fn with_timestamp(
        sender: Option<Address>,
        recipient: Option<Address>,
        amount: Amount,
        timestamp: u64,
    ) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
            timestamp,
            signature: None,
        }
    }

    /// Convenience constructor for an ordinary signed-to-be transfer.
    pub fn transfer(sender: Address, recipient: Address, amount: Amount) -> Self {
        Self::new(Some(sender), Some(recipient), amount)
    }

    /// System-minted value, exempt from signature checks.
    pub fn mint(recipient: Address, amount: Amount) -> Self {
        Self::new(None, Some(recipient), amount)
    }

    pub fn is_mint(&self) -> bool {
        self.sender.is_none()
    }

    pub fn involves(&self, address: &Address) -> bool {
        self.sender.as_ref() == Some(address) || self.recipient.as_ref() == Some(address)
    }

    /// Hash over sender, recipient, amount and timestamp, in that order.
    pub fn digest(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        update_optional(&mut hasher, self.sender.as_ref().map(Address::as_bytes));
        update_optional(&mut hasher, self.recipient.as_ref().map(Address::as_bytes));
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.digest())
    }

    /// Signs the transaction with the sender's key.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), ChainError> {
        let sender = self.sender.as_ref().ok_or(ChainError::IdentityMismatch)?;
        let signature = crypto::sign(keypair, sender, &self.digest())?;
        self.signature = Some(signature);
        Ok(())
    }

    /// Feeds the block-level encoding of this transaction into `hasher`.
    pub(crate) fn update_block_hasher(&self, hasher: &mut Sha256) {
        hasher.update(self.digest());
        update_optional(hasher, self.signature.as_ref().map(|s| s.as_bytes()));
    }
}
