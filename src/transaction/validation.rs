/// Validation logic for transactions separated from type definitions
use crate::crypto;
use crate::error::ChainError;
use crate::transaction::types::Transaction;

impl Transaction {
    /// Signature check. Mints are always valid; any other transaction must be signed.
    pub fn is_valid(&self) -> Result<bool, ChainError> {
        let sender = match &self.sender {
            Some(sender) => sender,
            None => return Ok(true),
        };

        let signature = match self.signature.as_deref() {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(ChainError::UnsignedTransaction),
        };

        Ok(crypto::verify(sender, &self.digest(), signature))
    }

    /// Stateless admission checks, in the order the ledger applies them.
    /// The balance check needs the chain and lives in the ledger.
    pub fn validate_for_admission(&self) -> Result<(), ChainError> {
        if self.sender.is_none() || self.recipient.is_none() {
            return Err(ChainError::MissingEndpoint);
        }

        if !self.is_valid()? {
            return Err(ChainError::InvalidSignature);
        }

        if self.amount <= 0 {
            return Err(ChainError::NonPositiveAmount);
        }

        Ok(())
    }
}
