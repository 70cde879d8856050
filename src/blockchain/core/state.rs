//! Balance and history queries. Both are full scans of the chain; pending
//! transactions are not counted.

use crate::crypto::Address;
use crate::transaction::{Amount, Transaction};

use super::chain::Blockchain;

impl Blockchain {
    /// Confirmed balance of `address`. Summed in `i128` and clamped to the
    /// `Amount` range, so chains whose total supply exceeds `Amount::MAX`
    /// still scan.
    pub fn balance_of(&self, address: &Address) -> Amount {
        let mut total: i128 = 0;
        for tx in self.blocks.iter().flat_map(|b| &b.transactions) {
            if tx.sender.as_ref() == Some(address) {
                total -= i128::from(tx.amount);
            }
            if tx.recipient.as_ref() == Some(address) {
                total += i128::from(tx.amount);
            }
        }
        let balance = Amount::try_from(total).unwrap_or(if total > 0 {
            Amount::MAX
        } else {
            Amount::MIN
        });
        tracing::debug!(address = %address, balance, "balance scanned");
        balance
    }

    /// Every confirmed transaction sending from or to `address`, in chain order.
    pub fn history_of(&self, address: &Address) -> Vec<Transaction> {
        self.blocks
            .iter()
            .flat_map(|b| &b.transactions)
            .filter(|tx| tx.involves(address))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::blockchain::{Block, Blockchain};
    use crate::config::Config;
    use crate::crypto::{Address, KeyPair};
    use crate::transaction::Transaction;

    fn quick_chain() -> Blockchain {
        let mut config = Config::default();
        config.chain.difficulty = 1;
        Blockchain::with_config(&config).unwrap()
    }

    #[test]
    fn test_genesis_only_balances_are_zero() {
        let chain = Blockchain::new();
        assert_eq!(chain.balance_of(&Address::new("anyone")), 0);
        assert_eq!(chain.balance_of(&KeyPair::generate().address()), 0);
        assert!(chain.history_of(&Address::new("anyone")).is_empty());
    }

    #[test]
    fn test_pending_transactions_do_not_count() {
        let mut chain = quick_chain();
        let alice = KeyPair::generate();
        chain.mine_pending_transactions(&alice.address()).unwrap();

        let mut tx = Transaction::transfer(alice.address(), Address::new("bob"), 30);
        tx.sign(&alice).unwrap();
        chain.add_transaction(tx).unwrap();

        assert_eq!(chain.balance_of(&alice.address()), 100);
        assert_eq!(chain.balance_of(&Address::new("bob")), 0);
    }

    #[test]
    fn test_history_preserves_chain_order() {
        let mut chain = quick_chain();
        let alice = KeyPair::generate();
        let bob = Address::new("bob");
        chain.mine_pending_transactions(&alice.address()).unwrap();

        let mut first = Transaction::transfer(alice.address(), bob.clone(), 30);
        first.sign(&alice).unwrap();
        chain.add_transaction(first.clone()).unwrap();
        chain.mine_pending_transactions(&bob).unwrap();

        let mut second = Transaction::transfer(alice.address(), bob.clone(), 20);
        second.sign(&alice).unwrap();
        chain.add_transaction(second.clone()).unwrap();
        chain.mine_pending_transactions(&bob).unwrap();

        let history = chain.history_of(&alice.address());
        assert_eq!(history.len(), 3);
        assert!(history[0].is_mint());
        assert_eq!(history[1], first);
        assert_eq!(history[2], second);

        assert_eq!(chain.balance_of(&alice.address()), 50);
        assert_eq!(chain.balance_of(&bob), 250);
        assert_eq!(chain.history_of(&bob).len(), 4);
    }

    fn push_mint(chain: &mut Blockchain, recipient: &Address, amount: i64) {
        let previous_hash = chain.last_block().hash.clone();
        let timestamp = chain.last_block().timestamp + 1;
        let block = Block::new(
            timestamp,
            vec![Transaction::mint(recipient.clone(), amount)],
            previous_hash,
        );
        chain.blocks.push(block);
    }

    #[test]
    fn test_balance_scan_survives_huge_rewards() {
        let mut chain = quick_chain();
        let miner = KeyPair::generate();
        push_mint(&mut chain, &miner.address(), i64::MAX);
        push_mint(&mut chain, &miner.address(), i64::MAX);

        assert_eq!(chain.balance_of(&miner.address()), i64::MAX);
        assert_eq!(chain.history_of(&miner.address()).len(), 2);

        let mut tx = Transaction::transfer(miner.address(), Address::new("bob"), i64::MAX);
        tx.sign(&miner).unwrap();
        assert!(chain.add_transaction(tx).is_ok());
    }

    #[test]
    fn test_balance_scan_clamps_large_debits() {
        let mut chain = quick_chain();
        let spender = KeyPair::generate();
        let mut tx = Transaction::transfer(spender.address(), Address::new("bob"), i64::MAX);
        tx.sign(&spender).unwrap();

        let previous_hash = chain.last_block().hash.clone();
        let block = Block::new(1, vec![tx.clone(), tx], previous_hash);
        chain.blocks.push(block);

        assert_eq!(chain.balance_of(&spender.address()), i64::MIN);
        assert_eq!(chain.balance_of(&Address::new("bob")), i64::MAX);
    }
}
