use tracing::{debug, info, warn};

use rxl_crypto::{BlockHasher, ChainError, HashChainVerifier};
use rxl_store::ChainStore;
use rxl_types::{Block, ParentRef, Payload, Timestamp};

use crate::error::{LedgerError, LedgerResult};
use crate::projection::ProvenanceIndex;
use crate::validation::{ChainValidator, ValidationReport};

/// The authoritative, verifiable sequence of blocks.
///
/// Holds the chain in memory and writes through to `S` on every change. A
/// ledger is `Ready` as soon as [`open`](Self::open) returns; it never
/// refuses appends, even when validation reports a broken chain.
pub struct Ledger<S: ChainStore> {
    store: S,
    chain: Vec<Block>,
    provenance: ProvenanceIndex,
}

impl<S: ChainStore> Ledger<S> {
    /// Load the persisted chain, or create and persist a genesis block when
    /// the store holds no prior state.
    ///
    /// A missing, unreadable, or empty store takes the genesis path. Content
    /// that cannot be decoded is returned as an error rather than replaced.
    /// The loaded chain is not validated; call [`validate`](Self::validate)
    /// for that.
    pub fn open(store: S) -> LedgerResult<Self> {
        let chain = match store.load()? {
            Some(chain) if !chain.is_empty() => {
                info!(location = %store.location(), blocks = chain.len(), "loaded ledger");
                chain
            }
            _ => {
                let chain = vec![Self::genesis_block()?];
                store.save(&chain)?;
                info!(
                    location = %store.location(),
                    hash = %chain[0].hash.short_hex(),
                    "created genesis block"
                );
                chain
            }
        };

        let provenance = ProvenanceIndex::build(&chain);
        Ok(Self {
            store,
            chain,
            provenance,
        })
    }

    fn genesis_block() -> LedgerResult<Block> {
        let timestamp = Timestamp::now();
        let data = Payload::genesis();
        let hash = BlockHasher::BLOCK.digest(0, &timestamp, &data, &ParentRef::Genesis)?;
        Ok(Block {
            index: 0,
            timestamp,
            data,
            previous_hash: ParentRef::Genesis,
            hash,
        })
    }

    /// Append a record and persist it.
    ///
    /// The new block links to the current head. Its timestamp is the current
    /// wall-clock time, held back to the head's timestamp if the clock has
    /// moved backwards. If the store rejects the write the block is dropped
    /// from memory as well and the error is returned.
    pub fn append(&mut self, data: Payload) -> LedgerResult<Block> {
        let previous = self.chain.last().ok_or(LedgerError::EmptyChain)?;

        let index = self.chain.len() as u64;
        let now = Timestamp::now();
        if now < previous.timestamp {
            warn!(
                now = %now,
                head = %previous.timestamp,
                "wall clock behind ledger head; reusing head timestamp"
            );
        }
        let timestamp = now.not_before(&previous.timestamp);
        let previous_hash = ParentRef::Block(previous.hash);
        let hash = BlockHasher::BLOCK.digest(index, &timestamp, &data, &previous_hash)?;

        let block = Block {
            index,
            timestamp,
            data,
            previous_hash,
            hash,
        };

        self.chain.push(block.clone());
        if let Err(e) = self.store.append(&self.chain) {
            self.chain.pop();
            return Err(e.into());
        }
        self.provenance.apply(&block);

        info!(index, hash = %block.hash.short_hex(), "appended block");
        Ok(block)
    }

    /// The whole chain, genesis first.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.chain.get(i))
    }

    /// The most recent block.
    pub fn head(&self) -> Option<&Block> {
        self.chain.last()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Returns `true` if every block after genesis carries a correct hash
    /// and links to the block before it.
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }

    /// Like [`validate`](Self::validate), but names the first failing block.
    pub fn verify(&self) -> Result<(), ChainError> {
        let result = HashChainVerifier::verify_links(&self.chain);
        if let Err(e) = &result {
            debug!(error = %e, "chain verification failed");
        }
        result
    }

    /// Full audit of every block, genesis included, listing all violations.
    pub fn audit(&self) -> ValidationReport {
        ChainValidator::audit(&self.chain)
    }

    /// Blocks recording transactions for `drug_id`, in chain order.
    pub fn history(&self, drug_id: &str) -> Vec<&Block> {
        self.provenance
            .indices(drug_id)
            .iter()
            .filter_map(|&i| self.get(i))
            .collect()
    }

    /// Drug-to-block index maintained alongside the chain.
    pub fn provenance(&self) -> &ProvenanceIndex {
        &self.provenance
    }

    /// Write the whole in-memory chain to the store, replacing its content.
    pub fn persist(&self) -> LedgerResult<()> {
        self.store.save(&self.chain)?;
        debug!(blocks = self.chain.len(), "persisted ledger");
        Ok(())
    }

    /// Replace the in-memory chain with the store's content, as-is.
    ///
    /// Returns `false` and leaves memory untouched when the store holds no
    /// state. No validation is performed.
    pub fn reload(&mut self) -> LedgerResult<bool> {
        match self.store.load()? {
            Some(chain) if !chain.is_empty() => {
                self.provenance = ProvenanceIndex::build(&chain);
                self.chain = chain;
                debug!(blocks = self.chain.len(), "reloaded ledger");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ChainStore> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("location", &self.store.location())
            .field("blocks", &self.chain.len())
            .finish()
    }
}
