use serde::Serialize;

use rxl_crypto::HashChainVerifier;
use rxl_types::Block;

/// Result of a full chain audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub block_count: u64,
    pub hash_chain_valid: bool,
    pub indices_contiguous: bool,
    pub timestamps_monotonic: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if no violation breaks chain integrity.
    ///
    /// Timestamp regressions are reported but do not invalidate the chain.
    pub fn is_valid(&self) -> bool {
        self.violations.iter().all(|v| !v.kind.breaks_integrity())
    }

    /// The first integrity-breaking violation, in chain order.
    pub fn first_failure(&self) -> Option<&Violation> {
        self.violations.iter().find(|v| v.kind.breaks_integrity())
    }
}

/// A specific problem found at one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    GenesisParent,
    IndexGap,
    HashMismatch,
    HashChainBreak,
    TimestampRegression,
}

impl ViolationKind {
    pub fn breaks_integrity(&self) -> bool {
        !matches!(self, Self::TimestampRegression)
    }
}

/// Whole-chain auditor.
///
/// Unlike the short-circuiting link walk behind `Ledger::validate`, the
/// audit covers the genesis block too and keeps going after the first
/// problem so every violation is reported.
pub struct ChainValidator;

impl ChainValidator {
    pub fn audit(blocks: &[Block]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut hash_chain_valid = true;
        let mut indices_contiguous = true;
        let mut timestamps_monotonic = true;

        for (position, block) in blocks.iter().enumerate() {
            let index = position as u64;

            if block.index != index {
                indices_contiguous = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::IndexGap,
                    description: format!("expected index {index}, got {}", block.index),
                });
            }

            if position == 0 && !block.previous_hash.is_genesis() {
                hash_chain_valid = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::GenesisParent,
                    description: "genesis previous_hash is not \"0\"".into(),
                });
            }

            if HashChainVerifier::check_hash(position, block).is_err() {
                hash_chain_valid = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::HashMismatch,
                    description: "stored hash does not match block content".into(),
                });
            }

            if position > 0 {
                let previous = &blocks[position - 1];
                if HashChainVerifier::check_link(position, previous, block).is_err() {
                    hash_chain_valid = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::HashChainBreak,
                        description: "previous_hash does not match prior block".into(),
                    });
                }
                if block.timestamp < previous.timestamp {
                    timestamps_monotonic = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::TimestampRegression,
                        description: format!(
                            "timestamp {} precedes prior block's {}",
                            block.timestamp, previous.timestamp
                        ),
                    });
                }
            }
        }

        ValidationReport {
            block_count: blocks.len() as u64,
            hash_chain_valid,
            indices_contiguous,
            timestamps_monotonic,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use rxl_store::InMemoryChainStore;
    use rxl_types::{Payload, Timestamp};

    use crate::ledger::Ledger;

    use super::*;

    fn ledger_with(records: usize) -> Ledger<InMemoryChainStore> {
        let mut ledger = Ledger::open(InMemoryChainStore::new()).unwrap();
        for i in 0..records {
            ledger
                .append(Payload::record([("drug_id", format!("D{i}"))]))
                .unwrap();
        }
        ledger
    }

    #[test]
    fn valid_chain_passes() {
        let ledger = ledger_with(3);
        let report = ChainValidator::audit(ledger.chain());
        assert!(report.is_valid());
        assert!(report.violations.is_empty());
        assert_eq!(report.block_count, 4);
        assert!(report.first_failure().is_none());
    }

    #[test]
    fn empty_chain_is_valid() {
        let report = ChainValidator::audit(&[]);
        assert!(report.is_valid());
        assert_eq!(report.block_count, 0);
    }

    #[test]
    fn reports_every_violation() {
        let ledger = ledger_with(3);
        let mut blocks = ledger.chain().to_vec();
        blocks[1].data = Payload::record([("drug_id", "forged")]);
        blocks[3].index = 9;

        let report = ChainValidator::audit(&blocks);
        assert!(!report.is_valid());
        assert!(!report.hash_chain_valid);
        assert!(!report.indices_contiguous);

        let kinds: Vec<_> = report.violations.iter().map(|v| (v.index, v.kind)).collect();
        assert!(kinds.contains(&(1, ViolationKind::HashMismatch)));
        assert!(kinds.contains(&(3, ViolationKind::IndexGap)));
        assert!(kinds.contains(&(3, ViolationKind::HashMismatch)));
        assert_eq!(report.first_failure().unwrap().index, 1);
    }

    #[test]
    fn tampered_genesis_is_reported() {
        let ledger = ledger_with(1);
        let mut blocks = ledger.chain().to_vec();
        blocks[0].data = Payload::Text("not genesis".into());

        let report = ChainValidator::audit(&blocks);
        assert_eq!(report.first_failure().unwrap().index, 0);
        assert_eq!(
            report.first_failure().unwrap().kind,
            ViolationKind::HashMismatch
        );
    }

    #[test]
    fn timestamp_regression_is_advisory() {
        let ledger = ledger_with(1);
        let mut blocks = ledger.chain().to_vec();
        // Move genesis into the future and rehash it; relink block 1.
        blocks[0].timestamp = Timestamp::parse("2999-01-01 00:00:00.000000").unwrap();
        blocks[0].hash = rxl_crypto::BlockHasher::BLOCK
            .digest_block(&blocks[0])
            .unwrap();
        blocks[1].previous_hash = blocks[0].hash.into();
        blocks[1].hash = rxl_crypto::BlockHasher::BLOCK
            .digest_block(&blocks[1])
            .unwrap();

        let report = ChainValidator::audit(&blocks);
        assert!(!report.timestamps_monotonic);
        assert!(report.is_valid());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::TimestampRegression);
    }

    #[test]
    fn report_serializes_snake_case_kinds() {
        let ledger = ledger_with(1);
        let mut blocks = ledger.chain().to_vec();
        blocks[1].data = Payload::record([("drug_id", "x")]);
        let json = serde_json::to_value(ChainValidator::audit(&blocks)).unwrap();
        assert_eq!(json["violations"][0]["kind"], "hash_mismatch");
    }
}
