use std::collections::BTreeMap;

use rxl_types::Block;

/// Record field that identifies the drug a transaction is about.
pub const DRUG_ID_FIELD: &str = "drug_id";

/// Block indices grouped by drug, in chain order.
///
/// Built from a chain once and then kept current by applying each new block.
/// Blocks without a `drug_id` field (genesis included) are not indexed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvenanceIndex {
    by_drug: BTreeMap<String, Vec<u64>>,
}

impl ProvenanceIndex {
    pub fn build(chain: &[Block]) -> Self {
        let mut index = Self::default();
        for block in chain {
            index.apply(block);
        }
        index
    }

    pub fn apply(&mut self, block: &Block) {
        if let Some(drug_id) = block.data.field(DRUG_ID_FIELD) {
            self.by_drug
                .entry(drug_id.to_string())
                .or_default()
                .push(block.index);
        }
    }

    /// Indices of the blocks recording `drug_id`.
    pub fn indices(&self, drug_id: &str) -> &[u64] {
        self.by_drug
            .get(drug_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Known drug identifiers, sorted.
    pub fn drugs(&self) -> impl Iterator<Item = &str> {
        self.by_drug.keys().map(String::as_str)
    }

    pub fn drug_count(&self) -> usize {
        self.by_drug.len()
    }
}
