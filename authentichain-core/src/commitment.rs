//! Write-once store binding metadata digests to data digests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegistryError, Result};
use crate::hasher::{self, DataEncoding};
use crate::metadata::Metadata;
use crate::primitives::{Address, Digest};

/// A stored commitment. Never modified or removed once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentRecord {
    pub metadata: Metadata,
    pub data_digest: Digest,
}

/// Notification produced by a successful insert, for external indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentSaved {
    pub committer: Address,
    pub metadata_digest: Digest,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitmentStore {
    encoding: DataEncoding,
    records: HashMap<Digest, CommitmentRecord>,
}

impl CommitmentStore {
    pub fn new(encoding: DataEncoding) -> Self {
        Self {
            encoding,
            records: HashMap::new(),
        }
    }

    pub fn encoding(&self) -> DataEncoding {
        self.encoding
    }

    /// Digest of a payload under this store's data encoding.
    pub fn data_digest(&self, data: &[u8]) -> Digest {
        hasher::data_digest(data, self.encoding)
    }

    /// Commit `data` under `metadata`. Rejects a second insert for the same
    /// metadata digest without touching the existing record.
    pub fn insert(
        &mut self,
        committer: Address,
        metadata: Metadata,
        data: &[u8],
    ) -> Result<CommitmentSaved> {
        let metadata_digest = metadata.digest();
        if self.records.contains_key(&metadata_digest) {
            return Err(RegistryError::AlreadyCommitted(metadata_digest));
        }

        let data_digest = self.data_digest(data);
        self.records.insert(
            metadata_digest,
            CommitmentRecord {
                metadata: metadata.clone(),
                data_digest,
            },
        );

        info!(
            committer = %committer,
            metadata_digest = %metadata_digest,
            data_digest = %data_digest,
            "Commitment saved"
        );

        Ok(CommitmentSaved {
            committer,
            metadata_digest,
            metadata,
        })
    }

    pub fn contains(&self, metadata_digest: &Digest) -> bool {
        self.records.contains_key(metadata_digest)
    }

    pub fn lookup(&self, metadata_digest: &Digest) -> Result<&CommitmentRecord> {
        self.records
            .get(metadata_digest)
            .ok_or(RegistryError::NotCommitted(*metadata_digest))
    }

    pub fn data_digest_for(&self, metadata: &Metadata) -> Result<Digest> {
        self.lookup(&metadata.digest())
            .map(|record| record.data_digest)
    }

    /// Whether `candidate` is the data committed under `metadata`. A missing
    /// commitment is reported as `false`, not as an error.
    pub fn authenticate(&self, metadata: &Metadata, candidate: &[u8]) -> bool {
        match self.data_digest_for(metadata) {
            Ok(expected) => {
                let authentic = self.data_digest(candidate) == expected;
                debug!(authentic, "Authenticated candidate data");
                authentic
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
