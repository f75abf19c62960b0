use anyhow::Result;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// One fjall partition holding JSON-encoded values.
///
/// Failures are logged and swallowed: a broken entry reads as absent.
#[derive(Clone)]
pub struct DiskCollection {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn open(keyspace: &Keyspace, name: &str) -> Result<Self> {
        let partition = keyspace.open_partition(name, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace: keyspace.clone(),
            partition,
        })
    }

    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let res: Result<Option<V>> = (|| {
            if let Some(value) = self.partition.get(key)? {
                debug!("Store HIT for key: {}", key);
                return Ok(Some(serde_json::from_slice(&value)?));
            }
            debug!("Store MISS for key: {}", key);
            Ok(None)
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskCollection get error for {}: {}", key, e);
                None
            }
        }
    }

    /// Writes the value and syncs the journal before returning.
    pub fn put<V: Serialize>(&self, key: &str, value: &V) {
        let res: Result<()> = (|| {
            self.partition.insert(key, serde_json::to_vec(value)?)?;
            self.keyspace.persist(PersistMode::SyncAll)?;
            debug!("Store PUT for key: {}", key);
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCollection put error for {}: {}", key, e);
        }
    }
}
