use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("table '{name}' has not been published")]
    NotPublished { name: String },

    #[error("table '{name}' is already published")]
    AlreadyPublished { name: String },

    #[error("table '{name}' has a different key/value layout")]
    WrongTableType { name: String },
}

lazy_static! {
    static ref TABLES: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>> =
        Mutex::new(HashMap::new());
}

/// Make a table reachable under a stable name. The dataplane side publishes
/// its tables at startup; control tools attach with [`open`].
pub fn publish<T: Any + Send + Sync>(name: &str, table: Arc<T>) -> Result<(), StoreError> {
    let mut tables = TABLES.lock().unwrap();
    if tables.contains_key(name) {
        return Err(StoreError::AlreadyPublished {
            name: name.to_string(),
        });
    }
    tables.insert(name.to_string(), table);
    Ok(())
}

/// Acquire a handle to a published table. Fails when nothing has been
/// published under `name`, typically because the engine side is not up yet.
pub fn open<T: Any + Send + Sync>(name: &str) -> Result<Arc<T>, StoreError> {
    let tables = TABLES.lock().unwrap();
    let entry = tables.get(name).ok_or_else(|| StoreError::NotPublished {
        name: name.to_string(),
    })?;
    Arc::clone(entry)
        .downcast::<T>()
        .map_err(|_| StoreError::WrongTableType {
            name: name.to_string(),
        })
}

/// Remove a published name. Existing handles stay valid; only the name
/// becomes free again.
pub fn unpublish(name: &str) -> bool {
    TABLES.lock().unwrap().remove(name).is_some()
}
