//! In-process parameter store.

use crate::domain::error::SignalPulseError;
use crate::domain::request::AllocationRequest;
use crate::ports::param_store_port::ParamStorePort;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryParamStore {
    params: RwLock<HashMap<String, AllocationRequest>>,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> SignalPulseError {
    SignalPulseError::Database {
        reason: "parameter store lock poisoned".into(),
    }
}

impl ParamStorePort for MemoryParamStore {
    fn load(&self, user: &str) -> Result<Option<AllocationRequest>, SignalPulseError> {
        let params = self.params.read().map_err(|_| poisoned())?;
        Ok(params.get(user).copied())
    }

    fn save(&self, user: &str, request: &AllocationRequest) -> Result<(), SignalPulseError> {
        let mut params = self.params.write().map_err(|_| poisoned())?;
        params.insert(user.to_string(), request.normalized());
        Ok(())
    }
}
