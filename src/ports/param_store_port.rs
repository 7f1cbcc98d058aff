//! Per-user parameter persistence port trait.

use crate::domain::error::SignalPulseError;
use crate::domain::request::AllocationRequest;

/// Keyed store: user identity to last-used allocation parameters.
pub trait ParamStorePort {
    fn load(&self, user: &str) -> Result<Option<AllocationRequest>, SignalPulseError>;

    fn save(&self, user: &str, request: &AllocationRequest) -> Result<(), SignalPulseError>;

    /// Stored parameters for `user`, or `defaults` on first use.
    fn load_or(
        &self,
        user: &str,
        defaults: &AllocationRequest,
    ) -> Result<AllocationRequest, SignalPulseError> {
        Ok(self
            .load(user)?
            .map(|r| r.normalized())
            .unwrap_or(*defaults))
    }
}
