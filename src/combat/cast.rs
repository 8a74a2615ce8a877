//! Results of trying to start a cast

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::{CooldownId, SimTime};
use crate::entity::resources::ResourceKind;

/// Why a cast did not start. Rejections are ordinary outcomes, not errors.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    #[display(fmt = "already casting")]
    Casting,
    #[display(fmt = "on global cooldown")]
    OnGlobalCooldown,
    #[display(fmt = "on cooldown ({})", _0)]
    OnCooldown(CooldownId),
    #[display(fmt = "not enough {:?}", _0)]
    InsufficientResource(ResourceKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastAttempt {
    /// The cast started; instant casts have already resolved.
    Cast { completes_at: SimTime },
    Rejected(RejectReason),
}

impl CastAttempt {
    pub fn is_cast(&self) -> bool {
        matches!(self, CastAttempt::Cast { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(
            RejectReason::OnCooldown(CooldownId(4)).to_string(),
            "on cooldown (cd#4)"
        );
        assert_eq!(
            RejectReason::InsufficientResource(ResourceKind::Rage).to_string(),
            "not enough Rage"
        );
    }
}
