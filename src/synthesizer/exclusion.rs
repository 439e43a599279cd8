use crate::auth::Auth;
use crate::config::Config;

/// Post-processing applied to every synthesized record (model exclusion metadata).
pub trait ModelExclusionHook: Send + Sync {
    fn apply(&self, auth: &mut Auth, config: &Config, auth_kind: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExclusionHook;

impl ModelExclusionHook for NoopExclusionHook {
    fn apply(&self, _auth: &mut Auth, _config: &Config, _auth_kind: &str) {}
}
