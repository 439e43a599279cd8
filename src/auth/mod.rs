//! Runtime authentication identities handed to the routing layer.

mod record;
mod runtime;

pub use record::{Auth, AuthStatus, attr};
pub use runtime::{AuthRuntime, SharedCredential, VirtualCredential};
