//! Service layer
//!
//! Contains business logic separated from the HTTP layer.
//! Services orchestrate the identity store, the credential vault and
//! per-account locking.

mod credential;
mod following;
mod locks;
mod resolver;
mod verification;

pub use credential::CredentialService;
pub use following::{FollowingService, FollowingView};
pub use locks::AccountLocks;
pub use resolver::LinkResolver;
pub use verification::{LinkOutcome, VerificationService};
