//! Request owner resolution
//!
//! Turns the identity headers of a request into the owning [`User`], whose
//! namespace scopes every model operation. Token and membership lookups go
//! through the [`TokenCache`] and [`MembershipService`] seams.

pub mod cache;
pub mod credentials;
pub mod membership;
pub mod resolver;
pub mod users;

// Re-export commonly used types
pub use cache::{access_token_key, InMemoryTokenCache, TokenCache};
pub use credentials::Credentials;
pub use membership::{LocalMembership, MembershipService};
pub use resolver::OwnerResolver;
pub use users::User;
