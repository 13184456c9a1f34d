//! Owner resolution
//!
//! Order of precedence: API token, then `jwt-sub`, then `owner-id`. Every
//! collaborator call is bounded by the lookup timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use common::error::{Error, Result};
use common::utils::execute_with_timeout;

use crate::cache::{access_token_key, TokenCache};
use crate::credentials::Credentials;
use crate::membership::MembershipService;
use crate::users::User;

pub struct OwnerResolver {
    cache: Arc<dyn TokenCache>,
    membership: Arc<dyn MembershipService>,
    lookup_timeout: Duration,
}

impl OwnerResolver {
    pub fn new(cache: Arc<dyn TokenCache>, membership: Arc<dyn MembershipService>, lookup_timeout: Duration) -> Self {
        Self {
            cache,
            membership,
            lookup_timeout,
        }
    }

    /// Resolves the owning user of a request
    ///
    /// Token failures are `Unauthenticated`; a malformed or unknown owner is
    /// `NotFound`. Timeouts surface as `Timeout`.
    pub async fn resolve(&self, credentials: &Credentials) -> Result<User> {
        if let Some(token) = &credentials.token {
            return self.resolve_token(token).await;
        }

        if let Some(uid) = &credentials.owner_uid {
            if let Err(e) = Uuid::parse_str(uid) {
                warn!("Malformed owner UID '{}': {}", uid, e);
                return Err(Error::NotFound("Not found".to_string()));
            }
            let permalink = format!("users/{}", uid);
            let lookup = self.membership.lookup_user(&permalink);
            return execute_with_timeout(lookup, self.lookup_timeout, "lookup_user")
                .await
                .map_err(not_found);
        }

        let Some(id) = &credentials.owner_id else {
            debug!("Request carries no identity headers");
            return Err(Error::Unauthenticated("Unauthorized".to_string()));
        };

        let name = format!("users/{}", id);
        execute_with_timeout(self.membership.get_user(&name), self.lookup_timeout, "get_user")
            .await
            .map_err(not_found)
    }

    async fn resolve_token(&self, token: &str) -> Result<User> {
        let key = access_token_key(token);
        let permalink = execute_with_timeout(self.cache.get(&key), self.lookup_timeout, "token_cache")
            .await
            .map_err(unauthenticated)?
            .ok_or_else(|| Error::Unauthenticated("Unauthorized".to_string()))?;

        let lookup = self.membership.lookup_user(&permalink);
        execute_with_timeout(lookup, self.lookup_timeout, "lookup_user")
            .await
            .map_err(unauthenticated)
    }
}

fn unauthenticated(e: Error) -> Error {
    if e.is_timeout() {
        return e;
    }
    warn!("Token resolution failed: {}", e);
    Error::Unauthenticated("Unauthorized".to_string())
}

fn not_found(e: Error) -> Error {
    if e.is_timeout() {
        return e;
    }
    warn!("Owner lookup failed: {}", e);
    Error::NotFound("Not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::cache::InMemoryTokenCache;
    use crate::membership::LocalMembership;

    fn resolver() -> (OwnerResolver, Arc<InMemoryTokenCache>, User) {
        let (membership, user) = LocalMembership::single("local-user");
        let cache = Arc::new(InMemoryTokenCache::new());
        let resolver = OwnerResolver::new(cache.clone(), Arc::new(membership), Duration::from_secs(5));
        (resolver, cache, user)
    }

    #[tokio::test]
    async fn test_token_takes_precedence() {
        let (resolver, cache, user) = resolver();
        cache.insert_token("abc", user.permalink());

        let creds = Credentials {
            token: Some("abc".to_string()),
            owner_uid: Some("not-a-uuid".to_string()),
            owner_id: Some("someone-else".to_string()),
        };
        assert_eq!(resolver.resolve(&creds).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let (resolver, _, _) = resolver();

        let creds = Credentials {
            token: Some("missing".to_string()),
            owner_id: Some("local-user".to_string()),
            ..Default::default()
        };
        assert!(resolver.resolve(&creds).await.unwrap_err().is_unauthenticated());
    }

    #[tokio::test]
    async fn test_owner_uid() {
        let (resolver, _, user) = resolver();

        let creds = Credentials {
            owner_uid: Some(user.uid.to_string()),
            ..Default::default()
        };
        assert_eq!(resolver.resolve(&creds).await.unwrap(), user);

        let creds = Credentials {
            owner_uid: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        assert!(resolver.resolve(&creds).await.unwrap_err().is_not_found());

        let creds = Credentials {
            owner_uid: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        };
        assert!(resolver.resolve(&creds).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_owner_id() {
        let (resolver, _, user) = resolver();

        assert_eq!(resolver.resolve(&Credentials::owner("local-user")).await.unwrap(), user);
        assert!(resolver
            .resolve(&Credentials::owner("nobody"))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(resolver
            .resolve(&Credentials::default())
            .await
            .unwrap_err()
            .is_unauthenticated());
    }

    struct StalledMembership;

    #[async_trait]
    impl MembershipService for StalledMembership {
        async fn lookup_user(&self, _permalink: &str) -> Result<User> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(Error::Internal("unreachable".to_string()))
        }

        async fn get_user(&self, name: &str) -> Result<User> {
            self.lookup_user(name).await
        }
    }

    #[tokio::test]
    async fn test_lookups_are_bounded() {
        let resolver = OwnerResolver::new(
            Arc::new(InMemoryTokenCache::new()),
            Arc::new(StalledMembership),
            Duration::from_millis(20),
        );

        let err = resolver.resolve(&Credentials::owner("local-user")).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
