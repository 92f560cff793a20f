//! Tenant resolver (spec §4.2): internal name -> tenant id, with an
//! in-memory cache that lives for the process lifetime (spec §3 "Tenant
//! binding"). Ground: `devolutions-gateway`'s `token_cache` / `TokenCache`
//! shape (insert-on-resolve, total lookups) adapted from a JWT replay cache
//! to a plain string->string map behind `parking_lot::RwLock`.

use std::sync::Arc;

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::clients::commodore::CommodoreClient;
use crate::clients::foghorn::FoghornClient;

/// A 32-character lowercase-hex VOD clip hash (spec §4.2's secondary path).
fn is_clip_hash(name: &str) -> bool {
    name.len() == 32 && name.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[derive(Clone)]
pub struct TenantResolver {
    cache: Arc<RwLock<HashMap<String, String>>>,
    commodore: CommodoreClient,
    foghorn: FoghornClient,
}

impl TenantResolver {
    pub fn new(commodore: CommodoreClient, foghorn: FoghornClient) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            commodore,
            foghorn,
        }
    }

    /// Total lookup: misses resolve to the empty string rather than an
    /// error (spec §3 invariant). Failures are not cached, so a subsequent
    /// call re-attempts (spec §4.2, §9 "tenant resolution races").
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, internal_name: &str) -> String {
        if let Some(cached) = self.cache.read().get(internal_name) {
            return cached.clone();
        }

        let resolved = if is_clip_hash(internal_name) {
            self.foghorn.resolve_clip_tenant(internal_name).await
        } else {
            self.commodore.resolve_internal_name(internal_name).await
        };

        let tenant_id = match resolved {
            Ok(tenant_id) if !tenant_id.is_empty() => tenant_id,
            Ok(_) => return String::new(),
            Err(error) => {
                tracing::warn!(error = format!("{error:#}"), internal_name, "tenant resolution failed");
                return String::new();
            }
        };

        self.cache.write().insert(internal_name.to_owned(), tenant_id.clone());
        tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_clip_hashes() {
        assert!(is_clip_hash("0123456789abcdef0123456789abcdef"));
        assert!(!is_clip_hash("0123456789ABCDEF0123456789abcdef"));
        assert!(!is_clip_hash("too-short"));
        assert!(!is_clip_hash("zzzz56789abcdef0123456789abcdefzz"));
    }
}
