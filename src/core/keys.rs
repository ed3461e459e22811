//! Storage key derivation.
//!
//! A logical key `K` maps to `K` for the payload (cache entry or last-run
//! marker) and `K:lock` for the lease. An optional namespace is prepended as
//! `ns:K` to both, so several deployments can share one store.

/// Suffix appended to the payload key to form the lease key.
pub const LOCK_SUFFIX: &str = ":lock";

/// Keys derived for one logical resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKeys {
    logical: String,
    data: String,
    lock: String,
}

impl ResourceKeys {
    /// Caller-supplied key, used in callbacks and logs.
    pub fn logical(&self) -> &str {
        &self.logical
    }

    /// Key holding the cache entry or last-run marker.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Lease resource key; never read directly by callers.
    pub fn lock(&self) -> &str {
        &self.lock
    }
}

/// Namespace used to resolve logical keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    namespace: Option<String>,
}

impl KeySpace {
    /// Key space without a prefix.
    pub const fn new() -> Self {
        Self { namespace: None }
    }

    /// Key space prefixing every key with `namespace:`. Empty namespaces are ignored.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
        }
    }

    /// Configured namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Derive payload and lease keys for `logical`.
    pub fn resolve(&self, logical: &str) -> ResourceKeys {
        let data = match &self.namespace {
            Some(ns) => format!("{ns}:{logical}"),
            None => logical.to_owned(),
        };
        let lock = format!("{data}{LOCK_SUFFIX}");
        ResourceKeys {
            logical: logical.to_owned(),
            data,
            lock,
        }
    }
}
