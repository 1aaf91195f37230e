//! Audit trail for administrative actions.
//!
//! Every state-changing request against the admin surface is recorded as an
//! [`AuditEntry`]. The store is behind a trait so the backing can change
//! without touching the middleware; the default keeps a bounded in-memory
//! ring that drops the oldest entries past the retention cap.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuditConfig;

/// A single recorded administrative action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry id.
    pub id: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Identity id of the actor.
    pub actor_id: i64,
    /// Email of the actor at the time of the action.
    pub actor_email: String,
    /// Action verb, e.g. `create`, `update`, `delete`.
    pub action: String,
    /// Resource the action targeted, e.g. `products`.
    pub resource: String,
    /// HTTP method of the request.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Client address, if known.
    pub ip: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Request duration in milliseconds.
    pub duration_ms: u64,
}

/// Filter for querying the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only entries by this actor.
    pub actor_id: Option<i64>,
    /// Only entries whose action contains this substring.
    pub action: Option<String>,
    /// Only entries whose resource contains this substring.
    pub resource: Option<String>,
    /// Skip this many matching entries.
    pub offset: usize,
    /// Return at most this many entries.
    pub limit: usize,
}

impl AuditFilter {
    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(actor_id) = self.actor_id {
            if entry.actor_id != actor_id {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if !entry.action.contains(action.as_str()) {
                return false;
            }
        }
        if let Some(resource) = &self.resource {
            if !entry.resource.contains(resource.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Storage for audit entries.
pub trait AuditStore: Send + Sync {
    /// Record an entry.
    fn append(&self, entry: AuditEntry);

    /// Query entries newest-first, applying the filter's criteria and
    /// pagination.
    fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry>;

    /// Number of retained entries.
    fn len(&self) -> usize;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries.
    fn clear(&self);
}

/// In-memory audit store with bounded retention.
pub struct MemoryAuditStore {
    entries: RwLock<VecDeque<AuditEntry>>,
    max_entries: usize,
}

impl MemoryAuditStore {
    /// Create a store from configuration.
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: config.max_entries,
        }
    }

    /// Create a store with an explicit retention cap.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries,
        }
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, entry: AuditEntry) {
        let mut entries = self.entries.write().unwrap();
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap();
        entries
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(actor_id: i64, action: &str, resource: &str) -> AuditEntry {
        AuditEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            actor_id,
            actor_email: format!("user{}@mugshop.com", actor_id),
            action: action.to_string(),
            resource: resource.to_string(),
            method: "POST".to_string(),
            path: format!("/api/{}", resource),
            ip: Some("127.0.0.1".to_string()),
            status: 200,
            duration_ms: 3,
        }
    }

    fn filter() -> AuditFilter {
        AuditFilter {
            limit: 100,
            ..AuditFilter::default()
        }
    }

    #[test]
    fn test_append_and_query() {
        let store = MemoryAuditStore::with_capacity(100);
        store.append(entry(1, "create", "products"));
        store.append(entry(1, "delete", "products"));

        assert_eq!(store.len(), 2);
        let results = store.query(&filter());
        assert_eq!(results.len(), 2);
        // Newest first
        assert_eq!(results[0].action, "delete");
        assert_eq!(results[1].action, "create");
    }

    #[test]
    fn test_retention_drops_oldest() {
        let store = MemoryAuditStore::with_capacity(3);
        for i in 0..5 {
            store.append(entry(i, "update", "orders"));
        }

        assert_eq!(store.len(), 3);
        let results = store.query(&filter());
        assert_eq!(results[0].actor_id, 4);
        assert_eq!(results[2].actor_id, 2);
    }

    #[test]
    fn test_filter_by_actor() {
        let store = MemoryAuditStore::with_capacity(100);
        store.append(entry(1, "create", "products"));
        store.append(entry(2, "create", "products"));
        store.append(entry(1, "delete", "orders"));

        let results = store.query(&AuditFilter {
            actor_id: Some(1),
            ..filter()
        });
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|e| e.actor_id == 1));
    }

    #[test]
    fn test_filter_by_action_substring() {
        let store = MemoryAuditStore::with_capacity(100);
        store.append(entry(1, "create", "products"));
        store.append(entry(1, "update", "products"));
        store.append(entry(1, "update_status", "orders"));

        let results = store.query(&AuditFilter {
            action: Some("update".to_string()),
            ..filter()
        });
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_filter_by_resource() {
        let store = MemoryAuditStore::with_capacity(100);
        store.append(entry(1, "create", "products"));
        store.append(entry(1, "create", "orders"));

        let results = store.query(&AuditFilter {
            resource: Some("orders".to_string()),
            ..filter()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resource, "orders");
    }

    #[test]
    fn test_pagination() {
        let store = MemoryAuditStore::with_capacity(100);
        for i in 0..10 {
            store.append(entry(i, "create", "products"));
        }

        let page = store.query(&AuditFilter {
            offset: 2,
            limit: 3,
            ..AuditFilter::default()
        });
        assert_eq!(page.len(), 3);
        // Newest-first: offset 2 skips actors 9 and 8
        assert_eq!(page[0].actor_id, 7);
        assert_eq!(page[2].actor_id, 5);
    }

    #[test]
    fn test_clear() {
        let store = MemoryAuditStore::with_capacity(100);
        store.append(entry(1, "create", "products"));
        assert!(!store.is_empty());

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.query(&filter()).len(), 0);
    }
}
