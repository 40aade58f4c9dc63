//! The server's bundled shared state: the client state store, the
//! first-seen set, and the cached server public IP, all behind one
//! ownership boundary with accessor methods rather than a raw lock handed
//! to callers.
//!
//! Bundling these three pieces (plus the rate limiter and IP whitelist)
//! into one struct mirrors `clawnode`'s `SharedState`, which wraps several
//! independently-locked stores behind one value owned by the process root.

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::time::Duration;
use tracing::info;
use vpn_classify::HealthStatus;
use vpn_proto::{ClientId, ClientStateEntry, KeepaliveRecord};
use vpn_ratelimit::RateLimiter;

/// What changed as a result of accepting a keepalive, used to decide which
/// notification event (if any) to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    NewClient,
    IpChanged { old_ip: String, new_ip: String },
    Unchanged,
}

struct Inner {
    clients: HashMap<ClientId, ClientStateEntry>,
    first_seen: HashSet<ClientId>,
    server_ip: Option<String>,
    already_notified_empty: bool,
}

/// Shared server state: client store, first-seen set, server-IP cache,
/// rate limiter, and IP whitelist, all behind one `Arc` boundary.
pub struct ServerState {
    inner: RwLock<Inner>,
    pub rate_limiter: RateLimiter,
    allowed_ips: Vec<IpAddr>,
    pub client_timeout: Duration,
}

impl ServerState {
    pub fn new(allowed_ips: Vec<IpAddr>, rate_window: Duration, rate_burst: usize, client_timeout: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                clients: HashMap::new(),
                first_seen: HashSet::new(),
                server_ip: None,
                already_notified_empty: false,
            }),
            rate_limiter: RateLimiter::new(rate_window, rate_burst),
            allowed_ips,
            client_timeout,
        }
    }

    /// Whitelist check (§4.S1, step 2). An empty configured whitelist
    /// allows every IP.
    pub fn is_ip_allowed(&self, ip: IpAddr) -> bool {
        self.allowed_ips.is_empty() || self.allowed_ips.contains(&ip)
    }

    pub fn server_ip(&self) -> Option<String> {
        self.inner.read().server_ip.clone()
    }

    /// Lazily populate the server-IP cache. No-op if already set; the
    /// cache is never invalidated for the process lifetime (§3, §9).
    pub fn set_server_ip_if_unset(&self, ip: String) {
        let mut guard = self.inner.write();
        if guard.server_ip.is_none() {
            guard.server_ip = Some(ip);
        }
    }

    /// Accept a validated keepalive record, writing the new state entry
    /// atomically and returning which change (if any) occurred.
    pub fn ingest(&self, record: &KeepaliveRecord, now: DateTime<Utc>) -> IngestOutcome {
        let mut guard = self.inner.write();

        let is_new = !guard.first_seen.contains(&record.client_id);
        let old_ip = guard.clients.get(&record.client_id).map(|e| e.ip.clone());

        let entry = ClientStateEntry {
            last_seen: now,
            ip: record.public_ip.clone(),
            location: format!(
                "{}, {}, {}",
                record.location.city, record.location.region, record.location.country
            ),
            provider: record.location.org.clone(),
            country: record.location.country.clone(),
            city: record.location.city.clone(),
            region: record.location.region.clone(),
            timezone: record.location.timezone.clone(),
            dns_loc: record.dns.loc.clone(),
            dns_colo: record.dns.colo.clone(),
            client_version: record.client_version.clone(),
        };

        guard.clients.insert(record.client_id.clone(), entry);
        guard.first_seen.insert(record.client_id.clone());
        guard.already_notified_empty = false;

        match old_ip {
            _ if is_new => IngestOutcome::NewClient,
            Some(ref old) if old != &record.public_ip => IngestOutcome::IpChanged {
                old_ip: old.clone(),
                new_ip: record.public_ip.clone(),
            },
            _ => IngestOutcome::Unchanged,
        }
    }

    /// Full-state snapshot for `GET <api-path>/status`.
    pub fn status_snapshot(&self) -> HashMap<String, ClientStateEntry> {
        self.inner
            .read()
            .clients
            .iter()
            .map(|(id, entry)| (id.as_str().to_string(), entry.clone()))
            .collect()
    }

    pub fn classify(&self, id: &ClientId) -> Option<HealthStatus> {
        let guard = self.inner.read();
        let entry = guard.clients.get(id)?;
        let server_ip = guard.server_ip.clone().unwrap_or_else(|| "unknown".into());
        Some(vpn_classify::classify(entry, &server_ip))
    }

    pub fn client_count(&self) -> usize {
        self.inner.read().clients.len()
    }

    pub fn get(&self, id: &ClientId) -> Option<ClientStateEntry> {
        self.inner.read().clients.get(id).cloned()
    }

    pub fn for_each_client<F: FnMut(&ClientId, &ClientStateEntry)>(&self, mut f: F) {
        let guard = self.inner.read();
        for (id, entry) in guard.clients.iter() {
            f(id, entry);
        }
    }

    /// Sweep stale entries out of the store and the first-seen set.
    /// Returns the ids evicted, for logging by the caller.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> Vec<ClientId> {
        let mut guard = self.inner.write();
        let timeout = self.client_timeout;

        let stale: Vec<ClientId> = guard
            .clients
            .iter()
            .filter_map(|(id, entry)| {
                let age = now.signed_duration_since(entry.last_seen);
                if age.to_std().map(|d| d > timeout).unwrap_or(false) {
                    Some(id.clone())
                } else {
                    None
                }
            })
            .collect();

        for id in &stale {
            guard.clients.remove(id);
            guard.first_seen.remove(id);
        }

        if guard.clients.is_empty() && !stale.is_empty() {
            info!("client store is now empty after eviction sweep");
        }

        stale
    }

    /// Returns `true` exactly once per transition into the zero-clients
    /// state, implementing the `NoClients` rate-limit policy resolved in
    /// `DESIGN.md` (at most one alert per transition).
    pub fn should_notify_no_clients(&self) -> bool {
        let mut guard = self.inner.write();
        if guard.clients.is_empty() && !guard.already_notified_empty {
            guard.already_notified_empty = true;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpn_proto::{DnsProbeRecord, ValidatedLocation};

    fn record(id: &str, ip: &str) -> KeepaliveRecord {
        KeepaliveRecord {
            client_id: ClientId::parse(id),
            public_ip: ip.to_string(),
            location: ValidatedLocation {
                country: "GB".into(),
                city: "London".into(),
                region: "England".into(),
                org: "M247".into(),
                timezone: "Europe/London".into(),
            },
            dns: DnsProbeRecord {
                loc: "GB".into(),
                colo: "LHR".into(),
            },
            client_version: "1.0.0".into(),
        }
    }

    fn state() -> ServerState {
        ServerState::new(vec![], Duration::from_secs(60), 30, Duration::from_secs(1800))
    }

    #[test]
    fn first_keepalive_is_new_client() {
        let s = state();
        let outcome = s.ingest(&record("a", "91.203.5.146"), Utc::now());
        assert_eq!(outcome, IngestOutcome::NewClient);
        assert_eq!(s.client_count(), 1);
    }

    #[test]
    fn repeated_identical_submission_is_unchanged() {
        let s = state();
        let now = Utc::now();
        s.ingest(&record("a", "91.203.5.146"), now);
        let second = s.ingest(&record("a", "91.203.5.146"), now);
        assert_eq!(second, IngestOutcome::Unchanged);
    }

    #[test]
    fn ip_change_is_detected() {
        let s = state();
        s.ingest(&record("a", "91.203.5.146"), Utc::now());
        let outcome = s.ingest(&record("a", "45.142.120.50"), Utc::now());
        assert_eq!(
            outcome,
            IngestOutcome::IpChanged {
                old_ip: "91.203.5.146".into(),
                new_ip: "45.142.120.50".into(),
            }
        );
    }

    #[test]
    fn eviction_removes_from_store_and_first_seen_reappearance_is_new() {
        let s = ServerState::new(vec![], Duration::from_secs(60), 30, Duration::from_secs(1));
        let t0 = Utc::now();
        s.ingest(&record("a", "91.203.5.146"), t0);
        let later = t0 + chrono::Duration::seconds(5);
        let evicted = s.evict_stale(later);
        assert_eq!(evicted.len(), 1);
        assert_eq!(s.client_count(), 0);

        let outcome = s.ingest(&record("a", "91.203.5.146"), later);
        assert_eq!(outcome, IngestOutcome::NewClient);
    }

    #[test]
    fn no_clients_alert_fires_once_per_transition() {
        let s = state();
        assert!(s.should_notify_no_clients());
        assert!(!s.should_notify_no_clients());
        s.ingest(&record("a", "1.2.3.4"), Utc::now());
        s.evict_stale(Utc::now() + chrono::Duration::hours(1));
        assert!(s.should_notify_no_clients());
    }

    #[test]
    fn empty_whitelist_allows_any_ip() {
        let s = state();
        assert!(s.is_ip_allowed("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn nonempty_whitelist_rejects_unlisted_ip() {
        let allowed: IpAddr = "203.0.113.9".parse().unwrap();
        let s = ServerState::new(vec![allowed], Duration::from_secs(60), 30, Duration::from_secs(1800));
        assert!(s.is_ip_allowed(allowed));
        assert!(!s.is_ip_allowed("198.51.100.7".parse().unwrap()));
    }
}
