//! Dashboard snapshot: pending-change counts per record family plus backend health.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::models::{ChangeKind, SystemHealth};
use crate::workflow::ChangeBackend;

/// How often an open dashboard refreshes itself
pub const DASHBOARD_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Records still awaiting a decision, per record family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    pub member: usize,
    pub billing: usize,
    pub invoice: usize,
    pub labour: usize,
}

impl PendingCounts {
    pub fn get(&self, kind: ChangeKind) -> usize {
        match kind {
            ChangeKind::Member => self.member,
            ChangeKind::Billing => self.billing,
            ChangeKind::Invoice => self.invoice,
            ChangeKind::Labour => self.labour,
        }
    }

    fn set(&mut self, kind: ChangeKind, count: usize) {
        match kind {
            ChangeKind::Member => self.member = count,
            ChangeKind::Billing => self.billing = count,
            ChangeKind::Invoice => self.invoice = count,
            ChangeKind::Labour => self.labour = count,
        }
    }

    pub fn total(&self) -> usize {
        self.member + self.billing + self.invoice + self.labour
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub counts: PendingCounts,
    /// None when the health endpoint could not be reached
    pub health: Option<SystemHealth>,
    pub taken_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.taken_at).num_minutes()
    }

    /// Human-readable age, e.g. "just now", "5m ago", "2h ago"
    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }

    pub fn is_stale(&self) -> bool {
        (Utc::now() - self.taken_at)
            .to_std()
            .is_ok_and(|age| age >= DASHBOARD_REFRESH_INTERVAL)
    }
}

/// Fetch all four pending lists and backend health concurrently.
///
/// Any list failing fails the snapshot. Health is optional: an unreachable
/// health endpoint yields a snapshot without it.
pub async fn fetch_dashboard<B: ChangeBackend>(backend: &B) -> Result<DashboardSnapshot> {
    let lists = join_all(ChangeKind::ALL.iter().map(|&kind| async move {
        backend.fetch_pending(kind).await.map(|records| (kind, records))
    }));
    let (lists, health) = tokio::join!(lists, backend.fetch_system_health());

    let mut counts = PendingCounts::default();
    for result in lists {
        let (kind, records) = result?;
        counts.set(kind, records.iter().filter(|r| r.is_pending()).count());
    }

    let health = match health {
        Ok(health) => Some(health),
        Err(e) => {
            warn!(error = %e, "System health unavailable");
            None
        }
    };

    debug!(total = counts.total(), healthy = health.as_ref().map(SystemHealth::is_healthy), "Dashboard fetched");
    Ok(DashboardSnapshot {
        counts,
        health,
        taken_at: Utc::now(),
    })
}

/// The dashboard as displayed; each refresh swaps in a whole new snapshot
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    snapshot: Option<DashboardSnapshot>,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn needs_refresh(&self) -> bool {
        self.snapshot.as_ref().map_or(true, DashboardSnapshot::is_stale)
    }

    /// Refresh from the backend. A failed refresh keeps the previous snapshot
    /// and records the error.
    pub async fn refresh<B: ChangeBackend>(&mut self, backend: &B) -> Result<&DashboardSnapshot> {
        match fetch_dashboard(backend).await {
            Ok(snapshot) => {
                self.last_error = None;
                let snapshot = self.snapshot.insert(snapshot);
                Ok(&*snapshot)
            }
            Err(e) => {
                warn!(error = %e, "Dashboard refresh failed");
                self.last_error = Some(format!("{:#}", e));
                Err(e)
            }
        }
    }
}
