use serde::{Deserialize, Serialize};

/// Backend health metrics shown on the dashboard.
/// Every field is optional since older backends report only `status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: Option<String>,
    #[serde(alias = "uptime")]
    pub uptime_seconds: Option<f64>,
    pub database: Option<String>,
    pub memory_usage_percent: Option<f64>,
    pub cpu_usage_percent: Option<f64>,
    pub active_sessions: Option<i64>,
}

impl SystemHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(
            self.status.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("ok") | Some("healthy") | Some("up")
        )
    }

    /// Uptime as "3d 4h", "5h 12m" or "42m"
    pub fn uptime_display(&self) -> String {
        let Some(seconds) = self.uptime_seconds else {
            return "-".to_string();
        };
        let minutes = (seconds.max(0.0) / 60.0) as i64;
        if minutes < 60 {
            format!("{}m", minutes)
        } else if minutes < 1440 {
            format!("{}h {}m", minutes / 60, minutes % 60)
        } else {
            format!("{}d {}h", minutes / 1440, (minutes % 1440) / 60)
        }
    }
}
