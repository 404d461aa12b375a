//! Plain-text rendering of command results.

use std::path::Path;

use memberdesk_core::changes::ChangeDescriptor;
use memberdesk_core::dashboard::DashboardSnapshot;
use memberdesk_core::listing::Page;
use memberdesk_core::models::{ChangeKind, PendingChangeRecord};
use memberdesk_core::utils::{format_date, truncate_string};
use memberdesk_core::Config;

const SUBJECT_WIDTH: usize = 16;
const MODIFIER_WIDTH: usize = 20;

pub fn print_page(kind: ChangeKind, page: &Page<&PendingChangeRecord>) {
    if page.items.is_empty() {
        println!("No {} changes found", kind.title().to_lowercase());
        return;
    }

    println!(
        "{:<10} {:<width_s$} {:<width_m$} {:<14} {:<9}",
        "ID",
        "SUBJECT",
        "MODIFIED BY",
        "MODIFIED",
        "STATUS",
        width_s = SUBJECT_WIDTH,
        width_m = MODIFIER_WIDTH,
    );
    for record in &page.items {
        let modified = record
            .modified_at
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<width_s$} {:<width_m$} {:<14} {:<9}",
            truncate_string(&record.id.to_string(), 10),
            truncate_string(&record.subject_display(), SUBJECT_WIDTH),
            truncate_string(&record.modified_by_display(), MODIFIER_WIDTH),
            modified,
            record.approval_status.to_string(),
            width_s = SUBJECT_WIDTH,
            width_m = MODIFIER_WIDTH,
        );
    }
    println!(
        "Page {} of {} ({} total)",
        page.page,
        page.total_pages().max(1),
        page.total
    );
}

pub fn print_changes(changes: &[ChangeDescriptor]) {
    if changes.is_empty() {
        println!("No reviewable changes");
        return;
    }
    for change in changes {
        println!("[{}] {}", change.kind, change.description);
    }
}

pub fn print_dashboard(snapshot: &DashboardSnapshot) {
    println!("Pending changes ({})", snapshot.age_display());
    for kind in ChangeKind::ALL {
        println!("  {:<8} {:>5}", kind.title(), snapshot.counts.get(kind));
    }
    println!("  {:<8} {:>5}", "Total", snapshot.counts.total());

    match &snapshot.health {
        Some(health) => {
            println!(
                "Backend: {} (up {})",
                health.status.as_deref().unwrap_or("unknown"),
                health.uptime_display()
            );
            if let Some(ref database) = health.database {
                println!("Database: {}", database);
            }
        }
        None => println!("Backend health unavailable"),
    }
}

pub fn print_config(config: &Config, path: &Path) {
    println!("Config file: {}", path.display());
    println!(
        "Backend URL: {}",
        config.backend_api_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "API token:   {}",
        if config.api_token.is_some() { "(set)" } else { "(not set)" }
    );
    println!("Currency:    {}", config.currency_symbol());
}
