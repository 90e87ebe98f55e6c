use anyhow::Result;
use calmirror_caldav::CalDavStore;
use calmirror_core::{InstanceSync, SyncWindow};
use owo_colors::OwoColorize;

use crate::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    let source = CalDavStore::connect("source", &config.source).await?;
    let target = CalDavStore::connect("target", &config.target).await?;

    let sync = InstanceSync::new(source, target);
    let stats = sync.run(&SyncWindow::around_now()).await?;

    if stats.has_changes() {
        println!(
            "Synced: {} duplicate(s) removed, {} created, {} deleted ({} already present)",
            stats.duplicates_removed, stats.created, stats.deleted, stats.skipped
        );
    } else {
        println!("{}", "Calendars already in sync".green());
    }

    if stats.write_failures > 0 {
        println!(
            "   {}",
            format!("{} write(s) failed, see log output", stats.write_failures).red()
        );
    }

    Ok(())
}
