use anyhow::Result;

use crate::config::Config;
use crate::db::{Database, Photo};

pub const PAGE_SIZE: usize = 20;

/// One page of the catalog, newest capture first, plus the total count
pub fn run_list(config: &Config, page: usize) -> Result<(Vec<Photo>, usize)> {
    if !config.database.path.exists() {
        anyhow::bail!(
            "No database found at {}. Upload a photo first.",
            config.database.path.display()
        );
    }

    let db = Database::open(&config.database.path)?;
    db.list_photos(page.max(1), PAGE_SIZE)
}
