//! Table maintenance: optionally compact a table, then rebuild its index.
//!
//! Configuration comes from the environment; see [`slotdb::config`].

use slotdb::config::StoreConfig;
use slotdb::storage::{self, OpenMode, RebuildError, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotdb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: table_path={}, index_path={}, compact={}",
        config.table_path.display(),
        config.index_path.display(),
        config.compact
    );

    if let Err(e) = run(&config) {
        tracing::error!("Maintenance failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &StoreConfig) -> Result<(), RebuildError> {
    let table = Table::open(&config.table_path, OpenMode::ReadWrite)?;

    let (mut table, index) = if config.compact {
        storage::compact_and_reindex(table, &config.index_path)?
    } else {
        let mut table = table;
        let index = storage::build_index_from_table(&mut table, &config.index_path)?;
        (table, index)
    };

    let checksum = table.data_checksum()?;
    let header = *table.header();
    tracing::info!(
        live = table.live_count(),
        removed = header.removed_count,
        slots = header.next_rrn.0,
        compaction_count = header.compaction_count,
        index_keys = index.len(),
        index_height = index.height(),
        checksum = %format!("{checksum:08x}"),
        "table summary"
    );

    index.close()?;
    table.close()?;
    Ok(())
}
