use tracing::{info, warn};

use crate::schema::NodeLabel;
use crate::store::{GraphStore, Statement, StoreError};

/// Ensure one uniqueness constraint per node label. Safe to run at every
/// startup.
pub async fn migrate(store: &dyn GraphStore) -> Result<(), StoreError> {
    info!("Running schema migrations...");

    for label in NodeLabel::ALL {
        run_ignoring_exists(store, &label.uniqueness_constraint()).await?;
    }

    info!(constraints = NodeLabel::ALL.len(), "Uniqueness constraints ensured");
    Ok(())
}

async fn run_ignoring_exists(store: &dyn GraphStore, cypher: &str) -> Result<(), StoreError> {
    match store.run_write(Statement::new(cypher)).await {
        Ok(_) => Ok(()),
        Err(StoreError::Client(msg)) => {
            let lower = msg.to_lowercase();
            if lower.contains("already exists") || lower.contains("equivalent") {
                warn!("Already exists (skipped): {}", cypher.chars().take(80).collect::<String>());
                Ok(())
            } else {
                Err(StoreError::Client(msg))
            }
        }
        Err(e) => Err(e),
    }
}
