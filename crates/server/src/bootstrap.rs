use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use cartwise_classifier::{DisabledClassifier, OpenAiClassifier};
use cartwise_core::config::{AppConfig, ConfigError, LoadOptions};
use cartwise_core::{Classifier, ClassifierError};
use cartwise_db::{connect_with_config, migrations, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub classifier: Arc<dyn Classifier>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("classifier setup failed: {0}")]
    Classifier(#[source] ClassifierError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let classifier: Arc<dyn Classifier> = if config.classifier.enabled {
        Arc::new(OpenAiClassifier::from_config(&config.classifier).map_err(BootstrapError::Classifier)?)
    } else {
        Arc::new(DisabledClassifier)
    };
    info!(
        event_name = "system.bootstrap.classifier_wired",
        enabled = config.classifier.enabled,
        "classifier wired"
    );

    Ok(Application { config, db_pool, classifier })
}

#[cfg(test)]
mod tests {
    use cartwise_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_a_disabled_classifier() {
        let app = bootstrap(overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('list', 'list_item', 'purchase_list', 'price')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables present after bootstrap");
        assert_eq!(table_count, 4);

        let error = app.classifier.categorize("Acme", "Rice").await.expect_err("disabled");
        assert_eq!(error, cartwise_core::ClassifierError::Disabled);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_when_classifier_is_enabled_without_a_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                classifier_enabled: Some(true),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("classifier.api_key"));
    }
}
