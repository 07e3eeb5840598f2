//! CLI runner - executes commands

use super::commands::{Cli, Commands};
use super::output::{emit, ConnectionStatus, Message};
use crate::auth::{TokenRegistry, TokenStore};
use crate::catalog::{Catalog, ResourceDescriptor};
use crate::config::TapConfig;
use crate::engine::{FetchStats, ResourceFetcher};
use crate::error::{Error, Result};
use crate::http::RequestExecutor;
use crate::state::StateManager;
use futures::TryStreamExt;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing messages to stdout
    pub async fn run(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run_with_output(&mut stdout).await
    }

    /// Run the CLI command, writing messages to `out`
    pub async fn run_with_output(&self, out: &mut dyn Write) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check(out).await,
            Commands::Streams => self.streams(out),
            Commands::Read { streams } => self.read(out, streams.as_deref()).await,
        }
    }

    /// Load config; inline JSON takes precedence over the file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json_str(json);
        }
        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "Config not specified (use --config or --config-json)",
            )),
        }
    }

    /// Load the catalog file, or the built-in catalog
    fn load_catalog(&self) -> Result<Catalog> {
        match &self.cli.catalog {
            Some(path) => Catalog::from_file(path),
            None => Catalog::builtin(),
        }
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Token store shared by every resource using these credentials
    fn token_store(config: &TapConfig, client: &reqwest::Client) -> Arc<TokenStore> {
        TokenRegistry::global().store_for(&config.credentials(), client)
    }

    /// Check the credentials
    async fn check(&self, out: &mut dyn Write) -> Result<()> {
        let config = self.load_config()?;
        let client = config.executor_config().http_client()?;
        let store = Self::token_store(&config, &client);

        info!("Checking credentials against {}", config.auth_url);

        let message = match store.get_token().await {
            Ok(_) => Message::ConnectionStatus {
                status: ConnectionStatus::Succeeded,
                message: "Connection successful".to_string(),
            },
            Err(e) => Message::ConnectionStatus {
                status: ConnectionStatus::Failed,
                message: format!("Connection failed: {e}"),
            },
        };
        emit(out, self.cli.format, &message)
    }

    /// List catalog resources
    fn streams(&self, out: &mut dyn Write) -> Result<()> {
        let catalog = self.load_catalog()?;
        emit(
            out,
            self.cli.format,
            &Message::Streams {
                streams: &catalog.resources,
            },
        )
    }

    /// Read the selected resources one after another
    async fn read(&self, out: &mut dyn Write, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.load_catalog()?;
        let state = self.load_state()?;

        let selected: Vec<String> = streams
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        let descriptors = catalog.select(&selected)?;

        let executor_config = config.executor_config();
        let client = executor_config.http_client()?;
        let tokens = Self::token_store(&config, &client);
        let executor = RequestExecutor::with_client(executor_config, client, tokens);
        let fetcher = ResourceFetcher::new(Arc::new(executor), config.page_size);

        let mut totals = FetchStats::new();
        for descriptor in descriptors {
            let stats = self.read_resource(out, &fetcher, descriptor, &state).await?;
            totals.merge(&stats);
        }

        state.save().await?;

        info!(
            "Read complete: {} records in {} pages, {}ms",
            totals.records, totals.pages, totals.duration_ms
        );
        Ok(())
    }

    async fn read_resource(
        &self,
        out: &mut dyn Write,
        fetcher: &ResourceFetcher,
        descriptor: &ResourceDescriptor,
        state: &StateManager,
    ) -> Result<FetchStats> {
        let start = Instant::now();
        let mut stats = FetchStats::new();

        let replication_key = descriptor
            .replication_key
            .as_deref()
            .filter(|_| descriptor.is_incremental());
        let cursor = match replication_key {
            Some(_) => state.cursor_for(&descriptor.name).await,
            None => None,
        };

        let mut pages = fetcher.fetch_pages(descriptor, cursor.as_ref());
        while let Some(records) = pages.try_next().await? {
            stats.add_page();
            stats.add_records(records.len());

            for record in &records {
                emit(
                    out,
                    self.cli.format,
                    &Message::Record {
                        stream: &descriptor.name,
                        record,
                    },
                )?;

                if let Some(key) = replication_key {
                    state.observe(&descriptor.name, key, record).await;
                }
            }
        }

        if replication_key.is_some() {
            let snapshot = state.snapshot().await;
            emit(out, self.cli.format, &Message::State { value: &snapshot })?;
        }
        out.flush()?;

        #[allow(clippy::cast_possible_truncation)]
        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Finished {}: {} records in {} pages, {}ms",
            descriptor.name, stats.records, stats.pages, stats.duration_ms
        );
        Ok(stats)
    }
}
