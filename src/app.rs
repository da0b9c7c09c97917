use camino::Utf8Path;

use crate::client::CatalogClient;
use crate::config::FetchConfig;
use crate::dispatch::{BatchResult, Dispatcher};
use crate::domain::CoordinateRecord;
use crate::error::CatalogError;
use crate::fetch::Fetcher;
use crate::input;
use crate::progress::ProgressSink;
use crate::store::OutputLayout;

/// Ties a resolved configuration to a catalog transport.
pub struct App<C: CatalogClient> {
    config: FetchConfig,
    fetcher: Fetcher<C>,
}

impl<C: CatalogClient> App<C> {
    pub fn new(config: FetchConfig, client: C) -> Self {
        Self {
            config,
            fetcher: Fetcher::new(client),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        self.fetcher.client()
    }

    /// Loads the configured input list and fetches it.
    pub fn run(&self, sink: &dyn ProgressSink) -> Result<BatchResult, CatalogError> {
        let records = self.load_records(&self.config.input)?;
        self.fetch_all(&records, sink)
    }

    pub fn load_records(&self, path: &Utf8Path) -> Result<Vec<CoordinateRecord>, CatalogError> {
        input::load_records(path, self.config.header)
    }

    /// Every configuration problem surfaces here before the first request;
    /// after that only per-task outcomes are reported.
    pub fn fetch_all(
        &self,
        records: &[CoordinateRecord],
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult, CatalogError> {
        self.config.validate()?;
        let dispatcher = Dispatcher::new(self.config.workers)?;
        let layout = OutputLayout::new(self.config.folder.clone())?;
        let tasks = Dispatcher::build_tasks(
            records,
            &layout,
            self.config.overwrite,
            self.config.limit,
        )?;
        tracing::info!(
            records = records.len(),
            tasks = tasks.len(),
            folder = %layout.folder(),
            "starting catalog batch"
        );
        dispatcher.run(tasks, &self.fetcher, sink)
    }
}
