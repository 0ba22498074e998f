// Dashboard service - funnels every action through one controller task
use crate::application::controller::DashboardController;
use crate::application::data_source::DataSource;
use crate::domain::error::DashboardResult;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 100;

type Job = Box<dyn FnOnce(&mut DashboardController) + Send>;

/// Handle to the task that owns the controller. Jobs run one at a time in
/// arrival order, so the stores never see concurrent mutation.
#[derive(Clone)]
pub struct DashboardService {
    jobs: mpsc::Sender<Job>,
    data_source: Arc<dyn DataSource>,
}

impl DashboardService {
    pub fn spawn(controller: DashboardController, data_source: Arc<dyn DataSource>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(COMMAND_BUFFER);

        // Jobs persist snapshots with blocking file I/O, so the loop lives on
        // the blocking pool rather than a runtime worker.
        tokio::task::spawn_blocking(move || {
            let mut controller = controller;
            while let Some(job) = rx.blocking_recv() {
                job(&mut controller);
            }
            tracing::debug!("Dashboard controller task stopped");
        });

        Self {
            jobs: tx,
            data_source,
        }
    }

    /// Runs `action` on the controller and waits for its result
    pub async fn run<R, F>(&self, action: F) -> anyhow::Result<R>
    where
        F: FnOnce(&mut DashboardController) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |controller| {
            // Caller may have gone away; nothing to report then.
            let _ = reply_tx.send(action(controller));
        });

        self.jobs
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("dashboard controller task is not running"))?;
        reply_rx
            .await
            .context("dashboard controller dropped the reply")
    }

    /// Fetches a device document for the open form. The request runs outside
    /// the controller task; if the form is closed meanwhile the result is dropped.
    pub async fn fetch_document(&self, url: String) -> anyhow::Result<DashboardResult<()>> {
        let ticket = match self.run(move |c| c.begin_fetch(&url)).await? {
            Ok(ticket) => ticket,
            Err(e) => return Ok(Err(e)),
        };

        tracing::debug!("Fetching device document from {}", ticket.url);
        let result = self.data_source.fetch_json(&ticket.url).await;
        self.run(move |c| c.complete_fetch(&ticket, result)).await
    }
}
