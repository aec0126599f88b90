use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{CoreError, NotReadyReason};
use crate::events::{CoreEvent, EventSink};
use crate::model::credential::Credential;
use crate::model::filter::GenerationFilter;
use crate::model::run::{BatchCount, CollectionRun, RunEvent};
use crate::services::generation::GenerationClient;
use crate::services::readiness::Readiness;

/// Runs generation batches one after another and keeps the run state the
/// host polls. At most one run at a time.
pub struct BatchCollector {
    client: Arc<dyn GenerationClient>,
    active: AtomicBool,
    run: Mutex<CollectionRun>,
}

// Releases the active flag however the run ends, including a dropped future.
struct ActiveGuard<'a> {
    collector: &'a BatchCollector,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.collector.run.lock().is_active = false;
        self.collector.active.store(false, Ordering::Release);
    }
}

impl BatchCollector {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            active: AtomicBool::new(false),
            run: Mutex::new(CollectionRun::default()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> CollectionRun {
        self.run.lock().clone()
    }

    /// Runs `batch_count` sequential batches, stopping at the first failure.
    /// A generation failure is not an `Err`: it ends the run and is reported
    /// in the returned `CollectionRun` together with the total added so far.
    pub async fn run_batches(
        &self,
        filter: &GenerationFilter,
        batch_count: BatchCount,
        credential: &Credential,
        readiness: &Readiness,
        sink: &dyn EventSink,
    ) -> Result<CollectionRun, CoreError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("[collector] start rejected: a run is already active");
            return Err(CoreError::Busy);
        }

        // the in-flight run is never touched by a rejected start, so the
        // guard is only armed once the flag is ours
        let _guard = ActiveGuard { collector: self };

        readiness.require_ai()?;
        if !credential.is_set() {
            return Err(NotReadyReason::MissingCredential.into());
        }

        let total_batches = batch_count.get();
        *self.run.lock() = CollectionRun::start(batch_count);
        info!("[collector] starting {total_batches} batches ({filter:?})");

        let mut total_added = 0usize;

        for batch_index in 1..=total_batches {
            self.publish(
                sink,
                RunEvent::BatchStarted {
                    batch_index,
                    total_batches,
                },
            );

            match self.client.generate(filter, credential).await {
                Ok(added) => {
                    total_added += added;
                    debug!("[collector] batch {batch_index}/{total_batches}: +{added} (total {total_added})");
                    self.publish(
                        sink,
                        RunEvent::BatchCompleted {
                            batch_index,
                            total_batches,
                            added_this_batch: added,
                            running_total: total_added,
                        },
                    );
                }
                Err(e) => {
                    warn!("[collector] batch {batch_index}/{total_batches} failed: {e}; {total_added} added before the error");
                    self.publish(
                        sink,
                        RunEvent::BatchFailed {
                            batch_index,
                            total_batches,
                            message: e.message().to_string(),
                            running_total: total_added,
                        },
                    );
                    return Ok(self.snapshot());
                }
            }
        }

        self.publish(
            sink,
            RunEvent::Finished {
                total_batches,
                total_added,
            },
        );
        info!("[collector] finished: {total_added} added across {total_batches} batches");

        Ok(self.snapshot())
    }

    fn publish(&self, sink: &dyn EventSink, event: RunEvent) {
        self.run.lock().apply(&event);
        sink.emit(CoreEvent::Collection(event));
    }
}
