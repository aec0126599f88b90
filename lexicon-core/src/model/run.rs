use serde::Serialize;

/// Requested number of batches, already coerced to at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCount(u32);

impl BatchCount {
    pub fn normalize(requested: i64) -> Self {
        if requested < 1 {
            Self(1)
        } else {
            Self(u32::try_from(requested).unwrap_or(u32::MAX))
        }
    }

    /// Host text input; anything that is not an integer counts as one batch.
    pub fn from_input(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map(Self::normalize)
            .unwrap_or(Self(1))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for BatchCount {
    fn default() -> Self {
        Self(1)
    }
}

/// Items a run is expected to request, for the host's button label.
pub fn items_requested(batch_count: BatchCount, items_per_batch: u32) -> u64 {
    u64::from(batch_count.get()) * u64::from(items_per_batch)
}

/// Progress of one collection run, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    BatchStarted {
        batch_index: u32,
        total_batches: u32,
    },
    BatchCompleted {
        batch_index: u32,
        total_batches: u32,
        added_this_batch: usize,
        running_total: usize,
    },
    BatchFailed {
        batch_index: u32,
        total_batches: u32,
        message: String,
        running_total: usize,
    },
    Finished {
        total_batches: u32,
        total_added: usize,
    },
}

impl RunEvent {
    pub fn status_message(&self) -> String {
        match self {
            RunEvent::BatchStarted {
                batch_index,
                total_batches,
            } => format!("Batch {batch_index}/{total_batches}: generating new items..."),
            RunEvent::BatchCompleted {
                batch_index,
                total_batches,
                added_this_batch,
                running_total,
            } => format!(
                "Batch {batch_index}/{total_batches}: added {added_this_batch} new items; total so far {running_total}"
            ),
            RunEvent::BatchFailed {
                batch_index,
                total_batches,
                message,
                running_total,
            } => format!(
                "Batch {batch_index}/{total_batches}: error - {message}; total added before error {running_total}"
            ),
            RunEvent::Finished {
                total_batches,
                total_added,
            } => format!("Finished! Added {total_added} new items across {total_batches} batches."),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::BatchFailed { .. } | RunEvent::Finished { .. })
    }
}

/// Ephemeral state of the current (or last) collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct CollectionRun {
    pub batch_count: u32,
    pub current_batch_index: u32,
    pub total_added: usize,
    pub status_message: String,
    pub is_active: bool,
    pub last_error: Option<String>,
}

impl CollectionRun {
    pub fn start(batch_count: BatchCount) -> Self {
        Self {
            batch_count: batch_count.get(),
            is_active: true,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, event: &RunEvent) {
        match event {
            RunEvent::BatchStarted { batch_index, .. } => {
                self.current_batch_index = *batch_index;
            }
            RunEvent::BatchCompleted {
                batch_index,
                running_total,
                ..
            } => {
                self.current_batch_index = *batch_index;
                self.total_added = self.total_added.max(*running_total);
            }
            RunEvent::BatchFailed {
                batch_index,
                message,
                ..
            } => {
                self.current_batch_index = *batch_index;
                self.last_error = Some(message.clone());
                self.is_active = false;
            }
            RunEvent::Finished { total_added, .. } => {
                self.total_added = self.total_added.max(*total_added);
                self.is_active = false;
            }
        }
        self.status_message = event.status_message();
    }

    pub fn failed(&self) -> bool {
        self.last_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_count_is_never_below_one() {
        assert_eq!(BatchCount::normalize(0).get(), 1);
        assert_eq!(BatchCount::normalize(-3).get(), 1);
        assert_eq!(BatchCount::normalize(20).get(), 20);
        assert_eq!(BatchCount::from_input("abc").get(), 1);
        assert_eq!(BatchCount::from_input(" 4 ").get(), 4);
        assert_eq!(BatchCount::from_input("-7").get(), 1);
    }

    #[test]
    fn items_requested_uses_multiplier() {
        assert_eq!(items_requested(BatchCount::normalize(20), 75), 1500);
    }

    #[test]
    fn apply_tracks_failure_and_keeps_total() {
        let mut run = CollectionRun::start(BatchCount::normalize(3));
        run.apply(&RunEvent::BatchCompleted {
            batch_index: 1,
            total_batches: 3,
            added_this_batch: 4,
            running_total: 4,
        });
        run.apply(&RunEvent::BatchFailed {
            batch_index: 2,
            total_batches: 3,
            message: "quota exceeded".into(),
            running_total: 4,
        });

        assert!(!run.is_active);
        assert_eq!(run.total_added, 4);
        assert_eq!(run.current_batch_index, 2);
        assert_eq!(run.last_error.as_deref(), Some("quota exceeded"));
        assert_eq!(
            run.status_message,
            "Batch 2/3: error - quota exceeded; total added before error 4"
        );
    }
}
