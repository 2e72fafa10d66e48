/// Progress message sent from a processing run to whoever is watching it
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub events_read: u64,
    pub finished: bool,
}

impl WorkerStatus {
    pub fn new(progress: f32, events_read: u64) -> Self {
        Self {
            progress,
            events_read,
            finished: false,
        }
    }

    /// Final message of a run
    pub fn done(events_read: u64) -> Self {
        Self {
            progress: 1.0,
            events_read,
            finished: true,
        }
    }
}
