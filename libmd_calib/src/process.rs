use std::sync::mpsc::{self, Sender, SyncSender};
use std::thread::JoinHandle;

use super::config::Config;
use super::constants::NCRATE;
use super::error::ProcessorError;
use super::event::{crate_index, EventRecord};
use super::event_source::{EventSource, YamlEventSource};
use super::pipeline::FlashPipeline;
use super::report::RunReport;
use super::worker_status::WorkerStatus;

/// How many events between status messages when the source size is unknown
const UNSIZED_FLUSH_EVENTS: u64 = 1000;
/// Records a crate worker may have queued before the reader waits on it
const WORKER_QUEUE_CAPACITY: usize = 1024;

/// Sends a WorkerStatus every time another percent of the source has been read
struct ProgressTracker<'a> {
    tx: &'a Sender<WorkerStatus>,
    total: Option<usize>,
    events_read: u64,
    count: u64,
    flush_val: u64,
}

impl<'a> ProgressTracker<'a> {
    fn new(tx: &'a Sender<WorkerStatus>, total: Option<usize>) -> Self {
        let flush_frac: f64 = 0.01;
        let flush_val = match total {
            Some(n) => ((n as f64 * flush_frac) as u64).max(1),
            None => UNSIZED_FLUSH_EVENTS,
        };
        Self {
            tx,
            total,
            events_read: 0,
            count: 0,
            flush_val,
        }
    }

    fn tick(&mut self) -> Result<(), ProcessorError> {
        self.events_read += 1;
        self.count += 1;
        if self.count >= self.flush_val {
            self.count = 0;
            let progress = match self.total {
                Some(n) if n > 0 => self.events_read as f32 / n as f32,
                _ => 0.0,
            };
            self.tx
                .send(WorkerStatus::new(progress, self.events_read))?;
        }
        Ok(())
    }

    fn finish(self) -> Result<u64, ProcessorError> {
        self.tx.send(WorkerStatus::done(self.events_read))?;
        Ok(self.events_read)
    }
}

/// Divide the crates among the workers, round robin
pub fn create_subsets(n_workers: usize) -> Vec<Vec<usize>> {
    let mut subsets: Vec<Vec<usize>> = vec![Vec::new(); n_workers.clamp(1, NCRATE)];
    let n_subsets = subsets.len();

    for crate_idx in 0..NCRATE {
        subsets[crate_idx % n_subsets].push(crate_idx)
    }

    subsets
}

/// Run every event of a source through a single pipeline on the calling thread
pub fn process_sequential<S: EventSource>(
    source: &mut S,
    seed: Option<u64>,
    tx: &Sender<WorkerStatus>,
) -> Result<FlashPipeline, ProcessorError> {
    let mut pipeline = FlashPipeline::seeded(seed);
    let mut tracker = ProgressTracker::new(tx, source.total_events());
    while let Some(event) = source.next_event()? {
        pipeline.process(&event);
        tracker.tick()?;
    }
    let events_read = tracker.finish()?;
    spdlog::info!("Read {} event records.", events_read);
    Ok(pipeline)
}

/// Spawn a worker owning a pipeline; it runs until its sender is dropped
fn spawn_worker(
    worker_id: usize,
    seed: Option<u64>,
) -> (SyncSender<EventRecord>, JoinHandle<FlashPipeline>) {
    let (event_tx, event_rx) = mpsc::sync_channel::<EventRecord>(WORKER_QUEUE_CAPACITY);
    let handle = std::thread::spawn(move || {
        let mut pipeline = FlashPipeline::seeded(seed);
        for event in event_rx {
            pipeline.process(&event);
        }
        spdlog::debug!(
            "Crate worker {} done with {} flashes",
            worker_id,
            pipeline.total_flashes()
        );
        pipeline
    });
    (event_tx, handle)
}

/// Run a source through one pipeline per worker, each worker owning a fixed set of crates.
///
/// Events are routed by crate id, so every crate is only ever touched by one worker and keeps
/// its input order. Records with an invalid crate id go to the first worker, which counts them.
pub fn process_parallel<S: EventSource>(
    source: &mut S,
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<FlashPipeline, ProcessorError> {
    let subsets = create_subsets(config.n_threads.max(1) as usize);
    let mut owners = [0usize; NCRATE];
    let mut senders: Vec<SyncSender<EventRecord>> = Vec::new();
    let mut handles: Vec<JoinHandle<FlashPipeline>> = Vec::new();
    for (worker_id, subset) in subsets.iter().enumerate() {
        spdlog::info!("Crate worker {} owns crates {:?}", worker_id, subset);
        for crate_idx in subset {
            owners[*crate_idx] = worker_id;
        }
        let (event_tx, handle) = spawn_worker(worker_id, config.worker_seed(worker_id));
        senders.push(event_tx);
        handles.push(handle);
    }

    let mut tracker = ProgressTracker::new(tx, source.total_events());
    while let Some(event) = source.next_event()? {
        let worker_id = crate_index(event.crate_id)
            .map(|c| owners[c])
            .unwrap_or(0);
        senders[worker_id]
            .send(event)
            .map_err(|_| ProcessorError::WorkerDisconnected(worker_id))?;
        tracker.tick()?;
    }
    // Closing the channels lets the workers finish
    drop(senders);

    let mut merged: Option<FlashPipeline> = None;
    for (worker_id, handle) in handles.into_iter().enumerate() {
        let pipeline = handle
            .join()
            .map_err(|_| ProcessorError::WorkerPanicked(worker_id))?;
        match merged.as_mut() {
            Some(m) => m.merge(pipeline),
            None => merged = Some(pipeline),
        }
    }
    let events_read = tracker.finish()?;
    spdlog::info!("Read {} event records.", events_read);

    Ok(merged.unwrap_or_else(|| FlashPipeline::seeded(config.seed)))
}

/// Process any event source according to the config thread count
pub fn process_source<S: EventSource>(
    source: &mut S,
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<FlashPipeline, ProcessorError> {
    if config.n_threads > 1 {
        process_parallel(source, config, tx)
    } else {
        process_sequential(source, config.seed, tx)
    }
}

/// The main loop of md_calib.
///
/// Reads the event file named in the config, accumulates the calibration flashes and writes
/// the run report. The finished pipeline is handed back for further calibration.
pub fn process_run(
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<(FlashPipeline, RunReport), ProcessorError> {
    config.validate()?;
    let mut source = YamlEventSource::new(&config.event_path)?;
    spdlog::info!(
        "Loaded {} event records ({}) from {}",
        source.total_events().unwrap_or(0),
        human_bytes::human_bytes(source.get_size_bytes() as f64),
        source.get_path().display()
    );

    let pipeline = process_source(&mut source, config, tx)?;

    let report = RunReport::from_pipeline(&pipeline);
    report.log_summary();
    report.write(&config.report_path)?;
    spdlog::info!("Wrote run report to {}", config.report_path.display());
    Ok((pipeline, report))
}
