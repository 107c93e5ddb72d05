//! Fixed worker pool fed by a two-level priority queue.
//!
//! Jobs wait in a high-priority and a normal queue behind one mutex; idle
//! workers sleep on a condvar. Finished work travels back through one
//! `crossbeam-channel` per result kind and is drained by the owning thread
//! with non-blocking polls, so the live chunk map is only ever touched there.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, error, info, warn};

use crate::context::JobContext;
use crate::job::{GenerateResult, Job, JobFailure, MeshResult, SaveResult};
use crate::process::{JobOutput, run_job};

/// Worker count used when none is configured: all cores but one, at least one.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

#[derive(Default)]
struct Queues {
    high: VecDeque<Job>,
    normal: VecDeque<Job>,
    stopping: bool,
}

impl Queues {
    fn pop(&mut self) -> Option<Job> {
        self.high.pop_front().or_else(|| self.normal.pop_front())
    }

    fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }
}

struct Shared {
    queues: Mutex<Queues>,
    available: Condvar,
    /// Queued plus executing.
    in_flight: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
struct ResultSenders {
    generated: Sender<GenerateResult>,
    meshed: Sender<MeshResult>,
    saved: Sender<SaveResult>,
    failed: Sender<JobFailure>,
}

/// Runs chunk jobs on background threads.
///
/// Jobs may be enqueued before [`start`](Self::start); they run once workers
/// exist. Dropping the scheduler stops it.
pub struct JobScheduler {
    context: Arc<JobContext>,
    shared: Arc<Shared>,
    senders: ResultSenders,
    generated: Receiver<GenerateResult>,
    meshed: Receiver<MeshResult>,
    saved: Receiver<SaveResult>,
    failed: Receiver<JobFailure>,
    workers: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new(context: JobContext) -> Self {
        let (generated_tx, generated) = unbounded();
        let (meshed_tx, meshed) = unbounded();
        let (saved_tx, saved) = unbounded();
        let (failed_tx, failed) = unbounded();
        Self {
            context: Arc::new(context),
            shared: Arc::new(Shared {
                queues: Mutex::new(Queues::default()),
                available: Condvar::new(),
                in_flight: AtomicUsize::new(0),
            }),
            senders: ResultSenders {
                generated: generated_tx,
                meshed: meshed_tx,
                saved: saved_tx,
                failed: failed_tx,
            },
            generated,
            meshed,
            saved,
            failed,
            workers: Vec::new(),
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    /// Spawns `worker_count` threads named `strata-worker-{i}`; zero picks
    /// [`default_worker_count`]. Does nothing if workers are already running.
    pub fn start(&mut self, worker_count: usize) -> std::io::Result<()> {
        if !self.workers.is_empty() {
            warn!("Job scheduler already running");
            return Ok(());
        }
        let count = if worker_count == 0 {
            default_worker_count()
        } else {
            worker_count
        };
        self.shared.lock().stopping = false;

        for i in 0..count {
            let shared = Arc::clone(&self.shared);
            let context = Arc::clone(&self.context);
            let senders = self.senders.clone();
            let handle = std::thread::Builder::new()
                .name(format!("strata-worker-{i}"))
                .spawn(move || worker_loop(&shared, &context, &senders))?;
            self.workers.push(handle);
        }
        info!("Job scheduler started with {count} workers");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn enqueue(&self, job: Job) {
        self.push(job, false);
    }

    /// Queues a job ahead of every normal-priority job.
    pub fn enqueue_high_priority(&self, job: Job) {
        self.push(job, true);
    }

    fn push(&self, job: Job, high: bool) {
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        let mut queues = self.shared.lock();
        if high {
            queues.high.push_back(job);
        } else {
            queues.normal.push_back(job);
        }
        drop(queues);
        self.shared.available.notify_one();
    }

    pub fn poll_generated(&self) -> Vec<GenerateResult> {
        self.generated.try_iter().collect()
    }

    pub fn poll_meshed(&self) -> Vec<MeshResult> {
        self.meshed.try_iter().collect()
    }

    pub fn poll_saved(&self) -> Vec<SaveResult> {
        self.saved.try_iter().collect()
    }

    /// Jobs that panicked since the last poll.
    pub fn poll_failed(&self) -> Vec<JobFailure> {
        self.failed.try_iter().collect()
    }

    /// Jobs queued but not yet picked up by a worker.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().len()
    }

    /// Jobs queued or executing.
    pub fn in_flight_count(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn has_completed_work(&self) -> bool {
        !self.generated.is_empty()
            || !self.meshed.is_empty()
            || !self.saved.is_empty()
            || !self.failed.is_empty()
    }

    /// Stops the pool. Queued jobs are finished first, then every worker is
    /// joined. Results stay available for polling.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.shared.lock().stopping = true;
        self.shared.available.notify_all();

        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("{name} exited abnormally");
            }
        }
        info!("Job scheduler stopped");
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &Shared, context: &JobContext, senders: &ResultSenders) {
    loop {
        let job = {
            let mut queues = shared.lock();
            loop {
                if let Some(job) = queues.pop() {
                    break Some(job);
                }
                if queues.stopping {
                    break None;
                }
                queues = shared
                    .available
                    .wait(queues)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        let Some(job) = job else {
            break;
        };

        let (coord, kind) = (job.coord(), job.kind());
        match panic::catch_unwind(AssertUnwindSafe(|| run_job(context, job))) {
            Ok(output) => deliver(senders, output),
            Err(_) => {
                error!("{kind:?} job for chunk {coord} panicked");
                let _ = senders.failed.send(JobFailure { coord, kind });
            }
        }
        shared.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
    debug!("worker exiting");
}

fn deliver(senders: &ResultSenders, output: JobOutput) {
    let delivered = match output {
        JobOutput::Generated(result) => senders.generated.send(result).is_ok(),
        JobOutput::Meshed(result) => senders.meshed.send(result).is_ok(),
        JobOutput::Saved(result) => senders.saved.send(result).is_ok(),
    };
    if !delivered {
        debug!("result dropped, scheduler is gone");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use strata_voxel::ChunkCoord;

    fn scheduler() -> JobScheduler {
        JobScheduler::new(JobContext::in_memory(77))
    }

    fn wait_for<F: FnMut() -> bool>(mut done: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(30);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_all_jobs_complete_with_fewer_workers() {
        let mut scheduler = scheduler();
        let n = 12;
        for i in 0..n {
            scheduler.enqueue(Job::generate(ChunkCoord::new(i, 7, -i)));
        }
        assert_eq!(scheduler.pending_count(), n as usize);
        scheduler.start(3).unwrap();
        assert_eq!(scheduler.worker_count(), 3);

        let mut results = Vec::new();
        assert!(wait_for(|| {
            results.extend(scheduler.poll_generated());
            results.len() == n as usize
        }));
        let mut coords: Vec<_> = results.iter().map(|r| r.coord.x).collect();
        coords.sort_unstable();
        assert_eq!(coords, (0..n).collect::<Vec<_>>());
        assert!(wait_for(|| scheduler.in_flight_count() == 0));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_high_priority_runs_first() {
        let mut scheduler = scheduler();
        for i in 0..4 {
            scheduler.enqueue(Job::generate(ChunkCoord::new(i, 0, 0)));
        }
        scheduler.enqueue_high_priority(Job::generate(ChunkCoord::new(100, 0, 0)));
        scheduler.start(1).unwrap();

        let mut results = Vec::new();
        assert!(wait_for(|| {
            results.extend(scheduler.poll_generated());
            results.len() == 5
        }));
        assert_eq!(results[0].coord.x, 100);
        let rest: Vec<_> = results[1..].iter().map(|r| r.coord.x).collect();
        assert_eq!(rest, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stop_finishes_queued_jobs() {
        let mut scheduler = scheduler();
        scheduler.start(2).unwrap();
        for i in 0..6 {
            scheduler.enqueue(Job::generate(ChunkCoord::new(i, 1, 0)));
        }
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.in_flight_count(), 0);
        assert!(scheduler.has_completed_work());
        assert_eq!(scheduler.poll_generated().len(), 6);
        assert!(!scheduler.has_completed_work());
    }

    #[test]
    fn test_results_routed_by_kind() {
        let mut scheduler = scheduler();
        scheduler.start(2).unwrap();
        let coord = ChunkCoord::new(0, 0, 0);
        scheduler.enqueue(Job::save(coord, strata_voxel::Chunk::new()));
        scheduler.enqueue(Job::mesh(
            coord,
            strata_voxel::Chunk::new(),
            strata_mesh::NeighborFaces::none(),
        ));

        let (mut saved, mut meshed) = (Vec::new(), Vec::new());
        assert!(wait_for(|| {
            saved.extend(scheduler.poll_saved());
            meshed.extend(scheduler.poll_meshed());
            saved.len() == 1 && meshed.len() == 1
        }));
        assert!(!saved[0].saved);
        assert!(meshed[0].mesh.is_empty());
        assert!(scheduler.poll_generated().is_empty());
        assert!(scheduler.poll_failed().is_empty());
    }

    #[test]
    fn test_idle_workers_wait() {
        let mut scheduler = scheduler();
        scheduler.start(2).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(!scheduler.has_completed_work());
        assert_eq!(scheduler.in_flight_count(), 0);
        scheduler.enqueue(Job::generate(ChunkCoord::new(3, 3, 3)));
        assert!(wait_for(|| scheduler.has_completed_work()));
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut scheduler = scheduler();
        scheduler.start(2).unwrap();
        scheduler.start(4).unwrap();
        assert_eq!(scheduler.worker_count(), 2);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut scheduler = scheduler();
        scheduler.start(1).unwrap();
        scheduler.stop();
        scheduler.start(1).unwrap();
        scheduler.enqueue(Job::generate(ChunkCoord::new(0, 9, 0)));
        assert!(wait_for(|| !scheduler.poll_generated().is_empty()));
    }
}
