//! Fixed-size worker pool with ordered result collection
//!
//! Jobs are pulled from a shared channel by `size` threads. Each job's
//! result is tagged with its submission index so [`WorkerPool::join_all`]
//! can return results in submission order regardless of completion order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::errors::{MosaicError, MosaicResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    index: usize,
}

impl TaskHandle {
    /// Position of the task in submission order
    pub fn index(&self) -> usize {
        self.index
    }
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, receiver: Arc<Mutex<Receiver<Job>>>) -> MosaicResult<Self> {
        let thread = thread::Builder::new()
            .name(format!("tile-worker-{}", id))
            .spawn(move || loop {
                let message = match receiver.lock() {
                    Ok(guard) => guard.recv(),
                    Err(_) => break,
                };
                match message {
                    Ok(job) => job(),
                    Err(_) => break,
                }
            })?;

        Ok(Worker { id, thread: Some(thread) })
    }
}

/// A pool of worker threads producing values of type `T`
pub struct WorkerPool<T: Send + 'static> {
    workers: Vec<Worker>,
    sender: Option<Sender<Job>>,
    result_tx: Sender<(usize, T)>,
    result_rx: Receiver<(usize, T)>,
    submitted: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `size` workers
    pub fn new(size: usize) -> MosaicResult<Self> {
        if size == 0 {
            return Err(MosaicError::InputValidation("Worker pool needs at least one worker".to_string()));
        }

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..size)
            .map(|id| Worker::spawn(id, Arc::clone(&receiver)))
            .collect::<MosaicResult<Vec<_>>>()?;
        let (result_tx, result_rx) = mpsc::channel();

        debug!("Started worker pool with {} threads", size);
        Ok(WorkerPool {
            workers,
            sender: Some(sender),
            result_tx,
            result_rx,
            submitted: 0,
        })
    }

    /// Queue a task
    pub fn submit<F>(&mut self, task: F) -> MosaicResult<TaskHandle>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let index = self.submitted;
        let result_tx = self.result_tx.clone();
        let job: Job = Box::new(move || {
            // The receiver only disappears once the pool itself is gone
            let _ = result_tx.send((index, task()));
        });

        let sender = self.sender.as_ref()
            .ok_or_else(|| MosaicError::Worker("Pool is shut down".to_string()))?;
        sender.send(job).map_err(|_| MosaicError::Worker("All workers have exited".to_string()))?;

        self.submitted += 1;
        Ok(TaskHandle { index })
    }

    /// Wait for every task and return their results in submission order
    pub fn join_all(mut self) -> MosaicResult<Vec<T>> {
        self.shutdown();

        let mut slots: Vec<Option<T>> = (0..self.submitted).map(|_| None).collect();
        for (index, value) in self.result_rx.try_iter() {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(value);
            }
        }

        slots.into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or_else(|| MosaicError::Worker(format!("Task {} produced no result", index))))
            .collect()
    }

    /// Close the job queue and wait for the workers to drain it
    fn shutdown(&mut self) {
        drop(self.sender.take());

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("Worker {} panicked", worker.id);
                }
            }
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_results_follow_submission_order() {
        let mut pool = WorkerPool::new(4).unwrap();
        for i in 0..20u64 {
            // Later tasks finish first
            pool.submit(move || {
                thread::sleep(Duration::from_millis(20 - i));
                i * 10
            }).unwrap();
        }

        let results = pool.join_all().unwrap();
        assert_eq!(results, (0..20u64).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_handles_count_up() {
        let mut pool = WorkerPool::new(1).unwrap();
        let first = pool.submit(|| ()).unwrap();
        let second = pool.submit(|| ()).unwrap();
        assert_eq!((first.index(), second.index()), (0, 1));
        assert_eq!(pool.join_all().unwrap().len(), 2);
    }

    #[test]
    fn test_panicking_task_is_reported() {
        let mut pool = WorkerPool::new(2).unwrap();
        pool.submit(|| 1).unwrap();
        pool.submit(|| panic!("boom")).unwrap();
        assert!(matches!(pool.join_all(), Err(MosaicError::Worker(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(WorkerPool::<()>::new(0).is_err());
    }
}
