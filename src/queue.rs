//! Generic FIFO queue plus the job-keyed and priority-keyed queues built on top of it.

use std::collections::VecDeque;

use crate::error::{SprinklerError, SprinklerResult};
use crate::job::{Job, JobId};

/// A plain FIFO. `list_all` hands out an owned snapshot so callers can never
/// observe (or corrupt) the scheduler's live state through a returned reference.
#[derive(Debug, Default)]
pub struct Queue<T> {
    items: VecDeque<T>,
}

impl<T: Clone> Queue<T> {
    pub fn new() -> Self {
        Self { items: VecDeque::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Removes and returns the first item matching `predicate`.
    pub fn remove<F: Fn(&T) -> bool>(&mut self, predicate: F) -> Option<T> {
        let idx = self.items.iter().position(predicate)?;
        self.items.remove(idx)
    }

    pub fn find<F: Fn(&T) -> bool>(&self, predicate: F) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    pub fn list_all(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// A `Queue<Job>` with `job_id`-keyed lookup.
#[derive(Debug, Default)]
pub struct JobQueue {
    queue: Queue<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self { queue: Queue::new() }
    }

    pub fn push(&mut self, job: Job) {
        self.queue.push(job);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn peek(&self) -> Option<&Job> {
        self.queue.peek()
    }

    pub fn pop(&mut self) -> Option<Job> {
        self.queue.pop()
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.queue.find(|job| job.job_id == job_id).is_some()
    }

    pub fn get(&self, job_id: JobId) -> Option<&Job> {
        self.queue.find(|job| job.job_id == job_id)
    }

    pub fn remove(&mut self, job_id: JobId) -> SprinklerResult<Job> {
        self.queue
            .remove(|job| job.job_id == job_id)
            .ok_or(SprinklerError::NotFound(job_id))
    }

    pub fn list_all(&self) -> Vec<Job> {
        self.queue.list_all()
    }
}

/// Two FIFO sub-queues, one per priority level. High priority is always
/// served and listed before low priority.
#[derive(Debug, Default)]
pub struct PriorityJobQueue {
    high: JobQueue,
    low: JobQueue,
}

impl PriorityJobQueue {
    pub fn new() -> Self {
        Self { high: JobQueue::new(), low: JobQueue::new() }
    }

    fn queue_for(&mut self, high_priority: bool) -> &mut JobQueue {
        if high_priority {
            &mut self.high
        } else {
            &mut self.low
        }
    }

    pub fn push(&mut self, job: Job) {
        self.queue_for(job.high_priority).push(job);
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }

    pub fn peek(&self) -> Option<&Job> {
        if !self.high.is_empty() {
            self.high.peek()
        } else {
            self.low.peek()
        }
    }

    pub fn pop(&mut self) -> Option<Job> {
        if !self.high.is_empty() {
            self.high.pop()
        } else {
            self.low.pop()
        }
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.high.contains(job_id) || self.low.contains(job_id)
    }

    pub fn get(&self, job_id: JobId) -> Option<&Job> {
        self.high.get(job_id).or_else(|| self.low.get(job_id))
    }

    pub fn remove(&mut self, job_id: JobId) -> SprinklerResult<Job> {
        if self.high.contains(job_id) {
            self.high.remove(job_id)
        } else {
            self.low.remove(job_id)
        }
    }

    /// High-priority jobs first, then low-priority.
    pub fn list_all(&self) -> Vec<Job> {
        let mut jobs = self.high.list_all();
        jobs.extend(self.low.list_all());
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: JobId, high: bool) -> Job {
        Job::new(id, "court1".to_string(), 10.0, high)
    }

    #[test]
    fn fifo_queue_preserves_order() {
        let mut q: Queue<i32> = Queue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.list_all(), vec![3]);
    }

    #[test]
    fn queue_remove_by_predicate() {
        let mut q: Queue<i32> = Queue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.remove(|&x| x == 2), Some(2));
        assert_eq!(q.list_all(), vec![1, 3]);
    }

    #[test]
    fn job_queue_remove_missing_is_not_found() {
        let mut jq = JobQueue::new();
        jq.push(job(1, false));
        assert!(matches!(jq.remove(99), Err(SprinklerError::NotFound(99))));
    }

    #[test]
    fn priority_queue_serves_high_before_low() {
        let mut pq = PriorityJobQueue::new();
        pq.push(job(1, false));
        pq.push(job(2, true));
        pq.push(job(3, false));

        assert_eq!(pq.peek().unwrap().job_id, 2);
        let order: Vec<JobId> = pq.list_all().iter().map(|j| j.job_id).collect();
        assert_eq!(order, vec![2, 1, 3]);

        assert_eq!(pq.pop().unwrap().job_id, 2);
        assert_eq!(pq.pop().unwrap().job_id, 1);
        assert_eq!(pq.pop().unwrap().job_id, 3);
        assert!(pq.is_empty());
    }

    #[test]
    fn priority_queue_remove_searches_both_levels() {
        let mut pq = PriorityJobQueue::new();
        pq.push(job(1, false));
        pq.push(job(2, true));
        let removed = pq.remove(1).unwrap();
        assert_eq!(removed.job_id, 1);
        assert!(!pq.contains(1));
        assert!(pq.contains(2));
    }
}
