//! Admission queues arbitrating access to a loading or dumping resource.
//!
//! Each dig face and dump owns one FIFO queue. Only the vehicle at the front
//! is serviced. Capacity is advisory by default: enqueue always succeeds and
//! reports whether the queue was already full. Under
//! [`CapacityPolicy::Reject`] a full queue refuses new jobs and the vehicle
//! waits off-queue, retrying every tick.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use pitfleet_types::{JobId, QueueSlots, QueueView, SiteId, VehicleId};
use serde::{Deserialize, Serialize};

/// Capacity of a newly created queue.
pub const DEFAULT_QUEUE_CAPACITY: u32 = 3;

/// How a queue treats jobs arriving while it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Accept and flag the job as over capacity.
    #[default]
    Advisory,
    /// Refuse the job.
    Reject,
}

/// A vehicle's claim on a shared resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionJob {
    /// Job identifier.
    pub job_id: JobId,
    /// Vehicle waiting for service.
    pub consumer_id: VehicleId,
    /// Opaque data attached by the submitter.
    pub payload: serde_json::Value,
    /// When the job was queued.
    pub created_at: DateTime<Utc>,
}

impl AdmissionJob {
    /// Create a job for `consumer_id` stamped with the current time.
    pub fn new(consumer_id: VehicleId, payload: serde_json::Value) -> Self {
        Self {
            job_id: JobId::new(),
            consumer_id,
            payload,
            created_at: Utc::now(),
        }
    }
}

/// Result of [`AdmissionQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The job joined the back of the queue.
    Accepted {
        /// Identifier of the queued job.
        job_id: JobId,
        /// Whether the queue was at or above capacity before the job joined.
        over_capacity: bool,
    },
    /// The queue was full under [`CapacityPolicy::Reject`].
    Rejected,
}

impl EnqueueOutcome {
    /// Whether the job is now in the queue.
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Capacity-annotated FIFO of admission jobs for one site.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionQueue {
    site_id: SiteId,
    capacity: u32,
    policy: CapacityPolicy,
    jobs: VecDeque<AdmissionJob>,
}

impl AdmissionQueue {
    /// Create an empty queue for a site.
    pub fn new(site_id: SiteId, capacity: u32, policy: CapacityPolicy) -> Self {
        Self {
            site_id,
            capacity: capacity.max(1),
            policy,
            jobs: VecDeque::new(),
        }
    }

    /// Site this queue arbitrates.
    pub const fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    /// Current capacity.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the queue holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Append a job, subject to the capacity policy.
    pub fn enqueue(&mut self, job: AdmissionJob) -> EnqueueOutcome {
        let full = self.used() >= self.capacity;
        if full && self.policy == CapacityPolicy::Reject {
            return EnqueueOutcome::Rejected;
        }
        let job_id = job.job_id;
        self.jobs.push_back(job);
        EnqueueOutcome::Accepted {
            job_id,
            over_capacity: full,
        }
    }

    /// Append several jobs in order, returning one outcome per job.
    pub fn enqueue_many(&mut self, jobs: impl IntoIterator<Item = AdmissionJob>) -> Vec<EnqueueOutcome> {
        jobs.into_iter().map(|job| self.enqueue(job)).collect()
    }

    /// Remove and return the front job.
    pub fn dequeue_front(&mut self) -> Option<AdmissionJob> {
        self.jobs.pop_front()
    }

    /// Move the first job of `consumer` to the back. Returns whether it was found.
    pub fn bump_to_back(&mut self, consumer: &VehicleId) -> bool {
        let Some(idx) = self.position(consumer) else {
            return false;
        };
        match self.jobs.remove(idx) {
            Some(job) => {
                self.jobs.push_back(job);
                true
            }
            None => false,
        }
    }

    /// Remove every job of `consumer`. Returns whether any was removed.
    pub fn withdraw(&mut self, consumer: &VehicleId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| &j.consumer_id != consumer);
        self.jobs.len() != before
    }

    /// Drop every job.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Whether `consumer` holds a job in this queue.
    pub fn contains(&self, consumer: &VehicleId) -> bool {
        self.position(consumer).is_some()
    }

    /// The job at the front, if any.
    pub fn front(&self) -> Option<&AdmissionJob> {
        self.jobs.front()
    }

    /// Whether `consumer` is at the front and therefore being serviced.
    pub fn is_front(&self, consumer: &VehicleId) -> bool {
        self.front().is_some_and(|j| &j.consumer_id == consumer)
    }

    /// Queued jobs, front first.
    pub fn jobs(&self) -> impl Iterator<Item = &AdmissionJob> {
        self.jobs.iter()
    }

    /// Queued vehicles, front first.
    pub fn consumer_ids(&self) -> Vec<VehicleId> {
        self.jobs.iter().map(|j| j.consumer_id.clone()).collect()
    }

    /// Capacity and occupancy.
    pub fn slots(&self) -> QueueSlots {
        let used = self.used();
        QueueSlots {
            capacity: self.capacity,
            used,
            free: self.capacity.saturating_sub(used),
        }
    }

    /// Change capacity, floored at 1. Existing jobs are kept.
    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity.max(1);
    }

    /// Read-only view for snapshots.
    pub fn view(&self) -> QueueView {
        QueueView {
            site_id: self.site_id.clone(),
            consumer_ids: self.consumer_ids(),
            active: self.front().map(|j| j.consumer_id.clone()),
            slots: self.slots(),
        }
    }

    fn position(&self, consumer: &VehicleId) -> Option<usize> {
        self.jobs.iter().position(|j| &j.consumer_id == consumer)
    }

    fn used(&self) -> u32 {
        u32::try_from(self.jobs.len()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn job(id: &str) -> AdmissionJob {
        AdmissionJob::new(VehicleId::from(id), serde_json::Value::Null)
    }

    fn ids(q: &AdmissionQueue) -> Vec<String> {
        q.consumer_ids().into_iter().map(|v| v.0).collect()
    }

    fn drain(q: &mut AdmissionQueue) -> Vec<String> {
        std::iter::from_fn(|| q.dequeue_front())
            .map(|j| j.consumer_id.0)
            .collect()
    }

    fn queue_of(consumers: &[&str]) -> AdmissionQueue {
        let mut q = AdmissionQueue::new(SiteId::from("DIG-A"), 3, CapacityPolicy::Advisory);
        for id in consumers {
            assert!(q.enqueue(job(id)).is_accepted());
        }
        q
    }

    #[test]
    fn fifo_order_and_bump_to_back() {
        let mut q = queue_of(&["A", "B", "C"]);
        assert_eq!(ids(&q), vec!["A", "B", "C"]);
        assert_eq!(drain(&mut q), vec!["A", "B", "C"]);
        assert!(q.dequeue_front().is_none());
        assert!(q.is_empty());

        let mut q = queue_of(&["A", "B", "C"]);
        assert!(q.bump_to_back(&VehicleId::from("B")));
        assert_eq!(ids(&q), vec!["A", "C", "B"]);
        assert!(!q.bump_to_back(&VehicleId::from("Z")));

        assert_eq!(q.dequeue_front().map(|j| j.consumer_id.0), Some("A".to_owned()));
        assert_eq!(q.view().active, Some(VehicleId::from("C")));
        assert_eq!(drain(&mut q), vec!["C", "B"]);
        assert!(q.dequeue_front().is_none());
        assert!(q.view().active.is_none());
    }

    #[test]
    fn dequeue_on_empty_queue_returns_none() {
        let mut q = AdmissionQueue::new(SiteId::from("DUMP-A"), 3, CapacityPolicy::Advisory);
        assert!(q.dequeue_front().is_none());
        assert!(q.front().is_none());
        assert!(q.view().active.is_none());
    }

    #[test]
    fn advisory_capacity_accepts_and_flags_overflow() {
        let mut q = AdmissionQueue::new(SiteId::from("DIG-A"), 1, CapacityPolicy::Advisory);
        assert_eq!(
            q.enqueue(job("A")),
            EnqueueOutcome::Accepted {
                job_id: q.front().unwrap().job_id,
                over_capacity: false
            }
        );
        let second = q.enqueue(job("B"));
        assert!(matches!(second, EnqueueOutcome::Accepted { over_capacity: true, .. }));
        assert_eq!(q.slots(), QueueSlots { capacity: 1, used: 2, free: 0 });
    }

    #[test]
    fn reject_policy_refuses_when_full() {
        let mut q = AdmissionQueue::new(SiteId::from("DIG-A"), 2, CapacityPolicy::Reject);
        let outcomes = q.enqueue_many([job("A"), job("B"), job("C")]);
        assert!(outcomes[0].is_accepted());
        assert!(outcomes[1].is_accepted());
        assert_eq!(outcomes[2], EnqueueOutcome::Rejected);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn capacity_is_floored_at_one() {
        let mut q = AdmissionQueue::new(SiteId::from("DIG-A"), 0, CapacityPolicy::Advisory);
        assert_eq!(q.capacity(), 1);
        q.set_capacity(0);
        assert_eq!(q.slots().capacity, 1);
        q.set_capacity(5);
        assert_eq!(q.slots().free, 5);
    }

    #[test]
    fn withdraw_removes_every_job_of_a_consumer() {
        let mut q = AdmissionQueue::new(SiteId::from("DIG-A"), 3, CapacityPolicy::Advisory);
        q.enqueue_many([job("A"), job("B"), job("A")]);
        assert!(q.withdraw(&VehicleId::from("A")));
        assert_eq!(ids(&q), vec!["B"]);
        assert!(!q.withdraw(&VehicleId::from("A")));
        assert!(!q.contains(&VehicleId::from("A")));
        q.clear();
        assert!(q.is_empty());
    }
}
