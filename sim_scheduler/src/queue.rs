//! Task queues
//!
//! Both the ready queue and the waiting queue are [`TaskQueue`]s of task ids.
//! Tasks themselves live in the scheduler's task table; moving an id between
//! queues is a transfer, an id is never in two queues at once.

use crate::policy::SelectionPolicy;
use crate::task::Task;
use core_types::TaskId;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// FIFO queue of task ids that a policy may reorder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQueue {
    queue: VecDeque<TaskId>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, task_id: TaskId) {
        self.queue.push_back(task_id);
    }

    pub fn pop_front(&mut self) -> Option<TaskId> {
        self.queue.pop_front()
    }

    pub fn front(&self) -> Option<TaskId> {
        self.queue.front().copied()
    }

    /// Removes `task_id` wherever it sits; returns false if it was not queued
    pub fn remove(&mut self, task_id: TaskId) -> bool {
        match self.queue.iter().position(|&id| id == task_id) {
            Some(index) => self.queue.remove(index).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.queue.contains(&task_id)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.queue.iter().copied()
    }

    /// Stable-sorts the queue with the policy's ordering
    ///
    /// `tasks` is indexed by arrival index.
    pub fn sort_by_policy(&mut self, policy: &dyn SelectionPolicy, tasks: &[Task]) {
        self.queue.make_contiguous().sort_by(|a, b| {
            policy.compare(&tasks[a.index() as usize], &tasks[b.index() as usize])
        });
    }

    /// Returns the id ranked first, without removing it
    ///
    /// Tasks for which `feasible` holds rank ahead of the rest; the policy
    /// orders within each group.
    pub fn best_by_policy<F>(
        &self,
        policy: &dyn SelectionPolicy,
        tasks: &[Task],
        feasible: F,
    ) -> Option<TaskId>
    where
        F: Fn(&Task) -> bool,
    {
        self.queue.iter().copied().min_by(|a, b| {
            rank_feasible_first(
                policy,
                &tasks[a.index() as usize],
                &tasks[b.index() as usize],
                &feasible,
            )
        })
    }
}

/// Orders two candidates: feasible before infeasible, then by policy
pub(crate) fn rank_feasible_first<F>(
    policy: &dyn SelectionPolicy,
    a: &Task,
    b: &Task,
    feasible: &F,
) -> Ordering
where
    F: Fn(&Task) -> bool,
{
    feasible(b)
        .cmp(&feasible(a))
        .then_with(|| policy.compare(a, b))
}

impl FromIterator<TaskId> for TaskQueue {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Fcfs, Sjf};
    use crate::task::TaskSpec;
    use core_types::TaskKind;

    fn tasks(durations: &[u64]) -> Vec<Task> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                Task::from_spec(
                    TaskId::new(i as u32),
                    TaskSpec::new(format!("T{}", i), TaskKind::X, *d),
                )
            })
            .collect()
    }

    #[test]
    fn test_fifo_ordering() {
        let mut queue = TaskQueue::new();
        queue.push_back(TaskId::new(0));
        queue.push_back(TaskId::new(1));
        queue.push_back(TaskId::new(2));

        assert_eq!(queue.pop_front(), Some(TaskId::new(0)));
        assert_eq!(queue.pop_front(), Some(TaskId::new(1)));
        assert_eq!(queue.pop_front(), Some(TaskId::new(2)));
        assert_eq!(queue.pop_front(), None);
    }

    #[test]
    fn test_remove() {
        let mut queue: TaskQueue = (0..3).map(TaskId::new).collect();
        assert!(queue.remove(TaskId::new(1)));
        assert!(!queue.remove(TaskId::new(1)));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![TaskId::new(0), TaskId::new(2)]);
    }

    #[test]
    fn test_sort_by_sjf_is_stable() {
        let tasks = tasks(&[3, 1, 3, 1]);
        let mut queue: TaskQueue = (0..4).map(TaskId::new).collect();

        queue.sort_by_policy(&Sjf, &tasks);

        let order: Vec<u32> = queue.iter().map(|id| id.index()).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_best_by_policy_does_not_remove() {
        let tasks = tasks(&[2, 2]);
        let queue: TaskQueue = [TaskId::new(1), TaskId::new(0)].into_iter().collect();

        assert_eq!(queue.best_by_policy(&Fcfs, &tasks, |_| true), Some(TaskId::new(0)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_best_by_policy_prefers_feasible() {
        let tasks = tasks(&[5, 1, 3]);
        let queue: TaskQueue = (0..3).map(TaskId::new).collect();

        assert_eq!(queue.best_by_policy(&Sjf, &tasks, |_| true), Some(TaskId::new(1)));
        assert_eq!(
            queue.best_by_policy(&Sjf, &tasks, |t| t.id() != TaskId::new(1)),
            Some(TaskId::new(2))
        );
        assert_eq!(queue.best_by_policy(&Sjf, &tasks, |_| false), Some(TaskId::new(1)));
    }
}
