use tracing::debug;

use crate::error::ApiError;
use crate::store::fence::{Fence, Ticket};
use crate::types::{ListId, Task, TaskId, UpdateTask};

/// Tasks of a single list.
///
/// The list is always passed in by the caller; `list_id` records which list
/// `tasks` belongs to. Mutations addressed to any other list are ignored, so
/// a late response for a list the user navigated away from cannot leak into
/// the one on screen.
#[derive(Debug, Clone, Default)]
pub struct TaskState {
    pub list_id: Option<ListId>,
    pub tasks: Option<Vec<Task>>,
    pub is_loading: bool,
    fence: Fence,
}

impl TaskState {
    /// Start fetching the tasks of `list_id`. Switching to another list drops
    /// the tasks on hand so nothing from the previous list is displayed.
    pub fn begin_fetch(&mut self, list_id: &ListId, force: bool, authenticated: bool) -> Option<Ticket> {
        let same_list = self.list_id.as_ref() == Some(list_id);
        if !force && same_list && (self.tasks.is_some() || self.is_loading) {
            return None;
        }
        if !authenticated {
            return None;
        }
        if !same_list {
            self.list_id = Some(list_id.clone());
            self.tasks = None;
        }
        self.is_loading = true;
        Some(self.fence.issue())
    }

    pub fn finish_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Task>, ApiError>,
    ) -> Result<(), ApiError> {
        let current = self.fence.is_current(ticket);
        if current {
            self.is_loading = false;
        }
        let tasks = result?;
        if current {
            self.tasks = Some(tasks);
        } else {
            debug!("discarding stale tasks response");
        }
        Ok(())
    }

    /// Tasks for `list_id`, if that is the list currently loaded.
    pub fn tasks_for(&self, list_id: &ListId) -> Option<&[Task]> {
        if self.list_id.as_ref() != Some(list_id) {
            return None;
        }
        self.tasks.as_deref()
    }

    fn loaded_mut(&mut self, list_id: &ListId) -> Option<&mut Vec<Task>> {
        if self.list_id.as_ref() != Some(list_id) {
            return None;
        }
        self.tasks.as_mut()
    }

    pub fn add(&mut self, list_id: &ListId, task: Task) {
        if let Some(tasks) = self.loaded_mut(list_id) {
            tasks.push(task);
        }
    }

    pub fn merge(&mut self, list_id: &ListId, id: &TaskId, patch: &UpdateTask) {
        if let Some(task) = self
            .loaded_mut(list_id)
            .and_then(|tasks| tasks.iter_mut().find(|task| &task.id == id))
        {
            task.apply(patch);
        }
    }

    pub fn remove(&mut self, list_id: &ListId, id: &TaskId) {
        if let Some(tasks) = self.loaded_mut(list_id) {
            tasks.retain(|task| &task.id != id);
        }
    }

    /// Number of unfinished tasks in the loaded list.
    pub fn incomplete_count(&self) -> usize {
        self.tasks
            .iter()
            .flatten()
            .filter(|task| !task.done)
            .count()
    }

    pub fn reset(&mut self) {
        self.list_id = None;
        self.tasks = None;
        self.is_loading = false;
        self.fence.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::iso_millis;

    fn task(id: &str, title: &str, done: bool) -> Task {
        Task {
            id: TaskId::from(id),
            title: title.to_string(),
            detail: format!("{title} detail"),
            done,
            limit: None,
        }
    }

    fn loaded(list: &str, tasks: Vec<Task>) -> TaskState {
        let mut state = TaskState::default();
        let ticket = state.begin_fetch(&ListId::from(list), false, true).unwrap();
        state.finish_fetch(ticket, Ok(tasks)).unwrap();
        state
    }

    #[test]
    fn same_list_fetch_short_circuits() {
        let mut state = loaded("L1", vec![task("T1", "a", false)]);
        assert!(state.begin_fetch(&ListId::from("L1"), false, true).is_none());
        assert!(state.begin_fetch(&ListId::from("L1"), true, true).is_some());
    }

    #[test]
    fn fetch_requires_authentication() {
        let mut state = TaskState::default();
        assert!(state.begin_fetch(&ListId::from("L1"), false, false).is_none());
        assert!(state.list_id.is_none());
    }

    #[test]
    fn switching_list_clears_tasks_until_fetched() {
        let mut state = loaded("L1", vec![task("T1", "a", false)]);
        let ticket = state.begin_fetch(&ListId::from("L2"), false, true).unwrap();
        assert!(state.tasks.is_none());
        assert!(state.tasks_for(&ListId::from("L1")).is_none());
        state.finish_fetch(ticket, Ok(vec![task("T2", "b", true)])).unwrap();
        assert_eq!(
            state.tasks_for(&ListId::from("L2")).map(<[Task]>::len),
            Some(1)
        );
    }

    #[test]
    fn response_for_abandoned_list_is_discarded() {
        let mut state = TaskState::default();
        let old = state.begin_fetch(&ListId::from("L1"), false, true).unwrap();
        let new = state.begin_fetch(&ListId::from("L2"), false, true).unwrap();
        state.finish_fetch(old, Ok(vec![task("T1", "a", false)])).unwrap();
        assert!(state.tasks.is_none());
        assert!(state.is_loading);
        state.finish_fetch(new, Ok(Vec::new())).unwrap();
        assert_eq!(state.tasks, Some(Vec::new()));
        assert!(!state.is_loading);
    }

    #[test]
    fn done_update_changes_only_done() {
        let limit = iso_millis::parse("2024-01-01T00:00:00.000Z").unwrap();
        let mut original = task("T1", "a", false);
        original.limit = Some(limit);
        let mut state = loaded("L1", vec![original.clone(), task("T2", "b", false)]);

        state.merge(&ListId::from("L1"), &TaskId::from("T1"), &UpdateTask::done(true));

        let tasks = state.tasks_for(&ListId::from("L1")).unwrap();
        assert_eq!(tasks[0], Task { done: true, ..original });
        assert_eq!(tasks[1], task("T2", "b", false));
    }

    #[test]
    fn mutations_for_other_lists_are_ignored() {
        let mut state = loaded("L1", vec![task("T1", "a", false)]);
        let other = ListId::from("L2");
        state.add(&other, task("T2", "b", false));
        state.merge(&other, &TaskId::from("T1"), &UpdateTask::done(true));
        state.remove(&other, &TaskId::from("T1"));
        assert_eq!(state.tasks, Some(vec![task("T1", "a", false)]));
    }

    #[test]
    fn add_and_remove_apply_to_loaded_list() {
        let list = ListId::from("L1");
        let mut state = loaded("L1", vec![task("T1", "a", false)]);
        state.add(&list, task("T2", "b", true));
        assert_eq!(state.incomplete_count(), 1);
        state.remove(&list, &TaskId::from("T1"));
        assert_eq!(state.tasks, Some(vec![task("T2", "b", true)]));
        assert_eq!(state.incomplete_count(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = loaded("L1", vec![task("T1", "a", false)]);
        state.reset();
        assert!(state.list_id.is_none());
        assert!(state.tasks.is_none());
        assert!(!state.is_loading);
    }
}
