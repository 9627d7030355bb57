use crate::error::AppError;
use crate::model::{Category, Task};
use crate::storage::json_store;
use std::path::{Path, PathBuf};

/// Single owner of the in-memory task list and its data file.
///
/// Every mutation builds the next list, writes it to disk and only then
/// replaces the held list, so a failed save leaves the session untouched.
#[derive(Debug)]
pub struct TaskSession {
    path: PathBuf,
    tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Counts per category, in order of first appearance in the list.
    pub by_category: Vec<(Category, usize)>,
}

impl TaskSession {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let tasks = json_store::load_tasks(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            tasks,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Looks a task up by its 1-based position in the list.
    pub fn task_at(&self, position: usize) -> Result<&Task, AppError> {
        position
            .checked_sub(1)
            .and_then(|index| self.tasks.get(index))
            .ok_or_else(|| AppError::invalid_input("Please enter a valid task number"))
    }

    pub fn add_task(&mut self, task: Task) -> Result<Task, AppError> {
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        tracing::info!(id = task.id(), "added task");
        Ok(task)
    }

    /// Flips completion of the task with `id` and returns its new state.
    pub fn toggle_task(&mut self, id: &str) -> Result<Task, AppError> {
        let mut next = self.tasks.clone();
        let task = next
            .iter_mut()
            .find(|task| task.id() == id)
            .ok_or_else(|| AppError::invalid_input("task not found"))?;
        task.toggle_complete();
        let updated = task.clone();
        self.commit(next)?;

        tracing::info!(id, completed = updated.completed(), "toggled task");
        Ok(updated)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, AppError> {
        let (removed, next) = remove_task(&self.tasks, id)?;
        self.commit(next)?;

        tracing::info!(id, "deleted task");
        Ok(removed)
    }

    pub fn search(&self, term: &str) -> Result<Vec<Task>, AppError> {
        search_tasks(&self.tasks, term)
    }

    pub fn stats(&self) -> TaskStats {
        task_stats(&self.tasks)
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<(), AppError> {
        json_store::save_tasks(&self.path, &next)?;
        self.tasks = next;
        Ok(())
    }
}

/// Returns the removed task and the remaining tasks in their original order.
pub fn remove_task(tasks: &[Task], id: &str) -> Result<(Task, Vec<Task>), AppError> {
    let index = tasks
        .iter()
        .position(|task| task.id() == id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    let mut remaining = tasks.to_vec();
    let removed = remaining.remove(index);
    Ok((removed, remaining))
}

pub fn search_tasks(tasks: &[Task], term: &str) -> Result<Vec<Task>, AppError> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AppError::invalid_input("Search term is required"));
    }

    Ok(tasks
        .iter()
        .filter(|task| task.matches(&needle))
        .cloned()
        .collect())
}

pub fn task_stats(tasks: &[Task]) -> TaskStats {
    let completed = tasks.iter().filter(|task| task.completed()).count();
    let mut by_category: Vec<(Category, usize)> = Vec::new();

    for task in tasks {
        match by_category
            .iter_mut()
            .find(|(category, _)| *category == task.category())
        {
            Some((_, count)) => *count += 1,
            None => by_category.push((task.category(), 1)),
        }
    }

    TaskStats {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
        by_category,
    }
}

/// Whole percentage of `part` in `total`, rounding halves up.
pub fn percent(part: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (part * 100 + total / 2) / total
}

#[cfg(test)]
mod tests {
    use super::{TaskSession, percent, remove_task, search_tasks, task_stats};
    use crate::model::{Category, Task};
    use crate::storage::json_store;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("task-tracker-{nanos}-{file_name}"))
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new("Buy milk", Some("semi-skimmed"), Some(Category::Shopping)).unwrap(),
            Task::new("Write report", Some("Quarterly numbers"), Some(Category::Work)).unwrap(),
            Task::new("Call mum", None, Some(Category::Personal)).unwrap(),
            Task::new("Buy stamps", None, Some(Category::Shopping)).unwrap(),
        ]
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let path = temp_path("session-missing.json");
        let session = TaskSession::open(&path).unwrap();

        assert!(session.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn add_task_persists_full_list() {
        let path = temp_path("session-add.json");
        let mut session = TaskSession::open(&path).unwrap();

        let task = Task::new("Buy milk", None, Some(Category::Shopping)).unwrap();
        let added = session.add_task(task).unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(session.len(), 1);
        assert_eq!(loaded, vec![added]);
    }

    #[test]
    fn toggle_task_flips_and_persists() {
        let path = temp_path("session-toggle.json");
        let mut session = TaskSession::open(&path).unwrap();
        let added = session
            .add_task(Task::new("demo", None, None).unwrap())
            .unwrap();

        let toggled = session.toggle_task(added.id()).unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        let restored = session.toggle_task(added.id()).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(toggled.completed());
        assert!(loaded[0].completed());
        assert!(!restored.completed());
    }

    #[test]
    fn toggle_task_rejects_unknown_id() {
        let path = temp_path("session-toggle-missing.json");
        let mut session = TaskSession::open(&path).unwrap();

        let err = session.toggle_task("nope").unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(!path.exists());
    }

    #[test]
    fn delete_task_keeps_relative_order() {
        let path = temp_path("session-delete.json");
        json_store::save_tasks(&path, &sample_tasks()).unwrap();
        let mut session = TaskSession::open(&path).unwrap();
        let target = session.task_at(2).unwrap().id().to_string();

        let removed = session.delete_task(&target).unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let titles: Vec<&str> = loaded.iter().map(Task::title).collect();
        assert_eq!(removed.title(), "Write report");
        assert_eq!(titles, vec!["Buy milk", "Call mum", "Buy stamps"]);
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn positions_address_their_own_task_when_file_ids_collide() {
        let path = temp_path("session-duplicate-ids.json");
        let content = r#"[
            {"id": "abcd1234", "title": "first", "createdAt": "2025-12-20T00:00:00Z"},
            {"id": "abcd1234", "title": "second", "createdAt": "2025-12-20T00:00:00Z"}
        ]"#;
        std::fs::write(&path, content).unwrap();
        let mut session = TaskSession::open(&path).unwrap();

        let second = session.task_at(2).unwrap().id().to_string();
        let toggled = session.toggle_task(&second).unwrap();
        let first = session.task_at(1).unwrap().id().to_string();
        let removed = session.delete_task(&first).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(toggled.title(), "second");
        assert_eq!(removed.title(), "first");
        assert!(!removed.completed());
        assert_eq!(session.len(), 1);
        assert_eq!(session.task_at(1).unwrap().title(), "second");
        assert!(session.task_at(1).unwrap().completed());
    }

    #[test]
    fn remove_task_from_each_position() {
        let tasks = sample_tasks();
        for index in 0..tasks.len() {
            let (removed, remaining) = remove_task(&tasks, tasks[index].id()).unwrap();
            let mut expected = tasks.clone();
            expected.remove(index);

            assert_eq!(removed, tasks[index]);
            assert_eq!(remaining, expected);
        }
    }

    #[test]
    fn task_at_is_one_based_and_bounded() {
        let path = temp_path("session-bounds.json");
        json_store::save_tasks(&path, &sample_tasks()).unwrap();
        let session = TaskSession::open(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(session.task_at(1).unwrap().title(), "Buy milk");
        assert_eq!(session.task_at(4).unwrap().title(), "Buy stamps");
        assert_eq!(session.task_at(0).unwrap_err().code(), "invalid_input");
        assert_eq!(session.task_at(5).unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn failed_save_leaves_session_unchanged() {
        let dir = temp_path("session-readonly");
        std::fs::create_dir_all(&dir).unwrap();
        // A directory where the data file should be makes every write fail.
        let path = dir.join("data.json");
        std::fs::create_dir_all(&path).unwrap();
        let mut session = TaskSession {
            path: path.clone(),
            tasks: Vec::new(),
        };

        let err = session
            .add_task(Task::new("demo", None, None).unwrap())
            .unwrap_err();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "io_error");
        assert!(session.is_empty());
    }

    #[test]
    fn search_matches_single_title() {
        let tasks = sample_tasks();
        let found = search_tasks(&tasks, "REPORT").unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0], tasks[1]);
    }

    #[test]
    fn search_matches_descriptions_and_keeps_order() {
        let tasks = sample_tasks();
        let found = search_tasks(&tasks, "buy").unwrap();
        let titles: Vec<&str> = found.iter().map(Task::title).collect();
        assert_eq!(titles, vec!["Buy milk", "Buy stamps"]);

        let by_description = search_tasks(&tasks, "skimmed").unwrap();
        assert_eq!(by_description.len(), 1);
    }

    #[test]
    fn search_without_match_is_empty() {
        let found = search_tasks(&sample_tasks(), "holiday").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn search_rejects_blank_term() {
        let err = search_tasks(&sample_tasks(), "   ").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn stats_count_completion_and_categories() {
        let mut tasks = sample_tasks();
        tasks[0].toggle_complete();

        let stats = task_stats(&tasks);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);
        assert_eq!(
            stats.by_category,
            vec![
                (Category::Shopping, 2),
                (Category::Work, 1),
                (Category::Personal, 1)
            ]
        );
    }

    #[test]
    fn stats_of_empty_list() {
        let stats = task_stats(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(0, 0), 0);
    }
}
