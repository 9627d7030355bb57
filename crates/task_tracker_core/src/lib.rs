pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_api;

pub use error::AppError;
pub use model::{Category, Task};
pub use task_api::{TaskSession, TaskStats};

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Category, Task};

    #[test]
    fn task_has_required_fields() {
        let task = Task::new("demo", None, None).unwrap();

        assert_eq!(task.title(), "demo");
        assert_eq!(task.description(), "");
        assert_eq!(task.category(), Category::General);
        assert!(!task.completed());
        assert_eq!(task.due_date(), None);
        assert_eq!(task.id().len(), 8);
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");
    }
}
