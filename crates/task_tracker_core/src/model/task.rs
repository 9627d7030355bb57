use super::Category;
use crate::error::AppError;
use serde::{Deserialize, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

const DUE_DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const ID_LEN: usize = 8;

/// A single to-do item.
///
/// Fields are private so the title invariant (never blank) and the
/// immutability of `id` and `created_at` hold outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    id: String,
    title: String,
    description: String,
    completed: bool,
    #[serde(serialize_with = "serialize_timestamp")]
    created_at: OffsetDateTime,
    category: Category,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_due_date"
    )]
    due_date: Option<Date>,
}

/// Shape accepted on load. Older files may lack `id`, `category` or `dueDate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    created_at: String,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    due_date: Option<String>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = AppError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        if record.title.trim().is_empty() {
            return Err(AppError::invalid_data("title must not be empty"));
        }

        let created_at = OffsetDateTime::parse(&record.created_at, &Rfc3339)
            .map_err(|_| AppError::invalid_data("createdAt must be an ISO-8601 timestamp"))?;
        let due_date = match record.due_date.as_deref() {
            Some(raw) => Some(
                Date::parse(raw.trim(), DUE_DATE_FORMAT)
                    .map_err(|_| AppError::invalid_data("dueDate must be YYYY-MM-DD"))?,
            ),
            None => None,
        };
        let id = match record.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_id(),
        };

        Ok(Self {
            id,
            title: record.title,
            description: record.description.unwrap_or_default(),
            completed: record.completed,
            created_at,
            category: record.category,
            due_date,
        })
    }
}

impl Task {
    /// Builds a pending task stamped with the current time.
    ///
    /// Title and description are trimmed; a blank title is rejected.
    pub fn new(
        title: &str,
        description: Option<&str>,
        category: Option<Category>,
    ) -> Result<Self, AppError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        Ok(Self {
            id: generate_id(),
            title: trimmed.to_string(),
            description: description.map(str::trim).unwrap_or_default().to_string(),
            completed: false,
            created_at: OffsetDateTime::now_utc(),
            category: category.unwrap_or_default(),
            due_date: None,
        })
    }

    pub fn with_due_date(mut self, due_date: Option<Date>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
    }

    /// Replaces the id with a fresh one. Only the store calls this, to
    /// separate records that arrived with the same id.
    pub(crate) fn reassign_id(&mut self) {
        self.id = generate_id();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn due_date(&self) -> Option<Date> {
        self.due_date
    }

    /// Pending and due strictly before `today`.
    pub fn is_overdue(&self, today: Date) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    /// Case-insensitive substring match on title and description.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

pub fn parse_due_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), DUE_DATE_FORMAT)
        .map_err(|_| AppError::invalid_input("Please enter a valid date (YYYY-MM-DD)"))
}

fn format_due_date(date: Date) -> Result<String, AppError> {
    date.format(DUE_DATE_FORMAT)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn generate_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

fn serialize_timestamp<S: Serializer>(
    value: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

fn serialize_due_date<S: Serializer>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(date) => {
            let formatted = format_due_date(*date).map_err(serde::ser::Error::custom)?;
            serializer.serialize_some(&formatted)
        }
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, parse_due_date};
    use crate::model::Category;
    use time::OffsetDateTime;
    use time::macros::date;

    #[test]
    fn new_task_starts_pending_and_stamped_now() {
        let before = OffsetDateTime::now_utc();
        let task = Task::new("  Buy milk ", Some(" 2 litres "), Some(Category::Shopping)).unwrap();

        assert_eq!(task.title(), "Buy milk");
        assert_eq!(task.description(), "2 litres");
        assert_eq!(task.category(), Category::Shopping);
        assert!(!task.completed());
        assert!(task.created_at() >= before);
    }

    #[test]
    fn new_task_rejects_blank_title() {
        let err = Task::new(" \t ", None, None).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn new_tasks_get_distinct_ids() {
        let first = Task::new("one", None, None).unwrap();
        let second = Task::new("two", None, None).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn toggling_twice_restores_completion() {
        let mut task = Task::new("demo", None, None).unwrap();
        task.toggle_complete();
        assert!(task.completed());
        task.toggle_complete();
        assert!(!task.completed());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let task = Task::new("demo", Some("details"), Some(Category::Work))
            .unwrap()
            .with_due_date(Some(date!(2025 - 12 - 24)));
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["title"], "demo");
        assert_eq!(value["description"], "details");
        assert_eq!(value["completed"], false);
        assert_eq!(value["category"], "work");
        assert_eq!(value["dueDate"], "2025-12-24");
        assert!(value["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn omits_missing_due_date() {
        let task = Task::new("demo", None, None).unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn serialize_then_deserialize_preserves_fields() {
        let mut task = Task::new("demo", Some("details"), Some(Category::Personal))
            .unwrap()
            .with_due_date(Some(date!(2026 - 01 - 02)));
        task.toggle_complete();

        let json = serde_json::to_string(&task).unwrap();
        let restored: Task = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, task);
    }

    #[test]
    fn deserializes_records_without_id_or_category() {
        let json = r#"{
            "title": "legacy",
            "completed": true,
            "createdAt": "2025-03-01T10:15:30.000Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.title(), "legacy");
        assert_eq!(task.description(), "");
        assert!(task.completed());
        assert_eq!(task.category(), Category::General);
        assert_eq!(task.id().len(), 8);
        assert_eq!(task.created_at().date(), date!(2025 - 03 - 01));
    }

    #[test]
    fn deserialize_rejects_blank_title() {
        let json = r#"{"title": "  ", "createdAt": "2025-03-01T10:15:30Z"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn deserialize_rejects_malformed_timestamp() {
        let json = r#"{"title": "demo", "createdAt": "yesterday"}"#;
        let err = serde_json::from_str::<Task>(json).unwrap_err();
        assert!(err.to_string().contains("createdAt"));
    }

    #[test]
    fn overdue_only_when_pending_and_past_due() {
        let mut task = Task::new("demo", None, None)
            .unwrap()
            .with_due_date(Some(date!(2025 - 06 - 10)));

        assert!(task.is_overdue(date!(2025 - 06 - 11)));
        assert!(!task.is_overdue(date!(2025 - 06 - 10)));

        task.toggle_complete();
        assert!(!task.is_overdue(date!(2025 - 06 - 11)));
    }

    #[test]
    fn matches_title_or_description_ignoring_case() {
        let task = Task::new("Buy Milk", Some("From the Corner shop"), None).unwrap();
        assert!(task.matches("milk"));
        assert!(task.matches("corner"));
        assert!(!task.matches("bread"));
    }

    #[test]
    fn parse_due_date_rejects_garbage() {
        assert_eq!(parse_due_date(" 2025-02-03 ").unwrap(), date!(2025 - 02 - 03));
        assert_eq!(parse_due_date("03/02/2025").unwrap_err().code(), "invalid_input");
    }
}
