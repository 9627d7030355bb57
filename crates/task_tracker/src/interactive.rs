use crate::prompt::{Answers, FieldKind, FieldSpec, run_fields};
use crate::render::{
    DateStyle, EMPTY_LIST_MESSAGE, RenderOptions, render_stats, render_summary, render_task_list,
};
use std::io::{BufRead, Write};
use task_tracker_core::config::{Config, Palette};
use task_tracker_core::error::AppError;
use task_tracker_core::model::{Category, Task};
use task_tracker_core::task_api::TaskSession;

const BANNER: &str = "=========================== Task Tracker ===========================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Add,
    Complete,
    Delete,
    Search,
    Stats,
    Exit,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::View,
        Action::Add,
        Action::Complete,
        Action::Delete,
        Action::Search,
        Action::Stats,
        Action::Exit,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Complete => "complete",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::Stats => "stats",
            Self::Exit => "exit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::View => "View Tasks",
            Self::Add => "Add Task",
            Self::Complete => "Complete Task",
            Self::Delete => "Delete Task",
            Self::Search => "Search Tasks",
            Self::Stats => "Show Statistics",
            Self::Exit => "Exit",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.key() == key)
    }
}

/// What the loop does after an operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Menu,
    Exit,
}

fn has_due_date(answers: &Answers) -> bool {
    answers.flag("has_due_date").unwrap_or(false)
}

fn menu_fields() -> Vec<FieldSpec> {
    vec![FieldSpec::new(
        "action",
        "What would you like to do?",
        FieldKind::Choice {
            choices: Action::ALL.into_iter().map(Action::key).collect(),
            default: 0,
        },
    )]
}

fn add_task_fields() -> Vec<FieldSpec> {
    let default_category = Category::CHOICES
        .iter()
        .position(|category| *category == Category::default())
        .unwrap_or(0);

    vec![
        FieldSpec::new(
            "title",
            "Enter task title:",
            FieldKind::Text {
                required: Some("Title is required"),
            },
        ),
        FieldSpec::new(
            "description",
            "Enter task description (optional):",
            FieldKind::Text { required: None },
        ),
        FieldSpec::new(
            "has_due_date",
            "Does this task have a due date?",
            FieldKind::Confirm { default: false },
        ),
        FieldSpec::new("due_date", "Enter due date (YYYY-MM-DD):", FieldKind::Date)
            .when(has_due_date),
        FieldSpec::new(
            "category",
            "Select category:",
            FieldKind::Choice {
                choices: Category::CHOICES.into_iter().map(Category::as_str).collect(),
                default: default_category,
            },
        ),
    ]
}

fn index_field(message: &str, len: usize) -> Vec<FieldSpec> {
    vec![FieldSpec::new("index", message, FieldKind::Index { len })]
}

fn search_fields() -> Vec<FieldSpec> {
    vec![FieldSpec::new(
        "term",
        "Enter search term:",
        FieldKind::Text {
            required: Some("Search term is required"),
        },
    )]
}

fn io_error(err: std::io::Error) -> AppError {
    AppError::io(err.to_string())
}

/// The menu loop. Owns the session and the terminal streams for one run.
pub struct Shell<R, W, E> {
    session: TaskSession,
    palette: Palette,
    options: RenderOptions,
    input: R,
    output: W,
    errors: E,
}

impl<R: BufRead, W: Write, E: Write> Shell<R, W, E> {
    pub fn new(session: TaskSession, config: &Config, input: R, output: W, errors: E) -> Self {
        Self {
            session,
            palette: config.palette(),
            options: RenderOptions::from_config(config, DateStyle::DateTime),
            input,
            output,
            errors,
        }
    }

    #[cfg(test)]
    fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs until the user picks Exit or input ends.
    pub fn run(&mut self) -> Result<(), AppError> {
        let banner = self.palette.paint(self.palette.info, BANNER);
        self.say(&banner)?;

        loop {
            let Some(action) = self.prompt_action()? else {
                break;
            };
            if action == Action::Exit {
                break;
            }

            match self.dispatch(action) {
                Ok(Flow::Menu) => {}
                Ok(Flow::Exit) => break,
                Err(err) => self.report(&err)?,
            }
        }

        let goodbye = self.palette.paint(self.palette.info, "Goodbye!");
        self.say(&goodbye)
    }

    fn dispatch(&mut self, action: Action) -> Result<Flow, AppError> {
        tracing::debug!(action = action.key(), "dispatching menu action");
        match action {
            Action::View => self.view().map(|_| Flow::Menu),
            Action::Add => self.add(),
            Action::Complete => self.complete(),
            Action::Delete => self.delete(),
            Action::Search => self.search(),
            Action::Stats => self.stats().map(|_| Flow::Menu),
            Action::Exit => Ok(Flow::Exit),
        }
    }

    fn prompt_action(&mut self) -> Result<Option<Action>, AppError> {
        self.say("")?;
        for (index, action) in Action::ALL.into_iter().enumerate() {
            let line = format!("  {}) {}", index + 1, action.label());
            self.say(&line)?;
        }

        let Some(answers) = self.ask(&menu_fields())? else {
            return Ok(None);
        };
        Ok(answers.choice("action").and_then(Action::from_key))
    }

    fn view(&mut self) -> Result<(), AppError> {
        self.header("=== Your Tasks ===")?;
        if self.session.is_empty() {
            return self.warn(EMPTY_LIST_MESSAGE);
        }

        let list = render_task_list(self.session.tasks(), &self.palette, &self.options);
        let summary = render_summary(&self.session.stats(), &self.palette);
        self.say(&list)?;
        self.say(&summary)?;
        self.say("")
    }

    fn add(&mut self) -> Result<Flow, AppError> {
        let Some(answers) = self.ask(&add_task_fields())? else {
            return Ok(Flow::Exit);
        };

        let category = answers
            .choice("category")
            .map(str::parse::<Category>)
            .transpose()?;
        let task = Task::new(
            answers.text("title").unwrap_or_default(),
            answers.text("description"),
            category,
        )?
        .with_due_date(answers.date("due_date"));

        let added = self.session.add_task(task)?;
        self.success(&format!("Task \"{}\" added successfully!", added.title()))?;
        Ok(Flow::Menu)
    }

    fn complete(&mut self) -> Result<Flow, AppError> {
        if self.session.is_empty() {
            self.warn("No tasks to complete!")?;
            return Ok(Flow::Menu);
        }

        self.view()?;
        let fields = index_field("Enter task number to toggle completion:", self.session.len());
        let Some(answers) = self.ask(&fields)? else {
            return Ok(Flow::Exit);
        };

        let position = answers.index("index").unwrap_or_default();
        let id = self.session.task_at(position)?.id().to_string();
        let toggled = self.session.toggle_task(&id)?;
        let status = if toggled.completed() {
            "completed"
        } else {
            "incomplete"
        };
        self.success(&format!("Task marked as {status}!"))?;
        Ok(Flow::Menu)
    }

    fn delete(&mut self) -> Result<Flow, AppError> {
        if self.session.is_empty() {
            self.warn("No tasks to delete!")?;
            return Ok(Flow::Menu);
        }

        self.view()?;
        let fields = index_field("Enter task number to delete:", self.session.len());
        let Some(answers) = self.ask(&fields)? else {
            return Ok(Flow::Exit);
        };

        let position = answers.index("index").unwrap_or_default();
        let task = self.session.task_at(position)?;
        let (id, title) = (task.id().to_string(), task.title().to_string());

        let confirm = [FieldSpec::new(
            "confirm",
            format!("Are you sure you want to delete task \"{title}\"?"),
            FieldKind::Confirm { default: false },
        )];
        let Some(answers) = self.ask(&confirm)? else {
            return Ok(Flow::Exit);
        };
        if !answers.flag("confirm").unwrap_or(false) {
            self.warn("Deletion cancelled.")?;
            return Ok(Flow::Menu);
        }

        self.session.delete_task(&id)?;
        self.success(&format!("Task \"{title}\" deleted successfully!"))?;
        Ok(Flow::Menu)
    }

    fn search(&mut self) -> Result<Flow, AppError> {
        let Some(answers) = self.ask(&search_fields())? else {
            return Ok(Flow::Exit);
        };

        let term = answers.text("term").unwrap_or_default().to_string();
        let found = self.session.search(&term)?;

        self.header(&format!("=== Search Results for \"{term}\" ==="))?;
        if found.is_empty() {
            self.warn("No matching tasks found.")?;
            return Ok(Flow::Menu);
        }

        let options = self.options.with_created(DateStyle::Date);
        let list = render_task_list(&found, &self.palette, &options);
        self.say(&list)?;
        self.say("")?;
        Ok(Flow::Menu)
    }

    fn stats(&mut self) -> Result<(), AppError> {
        self.header("=== Task Statistics ===")?;
        let rendered = render_stats(&self.session.stats(), &self.palette);
        self.say(&rendered)?;
        if !self.session.is_empty() {
            self.say("")?;
        }
        Ok(())
    }

    fn ask(&mut self, fields: &[FieldSpec]) -> Result<Option<Answers>, AppError> {
        run_fields(fields, &mut self.input, &mut self.output, &self.palette)
    }

    fn say(&mut self, text: &str) -> Result<(), AppError> {
        writeln!(self.output, "{text}").map_err(io_error)
    }

    fn header(&mut self, title: &str) -> Result<(), AppError> {
        let line = format!("\n{}", self.palette.paint(self.palette.info, title));
        self.say(&line)
    }

    fn warn(&mut self, text: &str) -> Result<(), AppError> {
        let line = self.palette.paint(self.palette.warning, text);
        self.say(&line)
    }

    fn success(&mut self, text: &str) -> Result<(), AppError> {
        let line = self.palette.paint(self.palette.success, text);
        self.say(&line)
    }

    fn report(&mut self, err: &AppError) -> Result<(), AppError> {
        if err.is_invalid_input() {
            tracing::debug!(code = err.code(), "operation rejected: {}", err.message());
        } else {
            tracing::warn!(code = err.code(), "operation failed: {}", err.message());
        }
        writeln!(self.errors, "ERROR: {err}").map_err(io_error)
    }
}
