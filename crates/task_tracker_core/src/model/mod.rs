mod category;
mod task;

pub use category::Category;
pub use task::{Task, parse_due_date};
