use crate::error::AppError;
use crate::model::Task;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "data.json";

/// Directory holding the running executable; data and config live beside it.
pub fn program_dir() -> Result<PathBuf, AppError> {
    let exe = std::env::current_exe().map_err(|err| AppError::io(err.to_string()))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| AppError::invalid_data("executable has no parent directory"))
}

pub fn data_path() -> Result<PathBuf, AppError> {
    Ok(program_dir()?.join(STORE_FILE_NAME))
}

/// Reads the task list. A missing file is an empty list.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "data file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(AppError::io(format!("{}: {}", path.display(), err))),
    };

    let mut tasks: Vec<Task> = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    let reassigned = dedupe_ids(&mut tasks);
    if reassigned > 0 {
        tracing::warn!(path = %path.display(), reassigned, "reassigned duplicate task ids");
    }

    tracing::info!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

/// Gives every task after the first holder of an id a fresh one.
/// Returns how many ids changed.
fn dedupe_ids(tasks: &mut [Task]) -> usize {
    let mut seen = HashSet::new();
    let mut reassigned = 0;

    for task in tasks.iter_mut() {
        if seen.contains(task.id()) {
            reassigned += 1;
            while seen.contains(task.id()) {
                task.reassign_id();
            }
        }
        seen.insert(task.id().to_string());
    }

    reassigned
}

/// Overwrites the data file with the full list, creating parent directories.
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let content = serde_json::to_string_pretty(tasks)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}
