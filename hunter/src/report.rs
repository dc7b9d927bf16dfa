//! Bug intake for `hunter report`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::info;

use crate::core::types::{Doc, Iteration, IterationStatus, ProjectState};
use crate::io::init::HunterPaths;
use crate::io::session_store::{SessionState, load_session, write_session};

/// A newly reported bug.
#[derive(Debug, Clone, Default)]
pub struct BugReport {
    pub feedback: String,
    pub feedback_qa: Option<String>,
    /// Replaces the stored task when set.
    pub current_task: Option<String>,
    /// Replaces the stored run command when set.
    pub run_command: Option<String>,
    /// Files attached as docs. Non-empty replaces the stored docs.
    pub docs: Vec<PathBuf>,
}

/// Start a new iteration for `report`.
///
/// A previous iteration must be complete; it is moved to the archive.
pub fn report_bug(root: &Path, report: &BugReport) -> Result<SessionState> {
    let paths = HunterPaths::new(root);
    if !paths.hunter_dir.is_dir() {
        return Err(anyhow!(
            "missing {} (run `hunter init` first)",
            paths.hunter_dir.display()
        ));
    }
    if report.feedback.trim().is_empty() {
        bail!("bug report feedback must not be empty");
    }
    let docs = report
        .docs
        .iter()
        .map(|path| read_doc(path))
        .collect::<Result<Vec<_>>>()?;

    let iteration = Iteration::reported(
        report.feedback.trim(),
        report.feedback_qa.clone().filter(|qa| !qa.trim().is_empty()),
    );

    let mut session = if paths.session_path.exists() {
        let mut session = load_session(&paths.session_path)?;
        let status = session.project.iteration.status;
        if status != IterationStatus::Complete {
            bail!("current iteration is {status}; finish it before reporting another bug");
        }
        let previous = std::mem::replace(&mut session.project.iteration, iteration);
        session.archived.push(previous);
        session
    } else {
        SessionState::new(ProjectState::new(iteration))
    };

    let project = &mut session.project;
    if report.current_task.is_some() {
        project.current_task = report.current_task.clone();
    }
    if report.run_command.is_some() {
        project.run_command = report.run_command.clone();
    }
    if !docs.is_empty() {
        project.docs = docs;
    }

    write_session(&paths.session_path, &session)?;
    info!(archived = session.archived.len(), docs = session.project.docs.len(), "bug reported");
    Ok(session)
}

fn read_doc(path: &Path) -> Result<Doc> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read doc {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("doc path has no file name: {}", path.display()))?;
    Ok(Doc { name, content })
}
