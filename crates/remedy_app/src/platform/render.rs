use std::io::{self, Write};

use remedy_core::{AppViewModel, JobId, Phase};

const RULE: &str = "----------------------------------------";

/// One-line summary of the job: phase, names, attempts and stage strip.
pub fn status_line(view: &AppViewModel, max_attempts: u32) -> String {
    let Some(source) = view.source_name.as_deref() else {
        return "[Idle] Waiting for file...".to_string();
    };
    let result = view.result_name.as_deref().unwrap_or("?");
    let mut line = format!("[{}] {source} -> {result}", phase_label(view.phase));
    if view.phase == Phase::Processing {
        line.push_str(&format!(" | attempt {}/{max_attempts}", view.poll_attempts));
    }
    line.push_str(" | ");
    line.push_str(&stage_strip(view));
    line
}

/// Body shown under the status line, if the phase has one.
pub fn detail(view: &AppViewModel) -> Option<String> {
    match view.phase {
        Phase::Idle if view.source_name.is_some() => {
            Some("Ready. Type `start` to submit the report.".to_string())
        }
        Phase::Idle | Phase::Uploading => None,
        Phase::Processing => Some("Analyzing logs and generating code...".to_string()),
        Phase::Error => {
            let failure = view.failure.as_deref().unwrap_or("unknown failure");
            let advice = view.advice.as_deref().unwrap_or_default();
            Some(format!("An error occurred: {failure}\n{advice}"))
        }
        Phase::Done => view.payload.as_deref().map(|payload| {
            let name = view.result_name.as_deref().unwrap_or("result");
            let mut out = format!("{RULE}\n{name}\n{RULE}\n{payload}");
            if !payload.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(RULE);
            out
        }),
    }
}

/// Footer for a finished job describing where the script went.
pub fn saved_note(view: &AppViewModel) -> Option<String> {
    if let Some(path) = &view.saved_path {
        return Some(format!("Saved to {}", path.display()));
    }
    view.save_error
        .as_ref()
        .map(|err| format!("Could not save script: {err}"))
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Uploading => "Uploading",
        Phase::Processing => "Processing",
        Phase::Done => "Done",
        Phase::Error => "Error",
    }
}

fn stage_strip(view: &AppViewModel) -> String {
    view.stages
        .iter()
        .map(|stage| {
            let mark = if stage.reached { "x" } else { " " };
            format!("[{mark}] {}", stage.label)
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Prints view changes to stdout without repeating unchanged output.
pub struct TerminalRenderer {
    max_attempts: u32,
    last_status: Option<String>,
    last_detail: Option<String>,
    saved_note_for: Option<JobId>,
}

impl TerminalRenderer {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            last_status: None,
            last_detail: None,
            saved_note_for: None,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let _ = self.write_changes(&mut out, view);
        let _ = out.flush();
    }

    fn write_changes(&mut self, out: &mut impl Write, view: &AppViewModel) -> io::Result<()> {
        let status = status_line(view, self.max_attempts);
        if self.last_status.as_ref() != Some(&status) {
            writeln!(out, "{status}")?;
            self.last_status = Some(status);
        }

        let detail = detail(view);
        if detail.is_some() && detail != self.last_detail {
            if let Some(text) = &detail {
                writeln!(out, "{text}")?;
            }
        }
        self.last_detail = detail;

        if let (Some(job_id), Some(note)) = (view.job_id, saved_note(view)) {
            if self.saved_note_for != Some(job_id) {
                writeln!(out, "{note}")?;
                self.saved_note_for = Some(job_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use remedy_core::{update, AppState, Msg, Stage};
    use std::path::PathBuf;

    fn processing_view() -> AppViewModel {
        let (state, _) = update(
            AppState::new(),
            Msg::FileSelected(PathBuf::from("incident.json")),
        );
        let (state, _) = update(state, Msg::StartClicked);
        let (state, _) = update(
            state,
            Msg::UploadFinished {
                job_id: 1,
                result: Ok(()),
            },
        );
        let (state, _) = update(state, Msg::PollAttempted { job_id: 1, attempt: 4 });
        let (state, _) = update(
            state,
            Msg::StageReached {
                job_id: 1,
                stage: Stage::Analyst,
            },
        );
        state.view()
    }

    #[test]
    fn idle_without_file_waits() {
        let view = AppState::new().view();
        assert_eq!(status_line(&view, 30), "[Idle] Waiting for file...");
        assert_eq!(detail(&view), None);
    }

    #[test]
    fn processing_shows_attempts_and_stages() {
        let view = processing_view();
        assert_eq!(
            status_line(&view, 30),
            "[Processing] incident.json -> incident.py | attempt 4/30 | \
             [x] Start (S3) > [x] Analyst agent > [ ] Strategist agent > \
             [ ] Generator agent > [ ] End (script)"
        );
        assert_eq!(
            detail(&view).as_deref(),
            Some("Analyzing logs and generating code...")
        );
    }

    #[test]
    fn done_renders_payload_verbatim() {
        let (state, _) = update(
            AppState::new(),
            Msg::FileSelected(PathBuf::from("incident.json")),
        );
        let (state, _) = update(state, Msg::StartClicked);
        let (state, _) = update(
            state,
            Msg::UploadFinished {
                job_id: 1,
                result: Ok(()),
            },
        );
        let (state, _) = update(
            state,
            Msg::ResultFetched {
                job_id: 1,
                payload: "import boto3\nprint('ok')".to_string(),
            },
        );
        let text = detail(&state.view()).unwrap();
        assert!(text.contains("\nincident.py\n"));
        assert!(text.contains("import boto3\nprint('ok')\n"));
    }

    #[test]
    fn renderer_skips_unchanged_output() {
        let view = processing_view();
        let mut renderer = TerminalRenderer::new(30);

        let mut first = Vec::new();
        renderer.write_changes(&mut first, &view).unwrap();
        assert_eq!(String::from_utf8(first).unwrap().lines().count(), 2);

        let mut second = Vec::new();
        renderer.write_changes(&mut second, &view).unwrap();
        assert!(second.is_empty());
    }
}
