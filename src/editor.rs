use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const FALLBACK_EDITORS: [&str; 4] = ["nvim", "vim", "nano", "vi"];

/// `$VISUAL`, then `$EDITOR`, then the first fallback that starts
fn editor_candidates() -> Vec<String> {
    let mut candidates: Vec<String> = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .filter(|value| !value.trim().is_empty())
        .collect();
    candidates.extend(FALLBACK_EDITORS.iter().map(|e| e.to_string()));
    candidates
}

/// Opens `path` in the user's editor and waits for it to exit
pub fn open_in_editor(path: &Path) -> Result<()> {
    for editor in editor_candidates() {
        let mut parts = editor.split_whitespace();
        let Some(program) = parts.next() else {
            continue;
        };

        if let Ok(mut child) = Command::new(program).args(parts).arg(path).spawn() {
            let status = child.wait().context("Failed to wait for editor")?;
            if !status.success() {
                bail!("Editor '{}' exited with {}", program, status);
            }
            return Ok(());
        }
    }
    bail!("Could not launch any editor (set $EDITOR, or install nvim, vim or nano)")
}

/// Where drafts are written while the editor has them
pub fn draft_path(drafts_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(drafts_dir)
        .with_context(|| format!("Failed to create drafts directory {}", drafts_dir.display()))?;
    Ok(drafts_dir.join(file_name))
}

/// Writes `initial` to a draft file, lets the user edit it and returns the
/// result. The draft is removed afterwards.
pub fn edit_text(drafts_dir: &Path, file_name: &str, initial: &str) -> Result<String> {
    let path = draft_path(drafts_dir, file_name)?;
    fs::write(&path, initial).context("Failed to prepare file for editing")?;

    let edited = open_in_editor(&path).and_then(|_| {
        fs::read_to_string(&path).context("Failed to read edited file")
    });
    let _ = fs::remove_file(&path);
    edited
}
