//! Script entry points: run a file from the skill's `scripts/` directory via `sh`.
//! No other paths are executed. The argument is passed as `$1` and the JSON request on stdin;
//! trimmed stdout is the response.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::descriptor::{InvocationError, SkillHandler, SkillRequest};

pub const SCRIPTS_DIR: &str = "scripts";

#[derive(Debug, Clone)]
pub struct ScriptHandler {
    script: PathBuf,
    skill_dir: PathBuf,
}

impl ScriptHandler {
    /// Resolve `name` under `skill_dir/scripts`, trying `<name>.sh` when the bare name is absent.
    /// Only checks the file exists; nothing is run.
    pub fn resolve(skill_dir: &Path, name: &str) -> Result<Self, String> {
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(format!("invalid script name {:?}", name));
        }
        let scripts_dir = skill_dir.join(SCRIPTS_DIR);
        let mut script = scripts_dir.join(name);
        if !script.is_file() {
            script = scripts_dir.join(format!("{}.sh", name));
            if !script.is_file() {
                return Err(format!(
                    "script {:?} not found in {}",
                    name,
                    scripts_dir.display()
                ));
            }
        }
        Ok(Self {
            script,
            skill_dir: skill_dir.to_path_buf(),
        })
    }

    pub fn script_path(&self) -> &Path {
        &self.script
    }
}

#[async_trait]
impl SkillHandler for ScriptHandler {
    async fn invoke(&self, request: &SkillRequest) -> Result<String, InvocationError> {
        let payload =
            serde_json::to_vec(request).map_err(|e| InvocationError::Failed(e.to_string()))?;
        let mut child = Command::new("sh")
            .arg(&self.script)
            .arg(&request.argument)
            .current_dir(&self.skill_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // Scripts that ignore stdin may exit before reading it.
            if let Err(e) = stdin.write_all(&payload).await {
                log::debug!("script {}: writing request: {}", self.script.display(), e);
            }
        }
        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout.trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut msg = stderr.trim().to_string();
            if msg.is_empty() {
                msg = stdout.trim().to_string();
            }
            Err(InvocationError::Failed(format!("exit {}: {}", output.status, msg)))
        }
    }
}
