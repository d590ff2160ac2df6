//! Progressive disclosure views: a compact catalog up front, full details on demand, and single
//! resource files from a skill's directory when those details aren't enough.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::skills::{SkillDescriptor, SkillSummary, SKILL_DOC_FILE};

/// Compact list (name + description only) shown before any skill is used.
pub fn format_catalog(skills: &[SkillSummary]) -> String {
    if skills.is_empty() {
        return "No skills are installed.".to_string();
    }
    let mut out = String::from("Available skills:\n");
    for s in skills {
        out.push_str("- ");
        out.push_str(&s.id);
        if s.name != s.id {
            out.push_str(" (");
            out.push_str(&s.name);
            out.push(')');
        }
        out.push_str(": ");
        out.push_str(s.description.trim());
        out.push('\n');
    }
    out
}

/// Full view of one skill: metadata, triggers, entry, documentation, and its other files.
pub fn format_details(skill: &SkillDescriptor) -> String {
    let mut out = format!("{} ({})\n{}\n", skill.display_name, skill.id, skill.description);
    if !skill.trigger_hints.is_empty() {
        let hints: Vec<&str> = skill.trigger_hints.iter().map(|h| h.as_str()).collect();
        out.push_str(&format!("\nTriggers: {}\n", hints.join(", ")));
    }
    out.push_str(&format!("Entry: {}\n", skill.entry));
    if let Some(doc) = &skill.documentation {
        out.push('\n');
        out.push_str(doc);
        out.push('\n');
    }
    if !skill.path.as_os_str().is_empty() {
        let files = skill_files(&skill.path);
        if !files.is_empty() {
            out.push_str("\nFiles:\n");
            for f in files {
                out.push_str("- ");
                out.push_str(&f.display().to_string());
                out.push('\n');
            }
        }
    }
    out
}

/// Files in a skill directory (recursive, sorted), other than SKILL.md itself.
pub fn skill_files(dir: &Path) -> Vec<PathBuf> {
    let doc = dir.join(SKILL_DOC_FILE);
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::debug!("listing {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p != &doc)
        .collect();
    files.sort();
    files
}

/// Largest resource file `read_skill_file` will return.
pub const MAX_SKILL_FILE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum SkillFileError {
    #[error("skill {0} has no directory on disk")]
    NoDirectory(String),
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{} is outside the skill directory", .0.display())]
    OutsideSkill(PathBuf),
    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("file is too large to display ({size} bytes): {}", .path.display())]
    TooLarge { path: PathBuf, size: u64 },
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read one file from a skill's directory. `rel` is resolved against the skill directory and must
/// stay inside it (symlinks included). Invalid UTF-8 is replaced rather than rejected.
pub fn read_skill_file(skill: &SkillDescriptor, rel: &Path) -> Result<String, SkillFileError> {
    if skill.path.as_os_str().is_empty() {
        return Err(SkillFileError::NoDirectory(skill.id.clone()));
    }
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SkillFileError::Io { path, source }
    };
    let root = skill.path.canonicalize().map_err(io(&skill.path))?;
    let requested = skill.path.join(rel);
    let resolved = match requested.canonicalize() {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SkillFileError::NotFound(requested))
        }
        Err(e) => return Err(io(&requested)(e)),
    };
    if !resolved.starts_with(&root) {
        return Err(SkillFileError::OutsideSkill(requested));
    }
    let meta = std::fs::metadata(&resolved).map_err(io(&requested))?;
    if !meta.is_file() {
        return Err(SkillFileError::NotAFile(requested));
    }
    if meta.len() > MAX_SKILL_FILE_BYTES {
        return Err(SkillFileError::TooLarge {
            path: requested,
            size: meta.len(),
        });
    }
    let bytes = std::fs::read(&resolved).map_err(io(&requested))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, name: &str, description: &str) -> SkillSummary {
        SkillSummary {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn catalog_is_compact() {
        let text = format_catalog(&[
            summary("clock", "Clock", "Tells the time."),
            summary("echo", "echo", " Repeats text. "),
        ]);
        assert_eq!(
            text,
            "Available skills:\n- clock (Clock): Tells the time.\n- echo: Repeats text.\n"
        );
        assert_eq!(format_catalog(&[]), "No skills are installed.");
    }

    #[test]
    fn skill_files_excludes_skill_doc() {
        let dir = std::env::temp_dir().join(format!("disclose-files-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("scripts")).unwrap();
        std::fs::write(dir.join(SKILL_DOC_FILE), "---\n---\n").unwrap();
        std::fs::write(dir.join("manifest.json"), "{}").unwrap();
        std::fs::write(dir.join("scripts").join("run.sh"), "").unwrap();
        assert_eq!(
            skill_files(&dir),
            vec![dir.join("manifest.json"), dir.join("scripts").join("run.sh")]
        );
    }

    fn skill_in(dir: &Path) -> SkillDescriptor {
        use crate::skills::{EntryPoint, InvocationError, SkillHandler, SkillRequest, SkillSource};
        use async_trait::async_trait;
        use std::sync::Arc;

        struct Noop;

        #[async_trait]
        impl SkillHandler for Noop {
            async fn invoke(&self, _request: &SkillRequest) -> Result<String, InvocationError> {
                Ok(String::new())
            }
        }

        SkillDescriptor::new("files", "Has files.", EntryPoint::Document, Arc::new(Noop))
            .with_location(dir.to_path_buf(), SkillSource::Root)
    }

    fn temp_skill(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("disclose-read-{}-{}", name, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("skill").join("reference")).unwrap();
        root
    }

    #[test]
    fn reads_file_inside_skill() {
        let root = temp_skill("ok");
        let dir = root.join("skill");
        std::fs::write(dir.join("reference").join("notes.md"), "# Notes\n").unwrap();
        let skill = skill_in(&dir);
        assert_eq!(
            read_skill_file(&skill, Path::new("reference/notes.md")).unwrap(),
            "# Notes\n"
        );
        assert!(matches!(
            read_skill_file(&skill, Path::new("reference")),
            Err(SkillFileError::NotAFile(_))
        ));
        assert!(matches!(
            read_skill_file(&skill, Path::new("missing.md")),
            Err(SkillFileError::NotFound(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let root = temp_skill("utf8");
        let dir = root.join("skill");
        std::fs::write(dir.join("data.txt"), b"ok \xff\xfe end").unwrap();
        let text = read_skill_file(&skill_in(&dir), Path::new("data.txt")).unwrap();
        assert_eq!(text, "ok \u{fffd}\u{fffd} end");
    }

    #[test]
    fn oversized_file_is_refused() {
        let root = temp_skill("big");
        let dir = root.join("skill");
        let file = std::fs::File::create(dir.join("big.bin")).unwrap();
        file.set_len(MAX_SKILL_FILE_BYTES + 1).unwrap();
        match read_skill_file(&skill_in(&dir), Path::new("big.bin")) {
            Err(SkillFileError::TooLarge { size, .. }) => assert_eq!(size, MAX_SKILL_FILE_BYTES + 1),
            other => panic!("expected TooLarge, got {:?}", other),
        }

        let exact = std::fs::File::create(dir.join("exact.bin")).unwrap();
        exact.set_len(MAX_SKILL_FILE_BYTES).unwrap();
        assert!(read_skill_file(&skill_in(&dir), Path::new("exact.bin")).is_ok());
    }

    #[test]
    fn paths_outside_skill_are_refused() {
        let root = temp_skill("escape");
        let dir = root.join("skill");
        std::fs::write(root.join("secret.txt"), "secret").unwrap();
        let skill = skill_in(&dir);
        assert!(matches!(
            read_skill_file(&skill, Path::new("../secret.txt")),
            Err(SkillFileError::OutsideSkill(_))
        ));
        assert!(matches!(
            read_skill_file(&skill, &root.join("secret.txt")),
            Err(SkillFileError::OutsideSkill(_))
        ));
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(root.join("secret.txt"), dir.join("link.txt")).unwrap();
            assert!(matches!(
                read_skill_file(&skill, Path::new("link.txt")),
                Err(SkillFileError::OutsideSkill(_))
            ));
        }
    }

    #[test]
    fn embedded_skill_has_no_files() {
        let skill = skill_in(Path::new(""));
        assert!(matches!(
            read_skill_file(&skill, Path::new("x")),
            Err(SkillFileError::NoDirectory(id)) if id == "files"
        ));
    }
}
