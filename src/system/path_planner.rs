use crate::models::plan::InstallPlan;
use crate::utils::error::{InstallerError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedPath {
    Write(PathBuf),
    Skip,
}

pub fn plan(entry_name: &str, install_plan: &InstallPlan) -> Result<PlannedPath> {
    let normalized = normalize_entry_name(entry_name);
    let prefix = normalize_entry_name(&install_plan.filter_prefix);
    if !install_plan.filter.accepts(&normalized, &prefix) {
        return Ok(PlannedPath::Skip);
    }

    let relative =
        host_relative_path(&normalized).ok_or_else(|| InstallerError::UnsafeEntryPath {
            entry: entry_name.to_string(),
        })?;
    Ok(PlannedPath::Write(install_plan.entries_dir().join(relative)))
}

pub fn ensure_parents(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(parent).map_err(|e| InstallerError::DirectoryCreationFailed {
        path: parent.to_path_buf(),
        source: e,
    })
}

fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/")
}

fn host_relative_path(normalized: &str) -> Option<PathBuf> {
    if normalized.starts_with('/') {
        return None;
    }
    let mut clean = PathBuf::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ => {}
        }
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(v)), None) => clean.push(v),
            _ => return None,
        }
    }
    Some(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::FilterMode;
    use tempfile::tempdir;

    fn plan_with(filter: FilterMode, prefix: &str) -> InstallPlan {
        InstallPlan {
            archive_path: PathBuf::from("/bundle/app.jar"),
            extraction_root: PathBuf::from("/tmp/root"),
            extraction_name: ".app".to_string(),
            source_folder: "src".to_string(),
            filter,
            filter_prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_plan_include_only() {
        let install_plan = plan_with(FilterMode::IncludeOnly, "files/");
        assert_eq!(
            plan("files/a.txt", &install_plan).expect("plan entry"),
            PlannedPath::Write(
                PathBuf::from("/tmp/root/.app/src")
                    .join("files")
                    .join("a.txt")
            )
        );
        assert_eq!(
            plan("other/b.txt", &install_plan).expect("plan entry"),
            PlannedPath::Skip
        );
    }

    #[test]
    fn test_plan_exclude_and_all() {
        let exclude = plan_with(FilterMode::Exclude, "META-INF");
        assert_eq!(
            plan("META-INF/MANIFEST.MF", &exclude).expect("plan entry"),
            PlannedPath::Skip
        );
        assert!(matches!(
            plan("files/a.txt", &exclude).expect("plan entry"),
            PlannedPath::Write(_)
        ));

        let all = plan_with(FilterMode::All, "");
        assert!(matches!(
            plan("META-INF/MANIFEST.MF", &all).expect("plan entry"),
            PlannedPath::Write(_)
        ));
    }

    #[test]
    fn test_plan_normalizes_backslashes() {
        let install_plan = plan_with(FilterMode::IncludeOnly, "files\\");
        assert_eq!(
            plan("files\\nested\\c.txt", &install_plan).expect("plan entry"),
            PlannedPath::Write(
                PathBuf::from("/tmp/root/.app/src")
                    .join("files")
                    .join("nested")
                    .join("c.txt")
            )
        );
    }

    #[test]
    fn test_plan_rejects_escaping_entries() {
        let install_plan = plan_with(FilterMode::All, "");
        for name in ["../evil.txt", "files/../../evil.txt", "/etc/passwd"] {
            assert!(matches!(
                plan(name, &install_plan),
                Err(InstallerError::UnsafeEntryPath { .. })
            ));
        }
    }

    #[test]
    fn test_plan_filter_runs_before_safety_check() {
        // 필터에서 걸러진 엔트리는 경로 검사 대상이 아님
        let install_plan = plan_with(FilterMode::IncludeOnly, "files/");
        assert_eq!(
            plan("../evil.txt", &install_plan).expect("plan entry"),
            PlannedPath::Skip
        );
    }

    #[test]
    fn test_ensure_parents_is_idempotent() {
        let temp = tempdir().expect("create tempdir");
        let target = temp.path().join("a").join("b").join("c.txt");

        ensure_parents(&target).expect("create parents");
        assert!(temp.path().join("a").join("b").is_dir());
        assert!(!target.exists());

        ensure_parents(&target).expect("create parents again");
        assert!(temp.path().join("a").join("b").is_dir());
    }

    #[test]
    fn test_ensure_parents_fails_when_parent_is_file() {
        let temp = tempdir().expect("create tempdir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"x").expect("write blocker");

        let result = ensure_parents(&blocker.join("child").join("file.txt"));
        assert!(matches!(
            result,
            Err(InstallerError::DirectoryCreationFailed { .. })
        ));
    }
}
