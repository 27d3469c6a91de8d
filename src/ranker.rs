use crate::scope::ScopedFile;
use std::collections::BTreeMap;
use tracing::debug;

/// Orders files by role priority, then path, and truncates to `max_files`.
///
/// Required roles (target and tree-shaken dependencies) are never dropped,
/// even when they alone exceed the budget. A path listed twice keeps its
/// highest-priority role.
pub fn rank(files: Vec<ScopedFile>, max_files: usize) -> Vec<ScopedFile> {
    let mut by_path: BTreeMap<String, ScopedFile> = BTreeMap::new();
    for file in files {
        match by_path.get(file.path()) {
            Some(existing) if existing.role <= file.role => {}
            _ => {
                by_path.insert(file.candidate.path.clone(), file);
            }
        }
    }

    let mut ranked: Vec<ScopedFile> = by_path.into_values().collect();
    ranked.sort_by(|a, b| a.role.cmp(&b.role).then_with(|| a.path().cmp(b.path())));

    let required = ranked.iter().filter(|f| f.role.is_required()).count();
    let keep = max_files.max(required);
    if ranked.len() > keep {
        debug!(dropped = ranked.len() - keep, keep, "truncating to file budget");
        ranked.truncate(keep);
    }
    ranked
}
