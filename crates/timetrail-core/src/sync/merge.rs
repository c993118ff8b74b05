//! Pure last-write-wins merge of two task lists.

use std::collections::HashMap;

use crate::task::Task;

/// Result of merging a local list against a remote one.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Union of both inputs, newest `created_at` first.
    pub tasks: Vec<Task>,
    /// Whether the merged set equals the remote input exactly. When true the
    /// orchestrator must not push back; nothing local diverged.
    pub matches_remote: bool,
}

/// Merge `local` and `remote` task lists, per-task last-write-wins.
///
/// For ids present on both sides the record with the greater `updated_at`
/// survives; a tie favors the remote value, which makes the merge
/// deterministic and idempotent (`merge(x, x) == x`). A missing `updated_at`
/// counts as epoch zero, so legacy records never win against stamped ones.
///
/// Deletions are invisible here: a task deleted locally but still present
/// remotely reappears. Removal propagates only through a whole-document push.
pub fn merge_task_lists(local: &[Task], remote: &[Task]) -> MergeOutcome {
    let mut merged: HashMap<&str, &Task> =
        local.iter().map(|t| (t.id.as_str(), t)).collect();

    for remote_task in remote {
        match merged.get(remote_task.id.as_str()) {
            Some(local_task)
                if local_task.effective_updated_at() > remote_task.effective_updated_at() => {}
            _ => {
                merged.insert(remote_task.id.as_str(), remote_task);
            }
        }
    }

    let mut tasks: Vec<Task> = merged.into_values().cloned().collect();
    sort_for_display(&mut tasks);

    let mut remote_sorted = remote.to_vec();
    sort_for_display(&mut remote_sorted);
    let matches_remote = tasks == remote_sorted;

    MergeOutcome {
        tasks,
        matches_remote,
    }
}

/// Presentation order: newest first, id as a deterministic tie-break.
fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
