//! Eligibility resolution.
//!
//! Decides which discovered change-sets are legal to run now, given a
//! snapshot of past successes. Pure over its inputs so the toggle rules can
//! be tested without a database.

use crate::file::{ChangeSetFile, Direction};
use crate::history::HistorySnapshot;

/// The resolved work for one run.
#[derive(Debug, Clone)]
pub struct RolloutPlan {
    /// Change-sets eligible to run, in discovery (lexicographic) order.
    pub pending: Vec<ChangeSetFile>,
    /// Rollouts skipped because they are already applied in this environment
    /// with no rollback since.
    pub skipped: Vec<ChangeSetFile>,
    /// True when no history was consultable (first-time setup): everything
    /// discovered is pending.
    pub bootstrap: bool,
}

impl RolloutPlan {
    /// Number of change-set files considered.
    pub fn discovered(&self) -> usize {
        self.pending.len() + self.skipped.len()
    }
}

/// Partition discovered files into pending and skipped.
///
/// `history` is `None` in bootstrap mode. With history present:
///
/// - a rollback is always eligible, even for a never-applied or
///   already-reverted migration; the rollback SQL is expected to be guarded
///   by its author;
/// - a rollout is eligible if it never succeeded in this environment, or if
///   a rollback succeeded strictly after its latest success. Otherwise it is
///   already applied and skipped.
pub fn resolve(files: Vec<ChangeSetFile>, history: Option<&HistorySnapshot>) -> RolloutPlan {
    let Some(snapshot) = history else {
        return RolloutPlan {
            pending: files,
            skipped: Vec::new(),
            bootstrap: true,
        };
    };

    let mut pending = Vec::new();
    let mut skipped = Vec::new();

    for file in files {
        match file.direction {
            Direction::Rollback => pending.push(file),
            Direction::Rollout => {
                match snapshot.latest_success(&file.migration_name, Direction::Rollout) {
                    None => pending.push(file),
                    Some(applied_at) => {
                        if snapshot.rollback_since(&file.migration_name, applied_at) {
                            pending.push(file);
                        } else {
                            skipped.push(file);
                        }
                    }
                }
            }
        }
    }

    RolloutPlan {
        pending,
        skipped,
        bootstrap: false,
    }
}
