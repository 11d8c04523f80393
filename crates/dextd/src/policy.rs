//! Replacement policy for already-installed extensions

use std::cmp::Ordering;

use dext_shared::{ExtensionProperties, ReplacementAction};
use serde::{Deserialize, Serialize};

/// How to answer the subsystem when an extension with the same identifier is
/// already installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Always replace the installed extension
    #[default]
    AlwaysReplace,
    /// Replace only when the incoming build version is newer
    NewerVersion,
    /// Keep whatever is installed
    Never,
}

impl ReplacementPolicy {
    pub fn decide(
        &self,
        existing: &ExtensionProperties,
        replacement: &ExtensionProperties,
    ) -> ReplacementAction {
        match self {
            ReplacementPolicy::AlwaysReplace => ReplacementAction::Replace,
            ReplacementPolicy::Never => ReplacementAction::Cancel,
            ReplacementPolicy::NewerVersion => {
                if compare_versions(&replacement.bundle_version, &existing.bundle_version)
                    == Ordering::Greater
                {
                    ReplacementAction::Replace
                } else {
                    ReplacementAction::Cancel
                }
            }
        }
    }
}

/// Compare dot-separated build versions numerically ("1.10" > "1.9").
///
/// Missing components count as zero. Falls back to a plain string comparison
/// when either side has a non-numeric component.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Option<Vec<u64>> {
        v.trim().split('.').map(|part| part.parse().ok()).collect()
    };

    match (parse(a), parse(b)) {
        (Some(left), Some(right)) => {
            let len = left.len().max(right.len());
            for i in 0..len {
                let l = left.get(i).copied().unwrap_or(0);
                let r = right.get(i).copied().unwrap_or(0);
                match l.cmp(&r) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        }
        _ => a.cmp(b),
    }
}
