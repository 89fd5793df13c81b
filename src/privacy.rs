//! Redaction of private repositories in shared output.
//!
//! Items from a private repository other than the one the run belongs to are
//! shown as `[private]`. The filter only touches text meant for people (log
//! lines, rendered diagnostics), never the records used for writes.

use std::collections::HashSet;

use crate::issue::SchedulingIssue;
use crate::store::WorkItemStore;

pub const PLACEHOLDER: &str = "[private]";

#[derive(Debug, Clone, Default)]
pub struct PrivacyFilter {
    /// `owner/repo` of the run, if known.
    current_repo: Option<String>,
    private_repos: HashSet<String>,
}

impl PrivacyFilter {
    /// Build from the current repository and every private item in the store.
    pub fn new(current_repo: Option<&str>, store: &WorkItemStore) -> Self {
        let private_repos = store
            .iter()
            .filter(|(_, item)| item.is_private)
            .map(|(_, item)| item.repo_key())
            .collect();
        Self {
            current_repo: current_repo.map(str::to_string),
            private_repos,
        }
    }

    pub fn from_private_repos(
        current_repo: Option<&str>,
        private_repos: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            current_repo: current_repo.map(str::to_string),
            private_repos: private_repos.into_iter().collect(),
        }
    }

    /// True when the repository is private and is not the current one.
    pub fn should_redact(&self, owner: &str, repo: &str) -> bool {
        let key = format!("{owner}/{repo}");
        self.private_repos.contains(&key) && self.current_repo.as_deref() != Some(key.as_str())
    }

    /// `owner/repo`, or the placeholder.
    pub fn redact_repo(&self, owner: &str, repo: &str) -> String {
        if self.should_redact(owner, repo) {
            return PLACEHOLDER.to_string();
        }
        format!("{owner}/{repo}")
    }

    /// `owner/repo #N`, or `[private] #N`.
    pub fn redact_ref(&self, owner: &str, repo: &str, number: u64) -> String {
        if self.should_redact(owner, repo) {
            return format!("{PLACEHOLDER} #{number}");
        }
        format!("{owner}/{repo} #{number}")
    }

    pub fn redact_title(&self, owner: &str, repo: &str, title: &str) -> String {
        if self.should_redact(owner, repo) {
            return PLACEHOLDER.to_string();
        }
        title.to_string()
    }

    /// Redact a dependency id of the form `owner/repo#N` to `[private]#N`.
    ///
    /// Strings that do not parse as a dependency id come back unchanged.
    pub fn redact_dep_id(&self, dep_id: &str) -> String {
        let Some((owner_repo, number)) = dep_id.rsplit_once('#') else {
            return dep_id.to_string();
        };
        let Ok(number) = number.parse::<u64>() else {
            return dep_id.to_string();
        };
        let Some((owner, repo)) = owner_repo.split_once('/') else {
            return dep_id.to_string();
        };
        if self.should_redact(owner, repo) {
            return format!("{PLACEHOLDER}#{number}");
        }
        dep_id.to_string()
    }

    /// Copy of the issue with every detail passed through [`Self::redact_dep_id`].
    pub fn redact_issue(&self, issue: &SchedulingIssue) -> SchedulingIssue {
        SchedulingIssue {
            details: issue
                .details
                .iter()
                .map(|detail| self.redact_dep_id(detail))
                .collect(),
            ..issue.clone()
        }
    }
}

/// Apply the filter when one is configured.
pub(crate) fn dep_id_for_log(privacy: Option<&PrivacyFilter>, dep_id: &str) -> String {
    match privacy {
        Some(filter) => filter.redact_dep_id(dep_id),
        None => dep_id.to_string(),
    }
}

/// Task id (`owner/repo#N`) of the item a log line is about. Draft ids pass
/// through.
pub(crate) fn task_id_for_log(privacy: Option<&PrivacyFilter>, task_id: &str) -> String {
    dep_id_for_log(privacy, task_id)
}

pub(crate) fn repo_for_log(privacy: Option<&PrivacyFilter>, owner: &str, repo: &str) -> String {
    match privacy {
        Some(filter) => filter.redact_repo(owner, repo),
        None => format!("{owner}/{repo}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PrivacyFilter {
        PrivacyFilter::from_private_repos(
            Some("acme/app"),
            vec!["acme/app".to_string(), "acme/secret".to_string()],
        )
    }

    #[test]
    fn current_repo_is_never_redacted() {
        let filter = filter();
        assert!(!filter.should_redact("acme", "app"));
        assert!(filter.should_redact("acme", "secret"));
        assert!(!filter.should_redact("acme", "public"));
    }

    #[test]
    fn dep_id_parsing_is_lenient() {
        let filter = filter();
        assert_eq!(filter.redact_dep_id("acme/secret#12"), "[private]#12");
        assert_eq!(filter.redact_dep_id("acme/public#12"), "acme/public#12");
        assert_eq!(filter.redact_dep_id("Low Estimate"), "Low Estimate");
        assert_eq!(filter.redact_dep_id("acme/secret#x"), "acme/secret#x");
        assert_eq!(filter.redact_dep_id("secret#3"), "secret#3");
    }

    #[test]
    fn no_current_repo_redacts_all_private() {
        let filter = PrivacyFilter::from_private_repos(None, vec!["acme/app".to_string()]);
        assert_eq!(filter.redact_ref("acme", "app", 4), "[private] #4");
    }
}
