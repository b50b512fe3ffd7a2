use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(pub String);

/// A coding challenge reviewers sign up for, with its GitHub template
/// metadata and the hours its review slots are offered at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub name: String,
    pub github_owner: String,
    pub github_org: String,
    pub template_repo: String,
    pub repo_name_format: String,
    pub technologies: Vec<String>,
    pub review_hours: Vec<u8>,
    pub created_by_team_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    pub fn org_or_owner(&self) -> &str {
        if self.github_org.trim().is_empty() {
            &self.github_owner
        } else {
            &self.github_org
        }
    }

    pub fn template_repository_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.org_or_owner(), self.template_repo)
    }

    pub fn tracking_issues_url(&self) -> String {
        format!("https://github.com/{}/{}/issues", self.org_or_owner(), self.template_repo)
    }
}
