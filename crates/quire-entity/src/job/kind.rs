//! Job type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag identifying which handler processes a job.
///
/// Each tag has exactly one payload and result shape; the worker's handler
/// registry is keyed by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    /// Turn a pending draft into a published article.
    PublishArticle,
    /// Deliver one email.
    SendMail,
    /// Deliver one push notification.
    PushNotification,
}

impl JobType {
    /// All job types, in registration order.
    pub const ALL: [JobType; 3] = [Self::PublishArticle, Self::SendMail, Self::PushNotification];

    /// Return the job type as stored in the queue.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishArticle => "publish-article",
            Self::SendMail => "send-mail",
            Self::PushNotification => "push-notification",
        }
    }

    /// Logical queue the job type belongs to.
    pub fn queue(&self) -> &'static str {
        match self {
            Self::PublishArticle => "publication",
            Self::SendMail | Self::PushNotification => "notification",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown job type '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_as_str() {
        for job_type in JobType::ALL {
            assert_eq!(job_type.as_str().parse::<JobType>(), Ok(job_type));
        }
        assert!("render-pdf".parse::<JobType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&JobType::PublishArticle).expect("serialize");
        assert_eq!(json, "\"publish-article\"");
    }
}
