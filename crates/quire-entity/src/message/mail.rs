//! Mail message model.

use serde::{Deserialize, Serialize};

/// One email to deliver through the mail provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Sender address; the provider default when absent.
    #[serde(default)]
    pub from: Option<String>,
    /// Subject line (ignored by templated mail).
    #[serde(default)]
    pub subject: Option<String>,
    /// HTML body.
    #[serde(default)]
    pub html: Option<String>,
    /// Provider-side template.
    #[serde(default)]
    pub template_id: Option<String>,
    /// Variables for the template.
    #[serde(default)]
    pub template_data: Option<serde_json::Value>,
}
