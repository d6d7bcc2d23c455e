//! Account-level objects: snippets, variables, private locations,
//! maintenance windows, client certificates, triggers and static IPs.

use serde::{Deserialize, Serialize};

use super::common::{is_zero, nullable};
use crate::client::Endpoint;

/// A reusable script for setup and teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snippet {
    /// Assigned by the API; `0` until created.
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "nullable")]
    pub id: i64,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Node.js source.
    #[serde(deserialize_with = "nullable")]
    pub script: String,
}

impl Endpoint for Snippet {
    const COLLECTION: &'static str = "/v1/snippets";

    fn remote_id(&self) -> Option<String> {
        (self.id != 0).then(|| self.id.to_string())
    }
}

/// An account-wide environment variable, addressed by key.
///
/// The API masks the value of secret variables on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalEnvironmentVariable {
    /// Variable name, also its id.
    #[serde(deserialize_with = "nullable")]
    pub key: String,
    /// Variable value; empty on read when `secret`.
    #[serde(deserialize_with = "nullable")]
    pub value: String,
    /// Hide the value in the Checkly UI.
    #[serde(deserialize_with = "nullable")]
    pub locked: bool,
    /// The API never returns the value again.
    #[serde(deserialize_with = "nullable")]
    pub secret: bool,
}

impl Endpoint for GlobalEnvironmentVariable {
    const COLLECTION: &'static str = "/v1/variables";

    fn remote_id(&self) -> Option<String> {
        Some(self.key.clone()).filter(|key| !key.is_empty())
    }
}

/// An API key for a private location agent. The raw key is only returned
/// when the location is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivateLocationKey {
    /// Key id.
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    /// Full key, only present in the create response.
    #[serde(deserialize_with = "nullable")]
    pub raw_key: String,
    /// Masked form shown in the UI.
    #[serde(deserialize_with = "nullable")]
    pub masked_key: String,
}

/// A location on the account's own infrastructure that runs checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivateLocation {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Identifier used in check `private_locations`.
    #[serde(deserialize_with = "nullable")]
    pub slug_name: String,
    /// Icon shown in the UI.
    #[serde(deserialize_with = "nullable")]
    pub icon: String,
    /// Agent keys. Never sent back to the API.
    #[serde(skip_serializing, deserialize_with = "nullable")]
    pub keys: Vec<PrivateLocationKey>,
}

impl Default for PrivateLocation {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            slug_name: String::new(),
            icon: "location".to_string(),
            keys: Vec::new(),
        }
    }
}

impl Endpoint for PrivateLocation {
    const COLLECTION: &'static str = "/v1/private-locations";

    fn remote_id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }
}

/// Units a maintenance window can repeat by.
pub const REPEAT_UNITS: [&str; 3] = ["DAY", "WEEK", "MONTH"];

/// A period during which checks do not run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceWindow {
    /// Assigned by the API; `0` until created.
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "nullable")]
    pub id: i64,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Start, as an RFC 3339 timestamp.
    #[serde(deserialize_with = "nullable")]
    pub starts_at: String,
    /// End, as an RFC 3339 timestamp.
    #[serde(deserialize_with = "nullable")]
    pub ends_at: String,
    /// One of [`REPEAT_UNITS`] for recurring windows.
    pub repeat_unit: Option<String>,
    /// Last repetition.
    pub repeat_ends_at: Option<String>,
    /// Repeat every this many units.
    pub repeat_interval: Option<i64>,
    /// Checks with any of these tags pause during the window.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

impl Endpoint for MaintenanceWindow {
    const COLLECTION: &'static str = "/v1/maintenance-windows";

    fn remote_id(&self) -> Option<String> {
        (self.id != 0).then(|| self.id.to_string())
    }
}

/// A client certificate presented to a host during API checks. It cannot
/// be changed once uploaded; the API never returns the private key or the
/// passphrase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientCertificate {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Host pattern the certificate is presented to, e.g. `*.acme.com`.
    #[serde(deserialize_with = "nullable")]
    pub host: String,
    /// PEM encoded certificate.
    #[serde(deserialize_with = "nullable")]
    pub certificate: String,
    /// PEM encoded private key. Write only.
    #[serde(deserialize_with = "nullable")]
    pub private_key: String,
    /// PEM encoded CA bundle for the host.
    #[serde(rename = "trustedCA", deserialize_with = "nullable")]
    pub trusted_ca: String,
    /// Passphrase of the private key. Write only.
    #[serde(deserialize_with = "nullable")]
    pub passphrase: String,
}

impl Endpoint for ClientCertificate {
    const COLLECTION: &'static str = "/v1/client-certificates";

    fn remote_id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }
}

/// A trigger token for running a check on demand. Addressed by check id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerCheck {
    /// The triggered check.
    #[serde(deserialize_with = "nullable")]
    pub check_id: String,
    /// Token embedded in the trigger URL.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub token: String,
}

impl Endpoint for TriggerCheck {
    const COLLECTION: &'static str = "/v1/triggers/checks";

    fn create_path(&self) -> String {
        Self::read_path(&self.check_id)
    }

    fn remote_id(&self) -> Option<String> {
        Some(self.check_id.clone()).filter(|id| !id.is_empty())
    }
}

/// A trigger token for running a check group on demand. Addressed by group id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerGroup {
    /// The triggered group.
    #[serde(deserialize_with = "nullable")]
    pub group_id: i64,
    /// Token embedded in the trigger URL.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub token: String,
}

impl Endpoint for TriggerGroup {
    const COLLECTION: &'static str = "/v1/triggers/check-groups";

    fn create_path(&self) -> String {
        Self::read_path(&self.group_id.to_string())
    }

    fn remote_id(&self) -> Option<String> {
        (self.group_id != 0).then(|| self.group_id.to_string())
    }
}

/// Build the URL that runs a check or group when called.
pub fn trigger_url(api_url: &str, kind: &str, id: &str, token: &str) -> String {
    format!(
        "{}/{}/{}/trigger/{}",
        api_url.trim_end_matches('/'),
        kind,
        id,
        token
    )
}

/// A public address Checkly runs checks from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticIp {
    /// Region the address belongs to.
    #[serde(deserialize_with = "nullable")]
    pub region: String,
    /// Address in CIDR notation.
    #[serde(deserialize_with = "nullable")]
    pub address: String,
}

impl StaticIp {
    /// Endpoint listing every static IP.
    pub const PATH: &'static str = "/v1/static-ips";

    /// `IPv6` for addresses containing a colon, `IPv4` otherwise.
    pub fn family(&self) -> &'static str {
        if self.address.contains(':') {
            "IPv6"
        } else {
            "IPv4"
        }
    }
}
