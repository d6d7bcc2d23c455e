//! Public dashboards and status pages.

use serde::{Deserialize, Serialize};

use super::common::nullable;
use crate::client::Endpoint;

/// Allowed dashboard widths.
pub const DASHBOARD_WIDTHS: [&str; 2] = ["FULL", "960PX"];
/// Allowed refresh rates, in seconds.
pub const DASHBOARD_REFRESH_RATES: [i64; 3] = [60, 300, 600];
/// Allowed pagination rates, in seconds.
pub const DASHBOARD_PAGINATION_RATES: [i64; 3] = [30, 60, 300];

/// An access key of a private dashboard. The raw key is only returned once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardKey {
    /// Full key, only present in the create response.
    #[serde(deserialize_with = "nullable")]
    pub raw_key: String,
    /// Masked form shown in the UI.
    #[serde(deserialize_with = "nullable")]
    pub masked_key: String,
}

/// A public dashboard, addressed by `dashboard_id`. The numeric `id` the API
/// also returns is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dashboard {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub dashboard_id: String,
    /// Subdomain on `checklyhq.com`.
    #[serde(deserialize_with = "nullable")]
    pub custom_url: String,
    /// Custom domain serving the dashboard.
    #[serde(deserialize_with = "nullable")]
    pub custom_domain: String,
    /// Logo URL.
    #[serde(deserialize_with = "nullable")]
    pub logo: String,
    /// Favicon URL.
    #[serde(deserialize_with = "nullable")]
    pub favicon: String,
    /// Target of the logo link.
    #[serde(deserialize_with = "nullable")]
    pub link: String,
    /// Text under the header.
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    /// Page header.
    #[serde(deserialize_with = "nullable")]
    pub header: String,
    /// One of [`DASHBOARD_WIDTHS`].
    #[serde(deserialize_with = "nullable")]
    pub width: String,
    /// One of [`DASHBOARD_REFRESH_RATES`].
    #[serde(deserialize_with = "nullable")]
    pub refresh_rate: i64,
    /// Split checks over pages.
    #[serde(deserialize_with = "nullable")]
    pub paginate: bool,
    /// One of [`DASHBOARD_PAGINATION_RATES`].
    #[serde(deserialize_with = "nullable")]
    pub pagination_rate: i64,
    /// Checks on each page.
    #[serde(deserialize_with = "nullable")]
    pub checks_per_page: i64,
    /// Show checks matching all tags instead of any.
    #[serde(deserialize_with = "nullable")]
    pub use_tags_and_operator: bool,
    /// Hide tags on the dashboard.
    #[serde(deserialize_with = "nullable")]
    pub hide_tags: bool,
    /// Show incidents.
    #[serde(deserialize_with = "nullable")]
    pub enable_incidents: bool,
    /// Expand check details.
    #[serde(deserialize_with = "nullable")]
    pub expand_checks: bool,
    /// Show the header.
    #[serde(deserialize_with = "nullable")]
    pub show_header: bool,
    /// Stylesheet applied to the page.
    #[serde(rename = "customCSS", deserialize_with = "nullable")]
    pub custom_css: String,
    /// Show the 95th percentile response time.
    #[serde(deserialize_with = "nullable")]
    pub show_p95: bool,
    /// Show the 99th percentile response time.
    #[serde(deserialize_with = "nullable")]
    pub show_p99: bool,
    /// Require a key to view.
    #[serde(deserialize_with = "nullable")]
    pub is_private: bool,
    /// Checks with these tags are shown.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Access keys of a private dashboard.
    #[serde(skip_serializing, deserialize_with = "nullable")]
    pub keys: Vec<DashboardKey>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            dashboard_id: String::new(),
            custom_url: String::new(),
            custom_domain: String::new(),
            logo: String::new(),
            favicon: String::new(),
            link: String::new(),
            description: String::new(),
            header: String::new(),
            width: "FULL".to_string(),
            refresh_rate: 60,
            paginate: true,
            pagination_rate: 60,
            checks_per_page: 15,
            use_tags_and_operator: false,
            hide_tags: false,
            enable_incidents: false,
            expand_checks: false,
            show_header: true,
            custom_css: String::new(),
            show_p95: true,
            show_p99: true,
            is_private: false,
            tags: Vec::new(),
            keys: Vec::new(),
        }
    }
}

impl Endpoint for Dashboard {
    const COLLECTION: &'static str = "/v1/dashboards";

    fn remote_id(&self) -> Option<String> {
        Some(self.dashboard_id.clone()).filter(|id| !id.is_empty())
    }
}

/// Allowed status page themes.
pub const STATUS_PAGE_THEMES: [&str; 3] = ["AUTO", "DARK", "LIGHT"];

/// Reference from a status page card to a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceRef {
    /// Service id.
    #[serde(deserialize_with = "nullable")]
    pub id: String,
}

/// A group of services shown together on a status page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPageCard {
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Services on the card.
    #[serde(deserialize_with = "nullable")]
    pub services: Vec<ServiceRef>,
}

/// A public page showing the state of services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPage {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Subdomain on `checkly-dashboards.com`.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Custom domain serving the page.
    pub custom_domain: Option<String>,
    /// Logo URL.
    pub logo: Option<String>,
    /// Target of the logo link.
    pub redirect_to: Option<String>,
    /// Favicon URL.
    pub favicon: Option<String>,
    /// One of [`STATUS_PAGE_THEMES`].
    #[serde(deserialize_with = "nullable")]
    pub default_theme: String,
    /// Cards in display order.
    #[serde(deserialize_with = "nullable")]
    pub cards: Vec<StatusPageCard>,
}

impl Default for StatusPage {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            url: String::new(),
            custom_domain: None,
            logo: None,
            redirect_to: None,
            favicon: None,
            default_theme: "AUTO".to_string(),
            cards: Vec::new(),
        }
    }
}

impl Endpoint for StatusPage {
    const COLLECTION: &'static str = "/v1/status-pages";

    fn remote_id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }
}

/// A service shown on status pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPageService {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

impl Endpoint for StatusPageService {
    const COLLECTION: &'static str = "/v1/status-pages/services";

    fn remote_id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dashboard_id_is_dashboard_id() {
        let dashboard: Dashboard = serde_json::from_value(json!({
            "id": 91,
            "dashboardId": "d-1",
            "customUrl": "status",
            "customCSS": "body {}",
            "keys": [{"rawKey": "raw", "maskedKey": "r***"}]
        }))
        .unwrap();

        assert_eq!(dashboard.remote_id().as_deref(), Some("d-1"));
        assert_eq!(dashboard.custom_css, "body {}");
        assert_eq!(dashboard.keys[0].raw_key, "raw");
        assert_eq!(Dashboard::read_path("d-1"), "/v1/dashboards/d-1");

        let wire = serde_json::to_value(&dashboard).unwrap();
        assert!(wire.get("keys").is_none());
    }

    #[test]
    fn test_status_page_cards() {
        let page: StatusPage = serde_json::from_value(json!({
            "id": "sp-1",
            "name": "Acme",
            "url": "acme",
            "customDomain": null,
            "cards": [{"name": "API", "services": [{"id": "svc-1"}]}]
        }))
        .unwrap();

        assert_eq!(page.cards[0].services[0].id, "svc-1");
        assert_eq!(page.default_theme, "AUTO");
        assert!(page.custom_domain.is_none());
    }

    #[test]
    fn test_status_page_service_path() {
        assert_eq!(
            StatusPageService::read_path("svc-1"),
            "/v1/status-pages/services/svc-1"
        );
    }
}
