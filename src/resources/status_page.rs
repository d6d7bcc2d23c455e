//! `checkly_status_page` and `checkly_status_page_service`

use serde_json::json;

use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::dashboard::{ServiceRef, STATUS_PAGE_THEMES};
use crate::models::{StatusPage, StatusPageCard, StatusPageService};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

fn card_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The title of the card."),
            )
            .with_block(
                "service_attachment",
                NestedBlock::list(Block::new().with_attribute(
                    "service_id",
                    Attribute::required_string()
                        .with_description("The id of a checkly_status_page_service."),
                ))
                .with_min_items(1),
            ),
    )
    .with_min_items(1)
}

impl FromAttributes for StatusPageCard {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let services = attrs
            .blocks("service_attachment")?
            .iter()
            .map(|block| block.string("service_id").map(|id| ServiceRef { id }))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            name: attrs.string("name")?,
            services,
        })
    }
}

impl ToAttributes for StatusPageCard {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("name", &self.name)
            .set_blocks(
                "service_attachment",
                self.services
                    .iter()
                    .map(|service| AttributeWriter::new().set_string("service_id", &service.id)),
            )
    }
}

impl ResourceModel for StatusPage {
    const TYPE_NAME: &'static str = "checkly_status_page";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("Status pages communicate the state of services to your users.")
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "url",
                Attribute::required_string()
                    .with_description("Subdomain of checkly-dashboards.com the page is served on."),
            )
            .with_attribute("custom_domain", Attribute::optional_string())
            .with_attribute("logo", Attribute::optional_string())
            .with_attribute(
                "redirect_to",
                Attribute::optional_string().with_description("Where clicking the logo leads."),
            )
            .with_attribute("favicon", Attribute::optional_string())
            .with_attribute(
                "default_theme",
                Attribute::optional_string()
                    .with_default(json!("AUTO"))
                    .with_validator(Validator::one_of(STATUS_PAGE_THEMES)),
            )
            .with_block("card", card_block())
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        let Ok(cards) = config.blocks("card") else {
            return diags;
        };
        for card in cards {
            let Ok(services) = card.blocks("service_attachment") else {
                continue;
            };
            let mut seen = Vec::new();
            for service in services {
                let Ok(Some(id)) = service.opt_string("service_id") else {
                    continue;
                };
                if seen.contains(&id) {
                    diags.push(
                        Diagnostic::error(format!("Service '{}' is attached to the card twice", id))
                            .with_attribute(format!("{}.service_id", service.path())),
                    );
                }
                seen.push(id);
            }
        }
        diags
    }
}

impl FromAttributes for StatusPage {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = StatusPage::default();
        Ok(Self {
            id: attrs.string("id")?,
            name: attrs.string("name")?,
            url: attrs.string("url")?,
            custom_domain: attrs.opt_string("custom_domain")?,
            logo: attrs.opt_string("logo")?,
            redirect_to: attrs.opt_string("redirect_to")?,
            favicon: attrs.opt_string("favicon")?,
            default_theme: attrs
                .opt_string("default_theme")?
                .unwrap_or(defaults.default_theme),
            cards: attrs.read_blocks("card")?,
        })
    }
}

impl ToAttributes for StatusPage {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("id", &self.id)
            .set_string("name", &self.name)
            .set_string("url", &self.url)
            .set_opt_string("custom_domain", self.custom_domain.as_deref())
            .set_opt_string("logo", self.logo.as_deref())
            .set_opt_string("redirect_to", self.redirect_to.as_deref())
            .set_opt_string("favicon", self.favicon.as_deref())
            .set_string("default_theme", &self.default_theme)
            .write_blocks("card", &self.cards)
    }
}

impl ResourceModel for StatusPageService {
    const TYPE_NAME: &'static str = "checkly_status_page_service";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("A service that status page cards report on.")
            .with_id()
            .with_attribute("name", Attribute::required_string())
    }
}

impl FromAttributes for StatusPageService {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: attrs.string("id")?,
            name: attrs.string("name")?,
        })
    }
}

impl ToAttributes for StatusPageService {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("id", &self.id)
            .set_string("name", &self.name)
    }
}
