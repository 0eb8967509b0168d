// Funnel builder entities: funnels, their ordered pages, lead capture and templates

use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::contract::ValidationError;
use crate::descriptor::{
    EntityDescriptor, FieldDefault, FieldDescriptor as F, OnDelete, TextFormat,
};
use crate::schema::{funnels, lead_magnets, leads, pages, templates};

use super::User;

text_enum! {
    FunnelType {
        LeadMagnet => "lead_magnet",
        Sales => "sales",
        Webinar => "webinar",
        ProductLaunch => "product_launch",
        Membership => "membership",
        Application => "application",
    }
}

text_enum! {
    FunnelStatus {
        Draft => "draft",
        Live => "live",
        Paused => "paused",
    }
}

text_enum! {
    PageType {
        Landing => "landing",
        Optin => "optin",
        ThankYou => "thankyou",
        Offer => "offer",
        Upsell => "upsell",
        Downsell => "downsell",
    }
}

text_enum! {
    LeadMagnetType {
        Ebook => "ebook",
        Quiz => "quiz",
        Checklist => "checklist",
        Template => "template",
        Video => "video",
    }
}

text_enum! {
    LeadMagnetStatus {
        Draft => "draft",
        Active => "active",
        Archived => "archived",
    }
}

text_enum! {
    /// Sales pipeline stage of a captured lead
    LeadStatus {
        New => "new",
        Qualified => "qualified",
        Contacted => "contacted",
        Converted => "converted",
    }
}

text_enum! {
    TemplateCategory {
        Funnel => "funnel",
        Page => "page",
        Email => "email",
    }
}

pub static FUNNELS: EntityDescriptor = EntityDescriptor {
    table: "funnels",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::text("description"),
        F::enumeration("funnel_type", FunnelType::VALUES).not_null(),
        F::enumeration("status", FunnelStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("draft")),
        F::json("settings"),
        F::json("analytics"),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static PAGES: EntityDescriptor = EntityDescriptor {
    table: "pages",
    fields: &[
        F::id(),
        F::reference("funnel_id", "funnels", OnDelete::Cascade).not_null(),
        F::varchar("name", 255).not_null(),
        F::enumeration("page_type", PageType::VALUES).not_null(),
        F::formatted("url", 2048, TextFormat::Url),
        F::json("content"),
        F::json("elements"),
        F::integer("order", Some(0)).not_null(),
        F::boolean("is_active")
            .not_null()
            .default_to(FieldDefault::Boolean(true)),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[&["funnel_id", "order"]],
    owner: "funnel_id",
    order_by: "order",
};

pub static LEAD_MAGNETS: EntityDescriptor = EntityDescriptor {
    table: "lead_magnets",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::reference("page_id", "pages", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::enumeration("magnet_type", LeadMagnetType::VALUES).not_null(),
        F::text("description"),
        F::json("content"),
        F::enumeration("status", LeadMagnetStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("draft")),
        F::integer("downloads", Some(0))
            .not_null()
            .default_to(FieldDefault::Integer(0))
            .server(),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static LEADS: EntityDescriptor = EntityDescriptor {
    table: "leads",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::reference("funnel_id", "funnels", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::formatted("email", 320, TextFormat::Email).not_null(),
        F::formatted("phone", 32, TextFormat::Phone),
        F::varchar("source", 100),
        F::enumeration("status", LeadStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("new")),
        F::integer("score", Some(0))
            .not_null()
            .default_to(FieldDefault::Integer(0)),
        F::text("notes"),
        F::json("custom_fields"),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static TEMPLATES: EntityDescriptor = EntityDescriptor {
    table: "templates",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::enumeration("category", TemplateCategory::VALUES).not_null(),
        F::varchar("template_type", 50).not_null(),
        F::text("description"),
        F::json("content").not_null(),
        F::formatted("thumbnail", 2048, TextFormat::Url),
        F::boolean("is_public")
            .not_null()
            .default_to(FieldDefault::Boolean(false)),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = funnels)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Funnel {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub funnel_type: FunnelType,
    pub status: FunnelStatus,
    pub settings: Option<JsonValue>,
    pub analytics: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = funnels)]
pub struct NewFunnel {
    pub user_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub funnel_type: FunnelType,
    pub status: Option<FunnelStatus>,
    pub settings: Option<JsonValue>,
    pub analytics: Option<JsonValue>,
}

impl_entity!(Funnel, NewFunnel, funnels, FUNNELS, owner = user_id, order = id);

/// A step of a funnel; `order` sequences pages within their funnel
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = pages)]
#[diesel(belongs_to(Funnel))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Page {
    pub id: i32,
    pub funnel_id: i32,
    pub name: String,
    pub page_type: PageType,
    pub url: Option<String>,
    pub content: Option<JsonValue>,
    pub elements: Option<JsonValue>,
    pub order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = pages)]
pub struct NewPage {
    pub funnel_id: i32,
    pub name: String,
    pub page_type: PageType,
    pub url: Option<String>,
    pub content: Option<JsonValue>,
    pub elements: Option<JsonValue>,
    pub order: i32,
    pub is_active: Option<bool>,
}

impl_entity!(Page, NewPage, pages, PAGES, owner = funnel_id, order = order);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = lead_magnets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LeadMagnet {
    pub id: i32,
    pub user_id: Option<i32>,
    pub page_id: Option<i32>,
    pub name: String,
    pub magnet_type: LeadMagnetType,
    pub description: Option<String>,
    pub content: Option<JsonValue>,
    pub status: LeadMagnetStatus,
    pub downloads: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = lead_magnets)]
pub struct NewLeadMagnet {
    pub user_id: Option<i32>,
    pub page_id: Option<i32>,
    pub name: String,
    pub magnet_type: LeadMagnetType,
    pub description: Option<String>,
    pub content: Option<JsonValue>,
    pub status: Option<LeadMagnetStatus>,
}

impl_entity!(
    LeadMagnet,
    NewLeadMagnet,
    lead_magnets,
    LEAD_MAGNETS,
    owner = user_id,
    order = id
);

/// Captured contact attributed to a funnel
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = leads)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Lead {
    pub id: i32,
    pub user_id: Option<i32>,
    pub funnel_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: LeadStatus,
    pub score: i32,
    pub notes: Option<String>,
    pub custom_fields: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = leads)]
pub struct NewLead {
    pub user_id: Option<i32>,
    pub funnel_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
    pub score: Option<i32>,
    pub notes: Option<String>,
    pub custom_fields: Option<JsonValue>,
}

impl_entity!(Lead, NewLead, leads, LEADS, owner = user_id, order = id);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Template {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub category: TemplateCategory,
    pub template_type: String,
    pub description: Option<String>,
    pub content: JsonValue,
    pub thumbnail: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = templates)]
pub struct NewTemplate {
    pub user_id: Option<i32>,
    pub name: String,
    pub category: TemplateCategory,
    pub template_type: String,
    pub description: Option<String>,
    pub content: JsonValue,
    pub thumbnail: Option<String>,
    pub is_public: Option<bool>,
}

/// Public templates are shared; private ones belong to someone
fn template_rules(fields: &Map<String, JsonValue>, report: &mut ValidationError) {
    let is_public = fields
        .get("is_public")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);
    let has_owner = fields.get("user_id").is_some_and(|v| !v.is_null());
    if !is_public && !has_owner {
        report.add("user_id", "is required for a private template");
    }
}

impl_entity!(
    Template,
    NewTemplate,
    templates,
    TEMPLATES,
    owner = user_id,
    order = id,
    rules = template_rules
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_lead_status_values_are_closed() {
        assert_eq!(
            LeadStatus::VALUES,
            &["new", "qualified", "contacted", "converted"]
        );
        assert_eq!(LeadStatus::from_str("qualified"), Ok(LeadStatus::Qualified));
        assert!(LeadStatus::from_str("bogus").is_err());
    }

    #[test]
    fn test_page_type_thankyou_spelling() {
        assert_eq!(PageType::ThankYou.as_str(), "thankyou");
        assert_eq!(PageType::ThankYou.to_string(), "thankyou");
    }

    #[test]
    fn test_pages_unique_order_within_funnel() {
        assert_eq!(PAGES.unique_together, &[&["funnel_id", "order"][..]]);
        assert_eq!(PAGES.order_by, "order");
    }

    #[test]
    fn test_downloads_is_server_assigned() {
        let downloads = LEAD_MAGNETS.field("downloads").unwrap();
        assert!(downloads.is_server_assigned());
    }
}
