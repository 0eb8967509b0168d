// Email marketing entities: campaigns, templates, contacts, automations, sends

use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::contract::ValidationError;
use crate::descriptor::{
    EntityDescriptor, FieldDefault, FieldDescriptor as F, OnDelete, TextFormat,
};
use crate::schema::{email_automations, email_campaigns, email_contacts, email_sends, email_templates};

text_enum! {
    CampaignType {
        Broadcast => "broadcast",
        Automation => "automation",
        Sequence => "sequence",
    }
}

text_enum! {
    /// draft -> scheduled -> sent for broadcasts; automations toggle active/paused
    CampaignStatus {
        Draft => "draft",
        Scheduled => "scheduled",
        Sent => "sent",
        Active => "active",
        Paused => "paused",
    }
}

text_enum! {
    ContactStatus {
        Subscribed => "subscribed",
        Unsubscribed => "unsubscribed",
        Bounced => "bounced",
    }
}

text_enum! {
    TriggerType {
        Signup => "signup",
        Purchase => "purchase",
        TagAdded => "tag_added",
        FormSubmitted => "form_submitted",
        LinkClicked => "link_clicked",
        DateBased => "date_based",
    }
}

text_enum! {
    AutomationStatus {
        Draft => "draft",
        Active => "active",
        Paused => "paused",
    }
}

text_enum! {
    /// Furthest delivery event seen for one email to one contact
    SendStatus {
        Sent => "sent",
        Delivered => "delivered",
        Opened => "opened",
        Clicked => "clicked",
        Bounced => "bounced",
    }
}

pub static EMAIL_CAMPAIGNS: EntityDescriptor = EntityDescriptor {
    table: "email_campaigns",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::varchar("subject", 255).not_null(),
        F::varchar("preheader", 255),
        F::json("content").not_null(),
        F::enumeration("campaign_type", CampaignType::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("broadcast")),
        F::enumeration("status", CampaignStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("draft")),
        F::timestamp("scheduled_at"),
        F::timestamp("sent_at").server(),
        F::json("settings"),
        F::json("stats"),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static EMAIL_TEMPLATES: EntityDescriptor = EntityDescriptor {
    table: "email_templates",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::varchar("category", 50),
        F::varchar("subject", 255),
        F::varchar("preheader", 255),
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

pub static EMAIL_CONTACTS: EntityDescriptor = EntityDescriptor {
    table: "email_contacts",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::formatted("email", 320, TextFormat::Email).not_null(),
        F::varchar("first_name", 100),
        F::varchar("last_name", 100),
        F::text_list("tags")
            .not_null()
            .default_to(FieldDefault::EmptyList),
        F::json("custom_fields"),
        F::enumeration("status", ContactStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("subscribed")),
        F::varchar("source", 100),
        F::stamped("subscribed_at"),
        F::timestamp("unsubscribed_at").server(),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static EMAIL_AUTOMATIONS: EntityDescriptor = EntityDescriptor {
    table: "email_automations",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::SetNull),
        F::varchar("name", 255).not_null(),
        F::enumeration("trigger_type", TriggerType::VALUES).not_null(),
        F::json("trigger_conditions"),
        F::json_list("steps", 1).not_null(),
        F::enumeration("status", AutomationStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("draft")),
        F::json("stats"),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static EMAIL_SENDS: EntityDescriptor = EntityDescriptor {
    table: "email_sends",
    fields: &[
        F::id(),
        F::reference("campaign_id", "email_campaigns", OnDelete::Cascade).not_null(),
        F::reference("contact_id", "email_contacts", OnDelete::Cascade).not_null(),
        F::enumeration("status", SendStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("sent")),
        F::stamped("sent_at"),
        F::timestamp("delivered_at").server(),
        F::timestamp("opened_at").server(),
        F::timestamp("clicked_at").server(),
        F::timestamp("bounced_at").server(),
        F::json("metadata"),
    ],
    unique_together: &[],
    owner: "campaign_id",
    order_by: "id",
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = email_campaigns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailCampaign {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub subject: String,
    pub preheader: Option<String>,
    pub content: JsonValue,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub settings: Option<JsonValue>,
    pub stats: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = email_campaigns)]
pub struct NewEmailCampaign {
    pub user_id: Option<i32>,
    pub name: String,
    pub subject: String,
    pub preheader: Option<String>,
    pub content: JsonValue,
    pub campaign_type: Option<CampaignType>,
    pub status: Option<CampaignStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub settings: Option<JsonValue>,
    pub stats: Option<JsonValue>,
}

/// A campaign cannot be created already sent, and a scheduled one needs a time
fn campaign_rules(fields: &Map<String, JsonValue>, report: &mut ValidationError) {
    match fields.get("status").and_then(JsonValue::as_str) {
        Some("sent") => report.add("status", "sent is recorded by delivery, not at creation"),
        Some("scheduled") if fields.get("scheduled_at").map_or(true, JsonValue::is_null) => {
            report.add("scheduled_at", "is required when status is scheduled")
        },
        _ => {},
    }
}

impl_entity!(
    EmailCampaign,
    NewEmailCampaign,
    email_campaigns,
    EMAIL_CAMPAIGNS,
    owner = user_id,
    order = id,
    rules = campaign_rules
);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = email_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailTemplate {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub preheader: Option<String>,
    pub content: JsonValue,
    pub thumbnail: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = email_templates)]
pub struct NewEmailTemplate {
    pub user_id: Option<i32>,
    pub name: String,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub preheader: Option<String>,
    pub content: JsonValue,
    pub thumbnail: Option<String>,
    pub is_public: Option<bool>,
}

impl_entity!(
    EmailTemplate,
    NewEmailTemplate,
    email_templates,
    EMAIL_TEMPLATES,
    owner = user_id,
    order = id
);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = email_contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailContact {
    pub id: i32,
    pub user_id: Option<i32>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub tags: Vec<String>,
    pub custom_fields: Option<JsonValue>,
    pub status: ContactStatus,
    pub source: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailContact {
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = email_contacts)]
pub struct NewEmailContact {
    pub user_id: Option<i32>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<JsonValue>,
    pub status: Option<ContactStatus>,
    pub source: Option<String>,
}

impl_entity!(
    EmailContact,
    NewEmailContact,
    email_contacts,
    EMAIL_CONTACTS,
    owner = user_id,
    order = id
);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = email_automations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailAutomation {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub trigger_type: TriggerType,
    pub trigger_conditions: Option<JsonValue>,
    pub steps: JsonValue,
    pub status: AutomationStatus,
    pub stats: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = email_automations)]
pub struct NewEmailAutomation {
    pub user_id: Option<i32>,
    pub name: String,
    pub trigger_type: TriggerType,
    pub trigger_conditions: Option<JsonValue>,
    pub steps: JsonValue,
    pub status: Option<AutomationStatus>,
    pub stats: Option<JsonValue>,
}

impl_entity!(
    EmailAutomation,
    NewEmailAutomation,
    email_automations,
    EMAIL_AUTOMATIONS,
    owner = user_id,
    order = id
);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = email_sends)]
#[diesel(belongs_to(EmailCampaign, foreign_key = campaign_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailSend {
    pub id: i32,
    pub campaign_id: i32,
    pub contact_id: i32,
    pub status: SendStatus,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub bounced_at: Option<DateTime<Utc>>,
    pub metadata: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = email_sends)]
pub struct NewEmailSend {
    pub campaign_id: i32,
    pub contact_id: i32,
    pub status: Option<SendStatus>,
    pub metadata: Option<JsonValue>,
}

/// Every later state carries a server-stamped event time, so a send starts as `sent`
fn send_rules(fields: &Map<String, JsonValue>, report: &mut ValidationError) {
    match fields.get("status").and_then(JsonValue::as_str) {
        None | Some("sent") => {},
        Some(other) => report.add("status", format!("{} is recorded by delivery events, not at creation", other)),
    }
}

impl_entity!(
    EmailSend,
    NewEmailSend,
    email_sends,
    EMAIL_SENDS,
    owner = campaign_id,
    order = id,
    rules = send_rules
);
