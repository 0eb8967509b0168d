// Account entities: users and everything deleted together with them

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::descriptor::{
    EntityDescriptor, FieldDefault, FieldDescriptor as F, OnDelete, TextFormat,
};
use crate::schema::{billing_history, team_members, user_profiles, users};

text_enum! {
    /// Subscription plan recorded on the profile
    PlanTier {
        Free => "free",
        Pro => "pro",
        Business => "business",
        Enterprise => "enterprise",
    }
}

text_enum! {
    BillingStatus {
        Pending => "pending",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Invitation state of a team member
    TeamMemberStatus {
        Pending => "pending",
        Joined => "joined",
    }
}

pub static USERS: EntityDescriptor = EntityDescriptor {
    table: "users",
    fields: &[
        F::id(),
        F::varchar("username", 100).not_null().unique(),
        F::text("password").not_null(),
        F::formatted("email", 320, TextFormat::Email).unique(),
        F::varchar("name", 255),
        F::formatted("phone", 32, TextFormat::Phone),
        F::varchar("account_type", 50)
            .not_null()
            .default_to(FieldDefault::Text("Free")),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "id",
    order_by: "id",
};

pub static USER_PROFILES: EntityDescriptor = EntityDescriptor {
    table: "user_profiles",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::Cascade)
            .not_null()
            .unique(),
        F::varchar("company_name", 255),
        F::varchar("industry", 100),
        F::text("target_audience"),
        F::text("business_goals"),
        F::varchar("ai_tone", 50),
        F::json("ai_preferences"),
        F::integer("funnels_created", Some(0))
            .not_null()
            .default_to(FieldDefault::Integer(0)),
        F::integer("leads_collected", Some(0))
            .not_null()
            .default_to(FieldDefault::Integer(0)),
        F::integer("emails_sent", Some(0))
            .not_null()
            .default_to(FieldDefault::Integer(0)),
        F::decimal("open_rate", 5, 2)
            .not_null()
            .default_to(FieldDefault::Decimal("0.00")),
        F::decimal("click_rate", 5, 2)
            .not_null()
            .default_to(FieldDefault::Decimal("0.00")),
        F::text_list("feature_access")
            .not_null()
            .default_to(FieldDefault::EmptyList),
        F::enumeration("plan_tier", PlanTier::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("free")),
        F::json("history"),
        F::formatted("webhook_url", 2048, TextFormat::Url),
        F::stamped("created_at"),
        F::stamped("updated_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

pub static BILLING_HISTORY: EntityDescriptor = EntityDescriptor {
    table: "billing_history",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::Cascade).not_null(),
        F::varchar("subscription_type", 50).not_null(),
        F::decimal("amount", 10, 2).not_null(),
        F::formatted("currency", 3, TextFormat::Currency)
            .not_null()
            .default_to(FieldDefault::Text("USD")),
        F::varchar("payment_method", 50),
        F::enumeration("status", BillingStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("pending")),
        F::timestamp("billing_date")
            .not_null()
            .default_to(FieldDefault::Now),
        F::stamped("created_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "billing_date",
};

pub static TEAM_MEMBERS: EntityDescriptor = EntityDescriptor {
    table: "team_members",
    fields: &[
        F::id(),
        F::reference("user_id", "users", OnDelete::Cascade).not_null(),
        F::formatted("email", 320, TextFormat::Email).not_null(),
        F::varchar("role", 50)
            .not_null()
            .default_to(FieldDefault::Text("member")),
        F::text_list("permissions")
            .not_null()
            .default_to(FieldDefault::EmptyList),
        F::enumeration("status", TeamMemberStatus::VALUES)
            .not_null()
            .default_to(FieldDefault::Text("pending")),
        F::stamped("invited_at"),
        F::timestamp("joined_at"),
    ],
    unique_together: &[],
    owner: "user_id",
    order_by: "id",
};

/// User database model
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Argon2 hash when created through the API; never serialized out
    #[serde(skip_serializing)]
    pub password: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub account_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub account_type: Option<String>,
}

impl_entity!(User, NewUser, users, USERS, owner = id, order = id);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = user_profiles)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserProfile {
    pub id: i32,
    pub user_id: i32,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub business_goals: Option<String>,
    pub ai_tone: Option<String>,
    pub ai_preferences: Option<JsonValue>,
    pub funnels_created: i32,
    pub leads_collected: i32,
    pub emails_sent: i32,
    pub open_rate: BigDecimal,
    pub click_rate: BigDecimal,
    pub feature_access: Vec<String>,
    pub plan_tier: PlanTier,
    pub history: Option<JsonValue>,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = user_profiles)]
pub struct NewUserProfile {
    pub user_id: i32,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub business_goals: Option<String>,
    pub ai_tone: Option<String>,
    pub ai_preferences: Option<JsonValue>,
    pub funnels_created: Option<i32>,
    pub leads_collected: Option<i32>,
    pub emails_sent: Option<i32>,
    pub open_rate: Option<BigDecimal>,
    pub click_rate: Option<BigDecimal>,
    pub feature_access: Option<Vec<String>>,
    pub plan_tier: Option<PlanTier>,
    pub history: Option<JsonValue>,
    pub webhook_url: Option<String>,
}

impl_entity!(
    UserProfile,
    NewUserProfile,
    user_profiles,
    USER_PROFILES,
    owner = user_id,
    order = id
);

/// Append-only billing ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = billing_history)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BillingHistory {
    pub id: i32,
    pub user_id: i32,
    pub subscription_type: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub payment_method: Option<String>,
    pub status: BillingStatus,
    pub billing_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = billing_history)]
pub struct NewBillingHistory {
    pub user_id: i32,
    pub subscription_type: String,
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<BillingStatus>,
    pub billing_date: Option<DateTime<Utc>>,
}

impl_entity!(
    BillingHistory,
    NewBillingHistory,
    billing_history,
    BILLING_HISTORY,
    owner = user_id,
    order = billing_date
);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = team_members)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamMember {
    pub id: i32,
    pub user_id: i32,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub status: TeamMemberStatus,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub user_id: i32,
    pub email: String,
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub status: Option<TeamMemberStatus>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// A member marked as joined must carry the join time
fn team_member_rules(fields: &serde_json::Map<String, JsonValue>, report: &mut crate::contract::ValidationError) {
    let joined = fields.get("status").and_then(JsonValue::as_str) == Some("joined");
    let has_joined_at = fields.get("joined_at").is_some_and(|v| !v.is_null());
    if joined && !has_joined_at {
        report.add("joined_at", "is required when status is joined");
    }
    if !joined && has_joined_at {
        report.add("joined_at", "can only be set when status is joined");
    }
}

impl_entity!(
    TeamMember,
    NewTeamMember,
    team_members,
    TEAM_MEMBERS,
    owner = user_id,
    order = id,
    rules = team_member_rules
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_plan_tier_round_trips_through_text() {
        for value in PlanTier::VALUES {
            let tier = PlanTier::from_str(value).unwrap();
            assert_eq!(tier.as_str(), *value);
        }
        assert!(PlanTier::from_str("platinum").is_err());
    }

    #[test]
    fn test_user_password_is_not_serialized() {
        let user = User {
            id: 1,
            username: "ada".to_string(),
            password: "$argon2id$v=19$secret".to_string(),
            email: None,
            name: None,
            phone: None,
            account_type: "Free".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "ada");
    }

    #[test]
    fn test_billing_status_serializes_as_text() {
        let json = serde_json::to_value(BillingStatus::Refunded).unwrap();
        assert_eq!(json, serde_json::json!("refunded"));
        let parsed: BillingStatus = serde_json::from_value(serde_json::json!("paid")).unwrap();
        assert_eq!(parsed, BillingStatus::Paid);
    }
}
