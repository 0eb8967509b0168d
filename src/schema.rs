// Diesel table definitions mirroring the entity descriptors.
// migrations::ddl renders the physical tables from the same descriptors;
// tests::schema_columns_match_descriptors keeps the two aligned.

diesel::table! {
    users (id) {
        id -> Int4,
        #[max_length = 100]
        username -> Varchar,
        password -> Text,
        #[max_length = 320]
        email -> Nullable<Varchar>,
        #[max_length = 255]
        name -> Nullable<Varchar>,
        #[max_length = 32]
        phone -> Nullable<Varchar>,
        #[max_length = 50]
        account_type -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    user_profiles (id) {
        id -> Int4,
        user_id -> Int4,
        #[max_length = 255]
        company_name -> Nullable<Varchar>,
        #[max_length = 100]
        industry -> Nullable<Varchar>,
        target_audience -> Nullable<Text>,
        business_goals -> Nullable<Text>,
        #[max_length = 50]
        ai_tone -> Nullable<Varchar>,
        ai_preferences -> Nullable<Jsonb>,
        funnels_created -> Int4,
        leads_collected -> Int4,
        emails_sent -> Int4,
        open_rate -> Numeric,
        click_rate -> Numeric,
        feature_access -> Array<Text>,
        #[max_length = 32]
        plan_tier -> Varchar,
        history -> Nullable<Jsonb>,
        #[max_length = 2048]
        webhook_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    billing_history (id) {
        id -> Int4,
        user_id -> Int4,
        #[max_length = 50]
        subscription_type -> Varchar,
        amount -> Numeric,
        #[max_length = 3]
        currency -> Varchar,
        #[max_length = 50]
        payment_method -> Nullable<Varchar>,
        #[max_length = 32]
        status -> Varchar,
        billing_date -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    team_members (id) {
        id -> Int4,
        user_id -> Int4,
        #[max_length = 320]
        email -> Varchar,
        #[max_length = 50]
        role -> Varchar,
        permissions -> Array<Text>,
        #[max_length = 32]
        status -> Varchar,
        invited_at -> Timestamptz,
        joined_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    funnels (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        description -> Nullable<Text>,
        #[max_length = 32]
        funnel_type -> Varchar,
        #[max_length = 32]
        status -> Varchar,
        settings -> Nullable<Jsonb>,
        analytics -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    pages (id) {
        id -> Int4,
        funnel_id -> Int4,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 32]
        page_type -> Varchar,
        #[max_length = 2048]
        url -> Nullable<Varchar>,
        content -> Nullable<Jsonb>,
        elements -> Nullable<Jsonb>,
        order -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    lead_magnets (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        page_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 32]
        magnet_type -> Varchar,
        description -> Nullable<Text>,
        content -> Nullable<Jsonb>,
        #[max_length = 32]
        status -> Varchar,
        downloads -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    leads (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        funnel_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 320]
        email -> Varchar,
        #[max_length = 32]
        phone -> Nullable<Varchar>,
        #[max_length = 100]
        source -> Nullable<Varchar>,
        #[max_length = 32]
        status -> Varchar,
        score -> Int4,
        notes -> Nullable<Text>,
        custom_fields -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    templates (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 32]
        category -> Varchar,
        #[max_length = 50]
        template_type -> Varchar,
        description -> Nullable<Text>,
        content -> Jsonb,
        #[max_length = 2048]
        thumbnail -> Nullable<Varchar>,
        is_public -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    email_campaigns (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 255]
        subject -> Varchar,
        #[max_length = 255]
        preheader -> Nullable<Varchar>,
        content -> Jsonb,
        #[max_length = 32]
        campaign_type -> Varchar,
        #[max_length = 32]
        status -> Varchar,
        scheduled_at -> Nullable<Timestamptz>,
        sent_at -> Nullable<Timestamptz>,
        settings -> Nullable<Jsonb>,
        stats -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    email_templates (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 50]
        category -> Nullable<Varchar>,
        #[max_length = 255]
        subject -> Nullable<Varchar>,
        #[max_length = 255]
        preheader -> Nullable<Varchar>,
        content -> Jsonb,
        #[max_length = 2048]
        thumbnail -> Nullable<Varchar>,
        is_public -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    email_contacts (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        #[max_length = 320]
        email -> Varchar,
        #[max_length = 100]
        first_name -> Nullable<Varchar>,
        #[max_length = 100]
        last_name -> Nullable<Varchar>,
        tags -> Array<Text>,
        custom_fields -> Nullable<Jsonb>,
        #[max_length = 32]
        status -> Varchar,
        #[max_length = 100]
        source -> Nullable<Varchar>,
        subscribed_at -> Timestamptz,
        unsubscribed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    email_automations (id) {
        id -> Int4,
        user_id -> Nullable<Int4>,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 32]
        trigger_type -> Varchar,
        trigger_conditions -> Nullable<Jsonb>,
        steps -> Jsonb,
        #[max_length = 32]
        status -> Varchar,
        stats -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    email_sends (id) {
        id -> Int4,
        campaign_id -> Int4,
        contact_id -> Int4,
        #[max_length = 32]
        status -> Varchar,
        sent_at -> Timestamptz,
        delivered_at -> Nullable<Timestamptz>,
        opened_at -> Nullable<Timestamptz>,
        clicked_at -> Nullable<Timestamptz>,
        bounced_at -> Nullable<Timestamptz>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::joinable!(user_profiles -> users (user_id));
diesel::joinable!(billing_history -> users (user_id));
diesel::joinable!(team_members -> users (user_id));
diesel::joinable!(funnels -> users (user_id));
diesel::joinable!(pages -> funnels (funnel_id));
diesel::joinable!(lead_magnets -> pages (page_id));
diesel::joinable!(leads -> funnels (funnel_id));
diesel::joinable!(templates -> users (user_id));
diesel::joinable!(email_campaigns -> users (user_id));
diesel::joinable!(email_templates -> users (user_id));
diesel::joinable!(email_contacts -> users (user_id));
diesel::joinable!(email_automations -> users (user_id));
diesel::joinable!(email_sends -> email_campaigns (campaign_id));
diesel::joinable!(email_sends -> email_contacts (contact_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_profiles,
    billing_history,
    team_members,
    funnels,
    pages,
    lead_magnets,
    leads,
    templates,
    email_campaigns,
    email_templates,
    email_contacts,
    email_automations,
    email_sends,
);

/// Column names per table as Diesel sees them
pub fn diesel_columns(table: &str) -> Option<Vec<&'static str>> {
    use diesel::Column;

    macro_rules! names {
        ($table:ident: $($column:ident),+ $(,)?) => {
            vec![$(<$table::$column as Column>::NAME),+]
        };
    }

    let columns = match table {
        "users" => names!(users: id, username, password, email, name, phone, account_type, created_at, updated_at),
        "user_profiles" => names!(user_profiles: id, user_id, company_name, industry, target_audience,
            business_goals, ai_tone, ai_preferences, funnels_created, leads_collected, emails_sent,
            open_rate, click_rate, feature_access, plan_tier, history, webhook_url, created_at, updated_at),
        "billing_history" => names!(billing_history: id, user_id, subscription_type, amount, currency,
            payment_method, status, billing_date, created_at),
        "team_members" => names!(team_members: id, user_id, email, role, permissions, status, invited_at, joined_at),
        "funnels" => names!(funnels: id, user_id, name, description, funnel_type, status, settings,
            analytics, created_at, updated_at),
        "pages" => names!(pages: id, funnel_id, name, page_type, url, content, elements, order,
            is_active, created_at, updated_at),
        "lead_magnets" => names!(lead_magnets: id, user_id, page_id, name, magnet_type, description,
            content, status, downloads, created_at, updated_at),
        "leads" => names!(leads: id, user_id, funnel_id, name, email, phone, source, status, score,
            notes, custom_fields, created_at, updated_at),
        "templates" => names!(templates: id, user_id, name, category, template_type, description,
            content, thumbnail, is_public, created_at, updated_at),
        "email_campaigns" => names!(email_campaigns: id, user_id, name, subject, preheader, content,
            campaign_type, status, scheduled_at, sent_at, settings, stats, created_at, updated_at),
        "email_templates" => names!(email_templates: id, user_id, name, category, subject, preheader,
            content, thumbnail, is_public, created_at, updated_at),
        "email_contacts" => names!(email_contacts: id, user_id, email, first_name, last_name, tags,
            custom_fields, status, source, subscribed_at, unsubscribed_at, created_at, updated_at),
        "email_automations" => names!(email_automations: id, user_id, name, trigger_type,
            trigger_conditions, steps, status, stats, created_at, updated_at),
        "email_sends" => names!(email_sends: id, campaign_id, contact_id, status, sent_at,
            delivered_at, opened_at, clicked_at, bounced_at, metadata),
        _ => return None,
    };
    Some(columns)
}
