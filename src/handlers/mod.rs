// HTTP surface: one generic CRUD set per collection plus owner traversal,
// dashboard queries and the email draft library

pub mod dashboard;
pub mod drafts;
pub mod entities;
pub mod health;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::models::{
    BillingHistory, EmailAutomation, EmailCampaign, EmailContact, EmailSend, EmailTemplate,
    Entity, Funnel, Lead, LeadMagnet, Page, TeamMember, Template, User, UserProfile,
};
use crate::store::EntityStore;

use entities::{create, fetch, list, owned, remove};

/// Item routes for one collection: GET and DELETE `/v1/{name}/{id}`
fn item_routes<S: EntityStore, E: Entity>(
    router: Router<AppState<S>>,
    name: &str,
) -> Router<AppState<S>> {
    router.route(
        &format!("/v1/{}/{{id}}", name),
        get(fetch::<S, E>).delete(remove::<S, E>),
    )
}

/// Full CRUD for a collection with no special handlers
fn collection<S: EntityStore, E: Entity>(
    router: Router<AppState<S>>,
    name: &str,
) -> Router<AppState<S>> {
    let router = router.route(
        &format!("/v1/{}", name),
        post(create::<S, E>).get(list::<S, E>),
    );
    item_routes::<S, E>(router, name)
}

pub fn entity_routes<S: EntityStore>() -> Router<AppState<S>> {
    let router = Router::new()
        .route("/v1/users", post(users::create_user::<S>).get(list::<S, User>))
        .route(
            "/v1/leads",
            post(create::<S, Lead>).get(dashboard::query_leads::<S>),
        )
        .route("/v1/leads/summary", get(dashboard::lead_summary::<S>))
        .route(
            "/v1/email-contacts",
            post(create::<S, EmailContact>).get(dashboard::query_contacts::<S>),
        );
    let router = item_routes::<S, User>(router, "users");
    let router = item_routes::<S, Lead>(router, "leads");
    let router = item_routes::<S, EmailContact>(router, "email-contacts");

    let router = collection::<S, UserProfile>(router, "user-profiles");
    let router = collection::<S, BillingHistory>(router, "billing-history");
    let router = collection::<S, TeamMember>(router, "team-members");
    let router = collection::<S, Funnel>(router, "funnels");
    let router = collection::<S, Page>(router, "pages");
    let router = collection::<S, LeadMagnet>(router, "lead-magnets");
    let router = collection::<S, Template>(router, "templates");
    let router = collection::<S, EmailCampaign>(router, "email-campaigns");
    let router = collection::<S, EmailTemplate>(router, "email-templates");
    let router = collection::<S, EmailAutomation>(router, "email-automations");
    collection::<S, EmailSend>(router, "email-sends")
}

pub fn traversal_routes<S: EntityStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/v1/users/{id}/profile", get(users::get_profile::<S>))
        .route("/v1/users/{id}/funnels", get(owned::<S, User, Funnel>))
        .route("/v1/users/{id}/leads", get(owned::<S, User, Lead>))
        .route("/v1/users/{id}/lead-magnets", get(owned::<S, User, LeadMagnet>))
        .route("/v1/users/{id}/billing", get(owned::<S, User, BillingHistory>))
        .route("/v1/users/{id}/team", get(owned::<S, User, TeamMember>))
        .route("/v1/funnels/{id}/pages", get(owned::<S, Funnel, Page>))
        .route(
            "/v1/email-campaigns/{id}/sends",
            get(owned::<S, EmailCampaign, EmailSend>),
        )
        .route(
            "/v1/lead-magnets/{id}/downloads",
            post(dashboard::record_download::<S>),
        )
}

pub fn draft_routes<S: EntityStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/v1/email-drafts",
            get(drafts::list_drafts::<S>).post(drafts::create_draft::<S>),
        )
        .route(
            "/v1/email-drafts/{id}",
            get(drafts::get_draft::<S>)
                .put(drafts::update_draft::<S>)
                .delete(drafts::delete_draft::<S>),
        )
        .route(
            "/v1/email-drafts/{id}/promote",
            post(drafts::promote_draft::<S>),
        )
}
