use std::sync::Arc;

use anyhow::Result;
use axum_test::TestServer;
use cohort_core::{
    IdentityService,
    crypto::CredentialCodec,
    infrastructure::InMemoryStore,
    model::{GroupId, GroupInfo, GroupInvitation},
    token::TokenService,
};
use cohort_server::{AppState, create_app};
use uuid::Uuid;

pub const SIGNING_SECRET: &str = "users-api-test-signing-secret";

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub open_group: Uuid,
    pub private_group: Uuid,
}

/// Router over an in-memory store seeded with one open group and one
/// invitation-only group that has invited `invited@example.com`.
pub async fn build_test_app() -> Result<TestApp> {
    let store = Arc::new(InMemoryStore::new());
    let open_group = Uuid::new_v4();
    let private_group = Uuid::new_v4();

    store.add_group(GroupInfo::open(GroupId(open_group))).await;
    store
        .add_group(GroupInfo::invitation_only(GroupId(private_group)))
        .await;
    store
        .add_invitation(GroupInvitation {
            group_id: GroupId(private_group),
            email: "invited@example.com".to_string(),
            user_id: None,
        })
        .await;

    let identity = IdentityService::new(
        store.clone(),
        store.clone(),
        Arc::new(CredentialCodec::insecure_fast("test-pepper")?),
        Arc::new(TokenService::new(SIGNING_SECRET)?),
    );
    let app = create_app(AppState::new(identity, "cohort-test"));
    let server = TestServer::new(app).map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        store,
        open_group,
        private_group,
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
