//! Role administration: CRUD, permission-set replacement against the
//! catalog, and deletion protection while users hold a role.

mod common;

use common::TestApp;
use luminova_api::auth::{consts as perm, CreateUserRequest, LoginCredentials};
use luminova_api::errors::ServiceError;

#[tokio::test]
async fn role_permissions_can_be_replaced() {
    let app = TestApp::new().await;
    let roles = &app.state.services.roles;

    let role = roles
        .create_role(
            "operator".to_string(),
            Some("Shop floor".to_string()),
            vec![perm::PRODUCTION_ORDERS_READ.to_string()],
        )
        .await
        .unwrap();
    assert_eq!(role.permissions, vec![perm::PRODUCTION_ORDERS_READ]);

    let replaced = roles
        .set_permissions(
            role.id,
            vec![
                perm::PRODUCTION_ORDERS_READ.to_string(),
                perm::PRODUCTION_ORDERS_UPDATE.to_string(),
                perm::INVENTORY_READ.to_string(),
            ],
        )
        .await
        .unwrap();
    assert_eq!(replaced.len(), 3);

    let fetched = roles.permissions_for(role.id).await.unwrap();
    assert_eq!(fetched.len(), 3);
    assert!(fetched.contains(&perm::INVENTORY_READ.to_string()));
}

#[tokio::test]
async fn unknown_permissions_are_rejected() {
    let app = TestApp::new().await;
    let roles = &app.state.services.roles;

    let bad_create = roles
        .create_role(
            "mystery".to_string(),
            None,
            vec!["widgets:frobnicate".to_string()],
        )
        .await;
    assert!(matches!(bad_create, Err(ServiceError::ValidationError(_))));

    let role = roles
        .create_role("clean".to_string(), None, Vec::new())
        .await
        .unwrap();
    let bad_set = roles
        .set_permissions(role.id, vec!["widgets:frobnicate".to_string()])
        .await;
    assert!(matches!(bad_set, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn duplicate_role_names_conflict() {
    let app = TestApp::new().await;
    let roles = &app.state.services.roles;

    roles
        .create_role("operator".to_string(), None, Vec::new())
        .await
        .unwrap();
    let duplicate = roles
        .create_role("operator".to_string(), None, Vec::new())
        .await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn assigned_roles_cannot_be_deleted() {
    let app = TestApp::new().await;
    let roles = &app.state.services.roles;

    let role = roles
        .create_role("warehouse".to_string(), None, Vec::new())
        .await
        .unwrap();
    app.auth_service
        .create_user(CreateUserRequest {
            name: "Warehouse Clerk".to_string(),
            email: "clerk@test.local".to_string(),
            password: Some("clerk-password-123".to_string()),
            roles: vec!["warehouse".to_string()],
        })
        .await
        .unwrap();

    let blocked = roles.delete_role(role.id).await;
    assert!(matches!(blocked, Err(ServiceError::ProtectedReference(_))));

    // Unassigned roles delete fine.
    let empty = roles
        .create_role("ghost".to_string(), None, Vec::new())
        .await
        .unwrap();
    roles.delete_role(empty.id).await.unwrap();
    assert!(matches!(
        roles.get_role(empty.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn tokens_carry_role_permission_snapshots() {
    let app = TestApp::new().await;
    let roles = &app.state.services.roles;

    roles
        .create_role(
            "viewer".to_string(),
            None,
            vec![perm::SALES_ORDERS_READ.to_string()],
        )
        .await
        .unwrap();
    app.auth_service
        .create_user(CreateUserRequest {
            name: "Viewer".to_string(),
            email: "viewer@test.local".to_string(),
            password: Some("viewer-password-123".to_string()),
            roles: vec!["viewer".to_string()],
        })
        .await
        .unwrap();

    let tokens = app
        .auth_service
        .login(&LoginCredentials {
            email: "viewer@test.local".to_string(),
            password: "viewer-password-123".to_string(),
        })
        .await
        .unwrap();
    let claims = app
        .auth_service
        .validate_token(&tokens.access_token)
        .await
        .unwrap();

    assert_eq!(claims.roles, vec!["viewer"]);
    assert_eq!(claims.permissions, vec![perm::SALES_ORDERS_READ]);
}
