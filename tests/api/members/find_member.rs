use crate::helpers::{get_json_response_body, TestApp};

use serde_json::json;
use team_roster::domain::{NewMember, NewTeam, TeamName, UserName};
use test_context::test_context;

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_user_name_for_existing_member(app: &mut TestApp) {
    let response = app.get_member("1").await;
    assert_eq!(
        response.status().as_u16(),
        200,
        "Failed to get member: {:?}",
        response
    );

    let response_body = response.text().await.unwrap();
    assert_eq!(response_body, "user0");

    let response = app.get_member("100").await;
    assert_eq!(response.text().await.unwrap(), "user99");
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_404_for_non_existent_member_id(app: &mut TestApp) {
    let response = app.get_member("1000").await;
    assert_eq!(
        response.status().as_u16(),
        404,
        "Should return 404 for non-existent member IDs",
    );

    let response_body = get_json_response_body(response).await;
    assert_eq!(response_body, json!({"error": "Member not found: 1000"}));
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_400_for_non_numeric_member_id(app: &mut TestApp) {
    let response = app.get_member("abc").await;
    assert_eq!(
        response.status().as_u16(),
        400,
        "Should return 400 for non-numeric member IDs",
    );

    let response_body = get_json_response_body(response).await;
    let error = response_body["error"].as_str().unwrap();
    assert!(
        error.starts_with("Validation error: Invalid member ID"),
        "unexpected error message: {error}"
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_load_member_through_converter_route(app: &mut TestApp) {
    let response = app.get_member2("2").await;
    assert_eq!(
        response.status().as_u16(),
        200,
        "Failed to get member: {:?}",
        response
    );
    assert_eq!(response.text().await.unwrap(), "user1");

    let response = app.get_member2("1000").await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app.get_member2("abc").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_see_members_saved_after_start_up(app: &mut TestApp) {
    let team = app
        .team_store
        .write()
        .await
        .save_team(NewTeam::new(TeamName::parse("teamA").unwrap()))
        .await
        .unwrap();
    let member = app
        .member_store
        .write()
        .await
        .save(NewMember::with_team(
            UserName::parse("member1".to_owned()).unwrap(),
            10,
            &team,
        ))
        .await
        .unwrap();

    let response = app.get_member(&member.id().to_string()).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "member1");
}
