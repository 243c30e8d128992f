use crate::helpers::{get_json_response_body, user_names, TestApp};

use serde_json::json;
use test_context::test_context;

fn page_schema() -> serde_json::Value {
    json!({
      "$schema": "http://json-schema.org/draft-04/schema#",
      "type": "object",
      "properties": {
        "content": {
          "type": "array",
          "items": {
            "type": "object",
            "properties": {
              "id": {"type": "integer"},
              "userName": {"type": "string"},
              "teamName": {"type": ["string", "null"]}
            },
            "required": ["id", "userName", "teamName"]
          }
        },
        "number": {"type": "integer"},
        "size": {"type": "integer"},
        "totalElements": {"type": "integer"},
        "totalPages": {"type": "integer"},
        "numberOfElements": {"type": "integer"},
        "first": {"type": "boolean"},
        "last": {"type": "boolean"},
        "empty": {"type": "boolean"}
      },
      "required": [
        "content",
        "number",
        "size",
        "totalElements",
        "totalPages",
        "numberOfElements",
        "first",
        "last",
        "empty"
      ]
    })
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_default_page(app: &mut TestApp) {
    let response = app.get_members("").await;
    assert_eq!(
        response.status().as_u16(),
        200,
        "Failed to list members: {:?}",
        response
    );

    let response_body = get_json_response_body(response).await;
    assert!(
        jsonschema::is_valid(&page_schema(), &response_body),
        "response does not match schema"
    );

    assert_eq!(response_body["number"], 0);
    assert_eq!(response_body["size"], 5);
    assert_eq!(response_body["totalElements"], 100);
    assert_eq!(response_body["totalPages"], 20);
    assert_eq!(response_body["numberOfElements"], 5);
    assert_eq!(response_body["first"], true);
    assert_eq!(response_body["last"], false);
    assert_eq!(
        response_body["content"][0],
        json!({"id": 1, "userName": "user0", "teamName": null})
    );
    assert_eq!(
        user_names(&response_body),
        ["user0", "user1", "user2", "user3", "user4"]
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_apply_page_size_and_sort(app: &mut TestApp) {
    let response = app.get_members("page=1&size=3&sort=id,desc").await;
    assert_eq!(response.status().as_u16(), 200);

    let response_body = get_json_response_body(response).await;
    assert_eq!(response_body["number"], 1);
    assert_eq!(response_body["totalPages"], 34);
    assert_eq!(user_names(&response_body), ["user96", "user95", "user94"]);

    let response = app.get_members("sort=age,desc").await;
    let response_body = get_json_response_body(response).await;
    assert_eq!(user_names(&response_body)[0], "user99");
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_last_page(app: &mut TestApp) {
    let response = app.get_members("page=19").await;
    let response_body = get_json_response_body(response).await;

    assert_eq!(response_body["last"], true);
    assert_eq!(response_body["first"], false);
    assert_eq!(
        user_names(&response_body),
        ["user95", "user96", "user97", "user98", "user99"]
    );

    let response = app.get_members("page=20").await;
    let response_body = get_json_response_body(response).await;
    assert_eq!(response_body["empty"], true);
    assert_eq!(response_body["totalElements"], 100);
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_cap_page_size(app: &mut TestApp) {
    let response = app.get_members("size=5000").await;
    let response_body = get_json_response_body(response).await;

    assert_eq!(response_body["size"], 2000);
    assert_eq!(response_body["numberOfElements"], 100);
    assert_eq!(response_body["totalPages"], 1);
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_fall_back_to_default_size_for_zero(app: &mut TestApp) {
    let response = app.get_members("size=0").await;
    let response_body = get_json_response_body(response).await;

    assert_eq!(response_body["size"], 5);
    assert_eq!(response_body["numberOfElements"], 5);
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_400_for_unknown_sort_property(app: &mut TestApp) {
    let response = app.get_members("sort=salary,desc").await;
    assert_eq!(
        response.status().as_u16(),
        400,
        "Should reject unknown sort properties",
    );

    let response_body = get_json_response_body(response).await;
    assert_eq!(
        response_body,
        json!({
            "error": "Validation error: No property 'salary' found for type 'Member'"
        })
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn should_return_400_for_invalid_page_number(app: &mut TestApp) {
    let response = app.get_members("page=abc").await;
    assert_eq!(response.status().as_u16(), 400);

    let response_body = get_json_response_body(response).await;
    let error = response_body["error"].as_str().unwrap();
    assert!(
        error.starts_with("Validation error: Failed to deserialize query string"),
        "unexpected error message: {error}"
    );
}
