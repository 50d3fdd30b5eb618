//! Broadcast notifications keep per-account inbox state.

use axum::http::StatusCode;
use serde_json::{Value, json};

use dormhub_entity::account::Role;

use crate::helpers::TestApp;

/// The broadcast about `news_id` in the account's inbox, if still there.
async fn find_news_notice(app: &TestApp, token: &str, news_id: &str) -> Option<Value> {
    let inbox = app
        .request(
            "GET",
            "/api/students/notifications?page_size=100",
            None,
            Some(token),
        )
        .await;
    assert_eq!(inbox.status, StatusCode::OK, "{}", inbox.body);
    inbox.body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["related_id"] == news_id)
        .cloned()
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_broadcast_read_and_delete_are_per_account() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let admin = app.admin_session().await;
    let news = app
        .request(
            "POST",
            "/api/admin/news",
            Some(json!({ "title": "Water outage", "content": "Block B, 9-11am" })),
            Some(&admin),
        )
        .await;
    assert_eq!(news.status, StatusCode::OK, "{}", news.body);
    let news_id = news.body["data"]["id"].as_str().unwrap().to_string();

    let (_, ana) = app.token_for(Role::Student);
    let (_, ben) = app.token_for(Role::Student);

    let notice = find_news_notice(&app, &ana, &news_id).await.unwrap();
    assert_eq!(notice["is_read"], false);
    let notice_id = notice["id"].as_str().unwrap().to_string();

    let read = app
        .request(
            "PUT",
            &format!("/api/students/notifications/{notice_id}/read"),
            None,
            Some(&ana),
        )
        .await;
    assert_eq!(read.status, StatusCode::OK, "{}", read.body);

    let for_ana = find_news_notice(&app, &ana, &news_id).await.unwrap();
    assert_eq!(for_ana["is_read"], true);
    let for_ben = find_news_notice(&app, &ben, &news_id).await.unwrap();
    assert_eq!(for_ben["is_read"], false);

    let deleted = app
        .request(
            "DELETE",
            &format!("/api/students/notifications/{notice_id}"),
            None,
            Some(&ana),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK, "{}", deleted.body);
    assert!(find_news_notice(&app, &ana, &news_id).await.is_none());
    assert!(find_news_notice(&app, &ben, &news_id).await.is_some());

    // A dismissed broadcast is gone for good.
    let again = app
        .request(
            "DELETE",
            &format!("/api/students/notifications/{notice_id}"),
            None,
            Some(&ana),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_read_all_and_clear_leave_other_students_alone() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let admin = app.admin_session().await;
    let news = app
        .request(
            "POST",
            "/api/admin/news",
            Some(json!({ "title": "Fire drill", "content": "Thursday at noon" })),
            Some(&admin),
        )
        .await;
    let news_id = news.body["data"]["id"].as_str().unwrap().to_string();

    let (_, ana) = app.token_for(Role::Student);
    let (_, ben) = app.token_for(Role::Student);

    let read_all = app
        .request("PUT", "/api/students/notifications/read-all", None, Some(&ana))
        .await;
    assert_eq!(read_all.status, StatusCode::OK, "{}", read_all.body);
    let unread = app
        .request("GET", "/api/students/notifications/unread-count", None, Some(&ana))
        .await;
    assert_eq!(unread.body["data"]["count"], 0);

    let for_ben = find_news_notice(&app, &ben, &news_id).await.unwrap();
    assert_eq!(for_ben["is_read"], false);

    let cleared = app
        .request("DELETE", "/api/students/notifications", None, Some(&ana))
        .await;
    assert_eq!(cleared.status, StatusCode::OK, "{}", cleared.body);
    assert!(find_news_notice(&app, &ana, &news_id).await.is_none());
    assert!(find_news_notice(&app, &ben, &news_id).await.is_some());
}
