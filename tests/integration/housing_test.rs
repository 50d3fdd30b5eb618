//! Room placement against a real database.
//!
//! Run with `DORMHUB_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{STRONG_PASSWORD, TestApp};

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_single_room_fills_and_empties() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let admin = app.admin_session().await;
    let tag = Uuid::new_v4().simple().to_string();

    let building = app
        .request(
            "POST",
            "/api/admin/buildings",
            Some(json!({ "name": format!("Hall {tag}"), "floors": 3 })),
            Some(&admin),
        )
        .await;
    assert_eq!(building.status, StatusCode::OK, "{}", building.body);
    let building_id = building.body["data"]["id"].as_str().unwrap().to_string();

    let room = app
        .request(
            "POST",
            "/api/admin/rooms",
            Some(json!({
                "building_id": building_id,
                "room_number": "101",
                "floor": 1,
                "room_type": "Single",
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(room.status, StatusCode::OK, "{}", room.body);
    assert_eq!(room.body["data"]["status"], "Available");
    let room_id = room.body["data"]["id"].as_str().unwrap().to_string();

    let student = app
        .request(
            "POST",
            "/api/admin/students",
            Some(json!({
                "student_number": format!("S-{tag}"),
                "name": "Ana Reyes",
                "email": format!("ana-{tag}@dorm.test"),
                "password": STRONG_PASSWORD,
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(student.status, StatusCode::OK, "{}", student.body);
    let student_id = student.body["data"]["id"].as_str().unwrap().to_string();

    let placed = app
        .request(
            "POST",
            &format!("/api/admin/rooms/{room_id}/occupants"),
            Some(json!({ "student_id": student_id })),
            Some(&admin),
        )
        .await;
    assert_eq!(placed.status, StatusCode::OK, "{}", placed.body);
    assert_eq!(placed.body["data"]["status"], "Occupied");

    // A full single room takes nobody else.
    let other = app
        .request(
            "POST",
            "/api/admin/students",
            Some(json!({
                "student_number": format!("T-{tag}"),
                "name": "Ben Cruz",
                "email": format!("ben-{tag}@dorm.test"),
                "password": STRONG_PASSWORD,
            })),
            Some(&admin),
        )
        .await;
    let other_id = other.body["data"]["id"].as_str().unwrap().to_string();
    let refused = app
        .request(
            "POST",
            &format!("/api/admin/rooms/{room_id}/occupants"),
            Some(json!({ "student_id": other_id })),
            Some(&admin),
        )
        .await;
    assert_eq!(refused.status, StatusCode::BAD_REQUEST);

    let student_token = app
        .login("students", &format!("ana-{tag}@dorm.test"), STRONG_PASSWORD)
        .await;
    let mine = app
        .request("GET", "/api/students/room", None, Some(&student_token))
        .await;
    assert_eq!(mine.body["data"]["id"], room_id.as_str());

    let emptied = app
        .request(
            "DELETE",
            &format!("/api/admin/rooms/{room_id}/occupants/{student_id}"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(emptied.status, StatusCode::OK, "{}", emptied.body);
    assert_eq!(emptied.body["data"]["status"], "Available");
    assert_eq!(emptied.body["data"]["occupants"], json!([]));
}

async fn create_student(app: &TestApp, admin: &str, tag: &str, n: u8) -> String {
    let student = app
        .request(
            "POST",
            "/api/admin/students",
            Some(json!({
                "student_number": format!("M{n}-{tag}"),
                "name": format!("Mover {n}"),
                "email": format!("mover{n}-{tag}@dorm.test"),
                "password": STRONG_PASSWORD,
            })),
            Some(admin),
        )
        .await;
    assert_eq!(student.status, StatusCode::OK, "{}", student.body);
    student.body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_double(app: &TestApp, admin: &str, building_id: &str, number: &str) -> String {
    let room = app
        .request(
            "POST",
            "/api/admin/rooms",
            Some(json!({
                "building_id": building_id,
                "room_number": number,
                "floor": 2,
                "room_type": "Double",
            })),
            Some(admin),
        )
        .await;
    assert_eq!(room.status, StatusCode::OK, "{}", room.body);
    room.body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_opposite_moves_both_complete() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let admin = app.admin_session().await;
    let tag = Uuid::new_v4().simple().to_string();

    let building = app
        .request(
            "POST",
            "/api/admin/buildings",
            Some(json!({ "name": format!("Annex {tag}"), "floors": 3 })),
            Some(&admin),
        )
        .await;
    assert_eq!(building.status, StatusCode::OK, "{}", building.body);
    let building_id = building.body["data"]["id"].as_str().unwrap().to_string();

    let first = create_double(&app, &admin, &building_id, "201").await;
    let second = create_double(&app, &admin, &building_id, "202").await;
    let ana = create_student(&app, &admin, &tag, 1).await;
    let ben = create_student(&app, &admin, &tag, 2).await;

    for (room, student) in [(&first, &ana), (&second, &ben)] {
        let placed = app
            .request(
                "POST",
                &format!("/api/admin/rooms/{room}/occupants"),
                Some(json!({ "student_id": student })),
                Some(&admin),
            )
            .await;
        assert_eq!(placed.status, StatusCode::OK, "{}", placed.body);
    }

    let ana_path = format!("/api/admin/rooms/{second}/occupants");
    let ben_path = format!("/api/admin/rooms/{first}/occupants");
    let (ana_moved, ben_moved) = tokio::join!(
        app.request(
            "POST",
            &ana_path,
            Some(json!({ "student_id": ana })),
            Some(&admin),
        ),
        app.request(
            "POST",
            &ben_path,
            Some(json!({ "student_id": ben })),
            Some(&admin),
        ),
    );
    assert_eq!(ana_moved.status, StatusCode::OK, "{}", ana_moved.body);
    assert_eq!(ben_moved.status, StatusCode::OK, "{}", ben_moved.body);

    let first_room = app
        .request("GET", &format!("/api/admin/rooms/{first}"), None, Some(&admin))
        .await;
    assert_eq!(first_room.body["data"]["occupants"], json!([ben]));
    let second_room = app
        .request("GET", &format!("/api/admin/rooms/{second}"), None, Some(&admin))
        .await;
    assert_eq!(second_room.body["data"]["occupants"], json!([ana]));
}
