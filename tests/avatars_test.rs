//! Integration tests for avatar upload, rendering, and removal.

mod common;

use common::{file_form, png_bytes, TestHarness};
use la_core::config::Config;

const MYSTERY_HASH: &str = "ad516503a11cd5ca435acc9bb6523536";

async fn upload(
    client: &reqwest::Client,
    addr: std::net::SocketAddr,
    user: la_core::UserId,
    token: &str,
    form: reqwest::multipart::Form,
) -> reqwest::Response {
    client
        .post(format!("http://{addr}/api/users/{user}/avatar"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_then_render_generates_variant() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "me.png", "image/png", png_bytes(100, 100)).text("rating", "G");
    let resp = upload(&client, addr, ann, &token, form).await;
    assert_eq!(resp.status(), 201);
    let state: serde_json::Value = resp.json().await.unwrap();
    let source = state["source"].as_str().unwrap();
    assert!(source.starts_with("/uploads/ann_avatar_"), "{source}");
    assert!(source.ends_with(".png"));
    assert_eq!(state["rating"], "G");

    let resp = client
        .get(format!("http://{addr}/avatar/{ann}?size=50&alt=Ann"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["local"], true);
    assert_eq!(json["size"], 50);
    let url = json["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("http://{addr}/uploads/")), "{url}");
    assert!(url.ends_with("-50x50.png"), "{url}");
    let html = json["html"].as_str().unwrap();
    assert!(html.contains("class='avatar avatar-50 photo'"));
    assert!(html.contains("alt='Ann'"));

    // The variant is served from the uploads directory.
    let bytes = client.get(url).send().await.unwrap().bytes().await.unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (50, 50));

    // And cached on the record.
    let state: serde_json::Value = client
        .get(format!("http://{addr}/api/users/{ann}/avatar"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(state["sizes"]["50"].as_str().unwrap().ends_with("-50x50.png"));
}

#[tokio::test]
async fn email_reference_resolves_same_user() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "me.png", "image/png", png_bytes(64, 64));
    assert_eq!(upload(&client, addr, ann, &token, form).await.status(), 201);

    let json: serde_json::Value = client
        .get(format!("http://{addr}/avatar/Ann@Example.test?size=64"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["local"], true);
    assert_eq!(json["size"], 64);
}

#[tokio::test]
async fn rating_above_site_maximum_falls_back_to_gravatar() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "me.png", "image/png", png_bytes(80, 80)).text("rating", "X");
    assert_eq!(upload(&client, addr, ann, &token, form).await.status(), 201);

    let json: serde_json::Value = client
        .get(format!("http://{addr}/avatar/{ann}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["local"], false);
    let url = json["url"].as_str().unwrap();
    assert!(url.starts_with("https://secure.gravatar.com/avatar/"));
    assert!(url.contains("r=g"));
}

#[tokio::test]
async fn unknown_user_id_gets_default_image() {
    let (_h, addr) = TestHarness::with_server().await;
    let json: serde_json::Value = reqwest::get(format!("http://{addr}/avatar/999?size=32"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["local"], false);
    assert!(json["url"].as_str().unwrap().contains(MYSTERY_HASH));
    assert!(json["html"].as_str().unwrap().contains("avatar-default"));
}

#[tokio::test]
async fn non_numeric_size_uses_default() {
    let (_h, addr) = TestHarness::with_server().await;
    let json: serde_json::Value = reqwest::get(format!("http://{addr}/avatar/5?size=big"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["size"], 96);
}

#[tokio::test]
async fn oversized_request_is_clamped() {
    let (_h, addr) = TestHarness::with_server().await;
    let json: serde_json::Value = reqwest::get(format!("http://{addr}/avatar/5?size=4000"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["size"], 512);
}

#[tokio::test]
async fn unparseable_reference_is_bad_request() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/avatar/nobody")).await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn mutations_require_token() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, _) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("http://{addr}/api/users/{ann}/avatar"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .delete(format!("http://{addr}/api/users/{ann}/avatar"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "unauthorized");
}

#[tokio::test]
async fn author_cannot_touch_another_users_avatar() {
    let (h, addr) = TestHarness::with_server().await;
    let (_ann, ann_token) = h.create_user("ann", "author");
    let (bob, _) = h.create_user("bob", "subscriber");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "me.png", "image/png", png_bytes(20, 20));
    assert_eq!(upload(&client, addr, bob, &ann_token, form).await.status(), 403);

    let resp = client
        .put(format!("http://{addr}/api/users/{bob}/avatar/rating"))
        .bearer_auth(&ann_token)
        .json(&serde_json::json!({"rating": "PG"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn admin_deletes_another_users_avatar_and_files() {
    let (h, addr) = TestHarness::with_server().await;
    let (bob, bob_token) = h.create_user("bob", "subscriber");
    let (_root, root_token) = h.create_user("root", "administrator");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "bob.png", "image/png", png_bytes(60, 60));
    assert_eq!(upload(&client, addr, bob, &bob_token, form).await.status(), 201);
    reqwest::get(format!("http://{addr}/avatar/{bob}?size=30")).await.unwrap();
    assert_eq!(std::fs::read_dir(h.uploads.path()).unwrap().count(), 2);

    let resp = client
        .delete(format!("http://{addr}/api/users/{bob}/avatar"))
        .bearer_auth(&root_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert_eq!(std::fs::read_dir(h.uploads.path()).unwrap().count(), 0);

    let state: serde_json::Value = client
        .get(format!("http://{addr}/api/users/{bob}/avatar"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(state["source"].is_null());
    assert_eq!(state["rating"], "G");
}

#[tokio::test]
async fn editor_cannot_change_administrator_avatar() {
    let (h, addr) = TestHarness::with_server().await;
    let (root, root_token) = h.create_user("root", "administrator");
    let (_ed, ed_token) = h.create_user("ed", "editor");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "root.png", "image/png", png_bytes(40, 40));
    assert_eq!(upload(&client, addr, root, &root_token, form).await.status(), 201);

    let resp = client
        .delete(format!("http://{addr}/api/users/{root}/avatar"))
        .bearer_auth(&ed_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let form = file_form("avatar", "ed.png", "image/png", png_bytes(40, 40));
    assert_eq!(upload(&client, addr, root, &ed_token, form).await.status(), 403);
    assert_eq!(std::fs::read_dir(h.uploads.path()).unwrap().count(), 1);

    let resp = client
        .get(format!("http://{addr}/api/users/{root}/avatar"))
        .bearer_auth(&ed_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("view this user's avatar"), "{message}");
}

#[tokio::test]
async fn replacing_an_upload_removes_the_old_file() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "one.png", "image/png", png_bytes(40, 40));
    let first: serde_json::Value = upload(&client, addr, ann, &token, form).await.json().await.unwrap();
    let form = file_form("avatar", "two.png", "image/png", png_bytes(40, 40));
    let second: serde_json::Value = upload(&client, addr, ann, &token, form).await.json().await.unwrap();

    let first_name = first["source"].as_str().unwrap().trim_start_matches("/uploads/");
    let second_name = second["source"].as_str().unwrap().trim_start_matches("/uploads/");
    assert_ne!(first_name, second_name);
    assert!(!h.uploads.path().join(first_name).exists());
    assert!(h.uploads.path().join(second_name).exists());
}

#[tokio::test]
async fn rejected_uploads() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    for (name, mime, bytes) in [
        ("shell.php.png", "image/png", png_bytes(10, 10)),
        ("me.gif", "image/gif", png_bytes(10, 10)),
        ("notes.txt", "text/plain", b"hello".to_vec()),
    ] {
        let resp = upload(&client, addr, ann, &token, file_form("avatar", name, mime, bytes)).await;
        assert_eq!(resp.status(), 400, "{name}");
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["code"], "validation_error");
    }
    assert_eq!(std::fs::read_dir(h.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn rating_only_submission_needs_existing_avatar() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("rating", "R");
    assert_eq!(upload(&client, addr, ann, &token, form).await.status(), 400);

    let form = file_form("avatar", "me.png", "image/png", png_bytes(30, 30));
    assert_eq!(upload(&client, addr, ann, &token, form).await.status(), 201);

    let form = reqwest::multipart::Form::new().text("rating", "R");
    let resp = upload(&client, addr, ann, &token, form).await;
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["rating"], "R");
}

#[tokio::test]
async fn unknown_rating_is_stored_as_g() {
    let (h, addr) = TestHarness::with_server().await;
    let (ann, token) = h.create_user("ann", "subscriber");
    let client = reqwest::Client::new();

    let json: serde_json::Value = client
        .put(format!("http://{addr}/api/users/{ann}/avatar/rating"))
        .bearer_auth(&token)
        .json(&serde_json::json!({"rating": "NC-17"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["rating"], "G");
}

#[tokio::test]
async fn restricted_uploads_need_author_role() {
    let mut config = Config::default();
    config.avatars.restrict_uploads = true;
    let (h, addr) = TestHarness::with_server_config(config).await;
    let (sub, sub_token) = h.create_user("sub", "subscriber");
    let (ann, ann_token) = h.create_user("ann", "author");
    let client = reqwest::Client::new();

    let form = file_form("avatar", "me.png", "image/png", png_bytes(10, 10));
    assert_eq!(upload(&client, addr, sub, &sub_token, form).await.status(), 403);
    let form = file_form("avatar", "me.png", "image/png", png_bytes(10, 10));
    assert_eq!(upload(&client, addr, ann, &ann_token, form).await.status(), 201);
}
