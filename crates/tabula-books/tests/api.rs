//! End-to-end calls against the books API through the in-process client.

use serde_json::{json, Value};
use tabula_books::errors::{BOOKS_NOT_FOUND, BOOK_NOT_FOUND, ISBN_INVALID, ISBN_TAKEN};
use tabula_books::BooksApp;
use tabula_config::TabulaConfig;
use tabula_core::codes;
use tabula_test::{TestClient, TestResponse};

fn app_with(config: TabulaConfig) -> TestClient {
    let app = BooksApp::seeded(config).unwrap();
    TestClient::new(app.dispatcher())
}

fn client() -> TestClient {
    app_with(TabulaConfig::default())
}

async fn open_session(client: &TestClient, user_id: i64) -> Value {
    let response = client
        .post("sessions")
        .json(&json!({"language_code": "en", "user_id": user_id}))
        .send()
        .await;
    response.assert_ok();
    response.result()
}

fn token(session_info: &Value, kind: &str) -> String {
    session_info["tokens"][kind]["value"]
        .as_str()
        .unwrap()
        .to_string()
}

fn titles(response: &TestResponse) -> Vec<String> {
    response.result()["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_books_defaults() {
    let response = client().get("books").send().await;
    response
        .assert_ok()
        .assert_json_field("result.selection_data.total_amount", &json!(14))
        .assert_json_field("result.selection_data.page", &json!(1))
        .assert_json_field("result.selection_data.sort_by", &json!("id"))
        .assert_json_field("result.selection_data.sort_direction", &json!("DESC"))
        .assert_json_field("result.books.0.id", &json!(14))
        .assert_json_field("result.books.0.title", &json!("Шестерка воронов"));
    assert_eq!(titles(&response).len(), 14);
}

#[tokio::test]
async fn test_list_books_filters() {
    let client = client();

    let by_author = client.get("books").query("query", "яррос").send().await;
    by_author.assert_ok();
    assert_eq!(
        titles(&by_author),
        vec!["Четвертое крыло", "Железное пламя"]
    );

    let by_year = client.get("books").query("year_published", 2021).send().await;
    by_year
        .assert_ok()
        .assert_json_field("result.selection_data.total_amount", &json!(3));

    client
        .get("books")
        .query("query", "no such book")
        .send()
        .await
        .assert_error_codes(&[BOOKS_NOT_FOUND]);
}

#[tokio::test]
async fn test_list_books_sorting_and_paging() {
    let client = client();
    let first = client
        .get("books")
        .query("sort_by", "title")
        .query("sort_direction", "asc")
        .query("limit", 1)
        .send()
        .await;
    first
        .assert_ok()
        .assert_json_field("result.selection_data.pages_total", &json!(14));
    assert_eq!(titles(&first), vec!["1984"]);

    let second = client
        .get("books")
        .query("sort_by", "title")
        .query("sort_direction", "asc")
        .query("limit", 1)
        .query("page", 2)
        .send()
        .await;
    assert_eq!(titles(&second), vec!["451 градус по Фаренгейту"]);
}

#[tokio::test]
async fn test_invalid_year_is_rejected() {
    client()
        .get("books")
        .query("year_published", "soon")
        .send()
        .await
        .assert_error_codes(&[codes::INVALID_INTEGER]);
}

#[tokio::test]
async fn test_get_book_by_id() {
    let client = client();
    client
        .get("books/1")
        .send()
        .await
        .assert_ok()
        .assert_json_field("result.title", &json!("Железное пламя"))
        .assert_json_field("result.isbn", &json!("9785353109105"))
        .assert_json_field("result.year_published", &json!(2022));

    client
        .get("books/999")
        .send()
        .await
        .assert_error_codes(&[BOOK_NOT_FOUND])
        .assert_json_field("errors.0.input_field", &json!("id"));
}

#[tokio::test]
async fn test_anonymous_write_refused() {
    client()
        .post("books")
        .json(&json!({"title": "Dune", "author": "Frank Herbert", "isbn": "9780441013593"}))
        .send()
        .await
        .assert_error_codes(&[codes::USERS_ONLY]);
}

#[tokio::test]
async fn test_create_book() {
    let client = client();
    let info = open_session(&client, 2).await;
    let client = client.with_token(token(&info, "access_token"));

    let created = client
        .post("books")
        .json(&json!({"title": " Dune ", "author": "Frank Herbert", "isbn": "978-0-441-01359-3"}))
        .send()
        .await;
    created
        .assert_ok()
        .assert_json_field("result.id", &json!(15))
        .assert_json_field("result.title", &json!("Dune"))
        .assert_json_field("result.isbn", &json!("9780441013593"))
        .assert_json_field("result.year_published", &Value::Null);
    assert!(created.result()["created_at"].is_i64());

    client
        .post("books")
        .json(&json!({"title": "Dune", "author": "Herbert", "isbn": "9780441013593"}))
        .send()
        .await
        .assert_error_codes(&[ISBN_TAKEN]);

    client
        .post("books")
        .json(&json!({"title": "Dune", "author": "Herbert", "isbn": "978-5-17-108154-7"}))
        .send()
        .await
        .assert_error_codes(&[ISBN_INVALID])
        .assert_json_field("errors.0.input_field", &json!("isbn"));
}

#[tokio::test]
async fn test_create_book_missing_fields() {
    let client = client();
    let info = open_session(&client, 2).await;
    let response = client
        .with_token(token(&info, "access_token"))
        .post("books")
        .json(&json!({"year_published": 1965}))
        .send()
        .await;

    let mut found = response.error_codes();
    found.sort_unstable();
    assert_eq!(found, vec![3002, 3003, 3004]);
}

#[tokio::test]
async fn test_update_book() {
    let client = client();
    let info = open_session(&client, 1).await;
    let client = client.with_token(token(&info, "access_token"));

    client
        .put("books/1")
        .json(&json!({"title": "Iron Flame", "clear_year_published": true, "year_published": 2000}))
        .send()
        .await
        .assert_ok()
        .assert_json_field("result.title", &json!("Iron Flame"))
        .assert_json_field("result.author", &json!("Ребекка Яррос"))
        .assert_json_field("result.year_published", &Value::Null);

    client
        .put("books/1")
        .json(&json!({"isbn": "978-5-353-10910-5"}))
        .send()
        .await
        .assert_ok();

    client
        .put("books/1")
        .json(&json!({"isbn": "978-5-17-108154-6"}))
        .send()
        .await
        .assert_error_codes(&[ISBN_TAKEN]);

    client
        .put("books/999")
        .json(&json!({"title": "Nothing"}))
        .send()
        .await
        .assert_error_codes(&[BOOK_NOT_FOUND]);
}

#[tokio::test]
async fn test_delete_book() {
    let client = client();
    let info = open_session(&client, 2).await;
    let client = client.with_token(token(&info, "access_token"));

    client
        .delete("books/3")
        .send()
        .await
        .assert_ok()
        .assert_result(&Value::Null);
    client
        .get("books/3")
        .send()
        .await
        .assert_error_codes(&[BOOK_NOT_FOUND]);
    client
        .delete("books/3")
        .send()
        .await
        .assert_error_codes(&[BOOK_NOT_FOUND]);
}

#[tokio::test]
async fn test_session_info() {
    let client = client();

    client
        .get("sessions/info")
        .send()
        .await
        .assert_ok()
        .assert_json_field("result.user", &Value::Null)
        .assert_json_field("result.tokens", &Value::Null)
        .assert_json_field("result.session.language_code", &json!("ru"))
        .assert_json_field("result.timezone", &json!("UTC"));

    let opened = open_session(&client, 2).await;
    assert_eq!(opened["session"]["language_code"], json!("en"));
    assert_eq!(opened["user"]["username"], json!("reader"));

    let response = client
        .get("sessions/info")
        .bearer_token(token(&opened, "access_token"))
        .send()
        .await;
    response
        .assert_ok()
        .assert_json_field("result.user.id", &json!(2))
        .assert_json_field("result.user.phone_number", &json!("+77010000002"))
        .assert_json_field("result.user.is_online", &json!(true))
        .assert_json_field("result.session.language_code", &json!("en"));
}

#[tokio::test]
async fn test_unknown_user_gets_anonymous_session() {
    let info = open_session(&client(), 404).await;
    assert_eq!(info["user"], Value::Null);
    assert!(info["tokens"]["access_token"]["value"].is_string());
}

#[tokio::test]
async fn test_invalid_language_code() {
    client()
        .post("sessions")
        .json(&json!({"language_code": "fr"}))
        .send()
        .await
        .assert_error_codes(&[codes::INVALID_ENUM_VALUE]);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let client = client();
    let info = open_session(&client, 2).await;
    let access = token(&info, "access_token");
    let refresh = token(&info, "refresh_token");

    // A refresh token only works for the refresh method.
    client
        .post("books")
        .bearer_token(&refresh)
        .json(&json!({"title": "X", "author": "Y", "isbn": "9780441013593"}))
        .send()
        .await
        .assert_error_codes(&[codes::TOKEN_EXPIRED]);

    let refreshed = client
        .post("tokens/refresh")
        .bearer_token(&refresh)
        .send()
        .await;
    refreshed.assert_ok();
    let new_access = refreshed.result()["access_token"]["value"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(new_access, access);

    // The old pair is revoked, so the old token runs anonymously.
    client
        .get("sessions/info")
        .bearer_token(&access)
        .send()
        .await
        .assert_json_field("result.user", &Value::Null);
    client
        .get("sessions/info")
        .bearer_token(&new_access)
        .send()
        .await
        .assert_json_field("result.user.id", &json!(2));
}

#[tokio::test]
async fn test_refresh_without_session() {
    client()
        .post("tokens/refresh")
        .send()
        .await
        .assert_error_codes(&[codes::TOKEN_EXPIRED]);
}

#[tokio::test]
async fn test_expired_access_token() {
    let mut config = TabulaConfig::default();
    config.auth.access_token_ttl_secs = 0;
    let client = app_with(config);
    let info = open_session(&client, 2).await;
    let access = token(&info, "access_token");

    client
        .get("sessions/info")
        .bearer_token(&access)
        .send()
        .await
        .assert_error_codes(&[codes::TOKEN_EXPIRED]);
    client
        .post("tokens/refresh")
        .bearer_token(&access)
        .send()
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_error_descriptions() {
    client()
        .get("books/999")
        .send()
        .await
        .assert_json_field("errors.0.description.ru", &json!("Книга не найдена"))
        .assert_json_field("errors.0.description.en", &json!("Book not found"));
}
