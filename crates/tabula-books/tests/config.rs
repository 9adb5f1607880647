//! The service assembled from a configuration file.

use serde_json::json;
use std::io::Write;
use tabula_books::errors::BOOK_NOT_FOUND;
use tabula_books::BooksApp;
use tabula_config::ConfigLoader;
use tabula_test::TestClient;

fn app_from_toml(content: &str) -> BooksApp {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{content}").unwrap();
    let config = ConfigLoader::new()
        .with_defaults()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    BooksApp::seeded(config).unwrap()
}

#[tokio::test]
async fn test_limit_max_from_file() {
    let app = app_from_toml(
        r#"
[api]
limit_max = 5
"#,
    );
    let client = TestClient::new(app.dispatcher());

    client
        .get("books")
        .query("limit", 100)
        .send()
        .await
        .assert_ok()
        .assert_json_field("result.selection_data.limit", &json!(5))
        .assert_json_field("result.selection_data.pages_total", &json!(3));
}

#[tokio::test]
async fn test_locale_and_base_path_from_file() {
    let app = app_from_toml(
        r#"
[server]
base_path = "/library"

[api]
default_locale = "en"
"#,
    );
    assert_eq!(app.server().settings().http_addr, "0.0.0.0:8080");
    assert_eq!(app.dispatcher().config().base_path, "/library");

    let client = TestClient::new(app.dispatcher());
    client
        .get("books/999")
        .send()
        .await
        .assert_error_codes(&[BOOK_NOT_FOUND])
        .assert_json_field("errors.0.description.en", &json!("Book not found"));
    client
        .get("sessions/info")
        .send()
        .await
        .assert_json_field("result.session.language_code", &json!("en"));
}
