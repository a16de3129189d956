//! End-to-end scrape tests against a mock store directory

use std::path::Path;
use store_walker::config::{validate, Config, DriverKind};
use store_walker::crawler::scrape;
use store_walker::output::{read_csv, read_json};
use store_walker::{StoreRecord, WalkerError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast, deterministic configuration pointed at the mock server
fn create_test_config(root_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.target.root_url = root_url.to_string();
    config.browser.driver = DriverKind::Markup;
    config.browser.timeout_ms = 2_000;
    config.browser.human_emulation = false;
    config.crawler.max_concurrent = 2;
    config.crawler.retry_attempts = 3;
    config.crawler.backoff_min_secs = 0.0;
    config.crawler.backoff_max_secs = 0.0;
    config.output.csv_path = dir.join("stores.csv").display().to_string();
    config.output.json_path = dir.join("stores.json").display().to_string();
    validate(&config).expect("test config should be valid");
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn state_links(states: &[(&str, &str)]) -> String {
    states
        .iter()
        .map(|(href, name)| {
            format!(
                r#"<div class="view_stateName__CzKvV"><a class="view_stateNameLink__qdJ1N" href="{}">{}</a></div>"#,
                href, name
            )
        })
        .collect()
}

fn city_links(cities: &[(&str, &str)]) -> String {
    cities
        .iter()
        .map(|(href, name)| {
            format!(
                r#"<div class="view_cityName__vSrti"><a class="view_cityNameLink__O_Xez" href="{}">{}</a></div>"#,
                href, name
            )
        })
        .collect()
}

fn store_titles(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| {
            format!(
                r#"<div class="card"><h3 class="styles_storeCardTitle__VFoDj">{}<span>Open until 10pm</span></h3></div>"#,
                name
            )
        })
        .collect()
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn record(state: &str, city: &str, stores: &str) -> StoreRecord {
    StoreRecord {
        state: state.to_string(),
        city: city.to_string(),
        stores: stores.to_string(),
    }
}

#[tokio::test]
async fn test_ohio_directory_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/directory", html(&state_links(&[("/directory/oh", "Ohio")]))).await;
    mount_page(
        &server,
        "/directory/oh",
        html(&city_links(&[
            ("/directory/oh/columbus", "Columbus"),
            ("/directory/oh/dayton", "Dayton"),
        ])),
    )
    .await;
    mount_page(
        &server,
        "/directory/oh/columbus",
        html(&store_titles(&["Target Columbus 1", "Target Columbus 2"])),
    )
    .await;
    mount_page(&server, "/directory/oh/dayton", html("<p>Coming soon</p>")).await;

    let config = create_test_config(&format!("{}/directory", server.uri()), dir.path());
    let summary = scrape(config).await.unwrap();

    assert_eq!(summary.states, 1);
    assert_eq!(summary.cities, 2);
    assert_eq!(summary.records, 1);
    assert_eq!(summary.failed_cities, 0);

    let expected = vec![record(
        "Ohio",
        "Columbus",
        "Target Columbus 1, Target Columbus 2",
    )];
    assert_eq!(read_csv(&dir.path().join("stores.csv")).unwrap(), expected);
    assert_eq!(read_json(&dir.path().join("stores.json")).unwrap(), expected);

    let csv = std::fs::read_to_string(dir.path().join("stores.csv")).unwrap();
    assert!(csv.starts_with("State,City,Stores\n"));
}

#[tokio::test]
async fn test_both_layouts_across_states_in_walk_order() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/directory",
        html(&state_links(&[("/directory/al", "Alabama"), ("/directory/oh", "Ohio")])),
    )
    .await;
    mount_page(
        &server,
        "/directory/al",
        html(&city_links(&[
            ("/directory/al/auburn", "Auburn"),
            ("/directory/al/hoover", "Hoover"),
            ("/directory/al/mobile", "Mobile"),
        ])),
    )
    .await;
    mount_page(
        &server,
        "/directory/al/auburn",
        html(&store_titles(&["Auburn"])),
    )
    .await;
    mount_page(
        &server,
        "/directory/al/hoover",
        html(
            r#"<span class="styles_storeInfo__duma6">Target<br>Hoover Galleria, 2780 John Hawkins Pkwy</span>
               <span class="styles_storeInfo__duma6">Target<br>Hoover Patton Creek, 4421 Creekside Ave</span>"#,
        ),
    )
    .await;
    mount_page(
        &server,
        "/directory/al/mobile",
        html(&store_titles(&["Mobile West"])),
    )
    .await;
    mount_page(
        &server,
        "/directory/oh",
        html(&city_links(&[("/directory/oh/akron", "Akron")])),
    )
    .await;
    mount_page(
        &server,
        "/directory/oh/akron",
        html(&store_titles(&["Akron", "Akron North"])),
    )
    .await;

    let config = create_test_config(&format!("{}/directory", server.uri()), dir.path());
    let summary = scrape(config).await.unwrap();

    assert_eq!(summary.states, 2);
    assert_eq!(summary.cities, 4);

    let expected = vec![
        record("Alabama", "Auburn", "Auburn"),
        record("Alabama", "Hoover", "Hoover Galleria, Hoover Patton Creek"),
        record("Alabama", "Mobile", "Mobile West"),
        record("Ohio", "Akron", "Akron, Akron North"),
    ];
    assert_eq!(read_csv(&dir.path().join("stores.csv")).unwrap(), expected);
    assert_eq!(read_json(&dir.path().join("stores.json")).unwrap(), expected);
}

#[tokio::test]
async fn test_root_failure_writes_no_output() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/directory", ResponseTemplate::new(503)).await;

    let config = create_test_config(&format!("{}/directory", server.uri()), dir.path());
    let err = scrape(config).await.unwrap_err();

    assert!(matches!(err, WalkerError::NoStates { .. }));
    assert!(!dir.path().join("stores.csv").exists());
    assert!(!dir.path().join("stores.json").exists());

    // Every attempt hit the root page
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_transient_server_error_recovered_by_retry() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/directory", html(&state_links(&[("/directory/oh", "Ohio")]))).await;
    mount_page(
        &server,
        "/directory/oh",
        html(&city_links(&[("/directory/oh/columbus", "Columbus")])),
    )
    .await;

    // First request fails, later ones fall through to the healthy page
    Mock::given(method("GET"))
        .and(path("/directory/oh/columbus"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/directory/oh/columbus",
        html(&store_titles(&["Target Columbus 1"])),
    )
    .await;

    let config = create_test_config(&format!("{}/directory", server.uri()), dir.path());
    let summary = scrape(config).await.unwrap();

    assert_eq!(summary.records, 1);
    assert_eq!(
        read_csv(&dir.path().join("stores.csv")).unwrap(),
        vec![record("Ohio", "Columbus", "Target Columbus 1")]
    );
}

#[tokio::test]
async fn test_unreachable_state_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/directory",
        html(&state_links(&[("/directory/gone", "Atlantis"), ("/directory/oh", "Ohio")])),
    )
    .await;
    mount_page(&server, "/directory/gone", ResponseTemplate::new(404)).await;
    mount_page(
        &server,
        "/directory/oh",
        html(&city_links(&[("/directory/oh/dayton", "Dayton")])),
    )
    .await;
    mount_page(
        &server,
        "/directory/oh/dayton",
        html(&store_titles(&["Dayton South"])),
    )
    .await;

    let config = create_test_config(&format!("{}/directory", server.uri()), dir.path());
    let summary = scrape(config).await.unwrap();

    assert_eq!(summary.states, 2);
    assert_eq!(summary.cities, 1);
    assert_eq!(
        read_json(&dir.path().join("stores.json")).unwrap(),
        vec![record("Ohio", "Dayton", "Dayton South")]
    );
}
