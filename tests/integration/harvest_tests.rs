//! Harvest driver runs: database, CSV artifacts and report together

use crate::listing_page;
use review_harvest::config::Config;
use review_harvest::harvest::Harvester;
use review_harvest::storage::{RunStatus, Storage};
use review_harvest::{HarvestError, StopReason};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harvest_config(dir: &Path, base_url: &str) -> Config {
    let toml = format!(
        r#"
[collector]
target = 50
max-attempts-per-batch = 2
stagnation-limit = 2
checkpoint-every = 1
backoff-ms = [1, 2]
settle-timeout-ms = 50
poll-interval-ms = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{dir}/reviews.db"
csv-dir = "{dir}/csv"
summary-path = "{dir}/report.md"

[[source]]
name = "good"
url-template = "{base}/good?page={{page}}"
item-selector = "li.review"
content-selector = "p.body"
date-selector = ".date"
rating-selector = ".stars"
rating-attr = "data-score"
id-attr = "data-review-id"

[[source]]
name = "broken"
url-template = "{base}/broken?page={{page}}"
item-selector = "li.review"
content-selector = "p.body"
"#,
        dir = dir.display(),
        base = base_url
    );
    toml::from_str(&toml).unwrap()
}

async fn serve_good_source(server: &MockServer) {
    for (page, body) in [
        ("1", listing_page(&[("1", "5", "Loved it"), ("2", "3", "Okay, \"fine\"")], false)),
        ("2", listing_page(&[("3", "4", "Would buy again")], false)),
        ("3", listing_page(&[], false)),
    ] {
        Mock::given(method("GET"))
            .and(path("/good"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_harvest_all_sources() {
    let server = MockServer::start().await;
    serve_good_source(&server).await;
    let dir = TempDir::new().unwrap();

    let config = harvest_config(dir.path(), &server.uri());
    let mut harvester = Harvester::new(config, "cafebabe".to_string()).unwrap();
    let report = harvester.run(None).await.unwrap();

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.failed_sources(), 1);

    let good = &report.sources[0];
    assert_eq!(good.status, RunStatus::Completed);
    assert_eq!(good.stop_reason, StopReason::SourceExhausted);
    assert_eq!(good.collected, 3);
    assert_eq!(good.inserted, 3);

    let broken = &report.sources[1];
    assert_eq!(broken.status, RunStatus::Failed);
    assert_eq!(broken.stop_reason, StopReason::Error);
    assert!(broken.error.as_deref().unwrap().contains("broken"));
    assert!(broken.csv_path.is_none());

    // Run history
    let run = harvester.storage().get_latest_run("good").unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "cafebabe");
    assert_eq!(run.collected, 3);
    let run = harvester.storage().get_latest_run("broken").unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);

    // CSV artifact
    let csv = std::fs::read(dir.path().join("csv").join("reviews_good.csv")).unwrap();
    assert!(csv.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(csv[3..].to_vec()).unwrap();
    assert_eq!(
        text,
        "rating,date,content\n\
         5,2024-05-01,Loved it\n\
         3,2024-05-01,\"Okay, \"\"fine\"\"\"\n\
         4,2024-05-01,Would buy again\n"
    );

    // Report
    let md = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(md.contains("| good | completed | source exhausted | 3 / 50 | 3 | 0 |"));
    assert!(md.contains("**broken**"));
}

#[tokio::test]
async fn test_rerun_keeps_database_insert_only() {
    let server = MockServer::start().await;
    serve_good_source(&server).await;
    let dir = TempDir::new().unwrap();

    for expected_new in [3, 0] {
        let config = harvest_config(dir.path(), &server.uri());
        let mut harvester = Harvester::new(config, "hash".to_string()).unwrap();
        let report = harvester.run(Some("good")).await.unwrap();

        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].collected, 3);
        assert_eq!(report.sources[0].inserted, expected_new);
        assert_eq!(report.sources[0].already_present, 3 - expected_new);
        assert_eq!(harvester.storage().count_total_records().unwrap(), 3);
    }
}

#[tokio::test]
async fn test_failed_run_does_not_claim_earlier_artifact() {
    let server = MockServer::start().await;
    serve_good_source(&server).await;
    let dir = TempDir::new().unwrap();

    let stale = dir.path().join("csv").join("reviews_broken.csv");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "rating,date,content\n5,2024-01-01,from last week\n").unwrap();

    let config = harvest_config(dir.path(), &server.uri());
    let mut harvester = Harvester::new(config, "hash".to_string()).unwrap();
    let report = harvester.run(None).await.unwrap();

    let good = &report.sources[0];
    assert!(good.csv_path.as_deref().unwrap().ends_with("reviews_good.csv"));

    let broken = &report.sources[1];
    assert_eq!(broken.status, RunStatus::Failed);
    assert!(broken.csv_path.is_none());
    // Left untouched
    assert!(std::fs::read_to_string(&stale)
        .unwrap()
        .contains("from last week"));

    let md = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(!md.contains("reviews_broken.csv"));
}

#[tokio::test]
async fn test_export_csv_from_database() {
    let server = MockServer::start().await;
    serve_good_source(&server).await;
    let dir = TempDir::new().unwrap();

    let config = harvest_config(dir.path(), &server.uri());
    let mut harvester = Harvester::new(config, "hash".to_string()).unwrap();
    harvester.run(Some("good")).await.unwrap();

    let artifact = dir.path().join("csv").join("reviews_good.csv");
    std::fs::remove_file(&artifact).unwrap();

    let written = harvester.export_csv(Some("good")).unwrap();
    assert_eq!(written, vec![(artifact.clone(), 3)]);
    assert!(std::fs::read_to_string(&artifact)
        .unwrap()
        .contains("Would buy again"));
}

#[tokio::test]
async fn test_unknown_source_filter() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(dir.path(), "http://127.0.0.1:9");
    let mut harvester = Harvester::new(config, "hash".to_string()).unwrap();

    let err = harvester.run(Some("nope")).await.unwrap_err();
    assert!(matches!(err, HarvestError::UnknownSource(name) if name == "nope"));
}
