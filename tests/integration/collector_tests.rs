//! Collector runs against mock listings

use crate::{fast_options, listing_page, source_config, user_agent};
use review_harvest::collector::{CollectError, HttpPagedSource, PaginatedCollector};
use review_harvest::storage::{MemorySink, SqliteStorage, Storage};
use review_harvest::StopReason;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_collects_until_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[("1", "5", "Great"), ("2", "4", "Good")], false)).await;
    mount_page(&server, 2, listing_page(&[("3", "3", "Fine"), ("4", "2", "Meh")], false)).await;
    mount_page(&server, 3, listing_page(&[("5", "1", "Bad")], false)).await;
    mount_page(&server, 4, listing_page(&[], false)).await;

    let source = HttpPagedSource::new(source_config(&server.uri(), None), user_agent()).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let result = PaginatedCollector::new(source, fast_options())
        .with_sink(&mut storage)
        .run(100, 3, 3)
        .await
        .unwrap();

    assert_eq!(result.stopped_reason, StopReason::SourceExhausted);
    assert!(!result.reached_target);
    assert_eq!(result.records.len(), 5);
    assert_eq!(result.records[0].content, "Great");
    assert_eq!(result.records[0].date_string(), "2024-05-01");
    assert_eq!(result.records[4].rating.to_string(), "1");

    assert_eq!(result.persisted.inserted, 5);
    assert_eq!(storage.count_total_records().unwrap(), 5);
    let stored = storage.load_records("mockshop").unwrap();
    assert_eq!(stored[1].content, "Good");
    assert_eq!(stored[1].rating, "4");
}

#[tokio::test]
async fn test_second_run_inserts_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[("1", "5", "Great"), ("2", "4", "Good")], false)).await;
    mount_page(&server, 2, listing_page(&[], false)).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();

    for expected_new in [2, 0] {
        let source =
            HttpPagedSource::new(source_config(&server.uri(), None), user_agent()).unwrap();
        let result = PaginatedCollector::new(source, fast_options())
            .with_sink(&mut storage)
            .run(10, 2, 2)
            .await
            .unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.persisted.inserted, expected_new);
        assert_eq!(result.persisted.already_present, 2 - expected_new);
    }

    assert_eq!(storage.count_total_records().unwrap(), 2);
}

#[tokio::test]
async fn test_target_stops_before_next_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[("1", "5", "a"), ("2", "5", "b"), ("3", "5", "c")], true)).await;
    mount_page(&server, 2, listing_page(&[("4", "5", "d"), ("5", "5", "e"), ("6", "5", "f")], true)).await;

    Mock::given(method("GET"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source =
        HttpPagedSource::new(source_config(&server.uri(), Some("a.next")), user_agent()).unwrap();
    let result = PaginatedCollector::new(source, fast_options())
        .run(5, 3, 3)
        .await
        .unwrap();

    assert_eq!(result.stopped_reason, StopReason::TargetReached);
    assert!(result.reached_target);
    let contents: Vec<_> = result.records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_missing_next_marker_ends_collection() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[("1", "5", "first")], true)).await;
    mount_page(&server, 2, listing_page(&[("2", "5", "last")], false)).await;

    Mock::given(method("GET"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source =
        HttpPagedSource::new(source_config(&server.uri(), Some("a.next")), user_agent()).unwrap();
    let mut collector = PaginatedCollector::new(source, fast_options());
    let result = collector.run(10, 3, 3).await.unwrap();

    assert_eq!(result.stopped_reason, StopReason::SourceExhausted);
    assert_eq!(result.records.len(), 2);
    assert_eq!(collector.source().current_page(), 2);
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[("1", "5", "before")], false)).await;

    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(&server, 2, listing_page(&[("2", "5", "after")], false)).await;
    mount_page(&server, 3, listing_page(&[], false)).await;

    let source = HttpPagedSource::new(source_config(&server.uri(), None), user_agent()).unwrap();
    let result = PaginatedCollector::new(source, fast_options())
        .run(10, 3, 3)
        .await
        .unwrap();

    let contents: Vec<_> = result.records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["before", "after"]);
    assert_eq!(result.stopped_reason, StopReason::SourceExhausted);
}

#[tokio::test]
async fn test_repeating_listing_stagnates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[("1", "5", "same"), ("2", "4", "again")], false)),
        )
        .mount(&server)
        .await;

    let source = HttpPagedSource::new(source_config(&server.uri(), None), user_agent()).unwrap();
    let result = PaginatedCollector::new(source, fast_options())
        .run(10, 2, 2)
        .await
        .unwrap();

    assert_eq!(result.stopped_reason, StopReason::Stagnation);
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.batches, 3);
}

#[tokio::test]
async fn test_unreachable_first_page_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = HttpPagedSource::new(source_config(&server.uri(), None), user_agent()).unwrap();
    let mut sink = MemorySink::new();
    let err = PaginatedCollector::new(source, fast_options())
        .with_sink(&mut sink)
        .run(10, 2, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, CollectError::SourceInit { .. }));
    assert!(sink.is_empty());
}
