use legis_tracker::bills::Chamber;
use legis_tracker::config::FeedConfig;
use legis_tracker::feed::{BillFeed, FeedError, LegisInfoClient, SessionPage};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LegisInfoClient {
    LegisInfoClient::new(&FeedConfig {
        url: format!("{}/legisinfo/en/bills/json", server.uri()),
        request_timeout: Duration::from_secs(5),
    })
    .expect("client builds")
}

#[tokio::test]
async fn fetches_and_decodes_the_current_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legisinfo/en/bills/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "BillNumberFormatted": "S-209",
                "ParlSessionCode": "44-1",
                "LongTitleEn": "An Act to amend the Criminal Code",
                "CurrentStatusEn": "At second reading in the Senate",
                "CurrentStatusId": "60040",
                "OriginatingChamberId": 2,
                "Publications": [{}]
            },
            { "LongTitleEn": "Missing identity" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let batch = client_for(&server)
        .fetch_current()
        .await
        .expect("listing fetched");

    assert_eq!(batch.bills.len(), 1);
    assert_eq!(batch.dropped, 1);
    let bill = &batch.bills[0];
    assert_eq!(bill.key().to_string(), "44-1-S-209");
    assert_eq!(bill.chamber, Chamber::Senate);
    assert_eq!(bill.publication_count, 1);
}

#[tokio::test]
async fn session_pages_are_requested_by_session_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legisinfo/en/bills/json"))
        .and(query_param("parlsession", "42-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "BillNumberFormatted": "C-45", "ParlSessionCode": "42-1" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/legisinfo/en/bills/json"))
        .and(query_param("parlsession", "42-2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.fetch_session(42, 1).await.expect("session fetched") {
        SessionPage::Found(batch) => assert_eq!(batch.bills[0].bill_id, "C-45"),
        SessionPage::NotFound => panic!("session 42-1 should exist"),
    }
    assert_eq!(
        client.fetch_session(42, 2).await.expect("404 is not an error"),
        SessionPage::NotFound
    );
}

#[tokio::test]
async fn server_errors_surface_as_status_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_current()
        .await
        .expect_err("502 fails the fetch");
    assert!(matches!(err, FeedError::Status { status: 502, .. }));
}

#[tokio::test]
async fn undecodable_bodies_are_decode_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<Bills></Bills>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_session(35, 1)
        .await
        .expect_err("xml is not json");
    assert!(matches!(err, FeedError::Decode(_)));
}

#[tokio::test]
async fn unreachable_hosts_are_http_failures() {
    let client = LegisInfoClient::new(&FeedConfig {
        url: "http://127.0.0.1:9/bills/json".to_string(),
        request_timeout: Duration::from_millis(500),
    })
    .expect("client builds");

    let err = client.fetch_current().await.expect_err("nothing listens on port 9");
    assert!(matches!(err, FeedError::Http { .. }));
}
