//! Compare commit listing strategies against a mocked GitHub API.

use ghapi::{CommitListing, CompareStatus, GitHubClient, Repository};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPARE_PATH: &str = "/repos/o/r/compare/main...feature";

async fn repository(server: &MockServer) -> Repository {
    Mock::given(method("GET"))
        .and(path("/repos/o/r"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "name": "r",
            "full_name": "o/r",
            "owner": {"login": "o", "id": 10}
        })))
        .mount(server)
        .await;

    let client = GitHubClient::new(None, &server.uri()).unwrap();
    client.get_repository("o", "r").await.unwrap()
}

fn compare_json(server: &MockServer, shas: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "url": format!("{}{COMPARE_PATH}", server.uri()),
        "status": "ahead",
        "ahead_by": 3,
        "behind_by": 0,
        "total_commits": 3,
        "base_commit": {"sha": "base"},
        "merge_base_commit": {"sha": "base"},
        "commits": shas.iter().map(|sha| serde_json::json!({"sha": sha})).collect::<Vec<_>>(),
        "files": [{"filename": "README.md", "status": "modified", "additions": 1}]
    })
}

#[tokio::test]
async fn test_legacy_listing_reads_embedded_commits() {
    let server = MockServer::start().await;
    let repo = repository(&server).await;

    Mock::given(method("GET"))
        .and(path(COMPARE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(compare_json(&server, &["a", "b", "c"])))
        .expect(1)
        .mount(&server)
        .await;

    let compare = repo.get_compare("main", "feature").await.unwrap();
    assert_eq!(compare.status, CompareStatus::Ahead);
    assert_eq!(compare.listing(), CommitListing::LegacyArray);
    assert_eq!(compare.files.len(), 1);

    let commits = compare.commits().await.unwrap();
    let shas: Vec<_> = commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, vec!["a", "b", "c"]);
    assert!(commits.iter().all(|c| c.owner().is_ok()));
    assert!(compare.base_commit.owner().is_ok());
    assert!(compare.merge_base_commit.owner().is_ok());
}

#[tokio::test]
async fn test_paginated_listing_pages_through_compare_endpoint() {
    let server = MockServer::start().await;
    let repo = repository(&server).await;
    let page_two = format!("{}{COMPARE_PATH}?per_page=2&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path(COMPARE_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(compare_json(&server, &["c"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(COMPARE_PATH))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(compare_json(&server, &["a", "b"]))
                .insert_header("link", format!("<{page_two}>; rel=\"next\"").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    // The initial comparison, fetched without paging parameters
    Mock::given(method("GET"))
        .and(path(COMPARE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(compare_json(&server, &["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;

    let compare = repo.get_compare_with("main", "feature", true).await.unwrap();
    assert_eq!(compare.listing(), CommitListing::Paginated);

    let seq = compare.list_commits().unwrap();
    assert_eq!(seq.page_size(), 10);

    let commits = seq.with_page_size(2).unwrap().to_list().await.unwrap();
    let shas: Vec<_> = commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, vec!["a", "b", "c"]);
    assert!(commits.iter().all(|c| c.owner().is_ok()));
}
