//! Commit population and content round trips against a mocked GitHub API.

use std::sync::Arc;

use ghapi::{EntityState, GitHubClient, Repository};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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

#[tokio::test]
async fn test_listed_commit_is_populated_once() {
    let server = MockServer::start().await;
    let repo = repository(&server).await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "sha": "abc123",
            "commit": {"message": "Fix bug"},
            "author": {"login": "octocat", "id": 1},
            "parents": [{"sha": "def456"}]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": "abc123",
            "commit": {"message": "Fix bug"},
            "author": {"login": "octocat", "id": 1},
            "committer": {"login": "octocat", "id": 1},
            "parents": [{"sha": "def456"}],
            "stats": {"additions": 10, "deletions": 2, "total": 12},
            "files": [{"filename": "src/lib.rs", "status": "modified", "additions": 10, "deletions": 2, "changes": 12}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "login": "octocat",
            "id": 1,
            "name": "The Octocat"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut commits = repo.list_commits().unwrap().to_list().await.unwrap();
    let commit = &mut commits[0];
    assert_eq!(commit.state(), EntityState::Bound);
    assert_eq!(commit.parent_shas(), vec!["def456"]);

    assert_eq!(commit.lines_added().await.unwrap(), 10);
    assert_eq!(commit.state(), EntityState::Populated);
    assert_eq!(commit.lines_changed().await.unwrap(), 12);

    let files = commit.list_files().await.unwrap().to_list().await.unwrap();
    assert_eq!(files[0].filename, "src/lib.rs");

    let author = commit.author().await.unwrap().unwrap();
    let committer = commit.committer().await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&author, &committer));
    assert_eq!(author.name.as_deref(), Some("The Octocat"));

    let user = repo.root().unwrap().get_user("octocat").await.unwrap();
    assert!(Arc::ptr_eq(&author, &user));
}

#[tokio::test]
async fn test_create_comment_posts_json_body() {
    let server = MockServer::start().await;
    let repo = repository(&server).await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "abc123"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/o/r/commits/abc123/comments"))
        .and(body_partial_json(serde_json::json!({
            "body": "Nice change",
            "path": "src/lib.rs",
            "line": 3
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 99,
            "body": "Nice change",
            "path": "src/lib.rs",
            "line": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let commit = repo.get_commit("abc123").await.unwrap();
    let comment = commit
        .create_comment("Nice change", Some("src/lib.rs"), Some(3), None)
        .await
        .unwrap();
    assert_eq!(comment.id, 99);
}

#[tokio::test]
async fn test_content_read_and_update() {
    let server = MockServer::start().await;
    let repo = repository(&server).await;
    let url = format!("{}/repos/o/r/contents/README.md", server.uri());

    Mock::given(method("GET"))
        .and(path("/repos/o/r/contents/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "README.md",
            "path": "README.md",
            "sha": "old",
            "type": "file",
            "url": url,
            "encoding": "base64",
            "content": "SGVs\nbG8=\n"
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/o/r/contents/README.md"))
        .and(body_partial_json(serde_json::json!({
            "message": "Update README",
            "sha": "old",
            "content": "QnllIQ=="
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": {
                "name": "README.md",
                "path": "README.md",
                "sha": "new",
                "type": "file",
                "url": url
            },
            "commit": {"sha": "c0ffee", "message": "Update README"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut readme = repo.get_file_content("README.md", None).await.unwrap();
    assert_eq!(readme.read().await.unwrap(), b"Hello");

    let response = readme.update(b"Bye!", "Update README", None).await.unwrap();
    assert_eq!(response.commit.sha, "c0ffee");
    assert!(response.commit.owner().is_ok());
    assert_eq!(response.content.map(|c| c.sha), Some("new".to_string()));
    assert_eq!(readme.read().await.unwrap(), b"Bye!");
}
