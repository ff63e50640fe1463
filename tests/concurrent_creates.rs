use std::collections::BTreeSet;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use clap::Parser as _;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use catalogd::{config::Cli, http::build_router, service::Catalogs};

fn catalogs() -> Catalogs {
    let config = Cli::try_parse_from(["catalogd"]).unwrap().config;
    Catalogs::from_config(&config).unwrap()
}

fn create_book_req() -> Request<Body> {
    let body = json!({
        "title": "Concurrent Test Book",
        "author": "Test Author",
        "category": "Test",
    });
    Request::builder()
        .method("POST")
        .uri("/api/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_get_sequential_unique_ids() {
    let app = build_router(catalogs());

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                let res = app.oneshot(create_book_req()).await.unwrap();
                assert_eq!(res.status(), StatusCode::CREATED);
                body_json(res).await["id"].as_u64().unwrap()
            })
        })
        .collect();

    let mut got = Vec::new();
    for task in tasks {
        got.push(task.await.unwrap());
    }

    let unique: BTreeSet<u64> = got.iter().copied().collect();
    assert_eq!(unique.len(), got.len(), "duplicate ids issued");
    assert_eq!(unique, (101..=110).collect::<BTreeSet<u64>>());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/books")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed: BTreeSet<u64> = body_json(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_u64().unwrap())
        .collect();
    let expected: BTreeSet<u64> = (1..=5).chain(101..=110).collect();
    assert_eq!(listed, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_never_see_more_than_written() {
    let catalogs = catalogs();
    let app = build_router(catalogs.clone());

    let mut readers = Vec::new();
    let mut writers = Vec::new();
    for _ in 0..5 {
        let app = app.clone();
        readers.push(tokio::spawn(async move {
            let res = app
                .oneshot(
                    Request::builder()
                        .uri("/api/books")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            body_json(res).await.as_array().unwrap().len()
        }));
    }
    for _ in 0..3 {
        let app = app.clone();
        writers.push(tokio::spawn(async move {
            app.oneshot(create_book_req()).await.unwrap().status()
        }));
    }

    for reader in readers {
        let count = reader.await.unwrap();
        assert!((5..=8).contains(&count), "unexpected count {count}");
    }
    for writer in writers {
        assert_eq!(writer.await.unwrap(), StatusCode::CREATED);
    }
    assert_eq!(catalogs.books.store().len(), 8);
}
