mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(&server.base_url).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Jobly API");
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;

    // 503 when no database is reachable from the test environment
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    let _body = res.json::<serde_json::Value>().await?;
    Ok(())
}
