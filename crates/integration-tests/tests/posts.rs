//! On-demand post generation and artifact listing.

use reqwest::StatusCode;
use serde_json::{Value, json};

use powerchip_integration_tests::TestContext;

/// Generator stand-in: writes one PNG into `--output-dir` and reports it.
const GENERATOR_OK: &str = r#"
while [ $# -gt 0 ]; do
    case "$1" in
        --type) kind="$2"; shift ;;
        --output-dir) out="$2"; shift ;;
    esac
    shift
done
printf 'png' > "$out/post_$kind.png"
printf '{"status":"ok","type":"%s","files":["post_%s.png"]}\n' "$kind" "$kind"
"#;

const GENERATOR_FAIL: &str = r#"
echo "rendering"
echo "products.csv not found" >&2
exit 3
"#;

async fn context_with_generator(script: &str) -> TestContext {
    let ctx = TestContext::new().await;
    std::fs::write(&ctx.config.generator.entrypoint, script).unwrap();
    ctx
}

#[tokio::test]
async fn test_invalid_type_is_rejected() {
    let ctx = context_with_generator(GENERATOR_OK).await;

    for body in [json!({ "type": "video" }), json!({}), json!({ "type": 3 })] {
        let resp = ctx
            .client
            .post(ctx.url("/posts/generate"))
            .json(&body)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "status": "error", "detail": "invalid type" }));
    }
}

#[tokio::test]
#[cfg(unix)]
async fn test_generate_then_list_and_serve() {
    let ctx = context_with_generator(GENERATOR_OK).await;

    let resp = ctx
        .client
        .post(ctx.url("/posts/generate"))
        .json(&json!({ "type": "carousel", "count": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "status": "ok", "type": "carousel", "files": ["post_carousel.png"] })
    );

    std::fs::write(ctx.config.posts_dir.join("notes.txt"), "skip me").unwrap();
    std::fs::write(ctx.config.posts_dir.join("a_reel.mp4"), "mp4").unwrap();

    let list: Value = ctx
        .client
        .get(ctx.url("/posts/list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        list,
        json!({
            "status": "ok",
            "files": [
                { "file": "a_reel.mp4", "url": "/posts/a_reel.mp4" },
                { "file": "post_carousel.png", "url": "/posts/post_carousel.png" }
            ]
        })
    );

    let resp = ctx
        .client
        .get(ctx.url("/posts/post_carousel.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "png");
}

#[tokio::test]
#[cfg(unix)]
async fn test_generator_failure_reports_stderr() {
    let ctx = context_with_generator(GENERATOR_FAIL).await;

    let resp = ctx
        .client
        .post(ctx.url("/posts/generate"))
        .json(&json!({ "type": "static" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "status": "error", "detail": "products.csv not found" })
    );
}

#[tokio::test]
async fn test_list_fails_when_posts_dir_missing() {
    let ctx = TestContext::new().await;
    std::fs::remove_dir_all(&ctx.config.posts_dir).unwrap();

    let resp = ctx.client.get(ctx.url("/posts/list")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
}
