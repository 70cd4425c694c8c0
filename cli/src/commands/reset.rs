use crate::util::api_request;

pub async fn run(api_url: &str, sender_id: &str) -> i32 {
    api_request(
        api_url,
        reqwest::Method::DELETE,
        &["v1", "decision", "context", sender_id],
        None,
    )
    .await
}
