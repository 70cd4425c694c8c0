use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn print_json_stderr(value: &serde_json::Value) {
    eprintln!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

pub fn print_json_stdout(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

/// Build `{api_url}/{segments...}`, percent-encoding each segment.
pub fn endpoint(api_url: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url =
        reqwest::Url::parse(api_url).map_err(|e| format!("Invalid API URL {api_url}: {e}"))?;
    url.path_segments_mut()
        .map_err(|_| format!("API URL cannot be a base: {api_url}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Exit code for an HTTP status: 0=2xx, 1=4xx, 2=anything else.
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

pub fn connection_error(err: &reqwest::Error) -> serde_json::Value {
    json!({
        "error": "connection_error",
        "message": format!("{err}"),
        "docs_hint": "Is the API server running? Check GOVDESK_API_URL."
    })
}

/// Execute an API request, print the response, exit with structured code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    segments: &[&str],
    body: Option<serde_json::Value>,
) -> i32 {
    let url = match endpoint(api_url, segments) {
        Ok(url) => url,
        Err(message) => {
            print_json_stderr(&json!({ "error": "cli_error", "message": message }));
            return 4;
        }
    };

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            print_json_stderr(&connection_error(&e));
            return 3;
        }
    };

    let status = resp.status().as_u16();
    let exit_code = exit_code_for(status);

    // 204 carries no body
    let text = resp.text().await.unwrap_or_default();
    let output = if text.trim().is_empty() {
        json!({ "status": status })
    } else {
        serde_json::from_str(&text).unwrap_or_else(
            |e| json!({ "raw_error": format!("Failed to parse response as JSON: {e}"), "body": text }),
        )
    };

    if exit_code == 0 {
        print_json_stdout(&output);
    } else {
        print_json_stderr(&output);
    }

    exit_code
}
