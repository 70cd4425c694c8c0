use govdesk_core::turn::{TurnRequest, TurnResponse};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::util::{
    api_request, client, connection_error, endpoint, exit_code_for, print_json_stderr,
};

const NEXT_TURN: [&str; 3] = ["v1", "decision", "next"];

/// Send one utterance and print the raw Turn API response.
pub async fn say(api_url: &str, sender_id: Option<String>, text: String) -> i32 {
    let body = TurnRequest {
        sender_id,
        text: Some(text),
    };
    let body = match serde_json::to_value(&body) {
        Ok(value) => value,
        Err(e) => {
            print_json_stderr(&json!({ "error": "cli_error", "message": e.to_string() }));
            return 4;
        }
    };
    api_request(api_url, reqwest::Method::POST, &NEXT_TURN, Some(body)).await
}

/// Interactive conversation: one stdin line per turn until EOF.
pub async fn chat(api_url: &str, sender_id: String) -> i32 {
    let url = match endpoint(api_url, &NEXT_TURN) {
        Ok(url) => url,
        Err(message) => {
            print_json_stderr(&json!({ "error": "cli_error", "message": message }));
            return 4;
        }
    };
    let http = client();
    eprintln!("chatting as {sender_id} (Ctrl-D to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_exit = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                print_json_stderr(&json!({ "error": "cli_error", "message": e.to_string() }));
                return 4;
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let request = TurnRequest {
            sender_id: Some(sender_id.clone()),
            text: Some(text.to_string()),
        };
        let resp = match http.post(url.clone()).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                print_json_stderr(&connection_error(&e));
                return 3;
            }
        };

        let status = resp.status().as_u16();
        last_exit = exit_code_for(status);
        let body: serde_json::Value = resp.json().await.unwrap_or_else(
            |e| json!({ "raw_error": format!("Failed to parse response as JSON: {e}") }),
        );
        match serde_json::from_value::<TurnResponse>(body.clone()) {
            Ok(turn) => println!("{}", render(&turn)),
            Err(_) => print_json_stderr(&json!({ "status": status, "body": body })),
        }
    }
    last_exit
}

fn render(turn: &TurnResponse) -> String {
    let marker = if turn.ok { "" } else { " !" };
    format!("[{}{marker}] {}", turn.stage.as_str(), turn.message)
}
