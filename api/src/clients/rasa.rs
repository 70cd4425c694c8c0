use async_trait::async_trait;
use govdesk_engine::{ClassifiedIntent, CollaboratorError, IntentClassifier};
use serde::Deserialize;
use url::Url;

/// Intent classification through a Rasa server's `/model/parse`.
pub struct RasaClassifier {
    http: reqwest::Client,
    parse_url: Url,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    intent: Option<ParsedIntent>,
}

#[derive(Debug, Deserialize)]
struct ParsedIntent {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl RasaClassifier {
    pub fn new(http: reqwest::Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            parse_url: base_url.join("model/parse")?,
        })
    }
}

fn into_intent(response: ParseResponse) -> ClassifiedIntent {
    match response.intent {
        Some(ParsedIntent {
            name: Some(name),
            confidence,
        }) => ClassifiedIntent {
            name,
            confidence: confidence.unwrap_or(0.0),
        },
        _ => ClassifiedIntent::unknown(),
    }
}

#[async_trait]
impl IntentClassifier for RasaClassifier {
    async fn parse(&self, text: &str) -> Result<ClassifiedIntent, CollaboratorError> {
        let response = self
            .http
            .post(self.parse_url.clone())
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|err| CollaboratorError::Classifier(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Classifier(format!(
                "rasa parse failed: {status} {body}"
            )));
        }

        let parsed = response
            .json::<ParseResponse>()
            .await
            .map_err(|err| CollaboratorError::Classifier(err.to_string()))?;
        Ok(into_intent(parsed))
    }
}
