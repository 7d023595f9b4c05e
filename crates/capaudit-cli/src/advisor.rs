//! HTTP advisor backing `audit --assist`.

use capaudit_core::Advisor;
use capaudit_core::AssistRequest;
use capaudit_core::audit::AdvisorError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Reply used when the endpoint answers without a `response` field.
const EMPTY_REPLY: &str = "No reply.";

/// Posts `{"prompt": ...}` to the capsule's assist endpoint and returns the
/// `response` field of the JSON reply.
pub struct HttpAdvisor {
    client: Client,
}

#[derive(Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ReplyBody {
    #[serde(default)]
    response: Option<String>,
}

impl HttpAdvisor {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("capaudit/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl Advisor for HttpAdvisor {
    fn advise(&self, request: &AssistRequest<'_>) -> Result<String, AdvisorError> {
        tracing::debug!(gpt_id = request.gpt_id, endpoint = request.endpoint, "consulting advisor");
        let reply: ReplyBody = self
            .client
            .post(request.endpoint)
            .json(&PromptBody {
                prompt: request.prompt,
            })
            .send()?
            .error_for_status()?
            .json()?;
        Ok(reply.response.unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }
}
