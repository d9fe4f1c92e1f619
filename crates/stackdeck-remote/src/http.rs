use async_trait::async_trait;
use stackdeck_wizard::{SubmissionPayload, SubmissionSink, SubmitError};
use std::time::Duration;

/// Posts the payload as a urlencoded form. Any non-2xx answer is a failure.
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: &str) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SubmissionSink for HttpSink {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmitError> {
        tracing::debug!(url = %self.url, apps = payload.selections.len(), "posting selection");
        let resp = self
            .client
            .post(&self.url)
            .form(&payload.form_fields())
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected(format!("{status}: {}", body.trim())));
        }
        tracing::info!(url = %self.url, "selection accepted");
        Ok(())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let sink = HttpSink::new(&format!("http://{addr}/soumettre")).expect("client");
        let payload = SubmissionPayload {
            community: "be".into(),
            selections: vec!["|ihm|plf|3.0.0:".into()],
            ..Default::default()
        };
        assert!(matches!(
            sink.submit(&payload).await,
            Err(SubmitError::Transport(_))
        ));
    }
}
