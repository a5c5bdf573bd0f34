use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::Client as HttpClient;
use reqwest::header::{ HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE };
use std::time::Duration;
use url::Url;

use super::AskBackend;
use crate::config::ChatSettings;
use crate::error::ChatError;
use crate::models::backend::{ AskRequest, AskResponse };

/// `POST {base}/ask` over HTTP with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpAskBackend {
    http: HttpClient,
    ask_url: Url,
}

impl HttpAskBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let ask_url = ask_endpoint(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder().default_headers(headers).timeout(timeout).build()?;

        Ok(Self { http, ask_url })
    }

    pub fn from_settings(settings: &ChatSettings) -> Result<Self, ChatError> {
        Self::new(&settings.backend_url, settings.request_timeout)
    }

    pub fn ask_url(&self) -> &Url {
        &self.ask_url
    }
}

fn ask_endpoint(base_url: &str) -> Result<Url, ChatError> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?.join("ask")?)
}

#[async_trait]
impl AskBackend for HttpAskBackend {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ChatError> {
        debug!(
            "POST {} (top_k={}, history={})",
            self.ask_url,
            request.top_k,
            request.conversation_history.len()
        );

        let response = self.http.post(self.ask_url.clone()).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Error bodies still carry `detail`, so decode before looking at the status.
        match serde_json::from_str::<AskResponse>(&body) {
            Ok(parsed) => {
                if !status.is_success() {
                    warn!("Backend answered HTTP {}", status);
                }
                Ok(parsed)
            }
            Err(e) if status.is_success() => Err(ChatError::Decode(e)),
            Err(_) => {
                debug!("Undecodable HTTP {} body: {:.200}", status, body);
                Err(ChatError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_is_joined_under_base_path() {
        assert_eq!(ask_endpoint("http://localhost:8000").unwrap().as_str(), "http://localhost:8000/ask");
        assert_eq!(ask_endpoint("http://host/api/").unwrap().as_str(), "http://host/api/ask");
        assert_eq!(ask_endpoint("http://host/api").unwrap().as_str(), "http://host/api/ask");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(ask_endpoint("not a url"), Err(ChatError::Url(_))));
    }
}
