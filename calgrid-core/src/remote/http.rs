//! HTTP gateway for the events service.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::CalgridConfig;
use crate::date_range::DateRange;
use crate::error::{CalGridError, CalGridResult, ValidationError};
use crate::event::{Event, EventId};
use crate::remote::protocol::{ApiResponse, IdQuery, RangeQuery, WireEvent};
use crate::remote::{EventGateway, Listing};

/// Talks to `{base_url}/events`.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CalGridResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(HttpGateway { http, base_url })
    }

    pub fn from_config(config: &CalgridConfig) -> CalGridResult<Self> {
        Self::new(&config.server_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    /// Decode a mutation response. Bodies that are not an envelope become a
    /// `Rejected` error carrying the HTTP status.
    async fn envelope(resp: reqwest::Response) -> CalGridResult<ApiResponse> {
        let status = resp.status();
        let body = resp.text().await?;

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(CalGridError::Rejected {
                code: status.as_u16() as i64,
                message: body,
            }),
            Err(e) => Err(CalGridError::Serialization(format!(
                "Unexpected response from events service: {}",
                e
            ))),
        }
    }
}

impl EventGateway for HttpGateway {
    async fn list(&self, range: Option<&DateRange>) -> CalGridResult<Listing> {
        let mut request = self.http.get(self.events_url());
        if let Some(range) = range {
            request = request.query(&RangeQuery::from(range));
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // Failures come back as an envelope object instead of an array.
        let records = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(records)) => records,
            Ok(other) => {
                return Err(match serde_json::from_value::<ApiResponse>(other) {
                    Ok(envelope) => CalGridError::Rejected {
                        code: envelope.code,
                        message: envelope.message,
                    },
                    Err(_) => CalGridError::Serialization(
                        "Expected a list of events from events service".to_string(),
                    ),
                });
            }
            Err(_) if !status.is_success() => {
                return Err(CalGridError::Rejected {
                    code: status.as_u16() as i64,
                    message: body,
                });
            }
            Err(e) => return Err(CalGridError::Serialization(e.to_string())),
        };

        let mut listing = Listing::default();
        for value in records {
            match serde_json::from_value::<WireEvent>(value) {
                Ok(record) => listing.push_record(record),
                Err(e) => listing.reject(format!("undecodable record: {}", e)),
            }
        }

        debug!(
            "Listed {} events ({} rejected)",
            listing.events.len(),
            listing.rejected.len()
        );
        Ok(listing)
    }

    async fn create(&self, event: &Event) -> CalGridResult<EventId> {
        let resp = self
            .http
            .post(self.events_url())
            .form(&WireEvent::from(event))
            .send()
            .await?;

        Self::envelope(resp).await?.created_id()
    }

    async fn update(&self, event: &Event) -> CalGridResult<()> {
        if !event.is_saved() {
            return Err(ValidationError::NotSaved.into());
        }

        let resp = self
            .http
            .put(self.events_url())
            .form(&WireEvent::from(event))
            .send()
            .await?;

        Self::envelope(resp).await?.into_result().map(|_| ())
    }

    async fn delete(&self, id: EventId) -> CalGridResult<()> {
        let resp = self
            .http
            .delete(self.events_url())
            .query(&IdQuery { id })
            .send()
            .await?;

        Self::envelope(resp).await?.into_result().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:5000");
        assert_eq!(gateway.events_url(), "http://localhost:5000/events");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let gateway = HttpGateway::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = gateway.list(None).await.unwrap_err();
        assert!(err.is_network());
    }
}
