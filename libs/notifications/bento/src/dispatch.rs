//! Request building and dispatch to the Bento batch email endpoint.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{DeliveryError, DeliveryResult};
use crate::response;
use crate::settings::{Settings, PUBLISHABLE_KEY, SECRET_KEY, SITE_UUID};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Batch email endpoint. HTTPS only.
pub const BENTO_ENDPOINT: &str = "https://app.bentonow.com/api/v1/batch/emails";

/// A message reduced to what the API needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    site_uuid: &'a str,
    emails: [EmailPayload<'a>; 1],
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    html_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
    transactional: Value,
    personalizations: &'a Map<String, Value>,
}

/// Build the JSON body: a batch holding exactly one email.
pub fn request_body(
    site_uuid: &str,
    email: &OutgoingEmail,
    transactional: Value,
    personalization: &Map<String, Value>,
) -> DeliveryResult<Value> {
    let batch = BatchRequest {
        site_uuid,
        emails: [EmailPayload {
            to: &email.to,
            from: &email.from,
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: email.text_body.as_deref(),
            transactional,
            personalizations: personalization,
        }],
    };

    serde_json::to_value(&batch)
        .map_err(|e| DeliveryError::validation(format!("Invalid email payload: {}", e)))
}

/// Send one email and interpret the answer.
///
/// Required settings are resolved first, so a missing one never reaches the
/// network.
pub async fn dispatch(
    transport: &dyn HttpTransport,
    settings: &Settings,
    email: &OutgoingEmail,
    personalization: &Map<String, Value>,
) -> DeliveryResult<ApiResponse> {
    let site_uuid = settings.required(SITE_UUID)?;
    let publishable_key = settings.required(PUBLISHABLE_KEY)?;
    let secret_key = settings.required(SECRET_KEY)?;

    let request = ApiRequest {
        url: BENTO_ENDPOINT.to_string(),
        username: publishable_key.to_string(),
        password: secret_key.to_string(),
        body: request_body(site_uuid, email, settings.transactional(), personalization)?,
    };

    debug!(transport = transport.name(), to = %email.to, "Dispatching email to Bento");

    let response = transport
        .post_json(&request)
        .await
        .map_err(|e| DeliveryError::network(&e))?;

    response::interpret(&response)?;

    info!(status = response.status, to = %email.to, "Email accepted by Bento");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryErrorKind;
    use crate::transport::{MockHttpTransport, TransportError};
    use serde_json::json;

    fn settings() -> Settings {
        Settings::new()
            .with(SITE_UUID, "s")
            .with(PUBLISHABLE_KEY, "p")
            .with(SECRET_KEY, "k")
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "a@x.com".to_string(),
            from: "b@x.com".to_string(),
            subject: "Hi".to_string(),
            html_body: "<p>hi</p>".to_string(),
            text_body: None,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("s", &email(), json!(true), &Map::new()).unwrap();

        assert_eq!(
            body,
            json!({
                "site_uuid": "s",
                "emails": [{
                    "to": "a@x.com",
                    "from": "b@x.com",
                    "subject": "Hi",
                    "html_body": "<p>hi</p>",
                    "transactional": true,
                    "personalizations": {}
                }]
            })
        );
    }

    #[test]
    fn test_request_body_includes_text_and_personalization() {
        let mut personalization = Map::new();
        personalization.insert("name".to_string(), json!("Ada"));
        let mut email = email();
        email.text_body = Some("hi".to_string());

        let body = request_body("s", &email, json!(false), &personalization).unwrap();

        assert_eq!(body["emails"][0]["text_body"], json!("hi"));
        assert_eq!(body["emails"][0]["transactional"], json!(false));
        assert_eq!(body["emails"][0]["personalizations"], json!({"name": "Ada"}));
        assert_eq!(body["emails"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_dispatch_posts_with_basic_auth() {
        let mut transport = MockHttpTransport::new();
        transport.expect_name().return_const("mock");
        transport
            .expect_post_json()
            .withf(|request| {
                request.url == BENTO_ENDPOINT
                    && request.username == "p"
                    && request.password == "k"
                    && request.body["site_uuid"] == "s"
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(200, Some("OK"), Some(""))));

        let response = dispatch(&transport, &settings(), &email(), &Map::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_first_missing_setting_wins() {
        let mut transport = MockHttpTransport::new();
        transport.expect_post_json().times(0);

        let incomplete = Settings::new().with(PUBLISHABLE_KEY, " ");
        let err = dispatch(&transport, &incomplete, &email(), &Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Delivery setting site_uuid is required");

        let blank_key = settings().with(PUBLISHABLE_KEY, "   ");
        let err = dispatch(&transport, &blank_key, &email(), &Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Delivery setting publishable_key is required");
        assert_eq!(err.kind(), DeliveryErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_network_error() {
        let mut transport = MockHttpTransport::new();
        transport.expect_name().return_const("mock");
        transport
            .expect_post_json()
            .times(1)
            .returning(|_| Err(TransportError::new("Timeout", "execution expired")));

        let err = dispatch(&transport, &settings(), &email(), &Map::new())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Network error: execution expired");
        assert_eq!(err.response_code(), None);
        assert_eq!(err.error_details(), Some(&json!({"exception": "Timeout"})));
    }

    #[tokio::test]
    async fn test_rejected_response_is_interpreted() {
        let mut transport = MockHttpTransport::new();
        transport.expect_name().return_const("mock");
        transport.expect_post_json().times(1).returning(|_| {
            Ok(ApiResponse::new(
                422,
                Some("Unprocessable Entity"),
                Some(r#"{"error":"Invalid"}"#),
            ))
        });

        let err = dispatch(&transport, &settings(), &email(), &Map::new())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Client error: Invalid");
        assert_eq!(err.response_code(), Some(422));
    }
}
