use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::chat::{HistorySource, RawChatMessage};
use crate::common::{ConnectionRequest, ProfileUpdate, RequestStatus, User};
use crate::error::{ApiError, ChatError};

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Default, Deserialize)]
struct ChatBody {
    #[serde(default)]
    messages: Vec<RawChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    #[serde(default)]
    chat: Option<ChatBody>,
}

/// REST client for the DevConnect backend. Authentication rides on the
/// session cookie kept in the client's cookie store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "emailId": email.trim(), "password": password }))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/signup"))
            .json(&json!({
                "firstName": first_name.trim(),
                "lastName": last_name.trim(),
                "emailId": email.trim(),
                "password": password,
            }))
            .send()
            .await?;
        decode::<DataEnvelope<User>>(response)
            .await
            .map(|envelope| envelope.data)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .json(&json!({}))
            .send()
            .await?;
        expect_success(response).await
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        let response = self.http.get(self.url("/profile/view")).send().await?;
        decode::<UserEnvelope>(response)
            .await
            .map(|envelope| envelope.user)
    }

    pub async fn edit_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let response = self
            .http
            .patch(self.url("/profile/edit"))
            .json(update)
            .send()
            .await?;
        decode::<DataEnvelope<User>>(response)
            .await
            .map(|envelope| envelope.data)
    }

    pub async fn feed(&self) -> Result<Vec<User>, ApiError> {
        let response = self.http.get(self.url("/user/feed")).send().await?;
        decode::<DataEnvelope<Vec<User>>>(response)
            .await
            .map(|envelope| envelope.data)
    }

    pub async fn send_request(&self, status: RequestStatus, user_id: &str) -> Result<(), ApiError> {
        if !status.is_feed_decision() {
            return Err(ApiError::Validation(format!(
                "`{}` is not a feed decision",
                status.as_path()
            )));
        }
        let path = format!("/request/send/{}/{user_id}", status.as_path());
        let response = self.http.post(self.url(&path)).json(&json!({})).send().await?;
        expect_success(response).await
    }

    pub async fn connections(&self) -> Result<Vec<User>, ApiError> {
        let response = self.http.get(self.url("/user/connections")).send().await?;
        decode::<DataEnvelope<Vec<User>>>(response)
            .await
            .map(|envelope| envelope.data)
    }

    pub async fn received_requests(&self) -> Result<Vec<ConnectionRequest>, ApiError> {
        let response = self
            .http
            .get(self.url("/user/requests/received"))
            .send()
            .await?;
        decode::<DataEnvelope<Vec<ConnectionRequest>>>(response)
            .await
            .map(|envelope| envelope.data)
    }

    pub async fn review_request(
        &self,
        status: RequestStatus,
        request_id: &str,
    ) -> Result<(), ApiError> {
        if !status.is_review_decision() {
            return Err(ApiError::Validation(format!(
                "`{}` is not a review decision",
                status.as_path()
            )));
        }
        let path = format!("/request/review/{}/{request_id}", status.as_path());
        let response = self.http.post(self.url(&path)).json(&json!({})).send().await?;
        expect_success(response).await
    }

    pub async fn chat_transcript(&self, peer_id: &str) -> Result<Vec<RawChatMessage>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/chat/{peer_id}")))
            .send()
            .await?;
        decode::<ChatEnvelope>(response)
            .await
            .map(|envelope| envelope.chat.unwrap_or_default().messages)
    }
}

impl HistorySource for ApiClient {
    async fn fetch_transcript(&self, peer_id: &str) -> Result<Vec<RawChatMessage>, ChatError> {
        self.chat_transcript(peer_id).await.map_err(ChatError::from)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = check_status(response).await?.text().await?;
    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

async fn expect_success(response: Response) -> Result<(), ApiError> {
    check_status(response).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base_url() {
        let client = ApiClient::new("http://localhost:7777/").unwrap();
        assert_eq!(client.url("/auth/login"), "http://localhost:7777/auth/login");
        assert_eq!(client.url("user/feed"), "http://localhost:7777/user/feed");
    }

    #[test]
    fn chat_envelope_tolerates_missing_chat() {
        let envelope: ChatEnvelope = serde_json::from_str(r#"{"chat": null}"#).unwrap();
        assert!(envelope.chat.unwrap_or_default().messages.is_empty());

        let envelope: ChatEnvelope = serde_json::from_str(
            r#"{"chat": {"_id": "c1", "participants": ["a", "b"], "messages": [
                {"senderId": {"firstName": "Bob", "lastName": "Builder"}, "text": "yo"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(envelope.chat.unwrap().messages.len(), 1);
    }

    #[test]
    fn data_envelope_unwraps_user_lists() {
        let envelope: DataEnvelope<Vec<User>> = serde_json::from_str(
            r#"{"message": "ok", "data": [{"_id": "u1", "firstName": "Ada", "lastName": "L"}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.data[0].first_name, "Ada");
    }

    #[tokio::test]
    async fn wrong_decisions_are_rejected_before_any_request() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.send_request(RequestStatus::Accepted, "u1").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            client.review_request(RequestStatus::Interested, "r1").await,
            Err(ApiError::Validation(_))
        ));
    }
}
