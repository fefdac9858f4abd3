use std::sync::Arc;

use tokio::sync::mpsc;

use crate::common::validation::{validate_login, validate_signup};
use crate::common::{ApiCommand, ApiEvent};
use crate::error::ApiError;

use super::api::ApiClient;

pub struct ApiWorker {
    client: Arc<ApiClient>,
    event_sender: mpsc::Sender<ApiEvent>,
    command_receiver: mpsc::Receiver<ApiCommand>,
}

impl ApiWorker {
    pub fn new(
        client: Arc<ApiClient>,
        event_sender: mpsc::Sender<ApiEvent>,
        command_receiver: mpsc::Receiver<ApiCommand>,
    ) -> Self {
        Self {
            client,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) {
        log::info!("API worker started");

        while let Some(command) = self.command_receiver.recv().await {
            let action = command.action();
            let is_credentials = matches!(
                command,
                ApiCommand::Login { .. } | ApiCommand::Signup { .. }
            );

            let event = match self.handle_command(command).await {
                Ok(event) => event,
                Err(ApiError::Unauthorized) if is_credentials => ApiEvent::Failed {
                    action,
                    message: "Invalid credentials".to_string(),
                },
                Err(ApiError::Unauthorized) => {
                    log::info!("Session rejected during {action}");
                    ApiEvent::SessionExpired
                }
                Err(err) => {
                    log::warn!("API call `{action}` failed: {err}");
                    ApiEvent::Failed {
                        action,
                        message: err.to_string(),
                    }
                }
            };

            if let Err(err) = self.event_sender.send(event).await {
                log::warn!("UI went away, stopping API worker: {err}");
                break;
            }
        }

        log::info!("API worker stopped");
    }

    async fn handle_command(&self, command: ApiCommand) -> Result<ApiEvent, ApiError> {
        match command {
            ApiCommand::Login { email, password } => {
                validate_login(&email, &password)?;
                let user = self.client.login(&email, &password).await?;
                log::info!("Logged in as {}", user.id);
                Ok(ApiEvent::LoggedIn(user))
            }
            ApiCommand::Signup {
                first_name,
                last_name,
                email,
                password,
            } => {
                validate_signup(&first_name, &last_name, &email, &password)?;
                let user = self
                    .client
                    .signup(&first_name, &last_name, &email, &password)
                    .await?;
                log::info!("Signed up as {}", user.id);
                Ok(ApiEvent::LoggedIn(user))
            }
            ApiCommand::Logout => {
                self.client.logout().await?;
                Ok(ApiEvent::LoggedOut)
            }
            ApiCommand::LoadProfile => self.client.profile().await.map(ApiEvent::ProfileLoaded),
            ApiCommand::EditProfile(update) => self
                .client
                .edit_profile(&update)
                .await
                .map(ApiEvent::ProfileSaved),
            ApiCommand::LoadFeed => self.client.feed().await.map(ApiEvent::FeedLoaded),
            ApiCommand::SendRequest { status, user_id } => {
                self.client.send_request(status, &user_id).await?;
                Ok(ApiEvent::RequestSent { user_id })
            }
            ApiCommand::LoadConnections => self
                .client
                .connections()
                .await
                .map(ApiEvent::ConnectionsLoaded),
            ApiCommand::LoadRequests => self
                .client
                .received_requests()
                .await
                .map(ApiEvent::RequestsLoaded),
            ApiCommand::ReviewRequest { status, request_id } => {
                self.client.review_request(status, &request_id).await?;
                Ok(ApiEvent::RequestReviewed { request_id })
            }
        }
    }
}
