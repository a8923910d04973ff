//! Account and model operations

use codex_rpc_protocol::Secret;
use codex_rpc_protocol::methods::client_request;
use codex_rpc_protocol::types::{
    ApiKeyLogin, GetAccountParams, GetAccountResponse, LoginAccountParams, LoginAccountResponse,
    LogoutAccountResponse, ModelListParams, ModelListResponse,
};

use crate::client::core::Client;
use crate::error::Result;

impl Client {
    /// Read the signed-in account.
    ///
    /// With `refresh_token` the server refreshes the stored credentials first.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn account_read(&self, refresh_token: bool) -> Result<GetAccountResponse> {
        self.ensure_initialized()?;
        self.send_request(
            client_request::ACCOUNT_READ,
            &GetAccountParams { refresh_token },
        )
        .await
    }

    /// Sign in with an API key.
    ///
    /// The key is redacted in logs and `Debug` output and sent as-is.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn login_api_key(&self, api_key: impl Into<Secret>) -> Result<LoginAccountResponse> {
        self.ensure_initialized()?;
        let params = LoginAccountParams::ApiKey(ApiKeyLogin {
            api_key: api_key.into(),
        });
        self.send_request(client_request::ACCOUNT_LOGIN_START, &params)
            .await
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn logout(&self) -> Result<LogoutAccountResponse> {
        self.ensure_initialized()?;
        self.send_request(client_request::ACCOUNT_LOGOUT, &()).await
    }

    /// List the models the server offers, one page at a time.
    ///
    /// # Errors
    ///
    /// Fails if the handshake has not succeeded, or as for
    /// [`send_request`](Client::send_request).
    pub async fn model_list(&self, params: ModelListParams) -> Result<ModelListResponse> {
        self.ensure_initialized()?;
        self.send_request(client_request::MODEL_LIST, &params).await
    }
}
