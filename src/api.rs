use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, TurnosError, extract_detail};
use crate::model::{ActionReceipt, DaySchedule, SlotRecord, UserSummary, Viewer, WeekGeneration};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
struct Tokens {
    access: String,
    refresh: String,
}

#[derive(Clone)]
pub struct TurnosClient {
    client: Client,
    config: Config,
    tokens: Arc<RwLock<Option<Tokens>>>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshedToken {
    access: String,
    // Present when the backend rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReserveForMemberRequest {
    socio_id: u64,
}

#[derive(Debug, Serialize)]
struct GenerateWeekRequest {
    fecha_inicio: String,
}

impl TurnosClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("es-AR,es;q=0.8"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            tokens: Arc::new(RwLock::new(None)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.backend.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn is_logged_in(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    pub async fn login(self) -> Result<Self> {
        let url = self.url("token/");
        debug!("Logging in to {}", url);

        let request = LoginRequest {
            username: &self.config.credentials.username,
            password: &self.config.credentials.password,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TurnosError::Auth(match extract_detail(&body) {
                Some(detail) => format!("Login failed with status {}: {}", status, detail),
                None => format!("Login failed with status: {}", status),
            }));
        }

        let pair: TokenPair = response.json().await?;
        *self.tokens.write().await = Some(Tokens {
            access: pair.access,
            refresh: pair.refresh,
        });

        info!("Logged in as {}", self.config.credentials.username);
        Ok(self)
    }

    pub async fn logout(&self) {
        *self.tokens.write().await = None;
    }

    /// Trade the refresh token for a new access token. A failed refresh drops
    /// the session.
    async fn refresh_access(&self) -> Result<()> {
        let refresh = self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh.clone())
            .ok_or_else(|| TurnosError::Auth("Not logged in".to_string()))?;

        let response = self
            .client
            .post(self.url("token/refresh/"))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Token refresh rejected ({}), session dropped", status);
            self.logout().await;
            return Err(TurnosError::Auth(format!(
                "Session expired, log in again ({})",
                status
            )));
        }

        let refreshed: RefreshedToken = response.json().await?;
        let mut tokens = self.tokens.write().await;
        if let Some(tokens) = tokens.as_mut() {
            tokens.access = refreshed.access;
            if let Some(refresh) = refreshed.refresh {
                tokens.refresh = refresh;
            }
        }
        debug!("Access token refreshed");
        Ok(())
    }

    async fn authorized<F>(&self, build: &F) -> Result<RequestBuilder>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let access = self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access.clone())
            .ok_or_else(|| TurnosError::Auth("Not logged in".to_string()))?;
        Ok(build(&self.client).bearer_auth(access))
    }

    /// Send an authenticated request. A 401 triggers one token refresh and one
    /// retry of the same request.
    async fn execute<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self.authorized(&build).await?.send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!("Access token rejected, refreshing");
        self.refresh_access().await?;
        let response = self.authorized(&build).await?.send().await?;
        check_status(response).await
    }

    pub async fn current_user(&self) -> Result<UserSummary> {
        let url = self.url("general/user/");
        let response = self.execute(|c| c.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// Resolve who is logged in. Without a session this is a guest.
    pub async fn identify(&self) -> Result<Viewer> {
        if !self.is_logged_in().await {
            return Ok(Viewer::Guest);
        }
        let user = self.current_user().await?;
        debug!("Identified {} with role {:?}", user.username, user.role);
        Ok(Viewer::from_role(user.role))
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let url = self.url("general/usuarios/");
        let response = self.execute(|c| c.get(&url)).await?;
        Ok(response.json().await?)
    }

    pub async fn get_calendar(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DaySchedule>> {
        let url = self.url("turnos/turno/calendario/");
        let query = [
            ("fecha_inicio", start.format(DATE_FORMAT).to_string()),
            ("fecha_fin", end.format(DATE_FORMAT).to_string()),
        ];
        debug!("Fetching calendar {} .. {}", query[0].1, query[1].1);

        let response = self.execute(|c| c.get(&url).query(&query)).await?;
        let days: Vec<DaySchedule> = response.json().await?;
        debug!("Calendar returned {} days", days.len());
        Ok(days)
    }

    /// Flat list of reservations visible to the viewer: free slots plus the
    /// viewer's own for members, everything for staff.
    pub async fn list_slots(&self) -> Result<Vec<SlotRecord>> {
        let url = self.url("turnos/turno/");
        let response = self.execute(|c| c.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// Create the slots of the week containing `date` (staff only).
    pub async fn generate_week(&self, date: NaiveDate) -> Result<WeekGeneration> {
        let body = serde_json::to_value(GenerateWeekRequest {
            fecha_inicio: date.format(DATE_FORMAT).to_string(),
        })
        .map_err(|e| TurnosError::Rejected(format!("Invalid week: {}", e)))?;
        info!("Generating slots for the week of {}", date);
        self.post_action("turnos/turno/generar_turnos_semana/".to_string(), Some(body))
            .await
    }

    async fn post_action<T>(&self, path: String, body: Option<serde_json::Value>) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.url(&path);
        let response = self
            .execute(|c| match &body {
                Some(body) => c.post(&url).json(body),
                None => c.post(&url),
            })
            .await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            debug!("Unrecognised action response from {}: {}", path, e);
            T::default()
        }))
    }

    pub async fn reserve(&self, slot_id: u64) -> Result<ActionReceipt> {
        self.post_action(format!("turnos/turno/{}/reservar/", slot_id), None)
            .await
    }

    pub async fn confirm(&self, slot_id: u64) -> Result<ActionReceipt> {
        self.post_action(format!("turnos/turno/{}/confirmar/", slot_id), None)
            .await
    }

    pub async fn cancel(&self, slot_id: u64) -> Result<ActionReceipt> {
        self.post_action(format!("turnos/turno/{}/cancelar/", slot_id), None)
            .await
    }

    pub async fn reserve_for_member(&self, slot_id: u64, member_id: u64) -> Result<ActionReceipt> {
        let body = serde_json::to_value(ReserveForMemberRequest { socio_id: member_id })
            .map_err(|e| TurnosError::Rejected(format!("Invalid member id: {}", e)))?;
        self.post_action(
            format!("turnos/turno/{}/reservar_para_socio/", slot_id),
            Some(body),
        )
        .await
    }

    pub async fn cancel_for_member(&self, slot_id: u64) -> Result<ActionReceipt> {
        self.post_action(format!("turnos/turno/{}/cancelar_staff/", slot_id), None)
            .await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body);
    if status == StatusCode::UNAUTHORIZED {
        return Err(TurnosError::Auth(
            detail.unwrap_or_else(|| "Unauthorized".to_string()),
        ));
    }
    Err(TurnosError::Api {
        status: status.as_u16(),
        detail,
    })
}
