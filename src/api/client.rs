use crate::api::schema::{
    AdminOverview, ApiReply, Credentials, LoginOutcome, LoginResponse, NewTransaction,
    OverviewResponse, RegisterResponse,
};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::operations::validate::{self, RawRecord};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Backend operations the commands rely on.
pub trait FinanceApi {
    fn login(&self, credentials: &Credentials) -> Result<LoginOutcome>;
    fn register(&self, credentials: &Credentials) -> Result<()>;
    fn transactions(&self, user_id: i64) -> Result<Vec<RawRecord>>;
    fn add_transaction(&self, transaction: &NewTransaction) -> Result<String>;
    fn delete_transaction(&self, user_id: i64, transaction_id: i64) -> Result<String>;
    fn delete_user(&self, user_id: i64) -> Result<String>;
    fn overview(&self) -> Result<AdminOverview>;
}

pub struct HttpApi {
    base_url: String,
    client: Client,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.base_url().to_string(),
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Error statuses still carry a JSON body, so the body is decoded
    /// regardless of status.
    fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();
        debug!("{} -> {}", endpoint, status);
        let text = response.text()?;
        serde_json::from_str(&text).map_err(|e| {
            AppError::Api(format!("Unexpected response from {} ({}): {}", endpoint, status, e))
        })
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.client.get(self.url(endpoint)).send()?;
        Self::decode(endpoint, response)
    }

    fn post<B: serde::Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<T> {
        let response = self.client.post(self.url(endpoint)).json(body).send()?;
        Self::decode(endpoint, response)
    }

    fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.client.delete(self.url(endpoint)).send()?;
        Self::decode(endpoint, response)
    }
}

impl FinanceApi for HttpApi {
    fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let response: LoginResponse = self.post("/login", credentials)?;
        Ok(response.into_outcome(&credentials.username))
    }

    fn register(&self, credentials: &Credentials) -> Result<()> {
        let response: RegisterResponse = self.post("/register", credentials)?;
        response.into_result()
    }

    fn transactions(&self, user_id: i64) -> Result<Vec<RawRecord>> {
        let document: Value = self.get(&format!("/transaction/{}", user_id))?;
        if let Some(error) = document.get("error").and_then(Value::as_str) {
            return Err(AppError::Api(error.to_string()));
        }
        validate::parse_records_value(document)
    }

    fn add_transaction(&self, transaction: &NewTransaction) -> Result<String> {
        let reply: ApiReply = self.post("/transaction", transaction)?;
        reply.into_result()
    }

    fn delete_transaction(&self, user_id: i64, transaction_id: i64) -> Result<String> {
        let reply: ApiReply =
            self.delete(&format!("/delete_transaction/{}/{}", user_id, transaction_id))?;
        reply.into_result()
    }

    fn delete_user(&self, user_id: i64) -> Result<String> {
        let reply: ApiReply = self.delete(&format!("/delete_user/{}", user_id))?;
        reply.into_result()
    }

    fn overview(&self) -> Result<AdminOverview> {
        let response: OverviewResponse = self.get("/output")?;
        response.into_overview()
    }
}
