use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    auth::Credential,
    error::ClientError,
    model::{ErrorBody, MutationResponse, RegisterResponse, Task, TaskId, TaskList},
    schema::{CreateTaskSchema, FormBody, RegisterSchema, UpdateTaskSchema},
};

pub const TASKS_PATH: &str = "/tasks";
pub const REGISTER_PATH: &str = "/register";

/// Typed calls against the task backend. Success is any 2xx status.
#[derive(Debug, Clone)]
pub struct TaskApi {
    client: Client,
    base_url: String,
}

impl TaskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn task_path(id: TaskId) -> String {
        format!("{TASKS_PATH}/{id}")
    }

    /// Probes `GET /tasks` with a candidate credential. The body is discarded.
    pub async fn check_credential(&self, credential: &Credential) -> Result<(), ClientError> {
        let response = self
            .request(Method::GET, TASKS_PATH)
            .headers(credential.headers()?)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn register(&self, form: &RegisterSchema) -> Result<RegisterResponse, ClientError> {
        debug!(email = %form.email, "registering");
        let response = self
            .request(Method::POST, REGISTER_PATH)
            .multipart(form.to_form())
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(decode_lenient(response).await)
    }

    pub async fn list_tasks(&self, auth: HeaderMap) -> Result<Vec<Task>, ClientError> {
        let response = self
            .request(Method::GET, TASKS_PATH)
            .headers(auth)
            .send()
            .await?;
        let list: TaskList = decode(ensure_success(response).await?).await?;
        debug!(count = list.tasks.len(), "fetched tasks");
        Ok(list.tasks)
    }

    pub async fn create_task(
        &self,
        auth: HeaderMap,
        body: &CreateTaskSchema,
    ) -> Result<MutationResponse, ClientError> {
        let response = self
            .request(Method::POST, TASKS_PATH)
            .headers(auth)
            .multipart(body.to_form())
            .send()
            .await?;
        Ok(decode_lenient(ensure_success(response).await?).await)
    }

    pub async fn update_task(
        &self,
        auth: HeaderMap,
        id: TaskId,
        body: &UpdateTaskSchema,
    ) -> Result<MutationResponse, ClientError> {
        let response = self
            .request(Method::PUT, &Self::task_path(id))
            .headers(auth)
            .multipart(body.to_form())
            .send()
            .await?;
        Ok(decode_lenient(ensure_success(response).await?).await)
    }

    pub async fn delete_task(&self, auth: HeaderMap, id: TaskId) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &Self::task_path(id))
            .headers(auth)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = ErrorBody::parse_detail(&body);
    debug!(%status, ?detail, "request rejected");
    Err(ClientError::Status { status, detail })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// Mutations succeed on status alone; an unexpected body is only worth a warning.
async fn decode_lenient<T: DeserializeOwned + Default>(response: Response) -> T {
    match decode(response).await {
        Ok(value) => value,
        Err(e) => {
            warn!("ignoring unexpected response body: {e}");
            T::default()
        }
    }
}
