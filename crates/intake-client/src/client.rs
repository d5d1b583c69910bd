use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use intake_spec::{
    BackendError, IntakeBackend, Language, Organization, Patient, QuestionDefinition,
    ResponseRecord,
};

use crate::config::ClientConfig;

/// `IntakeBackend` over the intake REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(transport)?;

        Ok(Self {
            base_url: config.base_url()?,
            http_client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::config("api url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T>(&self, segments: &[&str]) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(method = "GET", url = %url, "backend request");
        let response = self.http_client.get(url).send().await.map_err(transport)?;
        read_json(response).await
    }

    async fn post_json<B>(&self, segments: &[&str], body: &B) -> Result<Response, BackendError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        debug!(method = "POST", url = %url, "backend request");
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await
    }
}

#[async_trait]
impl IntakeBackend for HttpBackend {
    async fn list_organizations(&self) -> Result<Vec<Organization>, BackendError> {
        self.get_json(&["clients"])
            .await
            .inspect_err(|err| error!(error = %err, "error fetching clients"))
    }

    async fn list_languages(&self) -> Result<Vec<Language>, BackendError> {
        self.get_json(&["languages"])
            .await
            .inspect_err(|err| error!(error = %err, "error fetching languages"))
    }

    async fn create_patient(&self, draft: &Patient) -> Result<Patient, BackendError> {
        let result = match self
            .post_json(&["clients", draft.organization_id.as_str(), "patients"], draft)
            .await
        {
            Ok(response) => read_json(response).await,
            Err(err) => Err(err),
        };
        result.inspect_err(|err| error!(error = %err, "error creating patient"))
    }

    async fn fetch_questions(
        &self,
        organization_id: &str,
        language_code: &str,
    ) -> Result<Vec<QuestionDefinition>, BackendError> {
        self.get_json(&["questions", organization_id, language_code])
            .await
            .inspect_err(|err| error!(error = %err, "error fetching questions"))
    }

    async fn submit_responses(
        &self,
        patient_id: &str,
        responses: &[ResponseRecord],
    ) -> Result<(), BackendError> {
        self.post_json(&["patients", patient_id, "patients-responses"], responses)
            .await
            .map(|_| ())
            .inspect_err(|err| error!(error = %err, "error submitting responses"))
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .ok()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
    Err(BackendError::api(status.as_u16(), message))
}

async fn read_json<T>(response: Response) -> Result<T, BackendError>
where
    T: DeserializeOwned,
{
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|err| BackendError::decode(err.to_string()))
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::transport(err.to_string())
}
