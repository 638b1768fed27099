// File: ./src/client/mod.rs
//! HTTPS plumbing shared by the model and mail clients.
pub mod middleware;

use anyhow::{Context, Result, bail};
use http::{Request, Response, Uri};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tower::ServiceExt;
use tower_http::auth::AddAuthorization;
use tower_layer::Layer;

pub use middleware::{UserAgentLayer, UserAgentService};

pub type HttpsClient = UserAgentService<
    AddAuthorization<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>,
>;

fn tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();
    let result = rustls_native_certs::load_native_certs();
    for err in &result.errors {
        log::debug!("Skipping unreadable certificate source: {}", err);
    }
    root_store.add_parsable_certificates(result.certs);
    if root_store.is_empty() {
        // Plain http endpoints (local models, test servers) still work.
        log::warn!("No valid system certificates found; https requests will fail");
    }
    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

/// Builds a client that sends `Authorization: Bearer <token>` and our
/// User-Agent on every request.
pub fn build_client(bearer_token: &str) -> Result<HttpsClient> {
    if http::HeaderValue::from_str(&format!("Bearer {bearer_token}")).is_err() {
        bail!("API key contains characters that cannot be sent in a header");
    }

    let https_connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config())
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
    let auth_client = AddAuthorization::bearer(http_client, bearer_token);
    Ok(UserAgentLayer::default().layer(auth_client))
}

/// Posts a JSON body and returns the raw response.
pub async fn post_json(client: &HttpsClient, uri: &str, body: String) -> Result<Response<Incoming>> {
    let uri: Uri = uri
        .parse()
        .with_context(|| format!("Invalid endpoint URL '{}'", uri))?;
    let req = Request::post(uri.clone())
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body)?;
    client
        .clone()
        .oneshot(req)
        .await
        .with_context(|| format!("Request to {} failed", uri))
}

/// Reads a whole response body as text.
pub async fn read_text(response: Response<Incoming>) -> Result<String> {
    let bytes = response
        .into_body()
        .collect()
        .await
        .context("Failed to read response body")?
        .to_bytes();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fails with the status and body when the response is not a 2xx.
pub async fn ensure_success(response: Response<Incoming>) -> Result<Response<Incoming>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_text(response).await.unwrap_or_default();
    bail!("Server responded {}: {}", status, body.trim())
}
