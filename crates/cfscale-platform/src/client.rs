//! HTTP client for the Cloud Foundry v2 API.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST, USER_AGENT};
use http::{HeaderValue, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_rustls::TlsConnector;
use tracing::debug;

use cfscale_autoscale::{Apps, BoxFuture, Platform, build_snapshot};
use cfscale_core::{AppMeta, AppSnapshot, InstanceId, InstanceSample};

use crate::error::{PlatformError, PlatformResult};
use crate::tls;
use crate::v2::{AppEntity, AppState, OrgEntity, Page, Resource, ScaleRequest, SpaceEntity, decode_instance_stats};

const USER_AGENT_VALUE: &str = concat!("cfscale/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`CfClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://api.sys.example.com`.
    pub api_url: String,
    /// Pre-issued token, sent as `Authorization: bearer <token>`.
    pub token: Option<String>,
    /// Upper bound for each individual request.
    pub timeout: Duration,
    /// Accept any server certificate on `https://` endpoints.
    pub skip_ssl_validation: bool,
}

struct Tls {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// Cloud Foundry v2 API client.
///
/// Each request opens its own HTTP/1 connection, wrapped in TLS for
/// `https://` endpoints.
pub struct CfClient {
    /// `scheme://authority/prefix`, used in error messages.
    base: String,
    /// Path prefix of the API, without a trailing slash.
    prefix: String,
    /// `host[:port]` as configured, sent as the `Host` header.
    authority: String,
    /// `host:port` to connect to.
    addr: String,
    tls: Option<Tls>,
    authorization: Option<HeaderValue>,
    timeout: Duration,
}

impl CfClient {
    /// Create a client. Fails on malformed URLs and schemes other than
    /// `http` and `https`.
    pub fn new(config: ClientConfig) -> PlatformResult<Self> {
        let uri: Uri = config
            .api_url
            .parse()
            .map_err(|_| PlatformError::InvalidUrl(config.api_url.clone()))?;

        let (https, default_port) = match uri.scheme_str() {
            Some("http") => (false, 80),
            Some("https") => (true, 443),
            Some(other) => return Err(PlatformError::UnsupportedScheme(other.to_string())),
            None => return Err(PlatformError::InvalidUrl(config.api_url.clone())),
        };
        let (Some(authority), Some(host)) = (uri.authority(), uri.host()) else {
            return Err(PlatformError::InvalidUrl(config.api_url.clone()));
        };
        if uri.query().is_some() {
            return Err(PlatformError::InvalidUrl(config.api_url.clone()));
        }

        let addr = format!("{host}:{}", uri.port_u16().unwrap_or(default_port));
        let prefix = uri.path().trim_end_matches('/').to_string();
        let base = format!("{}://{authority}{prefix}", if https { "https" } else { "http" });

        let tls = if https {
            let server_name = ServerName::try_from(host.trim_matches(['[', ']']).to_string())
                .map_err(|_| PlatformError::InvalidUrl(config.api_url.clone()))?;
            Some(Tls {
                connector: tls::connector(config.skip_ssl_validation)?,
                server_name,
            })
        } else {
            None
        };

        let authorization = config
            .token
            .as_deref()
            .map(|t| HeaderValue::from_str(&format!("bearer {t}")))
            .transpose()
            .map_err(|_| PlatformError::InvalidToken)?;

        Ok(Self {
            base,
            prefix,
            authority: authority.to_string(),
            addr,
            tls,
            authorization,
            timeout: config.timeout,
        })
    }

    /// Full URL of an API path, for logs and errors.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Send one request and return the status and full body.
    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> PlatformResult<(StatusCode, Bytes)> {
        let url = self.url(path);

        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.prefix, path))
            .header(HOST, &self.authority)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE);
        if let Some(auth) = &self.authorization {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }
        let body = match body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };
        let req = builder.body(body).map_err(|source| PlatformError::Request {
            url: url.clone(),
            source,
        })?;

        let attempt = async {
            let stream = tokio::net::TcpStream::connect(self.addr.as_str())
                .await
                .map_err(|source| PlatformError::Connect {
                    url: url.clone(),
                    source,
                })?;

            match &self.tls {
                None => exchange(TokioIo::new(stream), req, &url).await,
                Some(tls) => {
                    let stream = tls
                        .connector
                        .connect(tls.server_name.clone(), stream)
                        .await
                        .map_err(|source| PlatformError::Tls {
                            url: url.clone(),
                            source,
                        })?;
                    exchange(TokioIo::new(stream), req, &url).await
                }
            }
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(PlatformError::Timeout { url }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let (status, body) = self.send(Method::GET, path, None).await?;
        if !status.is_success() {
            return Err(PlatformError::Status {
                method: Method::GET,
                url: self.url(path),
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map_err(|source| PlatformError::Decode {
            url: self.url(path),
            source,
        })
    }

    /// List every application, following pagination.
    pub async fn list_apps(&self) -> PlatformResult<Vec<Resource<AppEntity>>> {
        let mut apps = Vec::new();
        let mut next = Some("/v2/apps".to_string());

        while let Some(path) = next {
            let page: Page<AppEntity> = self.get_json(&path).await?;
            apps.extend(page.resources);
            next = page.next_url;
        }

        Ok(apps)
    }

    pub async fn get_space(&self, guid: &str) -> PlatformResult<SpaceEntity> {
        let space: Resource<SpaceEntity> = self.get_json(&format!("/v2/spaces/{guid}")).await?;
        Ok(space.entity)
    }

    pub async fn get_org(&self, guid: &str) -> PlatformResult<OrgEntity> {
        let org: Resource<OrgEntity> = self.get_json(&format!("/v2/organizations/{guid}")).await?;
        Ok(org.entity)
    }

    /// Per-instance samples of a started application.
    pub async fn get_app_stats(&self, guid: &str) -> PlatformResult<HashMap<InstanceId, InstanceSample>> {
        let raw: HashMap<InstanceId, Value> =
            self.get_json(&format!("/v2/apps/{guid}/stats")).await?;
        Ok(decode_instance_stats(raw))
    }

    /// Snapshot every application on the platform.
    ///
    /// Any failure aborts the whole fetch.
    pub async fn get_apps(&self) -> PlatformResult<Apps> {
        let listed = self.list_apps().await?;

        let mut spaces: HashMap<String, SpaceEntity> = HashMap::new();
        let mut orgs: HashMap<String, OrgEntity> = HashMap::new();
        let mut apps = Apps::new();

        for app in listed {
            let guid = app.metadata.guid;
            let entity = app.entity;

            let space = match spaces.get(&entity.space_guid) {
                Some(space) => space.clone(),
                None => {
                    let space = self
                        .get_space(&entity.space_guid)
                        .await
                        .map_err(|e| e.for_app(&guid, "space"))?;
                    spaces.insert(entity.space_guid.clone(), space.clone());
                    space
                }
            };

            let org = match orgs.get(&space.organization_guid) {
                Some(org) => org.clone(),
                None => {
                    let org = self
                        .get_org(&space.organization_guid)
                        .await
                        .map_err(|e| e.for_app(&guid, "org"))?;
                    orgs.insert(space.organization_guid.clone(), org.clone());
                    org
                }
            };

            let samples = if entity.state == AppState::Started {
                Some(
                    self.get_app_stats(&guid)
                        .await
                        .map_err(|e| e.for_app(&guid, "stats"))?,
                )
            } else {
                None
            };

            let meta = AppMeta {
                id: guid.clone(),
                name: entity.name,
                space: space.name,
                org: org.name,
                instances: entity.instances,
            };
            let snapshot = build_snapshot(meta, samples.as_ref());
            debug!(
                app = %snapshot.name,
                app_id = %snapshot.id,
                desired = snapshot.desired_instances,
                running = snapshot.running_instances,
                cpu = snapshot.cpu_pct,
                mem = snapshot.mem_pct,
                "app snapshot"
            );
            apps.insert(guid, snapshot);
        }

        Ok(apps)
    }

    /// Request `desired` instances for an application.
    ///
    /// The platform applies the change asynchronously; only `201 Created`
    /// counts as accepted.
    pub async fn scale_app(&self, app_id: &str, desired: u32) -> PlatformResult<()> {
        let path = format!("/v2/apps/{app_id}?async=true");
        let body = serde_json::to_vec(&ScaleRequest { instances: desired }).map_err(|source| {
            PlatformError::Decode {
                url: self.url(&path),
                source,
            }
        })?;

        let (status, resp) = self.send(Method::PUT, &path, Some(body)).await?;
        if status != StatusCode::CREATED {
            return Err(PlatformError::Status {
                method: Method::PUT,
                url: self.url(&path),
                status,
                body: String::from_utf8_lossy(&resp).into_owned(),
            });
        }

        Ok(())
    }
}

/// Run one HTTP/1 exchange over an established connection.
async fn exchange<I>(io: I, req: Request<Full<Bytes>>, url: &str) -> PlatformResult<(StatusCode, Bytes)>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|source| PlatformError::Transport {
            url: url.to_string(),
            source,
        })?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "platform connection closed with error");
        }
    });

    let resp = sender
        .send_request(req)
        .await
        .map_err(|source| PlatformError::Transport {
            url: url.to_string(),
            source,
        })?;
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|source| PlatformError::Body {
            url: url.to_string(),
            source,
        })?
        .to_bytes();

    Ok((status, body))
}

impl Platform for CfClient {
    fn fetch_apps(&self) -> BoxFuture<'_, anyhow::Result<Apps>> {
        Box::pin(async move { Ok(self.get_apps().await?) })
    }

    fn scale<'a>(&'a self, app: &'a AppSnapshot, desired: u32) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move { Ok(self.scale_app(&app.id, desired).await?) })
    }
}
