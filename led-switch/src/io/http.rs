use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::trace;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::{Client, RequestBuilder, Response, Url};

use crate::config::Config;
use crate::errors::{Error, TransportError};
use crate::io::Transport;

/// A [`Transport`] speaking plain HTTP to the LED endpoints.
///
/// Relative urls (such as `/ledstatus`) are resolved against the transport base url. When
/// `no_cache` is active, every request carries `Cache-Control: no-cache` and status reads get a
/// `_=<timestamp>` query parameter so no intermediate cache can answer with a stale LED state.
/// Posts always go to the exact control url.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    no_cache: bool,
}

impl HttpTransport {
    /// Creates an HTTP transport for the given base url, with default timeouts and cache busting.
    ///
    /// # Errors
    /// * `InvalidUrl`: the base url cannot be parsed.
    /// * `ClientBuild`: the underlying HTTP client cannot be created.
    pub fn new<U: AsRef<str>>(base_url: U) -> Result<Self, Error> {
        Self::from_config(&Config::default().with_base_url(base_url.as_ref()))
    }

    /// Creates an HTTP transport from a [`Config`]: base url, timeouts and cache busting policy.
    ///
    /// # Errors
    /// * `InvalidUrl`: the base url cannot be parsed.
    /// * `ClientBuild`: the underlying HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url).map_err(|err| TransportError::InvalidUrl {
            url: config.base_url.clone(),
            info: err.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout))
            .connect_timeout(Duration::from_millis(config.connect_timeout))
            .build()
            .map_err(|err| TransportError::ClientBuild {
                info: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            no_cache: config.no_cache,
        })
    }

    /// Enables or disables cache busting.
    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Retrieves the base url relative urls are resolved against.
    pub fn get_base_url(&self) -> &Url {
        &self.base_url
    }

    /// Indicates if cache busting is active.
    pub fn is_no_cache(&self) -> bool {
        self.no_cache
    }

    /// Resolves a (possibly relative) url against the base url.
    ///
    /// # Errors
    /// * `InvalidUrl`: the url cannot be joined to the base url.
    pub fn resolve(&self, url: &str) -> Result<Url, Error> {
        let resolved = self
            .base_url
            .join(url)
            .map_err(|err| TransportError::InvalidUrl {
                url: url.to_string(),
                info: err.to_string(),
            })?;
        Ok(resolved)
    }

    /// Appends the `_=<timestamp>` cache busting parameter when active. Only reads are busted:
    /// the control endpoint must receive its exact path.
    fn bust_cache(&self, mut url: Url) -> Url {
        if self.no_cache {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis())
                .unwrap_or_default();
            url.query_pairs_mut().append_pair("_", &timestamp.to_string());
        }
        url
    }

    /// Adds the cache related headers to a request.
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        match self.no_cache {
            true => request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache"),
            false => request,
        }
    }

    /// Sends a request and reads its body, turning failures into [`TransportError`]s.
    async fn send(
        method: &'static str,
        url: Url,
        request: RequestBuilder,
    ) -> Result<String, Error> {
        trace!("{} {}", method, url);
        let response = request
            .send()
            .await
            .map_err(|err| TransportError::RequestFailed {
                method,
                url: url.to_string(),
                info: err.to_string(),
            })?;
        Self::read_body(method, url, response).await
    }

    async fn read_body(
        method: &'static str,
        url: Url,
        response: Response,
    ) -> Result<String, Error> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::RequestFailed {
                method,
                url: url.to_string(),
                info: err.to_string(),
            })?;

        match status.is_success() {
            true => Ok(body),
            false => Err(Error::from(TransportError::BadStatus {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body,
            })),
        }
    }
}

impl Display for HttpTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [base_url={}, no_cache={}]",
            self.get_transport_name(),
            self.base_url,
            self.no_cache,
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, Error> {
        let url = self.bust_cache(self.resolve(url)?);
        let request = self.prepare(self.client.get(url.clone()));
        Self::send("GET", url, request).await
    }

    async fn post(&self, url: &str, body: String) -> Result<String, Error> {
        let url = self.resolve(url)?;
        let request = self.prepare(
            self.client
                .post(url.clone())
                .header(CONTENT_TYPE, "text/plain")
                .body(body),
        );
        Self::send("POST", url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let transport = HttpTransport::new("http://192.168.1.42").unwrap();
        assert_eq!(transport.get_base_url().as_str(), "http://192.168.1.42/");
        assert!(transport.is_no_cache());

        let transport = HttpTransport::new("not a url");
        assert!(matches!(
            transport,
            Err(Error::Transport {
                source: TransportError::InvalidUrl { .. }
            })
        ));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let transport = HttpTransport::new("http://192.168.1.42:8080/panel/")
            .unwrap()
            .with_no_cache(false);

        let url = transport.resolve("/ledstatus").unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.42:8080/ledstatus");

        let url = transport.resolve("led").unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.42:8080/panel/led");

        let url = transport.resolve("http://10.0.0.1/ledstatus").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1/ledstatus");
    }

    #[test]
    fn test_cache_busting() {
        let transport = HttpTransport::new("http://192.168.1.42").unwrap();

        let url = transport.resolve("/ledstatus").unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.42/ledstatus");

        let url = transport.bust_cache(url);
        assert_eq!(url.path(), "/ledstatus");
        let (key, value) = url.query_pairs().next().expect("cache busting parameter");
        assert_eq!(key, "_");
        assert!(value.parse::<u128>().is_ok());

        let transport = transport.with_no_cache(false);
        let url = transport.bust_cache(transport.resolve("/ledstatus").unwrap());
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_display_impl() {
        let transport = HttpTransport::new("http://localhost:8080")
            .unwrap()
            .with_no_cache(false);
        assert_eq!(
            format!("{}", transport),
            "HttpTransport [base_url=http://localhost:8080/, no_cache=false]"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Port 9 (discard) on localhost is closed on test machines.
        let config = Config::default()
            .with_base_url("http://127.0.0.1:9")
            .with_request_timeout(500);
        let transport = HttpTransport::from_config(&config).unwrap();
        let result = transport.get("/ledstatus").await;
        assert!(matches!(
            result,
            Err(Error::Transport {
                source: TransportError::RequestFailed { method: "GET", .. }
            })
        ));
    }
}
