use crate::error::{Result, SearchError};
use crate::options::SearchOptions;
use crate::query::{search_url, SearchQuery};
use crate::search::SearchResults;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use ureq::{Agent, AgentBuilder, Error};

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the search client needs back from a GET request.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
}

/// The transport a [`Client`] delegates its single request to.
pub trait HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

/// Blocking transport backed by a shared [`ureq::Agent`].
#[derive(Debug)]
pub struct UreqClient {
    agent: Agent,
}

impl UreqClient {
    pub fn new() -> UreqClient {
        Self::with_settings(USER_AGENT, DEFAULT_TIMEOUT)
    }

    pub fn with_settings(user_agent: &str, timeout: Duration) -> UreqClient {
        let agent = AgentBuilder::new()
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(user_agent)
            .build();
        UreqClient { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("Fetching {url}");
        match self.agent.get(url).call() {
            Ok(response) => {
                let status = response.status();
                let status_text = response.status_text().to_owned();
                let body = response
                    .into_string()
                    .map_err(|err| SearchError::Transport(err.to_string()))?;
                let data = serde_json::from_str(&body)?;
                Ok(HttpResponse {
                    status,
                    status_text,
                    data,
                })
            }
            Err(Error::Status(status, response)) => {
                let status_text = response.status_text().to_owned();
                error!("{status} {status_text} for {url}");
                // Error bodies are usually JSON with a message, but not always.
                let body = response.into_string().unwrap_or_default();
                let data = serde_json::from_str(&body).unwrap_or(Value::String(body));
                Ok(HttpResponse {
                    status,
                    status_text,
                    data,
                })
            }
            Err(Error::Transport(transport)) => {
                let error = transport.to_string();
                error!("{error}");
                Err(SearchError::Transport(error))
            }
        }
    }
}

/// Search client for the address API.
///
/// Each call validates its options, sends exactly one request and either returns the decoded
/// feature collection or fails. Nothing is retried or cached, so one client can serve any
/// number of threads at once when its transport is `Sync`.
#[derive(Debug)]
pub struct Client<H = UreqClient> {
    http: H,
}

impl Client<UreqClient> {
    pub fn new() -> Self {
        Self::with_http(UreqClient::new())
    }
}

impl Default for Client<UreqClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HttpClient> Client<H> {
    pub fn with_http(http: H) -> Self {
        Client { http }
    }

    pub fn search(&self, term: &str, options: Option<&SearchOptions>) -> Result<SearchResults> {
        if let Some(options) = options {
            options.validate()?;
        }
        self.fetch(&search_url(term, options))
    }

    /// Runs a query whose options were checked when it was built.
    pub fn search_query(&self, query: &SearchQuery) -> Result<SearchResults> {
        self.search(&query.term, Some(&query.options))
    }

    fn fetch(&self, url: &str) -> Result<SearchResults> {
        debug!("Searching {url}");
        let response = self.http.get(url)?;
        if response.status != 200 {
            return Err(SearchError::Remote {
                status: response.status,
                status_text: response.status_text,
            });
        }
        let results: SearchResults = serde_json::from_value(response.data)?;
        debug!("{} results for {}", results.len(), results.query);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::cell::RefCell;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    struct Fixed {
        response: HttpResponse,
        urls: RefCell<Vec<String>>,
    }

    impl Fixed {
        fn new(status: u16, status_text: &str, data: Value) -> Self {
            Fixed {
                response: HttpResponse {
                    status,
                    status_text: status_text.into(),
                    data,
                },
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpClient for Fixed {
        fn get(&self, url: &str) -> Result<HttpResponse> {
            self.urls.borrow_mut().push(url.to_owned());
            Ok(self.response.clone())
        }
    }

    fn empty_collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "version": "draft",
            "query": "8 bd du port",
            "features": []
        })
    }

    #[test]
    fn returns_decoded_body_on_200() {
        let http = Fixed::new(200, "OK", empty_collection());
        let client = Client::with_http(&http);
        let results = client.search("8 bd du port", None).unwrap();
        assert!(results.is_feature_collection());
        assert!(results.is_empty());
        assert_eq!(
            *http.urls.borrow(),
            vec!["https://api-adresse.data.gouv.fr/search/?q=8+bd+du+port".to_string()]
        );
    }

    #[test]
    fn non_200_is_a_remote_failure() {
        let http = Fixed::new(400, "Bad Request", json!({"message": "q must contain"}));
        let err = Client::with_http(&http).search("x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
        assert_eq!(
            err.to_string(),
            "failed to get the results with message Bad Request (code: 400)"
        );
    }

    #[test]
    fn other_success_codes_are_failures_too() {
        let http = Fixed::new(204, "No Content", Value::Null);
        let err = Client::with_http(&http).search("x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
    }

    #[test]
    fn invalid_options_never_reach_the_transport() {
        let http = Fixed::new(200, "OK", empty_collection());
        let options = SearchOptions::new().latitude(91.0);
        let err = Client::with_http(&http)
            .search("x", Some(&options))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(http.urls.borrow().is_empty());
    }

    #[test]
    fn minimal_collection_is_returned() {
        let http = Fixed::new(200, "OK", json!({"type": "FeatureCollection", "features": []}));
        let results = Client::with_http(&http).search("x", None).unwrap();
        assert!(results.is_feature_collection());
        assert!(results.is_empty());
    }

    #[test]
    fn body_without_features_is_a_decode_error() {
        for body in [json!({"type": "FeatureCollection"}), json!("not a collection")] {
            let http = Fixed::new(200, "OK", body);
            let err = Client::with_http(&http).search("x", None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decode);
        }
    }

    /// Answers a single request on a local port with `status_line` and `body`, returning the
    /// URL to request.
    fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/search/?q=x")
    }

    #[test]
    fn ureq_returns_json_body() {
        let url = serve_once("200 OK", r#"{"type":"FeatureCollection","features":[]}"#);
        let response = UreqClient::new().get(&url).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.data["type"], "FeatureCollection");
    }

    #[test]
    fn ureq_non_json_200_is_a_decode_error() {
        let url = serve_once("200 OK", "not json");
        let err = UreqClient::new().get(&url).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn ureq_error_status_becomes_a_response() {
        let url = serve_once("503 Service Unavailable", r#"{"message":"down"}"#);
        let response = UreqClient::new().get(&url).unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
        assert_eq!(response.data, json!({"message": "down"}));

        let url = serve_once("400 Bad Request", "q must contain at least 3 chars");
        let response = UreqClient::new().get(&url).unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.data, json!("q must contain at least 3 chars"));
    }

    #[test]
    fn ureq_error_status_surfaces_as_remote_failure() {
        struct Local(String);

        impl HttpClient for Local {
            fn get(&self, _url: &str) -> Result<HttpResponse> {
                UreqClient::new().get(&self.0)
            }
        }

        let url = serve_once("503 Service Unavailable", "");
        let err = Client::with_http(Local(url)).search("x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
        assert_eq!(
            err.to_string(),
            "failed to get the results with message Service Unavailable (code: 503)"
        );
    }

    #[test]
    fn ureq_connection_refused_is_a_transport_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = UreqClient::new()
            .get(&format!("http://{addr}/search/?q=x"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
