use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use reqwest::header::{
    AUTHORIZATION, CONTENT_TYPE, HOST, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use reqwest::{Body, Method, Request, Url};

use crate::error::ValidationError;

pub const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

/// The request every worker issues. Shared read-only for the whole run; each
/// call gets its own copy through [`clone_request`].
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl RequestTemplate {
    /// Builds a template for `method url` with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL does not parse or is not http(s).
    pub fn new(method: Method, url: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(url).map_err(|source| ValidationError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ValidationError::UnsupportedScheme {
                    scheme: other.to_owned(),
                });
            }
        }
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        Ok(Self {
            method,
            url,
            headers,
        })
    }

    /// Appends a header; repeated names keep every value.
    ///
    /// # Errors
    ///
    /// Returns an error when the name or value is not a valid header token.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ValidationError> {
        let (name, value) = parse_header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Replaces every value of a header with `value`.
    ///
    /// # Errors
    ///
    /// Returns an error when the name or value is not a valid header token.
    pub fn set_header(mut self, name: &str, value: &str) -> Result<Self, ValidationError> {
        let (name, value) = parse_header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns an error when `content_type` is not a valid header value.
    pub fn content_type(self, content_type: &str) -> Result<Self, ValidationError> {
        self.set_header(CONTENT_TYPE.as_str(), content_type)
    }

    /// # Errors
    ///
    /// Returns an error when `user_agent` is not a valid header value.
    pub fn user_agent(self, user_agent: &str) -> Result<Self, ValidationError> {
        self.set_header(USER_AGENT.as_str(), user_agent)
    }

    /// Overrides the `Host` header sent to the target.
    ///
    /// # Errors
    ///
    /// Returns an error when `host` is not a valid header value.
    pub fn host(self, host: &str) -> Result<Self, ValidationError> {
        self.set_header(HOST.as_str(), host)
    }

    /// Sets `Authorization: Basic ...` from a `user:pass` pair.
    ///
    /// # Errors
    ///
    /// Returns an error when `credentials` has no `:` separator.
    pub fn basic_auth(self, credentials: &str) -> Result<Self, ValidationError> {
        let Some((user, pass)) = credentials.split_once(':') else {
            return Err(ValidationError::InvalidBasicAuth {
                value: credentials.to_owned(),
            });
        };
        let encoded = encode_basic_credentials(user, pass);
        self.set_header(AUTHORIZATION.as_str(), &format!("Basic {}", encoded))
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Produces an independent request from the shared template.
///
/// Header entries are copied one by one into a fresh map, so mutating the
/// returned request never reaches the template or any sibling clone. The body
/// is attached only when non-empty; `Bytes` is immutable, so sharing its
/// backing buffer across clones cannot alias mutable state.
#[must_use]
pub fn clone_request(template: &RequestTemplate, body: &Bytes) -> Request {
    let mut request = Request::new(template.method.clone(), template.url.clone());
    let headers = request.headers_mut();
    headers.reserve(template.headers.len());
    for (name, value) in &template.headers {
        headers.append(name.clone(), value.clone());
    }
    if !body.is_empty() {
        *request.body_mut() = Some(Body::from(body.clone()));
    }
    request
}

/// Parses a `Name: value` header line.
///
/// # Errors
///
/// Returns an error when the line has no `:` separator.
pub fn parse_header(line: &str) -> Result<(String, String), ValidationError> {
    match line.split_once(':') {
        Some((key, value)) => Ok((key.trim().to_owned(), value.trim().to_owned())),
        None => Err(ValidationError::InvalidHeaderFormat {
            value: line.to_owned(),
        }),
    }
}

/// Parses an HTTP method token, accepting any extension method.
///
/// # Errors
///
/// Returns an error when `value` is not a valid method token.
pub fn parse_method(value: &str) -> Result<Method, ValidationError> {
    Method::from_bytes(value.trim().to_ascii_uppercase().as_bytes()).map_err(|_err| {
        ValidationError::InvalidMethod {
            value: value.to_owned(),
        }
    })
}

fn parse_header_pair(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), ValidationError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_err| ValidationError::InvalidHeaderName {
            name: name.to_owned(),
        })?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_err| ValidationError::InvalidHeaderValue {
            name: name.to_owned(),
        })?;
    Ok((header_name, header_value))
}

fn encode_basic_credentials(user: &str, pass: &str) -> String {
    B64.encode(format!("{}:{}", user, pass))
}
