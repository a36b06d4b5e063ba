use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::error::{AppResult, ValidationError};
use crate::http::{RequestTemplate, parse_method};
use crate::work::WorkSpec;

use super::TesterArgs;
use super::parsers::parse_proxy;

impl TesterArgs {
    /// Builds the run description from parsed (and config-merged) arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or invalid, a header or
    /// credential is malformed, both body sources are set, the body file
    /// cannot be read, or fewer requests than workers are requested.
    pub fn into_work_spec(self) -> AppResult<WorkSpec> {
        let url = self.url.as_deref().ok_or(ValidationError::MissingUrl)?;
        if self.requests < self.concurrency {
            return Err(ValidationError::RequestsBelowConcurrency {
                requests: self.requests,
                concurrency: self.concurrency,
            }
            .into());
        }

        let mut template = RequestTemplate::new(parse_method(&self.method)?, url)?;
        for (name, value) in &self.headers {
            template = if name.eq_ignore_ascii_case("user-agent") {
                template.set_header(name, value)?
            } else {
                template.header(name, value)?
            };
        }
        if let Some(content_type) = self.content_type.as_deref() {
            template = template.content_type(content_type)?;
        }
        if let Some(user_agent) = self.user_agent.as_deref() {
            template = template.user_agent(user_agent)?;
        }
        if let Some(credentials) = self.basic_auth.as_deref() {
            template = template.basic_auth(credentials)?;
        }
        if let Some(host) = self.host.as_deref() {
            template = template.host(host)?;
        }

        let body = read_body(self.data, self.data_file.as_deref())?;
        let proxy = self.proxy.as_deref().map(parse_proxy).transpose()?;

        let mut spec = WorkSpec::new(template, self.requests, self.concurrency);
        spec.body = body;
        spec.timeout = (self.timeout > 0).then_some(Duration::from_secs(self.timeout));
        spec.qps = Some(self.qps).filter(|qps| *qps != 0.0);
        spec.h2 = self.h2;
        spec.disable_compression = self.disable_compression;
        spec.disable_keepalive = self.disable_keepalive;
        spec.disable_redirects = self.disable_redirects;
        spec.insecure = self.insecure;
        spec.output = self.output;
        spec.proxy = proxy;
        spec.validate()?;

        debug!(
            "Built work spec: {} {} (n={}, c={})",
            spec.request.method(),
            spec.request.url(),
            spec.requests,
            spec.concurrency
        );
        Ok(spec)
    }
}

fn read_body(data: Option<String>, data_file: Option<&str>) -> Result<Bytes, ValidationError> {
    match (data, data_file) {
        (Some(_), Some(_)) => Err(ValidationError::BodyConflict),
        (Some(data), None) => Ok(Bytes::from(data)),
        (None, Some(path)) => std::fs::read(path)
            .map(Bytes::from)
            .map_err(|source| ValidationError::ReadBodyFile {
                path: path.to_owned(),
                source,
            }),
        (None, None) => Ok(Bytes::new()),
    }
}
