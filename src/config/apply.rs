use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::TesterArgs;
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::http::parse_header;

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Options given on the
/// command line always win.
///
/// # Errors
///
/// Returns an error when config values are invalid or conflict with each other.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if config.data.is_some() && config.data_file.is_some() {
        return Err(AppError::config(ConfigError::Conflict {
            left: "data",
            right: "data_file",
        }));
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method.clone()
    {
        args.method = method;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        args.headers = parse_headers(headers)?;
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = ensure_positive(requests, "requests")?;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "qps")
        && let Some(qps) = config.qps
    {
        if !qps.is_finite() || qps < 0.0 {
            return Err(AppError::validation(ValidationError::InvalidQps { value: qps }));
        }
        args.qps = qps;
    }

    if !is_cli(matches, "timeout")
        && let Some(timeout) = config.timeout
    {
        args.timeout = timeout;
    }

    apply_body(args, matches, config);

    apply_string(
        &mut args.content_type,
        matches,
        "content_type",
        config.content_type.as_deref(),
    );
    apply_string(
        &mut args.basic_auth,
        matches,
        "basic_auth",
        config.basic_auth.as_deref(),
    );
    apply_string(
        &mut args.proxy,
        matches,
        "proxy",
        config.proxy.as_deref(),
    );
    apply_string(
        &mut args.host,
        matches,
        "host",
        config.host.as_deref(),
    );
    apply_string(
        &mut args.user_agent,
        matches,
        "user_agent",
        config.user_agent.as_deref(),
    );

    apply_flag(&mut args.h2, matches, "h2", config.h2);
    apply_flag(
        &mut args.disable_compression,
        matches,
        "disable_compression",
        config.disable_compression,
    );
    apply_flag(
        &mut args.disable_keepalive,
        matches,
        "disable_keepalive",
        config.disable_keepalive,
    );
    apply_flag(
        &mut args.disable_redirects,
        matches,
        "disable_redirects",
        config.disable_redirects,
    );
    apply_flag(&mut args.insecure, matches, "insecure", config.insecure);

    if !is_cli(matches, "output")
        && let Some(output) = config.output
    {
        args.output = output;
    }

    Ok(())
}

// A body given on the command line replaces both config body sources.
fn apply_body(args: &mut TesterArgs, matches: &ArgMatches, config: &ConfigFile) {
    if is_cli(matches, "data") || is_cli(matches, "data_file") {
        return;
    }
    if let Some(data) = config.data.clone() {
        args.data = Some(data);
    }
    if let Some(path) = config.data_file.clone() {
        args.data_file = Some(path);
    }
}

fn apply_string(
    target: &mut Option<String>,
    matches: &ArgMatches,
    name: &str,
    value: Option<&str>,
) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = Some(value.to_owned());
    }
}

fn apply_flag(target: &mut bool, matches: &ArgMatches, name: &str, value: Option<bool>) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = value;
    }
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive(value: usize, field: &'static str) -> AppResult<usize> {
    if value == 0 {
        return Err(AppError::config(ConfigError::FieldMustBePositive { field }));
    }
    Ok(value)
}

fn parse_headers(headers: &[String]) -> AppResult<Vec<(String, String)>> {
    let mut parsed = Vec::with_capacity(headers.len());
    for header in headers {
        parsed.push(
            parse_header(header)
                .map_err(|err| AppError::config(ConfigError::InvalidHeader { source: err }))?,
        );
    }
    Ok(parsed)
}
