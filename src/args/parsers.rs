use reqwest::Url;

use crate::error::ValidationError;

pub(super) fn parse_proxy(value: &str) -> Result<Url, ValidationError> {
    Url::parse(value.trim()).map_err(|source| ValidationError::InvalidProxy {
        url: value.to_owned(),
        source,
    })
}

pub(super) fn parse_rate(value: &str) -> Result<f64, ValidationError> {
    let qps = value
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidQps { value: f64::NAN })?;
    if !qps.is_finite() || qps < 0.0 {
        return Err(ValidationError::InvalidQps { value: qps });
    }
    Ok(qps)
}
