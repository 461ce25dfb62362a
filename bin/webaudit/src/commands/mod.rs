pub mod audit_cmd;
pub mod serve;
pub mod status;
pub mod tools_cmd;

use webaudit_core::{Error, Result};

/// Audit targets must be well-formed HTTP(S) URLs with a host.
pub(crate) fn validate_url(input: &str) -> Result<()> {
    let parsed = url::Url::parse(input)
        .map_err(|e| Error::Validation(format!("Invalid URL '{}': {}", input, e)))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::Validation(format!(
                "Unsupported scheme '{}', only http/https can be audited",
                other
            )))
        }
    }
    if parsed.host_str().is_none() {
        return Err(Error::Validation(format!("URL '{}' has no host", input)));
    }
    Ok(())
}
