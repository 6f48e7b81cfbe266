//! Page readiness and URLs
//!
//! - `ready?` asks the type's ready predicate and treats any error as
//!   "not ready".
//! - `when_ready` blocks until the predicate holds or the page ready limit
//!   runs out.
//! - Page types may carry a URL template with `{param}` placeholders,
//!   filled from the container's params; `goto` sends the rendered URL to
//!   the browser.

use crate::container::Container;
use crate::result::{EdslError, EdslResult};
use crate::value::Value;
use crate::wait::{self, WaitOptions};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

const PLACEHOLDER: &str = r"\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// `{param}` matcher, compiled on first use
fn placeholder_regex() -> EdslResult<&'static Regex> {
    static PLACEHOLDER_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(PLACEHOLDER))
        .as_ref()
        .map_err(|err| EdslError::Pattern(err.clone()))
}

/// Where a page's URL template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageUrl {
    /// Literal template
    Template(String),
    /// Template returned by dispatching this operation on the page
    Operation(String),
}

impl Container {
    /// `ready?`: the ready predicate's answer, `false` if it fails.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match self.check_ready() {
            Ok(ready) => ready,
            Err(err) => {
                debug!(container = self.type_name(), error = %err, "ready check failed");
                false
            }
        }
    }

    /// Limit `when_ready` uses when none is given
    #[must_use]
    pub fn page_ready_limit(&self) -> Duration {
        self.config().page_ready_limit()
    }

    /// Block until the ready predicate holds.
    ///
    /// Errors from the predicate propagate; running past `limit` (default
    /// [`Container::page_ready_limit`]) raises [`EdslError::ReadyTimeout`].
    pub fn when_ready(&self, limit: Option<Duration>) -> EdslResult<Arc<Self>> {
        let limit = limit.unwrap_or_else(|| self.page_ready_limit());
        let options = WaitOptions::new()
            .with_timeout_duration(limit)
            .with_poll_interval(self.config().poll_interval_ms);

        match wait::wait_for_function(|| self.check_ready(), &options) {
            Ok(result) => {
                debug!(
                    container = self.type_name(),
                    attempts = result.attempts,
                    elapsed_ms = result.elapsed.as_millis(),
                    "page ready"
                );
                self.handle()
            }
            Err(EdslError::Timeout { .. }) => {
                warn!(container = self.type_name(), limit_secs = limit.as_secs_f64(), "page not ready in time");
                Err(EdslError::ReadyTimeout {
                    limit_secs: limit.as_secs_f64(),
                    container: self.type_name().to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// The page URL with every `{param}` filled in
    pub fn page_url_value(&self) -> EdslResult<String> {
        let template = match self.container_type().page_url() {
            Some(PageUrl::Template(template)) => template.clone(),
            Some(PageUrl::Operation(operation)) => {
                let value = self.dispatch(operation, &[])?;
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| EdslError::InvalidArguments {
                        operation: operation.clone(),
                        message: format!("expected a URL string, got {}", value.kind()),
                    })?
            }
            None => {
                return Err(EdslError::NoPageUrl {
                    container: self.type_name().to_string(),
                })
            }
        };
        self.render_url(&template)
    }

    /// Navigate the browser to [`Container::page_url_value`]
    pub fn goto(&self) -> EdslResult<Value> {
        let url = self.page_url_value()?;
        let browser = self.browser()?;
        debug!(container = self.type_name(), %url, "goto");
        browser.call("goto", &[Value::Str(url)])
    }

    fn check_ready(&self) -> EdslResult<bool> {
        match self.container_type().ready_predicate() {
            Some(ready) => ready(self),
            None => Ok(true),
        }
    }

    fn render_url(&self, template: &str) -> EdslResult<String> {
        let placeholder = placeholder_regex()?;
        let mut url = String::with_capacity(template.len());
        let mut last = 0;
        for captures in placeholder.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            url.push_str(&template[last..whole.start()]);
            url.push_str(&self.url_param(name.as_str())?);
            last = whole.end();
        }
        url.push_str(&template[last..]);
        Ok(url)
    }

    fn url_param(&self, name: &str) -> EdslResult<String> {
        let missing = || EdslError::MissingUrlParam {
            param: name.to_string(),
            container: self.type_name().to_string(),
        };
        match self.params().get(name) {
            Some(Value::Str(text)) => Ok(text.clone()),
            Some(Value::Int(n)) => Ok(n.to_string()),
            Some(Value::Float(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(Value::Null) | None => Err(missing()),
            Some(other) => Err(EdslError::InvalidArguments {
                operation: format!("{{{name}}}"),
                message: format!("URL parameter must be a scalar, got {}", other.kind()),
            }),
        }
    }
}
