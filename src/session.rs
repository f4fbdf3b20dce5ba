//! Login and validation requests against the target service.

use rand::Rng;
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::StatusCode;

use crate::config::ProtocolConfig;

/// Upper bound (exclusive) for the random numeric suffix filled into the
/// email template.
pub const MAX_EMAIL_SUFFIX: u32 = 100;

/// HTTP client for the login/validation service.
///
/// One instance is shared across all concurrent tasks of a run; reqwest
/// multiplexes connections internally. Per-item failures are logged here
/// and never retried -- a failed attempt simply yields nothing.
pub struct ServiceClient {
    http: reqwest::Client,
    host: String,
    protocol: ProtocolConfig,
    xsrf: String,
    password: String,
}

impl ServiceClient {
    pub fn new(host: String, protocol: ProtocolConfig, xsrf: String, password: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            host,
            protocol,
            xsrf,
            password,
        }
    }

    /// Attempt one login and harvest the session cookie.
    ///
    /// Sends the JSON `{"username", "password"}` payload with the XSRF
    /// cookie, the XSRF header, and the given user-agent. Returns the
    /// session cookie value on a 200 response that carries one; any other
    /// outcome is logged and yields `None`.
    pub async fn create_session(&self, username: &str, user_agent: &str) -> Option<String> {
        let payload = serde_json::json!({
            "username": username,
            "password": self.password,
        });

        let resp = self
            .http
            .post(format!("{}{}", self.host, self.protocol.login_path))
            .header(
                COOKIE,
                format!("{}={}", self.protocol.xsrf_cookie, self.xsrf),
            )
            .header(self.protocol.xsrf_header.as_str(), self.xsrf.as_str())
            .header(USER_AGENT, user_agent)
            .json(&payload)
            .send()
            .await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(username, error = %e, "login request failed");
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(username, %status, %body, "failed to create session");
            return None;
        }

        let cookie = resp
            .cookies()
            .find(|c| c.name() == self.protocol.session_cookie)
            .map(|c| c.value().to_string());
        if cookie.is_none() {
            tracing::warn!(username, "login succeeded but response carried no session cookie");
        }
        cookie
    }

    /// Validate one harvested session cookie.
    ///
    /// Issues a GET to the current-user endpoint with the session and XSRF
    /// cookies attached. A 200 is success and produces no output; anything
    /// else logs the cookie value and the status or transport error.
    pub async fn validate_session(&self, cookie: &str) -> bool {
        let resp = self
            .http
            .get(format!("{}{}", self.host, self.protocol.validate_path))
            .header(
                COOKIE,
                format!(
                    "{}={};{}={}",
                    self.protocol.xsrf_cookie, self.xsrf, self.protocol.session_cookie, cookie
                ),
            )
            .header(self.protocol.xsrf_header.as_str(), self.xsrf.as_str())
            .send()
            .await;

        match resp {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                tracing::warn!(cookie, status = %resp.status(), "session is invalid");
                false
            }
            Err(e) => {
                tracing::warn!(cookie, error = %e, "validation request failed");
                false
            }
        }
    }
}

/// Fill the email template's `{}` placeholder with `n`.
pub fn fill_template(template: &str, n: u32) -> String {
    template.replacen("{}", &n.to_string(), 1)
}

/// Produce a login username from the template with a random suffix.
pub fn random_username(template: &str) -> String {
    let n = rand::thread_rng().gen_range(0..MAX_EMAIL_SUFFIX);
    fill_template(template, n)
}

/// A usable email template contains exactly one `{}` placeholder.
pub fn template_is_valid(template: &str) -> bool {
    template.matches("{}").count() == 1
}
