//! Rendering for the verification email body.

use url::Url;

use crate::domain::VerificationToken;

/// Subject line of the verification email.
pub const VERIFICATION_SUBJECT: &str = "Welcome to Contacts";

/// Absolute verification link for `token` under `public_host`.
///
/// `public_host` is expected to end with a slash so the API path is appended
/// rather than replacing the last segment.
pub fn verification_link(public_host: &Url, token: &VerificationToken) -> String {
    format!("{public_host}api/auth/verify/{}", token.as_str())
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// HTML body greeting `first_name` and linking to `link`.
pub(crate) fn render_verification_body(first_name: &str, public_host: &Url, link: &str) -> String {
    let name = escape_html(first_name);
    let host = escape_html(public_host.as_str());
    let link = escape_html(link);
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body>\n\
         <p>Hi {name},</p>\n\
         <p>Thanks for signing up at <a href=\"{host}\">{host}</a>.</p>\n\
         <p>Please confirm your email address by following this link:</p>\n\
         <p><a href=\"{link}\">{link}</a></p>\n\
         <p>If you did not create an account you can ignore this message.</p>\n\
         </body>\n\
         </html>\n"
    )
}
