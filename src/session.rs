use reqwest::blocking::Client;
use scraper::Html;
use url::Url;

use crate::error::{Error, Result};
use crate::parse::ListPage;

pub(crate) static BASE_URL: &str = "https://www.eetlijst.nl/";

/// Authenticated state against the site: the opaque session identifier plus
/// a cookie-carrying HTTP client. Owned by exactly one [`crate::Eetlijst`]
/// instance; there is no client-side expiry tracking, the server decides
/// when the session dies.
#[derive(Debug)]
pub struct Session {
    id: String,
    client: Client,
}

fn make_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .gzip(true)
        .build()
        .expect("client creation should succeed")
}

fn endpoint(path: &str, params: &[(&str, &str)]) -> Url {
    let mut url = Url::parse(&format!("{BASE_URL}{path}")).expect("base url should be valid");
    for (key, value) in params {
        url.query_pairs_mut().append_pair(key, value);
    }
    url
}

/// Strip the session identifier from the post-login redirect URL. This is
/// the single place that knows how the site communicates a fresh session,
/// and the first thing to revisit when the site changes again.
fn session_id_from_url(url: &Url) -> Result<String> {
    if url.query_pairs().any(|(key, value)| key == "r" && value == "failed") {
        return Err(Error::authentication(
            "username and/or password incorrect",
        ));
    }

    url.query_pairs()
        .find(|(key, _)| key == "session_id")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error::authentication("no session identifier in login response"))
}

impl Session {
    /// Log in with credentials. The site answers a successful login with a
    /// redirect to `main.php?session_id=...` and a failed one with a
    /// redirect to `login.php?r=failed`.
    pub fn login(username: &str, password: &str) -> Result<Self> {
        let client = make_client();
        let url = endpoint("login.php", &[("login", username), ("pass", password)]);

        let response = client.get(url).send()?.error_for_status()?;
        let id = session_id_from_url(response.url())?;
        log::debug!("logged in, session id {id}");

        Ok(Self { id, client })
    }

    /// Adopt a previously obtained session identifier, trusting the caller.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client: make_client(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// One lightweight authenticated round trip. Transport failures, bad
    /// status codes, a bounce to the login page or an unparsable page all
    /// count as invalid; nothing is retried.
    pub fn is_valid(&self) -> bool {
        match self.fetch_list_page() {
            Ok(html) => ListPage::from_html(&Html::parse_document(&html)).is_ok(),
            Err(e) => {
                log::debug!("session validation failed: {e}");
                false
            }
        }
    }

    /// GET the list page. A redirect back to `login.php` means the server
    /// no longer accepts this session.
    pub(crate) fn fetch_list_page(&self) -> Result<String> {
        let url = endpoint("main.php", &[("session_id", &self.id)]);
        let response = self.client.get(url).send()?.error_for_status()?;

        if response.url().path().ends_with("login.php") {
            return Err(Error::session_expired(
                "server redirected to the login page",
            ));
        }

        response.text().map_err(Error::from)
    }

    /// POST to the list page. The form is stateful: the site expects its
    /// full baseline field set on every submission, so the caller's fields
    /// override the baseline rather than standing alone.
    pub(crate) fn post_list_page(&self, fields: Vec<(String, String)>) -> Result<String> {
        let mut form: Vec<(String, String)> = vec![
            ("session_id".to_string(), self.id.clone()),
            ("messageboard".to_string(), String::new()),
            ("veranderdag".to_string(), String::new()),
            ("nieuwetijd".to_string(), String::new()),
            ("submittype".to_string(), "2".to_string()),
            ("who".to_string(), "-1".to_string()),
            ("what".to_string(), "-1".to_string()),
            ("day[]".to_string(), String::new()),
        ];

        for (key, value) in fields {
            if let Some(slot) = form.iter_mut().find(|(name, _)| *name == key) {
                slot.1 = value;
            } else {
                form.push((key, value));
            }
        }

        let url = endpoint("main.php", &[]);
        let response = self
            .client
            .post(url)
            .form(&form)
            .send()?
            .error_for_status()?;

        if response.url().path().ends_with("login.php") {
            return Err(Error::session_expired(
                "server redirected to the login page",
            ));
        }

        response.text().map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_stripped_from_redirect() {
        let url = Url::parse(
            "https://www.eetlijst.nl/main.php?session_id=bc731753a2d0fecccf12518759108b5b",
        )
        .unwrap();
        assert_eq!(
            session_id_from_url(&url).unwrap(),
            "bc731753a2d0fecccf12518759108b5b"
        );
    }

    #[test]
    fn failed_login_redirect_is_rejected() {
        let url = Url::parse("https://www.eetlijst.nl/login.php?r=failed").unwrap();
        assert!(matches!(
            session_id_from_url(&url),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn redirect_without_identifier_is_rejected() {
        let url = Url::parse("https://www.eetlijst.nl/main.php").unwrap();
        assert!(matches!(
            session_id_from_url(&url),
            Err(Error::Authentication(_))
        ));
    }
}
