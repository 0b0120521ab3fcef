// feed-client/src/auth.rs
use common::TwitchConfig;
use url::{form_urlencoded, Url};

/// Implicit-flow authorize URL the user opens to log in
pub fn authorize_url(config: &TwitchConfig) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&config.authorize_url)?;
    url.query_pairs_mut()
        .append_pair("response_type", "token")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes);
    Ok(url)
}

/// The location Twitch redirected back to after login
#[derive(Debug, Clone)]
pub struct RedirectLocation {
    url: Url,
}

impl RedirectLocation {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self { url: Url::parse(raw)? })
    }

    /// `access_token` from the fragment, if present and non-empty
    pub fn access_token(&self) -> Option<String> {
        let fragment = self.url.fragment()?;
        form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == "access_token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
    }

    pub fn clear_fragment(&mut self) {
        self.url.set_fragment(None);
    }

    pub fn fragment(&self) -> Option<&str> {
        self.url.fragment()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}
