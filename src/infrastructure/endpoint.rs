use crate::connection::EndpointBuilder;
use crate::types::constants::{API_PATH_SEGMENT, TOKEN_QUERY_PARAM, channel_paths};
use crate::types::{RealtimeError, Result};
use std::sync::Arc;
use url::Url;

/// A realtime channel below `/ws/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Chat { conversation_id: String },
    UserStatus,
}

impl Channel {
    pub fn chat(conversation_id: impl Into<String>) -> Self {
        Self::Chat {
            conversation_id: conversation_id.into(),
        }
    }

    fn path(&self) -> String {
        match self {
            Self::Chat { conversation_id } => {
                format!("{}/{}", channel_paths::CHAT, conversation_id)
            }
            Self::UserStatus => channel_paths::USER_STATUS.to_string(),
        }
    }
}

/// Socket base derived from the REST API base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeEndpoint {
    base: Url,
}

impl RealtimeEndpoint {
    /// `https://host/api` becomes `wss://host`; `http` becomes `ws`.
    pub fn from_api_base(api_base: &str) -> Result<Self> {
        let mut base = Url::parse(api_base)?;

        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(RealtimeError::Endpoint(format!(
                    "unsupported scheme '{}' in {}",
                    other, api_base
                )));
            }
        };
        base.set_scheme(scheme)
            .map_err(|_| RealtimeError::Endpoint(format!("cannot rewrite scheme of {}", api_base)))?;

        let trimmed = base.path().trim_end_matches('/');
        let stripped = trimmed
            .strip_suffix(API_PATH_SEGMENT)
            .filter(|rest| rest.is_empty() || rest.ends_with('/'))
            .map(|rest| rest.trim_end_matches('/'))
            .unwrap_or(trimmed)
            .to_string();
        base.set_path(&stripped);
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `{base}/ws/{channel}/?token={token}`
    pub fn channel_url(&self, channel: &Channel, token: &str) -> Result<Url> {
        let mut url = self.base.clone();
        let path = format!(
            "{}/ws/{}/",
            self.base.path().trim_end_matches('/'),
            channel.path()
        );
        url.set_path(&path);
        url.query_pairs_mut()
            .clear()
            .append_pair(TOKEN_QUERY_PARAM, token);
        Ok(url)
    }

    /// Builder where the identity is the conversation id
    pub fn chat_builder(&self) -> EndpointBuilder {
        let endpoint = self.clone();
        Arc::new(move |identity: &str, token: &str| {
            endpoint.channel_url(&Channel::chat(identity), token)
        })
    }

    /// Builder for the global presence channel; the identity only gates eligibility
    pub fn user_status_builder(&self) -> EndpointBuilder {
        let endpoint = self.clone();
        Arc::new(move |_identity: &str, token: &str| {
            endpoint.channel_url(&Channel::UserStatus, token)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_api_base_becomes_wss_host() {
        let endpoint = RealtimeEndpoint::from_api_base("https://api.example.com/api").unwrap();
        let url = endpoint.channel_url(&Channel::chat("42"), "abc").unwrap();
        assert_eq!(url.as_str(), "wss://api.example.com/ws/chat/42/?token=abc");
    }

    #[test]
    fn test_http_with_trailing_slash_and_port() {
        let endpoint = RealtimeEndpoint::from_api_base("http://localhost:8000/api/").unwrap();
        let url = endpoint.channel_url(&Channel::UserStatus, "t").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/user-status/?token=t");
    }

    #[test]
    fn test_nested_prefix_is_kept() {
        let endpoint = RealtimeEndpoint::from_api_base("https://example.com/backend/api").unwrap();
        let url = endpoint.channel_url(&Channel::UserStatus, "t").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/backend/ws/user-status/?token=t");
    }

    #[test]
    fn test_only_a_whole_api_segment_is_stripped() {
        let endpoint = RealtimeEndpoint::from_api_base("https://example.com/myapi").unwrap();
        assert_eq!(endpoint.base().path(), "/myapi");
    }

    #[test]
    fn test_token_is_query_encoded() {
        let endpoint = RealtimeEndpoint::from_api_base("https://example.com/api").unwrap();
        let url = endpoint.channel_url(&Channel::UserStatus, "a b&c").unwrap();
        assert_eq!(url.query(), Some("token=a+b%26c"));
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!(matches!(
            RealtimeEndpoint::from_api_base("ftp://example.com/api"),
            Err(RealtimeError::Endpoint(_))
        ));
        assert!(matches!(
            RealtimeEndpoint::from_api_base("not a url"),
            Err(RealtimeError::UrlParse(_))
        ));
    }

    #[test]
    fn test_builders_use_identity_only_for_chat() {
        let endpoint = RealtimeEndpoint::from_api_base("https://example.com/api").unwrap();
        let chat = endpoint.chat_builder();
        let status = endpoint.user_status_builder();

        assert_eq!(
            chat("7", "tok").unwrap().as_str(),
            "wss://example.com/ws/chat/7/?token=tok"
        );
        assert_eq!(
            status("user-1", "tok").unwrap().as_str(),
            "wss://example.com/ws/user-status/?token=tok"
        );
    }
}
