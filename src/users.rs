//! User profile lookup against the public users API.

use crate::error::FetchError;
use crate::model::UserProfile;
use reqwest::StatusCode;

/// Capability: fetch one user profile by id.
pub trait UserSource {
    fn fetch_user(&self, id: i64) -> Result<UserProfile, FetchError>;
}

impl<S: UserSource + ?Sized> UserSource for &S {
    fn fetch_user(&self, id: i64) -> Result<UserProfile, FetchError> {
        (**self).fetch_user(id)
    }
}

/// `GET {base_url}/{id}` over blocking HTTP.
pub struct HttpUserSource {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpUserSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn user_url(&self, id: i64) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

impl UserSource for HttpUserSource {
    fn fetch_user(&self, id: i64) -> Result<UserProfile, FetchError> {
        let resp = self
            .http
            .get(self.user_url(id))
            .send()
            .map_err(|e| FetchError::Transport {
                id,
                source: e.into(),
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::NotFound {
                id,
                status: status.as_u16(),
            });
        }

        resp.json::<UserProfile>()
            .map_err(|e| FetchError::Decode {
                id,
                source: e.into(),
            })
    }
}
