use parking_lot::RwLock;

/// The signed-in user's access token, shared by every component that talks
/// to the API.
#[derive(Debug, Default)]
pub struct Session {
    access_token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(access_token: impl Into<String>) -> Self {
        Self {
            access_token: RwLock::new(Some(access_token.into())),
        }
    }

    pub fn sign_in(&self, access_token: impl Into<String>) {
        *self.access_token.write() = Some(access_token.into());
    }

    pub fn sign_out(&self) {
        *self.access_token.write() = None;
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.read().is_some()
    }
}
