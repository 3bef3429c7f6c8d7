use crate::{
    claims::{Claims, Role, TokenError},
    storage::{TokenStorage, TOKEN_KEY},
};
use std::{io, time::SystemTime};

/// Who the current user is, as far as the client can tell.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    /// [`UserInfo::ANONYMOUS_ID`] when nobody is logged in.
    pub user_id: i64,
    pub username: String,
    pub role: Option<Role>,
}

impl UserInfo {
    pub const ANONYMOUS_ID: i64 = -1;

    pub fn anonymous() -> Self {
        UserInfo {
            user_id: UserInfo::ANONYMOUS_ID,
            username: String::new(),
            role: None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id == UserInfo::ANONYMOUS_ID
    }
}

impl Default for UserInfo {
    fn default() -> Self { UserInfo::anonymous() }
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> UserInfo {
        UserInfo {
            user_id: claims.user_id,
            username: claims.username.clone(),
            role: Some(claims.role.clone()),
        }
    }
}

/// Coarse authentication state, as seen by the router.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Member,
    Admin,
}

/// The client-side session: the bearer token plus the identity decoded
/// from it.
///
/// Only the raw token is persisted; everything else is derived from it.
#[derive(Debug)]
pub struct Session {
    token: String,
    user_info: UserInfo,
    expires_at: Option<i64>,
    storage: Box<dyn TokenStorage>,
}

impl Session {
    /// Create an empty session. Call [`Session::init_user_info()`] to pick up
    /// a previously saved token.
    pub fn new<S: TokenStorage + 'static>(storage: S) -> Self {
        Session {
            token: String::new(),
            user_info: UserInfo::anonymous(),
            expires_at: None,
            storage: Box::new(storage),
        }
    }

    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    pub fn user_info(&self) -> &UserInfo { &self.user_info }

    pub fn expires_at(&self) -> Option<i64> { self.expires_at }

    pub fn storage(&self) -> &dyn TokenStorage { &*self.storage }

    /// Hydrate the session from the persisted token, discarding it if it has
    /// expired or can't be decoded.
    pub fn init_user_info(&mut self) -> Result<(), SessionError> {
        self.init_user_info_at(SystemTime::now())
    }

    pub fn init_user_info_at(
        &mut self,
        now: SystemTime,
    ) -> Result<(), SessionError> {
        let token = match self.storage.get(TOKEN_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => {
                log::debug!("No saved session");
                return Ok(());
            },
        };

        match Claims::decode(&token) {
            Ok(claims) if claims.is_expired_at(crate::unix_seconds(now)) => {
                log::info!("The saved session for {} has expired", claims.username);
                self.clear_token()
            },
            Ok(claims) => {
                log::debug!("Restored the session for {}", claims.username);
                self.apply(token, &claims);
                Ok(())
            },
            Err(e) => {
                log::warn!("Discarding an unreadable saved token: {}", e);
                self.clear_token()
            },
        }
    }

    /// Start a new session from a freshly issued token.
    ///
    /// The token is decoded before anything is touched, so a bad token leaves
    /// the existing session (and storage) as it was.
    pub fn set_token(&mut self, token: &str) -> Result<(), SessionError> {
        let claims = Claims::decode(token)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.apply(token.to_string(), &claims);

        log::info!("Logged in as {} ({})", claims.username, claims.role);
        Ok(())
    }

    /// Forget the token and identity, both in memory and in storage.
    pub fn clear_token(&mut self) -> Result<(), SessionError> {
        self.token.clear();
        self.user_info = UserInfo::anonymous();
        self.expires_at = None;
        self.storage.remove(TOKEN_KEY)?;

        log::debug!("Cleared the session");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool { self.is_logged_in_at(SystemTime::now()) }

    /// Is there a token, still valid at `now`, with a decoded identity?
    pub fn is_logged_in_at(&self, now: SystemTime) -> bool {
        !self.token.is_empty()
            && !self.is_expired_at(now)
            && !self.user_info.is_anonymous()
    }

    /// Clear the session if it holds a token that has since expired,
    /// returning whether anything was cleared.
    pub fn expire_if_stale(&mut self) -> Result<bool, SessionError> {
        self.expire_if_stale_at(SystemTime::now())
    }

    pub fn expire_if_stale_at(
        &mut self,
        now: SystemTime,
    ) -> Result<bool, SessionError> {
        if self.token.is_empty() || !self.is_expired_at(now) {
            return Ok(false);
        }

        log::info!("The session for {} has expired", self.user_info.username);
        self.clear_token()?;
        Ok(true)
    }

    pub fn auth_state_at(&self, now: SystemTime) -> AuthState {
        if !self.is_logged_in_at(now) {
            AuthState::Unauthenticated
        } else if self.user_info.role.as_ref().map_or(false, Role::is_admin) {
            AuthState::Admin
        } else {
            AuthState::Member
        }
    }

    fn is_expired_at(&self, now: SystemTime) -> bool {
        match self.expires_at {
            Some(exp) => exp <= crate::unix_seconds(now),
            None => true,
        }
    }

    fn apply(&mut self, token: String, claims: &Claims) {
        self.token = token;
        self.user_info = UserInfo::from(claims);
        self.expires_at = claims.expires_at;
    }
}

/// Errors raised while changing the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unable to read the token")]
    Token(#[from] TokenError),
    #[error("Unable to access the session storage")]
    Storage(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{claims::forge, storage::MemoryStorage};
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    const NOW: u64 = 1_700_000_000;

    fn now() -> SystemTime { UNIX_EPOCH + Duration::from_secs(NOW) }

    fn token(role: &str, exp: i64) -> String {
        forge(&json!({
            "userId": 42,
            "username": "alice",
            "role": role,
            "exp": exp,
        }))
    }

    fn stored(session: &Session) -> Option<String> {
        session.storage().get(TOKEN_KEY).unwrap()
    }

    #[test]
    fn a_new_session_is_anonymous() {
        let session = Session::new(MemoryStorage::new());

        assert_eq!(session.token(), None);
        assert_eq!(session.user_info(), &UserInfo::anonymous());
        assert!(!session.is_logged_in_at(now()));
        assert_eq!(session.auth_state_at(now()), AuthState::Unauthenticated);
    }

    #[test]
    fn setting_a_token_populates_the_identity_and_persists_it() {
        let mut session = Session::new(MemoryStorage::new());
        let tok = token("USER", NOW as i64 + 60);

        session.set_token(&tok).unwrap();

        assert_eq!(session.token(), Some(tok.as_str()));
        assert_eq!(
            session.user_info(),
            &UserInfo {
                user_id: 42,
                username: String::from("alice"),
                role: Some(Role::User),
            }
        );
        assert_eq!(stored(&session), Some(tok));
        assert!(session.is_logged_in_at(now()));
        assert_eq!(session.auth_state_at(now()), AuthState::Member);
    }

    #[test]
    fn logged_in_only_while_the_expiry_is_in_the_future() {
        let mut session = Session::new(MemoryStorage::new());
        session.set_token(&token("ADMIN", NOW as i64)).unwrap();

        assert!(session.is_logged_in_at(now() - Duration::from_secs(1)));
        assert!(!session.is_logged_in_at(now()));
        assert!(!session.is_logged_in_at(now() + Duration::from_secs(1)));
    }

    #[test]
    fn tokens_without_an_expiry_never_log_you_in() {
        let mut session = Session::new(MemoryStorage::new());
        let tok = forge(&json!({
            "userId": 42,
            "username": "alice",
            "role": "ADMIN",
        }));

        session.set_token(&tok).unwrap();

        assert!(!session.is_logged_in_at(UNIX_EPOCH));
        assert!(session.expire_if_stale_at(UNIX_EPOCH).unwrap());
    }

    #[test]
    fn a_bad_token_leaves_the_session_untouched() {
        let mut session = Session::new(MemoryStorage::new());
        let good = token("USER", NOW as i64 + 60);
        session.set_token(&good).unwrap();

        let got = session.set_token("definitely.not.a-jwt");

        assert!(matches!(got, Err(SessionError::Token(_))));
        assert_eq!(session.token(), Some(good.as_str()));
        assert_eq!(session.user_info().user_id, 42);
        assert_eq!(stored(&session), Some(good));
    }

    #[test]
    fn clearing_restores_the_defaults_and_empties_storage() {
        let mut session = Session::new(MemoryStorage::new());
        session.set_token(&token("ADMIN", NOW as i64 + 60)).unwrap();

        session.clear_token().unwrap();

        assert_eq!(session.token(), None);
        assert_eq!(session.user_info(), &UserInfo::anonymous());
        assert_eq!(session.expires_at(), None);
        assert_eq!(stored(&session), None);
    }

    #[test]
    fn reading_the_login_state_has_no_side_effects() {
        let mut session = Session::new(MemoryStorage::new());
        let tok = token("USER", NOW as i64 - 10);
        session.set_token(&tok).unwrap();

        assert!(!session.is_logged_in_at(now()));
        assert_eq!(stored(&session), Some(tok));
    }

    #[test]
    fn the_expiry_sweep_clears_stale_tokens() {
        let mut session = Session::new(MemoryStorage::new());
        session.set_token(&token("USER", NOW as i64 - 10)).unwrap();

        assert!(!session.is_logged_in_at(now()));
        let cleared = session.expire_if_stale_at(now()).unwrap();

        assert!(cleared);
        assert_eq!(stored(&session), None);
        assert_eq!(session.user_info(), &UserInfo::anonymous());
    }

    #[test]
    fn the_expiry_sweep_leaves_fresh_tokens_alone() {
        let mut session = Session::new(MemoryStorage::new());
        session.set_token(&token("USER", NOW as i64 + 10)).unwrap();

        assert!(!session.expire_if_stale_at(now()).unwrap());
        assert!(session.is_logged_in_at(now()));

        let mut empty = Session::new(MemoryStorage::new());
        assert!(!empty.expire_if_stale_at(now()).unwrap());
    }

    #[test]
    fn restore_a_saved_session_on_startup() {
        let tok = token("ADMIN", NOW as i64 + 60);
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, &tok).unwrap();
        let mut session = Session::new(storage);

        session.init_user_info_at(now()).unwrap();

        assert_eq!(session.token(), Some(tok.as_str()));
        assert_eq!(session.auth_state_at(now()), AuthState::Admin);
    }

    #[test]
    fn expired_saved_sessions_are_discarded_on_startup() {
        let mut storage = MemoryStorage::new();
        storage
            .set(TOKEN_KEY, &token("ADMIN", NOW as i64 - 60))
            .unwrap();
        let mut session = Session::new(storage);

        session.init_user_info_at(now()).unwrap();

        assert_eq!(session.token(), None);
        assert_eq!(stored(&session), None);
    }

    #[test]
    fn garbage_saved_tokens_are_discarded_on_startup() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "garbage").unwrap();
        let mut session = Session::new(storage);

        session.init_user_info_at(now()).unwrap();

        assert!(session.user_info().is_anonymous());
        assert_eq!(stored(&session), None);
    }
}
