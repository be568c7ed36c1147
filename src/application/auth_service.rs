use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{LoginRequest, Session, SessionUser, SignupRequest, normalize_email};
use crate::infrastructure::security::{
    generate_token, hash_password, validate_token, verify_dummy_password, verify_password,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

const MSG_REQUIRED: &str = "Email and password are required.";
const MSG_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";
const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const MSG_NOT_AUTHENTICATED: &str = "Not authenticated.";

/// Issues and checks stateless sessions. Everything about a session lives in
/// the signed token; the server keeps no session table.
pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    session_secret: String,
    session_ttl_secs: u64,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        session_secret: String,
        session_ttl_secs: u64,
    ) -> Self {
        Self {
            user_repository,
            session_secret,
            session_ttl_secs,
        }
    }

    pub fn session_ttl_secs(&self) -> u64 {
        self.session_ttl_secs
    }

    #[instrument(skip(self, req))]
    pub async fn signup(&self, req: SignupRequest) -> Result<Session> {
        trace!("Starting signup");
        let email = normalize_email(&req.email);
        let password = req.password.trim();

        if email.is_empty() || password.is_empty() {
            return Err(DomainError::Validation(MSG_REQUIRED.to_string()).into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(MSG_PASSWORD_TOO_SHORT.to_string()).into());
        }

        let password_hash = hash_password(password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = self
            .user_repository
            .insert_user(&email, &password_hash)
            .await?;
        info!(user_id = user.id, email = %user.email, "User signed up");

        self.issue_session(SessionUser {
            user_id: user.id,
            email: user.email,
        })
    }

    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        trace!("Starting login");
        let email = normalize_email(&req.email);
        let password = req.password.trim();

        if email.is_empty() || password.is_empty() {
            return Err(DomainError::Validation(MSG_REQUIRED.to_string()).into());
        }

        let Some(user) = self.user_repository.find_user_by_email(&email).await? else {
            verify_dummy_password(password);
            warn!(email = %email, "Login for unknown email");
            return Err(DomainError::Unauthorized(MSG_INVALID_CREDENTIALS.to_string()).into());
        };

        // A corrupt stored hash reads as a failed match, not a server error.
        let is_valid = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            error!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            false
        });
        if !is_valid {
            warn!(user_id = user.id, "Invalid password during login");
            return Err(DomainError::Unauthorized(MSG_INVALID_CREDENTIALS.to_string()).into());
        }

        info!(user_id = user.id, email = %user.email, "Login successful");
        self.issue_session(SessionUser {
            user_id: user.id,
            email: user.email,
        })
    }

    /// Authorization guard: resolves the session token, if any, to its identity.
    pub fn current_user(&self, token: Option<&str>) -> Result<SessionUser> {
        let token = token.ok_or_else(not_authenticated)?;
        validate_token(token, &self.session_secret).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            not_authenticated().into()
        })
    }

    fn issue_session(&self, user: SessionUser) -> Result<Session> {
        let token =
            generate_token(&user, &self.session_secret, self.session_ttl_secs).map_err(|e| {
                error!(error = %e, "Failed to generate session token");
                DomainError::Internal(format!("Failed to generate token: {}", e))
            })?;
        Ok(Session { user, token })
    }
}

fn not_authenticated() -> DomainError {
    DomainError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::InMemoryUserRepository;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            "unit-test-secret".to_string(),
            3600,
        )
    }

    fn signup_req(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn domain_error(err: &anyhow::Error) -> &DomainError {
        err.downcast_ref::<DomainError>().unwrap()
    }

    #[tokio::test]
    async fn test_signup_normalizes_email_and_issues_session() {
        let service = service();

        let session = service
            .signup(signup_req("  U@Test.COM ", "secret1"))
            .await
            .unwrap();

        assert_eq!(session.user.email, "u@test.com");
        let current = service.current_user(Some(&session.token)).unwrap();
        assert_eq!(current, session.user);
    }

    #[tokio::test]
    async fn test_signup_requires_both_fields() {
        let service = service();

        let err = service.signup(signup_req("", "secret1")).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Validation(m) if m == MSG_REQUIRED));

        let err = service.signup(signup_req("a@b.c", "   ")).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Validation(m) if m == MSG_REQUIRED));
    }

    #[tokio::test]
    async fn test_signup_password_length_boundary() {
        let service = service();

        let err = service.signup(signup_req("short@x.com", "12345")).await.unwrap_err();
        assert!(matches!(
            domain_error(&err),
            DomainError::Validation(m) if m == MSG_PASSWORD_TOO_SHORT
        ));

        assert!(service.signup(signup_req("exact@x.com", "123456")).await.is_ok());
    }

    #[tokio::test]
    async fn test_signup_duplicate_after_normalization_conflicts() {
        let service = service();
        service.signup(signup_req("A@X.com", "secret1")).await.unwrap();

        let err = service.signup(signup_req("a@x.com", "secret2")).await.unwrap_err();

        assert!(matches!(domain_error(&err), DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_succeeds_with_correct_password() {
        let service = service();
        service.signup(signup_req("login@x.com", "secret1")).await.unwrap();

        let session = service.login(login_req("LOGIN@x.com", "secret1")).await.unwrap();

        assert_eq!(session.user.email, "login@x.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.signup(signup_req("known@x.com", "secret1")).await.unwrap();

        let unknown = service
            .login(login_req("unknown@x.com", "secret1"))
            .await
            .unwrap_err();
        let wrong = service
            .login(login_req("known@x.com", "wrong-password"))
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(
            domain_error(&unknown),
            DomainError::Unauthorized(m) if m == MSG_INVALID_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let service = service();
        let err = service.login(login_req("x@x.com", "")).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Validation(_)));
    }

    #[test]
    fn test_current_user_without_token_is_unauthorized() {
        let err = service().current_user(None).unwrap_err();
        assert!(matches!(
            domain_error(&err),
            DomainError::Unauthorized(m) if m == MSG_NOT_AUTHENTICATED
        ));
    }

    #[test]
    fn test_current_user_with_foreign_token_is_unauthorized() {
        let other = AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            "another-secret".to_string(),
            3600,
        );
        let token = other
            .issue_session(SessionUser {
                user_id: 1,
                email: "x@x.com".to_string(),
            })
            .unwrap()
            .token;

        assert!(service().current_user(Some(&token)).is_err());
    }
}
