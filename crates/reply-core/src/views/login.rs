use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionStore;
use crate::models::{AuthResult, User};

/// Length of an emailed one-time code
pub const OTP_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Password,
    OneTimeCode { sent: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    Idle,
    Loading,
    Error(String),
    Authenticated(User),
}

/// Email/password and one-time-code sign-in.
pub struct LoginView {
    api: ApiClient,
    store: SessionStore,
    mode: LoginMode,
    status: LoginStatus,
    email: String,
}

impl LoginView {
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        Self {
            api,
            store,
            mode: LoginMode::Password,
            status: LoginStatus::Idle,
            email: String::new(),
        }
    }

    /// A stored credential means the login screen can be skipped
    pub fn already_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    pub fn status(&self) -> &LoginStatus {
        &self.status
    }

    /// Email the pending one-time code was sent to
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Label for the submit action in the current mode
    pub fn action_label(&self) -> &'static str {
        match self.mode {
            LoginMode::Password => "Sign in with Email",
            LoginMode::OneTimeCode { sent: false } => "Send OTP Code",
            LoginMode::OneTimeCode { sent: true } => "Verify & Sign in",
        }
    }

    /// Label shown while the submit action is in flight
    pub fn pending_label(&self) -> &'static str {
        match self.mode {
            LoginMode::Password => "Signing in...",
            LoginMode::OneTimeCode { sent: false } => "Sending OTP...",
            LoginMode::OneTimeCode { sent: true } => "Verifying...",
        }
    }

    /// Switch between password and one-time-code sign-in
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::Password => LoginMode::OneTimeCode { sent: false },
            LoginMode::OneTimeCode { .. } => LoginMode::Password,
        };
        self.status = LoginStatus::Idle;
    }

    /// Go back from code entry to email entry
    pub fn change_email(&mut self) {
        if let LoginMode::OneTimeCode { sent: true } = self.mode {
            self.mode = LoginMode::OneTimeCode { sent: false };
            self.status = LoginStatus::Idle;
        }
    }

    pub async fn submit_password(&mut self, email: &str, password: &str) -> &LoginStatus {
        if self.mode != LoginMode::Password {
            self.mode = LoginMode::Password;
        }
        let email = email.trim();
        if email.is_empty() {
            return self.fail("Email is required");
        }
        if password.is_empty() {
            return self.fail("Password is required");
        }

        self.email = email.to_string();
        self.status = LoginStatus::Loading;
        let result = self.api.login_with_password(email, password).await;
        self.finish(result)
    }

    /// Ask for a one-time code. Calling again after it was sent resends it.
    pub async fn request_code(&mut self, email: &str) -> &LoginStatus {
        let email = email.trim();
        if email.is_empty() {
            return self.fail("Email is required");
        }

        self.email = email.to_string();
        self.status = LoginStatus::Loading;
        match self.api.request_one_time_code(email).await {
            Ok(ack) => {
                debug!(message = %ack.message, "One-time code requested");
                self.mode = LoginMode::OneTimeCode { sent: true };
                self.status = LoginStatus::Idle;
            }
            Err(e) => self.status = LoginStatus::Error(e.to_string()),
        }
        &self.status
    }

    /// Verify the code sent to the email given to `request_code`
    pub async fn verify_code(&mut self, code: &str) -> &LoginStatus {
        if self.mode != (LoginMode::OneTimeCode { sent: true }) {
            return self.fail("Request a code first");
        }
        let code = sanitize_code(code);
        if code.len() != OTP_LENGTH {
            return self.fail("Enter the 6-digit code");
        }

        self.status = LoginStatus::Loading;
        let email = self.email.clone();
        let result = self.api.verify_one_time_code(&email, &code).await;
        self.finish(result)
    }

    fn fail(&mut self, message: &str) -> &LoginStatus {
        self.status = LoginStatus::Error(message.to_string());
        &self.status
    }

    fn finish(&mut self, result: Result<AuthResult, ApiError>) -> &LoginStatus {
        self.status = match result {
            Ok(auth) => {
                self.store.set_credential(&auth.token);
                info!(user = %auth.user.email, "Signed in");
                LoginStatus::Authenticated(auth.user)
            }
            Err(e) => LoginStatus::Error(e.to_string()),
        };
        &self.status
    }
}

/// Keep digits only, at most six, as the code input field does
pub fn sanitize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(OTP_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> LoginView {
        let api = ApiClient::with_base_url("http://127.0.0.1:9").unwrap();
        LoginView::new(api, SessionStore::in_memory())
    }

    #[test]
    fn test_sanitize_code() {
        assert_eq!(sanitize_code("123456"), "123456");
        assert_eq!(sanitize_code(" 12-34 56 "), "123456");
        assert_eq!(sanitize_code("1234567890"), "123456");
        assert_eq!(sanitize_code("abc"), "");
    }

    #[test]
    fn test_toggle_mode_resets() {
        let mut v = view();
        assert_eq!(v.mode(), LoginMode::Password);
        v.toggle_mode();
        assert_eq!(v.mode(), LoginMode::OneTimeCode { sent: false });
        v.toggle_mode();
        assert_eq!(v.mode(), LoginMode::Password);
        assert_eq!(v.status(), &LoginStatus::Idle);
    }

    #[test]
    fn test_labels_follow_mode() {
        let mut v = view();
        assert_eq!(v.action_label(), "Sign in with Email");
        assert_eq!(v.pending_label(), "Signing in...");
        v.toggle_mode();
        assert_eq!(v.action_label(), "Send OTP Code");
        assert_eq!(v.pending_label(), "Sending OTP...");
    }

    #[test]
    fn test_change_email_only_after_sent() {
        let mut v = view();
        v.change_email();
        assert_eq!(v.mode(), LoginMode::Password);
    }

    #[tokio::test]
    async fn test_local_validation_skips_network() {
        let mut v = view();
        assert_eq!(
            v.submit_password("  ", "pw").await,
            &LoginStatus::Error("Email is required".to_string())
        );
        assert_eq!(
            v.submit_password("a@b.com", "").await,
            &LoginStatus::Error("Password is required".to_string())
        );
        assert_eq!(
            v.verify_code("123456").await,
            &LoginStatus::Error("Request a code first".to_string())
        );
        assert!(!v.already_authenticated());
    }
}
