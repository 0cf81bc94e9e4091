//! Controlled forms for the login, registration and password reset views.
//!
//! Forms hold field values, focus and the inline message shown under them.
//! Validation runs before any request is made; a form that fails validation
//! never reaches the network.

use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for email input (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username and password required")]
    MissingCredentials,

    #[error("{0} is required")]
    Required(&'static str),

    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Reset link is missing its token.")]
    MissingResetToken,
}

// ============================================================================
// Fields
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Secret,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub kind: FieldKind,
    value: String,
    max_len: usize,
}

impl Field {
    pub fn new(label: &'static str, kind: FieldKind, max_len: usize) -> Self {
        Self {
            label,
            kind,
            value: String::new(),
            max_len,
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.chars().take(self.max_len).collect();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Append a typed character. Returns false if it was rejected.
    pub fn push(&mut self, c: char) -> bool {
        if can_add_char(self.value.chars().count(), self.max_len, c) {
            self.value.push(c);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Value as shown on screen; secrets are masked.
    pub fn display(&self) -> String {
        match self.kind {
            FieldKind::Secret => "*".repeat(self.value.chars().count()),
            FieldKind::Text | FieldKind::Email => self.value.clone(),
        }
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

/// Rough shape check: one `@`, something before it, a dotted domain after it.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// ============================================================================
// Form messages and focus
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// Inline text shown under a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl FormMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }
}

/// Ordered fields followed by a submit button.
#[derive(Debug, Clone)]
pub struct FormFields {
    fields: Vec<Field>,
    /// Index into `fields`; `fields.len()` means the submit button.
    focus: usize,
}

impl FormFields {
    fn new(fields: Vec<Field>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_field_focused(&self, index: usize) -> bool {
        self.focus == index
    }

    pub fn is_submit_focused(&self) -> bool {
        self.focus == self.fields.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        let slots = self.fields.len() + 1;
        self.focus = (self.focus + slots - 1) % slots;
    }

    pub fn set_focus(&mut self, index: usize) {
        self.focus = index.min(self.fields.len());
    }

    /// Focus the first blank field, or the submit button if all are filled.
    pub fn focus_first_blank(&mut self) {
        self.focus = self
            .fields
            .iter()
            .position(Field::is_blank)
            .unwrap_or(self.fields.len());
    }

    pub fn focused_mut(&mut self) -> Option<&mut Field> {
        self.fields.get_mut(self.focus)
    }

    /// Type into the focused field. Returns false if nothing was accepted.
    pub fn type_char(&mut self, c: char) -> bool {
        self.focused_mut().map(|f| f.push(c)).unwrap_or(false)
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused_mut() {
            field.pop();
        }
    }

    fn get(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    fn get_mut(&mut self, index: usize) -> &mut Field {
        &mut self.fields[index]
    }
}

// ============================================================================
// Login
// ============================================================================

const LOGIN_USERNAME: usize = 0;
const LOGIN_PASSWORD: usize = 1;

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub fields: FormFields,
    pub message: Option<FormMessage>,
}

/// Validated login input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: &str, password: &str) -> Self {
        let mut fields = FormFields::new(vec![
            Field::new("Username", FieldKind::Text, MAX_USERNAME_LENGTH).with_value(username),
            Field::new("Password", FieldKind::Secret, MAX_PASSWORD_LENGTH).with_value(password),
        ]);
        fields.focus_first_blank();
        Self {
            fields,
            message: None,
        }
    }

    pub fn username(&self) -> &str {
        self.fields.get(LOGIN_USERNAME).value()
    }

    pub fn password(&self) -> &str {
        self.fields.get(LOGIN_PASSWORD).value()
    }

    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        let username = self.username().trim();
        if username.is_empty() || self.password().is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(Credentials {
            username: username.to_string(),
            password: self.password().to_string(),
        })
    }

    /// Forget the password after a submit, keeping the username.
    pub fn clear_password(&mut self) {
        self.fields.get_mut(LOGIN_PASSWORD).clear();
    }
}

// ============================================================================
// Registration
// ============================================================================

const REGISTER_USERNAME: usize = 0;
const REGISTER_EMAIL: usize = 1;
const REGISTER_PASSWORD: usize = 2;
const REGISTER_CONFIRM: usize = 3;

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub fields: FormFields,
    pub message: Option<FormMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterForm {
    pub fn new() -> Self {
        Self {
            fields: FormFields::new(vec![
                Field::new("Username", FieldKind::Text, MAX_USERNAME_LENGTH),
                Field::new("Email", FieldKind::Email, MAX_EMAIL_LENGTH),
                Field::new("Password", FieldKind::Secret, MAX_PASSWORD_LENGTH),
                Field::new("Confirm", FieldKind::Secret, MAX_PASSWORD_LENGTH),
            ]),
            message: None,
        }
    }

    pub fn validate(&self) -> Result<Registration, ValidationError> {
        let username = self.fields.get(REGISTER_USERNAME).value().trim();
        let email = self.fields.get(REGISTER_EMAIL).value().trim();
        let password = self.fields.get(REGISTER_PASSWORD).value();
        let confirm = self.fields.get(REGISTER_CONFIRM).value();

        if username.is_empty() {
            return Err(ValidationError::Required("Username"));
        }
        if email.is_empty() {
            return Err(ValidationError::Required("Email"));
        }
        if !is_plausible_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        if password != confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn clear_passwords(&mut self) {
        self.fields.get_mut(REGISTER_PASSWORD).clear();
        self.fields.get_mut(REGISTER_CONFIRM).clear();
    }
}

// ============================================================================
// Password reset
// ============================================================================

const RESET_PASSWORD: usize = 0;
const RESET_CONFIRM: usize = 1;

#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    /// Token from the reset link
    pub token: Option<String>,
    pub fields: FormFields,
    pub message: Option<FormMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub token: String,
    pub password: String,
}

impl ResetPasswordForm {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            fields: FormFields::new(vec![
                Field::new("New password", FieldKind::Secret, MAX_PASSWORD_LENGTH),
                Field::new("Confirm", FieldKind::Secret, MAX_PASSWORD_LENGTH),
            ]),
            message: None,
        }
    }

    pub fn validate(&self) -> Result<PasswordReset, ValidationError> {
        let password = self.fields.get(RESET_PASSWORD).value();
        let confirm = self.fields.get(RESET_CONFIRM).value();

        if password.is_empty() {
            return Err(ValidationError::Required("New password"));
        }
        if password != confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        let token = self
            .token
            .clone()
            .ok_or(ValidationError::MissingResetToken)?;
        Ok(PasswordReset {
            token,
            password: password.to_string(),
        })
    }

    pub fn clear_passwords(&mut self) {
        self.fields.get_mut(RESET_PASSWORD).clear();
        self.fields.get_mut(RESET_CONFIRM).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(fields: &mut FormFields, index: usize, value: &str) {
        fields.set_focus(index);
        for c in value.chars() {
            assert!(fields.type_char(c));
        }
    }

    #[test]
    fn test_field_length_and_control_chars() {
        let mut f = Field::new("Username", FieldKind::Text, 3);
        assert!(f.push('a'));
        assert!(!f.push('\n'));
        assert!(!f.push('\t'));
        assert!(f.push('b'));
        assert!(f.push('c'));
        assert!(!f.push('d'));
        assert_eq!(f.value(), "abc");
        f.pop();
        assert_eq!(f.value(), "ab");
    }

    #[test]
    fn test_limits_match_input_constants() {
        let mut f = Field::new("Password", FieldKind::Secret, MAX_PASSWORD_LENGTH);
        for _ in 0..MAX_PASSWORD_LENGTH {
            assert!(f.push('x'));
        }
        assert!(!f.push('x'));
        let f = Field::new("Username", FieldKind::Text, MAX_USERNAME_LENGTH)
            .with_value(&"u".repeat(80));
        assert_eq!(f.value().len(), MAX_USERNAME_LENGTH);
    }

    #[test]
    fn test_secret_display_is_masked() {
        let f = Field::new("Password", FieldKind::Secret, 10).with_value("hunter2");
        assert_eq!(f.display(), "*******");
        let f = Field::new("Username", FieldKind::Text, 10).with_value("jdoe");
        assert_eq!(f.display(), "jdoe");
    }

    #[test]
    fn test_focus_cycles_through_submit() {
        let mut form = LoginForm::new("", "");
        assert_eq!(form.fields.focus(), 0);
        form.fields.focus_next();
        form.fields.focus_next();
        assert!(form.fields.is_submit_focused());
        form.fields.focus_next();
        assert_eq!(form.fields.focus(), 0);
        form.fields.focus_prev();
        assert!(form.fields.is_submit_focused());
        assert!(!form.fields.type_char('x'));
    }

    #[test]
    fn test_login_prefill_focuses_password() {
        let form = LoginForm::new("jdoe", "");
        assert!(form.fields.is_field_focused(1));
        let form = LoginForm::new("jdoe", "pw");
        assert!(form.fields.is_submit_focused());
    }

    #[test]
    fn test_login_validation() {
        assert_eq!(
            LoginForm::new("", "pw").validate(),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            LoginForm::new("   ", "pw").validate(),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            LoginForm::new("jdoe", "").validate(),
            Err(ValidationError::MissingCredentials)
        );
        let creds = LoginForm::new(" jdoe ", "pw").validate().expect("valid login");
        assert_eq!(creds.username, "jdoe");
        assert_eq!(creds.password, "pw");
    }

    #[test]
    fn test_login_clear_password_keeps_username() {
        let mut form = LoginForm::new("jdoe", "pw");
        form.clear_password();
        assert_eq!(form.username(), "jdoe");
        assert_eq!(form.password(), "");
    }

    #[test]
    fn test_register_validation() {
        let mut form = RegisterForm::new();
        assert_eq!(form.validate(), Err(ValidationError::Required("Username")));

        fill(&mut form.fields, 0, "jdoe");
        assert_eq!(form.validate(), Err(ValidationError::Required("Email")));

        fill(&mut form.fields, 1, "jdoe-at-example");
        assert_eq!(form.validate(), Err(ValidationError::InvalidEmail));

        form.fields.set_focus(1);
        for _ in 0.."jdoe-at-example".len() {
            form.fields.backspace();
        }
        fill(&mut form.fields, 1, "jdoe@example.com");
        assert_eq!(form.validate(), Err(ValidationError::Required("Password")));

        fill(&mut form.fields, 2, "secret");
        fill(&mut form.fields, 3, "secreT");
        assert_eq!(form.validate(), Err(ValidationError::PasswordMismatch));

        form.fields.set_focus(3);
        form.fields.backspace();
        form.fields.type_char('t');
        let reg = form.validate().expect("valid registration");
        assert_eq!(reg.email, "jdoe@example.com");

        form.clear_passwords();
        assert_eq!(form.validate(), Err(ValidationError::Required("Password")));
    }

    #[test]
    fn test_reset_mismatch_message() {
        let mut form = ResetPasswordForm::new(Some("reset-token".to_string()));
        fill(&mut form.fields, 0, "newpass");
        fill(&mut form.fields, 1, "newpasx");
        let err = form.validate().expect_err("mismatch must fail");
        assert_eq!(err, ValidationError::PasswordMismatch);
        assert!(err.to_string().contains("do not match"));
        assert_eq!(err.to_string(), PASSWORD_MISMATCH_MESSAGE);
    }

    #[test]
    fn test_reset_requires_token() {
        let mut form = ResetPasswordForm::new(Some("  ".to_string()));
        fill(&mut form.fields, 0, "pw");
        fill(&mut form.fields, 1, "pw");
        assert_eq!(form.validate(), Err(ValidationError::MissingResetToken));

        form.token = Some("tok".to_string());
        let reset = form.validate().expect("valid reset");
        assert_eq!(reset.token, "tok");
        assert_eq!(reset.password, "pw");
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("a@b.co"));
        assert!(is_plausible_email(" jdoe@example.com "));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@@b.co"));
        assert!(!is_plausible_email("a b@c.co"));
        assert!(!is_plausible_email("a@.co"));
        assert!(!is_plausible_email("a@co."));
    }
}
