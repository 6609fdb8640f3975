//! Form checks that run before any request is sent.
//!
//! Each check collects every failing field into a [`FieldErrors`] map, so a
//! form can show all of its messages at once. Only the first failing rule
//! per field is reported.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::models::{Credentials, ExpoDraft, FeedbackDraft, ProfileUpdate, RegisterRequest};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::identity::Role;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()-]{5,}$").unwrap());

pub const LOGIN_MIN_PASSWORD: usize = 6;
pub const MIN_PASSWORD: usize = 8;

/// Everything the registration form collects. Only the fields of
/// [`RegisterRequest`] are sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<Role>,
    pub phone: String,
    pub company: String,
    pub agree_to_terms: bool,
}

impl RegisterForm {
    /// The backend payload. Blank phone and company are omitted; a missing
    /// role falls back to attendee.
    pub fn to_request(&self) -> RegisterRequest {
        let opt = |s: &str| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role.unwrap_or(Role::Attendee),
            phone: opt(&self.phone),
            company: opt(&self.company),
        }
    }
}

fn finish(errors: FieldErrors) -> AppResult<()> {
    if errors.is_empty() { Ok(()) } else { Err(AppError::validation(errors)) }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !EMAIL_RE.is_match(email) {
        errors.insert("email".into(), "Email format is invalid".into());
    }
}

fn check_new_password(password: &str, confirm: &str, errors: &mut FieldErrors) {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    } else if password.chars().count() < MIN_PASSWORD {
        errors.insert("password".into(), format!("Password must be at least {MIN_PASSWORD} characters"));
    } else if !(has_lower && has_upper && has_digit) {
        errors.insert("password".into(), "Password must contain uppercase, lowercase, and number".into());
    }
    if confirm.is_empty() {
        errors.insert("confirmPassword".into(), "Please confirm your password".into());
    } else if password != confirm {
        errors.insert("confirmPassword".into(), "Passwords do not match".into());
    }
}

pub fn validate_login(credentials: &Credentials) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    check_email(&credentials.email, &mut errors);
    if credentials.password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    } else if credentials.password.chars().count() < LOGIN_MIN_PASSWORD {
        errors.insert("password".into(), format!("Password must be at least {LOGIN_MIN_PASSWORD} characters"));
    }
    finish(errors)
}

pub fn validate_registration(form: &RegisterForm) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if form.first_name.trim().is_empty() {
        errors.insert("firstName".into(), "First name is required".into());
    }
    if form.last_name.trim().is_empty() {
        errors.insert("lastName".into(), "Last name is required".into());
    }
    check_email(&form.email, &mut errors);
    if form.role.is_none() {
        errors.insert("role".into(), "Please select a role".into());
    }
    check_new_password(&form.password, &form.confirm_password, &mut errors);
    if matches!(form.role, Some(Role::Exhibitor | Role::Organizer)) && form.company.trim().is_empty() {
        errors.insert("company".into(), "Company name is required for this role".into());
    }
    if !form.agree_to_terms {
        errors.insert("agreeToTerms".into(), "You must agree to the terms and conditions".into());
    }
    finish(errors)
}

pub fn validate_password_reset(password: &str, confirm: &str) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    check_new_password(password, confirm, &mut errors);
    finish(errors)
}

pub fn validate_forgot_password(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(AppError::field("email", "Email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::field("email", "Please enter a valid email address"));
    }
    Ok(())
}

/// Accepts a calendar date or a full timestamp, the two shapes date inputs produce.
pub fn parse_expo_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok()
}

pub fn validate_expo(draft: &ExpoDraft) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if draft.title.trim().is_empty() {
        errors.insert("title".into(), "Title is required".into());
    }
    let mut date = |field: &str, raw: &Option<String>| match raw.as_deref().filter(|s| !s.trim().is_empty()) {
        None => None,
        Some(s) => {
            let parsed = parse_expo_date(s);
            if parsed.is_none() {
                errors.insert(field.to_string(), "Date is invalid".into());
            }
            parsed
        }
    };
    let start = date("startDate", &draft.start_date);
    let end = date("endDate", &draft.end_date);
    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            errors.insert("endDate".into(), "End date must be after start date".into());
        }
    }
    finish(errors)
}

pub fn validate_feedback(draft: &FeedbackDraft) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if draft.subject.trim().is_empty() {
        errors.insert("subject".into(), "Subject is required".into());
    }
    if draft.message.trim().is_empty() {
        errors.insert("message".into(), "Message is required".into());
    }
    finish(errors)
}

/// Only the fields present are checked; an empty patch is rejected.
pub fn validate_profile(patch: &ProfileUpdate) -> AppResult<()> {
    if *patch == ProfileUpdate::default() {
        return Err(AppError::field("profile", "Nothing to update"));
    }
    let mut errors = FieldErrors::new();
    if patch.first_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
        errors.insert("firstName".into(), "First name is required".into());
    }
    if patch.last_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
        errors.insert("lastName".into(), "Last name is required".into());
    }
    if patch.phone.as_deref().is_some_and(|p| !PHONE_RE.is_match(p.trim())) {
        errors.insert("phone".into(), "Phone number is invalid".into());
    }
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            first_name: "Ana".into(),
            last_name: "Diaz".into(),
            email: "ana@x.io".into(),
            password: "Secret123".into(),
            confirm_password: "Secret123".into(),
            role: Some(Role::Attendee),
            phone: String::new(),
            company: String::new(),
            agree_to_terms: true,
        }
    }

    fn fields(r: AppResult<()>) -> FieldErrors {
        r.unwrap_err().field_errors().cloned().unwrap_or_default()
    }

    #[test]
    fn login_rules() {
        assert!(validate_login(&Credentials { email: "a@b.com".into(), password: "secret".into() }).is_ok());
        let f = fields(validate_login(&Credentials { email: "nope".into(), password: "12345".into() }));
        assert_eq!(f["email"], "Email format is invalid");
        assert_eq!(f["password"], "Password must be at least 6 characters");
        let f = fields(validate_login(&Credentials { email: String::new(), password: String::new() }));
        assert_eq!(f["email"], "Email is required");
        assert_eq!(f["password"], "Password is required");
    }

    #[test]
    fn registration_accepts_a_complete_form() {
        assert!(validate_registration(&form()).is_ok());
    }

    #[test]
    fn registration_password_strength() {
        let mut f = form();
        f.password = "short1A".into();
        f.confirm_password = f.password.clone();
        assert_eq!(fields(validate_registration(&f))["password"], "Password must be at least 8 characters");
        f.password = "alllowercase1".into();
        f.confirm_password = f.password.clone();
        assert_eq!(
            fields(validate_registration(&f))["password"],
            "Password must contain uppercase, lowercase, and number"
        );
        f.password = "Secret123".into();
        f.confirm_password = "Secret124".into();
        assert_eq!(fields(validate_registration(&f))["confirmPassword"], "Passwords do not match");
    }

    #[test]
    fn company_required_for_exhibitors_and_organizers() {
        for role in [Role::Exhibitor, Role::Organizer] {
            let mut f = form();
            f.role = Some(role);
            assert!(fields(validate_registration(&f)).contains_key("company"));
            f.company = "Acme".into();
            assert!(validate_registration(&f).is_ok());
        }
    }

    #[test]
    fn registration_reports_every_failing_field() {
        let f = fields(validate_registration(&RegisterForm::default()));
        for key in ["firstName", "lastName", "email", "role", "password", "confirmPassword", "agreeToTerms"] {
            assert!(f.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn register_request_drops_form_only_fields() {
        let mut f = form();
        f.company = "  ".into();
        f.phone = " 555 ".into();
        let req = f.to_request();
        assert_eq!(req.company, None);
        assert_eq!(req.phone.as_deref(), Some("555"));
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("confirmPassword").is_none());
        assert!(v.get("agreeToTerms").is_none());
    }

    #[test]
    fn forgot_password_email() {
        assert_eq!(validate_forgot_password("").unwrap_err().message(), "Email is required");
        assert_eq!(validate_forgot_password("x").unwrap_err().message(), "Please enter a valid email address");
        assert!(validate_forgot_password("a@b.com").is_ok());
    }

    #[test]
    fn expo_dates_must_be_ordered() {
        let mut d = ExpoDraft { title: "Build Week".into(), ..Default::default() };
        assert!(validate_expo(&d).is_ok());
        d.start_date = Some("2025-10-02".into());
        d.end_date = Some("2025-10-01".into());
        assert!(fields(validate_expo(&d)).contains_key("endDate"));
        d.end_date = Some("2025-10-03T18:00:00Z".into());
        assert!(validate_expo(&d).is_ok());
        d.title = " ".into();
        assert_eq!(fields(validate_expo(&d))["title"], "Title is required");
    }

    #[test]
    fn feedback_needs_subject_and_message() {
        let errs = fields(validate_feedback(&FeedbackDraft::default()));
        assert_eq!(errs["subject"], "Subject is required");
        assert_eq!(errs["message"], "Message is required");
        let ok = FeedbackDraft { subject: "Wifi".into(), message: "Hall B has no signal".into(), category: None };
        assert!(validate_feedback(&ok).is_ok());
    }

    #[test]
    fn profile_patch_checks_only_given_fields() {
        assert_eq!(validate_profile(&ProfileUpdate::default()).unwrap_err().message(), "Nothing to update");
        let mut patch = ProfileUpdate { company: Some("Acme".into()), ..Default::default() };
        assert!(validate_profile(&patch).is_ok());
        patch.first_name = Some("  ".into());
        patch.phone = Some("call me".into());
        let errs = fields(validate_profile(&patch));
        assert_eq!(errs["firstName"], "First name is required");
        assert_eq!(errs["phone"], "Phone number is invalid");
        patch.first_name = Some("Ana".into());
        patch.phone = Some("+1 (555) 010-2000".into());
        assert!(validate_profile(&patch).is_ok());
    }
}
