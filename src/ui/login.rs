use std::io::{self, BufRead, Write};

use crate::api::models::{LoginRequest, RegisterRequest, UserRole};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const PASSWORD_ENV: &str = "AGENCY_DESK_PASSWORD";

fn prompt(input: &mut impl BufRead, label: &str) -> io::Result<String> {
    eprint!("{label}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.') && !domain.ends_with('.'));
    if valid { Ok(()) } else { Err(AppError::Validation("Please enter a valid email address.".into())) }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

fn required(value: String, what: &str) -> AppResult<String> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{what} is required.")))
    } else {
        Ok(value.trim().to_string())
    }
}

/// Fill in whatever credentials were not given on the command line, from the
/// environment or by asking.
pub fn read_credentials(
    input: &mut impl BufRead,
    email: Option<String>,
    password: Option<String>,
) -> AppResult<LoginRequest> {
    let email = match email {
        Some(e) => e,
        None => prompt(input, "Email")?,
    };
    let email = required(email, "Email")?;
    validate_email(&email)?;
    let password = match password.or_else(|| std::env::var(PASSWORD_ENV).ok()) {
        Some(p) => p,
        None => prompt(input, "Password")?,
    };
    let password = required(password, "Password")?;
    Ok(LoginRequest { email, password })
}

pub fn registration(
    input: &mut impl BufRead,
    email: String,
    first_name: String,
    last_name: String,
    password: Option<String>,
    role: Option<UserRole>,
) -> AppResult<RegisterRequest> {
    let email = required(email, "Email")?;
    validate_email(&email)?;
    let first_name = required(first_name, "First name")?;
    let last_name = required(last_name, "Last name")?;
    let password = match password.or_else(|| std::env::var(PASSWORD_ENV).ok()) {
        Some(p) => p,
        None => prompt(input, "Choose a password")?,
    };
    validate_password(&password)?;
    Ok(RegisterRequest { email, password, first_name, last_name, role })
}
