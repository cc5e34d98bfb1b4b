//! Input limits and format checks shared by the handlers.

use url::Url;

pub const MAX_NOTES_LEN: usize = 10_000;
pub const MAX_FEEDBACK_LEN: usize = 2_000;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHOTO_URLS: usize = 10;

/// Basic email format check. Rejects CR/LF to keep addresses out of header
/// injection territory before they reach the mailer.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.contains('\r') || email.contains('\n') {
        return false;
    }
    regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Notes must be non-empty after trimming and within the length cap.
pub fn validate_notes(notes: &str) -> Result<(), &'static str> {
    if notes.trim().is_empty() {
        return Err("Notes must not be empty");
    }
    if notes.len() > MAX_NOTES_LEN {
        return Err("Notes exceed the maximum length");
    }
    Ok(())
}

pub fn validate_feedback(feedback: &str) -> Result<(), &'static str> {
    if feedback.trim().is_empty() {
        return Err("Feedback must not be empty");
    }
    if feedback.len() > MAX_FEEDBACK_LEN {
        return Err("Feedback exceeds the maximum length");
    }
    Ok(())
}

/// Photos arrive as URLs to already-uploaded objects; each must parse.
pub fn validate_photo_urls(photo_urls: &[String]) -> Result<(), &'static str> {
    if photo_urls.len() > MAX_PHOTO_URLS {
        return Err("Too many photos");
    }
    for url in photo_urls {
        if Url::parse(url).is_err() {
            return Err("Invalid photo URL");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_email_rejects_header_injection() {
        assert!(!valid_email("a@example.com\r\nBcc: b@example.com"));
        assert!(!valid_email("a@example.com\n"));
    }

    #[test]
    fn valid_email_rejects_overlong() {
        let local = "a".repeat(MAX_EMAIL_LEN);
        assert!(!valid_email(&format!("{local}@example.com")));
    }

    #[test]
    fn notes_limits() {
        assert!(validate_notes("we planted twelve trees").is_ok());
        assert!(validate_notes("   ").is_err());
        assert!(validate_notes(&"x".repeat(MAX_NOTES_LEN + 1)).is_err());
    }

    #[test]
    fn feedback_limits() {
        assert!(validate_feedback("shorter please").is_ok());
        assert!(validate_feedback("").is_err());
        assert!(validate_feedback(&"x".repeat(MAX_FEEDBACK_LEN + 1)).is_err());
    }

    #[test]
    fn photo_urls_must_parse() {
        assert!(validate_photo_urls(&["https://cdn.example.com/p/1.jpg".to_string()]).is_ok());
        assert!(validate_photo_urls(&["not a url".to_string()]).is_err());
        let many = vec!["https://cdn.example.com/p.jpg".to_string(); MAX_PHOTO_URLS + 1];
        assert!(validate_photo_urls(&many).is_err());
    }
}
