use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Languages the assistant can present explanations in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Bn,
    Te,
    Mr,
    Ta,
    Gu,
    Kn,
    Ml,
    Pa,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Bn => "bn",
            Language::Te => "te",
            Language::Mr => "mr",
            Language::Ta => "ta",
            Language::Gu => "gu",
            Language::Kn => "kn",
            Language::Ml => "ml",
            Language::Pa => "pa",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Language::En),
            "hi" => Some(Language::Hi),
            "bn" => Some(Language::Bn),
            "te" => Some(Language::Te),
            "mr" => Some(Language::Mr),
            "ta" => Some(Language::Ta),
            "gu" => Some(Language::Gu),
            "kn" => Some(Language::Kn),
            "ml" => Some(Language::Ml),
            "pa" => Some(Language::Pa),
            _ => None,
        }
    }

    pub fn all() -> Vec<Language> {
        vec![
            Language::En,
            Language::Hi,
            Language::Bn,
            Language::Te,
            Language::Mr,
            Language::Ta,
            Language::Gu,
            Language::Kn,
            Language::Ml,
            Language::Pa,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिंदी (Hindi)",
            Language::Bn => "বাংলা (Bengali)",
            Language::Te => "తెలుగు (Telugu)",
            Language::Mr => "मराठी (Marathi)",
            Language::Ta => "தமிழ் (Tamil)",
            Language::Gu => "ગુજરાતી (Gujarati)",
            Language::Kn => "ಕನ್ನಡ (Kannada)",
            Language::Ml => "മലയാളം (Malayalam)",
            Language::Pa => "ਪੰਜਾਬੀ (Punjabi)",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

/// Indian states and union territories offered on the sign-up form.
pub const INDIAN_STATES: [&str; 33] = [
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Chandigarh",
    "Puducherry",
];

/// Identity held for the lifetime of an authenticated session.
/// Phone and language are always present; the rest is only collected at sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub preferred_language: Language,
    pub state: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("User")
    }

    /// First word of the name, for the dashboard greeting.
    pub fn first_name(&self) -> &str {
        self.name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("User")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    SignIn,
    SignUp,
}

/// Payload handed to the authenticator once local checks pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub mode: AuthMode,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub password: String,
    pub preferred_language: Language,
    pub state: Option<String>,
}

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    // Indian mobile number, optionally prefixed with +91 and a leading zero
    Regex::new(r"^(\+91)?0?[6-9]\d{9}$").unwrap()
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub fn valid_phone(phone: &str) -> bool {
    let normalized: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    PHONE_RE.is_match(&normalized)
}

pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

impl AuthRequest {
    /// Local form validation, run before the authenticator is ever contacted.
    /// Returns the first problem as a user-facing message.
    pub fn validate(&self) -> Result<(), String> {
        if self.phone.trim().is_empty() {
            return Err("Please enter your phone number.".to_string());
        }
        if !valid_phone(&self.phone) {
            return Err("Please enter a valid Indian phone number.".to_string());
        }
        if self.password.is_empty() {
            return Err("Please enter a password.".to_string());
        }
        if self.mode == AuthMode::SignUp {
            if self.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err("Please enter your full name.".to_string());
            }
            match self.email.as_deref() {
                Some(email) if !email.trim().is_empty() => {
                    if !valid_email(email) {
                        return Err("Please enter a valid email address.".to_string());
                    }
                }
                _ => return Err("Please enter your email address.".to_string()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for lang in Language::all() {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("HI"), Some(Language::Hi));
        assert_eq!(Language::from_code("xx"), None);
    }

    #[test]
    fn phone_validation_accepts_common_formats() {
        assert!(valid_phone("+91 98765 43210"));
        assert!(valid_phone("9876543210"));
        assert!(valid_phone("+91-98765-43210"));
        assert!(valid_phone("09876543210"));
        assert!(!valid_phone("12345"));
        assert!(!valid_phone("5876543210"));
        assert!(!valid_phone("not a number"));
    }

    #[test]
    fn email_validation() {
        assert!(valid_email("your.email@example.com"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("spaces in@example.com"));
    }

    fn sign_up_request() -> AuthRequest {
        AuthRequest {
            mode: AuthMode::SignUp,
            name: Some("Priya Sharma".to_string()),
            phone: "+91 98765 43210".to_string(),
            email: Some("priya@example.com".to_string()),
            password: "secret".to_string(),
            preferred_language: Language::Hi,
            state: Some("Maharashtra".to_string()),
        }
    }

    #[test]
    fn sign_up_requires_name_and_email() {
        assert!(sign_up_request().validate().is_ok());

        let mut missing_name = sign_up_request();
        missing_name.name = None;
        assert!(missing_name.validate().is_err());

        let mut bad_email = sign_up_request();
        bad_email.email = Some("not-an-email".to_string());
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn sign_in_only_needs_phone_and_password() {
        let request = AuthRequest {
            mode: AuthMode::SignIn,
            name: None,
            phone: "9876543210".to_string(),
            email: None,
            password: "secret".to_string(),
            preferred_language: Language::En,
            state: None,
        };
        assert!(request.validate().is_ok());

        let mut no_password = request.clone();
        no_password.password.clear();
        assert!(no_password.validate().is_err());
    }

    #[test]
    fn states_list_is_complete() {
        assert_eq!(INDIAN_STATES.len(), 33);
        assert!(INDIAN_STATES.contains(&"Maharashtra"));
        assert!(INDIAN_STATES.contains(&"Puducherry"));
    }

    #[test]
    fn first_name_falls_back_to_user() {
        let profile = UserProfile {
            name: Some("Priya Sharma".to_string()),
            phone: "9876543210".to_string(),
            email: None,
            preferred_language: Language::En,
            state: None,
        };
        assert_eq!(profile.first_name(), "Priya");

        let anonymous = UserProfile { name: None, ..profile };
        assert_eq!(anonymous.first_name(), "User");
        assert_eq!(anonymous.display_name(), "User");
    }
}
