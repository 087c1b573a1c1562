use std::time::Duration;

use regex::Regex;

pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_IMAP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ADDRESS_PREFIX: &str = "mailpix+";
pub const DEFAULT_ADDRESS_DOMAIN: &str = "gmail.com";

const IMAP_HOST_ENV: &str = "MAILPIX_IMAP_HOST";
const IMAP_PORT_ENV: &str = "MAILPIX_IMAP_PORT";
const IMAP_USER_ENV: &str = "MAILPIX_IMAP_USER";
const IMAP_PASSWORD_ENV: &str = "MAILPIX_IMAP_PASSWORD";
const IMAP_TIMEOUT_ENV: &str = "MAILPIX_IMAP_TIMEOUT_SECS";
const ADDRESS_PREFIX_ENV: &str = "MAILPIX_ADDRESS_PREFIX";
const ADDRESS_DOMAIN_ENV: &str = "MAILPIX_ADDRESS_DOMAIN";
const ADMIN_PASSWORD_ENV: &str = "MAILPIX_ADMIN_PASSWORD";
const MASTER_PASSWORD_ENV: &str = "MAILPIX_MASTER_PASSWORD";

/// Process-wide configuration, read from the environment exactly once at
/// startup and passed down by value. Nothing below this layer touches
/// `std::env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub mailbox: MailboxConfig,
    pub addresses: AddressConfig,
    pub admin: AdminConfig,
}

impl Config {
    pub fn from_env() -> Config {
        let config = Config {
            mailbox: MailboxConfig::from_env(),
            addresses: AddressConfig::from_env(),
            admin: AdminConfig::from_env(),
        };
        if config.mailbox.credentials().is_none() {
            tracing::warn!(
                "{} / {} not set, mailbox ingestion is disabled",
                IMAP_USER_ENV,
                IMAP_PASSWORD_ENV
            );
        }
        if config.admin.creation_password.is_none() {
            tracing::warn!("{} not set, event creation is locked", ADMIN_PASSWORD_ENV);
        }
        if config.admin.master_password.is_none() {
            tracing::warn!("{} not set, admin login is locked", MASTER_PASSWORD_ENV);
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl MailboxConfig {
    fn from_env() -> MailboxConfig {
        MailboxConfig {
            host: env_or(IMAP_HOST_ENV, DEFAULT_IMAP_HOST),
            port: parsed_env_or(IMAP_PORT_ENV, DEFAULT_IMAP_PORT),
            user: non_empty_env(IMAP_USER_ENV),
            password: non_empty_env(IMAP_PASSWORD_ENV),
            timeout: Duration::from_secs(parsed_env_or(
                IMAP_TIMEOUT_ENV,
                DEFAULT_IMAP_TIMEOUT_SECS,
            )),
        }
    }

    /// Both halves of the credential pair, or `None` if either is missing.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

/// Shape of the per-event collection addresses. `prefix` is everything left
/// of the key including any separator (`mailpix+` by default, plus-addressing
/// on a single shared account), `domain` is everything right of the `@`.
#[derive(Debug, Clone)]
pub struct AddressConfig {
    pub prefix: String,
    pub domain: String,
}

impl AddressConfig {
    fn from_env() -> AddressConfig {
        AddressConfig {
            prefix: env_or(ADDRESS_PREFIX_ENV, DEFAULT_ADDRESS_PREFIX),
            domain: env_or(ADDRESS_DOMAIN_ENV, DEFAULT_ADDRESS_DOMAIN),
        }
    }

    /// The email address photos for `key` should be sent to. Pure string
    /// assembly, safe to call while rendering.
    pub fn collection_address(&self, key: &str) -> String {
        format!("{}{}@{}", self.prefix, key, self.domain)
    }

    /// Pulls the event key back out of a pasted collection address. Accepts
    /// the canonical `<prefix><key>@<domain>` form anywhere in the input,
    /// then falls back to a bare `<key>@<domain>` so addresses with a
    /// trimmed or mangled prefix still resolve.
    pub fn extract_key(&self, input: &str) -> Option<String> {
        let canonical = format!(
            "{}([A-Za-z0-9]+)@{}",
            regex::escape(&self.prefix),
            regex::escape(&self.domain)
        );
        if let Some(key) = first_capture(&canonical, input) {
            return Some(key);
        }
        let bare = format!("([A-Za-z0-9]+)@{}", regex::escape(&self.domain));
        first_capture(&bare, input)
    }
}

fn first_capture(pattern: &str, input: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    regex
        .captures(input)
        .map(|captures| captures[1].to_string())
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Required to create events. Unset means creation is locked.
    pub creation_password: Option<String>,
    /// Required to log into the admin area. Unset means login is locked.
    pub master_password: Option<String>,
}

impl AdminConfig {
    fn from_env() -> AdminConfig {
        AdminConfig {
            creation_password: non_empty_env(ADMIN_PASSWORD_ENV),
            master_password: non_empty_env(MASTER_PASSWORD_ENV),
        }
    }

    pub fn creation_password_matches(&self, supplied: &str) -> bool {
        matches!(self.creation_password.as_deref(), Some(expected) if expected == supplied)
    }

    pub fn master_password_matches(&self, supplied: &str) -> bool {
        matches!(self.master_password.as_deref(), Some(expected) if expected == supplied)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    non_empty_env(name).unwrap_or_else(|| default.to_string())
}

fn parsed_env_or<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match non_empty_env(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}, using {}", name, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses() -> AddressConfig {
        AddressConfig {
            prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            domain: DEFAULT_ADDRESS_DOMAIN.to_string(),
        }
    }

    #[test]
    fn collection_address_joins_prefix_key_domain() {
        assert_eq!(
            addresses().collection_address("aB3xYz9"),
            "mailpix+aB3xYz9@gmail.com"
        );
    }

    #[test]
    fn extract_key_accepts_canonical_address() {
        assert_eq!(
            addresses().extract_key("mailpix+aB3xYz9@gmail.com").as_deref(),
            Some("aB3xYz9")
        );
    }

    #[test]
    fn extract_key_accepts_surrounding_text() {
        let input = "send photos to <mailpix+aB3xYz9@gmail.com> please";
        assert_eq!(addresses().extract_key(input).as_deref(), Some("aB3xYz9"));
    }

    #[test]
    fn extract_key_falls_back_to_bare_address() {
        assert_eq!(
            addresses().extract_key("aB3xYz9@gmail.com").as_deref(),
            Some("aB3xYz9")
        );
    }

    #[test]
    fn extract_key_rejects_other_domains() {
        assert_eq!(addresses().extract_key("mailpix+aB3xYz9@example.com"), None);
        assert_eq!(addresses().extract_key("not an address"), None);
    }

    #[test]
    fn extract_key_escapes_prefix_metacharacters() {
        let custom = AddressConfig {
            prefix: "photos.".to_string(),
            domain: "example.org".to_string(),
        };
        assert_eq!(
            custom.extract_key("photos.k3y@example.org").as_deref(),
            Some("k3y")
        );
        // If the dot were a wildcard this would capture "k3y"; instead the
        // canonical form misses and the bare fallback takes the whole run.
        assert_eq!(
            custom.extract_key("photosXk3y@example.org").as_deref(),
            Some("photosXk3y")
        );
    }

    #[test]
    fn credentials_require_both_halves() {
        let mut mailbox = MailboxConfig {
            host: DEFAULT_IMAP_HOST.to_string(),
            port: DEFAULT_IMAP_PORT,
            user: Some("gallery@gmail.com".to_string()),
            password: None,
            timeout: Duration::from_secs(DEFAULT_IMAP_TIMEOUT_SECS),
        };
        assert_eq!(mailbox.credentials(), None);

        mailbox.password = Some("app-password".to_string());
        assert_eq!(
            mailbox.credentials(),
            Some(("gallery@gmail.com", "app-password"))
        );
    }

    #[test]
    fn unset_passwords_never_match() {
        let admin = AdminConfig {
            creation_password: None,
            master_password: None,
        };
        assert!(!admin.creation_password_matches(""));
        assert!(!admin.master_password_matches("anything"));

        let admin = AdminConfig {
            creation_password: Some("letmein".to_string()),
            master_password: Some("sesame".to_string()),
        };
        assert!(admin.creation_password_matches("letmein"));
        assert!(!admin.creation_password_matches("LETMEIN"));
        assert!(admin.master_password_matches("sesame"));
        assert!(!admin.master_password_matches(""));
    }
}
