use rand::seq::IndexedRandom;

/// Characters a generated password is drawn from
pub const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

pub const DEFAULT_EMAIL_DOMAIN: &str = "sti.archives.clmb";

/// Generate a random password of `length` characters
///
/// Uses the thread-local CSPRNG (ChaCha seeded from the OS). Every character
/// is picked independently and uniformly from [`PASSWORD_ALPHABET`].
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| PASSWORD_ALPHABET.choose(&mut rng))
        .map(|&b| b as char)
        .collect()
}

/// Last whitespace-separated token of a full name, lower-cased
///
/// A single-token name yields that token. Returns `None` when the name has
/// no token at all.
pub fn extract_lastname(fullname: &str) -> Option<String> {
    fullname
        .split_whitespace()
        .last()
        .map(|name| name.to_lowercase())
}

/// Institutional address `{lastname}@{domain}` for a full name
///
/// Two people sharing a surname get the same address; nothing here checks
/// for that.
pub fn generate_school_email(fullname: &str, domain: &str) -> Option<String> {
    extract_lastname(fullname).map(|lastname| format!("{}@{}", lastname, domain))
}
