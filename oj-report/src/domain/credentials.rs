use secrecy::SecretString;
use unicode_segmentation::UnicodeSegmentation;

/// The longest username the judging service accepts.
const MAX_USERNAME_GRAPHEMES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    pub fn parse(s: String) -> Result<Self, String> {
        let s = s.trim().to_owned();
        if s.is_empty() {
            Err("Username has no non-whitespace characters.".to_owned())
        } else if s.graphemes(true).count() > MAX_USERNAME_GRAPHEMES {
            Err(format!("Username {} is too long.", s))
        } else if s.chars().any(char::is_whitespace) {
            Err(format!("Username {} contains whitespace.", s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a plain password login needs.
#[derive(Debug)]
pub struct Credentials {
    pub username: UserName,
    pub password: SecretString,
}
