use std::fmt;

#[derive(Debug)]
pub enum ProfileError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// A parameter is out of range or inconsistent with another.
    Invalid(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::Io(e) => write!(f, "io error: {e}"),
            ProfileError::Parse(e) => write!(f, "config parse error: {e}"),
            ProfileError::Invalid(msg) => write!(f, "invalid profile: {msg}"),
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Io(e) => Some(e),
            ProfileError::Parse(e) => Some(e),
            ProfileError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ProfileError {
    fn from(err: std::io::Error) -> Self {
        ProfileError::Io(err)
    }
}

impl From<toml::de::Error> for ProfileError {
    fn from(err: toml::de::Error) -> Self {
        ProfileError::Parse(err)
    }
}
