//! Query validation: location filter plus a fixed set of result caps

use std::str::FromStr;

/// Allowed cap tokens, as shown in validation messages
pub const CAP_VALUES: &str = "50|100|150";

/// Bad caller input. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Number of results a query may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCap {
    Top50,
    Top100,
    Top150,
}

impl ResultCap {
    pub const ALL: [Self; 3] = [Self::Top50, Self::Top100, Self::Top150];

    pub const fn get(self) -> usize {
        match self {
            Self::Top50 => 50,
            Self::Top100 => 100,
            Self::Top150 => 150,
        }
    }
}

impl FromStr for ResultCap {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.get().to_string() == s)
            .ok_or_else(|| {
                ValidationError::new(format!(
                    "top value: {s}, is not valid, please use one of this values {CAP_VALUES}"
                ))
            })
    }
}

impl std::fmt::Display for ResultCap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A validated user search: who to look for and how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    location: String,
    cap: ResultCap,
}

impl Query {
    /// Validate raw inputs. The cap is checked first, then the location.
    pub fn parse(location: &str, cap_token: &str) -> Result<Self, ValidationError> {
        let cap = cap_token.parse()?;
        Self::new(location, cap)
    }

    pub fn new(location: &str, cap: ResultCap) -> Result<Self, ValidationError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ValidationError::new("location can not be empty"));
        }
        Ok(Self {
            location: location.to_string(),
            cap,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn cap(&self) -> ResultCap {
        self.cap
    }
}
