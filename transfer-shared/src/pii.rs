use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps contact data (e-mail, phone) so it never leaks through `{:?}` or
/// `{}` in log lines. Serialization still emits the real value because
/// persisted records and API responses need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl Masked<String> {
    /// `jane.doe@example.com` -> `j*******@example.com`. Anything without an
    /// `@` keeps only its last two characters.
    pub fn redacted(&self) -> String {
        let value = self.0.as_str();
        match value.split_once('@') {
            Some((local, domain)) => {
                let first: String = local.chars().take(1).collect();
                let hidden = local.chars().count().saturating_sub(1);
                format!("{}{}@{}", first, "*".repeat(hidden), domain)
            }
            None => {
                let count = value.chars().count();
                let tail: String = value.chars().skip(count.saturating_sub(2)).collect();
                format!("{}{}", "*".repeat(count.saturating_sub(2)), tail)
            }
        }
    }
}

impl fmt::Debug for Masked<String> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked({})", self.redacted())
    }
}

impl fmt::Display for Masked<String> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}
