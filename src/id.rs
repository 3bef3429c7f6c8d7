use std::{fmt, ops::Deref, str::FromStr};

/// A course's unique identifier, as it appears in paths like
/// `/course/:id`.
#[derive(Debug, Clone, PartialEq, Hash, Eq, PartialOrd, Ord)]
pub struct CourseId(String);

impl<S: Into<String>> From<S> for CourseId {
    fn from(other: S) -> CourseId { CourseId(other.into()) }
}

impl Deref for CourseId {
    type Target = str;

    fn deref(&self) -> &str { &self.0 }
}

impl FromStr for CourseId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<CourseId, Self::Err> {
        Ok(CourseId::from(s))
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
