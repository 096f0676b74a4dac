//! Identity types for Syncline sessions and streams
//!
//! Session ids are free-form strings on the wire (older records use
//! timestamps like `20240101_120000`), so they are kept as strings here.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identity - binds every sample and event of one recording
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    /// Generate a fresh random session id
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().simple().to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source id advertised for streams owned by this session
    pub fn source_id(&self) -> String {
        format!("session_{}", self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

/// Stream identity - the name a continuous source advertises
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamName(String);

impl StreamName {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        StreamName(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive exact or substring match against selection filters.
    /// An empty filter set selects every stream; blank filters are ignored.
    pub fn matches_any<S: AsRef<str>>(&self, filters: &[S]) -> bool {
        let wanted: Vec<String> = filters
            .iter()
            .map(|f| f.as_ref().trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        if wanted.is_empty() {
            return true;
        }
        let name = self.0.to_lowercase();
        wanted.iter().any(|f| *f == name || name.contains(f.as_str()))
    }
}

impl fmt::Debug for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream({})", self.0)
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamName {
    fn from(s: &str) -> Self {
        StreamName::new(s)
    }
}

impl PartialEq<str> for StreamName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StreamName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_generate_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_session_source_id() {
        let id = SessionId::new("20240101_120000");
        assert_eq!(id.source_id(), "session_20240101_120000");
    }

    #[test]
    fn test_stream_filter_substring_case_insensitive() {
        let name = StreamName::new("EmotiBit_EDA");
        assert!(name.matches_any(&["emotibit"]));
        assert!(name.matches_any(&["EMOTIBIT_EDA"]));
        assert!(!name.matches_any(&["tobii"]));
    }

    #[test]
    fn test_stream_filter_empty_selects_all() {
        let name = StreamName::new("Tobii_Gaze");
        let none: [&str; 0] = [];
        assert!(name.matches_any(&none));
        assert!(name.matches_any(&["", "  "]));
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
