use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Immutable set of accepted credential keys
///
/// A key is `username + "_" + password`. Membership is exact and
/// case-sensitive. The set is fixed when the process starts and is shared by
/// reference afterwards.
///
/// # Example
/// ```
/// use auth_gateway::security::AllowSet;
///
/// let allowed = AllowSet::new(["admin_admin", "johnd_foo"]);
///
/// assert!(allowed.is_authorized("johnd", "foo"));
/// assert!(!allowed.is_authorized("johnd", "FOO"));
/// ```
#[derive(Clone, Default)]
pub struct AllowSet {
    keys: Arc<HashSet<String>>,
}

impl AllowSet {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: Arc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Derive the lookup key for a credential pair
    pub fn key(username: &str, password: &str) -> String {
        format!("{}_{}", username, password)
    }

    pub fn is_authorized(&self, username: &str, password: &str) -> bool {
        self.keys.contains(&Self::key(username, password))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// keys embed passwords
impl fmt::Debug for AllowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllowSet").field("len", &self.keys.len()).finish()
    }
}
