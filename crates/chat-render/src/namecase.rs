//! Username casing resolution.
//!
//! Wire logins are canonical lowercase; what gets displayed depends on
//! the configured policy. Resolutions are cached for the session: a
//! cache hit wins over every policy until an explicit reset (new
//! connection) or a policy-change clear. Nothing here expires by time.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Username casing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CasePolicy {
    /// Use the wire-supplied display name as-is.
    #[default]
    None,
    AllCaps,
    AllLower,
    /// Capitalize the first character, lowercase the rest.
    First,
    /// Defer to the external naming service.
    Lookup,
}

/// Fire-and-forget username lookup collaborator. Results arrive out of
/// band and are merged into the cache on a later tick.
pub trait NameLookup: Send + Sync {
    fn request(&self, login: &str);
}

/// Session-scoped casing cache: canonical lowercase login -> display.
#[derive(Debug, Default)]
pub struct NameCaseResolver {
    cache: HashMap<String, String>,
    pending: HashSet<String>,
}

impl NameCaseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the display casing for one message.
    ///
    /// The typed-casing scan runs before the configured policy and only
    /// when enabled: a whole-word, case-insensitive occurrence of the
    /// login in the message body is adopted exactly as typed and
    /// cached.
    pub fn resolve(
        &mut self,
        login: &str,
        wire_name: &str,
        body: &str,
        policy: CasePolicy,
        adopt_typed: bool,
        lookup: Option<&dyn NameLookup>,
    ) -> String {
        let key = login.to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        if adopt_typed {
            if let Some(typed) = find_typed_casing(body, login) {
                tracing::debug!(login = %key, casing = %typed, "adopted typed casing");
                self.cache.insert(key, typed.clone());
                return typed;
            }
        }

        match policy {
            CasePolicy::None => wire_name.to_string(),
            CasePolicy::AllCaps => wire_name.to_uppercase(),
            CasePolicy::AllLower => wire_name.to_lowercase(),
            CasePolicy::First => capitalize_first(wire_name),
            CasePolicy::Lookup => {
                if let Some(lookup) = lookup {
                    if self.pending.insert(key) {
                        lookup.request(login);
                    }
                }
                wire_name.to_string()
            }
        }
    }

    /// Merge a lookup result delivered by the collaborator.
    pub fn apply_result(&mut self, login: &str, resolved: &str) {
        let key = login.to_lowercase();
        self.pending.remove(&key);
        self.cache.insert(key, resolved.to_string());
    }

    /// Cached casing, if any.
    pub fn cached(&self, login: &str) -> Option<&str> {
        self.cache.get(&login.to_lowercase()).map(String::as_str)
    }

    /// Clear cache and in-flight requests. Called on session reset and
    /// on policy change.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.pending.clear();
    }
}

/// Whole-word, ASCII-case-insensitive scan of the body for the login.
/// Returns the matched text exactly as typed.
fn find_typed_casing(body: &str, login: &str) -> Option<String> {
    if login.is_empty() || login.len() > body.len() {
        return None;
    }
    let n = login.len();
    for i in 0..=body.len() - n {
        if !body.is_char_boundary(i) || !body.is_char_boundary(i + n) {
            continue;
        }
        let candidate = &body[i..i + n];
        if !candidate.eq_ignore_ascii_case(login) {
            continue;
        }
        let prev = body[..i].chars().next_back();
        let next = body[i + n..].chars().next();
        if is_word_boundary(prev) && is_word_boundary(next) {
            return Some(candidate.to_string());
        }
    }
    None
}

fn is_word_boundary(ch: Option<char>) -> bool {
    match ch {
        None => true,
        Some(c) => !c.is_alphanumeric() && c != '_',
    }
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn resolve(
        resolver: &mut NameCaseResolver,
        body: &str,
        policy: CasePolicy,
        adopt: bool,
    ) -> String {
        resolver.resolve("somename", "SomeName", body, policy, adopt, None)
    }

    #[test]
    fn policy_none_keeps_wire_name() {
        let mut r = NameCaseResolver::new();
        assert_eq!(resolve(&mut r, "hi", CasePolicy::None, false), "SomeName");
    }

    #[test]
    fn transform_policies() {
        let mut r = NameCaseResolver::new();
        assert_eq!(resolve(&mut r, "hi", CasePolicy::AllCaps, false), "SOMENAME");
        assert_eq!(resolve(&mut r, "hi", CasePolicy::AllLower, false), "somename");
        assert_eq!(resolve(&mut r, "hi", CasePolicy::First, false), "Somename");
    }

    #[test]
    fn typed_casing_is_adopted_and_cached() {
        let mut r = NameCaseResolver::new();
        let got = resolve(&mut r, "I am SoMeNaMe hello", CasePolicy::AllCaps, true);
        assert_eq!(got, "SoMeNaMe");
        assert_eq!(r.cached("somename"), Some("SoMeNaMe"));

        // Cache hit wins over the policy from now on.
        let again = resolve(&mut r, "no mention here", CasePolicy::AllCaps, true);
        assert_eq!(again, "SoMeNaMe");
    }

    #[test]
    fn typed_scan_requires_whole_words() {
        let mut r = NameCaseResolver::new();
        let got = resolve(&mut r, "xsomenamex is not me", CasePolicy::None, true);
        assert_eq!(got, "SomeName");
        assert!(r.cached("somename").is_none());

        let got = resolve(&mut r, "somename_ also no", CasePolicy::None, true);
        assert_eq!(got, "SomeName");

        let got = resolve(&mut r, "hey somename!", CasePolicy::None, true);
        assert_eq!(got, "somename");
    }

    #[test]
    fn typed_scan_is_independently_togglable() {
        let mut r = NameCaseResolver::new();
        let got = resolve(&mut r, "I am SoMeNaMe", CasePolicy::AllCaps, false);
        assert_eq!(got, "SOMENAME");
        assert!(r.cached("somename").is_none());
    }

    #[test]
    fn repeated_resolutions_are_stable_until_reset() {
        let mut r = NameCaseResolver::new();
        r.apply_result("somename", "SomeName_");
        for _ in 0..3 {
            assert_eq!(resolve(&mut r, "x", CasePolicy::AllLower, true), "SomeName_");
        }
        r.reset();
        assert_eq!(resolve(&mut r, "x", CasePolicy::AllLower, true), "somename");
    }

    struct RecordingLookup {
        requests: Mutex<Vec<String>>,
    }

    impl NameLookup for RecordingLookup {
        fn request(&self, login: &str) {
            self.requests.lock().unwrap().push(login.to_string());
        }
    }

    #[test]
    fn lookup_policy_requests_once_and_merges() {
        let lookup = RecordingLookup {
            requests: Mutex::new(Vec::new()),
        };
        let mut r = NameCaseResolver::new();

        let first = r.resolve("somename", "somename", "x", CasePolicy::Lookup, false, Some(&lookup));
        assert_eq!(first, "somename");
        let second = r.resolve("somename", "somename", "x", CasePolicy::Lookup, false, Some(&lookup));
        assert_eq!(second, "somename");
        // One in-flight request, no duplicates.
        assert_eq!(lookup.requests.lock().unwrap().as_slice(), ["somename"]);

        r.apply_result("somename", "SomeName");
        let third = r.resolve("somename", "somename", "x", CasePolicy::Lookup, false, Some(&lookup));
        assert_eq!(third, "SomeName");
    }
}
