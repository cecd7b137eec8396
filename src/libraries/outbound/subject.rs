use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Placeholder replaced with the user id in the user key template
pub const USER_PLACEHOLDER: &str = "{user}";
/// Placeholder replaced with the subject name in override templates
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// Templates mapping a connection's identity onto routing keys
#[derive(Debug, Clone)]
pub struct SubjectKeyConfig {
    /// Template for the per-user key, must contain [`USER_PLACEHOLDER`]
    pub user_template: String,
    /// Prefix prepended to subject names without an override
    pub subject_prefix: String,
    /// Per-subject template overrides, keyed by the exact subject name
    pub overrides: HashMap<String, String>,
}

impl Default for SubjectKeyConfig {
    fn default() -> Self {
        Self {
            user_template: "user:{user}".to_string(),
            subject_prefix: "subject:".to_string(),
            overrides: HashMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubjectKeyError {
    #[error("user key template '{0}' does not contain the {{user}} placeholder")]
    MissingUserPlaceholder(String),
    #[error("override template for subject '{0}' is empty")]
    EmptyOverride(String),
}

/// Derives the set of routing keys addressed by one connection
///
/// Every resolution yields the per-user key plus one key per subscribed
/// subject. Validation happens once at construction so that `resolve` itself
/// is infallible on the hot path.
#[derive(Debug, Clone)]
pub struct SubjectKeyResolver {
    config: SubjectKeyConfig,
}

impl SubjectKeyResolver {
    pub fn new(config: SubjectKeyConfig) -> Result<Self, SubjectKeyError> {
        if !config.user_template.contains(USER_PLACEHOLDER) {
            return Err(SubjectKeyError::MissingUserPlaceholder(
                config.user_template,
            ));
        }

        for (subject, template) in &config.overrides {
            if template.is_empty() {
                return Err(SubjectKeyError::EmptyOverride(subject.clone()));
            }
        }

        Ok(Self { config })
    }

    pub fn resolve(&self, subjects: &HashSet<String>, user_id: &str) -> HashSet<String> {
        let mut keys = HashSet::with_capacity(subjects.len() + 1);
        keys.insert(self.config.user_template.replace(USER_PLACEHOLDER, user_id));

        for subject in subjects {
            let key = match self.config.overrides.get(subject) {
                Some(template) => template.replace(SUBJECT_PLACEHOLDER, subject),
                None => format!("{}{}", self.config.subject_prefix, subject),
            };
            keys.insert(key);
        }

        keys
    }
}
