use std::collections::HashMap;

use crate::infra::provider_config::EnvSource;

/// Fixed environment for resolver tests, so they never touch process env.
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }
}

impl From<Vec<(&str, &str)>> for StaticEnv {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
