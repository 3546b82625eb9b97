use std::collections::HashSet;

use serde::Serialize;

use crate::error::{MonitorError, Result};

// ─── Built-in target list ────────────────────────────────────────

/// Endpoints monitored by default, in report order.
const DEFAULT_TARGETS: &[(&str, &str)] = &[
    // Popular global services
    ("https://www.google.com", "Global"),
    ("https://www.github.com", "Global"),
    ("https://www.stackoverflow.com", "Global"),
    ("https://www.wikipedia.org", "Global"),
    ("https://www.nytimes.com", "News"),
    ("https://www.bbc.com", "News"),
    ("https://www.netflix.com", "Entertainment"),
    ("https://www.cloudflare.com", "Cloud"),
    ("https://www.digitalocean.com", "Cloud"),
    // API endpoints
    ("https://api.github.com", "API"),
    ("https://api.openweathermap.org", "API"),
    ("https://dog.ceo/api/breeds/image/random", "API"),
    ("https://catfact.ninja/fact", "API"),
    ("https://jsonplaceholder.typicode.com/posts", "API"),
    // Education / data science
    ("https://www.kaggle.com", "Education"),
    ("https://www.coursera.org", "Education"),
    // AI and ML
    ("https://huggingface.co", "AI"),
    ("https://www.tensorflow.org", "AI"),
    ("https://pytorch.org", "AI"),
    // Miscellaneous
    ("https://news.ycombinator.com", "News"),
    ("https://developer.mozilla.org", "Documentation"),
    ("https://www.python.org", "Programming"),
];

// ─── Types ───────────────────────────────────────────────────────

/// One monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub url: String,
    pub category: String,
}

impl Target {
    pub fn new(url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
        }
    }
}

/// Read-only, ordered set of targets. Iteration order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// Validates every URL and rejects duplicates.
    pub fn new(targets: Vec<Target>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(targets.len());
        for target in &targets {
            reqwest::Url::parse(&target.url).map_err(|e| MonitorError::InvalidTarget {
                url: target.url.clone(),
                reason: e.to_string(),
            })?;
            if !seen.insert(target.url.as_str()) {
                return Err(MonitorError::DuplicateTarget(target.url.clone()));
            }
        }
        Ok(Self { targets })
    }

    /// The compiled-in default list.
    pub fn builtin() -> Result<Self> {
        Self::new(
            DEFAULT_TARGETS
                .iter()
                .map(|(url, category)| Target::new(*url, *category))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn urls(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
