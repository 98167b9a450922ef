use crate::error::ConfigError;
use serde::Deserialize;

/// How a category decides whether a label belongs to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelMatcher {
    Exact { labels: Vec<String> },
    Prefix { prefix: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(flatten)]
    pub matcher: LabelMatcher,
}

impl Category {
    pub fn exact(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            matcher: LabelMatcher::Exact { labels },
        }
    }

    pub fn prefix(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matcher: LabelMatcher::Prefix {
                prefix: prefix.into(),
            },
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        match &self.matcher {
            LabelMatcher::Exact { labels } => labels.iter().any(|l| l == label),
            LabelMatcher::Prefix { prefix } => label.starts_with(prefix.as_str()),
        }
    }

    /// Label as shown to the user: a category prefix is not part of the name.
    pub fn display_label<'a>(&self, label: &'a str) -> &'a str {
        match &self.matcher {
            LabelMatcher::Prefix { prefix } => label.strip_prefix(prefix.as_str()).unwrap_or(label),
            LabelMatcher::Exact { .. } => label,
        }
    }
}

/// The target category plus any number of secondary groupings. Every
/// category is evaluated independently over the same vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryConfig {
    pub target: Category,
    #[serde(default)]
    pub secondary: Vec<Category>,
}

impl CategoryConfig {
    pub fn all(&self) -> impl Iterator<Item = &Category> {
        std::iter::once(&self.target).chain(self.secondary.iter())
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.all().find(|c| c.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: Vec<&str> = Vec::new();
        for category in self.all() {
            if category.name.trim().is_empty() {
                return Err(ConfigError::Category("category name is empty".to_string()));
            }
            if seen.contains(&category.name.as_str()) {
                return Err(ConfigError::Category(format!(
                    "duplicate category name: {}",
                    category.name
                )));
            }
            seen.push(&category.name);

            match &category.matcher {
                LabelMatcher::Prefix { prefix } if prefix.is_empty() => {
                    return Err(ConfigError::Category(format!(
                        "category {} has an empty prefix",
                        category.name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            target: Category::prefix("대통령", "대통령_"),
            secondary: vec![Category::prefix("유명인", "유명인_")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_membership() {
        let category = Category::exact("target", vec!["이재명".into(), "윤석열".into()]);

        assert!(category.contains("이재명"));
        assert!(!category.contains("이재명2"));
        assert_eq!(category.display_label("이재명"), "이재명");
    }

    #[test]
    fn test_prefix_membership_and_display() {
        let category = Category::prefix("유명인", "유명인_");

        assert!(category.contains("유명인_아이유"));
        assert!(!category.contains("대통령_박정희"));
        assert_eq!(category.display_label("유명인_아이유"), "아이유");
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_prefix() {
        let duplicate = CategoryConfig {
            target: Category::prefix("a", "a_"),
            secondary: vec![Category::prefix("a", "b_")],
        };
        assert!(matches!(duplicate.validate(), Err(ConfigError::Category(_))));

        let empty_prefix = CategoryConfig {
            target: Category::prefix("a", ""),
            secondary: vec![],
        };
        assert!(matches!(empty_prefix.validate(), Err(ConfigError::Category(_))));

        assert!(CategoryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let config: CategoryConfig = toml::from_str(
            r#"
            [target]
            name = "presidents"
            kind = "exact"
            labels = ["이재명", "문재인"]

            [[secondary]]
            name = "celebrities"
            kind = "prefix"
            prefix = "유명인_"
            "#,
        )
        .unwrap();

        assert!(config.target.contains("문재인"));
        assert_eq!(config.secondary.len(), 1);
        assert!(config.get("celebrities").unwrap().contains("유명인_아이유"));
    }
}
