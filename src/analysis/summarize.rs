use crate::analysis::category::CategoryConfig;
use crate::image_classifier::interface::{ClassProbability, ClassificationVector};
use indexmap::IndexMap;

pub const TOP_K: usize = 3;

/// Bumped whenever the shape of [`AnalysisResult`] changes.
pub const ANALYSIS_RESULT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub version: u32,
    /// Sum over the target category, full precision.
    pub aggregate_probability: f64,
    /// Top entries per category, keyed by category name. The target
    /// category comes first, then the secondary ones in configured order.
    pub ranked_by_category: IndexMap<String, Vec<ClassProbability>>,
    pub full_vector: ClassificationVector,
}

impl AnalysisResult {
    pub fn ranked(&self, category: &str) -> &[ClassProbability] {
        self.ranked_by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn best_match(&self, category: &str) -> Option<&ClassProbability> {
        self.ranked(category).first()
    }

    pub fn aggregate_percent(&self) -> i64 {
        (self.aggregate_probability * 100.0).round() as i64
    }
}

/// Highest probabilities first; equal probabilities keep model order.
pub fn rank_top(entries: Vec<ClassProbability>, k: usize) -> Vec<ClassProbability> {
    let mut entries = entries;
    entries.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    entries.truncate(k);
    entries
}

pub fn summarize(vector: &ClassificationVector, config: &CategoryConfig) -> AnalysisResult {
    let aggregate_probability = vector
        .iter()
        .filter(|c| config.target.contains(&c.label))
        .map(|c| c.probability)
        .sum();

    let ranked_by_category = config
        .all()
        .map(|category| {
            let members = vector
                .iter()
                .filter(|c| category.contains(&c.label))
                .cloned()
                .collect();
            (category.name.clone(), rank_top(members, TOP_K))
        })
        .collect();

    AnalysisResult {
        version: ANALYSIS_RESULT_VERSION,
        aggregate_probability,
        ranked_by_category,
        full_vector: vector.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::category::Category;

    fn vector(entries: &[(&str, f64)]) -> ClassificationVector {
        entries
            .iter()
            .map(|(label, p)| ClassProbability::new(*label, *p))
            .collect()
    }

    fn labels(entries: &[ClassProbability]) -> Vec<&str> {
        entries.iter().map(|c| c.label.as_str()).collect()
    }

    fn exact_target(labels: &[&str]) -> CategoryConfig {
        CategoryConfig {
            target: Category::exact("target", labels.iter().map(|l| l.to_string()).collect()),
            secondary: vec![],
        }
    }

    #[test]
    fn test_aggregate_sums_exactly_the_target_entries() {
        let config = exact_target(&["a", "c"]);
        let v = vector(&[("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4)]);

        let result = summarize(&v, &config);

        assert!((result.aggregate_probability - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_uses_full_precision() {
        let config = exact_target(&["a", "b", "c"]);
        let v = vector(&[("a", 0.333333), ("b", 0.333333), ("c", 0.333334)]);

        let result = summarize(&v, &config);

        assert!((result.aggregate_probability - 1.0).abs() < 1e-12);
        assert_eq!(result.aggregate_percent(), 100);
    }

    #[test]
    fn test_no_target_match_gives_zero() {
        let config = exact_target(&["이재명"]);
        let v = vector(&[("x", 0.7), ("y", 0.3)]);

        let result = summarize(&v, &config);

        assert_eq!(result.aggregate_probability, 0.0);
        assert!(result.ranked("target").is_empty());
        assert_eq!(result.full_vector, v);
    }

    #[test]
    fn test_ranking_is_descending_and_truncated() {
        let config = exact_target(&["a", "b", "c", "d", "e"]);
        let v = vector(&[("a", 0.05), ("b", 0.4), ("c", 0.1), ("d", 0.3), ("e", 0.15)]);

        let result = summarize(&v, &config);

        assert_eq!(labels(result.ranked("target")), vec!["b", "d", "e"]);
    }

    #[test]
    fn test_ties_keep_model_order() {
        let config = exact_target(&["a", "b", "c", "d"]);
        let v = vector(&[("a", 0.2), ("b", 0.3), ("c", 0.3), ("d", 0.2)]);

        let result = summarize(&v, &config);

        assert_eq!(labels(result.ranked("target")), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_categories_are_independent_groupings() {
        let config = CategoryConfig {
            target: Category::prefix("대통령", "대통령_"),
            secondary: vec![
                Category::prefix("유명인", "유명인_"),
                Category::exact("mixed", vec!["대통령_박정희".into(), "유명인_아이유".into()]),
            ],
        };
        let v = vector(&[
            ("대통령_박정희", 0.5),
            ("유명인_아이유", 0.3),
            ("대통령_김대중", 0.1),
            ("기타", 0.1),
        ]);

        let result = summarize(&v, &config);

        assert!((result.aggregate_probability - 0.6).abs() < 1e-12);
        let names: Vec<&String> = result.ranked_by_category.keys().collect();
        assert_eq!(names, vec!["대통령", "유명인", "mixed"]);
        assert_eq!(
            labels(result.ranked("대통령")),
            vec!["대통령_박정희", "대통령_김대중"]
        );
        assert_eq!(labels(result.ranked("유명인")), vec!["유명인_아이유"]);
        assert_eq!(
            labels(result.ranked("mixed")),
            vec!["대통령_박정희", "유명인_아이유"]
        );
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let config = CategoryConfig::default();
        let v = vector(&[
            ("대통령_이승만", 0.25),
            ("대통령_박정희", 0.25),
            ("유명인_배우", 0.25),
            ("기타", 0.25),
        ]);

        assert_eq!(summarize(&v, &config), summarize(&v, &config));
    }

    #[test]
    fn test_single_president_scenario() {
        let config = exact_target(&["이재명"]);
        let v = vector(&[("이재명", 0.92), ("기타", 0.08)]);

        let result = summarize(&v, &config);

        assert_eq!(result.aggregate_probability, 0.92);
        let best = result.best_match("target").unwrap();
        assert_eq!(best.label, "이재명");
        assert_eq!(best.percent(), 92);
    }
}
