//! Question intent classification and category prediction.
//!
//! Both are shallow pattern matches over the lexicon tables; they feed the
//! context-coherence re-ranking pass.

use crate::lexicon::Lexicon;

/// A classified question intent.
#[derive(Debug, Clone)]
pub struct Intent {
    /// Intent name from the lexicon ("general" when nothing matched).
    pub name: String,

    /// Matched-pattern count normalized to [0, 1] by dividing by 10.
    pub confidence: f32,

    /// The full pattern list of the winning intent, used as alignment
    /// keywords downstream.
    pub keywords: Vec<String>,
}

/// Classify a question against the lexicon intent patterns.
///
/// The intent with the most substring matches wins; earlier table entries
/// win ties.
pub fn classify_intent(question: &str, lexicon: &Lexicon) -> Intent {
    let lower = question.to_lowercase();

    let mut best: Option<(&crate::lexicon::IntentPattern, usize)> = None;

    for group in &lexicon.intents {
        let matches = group.patterns.iter().filter(|p| lower.contains(p.as_str())).count();
        if matches > best.map(|(_, m)| m).unwrap_or(0) {
            best = Some((group, matches));
        }
    }

    match best {
        Some((group, matches)) => Intent {
            name: group.name.clone(),
            confidence: matches as f32 / 10.0,
            keywords: group.patterns.clone(),
        },
        None => Intent {
            name: "general".to_string(),
            confidence: 0.0,
            keywords: Vec::new(),
        },
    }
}

/// Predict which chunk categories a question concerns.
///
/// Returns every category with at least one keyword hit; empty when
/// nothing matches (callers treat that as "no prediction").
pub fn predict_categories(question: &str, lexicon: &Lexicon) -> Vec<String> {
    let lower = question.to_lowercase();

    lexicon
        .categories
        .iter()
        .filter(|group| group.keywords.iter().any(|k| lower.contains(k.as_str())))
        .map(|group| group.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_calculation_intent() {
        let lexicon = Lexicon::default();
        let intent = classify_intent("maaş ne kadar, hesapla", &lexicon);
        assert_eq!(intent.name, "calculation");
        assert!(intent.confidence > 0.0);
        assert!(!intent.keywords.is_empty());
    }

    #[test]
    fn test_classify_falls_back_to_general() {
        let lexicon = Lexicon::default();
        let intent = classify_intent("merhaba", &lexicon);
        assert_eq!(intent.name, "general");
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn test_confidence_normalized_by_ten() {
        let lexicon = Lexicon::default();
        let intent = classify_intent("izin prosedür adım süreç işlem", &lexicon);
        assert_eq!(intent.name, "procedure_inquiry");
        assert!((intent.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_predict_categories() {
        let lexicon = Lexicon::default();
        let categories = predict_categories("yıllık izin ve maaş bordrosu", &lexicon);
        assert!(categories.contains(&"leave_vacation".to_string()));
        assert!(categories.contains(&"salary_benefits".to_string()));
    }

    #[test]
    fn test_predict_categories_empty_when_no_hit() {
        let lexicon = Lexicon::default();
        assert!(predict_categories("xyzzy", &lexicon).is_empty());
    }
}
