//! Externalized vocabulary tables.
//!
//! Synonyms, morphology, stopwords, topic markers, intent patterns and
//! category keywords are data, not code. The built-in default carries the
//! Turkish HR vocabulary this engine was originally tuned for; a TOML
//! file with the same shape substitutes any other language or domain.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use sift_core::{Result, SiftError};

/// An intent pattern group. Patterns are matched by substring containment
/// against the lowercased question; order decides ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentPattern {
    pub name: String,
    pub patterns: Vec<String>,
}

/// Keywords signalling that a chunk category is relevant to a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

/// The full vocabulary table.
///
/// Field order matters for TOML serialization: plain arrays before
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Tokens dropped during keyword extraction.
    #[serde(default)]
    pub stopwords: HashSet<String>,

    /// Topic marker words used for stagnation detection.
    #[serde(default)]
    pub topics: Vec<String>,

    /// Term -> synonym list for expansion.
    #[serde(default)]
    pub synonyms: HashMap<String, Vec<String>>,

    /// Root -> inflected variants for morphological expansion.
    #[serde(default)]
    pub morphology: HashMap<String, Vec<String>>,

    /// Term -> associated domain terms.
    #[serde(default)]
    pub domain: HashMap<String, Vec<String>>,

    /// Intent pattern groups, in precedence order.
    #[serde(default)]
    pub intents: Vec<IntentPattern>,

    /// Category keyword groups.
    #[serde(default)]
    pub categories: Vec<CategoryKeywords>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::turkish_hr()
    }
}

impl Lexicon {
    /// Load a lexicon from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            SiftError::config(format!("Failed to parse lexicon: {}", e))
        })
    }

    /// The built-in Turkish HR vocabulary.
    pub fn turkish_hr() -> Self {
        let stopwords = [
            "nasıl", "nedir", "hangi", "kaç", "ne", "ile", "ve", "veya", "ama", "fakat",
            "ancak", "çünkü", "eğer", "ise", "de", "da", "te", "ta", "mi", "mı", "mu", "mü",
            "bir", "bu", "şu", "için", "gibi",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let synonyms = table([
            ("maaş", &["ücret", "bordro", "gelir", "kazanç", "ödeme"][..]),
            ("izin", &["tatil", "raporlu", "istirahat", "izinli"]),
            ("çalışan", &["personel", "işçi", "memur", "kadro"]),
            ("şirket", &["kurum", "firma", "organizasyon", "işletme"]),
            ("başvuru", &["müracaat", "talep", "form", "dilekçe"]),
            ("departman", &["bölüm", "birim", "ekip", "kısım"]),
            ("yönetici", &["müdür", "amir", "şef"]),
            ("saat", &["zaman", "süre", "vardiya", "mesai"]),
            ("terfi", &["yükselme", "promosyon", "kariyer"]),
            ("eğitim", &["kurs", "seminer", "öğretim", "gelişim"]),
            ("performans", &["başarı", "verimlilik", "etkinlik"]),
            ("disiplin", &["ceza", "uyarı", "yaptırım"]),
            ("hak", &["yetki", "imkan", "imtiyaz"]),
            ("yükümlülük", &["görev", "sorumluluk", "vazife"]),
            ("güvenlik", &["emniyet", "korunma", "sigorta"]),
        ]);

        let morphology = table([
            ("çalış", &["çalışma", "çalışan", "çalışır"][..]),
            ("işlem", &["işle", "işleyiş"]),
            ("öde", &["ödeme", "ödenir"]),
            ("başla", &["başlangıç", "başlar"]),
            ("bitir", &["bitiş", "biter"]),
        ]);

        let domain = table([
            ("maaş", &["özlük", "finansal"][..]),
            ("izin", &["dinlenme", "yıllık"]),
            ("performans", &["değerlendirme", "hedef"]),
            ("eğitim", &["yetkinlik", "sertifikasyon"]),
        ]);

        let topics = [
            "maaş", "izin", "çalışan", "eğitim", "performans", "güvenlik", "seyahat",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let intents = vec![
            intent("information_seeking", &["nedir", "ne demek", "açıkla", "bilgi", "öğren", "nasıl"]),
            intent("procedure_inquiry", &["nasıl yapılır", "adım", "prosedür", "süreç", "işlem"]),
            intent("policy_question", &["kural", "politika", "yönetmelik", "yasak", "izin"]),
            intent("calculation", &["hesapla", "kaç", "ne kadar", "miktar", "ücret", "maaş"]),
            intent("troubleshooting", &["sorun", "problem", "hata", "çözüm", "yardım"]),
            intent("comparison", &["fark", "karşılaştır", "hangisi", "seçenek"]),
            intent("deadline", &["tarih", "zaman", "ne zaman", "süre"]),
        ];

        let categories = vec![
            category("hr_policy", &["politika", "kural", "yönetmelik", "prosedür"]),
            category("salary_benefits", &["maaş", "ücret", "bordro", "prim", "tazminat"]),
            category("leave_vacation", &["izin", "tatil", "rapor", "hastalık"]),
            category("recruitment", &["işe alım", "mülakat", "başvuru", "cv"]),
            category("performance", &["performans", "değerlendirme", "hedef", "başarı"]),
            category("training", &["eğitim", "kurs", "seminer", "gelişim"]),
            category("discipline", &["disiplin", "ceza", "uyarı", "ihlal"]),
            category("security", &["güvenlik", "erişim", "şifre", "veri"]),
            category("travel", &["seyahat", "konaklama", "harcırah", "yolluk"]),
            category("office_management", &["ofis", "masa", "ekipman", "rezervasyon"]),
        ];

        Self {
            stopwords,
            synonyms,
            morphology,
            domain,
            topics,
            intents,
            categories,
        }
    }

    /// An empty lexicon; extraction still lowercases and length-filters.
    pub fn empty() -> Self {
        Self {
            stopwords: HashSet::new(),
            synonyms: HashMap::new(),
            morphology: HashMap::new(),
            domain: HashMap::new(),
            topics: Vec::new(),
            intents: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Whether a token is a stopword.
    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

fn table<const N: usize>(entries: [(&str, &[&str]); N]) -> HashMap<String, Vec<String>> {
    entries
        .into_iter()
        .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
        .collect()
}

fn intent(name: &str, patterns: &[&str]) -> IntentPattern {
    IntentPattern {
        name: name.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}

fn category(name: &str, keywords: &[&str]) -> CategoryKeywords {
    CategoryKeywords {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexicon_has_tables() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_stopword("nasıl"));
        assert!(lexicon.synonyms.contains_key("izin"));
        assert_eq!(lexicon.intents.len(), 7);
        assert!(!lexicon.categories.is_empty());
    }

    #[test]
    fn test_lexicon_roundtrip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.toml");

        let serialized = toml::to_string(&Lexicon::default()).unwrap();
        std::fs::write(&path, serialized).unwrap();

        let loaded = Lexicon::load(&path).unwrap();
        assert!(loaded.is_stopword("kaç"));
        assert_eq!(loaded.topics.len(), Lexicon::default().topics.len());
    }

    #[test]
    fn test_empty_lexicon() {
        let lexicon = Lexicon::empty();
        assert!(!lexicon.is_stopword("nasıl"));
        assert!(lexicon.intents.is_empty());
    }
}
