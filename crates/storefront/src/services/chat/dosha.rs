//! Dosha questionnaire scoring.
//!
//! Each answer key is attributed to one dosha by substring: keys mentioning
//! body or skin score vata, appetite or temperature score pitta, weight or
//! energy score kapha. Keys matching none are ignored.

use std::collections::BTreeMap;

use serde::Serialize;

use super::knowledge::Language;

/// One of the three doshas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
}

impl Dosha {
    fn for_key(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        if key.contains("body") || key.contains("skin") {
            Some(Self::Vata)
        } else if key.contains("appetite") || key.contains("temp") {
            Some(Self::Pitta)
        } else if key.contains("weight") || key.contains("energy") {
            Some(Self::Kapha)
        } else {
            None
        }
    }

    /// Lifestyle recommendations for a dominant dosha.
    #[must_use]
    pub const fn recommendations(self, language: Language) -> [&'static str; 4] {
        match (language, self) {
            (Language::En, Self::Vata) => [
                "🌡️ Eat warm, oily foods",
                "⏰ Maintain regular routine",
                "🧘 Practice yoga and meditation",
                "😴 Get adequate sleep (8 hours)",
            ],
            (Language::En, Self::Pitta) => [
                "❄️ Eat cool, juicy foods",
                "🌙 Avoid excess heat",
                "😌 Maintain mental peace",
                "💧 Drink plenty of water",
            ],
            (Language::En, Self::Kapha) => [
                "🔥 Eat warm, light foods",
                "🏃 Increase exercise and activity",
                "☀️ Wake up early",
                "🌶️ Include spices in meals",
            ],
            (Language::Hi, Self::Vata) => [
                "🌡️ गर्म, तैलीय खाद्य पदार्थ खाएं",
                "⏰ नियमित दिनचर्या बनाएं",
                "🧘 योग और ध्यान करें",
                "😴 पर्याप्त नींद लें (8 घंटे)",
            ],
            (Language::Hi, Self::Pitta) => [
                "❄️ ठंडे, रस युक्त खाद्य पदार्थ खाएं",
                "🌙 गर्मी से बचें",
                "😌 मानसिक शांति बनाए रखें",
                "💧 पर्याप्त पानी पिएं",
            ],
            (Language::Hi, Self::Kapha) => [
                "🔥 गर्म, हल्के खाद्य पदार्थ खाएं",
                "🏃 व्यायाम और गतिविधि बढ़ाएं",
                "☀️ सुबह जल्दी उठें",
                "🌶️ मसालेदार खाना खाएं",
            ],
        }
    }
}

/// Percentage per dosha. Truncated, so the sum may be under 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoshaScores {
    pub vata: u32,
    pub pitta: u32,
    pub kapha: u32,
}

impl DoshaScores {
    /// Dominant dosha. Ties go to vata, then pitta.
    #[must_use]
    pub const fn primary(&self) -> Dosha {
        if self.vata >= self.pitta && self.vata >= self.kapha {
            Dosha::Vata
        } else if self.pitta >= self.kapha {
            Dosha::Pitta
        } else {
            Dosha::Kapha
        }
    }
}

/// Score questionnaire answers.
///
/// Negative answers count as zero. When nothing scores, the result is the
/// neutral 33/33/34 split.
#[must_use]
pub fn score(answers: &BTreeMap<String, f64>) -> DoshaScores {
    let (mut vata, mut pitta, mut kapha) = (0.0_f64, 0.0_f64, 0.0_f64);

    for (key, value) in answers {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        match Dosha::for_key(key) {
            Some(Dosha::Vata) => vata += value,
            Some(Dosha::Pitta) => pitta += value,
            Some(Dosha::Kapha) => kapha += value,
            None => {}
        }
    }

    let total = vata + pitta + kapha;
    if total <= 0.0 {
        return DoshaScores {
            vata: 33,
            pitta: 33,
            kapha: 34,
        };
    }

    DoshaScores {
        vata: percentage(vata, total),
        pitta: percentage(pitta, total),
        kapha: percentage(kapha, total),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(part: f64, total: f64) -> u32 {
    (part / total * 100.0).trunc().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_score_by_key_family() {
        let scores = score(&answers(&[
            ("body_frame", 3.0),
            ("skin_type", 3.0),
            ("appetite", 2.0),
            ("energy_level", 2.0),
        ]));
        assert_eq!(scores, DoshaScores { vata: 60, pitta: 20, kapha: 20 });
        assert_eq!(scores.primary(), Dosha::Vata);
    }

    #[test]
    fn test_percentages_truncate() {
        let scores = score(&answers(&[("body", 1.0), ("temperature", 1.0), ("weight", 1.0)]));
        assert_eq!(scores, DoshaScores { vata: 33, pitta: 33, kapha: 33 });
    }

    #[test]
    fn test_zero_total_is_neutral() {
        let scores = score(&answers(&[("sleep", 5.0), ("body", 0.0)]));
        assert_eq!(scores, DoshaScores { vata: 33, pitta: 33, kapha: 34 });
        assert_eq!(scores.primary(), Dosha::Kapha);
    }

    #[test]
    fn test_negative_and_non_finite_answers_ignored() {
        let scores = score(&answers(&[("weight", 4.0), ("skin", -10.0), ("appetite", f64::NAN)]));
        assert_eq!(scores, DoshaScores { vata: 0, pitta: 0, kapha: 100 });
        assert_eq!(scores.primary(), Dosha::Kapha);
    }

    #[test]
    fn test_primary_tie_break() {
        assert_eq!(DoshaScores { vata: 40, pitta: 40, kapha: 20 }.primary(), Dosha::Vata);
        assert_eq!(DoshaScores { vata: 20, pitta: 40, kapha: 40 }.primary(), Dosha::Pitta);
    }

    #[test]
    fn test_recommendations_per_language() {
        assert_eq!(Dosha::Pitta.recommendations(Language::En)[3], "💧 Drink plenty of water");
        assert_eq!(Dosha::Kapha.recommendations(Language::Hi)[2], "☀️ सुबह जल्दी उठें");
    }
}
