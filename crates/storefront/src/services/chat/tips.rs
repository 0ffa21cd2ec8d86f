//! Daily Ayurveda tips.

use serde::Serialize;

use super::knowledge::{DOSHA_SLOK, Language, PREVENTION_SLOK, SEASONAL_SLOK, Slok};

struct Tip {
    category: &'static str,
    title: (&'static str, &'static str),
    description: (&'static str, &'static str),
    slok: &'static Slok,
    benefits: ([&'static str; 3], [&'static str; 3]),
}

const TIPS: &[Tip] = &[
    Tip {
        category: "lifestyle",
        title: ("Importance of Daily Routine", "नियमित दिनचर्या का महत्व"),
        description: (
            "Ayurveda emphasizes that a regular daily routine maintains physical and mental health. Sleep, wake, and eat at the same time every day.",
            "आयुर्वेद कहता है कि नियमित दिनचर्या शरीर और मन को स्वस्थ रखती है। हर दिन एक ही समय पर सोना, जागना और खाना खाना चाहिए।",
        ),
        slok: &PREVENTION_SLOK,
        benefits: (
            ["Better digestion", "Strong immunity", "Good sleep"],
            ["बेहतर पाचन", "मजबूत प्रतिरक्षा", "अच्छी नींद"],
        ),
    },
    Tip {
        category: "dosha",
        title: ("Understanding Three Doshas", "तीनों दोषों को समझें"),
        description: (
            "Vata (air), Pitta (fire), and Kapha (earth-water) maintain balance in the body.",
            "वात (हवा), पित्त (अग्नि) और कफ (पृथ्वी-जल), ये तीनों दोष शरीर में संतुलन बनाते हैं।",
        ),
        slok: &DOSHA_SLOK,
        benefits: (
            ["Dosha balance", "Good health", "Disease-free"],
            ["दोष संतुलन", "सुस्वास्थ्य", "निरोगता"],
        ),
    },
    Tip {
        category: "seasonal",
        title: ("Seasonal Eating", "ऋतु अनुसार आहार"),
        description: (
            "Different foods suit different seasons. Eat cooling foods in summer and warming foods in winter.",
            "हर मौसम में अलग-अलग खाद्य पदार्थ फायदेमंद हैं। गर्मी में ठंडे और सर्दी में गर्म खाद्य पदार्थ खाएं।",
        ),
        slok: &SEASONAL_SLOK,
        benefits: (
            ["Seasonal wellness", "Better digestion", "Energy"],
            ["मौसमी स्वास्थ्य", "बेहतर पाचन", "ऊर्जा"],
        ),
    },
];

/// A tip rendered in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedTip {
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub slok: &'static str,
    pub benefits: [&'static str; 3],
}

const fn pick<T: Copy>(pair: (T, T), language: Language) -> T {
    match language {
        Language::En => pair.0,
        Language::Hi => pair.1,
    }
}

/// Tips in `language`, limited to `category` unless it is empty or `all`.
#[must_use]
pub fn tips(language: Language, category: Option<&str>) -> Vec<LocalizedTip> {
    let category = category.map(str::trim).filter(|c| !c.is_empty() && *c != "all");

    TIPS.iter()
        .filter(|tip| category.is_none_or(|c| c == tip.category))
        .map(|tip| LocalizedTip {
            title: pick(tip.title, language),
            description: pick(tip.description, language),
            category: tip.category,
            slok: tip.slok.text(language),
            benefits: pick(tip.benefits, language),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tips() {
        assert_eq!(tips(Language::En, None).len(), 3);
        assert_eq!(tips(Language::En, Some("all")).len(), 3);
        assert_eq!(tips(Language::En, Some("")).len(), 3);
    }

    #[test]
    fn test_filter_by_category() {
        let seasonal = tips(Language::Hi, Some("seasonal"));
        assert_eq!(seasonal.len(), 1);
        assert_eq!(seasonal[0].title, "ऋतु अनुसार आहार");
        assert_eq!(seasonal[0].slok, "॥ ऋतुनुसारं आहारविहारं ॥");

        assert!(tips(Language::En, Some("unknown")).is_empty());
    }

    #[test]
    fn test_english_fields() {
        let dosha = tips(Language::En, Some("dosha"));
        assert_eq!(dosha[0].benefits, ["Dosha balance", "Good health", "Disease-free"]);
        assert_eq!(dosha[0].slok, DOSHA_SLOK.en);
    }
}
