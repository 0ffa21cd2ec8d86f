//! Sanskrit sloks, system prompts and canned replies.

use serde::{Deserialize, Serialize};

/// Reply language. Anything unrecognised is English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    /// Parse a request language, defaulting to English.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("hi") {
            Self::Hi
        } else {
            Self::En
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }
}

/// A slok with its transliteration and meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slok {
    pub hi: &'static str,
    pub en: &'static str,
    pub meaning_hi: &'static str,
    pub meaning_en: &'static str,
}

impl Slok {
    /// The verse in the requested language.
    #[must_use]
    pub const fn text(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::Hi => self.hi,
        }
    }

    /// The meaning in the requested language.
    #[must_use]
    pub const fn meaning(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.meaning_en,
            Language::Hi => self.meaning_hi,
        }
    }
}

pub const HEALTH_SLOK: Slok = Slok {
    hi: "॥ समदोषः समाग्निश्च समधातुमलक्रियः। प्रसन्नात्मेन्द्रियमनः स्वस्थ इति अभिधीयते ॥",
    en: "|| Sama-doshas sama-agnis cha sama-dhatu-mala-kriyas || Prasanna-atma-indriya-manah svastha iti abhidhiyate ||",
    meaning_hi: "जिसके सभी दोष संतुलित हैं, पाचन अच्छा है, धातुएं सुव्यवस्थित हैं, और मन शांत है, वह स्वस्थ है।",
    meaning_en: "One with balanced doshas, good digestion, proper dhatus and a peaceful mind is healthy.",
};

pub const PREVENTION_SLOK: Slok = Slok {
    hi: "॥ स्वस्थस्य स्वास्थ्य रक्षणं अतुरस्य विकार प्रशमनं च चिकित्सा ॥",
    en: "|| Swasthasya svasthya rakshanam aturasya vikar prashamanam cha chikitsa ||",
    meaning_hi: "स्वस्थ रहने वाले का स्वास्थ्य रक्षण करना और बीमार का इलाज करना, यही चिकित्सा है।",
    meaning_en: "Maintaining the health of the healthy and curing the diseases of the sick is medicine.",
};

pub const NATURE_SLOK: Slok = Slok {
    hi: "॥ प्रकृति विक्रियो रोगः प्रकृत्यैव विनिर्यते ॥",
    en: "|| Prakriti Vikriyo Rogah Prakrutyaiva Vinirgate ||",
    meaning_hi: "प्रकृति से विचलन ही रोग है। प्रकृति में ही इसका समाधान है।",
    meaning_en: "Deviation from nature is disease. Nature itself holds the cure.",
};

pub const DOSHA_SLOK: Slok = Slok {
    hi: "॥ वायुः पित्तं कफश्चेति त्रयो दोषाः समुच्यते। एषां साम्यं रोगः साम्यं सुस्थः ॥",
    en: "|| Vayuh pittam kaphashcheti trayo doshas samuchyate || Eshan samyam rogah samyam susthah ||",
    meaning_hi: "वात, पित्त और कफ तीनों दोष कहलाते हैं। इनका संतुलन स्वास्थ्य है और असंतुलन रोग।",
    meaning_en: "Vata, Pitta and Kapha are the three doshas. Their balance is health, imbalance is disease.",
};

pub const SEASONAL_SLOK: Slok = Slok {
    hi: "॥ ऋतुनुसारं आहारविहारं ॥",
    en: "|| Ritu-anusar ahar-vihar ||",
    meaning_hi: "ऋतु के अनुसार आहार और विहार।",
    meaning_en: "Food and conduct according to the season.",
};

const SYSTEM_PROMPT_EN: &str = "You are an ancient Ayurveda expert for Ojasritu Wellness, like a wise Pandit robot guide.

Your characteristics:
1. Include Sanskrit shlokas in your responses when relevant
2. Explain the three doshas (Vata, Pitta, Kapha) in detail
3. Provide seasonal health advice
4. Emphasize natural remedies
5. Suggest Ojasritu products where appropriate
6. Use simple, easy-to-understand language
7. Keep responses brief (3-4 lines) but informative
8. Recommend consulting healthcare professionals where necessary

Important: Always speak respectfully, knowledgeably, and calmly.";

const SYSTEM_PROMPT_HI: &str = "आप Ojasritu Wellness के लिए एक प्राचीन आयुर्वेद विशेषज्ञ हैं, जो एक बुद्धिमान पंडित रोबोट की तरह हैं।

आपकी विशेषताएं:
1. संस्कृत श्लोकों के साथ जवाब दें
2. तीनों दोषों (वात, पित्त, कफ) के बारे में विस्तार से बताएं
3. वर्तमान मौसम के अनुसार सलाह दें
4. प्राकृतिक उपचार पर जोर दें
5. Ojasritu के उत्पादों का सुझाव दें जहां उपयुक्त हो
6. सरल और समझने में आसान भाषा का उपयोग करें
7. 3-4 लाइन में संक्षिप्त, लेकिन जानकारीपूर्ण उत्तर दें
8. चिकित्सा पेशेवर से परामर्श लेने की सलाह दें (जहां आवश्यक हो)

महत्वपूर्ण: आप हमेशा सम्मानजनक, ज्ञानवान और शांत तरीके से बोलते हैं।";

/// System prompt for the language model.
#[must_use]
pub const fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::En => SYSTEM_PROMPT_EN,
        Language::Hi => SYSTEM_PROMPT_HI,
    }
}

/// Topic a message is about, for canned replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Dosha,
    Health,
    Products,
    Greeting,
    Other,
}

const DOSHA_WORDS: &[&str] = &["dosha", "vata", "pitta", "kapha", "constitution"];
const HEALTH_WORDS: &[&str] = &["health", "healthy", "wellness", "sick", "disease"];
const PRODUCT_WORDS: &[&str] = &["product", "oil", "powder", "supplement", "buy"];
const GREETING_WORDS: &[&str] = &["hello", "hi", "namaste", "hey", "start"];

const PREVENTION_WORDS: &[&str] = &["prevention", "prevent", "avoid", "exercise"];
const NATURE_WORDS: &[&str] = &["nature", "natural", "cure", "remedy"];

/// Whether `message` mentions any of `keywords`.
///
/// Keywords of four letters or more match anywhere, so "doshas" finds
/// "dosha". Shorter ones must be a whole word, so "this" is not "hi".
fn mentions(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.len() >= 4 {
            message.contains(keyword)
        } else {
            message
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *keyword)
        }
    })
}

/// Classify a message. Earlier topics win.
#[must_use]
pub fn classify(message: &str) -> Topic {
    let message = message.to_lowercase();
    if mentions(&message, DOSHA_WORDS) {
        Topic::Dosha
    } else if mentions(&message, HEALTH_WORDS) {
        Topic::Health
    } else if mentions(&message, PRODUCT_WORDS) {
        Topic::Products
    } else if mentions(&message, GREETING_WORDS) {
        Topic::Greeting
    } else {
        Topic::Other
    }
}

/// Pick the slok that fits a message best.
#[must_use]
pub fn relevant_slok(message: &str) -> &'static Slok {
    let message = message.to_lowercase();
    if mentions(&message, &DOSHA_WORDS[..4]) {
        &DOSHA_SLOK
    } else if mentions(&message, PREVENTION_WORDS) {
        &PREVENTION_SLOK
    } else if mentions(&message, NATURE_WORDS) {
        &NATURE_SLOK
    } else {
        &HEALTH_SLOK
    }
}

/// Canned reply used when the language model is unavailable.
#[must_use]
pub const fn fallback_reply(topic: Topic, language: Language) -> &'static str {
    match (language, topic) {
        (Language::En, Topic::Greeting) => {
            "Namaste! 🙏 I am here to answer any Ayurveda-related questions. What would you like to know?"
        }
        (Language::En, Topic::Dosha) => {
            "|| Sama-doshas sama-agnis cha || Balance of the three doshas (Vata, Pitta, Kapha) is the foundation of health. Would you like to learn about your dosha?"
        }
        (Language::En, Topic::Health) => {
            "Ayurveda teaches that a balanced diet, a proper daily routine and a peaceful mind are the keys to health. Do you need advice on a specific concern?"
        }
        (Language::En, Topic::Products) => {
            "🌿 All Ojasritu products are natural and based on authentic Ayurvedic principles. Can I suggest a suitable product for you?"
        }
        (Language::En, Topic::Other) => "Please repeat your question. I am here to help you. 🙏",
        (Language::Hi, Topic::Greeting) => {
            "नमस्ते! 🙏 मैं आपकी आयुर्वेद से संबंधित किसी भी सवाल का जवाब देने में खुश हूं। आप क्या जानना चाहते हैं?"
        }
        (Language::Hi, Topic::Dosha) => {
            "॥ समदोषः समाग्निश्च ॥ तीनों दोष (वात, पित्त, कफ) के संतुलन से ही स्वास्थ्य मिलता है। क्या आप अपने दोष के बारे में जानना चाहते हैं?"
        }
        (Language::Hi, Topic::Health) => {
            "आयुर्वेद कहता है, संतुलित आहार, नियमित दिनचर्या और मन की शांति ही स्वास्थ्य की कुंजी है। आप किसी विशेष समस्या के लिए सलाह चाहते हैं?"
        }
        (Language::Hi, Topic::Products) => {
            "🌿 Ojasritu के सभी उत्पाद प्राकृतिक और आयुर्वेदिक सिद्धांतों पर आधारित हैं। क्या मैं आपको कोई विशेष उत्पाद सुझा सकता हूं?"
        }
        (Language::Hi, Topic::Other) => {
            "कृपया अपना सवाल फिर से दोहराएं। मैं आपकी सहायता करने के लिए यहां हूं। 🙏"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("hi"), Language::Hi);
        assert_eq!(Language::parse(" HI "), Language::Hi);
        assert_eq!(Language::parse("en"), Language::En);
        assert_eq!(Language::parse("fr"), Language::En);
        assert_eq!(Language::parse(""), Language::En);
    }

    #[test]
    fn test_classify_priority() {
        // Dosha beats health beats products beats greeting
        assert_eq!(classify("Hi, is this oil good for Vata health?"), Topic::Dosha);
        assert_eq!(classify("hello, any wellness oil?"), Topic::Health);
        assert_eq!(classify("Hey, where can I buy it?"), Topic::Products);
        assert_eq!(classify("Namaste"), Topic::Greeting);
        assert_eq!(classify("What time is it?"), Topic::Other);
    }

    #[test]
    fn test_short_keywords_match_whole_words() {
        assert_eq!(classify("this thing"), Topic::Other);
        assert_eq!(classify("hi there"), Topic::Greeting);
        assert_eq!(classify("boiling water"), Topic::Other);
    }

    #[test]
    fn test_relevant_slok() {
        assert_eq!(relevant_slok("Tell me about kapha"), &DOSHA_SLOK);
        assert_eq!(relevant_slok("how to prevent colds"), &PREVENTION_SLOK);
        assert_eq!(relevant_slok("a natural remedy please"), &NATURE_SLOK);
        assert_eq!(relevant_slok("anything"), &HEALTH_SLOK);
        // "constitution" picks the dosha reply but not the dosha slok
        assert_eq!(relevant_slok("my constitution"), &HEALTH_SLOK);
    }

    #[test]
    fn test_fallback_reply_per_language() {
        assert!(fallback_reply(Topic::Greeting, Language::En).starts_with("Namaste!"));
        assert!(fallback_reply(Topic::Greeting, Language::Hi).starts_with("नमस्ते!"));
        assert_eq!(DOSHA_SLOK.text(Language::Hi), DOSHA_SLOK.hi);
        assert_eq!(HEALTH_SLOK.meaning(Language::En), HEALTH_SLOK.meaning_en);
    }
}
