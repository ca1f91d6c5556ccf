/// Keywords that trigger the projection when found in recognized text.
pub const TARGET_KEYWORDS: [&str; 6] = [
    "immigrants",
    "immigrant",
    "immigration",
    "migrant",
    "migrants",
    "diaspora",
];

/// ASCII-lowercase the text and collapse whitespace runs (spaces, tabs,
/// newlines) to single spaces. OCR output is ASCII by construction, so no
/// Unicode case folding.
pub fn normalize_text(text: &str) -> String {
    text.to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when the normalized text contains any target keyword. Which keyword
/// matched is irrelevant, only the boolean trigger is used downstream.
pub fn matches_keyword(text: &str) -> bool {
    let clean = normalize_text(text);
    TARGET_KEYWORDS.iter().any(|keyword| clean.contains(keyword))
}
