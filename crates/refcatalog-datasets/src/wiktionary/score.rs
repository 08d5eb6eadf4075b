use super::KaikkiEntry;

/// Added to every core word's score so it always makes the cut.
pub const CORE_WORD_BONUS: f64 = 1000.0;

/// Richness of one Kaikki line. Higher means more useful to import.
pub fn score_entry(entry: &KaikkiEntry) -> f64 {
    let mut score = 0.0;
    for sense in &entry.senses {
        if !sense.glosses.is_empty() {
            score += 1.0;
        }
        score += 0.5 * sense.translations.iter().filter(|t| t.code == "ru").count() as f64;
        score += 0.3 * sense.examples.len() as f64;
    }
    if entry.sounds.iter().any(|s| !s.ipa.is_empty()) {
        score += 2.0;
    }
    if !entry.word.contains(' ') {
        score += 1.0;
    }
    score
}
