//! Per-sector voice catalog and recommendations.

use serde::Serialize;

use crate::configurator::Sector;

/// How many voices are offered besides the primary one.
const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub voice_id: &'static str,
    pub style: &'static str,
    pub reason: &'static str,
    pub language: &'static str,
}

const fn voice(
    id: &'static str,
    name: &'static str,
    provider: &'static str,
    voice_id: &'static str,
    style: &'static str,
    reason: &'static str,
    language: &'static str,
) -> Voice {
    Voice {
        id,
        name,
        provider,
        voice_id,
        style,
        reason,
        language,
    }
}

static RESTAURANT: [Voice; 3] = [
    voice("azure_denise", "Denise - Chaleureuse", "azure", "fr-FR-DeniseNeural", "Accueillante et conviviale", "Voix française naturelle, idéale pour restaurants", "fr-FR"),
    voice("elevenlabs_sarah", "Sarah - Élégante", "elevenlabs", "shimmer", "Élégante et raffinée", "Qualité premium pour expérience haut de gamme", "fr"),
    voice("openai_alloy", "Alloy - Amicale", "openai", "alloy", "Décontractée et sympathique", "Équilibre qualité/coût optimal", "fr"),
];

static SALON: [Voice; 3] = [
    voice("elevenlabs_professional", "Emma - Professionnelle", "elevenlabs", "shimmer", "Professionnelle et bienveillante", "Parfaite pour secteur beauté et bien-être", "fr"),
    voice("azure_professional", "Julie - Experte", "azure", "fr-FR-DeniseNeural", "Experte et rassurante", "Voix claire pour prises de rendez-vous", "fr-FR"),
    voice("openai_nova", "Nova - Moderne", "openai", "nova", "Moderne et dynamique", "Ton jeune adapté aux salons tendance", "fr"),
];

static ECOMMERCE: [Voice; 3] = [
    voice("openai_alloy_support", "Alloy - Support", "openai", "alloy", "Patiente et informatrice", "Idéale pour service client e-commerce", "fr"),
    voice("azure_helpful", "Alice - Serviable", "azure", "fr-FR-DeniseNeural", "Dynamique et précise", "Efficace pour informations produits", "fr-FR"),
    voice("deepgram_efficient", "Aura - Efficace", "deepgram", "aura", "Rapide et claire", "Optimisée pour latence faible", "fr"),
];

static ARTISAN: [Voice; 3] = [
    voice("openai_echo", "Echo - Rassurant", "openai", "echo", "Calme et rassurant", "Parfait pour urgences et dépannages", "fr"),
    voice("azure_technical", "Marc - Technique", "azure", "fr-FR-HenriNeural", "Technique et direct", "Voix masculine pour secteur technique", "fr-FR"),
    voice("deepgram_fast", "Aura - Rapide", "deepgram", "aura", "Très rapide", "Réponse immédiate pour urgences", "fr"),
];

static SERVICE: [Voice; 3] = [
    voice("elevenlabs_expert", "Marie - Experte", "elevenlabs", "shimmer", "Compétente et rassurante", "Crédibilité pour services de conseil", "fr"),
    voice("azure_consultant", "Sophie - Conseillère", "azure", "fr-FR-DeniseNeural", "Bienveillante et sage", "Ton professionnel pour consultations", "fr-FR"),
    voice("openai_professional", "Alloy - Corporate", "openai", "alloy", "Formelle et fiable", "Standard professionnel polyvalent", "fr"),
];

static MEDICAL: [Voice; 3] = [
    voice("azure_medical", "Claire - Médicale", "azure", "fr-FR-DeniseNeural", "Calme et professionnelle", "Adaptée au secteur médical", "fr-FR"),
    voice("openai_calm", "Nova - Apaisante", "openai", "nova", "Douce et rassurante", "Idéale pour patients anxieux", "fr"),
    voice("elevenlabs_medical", "Dr. Emma - Experte", "elevenlabs", "shimmer", "Experte et bienveillante", "Crédibilité médicale premium", "fr"),
];

pub fn catalog(sector: Sector) -> &'static [Voice] {
    match sector {
        Sector::Restaurant => &RESTAURANT,
        Sector::Salon => &SALON,
        Sector::Ecommerce => &ECOMMERCE,
        Sector::Artisan => &ARTISAN,
        Sector::Service => &SERVICE,
        Sector::Medical => &MEDICAL,
    }
}

/// Greeting used to audition a voice.
pub fn sample_text(sector: Sector, business_name: Option<&str>) -> String {
    let name = business_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("votre entreprise");
    match sector {
        Sector::Restaurant => format!(
            "Bonjour et bienvenue chez {name} ! Avez-vous une réservation ou souhaitez-vous découvrir nos spécialités du jour ?"
        ),
        Sector::Salon => format!(
            "Bonjour ! Bienvenue au salon {name}. Avez-vous rendez-vous ou souhaitez-vous prendre un créneau pour une coupe ou une coloration ?"
        ),
        Sector::Ecommerce => format!(
            "Bonjour ! Je suis l'assistante de {name}. Je peux vous aider avec vos commandes, le suivi de livraison ou nos produits."
        ),
        Sector::Artisan => format!(
            "Bonjour, ici {name}. Avez-vous une urgence de plomberie, électricité ou chauffage ? Je vous mets en relation rapidement."
        ),
        Sector::Service => format!(
            "Bonjour ! Je suis l'assistante de {name}. Comment puis-je vous accompagner dans votre projet de consultation ?"
        ),
        Sector::Medical => format!(
            "Bonjour, cabinet médical {name}. Souhaitez-vous prendre rendez-vous ou avez-vous une urgence ?"
        ),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceRecommendation {
    #[serde(flatten)]
    pub voice: Voice,
    pub sample_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceRecommendations {
    pub primary: VoiceRecommendation,
    pub alternatives: Vec<VoiceRecommendation>,
    pub sector_optimized: bool,
}

impl VoiceRecommendations {
    pub fn total(&self) -> usize {
        1 + self.alternatives.len()
    }
}

/// Primary voice plus up to two alternatives for `sector`, preferring
/// voices whose language starts with `language`.
pub fn recommend_voices(
    sector: Sector,
    language: &str,
    business_name: Option<&str>,
) -> VoiceRecommendations {
    let voices = catalog(sector);
    let matching: Vec<Voice> = voices
        .iter()
        .filter(|v| v.language.starts_with(language))
        .copied()
        .collect();
    let available = if matching.is_empty() {
        voices.to_vec()
    } else {
        matching
    };

    let sample = sample_text(sector, business_name);
    let mut recommended = available.into_iter().map(|voice| VoiceRecommendation {
        voice,
        sample_text: sample.clone(),
    });
    // Every catalog entry holds three voices.
    let primary = recommended.next().unwrap_or_else(|| VoiceRecommendation {
        voice: voices[0],
        sample_text: sample.clone(),
    });

    VoiceRecommendations {
        primary,
        alternatives: recommended.take(MAX_ALTERNATIVES).collect(),
        sector_optimized: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommends_primary_and_two_alternatives() {
        let recs = recommend_voices(Sector::Restaurant, "fr", Some("Chez Marco"));
        assert_eq!(recs.primary.voice.id, "azure_denise");
        assert_eq!(recs.alternatives.len(), 2);
        assert_eq!(recs.total(), 3);
        assert!(recs.primary.sample_text.contains("Chez Marco"));
    }

    #[test]
    fn language_filter_narrows_by_prefix() {
        let recs = recommend_voices(Sector::Salon, "fr-FR", None);
        assert_eq!(recs.primary.voice.id, "azure_professional");
        assert!(recs.alternatives.is_empty());
        assert!(recs.primary.sample_text.contains("votre entreprise"));
    }

    #[test]
    fn unknown_language_falls_back_to_whole_sector() {
        let recs = recommend_voices(Sector::Medical, "en", None);
        assert_eq!(recs.primary.voice.id, "azure_medical");
        assert_eq!(recs.alternatives.len(), 2);
    }

    #[test]
    fn voice_fields_are_flattened_on_the_wire() {
        let recs = recommend_voices(Sector::Artisan, "fr", None);
        let wire = serde_json::to_value(&recs).unwrap();
        assert_eq!(wire["primary"]["voiceId"], "echo");
        assert_eq!(wire["primary"]["language"], "fr");
        assert!(wire["primary"]["sample_text"].is_string());
    }
}
