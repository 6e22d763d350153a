//! Keyword-based business analysis from a free-text description.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::configurator::Sector;

/// Keyword score that maps to full confidence.
const FULL_CONFIDENCE_SCORE: f64 = 3.0;

fn keywords(sector: Sector) -> &'static [&'static str] {
    match sector {
        Sector::Restaurant => &[
            "restaurant",
            "pizzeria",
            "brasserie",
            "café",
            "bistrot",
            "cuisine",
            "menu",
            "table",
            "réservation",
            "gastronomie",
            "chef",
            "plat",
        ],
        Sector::Salon => &[
            "salon",
            "coiffure",
            "coiffeur",
            "beauté",
            "esthétique",
            "rendez-vous",
            "coupe",
            "coloration",
            "manucure",
        ],
        Sector::Ecommerce => &[
            "boutique",
            "vente",
            "produits",
            "commerce",
            "magasin",
            "e-commerce",
            "commande",
            "livraison",
        ],
        Sector::Artisan => &[
            "plombier",
            "électricien",
            "chauffagiste",
            "dépannage",
            "intervention",
            "réparation",
            "urgence",
            "artisan",
        ],
        Sector::Service => &[
            "conseil",
            "service",
            "accompagnement",
            "formation",
            "consulting",
            "expertise",
            "consultation",
        ],
        Sector::Medical => &[
            "médecin",
            "docteur",
            "cabinet",
            "consultation",
            "santé",
            "patient",
            "rendez-vous médical",
            "praticien",
        ],
    }
}

/// Per-sector assistant defaults recommended after analysis.
#[derive(Debug, Clone, Serialize)]
pub struct SectorTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub config: TemplateConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    pub system_prompt_template: &'static str,
    pub voice_style: &'static str,
    pub suggested_tools: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub first_message_template: &'static str,
    pub tone: &'static str,
    pub capabilities: &'static [&'static str],
}

pub fn template_for(sector: Sector) -> SectorTemplate {
    match sector {
        Sector::Restaurant => SectorTemplate {
            id: "restaurant_fr",
            name: "Restaurant & Restauration",
            config: TemplateConfig {
                system_prompt_template: "conversational_service",
                voice_style: "warm_welcoming",
                suggested_tools: &["make_reservation", "check_availability", "get_menu_info"],
                keywords: &["réservation", "menu", "table", "horaires", "spécialités"],
                first_message_template: "Bonjour et bienvenue chez {business_name} ! Comment puis-je vous aider aujourd'hui ?",
                tone: "chaleureux",
                capabilities: &["reservations", "menu_info", "hours_info", "human_transfer"],
            },
        },
        Sector::Salon => SectorTemplate {
            id: "salon_fr",
            name: "Salon de Coiffure & Beauté",
            config: TemplateConfig {
                system_prompt_template: "appointment_focused",
                voice_style: "professional_friendly",
                suggested_tools: &["book_appointment", "check_availability", "service_info"],
                keywords: &["rendez-vous", "coupe", "coloration", "disponibilité"],
                first_message_template: "Bonjour ! Bienvenue chez {business_name}. Souhaitez-vous prendre rendez-vous ?",
                tone: "professionnel et bienveillant",
                capabilities: &["appointments", "service_info", "availability", "pricing"],
            },
        },
        Sector::Ecommerce => SectorTemplate {
            id: "ecommerce_fr",
            name: "E-commerce & Boutique",
            config: TemplateConfig {
                system_prompt_template: "customer_support",
                voice_style: "professional_helpful",
                suggested_tools: &["track_order", "product_info", "return_process"],
                keywords: &["commande", "livraison", "produit", "retour", "taille"],
                first_message_template: "Bonjour ! Je suis l'assistant de {business_name}. Comment puis-je vous aider ?",
                tone: "serviable et efficace",
                capabilities: &["order_tracking", "product_info", "returns", "support"],
            },
        },
        Sector::Artisan => SectorTemplate {
            id: "artisan_fr",
            name: "Artisan & Dépannage",
            config: TemplateConfig {
                system_prompt_template: "urgent_direct",
                voice_style: "efficient_reassuring",
                suggested_tools: &["emergency_dispatch", "quote_request", "availability_check"],
                keywords: &["urgence", "dépannage", "intervention", "devis"],
                first_message_template: "Bonjour, {business_name} à votre service. Avez-vous une urgence ?",
                tone: "rassurant et efficace",
                capabilities: &["emergency_handling", "scheduling", "quotes", "technical_support"],
            },
        },
        Sector::Service => SectorTemplate {
            id: "service_fr",
            name: "Services & Conseil",
            config: TemplateConfig {
                system_prompt_template: "professional_consultant",
                voice_style: "expert_professional",
                suggested_tools: &["book_consultation", "qualify_need", "transfer_expert"],
                keywords: &["consultation", "expertise", "accompagnement", "conseil"],
                first_message_template: "Bonjour ! Je suis l'assistant de {business_name}. Comment puis-je vous accompagner ?",
                tone: "expert et professionnel",
                capabilities: &["consultations", "lead_qualification", "expert_transfer", "information"],
            },
        },
        Sector::Medical => SectorTemplate {
            id: "medical_fr",
            name: "Cabinet Médical",
            config: TemplateConfig {
                system_prompt_template: "medical_professional",
                voice_style: "calm_professional",
                suggested_tools: &["book_appointment", "emergency_triage", "prescription_info"],
                keywords: &["rendez-vous", "urgence", "consultation", "docteur"],
                first_message_template: "Bonjour, cabinet {business_name}. Souhaitez-vous prendre rendez-vous ?",
                tone: "calme et professionnel",
                capabilities: &["appointments", "emergency_triage", "information", "prescription_support"],
            },
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedInfo {
    pub business_name: String,
    pub location: String,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessAnalysis {
    pub sector: Sector,
    pub size: BusinessSize,
    pub services: Vec<String>,
    pub confidence: f64,
    pub detected_info: DetectedInfo,
    pub recommended_template: SectorTemplate,
}

/// Best-scoring sector and its confidence in `0.0..=1.0`.
///
/// Each keyword found anywhere scores 1; a keyword standing as a whole
/// word (space-delimited or at either end) scores another 0.5.
pub fn detect_sector(description: &str) -> (Sector, f64) {
    let text = description.to_lowercase();
    let mut best = (Sector::Service, 0.0_f64);

    for sector in Sector::ALL {
        let score: f64 = keywords(sector)
            .iter()
            .map(|keyword| {
                let mut score = 0.0;
                if text.contains(keyword) {
                    score += 1.0;
                }
                if text.contains(&format!(" {keyword} "))
                    || text.starts_with(&format!("{keyword} "))
                    || text.ends_with(&format!(" {keyword}"))
                {
                    score += 0.5;
                }
                score
            })
            .sum();
        if score > best.1 {
            best = (sector, score);
        }
    }

    let confidence = (best.1 / FULL_CONFIDENCE_SCORE).min(1.0);
    (best.0, confidence)
}

pub fn detect_size(description: &str) -> BusinessSize {
    const LARGE: &[&str] = &["chaîne", "plusieurs", "franchise", "réseau", "filiales", "groupe"];
    const MEDIUM: &[&str] = &["équipe", "collaborateurs", "succursale", "agence"];

    let text = description.to_lowercase();
    if LARGE.iter().any(|k| text.contains(k)) {
        BusinessSize::Large
    } else if MEDIUM.iter().any(|k| text.contains(k)) {
        BusinessSize::Medium
    } else {
        BusinessSize::Small
    }
}

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:restaurant|chez|salon|boutique|cabinet)\s+([a-zA-ZÀ-ÿ\s]{2,20})",
        r"(?i)([a-zA-ZÀ-ÿ\s]{2,20})\s+(?:restaurant|salon|boutique)",
        r"(?i)je\s+(?:suis|gère|dirige)\s+([a-zA-ZÀ-ÿ\s]{2,20})",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid name pattern"))
    .collect()
});

static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)à\s+([a-zA-ZÀ-ÿ\s]{2,20})",
        r"(?i)sur\s+([a-zA-ZÀ-ÿ\s]{2,20})",
        r"(?i)dans\s+([a-zA-ZÀ-ÿ\s]{2,20})",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid location pattern"))
    .collect()
});

static SERVICE_LIST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:spécialisé|spécialités?)\s+(?:en|dans)\s+([a-zA-ZÀ-ÿ\s,]{5,50})",
        r"(?i)(?:propose|offre|fait)\s+([a-zA-ZÀ-ÿ\s,]{5,50})",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid service pattern"))
    .collect()
});

static SERVICE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)livraison|à emporter|sur place|dépannage|urgence")
        .expect("valid service keyword pattern")
});

fn first_capture(patterns: &[Regex], text: &str) -> String {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

pub fn extract_business_info(description: &str) -> DetectedInfo {
    let mut services: Vec<String> = Vec::new();
    for re in SERVICE_LIST_PATTERNS.iter() {
        if let Some(list) = re.captures(description).and_then(|caps| caps.get(1)) {
            services.extend(list.as_str().split(',').map(|s| s.trim().to_string()));
        }
    }
    services.extend(
        SERVICE_KEYWORDS
            .find_iter(description)
            .map(|m| m.as_str().to_string()),
    );

    let mut unique = Vec::with_capacity(services.len());
    for service in services {
        if service.chars().count() > 2 && !unique.contains(&service) {
            unique.push(service);
        }
    }

    DetectedInfo {
        business_name: first_capture(&NAME_PATTERNS, description),
        location: first_capture(&LOCATION_PATTERNS, description),
        services: unique,
    }
}

pub fn analyze_business(description: &str) -> BusinessAnalysis {
    let (sector, confidence) = detect_sector(description);
    let detected_info = extract_business_info(description);
    BusinessAnalysis {
        sector,
        size: detect_size(description),
        services: detected_info.services.clone(),
        confidence,
        detected_info,
        recommended_template: template_for(sector),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn detects_restaurant_with_full_confidence() {
        let (sector, confidence) =
            detect_sector("Pizzeria familiale, réservation de table et menu du jour");
        assert_eq!(sector, Sector::Restaurant);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn whole_word_hits_score_extra() {
        // No surrounding spaces, so no whole-word bonus.
        let (sector, confidence) = detect_sector("salon");
        assert_eq!(sector, Sector::Salon);
        assert!((confidence - 1.0 / 3.0).abs() < 1e-9);

        let (_, confidence) = detect_sector("un salon moderne");
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_the_earlier_sector() {
        // "consultation" is a keyword of both service and medical.
        let (sector, _) = detect_sector("consultation");
        assert_eq!(sector, Sector::Service);
    }

    #[test]
    fn defaults_to_service_without_hits() {
        assert_eq!(detect_sector("xyz"), (Sector::Service, 0.0));
    }

    #[test]
    fn detects_size_from_indicators() {
        assert_eq!(detect_size("Une chaîne de boulangeries"), BusinessSize::Large);
        assert_eq!(detect_size("Notre équipe de cinq"), BusinessSize::Medium);
        assert_eq!(detect_size("Petit atelier"), BusinessSize::Small);
    }

    #[test]
    fn extracts_name_location_and_services() {
        let info = extract_business_info(
            "Restaurant Chez Marco à Lyon, nous proposons livraison et sur place",
        );
        assert_eq!(info.business_name, "Chez Marco à Lyon");
        assert!(info.location.starts_with("Lyon"));
        assert!(info.services.contains(&"livraison".to_string()));
        assert!(info.services.contains(&"sur place".to_string()));
    }

    #[test]
    fn analysis_recommends_sector_template() {
        let analysis = analyze_business("Cabinet de médecin généraliste, patient sur rendez-vous");
        assert_eq!(analysis.sector, Sector::Medical);
        assert_eq!(analysis.recommended_template.id, "medical_fr");
        let wire = serde_json::to_value(&analysis).unwrap();
        assert_eq!(wire["recommendedTemplate"]["config"]["tone"], "calme et professionnel");
        assert_eq!(wire["sector"], "medical");
    }
}
