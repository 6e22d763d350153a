//! One-shot assistant creation from configurator answers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::configurator::Sector;
use crate::configurator::analysis::template_for;
use crate::error::VapiError;
use crate::vapi::VapiClient;

const SILENCE_TIMEOUT_SECS: u32 = 30;
const MAX_DURATION_SECS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVoice {
    pub provider: String,
    pub voice_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Template chosen in the configurator. Only `tone`, `capabilities` and
/// `firstMessageTemplate` of `config` are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateChoice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub business_name: String,
    pub sector: String,
    pub selected_voice: SelectedVoice,
    #[serde(default)]
    pub template: Option<TemplateChoice>,
    #[serde(default)]
    pub knowledge_base_ids: Vec<String>,
    #[serde(default)]
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedAssistant {
    pub assistant_id: String,
    pub test_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub configuration: Value,
    pub success: bool,
}

struct ModelConfig {
    provider: &'static str,
    model: &'static str,
    temperature: f64,
    max_tokens: u32,
}

fn model_config(sector: Sector) -> ModelConfig {
    let (model, temperature, max_tokens) = match sector {
        Sector::Restaurant | Sector::Salon => ("gpt-4o", 0.7, 1000),
        Sector::Ecommerce => ("gpt-4o", 0.5, 1200),
        Sector::Artisan => ("gpt-4o-mini", 0.3, 800),
        Sector::Service => ("gpt-4o", 0.6, 1200),
        Sector::Medical => ("gpt-4o", 0.4, 1000),
    };
    ModelConfig {
        provider: "openai",
        model,
        temperature,
        max_tokens,
    }
}

/// Sector-specific wording of the generated system prompt.
struct PromptProfile {
    /// `{name}` and `{tone}` are substituted.
    intro: &'static str,
    section: &'static str,
    services_label: &'static str,
    default_services: &'static str,
    abilities: [&'static str; 4],
    tone_suffix: &'static str,
    instructions: [&'static str; 3],
}

fn prompt_profile(sector: Sector) -> PromptProfile {
    match sector {
        Sector::Restaurant => PromptProfile {
            intro: "Tu es l'assistant vocal de {name}, un restaurant {tone}.",
            section: "INFORMATIONS SUR LE RESTAURANT",
            services_label: "Services disponibles",
            default_services: "réservations, informations menu",
            abilities: [
                "Réserver une table",
                "Fournir des informations sur le menu et les spécialités",
                "Indiquer les horaires d'ouverture",
                "Transférer vers un humain si nécessaire",
            ],
            tone_suffix: "et professionnel",
            instructions: [
                "Mets en valeur les spécialités de la maison",
                "Guide les clients vers une réservation",
                "Reste dans ton rôle d'assistant restaurant",
            ],
        },
        Sector::Salon => PromptProfile {
            intro: "Tu es l'assistant vocal de {name}, un salon de coiffure/beauté {tone}.",
            section: "INFORMATIONS SUR LE SALON",
            services_label: "Services",
            default_services: "rendez-vous, informations services",
            abilities: [
                "Prendre des rendez-vous",
                "Informer sur les services et tarifs",
                "Vérifier les disponibilités",
                "Orienter vers l'équipe appropriée",
            ],
            tone_suffix: "et attentionné",
            instructions: [
                "Pose les bonnes questions pour qualifier le besoin",
                "Propose des créneaux adaptés",
                "Reste dans ton rôle d'assistant salon",
            ],
        },
        Sector::Ecommerce => PromptProfile {
            intro: "Tu es l'assistant client de {name}, une boutique {tone}.",
            section: "INFORMATIONS SUR LA BOUTIQUE",
            services_label: "Services",
            default_services: "commandes, livraisons, support",
            abilities: [
                "Aider avec les questions produits",
                "Suivre les commandes et livraisons",
                "Gérer les retours et réclamations",
                "Orienter vers le bon service",
            ],
            tone_suffix: "et patient",
            instructions: [
                "Fournis des informations précises",
                "Résous les problèmes rapidement",
                "Reste dans ton rôle d'assistant boutique",
            ],
        },
        Sector::Artisan => PromptProfile {
            intro: "Tu es l'assistant de {name}, une entreprise {tone}.",
            section: "INFORMATIONS SUR L'ENTREPRISE",
            services_label: "Services",
            default_services: "dépannages, interventions, devis",
            abilities: [
                "Traiter les urgences en priorité",
                "Planifier les interventions",
                "Fournir des devis",
                "Transférer les cas complexes",
            ],
            tone_suffix: "et réactif",
            instructions: [
                "Identifie rapidement les urgences",
                "Rassure les clients en détresse",
                "Reste dans ton rôle d'assistant artisan",
            ],
        },
        Sector::Service => PromptProfile {
            intro: "Tu es l'assistant de {name}, une entreprise de services {tone}.",
            section: "INFORMATIONS SUR L'ENTREPRISE",
            services_label: "Services",
            default_services: "consultations, accompagnement",
            abilities: [
                "Qualifier les demandes clients",
                "Prendre des rendez-vous de consultation",
                "Expliquer les services proposés",
                "Rediriger vers l'expert approprié",
            ],
            tone_suffix: "et rassurant",
            instructions: [
                "Pose des questions pertinentes",
                "Utilise un vocabulaire professionnel adapté",
                "Reste dans ton rôle d'assistant conseil",
            ],
        },
        Sector::Medical => PromptProfile {
            intro: "Tu es l'assistant du cabinet médical {name}, {tone}.",
            section: "INFORMATIONS SUR LE CABINET",
            services_label: "Services",
            default_services: "rendez-vous, urgences, informations",
            abilities: [
                "Prendre des rendez-vous médicaux",
                "Évaluer les urgences",
                "Fournir des informations pratiques",
                "Rassurer les patients",
            ],
            tone_suffix: "et empathique",
            instructions: [
                "Respecte la confidentialité médicale",
                "Priorise les urgences",
                "Reste dans ton rôle d'assistant médical",
            ],
        },
    }
}

impl AssistantRequest {
    pub fn sector(&self) -> Sector {
        Sector::parse_or_default(&self.sector)
    }

    fn template_str(&self, key: &str) -> Option<&str> {
        self.template
            .as_ref()?
            .config
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn tone(&self) -> String {
        self.template_str("tone")
            .unwrap_or(template_for(self.sector()).config.tone)
            .to_string()
    }

    fn capabilities(&self) -> Option<String> {
        let items: Vec<&str> = match &self.template {
            Some(choice) => choice
                .config
                .get("capabilities")?
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .collect(),
            None => template_for(self.sector()).config.capabilities.to_vec(),
        };
        (!items.is_empty()).then(|| items.join(", "))
    }

    pub fn system_prompt(&self) -> String {
        let profile = prompt_profile(self.sector());
        let name = self.business_name.trim();
        let tone = self.tone();
        let services = self
            .capabilities()
            .unwrap_or_else(|| profile.default_services.to_string());

        let mut prompt = profile.intro.replace("{name}", name).replace("{tone}", &tone);
        prompt.push_str(&format!(
            "\n\n{}:\n- Nom: {name}\n- Style: {tone}\n- {}: {services}\n\nCAPACITÉS PRINCIPALES:\n",
            profile.section, profile.services_label
        ));
        for ability in profile.abilities {
            prompt.push_str(&format!("- {ability}\n"));
        }
        prompt.push_str(&format!("\nINSTRUCTIONS:\n- Sois {tone} {}", profile.tone_suffix));
        for instruction in profile.instructions {
            prompt.push_str(&format!("\n- {instruction}"));
        }

        if let Some(extra) = self
            .custom_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            prompt.push_str(&format!("\n\nINSTRUCTIONS SUPPLÉMENTAIRES:\n{extra}"));
        }
        prompt
    }

    pub fn first_message(&self) -> String {
        let name = self.business_name.trim();
        let template = match &self.template {
            Some(_) => self.template_str("firstMessageTemplate"),
            None => Some(template_for(self.sector()).config.first_message_template),
        };
        match template {
            Some(template) => template.replacen("{business_name}", name, 1),
            None => format!(
                "Bonjour ! Je suis l'assistant vocal de {name}. Comment puis-je vous aider aujourd'hui ?"
            ),
        }
    }

    /// Body for Vapi's `POST /assistant`.
    pub fn vapi_payload(&self) -> Value {
        let name = self.business_name.trim();
        let model = model_config(self.sector());
        let mut payload = json!({
            "name": format!("{name} - Assistant"),
            "model": {
                "provider": model.provider,
                "model": model.model,
                "systemMessage": self.system_prompt(),
                "temperature": model.temperature,
                "maxTokens": model.max_tokens,
            },
            "voice": {
                "provider": self.selected_voice.provider,
                "voiceId": self.selected_voice.voice_id,
            },
            "firstMessage": self.first_message(),
            "transcriber": {
                "provider": "deepgram",
                "model": "nova-2",
                "language": "fr",
            },
            "endCallMessage": format!("Merci d'avoir contacté {name}. À très bientôt !"),
            "silenceTimeoutSeconds": SILENCE_TIMEOUT_SECS,
            "maxDurationSeconds": MAX_DURATION_SECS,
            "backgroundDenoisingEnabled": true,
        });
        if let Some(kb) = self.knowledge_base_ids.first() {
            payload["knowledgeBase"] = json!({ "provider": "vapi", "knowledgeBaseId": kb });
        }
        if let Some(user_id) = &self.user_id {
            payload["metadata"] = json!({ "user_id": user_id, "created_via": "configurator" });
        }
        payload
    }
}

pub async fn create_complete_assistant(
    vapi: &VapiClient,
    request: &AssistantRequest,
) -> Result<CreatedAssistant, VapiError> {
    let assistant = vapi.create_assistant(&request.vapi_payload()).await?;
    let assistant_id = assistant
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| VapiError::InvalidResponse {
            endpoint: "assistant".to_string(),
            reason: "created assistant has no id".to_string(),
        })?
        .to_string();
    let phone_number = assistant
        .get("phoneNumber")
        .and_then(Value::as_str)
        .map(str::to_string);

    tracing::info!(
        assistant_id = %assistant_id,
        sector = %request.sector(),
        "Configurator assistant created"
    );

    Ok(CreatedAssistant {
        test_url: format!("https://dashboard.vapi.ai/assistant/{assistant_id}/test"),
        assistant_id,
        phone_number,
        configuration: json!({
            "business_name": request.business_name,
            "sector": request.sector,
            "voice": request.selected_voice,
            "vapi_config": assistant,
        }),
        success: true,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn request() -> AssistantRequest {
        serde_json::from_value(json!({
            "businessName": "Chez Marco",
            "sector": "restaurant",
            "selectedVoice": { "provider": "azure", "voiceId": "fr-FR-DeniseNeural", "name": "Denise" },
            "knowledgeBaseIds": ["kb_1", "kb_2"]
        }))
        .unwrap()
    }

    #[test]
    fn payload_uses_sector_model_and_fixed_call_settings() {
        let payload = request().vapi_payload();
        assert_eq!(payload["name"], "Chez Marco - Assistant");
        assert_eq!(payload["model"]["model"], "gpt-4o");
        assert_eq!(payload["model"]["maxTokens"], 1000);
        assert_eq!(payload["voice"]["voiceId"], "fr-FR-DeniseNeural");
        assert_eq!(payload["transcriber"]["model"], "nova-2");
        assert_eq!(payload["silenceTimeoutSeconds"], 30);
        assert_eq!(payload["maxDurationSeconds"], 1200);
        assert_eq!(payload["knowledgeBase"]["knowledgeBaseId"], "kb_1");
        assert_eq!(
            payload["firstMessage"],
            "Bonjour et bienvenue chez Chez Marco ! Comment puis-je vous aider aujourd'hui ?"
        );
    }

    #[test]
    fn prompt_reflects_template_and_custom_instructions() {
        let mut req = request();
        req.template = Some(
            serde_json::from_value(json!({
                "id": "custom",
                "config": { "tone": "décontracté", "capabilities": ["reservations", "takeaway"] }
            }))
            .unwrap(),
        );
        req.custom_instructions = Some("Parle du plat du jour.".to_string());

        let prompt = req.system_prompt();
        assert!(prompt.starts_with("Tu es l'assistant vocal de Chez Marco, un restaurant décontracté."));
        assert!(prompt.contains("- Services disponibles: reservations, takeaway"));
        assert!(prompt.contains("- Sois décontracté et professionnel"));
        assert!(prompt.ends_with("INSTRUCTIONS SUPPLÉMENTAIRES:\nParle du plat du jour."));

        // The chosen template has no first message, so the generic one is used.
        assert_eq!(
            req.first_message(),
            "Bonjour ! Je suis l'assistant vocal de Chez Marco. Comment puis-je vous aider aujourd'hui ?"
        );
    }

    #[test]
    fn unknown_sector_uses_service_profile() {
        let mut req = request();
        req.sector = "boulangerie".to_string();
        assert!(req.system_prompt().contains("une entreprise de services"));
        assert_eq!(req.vapi_payload()["model"]["temperature"], 0.6);
    }
}
