//! Canned "AI" behaviour: document extraction templates, confidence
//! scores, workflow suggestions, chat replies and ticket triage.
//!
//! Nothing here calls a model. Outputs are fixed templates selected by
//! keyword matching, plus bounded randomness where a confidence is needed.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::TicketPriority;

pub const DEFAULT_CHAT_MODEL: &str = "GPT-4";
pub const DEFAULT_CHAT_REPLY: &str =
    "Je comprends votre demande. Laissez-moi vous aider avec cela.";

const WORKFLOW_REQUEST_KEYWORDS: [&str; 3] = ["workflow", "créer", "automatiser"];

/// Document families the extractor has a template for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Contract,
    Report,
}

impl DocumentKind {
    /// Resolves the kind from the declared type, falling back to hints in the
    /// file name (uploads carry a MIME type rather than a business type).
    pub fn detect(doc_type: &str, file_name: &str) -> Option<Self> {
        match doc_type.to_lowercase().as_str() {
            "invoice" => return Some(Self::Invoice),
            "contract" => return Some(Self::Contract),
            "report" => return Some(Self::Report),
            _ => {}
        }

        let name = file_name.to_lowercase();
        if name.contains("facture") || name.contains("invoice") {
            Some(Self::Invoice)
        } else if name.contains("contrat") || name.contains("contract") {
            Some(Self::Contract)
        } else if name.contains("rapport") || name.contains("report") {
            Some(Self::Report)
        } else {
            None
        }
    }
}

/// Returns the extraction template for a document. Unknown kinds yield `{}`.
pub fn analyze_document(doc_type: &str, file_name: &str, today: NaiveDate) -> Value {
    let date = today.format("%Y-%m-%d").to_string();
    match DocumentKind::detect(doc_type, file_name) {
        Some(DocumentKind::Invoice) => json!({
            "amount": 1250.00,
            "currency": "EUR",
            "date": date,
            "vendor": "Mock Vendor",
            "items": ["Service A", "Product B"],
        }),
        Some(DocumentKind::Contract) => json!({
            "parties": ["Party A", "Party B"],
            "duration": "12 months",
            "value": 50000.00,
            "start_date": date,
        }),
        Some(DocumentKind::Report) => json!({
            "pages": 15,
            "sections": ["Executive Summary", "Analysis", "Recommendations"],
            "tables": 3,
            "charts": 2,
        }),
        None => json!({}),
    }
}

/// Extraction confidence drawn from [0.85, 0.98], rounded to 2 decimals.
pub fn confidence_score(rng: &mut impl Rng) -> f64 {
    let raw: f64 = rng.gen_range(0.85..=0.98);
    (raw * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSuggestion {
    pub name: &'static str,
    pub steps: Vec<&'static str>,
    pub ai_model: &'static str,
    /// Minutes.
    pub estimated_time: u32,
}

/// True when a chat message asks for a workflow to be built.
pub fn is_workflow_request(message: &str) -> bool {
    let message = message.to_lowercase();
    WORKFLOW_REQUEST_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

/// Picks a workflow template by keyword: email, cv, facture (first match wins).
/// Defaults to the email template.
pub fn suggest_workflow(user_input: &str) -> WorkflowSuggestion {
    let input = user_input.to_lowercase();

    if input.contains("email") {
        email_workflow()
    } else if input.contains("cv") {
        WorkflowSuggestion {
            name: "Analyse CV automatique",
            steps: vec![
                "Réception CV par email",
                "Extraction texte OCR",
                "Analyse compétences IA",
                "Scoring automatique",
                "Notification RH",
            ],
            ai_model: "Claude",
            estimated_time: 25,
        }
    } else if input.contains("facture") {
        WorkflowSuggestion {
            name: "Traitement factures automatique",
            steps: vec![
                "Upload facture",
                "Extraction données OCR",
                "Validation montants",
                "Intégration comptabilité",
            ],
            ai_model: "GPT-4",
            estimated_time: 15,
        }
    } else {
        email_workflow()
    }
}

fn email_workflow() -> WorkflowSuggestion {
    WorkflowSuggestion {
        name: "Analyse d'emails automatique",
        steps: vec![
            "Connexion à votre boîte email",
            "Classification des emails",
            "Extraction des informations",
            "Génération de réponses",
        ],
        ai_model: "GPT-4",
        estimated_time: 20,
    }
}

/// `[<model>] <response>`.
pub fn format_ai_response(response: &str, model: &str) -> String {
    format!("[{}] {}", model, response)
}

/// Canned analysis attached to a new support ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketTriage {
    pub sentiment: &'static str,
    pub summary: String,
    pub suggested_actions: Vec<String>,
    pub priority: TicketPriority,
}

const NEGATIVE_WORDS: [&str; 8] = [
    "problème", "erreur", "bug", "bloqué", "panne", "impossible", "mécontent", "remboursement",
];
const POSITIVE_WORDS: [&str; 5] = ["merci", "super", "parfait", "excellent", "bravo"];
const URGENT_WORDS: [&str; 2] = ["urgent", "critique"];
const HIGH_PRIORITY_WORDS: [&str; 3] = ["bloqué", "panne", "impossible"];

/// Keyword-based sentiment and priority for a ticket.
pub fn triage_ticket(subject: &str, description: Option<&str>) -> TicketTriage {
    let text = format!("{} {}", subject, description.unwrap_or_default()).to_lowercase();
    let mentions = |words: &[&str]| words.iter().filter(|w| text.contains(*w)).count();

    let negative = mentions(&NEGATIVE_WORDS[..]);
    let positive = mentions(&POSITIVE_WORDS[..]);
    let sentiment = if negative > positive {
        "negative"
    } else if positive > negative {
        "positive"
    } else {
        "neutral"
    };

    let priority = if mentions(&URGENT_WORDS[..]) > 0 {
        TicketPriority::Urgent
    } else if mentions(&HIGH_PRIORITY_WORDS[..]) > 0 {
        TicketPriority::High
    } else {
        TicketPriority::Medium
    };

    let mut suggested_actions = vec![
        "Analyser le problème".to_string(),
        "Contacter le support".to_string(),
    ];
    if sentiment == "negative" || priority == TicketPriority::Urgent {
        suggested_actions.push("Escalader vers un agent senior".to_string());
    }

    TicketTriage {
        sentiment,
        summary: "Ticket créé automatiquement".to_string(),
        suggested_actions,
        priority,
    }
}

/// Forecast block shown on the dashboard.
pub fn dashboard_predictions() -> Value {
    json!({
        "next_month_executions": 1850,
        "predicted_roi": 340,
        "churn_risk": 15,
        "growth_rate": 28,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn invoice_template_uses_today() {
        let data = analyze_document("invoice", "anything.pdf", today());
        assert_eq!(data["amount"], json!(1250.0));
        assert_eq!(data["currency"], "EUR");
        assert_eq!(data["date"], "2024-07-01");
    }

    #[test]
    fn mime_typed_uploads_fall_back_to_file_name() {
        let data = analyze_document("application/pdf", "Contrat_Prestation_2024.pdf", today());
        assert_eq!(data["duration"], "12 months");

        let data = analyze_document("application/pdf", "Rapport_Q2.pdf", today());
        assert_eq!(data["pages"], 15);

        let data = analyze_document("image/png", "photo.png", today());
        assert_eq!(data, json!({}));
    }

    #[test]
    fn confidence_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let c = confidence_score(&mut rng);
            assert!((0.85..=0.98).contains(&c), "{}", c);
        }
    }

    #[test]
    fn workflow_requests_are_detected() {
        assert!(is_workflow_request("Peux-tu CRÉER un workflow ?"));
        assert!(is_workflow_request("je veux automatiser mes factures"));
        assert!(!is_workflow_request("Bonjour, comment ça va ?"));
    }

    #[test]
    fn suggestion_keywords_follow_priority_order() {
        assert_eq!(suggest_workflow("trier mes emails").name, "Analyse d'emails automatique");
        assert_eq!(suggest_workflow("Analyser des CV").name, "Analyse CV automatique");
        assert_eq!(
            suggest_workflow("automatiser la facture").name,
            "Traitement factures automatique"
        );
        // email wins over cv and facture
        assert_eq!(
            suggest_workflow("cv reçus par email").name,
            "Analyse d'emails automatique"
        );
        // cv wins over facture
        assert_eq!(suggest_workflow("facture et cv").name, "Analyse CV automatique");
        assert_eq!(suggest_workflow("rien de précis").name, "Analyse d'emails automatique");
    }

    #[test]
    fn ai_response_prefix() {
        assert_eq!(format_ai_response("Bonjour", "Claude"), "[Claude] Bonjour");
    }

    #[test]
    fn triage_flags_blocking_issues() {
        let triage = triage_ticket("Paiement bloqué", Some("Erreur lors du paiement"));
        assert_eq!(triage.sentiment, "negative");
        assert_eq!(triage.priority, TicketPriority::High);
        assert_eq!(triage.suggested_actions.len(), 3);
    }

    #[test]
    fn triage_defaults_to_neutral_medium() {
        let triage = triage_ticket("Question sur la facturation", None);
        assert_eq!(triage.sentiment, "neutral");
        assert_eq!(triage.priority, TicketPriority::Medium);
        assert_eq!(triage.summary, "Ticket créé automatiquement");
        assert_eq!(
            triage.suggested_actions,
            vec!["Analyser le problème", "Contacter le support"]
        );
    }

    #[test]
    fn urgent_keyword_wins() {
        let triage = triage_ticket("URGENT: merci de rappeler", None);
        assert_eq!(triage.priority, TicketPriority::Urgent);
        assert_eq!(triage.sentiment, "positive");
    }
}
