//! Google Gemini adapter, through the `generateContent` REST endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AnalysisError, Analyzer};
use crate::config;
use crate::model::{EvidenceImage, RawFindings};

const INVALID_KEY_MARKER: &str = "API key not valid";

/// Error body returned by the service.
#[derive(Debug, thiserror::Error)]
#[error("analysis service answered {status}: {message}")]
struct ServiceError {
    status: StatusCode,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// [`Analyzer`] backed by Gemini.
#[derive(Clone)]
pub struct GeminiAnalyzer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl GeminiAnalyzer {
    pub fn new(client: Client, config: &config::Analysis) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            temperature: config.temperature,
        }
    }

    /// Whether a non-blank API key is configured.
    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn body(&self, image: &EvidenceImage, location: &str) -> Value {
        json!({
            "contents": [{
                "parts": [
                    { "text": prompt(location) },
                    {
                        "inline_data": {
                            "mime_type": image.mime_type,
                            "data": STANDARD.encode(&image.bytes),
                        }
                    }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema(),
                "temperature": self.temperature,
            }
        })
    }
}

fn prompt(location: &str) -> String {
    format!(
        r#"Actúa como 'Guardián IA', un experto en seguridad e higiene laboral en Argentina. Tu análisis debe basarse en la imagen provista y cumplir estrictamente con las leyes argentinas: Ley 19.587 (Higiene y Seguridad) y Ley 24.557 (Riesgos del Trabajo).
El objetivo es identificar riesgos para el personal no docente (mantenimiento, limpieza) en la ubicación: "{location}".

Analiza la imagen adjunta y genera un informe de riesgo profesional. Identifica todas las anomalías de seguridad visibles.

Debes devolver únicamente un objeto JSON válido con la siguiente estructura:
- riskLevel: Clasificación del riesgo general (Verde, Amarillo, o Rojo).
- anomalyDescription: Descripción detallada de los peligros.
- ppeRecommendation: EPP recomendado.
- infrastructureSuggestion: Sugerencias de mejora.
- legalReference: Citas legales específicas de las leyes mencionadas que justifiquen el riesgo."#
    )
}

fn schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "riskLevel": {
                "type": "STRING",
                "enum": ["Verde", "Amarillo", "Rojo"],
                "description": "Clasificación del riesgo: Verde (Seguro), Amarillo (Precaución), Rojo (Peligro)."
            },
            "anomalyDescription": {
                "type": "STRING",
                "description": "Descripción detallada de todas las anomalías y riesgos de seguridad identificados para el personal de servicio (limpieza, mantenimiento)."
            },
            "ppeRecommendation": {
                "type": "STRING",
                "description": "Listado detallado del Equipamiento de Protección Personal (EPP) requerido para realizar tareas de forma segura."
            },
            "infrastructureSuggestion": {
                "type": "STRING",
                "description": "Sugerencias para reparaciones o mejoras de infraestructura a largo plazo para eliminar los riesgos."
            },
            "legalReference": {
                "type": "STRING",
                "description": "Cita de los artículos, capítulos o secciones pertinentes de las leyes argentinas 19.587 y 24.557 que fundamentan el análisis."
            }
        },
        "required": [
            "riskLevel",
            "anomalyDescription",
            "ppeRecommendation",
            "infrastructureSuggestion",
            "legalReference"
        ]
    })
}

/// Turn a raw service answer into findings.
fn interpret(status: StatusCode, body: &str) -> Result<RawFindings, AnalysisError> {
    let response = serde_json::from_str::<GenerateContentResponse>(body)
        .unwrap_or_default();

    if let Some(error) = response.error {
        if error.message.contains(INVALID_KEY_MARKER) {
            return Err(AnalysisError::InvalidApiKey);
        }
        return Err(AnalysisError::failed(ServiceError {
            status,
            message: error.message,
        }));
    }

    if !status.is_success() {
        return Err(AnalysisError::failed(ServiceError {
            status,
            message: body.chars().take(200).collect(),
        }));
    }

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .unwrap_or_default();
    let text = text.trim();

    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    serde_json::from_str(text).map_err(AnalysisError::failed)
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        image: &EvidenceImage,
        location: &str,
    ) -> Result<RawFindings, AnalysisError> {
        let Some(api_key) = &self.api_key else {
            return Err(AnalysisError::MissingApiKey);
        };

        tracing::debug!(model = %self.model, size = image.bytes.len(), "requesting analysis");

        let response = self
            .client
            .post(self.url())
            .query(&[("key", api_key)])
            .json(&self.body(image, location))
            .send()
            .await
            .map_err(AnalysisError::failed)?;

        let status = response.status();
        let body = response.text().await.map_err(AnalysisError::failed)?;

        interpret(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;

    use super::*;
    use crate::model::ImageSource;

    fn analyzer(api_key: Option<&str>) -> GeminiAnalyzer {
        let config = config::Analysis {
            api_key: api_key.map(str::to_owned),
            ..Default::default()
        };
        GeminiAnalyzer::new(Client::new(), &config)
    }

    fn image() -> EvidenceImage {
        EvidenceImage {
            bytes: Bytes::from_static(b"\x89PNG"),
            mime_type: "image/png".into(),
            file_name: "foto.png".into(),
            source: ImageSource::Upload,
        }
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        for key in [None, Some(""), Some("   ")] {
            let err = analyzer(key).analyze(&image(), "Cocina").await.unwrap_err();
            assert!(matches!(err, AnalysisError::MissingApiKey));
            assert_eq!(err.to_string(), "La clave de API de Gemini no está configurada.");
        }
    }

    #[test]
    fn test_request_body() {
        let analyzer = analyzer(Some("key"));
        let body = analyzer.body(&image(), "Sótano");

        assert_eq!(
            analyzer.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );

        let parts = &body["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("\"Sótano\""));
        assert!(parts[0]["text"].as_str().unwrap().contains("Ley 24.557"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "iVBORw==");

        let generation = &body["generationConfig"];
        assert_eq!(generation["responseMimeType"], "application/json");
        assert_eq!(generation["responseSchema"]["required"].as_array().unwrap().len(), 5);
        assert_eq!(generation["temperature"].as_f64().unwrap() as f32, 0.2);
    }

    #[test]
    fn test_interpret_findings() {
        let findings = json!({
            "riskLevel": "Rojo",
            "anomalyDescription": "a",
            "ppeRecommendation": "b",
            "infrastructureSuggestion": "c",
            "legalReference": "d",
        })
        .to_string();
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": format!("  {findings}\n") }] } }]
        })
        .to_string();

        let raw = interpret(StatusCode::OK, &body).unwrap();
        assert_eq!(raw.risk_level, "Rojo");
        assert_eq!(raw.legal_reference, "d");
    }

    #[test]
    fn test_interpret_errors() {
        let invalid_key = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })
        .to_string();
        assert!(matches!(
            interpret(StatusCode::BAD_REQUEST, &invalid_key),
            Err(AnalysisError::InvalidApiKey)
        ));

        let empty = json!({ "candidates": [{ "content": { "parts": [{ "text": " " }] } }] });
        assert!(matches!(
            interpret(StatusCode::OK, &empty.to_string()),
            Err(AnalysisError::EmptyResponse)
        ));
        assert!(matches!(
            interpret(StatusCode::OK, "{}"),
            Err(AnalysisError::EmptyResponse)
        ));

        let malformed = json!({ "candidates": [{ "content": { "parts": [{ "text": "{\"riskLevel\": 3}" }] } }] });
        let err = interpret(StatusCode::OK, &malformed.to_string()).unwrap_err();
        assert!(matches!(err, AnalysisError::Failed(_)));
        assert_eq!(
            err.to_string(),
            "No se pudo analizar la imagen. Verifique la clave de API y la imagen subida."
        );

        assert!(matches!(
            interpret(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            Err(AnalysisError::Failed(_))
        ));
    }
}
