use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

pub const DEFAULT_ANNOTATOR_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_ANNOTATOR_MODEL: &str = "llama3";
pub const PROMPT_MARKUP_MAX_CHARS: usize = 1200;

/// Text-generation backend used to describe accepted combinations.
pub trait Annotator {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Inputs for one description request.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationRequest<'a> {
    pub category: &'a str,
    pub style_label: &'a str,
    pub markup: &'a str,
    pub class_tokens: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    pub source: AnnotationSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationSource {
    Generated { annotator: String },
    Fallback { reason: String },
}

impl Annotation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, AnnotationSource::Fallback { .. })
    }
}

/// POSTs `{model, prompt, stream: false}` and reads the `response` text field.
pub struct HttpAnnotator {
    endpoint: String,
    model: String,
    http: HttpClient,
}

impl HttpAnnotator {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(endpoint, model, HttpClient::new())
    }

    pub fn with_client(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        http: HttpClient,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim().trim_end_matches('/').to_string(),
            model: model.into(),
            http,
        }
    }
}

impl Annotator for HttpAnnotator {
    fn name(&self) -> &str {
        "http"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .with_context(|| format!("annotation request failed ({})", self.endpoint))?;
        let payload = response_json_or_error("annotator", response)?;
        extract_generated_text(&payload)
    }
}

/// Never reaches a backend; every description becomes the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAnnotator;

impl Annotator for OfflineAnnotator {
    fn name(&self) -> &str {
        "offline"
    }

    fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("annotation disabled (offline mode)")
    }
}

pub fn build_prompt(request: &AnnotationRequest<'_>) -> String {
    let markup = truncate_text(request.markup, PROMPT_MARKUP_MAX_CHARS);
    format!(
        "You are documenting a generated UI design for a gallery.\n\
         Category: {category}\n\
         Style: {style}\n\
         Class tokens: {tokens}\n\
         Markup (truncated):\n{markup}\n\n\
         Write four short paragraphs, in this order:\n\
         1. Design concept: what the layout and style communicate.\n\
         2. Implementation notes: how the classes shape spacing, color and surfaces.\n\
         3. Accessibility notes: contrast, semantics, focus and motion concerns.\n\
         4. Defensive tip: one operational or robustness tip for shipping this design.\n\
         No headings, no lists, no marketing language.",
        category = request.category,
        style = request.style_label,
        tokens = request.class_tokens.join(" "),
    )
}

/// Deterministic four-sentence description used whenever generation fails.
pub fn fallback_description(category: &str, style_label: &str) -> String {
    format!(
        "This {category} design pairs a proven structural layout with the {style_label} treatment. \
         Styling is applied through utility classes, so spacing, palette and surface choices stay \
         consistent across sections. Check color contrast, heading order and keyboard focus states \
         before publishing the {category} layout. Keep the markup free of inline scripts and \
         validate any user-supplied content rendered inside it."
    )
}

/// Requests a description and substitutes the fallback on any failure.
pub fn annotate(annotator: &dyn Annotator, request: &AnnotationRequest<'_>) -> Annotation {
    let prompt = build_prompt(request);
    match annotator.generate(&prompt) {
        Ok(text) if !text.trim().is_empty() => Annotation {
            text: text.trim().to_string(),
            source: AnnotationSource::Generated {
                annotator: annotator.name().to_string(),
            },
        },
        Ok(_) => Annotation {
            text: fallback_description(request.category, request.style_label),
            source: AnnotationSource::Fallback {
                reason: "empty annotation text".to_string(),
            },
        },
        Err(err) => Annotation {
            text: fallback_description(request.category, request.style_label),
            source: AnnotationSource::Fallback {
                reason: error_chain_text(&err, 300),
            },
        },
    }
}

fn extract_generated_text(payload: &Value) -> Result<String> {
    let text = payload
        .get("response")
        .or_else(|| payload.get("text"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        bail!("annotator payload carried no text: {}", truncate_text(&payload.to_string(), 200));
    }
    Ok(text.to_string())
}

fn response_json_or_error(label: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{label} response body read failed"))?;
    if !status.is_success() {
        bail!("{label} request failed ({code}): {}", truncate_text(&body, 512));
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{label} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() || parts.last().is_some_and(|existing| existing == trimmed) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
