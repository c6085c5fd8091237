//! Transform phase: ask the model for a short investment nudge per user.

use crate::llm::{ChatRequest, LlmClient, Message};
use crate::model::User;
use anyhow::{anyhow, Result};
use tracing::{debug, warn};

/// Character budget requested from the model. Not enforced on the reply.
pub const MAX_MESSAGE_CHARS: usize = 120;

/// Fixed generation parameters for a single advisory message.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
            temperature: crate::config::DEFAULT_TEMPERATURE,
        }
    }
}

pub fn system_prompt() -> String {
    format!(
        "Você é um consultor financeiro especializado do Santander. \
Crie mensagens personalizadas e motivadoras sobre investimentos. \
Seja direto, pessoal e focado no futuro financeiro do cliente. \
Máximo de {} caracteres.",
        MAX_MESSAGE_CHARS
    )
}

pub fn user_prompt(user: &User) -> String {
    format!(
        "Crie uma mensagem personalizada para {name} sobre a importância dos investimentos. \
Use estas informações:
Cliente: {name}
Email: {email}
Empresa: {company}
Saldo atual: R$ {balance}

Mensagem deve ser curta, impactante e personalizada.",
        name = user.name,
        email = user.email,
        company = user.company_name(),
        balance = format_balance(user.account.balance),
    )
}

/// Message used whenever the model cannot produce one.
pub fn fallback_message(name: &str) -> String {
    format!(
        "{}, invista hoje para um futuro financeiro mais seguro e próspero!",
        name
    )
}

/// Two decimals with comma-grouped thousands, e.g. `12,345.67`.
pub fn format_balance(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn build_request(user: &User, params: &GenerationParams) -> ChatRequest {
    ChatRequest {
        model: params.model.clone(),
        messages: vec![Message::system(system_prompt()), Message::user(user_prompt(user))],
        max_tokens: Some(params.max_tokens),
        temperature: Some(params.temperature),
    }
}

/// Ask the model once and return its trimmed reply.
pub fn request_message<L: LlmClient + ?Sized>(
    client: &L,
    user: &User,
    params: &GenerationParams,
) -> Result<String> {
    let response = client.chat(&build_request(user, params))?;
    let text = response
        .first_content()
        .map(str::trim)
        .ok_or_else(|| anyhow!("model returned no message"))?;
    if let Some(usage) = &response.usage {
        debug!(
            user_id = user.id,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "message generated"
        );
    }
    Ok(text.to_string())
}

/// Never fails: any error from the model is replaced by the fallback text.
pub fn generate_message<L: LlmClient + ?Sized>(
    client: &L,
    user: &User,
    params: &GenerationParams,
) -> String {
    match request_message(client, user, params) {
        Ok(message) => {
            println!("AI: message generated for {}", user.name);
            message
        }
        Err(e) => {
            warn!(user_id = user.id, "message generation failed: {:#}", e);
            println!("Message generation error for {}: {:#}", user.name, e);
            fallback_message(&user.name)
        }
    }
}
