use std::path::Path;

use anyhow::Context as _;
use futures_util::StreamExt;
use prism_config::Config;
use prism_llm::{
    AdapterRegistry, CompletionOptions, CompletionRequest, CompletionResult, Framing, HttpTransport, ModelDescriptor,
    ProviderAdapter, StreamReassembler,
};
use secrecy::SecretString;

use crate::args::{ReplayArgs, RequestArgs};

/// Everything a subcommand needs from startup
pub struct Context<'a> {
    pub config: Option<&'a Config>,
    pub registry: &'a AdapterRegistry,
}

impl Context<'_> {
    /// Model as the registry would describe it, with the provider's base URL
    fn model(&self, provider: &str, model_id: &str) -> ModelDescriptor {
        let descriptor = ModelDescriptor::new(provider, model_id);
        match self.base_url(provider) {
            Some(url) => descriptor.with_url(url),
            None => descriptor,
        }
    }

    fn base_url(&self, provider: &str) -> Option<url::Url> {
        self.config?.llm.providers.get(provider)?.base_url.clone()
    }

    fn api_key(&self, provider: &str) -> Option<SecretString> {
        self.config?.llm.providers.get(provider)?.api_key.clone()
    }
}

pub fn request(context: &Context<'_>, args: &RequestArgs) -> anyhow::Result<()> {
    let request = read_request(&args.input)?;
    let adapter = context.registry.get(&args.provider)?;
    let model = context.model(&args.provider, args.model.as_deref().unwrap_or(&request.model));

    // Credentials are redacted in the output, any placeholder will do
    let api_key = context
        .api_key(&args.provider)
        .unwrap_or_else(|| SecretString::from("unset"));

    let vendor_request = adapter.create_completion_request(&model, &request.messages, &api_key, &request.options)?;
    print_json(&vendor_request.to_redacted_json())
}

pub fn replay(context: &Context<'_>, args: &ReplayArgs) -> anyhow::Result<()> {
    let capture = std::fs::read(&args.input).with_context(|| format!("failed to read {}", args.input.display()))?;
    let request = args.request.as_deref().map(read_request).transpose()?;
    let (model_id, options) = request.map_or_else(
        || ("replay".to_owned(), CompletionOptions::default()),
        |r| (r.model, r.options),
    );

    let adapter = context.registry.get(&args.provider)?;
    let model = context.model(&args.provider, &model_id);

    if !args.stream {
        let result = adapter.process_response_buffer(&model, &options, &capture)?;
        return print_json(&result);
    }

    let mut reassembler = if args.json_lines {
        StreamReassembler::new(
            adapter.vendor(),
            model_id,
            Framing::JsonLines,
            adapter.response_normalizer(&options),
        )
    } else {
        adapter.stream_reassembler(&model, &options)
    };

    let mut total = CompletionResult::default();
    for chunk in capture.chunks(usize::from(args.chunk_size)) {
        emit_delta(&mut total, reassembler.push(chunk))?;
    }
    emit_delta(&mut total, reassembler.finish())?;

    if let Some(error) = reassembler.last_error() {
        tracing::warn!(error = %error, "capture contained malformed events");
    }
    print_json(&total)
}

pub async fn complete(context: &Context<'_>, args: &RequestArgs) -> anyhow::Result<()> {
    let request = read_request(&args.input)?;
    let adapter = context.registry.get(&args.provider)?;
    let model = context.model(&args.provider, args.model.as_deref().unwrap_or(&request.model));
    let api_key = context
        .api_key(&args.provider)
        .with_context(|| format!("provider '{}' has no api_key configured", args.provider))?;

    let vendor_request = adapter.create_completion_request(&model, &request.messages, &api_key, &request.options)?;
    let transport = HttpTransport::new();

    tracing::info!(
        provider = %args.provider,
        vendor = %adapter.vendor(),
        model = %model.model_id,
        stream = request.options.stream,
        "sending completion request"
    );

    if !request.options.stream {
        let result = transport
            .complete(adapter, &model, &request.options, &vendor_request)
            .await?;
        return print_json(&result);
    }

    let mut deltas = transport
        .stream(adapter, &model, &request.options, &vendor_request)
        .await?;
    let mut total = CompletionResult::default();
    while let Some(delta) = deltas.next().await {
        emit_delta(&mut total, delta?)?;
    }
    print_json(&total)
}

fn read_request(path: &Path) -> anyhow::Result<CompletionRequest> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid completion request in {}", path.display()))
}

/// Print one delta as a JSON line and fold it into the running total
fn emit_delta(total: &mut CompletionResult, delta: CompletionResult) -> anyhow::Result<()> {
    if delta.is_empty() {
        return Ok(());
    }
    println!("{}", serde_json::to_string(&delta)?);
    total.append(delta);
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use prism_llm::Vendor;

    use super::*;

    #[test]
    fn model_takes_configured_base_url() {
        let config = Config::parse(
            r#"
            [llm.providers.azure]
            type = "openai_chat"
            base_url = "https://contoso.openai.azure.com/openai/v1?api-version=preview"
        "#,
        )
        .unwrap();
        let registry = AdapterRegistry::from_config(&config.llm);
        let context = Context {
            config: Some(&config),
            registry: &registry,
        };

        let model = context.model("azure", "gpt-4o");
        assert_eq!(model.url.as_ref().map(url::Url::as_str), Some("https://contoso.openai.azure.com/openai/v1?api-version=preview"));
        assert!(context.api_key("azure").is_none());
        assert_eq!(registry.get("azure").unwrap().vendor(), Vendor::OpenAiChat);
    }

    #[test]
    fn empty_deltas_are_not_folded() {
        let mut total = CompletionResult::default();
        emit_delta(&mut total, CompletionResult::default()).unwrap();
        assert!(total.is_empty());
    }
}
