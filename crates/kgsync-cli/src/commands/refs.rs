use super::backend;
use anyhow::{bail, Result};
use kgsync_config::KgsyncConfig;
use kgsync_core::{extract_references, Envelope, GraphBackend, PayloadType, Reference};
use serde_json::json;

/// One `kind<TAB>name` line per reference
pub fn render(references: &[Reference]) -> String {
    if references.is_empty() {
        return "No references found\n".to_string();
    }
    references
        .iter()
        .map(|r| format!("{}\t{}\n", r.kind, r.name))
        .collect()
}

pub async fn execute(config: KgsyncConfig, text: &str, send: bool, graph: &str) -> Result<()> {
    let references = extract_references(text);
    print!("{}", render(&references));

    if send {
        let client = backend(&config)?;
        let payload = json!({ "content": text, "references": references });
        let envelope = Envelope::new(
            &config.backend.source,
            graph,
            PayloadType::TestReferences,
            &payload,
        )?;
        if !client.send(&envelope).await {
            bail!("Backend at {} did not accept the references", client.base_url());
        }
        println!("Sent {} references to {}", references.len(), client.base_url());
    }
    Ok(())
}
