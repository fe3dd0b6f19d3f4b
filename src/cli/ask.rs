use anyhow::Result;
use std::io::Write;

use crate::config::LoreConfig;
use crate::engine::{KnowledgeEngine, SearchHit};
use crate::generation::{ChatMessage, GenerationClient};
use crate::knowledge::KnowledgeStore;
use crate::session::SessionLog;

/// Answer a question with retrieved context and the generation service.
///
/// Retrieved entries ride along as a system message on the chat endpoint;
/// `--bare` (or an empty corpus) skips retrieval and sends the prompt to the
/// plain generate endpoint instead. Both turns land in the session log,
/// which is then trimmed back to the configured token budget.
pub async fn ask(config: &LoreConfig, prompt: &str, no_stream: bool, bare: bool) -> Result<()> {
    let client = GenerationClient::new(&config.generation)?;
    if !client.is_available().await {
        anyhow::bail!(
            "generation service at {} is not reachable; is it running?",
            client.base_url()
        );
    }

    let context = if bare {
        None
    } else {
        let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
        let engine = KnowledgeEngine::new(store);
        let response = engine.search(prompt, config.retrieval.default_top_k)?;
        build_context(&response.results)
    };

    let mut log = SessionLog::open(config.resolved_session_path())?;
    log.add("user", prompt, serde_json::Map::new())?;

    let mut stdout = std::io::stdout();
    let on_fragment = |fragment: &str| {
        print!("{fragment}");
        let _ = stdout.flush();
    };

    let answer = match (&context, no_stream) {
        (Some(context), true) => {
            let answer = client.chat(&grounded_messages(context, prompt)).await?;
            println!("{answer}");
            answer
        }
        (Some(context), false) => {
            let answer = client
                .chat_stream(&grounded_messages(context, prompt), on_fragment)
                .await?;
            println!();
            answer
        }
        (None, true) => {
            let answer = client.generate(prompt).await?;
            println!("{answer}");
            answer
        }
        (None, false) => {
            let answer = client.generate_stream(prompt, on_fragment).await?;
            println!();
            answer
        }
    };

    let mut meta = serde_json::Map::new();
    meta.insert(
        "model".to_string(),
        serde_json::Value::String(client.model().to_string()),
    );
    log.add("assistant", &answer, meta)?;
    log.trim_to_token_budget(config.session.token_budget)?;

    Ok(())
}

/// Render the retrieved entries as a system-message context block, best
/// match first. `None` when nothing matched.
fn build_context(hits: &[SearchHit]) -> Option<String> {
    if hits.is_empty() {
        return None;
    }
    let mut context = String::from("Answer using the knowledge below when it is relevant.\n");
    for hit in hits {
        context.push_str("\nQ: ");
        context.push_str(&hit.entry.question);
        context.push_str("\nA: ");
        context.push_str(&hit.entry.answer);
        context.push('\n');
    }
    Some(context)
}

fn grounded_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(context), ChatMessage::user(question)]
}
