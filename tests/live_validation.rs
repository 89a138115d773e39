use std::{env, sync::Once};

use pdfsum::{
    config,
    summarization::{ChunkSettings, ChunkedSummarizer, build_summarization_client},
};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() {
    INIT.call_once(|| {
        set_default_env("SUMMARIZATION_PROVIDER", "huggingface");
        set_default_env("SUMMARIZATION_MODEL", "facebook/bart-large-cnn");
        config::init_config().expect("config");
    });
}

const ARTICLE: &str = "The city council approved a new budget on Tuesday that increases \
funding for public transit by twelve percent. Council members said the additional money will \
pay for more frequent bus service on the busiest routes and for repairs to two aging light rail \
stations. Opponents argued that the increase should have been paired with cuts elsewhere, but \
the measure passed by a vote of seven to two after a lengthy public comment period.";

#[tokio::test]
#[ignore = "Requires a live summarization endpoint"]
async fn live_model_summarizes_deterministically() {
    init_config_once();
    let config = config::get_config();
    let client = build_summarization_client(config).expect("client");
    let summarizer = ChunkedSummarizer::new(client, ChunkSettings::from_config(config));

    let first = summarizer.summarize(ARTICLE).await.expect("first summary");
    let second = summarizer.summarize(ARTICLE).await.expect("second summary");

    assert!(!first.text.is_empty());
    assert_eq!(first.chunk_count, 1);
    assert_eq!(first, second, "decoding must be deterministic");
}
