//! Command-line entry point — English Tutor.
//!
//! A thin collaborator around the response pipeline, mirroring what an HTTP
//! handler would do: validate the request, call the pipeline, serialize the
//! result. Request validation is the only error path; the pipeline itself
//! never fails.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Select the model backend once (may legitimately find none).
//! 4. Run the requested feature and print the result as pretty JSON.
//!
//! # Usage
//!
//! ```text
//! english-tutor chat "How do I order coffee?"
//! english-tutor grammar "She go to school"
//! english-tutor pron "this very rhythm" "zis veri ridim"
//! ```

use anyhow::{bail, Context, Result};

use english_tutor::config::AppConfig;
use english_tutor::pipeline::schema::{
    ChatRequest, GenerationRequest, GrammarRequest, PronunciationRequest,
};
use english_tutor::pipeline::ResponsePipeline;

fn usage() -> ! {
    eprintln!(
        "usage:\n  english-tutor chat <message>\n  english-tutor grammar <text>\n  \
         english-tutor pron <target> <spoken>"
    );
    std::process::exit(2);
}

fn parse_request(args: &[String]) -> Result<GenerationRequest> {
    match args {
        [cmd, message] if cmd == "chat" => Ok(GenerationRequest::Chat(ChatRequest::new(
            message.clone(),
            vec![],
        )?)),
        [cmd, text] if cmd == "grammar" => {
            Ok(GenerationRequest::Grammar(GrammarRequest::new(text.clone())?))
        }
        [cmd, target, spoken] if cmd == "pron" => Ok(GenerationRequest::Pronunciation(
            PronunciationRequest::new(target.clone(), spoken.clone())?,
        )),
        _ => bail!("unrecognized arguments"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }
    let request = match parse_request(&args) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("invalid request: {err}");
            usage();
        }
    };

    let config = AppConfig::load().context("loading settings.toml")?;
    let pipeline = ResponsePipeline::from_config(&config);
    if !pipeline.has_backend() {
        log::info!("no model backend available; answers come from the local synthesizer");
    }

    let result = pipeline.generate(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
