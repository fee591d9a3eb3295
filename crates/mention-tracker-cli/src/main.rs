use anyhow::Result;
use mention_tracker_config::Config;
use mention_tracker_engine::{ComposeBox, Highlight, MentionObserver, PersistedSpan, to_persisted};
use std::{env, path::PathBuf, process};

mod script;

use script::{Script, Step};

/// Logs engine callbacks the way a UI would react to them
struct LogObserver;

impl MentionObserver for LogObserver {
    fn on_over_length(&mut self) {
        log::warn!("buffer is full, input refused");
    }

    fn on_mentions_changed(&mut self, highlights: &[Highlight]) {
        log::debug!("repaint {} mention highlights", highlights.len());
    }
}

/// Buffer plus mention records, as written to the drafts directory
#[derive(serde::Serialize)]
struct Draft<'a> {
    text: &'a str,
    mentions: Vec<PersistedSpan>,
}

fn run(script: &Script, config: &Config) -> ComposeBox {
    let mut compose = ComposeBox::with_text(config.mentions.clone(), &script.text);
    compose.engine_mut().set_observer(LogObserver);

    for (index, step) in script.steps.iter().enumerate() {
        let result = match step {
            Step::Type(text) => compose.type_text(text),
            Step::Mention { user_id, name } => compose.insert_mention(*user_id, name),
            Step::Backspace(count) => (0..*count).try_for_each(|_| compose.backspace()),
            Step::Select([start, end]) => {
                compose.select(*start, *end);
                Ok(())
            }
            Step::Click(offset) => {
                compose.click(*offset);
                Ok(())
            }
            Step::LoadExchange(exchange) => {
                let report =
                    compose.load_exchange(exchange, |user_id| script.user_name(user_id));
                log::info!(
                    "loaded {} mentions from exchange, {} skipped",
                    report.loaded,
                    report.skipped.len()
                );
                Ok(())
            }
        };
        match result {
            Ok(()) => log::debug!("step {index} applied: {step:?}"),
            Err(e) => log::warn!("step {index} refused: {e}"),
        }
    }
    compose
}

fn print_summary(compose: &ComposeBox) -> Result<()> {
    let engine = compose.engine();
    println!("buffer:    {:?}", compose.text());
    println!("selection: {:?}", compose.selection());
    println!("mentions:");
    for span in engine.spans() {
        println!(
            "  {:>6} {:?} [{}, {}) {:?}",
            span.user_id, span.display_text, span.start, span.end, span.state
        );
    }
    println!("exchange:  {:?}", engine.serialize_for_send(compose.text())?);
    println!(
        "records:   {}",
        mention_tracker_engine::records_to_json(engine.spans())?
    );
    Ok(())
}

fn save_draft(compose: &ComposeBox, drafts_path: &std::path::Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(drafts_path)?;
    let draft = Draft {
        text: compose.text(),
        mentions: compose.engine().spans().map(to_persisted).collect(),
    };
    let path = drafts_path.join(format!("{name}.json"));
    std::fs::write(&path, serde_json::to_string_pretty(&draft)?)?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <script.toml>", args[0]);
        process::exit(1);
    }
    let script_path = PathBuf::from(&args[1]);

    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Config path: {}", Config::config_path().display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let script = match Script::load(&script_path) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let compose = run(&script, &config);
    print_summary(&compose)?;

    if let Some(drafts_path) = &config.drafts_path {
        let name = script_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "draft".to_string());
        let path = save_draft(&compose, drafts_path, &name)?;
        log::info!("draft saved to {}", path.display());
    }

    Ok(())
}
