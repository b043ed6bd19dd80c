//! `kathor speak`: synthesize text to an MP3 file.

use std::path::Path;

use console::style;

use kathor_infra::config::{Secrets, load_config, resolve_data_dir};
use kathor_infra::tts::ElevenLabsClient;

pub async fn speak(text: &str, voice: Option<&str>, out: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(&resolve_data_dir()).await;
    let client = ElevenLabsClient::new(&config.tts, Secrets::from_env().eleven_labs_api_key);

    let spinner = (!json).then(|| {
        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_message("synthesizing...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner
    });

    let result = client.synthesize(text, voice).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let audio = result?;
    tokio::fs::write(out, &audio).await?;

    if json {
        let summary = serde_json::json!({
            "path": out.display().to_string(),
            "bytes": audio.len(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "\n  {} Wrote {} ({} bytes)\n",
            style("*").cyan().bold(),
            style(out.display()).cyan(),
            audio.len()
        );
    }
    Ok(())
}
