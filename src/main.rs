use anyhow::{bail, Result};
use clap::Parser;
use fusionbot::image::BackgroundModel;
use fusionbot::job::JobStatus;
use fusionbot::models::{ImageSize, Style};
use fusionbot::pipeline::{Pipeline, Submission};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fusionbot")]
#[command(about = "Generate an image from a text prompt via FusionBrain")]
struct CliArgs {
    /// Text description of the desired image.
    prompt: String,

    /// Output size key: square, portrait, or landscape.
    #[arg(long, default_value = "square", value_parser = parse_size_arg)]
    size: ImageSize,

    /// Style key: default, anime, cyberpunk, watercolor, oil_painting, retro.
    #[arg(long, default_value = "default", value_parser = parse_style_arg)]
    style: Style,

    /// Where to write the generated PNG.
    #[arg(long, default_value = "generated.png")]
    output: PathBuf,
}

fn parse_size_arg(input: &str) -> std::result::Result<ImageSize, String> {
    ImageSize::from_key(input).map_err(|e| e.to_string())
}

fn parse_style_arg(input: &str) -> std::result::Result<Style, String> {
    Style::from_key(input).map_err(|e| e.to_string())
}

/// The CLI only drives generation; background removal needs a model wired
/// in by the embedding application.
struct UnavailableModel;

impl BackgroundModel for UnavailableModel {
    fn transform(&self, _image: image::DynamicImage) -> fusionbot::Result<image::DynamicImage> {
        Err(fusionbot::Error::Processing(
            "no background-removal model configured".to_string(),
        ))
    }
}

const CLI_USER_ID: u64 = 0;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fusionbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let pipeline = Pipeline::from_env(Arc::new(UnavailableModel))?;
    pipeline.set_size(CLI_USER_ID, args.size);
    pipeline.set_style(CLI_USER_ID, args.style);
    pipeline.begin_prompt(CLI_USER_ID);

    let submission = pipeline.submit_generation(CLI_USER_ID, &args.prompt).await?;
    let mut pending = match submission {
        Submission::Started(pending) => pending,
        Submission::Ignored => bail!("submission was ignored"),
    };
    if pending.truncated {
        warn!("Prompt exceeded the length cap and was truncated");
    }
    info!("Job {} submitted, polling...", pending.job.job_id());

    match pipeline.run_job(CLI_USER_ID, &mut pending).await? {
        JobStatus::Done => {
            let artifact = pipeline
                .session(CLI_USER_ID)
                .last_artifact
                .expect("done job records an artifact");
            std::fs::write(&args.output, &artifact.image_bytes)?;
            info!(
                "Image written to {} ({} bytes)",
                args.output.display(),
                artifact.image_bytes.len()
            );
            Ok(())
        }
        JobStatus::Censored => bail!("request was rejected by content moderation"),
        JobStatus::TimedOut => bail!("generation timed out; try again"),
        JobStatus::Failed => bail!(
            "generation failed: {}",
            pending.job.failure_reason().unwrap_or("unknown reason")
        ),
        status => bail!("unexpected non-terminal status {:?}", status),
    }
}
