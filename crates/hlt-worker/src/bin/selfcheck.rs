use std::path::Path;

use hlt_media::{check_ffmpeg, check_ffprobe};
use hlt_worker::{load_manifest, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "hlt-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_dir(&config.work_dir).await?;
    ensure_dir(&config.state_dir()).await?;
    ensure_dir(&config.recordings_dir).await?;
    ensure_tools()?;
    ensure_manifest(&config.manifest_path).await?;

    println!("hlt-selfcheck: ok");
    Ok(())
}

async fn ensure_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".hlt-selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    let ffprobe = check_ffprobe().map_err(|e| anyhow::anyhow!("ffprobe not available: {}", e))?;
    println!("hlt-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());
    Ok(())
}

async fn ensure_manifest(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        println!("hlt-selfcheck: no manifest at {} yet", path.display());
        return Ok(());
    }
    let broadcasts = load_manifest(path)
        .await
        .map_err(|e| anyhow::anyhow!("manifest {} is invalid: {}", path.display(), e))?;
    println!("hlt-selfcheck: manifest lists {} broadcast(s)", broadcasts.len());
    Ok(())
}
