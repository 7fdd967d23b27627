//! Print the markers of a job, as a poller sees them.

use shortsmith_common::AppConfig;
use shortsmith_job_service::JobStore;

pub async fn run(config: AppConfig, key: String) -> anyhow::Result<()> {
    let (_, jobs) = super::open_stores(&config);
    let snapshot = jobs
        .poll(&key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read job {key}: {e}"))?;

    let Some(status) = &snapshot.status else {
        println!("No job found for {key}");
        return Ok(());
    };

    println!("Job: {key}");
    println!("  Status: {}", status.status.as_str());
    println!("  Progress: {}% ({})", status.percent, status.message);

    if let Some(manifest) = &snapshot.manifest {
        println!("\nManifest:");
        println!("{}", serde_json::to_string_pretty(manifest)?);
    }
    if let Some(error) = &snapshot.error {
        println!("\nError:");
        println!("{}", serde_json::to_string_pretty(error)?);
    }

    Ok(())
}
