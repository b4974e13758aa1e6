//! GPU utilization side-channel.
//!
//! Shells out to `nvidia-smi`: spawn a short-lived probe process, capture
//! stdout, and treat its absence as non-fatal rather than an error.

use std::time::Duration;
use tokio::process::Command;

const GPU_PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Sample GPU utilization as a percentage, or `None` if no GPU / driver
/// tooling is available, or the probe does not finish in time.
pub async fn sample_gpu_pct() -> Option<f32> {
    let probe = Command::new("nvidia-smi")
        .args([
            "--query-gpu=utilization.gpu",
            "--format=csv,noheader,nounits",
        ])
        .output();

    let output = match tokio::time::timeout(GPU_PROBE_TIMEOUT, probe).await {
        Ok(Ok(output)) if output.status.success() => output,
        _ => return None,
    };

    let text = String::from_utf8_lossy(&output.stdout);
    // Multiple GPUs report one line each; take the highest utilization so a
    // single busy GPU is enough to signal load.
    text.lines()
        .filter_map(|line| line.trim().parse::<f32>().ok())
        .fold(None, |max, v| Some(max.map_or(v, |m: f32| m.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_returns_none() {
        // CI/sandbox hosts running this test suite have no nvidia-smi.
        // The probe must degrade to "no signal", never an error.
        let result = sample_gpu_pct().await;
        assert!(result.is_none() || matches!(result, Some(v) if (0.0..=100.0).contains(&v)));
    }
}
