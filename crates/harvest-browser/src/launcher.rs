use crate::profile::ScratchProfile;
use crate::{Error, Result};
use chromiumoxide::browser::BrowserConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Switches every headless session starts with
const BASE_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--mute-audio",
];

/// Builds the launch configuration for a headless Chrome process
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    extra_args: Vec<String>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: PathBuf, extra_args: Vec<String>) -> Self {
        Self {
            chrome_path,
            extra_args,
        }
    }

    pub fn chrome_path(&self) -> &PathBuf {
        &self.chrome_path
    }

    /// Chrome command-line arguments: base switches, then caller extras
    fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = BASE_ARGS.iter().map(|arg| arg.to_string()).collect();

        for extra in &self.extra_args {
            if !args.contains(extra) {
                args.push(extra.clone());
            }
        }

        args
    }

    /// Configuration for one browser process bound to `profile`
    pub fn browser_config(
        &self,
        profile: &ScratchProfile,
        request_timeout: Duration,
    ) -> Result<BrowserConfig> {
        BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .user_data_dir(profile.path())
            .request_timeout(request_timeout)
            .args(self.build_args())
            .build()
            .map_err(|e| Error::Browser(format!("Failed to build browser config: {}", e)))
    }
}
