use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};

/// Supplies the authorization code for a first-run OAuth consent.
pub trait AuthCodeProvider {
    fn authorization_code(&self, auth_url: &str) -> anyhow::Result<String>;
}

/// Prints the consent URL and blocks on one line from stdin.
pub struct ConsoleCodeProvider;

impl AuthCodeProvider for ConsoleCodeProvider {
    fn authorization_code(&self, auth_url: &str) -> anyhow::Result<String> {
        println!("Authorize this app by visiting this URL: {auth_url}");
        print!("Enter the code from that page here: ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Could not read authorization code")?;

        let code = line.trim();
        if code.is_empty() {
            bail!("No authorization code entered");
        }
        Ok(code.to_string())
    }
}

/// Hands out a code obtained ahead of time, for headless deployments.
pub struct StaticCodeProvider {
    code: String,
}

impl StaticCodeProvider {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl AuthCodeProvider for StaticCodeProvider {
    fn authorization_code(&self, auth_url: &str) -> anyhow::Result<String> {
        tracing::info!("Using configured authorization code for {}", auth_url);
        Ok(self.code.clone())
    }
}
