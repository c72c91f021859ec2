use std::path::PathBuf;

/// Default Sheets API origin.
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// OAuth scope granting read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Environment variable holding the service-account key JSON when no key
/// file is present (platform-managed secret).
pub const SERVICE_ACCOUNT_ENV: &str = "GCP_SERVICE_ACCOUNT";

/// Connection settings for the Google Sheets backed store.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet ID (the part of the URL between `/d/` and `/edit`).
    pub spreadsheet_key: String,
    /// Worksheet (tab) holding the character rows.
    pub worksheet: String,
    /// Local service-account key file, checked before the environment.
    pub credentials_file: PathBuf,
    /// API origin, overridable for tests and proxies.
    pub api_url: String,
    /// Token endpoint override. `None` uses the key file's `token_uri`.
    pub token_url: Option<String>,
}

impl SheetsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var            | Required | Default                          |
    /// |--------------------|----------|----------------------------------|
    /// | `SPREADSHEET_KEY`  | **yes**  | --                               |
    /// | `WORKSHEET_NAME`   | no       | `characters`                     |
    /// | `CREDENTIALS_FILE` | no       | `secrets.json`                   |
    /// | `SHEETS_API_URL`   | no       | `https://sheets.googleapis.com`  |
    /// | `OAUTH_TOKEN_URL`  | no       | key file's `token_uri`           |
    ///
    /// # Panics
    ///
    /// Panics if `SPREADSHEET_KEY` is not set or is empty.
    pub fn from_env() -> Self {
        let spreadsheet_key = std::env::var("SPREADSHEET_KEY")
            .expect("SPREADSHEET_KEY must be set in the environment");
        assert!(
            !spreadsheet_key.trim().is_empty(),
            "SPREADSHEET_KEY must not be empty"
        );

        let worksheet = std::env::var("WORKSHEET_NAME").unwrap_or_else(|_| "characters".into());

        let credentials_file = std::env::var("CREDENTIALS_FILE")
            .unwrap_or_else(|_| "secrets.json".into())
            .into();

        let api_url =
            std::env::var("SHEETS_API_URL").unwrap_or_else(|_| DEFAULT_SHEETS_API_URL.into());

        let token_url = std::env::var("OAUTH_TOKEN_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            spreadsheet_key,
            worksheet,
            credentials_file,
            api_url,
            token_url,
        }
    }
}
