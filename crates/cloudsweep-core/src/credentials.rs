//! Credential file loading
//!
//! The file holds one account per line as `ACCESS_KEY<TAB>SECRET_KEY`.
//! Blank lines and `#` comments are skipped; malformed lines are reported and
//! skipped without aborting the load.

use crate::error::{CloudsweepError, Result};
use std::path::Path;
use tracing::warn;

/// One account to audit
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Display name, `Account <n>` by default
    pub name: String,
    /// Access key identifier
    pub access_key: String,
    secret_key: String,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Secret key material
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// First five characters of the access key, for display
    pub fn key_hint(&self) -> String {
        let prefix: String = self.access_key.chars().take(5).collect();
        format!("{}...", prefix)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("access_key", &self.key_hint())
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Parse credential records from text
pub fn parse_accounts(content: &str, source: &str) -> Vec<Account> {
    let mut accounts = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();

        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [access_key, secret_key] if !access_key.trim().is_empty() && !secret_key.trim().is_empty() => {
                let name = format!("Account {}", accounts.len() + 1);
                accounts.push(Account::new(name, access_key.trim(), secret_key.trim()));
            }
            _ => {
                warn!(
                    "{} line {} is malformed (expected ACCESS_KEY<TAB>SECRET_KEY), skipping",
                    source,
                    index + 1
                );
            }
        }
    }

    accounts
}

/// Load accounts from a credential file.
///
/// A missing file is an error; the caller treats it as fatal for the process.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    if !path.exists() {
        return Err(CloudsweepError::CredentialsNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_accounts(&content, &path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_skips_comments_blank_and_malformed_lines() {
        let content = "# lab accounts\n\nAKIAONE\tsecret1\nnot-a-record\nAKIATWO\tsecret2\n  \na\tb\tc\n";
        let accounts = parse_accounts(content, "accesskey.txt");

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "Account 1");
        assert_eq!(accounts[0].access_key, "AKIAONE");
        assert_eq!(accounts[0].secret_key(), "secret1");
        assert_eq!(accounts[1].name, "Account 2");
        assert_eq!(accounts[1].access_key, "AKIATWO");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let accounts = parse_accounts("  AKIAPAD \t secret \r\n", "test");
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].access_key, "AKIAPAD");
        assert_eq!(accounts[0].secret_key(), "secret");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let account = Account::new("Account 1", "AKIAEXAMPLE", "topsecret");
        let debug = format!("{:?}", account);
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("AKIAEXAMPLE"));
        assert_eq!(account.key_hint(), "AKIAE...");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_accounts(&dir.path().join("accesskey.txt")).unwrap_err();
        assert!(matches!(err, CloudsweepError::CredentialsNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AKIAFILE\tsecret").unwrap();

        let accounts = load_accounts(file.path()).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].access_key, "AKIAFILE");
    }
}
