//! Prompt copy shown in the native biometric dialog.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// The user-facing text of the native biometric prompt.
///
/// Hosts usually just use [`PromptConfig::default`], but can ship localized
/// copy as a small TOML document:
///
/// ```toml
/// title = "Unlock"
/// subtitle = "Confirm it's you"
/// cancel_label = "Not now"
/// ```
///
/// Missing fields fall back to the defaults.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptConfig {
    pub title: String,
    /// May be empty, in which case only the title is shown.
    pub subtitle: String,
    /// Label of the negative button (`localizedCancelTitle` on iOS).
    pub cancel_label: String,
}

impl PromptConfig {
    pub const DEFAULT_TITLE: &'static str = "Biometric Authentication";
    pub const DEFAULT_SUBTITLE: &'static str =
        "Please authenticate to continue";
    pub const DEFAULT_CANCEL_LABEL: &'static str = "Cancel";

    /// Parse a [`PromptConfig`] from a TOML document.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(s)
            .context("Failed to parse prompt config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// A prompt with no title renders as a blank dialog on Android and is
    /// rejected by `BiometricPrompt.PromptInfo.Builder` outright.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.title.trim().is_empty(),
            "Prompt title must not be empty"
        );
        anyhow::ensure!(
            !self.cancel_label.trim().is_empty(),
            "Prompt cancel label must not be empty"
        );
        Ok(())
    }

    /// The single "reason" string for platforms that only accept one line of
    /// copy (iOS `localizedReason`). Joins title and subtitle with a newline.
    pub fn reason(&self) -> String {
        if self.subtitle.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.subtitle)
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_owned(),
            subtitle: Self::DEFAULT_SUBTITLE.to_owned(),
            cancel_label: Self::DEFAULT_CANCEL_LABEL.to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_partial() {
        let config = PromptConfig::from_toml_str(
            r#"
            title = "Unlock"
            "#,
        )
        .unwrap();
        assert_eq!(config.title, "Unlock");
        assert_eq!(config.subtitle, PromptConfig::DEFAULT_SUBTITLE);
        assert_eq!(config.cancel_label, PromptConfig::DEFAULT_CANCEL_LABEL);

        let config = PromptConfig::from_toml_str("").unwrap();
        assert_eq!(config, PromptConfig::default());
    }

    #[test]
    fn parse_rejects_bad_config() {
        PromptConfig::from_toml_str(r#"title = """#).unwrap_err();
        PromptConfig::from_toml_str(r#"cancel_label = "  ""#).unwrap_err();
        PromptConfig::from_toml_str(r#"titel = "typo""#).unwrap_err();
        PromptConfig::from_toml_str("title = 5").unwrap_err();
    }

    #[test]
    fn reason() {
        let mut config = PromptConfig::default();
        assert_eq!(
            config.reason(),
            "Biometric Authentication\nPlease authenticate to continue"
        );

        config.subtitle.clear();
        assert_eq!(config.reason(), "Biometric Authentication");
    }
}
