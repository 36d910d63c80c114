//! What the authentication screen should show for a given [`AuthState`].
//!
//! Keeping this here means the Kotlin and Swift screens render from the same
//! decisions and only differ in widgets.

use crate::{result::BiometricResult, state::AuthState};

/// The screen's top-level layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthView {
    /// The first availability check hasn't completed. Show a progress
    /// indicator.
    Checking,
    /// Biometrics are available. Show the "Authenticate" button and, if there
    /// was a previous attempt, its result.
    Ready {
        /// `false` while a challenge is on screen.
        button_enabled: bool,
        message: Option<ResultMessage>,
    },
    /// Biometrics are unavailable on this device.
    Unavailable { message: String, hint: String },
}

/// The message shown for a finished attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResultMessage {
    pub text: String,
    pub tone: Tone,
}

/// Hosts map these to their own palette.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

// --- impl AuthView --- //

impl AuthView {
    pub const UNAVAILABLE_MESSAGE: &'static str =
        "Biometric authentication is not available on this device";
    pub const UNAVAILABLE_HINT: &'static str =
        "Please use alternative authentication methods";

    /// Whether the challenge affordance is shown at all.
    pub fn shows_button(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl From<&AuthState> for AuthView {
    fn from(state: &AuthState) -> Self {
        match state.availability {
            None => Self::Checking,
            Some(true) => Self::Ready {
                button_enabled: !state.in_flight,
                message: state.last_result.map(ResultMessage::from),
            },
            Some(false) => Self::Unavailable {
                message: Self::UNAVAILABLE_MESSAGE.to_owned(),
                hint: Self::UNAVAILABLE_HINT.to_owned(),
            },
        }
    }
}

// --- impl ResultMessage --- //

impl From<BiometricResult> for ResultMessage {
    fn from(result: BiometricResult) -> Self {
        let (text, tone) = match result {
            BiometricResult::Success =>
                ("Authentication successful!", Tone::Positive),
            BiometricResult::Error => ("Authentication failed", Tone::Negative),
            BiometricResult::NotAvailable =>
                ("Biometric auth not available", Tone::Negative),
            BiometricResult::UserCanceled =>
                ("Authentication canceled", Tone::Neutral),
        };
        Self {
            text: text.to_owned(),
            tone,
        }
    }
}
