//! Foreign-facing mirrors of the core `bioauth` types.

use bioauth::{
    AuthState as AuthStateRs, AuthView as AuthViewRs,
    BiometricKind as BiometricKindRs, BiometricResult as BiometricResultRs,
    PromptConfig as PromptConfigRs, ResultMessage as ResultMessageRs,
    Tone as ToneRs,
};

use crate::error::FfiError;

/// See [`bioauth::BiometricResult`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, uniffi::Enum)]
pub enum BiometricResult {
    Success,
    Error,
    NotAvailable,
    UserCanceled,
}

impl From<BiometricResultRs> for BiometricResult {
    fn from(result: BiometricResultRs) -> Self {
        match result {
            BiometricResultRs::Success => Self::Success,
            BiometricResultRs::Error => Self::Error,
            BiometricResultRs::NotAvailable => Self::NotAvailable,
            BiometricResultRs::UserCanceled => Self::UserCanceled,
        }
    }
}

/// See [`bioauth::AuthState`]
#[derive(Clone, Debug, Eq, PartialEq, uniffi::Record)]
pub struct AuthState {
    pub availability: Option<bool>,
    pub in_flight: bool,
    pub last_result: Option<BiometricResult>,
}

impl From<&AuthStateRs> for AuthState {
    fn from(state: &AuthStateRs) -> Self {
        Self {
            availability: state.availability,
            in_flight: state.in_flight,
            last_result: state.last_result.map(BiometricResult::from),
        }
    }
}

/// See [`bioauth::BiometricKind`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, uniffi::Enum)]
pub enum BiometricKind {
    FaceId,
    TouchId,
    Fingerprint,
    Generic,
}

impl From<BiometricKindRs> for BiometricKind {
    fn from(kind: BiometricKindRs) -> Self {
        match kind {
            BiometricKindRs::FaceId => Self::FaceId,
            BiometricKindRs::TouchId => Self::TouchId,
            BiometricKindRs::Fingerprint => Self::Fingerprint,
            BiometricKindRs::Generic => Self::Generic,
        }
    }
}

impl From<BiometricKind> for BiometricKindRs {
    fn from(kind: BiometricKind) -> Self {
        match kind {
            BiometricKind::FaceId => Self::FaceId,
            BiometricKind::TouchId => Self::TouchId,
            BiometricKind::Fingerprint => Self::Fingerprint,
            BiometricKind::Generic => Self::Generic,
        }
    }
}

/// e.g. "Face ID"
#[uniffi::export]
pub fn biometric_kind_label(kind: BiometricKind) -> String {
    BiometricKindRs::from(kind).label().to_owned()
}

/// e.g. "Authenticate with Face ID"
#[uniffi::export]
pub fn biometric_button_label(kind: BiometricKind) -> String {
    BiometricKindRs::from(kind).button_label()
}

/// See [`bioauth::PromptConfig`]
#[derive(Clone, Debug, Eq, PartialEq, uniffi::Record)]
pub struct PromptConfig {
    pub title: String,
    pub subtitle: String,
    pub cancel_label: String,
}

impl From<PromptConfigRs> for PromptConfig {
    fn from(config: PromptConfigRs) -> Self {
        Self {
            title: config.title,
            subtitle: config.subtitle,
            cancel_label: config.cancel_label,
        }
    }
}

impl From<PromptConfig> for PromptConfigRs {
    fn from(config: PromptConfig) -> Self {
        Self {
            title: config.title,
            subtitle: config.subtitle,
            cancel_label: config.cancel_label,
        }
    }
}

#[uniffi::export]
pub fn default_prompt_config() -> PromptConfig {
    PromptConfigRs::default().into()
}

/// Parse localized prompt copy bundled with the app as TOML.
#[uniffi::export]
pub fn prompt_config_from_toml(
    toml: String,
) -> Result<PromptConfig, FfiError> {
    PromptConfigRs::from_toml_str(&toml)
        .map(PromptConfig::from)
        .map_err(FfiError::invalid_config)
}

/// The single-line reason string for iOS `localizedReason`.
#[uniffi::export]
pub fn prompt_reason(prompt: PromptConfig) -> String {
    PromptConfigRs::from(prompt).reason()
}

/// See [`bioauth::AuthView`]
#[derive(Clone, Debug, Eq, PartialEq, uniffi::Enum)]
pub enum AuthView {
    Checking,
    Ready {
        button_enabled: bool,
        message: Option<ResultMessage>,
    },
    Unavailable {
        message: String,
        hint: String,
    },
}

impl From<AuthViewRs> for AuthView {
    fn from(view: AuthViewRs) -> Self {
        match view {
            AuthViewRs::Checking => Self::Checking,
            AuthViewRs::Ready {
                button_enabled,
                message,
            } => Self::Ready {
                button_enabled,
                message: message.map(ResultMessage::from),
            },
            AuthViewRs::Unavailable { message, hint } =>
                Self::Unavailable { message, hint },
        }
    }
}

/// See [`bioauth::ResultMessage`]
#[derive(Clone, Debug, Eq, PartialEq, uniffi::Record)]
pub struct ResultMessage {
    pub text: String,
    pub tone: Tone,
}

impl From<ResultMessageRs> for ResultMessage {
    fn from(message: ResultMessageRs) -> Self {
        Self {
            text: message.text,
            tone: message.tone.into(),
        }
    }
}

/// See [`bioauth::Tone`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, uniffi::Enum)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl From<ToneRs> for Tone {
    fn from(tone: ToneRs) -> Self {
        match tone {
            ToneRs::Positive => Self::Positive,
            ToneRs::Negative => Self::Negative,
            ToneRs::Neutral => Self::Neutral,
        }
    }
}
