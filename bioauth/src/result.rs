//! The outcome vocabulary of a biometric challenge.
//!
//! Native providers speak their own dialects: Android reports
//! `BiometricPrompt.ERROR_*` integer codes, iOS reports `LAError.Code`
//! integers, and older bridges just pass a string across the FFI. Each dialect
//! is first decoded into a [`NativeOutcome`], which is then collapsed into the
//! four-valued [`BiometricResult`] the rest of the app deals with.
//!
//! Both steps are total: every code decodes to some [`NativeOutcome`] and every
//! [`NativeOutcome`] maps to exactly one [`BiometricResult`]. Anything we don't
//! recognize fails closed as [`BiometricResult::Error`].

use std::fmt;

#[cfg(test)]
use proptest_derive::Arbitrary;
use strum::{EnumIter, IntoStaticStr};

/// The terminal outcome of a single biometric challenge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, EnumIter, IntoStaticStr)]
#[cfg_attr(test, derive(Arbitrary))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BiometricResult {
    /// The user verified successfully.
    Success,
    /// Catch-all failure: lockout, internal errors, unknown codes. The caller
    /// may retry.
    Error,
    /// No hardware, nothing enrolled, or the sensor is temporarily
    /// unavailable. Retrying won't help without changes to the device.
    NotAvailable,
    /// The user dismissed the prompt.
    UserCanceled,
}

/// A native challenge outcome, decoded from a platform-specific code.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum NativeOutcome {
    Success,
    /// The user canceled the prompt (back gesture, tapping outside, etc).
    UserCanceled,
    /// The user pressed the prompt's negative ("Cancel") button.
    NegativeButton,
    /// The system canceled the prompt, e.g. another app came to the
    /// foreground.
    SystemCanceled,
    /// The device has no biometric hardware.
    NoHardware,
    /// The hardware is present but the user has no biometrics enrolled.
    NotEnrolled,
    /// The hardware is present but currently unusable.
    HardwareUnavailable,
    /// Too many failed attempts; biometrics are locked out.
    Lockout,
    /// A known, generic failure (timeouts, vendor errors, ...).
    GenericError,
    /// A code we don't recognize. Contains a printable form of the raw code.
    Unknown(String),
}

/// `BiometricPrompt.ERROR_*` constants from `androidx.biometric`.
pub mod android {
    pub const ERROR_HW_UNAVAILABLE: i32 = 1;
    pub const ERROR_UNABLE_TO_PROCESS: i32 = 2;
    pub const ERROR_TIMEOUT: i32 = 3;
    pub const ERROR_NO_SPACE: i32 = 4;
    pub const ERROR_CANCELED: i32 = 5;
    pub const ERROR_LOCKOUT: i32 = 7;
    pub const ERROR_VENDOR: i32 = 8;
    pub const ERROR_LOCKOUT_PERMANENT: i32 = 9;
    pub const ERROR_USER_CANCELED: i32 = 10;
    pub const ERROR_NO_BIOMETRICS: i32 = 11;
    pub const ERROR_HW_NOT_PRESENT: i32 = 12;
    pub const ERROR_NEGATIVE_BUTTON: i32 = 13;
    pub const ERROR_NO_DEVICE_CREDENTIAL: i32 = 14;
    pub const ERROR_SECURITY_UPDATE_REQUIRED: i32 = 15;
}

/// `LAError.Code` raw values from `LocalAuthentication`.
pub mod ios {
    pub const AUTHENTICATION_FAILED: i64 = -1;
    pub const USER_CANCEL: i64 = -2;
    pub const USER_FALLBACK: i64 = -3;
    pub const SYSTEM_CANCEL: i64 = -4;
    pub const PASSCODE_NOT_SET: i64 = -5;
    pub const BIOMETRY_NOT_AVAILABLE: i64 = -6;
    pub const BIOMETRY_NOT_ENROLLED: i64 = -7;
    pub const BIOMETRY_LOCKOUT: i64 = -8;
    pub const APP_CANCEL: i64 = -9;
    pub const INVALID_CONTEXT: i64 = -10;
    pub const BIOMETRY_NOT_PAIRED: i64 = -11;
    pub const BIOMETRY_DISCONNECTED: i64 = -12;
    pub const NOT_INTERACTIVE: i64 = -1004;
}

// --- impl BiometricResult --- //

impl BiometricResult {
    /// The stable string code, e.g. `"USER_CANCELED"`.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for BiometricResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&NativeOutcome> for BiometricResult {
    fn from(outcome: &NativeOutcome) -> Self {
        match outcome {
            NativeOutcome::Success => Self::Success,
            NativeOutcome::UserCanceled
            | NativeOutcome::NegativeButton
            | NativeOutcome::SystemCanceled => Self::UserCanceled,
            NativeOutcome::NoHardware
            | NativeOutcome::NotEnrolled
            | NativeOutcome::HardwareUnavailable => Self::NotAvailable,
            NativeOutcome::Lockout
            | NativeOutcome::GenericError
            | NativeOutcome::Unknown(_) => Self::Error,
        }
    }
}

impl From<NativeOutcome> for BiometricResult {
    #[inline]
    fn from(outcome: NativeOutcome) -> Self {
        Self::from(&outcome)
    }
}

// --- impl NativeOutcome --- //

impl NativeOutcome {
    /// Decode an `onAuthenticationError` code from Android's `BiometricPrompt`.
    pub fn from_android_error(code: i32) -> Self {
        use android::*;
        match code {
            ERROR_USER_CANCELED => Self::UserCanceled,
            ERROR_NEGATIVE_BUTTON => Self::NegativeButton,
            ERROR_CANCELED => Self::SystemCanceled,
            ERROR_HW_NOT_PRESENT => Self::NoHardware,
            ERROR_NO_BIOMETRICS => Self::NotEnrolled,
            ERROR_HW_UNAVAILABLE => Self::HardwareUnavailable,
            ERROR_LOCKOUT | ERROR_LOCKOUT_PERMANENT => Self::Lockout,
            ERROR_UNABLE_TO_PROCESS
            | ERROR_TIMEOUT
            | ERROR_NO_SPACE
            | ERROR_VENDOR
            | ERROR_NO_DEVICE_CREDENTIAL
            | ERROR_SECURITY_UPDATE_REQUIRED => Self::GenericError,
            _ => Self::Unknown(format!("android:{code}")),
        }
    }

    /// Decode an `LAError.Code` raw value from iOS `LAContext.evaluatePolicy`.
    pub fn from_ios_error(code: i64) -> Self {
        use ios::*;
        match code {
            USER_CANCEL => Self::UserCanceled,
            SYSTEM_CANCEL => Self::SystemCanceled,
            BIOMETRY_NOT_AVAILABLE
            | BIOMETRY_NOT_PAIRED
            | BIOMETRY_DISCONNECTED => Self::HardwareUnavailable,
            BIOMETRY_NOT_ENROLLED => Self::NotEnrolled,
            BIOMETRY_LOCKOUT => Self::Lockout,
            // We don't implement a passcode fallback, so these are all plain
            // failures from our point of view.
            AUTHENTICATION_FAILED
            | USER_FALLBACK
            | PASSCODE_NOT_SET
            | APP_CANCEL
            | INVALID_CONTEXT
            | NOT_INTERACTIVE => Self::GenericError,
            _ => Self::Unknown(format!("ios:{code}")),
        }
    }

    /// Decode a string code as sent by a thin native bridge, e.g. `"SUCCESS"`.
    /// Matching is exact; anything else is [`NativeOutcome::Unknown`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "SUCCESS" => Self::Success,
            "USER_CANCELED" => Self::UserCanceled,
            "NOT_AVAILABLE" => Self::HardwareUnavailable,
            "ERROR" => Self::GenericError,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// The normalized [`BiometricResult`] for this outcome.
    #[inline]
    pub fn result(&self) -> BiometricResult {
        BiometricResult::from(self)
    }
}
