//! Integer status codes of the host callback contract.

use core::ffi::c_int;

use strum_macros::{Display, EnumString};

use crate::error::PluginError;

/// Result code returned to the host from every entry point.
///
/// The discriminants are the host's wire contract (`FLB_ERROR`, `FLB_OK`,
/// `FLB_RETRY`) and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum Status {
    /// The call failed; the host should not retry it.
    Error = 0,
    /// The call succeeded.
    #[default]
    Ok = 1,
    /// The call cannot be served yet; the host may retry later.
    Retry = 2,
}

impl Status {
    /// Collapse a bridge result into the status code reported to the host.
    ///
    /// A missing registration is the only retryable failure; everything
    /// else is a hard error for this call.
    pub fn from_result<T>(res: &Result<T, PluginError>) -> Self {
        match res {
            Ok(_) => Status::Ok,
            Err(err) => Status::from_error(err),
        }
    }

    /// The status code for a failed call.
    pub fn from_error(err: &PluginError) -> Self {
        match err {
            PluginError::NothingRegistered | PluginError::NotRegistered(_) => Status::Retry,
            _ => Status::Error,
        }
    }

    /// The raw integer handed across the C boundary.
    pub fn code(self) -> c_int {
        self as c_int
    }
}

impl From<Status> for c_int {
    fn from(status: Status) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginRole;
    use std::str::FromStr;

    #[test]
    fn test_status_codes_match_host_contract() {
        assert_eq!(Status::Error.code(), 0);
        assert_eq!(Status::Ok.code(), 1);
        assert_eq!(Status::Retry.code(), 2);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Ok.to_string(), "ok");
        assert_eq!(Status::Error.to_string(), "error");
        assert_eq!(Status::Retry.to_string(), "retry");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(Status::from_str("ok").unwrap(), Status::Ok);
        assert_eq!(Status::from_str("retry").unwrap(), Status::Retry);
        assert!(Status::from_str("bogus").is_err());
    }

    #[test]
    fn test_from_result_ok() {
        let res: Result<(), PluginError> = Ok(());
        assert_eq!(Status::from_result(&res), Status::Ok);
    }

    #[test]
    fn test_from_result_missing_registration_is_retry() {
        let res: Result<(), PluginError> = Err(PluginError::NotRegistered(PluginRole::Input));
        assert_eq!(Status::from_result(&res), Status::Retry);
    }

    #[test]
    fn test_from_result_other_errors_are_error() {
        let res: Result<(), PluginError> = Err(PluginError::Custom("boom".to_string()));
        assert_eq!(Status::from_result(&res), Status::Error);
    }

    #[test]
    fn test_default_is_ok() {
        assert_eq!(Status::default(), Status::Ok);
    }
}
