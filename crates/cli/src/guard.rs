//! Refuse to run with elevated privileges.
//!
//! Pruning deletes files and rewrites modes and owners in place; running it
//! as root would leave root-owned files in the operator's tree.

use std::ffi::OsString;

use thiserror::Error;

/// Environment variables set by privilege-escalation tools.
const ESCALATION_VARS: &[&str] = &["SUDO_USER", "SUDO_UID", "DOAS_USER"];

#[derive(Debug, Error)]
#[error("refusing to run with elevated privileges ({reason}); run as a regular user")]
pub struct PrivilegedRun {
    pub reason: String,
}

/// Fail when the process runs as root or under sudo/doas.
pub fn check_privileges() -> Result<(), PrivilegedRun> {
    match privileged_reason(effective_uid(), |name| std::env::var_os(name)) {
        Some(reason) => Err(PrivilegedRun { reason }),
        None => Ok(()),
    }
}

fn privileged_reason<F>(euid: Option<u32>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<OsString>,
{
    if euid == Some(0) {
        return Some("effective uid is 0".into());
    }
    ESCALATION_VARS
        .iter()
        .copied()
        .find(|name| env(name).is_some())
        .map(|name| format!("{} is set", name))
}

#[cfg(unix)]
fn effective_uid() -> Option<u32> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    Some(unsafe { libc::geteuid() })
}

#[cfg(not(unix))]
fn effective_uid() -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_uid_refused() {
        let reason = privileged_reason(Some(0), |_| None).unwrap();
        assert!(reason.contains("uid is 0"));
    }

    #[test]
    fn test_sudo_env_refused() {
        let reason = privileged_reason(Some(1000), |name| {
            (name == "SUDO_UID").then(|| OsString::from("1000"))
        })
        .unwrap();
        assert_eq!(reason, "SUDO_UID is set");

        assert!(privileged_reason(None, |name| {
            (name == "DOAS_USER").then(|| OsString::from("op"))
        })
        .is_some());
    }

    #[test]
    fn test_regular_user_allowed() {
        assert!(privileged_reason(Some(1000), |_| None).is_none());
        assert!(privileged_reason(None, |_| None).is_none());
    }
}
