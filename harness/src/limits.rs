//! Process descriptor-limit handling
//!
//! The 10k-connection scenarios need far more file descriptors than the
//! usual soft limit allows, on both the server and the client side.

use tracing::{info, warn};

/// Raise the open-file-descriptor soft limit to the hard ceiling.
///
/// Best-effort: a failure is reported but never fatal, since the smaller
/// scenarios still run under the default limit.
pub fn raise_nofile_limit() {
    match rlimit::Resource::NOFILE.get() {
        Ok((_, hard)) => {
            if let Err(e) = rlimit::Resource::NOFILE.set(hard, hard) {
                warn!("could not raise file descriptor limit: {e}");
            }
        }
        Err(e) => warn!("could not read file descriptor limit: {e}"),
    }

    if let Ok((soft, _)) = rlimit::Resource::NOFILE.get() {
        info!("this process can open {soft} file descriptors simultaneously");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_nofile_limit_is_best_effort() {
        // Must never panic or error out, whatever the environment allows.
        raise_nofile_limit();
        let (soft, hard) = rlimit::Resource::NOFILE.get().unwrap();
        assert!(soft <= hard);
    }
}
