//! Session options for wide-column clusters.
//!
//! These live here rather than in the driver crate so that the activation
//! signature is the same whether or not the driver is compiled in.

use std::time::Duration;

use crate::error::{GivemedataError, GivemedataResult};

/// Session options applied when a cluster is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Time allowed to open each connection.
    pub connect_timeout: Duration,
    /// Time allowed for each request, including retries.
    pub request_timeout: Duration,
    /// Rows fetched per page.
    pub page_size: i32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(60),
            page_size: 5000,
        }
    }
}

impl ClusterOptions {
    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the page size.
    ///
    /// Values below 1 are rejected by [`validate`](Self::validate) when the
    /// options are used.
    #[must_use]
    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Check that the options can be handed to the driver.
    pub fn validate(&self) -> GivemedataResult<()> {
        if self.page_size < 1 {
            return Err(GivemedataError::invalid_config(
                "page_size",
                format!("must be at least 1, got {}", self.page_size),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClusterOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_secs(20));
        assert_eq!(options.request_timeout, Duration::from_secs(60));
        assert_eq!(options.page_size, 5000);
    }

    #[test]
    fn test_builder() {
        let options = ClusterOptions::default()
            .page_size(100)
            .request_timeout(Duration::from_secs(5));
        assert_eq!(options.page_size, 100);
        assert_eq!(options.request_timeout, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_validate_page_size() {
        assert!(ClusterOptions::default().validate().is_ok());
        assert!(ClusterOptions::default().page_size(1).validate().is_ok());

        for page_size in [0, -1, i32::MIN] {
            let err = ClusterOptions::default().page_size(page_size).validate().unwrap_err();
            assert!(matches!(err, GivemedataError::InvalidConfig { .. }));
            assert!(err.to_string().contains("page_size"));
        }
    }
}
