#[cfg(test)]
mod worker_tests {
    use crate::{edge_cache_properties, failure_summary};
    use pagesource_core::{ApiReply, FetchError, InvalidUrlReason, ServiceConfig, validate_target};
    use worker::PolishConfig;

    #[test]
    fn test_edge_cache_follows_cache_max_age() {
        let props = edge_cache_properties(ServiceConfig::default().cache_max_age);
        assert_eq!(props.cache_ttl, Some(300));
        assert_eq!(props.cache_everything, Some(true));
        assert_eq!(props.scrape_shield, Some(false));
        assert!(matches!(props.polish, Some(PolishConfig::Lossy)));

        assert_eq!(edge_cache_properties(60).cache_ttl, Some(60));
    }

    #[test]
    fn test_failure_summary_success_is_silent() {
        let reply = ApiReply {
            status: 200,
            headers: vec![],
            body: Some(serde_json::json!({"success": true})),
        };
        assert_eq!(failure_summary(&reply), None);
    }

    #[test]
    fn test_failure_summary_uses_error_field() {
        let reply = ApiReply {
            status: 408,
            headers: vec![],
            body: Some(serde_json::json!({"error": "Request timeout (15 seconds)"})),
        };
        assert_eq!(
            failure_summary(&reply).as_deref(),
            Some("408 Request timeout (15 seconds)")
        );
    }

    #[test]
    fn test_failure_summary_without_body() {
        let reply = ApiReply {
            status: 404,
            headers: vec![],
            body: None,
        };
        assert_eq!(
            failure_summary(&reply).as_deref(),
            Some("404 no error message")
        );
    }

    /// Common malicious URL patterns must never reach the Workers fetch.
    #[test]
    fn test_malicious_url_defense() {
        let cases = [
            // Script injection attempts
            ("javascript:alert('xss')", InvalidUrlReason::UnsupportedProtocol),
            ("javascript:window.location='evil.com'", InvalidUrlReason::UnsupportedProtocol),
            // Local file access attempts
            ("file:///etc/passwd", InvalidUrlReason::UnsupportedProtocol),
            ("file:///proc/self/environ", InvalidUrlReason::UnsupportedProtocol),
            // Data URLs
            ("data:text/html,<script>alert('xss')</script>", InvalidUrlReason::UnsupportedProtocol),
            ("data:application/javascript,alert('pwned')", InvalidUrlReason::UnsupportedProtocol),
            // Other protocols
            ("ftp://secret.server.com/internal", InvalidUrlReason::UnsupportedProtocol),
            ("gopher://internal.network/", InvalidUrlReason::UnsupportedProtocol),
            ("wss://internal.network/socket", InvalidUrlReason::UnsupportedProtocol),
            ("httpx://evil.com", InvalidUrlReason::UnsupportedProtocol),
            // Loopback
            ("http://127.0.0.1:6379", InvalidUrlReason::PrivateAddress),
            ("http://[::1]:5432", InvalidUrlReason::PrivateAddress),
            ("https://evil.com@127.0.0.1", InvalidUrlReason::PrivateAddress),
            // Private networks
            ("http://192.168.1.1", InvalidUrlReason::PrivateAddress),
            ("https://10.0.0.1", InvalidUrlReason::PrivateAddress),
            ("http://172.17.0.1", InvalidUrlReason::PrivateAddress),
            ("http://[fd00::beef]/", InvalidUrlReason::PrivateAddress),
        ];

        for (url, expected) in cases {
            match validate_target(url) {
                Err(FetchError::InvalidUrl { reason, .. }) => {
                    assert_eq!(reason, expected, "wrong reason for {url}")
                }
                other => panic!("{url} should be rejected, got {other:?}"),
            }
        }
    }
}
