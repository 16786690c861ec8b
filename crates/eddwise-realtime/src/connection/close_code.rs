//! Human-readable reasons for WebSocket close codes (RFC 6455 §7.4.1).

/// Describes a close code.
///
/// `detail` is the reason text supplied with the close; it is only used for
/// 1010, where it lists the extensions the server failed to negotiate.
pub fn describe(code: Option<u16>, detail: &str) -> String {
    let reason = match code {
        Some(1000) => {
            "Normal closure, meaning that the purpose for which the connection was established has been fulfilled."
        }
        Some(1001) => {
            "An endpoint is \"going away\", such as a server going down or a browser having navigated away from a page."
        }
        Some(1002) => "An endpoint is terminating the connection due to a protocol error",
        Some(1003) => {
            "An endpoint is terminating the connection because it has received a type of data it cannot accept (e.g., an endpoint that understands only text data MAY send this if it receives a binary message)."
        }
        Some(1004) => "Reserved. The specific meaning might be defined in the future.",
        Some(1005) => "No status code was actually present.",
        Some(1006) => {
            "The connection was closed abnormally, e.g., without sending or receiving a Close control frame"
        }
        Some(1007) => {
            "An endpoint is terminating the connection because it has received data within a message that was not consistent with the type of the message (e.g., non-UTF-8 data within a text message)."
        }
        Some(1008) => {
            "An endpoint is terminating the connection because it has received a message that \"violates its policy\". This reason is given either if there is no other suitable reason, or if there is a need to hide specific details about the policy."
        }
        Some(1009) => {
            "An endpoint is terminating the connection because it has received a message that is too big for it to process."
        }
        Some(1010) => {
            return format!(
                "An endpoint (client) is terminating the connection because it has expected the server to negotiate one or more extension, but the server didn't return them in the response message of the WebSocket handshake. Specifically, the extensions that are needed are: {detail}"
            );
        }
        Some(1011) => {
            "A server is terminating the connection because it encountered an unexpected condition that prevented it from fulfilling the request."
        }
        Some(1015) => {
            "The connection was closed due to a failure to perform a TLS handshake (e.g., the server certificate can't be verified)."
        }
        _ => "Unknown reason",
    };
    reason.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert!(describe(Some(1000), "").starts_with("Normal closure"));
        assert!(describe(Some(1002), "").contains("protocol error"));
        assert!(describe(Some(1009), "").contains("too big"));
        assert!(describe(Some(1015), "").contains("TLS handshake"));
    }

    #[test]
    fn test_extension_code_appends_detail() {
        assert!(describe(Some(1010), "permessage-deflate").ends_with("permessage-deflate"));
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(describe(Some(4000), ""), "Unknown reason");
        assert_eq!(describe(Some(1012), ""), "Unknown reason");
        assert_eq!(describe(None, "io error"), "Unknown reason");
    }
}
