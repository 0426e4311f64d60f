//! Browser and OS detection for platform-specific behavior.

/// What the host browser is, as far as input handling cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Platform {
    pub ios: bool,
    pub mac: bool,
    pub android: bool,
    pub chrome: bool,
    pub safari: bool,
    pub gecko: bool,
    pub mobile: bool,
}

impl Platform {
    /// Classify a `navigator.userAgent` string.
    pub fn from_user_agent(ua: &str) -> Self {
        let ios = ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod");
        let android = ua.contains("Android");
        let chrome = ua.contains("Chrome/") || ua.contains("CriOS/");
        Self {
            ios,
            mac: ua.contains("Macintosh") || ios,
            android,
            chrome,
            safari: ua.contains("Safari/") && !chrome && !android,
            gecko: ua.contains("Gecko/") && ua.contains("Firefox/"),
            mobile: ios || android || ua.contains("Mobile"),
        }
    }
}

/// Detect the current platform.
pub fn platform() -> Platform {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .map(|ua| Platform::from_user_agent(&ua))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_chrome() {
        let p = Platform::from_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36",
        );
        assert!(p.mac && p.chrome);
        assert!(!p.safari && !p.gecko && !p.mobile);
    }

    #[test]
    fn android_firefox() {
        let p = Platform::from_user_agent(
            "Mozilla/5.0 (Android 14; Mobile; rv:126.0) Gecko/126.0 Firefox/126.0",
        );
        assert!(p.android && p.gecko && p.mobile);
        assert!(!p.mac);
    }
}
