//! Well-known auth log action and result constants, plus the user-agent
//! classification stored alongside each entry.
//!
//! Stored in `auth_logs.action` / `auth_logs.result` and used by the auth
//! handlers and the admin log viewer filters.

pub const ACTION_LOGIN: &str = "login";
pub const ACTION_LOGOUT: &str = "logout";
pub const ACTION_REGISTER: &str = "register";

pub const RESULT_SUCCESS: &str = "success";
pub const RESULT_FAILURE: &str = "failure";

const UNKNOWN: &str = "Unknown";

pub fn is_valid_action(action: &str) -> bool {
    matches!(action, ACTION_LOGIN | ACTION_LOGOUT | ACTION_REGISTER)
}

pub fn is_valid_result(result: &str) -> bool {
    matches!(result, RESULT_SUCCESS | RESULT_FAILURE)
}

/// Coarse browser family from a `User-Agent` header.
///
/// Order matters: Edge and Chrome both advertise `Chrome`, and Chrome
/// advertises `Safari`.
pub fn browser_family(user_agent: &str) -> &'static str {
    let ua = user_agent;
    if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("Chrome") {
        "Chrome"
    } else if ua.contains("Safari") {
        "Safari"
    } else if ua.contains("MSIE") || ua.contains("Trident/") {
        "Internet Explorer"
    } else {
        UNKNOWN
    }
}

/// Coarse operating system from a `User-Agent` header.
pub fn operating_system(user_agent: &str) -> &'static str {
    let ua = user_agent;
    if ua.contains("Windows NT") {
        "Windows"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        "iOS"
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "MacOS"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("X11") || ua.contains("Linux") {
        "Linux"
    } else {
        UNKNOWN
    }
}
