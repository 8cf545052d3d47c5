//! Check definitions and status-code classification.
//!
//! A `CheckDefinition` is the static description of one check kind: the
//! endpoint path appended to `{host}{cluster}`, the fixed JSON request
//! body, and the rule that maps response status codes to an outcome.
//! Definitions are compile-time constants, never mutated at runtime.

/// HTTP method for a check request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// How a response status code is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The endpoint answered as expected; log and move on.
    Success,
    /// The endpoint is failing; a notification is sent.
    Failure,
    /// Neither success nor failure; logged at info level and ignored.
    Neutral,
}

/// Maps status codes to a [`Classification`].
///
/// Codes in neither list are neutral.
#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    success: &'static [u16],
    failure: &'static [u16],
}

impl StatusRule {
    /// The default rule: 200 is success, the gateway/server error family
    /// {500, 502, 503, 504} is failure.
    pub const DEFAULT: StatusRule = StatusRule {
        success: &[200],
        failure: &[500, 502, 503, 504],
    };

    pub const fn new(success: &'static [u16], failure: &'static [u16]) -> Self {
        Self { success, failure }
    }

    /// Classify a response status code.
    pub fn classify(&self, status: u16) -> Classification {
        if self.success.contains(&status) {
            Classification::Success
        } else if self.failure.contains(&status) {
            Classification::Failure
        } else {
            Classification::Neutral
        }
    }
}

/// Static description of one check kind.
#[derive(Debug, Clone, Copy)]
pub struct CheckDefinition {
    /// Short name used in logs (e.g. `tableList`).
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path appended to `{host}{cluster}`; also the endpoint name in
    /// notification payloads.
    pub path: &'static str,
    /// Fixed JSON request body.
    pub body: &'static str,
    pub rule: StatusRule,
}

/// The `tableListv6` viewer check.
pub const TABLE_LIST: CheckDefinition = CheckDefinition {
    name: "tableList",
    method: HttpMethod::Post,
    path: "viewer/viewer/tableListv6",
    body: r#"{"sort":[{"columnID":11,"order":"desc"}],"filter":{"search":"","hasPhotoTags":0},"cursor":{"n":20}}"#,
    rule: StatusRule::DEFAULT,
};

/// The `getImt` viewer check.
pub const GET_IMT: CheckDefinition = CheckDefinition {
    name: "getImt",
    method: HttpMethod::Post,
    path: "viewer/viewer/getImt",
    body: r#"{"nmID":265938554}"#,
    rule: StatusRule::DEFAULT,
};

/// All check kinds the scheduler runs.
pub fn builtin_checks() -> Vec<CheckDefinition> {
    vec![TABLE_LIST, GET_IMT]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_status_is_success() {
        assert_eq!(StatusRule::DEFAULT.classify(200), Classification::Success);
    }

    #[test]
    fn server_error_family_is_failure() {
        for status in [500, 502, 503, 504] {
            assert_eq!(
                StatusRule::DEFAULT.classify(status),
                Classification::Failure,
                "status {status} should be a failure"
            );
        }
    }

    #[test]
    fn other_statuses_are_neutral() {
        for status in [201, 204, 301, 302, 400, 401, 404, 418, 501] {
            assert_eq!(
                StatusRule::DEFAULT.classify(status),
                Classification::Neutral,
                "status {status} should be neutral"
            );
        }
    }

    #[test]
    fn builtin_checks_cover_both_viewer_endpoints() {
        let checks = builtin_checks();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].name, "tableList");
        assert_eq!(checks[0].path, "viewer/viewer/tableListv6");
        assert_eq!(checks[1].name, "getImt");
        assert_eq!(checks[1].path, "viewer/viewer/getImt");
        for check in checks {
            assert_eq!(check.method, HttpMethod::Post);
            assert!(check.body.starts_with('{'), "body must be a JSON object");
        }
    }

    #[test]
    fn custom_rule_overrides_default() {
        let rule = StatusRule::new(&[204], &[404]);
        assert_eq!(rule.classify(204), Classification::Success);
        assert_eq!(rule.classify(404), Classification::Failure);
        assert_eq!(rule.classify(200), Classification::Neutral);
    }
}
