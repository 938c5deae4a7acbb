//! Acceptance evaluation — classify a probe report against a check's rules.
//!
//! Rules are ordered and the first match wins: transport failures dominate
//! all status-code logic, and a redirect received while `follow_redirects`
//! is disabled is reported before the generic accepted-list violation.

use crate::check::HealthCheck;
use crate::report::ProbeReport;

/// Evaluate a probe report against a check's acceptance rules.
///
/// Returns the human-readable failure reason, or `None` for a passing
/// probe. Pure: identical inputs always produce identical output.
pub fn evaluate(check: &HealthCheck, report: &ProbeReport) -> Option<String> {
    let Some(http) = &report.http else {
        return Some("No HTTP response was received.".to_string());
    };

    if let Some(error) = &http.error {
        return Some(error.clone());
    }

    let Some(response) = &http.response else {
        return Some("No HTTP response was received.".to_string());
    };

    let Some(status_code) = response.status_code else {
        return Some("No status code was received.".to_string());
    };

    if !check.follow_redirects && (300..400).contains(&status_code) {
        return Some("Redirect was received but follow_redirects is disabled.".to_string());
    }

    if !check
        .accepted_status_codes
        .iter()
        .any(|accepted| accepted == &status_code.to_string())
    {
        return Some(format!(
            "Status code '{status_code}' was not in the accepted list: {}",
            check.accepted_status_codes.join(", ")
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::AlarmState;
    use crate::report::{HttpOutcome, HttpResponseData};

    fn test_check(follow_redirects: bool, accepted: &[&str]) -> HealthCheck {
        HealthCheck {
            id: "hc-1".to_string(),
            user_id: "user-1".to_string(),
            name: None,
            url: "https://example.com/health".to_string(),
            http_method: "GET".to_string(),
            request_body: None,
            request_headers: None,
            content_type: None,
            follow_redirects,
            accepted_status_codes: accepted.iter().map(|s| s.to_string()).collect(),
            auth_type: None,
            auth: None,
            alarm_state: AlarmState::Ok,
            created_at: 1000,
            created_by: "user-1".to_string(),
            updated_at: 1000,
            updated_by: "user-1".to_string(),
        }
    }

    fn response_report(status_code: u16) -> ProbeReport {
        ProbeReport::response(
            "hc-1",
            HttpResponseData {
                status_code: Some(status_code),
                ..Default::default()
            },
        )
    }

    #[test]
    fn missing_http_section_is_no_response() {
        let check = test_check(true, &["200"]);
        let report = ProbeReport {
            health_check_id: "hc-1".to_string(),
            http: None,
        };
        assert_eq!(
            evaluate(&check, &report).as_deref(),
            Some("No HTTP response was received.")
        );
    }

    #[test]
    fn transport_error_is_verbatim() {
        let check = test_check(true, &["200"]);
        let report = ProbeReport::transport_failure("hc-1", "dns error: no such host");
        assert_eq!(
            evaluate(&check, &report).as_deref(),
            Some("dns error: no such host")
        );
    }

    #[test]
    fn empty_outcome_is_no_response() {
        let check = test_check(true, &["200"]);
        let report = ProbeReport {
            health_check_id: "hc-1".to_string(),
            http: Some(HttpOutcome::default()),
        };
        assert_eq!(
            evaluate(&check, &report).as_deref(),
            Some("No HTTP response was received.")
        );
    }

    #[test]
    fn missing_status_code_is_reported() {
        let check = test_check(true, &["200"]);
        let report = ProbeReport::response("hc-1", HttpResponseData::default());
        assert_eq!(
            evaluate(&check, &report).as_deref(),
            Some("No status code was received.")
        );
    }

    #[test]
    fn redirect_with_follow_disabled_fails() {
        let check = test_check(false, &["200"]);
        for code in [300u16, 301, 302, 307, 399] {
            let reason = evaluate(&check, &response_report(code)).unwrap();
            assert!(reason.contains("Redirect was received"), "code {code}: {reason}");
        }
    }

    #[test]
    fn redirect_rule_wins_even_when_code_is_accepted() {
        // 302 is in the accepted list, but follow_redirects is disabled.
        let check = test_check(false, &["200", "302"]);
        assert_eq!(
            evaluate(&check, &response_report(302)).as_deref(),
            Some("Redirect was received but follow_redirects is disabled.")
        );
    }

    #[test]
    fn redirect_with_follow_enabled_uses_accepted_list() {
        let check = test_check(true, &["302"]);
        assert!(evaluate(&check, &response_report(302)).is_none());
    }

    #[test]
    fn unaccepted_status_lists_code_and_accepted_set() {
        let check = test_check(true, &["200", "201"]);
        assert_eq!(
            evaluate(&check, &response_report(404)).as_deref(),
            Some("Status code '404' was not in the accepted list: 200, 201")
        );
    }

    #[test]
    fn accepted_status_passes() {
        let check = test_check(true, &["200", "201"]);
        assert!(evaluate(&check, &response_report(200)).is_none());
        assert!(evaluate(&check, &response_report(201)).is_none());
    }

    #[test]
    fn boundary_400_is_not_a_redirect() {
        let check = test_check(false, &["400"]);
        assert!(evaluate(&check, &response_report(400)).is_none());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let check = test_check(true, &["200"]);
        let report = response_report(503);
        assert_eq!(evaluate(&check, &report), evaluate(&check, &report));
    }
}
