use secrecy::ExposeSecret;
use serde::Serialize;
use threadlink_core::config::{AppConfig, LoadOptions};

use crate::commands::{escape_json, CommandResult, CONFIG_EXIT_CODE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { CONFIG_EXIT_CODE } else { 0 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult::output(exit_code, output);
    }

    CommandResult::output(exit_code, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_slack_token(&config));
            checks.push(check_tracker_url(&config));
            checks.push(check_signature_verification(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slack_token_shape", "tracker_url", "signature_verification"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_slack_token(config: &AppConfig) -> DoctorCheck {
    let token = config.slack.bot_token.expose_secret();
    let well_formed = token.starts_with("xoxb-") && token.len() > "xoxb-".len();
    DoctorCheck {
        name: "slack_token_shape",
        status: if well_formed { CheckStatus::Pass } else { CheckStatus::Fail },
        details: if well_formed {
            "bot token has the `xoxb-` shape".to_string()
        } else {
            "bot token must be a non-empty `xoxb-` token".to_string()
        },
    }
}

fn check_tracker_url(config: &AppConfig) -> DoctorCheck {
    let base_url = config.jira.base_url.trim_end_matches('/');
    let host = base_url
        .strip_prefix("https://")
        .or_else(|| base_url.strip_prefix("http://"))
        .unwrap_or_default();

    if host.is_empty() {
        return DoctorCheck {
            name: "tracker_url",
            status: CheckStatus::Fail,
            details: format!("`{base_url}` has no host"),
        };
    }

    if base_url.starts_with("http://") {
        return DoctorCheck {
            name: "tracker_url",
            status: CheckStatus::Warn,
            details: format!("`{base_url}` is plain http; credentials travel unencrypted"),
        };
    }

    DoctorCheck {
        name: "tracker_url",
        status: CheckStatus::Pass,
        details: format!("issues will be searched at `{base_url}/rest/api/2/search`"),
    }
}

fn check_signature_verification(config: &AppConfig) -> DoctorCheck {
    match &config.slack.signing_secret {
        Some(_) => DoctorCheck {
            name: "signature_verification",
            status: CheckStatus::Pass,
            details: format!(
                "webhook signatures verified (max age {}s)",
                config.slack.signature_max_age_secs
            ),
        },
        None => DoctorCheck {
            name: "signature_verification",
            status: CheckStatus::Warn,
            details: "slack.signing_secret is unset; webhook signatures are not verified"
                .to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
