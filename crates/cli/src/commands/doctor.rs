use greenmatch_core::config::{AppConfig, LoadOptions};
use greenmatch_core::matching::CropMatchService;
use greenmatch_identify::build_providers;
use serde::Serialize;

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

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.push(check_provider_credentials(&config));
            checks.push(check_alias_table(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["provider_credentials", "alias_table"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_fail =
        checks.iter().any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let any_warn = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let (overall_status, summary) = if any_fail {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if any_warn {
        (CheckStatus::Warn, "doctor: ready with warnings")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_provider_credentials(config: &AppConfig) -> DoctorCheck {
    let usable: Vec<&str> = build_providers(config).iter().map(|slot| slot.kind().id()).collect();
    let missing: Vec<&str> =
        config.providers_missing_credentials().iter().map(|provider| provider.id()).collect();

    let (status, details) = if usable.is_empty() {
        (
            CheckStatus::Fail,
            "no identification provider has an API key; only manual entry is available"
                .to_string(),
        )
    } else if !missing.is_empty() {
        (
            CheckStatus::Warn,
            format!("using {}; missing API key for {}", usable.join(" -> "), missing.join(", ")),
        )
    } else {
        (CheckStatus::Pass, format!("provider order: {}", usable.join(" -> ")))
    };

    DoctorCheck { name: "provider_credentials", status, details }
}

fn check_alias_table(config: &AppConfig) -> DoctorCheck {
    match CropMatchService::from_config(&config.matching) {
        Ok(service) => DoctorCheck {
            name: "alias_table",
            status: CheckStatus::Pass,
            details: format!(
                "{} alias entries loaded, threshold {}",
                service.matcher().aliases().snapshot().len(),
                service.threshold()
            ),
        },
        Err(error) => {
            DoctorCheck { name: "alias_table", status: CheckStatus::Fail, details: error.to_string() }
        }
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

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
