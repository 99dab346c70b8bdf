use chrono::{DateTime, Datelike, Timelike, Utc};
use log::{debug, info, warn};

use crate::model::{ExecConfig, MainConfig, ScheduleConfig};
use crate::rotate_error::RotateError;
use crate::{create_rotate_error, rotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Run,
    HourMismatch,
    DayMismatch,
}

/// Pure schedule check: does `now` fall into the configured window?
/// The comparison happens on the wall clock of the configured timezone.
pub fn evaluate(schedule: &ScheduleConfig, now: DateTime<Utc>) -> GateDecision {
    let local = now.with_timezone(&schedule.t_timezone);
    if local.hour() != schedule.t_hour {
        return GateDecision::HourMismatch;
    }
    if !schedule.t_days.contains(&local.day()) {
        return GateDecision::DayMismatch;
    }
    GateDecision::Run
}

/// One gate cycle. Mismatches are the expected no-op path and exit 0,
/// a matching window triggers the rotation step exactly once and its
/// failure is propagated as a non-zero exit code.
pub async fn run_gate(cfg: &MainConfig, dry_run: bool) -> Result<i32, RotateError> {
    let now = Utc::now();
    let local = now.with_timezone(&cfg.schedule.t_timezone);
    match evaluate(&cfg.schedule, now) {
        GateDecision::HourMismatch => {
            debug!("Schedule gate: hour {:02} in {} does not match target {}, nothing to do",
                local.hour(), cfg.schedule.timezone, cfg.schedule.hour);
            Ok(0)
        }
        GateDecision::DayMismatch => {
            debug!("Schedule gate: day {:02} in {} is not a rotation day ({}), nothing to do",
                local.day(), cfg.schedule.timezone, cfg.schedule.days.join(","));
            Ok(0)
        }
        GateDecision::Run => {
            info!("Schedule gate matched: {} {}, starting rotation",
                local.format("%Y-%m-%d %H:%M"), cfg.schedule.timezone);
            run_rotation(cfg, dry_run).await
        }
    }
}

/// Runs the configured `exec` override or the built-in rotation engine.
pub async fn run_rotation(cfg: &MainConfig, dry_run: bool) -> Result<i32, RotateError> {
    match cfg.rotation.exec.as_ref() {
        Some(exec) => run_external(exec, &cfg.schedule.timezone, dry_run),
        None => rotation::rotate(cfg, dry_run).await.map(|()| 0),
    }
}

fn run_external(exec: &ExecConfig, timezone: &str, dry_run: bool) -> Result<i32, RotateError> {
    if dry_run {
        info!("Dry run, would execute {} {}", exec.program, exec.args.join(" "));
        return Ok(0);
    }
    info!("Executing rotation command {}", exec.program);
    let status = std::process::Command::new(&exec.program)
        .args(&exec.args)
        .env("TZ", timezone)
        .status()
        .map_err(|err| create_rotate_error!("failed to execute {}: {err}", exec.program))?;
    let code = status.code().unwrap_or(1);
    if code != 0 {
        warn!("Rotation command {} exited with {code}", exec.program);
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{evaluate, run_external, GateDecision};
    use crate::model::{ExecConfig, ScheduleConfig};

    fn schedule(hour: &str, days: &[&str], timezone: &str) -> ScheduleConfig {
        let mut config = ScheduleConfig {
            hour: hour.to_string(),
            days: days.iter().map(ToString::to_string).collect(),
            timezone: timezone.to_string(),
            t_hour: 0,
            t_days: Vec::new(),
            t_timezone: chrono_tz::UTC,
        };
        config.prepare().unwrap();
        config
    }

    // Yekaterinburg is UTC+5 all year

    #[test]
    fn test_matching_hour_and_day_runs() {
        let config = schedule("04", &["01", "15"], "Asia/Yekaterinburg");
        // 2026-03-15 04:00 local
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 23, 0, 0).unwrap();
        assert_eq!(evaluate(&config, now), GateDecision::Run);
        // minute offsets inside the hour still match
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap();
        assert_eq!(evaluate(&config, now), GateDecision::Run);
    }

    #[test]
    fn test_wrong_day_is_noop() {
        let config = schedule("04", &["01", "15"], "Asia/Yekaterinburg");
        // 2026-03-16 04:00 local
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 23, 0, 0).unwrap();
        assert_eq!(evaluate(&config, now), GateDecision::DayMismatch);
    }

    #[test]
    fn test_wrong_hour_is_noop() {
        let config = schedule("04", &["01", "15"], "Asia/Yekaterinburg");
        // 2026-03-01 05:00 local
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(evaluate(&config, now), GateDecision::HourMismatch);
    }

    #[test]
    fn test_timezone_shifts_the_matching_instant() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 23, 0, 0).unwrap();
        // 23:00 UTC is 04:00 next day in Yekaterinburg
        let yekaterinburg = schedule("04", &["15"], "Asia/Yekaterinburg");
        assert_eq!(evaluate(&yekaterinburg, now), GateDecision::Run);
        // the same instant seen from UTC neither matches hour nor day
        let utc = schedule("04", &["15"], "UTC");
        assert_eq!(evaluate(&utc, now), GateDecision::HourMismatch);
        let utc_evening = schedule("23", &["14"], "UTC");
        assert_eq!(evaluate(&utc_evening, now), GateDecision::Run);
    }

    #[test]
    fn test_day_crossing_at_month_boundary() {
        let config = schedule("04", &["01"], "Asia/Yekaterinburg");
        // 2026-02-28 23:00 UTC is 2026-03-01 04:00 local
        let now = Utc.with_ymd_and_hms(2026, 2, 28, 23, 0, 0).unwrap();
        assert_eq!(evaluate(&config, now), GateDecision::Run);
    }

    fn exec(program: &str, args: &[&str]) -> ExecConfig {
        ExecConfig {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_external_command_failure_code_is_propagated() {
        let result = run_external(&exec("sh", &["-c", "exit 3"]), "Asia/Yekaterinburg", false);
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_external_command_success_exits_zero() {
        let result = run_external(&exec("sh", &["-c", "exit 0"]), "Asia/Yekaterinburg", false);
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_external_command_sees_configured_timezone() {
        let result = run_external(
            &exec("sh", &["-c", "test \"$TZ\" = Asia/Yekaterinburg"]),
            "Asia/Yekaterinburg",
            false,
        );
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_dry_run_skips_the_spawn() {
        // a real spawn of this program would fail
        let result = run_external(&exec("/nonexistent/rotate", &[]), "UTC", true);
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        assert!(run_external(&exec("/nonexistent/rotate", &[]), "UTC", false).is_err());
    }
}
