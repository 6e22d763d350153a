//! `allokoli-gateway check-config` - configuration diagnostics.
//!
//! Resolves the configuration exactly as `serve` would, prints it with
//! secrets redacted, and reports pass/fail for the settings that change
//! runtime behaviour.

use std::net::SocketAddr;

use crate::config::Config;

enum CheckResult {
    Pass(String),
    Warn(String),
    Fail(String),
}

fn check(name: &str, result: CheckResult, passed: &mut u32, failed: &mut u32) {
    match result {
        CheckResult::Pass(detail) => {
            *passed += 1;
            println!("  [pass] {name}: {detail}");
        }
        CheckResult::Warn(detail) => {
            *passed += 1;
            println!("  [warn] {name}: {detail}");
        }
        CheckResult::Fail(detail) => {
            *failed += 1;
            println!("  [FAIL] {name}: {detail}");
        }
    }
}

pub fn run_check_config() -> anyhow::Result<()> {
    println!("AlloKoli gateway configuration");
    println!("==============================\n");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("  [FAIL] Configuration: {e}");
            anyhow::bail!("configuration is invalid: {e}");
        }
    };

    for (key, value) in config.redacted_summary() {
        println!("  {key:<28} {value}");
    }
    println!();

    let mut passed = 0u32;
    let mut failed = 0u32;

    check("Bind address", check_bind_addr(&config), &mut passed, &mut failed);
    check(
        "Webhook signatures",
        check_webhook_secret(&config),
        &mut passed,
        &mut failed,
    );
    check(
        "Tool forwarding",
        check_tools(&config),
        &mut passed,
        &mut failed,
    );

    println!();
    println!("  {passed} passed, {failed} failed");

    if failed > 0 {
        anyhow::bail!("check-config failed with {failed} check(s)");
    }
    Ok(())
}

fn check_bind_addr(config: &Config) -> CheckResult {
    let addr = config.gateway.bind_addr();
    match addr.parse::<SocketAddr>() {
        Ok(_) => CheckResult::Pass(addr),
        Err(e) => CheckResult::Fail(format!("{addr} is not a socket address: {e}")),
    }
}

fn check_webhook_secret(config: &Config) -> CheckResult {
    if config.webhook.secret.is_some() {
        CheckResult::Pass(format!(
            "HMAC-SHA256, {}s replay window",
            config.webhook.tolerance.as_secs()
        ))
    } else {
        CheckResult::Warn(
            "VAPI_WEBHOOK_SECRET unset, only header presence is checked".to_string(),
        )
    }
}

fn check_tools(config: &Config) -> CheckResult {
    if config.tools.bearer.is_none() {
        CheckResult::Fail("no service key to authenticate tool calls".to_string())
    } else {
        CheckResult::Pass(format!(
            "{} ({}s timeout)",
            config.tools.base_url,
            config.tools.timeout.as_secs()
        ))
    }
}
