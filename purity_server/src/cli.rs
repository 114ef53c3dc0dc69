use std::{env, env::VarError};

use purity_common::Secret;

// Secrets are left out on purpose. The gateway key id is shown masked.
const SERVER_ENVS: [&str; 5] = ["RUST_LOG", "TP_HOST", "TP_PORT", "TP_DATABASE_URL", "TP_FRONTEND_BASE"];
const GATEWAY_ENVS: [&str; 3] = ["TP_RAZORPAY_API_URL", "TP_RAZORPAY_TIMEOUT", "TP_MIN_GATEWAY_AMOUNT"];
const AUTH_ENVS: [&str; 2] = ["TP_JWT_EXPIRES", "TP_GOOGLE_CLIENT_ID"];

/// The server takes no arguments. Any argument at all prints the help text and the current configuration.
///
/// Returns `true` if the help was shown, in which case the caller should exit.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{}\n", include_str!("./cli-help.txt"));
    println!("Current environment values (secrets are not shown):");
    print_section("Server", &SERVER_ENVS);
    print_section("Razorpay", &GATEWAY_ENVS);
    let key_id = env_value("TP_RAZORPAY_KEY_ID", |s| Secret::new(s).masked());
    println!("  {:<35} {key_id}", "TP_RAZORPAY_KEY_ID");
    print_section("Accounts", &AUTH_ENVS);
    true
}

fn print_section(title: &str, names: &[&str]) {
    println!(" {title}");
    for name in names {
        println!("  {name:<35} {}", env_value(name, |s| s));
    }
}

fn env_value(name: &str, show: impl FnOnce(String) -> String) -> String {
    match env::var(name) {
        Ok(s) => show(s),
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
