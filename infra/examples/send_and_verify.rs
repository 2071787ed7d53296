//! Example: Issue a verification code and check it
//!
//! Uses the in-process store and the mock provider unless `ENVIRONMENT`
//! selects another profile.
//!
//! Run with: cargo run --example send_and_verify -p vk_infra

use vk_core::services::{CodeCheck, SendOutcome};
use vk_infra::{initialize, InfrastructureServices};
use vk_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    config.logging.init()?;

    let services: InfrastructureServices = initialize(&config).await?;
    let verification = services.verification_service();

    let destination = "+14155550100";

    match verification.issue_and_send("login", destination).await? {
        SendOutcome::Sent => println!("Code sent to {}", destination),
        SendOutcome::CooldownRejected => println!("Please wait before requesting another code"),
        SendOutcome::DispatchFailed(e) => println!("Delivery failed: {}", e),
    }

    // A second request inside the cooldown is rejected
    let again = verification.issue_and_send("login", destination).await?;
    println!("Second request: {:?}", again);

    for candidate in ["000000", "12345", "999999"] {
        let check = verification.verify_code("login", destination, candidate).await?;
        println!("Verify {:>6}: {:?}", candidate, check);
        if check == CodeCheck::Match {
            break;
        }
    }

    Ok(())
}
