//! OTP command handler

use super::super::{CliContext, OtpAction};
use crate::otp::{OtpClient, OtpResponse};
use anyhow::{bail, Result};

pub struct OtpHandler<'a> {
    context: &'a CliContext,
}

impl<'a> OtpHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_otp(&self, action: OtpAction) -> Result<()> {
        let client = OtpClient::new(&self.context.config_manager.config().otp)?;

        let response = match action {
            OtpAction::Send { phone } => client.send_otp(&phone).await,
            OtpAction::Verify { phone, code } => client.verify_otp(&phone, &code).await,
        };
        report(response)
    }
}

fn report(response: OtpResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.success {
        bail!("OTP request failed: {}", response.message);
    }
    Ok(())
}

super::traits::impl_context_handler!(OtpHandler<'a>);
