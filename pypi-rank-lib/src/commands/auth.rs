use super::Host;
use super::common::CommonArgs;
use crate::Result;
use crate::facts::hosting::{DeviceFlow, write_token};
use clap::Args;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Obtain a GitHub token through the device flow and store it for later searches.
pub async fn auth_github<H: Host>(host: &mut H, args: &AuthArgs) -> Result<()> {
    let config = args.common.init()?;
    let token_path = args.common.token_path().into_app_err("could not determine where to store the GitHub token")?;

    let flow = DeviceFlow::new(&config.auth_url, &config.github_client_id)?;
    let codes = flow.request_codes().await?;

    let _ = writeln!(
        host.error(),
        "Please open {} and enter code: {}",
        codes.verification_uri, codes.user_code
    );

    let token = flow.wait_for_token(&codes).await?;
    write_token(&token_path, &token)?;

    let _ = writeln!(host.error(), "Success, token stored at '{}'", token_path.display());
    Ok(())
}
