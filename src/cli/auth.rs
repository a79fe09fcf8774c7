//! CLI session handlers for login, status, and logout.

use crate::resources::IgniteApi;

/// Handle `ignite auth login`.
pub async fn handle_login(
    api: &IgniteApi,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = api.sign_in(email, password).await?;
    println!("✅ Signed in as {} <{}>", session.user.name, session.user.email);
    if let Some(avatar) = session.user.avatar.as_deref() {
        println!("   Avatar: {}", api.avatar_url(avatar));
    }
    Ok(())
}

/// Handle `ignite auth status`.
pub fn handle_status(api: &IgniteApi) -> Result<(), Box<dyn std::error::Error>> {
    match api.store().load() {
        Ok(Some(_)) => println!("✅ Signed in ({})", api.client().base_url()),
        Ok(None) => println!("❌ Not signed in"),
        Err(e) => println!("⚠️  Error: {e}"),
    }
    Ok(())
}

/// Handle `ignite auth logout`.
pub fn handle_logout(api: &IgniteApi) -> Result<(), Box<dyn std::error::Error>> {
    api.sign_out()?;
    println!("✅ Signed out");
    Ok(())
}
