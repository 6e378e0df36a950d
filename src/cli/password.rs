use crate::services::auth;
use anyhow::Result;

pub fn run() -> Result<()> {
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let hash = auth::hash_password(&password)?;
    println!("{}", hash);
    Ok(())
}
