//! The `init` command: write a fresh credential record.

use freetime_graph::{Credential, CredentialStore};

use crate::error::{ClientError, ClientResult};

/// Values for a new record, from flags or the environment.
#[derive(Default)]
pub struct InitArgs {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub force: bool,
}

impl InitArgs {
    fn into_credential(self) -> ClientResult<Credential> {
        let access_token = self.access_token.trim().to_string();
        if access_token.is_empty() {
            return Err(ClientError::InvalidArgument(
                "access token must not be empty".to_string(),
            ));
        }
        let mut credential = Credential::new(access_token);
        credential.refresh_token = non_empty(self.refresh_token);
        credential.client_id = non_empty(self.client_id);
        credential.client_secret = non_empty(self.client_secret);
        Ok(credential)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Writes the record, refusing to overwrite an existing one without `force`.
pub fn run(store: &CredentialStore, args: InitArgs) -> ClientResult<()> {
    let path = store.path();
    if path.exists() && !args.force {
        return Err(ClientError::Config(format!(
            "credential record {} already exists, use --force to overwrite",
            path.display()
        )));
    }

    let credential = args.into_credential()?;
    let refreshable = credential.refresh_grant().is_ok();
    store.save(&credential)?;

    println!("Credential record written to {}", path.display());
    if !refreshable {
        println!(
            "Note: without a refresh token, client ID and client secret the access token cannot be renewed."
        );
    }
    Ok(())
}
