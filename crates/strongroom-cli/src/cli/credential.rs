//! Credential CLI subcommands: add, show, update, delete.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use dialoguer::{Confirm, Password};

use strongroom_core::repository::Repository;
use strongroom_types::credential::Credential;
use strongroom_types::model::ModelId;

use crate::state::AppState;

/// Credential subcommands.
#[derive(Subcommand)]
pub enum CredentialCommand {
    /// Store a new credential.
    Add {
        /// Display title.
        #[arg(long)]
        title: String,

        /// Login name.
        #[arg(long)]
        username: String,

        /// Password (prompted for when omitted).
        #[arg(long)]
        password: Option<String>,

        /// Where the credential is used (URL, host, application).
        #[arg(long)]
        resource: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a stored credential.
    Show {
        /// Credential id.
        id: ModelId,

        /// Print the password instead of a mask.
        #[arg(long)]
        reveal: bool,
    },

    /// Change fields of a stored credential.
    Update {
        /// Credential id.
        id: ModelId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// New password.
        #[arg(long, conflicts_with = "prompt_password")]
        password: Option<String>,

        /// Prompt for a new password with hidden input.
        #[arg(long)]
        prompt_password: bool,

        #[arg(long)]
        resource: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a stored credential.
    #[command(alias = "rm")]
    Delete {
        /// Credential id.
        id: ModelId,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a credential subcommand.
pub async fn handle_credential_command(
    cmd: CredentialCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        CredentialCommand::Add {
            title,
            username,
            password,
            resource,
            description,
            notes,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            let credential = Credential::new(title, username, password);
            let changes = CredentialChanges {
                associated_resource: resource,
                description,
                notes,
                ..CredentialChanges::default()
            };
            add_credential(state, changes.applied_to(credential), json).await
        }
        CredentialCommand::Show { id, reveal } => show_credential(state, id, reveal, json).await,
        CredentialCommand::Update {
            id,
            title,
            username,
            password,
            prompt_password: prompt,
            resource,
            description,
            notes,
        } => {
            let password = if prompt { Some(prompt_password()?) } else { password };
            let changes = CredentialChanges {
                title,
                username,
                password,
                associated_resource: resource,
                description,
                notes,
            };
            update_credential(state, id, changes, json).await
        }
        CredentialCommand::Delete { id, force } => delete_credential(state, id, force, json).await,
    }
}

/// Field changes requested on the command line; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct CredentialChanges {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub associated_resource: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl CredentialChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.associated_resource.is_none()
            && self.description.is_none()
            && self.notes.is_none()
    }

    pub fn applied_to(self, mut credential: Credential) -> Credential {
        let fields = [
            (self.title, &mut credential.title),
            (self.username, &mut credential.username),
            (self.password, &mut credential.password),
            (self.associated_resource, &mut credential.associated_resource),
            (self.description, &mut credential.description),
            (self.notes, &mut credential.notes),
        ];
        for (change, field) in fields {
            if let Some(value) = change {
                *field = value;
            }
        }
        credential
    }
}

fn prompt_password() -> Result<String> {
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    Ok(password)
}

/// Mask a password for display, keeping only its length class.
pub fn mask_password(password: &str) -> String {
    if password.is_empty() {
        String::new()
    } else {
        "*".repeat(password.chars().count().clamp(8, 16))
    }
}

/// JSON form of a credential, with the password masked unless `reveal`.
pub fn credential_json(credential: &Credential, reveal: bool) -> serde_json::Value {
    let password = if reveal {
        credential.password.clone()
    } else {
        mask_password(&credential.password)
    };
    serde_json::json!({
        "id": credential.id,
        "title": credential.title,
        "username": credential.username,
        "password": password,
        "associated_resource": credential.associated_resource,
        "description": credential.description,
        "notes": credential.notes,
    })
}

async fn add_credential(state: &AppState, credential: Credential, json: bool) -> Result<()> {
    let created = state
        .credentials
        .create(credential)
        .await
        .context("Failed to store credential")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&credential_json(&created, false))?
        );
    } else {
        println!();
        println!(
            "  {} Stored '{}' as credential {}",
            style("✓").green().bold(),
            style(&created.title).cyan(),
            style(created.id).bold()
        );
        println!();
    }

    Ok(())
}

async fn show_credential(state: &AppState, id: ModelId, reveal: bool, json: bool) -> Result<()> {
    let Some(credential) = state.credentials.read(id).await? else {
        bail!("Credential {id} not found");
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&credential_json(&credential, reveal))?
        );
        return Ok(());
    }

    let password = if reveal {
        credential.password.clone()
    } else {
        mask_password(&credential.password)
    };

    println!();
    println!(
        "  {} {}",
        style(&credential.title).cyan().bold(),
        style(format!("#{}", credential.id)).dim()
    );
    println!();
    println!("  {:<12} {}", style("Username").bold(), credential.username);
    println!("  {:<12} {}", style("Password").bold(), password);
    if !credential.associated_resource.is_empty() {
        println!("  {:<12} {}", style("Resource").bold(), credential.associated_resource);
    }
    if !credential.description.is_empty() {
        println!("  {:<12} {}", style("Description").bold(), credential.description);
    }
    if !credential.notes.is_empty() {
        println!("  {:<12} {}", style("Notes").bold(), credential.notes);
    }
    println!();

    Ok(())
}

async fn update_credential(
    state: &AppState,
    id: ModelId,
    changes: CredentialChanges,
    json: bool,
) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to update; pass at least one field");
    }

    let Some(existing) = state.credentials.read(id).await? else {
        bail!("Credential {id} not found");
    };

    let updated = changes.applied_to(existing);
    state
        .credentials
        .update(&updated)
        .await
        .with_context(|| format!("Failed to update credential {id}"))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&credential_json(&updated, false))?
        );
    } else {
        println!();
        println!(
            "  {} Updated credential {} ('{}')",
            style("✓").green().bold(),
            style(id).bold(),
            style(&updated.title).cyan()
        );
        println!();
    }

    Ok(())
}

async fn delete_credential(state: &AppState, id: ModelId, force: bool, json: bool) -> Result<()> {
    let Some(credential) = state.credentials.read(id).await? else {
        bail!("Credential {id} not found");
    };

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete credential '{}'?",
                style(&credential.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state
        .credentials
        .delete(&credential)
        .await
        .with_context(|| format!("Failed to delete credential {id}"))?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!(
            "  {} Deleted credential {} ('{}')",
            style("✓").green().bold(),
            style(id).bold(),
            style(&credential.title).cyan()
        );
    }

    Ok(())
}
