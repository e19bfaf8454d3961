use std::io::Write;

use clap::Subcommand;
use folio_config::Config;
use folio_core_contact_contracts::ContactFormService;
use folio_models::contact::ContactField;

use crate::environment;

#[derive(Debug, Subcommand)]
pub enum DraftCommand {
    /// Print the stored draft
    #[command(aliases(["s"]))]
    Show,
    /// Remove the stored draft
    #[command(aliases(["rm", "c"]))]
    Clear,
    /// Update and store the draft
    Save {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
}

impl DraftCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        let form = environment::contact_form(&config).await?;
        let result = self.run(&form, &mut std::io::stdout()).await;
        form.teardown().await;
        result
    }

    async fn run(self, form: &impl ContactFormService, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            DraftCommand::Show => show(form, out).await,
            DraftCommand::Clear => clear(form, out).await,
            DraftCommand::Save {
                name,
                email,
                subject,
                message,
            } => {
                let fields = [
                    (ContactField::Name, name),
                    (ContactField::Email, email),
                    (ContactField::Subject, subject),
                    (ContactField::Message, message),
                ];
                save(form, fields, out).await
            }
        }
    }
}

async fn show(form: &impl ContactFormService, out: &mut impl Write) -> anyhow::Result<()> {
    let snapshot = form.snapshot().await;
    if !snapshot.remember_draft {
        writeln!(out, "No draft stored.")?;
        return Ok(());
    }

    let draft = &snapshot.draft;
    writeln!(out, "Name:    {}", draft.name)?;
    writeln!(out, "Email:   {}", draft.email)?;
    writeln!(out, "Subject: {}", draft.subject)?;
    writeln!(
        out,
        "Message ({}/{}):\n{}",
        snapshot.message_len, snapshot.hard_limit, draft.message
    )?;

    Ok(())
}

async fn clear(form: &impl ContactFormService, out: &mut impl Write) -> anyhow::Result<()> {
    form.set_remember_draft(false).await;
    writeln!(out, "Draft removed.")?;
    Ok(())
}

async fn save(
    form: &impl ContactFormService,
    fields: [(ContactField, Option<String>); 4],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for (field, value) in fields {
        if let Some(value) = value {
            form.update_field(field, value).await;
        }
    }

    // stores the current values immediately, skipping the debounce
    form.set_remember_draft(true).await;

    writeln!(out, "Draft saved.")?;
    Ok(())
}
