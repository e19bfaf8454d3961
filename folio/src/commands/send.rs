use std::io::Write;

use anyhow::bail;
use clap::Args;
use folio_config::Config;
use folio_core_contact_contracts::{
    ContactFormService, ContactSubmitError, ContactSubmitIgnoredReason, ContactSubmitOutcome,
};
use folio_models::contact::{ContactField, MessageSeverity};
use tracing::debug;

use crate::environment;

#[derive(Debug, Args)]
pub struct SendCommand {
    /// Your name, defaults to the stored draft
    #[arg(long)]
    name: Option<String>,
    /// Your email address, defaults to the stored draft
    #[arg(long)]
    email: Option<String>,
    /// An optional subject, defaults to the stored draft
    #[arg(long)]
    subject: Option<String>,
    /// The message, defaults to the stored draft
    #[arg(long)]
    message: Option<String>,
    /// Store the form as a draft so it can be completed or retried later
    #[arg(long, conflicts_with = "forget")]
    remember: bool,
    /// Remove the stored draft
    #[arg(long)]
    forget: bool,
}

impl SendCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        let form = environment::contact_form(&config).await?;
        let result = self.run(&form, &mut std::io::stdout()).await;
        form.teardown().await;
        result
    }

    async fn run(self, form: &impl ContactFormService, out: &mut impl Write) -> anyhow::Result<()> {
        let message_len = self.message.as_ref().map(|message| message.chars().count());

        let fields = [
            (ContactField::Name, self.name),
            (ContactField::Email, self.email),
            (ContactField::Subject, self.subject),
            (ContactField::Message, self.message),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                form.update_field(field, value).await;
            }
        }

        if self.remember {
            form.set_remember_draft(true).await;
        } else if self.forget {
            form.set_remember_draft(false).await;
        }

        let snapshot = form.snapshot().await;
        if let Some(issue) = snapshot.endpoint_issue {
            bail!(
                "{}\nYou can also write to {} directly.",
                ContactSubmitError::from(issue),
                snapshot.fallback_email
            );
        }

        if message_len.is_some_and(|len| len > snapshot.message_len) {
            writeln!(
                out,
                "Message was truncated to {} characters.",
                snapshot.hard_limit
            )?;
        } else if snapshot.message_severity == MessageSeverity::Warn {
            writeln!(
                out,
                "Message is {} of {} characters long.",
                snapshot.message_len, snapshot.hard_limit
            )?;
        }

        match form.submit().await {
            Ok(ContactSubmitOutcome::Sent) => writeln!(out, "Message sent. Thank you!")?,
            Ok(ContactSubmitOutcome::Ignored(ContactSubmitIgnoredReason::Cooldown {
                remaining,
            })) => writeln!(
                out,
                "Please wait {remaining}s before sending another message."
            )?,
            Ok(ContactSubmitOutcome::Ignored(reason)) => debug!(?reason, "submission ignored"),
            Err(err) if err.is_validation() => return Err(err.into()),
            Err(err) => bail!(
                "{err}\nYou can also write to {} directly.",
                snapshot.fallback_email
            ),
        }

        Ok(())
    }
}
