use std::fmt::Debug;

use serde::Deserialize;

use crate::domain::EntrantEmail;
use crate::domain::EntrantName;
use crate::domain::INVALID_EMAIL;
use crate::domain::MISSING_FIELD;
use crate::domain::NewEntry;
use crate::domain::ReferralSource;
use crate::domain::WaitlistEntry;
use crate::routes::error_chain_fmt;
use crate::store::RecordStore;
use crate::store::StoreError;

/// Raw sign-up form. Every field may be absent; absence is reported as a
/// validation error (rather than a deserialisation failure), so the user gets
/// a readable message back.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct WaitlistForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<WaitlistForm> for NewEntry {
    type Error = String;
    fn try_from(value: WaitlistForm) -> Result<Self, Self::Error> {
        // fields are checked in form order, so the first complaint matches the
        // first field the user has to fix
        let name = EntrantName::parse(value.name.unwrap_or_default())?;
        let email = EntrantEmail::parse(value.email.unwrap_or_default())?;
        let source = ReferralSource::parse(value.source.unwrap_or_default())?;
        let message = value.message.unwrap_or_default().trim().to_string();
        Ok(NewEntry {
            name,
            email,
            source,
            message,
        })
    }
}

#[derive(thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),
    /// Holds the normalised email
    #[error("email already present: {0}")]
    Duplicate(String),
    #[error("Failed to store waitlist entry")]
    Storage(#[source] anyhow::Error),
}

impl Debug for SubmitError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(email) => Self::Duplicate(email),
            StoreError::Unexpected(e) => Self::Storage(e),
        }
    }
}

impl SubmitError {
    /// What the person filling in the form gets to see. Storage failures
    /// carry no details; those only go to the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => match reason.as_str() {
                INVALID_EMAIL => "Please enter a valid email address.".to_string(),
                r if r.starts_with(MISSING_FIELD) => {
                    "Please fill in all required fields.".to_string()
                }
                r => format!("Please check your input: {r}."),
            },
            Self::Duplicate(_) => "This email address is already on our waitlist.".to_string(),
            Self::Storage(_) => {
                "An error occurred while saving your information. Please try again.".to_string()
            }
        }
    }
}

/// Validate, normalise and (if the email is new) append a waitlist entry.
///
/// validating -> checking duplicate -> appending -> done; the first two steps
/// can exit early. Nothing is retried: a caller that wants to retry must
/// resubmit.
#[tracing::instrument(
    name = "Submitting waitlist entry",
    skip(store, form),
    fields(
        entrant_email = tracing::field::Empty,
        referral_source = tracing::field::Empty,
    )
)]
pub async fn submit(
    store: &dyn RecordStore,
    form: WaitlistForm,
) -> Result<WaitlistEntry, SubmitError> {
    // no I/O happens until the candidate is fully parsed
    let new_entry: NewEntry = form.try_into().map_err(SubmitError::Validation)?;

    let span = tracing::Span::current();
    span.record("entrant_email", tracing::field::display(new_entry.email.as_ref()));
    span.record("referral_source", tracing::field::display(new_entry.source));

    Ok(store.append_if_absent(&new_entry).await?)
}
